//! # neatris-nn
//! A neural network-based implementation of the `neatris` crate's `Genome` trait.
//!
//! Provides a [`NetworkGenome`] type usable in `neatris` `Generation`s, and
//! the [`FeedForwardNetwork`] built from it: a sigmoid network evaluated
//! with a single depth-first pass per input vector.
//!
//! [`NetworkGenome`]: crate::genomics::NetworkGenome
//! [`FeedForwardNetwork`]: crate::networks::FeedForwardNetwork
//!
//! # Example usage
//! ```
//! use neatris_nn::{genomics::{InnovationCounter, NetworkGenome}, networks::FeedForwardNetwork};
//!
//! let history = InnovationCounter::new();
//! let genome = NetworkGenome::new(
//!     &[(2, 4, 1.0, true), (1, 3, 0.0, true), (2, 3, 0.0, true), (1, 4, -2.0, true)],
//!     2,
//!     2,
//!     &history,
//! )
//! .unwrap();
//!
//! let mut network = FeedForwardNetwork::new(&genome);
//! let y = network.forward(&[3.0, 22.0]).unwrap();
//! assert_eq!(y[0], 0.5);
//! assert!((y[1] - 0.0073916).abs() < 1e-6);
//! ```

pub mod genomics;
pub mod networks;

pub use neatris::Innovation;

/// Node identifier. Only meaningful within a single genome:
/// two genomes may use the same id for unrelated nodes.
pub type NodeId = usize;
