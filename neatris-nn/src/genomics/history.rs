use crate::Innovation;

use std::sync::atomic::{AtomicUsize, Ordering};

/// The source of connection innovation numbers for a run.
///
/// Shared by reference (typically through an `Arc`), it hands
/// out strictly increasing numbers and is safe to use from
/// several threads at once.
#[derive(Debug, Default)]
pub struct InnovationCounter {
    next: AtomicUsize,
}

impl InnovationCounter {
    /// Returns a counter whose first innovation is 0.
    pub fn new() -> InnovationCounter {
        InnovationCounter::starting_at(0)
    }

    /// Returns a counter whose first innovation is `next`.
    /// Useful when seed genomes were built with explicit
    /// innovation numbers below `next`.
    ///
    /// # Examples
    /// ```
    /// use neatris_nn::genomics::InnovationCounter;
    ///
    /// let history = InnovationCounter::starting_at(3);
    /// assert_eq!(history.next_innovation(), 3);
    /// assert_eq!(history.next_innovation(), 4);
    /// assert_eq!(history.peek(), 5);
    /// ```
    pub fn starting_at(next: Innovation) -> InnovationCounter {
        InnovationCounter {
            next: AtomicUsize::new(next),
        }
    }

    /// Issues a fresh innovation number.
    pub fn next_innovation(&self) -> Innovation {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the number the next call to
    /// [`next_innovation`] will issue.
    ///
    /// [`next_innovation`]: InnovationCounter::next_innovation
    pub fn peek(&self) -> Innovation {
        self.next.load(Ordering::Relaxed)
    }

    /// Rewinds the counter to 0.
    pub fn reset(&self) {
        self.next.store(0, Ordering::Relaxed);
    }
}

impl neatris::InnovationHistory for InnovationCounter {
    fn next_innovation(&self) -> Innovation {
        InnovationCounter::next_innovation(self)
    }
}
