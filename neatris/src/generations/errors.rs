use crate::GenomeRef;

use thiserror::Error;

/// An invalid configuration value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be a probability in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f32 },
    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidScale { name: &'static str, value: f32 },
    #[error("population size must be positive")]
    EmptyPopulation,
    #[error("staleness must look back at least one generation")]
    NoStalenessWindow,
}

impl ConfigError {
    /// Checks that `value` lies in `[0, 1]`.
    pub fn ensure_probability(name: &'static str, value: f32) -> Result<(), ConfigError> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(ConfigError::ProbabilityOutOfRange { name, value })
        }
    }

    /// Checks that `value` is finite and non-negative.
    pub fn ensure_scale(name: &'static str, value: f32) -> Result<(), ConfigError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidScale { name, value })
        }
    }
}

/// Failures of a generation transition. `E` is
/// the error type of the evolved genomes.
#[derive(Debug, Error)]
pub enum GenerationError<E>
where
    E: std::error::Error + 'static,
{
    #[error("genome operation failed")]
    Genome(#[source] E),
    #[error("no fitness was recorded for genome {0:?}")]
    MissingFitness(GenomeRef),
    #[error("phenotype refers to unknown genome {0:?}")]
    UnknownGenome(GenomeRef),
    #[error("expected {expected} fitness scores, got {found}")]
    FitnessCount { expected: usize, found: usize },
    #[error("no group survived generation {0}")]
    Extinct(usize),
    #[error("generation {0} has already produced its successor")]
    AlreadyAdvanced(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_bounds() {
        assert!(ConfigError::ensure_probability("p", 0.0).is_ok());
        assert!(ConfigError::ensure_probability("p", 1.0).is_ok());
        assert_eq!(
            ConfigError::ensure_probability("p", 1.5),
            Err(ConfigError::ProbabilityOutOfRange {
                name: "p",
                value: 1.5
            })
        );
        assert!(ConfigError::ensure_probability("p", f32::NAN).is_err());
    }

    #[test]
    fn scale_bounds() {
        assert!(ConfigError::ensure_scale("s", 2.0).is_ok());
        assert!(ConfigError::ensure_scale("s", -0.1).is_err());
        assert!(ConfigError::ensure_scale("s", f32::INFINITY).is_err());
    }

    #[test]
    fn messages_name_the_offender() {
        let e = ConfigError::ProbabilityOutOfRange {
            name: "add_connection",
            value: 2.0,
        };
        assert_eq!(
            e.to_string(),
            "add_connection must be a probability in [0, 1], got 2"
        );
    }
}
