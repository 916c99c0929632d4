use neatris::ConfigError;

use serde::{Deserialize, Serialize};

/// Mutation probabilities and weight scales.
///
/// # Note
/// The three chances are probabilities in [0.0, 1.0]. The
/// two `max` values are scales: new weights and weight
/// perturbations are drawn from a normal distribution whose
/// standard deviation is half of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationCoefficients {
    /// Chance of adding a new connection.
    pub add_connection: f32,
    /// Chance of splitting a connection with a new node.
    pub split_connection: f32,
    /// Chance of perturbing a connection's weight.
    pub change_weight: f32,
    pub new_connection_abs_max_weight: f32,
    pub max_weight_mutation: f32,
}

/// Weights of the compatibility distance terms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityCoefficients {
    pub excess_factor: f32,
    pub disjoint_factor: f32,
    pub weight_difference_factor: f32,
}

/// Configuration data for genome mutation
/// and inter-genome operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    pub mutation_coefficients: MutationCoefficients,
    pub compatibility_coefficients: CompatibilityCoefficients,
}

impl MutationCoefficients {
    /// Returns coefficients that never mutate anything.
    pub const fn zero() -> MutationCoefficients {
        MutationCoefficients {
            add_connection: 0.0,
            split_connection: 0.0,
            change_weight: 0.0,
            new_connection_abs_max_weight: 0.0,
            max_weight_mutation: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::ensure_probability("add_connection", self.add_connection)?;
        ConfigError::ensure_probability("split_connection", self.split_connection)?;
        ConfigError::ensure_probability("change_weight", self.change_weight)?;
        ConfigError::ensure_scale(
            "new_connection_abs_max_weight",
            self.new_connection_abs_max_weight,
        )?;
        ConfigError::ensure_scale("max_weight_mutation", self.max_weight_mutation)
    }
}

impl CompatibilityCoefficients {
    pub const fn zero() -> CompatibilityCoefficients {
        CompatibilityCoefficients {
            excess_factor: 0.0,
            disjoint_factor: 0.0,
            weight_difference_factor: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::ensure_scale("excess_factor", self.excess_factor)?;
        ConfigError::ensure_scale("disjoint_factor", self.disjoint_factor)?;
        ConfigError::ensure_scale("weight_difference_factor", self.weight_difference_factor)
    }
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use neatris_nn::genomics::{GeneticConfig, MutationCoefficients};
    ///
    /// let config = GeneticConfig {
    ///     // Specify some values here...
    ///     mutation_coefficients: MutationCoefficients {
    ///         change_weight: 0.8,
    ///         max_weight_mutation: 0.5,
    ///         ..MutationCoefficients::zero()
    ///     },
    ///     // Default the rest...
    ///     ..GeneticConfig::zero()
    /// };
    /// assert!(config.validate().is_ok());
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            mutation_coefficients: MutationCoefficients::zero(),
            compatibility_coefficients: CompatibilityCoefficients::zero(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mutation_coefficients.validate()?;
        self.compatibility_coefficients.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_chances() {
        let config = GeneticConfig {
            mutation_coefficients: MutationCoefficients {
                split_connection: -0.2,
                ..MutationCoefficients::zero()
            },
            ..GeneticConfig::zero()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ProbabilityOutOfRange {
                name: "split_connection",
                value: -0.2
            })
        );
    }

    #[test]
    fn rejects_negative_factors() {
        let config = GeneticConfig {
            compatibility_coefficients: CompatibilityCoefficients {
                disjoint_factor: -1.0,
                ..CompatibilityCoefficients::zero()
            },
            ..GeneticConfig::zero()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_json() {
        let json = r#"{
            "mutation_coefficients": {
                "add_connection": 0.5,
                "split_connection": 0.2,
                "change_weight": 0.8,
                "new_connection_abs_max_weight": 1.0,
                "max_weight_mutation": 0.5
            },
            "compatibility_coefficients": {
                "excess_factor": 1.5,
                "disjoint_factor": 1.5,
                "weight_difference_factor": 2.0
            }
        }"#;
        let config: GeneticConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.compatibility_coefficients.weight_difference_factor, 2.0);
    }
}
