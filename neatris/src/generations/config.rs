use super::ConfigError;

use serde::{Deserialize, Serialize};

/// How many of a group's best members form its breeding pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentSelection {
    /// The top `ceil(r * size)` members, but never
    /// fewer than two (nor more than the group holds).
    AtLeastTwo,
    /// The top `round(r * size)` members, with no floor.
    Rounded,
}

/// Settings for dropping groups whose performance has
/// stopped changing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StalenessConfig {
    /// How many generations back the current group
    /// adjusted fitness is compared against.
    pub generations_back: usize,
    /// First generation id at which groups may be dropped.
    pub min_generation: usize,
    /// Groups are only dropped while at least this
    /// many groups are alive.
    pub min_groups: usize,
    /// Relative change below which a group is stale.
    pub relative_tolerance: f32,
}

/// Configuration data for generation management.
///
/// # Note
/// `r_factor` is a fraction in [0.0, 1.0]; `validate`
/// rejects values outside of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Number of genomes every generation aims for.
    pub population_size: usize,
    /// Compatibility distance below which a genome
    /// belongs to a group.
    pub compatibility_threshold: f32,
    /// Fraction of each group, best first, that
    /// may be chosen as parents.
    pub r_factor: f32,
    pub parent_selection: ParentSelection,
    /// Stale group removal. Disabled when `None`.
    #[serde(default)]
    pub staleness: Option<StalenessConfig>,
}

impl GenerationConfig {
    /// Returns a "zero-valued" default configuration.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments
    /// (it doesn't even validate, as its population is empty).
    /// It is meant as a way to abbreviate configuration
    /// instantiation.
    ///
    /// # Examples
    /// ```
    /// use neatris::GenerationConfig;
    ///
    /// let config = GenerationConfig {
    ///     population_size: 150,
    ///     compatibility_threshold: 3.0,
    ///     r_factor: 0.3,
    ///     ..GenerationConfig::zero()
    /// };
    /// assert!(config.validate().is_ok());
    /// ```
    pub const fn zero() -> GenerationConfig {
        GenerationConfig {
            population_size: 0,
            compatibility_threshold: 0.0,
            r_factor: 0.0,
            parent_selection: ParentSelection::AtLeastTwo,
            staleness: None,
        }
    }

    /// Checks every value is within its admissible range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        ConfigError::ensure_scale("compatibility_threshold", self.compatibility_threshold)?;
        ConfigError::ensure_probability("r_factor", self.r_factor)?;
        if let Some(staleness) = &self.staleness {
            if staleness.generations_back == 0 {
                return Err(ConfigError::NoStalenessWindow);
            }
            ConfigError::ensure_scale("relative_tolerance", staleness.relative_tolerance)?;
        }
        Ok(())
    }
}
