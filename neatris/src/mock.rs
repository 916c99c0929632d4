//! A one-gene genome used to exercise the engine
//! without a real network representation.
use crate::{Genome, Innovation, InnovationHistory};

use rand::Rng;

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub value: f32,
    fitness: Option<f32>,
    adjusted_fitness: Option<f32>,
}

impl Scalar {
    pub fn new(value: f32) -> Scalar {
        Scalar {
            value,
            fitness: None,
            adjusted_fitness: None,
        }
    }

    pub fn with_fitness(value: f32, fitness: f32) -> Scalar {
        Scalar {
            fitness: Some(fitness),
            ..Scalar::new(value)
        }
    }
}

#[derive(Debug, Default)]
pub struct Counter(AtomicUsize);

impl InnovationHistory for Counter {
    fn next_innovation(&self) -> Innovation {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

impl Genome for Scalar {
    /// Maximum mutation step.
    type Config = f32;
    type InnovationHistory = Counter;
    type Phenotype = f32;
    type Error = Infallible;

    fn compatibility_distance(first: &Self, second: &Self, _config: &f32) -> f32 {
        (first.value - second.value).abs()
    }

    fn reproduce<R: Rng + ?Sized>(
        parent1: &Self,
        parent2: &Self,
        _rng: &mut R,
    ) -> Result<Self, Infallible> {
        Ok(Scalar::new((parent1.value + parent2.value) / 2.0))
    }

    fn mutate<R: Rng + ?Sized>(&mut self, history: &Counter, config: &f32, rng: &mut R) {
        if *config > 0.0 {
            history.next_innovation();
            self.value += rng.gen_range(-*config..=*config);
        }
    }

    fn express(&self) -> f32 {
        self.value
    }

    fn fitness(&self) -> Option<f32> {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = Some(fitness);
    }

    fn adjusted_fitness(&self) -> Option<f32> {
        self.adjusted_fitness
    }

    fn set_adjusted_fitness(&mut self, adjusted_fitness: f32) {
        self.adjusted_fitness = Some(adjusted_fitness);
    }
}
