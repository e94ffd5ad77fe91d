//! Sampler
//!
//! Strategies for choosing the rows each tree of a forest is fitted on.
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum SampleMethod {
    /// Every tree sees all rows.
    None,
    /// Every tree sees a bootstrap resample of the rows.
    Bootstrap,
}

// A sampler can be used to subset the data prior to fitting a new tree.
pub trait Sampler {
    /// Sample the data, returning the rows chosen for training.
    /// Rows may appear more than once.
    fn sample(&mut self, rng: &mut StdRng, index: &[usize]) -> Vec<usize>;
}

pub struct IdentitySampler;

impl Sampler for IdentitySampler {
    fn sample(&mut self, _rng: &mut StdRng, index: &[usize]) -> Vec<usize> {
        index.to_vec()
    }
}

/// Draw `index.len()` rows uniformly with replacement.
pub struct BootstrapSampler;

impl Sampler for BootstrapSampler {
    fn sample(&mut self, rng: &mut StdRng, index: &[usize]) -> Vec<usize> {
        if index.is_empty() {
            return Vec::new();
        }
        (0..index.len()).map(|_| index[rng.gen_range(0..index.len())]).collect()
    }
}

impl SampleMethod {
    pub fn sampler(&self) -> Box<dyn Sampler> {
        match self {
            SampleMethod::None => Box::new(IdentitySampler),
            SampleMethod::Bootstrap => Box::new(BootstrapSampler),
        }
    }
}
