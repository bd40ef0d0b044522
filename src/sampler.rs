// src/sampler.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! O(1) weighted key sampling (Vose alias method)
//!
//! Foreign keys in fact tables are drawn from dimension key pools with a mild
//! power-law skew: the key at rank `r` (0-based position in the pool) gets raw
//! weight `1/sqrt(r+1)`, so earlier keys are referenced more often.
//!
//! The table is built once in O(n) and is immutable afterwards. A single
//! sampler is shared by all fact workers; each worker brings its own RNG.

use rand::Rng;

use crate::error::{GenError, Result};

/// Alias table over a ranked key population
#[derive(Debug, Clone)]
pub struct WeightedSampler {
    ids: Vec<i64>,
    prob: Vec<f64>,
    alias: Vec<usize>,
}

impl WeightedSampler {
    /// Build a rank-skewed sampler over `ids` (lower index = more popular)
    pub fn new(ids: &[i64]) -> Result<Self> {
        let weights: Vec<f64> = (0..ids.len())
            .map(|rank| 1.0 / ((rank + 1) as f64).sqrt())
            .collect();
        Self::build(ids, weights)
    }

    /// Build a sampler over `ids` with caller-supplied relative weights
    pub fn with_weights(ids: &[i64], weights: &[f64]) -> Result<Self> {
        if ids.len() != weights.len() {
            return Err(GenError::config(format!(
                "sampler got {} ids but {} weights",
                ids.len(),
                weights.len()
            )));
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(GenError::config(format!("invalid sampler weight {bad}")));
        }
        Self::build(ids, weights.to_vec())
    }

    fn build(ids: &[i64], mut weights: Vec<f64>) -> Result<Self> {
        let n = ids.len();
        if n == 0 {
            return Err(GenError::config("cannot build a sampler over an empty key pool"));
        }
        if n == 1 {
            return Ok(Self {
                ids: ids.to_vec(),
                prob: vec![1.0],
                alias: vec![0],
            });
        }

        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(GenError::config("sampler weights sum to zero"));
        }

        // Scale so the mean weight is 1: each column then holds exactly one unit of mass
        let scale = n as f64 / total;
        for w in weights.iter_mut() {
            *w *= scale;
        }

        let mut light = Vec::with_capacity(n);
        let mut heavy = Vec::with_capacity(n);
        for (i, &w) in weights.iter().enumerate() {
            if w < 1.0 {
                light.push(i);
            } else {
                heavy.push(i);
            }
        }

        let mut prob = vec![1.0; n];
        let mut alias: Vec<usize> = (0..n).collect();

        while let (Some(&s), Some(&l)) = (light.last(), heavy.last()) {
            light.pop();
            heavy.pop();

            prob[s] = weights[s];
            alias[s] = l;

            weights[l] += weights[s] - 1.0;
            if weights[l] < 1.0 {
                light.push(l);
            } else {
                heavy.push(l);
            }
        }

        // Whatever is left is whole up to float error
        for i in light.into_iter().chain(heavy) {
            prob[i] = 1.0;
            alias[i] = i;
        }

        tracing::trace!("Built alias table over {} keys", n);

        Ok(Self {
            ids: ids.to_vec(),
            prob,
            alias,
        })
    }

    /// Draw one key
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        let column = rng.random_range(0..self.ids.len());
        let r: f64 = rng.random();
        if r < self.prob[column] {
            self.ids[column]
        } else {
            self.ids[self.alias[column]]
        }
    }

    /// Draw `k` keys
    pub fn sample_batch<R: Rng + ?Sized>(&self, rng: &mut R, k: usize) -> Vec<i64> {
        let mut out = vec![0; k];
        self.sample_into(rng, &mut out);
        out
    }

    /// Fill `out` with draws, no allocation
    pub fn sample_into<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut [i64]) {
        for slot in out.iter_mut() {
            *slot = self.sample(rng);
        }
    }

    /// Number of keys in the population
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
