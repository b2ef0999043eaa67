//! Samples returned by a solver.
//!
//! A solver answers with parallel arrays: solution vectors, their energies
//! and how often each was observed. [`SampleSet::from_parts`] zips them and
//! rejects inconsistent lengths instead of truncating.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// One distinct solution vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Variable values.
    pub values: Vec<f64>,
    /// Energy reported for these values.
    pub energy: f64,
    /// Number of times the solver returned this vector.
    pub count: u32,
}

impl Sample {
    /// Create a sample observed once.
    pub fn new(values: Vec<f64>, energy: f64) -> Self {
        Self {
            values,
            energy,
            count: 1,
        }
    }

    /// Set the occurrence count.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Round values to 0/1, failing if any is further than `tol` from both.
    pub fn as_binary(&self, tol: f64) -> ModelResult<Vec<u8>> {
        self.values
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                if value.abs() <= tol {
                    Ok(0)
                } else if (value - 1.0).abs() <= tol {
                    Ok(1)
                } else {
                    Err(ModelError::NonBinaryValue { index, value })
                }
            })
            .collect()
    }

    /// Sum of all values.
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// All samples from one job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    /// Wrap a list of samples.
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Build from the parallel arrays of a solver response.
    ///
    /// `counts` defaults to one per solution when absent.
    pub fn from_parts(
        solutions: Vec<Vec<f64>>,
        energies: Vec<f64>,
        counts: Option<Vec<u32>>,
    ) -> ModelResult<Self> {
        if energies.len() != solutions.len() {
            return Err(ModelError::MalformedResponse(format!(
                "{} solutions but {} energies",
                solutions.len(),
                energies.len()
            )));
        }
        let counts = match counts {
            Some(c) if c.len() != solutions.len() => {
                return Err(ModelError::MalformedResponse(format!(
                    "{} solutions but {} counts",
                    solutions.len(),
                    c.len()
                )));
            }
            Some(c) => c,
            None => vec![1; solutions.len()],
        };
        if let Some(first) = solutions.first() {
            if let Some(bad) = solutions.iter().find(|s| s.len() != first.len()) {
                return Err(ModelError::MalformedResponse(format!(
                    "solution vectors of different lengths ({} and {})",
                    first.len(),
                    bad.len()
                )));
            }
        }

        let samples = solutions
            .into_iter()
            .zip(energies)
            .zip(counts)
            .map(|((values, energy), count)| Sample {
                values,
                energy,
                count,
            })
            .collect();
        Ok(Self { samples })
    }

    /// Merge identical solution vectors, summing their counts.
    pub fn aggregate(samples: impl IntoIterator<Item = Sample>) -> Self {
        let mut index: FxHashMap<Vec<u64>, usize> = FxHashMap::default();
        let mut merged: Vec<Sample> = Vec::new();
        for sample in samples {
            let key: Vec<u64> = sample.values.iter().map(|v| v.to_bits()).collect();
            match index.get(&key) {
                Some(&i) => merged[i].count += sample.count,
                None => {
                    index.insert(key, merged.len());
                    merged.push(sample);
                }
            }
        }
        let mut set = Self { samples: merged };
        set.sort_by_energy();
        set
    }

    /// The samples.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterate over samples.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Number of distinct samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the solver returned nothing.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total number of reads across samples.
    pub fn total_count(&self) -> u64 {
        self.samples.iter().map(|s| u64::from(s.count)).sum()
    }

    /// Lowest-energy sample.
    pub fn best(&self) -> Option<&Sample> {
        self.samples.iter().min_by(|a, b| a.energy.total_cmp(&b.energy))
    }

    /// Sort ascending by energy (stable).
    pub fn sort_by_energy(&mut self) {
        self.samples.sort_by(|a, b| a.energy.total_cmp(&b.energy));
    }

    /// A copy sorted ascending by energy.
    pub fn sorted_by_energy(&self) -> Self {
        let mut set = self.clone();
        set.sort_by_energy();
        set
    }

    /// Number of variables per sample, if any sample exists.
    pub fn num_variables(&self) -> Option<usize> {
        self.samples.first().map(|s| s.values.len())
    }
}

impl IntoIterator for SampleSet {
    type Item = Sample;
    type IntoIter = std::vec::IntoIter<Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.into_iter()
    }
}
