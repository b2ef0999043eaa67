//! Results of a finished job.

use optiq_model::SampleSet;
use serde::{Deserialize, Serialize};

use crate::job::JobId;

/// Samples and bookkeeping returned by a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    /// The job that produced the samples.
    pub job_id: JobId,
    /// Distinct samples with energies and counts.
    pub samples: SampleSet,
    /// Device or solver that produced them.
    pub device: String,
    /// Solver-side wall time, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_time_ms: Option<u64>,
    /// Solver-specific extras (job type, schedule, file ids).
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl SolveResult {
    /// Create a result without timing or metadata.
    pub fn new(job_id: JobId, samples: SampleSet, device: impl Into<String>) -> Self {
        Self {
            job_id,
            samples,
            device: device.into(),
            wall_time_ms: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// Set the wall time.
    pub fn with_wall_time_ms(mut self, ms: u64) -> Self {
        self.wall_time_ms = Some(ms);
        self
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Lowest reported energy.
    pub fn best_energy(&self) -> Option<f64> {
        self.samples.best().map(|s| s.energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optiq_model::Sample;

    #[test]
    fn test_result_builder() {
        let samples = SampleSet::new(vec![
            Sample::new(vec![1.0], -1.0),
            Sample::new(vec![0.0], 0.0),
        ]);
        let result = SolveResult::new(JobId::new("j"), samples, "sim")
            .with_wall_time_ms(12)
            .with_metadata("job_type", serde_json::json!("sample-qubo"));
        assert_eq!(result.best_energy(), Some(-1.0));
        assert_eq!(result.wall_time_ms, Some(12));
        assert_eq!(result.metadata["job_type"], "sample-qubo");
    }

    #[test]
    fn test_serde_skips_empty_metadata() {
        let result = SolveResult::new(JobId::new("j"), SampleSet::default(), "sim");
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("metadata").is_none());
        let back: SolveResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
