//! Request bodies: problem files and job descriptors.
//!
//! Problems are uploaded as JSON files before a job can reference them.
//! A QUBO file lists upper-triangular `{i, j, val}` entries; a polynomial
//! file lists `{idx, val}` monomials with 1-based indices left-padded
//! with `0` to `max_degree`.

use optiq_hal::{DeviceKind, JobConfig, JobType, Problem};
use optiq_model::{Polynomial, Qubo};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Body of `POST /optimization/v1/files`.
#[derive(Debug, Clone, Serialize)]
pub struct FileUpload {
    /// Display name of the file.
    pub file_name: String,
    /// Typed file contents.
    pub file_config: FileConfig,
}

/// File contents keyed by file type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileConfig {
    /// Sparse QUBO.
    Qubo {
        /// Non-zero upper-triangular entries.
        data: Vec<QuboEntry>,
        /// Number of binary variables.
        num_variables: usize,
    },
    /// Sparse polynomial.
    Polynomial {
        /// Number of variables.
        num_variables: usize,
        /// Smallest monomial degree.
        min_degree: usize,
        /// Largest monomial degree.
        max_degree: usize,
        /// Padded monomials.
        data: Vec<PolynomialEntry>,
    },
}

/// One QUBO entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuboEntry {
    /// Row (0-based).
    pub i: usize,
    /// Column (0-based, `i ≤ j`).
    pub j: usize,
    /// Coefficient.
    pub val: f64,
}

/// One polynomial monomial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolynomialEntry {
    /// Padded, 1-based variable indices.
    pub idx: Vec<usize>,
    /// Coefficient.
    pub val: f64,
}

impl FileUpload {
    /// File for a QUBO. The offset is not part of the file.
    pub fn qubo(file_name: impl Into<String>, qubo: &Qubo) -> Self {
        let data = qubo
            .upper_triangular_terms()
            .into_iter()
            .map(|(i, j, val)| QuboEntry { i, j, val })
            .collect();
        Self {
            file_name: file_name.into(),
            file_config: FileConfig::Qubo {
                data,
                num_variables: qubo.num_variables(),
            },
        }
    }

    /// File for a polynomial. The constant is not part of the file.
    pub fn polynomial(file_name: impl Into<String>, poly: &Polynomial) -> Self {
        let data = poly
            .padded_terms()
            .into_iter()
            .map(|(idx, val)| PolynomialEntry { idx, val })
            .collect();
        Self {
            file_name: file_name.into(),
            file_config: FileConfig::Polynomial {
                num_variables: poly.num_variables(),
                min_degree: poly.min_degree(),
                max_degree: poly.max_degree(),
                data,
            },
        }
    }

    /// File for a problem under a given job type.
    ///
    /// Binary jobs upload the QUBO itself; qudit jobs upload the
    /// polynomial form.
    pub fn for_problem(file_name: impl Into<String>, problem: &Problem, job_type: JobType) -> Self {
        match (job_type, problem) {
            (JobType::SampleQubo, Problem::Qubo(q)) => Self::qubo(file_name, q),
            _ => Self::polynomial(file_name, &problem.to_polynomial()),
        }
    }
}

/// Constant the service leaves out of reported energies.
pub fn energy_offset(problem: &Problem) -> f64 {
    match problem {
        Problem::Qubo(q) => q.offset(),
        Problem::Hamiltonian(_) => 0.0,
        Problem::Polynomial(p) => p.constant(),
    }
}

/// Key of the problem section for a job type.
pub fn problem_key(job_type: JobType) -> &'static str {
    match job_type {
        JobType::SampleQubo => "quadratic_unconstrained_binary_optimization",
        JobType::SampleHamiltonian => "normalized_qudit_hamiltonian_optimization",
        JobType::SampleHamiltonianInteger => "qudit_hamiltonian_optimization",
    }
}

/// Key of the device section for a job type.
pub fn device_key(job_type: JobType) -> &'static str {
    match job_type {
        JobType::SampleQubo => "dirac-1",
        JobType::SampleHamiltonian => "dirac-3_normalized_qudit",
        JobType::SampleHamiltonianInteger => "dirac-3_qudit",
    }
}

/// Body of `POST /optimization/v1/jobs`.
pub fn job_body(job_type: JobType, file_id: &str, config: &JobConfig) -> Value {
    let file_field = match job_type {
        JobType::SampleQubo => "qubo_file_id",
        _ => "polynomial_file_id",
    };

    let mut device = Map::new();
    device.insert("num_samples".into(), json!(config.num_samples));
    if config.device == DeviceKind::Dirac3 {
        if let Some(r) = config.relaxation_schedule {
            device.insert("relaxation_schedule".into(), json!(r));
        }
        match job_type {
            JobType::SampleHamiltonian => {
                device.insert(
                    "sum_constraint".into(),
                    json!(config.effective_sum_constraint()),
                );
                if let Some(p) = config.solution_precision {
                    device.insert("solution_precision".into(), json!(p));
                }
            }
            JobType::SampleHamiltonianInteger => {
                if let Some(levels) = &config.num_levels {
                    device.insert("num_levels".into(), json!(levels));
                }
            }
            JobType::SampleQubo => {}
        }
    }

    let job_name = config
        .job_name
        .clone()
        .unwrap_or_else(|| format!("optiq-{}", uuid::Uuid::new_v4()));

    json!({
        "job_submission": {
            "problem_config": { problem_key(job_type): { file_field: file_id } },
            "device_config": { device_key(job_type): Value::Object(device) },
        },
        "job_name": job_name,
        "job_tags": config.tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use optiq_model::Hamiltonian;

    #[test]
    fn test_qubo_file_shape() {
        let q = Qubo::from_terms(2, [(0, 0, -1.0), (0, 1, 3.0)])
            .unwrap()
            .with_offset(2.0);
        let json = serde_json::to_value(FileUpload::qubo("q", &q)).unwrap();
        assert_eq!(json["file_name"], "q");
        let qubo = &json["file_config"]["qubo"];
        assert_eq!(qubo["num_variables"], 2);
        assert_eq!(qubo["data"][0], json!({"i": 0, "j": 0, "val": -1.0}));
        assert_eq!(qubo["data"][1], json!({"i": 0, "j": 1, "val": 3.0}));
    }

    #[test]
    fn test_polynomial_file_shape() {
        let mut h = Hamiltonian::new(2);
        h.add_linear(1, 2.0).unwrap();
        h.add_quadratic(0, 1, -1.0).unwrap();
        let file = FileUpload::for_problem("h", &Problem::Hamiltonian(h), JobType::SampleHamiltonian);
        let json = serde_json::to_value(file).unwrap();
        let poly = &json["file_config"]["polynomial"];
        assert_eq!(poly["min_degree"], 1);
        assert_eq!(poly["max_degree"], 2);
        let data = poly["data"].as_array().unwrap();
        assert!(data.contains(&json!({"idx": [0, 2], "val": 2.0})));
        assert!(data.contains(&json!({"idx": [1, 2], "val": -1.0})));
    }

    #[test]
    fn test_qubo_on_qudit_device_uploads_square_terms() {
        let q = Qubo::from_terms(1, [(0, 0, 1.0)]).unwrap();
        let file = FileUpload::for_problem("q", &Problem::Qubo(q), JobType::SampleHamiltonian);
        let json = serde_json::to_value(file).unwrap();
        let poly = &json["file_config"]["polynomial"];
        assert_eq!(poly["data"], json!([{"idx": [1, 1], "val": 1.0}]));
        assert_eq!(poly["min_degree"], 2);
    }

    #[test]
    fn test_qubo_job_body() {
        let cfg = JobConfig::new(DeviceKind::Dirac1, 25)
            .with_job_name("crew")
            .with_tag("demo");
        let body = job_body(JobType::SampleQubo, "file-1", &cfg);
        assert_eq!(
            body["job_submission"]["problem_config"]["quadratic_unconstrained_binary_optimization"]
                ["qubo_file_id"],
            "file-1"
        );
        assert_eq!(
            body["job_submission"]["device_config"]["dirac-1"],
            json!({"num_samples": 25})
        );
        assert_eq!(body["job_name"], "crew");
        assert_eq!(body["job_tags"], json!(["demo"]));
    }

    #[test]
    fn test_continuous_job_body() {
        let cfg = JobConfig::new(DeviceKind::Dirac3, 5)
            .with_relaxation_schedule(2)
            .with_sum_constraint(10.0)
            .with_solution_precision(0.1);
        let body = job_body(JobType::SampleHamiltonian, "file-2", &cfg);
        let device = &body["job_submission"]["device_config"]["dirac-3_normalized_qudit"];
        assert_eq!(device["num_samples"], 5);
        assert_eq!(device["relaxation_schedule"], 2);
        assert_eq!(device["sum_constraint"], 10.0);
        assert_eq!(device["solution_precision"], 0.1);
        assert!(body["job_name"].as_str().unwrap().starts_with("optiq-"));
    }

    #[test]
    fn test_integer_job_body() {
        let cfg = JobConfig::new(DeviceKind::Dirac3, 5).with_num_levels(vec![3, 4]);
        let body = job_body(JobType::SampleHamiltonianInteger, "file-3", &cfg);
        let device = &body["job_submission"]["device_config"]["dirac-3_qudit"];
        assert_eq!(device["num_levels"], json!([3, 4]));
        assert!(device.get("sum_constraint").is_none());
    }

    #[test]
    fn test_energy_offset() {
        let q = Qubo::new(1).with_offset(4.0);
        assert_eq!(energy_offset(&Problem::Qubo(q)), 4.0);
    }
}
