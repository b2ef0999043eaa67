//! Solver registry.
//!
//! [`SolverRegistry`] maps names to factories so callers can build a
//! solver from a [`SolverConfig`] without naming its concrete type.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{HalError, HalResult};
use crate::solver::{Solver, SolverConfig, SolverFactory};

type Factory = Box<dyn Fn(SolverConfig) -> HalResult<Box<dyn Solver>> + Send + Sync>;

/// Registry of available solvers.
pub struct SolverRegistry {
    factories: FxHashMap<String, Factory>,
}

impl SolverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: FxHashMap::default(),
        }
    }

    /// Register a solver type under `name`.
    pub fn register<S>(&mut self, name: impl Into<String>)
    where
        S: SolverFactory + 'static,
    {
        let name = name.into();
        debug!("Registering solver: {}", name);
        self.factories.insert(
            name,
            Box::new(|config| {
                let solver = S::from_config(config)?;
                Ok(Box::new(solver))
            }),
        );
    }

    /// Register a closure factory under `name`.
    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(SolverConfig) -> HalResult<Box<dyn Solver>> + Send + Sync + 'static,
    ) {
        let name = name.into();
        debug!("Registering solver factory: {}", name);
        self.factories.insert(name, Box::new(factory));
    }

    /// Build the solver registered as `name`.
    pub fn create(&self, name: &str, config: SolverConfig) -> HalResult<Box<dyn Solver>> {
        match self.factories.get(name) {
            Some(factory) => factory(config),
            None => Err(HalError::SolverUnavailable(format!(
                "No solver registered with name '{name}'"
            ))),
        }
    }

    /// Registered names, sorted.
    pub fn available_solvers(&self) -> Vec<String> {
        let mut names: Vec<_> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether `name` is registered.
    pub fn has_solver(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for SolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capabilities;
    use crate::job::{JobId, JobStatus};
    use crate::problem::{JobConfig, Problem};
    use crate::result::SolveResult;
    use crate::solver::{SolverAvailability, ValidationResult};
    use async_trait::async_trait;

    struct Dummy {
        name: String,
        caps: Capabilities,
    }

    #[async_trait]
    impl Solver for Dummy {
        fn name(&self) -> &str {
            &self.name
        }
        fn capabilities(&self) -> &Capabilities {
            &self.caps
        }
        async fn availability(&self) -> HalResult<SolverAvailability> {
            Ok(SolverAvailability::always_available())
        }
        async fn validate(&self, _: &Problem, _: &JobConfig) -> HalResult<ValidationResult> {
            Ok(ValidationResult::Valid)
        }
        async fn submit(&self, _: &Problem, _: &JobConfig) -> HalResult<JobId> {
            Err(HalError::SolverUnavailable("dummy".into()))
        }
        async fn status(&self, _: &JobId) -> HalResult<JobStatus> {
            Ok(JobStatus::Queued)
        }
        async fn result(&self, job_id: &JobId) -> HalResult<SolveResult> {
            Err(HalError::JobNotFound(job_id.0.clone()))
        }
        async fn cancel(&self, _: &JobId) -> HalResult<()> {
            Ok(())
        }
    }

    impl SolverFactory for Dummy {
        fn from_config(config: SolverConfig) -> HalResult<Self> {
            Ok(Self {
                name: config.name,
                caps: Capabilities::simulator(4),
            })
        }
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = SolverRegistry::new();
        registry.register::<Dummy>("dummy");
        assert!(registry.has_solver("dummy"));

        let solver = registry
            .create("dummy", SolverConfig::new("dummy-1"))
            .unwrap();
        assert_eq!(solver.name(), "dummy-1");
    }

    #[test]
    fn test_unknown_solver() {
        let registry = SolverRegistry::new();
        assert!(matches!(
            registry.create("nope", SolverConfig::new("nope")),
            Err(HalError::SolverUnavailable(_))
        ));
    }

    #[test]
    fn test_available_sorted() {
        let mut registry = SolverRegistry::new();
        registry.register::<Dummy>("b");
        registry.register_factory("a", |config| {
            Ok(Box::new(Dummy::from_config(config)?) as Box<dyn Solver>)
        });
        assert_eq!(registry.available_solvers(), vec!["a", "b"]);
    }
}
