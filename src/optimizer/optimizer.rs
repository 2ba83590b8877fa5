//! Sequential Bayesian optimization driver

use crate::error::{Result, TreeTuneError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

use super::config::OptimizationConfig;
use super::samplers::{create_sampler, Sampler};
use super::search_space::{ParameterValue, SearchSpace, TrialParams};

/// Result of a single trial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    /// Trial number
    pub trial_id: usize,
    /// Parameters by name
    pub params: TrialParams,
    /// Objective value
    pub value: f64,
    /// Trial duration in seconds
    pub duration_secs: f64,
}

/// Study containing all trials of one optimization run.
///
/// Values are minimized; the best trial is the one with the lowest finite
/// objective value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Study {
    /// All trial results
    pub trials: Vec<TrialResult>,
    /// Best trial index
    pub best_trial_idx: Option<usize>,
    /// Total duration
    pub total_duration_secs: f64,
}

impl Study {
    pub fn new() -> Self {
        Self {
            trials: Vec::new(),
            best_trial_idx: None,
            total_duration_secs: 0.0,
        }
    }

    pub fn best_trial(&self) -> Option<&TrialResult> {
        self.best_trial_idx.map(|idx| &self.trials[idx])
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best_trial().map(|t| t.value)
    }

    pub fn best_params(&self) -> Option<&TrialParams> {
        self.best_trial().map(|t| &t.params)
    }

    pub fn add_trial(&mut self, result: TrialResult) {
        let idx = self.trials.len();
        let is_better = match self.best_trial_idx {
            None => result.value.is_finite(),
            Some(best_idx) => result.value < self.trials[best_idx].value,
        };
        if is_better {
            self.best_trial_idx = Some(idx);
        }
        self.trials.push(result);
    }

    /// Persist the study as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously saved study
    pub fn load(path: impl AsRef<Path>) -> Result<Study> {
        let json = std::fs::read_to_string(path)?;
        let study: Study = serde_json::from_str(&json)?;
        Ok(study)
    }
}

impl Default for Study {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequential minimizer over a search space.
///
/// Runs `n_calls` objective evaluations, random for the first
/// `n_random_starts` and model-guided afterwards. Objective failures abort
/// the run and propagate.
pub struct BayesianOptimizer {
    config: OptimizationConfig,
    search_space: SearchSpace,
    sampler: Box<dyn Sampler>,
    study: Study,
}

impl BayesianOptimizer {
    pub fn new(config: OptimizationConfig, search_space: SearchSpace) -> Result<Self> {
        config.validate()?;
        search_space.validate()?;

        let sampler = create_sampler(
            config.sampler,
            config.random_state,
            config.n_random_starts,
            config.acquisition,
        );

        Ok(Self {
            config,
            search_space,
            sampler,
            study: Study::new(),
        })
    }

    /// Run the optimization loop with the given objective
    pub fn optimize<F>(&mut self, mut objective: F) -> Result<&Study>
    where
        F: FnMut(&[ParameterValue]) -> Result<f64>,
    {
        let start = Instant::now();
        let mut history: Vec<(Vec<ParameterValue>, f64)> = Vec::new();

        for trial_id in 0..self.config.n_calls {
            let trial_start = Instant::now();

            let values = self.sampler.sample(&self.search_space, &history)?;
            let value = objective(&values)?;

            history.push((values.clone(), value));

            let result = TrialResult {
                trial_id,
                params: self.search_space.zip_params(&values)?,
                value,
                duration_secs: trial_start.elapsed().as_secs_f64(),
            };

            self.study.add_trial(result);

            if self.config.verbose {
                println!(
                    "Trial {}: value={:.6} (best={:.6})",
                    trial_id,
                    value,
                    self.study.best_value().unwrap_or(value)
                );
            }
        }

        self.study.total_duration_secs = start.elapsed().as_secs_f64();

        if self.study.best_trial_idx.is_none() {
            return Err(TreeTuneError::OptimizationError(
                "no trial produced a finite objective value".to_string(),
            ));
        }

        Ok(&self.study)
    }

    pub fn study(&self) -> &Study {
        &self.study
    }

    pub fn search_space(&self) -> &SearchSpace {
        &self.search_space
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::samplers::SamplerType;

    fn quadratic(values: &[ParameterValue]) -> Result<f64> {
        let x = values[0].as_float();
        let y = values[1].as_float();
        Ok(x * x + y * y)
    }

    fn test_space() -> SearchSpace {
        SearchSpace::new().float("x", -5.0, 5.0).float("y", -5.0, 5.0)
    }

    #[test]
    fn test_optimizer_runs_all_trials() {
        let config = OptimizationConfig::new()
            .with_n_calls(20)
            .with_n_random_starts(10)
            .with_seed(42)
            .with_verbose(false);

        let mut optimizer = BayesianOptimizer::new(config, test_space()).unwrap();
        let study = optimizer.optimize(quadratic).unwrap();

        assert_eq!(study.trials.len(), 20);
        let best = study.best_value().unwrap();
        assert!(best >= 0.0 && best < 25.0, "best value was {}", best);
    }

    #[test]
    fn test_all_random_budget_never_consults_model() {
        // n_random_starts >= n_calls keeps every trial in the startup phase
        let config = OptimizationConfig::new()
            .with_n_calls(10)
            .with_n_random_starts(10)
            .with_seed(1)
            .with_verbose(false);

        let mut optimizer = BayesianOptimizer::new(config, test_space()).unwrap();
        let study = optimizer.optimize(quadratic).unwrap();
        assert_eq!(study.trials.len(), 10);
        assert!(study.trials.iter().all(|t| t.value.is_finite()));
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let run = || {
            let config = OptimizationConfig::new()
                .with_n_calls(15)
                .with_n_random_starts(5)
                .with_seed(7)
                .with_verbose(false);
            let mut optimizer = BayesianOptimizer::new(config, test_space()).unwrap();
            optimizer.optimize(quadratic).unwrap().best_value().unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_objective_failure_aborts() {
        let config = OptimizationConfig::new()
            .with_n_calls(10)
            .with_sampler(SamplerType::Random)
            .with_seed(3)
            .with_verbose(false);

        let mut optimizer = BayesianOptimizer::new(config, test_space()).unwrap();
        let mut calls = 0;
        let result = optimizer.optimize(|_| {
            calls += 1;
            if calls > 3 {
                Err(TreeTuneError::TrainingError("boom".to_string()))
            } else {
                Ok(1.0)
            }
        });

        assert!(matches!(result, Err(TreeTuneError::TrainingError(_))));
        assert_eq!(optimizer.study().trials.len(), 3);
    }

    #[test]
    fn test_rejects_empty_space() {
        let config = OptimizationConfig::new().with_verbose(false);
        assert!(BayesianOptimizer::new(config, SearchSpace::new()).is_err());
    }

    #[test]
    fn test_study_save_load_roundtrip() {
        let config = OptimizationConfig::new()
            .with_n_calls(5)
            .with_seed(11)
            .with_verbose(false);
        let mut optimizer = BayesianOptimizer::new(config, test_space()).unwrap();
        optimizer.optimize(quadratic).unwrap();

        let file = tempfile::NamedTempFile::new().unwrap();
        optimizer.study().save(file.path()).unwrap();

        let loaded = Study::load(file.path()).unwrap();
        assert_eq!(loaded.trials.len(), 5);
        assert_eq!(loaded.best_value(), optimizer.study().best_value());
    }
}
