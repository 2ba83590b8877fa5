//! Hyperparameter tuning driver for the boosted tree classifier.
//!
//! Wires together the search space, the cross validated objective, and the
//! Bayesian optimizer. Each trial trains one booster per fold and the
//! objective is the negated mean AUC, so lower is better throughout.

use crate::data::TabularDataset;
use crate::error::{Result, TreeTuneError};
use crate::optimizer::{
    AcquisitionFunction, BayesianOptimizer, OptimizationConfig, ParameterValue, SamplerType,
    SearchSpace, Study, TrialParams,
};
use crate::training::{
    roc_auc_score, CVResults, CVStrategy, CrossValidator, XGBoostClassifier, XGBoostConfig,
};
use ndarray::Axis;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// How held-out fold predictions are scored against the labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scoring {
    /// AUC computed over hard 0/1 predictions at the 0.5 threshold.
    #[default]
    HardLabel,
    /// AUC computed over predicted positive-class probabilities.
    Probability,
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scoring::HardLabel => write!(f, "hard-label"),
            Scoring::Probability => write!(f, "probability"),
        }
    }
}

/// Settings for one tuning session.
#[derive(Debug, Clone)]
pub struct TunerConfig {
    /// Name of the binary label column in the input data.
    pub target_column: String,
    /// Number of stratified cross validation folds per trial.
    pub cv_folds: usize,
    pub scoring: Scoring,
    /// Total objective evaluations.
    pub n_calls: usize,
    /// Trials sampled uniformly before the surrogate takes over.
    pub n_random_starts: usize,
    /// Boosting rounds for every trained model.
    pub n_estimators: usize,
    pub sampler: SamplerType,
    pub acquisition: AcquisitionFunction,
    pub seed: Option<u64>,
    pub verbose: bool,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            target_column: "response".to_string(),
            cv_folds: 5,
            scoring: Scoring::default(),
            n_calls: 10,
            n_random_starts: 10,
            n_estimators: 100,
            sampler: SamplerType::GaussianProcess,
            acquisition: AcquisitionFunction::default(),
            seed: None,
            verbose: true,
        }
    }
}

impl TunerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_column(mut self, name: impl Into<String>) -> Self {
        self.target_column = name.into();
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_scoring(mut self, scoring: Scoring) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_n_calls(mut self, n: usize) -> Self {
        self.n_calls = n;
        self
    }

    pub fn with_n_random_starts(mut self, n: usize) -> Self {
        self.n_random_starts = n;
        self
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_sampler(mut self, sampler: SamplerType) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_column.is_empty() {
            return Err(TreeTuneError::ConfigError(
                "target column name must not be empty".to_string(),
            ));
        }
        if self.cv_folds < 2 {
            return Err(TreeTuneError::ConfigError(
                "cross validation needs at least 2 folds".to_string(),
            ));
        }
        if self.n_estimators == 0 {
            return Err(TreeTuneError::ConfigError(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// The tuned booster hyperparameters, in canonical order.
///
/// Samplers emit values positionally against this order and the best
/// configuration is reported in the same order.
pub fn xgb_search_space() -> SearchSpace {
    SearchSpace::new()
        .int("max_depth", 4, 24)
        .int("gamma", 1, 9)
        .int("reg_alpha", 20, 150)
        .float("reg_lambda", 0.01, 1.0)
        .int("min_child_weight", 1, 10)
        .float("eta", 0.05, 0.30)
        .float("colsample_bytree", 0.5, 1.0)
        .float("base_score", 0.6, 0.95)
}

/// Map one positional sample onto a booster configuration.
fn config_from_values(
    values: &[ParameterValue],
    n_estimators: usize,
    random_state: Option<u64>,
) -> Result<XGBoostConfig> {
    if values.len() != 8 {
        return Err(TreeTuneError::ConfigError(format!(
            "expected 8 parameter values, got {}",
            values.len()
        )));
    }
    Ok(XGBoostConfig {
        n_estimators,
        max_depth: values[0].as_int() as usize,
        gamma: values[1].as_int() as f64,
        reg_alpha: values[2].as_int() as f64,
        reg_lambda: values[3].as_float(),
        min_child_weight: values[4].as_int() as f64,
        eta: values[5].as_float(),
        colsample_bytree: values[6].as_float(),
        base_score: values[7].as_float(),
        random_state,
        ..Default::default()
    })
}

/// Mean AUC over stratified folds for one booster configuration.
fn cross_validated_auc(
    model_config: &XGBoostConfig,
    dataset: &TabularDataset,
    cv_folds: usize,
    scoring: Scoring,
) -> Result<f64> {
    let validator = CrossValidator::new(CVStrategy::StratifiedKFold {
        n_splits: cv_folds,
        shuffle: false,
    });
    let splits = validator.split(dataset.n_samples(), Some(dataset.target()))?;

    let mut fold_scores = Vec::with_capacity(splits.len());
    for split in &splits {
        let x_train = dataset.features().select(Axis(0), &split.train_indices);
        let y_train = dataset.target().select(Axis(0), &split.train_indices);
        let x_test = dataset.features().select(Axis(0), &split.test_indices);
        let y_test = dataset.target().select(Axis(0), &split.test_indices);

        let mut model = XGBoostClassifier::new(model_config.clone());
        model.fit(&x_train, &y_train)?;

        let scores = match scoring {
            Scoring::HardLabel => model.predict(&x_test)?,
            Scoring::Probability => model.predict_proba(&x_test)?,
        };
        fold_scores.push(roc_auc_score(&y_test, &scores));
    }

    Ok(CVResults::from_scores(fold_scores).mean_score)
}

/// Result of a completed tuning session.
#[derive(Debug, Clone)]
pub struct TuneOutcome {
    /// Parameter names in canonical search space order.
    pub param_names: Vec<String>,
    /// Best sampled values, aligned with `param_names`.
    pub best_values: Vec<ParameterValue>,
    /// Best (lowest) objective value, the negated mean AUC.
    pub best_value: f64,
    pub study: Study,
}

impl TuneOutcome {
    /// Mean cross validated AUC of the best trial.
    pub fn mean_auc(&self) -> f64 {
        -self.best_value
    }

    /// Best parameters as a name -> value map.
    pub fn best_params(&self) -> TrialParams {
        self.param_names
            .iter()
            .cloned()
            .zip(self.best_values.iter().cloned())
            .collect()
    }

    /// Render the best configuration on a single line, in canonical order.
    pub fn render_params(&self) -> String {
        let parts: Vec<String> = self
            .param_names
            .iter()
            .zip(self.best_values.iter())
            .map(|(name, value)| format!("{name}: {value}"))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }
}

/// Drives Bayesian optimization of the booster hyperparameters.
pub struct Tuner {
    config: TunerConfig,
}

impl Tuner {
    pub fn new(config: TunerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    /// Run the full tuning loop against `dataset`.
    ///
    /// Every objective evaluation trains `cv_folds` boosters from scratch.
    /// Any data, training, or optimization failure aborts the session.
    pub fn run(&self, dataset: &TabularDataset) -> Result<TuneOutcome> {
        self.config.validate()?;

        info!(
            rows = dataset.n_samples(),
            features = dataset.n_features(),
            n_calls = self.config.n_calls,
            cv_folds = self.config.cv_folds,
            scoring = %self.config.scoring,
            "Starting tuning session"
        );

        let mut opt_config = OptimizationConfig::new()
            .with_n_calls(self.config.n_calls)
            .with_n_random_starts(self.config.n_random_starts)
            .with_sampler(self.config.sampler)
            .with_acquisition(self.config.acquisition)
            .with_verbose(self.config.verbose);
        if let Some(seed) = self.config.seed {
            opt_config = opt_config.with_seed(seed);
        }

        let mut optimizer = BayesianOptimizer::new(opt_config, xgb_search_space())?;

        let cfg = &self.config;
        let study = optimizer
            .optimize(|values| {
                let model_config = config_from_values(values, cfg.n_estimators, cfg.seed)?;
                let mean_auc =
                    cross_validated_auc(&model_config, dataset, cfg.cv_folds, cfg.scoring)?;
                Ok(-mean_auc)
            })?
            .clone();

        let param_names = optimizer.search_space().param_names();
        let best_trial = study.best_trial().cloned().ok_or_else(|| {
            TreeTuneError::OptimizationError("no completed trial produced a value".to_string())
        })?;

        let best_values: Vec<ParameterValue> = param_names
            .iter()
            .map(|name| {
                best_trial.params.get(name).cloned().ok_or_else(|| {
                    TreeTuneError::OptimizationError(format!(
                        "best trial is missing parameter '{name}'"
                    ))
                })
            })
            .collect::<Result<_>>()?;

        info!(
            trials = study.trials.len(),
            best_auc = -best_trial.value,
            "Tuning session complete"
        );

        Ok(TuneOutcome {
            param_names,
            best_values,
            best_value: best_trial.value,
            study,
        })
    }
}

/// Convenience entry point: tune `dataset` with `config`.
pub fn tune(config: TunerConfig, dataset: &TabularDataset) -> Result<TuneOutcome> {
    Tuner::new(config).run(dataset)
}
