//! treetune - Bayesian hyperparameter tuning for boosted tree classifiers
//!
//! This crate searches the hyperparameter space of an XGBoost-style gradient
//! boosted binary classifier, scoring each candidate by its mean AUC over
//! stratified cross validation folds.
//!
//! # Modules
//!
//! - [`data`] - CSV loading into dense feature matrices
//! - [`training`] - Boosted tree classifier, cross validation, metrics
//! - [`optimizer`] - Search spaces, samplers, Bayesian optimization
//! - [`tuner`] - Tuning driver wiring the objective and optimizer together
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data loading
pub mod data;

// Model training and evaluation
pub mod training;

// Hyperparameter optimization
pub mod optimizer;

// Tuning driver
pub mod tuner;

// Services
pub mod cli;

pub use error::{Result, TreeTuneError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, TreeTuneError};

    // Data loading
    pub use crate::data::TabularDataset;

    // Training
    pub use crate::training::{
        accuracy_score, roc_auc_score, CVStrategy, CrossValidator, XGBoostClassifier,
        XGBoostConfig,
    };

    // Optimization
    pub use crate::optimizer::{
        AcquisitionFunction, BayesianOptimizer, GaussianProcess, OptimizationConfig,
        ParameterValue, SamplerType, SearchSpace, Study,
    };

    // Tuning
    pub use crate::tuner::{tune, xgb_search_space, Scoring, TuneOutcome, Tuner, TunerConfig};
}
