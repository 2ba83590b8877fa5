//! Model training and evaluation
//!
//! The gradient-boosted binary classifier, the cross-validation splitters
//! used to evaluate it, and the metrics scored on held-out folds.

pub mod cross_validation;
pub mod metrics;
pub mod xgboost;

pub use cross_validation::{CVResults, CVSplit, CVStrategy, CrossValidator};
pub use metrics::{accuracy_score, roc_auc_score};
pub use xgboost::{XGBoostClassifier, XGBoostConfig};
