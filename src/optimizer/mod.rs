//! Hyperparameter optimization
//!
//! Sequential model-based minimization: an ordered search space, random and
//! Gaussian-process samplers, and a driver that records every trial in a
//! study.

mod config;
mod optimizer;
mod samplers;
pub mod gaussian_process;
pub mod search_space;

pub use config::OptimizationConfig;
pub use gaussian_process::{AcquisitionFunction, GaussianProcess, KernelType};
pub use optimizer::{BayesianOptimizer, Study, TrialResult};
pub use samplers::{create_sampler, GpSampler, RandomSampler, Sampler, SamplerType};
pub use search_space::{Parameter, ParameterType, ParameterValue, SearchSpace, TrialParams};
