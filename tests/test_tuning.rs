//! Integration test: Hyperparameter tuning end-to-end

use ndarray::{Array1, Axis};
use polars::prelude::*;
use std::io::Write;
use treetune::data::TabularDataset;
use treetune::optimizer::ParameterType;
use treetune::training::{
    roc_auc_score, CVStrategy, CrossValidator, XGBoostClassifier, XGBoostConfig,
};
use treetune::tuner::{tune, xgb_search_space, Scoring, TunerConfig};
use treetune::TreeTuneError;

/// Two classes on opposite sides of a wide gap in feature space, so any
/// boundary learned from a training fold also separates the held-out fold.
fn separable_dataset(n_per_class: usize) -> TabularDataset {
    let n = 2 * n_per_class;
    let x: Vec<f64> = (0..n)
        .map(|i| if i >= n_per_class { i as f64 + 1000.0 } else { i as f64 })
        .collect();
    let spread: Vec<f64> = (0..n).map(|i| ((i * 37) % 11) as f64).collect();
    let y: Vec<i64> = (0..n).map(|i| (i >= n_per_class) as i64).collect();

    let df = df!(
        "x" => x,
        "spread" => spread,
        "response" => y,
    )
    .unwrap();
    TabularDataset::from_dataframe(&df, "response").unwrap()
}

/// Wide-gap separable pattern padded with uninformative columns.
fn separable_wide_dataset(n_per_class: usize, n_features: usize) -> TabularDataset {
    let n = 2 * n_per_class;
    let x: Vec<f64> = (0..n)
        .map(|i| if i >= n_per_class { i as f64 + 1000.0 } else { i as f64 })
        .collect();
    let mut columns = vec![Column::new("x".into(), x)];
    for f in 1..n_features {
        let values: Vec<f64> = (0..n)
            .map(|i| {
                let h = i.wrapping_mul(2654435761).wrapping_add(f.wrapping_mul(40503));
                (h % 1000) as f64 / 1000.0
            })
            .collect();
        columns.push(Column::new(format!("f{f}").into(), values));
    }
    let y: Vec<i64> = (0..n).map(|i| (i >= n_per_class) as i64).collect();
    columns.push(Column::new("response".into(), y));

    let df = DataFrame::new(columns).unwrap();
    TabularDataset::from_dataframe(&df, "response").unwrap()
}

/// Balanced labels with features that carry no signal about them.
fn noise_dataset(n_per_class: usize, n_features: usize) -> TabularDataset {
    let n = 2 * n_per_class;
    let mut columns: Vec<Column> = (0..n_features)
        .map(|f| {
            let values: Vec<f64> = (0..n)
                .map(|i| {
                    let h = i.wrapping_mul(2654435761).wrapping_add(f.wrapping_mul(40503));
                    (h % 1000) as f64 / 1000.0
                })
                .collect();
            Column::new(format!("f{f}").into(), values)
        })
        .collect();
    let y: Vec<i64> = (0..n).map(|i| (i % 2 == 0) as i64).collect();
    columns.push(Column::new("response".into(), y));

    let df = DataFrame::new(columns).unwrap();
    TabularDataset::from_dataframe(&df, "response").unwrap()
}

#[test]
fn test_feature_matrix_excludes_target_column() {
    let df = df!(
        "a" => &[1.0, 2.0, 3.0, 4.0],
        "response" => &[0i64, 1, 0, 1],
        "b" => &[5.0, 6.0, 7.0, 8.0],
    )
    .unwrap();

    let dataset = TabularDataset::from_dataframe(&df, "response").unwrap();
    assert_eq!(dataset.n_samples(), 4);
    assert_eq!(dataset.n_features(), df.width() - 1);
    assert_eq!(dataset.feature_names(), &["a", "b"]);
    assert_eq!(dataset.target().to_vec(), vec![0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn test_search_space_structure() {
    let space = xgb_search_space();
    assert_eq!(space.len(), 8);
    assert_eq!(
        space.param_names(),
        [
            "max_depth",
            "gamma",
            "reg_alpha",
            "reg_lambda",
            "min_child_weight",
            "eta",
            "colsample_bytree",
            "base_score",
        ]
    );

    for (idx, low, high) in [(0usize, 4i64, 24i64), (1, 1, 9), (2, 20, 150), (4, 1, 10)] {
        match &space.parameters()[idx].param_type {
            ParameterType::Int { low: l, high: h } => assert_eq!((*l, *h), (low, high)),
            other => panic!("parameter {idx} should be an integer range, got {other:?}"),
        }
    }
    for (idx, low, high) in [(3usize, 0.01, 1.0), (5, 0.05, 0.30), (6, 0.5, 1.0), (7, 0.6, 0.95)] {
        match &space.parameters()[idx].param_type {
            ParameterType::Float { low: l, high: h, log_scale } => {
                assert_eq!((*l, *h), (low, high));
                assert!(!log_scale);
            }
            other => panic!("parameter {idx} should be a float range, got {other:?}"),
        }
    }
}

#[test]
fn test_stratified_folds_are_deterministic_and_balanced() {
    let y: Array1<f64> = (0..60).map(|i| if i % 3 == 0 { 1.0 } else { 0.0 }).collect();
    let validator = CrossValidator::new(CVStrategy::StratifiedKFold {
        n_splits: 5,
        shuffle: false,
    });

    let a = validator.split(60, Some(&y)).unwrap();
    let b = validator.split(60, Some(&y)).unwrap();
    assert_eq!(a, b, "unshuffled stratified folds should be reproducible");

    for split in &a {
        assert_eq!(split.test_indices.len(), 12);
        let positives = split.test_indices.iter().filter(|&&i| y[i] == 1.0).count();
        assert_eq!(positives, 4, "each fold should hold out 4 of the 20 positives");
    }
}

#[test]
fn test_cross_validated_objective_is_perfect_on_separable_data() {
    let dataset = separable_dataset(200);
    let model_config = XGBoostConfig {
        n_estimators: 50,
        gamma: 1.0,
        reg_alpha: 20.0,
        reg_lambda: 0.5,
        base_score: 0.6,
        random_state: Some(3),
        ..Default::default()
    };

    let validator = CrossValidator::new(CVStrategy::StratifiedKFold {
        n_splits: 5,
        shuffle: false,
    });
    let splits = validator
        .split(dataset.n_samples(), Some(dataset.target()))
        .unwrap();
    assert_eq!(splits.len(), 5);

    let mut hard_sum = 0.0;
    let mut proba_sum = 0.0;
    for split in &splits {
        let x_train = dataset.features().select(Axis(0), &split.train_indices);
        let y_train = dataset.target().select(Axis(0), &split.train_indices);
        let x_test = dataset.features().select(Axis(0), &split.test_indices);
        let y_test = dataset.target().select(Axis(0), &split.test_indices);

        let mut model = XGBoostClassifier::new(model_config.clone());
        model.fit(&x_train, &y_train).unwrap();

        hard_sum += roc_auc_score(&y_test, &model.predict(&x_test).unwrap());
        proba_sum += roc_auc_score(&y_test, &model.predict_proba(&x_test).unwrap());
    }

    let hard_auc = hard_sum / 5.0;
    let proba_auc = proba_sum / 5.0;
    assert!((hard_auc - 1.0).abs() < 1e-9, "hard-label CV AUC = {hard_auc}");
    assert!((proba_auc - 1.0).abs() < 1e-9, "probability CV AUC = {proba_auc}");
}

#[test]
fn test_full_tuning_session_with_defaults() {
    let dataset = noise_dataset(50, 5);
    assert_eq!(dataset.n_samples(), 100);
    assert_eq!(dataset.n_features(), 5);

    // Default session: 10 calls, 10 random starts, 5 folds, hard-label AUC.
    let config = TunerConfig::default().with_seed(42).with_verbose(false);
    let outcome = tune(config, &dataset).unwrap();

    assert_eq!(outcome.study.trials.len(), 10);
    for trial in &outcome.study.trials {
        assert!(trial.value.is_finite());
        assert!(
            (-1.0..=0.0).contains(&trial.value),
            "objective out of range: {}",
            trial.value
        );
        assert_eq!(trial.params.len(), 8);
    }

    let space = xgb_search_space();
    assert_eq!(outcome.param_names, space.param_names());
    assert!(space.contains(&outcome.best_values));
    assert!((0.0..=1.0).contains(&outcome.mean_auc()));

    // The reported line carries every parameter, in space order.
    let line = outcome.render_params();
    assert!(line.starts_with("{max_depth: "));
    assert!(!line.contains('\n'));
    let mut cursor = 0;
    for name in &outcome.param_names {
        let key = format!("{}: ", name);
        let pos = line[cursor..]
            .find(&key)
            .unwrap_or_else(|| panic!("missing {} in {}", name, line));
        cursor += pos + key.len();
    }
}

#[test]
fn test_default_session_on_separable_pattern() {
    let dataset = separable_wide_dataset(50, 5);
    assert_eq!(dataset.n_samples(), 100);
    assert_eq!(dataset.n_features(), 5);

    let config = TunerConfig::default().with_seed(7).with_verbose(false);
    let outcome = tune(config, &dataset).unwrap();

    assert_eq!(outcome.study.trials.len(), 10);
    for trial in &outcome.study.trials {
        assert!((-1.0..=0.0).contains(&trial.value));
        assert_eq!(trial.params.len(), 8);
    }

    let space = xgb_search_space();
    assert_eq!(outcome.param_names, space.param_names());
    assert!(space.contains(&outcome.best_values));
    assert!(!outcome.render_params().contains('\n'));

    // A training fold holds only 40 negatives, so once their probability
    // nears 0.5 no leaf gradient sum exceeds reg_alpha's lower bound of 20.
    // Hard labels cannot rank below chance here, only at or above it.
    assert!((0.5..=1.0).contains(&outcome.mean_auc()));
}

#[test]
fn test_noise_data_stays_near_chance_across_seeds() {
    let dataset = noise_dataset(50, 3);
    for seed in [1, 9, 17, 42, 101] {
        let config = TunerConfig::default()
            .with_n_calls(6)
            .with_n_random_starts(6)
            .with_n_estimators(30)
            .with_seed(seed)
            .with_verbose(false);

        let outcome = tune(config, &dataset).unwrap();
        let auc = outcome.mean_auc();
        assert!(
            (0.35..=0.8).contains(&auc),
            "best AUC on label noise should stay near 0.5, got {auc} for seed {seed}"
        );
    }
}

#[test]
fn test_probability_scoring_session() {
    let dataset = separable_dataset(50);
    let config = TunerConfig::default()
        .with_scoring(Scoring::Probability)
        .with_n_calls(3)
        .with_n_random_starts(3)
        .with_n_estimators(10)
        .with_cv_folds(3)
        .with_seed(5)
        .with_verbose(false);

    let outcome = tune(config, &dataset).unwrap();
    assert_eq!(outcome.study.trials.len(), 3);
    assert!((0.0..=1.0).contains(&outcome.mean_auc()));
}

#[test]
fn test_missing_target_column_is_fatal() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "a,b").unwrap();
    writeln!(file, "1.0,2.0").unwrap();
    writeln!(file, "3.0,4.0").unwrap();

    let err = TabularDataset::from_csv(file.path(), "response").unwrap_err();
    assert!(matches!(err, TreeTuneError::ColumnNotFound(_)));
}

#[test]
fn test_non_binary_target_is_fatal() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "a,response").unwrap();
    writeln!(file, "1.0,0").unwrap();
    writeln!(file, "2.0,1").unwrap();
    writeln!(file, "3.0,2").unwrap();

    let err = TabularDataset::from_csv(file.path(), "response").unwrap_err();
    assert!(matches!(err, TreeTuneError::DataError(_)));
}

#[test]
fn test_missing_file_is_fatal() {
    assert!(TabularDataset::from_csv("/no/such/file.csv", "response").is_err());
}
