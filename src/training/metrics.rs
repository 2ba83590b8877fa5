//! Classification metrics

use ndarray::Array1;

/// Area under the ROC curve via the Mann-Whitney rank statistic.
///
/// Tied scores receive their midrank, so the result equals the trapezoidal
/// area under the ROC curve. With hard 0/1 scores this reduces to
/// (TPR + TNR) / 2. Returns 0.5 when `y_true` contains a single class.
pub fn roc_auc_score(y_true: &Array1<f64>, y_score: &Array1<f64>) -> f64 {
    let n = y_true.len();
    if n == 0 || y_score.len() != n {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        y_score[a]
            .partial_cmp(&y_score[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Midranks: every member of a tied group gets the group's average rank
    let mut ranks = vec![0.0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && y_score[order[j + 1]] == y_score[order[i]] {
            j += 1;
        }
        let midrank = (i + j + 2) as f64 / 2.0;
        for k in i..=j {
            ranks[order[k]] = midrank;
        }
        i = j + 1;
    }

    let mut rank_sum_pos = 0.0;
    let mut n_pos = 0.0;
    let mut n_neg = 0.0;
    for (idx, &label) in y_true.iter().enumerate() {
        if label > 0.5 {
            rank_sum_pos += ranks[idx];
            n_pos += 1.0;
        } else {
            n_neg += 1.0;
        }
    }

    if n_pos == 0.0 || n_neg == 0.0 {
        return 0.5;
    }
    (rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg)
}

/// Fraction of labels predicted correctly
pub fn accuracy_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (**t - **p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}
