//! Pure evaluation routines.  Nothing here keeps state between calls.

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;

/// Threshold used when a caller does not pick one (suits `sign`/`tanh` outputs).
pub const DEFAULT_THRESHOLD: f64 = 0.0;

/// True/false positive/negative tallies from one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positive: usize,
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
}

impl ConfusionCounts {
    pub fn total(&self) -> usize {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// TP / (TP + FN), 0 when there are no positives.
    pub fn sensitivity(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// TN / (TN + FP), 0 when there are no negatives.
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negative, self.true_negative + self.false_positive)
    }

    /// TP / (TP + FP), 0 when nothing was predicted positive.
    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryMetrics {
    pub accuracy: f64,
    pub sensitivity: f64,
    pub specificity: f64,
    pub mean_squared_error: f64,
    pub counts: ConfusionCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MulticlassMetrics {
    pub accuracy: f64,
    pub mean_squared_error: f64,
    pub predicted_classes: Vec<usize>,
    pub true_classes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mean_squared_error: f64,
    pub predictions: Matrix,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProblemKind {
    Binary { threshold: f64 },
    Multiclass,
    Regression,
}

impl ProblemKind {
    /// Binary classification at `DEFAULT_THRESHOLD`.
    pub fn binary() -> ProblemKind {
        ProblemKind::Binary { threshold: DEFAULT_THRESHOLD }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Metrics {
    Binary(BinaryMetrics),
    Multiclass(MulticlassMetrics),
    Regression(RegressionMetrics),
}

impl Metrics {
    pub fn mean_squared_error(&self) -> f64 {
        match self {
            Metrics::Binary(m) => m.mean_squared_error,
            Metrics::Multiclass(m) => m.mean_squared_error,
            Metrics::Regression(m) => m.mean_squared_error,
        }
    }

    /// Classification accuracy; `None` for regression.
    pub fn accuracy(&self) -> Option<f64> {
        match self {
            Metrics::Binary(m) => Some(m.accuracy),
            Metrics::Multiclass(m) => Some(m.accuracy),
            Metrics::Regression(_) => None,
        }
    }
}

fn check_same_shape(context: &'static str, predictions: &Matrix, targets: &Matrix) -> Result<()> {
    if predictions.shape() != targets.shape() {
        return Err(Error::shape(context, targets.shape(), predictions.shape()));
    }
    Ok(())
}

/// Tallies both sides binarized as `value > threshold`.
pub fn confusion_counts(predictions: &Matrix, targets: &Matrix, threshold: f64) -> Result<ConfusionCounts> {
    check_same_shape("binary classification", predictions, targets)?;
    let mut counts = ConfusionCounts::default();
    for (&p, &t) in predictions.iter().zip(targets.iter()) {
        match (p > threshold, t > threshold) {
            (true, true) => counts.true_positive += 1,
            (false, false) => counts.true_negative += 1,
            (true, false) => counts.false_positive += 1,
            (false, true) => counts.false_negative += 1,
        }
    }
    Ok(counts)
}

pub fn binary_classification_metrics(predictions: &Matrix, targets: &Matrix, threshold: f64) -> Result<BinaryMetrics> {
    let counts = confusion_counts(predictions, targets, threshold)?;
    Ok(BinaryMetrics {
        accuracy: counts.accuracy(),
        sensitivity: counts.sensitivity(),
        specificity: counts.specificity(),
        mean_squared_error: MseLoss::loss(targets, predictions)?,
        counts,
    })
}

/// Arg-max class per row on both sides; accuracy is the fraction that agree.
pub fn multiclass_metrics(predictions: &Matrix, targets: &Matrix) -> Result<MulticlassMetrics> {
    check_same_shape("multiclass classification", predictions, targets)?;
    let predicted_classes = predictions.argmax_rows();
    let true_classes = targets.argmax_rows();
    let hits = predicted_classes.iter().zip(true_classes.iter())
        .filter(|(p, t)| p == t)
        .count();
    Ok(MulticlassMetrics {
        accuracy: ratio(hits, true_classes.len()),
        mean_squared_error: MseLoss::loss(targets, predictions)?,
        predicted_classes,
        true_classes,
    })
}

pub fn regression_metrics(predictions: &Matrix, targets: &Matrix) -> Result<RegressionMetrics> {
    Ok(RegressionMetrics {
        mean_squared_error: MseLoss::loss(targets, predictions)?,
        predictions: predictions.clone(),
    })
}

/// Dispatches on `kind`.
pub fn evaluate(predictions: &Matrix, targets: &Matrix, kind: ProblemKind) -> Result<Metrics> {
    Ok(match kind {
        ProblemKind::Binary { threshold } => {
            Metrics::Binary(binary_classification_metrics(predictions, targets, threshold)?)
        }
        ProblemKind::Multiclass => Metrics::Multiclass(multiclass_metrics(predictions, targets)?),
        ProblemKind::Regression => Metrics::Regression(regression_metrics(predictions, targets)?),
    })
}

/// `num_classes × num_classes` tally; cell `[true][predicted]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub num_classes: usize,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn get(&self, true_class: usize, predicted_class: usize) -> usize {
        self.counts[true_class][predicted_class]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Sum of the diagonal.
    pub fn correct(&self) -> usize {
        (0..self.num_classes).map(|c| self.counts[c][c]).sum()
    }
}

pub fn confusion_matrix(predicted_classes: &[usize], true_classes: &[usize], num_classes: usize) -> Result<ConfusionMatrix> {
    if predicted_classes.len() != true_classes.len() {
        return Err(Error::ShapeMismatch {
            context: "confusion matrix",
            expected: format!("{} predictions", true_classes.len()),
            found: format!("{} predictions", predicted_classes.len()),
        });
    }
    let mut counts = vec![vec![0usize; num_classes]; num_classes];
    for (&t, &p) in true_classes.iter().zip(predicted_classes.iter()) {
        if t >= num_classes || p >= num_classes {
            return Err(Error::InvalidParameter(format!(
                "class pair ({t}, {p}) outside 0..{num_classes}"
            )));
        }
        counts[t][p] += 1;
    }
    Ok(ConfusionMatrix { num_classes, counts })
}
