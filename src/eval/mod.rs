pub mod metrics;
pub mod evaluator;

pub use evaluator::{NoiseRobustness, PerformanceEvaluator, Predictor, TrainingSummary};
pub use metrics::{
    binary_classification_metrics, confusion_matrix, evaluate, multiclass_metrics,
    regression_metrics, BinaryMetrics, ConfusionCounts, ConfusionMatrix, Metrics,
    MulticlassMetrics, ProblemKind, RegressionMetrics,
};
