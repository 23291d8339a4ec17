//! Trainable ML classifiers and their ensemble

pub mod ensemble;
pub mod forest;
pub mod logistic;

pub use ensemble::{MlEnsemble, MlPrediction, TrainingSummary};
pub use forest::{RandomForestClassifier, TreeNode};
pub use logistic::{LogisticClassifier, TrainingReport};
