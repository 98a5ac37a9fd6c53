//! Detection models: a supervised random forest, an unsupervised isolation
//! forest, and the rule that combines their verdicts.

pub mod isolation_forest;
pub mod random_forest;

pub use isolation_forest::{IsolationConfig, IsolationForest};
pub use random_forest::{ForestConfig, RandomForest};

/// Combine the two model verdicts.
///
/// The ensemble alarms when either model flags the sample; a detection by one
/// model is never outvoted by the other. This trades extra false positives
/// for recall on attacks only one model can see.
pub fn or_ensemble(classifier_attack: bool, anomaly_flag: bool) -> bool {
    classifier_attack || anomaly_flag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_ensemble_truth_table() {
        assert!(!or_ensemble(false, false));
        assert!(or_ensemble(true, false));
        assert!(or_ensemble(false, true));
        assert!(or_ensemble(true, true));
    }
}
