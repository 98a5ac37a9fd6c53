//! Traffic feature schema shared between training and inference.
//!
//! The order of `FEATURE_NAMES` is part of the model contract: every trained
//! scaler and model assumes exactly this layout.

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};

/// Feature names in model input order
pub const FEATURE_NAMES: &[&str] = &[
    "packets_per_sec",
    "bytes_per_sec",
    "unique_src_ips",
    "unique_dst_ports",
    "avg_packet_size",
    "packet_size_variance",
    "flow_duration",
    "syn_count",
    "rst_count",
    "ack_count",
    "connection_rate",
    "src_ip_entropy",
];

/// Number of features per observation
pub const NUM_FEATURES: usize = 12;

/// Feature positions for direct access
pub mod idx {
    pub const PACKETS_PER_SEC: usize = 0;
    pub const BYTES_PER_SEC: usize = 1;
    pub const UNIQUE_SRC_IPS: usize = 2;
    pub const UNIQUE_DST_PORTS: usize = 3;
    pub const AVG_PACKET_SIZE: usize = 4;
    pub const PACKET_SIZE_VARIANCE: usize = 5;
    pub const FLOW_DURATION: usize = 6;
    pub const SYN_COUNT: usize = 7;
    pub const RST_COUNT: usize = 8;
    pub const ACK_COUNT: usize = 9;
    pub const CONNECTION_RATE: usize = 10;
    pub const SRC_IP_ENTROPY: usize = 11;
}

/// One traffic observation in model input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    features: Vec<f32>,
}

impl FeatureVector {
    /// Build from a value list, rejecting any length other than `NUM_FEATURES`.
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.len() != NUM_FEATURES {
            return Err(DetectError::DimensionMismatch {
                expected: NUM_FEATURES,
                got: values.len(),
            });
        }
        Ok(Self { features: values })
    }

    /// Build from a fixed-size array, `FEATURE_NAMES` order
    pub fn from_array(values: [f32; NUM_FEATURES]) -> Self {
        Self {
            features: values.to_vec(),
        }
    }

    /// Get feature by name
    pub fn get(&self, name: &str) -> Option<f32> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .and_then(|idx| self.features.get(idx).copied())
    }

    /// Get all features as a slice
    pub fn as_slice(&self) -> &[f32] {
        &self.features
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Name of the first non-finite feature, if any
    pub fn non_finite_feature(&self) -> Option<&'static str> {
        self.features
            .iter()
            .position(|v| !v.is_finite())
            .map(|idx| FEATURE_NAMES[idx])
    }

    pub fn packets_per_sec(&self) -> f32 {
        self.features[idx::PACKETS_PER_SEC]
    }

    pub fn bytes_per_sec(&self) -> f32 {
        self.features[idx::BYTES_PER_SEC]
    }

    pub fn unique_src_ips(&self) -> f32 {
        self.features[idx::UNIQUE_SRC_IPS]
    }

    pub fn syn_count(&self) -> f32 {
        self.features[idx::SYN_COUNT]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_vector() -> FeatureVector {
        FeatureVector::from_array([
            100.0, 50_000.0, 5.0, 2.0, 500.0, 100.0, 5.0, 5.0, 2.0, 50.0, 10.0, 3.0,
        ])
    }

    #[test]
    fn test_name_order_matches_indices() {
        assert_eq!(FEATURE_NAMES.len(), NUM_FEATURES);
        assert_eq!(FEATURE_NAMES[idx::PACKETS_PER_SEC], "packets_per_sec");
        assert_eq!(FEATURE_NAMES[idx::SYN_COUNT], "syn_count");
        assert_eq!(FEATURE_NAMES[idx::SRC_IP_ENTROPY], "src_ip_entropy");
    }

    #[test]
    fn test_get_by_name() {
        let v = make_vector();
        assert_eq!(v.get("packets_per_sec"), Some(100.0));
        assert_eq!(v.get("syn_count"), Some(5.0));
        assert_eq!(v.get("no_such_feature"), None);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = FeatureVector::new(vec![1.0; 7]).unwrap_err();
        match err {
            crate::error::DetectError::DimensionMismatch { expected, got } => {
                assert_eq!(expected, NUM_FEATURES);
                assert_eq!(got, 7);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_named_accessors() {
        let v = make_vector();
        assert_eq!(v.packets_per_sec(), 100.0);
        assert_eq!(v.bytes_per_sec(), 50_000.0);
        assert_eq!(v.unique_src_ips(), 5.0);
        assert_eq!(v.syn_count(), 5.0);
    }

    #[test]
    fn test_non_finite_detection() {
        let mut values = [0.0_f32; NUM_FEATURES];
        values[idx::FLOW_DURATION] = f32::NAN;
        let v = FeatureVector::from_array(values);
        assert_eq!(v.non_finite_feature(), Some("flow_duration"));
        assert_eq!(make_vector().non_finite_feature(), None);
    }
}
