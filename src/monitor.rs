//! Shared monitoring state fed by classification results.
//!
//! Keeps bounded recent-history rings, an unbounded attack log, and the
//! latest traffic gauges behind one lock. Snapshots are cheap copies meant
//! for status output.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::engine::{AttackType, Decision};
use crate::features::FeatureVector;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Ring size for traffic and decision history
    pub history_capacity: usize,
    /// Decisions included in a snapshot
    pub snapshot_decisions: usize,
    /// Attack-log entries included in a snapshot
    pub snapshot_attacks: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            snapshot_decisions: 20,
            snapshot_attacks: 10,
        }
    }
}

/// One classified observation as kept in the decision ring
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub is_attack: bool,
    pub attack_type: AttackType,
    pub confidence: f32,
    pub packets_per_sec: f32,
}

/// Attack-log line; the log keeps every attack since the last reset
#[derive(Debug, Clone, Serialize)]
pub struct AttackLogEntry {
    /// Wall-clock time of day, HH:MM:SS
    pub time: String,
    pub attack_type: AttackType,
    pub confidence: f32,
    pub packets_per_sec: f32,
}

/// Latest traffic gauges; overwritten by every recorded observation
#[derive(Debug, Clone, Serialize)]
pub struct CurrentStats {
    pub packets_per_sec: f32,
    pub bytes_per_sec: f32,
    pub unique_src_ips: f32,
    pub status: AttackType,
    pub confidence: f32,
    pub alerts: u64,
}

impl Default for CurrentStats {
    fn default() -> Self {
        Self {
            packets_per_sec: 0.0,
            bytes_per_sec: 0.0,
            unique_src_ips: 0.0,
            status: AttackType::Normal,
            confidence: 0.0,
            alerts: 0,
        }
    }
}

/// Point-in-time copy of the monitoring state
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub current: CurrentStats,
    pub traffic_history: Vec<f32>,
    pub recent_decisions: Vec<DecisionRecord>,
    pub recent_attacks: Vec<AttackLogEntry>,
    /// Filled in by the caller when training metadata is available
    pub model_accuracy: Option<f32>,
}

#[derive(Default)]
struct MonitorInner {
    traffic_history: VecDeque<f32>,
    decision_history: VecDeque<DecisionRecord>,
    attack_log: Vec<AttackLogEntry>,
    current: CurrentStats,
}

pub struct TrafficMonitor {
    inner: RwLock<MonitorInner>,
    config: MonitorConfig,
}

impl TrafficMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            inner: RwLock::new(MonitorInner::default()),
            config,
        }
    }

    /// Fold one classified observation into the state under a single write lock
    pub fn record(&self, decision: &Decision, features: &FeatureVector) {
        let mut inner = self.inner.write();

        push_bounded(
            &mut inner.traffic_history,
            features.packets_per_sec(),
            self.config.history_capacity,
        );
        push_bounded(
            &mut inner.decision_history,
            DecisionRecord {
                timestamp: decision.timestamp,
                is_attack: decision.is_attack,
                attack_type: decision.attack_type,
                confidence: decision.confidence,
                packets_per_sec: features.packets_per_sec(),
            },
            self.config.history_capacity,
        );

        inner.current.packets_per_sec = features.packets_per_sec();
        inner.current.bytes_per_sec = features.bytes_per_sec();
        inner.current.unique_src_ips = features.unique_src_ips();
        inner.current.confidence = decision.confidence;
        inner.current.status = if decision.is_attack {
            decision.attack_type
        } else {
            AttackType::Normal
        };

        if decision.is_attack {
            inner.current.alerts += 1;
            inner.attack_log.push(AttackLogEntry {
                time: decision.timestamp.format("%H:%M:%S").to_string(),
                attack_type: decision.attack_type,
                confidence: decision.confidence,
                packets_per_sec: features.packets_per_sec(),
            });
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let inner = self.inner.read();
        let decisions_from =
            inner.decision_history.len().saturating_sub(self.config.snapshot_decisions);
        let attacks_from = inner.attack_log.len().saturating_sub(self.config.snapshot_attacks);

        MonitorSnapshot {
            current: inner.current.clone(),
            traffic_history: inner.traffic_history.iter().copied().collect(),
            recent_decisions: inner.decision_history.iter().skip(decisions_from).cloned().collect(),
            recent_attacks: inner.attack_log[attacks_from..].to_vec(),
            model_accuracy: None,
        }
    }

    /// Clear histories, the attack log, and the alert counter.
    /// The other gauges keep their last observed values.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.traffic_history.clear();
        inner.decision_history.clear();
        inner.attack_log.clear();
        inner.current.alerts = 0;
    }

    pub fn alerts(&self) -> u64 {
        self.inner.read().current.alerts
    }
}

fn push_bounded<T>(buf: &mut VecDeque<T>, value: T, capacity: usize) {
    if buf.len() >= capacity {
        buf.pop_front();
    }
    buf.push_back(value);
}
