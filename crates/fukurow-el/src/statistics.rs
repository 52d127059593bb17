//! Saturation statistics

use crate::conclusion::ConclusionKind;
use crate::rules::RuleKind;
use serde::{Deserialize, Serialize};

/// Produced and unique conclusions per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConclusionCounter {
    produced: [u64; ConclusionKind::COUNT],
    unique: [u64; ConclusionKind::COUNT],
}

impl ConclusionCounter {
    pub(crate) fn count_produced(&mut self, kind: ConclusionKind) {
        self.produced[kind.index()] += 1;
    }

    pub(crate) fn count_unique(&mut self, kind: ConclusionKind) {
        self.unique[kind.index()] += 1;
    }

    pub fn produced(&self, kind: ConclusionKind) -> u64 {
        self.produced[kind.index()]
    }

    pub fn unique(&self, kind: ConclusionKind) -> u64 {
        self.unique[kind.index()]
    }

    pub fn total_produced(&self) -> u64 {
        self.produced.iter().sum()
    }

    pub fn total_unique(&self) -> u64 {
        self.unique.iter().sum()
    }

    fn merge(&mut self, other: &ConclusionCounter) {
        for i in 0..ConclusionKind::COUNT {
            self.produced[i] += other.produced[i];
            self.unique[i] += other.unique[i];
        }
    }
}

/// Rule applications per rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCounter {
    applications: [u64; RuleKind::COUNT],
}

impl RuleCounter {
    pub(crate) fn count(&mut self, rule: RuleKind) {
        self.applications[rule.index()] += 1;
    }

    pub fn applications(&self, rule: RuleKind) -> u64 {
        self.applications[rule.index()]
    }

    pub fn total(&self) -> u64 {
        self.applications.iter().sum()
    }

    fn merge(&mut self, other: &RuleCounter) {
        for (total, local) in self.applications.iter_mut().zip(other.applications.iter()) {
            *total += local;
        }
    }
}

/// Totals over every run of one engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaturationStatistics {
    pub contexts_created: u64,
    pub conclusions: ConclusionCounter,
    pub rules: RuleCounter,
    /// Number of `saturate` calls that finished
    pub runs: u32,
    pub elapsed_ms: u64,
}

impl SaturationStatistics {
    pub fn merge(&mut self, other: &SaturationStatistics) {
        self.contexts_created += other.contexts_created;
        self.conclusions.merge(&other.conclusions);
        self.rules.merge(&other.rules);
        self.runs += other.runs;
        self.elapsed_ms += other.elapsed_ms;
    }

    /// Every unique conclusion must have been produced first
    pub fn check_invariants(&self) -> Result<(), String> {
        for kind in ConclusionKind::ALL {
            let produced = self.conclusions.produced(kind);
            let unique = self.conclusions.unique(kind);
            if unique > produced {
                return Err(format!(
                    "{} {} conclusions processed but only {} produced",
                    unique,
                    kind.name(),
                    produced
                ));
            }
        }
        Ok(())
    }

    /// Rules sorted by number of applications, most used first
    pub fn busiest_rules(&self) -> Vec<(RuleKind, u64)> {
        let mut rules: Vec<_> = RuleKind::ALL
            .iter()
            .map(|&rule| (rule, self.rules.applications(rule)))
            .filter(|(_, count)| *count > 0)
            .collect();
        rules.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        rules
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
