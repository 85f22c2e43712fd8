//! Seeded catalog entities.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFunction {
    pub id: i64,
    pub uuid: Option<String>,
    pub name: String,
}

/// A named set of analysis rules. `depends_on` lists rule set ids and
/// never forms a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub id: i64,
    pub uuid: Option<String>,
    pub name: String,
    pub description: String,
    pub depends_on: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    pub id: i64,
    pub name: String,
    pub rule_set_id: i64,
    pub labels: Vec<String>,
    pub file_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetLabel {
    pub name: String,
    pub label: String,
}

/// A migration target offered to users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub id: i64,
    pub uuid: Option<String>,
    pub name: String,
    pub description: String,
    pub provider: String,
    pub choice: bool,
    pub labels: Vec<TargetLabel>,
    pub image_id: Option<i64>,
    pub rule_set_id: Option<i64>,
}
