use serde::{Deserialize, Serialize};

/// Credentials used by addons. `password`, `key` and `settings` are
/// encrypted at rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub description: String,
    pub user: String,
    pub password: String,
    pub key: String,
    pub settings: String,
}
