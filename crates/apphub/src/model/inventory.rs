//! Inventory entities: tags, applications, archetypes and the people
//! attached to them.

use serde::{Deserialize, Serialize};

use super::assessment::Assessment;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCategory {
    pub id: i64,
    pub uuid: Option<String>,
    pub name: String,
    pub color: String,
}

/// A tag, unique by `(category, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
}

/// Source repository of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Repository {
    pub kind: String,
    pub url: String,
    pub branch: String,
    pub path: String,
}

/// An inventoried application.
///
/// `tags` holds every tag applied to the application regardless of the
/// source that applied it. `assessments` are loaded with the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub repository: Option<Repository>,
    pub binary: String,
    pub comments: String,
    pub bucket_id: Option<i64>,
    pub tags: Vec<Tag>,
    pub identities: Vec<i64>,
    pub assessments: Vec<Assessment>,
}

/// A named bundle of criteria tags. An application is a member when its
/// tags cover `criteria_tags`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Archetype {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub comments: String,
    pub criteria_tags: Vec<Tag>,
    pub tags: Vec<Tag>,
    pub assessments: Vec<Assessment>,
    pub stakeholders: Vec<i64>,
    pub stakeholder_groups: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stakeholder {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub job_function_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeholderGroup {
    pub id: i64,
    pub name: String,
    pub description: String,
}
