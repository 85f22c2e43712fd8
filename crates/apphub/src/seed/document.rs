//! Seed document shapes.
//!
//! Every seed file is a YAML document `{kind, items}`. The header is read
//! first to pick the item type, then the whole document is decoded again
//! with the typed items.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::SeedError;
use crate::model::{RiskMessages, Section, TargetLabel, Thresholds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SeedKind {
    TagCategory,
    JobFunction,
    RuleSet,
    Target,
    Questionnaire,
}

impl FromStr for SeedKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tagcategory" => Ok(SeedKind::TagCategory),
            "jobfunction" => Ok(SeedKind::JobFunction),
            "ruleset" => Ok(SeedKind::RuleSet),
            "target" => Ok(SeedKind::Target),
            "questionnaire" => Ok(SeedKind::Questionnaire),
            _ => Err(format!("Unknown seed kind: {}", s)),
        }
    }
}

impl fmt::Display for SeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeedKind::TagCategory => "tagcategory",
            SeedKind::JobFunction => "jobfunction",
            SeedKind::RuleSet => "ruleset",
            SeedKind::Target => "target",
            SeedKind::Questionnaire => "questionnaire",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Deserialize)]
struct Header {
    kind: String,
}

#[derive(Debug, Deserialize)]
struct Document<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagSeed {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagCategorySeed {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub tags: Vec<TagSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobFunctionSeed {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleSeed {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Rule file, relative to the seed directory.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleSetSeed {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Uuids of the rule sets this one depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub rules: Vec<RuleSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetSeed {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub choice: bool,
    #[serde(default)]
    pub labels: Vec<TargetLabel>,
    /// Uuid of the rule set backing the target.
    #[serde(default)]
    pub ruleset: Option<String>,
    /// Image file, relative to the seed directory.
    #[serde(default)]
    pub image: Option<String>,
}

fn required_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireSeed {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "required_default")]
    pub required: bool,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub risk_messages: RiskMessages,
}

/// Items of every kind collected from the seed directory.
#[derive(Debug, Default)]
pub struct Catalog {
    pub tag_categories: Vec<TagCategorySeed>,
    pub job_functions: Vec<JobFunctionSeed>,
    pub rule_sets: Vec<RuleSetSeed>,
    pub targets: Vec<TargetSeed>,
    pub questionnaires: Vec<QuestionnaireSeed>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.tag_categories.len()
            + self.job_functions.len()
            + self.rule_sets.len()
            + self.targets.len()
            + self.questionnaires.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds the items of one seed file. Unknown kinds are skipped.
    pub fn with(&mut self, content: &str, path: &Path) -> Result<(), SeedError> {
        let header: Header = parse(content, path)?;
        let kind = match header.kind.parse::<SeedKind>() {
            Ok(kind) => kind,
            Err(_) => {
                tracing::warn!(
                    kind = %header.kind,
                    path = %path.display(),
                    "Seed kind not supported"
                );
                return Ok(());
            }
        };
        match kind {
            SeedKind::TagCategory => self.tag_categories.extend(items(content, path)?),
            SeedKind::JobFunction => self.job_functions.extend(items(content, path)?),
            SeedKind::RuleSet => self.rule_sets.extend(items(content, path)?),
            SeedKind::Target => self.targets.extend(items(content, path)?),
            SeedKind::Questionnaire => self.questionnaires.extend(items(content, path)?),
        }
        Ok(())
    }
}

fn parse<T: DeserializeOwned>(content: &str, path: &Path) -> Result<T, SeedError> {
    serde_yaml::from_str(content).map_err(|e| SeedError::ParseYaml {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn items<T: DeserializeOwned>(content: &str, path: &Path) -> Result<Vec<T>, SeedError> {
    let document: Document<T> = parse(content, path)?;
    Ok(document.items)
}
