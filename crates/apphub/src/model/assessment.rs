//! Questionnaires and assessments.
//!
//! Sections, questions and answers are stored as JSON documents on the
//! owning questionnaire/assessment row; field names follow the camelCase
//! wire format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Risk level of an answer, an assessment or a group of assessments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    Red,
    Yellow,
    Green,
    #[default]
    Unknown,
}

impl Risk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Risk::Red => "red",
            Risk::Yellow => "yellow",
            Risk::Green => "green",
            Risk::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Risk {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(Risk::Red),
            "yellow" => Ok(Risk::Yellow),
            "green" => Ok(Risk::Green),
            "unknown" => Ok(Risk::Unknown),
            other => Err(format!("unknown risk '{}'", other)),
        }
    }
}

/// Progress of an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Empty,
    Started,
    Complete,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Empty => "empty",
            Status::Started => "started",
            Status::Complete => "complete",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human `(category, tag)` pair, resolved to a tag id at evaluation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizedTag {
    pub category: String,
    pub tag: String,
}

impl CategorizedTag {
    pub fn new(category: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            tag: tag.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Answer {
    pub order: u32,
    pub text: String,
    pub risk: Risk,
    pub rationale: String,
    pub mitigation: String,
    pub apply_tags: Vec<CategorizedTag>,
    pub auto_answer_for: Vec<CategorizedTag>,
    pub selected: bool,
    pub auto_answered: bool,
}

/// A question. `include_for` and `exclude_for` are never both set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Question {
    pub order: u32,
    pub text: String,
    pub explanation: String,
    pub include_for: Vec<CategorizedTag>,
    pub exclude_for: Vec<CategorizedTag>,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Section {
    pub order: u32,
    pub name: String,
    pub questions: Vec<Question>,
    pub comment: String,
}

/// Risk thresholds, each a percentage in `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub red: u32,
    pub yellow: u32,
    pub unknown: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskMessages {
    pub red: String,
    pub yellow: String,
    pub green: String,
    pub unknown: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Questionnaire {
    pub id: i64,
    pub uuid: Option<String>,
    pub name: String,
    pub description: String,
    pub required: bool,
    pub sections: Vec<Section>,
    pub thresholds: Thresholds,
    pub risk_messages: RiskMessages,
}

/// The single owner of an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssessmentOwner {
    Application(i64),
    Archetype(i64),
}

/// A (possibly partial) answered copy of a questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: i64,
    pub owner: AssessmentOwner,
    pub questionnaire_id: i64,
    pub sections: Vec<Section>,
    pub thresholds: Thresholds,
    pub risk_messages: RiskMessages,
    #[serde(default)]
    pub stakeholders: Vec<i64>,
    #[serde(default)]
    pub stakeholder_groups: Vec<i64>,
}

impl Assessment {
    /// A fresh assessment of `questionnaire` for `owner`, copying its
    /// sections, thresholds and risk messages.
    pub fn from_questionnaire(owner: AssessmentOwner, questionnaire: &Questionnaire) -> Self {
        Self {
            id: 0,
            owner,
            questionnaire_id: questionnaire.id,
            sections: questionnaire.sections.clone(),
            thresholds: questionnaire.thresholds,
            risk_messages: questionnaire.risk_messages.clone(),
            stakeholders: Vec::new(),
            stakeholder_groups: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_defaults_when_fields_missing() {
        let answer: Answer = serde_json::from_str(r#"{"text": "Yes"}"#).unwrap();
        assert_eq!(answer.text, "Yes");
        assert_eq!(answer.risk, Risk::Unknown);
        assert!(!answer.selected);
        assert!(answer.apply_tags.is_empty());
    }

    #[test]
    fn test_question_uses_camel_case() {
        let question: Question = serde_json::from_str(
            r#"{"text": "Q", "includeFor": [{"category": "Language", "tag": "Java"}],
                "answers": [{"risk": "red", "autoAnswerFor": [{"category": "C", "tag": "T"}]}]}"#,
        )
        .unwrap();
        assert_eq!(question.include_for, vec![CategorizedTag::new("Language", "Java")]);
        assert_eq!(question.answers[0].risk, Risk::Red);
        assert_eq!(question.answers[0].auto_answer_for.len(), 1);

        let json = serde_json::to_value(&question).unwrap();
        assert!(json.get("excludeFor").is_some());
        assert!(json["answers"][0].get("autoAnswered").is_some());
    }

    #[test]
    fn test_risk_parse_and_display() {
        for risk in [Risk::Red, Risk::Yellow, Risk::Green, Risk::Unknown] {
            assert_eq!(risk.to_string().parse::<Risk>().unwrap(), risk);
        }
        assert!("purple".parse::<Risk>().is_err());
    }

    #[test]
    fn test_from_questionnaire_copies_content() {
        let questionnaire = Questionnaire {
            id: 7,
            name: "q".into(),
            required: true,
            sections: vec![Section {
                name: "s".into(),
                ..Default::default()
            }],
            thresholds: Thresholds {
                red: 5,
                yellow: 10,
                unknown: 20,
            },
            ..Default::default()
        };
        let a = Assessment::from_questionnaire(AssessmentOwner::Application(3), &questionnaire);
        assert_eq!(a.questionnaire_id, 7);
        assert_eq!(a.sections.len(), 1);
        assert_eq!(a.thresholds.unknown, 20);
        assert_eq!(a.owner, AssessmentOwner::Application(3));
    }
}
