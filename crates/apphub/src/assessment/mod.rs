//! Assessment and archetype resolution.
//!
//! Resolvers are built per request from a snapshot of the store and are
//! read-only once constructed:
//!
//! - [`TagResolver`] maps `(category, tag)` names to tags.
//! - [`QuestionnaireResolver`] knows which questionnaires are required.
//! - [`MembershipResolver`] matches applications to their most specific
//!   archetypes.
//! - [`ApplicationResolver`] and [`ArchetypeResolver`] combine the above
//!   into risk, confidence and tag answers for one owner.

mod application;
mod archetype;
mod evaluator;
mod membership;
mod prepare;
mod questionnaire;
mod set;
mod tag;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::model::{Assessment, Risk};

pub use application::ApplicationResolver;
pub use archetype::ArchetypeResolver;
pub use evaluator::RiskCounts;
pub use membership::MembershipResolver;
pub use prepare::{prepare_for_application, prepare_for_archetype};
pub use questionnaire::QuestionnaireResolver;
pub use set::TagSet;
pub use tag::TagResolver;

// Confidence weights per risk.
pub const WEIGHT_RED: f64 = 1.0;
pub const WEIGHT_YELLOW: f64 = 80.0;
pub const WEIGHT_GREEN: f64 = 100.0;
pub const WEIGHT_UNKNOWN: f64 = 70.0;

// Confidence adjusters, applied once per red/yellow answer.
pub const ADJUSTER_RED: f64 = 0.5;
pub const ADJUSTER_YELLOW: f64 = 0.98;

pub const MULTIPLIER_RED: f64 = 0.6;
pub const MULTIPLIER_YELLOW: f64 = 0.95;

#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("Failed to load assessment data: {0}")]
    Database(#[from] DatabaseError),
}

/// Highest risk across a group of assessments.
///
/// Any red wins, then any unknown, then any yellow. Green requires every
/// assessment to be green; an empty group is unknown.
pub fn risk<'a, I>(assessments: I) -> Risk
where
    I: IntoIterator<Item = &'a Assessment>,
{
    let counts: RiskCounts = assessments.into_iter().map(Assessment::risk).collect();
    if counts.red > 0 {
        Risk::Red
    } else if counts.unknown > 0 {
        Risk::Unknown
    } else if counts.yellow > 0 {
        Risk::Yellow
    } else if counts.green > 0 {
        Risk::Green
    } else {
        Risk::Unknown
    }
}

/// Mean confidence of a group of assessments, truncated. Zero when empty.
pub fn confidence<'a, I>(assessments: I) -> u32
where
    I: IntoIterator<Item = &'a Assessment>,
{
    let (sum, n) = assessments
        .into_iter()
        .fold((0u32, 0u32), |(sum, n), a| (sum + a.confidence(), n + 1));
    if n == 0 {
        0
    } else {
        sum / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, AssessmentOwner, Question, Section, Thresholds};

    fn assessment(risks: &[Risk]) -> Assessment {
        Assessment {
            id: 0,
            owner: AssessmentOwner::Application(1),
            questionnaire_id: 1,
            sections: vec![Section {
                questions: risks
                    .iter()
                    .map(|&risk| Question {
                        answers: vec![Answer {
                            risk,
                            selected: true,
                            ..Default::default()
                        }],
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }],
            thresholds: Thresholds {
                red: 50,
                yellow: 50,
                unknown: 50,
            },
            risk_messages: Default::default(),
            stakeholders: vec![],
            stakeholder_groups: vec![],
        }
    }

    #[test]
    fn test_group_risk_precedence() {
        let green = assessment(&[Risk::Green]);
        let yellow = assessment(&[Risk::Yellow]);
        let red = assessment(&[Risk::Red]);
        let unknown = assessment(&[Risk::Unknown]);

        assert_eq!(risk([&green, &yellow, &red, &unknown]), Risk::Red);
        assert_eq!(risk([&green, &yellow, &unknown]), Risk::Unknown);
        assert_eq!(risk([&green, &yellow]), Risk::Yellow);
        assert_eq!(risk([&green, &green]), Risk::Green);
    }

    #[test]
    fn test_group_risk_empty_is_unknown() {
        assert_eq!(risk(std::iter::empty()), Risk::Unknown);
    }

    #[test]
    fn test_group_confidence_is_truncated_mean() {
        let green = assessment(&[Risk::Green]);
        let yellow = assessment(&[Risk::Yellow]);
        // (100 + 78) / 2
        assert_eq!(confidence([&green, &yellow]), 89);
        assert_eq!(confidence(std::iter::empty()), 0);

        let mixed = assessment(&[Risk::Red, Risk::Yellow, Risk::Green, Risk::Green]);
        assert_eq!(confidence([&mixed, &green, &green]), 78);
    }
}
