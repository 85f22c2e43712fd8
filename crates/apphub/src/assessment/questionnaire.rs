//! Required-questionnaire coverage.

use std::collections::HashSet;

use super::AssessmentError;
use crate::db::{questionnaire_repo, Database};
use crate::model::Assessment;

/// Caches the ids of required questionnaires.
#[derive(Debug, Clone, Default)]
pub struct QuestionnaireResolver {
    required: HashSet<i64>,
}

impl QuestionnaireResolver {
    pub fn new(db: &Database) -> Result<Self, AssessmentError> {
        Ok(Self::from_required(questionnaire_repo::required_ids(db)?))
    }

    pub fn from_required<I: IntoIterator<Item = i64>>(ids: I) -> Self {
        Self {
            required: ids.into_iter().collect(),
        }
    }

    pub fn required(&self, questionnaire_id: i64) -> bool {
        self.required.contains(&questionnaire_id)
    }

    /// True when every required questionnaire has a complete assessment
    /// among `assessments`. False when nothing is required.
    pub fn assessed<'a, I>(&self, assessments: I) -> bool
    where
        I: IntoIterator<Item = &'a Assessment>,
    {
        if self.required.is_empty() {
            return false;
        }
        let complete: HashSet<i64> = assessments
            .into_iter()
            .filter(|a| a.complete())
            .map(|a| a.questionnaire_id)
            .collect();
        self.required.iter().all(|id| complete.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, AssessmentOwner, Question, Section};

    fn assessment(questionnaire_id: i64, answered: bool) -> Assessment {
        Assessment {
            id: 0,
            owner: AssessmentOwner::Application(1),
            questionnaire_id,
            sections: vec![Section {
                questions: vec![Question {
                    answers: vec![Answer {
                        selected: answered,
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }],
            thresholds: Default::default(),
            risk_messages: Default::default(),
            stakeholders: vec![],
            stakeholder_groups: vec![],
        }
    }

    #[test]
    fn test_assessed_needs_every_required() {
        let r = QuestionnaireResolver::from_required([1, 2]);
        assert!(r.required(1));
        assert!(!r.required(3));

        let one = [assessment(1, true)];
        assert!(!r.assessed(&one));

        let both = [assessment(1, true), assessment(2, true)];
        assert!(r.assessed(&both));

        let incomplete = [assessment(1, true), assessment(2, false)];
        assert!(!r.assessed(&incomplete));

        let extra = [assessment(1, true), assessment(2, true), assessment(9, false)];
        assert!(r.assessed(&extra));
    }

    #[test]
    fn test_nothing_required_is_never_assessed() {
        let r = QuestionnaireResolver::default();
        assert!(!r.assessed(&[assessment(1, true)]));
    }

    #[test]
    fn test_loads_from_store() {
        use crate::db::questionnaire_repo;
        use crate::model::Questionnaire;

        let db = Database::open_in_memory().unwrap();
        let id = questionnaire_repo::insert(
            &db,
            &Questionnaire {
                name: "q".into(),
                required: true,
                ..Default::default()
            },
        )
        .unwrap();
        let r = QuestionnaireResolver::new(&db).unwrap();
        assert!(r.required(id));
    }
}
