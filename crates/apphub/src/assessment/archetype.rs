//! Per-archetype view over its assessments and members.

use super::application::dedup;
use super::{
    confidence, risk, AssessmentError, MembershipResolver, QuestionnaireResolver, TagResolver,
};
use crate::model::{Archetype, Assessment, Risk, Tag};

pub struct ArchetypeResolver<'a> {
    archetype: &'a Archetype,
    tags: &'a TagResolver,
    membership: &'a MembershipResolver,
    questionnaire: &'a QuestionnaireResolver,
}

impl<'a> ArchetypeResolver<'a> {
    pub fn new(
        archetype: &'a Archetype,
        tags: &'a TagResolver,
        membership: &'a MembershipResolver,
        questionnaire: &'a QuestionnaireResolver,
    ) -> Self {
        Self {
            archetype,
            tags,
            membership,
            questionnaire,
        }
    }

    pub fn required_assessments(&self) -> Vec<&'a Assessment> {
        self.archetype
            .assessments
            .iter()
            .filter(|a| self.questionnaire.required(a.questionnaire_id))
            .collect()
    }

    /// Tags applied by any of the archetype's assessments, required or not.
    pub fn assessment_tags(&self) -> Vec<Tag> {
        dedup(
            self.archetype
                .assessments
                .iter()
                .flat_map(|a| self.tags.assessment(a)),
        )
    }

    pub fn risk(&self) -> Risk {
        risk(self.required_assessments())
    }

    pub fn confidence(&self) -> u32 {
        confidence(self.required_assessments())
    }

    pub fn assessed(&self) -> bool {
        self.questionnaire.assessed(&self.archetype.assessments)
    }

    /// Ids of the member applications.
    pub fn applications(&self) -> Result<Vec<i64>, AssessmentError> {
        self.membership.applications(self.archetype.id)
    }
}
