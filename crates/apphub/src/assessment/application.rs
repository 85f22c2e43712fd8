//! Per-application view over its own and its archetypes' assessments.

use std::cell::OnceCell;

use super::{confidence, risk, MembershipResolver, QuestionnaireResolver, TagResolver, TagSet};
use crate::model::{Application, Archetype, Assessment, Risk, Tag};

/// Answers archetype and assessment questions about one application.
///
/// The application's own required assessments take precedence. Only when
/// it has none are the required assessments of its archetypes used.
pub struct ApplicationResolver<'a> {
    application: &'a Application,
    tags: &'a TagResolver,
    membership: &'a MembershipResolver,
    questionnaire: &'a QuestionnaireResolver,
    archetypes: OnceCell<Vec<&'a Archetype>>,
}

impl<'a> ApplicationResolver<'a> {
    pub fn new(
        application: &'a Application,
        tags: &'a TagResolver,
        membership: &'a MembershipResolver,
        questionnaire: &'a QuestionnaireResolver,
    ) -> Self {
        Self {
            application,
            tags,
            membership,
            questionnaire,
            archetypes: OnceCell::new(),
        }
    }

    /// Most specific archetypes of the application, resolved once.
    pub fn archetypes(&self) -> &[&'a Archetype] {
        self.archetypes
            .get_or_init(|| self.membership.archetypes(self.application))
    }

    /// Own assessments of a required questionnaire.
    pub fn required_assessments(&self) -> Vec<&'a Assessment> {
        self.application
            .assessments
            .iter()
            .filter(|a| self.questionnaire.required(a.questionnaire_id))
            .collect()
    }

    /// Union of the archetypes' tags, first occurrence wins.
    pub fn archetype_tags(&self) -> Vec<Tag> {
        dedup(self.archetypes().iter().flat_map(|a| a.tags.iter().cloned()))
    }

    /// Tags applied by the selected answers of the governing assessments.
    pub fn assessment_tags(&self) -> Vec<Tag> {
        dedup(
            self.assessments()
                .into_iter()
                .flat_map(|a| self.tags.assessment(a)),
        )
    }

    pub fn risk(&self) -> Risk {
        risk(self.assessments())
    }

    pub fn confidence(&self) -> u32 {
        confidence(self.assessments())
    }

    /// Whether the application counts as assessed, directly or through
    /// every one of its archetypes.
    pub fn assessed(&self) -> bool {
        let own = self.required_assessments();
        if !own.is_empty() {
            return self.questionnaire.assessed(own);
        }
        let archetypes = self.archetypes();
        !archetypes.is_empty()
            && archetypes
                .iter()
                .all(|a| self.questionnaire.assessed(&a.assessments))
    }

    /// The assessments that govern risk, confidence and tags.
    fn assessments(&self) -> Vec<&'a Assessment> {
        let own = self.required_assessments();
        if !own.is_empty() {
            return own;
        }
        self.archetypes()
            .iter()
            .copied()
            .flat_map(|a| a.assessments.iter())
            .filter(|a| self.questionnaire.required(a.questionnaire_id))
            .collect()
    }
}

pub(crate) fn dedup<I: IntoIterator<Item = Tag>>(tags: I) -> Vec<Tag> {
    let mut seen = TagSet::new();
    tags.into_iter()
        .filter(|t| {
            let fresh = !seen.contains(t.id);
            seen.add(t.id);
            fresh
        })
        .collect()
}
