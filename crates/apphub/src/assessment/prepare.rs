//! Question gating and auto-answering for a new assessment.

use super::{TagResolver, TagSet};
use crate::model::{Application, Archetype, Assessment, Question, Section};

/// Prepares `assessment` against the application's tags.
pub fn prepare_for_application(
    tags: &TagResolver,
    application: &Application,
    assessment: &mut Assessment,
) {
    let owned: TagSet = application.tags.iter().map(|t| t.id).collect();
    prepare_sections(tags, &owned, &mut assessment.sections);
}

/// Prepares `assessment` against the archetype's criteria tags and tags.
pub fn prepare_for_archetype(
    tags: &TagResolver,
    archetype: &Archetype,
    assessment: &mut Assessment,
) {
    let owned: TagSet = archetype
        .criteria_tags
        .iter()
        .chain(&archetype.tags)
        .map(|t| t.id)
        .collect();
    prepare_sections(tags, &owned, &mut assessment.sections);
}

fn prepare_sections(resolver: &TagResolver, owned: &TagSet, sections: &mut [Section]) {
    for section in sections {
        let questions = std::mem::take(&mut section.questions);
        section.questions = questions
            .into_iter()
            .filter_map(|mut q| {
                auto_answer(resolver, owned, &mut q);
                keep(resolver, owned, &q).then_some(q)
            })
            .collect();
    }
}

fn auto_answer(resolver: &TagResolver, owned: &TagSet, question: &mut Question) {
    for answer in &mut question.answers {
        if resolver.resolve_all(&answer.auto_answer_for).intersects(owned) {
            answer.selected = true;
            answer.auto_answered = true;
            break;
        }
    }
}

fn keep(resolver: &TagResolver, owned: &TagSet, question: &Question) -> bool {
    if !question.include_for.is_empty() {
        return resolver.resolve_all(&question.include_for).intersects(owned);
    }
    if !question.exclude_for.is_empty() {
        return !resolver.resolve_all(&question.exclude_for).intersects(owned);
    }
    true
}
