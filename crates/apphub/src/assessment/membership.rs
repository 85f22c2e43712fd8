//! Archetype membership by criteria-tag inclusion.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};

use super::{AssessmentError, TagSet};
use crate::db::{application_repo, archetype_repo, Database};
use crate::model::{Application, Archetype, Tag};

/// Resolves which archetypes an application belongs to.
///
/// Archetypes (with criteria tags, tags and assessments) are loaded once
/// at construction. Each resolution records the reverse mapping so
/// [`MembershipResolver::applications`] can answer from it. Not `Sync`;
/// build one per request.
pub struct MembershipResolver {
    db: Database,
    archetypes: Vec<Archetype>,
    criteria: Vec<TagSet>,
    members: RefCell<HashMap<i64, BTreeSet<i64>>>,
    members_cached: Cell<bool>,
}

impl MembershipResolver {
    pub fn new(db: &Database) -> Result<Self, AssessmentError> {
        let archetypes = archetype_repo::list(db)?;
        tracing::debug!(count = archetypes.len(), "Archetypes cached");
        Ok(Self::with_archetypes(db.clone(), archetypes))
    }

    pub(crate) fn with_archetypes(db: Database, archetypes: Vec<Archetype>) -> Self {
        let criteria = archetypes
            .iter()
            .map(|a| a.criteria_tags.iter().map(|t| t.id).collect())
            .collect();
        Self {
            db,
            archetypes,
            criteria,
            members: RefCell::new(HashMap::new()),
            members_cached: Cell::new(false),
        }
    }

    pub fn all(&self) -> &[Archetype] {
        &self.archetypes
    }

    /// Criteria tag set of a cached archetype.
    pub fn criteria(&self, archetype_id: i64) -> Option<&TagSet> {
        self.archetypes
            .iter()
            .position(|a| a.id == archetype_id)
            .map(|i| &self.criteria[i])
    }

    /// The most specific archetypes whose criteria the application's tags
    /// cover. Incomparable matches are all kept.
    pub fn archetypes(&self, application: &Application) -> Vec<&Archetype> {
        let kept = self.most_specific(&tag_set(&application.tags));
        let mut members = self.members.borrow_mut();
        kept.into_iter()
            .map(|i| {
                let archetype = &self.archetypes[i];
                members
                    .entry(archetype.id)
                    .or_default()
                    .insert(application.id);
                archetype
            })
            .collect()
    }

    /// Ids of the applications that belong to the archetype.
    ///
    /// The first call resolves every application in the store.
    pub fn applications(&self, archetype_id: i64) -> Result<Vec<i64>, AssessmentError> {
        self.cache_members()?;
        Ok(self
            .members
            .borrow()
            .get(&archetype_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default())
    }

    fn cache_members(&self) -> Result<(), AssessmentError> {
        if self.members_cached.get() {
            return Ok(());
        }
        let mut resolved = Vec::new();
        application_repo::for_each_tag_set(&self.db, |app_id, tags| {
            resolved.push((app_id, self.most_specific(&tag_set(&tags))));
        })?;
        let mut members = self.members.borrow_mut();
        for (app_id, kept) in resolved {
            for i in kept {
                members
                    .entry(self.archetypes[i].id)
                    .or_default()
                    .insert(app_id);
            }
        }
        self.members_cached.set(true);
        Ok(())
    }

    /// Indexes of matching archetypes not dominated by another match.
    fn most_specific(&self, tags: &TagSet) -> Vec<usize> {
        let candidates: Vec<usize> = (0..self.archetypes.len())
            .filter(|&i| tags.superset(&self.criteria[i], false))
            .collect();
        candidates
            .iter()
            .copied()
            .filter(|&i| {
                !candidates
                    .iter()
                    .any(|&j| j != i && self.criteria[i].subset(&self.criteria[j], true))
            })
            .collect()
    }
}

fn tag_set(tags: &[Tag]) -> TagSet {
    tags.iter().map(|t| t.id).collect()
}
