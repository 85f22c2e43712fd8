//! `(category, tag)` name resolution.

use std::collections::HashMap;

use super::{AssessmentError, TagSet};
use crate::db::{tag_repo, Database};
use crate::model::{Assessment, CategorizedTag, Tag};

/// Two-level `category -> tag name -> Tag` cache, loaded once.
#[derive(Debug, Clone, Default)]
pub struct TagResolver {
    cache: HashMap<String, HashMap<String, Tag>>,
}

impl TagResolver {
    pub fn new(db: &Database) -> Result<Self, AssessmentError> {
        Ok(Self::from_tags(tag_repo::list_categorized(db)?))
    }

    /// Builds the cache from `(category name, tag)` pairs.
    pub fn from_tags<I>(tags: I) -> Self
    where
        I: IntoIterator<Item = (String, Tag)>,
    {
        let mut cache: HashMap<String, HashMap<String, Tag>> = HashMap::new();
        for (category, tag) in tags {
            cache
                .entry(category)
                .or_default()
                .insert(tag.name.clone(), tag);
        }
        Self { cache }
    }

    pub fn resolve(&self, category: &str, tag: &str) -> Option<&Tag> {
        self.cache.get(category).and_then(|tags| tags.get(tag))
    }

    /// Ids of the pairs that resolve. Unknown pairs are skipped.
    pub fn resolve_all(&self, tags: &[CategorizedTag]) -> TagSet {
        tags.iter()
            .filter_map(|t| self.resolve(&t.category, &t.tag))
            .map(|t| t.id)
            .collect()
    }

    /// Tags applied by the selected answers of `assessment`, deduplicated.
    /// Tags that no longer exist are dropped.
    pub fn assessment(&self, assessment: &Assessment) -> Vec<Tag> {
        let mut seen = TagSet::new();
        let mut tags = Vec::new();
        for section in &assessment.sections {
            for applied in section.tags() {
                if let Some(tag) = self.resolve(&applied.category, &applied.tag) {
                    if !seen.contains(tag.id) {
                        seen.add(tag.id);
                        tags.push(tag.clone());
                    }
                }
            }
        }
        tags
    }
}
