//! Test harness for isolated test execution.
//!
//! The `TestHarness` owns a temporary directory holding the store, the
//! bucket and file roots and a seed directory. Every harness gets its
//! own database file.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use apphub::assessment::{MembershipResolver, QuestionnaireResolver, TagResolver};
use apphub::db::{tag_repo, Database};
use apphub::model::Tag;
use apphub::settings::Settings;

/// Resolvers built from one snapshot of the store.
pub struct Resolvers {
    pub tags: TagResolver,
    pub membership: MembershipResolver,
    pub questionnaire: QuestionnaireResolver,
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub bucket_root: PathBuf,
    pub file_root: PathBuf,
    pub seed_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        let bucket_root = base.join("bucket");
        let file_root = base.join("file");
        let seed_dir = base.join("seed");
        for dir in [&bucket_root, &file_root, &seed_dir] {
            std::fs::create_dir_all(dir).expect("Failed to create directory");
        }
        let db = Database::open(&base.join("data").join("hub.db"))
            .expect("Failed to open database");
        Self {
            temp_dir,
            db,
            bucket_root,
            file_root,
            seed_dir,
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Default settings with every path inside the harness.
    pub fn settings(&self) -> Arc<Settings> {
        let mut settings = Settings::default();
        settings.hub.db.path = self.path().join("data").join("hub.db");
        settings.hub.db.seed_path = self.seed_dir.clone();
        settings.hub.bucket.path = self.bucket_root.clone();
        settings.hub.file.path = self.file_root.clone();
        Arc::new(settings)
    }

    pub fn category(&self, name: &str) -> i64 {
        tag_repo::insert_category(&self.db, name, "").expect("Failed to insert category")
    }

    pub fn tag(&self, category_id: i64, name: &str) -> Tag {
        tag_repo::insert(&self.db, category_id, name).expect("Failed to insert tag")
    }

    /// Several tags in one category.
    pub fn tags(&self, category: &str, names: &[&str]) -> Vec<Tag> {
        let id = self.category(category);
        names.iter().map(|n| self.tag(id, n)).collect()
    }

    pub fn resolvers(&self) -> Resolvers {
        Resolvers {
            tags: TagResolver::new(&self.db).expect("Failed to load tags"),
            membership: MembershipResolver::new(&self.db).expect("Failed to load archetypes"),
            questionnaire: QuestionnaireResolver::new(&self.db)
                .expect("Failed to load questionnaires"),
        }
    }

    pub fn write_seed(&self, name: &str, content: &str) -> PathBuf {
        let path = self.seed_dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create seed directory");
        }
        std::fs::write(&path, content).expect("Failed to write seed file");
        path
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
