//! Seeded catalog: tag categories, job functions, rule sets, targets and
//! questionnaires shipped with the hub.
//!
//! Seeding reads every `*.yaml`/`*.yml` file under the seed directory,
//! sorted by name. A SHA-256 digest over their contents is kept in the
//! `setting` table; when it matches, seeding is skipped. Otherwise the
//! whole catalog is applied in one transaction together with the new
//! digest.

mod apply;
pub mod document;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::db::{setting_repo, Database, DatabaseError};
use apply::Applier;
use document::Catalog;

/// Setting holding the digest of the last applied seed files.
pub const CHECKSUM_KEY: &str = "hub.db.seed";

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Failed to read seed directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read seed file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse seed file '{path}': {message}")]
    ParseYaml { path: PathBuf, message: String },

    #[error("Failed to copy seed file '{path}': {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "RuleSet '{rule_set}' cannot depend on '{depends_on}': cyclic dependencies are not allowed"
    )]
    DependencyCycle { rule_set: String, depends_on: String },

    #[error("'{owner}' references unknown rule set '{uuid}'")]
    UnknownRuleSet { owner: String, uuid: String },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// One seed file as read from disk.
#[derive(Debug, Clone)]
pub struct SeedFile {
    pub path: PathBuf,
    pub content: String,
}

/// Reads the seed files under `dir`, sorted by file name. A missing
/// directory yields no files.
pub fn read_dir(dir: &Path) -> Result<Vec<SeedFile>, SeedError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %dir.display(), "Seed directory not found");
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(SeedError::ReadDir {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SeedError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "yaml" || e == "yml");
        if is_yaml && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let content = fs::read_to_string(&path).map_err(|e| SeedError::ReadFile {
                path: path.clone(),
                source: e,
            })?;
            Ok(SeedFile { path, content })
        })
        .collect()
}

/// Hex SHA-256 over the file contents in order.
pub fn checksum(files: &[SeedFile]) -> String {
    let mut hasher = Sha256::new();
    for file in files {
        hasher.update(file.content.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

pub struct Seeder {
    db: Database,
    dir: PathBuf,
    file_root: PathBuf,
}

impl Seeder {
    /// `file_root` receives copies of rule and image files named by seeds.
    pub fn new(db: Database, dir: impl Into<PathBuf>, file_root: impl Into<PathBuf>) -> Self {
        Self {
            db,
            dir: dir.into(),
            file_root: file_root.into(),
        }
    }

    /// Applies the seed directory. Returns whether anything was applied.
    pub fn seed(&self) -> Result<bool, SeedError> {
        let _span = tracing::info_span!("seed", path = %self.dir.display()).entered();

        let files = read_dir(&self.dir)?;
        if files.is_empty() {
            tracing::info!("No seed files found");
            return Ok(false);
        }

        let digest = checksum(&files);
        let applied = setting_repo::get(&self.db, CHECKSUM_KEY)?;
        let matched = applied.as_deref() == Some(digest.as_str());
        tracing::info!(matched, "Seed checksum");
        if matched {
            tracing::info!("Seeding skipped");
            return Ok(false);
        }

        let mut catalog = Catalog::default();
        for file in &files {
            catalog.with(&file.content, &file.path)?;
        }

        tracing::info!(files = files.len(), items = catalog.len(), "Applying seeds");
        self.db.transaction(|conn| {
            Applier::new(conn, &self.dir, &self.file_root).apply(&catalog)?;
            setting_repo::set_with(conn, CHECKSUM_KEY, &digest)?;
            Ok::<_, SeedError>(())
        })?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use assert_fs::fixture::{ChildPath, FileWriteStr};

    use super::*;
    use crate::db::{questionnaire_repo, rule_repo, ruleset_repo, tag_repo};
    use crate::model::{Questionnaire, RuleSet};

    const TAGS: &str = r##"
kind: tagcategory
items:
  - uuid: cat-lang
    name: Language
    color: "#2b9af3"
    tags:
      - uuid: tag-java
        name: Java
      - uuid: tag-go
        name: Go
"##;

    const RULESETS: &str = r#"
kind: ruleset
items:
  - uuid: rs-base
    name: Base
  - uuid: rs-eap
    name: EAP
    dependencies: [rs-base]
    rules:
      - name: r1
        labels: [konveyor.io/target=eap]
        path: rules/r1.yaml
"#;

    fn write(dir: &Path, name: &str, content: &str) {
        ChildPath::new(dir.join(name)).write_str(content).unwrap();
    }

    fn category_count(db: &Database) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM tag_category", [], |r| r.get(0))?)
        })
            .unwrap()
    }

    #[test]
    fn test_missing_dir_is_not_an_error() {
        let root = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let seeder = Seeder::new(db, root.path().join("absent"), root.path().join("files"));
        assert!(!seeder.seed().unwrap());
    }

    #[test]
    fn test_seed_applies_once_per_checksum() {
        let root = tempfile::tempdir().unwrap();
        let seeds = root.path().join("seed");
        write(&seeds, "tags.yaml", TAGS);
        write(&seeds, "notes.txt", "ignored");

        let db = Database::open_in_memory().unwrap();
        let seeder = Seeder::new(db.clone(), &seeds, root.path().join("files"));
        assert!(seeder.seed().unwrap());
        assert!(!seeder.seed().unwrap());

        let tags = tag_repo::list_categorized(&db).unwrap();
        assert_eq!(tags.len(), 2);
        assert!(tags.iter().all(|(category, _)| category == "Language"));
        assert_eq!(category_count(&db), 1);

        let stored = setting_repo::get(&db, CHECKSUM_KEY).unwrap().unwrap();
        assert_eq!(stored, checksum(&read_dir(&seeds).unwrap()));
    }

    #[test]
    fn test_reseed_updates_in_place() {
        let root = tempfile::tempdir().unwrap();
        let seeds = root.path().join("seed");
        write(&seeds, "tags.yaml", TAGS);
        let db = Database::open_in_memory().unwrap();
        let seeder = Seeder::new(db.clone(), &seeds, root.path().join("files"));
        seeder.seed().unwrap();

        write(&seeds, "tags.yaml", &TAGS.replace("name: Language", "name: Languages"));
        assert!(seeder.seed().unwrap());

        assert_eq!(category_count(&db), 1);
        let tags = tag_repo::list_categorized(&db).unwrap();
        assert!(tags.iter().all(|(category, _)| category == "Languages"));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_user_row_renamed_on_clash() {
        let root = tempfile::tempdir().unwrap();
        let seeds = root.path().join("seed");
        write(
            &seeds,
            "q.yaml",
            "kind: questionnaire\n\
             items:\n  - uuid: q-legacy\n    name: Legacy\n    required: false\n",
        );
        let db = Database::open_in_memory().unwrap();
        let user = questionnaire_repo::insert(
            &db,
            &Questionnaire {
                name: "Legacy".into(),
                required: true,
                ..Default::default()
            },
        )
        .unwrap();
        questionnaire_repo::insert(
            &db,
            &Questionnaire {
                name: "Legacy (1)".into(),
                ..Default::default()
            },
        )
        .unwrap();

        Seeder::new(db.clone(), &seeds, root.path().join("files"))
            .seed()
            .unwrap();

        let renamed = questionnaire_repo::find_by_id(&db, user).unwrap().unwrap();
        assert_eq!(renamed.name, "Legacy (2)");
        let seeded = questionnaire_repo::list(&db)
            .unwrap()
            .into_iter()
            .find(|q| q.uuid.as_deref() == Some("q-legacy"))
            .unwrap();
        assert_eq!(seeded.name, "Legacy");
        assert!(!seeded.required);
    }

    #[test]
    fn test_rule_sets_with_dependencies_and_files() {
        let root = tempfile::tempdir().unwrap();
        let seeds = root.path().join("seed");
        write(&seeds, "rulesets.yaml", RULESETS);
        write(&seeds, "rules/r1.yaml", "- ruleID: r1\n");
        let files = root.path().join("files");
        let db = Database::open_in_memory().unwrap();

        Seeder::new(db.clone(), &seeds, &files).seed().unwrap();

        let sets = ruleset_repo::list(&db).unwrap();
        let base = sets.iter().find(|s| s.name == "Base").unwrap();
        let eap = sets.iter().find(|s| s.name == "EAP").unwrap();
        assert_eq!(eap.depends_on, vec![base.id]);

        let rules = rule_repo::list_rules(&db, eap.id).unwrap();
        assert_eq!(rules.len(), 1);
        let file_id = rules[0].file_id.unwrap();
        let file = crate::db::file_repo::find_by_id(&db, file_id).unwrap().unwrap();
        assert_eq!(file.name, "r1.yaml");
        assert_eq!(fs::read_to_string(&file.path).unwrap(), "- ruleID: r1\n");
    }

    #[test]
    fn test_dependency_cycle_rolls_back() {
        let root = tempfile::tempdir().unwrap();
        let seeds = root.path().join("seed");
        write(
            &seeds,
            "rulesets.yaml",
            r#"
kind: ruleset
items:
  - uuid: rs-a
    name: A
    dependencies: [rs-b]
  - uuid: rs-b
    name: B
    dependencies: [rs-a]
"#,
        );
        let db = Database::open_in_memory().unwrap();
        ruleset_repo::insert(
            &db,
            &RuleSet {
                name: "existing".into(),
                ..Default::default()
            },
        )
        .unwrap();

        let result = Seeder::new(db.clone(), &seeds, root.path().join("files")).seed();
        assert!(matches!(result, Err(SeedError::DependencyCycle { .. })));

        assert_eq!(ruleset_repo::list(&db).unwrap().len(), 1);
        assert!(setting_repo::get(&db, CHECKSUM_KEY).unwrap().is_none());
    }

    #[test]
    fn test_unknown_dependency_fails() {
        let root = tempfile::tempdir().unwrap();
        let seeds = root.path().join("seed");
        write(
            &seeds,
            "rulesets.yaml",
            "kind: ruleset\nitems:\n  - uuid: rs-a\n    name: A\n    dependencies: [rs-missing]\n",
        );
        let db = Database::open_in_memory().unwrap();
        let result = Seeder::new(db, &seeds, root.path().join("files")).seed();
        assert!(matches!(result, Err(SeedError::UnknownRuleSet { .. })));
    }
}
