//! Writes a collected [`Catalog`] into the store.
//!
//! Items are matched by uuid first. A rename of a matched item first
//! moves any other row holding the new name out of the way. Without a
//! uuid match, a row holding the same name is adopted when it was seeded
//! (it carries a uuid) and renamed with a ` (n)` suffix when a user
//! created it.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::document::{
    Catalog, JobFunctionSeed, QuestionnaireSeed, RuleSetSeed, TagCategorySeed, TargetSeed,
};
use super::SeedError;
use crate::db::{file_repo, format_timestamp, ruleset_repo, to_json, DatabaseError};

pub(crate) struct Applier<'a> {
    conn: &'a Connection,
    dir: &'a Path,
    file_root: &'a Path,
}

impl<'a> Applier<'a> {
    pub(crate) fn new(conn: &'a Connection, dir: &'a Path, file_root: &'a Path) -> Self {
        Self {
            conn,
            dir,
            file_root,
        }
    }

    pub(crate) fn apply(&self, catalog: &Catalog) -> Result<(), SeedError> {
        tracing::info!(count = catalog.tag_categories.len(), "Applying tag categories");
        for item in &catalog.tag_categories {
            self.tag_category(item)?;
        }
        tracing::info!(count = catalog.job_functions.len(), "Applying job functions");
        for item in &catalog.job_functions {
            self.job_function(item)?;
        }
        tracing::info!(count = catalog.rule_sets.len(), "Applying rule sets");
        self.rule_sets(&catalog.rule_sets)?;
        tracing::info!(count = catalog.targets.len(), "Applying targets");
        for item in &catalog.targets {
            self.target(item)?;
        }
        tracing::info!(count = catalog.questionnaires.len(), "Applying questionnaires");
        for item in &catalog.questionnaires {
            self.questionnaire(item)?;
        }
        Ok(())
    }

    /// Finds the row a seeded item lands in, clearing name collisions.
    fn claim(&self, table: &str, uuid: &str, name: &str) -> Result<Option<i64>, SeedError> {
        let by_uuid: Option<(i64, String)> = self
            .conn
            .query_row(
                &format!("SELECT id, name FROM {} WHERE uuid = ?1", table),
                params![uuid],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()
            .map_err(DatabaseError::from)?;

        if let Some((id, current)) = by_uuid {
            if current != name {
                let collision: Option<i64> = self
                    .conn
                    .query_row(
                        &format!("SELECT id FROM {} WHERE name = ?1 AND id != ?2", table),
                        params![name, id],
                        |r| r.get(0),
                    )
                    .optional()
                    .map_err(DatabaseError::from)?;
                if let Some(other) = collision {
                    self.rename(table, other, name)?;
                }
            }
            return Ok(Some(id));
        }

        let by_name: Option<(i64, Option<String>)> = self
            .conn
            .query_row(
                &format!("SELECT id, uuid FROM {} WHERE name = ?1", table),
                params![name],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()
            .map_err(DatabaseError::from)?;

        match by_name {
            Some((id, Some(_))) => Ok(Some(id)),
            Some((id, None)) => {
                self.rename(table, id, name)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn rename(&self, table: &str, id: i64, name: &str) -> Result<(), SeedError> {
        let mut suffix = 0u32;
        loop {
            suffix += 1;
            let candidate = format!("{} ({})", name, suffix);
            let taken: bool = self
                .conn
                .query_row(
                    &format!("SELECT EXISTS (SELECT 1 FROM {} WHERE name = ?1)", table),
                    params![candidate],
                    |r| r.get(0),
                )
                .map_err(DatabaseError::from)?;
            if taken {
                continue;
            }
            self.conn
                .execute(
                    &format!("UPDATE {} SET name = ?2 WHERE id = ?1", table),
                    params![id, candidate],
                )
                .map_err(DatabaseError::from)?;
            tracing::info!(
                table,
                id,
                from = %name,
                to = %candidate,
                "Renamed row clashing with seed"
            );
            return Ok(());
        }
    }

    fn tag_category(&self, item: &TagCategorySeed) -> Result<(), SeedError> {
        let now = format_timestamp(Utc::now());
        let id = match self.claim("tag_category", &item.uuid, &item.name)? {
            Some(id) => {
                self.conn
                    .execute(
                        "UPDATE tag_category SET uuid = ?2, name = ?3, color = ?4 WHERE id = ?1",
                        params![id, item.uuid, item.name, item.color],
                    )
                    .map_err(DatabaseError::from)?;
                id
            }
            None => {
                self.conn
                    .execute(
                        "INSERT INTO tag_category (uuid, name, color, create_time) \
                         VALUES (?1, ?2, ?3, ?4)",
                        params![item.uuid, item.name, item.color, now],
                    )
                    .map_err(DatabaseError::from)?;
                self.conn.last_insert_rowid()
            }
        };

        for tag in &item.tags {
            let existing: Option<i64> = self
                .conn
                .query_row(
                    "SELECT id FROM tag WHERE uuid = ?1
                     UNION ALL
                     SELECT id FROM tag WHERE name = ?2 AND category_id = ?3
                     LIMIT 1",
                    params![tag.uuid, tag.name, id],
                    |r| r.get(0),
                )
                .optional()
                .map_err(DatabaseError::from)?;
            let written = match existing {
                Some(tag_id) => self.conn.execute(
                    "UPDATE tag SET uuid = ?2, name = ?3, category_id = ?4 WHERE id = ?1",
                    params![tag_id, tag.uuid, tag.name, id],
                ),
                None => self.conn.execute(
                    "INSERT INTO tag (uuid, name, category_id, create_time) \
                     VALUES (?1, ?2, ?3, ?4)",
                    params![tag.uuid, tag.name, id, now],
                ),
            };
            written.map_err(DatabaseError::from)?;
        }
        Ok(())
    }

    fn job_function(&self, item: &JobFunctionSeed) -> Result<(), SeedError> {
        let written = match self.claim("job_function", &item.uuid, &item.name)? {
            Some(id) => self.conn.execute(
                "UPDATE job_function SET uuid = ?2, name = ?3 WHERE id = ?1",
                params![id, item.uuid, item.name],
            ),
            None => self.conn.execute(
                "INSERT INTO job_function (uuid, name, create_time) VALUES (?1, ?2, ?3)",
                params![item.uuid, item.name, format_timestamp(Utc::now())],
            ),
        };
        written.map_err(DatabaseError::from)?;
        Ok(())
    }

    fn rule_sets(&self, items: &[RuleSetSeed]) -> Result<(), SeedError> {
        let mut ids: HashMap<&str, i64> = HashMap::new();
        for item in items {
            let id = match self.claim("rule_set", &item.uuid, &item.name)? {
                Some(id) => {
                    self.conn
                        .execute(
                            "UPDATE rule_set SET uuid = ?2, name = ?3, description = ?4 \
                             WHERE id = ?1",
                            params![id, item.uuid, item.name, item.description],
                        )
                        .map_err(DatabaseError::from)?;
                    id
                }
                None => {
                    self.conn
                        .execute(
                            "INSERT INTO rule_set (uuid, name, description, create_time) \
                             VALUES (?1, ?2, ?3, ?4)",
                            params![
                                item.uuid,
                                item.name,
                                item.description,
                                format_timestamp(Utc::now())
                            ],
                        )
                        .map_err(DatabaseError::from)?;
                    self.conn.last_insert_rowid()
                }
            };
            self.rules(id, item)?;
            ids.insert(item.uuid.as_str(), id);
        }
        self.dependencies(items, &ids)
    }

    fn rules(&self, rule_set: i64, item: &RuleSetSeed) -> Result<(), SeedError> {
        self.conn
            .execute("DELETE FROM rule WHERE rule_set_id = ?1", params![rule_set])
            .map_err(DatabaseError::from)?;
        for rule in &item.rules {
            let file_id = match &rule.path {
                Some(path) => Some(self.copy_file(path)?),
                None => None,
            };
            self.conn
                .execute(
                    "INSERT INTO rule (name, rule_set_id, labels, file_id, create_time)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        rule.name,
                        rule_set,
                        to_json(&rule.labels)?,
                        file_id,
                        format_timestamp(Utc::now()),
                    ],
                )
                .map_err(DatabaseError::from)?;
        }
        Ok(())
    }

    /// Replaces the dependencies of every seeded rule set. The complete
    /// new edge set is checked for cycles before any edge is written.
    fn dependencies(
        &self,
        items: &[RuleSetSeed],
        ids: &HashMap<&str, i64>,
    ) -> Result<(), SeedError> {
        for id in ids.values() {
            self.conn
                .execute(
                    "DELETE FROM rule_set_dependency WHERE rule_set_id = ?1",
                    params![id],
                )
                .map_err(DatabaseError::from)?;
        }

        let mut dependents: HashMap<i64, Vec<i64>> = HashMap::new();
        {
            let mut stmt = self
                .conn
                .prepare("SELECT rule_set_id, depends_on_id FROM rule_set_dependency")
                .map_err(DatabaseError::from)?;
            let edges = stmt
                .query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?)))
                .map_err(DatabaseError::from)?;
            for edge in edges {
                let (rule_set, depends_on) = edge.map_err(DatabaseError::from)?;
                dependents.entry(depends_on).or_default().push(rule_set);
            }
        }

        let mut edges = Vec::new();
        for item in items {
            let rule_set = ids[item.uuid.as_str()];
            for uuid in &item.dependencies {
                let depends_on = match ids.get(uuid.as_str()) {
                    Some(id) => *id,
                    None => self.rule_set_by_uuid(uuid, &item.name)?,
                };
                let cycle = ruleset_repo::closes_cycle(rule_set, depends_on, |id| {
                    Ok::<_, SeedError>(dependents.get(&id).cloned().unwrap_or_default())
                })?;
                if cycle {
                    return Err(SeedError::DependencyCycle {
                        rule_set: item.name.clone(),
                        depends_on: uuid.clone(),
                    });
                }
                dependents.entry(depends_on).or_default().push(rule_set);
                edges.push((rule_set, depends_on));
            }
        }

        for (rule_set, depends_on) in edges {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO rule_set_dependency (rule_set_id, depends_on_id) \
                     VALUES (?1, ?2)",
                    params![rule_set, depends_on],
                )
                .map_err(DatabaseError::from)?;
        }
        Ok(())
    }

    fn rule_set_by_uuid(&self, uuid: &str, owner: &str) -> Result<i64, SeedError> {
        self.conn
            .query_row(
                "SELECT id FROM rule_set WHERE uuid = ?1",
                params![uuid],
                |r| r.get(0),
            )
            .optional()
            .map_err(DatabaseError::from)?
            .ok_or_else(|| SeedError::UnknownRuleSet {
                owner: owner.to_string(),
                uuid: uuid.to_string(),
            })
    }

    fn target(&self, item: &TargetSeed) -> Result<(), SeedError> {
        let rule_set_id = match &item.ruleset {
            Some(uuid) => Some(self.rule_set_by_uuid(uuid, &item.name)?),
            None => None,
        };
        let image_id = match &item.image {
            Some(path) => Some(self.copy_file(path)?),
            None => None,
        };
        let labels = to_json(&item.labels)?;
        let written = match self.claim("target", &item.uuid, &item.name)? {
            Some(id) => self.conn.execute(
                "UPDATE target SET uuid = ?2, name = ?3, description = ?4, provider = ?5,
                 choice = ?6, labels = ?7, image_id = ?8, rule_set_id = ?9 WHERE id = ?1",
                params![
                    id,
                    item.uuid,
                    item.name,
                    item.description,
                    item.provider,
                    item.choice,
                    labels,
                    image_id,
                    rule_set_id,
                ],
            ),
            None => self.conn.execute(
                "INSERT INTO target (uuid, name, description, provider, choice, labels, image_id,
                 rule_set_id, create_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    item.uuid,
                    item.name,
                    item.description,
                    item.provider,
                    item.choice,
                    labels,
                    image_id,
                    rule_set_id,
                    format_timestamp(Utc::now()),
                ],
            ),
        };
        written.map_err(DatabaseError::from)?;
        Ok(())
    }

    /// `required` is only written when the questionnaire is first seeded,
    /// so reseeding keeps a user's choice.
    fn questionnaire(&self, item: &QuestionnaireSeed) -> Result<(), SeedError> {
        let sections = to_json(&item.sections)?;
        let thresholds = to_json(&item.thresholds)?;
        let messages = to_json(&item.risk_messages)?;
        let written = match self.claim("questionnaire", &item.uuid, &item.name)? {
            Some(id) => self.conn.execute(
                "UPDATE questionnaire SET uuid = ?2, name = ?3, description = ?4, sections = ?5,
                 thresholds = ?6, risk_messages = ?7 WHERE id = ?1",
                params![
                    id,
                    item.uuid,
                    item.name,
                    item.description,
                    sections,
                    thresholds,
                    messages,
                ],
            ),
            None => self.conn.execute(
                "INSERT INTO questionnaire (uuid, name, description, required, sections, thresholds,
                 risk_messages, create_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    item.uuid,
                    item.name,
                    item.description,
                    item.required,
                    sections,
                    thresholds,
                    messages,
                    format_timestamp(Utc::now()),
                ],
            ),
        };
        written.map_err(DatabaseError::from)?;
        Ok(())
    }

    /// Copies a seed-relative file into the file store and records it.
    fn copy_file(&self, relative: &str) -> Result<i64, SeedError> {
        let source = self.dir.join(relative);
        std::fs::create_dir_all(self.file_root).map_err(|e| SeedError::Copy {
            path: self.file_root.to_path_buf(),
            source: e,
        })?;
        let target = self.file_root.join(Uuid::new_v4().to_string());
        std::fs::copy(&source, &target).map_err(|e| SeedError::Copy {
            path: source.clone(),
            source: e,
        })?;
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| relative.to_string());
        let file = file_repo::insert_with(self.conn, &name, &target.to_string_lossy())?;
        Ok(file.id)
    }
}
