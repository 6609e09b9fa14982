use fxhash::FxHashMap;
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tracing::{info, trace};

use crate::error::{DatabaseError, DatabaseErrorExt};

/// Ordered schema scripts. Append only; never edit an applied script.
const MIGRATIONS: &[Migration] = &[
    Migration { name: "0001_core_tables", script: include_str!("../migrations/0001_core_tables.surql") },
    Migration { name: "0002_attendance", script: include_str!("../migrations/0002_attendance.surql") },
];

const BOOTSTRAP: &str = "DEFINE TABLE IF NOT EXISTS migration SCHEMALESS;";

#[derive(Debug, Clone, Copy)]
pub(crate) struct Migration {
    name: &'static str,
    script: &'static str,
}

impl Migration {
    fn checksum(&self) -> String {
        format!("{:016x}", fxhash::hash64(self.script))
    }
}

#[derive(Debug, Deserialize)]
struct AppliedMigration {
    name: String,
    checksum: String,
}

/// Names of migrations applied and skipped by one run.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub applied: Vec<&'static str>,
    pub skipped: Vec<&'static str>,
}

#[derive(Debug)]
pub(crate) struct MigrationRunner<'a> {
    db: &'a Surreal<Any>,
}

impl<'a> MigrationRunner<'a> {
    pub(crate) const fn new(db: &'a Surreal<Any>) -> Self {
        Self { db }
    }

    pub(crate) async fn run(&self) -> Result<MigrationReport, DatabaseError> {
        self.db
            .query(BOOTSTRAP)
            .await
            .and_then(surrealdb::Response::check)
            .context("Defining migration table")?;

        let applied = self.applied().await?;
        let mut report = MigrationReport::default();

        for migration in MIGRATIONS {
            match applied.get(migration.name) {
                Some(checksum) => {
                    ensure_checksum_match(migration, checksum)?;
                    trace!(migration = migration.name, "Skipping applied migration");
                    report.skipped.push(migration.name);
                },
                None => {
                    self.apply(migration).await?;
                    info!(migration = migration.name, "Applied migration");
                    report.applied.push(migration.name);
                },
            }
        }

        Ok(report)
    }

    async fn applied(&self) -> Result<FxHashMap<String, String>, DatabaseError> {
        let entries: Vec<AppliedMigration> = self
            .db
            .query("SELECT record::id(id) AS name, checksum FROM migration")
            .await
            .context("Loading applied migrations")?
            .take(0)
            .context("Parsing applied migrations")?;

        Ok(entries.into_iter().map(|entry| (entry.name, entry.checksum)).collect())
    }

    async fn apply(&self, migration: &Migration) -> Result<(), DatabaseError> {
        let query = format!(
            "BEGIN TRANSACTION;
            {}
            CREATE type::thing('migration', $name) SET checksum = $checksum, applied_at = time::now();
            COMMIT TRANSACTION;",
            migration.script,
        );

        self.db
            .query(query)
            .bind(("name", migration.name))
            .bind(("checksum", migration.checksum()))
            .await
            .and_then(surrealdb::Response::check)
            .context(format!("Applying migration {}", migration.name))?;

        Ok(())
    }
}

fn ensure_checksum_match(migration: &Migration, existing: &str) -> Result<(), DatabaseError> {
    let expected = migration.checksum();
    if existing != expected {
        return Err(DatabaseError::Migration {
            message: format!(
                "checksum mismatch for {} (recorded {existing}, script {expected})",
                migration.name
            )
            .into(),
            context: Some("Migration already applied with a different script".into()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_names_are_unique_and_ordered() {
        let names: Vec<_> = MIGRATIONS.iter().map(|m| m.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn checksum_mismatch_is_reported() {
        let err = ensure_checksum_match(&MIGRATIONS[0], "0000000000000000").unwrap_err();
        assert!(matches!(err, DatabaseError::Migration { .. }));
        assert!(ensure_checksum_match(&MIGRATIONS[0], &MIGRATIONS[0].checksum()).is_ok());
    }
}
