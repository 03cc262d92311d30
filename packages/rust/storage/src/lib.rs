//! libSQL catalog for imported proposals (offline, local file).
//!
//! The [`Storage`] struct wraps a libSQL database holding one row per
//! proposal resource plus a history of import runs. Rows are upserted by
//! resource id, so re-importing the same file is idempotent.

mod migrations;
pub mod row;

use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};
use proposalkit_shared::{ProposalKitError, Result};
use uuid::Uuid;

pub use row::{CatalogMetadata, CatalogRow, Category};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

/// Counts recorded when an import run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub total: usize,
    pub imported: usize,
    pub failed: usize,
}

/// One row of the `import_runs` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRun {
    pub id: String,
    pub source: String,
    pub active_only: bool,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub counts: ImportCounts,
}

fn db_err(e: libsql::Error) -> ProposalKitError {
    ProposalKitError::Storage(e.to_string())
}

impl Storage {
    /// Open or create a catalog at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ProposalKitError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(db_err)?;
        let conn = db.connect().map_err(db_err)?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        ProposalKitError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            // table doesn't exist yet
            Err(_) => 0,
        }
    }

    // -----------------------------------------------------------------------
    // Resource operations
    // -----------------------------------------------------------------------

    /// Upsert a batch of rows in a single transaction.
    ///
    /// Either every row in the batch is written or none is.
    pub async fn upsert_resources(&self, rows: &[CatalogRow], run_id: Option<&str>) -> Result<usize> {
        let tx = self.conn.transaction().await.map_err(db_err)?;
        let now = Utc::now().to_rfc3339();

        for row in rows {
            let metadata_json = serde_json::to_string(&row.metadata)?;
            let result = tx
                .execute(
                    "INSERT INTO resources (id, category, name, description, meeting_focus, accessibility,
                                            fiscal_year, status, priority, is_active, file_path,
                                            metadata_json, import_run_id, imported_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                     ON CONFLICT(id) DO UPDATE SET
                       category = excluded.category,
                       name = excluded.name,
                       description = excluded.description,
                       meeting_focus = excluded.meeting_focus,
                       accessibility = excluded.accessibility,
                       fiscal_year = excluded.fiscal_year,
                       status = excluded.status,
                       priority = excluded.priority,
                       is_active = excluded.is_active,
                       file_path = excluded.file_path,
                       metadata_json = excluded.metadata_json,
                       import_run_id = excluded.import_run_id,
                       imported_at = excluded.imported_at",
                    params![
                        row.id.as_str(),
                        row.category.as_str(),
                        row.name.as_str(),
                        row.description.as_str(),
                        row.meeting_focus.as_str(),
                        row.accessibility.as_str(),
                        row.fiscal_year.as_deref(),
                        row.status.as_str(),
                        i64::from(row.priority),
                        i64::from(row.is_active),
                        row.file_path.as_str(),
                        metadata_json.as_str(),
                        run_id,
                        now.as_str(),
                    ],
                )
                .await;

            if let Err(e) = result {
                tx.rollback().await.map_err(db_err)?;
                return Err(ProposalKitError::Storage(format!("upsert {} failed: {e}", row.id)));
            }
        }

        tx.commit().await.map_err(db_err)?;
        Ok(rows.len())
    }

    /// Get a resource row by id.
    pub async fn get_resource(&self, id: &str) -> Result<Option<CatalogRow>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(db_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_catalog_row(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(db_err(e)),
        }
    }

    /// List resource rows ordered by id, optionally only active ones.
    pub async fn list_resources(&self, active_only: bool) -> Result<Vec<CatalogRow>> {
        let sql = if active_only {
            format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE is_active = 1 ORDER BY id")
        } else {
            format!("SELECT {RESOURCE_COLUMNS} FROM resources ORDER BY id")
        };
        let mut rows = self.conn.query(&sql, params![]).await.map_err(db_err)?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_catalog_row(&row)?);
        }
        Ok(results)
    }

    /// Number of resource rows in the catalog.
    pub async fn count_resources(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM resources", params![])
            .await
            .map_err(db_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<i64>(0).map_err(db_err)? as u64),
            Ok(None) => Ok(0),
            Err(e) => Err(db_err(e)),
        }
    }

    // -----------------------------------------------------------------------
    // Import run operations
    // -----------------------------------------------------------------------

    /// Record the start of an import run. Returns the generated run id.
    pub async fn start_import_run(&self, source: &str, active_only: bool) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO import_runs (id, source, active_only, started_at) VALUES (?1, ?2, ?3, ?4)",
                params![id.as_str(), source, i64::from(active_only), now.as_str()],
            )
            .await
            .map_err(db_err)?;
        Ok(id)
    }

    /// Mark an import run finished with its counts.
    pub async fn finish_import_run(&self, run_id: &str, counts: ImportCounts) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE import_runs SET finished_at = ?1, total = ?2, imported = ?3, failed = ?4
                 WHERE id = ?5",
                params![
                    now.as_str(),
                    counts.total as i64,
                    counts.imported as i64,
                    counts.failed as i64,
                    run_id
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Get an import run by id.
    pub async fn get_import_run(&self, run_id: &str) -> Result<Option<ImportRun>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, source, active_only, started_at, finished_at, total, imported, failed
                 FROM import_runs WHERE id = ?1",
                params![run_id],
            )
            .await
            .map_err(db_err)?;

        let row = match rows.next().await {
            Ok(Some(row)) => row,
            Ok(None) => return Ok(None),
            Err(e) => return Err(db_err(e)),
        };

        Ok(Some(ImportRun {
            id: row.get::<String>(0).map_err(db_err)?,
            source: row.get::<String>(1).map_err(db_err)?,
            active_only: row.get::<i64>(2).map_err(db_err)? != 0,
            started_at: row.get::<String>(3).map_err(db_err)?,
            finished_at: row.get::<String>(4).ok(),
            counts: ImportCounts {
                total: row.get::<i64>(5).map_err(db_err)? as usize,
                imported: row.get::<i64>(6).map_err(db_err)? as usize,
                failed: row.get::<i64>(7).map_err(db_err)? as usize,
            },
        }))
    }
}

const RESOURCE_COLUMNS: &str = "id, category, name, description, meeting_focus, accessibility, \
     fiscal_year, status, priority, is_active, file_path, metadata_json";

/// Convert a database row to a [`CatalogRow`].
fn row_to_catalog_row(row: &libsql::Row) -> Result<CatalogRow> {
    let category: String = row.get(1).map_err(db_err)?;
    let metadata_json: String = row.get(11).map_err(db_err)?;

    Ok(CatalogRow {
        id: row.get::<String>(0).map_err(db_err)?,
        category: category.parse().map_err(ProposalKitError::Storage)?,
        name: row.get::<String>(2).map_err(db_err)?,
        description: row.get::<String>(3).map_err(db_err)?,
        meeting_focus: row.get::<String>(4).map_err(db_err)?,
        accessibility: row.get::<String>(5).map_err(db_err)?,
        fiscal_year: row.get::<String>(6).ok(),
        status: row.get::<String>(7).map_err(db_err)?,
        priority: row.get::<i64>(8).map_err(db_err)? as u8,
        is_active: row.get::<i64>(9).map_err(db_err)? != 0,
        file_path: row.get::<String>(10).map_err(db_err)?,
        metadata: serde_json::from_str(&metadata_json)?,
    })
}
