//! DuckDB storage layer for the act corpus.

use std::path::Path;

use chrono::NaiveDate;
use duckdb::{Connection, Transaction, params};
use qazlaw_core::{Act, ActStatus, ActTypeCode, ActVersion, AssembledAct, Language};
use tracing::{debug, info};

use crate::{StoreError, schema};

/// DuckDB store holding the `act`, `act_type`, `act_type_link` and `act_version` tables.
///
/// The store itself is owned by one thread. Concurrent writers each take a
/// [`StoreSession`] (a separate connection to the same database) and commit
/// one act per transaction through an [`ActWriter`].
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
pub struct DuckStore {
    conn: Connection,
}

/// A persisted act type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActTypeRow {
    pub id: i64,
    pub code: ActTypeCode,
}

/// An act read back from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAct {
    pub id: i64,
    pub act: Act,
}

/// Version row without its content.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionSummary {
    pub id: i64,
    pub date: NaiveDate,
    pub language: Language,
    pub is_actual: bool,
    pub version_id: String,
    pub content_len: usize,
    pub cause_act_code: Option<String>,
    pub cause_act_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorpusStats {
    pub acts: usize,
    pub versions: usize,
    pub act_types: usize,
    /// Versions whose cause code has been upgraded to an act id.
    pub linked_causes: usize,
    /// Versions still carrying only a cause code.
    pub unresolved_causes: usize,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Check whether all four corpus tables exist.
    pub fn has_tables(&self) -> bool {
        schema::TABLES
            .iter()
            .all(|table| self.count_table(table).is_ok())
    }

    /// Create the corpus tables, dropping existing ones first when `recreate` is set.
    pub fn init_schema(&self, recreate: bool) -> Result<(), StoreError> {
        if recreate {
            self.conn.execute_batch(schema::DROP)?;
            info!("dropped corpus tables");
        }
        self.conn.execute_batch(schema::CREATE)?;
        Ok(())
    }

    /// Insert every code that is not yet present. Returns the number inserted.
    pub fn seed_act_types(&self, codes: &[ActTypeCode]) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for &code in codes {
            if self.upsert_act_type(code)? {
                inserted += 1;
            }
        }
        info!(inserted, known = codes.len(), "seeded act types");
        Ok(inserted)
    }

    /// Insert `code` unless it already exists. Returns whether a row was inserted.
    pub fn upsert_act_type(&self, code: ActTypeCode) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "INSERT INTO act_type (code) VALUES (?) ON CONFLICT (code) DO NOTHING",
            params![code.as_str()],
        )?;
        Ok(changed > 0)
    }

    pub fn list_act_types(&self) -> Result<Vec<ActTypeRow>, StoreError> {
        list_act_types(&self.conn)
    }

    /// Open a separate connection to the same database for one worker.
    pub fn session(&self) -> Result<StoreSession, StoreError> {
        let conn = self.conn.try_clone()?;
        Ok(StoreSession { conn })
    }

    // ── Lookups ──

    pub fn find_act_id(&self, code: &str) -> Result<Option<i64>, StoreError> {
        find_act_id(&self.conn, code)
    }

    /// Fetch an act with its type tags by registry code.
    pub fn find_act(&self, code: &str) -> Result<Option<StoredAct>, StoreError> {
        let row = self.conn.query_row(
            "SELECT id, code, sa_doc_number_ru, sa_doc_number_kz, ju_doc_number, ngr, status,
                    registry_number, sa_approval_date, ju_approval_date, action_date,
                    effective_date, initial_pub_date, title, requisite
             FROM act WHERE code = ?",
            params![code],
            |row| {
                let status: Option<String> = row.get(6)?;
                let act = Act {
                    code: row.get(1)?,
                    sa_doc_number_ru: row.get(2)?,
                    sa_doc_number_kz: row.get(3)?,
                    ju_doc_number: row.get(4)?,
                    ngr: row.get(5)?,
                    status: None,
                    registry_number: row.get(7)?,
                    sa_approval_date: row.get(8)?,
                    ju_approval_date: row.get(9)?,
                    action_date: row.get(10)?,
                    effective_date: row.get(11)?,
                    initial_pub_date: row.get(12)?,
                    title: row.get(13)?,
                    requisite: row.get(14)?,
                    types: Vec::new(),
                };
                Ok((row.get::<_, i64>(0)?, act, status))
            },
        );
        let (id, mut act, status) = match row {
            Ok(found) => found,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        act.status = status.map(|s| s.parse::<ActStatus>()).transpose()?;
        act.types = self.act_types_for(id)?;
        Ok(Some(StoredAct { id, act }))
    }

    fn act_types_for(&self, act_id: i64) -> Result<Vec<ActTypeCode>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT t.code FROM act_type_link l JOIN act_type t ON t.id = l.type_id
             WHERE l.act_id = ?",
        )?;
        let codes = stmt
            .query_map(params![act_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        let mut types = codes
            .iter()
            .map(|code| code.parse::<ActTypeCode>())
            .collect::<Result<Vec<_>, _>>()?;
        types.sort();
        Ok(types)
    }

    /// All versions of an act, ordered by language then date.
    pub fn versions_for_act(&self, act_id: i64) -> Result<Vec<VersionSummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, language, is_actual, version_id, length(content)::BIGINT,
                    cause_act_code, cause_act_id
             FROM act_version WHERE act_id = ? ORDER BY language DESC, date",
        )?;
        let rows = stmt
            .query_map(params![act_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, NaiveDate>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<i64>>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(id, date, language, is_actual, version_id, len, cause_act_code, cause_act_id)| {
                    Ok(VersionSummary {
                        id,
                        date,
                        language: language.parse()?,
                        is_actual,
                        version_id,
                        content_len: usize::try_from(len).unwrap_or_default(),
                        cause_act_code,
                        cause_act_id,
                    })
                },
            )
            .collect()
    }

    // ── Cause links ──

    /// Distinct cause codes not yet upgraded to an act id.
    pub fn unresolved_cause_codes(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT cause_act_code FROM act_version
             WHERE cause_act_code IS NOT NULL AND cause_act_id IS NULL
             ORDER BY cause_act_code",
        )?;
        let codes = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(codes)
    }

    /// Point every unresolved version caused by `code` at `act_id`. Returns rows updated.
    pub fn resolve_cause(&self, code: &str, act_id: i64) -> Result<usize, StoreError> {
        let updated = self.conn.execute(
            "UPDATE act_version SET cause_act_id = ?
             WHERE cause_act_code = ? AND cause_act_id IS NULL",
            params![act_id, code],
        )?;
        debug!(code, act_id, updated, "resolved cause code");
        Ok(updated)
    }

    // ── Counts ──

    pub fn stats(&self) -> Result<CorpusStats, StoreError> {
        Ok(CorpusStats {
            acts: self.count_table("act")?,
            versions: self.count_table("act_version")?,
            act_types: self.count_table("act_type")?,
            linked_causes: self.count_where("act_version", "cause_act_id IS NOT NULL")?,
            unresolved_causes: self.count_where(
                "act_version",
                "cause_act_code IS NOT NULL AND cause_act_id IS NULL",
            )?,
        })
    }

    fn count_table(&self, table: &str) -> Result<usize, StoreError> {
        self.count_where(table, "true")
    }

    fn count_where(&self, table: &str, predicate: &str) -> Result<usize, StoreError> {
        let sql = format!("SELECT count(*)::BIGINT FROM {table} WHERE {predicate}");
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

/// One worker's connection. Lives for the worker's lifetime; each act is its own transaction.
pub struct StoreSession {
    conn: Connection,
}

impl StoreSession {
    pub fn find_act_id(&self, code: &str) -> Result<Option<i64>, StoreError> {
        find_act_id(&self.conn, code)
    }

    pub fn list_act_types(&self) -> Result<Vec<ActTypeRow>, StoreError> {
        list_act_types(&self.conn)
    }

    /// Begin a transaction. Dropping the writer without [`ActWriter::commit`] rolls back.
    pub fn writer(&mut self) -> Result<ActWriter<'_>, StoreError> {
        let tx = self.conn.transaction()?;
        Ok(ActWriter { tx })
    }

    /// Write an act, its type links and all of its versions in one transaction.
    pub fn persist_act(
        &mut self,
        assembled: &AssembledAct,
        type_ids: &[i64],
    ) -> Result<i64, StoreError> {
        let writer = self.writer()?;
        let act_id = writer.insert_act(&assembled.act)?;
        for &type_id in type_ids {
            writer.link_act_type(act_id, type_id)?;
        }
        for version in &assembled.versions {
            writer.append_version(act_id, version)?;
        }
        writer.commit()?;
        debug!(
            code = %assembled.act.code,
            act_id,
            versions = assembled.versions.len(),
            "act committed"
        );
        Ok(act_id)
    }
}

/// An open per-act transaction.
pub struct ActWriter<'a> {
    tx: Transaction<'a>,
}

impl ActWriter<'_> {
    pub fn insert_act(&self, act: &Act) -> Result<i64, StoreError> {
        let id = self.tx.query_row(
            "INSERT INTO act (code, sa_doc_number_ru, sa_doc_number_kz, ju_doc_number, ngr,
                              status, registry_number, sa_approval_date, ju_approval_date,
                              action_date, effective_date, initial_pub_date, title, requisite)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
            params![
                act.code,
                act.sa_doc_number_ru,
                act.sa_doc_number_kz,
                act.ju_doc_number,
                act.ngr,
                act.status.map(ActStatus::as_str),
                act.registry_number,
                act.sa_approval_date,
                act.ju_approval_date,
                act.action_date,
                act.effective_date,
                act.initial_pub_date,
                act.title,
                act.requisite,
            ],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(id)
    }

    pub fn link_act_type(&self, act_id: i64, type_id: i64) -> Result<(), StoreError> {
        self.tx.execute(
            "INSERT INTO act_type_link (act_id, type_id) VALUES (?, ?)",
            params![act_id, type_id],
        )?;
        Ok(())
    }

    pub fn append_version(&self, act_id: i64, version: &ActVersion) -> Result<(), StoreError> {
        self.tx.execute(
            "INSERT INTO act_version (act_id, date, language, is_actual, version_id, content,
                                      cause_act_code)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                act_id,
                version.date,
                version.language.as_str(),
                version.is_actual,
                version.version_id,
                version.content,
                version.cause_act_code.as_deref(),
            ],
        )?;
        Ok(())
    }

    pub fn commit(self) -> Result<(), StoreError> {
        self.tx.commit()?;
        Ok(())
    }
}

fn find_act_id(conn: &Connection, code: &str) -> Result<Option<i64>, StoreError> {
    match conn.query_row("SELECT id FROM act WHERE code = ?", params![code], |row| {
        row.get::<_, i64>(0)
    }) {
        Ok(id) => Ok(Some(id)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn list_act_types(conn: &Connection) -> Result<Vec<ActTypeRow>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, code FROM act_type ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter()
        .map(|(id, code)| {
            Ok(ActTypeRow {
                id,
                code: code.parse()?,
            })
        })
        .collect()
}
