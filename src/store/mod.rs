use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};
use serde::Serialize;

use crate::model::{CheckItem, GroupKey, HumanStatus, RunStatus, RunSummary};
use crate::util::now_utc_string;

#[cfg(test)]
mod tests;

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

const ITEM_COLUMNS: &str = "id, run_id, report_version_id, group_key, check_key, fingerprint, \
     title, expr, left_value, right_value, delta, tolerance, auto_status, evidence_json, \
     human_status, human_comment, created_at, updated_at";

pub fn open(path: &Path) -> Result<Connection> {
    let connection = Connection::open(path)
        .with_context(|| format!("failed to open database: {}", path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

pub fn open_read_only(path: &Path) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Connection::open_with_flags(path, flags)
        .with_context(|| format!("failed to open database read-only: {}", path.display()))
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reports (
          id INTEGER PRIMARY KEY,
          region TEXT NOT NULL,
          year INTEGER NOT NULL,
          unit_name TEXT NOT NULL DEFAULT '',
          created_at TEXT NOT NULL,
          UNIQUE(region, year, unit_name)
        );

        CREATE TABLE IF NOT EXISTS report_versions (
          id INTEGER PRIMARY KEY,
          report_id INTEGER NOT NULL,
          file_name TEXT NOT NULL,
          file_hash TEXT NOT NULL,
          parsed_json TEXT NOT NULL,
          schema_version TEXT NOT NULL DEFAULT 'v1',
          is_active INTEGER NOT NULL DEFAULT 1,
          created_at TEXT NOT NULL,
          UNIQUE(report_id, file_hash),
          FOREIGN KEY(report_id) REFERENCES reports(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS check_runs (
          id INTEGER PRIMARY KEY,
          report_version_id INTEGER NOT NULL,
          status TEXT NOT NULL CHECK(status IN ('running', 'succeeded', 'failed')),
          engine_version TEXT NOT NULL,
          summary_json TEXT,
          created_at TEXT NOT NULL,
          finished_at TEXT,
          FOREIGN KEY(report_version_id) REFERENCES report_versions(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS check_items (
          id INTEGER PRIMARY KEY,
          run_id INTEGER NOT NULL,
          report_version_id INTEGER NOT NULL,
          group_key TEXT NOT NULL CHECK(group_key IN ('table3', 'table4', 'text')),
          check_key TEXT NOT NULL,
          fingerprint TEXT NOT NULL,
          title TEXT NOT NULL,
          expr TEXT NOT NULL,
          left_value REAL,
          right_value REAL,
          delta REAL,
          tolerance REAL NOT NULL DEFAULT 0,
          auto_status TEXT NOT NULL CHECK(auto_status IN ('PASS', 'FAIL', 'UNCERTAIN', 'NOT_ASSESSABLE')),
          evidence_json TEXT NOT NULL,
          human_status TEXT NOT NULL DEFAULT 'pending' CHECK(human_status IN ('pending', 'confirmed', 'dismissed')),
          human_comment TEXT,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL,
          UNIQUE(report_version_id, fingerprint),
          FOREIGN KEY(run_id) REFERENCES check_runs(id) ON DELETE CASCADE,
          FOREIGN KEY(report_version_id) REFERENCES report_versions(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_report_versions_report_active ON report_versions(report_id, is_active);
        CREATE INDEX IF NOT EXISTS idx_check_runs_version ON check_runs(report_version_id);
        CREATE INDEX IF NOT EXISTS idx_check_items_run ON check_items(run_id);
        CREATE INDEX IF NOT EXISTS idx_check_items_version ON check_items(report_version_id);
        CREATE INDEX IF NOT EXISTS idx_check_items_group ON check_items(group_key);
        CREATE INDEX IF NOT EXISTS idx_check_items_status ON check_items(auto_status, human_status);
        CREATE INDEX IF NOT EXISTS idx_check_items_fingerprint ON check_items(fingerprint);
        ",
    )?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

pub fn upsert_report(
    connection: &Connection,
    region: &str,
    year: u32,
    unit_name: &str,
) -> Result<i64> {
    connection
        .execute(
            "INSERT INTO reports(region, year, unit_name, created_at) VALUES(?1, ?2, ?3, ?4)
             ON CONFLICT(region, year, unit_name) DO NOTHING",
            params![region, year, unit_name, now_utc_string()],
        )
        .context("failed to upsert report")?;

    connection
        .query_row(
            "SELECT id FROM reports WHERE region = ?1 AND year = ?2 AND unit_name = ?3",
            params![region, year, unit_name],
            |row| row.get(0),
        )
        .context("failed to load report id")
}

pub fn insert_version(
    connection: &mut Connection,
    report_id: i64,
    file_name: &str,
    file_hash: &str,
    parsed_json: &str,
    schema_version: &str,
) -> Result<i64> {
    let now = now_utc_string();
    let tx = connection.transaction()?;

    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM report_versions WHERE report_id = ?1 AND file_hash = ?2",
            params![report_id, file_hash],
            |row| row.get(0),
        )
        .optional()?;

    let version_id = match existing {
        Some(version_id) => {
            tx.execute(
                "UPDATE report_versions
                 SET file_name = ?1, parsed_json = ?2, schema_version = ?3, is_active = 1
                 WHERE id = ?4",
                params![file_name, parsed_json, schema_version, version_id],
            )?;
            version_id
        }
        None => {
            tx.execute(
                "INSERT INTO report_versions(report_id, file_name, file_hash, parsed_json, schema_version, is_active, created_at)
                 VALUES(?1, ?2, ?3, ?4, ?5, 1, ?6)",
                params![report_id, file_name, file_hash, parsed_json, schema_version, now],
            )?;
            tx.last_insert_rowid()
        }
    };

    tx.execute(
        "UPDATE report_versions SET is_active = 0 WHERE report_id = ?1 AND id != ?2",
        params![report_id, version_id],
    )?;

    tx.commit()?;
    Ok(version_id)
}

pub fn active_version_id(connection: &Connection, report_id: i64) -> Result<Option<i64>> {
    connection
        .query_row(
            "SELECT id FROM report_versions
             WHERE report_id = ?1 AND is_active = 1
             ORDER BY id DESC LIMIT 1",
            [report_id],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("failed to resolve active version for report {report_id}"))
}

pub fn resolve_version(
    connection: &Connection,
    version_id: Option<i64>,
    report_id: Option<i64>,
) -> Result<i64> {
    match (version_id, report_id) {
        (Some(_), Some(_)) => bail!("pass either --version-id or --report-id, not both"),
        (Some(version_id), None) => Ok(version_id),
        (None, Some(report_id)) => active_version_id(connection, report_id)?
            .with_context(|| format!("no active version for report {report_id}")),
        (None, None) => bail!("pass --version-id or --report-id"),
    }
}

pub fn version_parsed_json(
    connection: &Connection,
    report_version_id: i64,
) -> Result<Option<String>> {
    connection
        .query_row(
            "SELECT parsed_json FROM report_versions WHERE id = ?1",
            [report_version_id],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("failed to load parsed json for version {report_version_id}"))
}

pub fn create_run(
    connection: &Connection,
    report_version_id: i64,
    engine_version: &str,
) -> Result<i64> {
    connection
        .execute(
            "INSERT INTO check_runs(report_version_id, status, engine_version, created_at)
             VALUES(?1, ?2, ?3, ?4)",
            params![
                report_version_id,
                RunStatus::Running.as_str(),
                engine_version,
                now_utc_string()
            ],
        )
        .context("failed to create check run")?;
    Ok(connection.last_insert_rowid())
}

pub fn finish_run_succeeded(
    connection: &Connection,
    run_id: i64,
    summary: &RunSummary,
) -> Result<()> {
    let summary_json = serde_json::to_string(summary).context("failed to serialize run summary")?;
    connection
        .execute(
            "UPDATE check_runs SET status = ?1, summary_json = ?2, finished_at = ?3 WHERE id = ?4",
            params![
                RunStatus::Succeeded.as_str(),
                summary_json,
                now_utc_string(),
                run_id
            ],
        )
        .context("failed to finalize check run")?;
    Ok(())
}

pub fn finish_run_failed(connection: &Connection, run_id: i64) -> Result<()> {
    connection
        .execute(
            "UPDATE check_runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Failed.as_str(), now_utc_string(), run_id],
        )
        .context("failed to mark check run failed")?;
    Ok(())
}

pub fn replace_items(
    connection: &mut Connection,
    run_id: i64,
    report_version_id: i64,
    items: &[CheckItem],
) -> Result<usize> {
    let now = now_utc_string();
    let tx = connection.transaction()?;

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO check_items(
              run_id, report_version_id, group_key, check_key, fingerprint,
              title, expr, left_value, right_value, delta, tolerance, auto_status,
              evidence_json, human_status, created_at, updated_at
            ) VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 'pending', ?14, ?14)
            ON CONFLICT(report_version_id, fingerprint) DO UPDATE SET
              run_id=excluded.run_id,
              check_key=excluded.check_key,
              title=excluded.title,
              expr=excluded.expr,
              left_value=excluded.left_value,
              right_value=excluded.right_value,
              delta=excluded.delta,
              tolerance=excluded.tolerance,
              auto_status=excluded.auto_status,
              evidence_json=excluded.evidence_json,
              updated_at=excluded.updated_at
            ",
        )?;

        for item in items {
            let evidence_json = serde_json::to_string(&item.evidence)
                .with_context(|| format!("failed to serialize evidence for {}", item.check_key))?;
            statement.execute(params![
                run_id,
                report_version_id,
                item.group_key.as_str(),
                &item.check_key,
                &item.fingerprint,
                &item.title,
                &item.expr,
                item.left_value,
                item.right_value,
                item.delta,
                item.tolerance,
                item.auto_status.as_str(),
                evidence_json,
                now,
            ])?;
        }
    }

    tx.execute(
        "DELETE FROM check_items WHERE report_version_id = ?1 AND run_id != ?2",
        params![report_version_id, run_id],
    )?;

    tx.commit()?;
    Ok(items.len())
}

pub fn version_summary(connection: &Connection, report_version_id: i64) -> Result<RunSummary> {
    connection
        .query_row(
            "
            SELECT
              COUNT(*),
              COALESCE(SUM(CASE WHEN auto_status = 'PASS' THEN 1 ELSE 0 END), 0),
              COALESCE(SUM(CASE WHEN auto_status = 'FAIL' THEN 1 ELSE 0 END), 0),
              COALESCE(SUM(CASE WHEN auto_status = 'UNCERTAIN' THEN 1 ELSE 0 END), 0),
              COALESCE(SUM(CASE WHEN auto_status = 'NOT_ASSESSABLE' THEN 1 ELSE 0 END), 0),
              COALESCE(SUM(CASE WHEN human_status = 'pending' THEN 1 ELSE 0 END), 0),
              COALESCE(SUM(CASE WHEN human_status = 'confirmed' THEN 1 ELSE 0 END), 0),
              COALESCE(SUM(CASE WHEN human_status = 'dismissed' THEN 1 ELSE 0 END), 0)
            FROM check_items
            WHERE report_version_id = ?1
            ",
            [report_version_id],
            |row| {
                Ok(RunSummary {
                    total: row.get(0)?,
                    pass: row.get(1)?,
                    fail: row.get(2)?,
                    uncertain: row.get(3)?,
                    not_assessable: row.get(4)?,
                    pending: row.get(5)?,
                    confirmed: row.get(6)?,
                    dismissed: row.get(7)?,
                })
            },
        )
        .context("failed to aggregate check summary")
}

pub fn open_failure_count(connection: &Connection, report_version_id: i64) -> Result<i64> {
    connection
        .query_row(
            "SELECT COUNT(*) FROM check_items
             WHERE report_version_id = ?1 AND auto_status = 'FAIL' AND human_status = 'pending'",
            [report_version_id],
            |row| row.get(0),
        )
        .context("failed to count open failures")
}

pub fn update_review(
    connection: &Connection,
    item_id: i64,
    status: Option<HumanStatus>,
    comment: Option<&str>,
) -> Result<StoredCheckItem> {
    let now = now_utc_string();
    let changed = match (status, comment) {
        (None, None) => bail!("nothing to update: pass --status and/or --comment"),
        (Some(status), None) => connection.execute(
            "UPDATE check_items SET human_status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), now, item_id],
        )?,
        (None, Some(comment)) => connection.execute(
            "UPDATE check_items SET human_comment = ?1, updated_at = ?2 WHERE id = ?3",
            params![comment, now, item_id],
        )?,
        (Some(status), Some(comment)) => connection.execute(
            "UPDATE check_items SET human_status = ?1, human_comment = ?2, updated_at = ?3 WHERE id = ?4",
            params![status.as_str(), comment, now, item_id],
        )?,
    };

    if changed == 0 {
        bail!("check item not found: {item_id}");
    }

    load_item(connection, item_id)?
        .with_context(|| format!("check item not found after update: {item_id}"))
}

pub fn load_item(connection: &Connection, item_id: i64) -> Result<Option<StoredCheckItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM check_items WHERE id = ?1");
    connection
        .query_row(&sql, [item_id], item_from_row)
        .optional()
        .with_context(|| format!("failed to load check item {item_id}"))
}

pub fn load_current_items(
    connection: &Connection,
    report_version_id: i64,
    group: Option<GroupKey>,
    include_dismissed: bool,
) -> Result<Vec<StoredCheckItem>> {
    let mut sql = format!("SELECT {ITEM_COLUMNS} FROM check_items WHERE report_version_id = ?1");
    if group.is_some() {
        sql.push_str(" AND group_key = ?2");
    }
    if !include_dismissed {
        sql.push_str(" AND human_status != 'dismissed'");
    }
    sql.push_str(" ORDER BY group_key, check_key");

    let mut statement = connection.prepare(&sql)?;
    let rows = match group {
        Some(group) => {
            statement.query_map(params![report_version_id, group.as_str()], item_from_row)?
        }
        None => statement.query_map(params![report_version_id], item_from_row)?,
    };

    let mut items = Vec::new();
    for row in rows {
        items.push(row.context("failed to read check item row")?);
    }
    Ok(items)
}

pub fn latest_run(connection: &Connection, report_version_id: i64) -> Result<Option<RunRow>> {
    connection
        .query_row(
            "SELECT id, report_version_id, status, engine_version, summary_json, created_at, finished_at
             FROM check_runs
             WHERE report_version_id = ?1
             ORDER BY id DESC LIMIT 1",
            [report_version_id],
            |row| {
                let summary_raw: Option<String> = row.get(4)?;
                Ok(RunRow {
                    id: row.get(0)?,
                    report_version_id: row.get(1)?,
                    status: row.get(2)?,
                    engine_version: row.get(3)?,
                    summary: summary_raw.and_then(|raw| serde_json::from_str(&raw).ok()),
                    created_at: row.get(5)?,
                    finished_at: row.get(6)?,
                })
            },
        )
        .optional()
        .context("failed to load latest check run")
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<StoredCheckItem> {
    let evidence_raw: String = row.get(13)?;
    let evidence = serde_json::from_str(&evidence_raw).unwrap_or(serde_json::Value::Null);

    Ok(StoredCheckItem {
        id: row.get(0)?,
        run_id: row.get(1)?,
        report_version_id: row.get(2)?,
        group_key: row.get(3)?,
        check_key: row.get(4)?,
        fingerprint: row.get(5)?,
        title: row.get(6)?,
        expr: row.get(7)?,
        left_value: row.get(8)?,
        right_value: row.get(9)?,
        delta: row.get(10)?,
        tolerance: row.get(11)?,
        auto_status: row.get(12)?,
        evidence,
        human_status: row.get(14)?,
        human_comment: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredCheckItem {
    pub id: i64,
    pub run_id: i64,
    pub report_version_id: i64,
    pub group_key: String,
    pub check_key: String,
    pub fingerprint: String,
    pub title: String,
    pub expr: String,
    pub left_value: Option<f64>,
    pub right_value: Option<f64>,
    pub delta: Option<f64>,
    pub tolerance: f64,
    pub auto_status: String,
    pub evidence: serde_json::Value,
    pub human_status: String,
    pub human_comment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunRow {
    pub id: i64,
    pub report_version_id: i64,
    pub status: String,
    pub engine_version: String,
    pub summary: Option<RunSummary>,
    pub created_at: String,
    pub finished_at: Option<String>,
}
