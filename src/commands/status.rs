use anyhow::Result;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::store;

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = args.cache_root.join("govcheck.sqlite");

    info!(cache_root = %args.cache_root.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = store::open_read_only(&db_path)?;
    let schema_version: String = connection
        .query_row(
            "SELECT value FROM metadata WHERE key = 'db_schema_version'",
            [],
            |row| row.get(0),
        )
        .unwrap_or_else(|_| "unknown".to_string());

    let reports_count = query_count(&connection, "SELECT COUNT(*) FROM reports").unwrap_or(0);
    let versions_count =
        query_count(&connection, "SELECT COUNT(*) FROM report_versions").unwrap_or(0);
    let runs_count = query_count(&connection, "SELECT COUNT(*) FROM check_runs").unwrap_or(0);
    let items_count = query_count(&connection, "SELECT COUNT(*) FROM check_items").unwrap_or(0);

    info!(
        path = %db_path.display(),
        schema_version = %schema_version,
        reports = reports_count,
        report_versions = versions_count,
        check_runs = runs_count,
        check_items = items_count,
        "database status"
    );

    let mut statement = connection.prepare(
        "SELECT report_version_id, COUNT(*) FROM check_items
         WHERE auto_status = 'FAIL' AND human_status = 'pending'
         GROUP BY report_version_id
         ORDER BY report_version_id",
    )?;
    let rows = statement.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (version_id, open_failures) = row?;
        info!(report_version_id = version_id, open_failures, "open failures awaiting review");
    }

    Ok(())
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
