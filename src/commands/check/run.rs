use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::CheckArgs;
use crate::model::{CheckRunManifest, RunStatus, RunSummary};
use crate::report::parse_report;
use crate::store;
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

use super::engine;

pub fn run(args: CheckArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| cache_root.join("govcheck.sqlite"));
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("check_run_{}.json", utc_compact_string(started_ts)))
    });

    let mut connection = store::open(&db_path)?;
    let version_id = store::resolve_version(&connection, args.version_id, args.report_id)?;

    info!(
        db_path = %db_path.display(),
        report_version_id = version_id,
        engine_version = engine::ENGINE_VERSION,
        "starting consistency check run"
    );

    let run_id = store::create_run(&connection, version_id, engine::ENGINE_VERSION)?;

    let (item_count, summary) = match evaluate_version(&mut connection, run_id, version_id) {
        Ok(result) => result,
        Err(err) => {
            if let Err(mark_err) = store::finish_run_failed(&connection, run_id) {
                warn!(error = %mark_err, run_id = run_id, "failed to mark check run as failed");
            }
            return Err(err);
        }
    };

    store::finish_run_succeeded(&connection, run_id, &summary)?;
    let finished_at = now_utc_string();

    info!(
        run_id = run_id,
        report_version_id = version_id,
        items = item_count,
        fail = summary.fail,
        uncertain = summary.uncertain,
        pass = summary.pass,
        not_assessable = summary.not_assessable,
        "consistency check run finished"
    );

    let manifest = CheckRunManifest {
        manifest_version: 1,
        run_id,
        engine_version: engine::ENGINE_VERSION.to_string(),
        db_schema_version: store::DB_SCHEMA_VERSION.to_string(),
        report_version_id: version_id,
        status: RunStatus::Succeeded.as_str().to_string(),
        started_at,
        finished_at,
        item_count,
        summary,
        db_path: db_path.display().to_string(),
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(manifest_path = %manifest_path.display(), "wrote check run manifest");

    Ok(())
}

fn evaluate_version(
    connection: &mut Connection,
    run_id: i64,
    version_id: i64,
) -> Result<(usize, RunSummary)> {
    let raw = store::version_parsed_json(connection, version_id)?
        .with_context(|| format!("report version not found: {version_id}"))?;

    let report = parse_report(&raw);
    let items = engine::evaluate(&report)?;
    let item_count = store::replace_items(connection, run_id, version_id, &items)?;
    let summary = store::version_summary(connection, version_id)?;

    Ok((item_count, summary))
}
