use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::IngestArgs;
use crate::store;
use crate::util::{ensure_directory, sha256_file};

const PARSED_SCHEMA_VERSION: &str = "v1";

pub fn run(args: IngestArgs) -> Result<()> {
    let cache_root = args.cache_root.clone();
    ensure_directory(&cache_root)?;
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| cache_root.join("govcheck.sqlite"));

    let raw = fs::read_to_string(&args.parsed_path)
        .with_context(|| format!("failed to read {}", args.parsed_path.display()))?;
    if serde_json::from_str::<serde_json::Value>(&raw).is_err() {
        warn!(
            parsed_path = %args.parsed_path.display(),
            "parsed report is not valid json, checks will report its tables as missing"
        );
    }

    let file_hash = sha256_file(&args.parsed_path)?;
    let file_name = args
        .parsed_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.parsed_path.display().to_string());

    let mut connection = store::open(&db_path)?;
    let report_id = store::upsert_report(&connection, &args.region, args.year, &args.unit_name)?;
    let version_id = store::insert_version(
        &mut connection,
        report_id,
        &file_name,
        &file_hash,
        &raw,
        PARSED_SCHEMA_VERSION,
    )?;

    info!(
        report_id,
        version_id,
        region = %args.region,
        year = args.year,
        file_name = %file_name,
        file_hash = %file_hash,
        "ingested report version"
    );

    Ok(())
}
