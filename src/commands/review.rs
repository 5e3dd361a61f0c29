use anyhow::{Result, bail};
use tracing::info;

use crate::cli::{ReviewArgs, ReviewStatus};
use crate::model::HumanStatus;
use crate::store;

pub fn run(args: ReviewArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("govcheck.sqlite"));
    if !db_path.exists() {
        bail!("database not found: {}", db_path.display());
    }

    let connection = store::open(&db_path)?;
    let status = args.status.map(|status| match status {
        ReviewStatus::Pending => HumanStatus::Pending,
        ReviewStatus::Confirmed => HumanStatus::Confirmed,
        ReviewStatus::Dismissed => HumanStatus::Dismissed,
    });

    let item = store::update_review(&connection, args.item_id, status, args.comment.as_deref())?;
    let open_failures = store::open_failure_count(&connection, item.report_version_id)?;

    info!(
        item_id = item.id,
        report_version_id = item.report_version_id,
        check_key = %item.check_key,
        human_status = %item.human_status,
        open_failures,
        "review recorded"
    );

    Ok(())
}
