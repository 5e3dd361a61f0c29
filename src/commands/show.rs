use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::cli::{GroupFilter, ShowArgs};
use crate::model::GroupKey;
use crate::store::{self, RunRow, StoredCheckItem};

#[derive(Debug, Serialize)]
struct ShowResponse {
    report_version_id: i64,
    group_filter: Option<String>,
    include_dismissed: bool,
    returned: usize,
    latest_run: Option<RunRow>,
    items: Vec<StoredCheckItem>,
}

pub fn run(args: ShowArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("govcheck.sqlite"));
    if !db_path.exists() {
        bail!("database not found: {}", db_path.display());
    }

    let connection = store::open_read_only(&db_path)?;
    let version_id = store::resolve_version(&connection, args.version_id, args.report_id)?;

    let group = args.group.map(|group| match group {
        GroupFilter::Table3 => GroupKey::Table3,
        GroupFilter::Table4 => GroupKey::Table4,
        GroupFilter::Text => GroupKey::Text,
    });
    let latest_run = store::latest_run(&connection, version_id)?;
    let items = store::load_current_items(&connection, version_id, group, args.include_dismissed)?;

    if args.json {
        let response = ShowResponse {
            report_version_id: version_id,
            group_filter: args.group.map(|group| group.as_str().to_string()),
            include_dismissed: args.include_dismissed,
            returned: items.len(),
            latest_run,
            items,
        };
        let mut output = io::BufWriter::new(io::stdout().lock());
        serde_json::to_writer_pretty(&mut output, &response)
            .context("failed to serialize show json output")?;
        writeln!(output)?;
        output.flush()?;
        return Ok(());
    }

    write_text_response(version_id, latest_run.as_ref(), &items)
}

fn write_text_response(
    version_id: i64,
    latest_run: Option<&RunRow>,
    items: &[StoredCheckItem],
) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Version: {version_id}")?;
    match latest_run {
        Some(run) => {
            writeln!(
                output,
                "Run: id={} status={} engine={} created={} finished={}",
                run.id,
                run.status,
                run.engine_version,
                run.created_at,
                run.finished_at.as_deref().unwrap_or("-")
            )?;
            if let Some(summary) = &run.summary {
                writeln!(
                    output,
                    "Summary: total={} pass={} fail={} uncertain={} not_assessable={} pending={} confirmed={} dismissed={}",
                    summary.total,
                    summary.pass,
                    summary.fail,
                    summary.uncertain,
                    summary.not_assessable,
                    summary.pending,
                    summary.confirmed,
                    summary.dismissed,
                )?;
            }
        }
        None => writeln!(output, "Run: none")?,
    }
    writeln!(output, "Items: {}", items.len())?;

    for item in items {
        writeln!(
            output,
            "{}\t{}/{}\tauto={} human={}",
            item.id, item.group_key, item.check_key, item.auto_status, item.human_status
        )?;
        writeln!(output, "\t{}", item.title)?;
        writeln!(
            output,
            "\tleft={} right={} delta={}",
            format_value(item.left_value),
            format_value(item.right_value),
            format_value(item.delta)
        )?;
        if let Some(comment) = &item.human_comment {
            writeln!(output, "\tcomment: {comment}")?;
        }
    }

    output.flush()?;
    Ok(())
}

fn format_value(value: Option<f64>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "-".to_string())
}
