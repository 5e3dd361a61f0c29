use anyhow::Result;

use crate::model::{AutoStatus, CheckItem, Evidence, GroupKey};
use crate::report::ParsedReport;
use crate::util::check_fingerprint;

use super::{table3, table4, text};

pub(super) const ENGINE_VERSION: &str = "v1";

pub(super) fn evaluate(report: &ParsedReport) -> Result<Vec<CheckItem>> {
    let table3_data = report.table3_data();
    let table4_data = report.table4_data();

    let mut items = table3::collect_items(table3_data);
    items.extend(table4::collect_items(table4_data));
    items.extend(text::collect_items(
        &report.sections,
        table3_data,
        table4_data,
    )?);
    Ok(items)
}

#[allow(clippy::too_many_arguments)]
pub(super) fn new_item(
    group_key: GroupKey,
    check_key: String,
    title: String,
    expr: String,
    left_value: Option<f64>,
    right_value: Option<f64>,
    tolerance: f64,
    evidence: Evidence,
) -> CheckItem {
    let fingerprint = check_fingerprint(group_key.as_str(), &check_key, &expr);

    let (auto_status, delta) = match (left_value, right_value) {
        (Some(left), Some(right)) => {
            let delta = left - right;
            if delta.abs() <= tolerance {
                (AutoStatus::Pass, Some(delta))
            } else {
                (AutoStatus::Fail, Some(delta))
            }
        }
        _ => (AutoStatus::Uncertain, None),
    };

    CheckItem {
        group_key,
        check_key,
        fingerprint,
        title,
        expr,
        left_value,
        right_value,
        delta,
        tolerance,
        auto_status,
        evidence,
    }
}
