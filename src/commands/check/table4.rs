use std::collections::BTreeMap;

use crate::model::{AutoStatus, CheckItem, Evidence, GroupKey};
use crate::report::{Table4Category, Table4Data, Table4Kind, sum_all};
use crate::util::check_fingerprint;

use super::engine::new_item;

pub(super) fn collect_items(table: Option<&Table4Data>) -> Vec<CheckItem> {
    let Some(table) = table else {
        return vec![missing_table_item()];
    };

    let mut items = Vec::new();

    for kind in Table4Kind::ALL {
        let Some(category) = table.category(kind) else {
            continue;
        };
        items.push(category_sum_item(kind, category));
    }

    items
}

fn category_sum_item(kind: Table4Kind, category: &Table4Category) -> CheckItem {
    let maintain = category.maintain.value();
    let correct = category.correct.value();
    let other = category.other.value();
    let unfinished = category.unfinished.value();
    let total = category.total.value();

    let left = sum_all([maintain, correct, other, unfinished]);

    let base = format!("reviewLitigationData.{}", kind.as_str());
    let paths = vec![
        format!("{base}.maintain"),
        format!("{base}.correct"),
        format!("{base}.other"),
        format!("{base}.unfinished"),
        format!("{base}.total"),
    ];
    let values = BTreeMap::from([
        ("maintain".to_string(), maintain),
        ("correct".to_string(), correct),
        ("other".to_string(), other),
        ("unfinished".to_string(), unfinished),
        ("total".to_string(), total),
    ]);

    new_item(
        GroupKey::Table4,
        format!("t4_sum_{}", kind.as_str()),
        format!(
            "表四：结果维持+结果纠正+其他结果+尚未审结=总计（{}）",
            kind.label()
        ),
        "maintain + correct + other + unfinished = total".to_string(),
        left,
        total,
        0.0,
        Evidence {
            paths,
            values,
            text_matches: Vec::new(),
        },
    )
}

fn missing_table_item() -> CheckItem {
    CheckItem {
        group_key: GroupKey::Table4,
        check_key: "t4_missing".to_string(),
        fingerprint: check_fingerprint("table4", "t4_missing", "table4_exists"),
        title: "表四：数据缺失".to_string(),
        expr: "table4_exists".to_string(),
        left_value: None,
        right_value: None,
        delta: None,
        tolerance: 0.0,
        auto_status: AutoStatus::NotAssessable,
        evidence: Evidence {
            paths: vec!["sections[type=table_4].reviewLitigationData".to_string()],
            values: BTreeMap::from([("reviewLitigationData".to_string(), None)]),
            text_matches: Vec::new(),
        },
    }
}
