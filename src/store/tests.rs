use std::collections::BTreeMap;

use super::*;
use crate::model::{AutoStatus, Evidence};
use crate::util::check_fingerprint;

fn test_connection() -> Connection {
    let connection = Connection::open_in_memory().unwrap();
    ensure_schema(&connection).unwrap();
    connection
}

fn seeded_version(connection: &mut Connection) -> i64 {
    let report_id = upsert_report(connection, "110000", 2023, "").unwrap();
    insert_version(
        connection,
        report_id,
        "report.json",
        "hash-a",
        r#"{"sections":[]}"#,
        "v1",
    )
    .unwrap()
}

fn sample_item(group_key: GroupKey, check_key: &str, auto_status: AutoStatus) -> CheckItem {
    let expr = "left = right";
    CheckItem {
        group_key,
        check_key: check_key.to_string(),
        fingerprint: check_fingerprint(group_key.as_str(), check_key, expr),
        title: format!("校验（{check_key}）"),
        expr: expr.to_string(),
        left_value: Some(1.0),
        right_value: Some(1.0),
        delta: Some(0.0),
        tolerance: 0.0,
        auto_status,
        evidence: Evidence {
            paths: vec!["tableData.total.newReceived".to_string()],
            values: BTreeMap::from([("newReceived".to_string(), Some(1.0))]),
            text_matches: Vec::new(),
        },
    }
}

#[test]
fn ensure_schema_is_idempotent_and_records_version() {
    let connection = test_connection();
    ensure_schema(&connection).unwrap();

    let recorded: String = connection
        .query_row(
            "SELECT value FROM metadata WHERE key = 'db_schema_version'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(recorded, DB_SCHEMA_VERSION);
}

#[test]
fn upsert_report_returns_stable_id() {
    let connection = test_connection();

    let first = upsert_report(&connection, "110000", 2023, "").unwrap();
    let second = upsert_report(&connection, "110000", 2023, "").unwrap();
    assert_eq!(first, second);

    let other = upsert_report(&connection, "110000", 2023, "市司法局").unwrap();
    assert_ne!(first, other);
}

#[test]
fn insert_version_reuses_row_for_same_hash() {
    let mut connection = test_connection();
    let report_id = upsert_report(&connection, "110000", 2023, "").unwrap();

    let first = insert_version(
        &mut connection,
        report_id,
        "report.json",
        "hash-a",
        r#"{"sections":[]}"#,
        "v1",
    )
    .unwrap();
    let second = insert_version(
        &mut connection,
        report_id,
        "report-renamed.json",
        "hash-a",
        r#"{"sections":[{"type":"text"}]}"#,
        "v1",
    )
    .unwrap();
    assert_eq!(first, second);

    let rows: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM report_versions WHERE report_id = ?1",
            [report_id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rows, 1);

    let stored = version_parsed_json(&connection, first).unwrap().unwrap();
    assert!(stored.contains("text"));
    assert_eq!(version_parsed_json(&connection, first + 999).unwrap(), None);
}

#[test]
fn insert_version_switches_active_flag() {
    let mut connection = test_connection();
    let report_id = upsert_report(&connection, "110000", 2023, "").unwrap();

    let v1 = insert_version(&mut connection, report_id, "a.json", "hash-a", "{}", "v1").unwrap();
    let v2 = insert_version(&mut connection, report_id, "b.json", "hash-b", "{}", "v1").unwrap();
    assert_ne!(v1, v2);
    assert_eq!(active_version_id(&connection, report_id).unwrap(), Some(v2));

    let reingested =
        insert_version(&mut connection, report_id, "a.json", "hash-a", "{}", "v1").unwrap();
    assert_eq!(reingested, v1);
    assert_eq!(active_version_id(&connection, report_id).unwrap(), Some(v1));

    let active_rows: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM report_versions WHERE report_id = ?1 AND is_active = 1",
            [report_id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(active_rows, 1);
}

#[test]
fn resolve_version_requires_exactly_one_selector() {
    let mut connection = test_connection();
    let version_id = seeded_version(&mut connection);

    assert!(resolve_version(&connection, None, None).is_err());
    assert!(resolve_version(&connection, Some(1), Some(1)).is_err());
    assert_eq!(
        resolve_version(&connection, Some(version_id), None).unwrap(),
        version_id
    );

    let report_id = upsert_report(&connection, "110000", 2023, "").unwrap();
    assert_eq!(
        resolve_version(&connection, None, Some(report_id)).unwrap(),
        version_id
    );
    assert!(resolve_version(&connection, None, Some(report_id + 999)).is_err());
}

#[test]
fn replace_items_marks_new_items_pending() {
    let mut connection = test_connection();
    let version_id = seeded_version(&mut connection);
    let run_id = create_run(&connection, version_id, "v1").unwrap();

    let items = vec![
        sample_item(GroupKey::Table3, "t3_identity_total", AutoStatus::Pass),
        sample_item(GroupKey::Table4, "t4_sum_review", AutoStatus::Fail),
    ];
    let written = replace_items(&mut connection, run_id, version_id, &items).unwrap();
    assert_eq!(written, 2);

    let stored = load_current_items(&connection, version_id, None, false).unwrap();
    assert_eq!(stored.len(), 2);
    for item in &stored {
        assert_eq!(item.human_status, "pending");
        assert_eq!(item.human_comment, None);
        assert_eq!(item.run_id, run_id);
        assert!(item.evidence.get("paths").is_some());
    }
}

#[test]
fn replace_items_preserves_review_on_rerun() {
    let mut connection = test_connection();
    let version_id = seeded_version(&mut connection);

    let run1 = create_run(&connection, version_id, "v1").unwrap();
    let mut item = sample_item(GroupKey::Table3, "t3_identity_total", AutoStatus::Fail);
    item.left_value = Some(10.0);
    item.right_value = Some(12.0);
    item.delta = Some(-2.0);
    replace_items(&mut connection, run1, version_id, &[item.clone()]).unwrap();

    let stored = load_current_items(&connection, version_id, None, false).unwrap();
    let reviewed = update_review(
        &connection,
        stored[0].id,
        Some(HumanStatus::Confirmed),
        Some("已与原件核对"),
    )
    .unwrap();
    assert_eq!(reviewed.human_status, "confirmed");

    let run2 = create_run(&connection, version_id, "v1").unwrap();
    item.left_value = Some(12.0);
    item.right_value = Some(12.0);
    item.delta = Some(0.0);
    item.auto_status = AutoStatus::Pass;
    replace_items(&mut connection, run2, version_id, &[item]).unwrap();

    let after = load_current_items(&connection, version_id, None, false).unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].run_id, run2);
    assert_eq!(after[0].auto_status, "PASS");
    assert_eq!(after[0].left_value, Some(12.0));
    assert_eq!(after[0].human_status, "confirmed");
    assert_eq!(after[0].human_comment.as_deref(), Some("已与原件核对"));
}

#[test]
fn replace_items_deletes_stale_fingerprints() {
    let mut connection = test_connection();
    let version_id = seeded_version(&mut connection);

    let run1 = create_run(&connection, version_id, "v1").unwrap();
    let keep = sample_item(GroupKey::Table3, "t3_identity_total", AutoStatus::Pass);
    let stale = sample_item(GroupKey::Table3, "t3_col_sum_newReceived", AutoStatus::Pass);
    replace_items(&mut connection, run1, version_id, &[keep.clone(), stale]).unwrap();

    let run2 = create_run(&connection, version_id, "v1").unwrap();
    replace_items(&mut connection, run2, version_id, &[keep]).unwrap();

    let stored = load_current_items(&connection, version_id, None, true).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].check_key, "t3_identity_total");
}

#[test]
fn version_summary_counts_all_axes() {
    let mut connection = test_connection();
    let version_id = seeded_version(&mut connection);
    let run_id = create_run(&connection, version_id, "v1").unwrap();

    let items = vec![
        sample_item(GroupKey::Table3, "check_a", AutoStatus::Pass),
        sample_item(GroupKey::Table3, "check_b", AutoStatus::Fail),
        sample_item(GroupKey::Table3, "check_c", AutoStatus::Fail),
        sample_item(GroupKey::Table4, "check_d", AutoStatus::Uncertain),
        sample_item(GroupKey::Text, "check_e", AutoStatus::NotAssessable),
    ];
    replace_items(&mut connection, run_id, version_id, &items).unwrap();

    let stored = load_current_items(&connection, version_id, None, true).unwrap();
    let confirm_id = stored.iter().find(|i| i.check_key == "check_a").unwrap().id;
    let dismiss_id = stored.iter().find(|i| i.check_key == "check_b").unwrap().id;
    update_review(&connection, confirm_id, Some(HumanStatus::Confirmed), None).unwrap();
    update_review(&connection, dismiss_id, Some(HumanStatus::Dismissed), None).unwrap();

    let summary = version_summary(&connection, version_id).unwrap();
    assert_eq!(
        summary,
        RunSummary {
            total: 5,
            pass: 1,
            fail: 2,
            uncertain: 1,
            not_assessable: 1,
            pending: 3,
            confirmed: 1,
            dismissed: 1,
        }
    );
}

#[test]
fn open_failure_count_tracks_pending_failures() {
    let mut connection = test_connection();
    let version_id = seeded_version(&mut connection);
    let run_id = create_run(&connection, version_id, "v1").unwrap();

    let items = vec![
        sample_item(GroupKey::Table3, "check_a", AutoStatus::Fail),
        sample_item(GroupKey::Table3, "check_b", AutoStatus::Fail),
        sample_item(GroupKey::Table3, "check_c", AutoStatus::Pass),
    ];
    replace_items(&mut connection, run_id, version_id, &items).unwrap();
    assert_eq!(open_failure_count(&connection, version_id).unwrap(), 2);

    let stored = load_current_items(&connection, version_id, None, true).unwrap();
    let first_fail = stored.iter().find(|i| i.check_key == "check_a").unwrap().id;
    update_review(&connection, first_fail, Some(HumanStatus::Dismissed), None).unwrap();
    assert_eq!(open_failure_count(&connection, version_id).unwrap(), 1);

    let second_fail = stored.iter().find(|i| i.check_key == "check_b").unwrap().id;
    update_review(&connection, second_fail, Some(HumanStatus::Confirmed), None).unwrap();
    assert_eq!(open_failure_count(&connection, version_id).unwrap(), 0);
}

#[test]
fn run_lifecycle_records_summary() {
    let mut connection = test_connection();
    let version_id = seeded_version(&mut connection);

    let run_id = create_run(&connection, version_id, "v1").unwrap();
    let open_run = latest_run(&connection, version_id).unwrap().unwrap();
    assert_eq!(open_run.id, run_id);
    assert_eq!(open_run.status, "running");
    assert_eq!(open_run.summary, None);
    assert_eq!(open_run.finished_at, None);

    let summary = RunSummary {
        total: 38,
        pass: 30,
        fail: 3,
        uncertain: 4,
        not_assessable: 1,
        pending: 38,
        confirmed: 0,
        dismissed: 0,
    };
    finish_run_succeeded(&connection, run_id, &summary).unwrap();

    let finished = latest_run(&connection, version_id).unwrap().unwrap();
    assert_eq!(finished.status, "succeeded");
    assert_eq!(finished.summary, Some(summary));
    assert!(finished.finished_at.is_some());

    let newer = create_run(&connection, version_id, "v1").unwrap();
    assert_eq!(latest_run(&connection, version_id).unwrap().unwrap().id, newer);
}

#[test]
fn finish_run_failed_leaves_summary_empty() {
    let mut connection = test_connection();
    let version_id = seeded_version(&mut connection);

    let run_id = create_run(&connection, version_id, "v1").unwrap();
    finish_run_failed(&connection, run_id).unwrap();

    let run = latest_run(&connection, version_id).unwrap().unwrap();
    assert_eq!(run.status, "failed");
    assert_eq!(run.summary, None);
    assert!(run.finished_at.is_some());
}

#[test]
fn update_review_rejects_empty_and_unknown_targets() {
    let mut connection = test_connection();
    let version_id = seeded_version(&mut connection);
    let run_id = create_run(&connection, version_id, "v1").unwrap();
    let items = vec![sample_item(GroupKey::Table3, "check_a", AutoStatus::Fail)];
    replace_items(&mut connection, run_id, version_id, &items).unwrap();
    let item_id = load_current_items(&connection, version_id, None, false).unwrap()[0].id;

    let empty = update_review(&connection, item_id, None, None);
    assert!(empty.is_err());

    let missing = update_review(&connection, item_id + 999, Some(HumanStatus::Confirmed), None);
    assert!(missing.is_err());

    let comment_only = update_review(&connection, item_id, None, Some("数据待复核")).unwrap();
    assert_eq!(comment_only.human_status, "pending");
    assert_eq!(comment_only.human_comment.as_deref(), Some("数据待复核"));
}

#[test]
fn load_current_items_filters_and_orders() {
    let mut connection = test_connection();
    let version_id = seeded_version(&mut connection);
    let run_id = create_run(&connection, version_id, "v1").unwrap();

    let items = vec![
        sample_item(GroupKey::Text, "text_vs_table3_newReceived", AutoStatus::Pass),
        sample_item(GroupKey::Table4, "t4_sum_review", AutoStatus::Pass),
        sample_item(GroupKey::Table3, "t3_identity_total", AutoStatus::Fail),
        sample_item(GroupKey::Table3, "t3_col_sum_newReceived", AutoStatus::Pass),
    ];
    replace_items(&mut connection, run_id, version_id, &items).unwrap();

    let all = load_current_items(&connection, version_id, None, false).unwrap();
    let keys: Vec<&str> = all.iter().map(|i| i.check_key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "t3_col_sum_newReceived",
            "t3_identity_total",
            "t4_sum_review",
            "text_vs_table3_newReceived",
        ]
    );

    let dismissed_id = all.iter().find(|i| i.check_key == "t3_identity_total").unwrap().id;
    update_review(&connection, dismissed_id, Some(HumanStatus::Dismissed), None).unwrap();

    let visible = load_current_items(&connection, version_id, None, false).unwrap();
    assert_eq!(visible.len(), 3);
    assert!(visible.iter().all(|i| i.check_key != "t3_identity_total"));

    let everything = load_current_items(&connection, version_id, None, true).unwrap();
    assert_eq!(everything.len(), 4);

    let table3_only =
        load_current_items(&connection, version_id, Some(GroupKey::Table3), true).unwrap();
    assert_eq!(table3_only.len(), 2);
    assert!(table3_only.iter().all(|i| i.group_key == "table3"));
}
