use std::collections::BTreeMap;

use crate::model::{AutoStatus, CheckItem, Evidence, GroupKey};
use crate::report::{
    DeniedBreakdown, EntityData, EntityKey, EntityResults, NotProcessedBreakdown, OtherBreakdown,
    Table3Data, UnableBreakdown, sum_all,
};
use crate::util::check_fingerprint;

use super::engine::new_item;

struct Table3Field {
    path: &'static str,
    label: &'static str,
    get: fn(&EntityData) -> Option<f64>,
}

const TRACKED_FIELDS: [Table3Field; 25] = [
    Table3Field {
        path: "newReceived",
        label: "本年新收",
        get: |entity| entity.new_received.value(),
    },
    Table3Field {
        path: "carriedOver",
        label: "上年结转",
        get: |entity| entity.carried_over.value(),
    },
    Table3Field {
        path: "results.granted",
        label: "予以公开",
        get: |entity| entity.results.as_ref().and_then(|results| results.granted.value()),
    },
    Table3Field {
        path: "results.partialGrant",
        label: "部分公开",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.partial_grant.value())
        },
    },
    Table3Field {
        path: "results.denied.stateSecret",
        label: "属于国家秘密",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.denied.state_secret.value())
        },
    },
    Table3Field {
        path: "results.denied.lawForbidden",
        label: "其他法律行政法规禁止公开",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.denied.law_forbidden.value())
        },
    },
    Table3Field {
        path: "results.denied.safetyStability",
        label: "危及“三安全一稳定”",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.denied.safety_stability.value())
        },
    },
    Table3Field {
        path: "results.denied.thirdPartyRights",
        label: "保护第三方合法权益",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.denied.third_party_rights.value())
        },
    },
    Table3Field {
        path: "results.denied.internalAffairs",
        label: "属于三类内部事务信息",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.denied.internal_affairs.value())
        },
    },
    Table3Field {
        path: "results.denied.processInfo",
        label: "属于四类过程性信息",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.denied.process_info.value())
        },
    },
    Table3Field {
        path: "results.denied.enforcementCase",
        label: "属于行政执法案卷",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.denied.enforcement_case.value())
        },
    },
    Table3Field {
        path: "results.denied.adminQuery",
        label: "属于行政查询事项",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.denied.admin_query.value())
        },
    },
    Table3Field {
        path: "results.unableToProvide.noInfo",
        label: "本机关不掌握相关政府信息",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.unable_to_provide.no_info.value())
        },
    },
    Table3Field {
        path: "results.unableToProvide.needCreation",
        label: "没有现成信息需要另行制作",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.unable_to_provide.need_creation.value())
        },
    },
    Table3Field {
        path: "results.unableToProvide.unclear",
        label: "补正后申请内容仍不明确",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.unable_to_provide.unclear.value())
        },
    },
    Table3Field {
        path: "results.notProcessed.complaint",
        label: "信访举报投诉类申请",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.not_processed.complaint.value())
        },
    },
    Table3Field {
        path: "results.notProcessed.repeat",
        label: "重复申请",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.not_processed.repeat.value())
        },
    },
    Table3Field {
        path: "results.notProcessed.publication",
        label: "要求提供公开出版物",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.not_processed.publication.value())
        },
    },
    Table3Field {
        path: "results.notProcessed.massiveRequests",
        label: "无正当理由大量反复申请",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.not_processed.massive_requests.value())
        },
    },
    Table3Field {
        path: "results.notProcessed.confirmInfo",
        label: "要求行政机关确认或重新出具",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.not_processed.confirm_info.value())
        },
    },
    Table3Field {
        path: "results.other.overdueCorrection",
        label: "申请人无正当理由逾期不补正",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.other.overdue_correction.value())
        },
    },
    Table3Field {
        path: "results.other.overdueFee",
        label: "申请人逾期未按收费通知要求缴纳费用",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.other.overdue_fee.value())
        },
    },
    Table3Field {
        path: "results.other.otherReasons",
        label: "其他",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.other.other_reasons.value())
        },
    },
    Table3Field {
        path: "results.totalProcessed",
        label: "办理结果总计",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.total_processed.value())
        },
    },
    Table3Field {
        path: "results.carriedForward",
        label: "结转下年度",
        get: |entity| {
            entity
                .results
                .as_ref()
                .and_then(|results| results.carried_forward.value())
        },
    },
];

pub(super) fn collect_items(table: Option<&Table3Data>) -> Vec<CheckItem> {
    let Some(table) = table else {
        return vec![missing_table_item()];
    };

    let mut items = Vec::new();

    for key in EntityKey::ALL {
        let Some(entity) = table.entity(key) else {
            continue;
        };

        if let Some(results) = entity.results.as_ref() {
            items.push(result_total_item(key, results));
        }

        items.push(identity_item(key, entity));
    }

    for field in &TRACKED_FIELDS {
        items.push(column_total_item(table, field));
    }

    items
}

fn result_total_item(key: EntityKey, results: &EntityResults) -> CheckItem {
    let granted = results.granted.value();
    let partial_grant = results.partial_grant.value();
    let denied_sum = results.denied.sum();
    let unable_sum = results.unable_to_provide.sum();
    let not_processed_sum = results.not_processed.sum();
    let other_sum = results.other.sum();
    let total_processed = results.total_processed.value();

    let left = sum_all([
        granted,
        partial_grant,
        denied_sum,
        unable_sum,
        not_processed_sum,
        other_sum,
    ]);

    let base = format!("tableData.{}", key.as_str());
    let mut paths = vec![
        format!("{base}.results.granted"),
        format!("{base}.results.partialGrant"),
    ];
    for member in DeniedBreakdown::MEMBERS {
        paths.push(format!("{base}.results.denied.{member}"));
    }
    for member in UnableBreakdown::MEMBERS {
        paths.push(format!("{base}.results.unableToProvide.{member}"));
    }
    for member in NotProcessedBreakdown::MEMBERS {
        paths.push(format!("{base}.results.notProcessed.{member}"));
    }
    for member in OtherBreakdown::MEMBERS {
        paths.push(format!("{base}.results.other.{member}"));
    }
    paths.push(format!("{base}.results.totalProcessed"));

    let values = BTreeMap::from([
        ("granted".to_string(), granted),
        ("partialGrant".to_string(), partial_grant),
        ("deniedSum".to_string(), denied_sum),
        ("unableSum".to_string(), unable_sum),
        ("notProcessedSum".to_string(), not_processed_sum),
        ("otherSum".to_string(), other_sum),
        ("totalProcessed".to_string(), total_processed),
    ]);

    new_item(
        GroupKey::Table3,
        format!("t3_result_total_{}", key.check_suffix()),
        format!(
            "表三：予以公开+部分公开+不予公开(8项)+无法提供(3项)+不予处理(5项)+其他(3项)=办理结果总计（{}）",
            key.label()
        ),
        "granted + partialGrant + sum(denied.*) + sum(unableToProvide.*) + sum(notProcessed.*) + sum(other.*) = totalProcessed"
            .to_string(),
        left,
        total_processed,
        0.0,
        Evidence {
            paths,
            values,
            text_matches: Vec::new(),
        },
    )
}

fn identity_item(key: EntityKey, entity: &EntityData) -> CheckItem {
    let new_received = entity.new_received.value();
    let carried_over = entity.carried_over.value();
    let total_processed = entity
        .results
        .as_ref()
        .and_then(|results| results.total_processed.value());
    let carried_forward = entity
        .results
        .as_ref()
        .and_then(|results| results.carried_forward.value());

    let left = sum_all([new_received, carried_over]);
    let right = sum_all([total_processed, carried_forward]);

    let base = format!("tableData.{}", key.as_str());
    let paths = vec![
        format!("{base}.newReceived"),
        format!("{base}.carriedOver"),
        format!("{base}.results.totalProcessed"),
        format!("{base}.results.carriedForward"),
    ];
    let values = BTreeMap::from([
        ("newReceived".to_string(), new_received),
        ("carriedOver".to_string(), carried_over),
        ("totalProcessed".to_string(), total_processed),
        ("carriedForward".to_string(), carried_forward),
    ]);

    new_item(
        GroupKey::Table3,
        format!("t3_identity_{}", key.check_suffix()),
        format!(
            "表三：本年新收+上年结转=办理结果总计+结转下年度继续办理（{}）",
            key.label()
        ),
        "newReceived + carriedOver = totalProcessed + carriedForward".to_string(),
        left,
        right,
        0.0,
        Evidence {
            paths,
            values,
            text_matches: Vec::new(),
        },
    )
}

fn column_total_item(table: &Table3Data, field: &Table3Field) -> CheckItem {
    let mut paths = Vec::new();
    let mut values = BTreeMap::new();
    let mut operands = Vec::new();

    for key in EntityKey::NON_TOTAL {
        let value = table.entity(key).and_then(|entity| (field.get)(entity));
        paths.push(format!("tableData.{}.{}", key.as_str(), field.path));
        values.insert(key.as_str().to_string(), value);
        operands.push(value);
    }

    let left = sum_all(operands);
    let total = table
        .entity(EntityKey::Total)
        .and_then(|entity| (field.get)(entity));
    paths.push(format!("tableData.total.{}", field.path));
    values.insert("total".to_string(), total);

    new_item(
        GroupKey::Table3,
        format!("t3_col_sum_{}", field.path.replace('.', "_")),
        format!("表三：各列求和=总计（{}）", field.label),
        format!("sum(all_entities.{}) = total.{}", field.path, field.path),
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
        group_key: GroupKey::Table3,
        check_key: "t3_missing".to_string(),
        fingerprint: check_fingerprint("table3", "t3_missing", "table3_exists"),
        title: "表三：数据缺失".to_string(),
        expr: "table3_exists".to_string(),
        left_value: None,
        right_value: None,
        delta: None,
        tolerance: 0.0,
        auto_status: AutoStatus::NotAssessable,
        evidence: Evidence {
            paths: vec!["sections[type=table_3].tableData".to_string()],
            values: BTreeMap::from([("tableData".to_string(), None)]),
            text_matches: Vec::new(),
        },
    }
}
