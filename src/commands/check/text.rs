use std::collections::BTreeMap;

use anyhow::{Context, Result};
use regex::Regex;

use crate::model::{CheckItem, Evidence, GroupKey, TextMatch};
use crate::report::{Section, Table3Data, Table4Data, sum_all};

use super::engine::new_item;

#[derive(Copy, Clone)]
enum TargetTable {
    Table3,
    Table4,
}

impl TargetTable {
    fn as_str(self) -> &'static str {
        match self {
            TargetTable::Table3 => "table3",
            TargetTable::Table4 => "table4",
        }
    }

    fn label(self) -> &'static str {
        match self {
            TargetTable::Table3 => "表三",
            TargetTable::Table4 => "表四",
        }
    }
}

struct TextProbe {
    key: &'static str,
    table: TargetTable,
    label: &'static str,
    pattern: &'static str,
    target_path: &'static str,
    target: fn(Option<&Table3Data>, Option<&Table4Data>) -> Option<f64>,
}

const PROBES: [TextProbe; 6] = [
    TextProbe {
        key: "newReceived",
        table: TargetTable::Table3,
        label: "本年新收",
        pattern: r"本年(?:度)?新收.*?(\d+)\s*件",
        target_path: "tableData.total.newReceived",
        target: |table3, _| {
            table3
                .and_then(|table| table.total.as_ref())
                .and_then(|total| total.new_received.value())
        },
    },
    TextProbe {
        key: "carriedOver",
        table: TargetTable::Table3,
        label: "上年结转",
        pattern: r"上年结转.*?(\d+)\s*件",
        target_path: "tableData.total.carriedOver",
        target: |table3, _| {
            table3
                .and_then(|table| table.total.as_ref())
                .and_then(|total| total.carried_over.value())
        },
    },
    TextProbe {
        key: "totalApplications",
        table: TargetTable::Table3,
        label: "收到申请总量",
        pattern: r"(?:共计?|合计)?收到.*?(?:政府信息公开|政务公开)?申请.*?(\d+)\s*件",
        target_path: "tableData.total.results.totalProcessed + tableData.total.results.carriedForward",
        target: |table3, _| {
            let results = table3
                .and_then(|table| table.total.as_ref())
                .and_then(|total| total.results.as_ref());
            sum_all([
                results.and_then(|results| results.total_processed.value()),
                results.and_then(|results| results.carried_forward.value()),
            ])
        },
    },
    TextProbe {
        key: "carriedForward",
        table: TargetTable::Table3,
        label: "结转下年度",
        pattern: r"结转下年度(?:继续办理)?.*?(\d+)\s*件",
        target_path: "tableData.total.results.carriedForward",
        target: |table3, _| {
            table3
                .and_then(|table| table.total.as_ref())
                .and_then(|total| total.results.as_ref())
                .and_then(|results| results.carried_forward.value())
        },
    },
    TextProbe {
        key: "reviewTotal",
        table: TargetTable::Table4,
        label: "行政复议总计",
        pattern: r"行政复议[^，。、；]*?(\d+)\s*件",
        target_path: "reviewLitigationData.review.total",
        target: |_, table4| {
            table4
                .and_then(|table| table.review.as_ref())
                .and_then(|review| review.total.value())
        },
    },
    TextProbe {
        key: "litigationTotal",
        table: TargetTable::Table4,
        label: "行政诉讼总计",
        pattern: r"行政诉讼[类案件]{0,10}?(\d+)\s*件",
        target_path: "reviewLitigationData.litigationDirect.total + reviewLitigationData.litigationPostReview.total",
        target: |_, table4| {
            sum_all([
                table4
                    .and_then(|table| table.litigation_direct.as_ref())
                    .and_then(|category| category.total.value()),
                table4
                    .and_then(|table| table.litigation_post_review.as_ref())
                    .and_then(|category| category.total.value()),
            ])
        },
    },
];

struct TextSection<'a> {
    index: usize,
    title: String,
    content: &'a str,
}

pub(super) fn collect_items(
    sections: &[Section],
    table3: Option<&Table3Data>,
    table4: Option<&Table4Data>,
) -> Result<Vec<CheckItem>> {
    let text_sections = text_sections(sections);
    if text_sections.is_empty() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();

    for probe in &PROBES {
        let regex = Regex::new(probe.pattern)
            .with_context(|| format!("invalid text probe pattern for {}", probe.key))?;

        let mut matches = Vec::new();
        for section in &text_sections {
            for captures in regex.captures_iter(section.content) {
                let Some(full) = captures.get(0) else {
                    continue;
                };
                let Some(number) = captures.get(1) else {
                    continue;
                };
                let Ok(value) = number.as_str().parse::<f64>() else {
                    continue;
                };

                matches.push(TextMatch {
                    section_index: section.index + 1,
                    section_title: section.title.clone(),
                    matched: full.as_str().to_string(),
                    value,
                    context: match_context(section.content, full.start(), full.end()),
                });
            }
        }

        if matches.is_empty() {
            continue;
        }

        let table_value = (probe.target)(table3, table4);
        let text_value = if matches.len() == 1 {
            Some(matches[0].value)
        } else {
            None
        };

        let mut paths = vec![probe.target_path.to_string()];
        let mut seen_sections = Vec::new();
        for matched in &matches {
            let raw_index = matched.section_index - 1;
            if !seen_sections.contains(&raw_index) {
                seen_sections.push(raw_index);
                paths.push(format!("sections[{raw_index}].content"));
            }
        }

        let values = BTreeMap::from([
            ("textValue".to_string(), text_value),
            ("tableValue".to_string(), table_value),
        ]);

        items.push(new_item(
            GroupKey::Text,
            format!("text_vs_{}_{}", probe.table.as_str(), probe.key),
            format!(
                "正文一致性：正文提及\"{}\"与{}数据对照",
                probe.label,
                probe.table.label()
            ),
            format!("text(\"{}\") = {}", probe.label, probe.target_path),
            text_value,
            table_value,
            0.0,
            Evidence {
                paths,
                values,
                text_matches: matches,
            },
        ));
    }

    Ok(items)
}

fn text_sections(sections: &[Section]) -> Vec<TextSection<'_>> {
    sections
        .iter()
        .enumerate()
        .filter_map(|(index, section)| {
            if section.section_type != "text" {
                return None;
            }
            let content = section.content.as_deref()?;
            let title = if section.title.is_empty() {
                format!("第{}部分", chinese_ordinal(index + 1))
            } else {
                section.title.clone()
            };
            Some(TextSection {
                index,
                title,
                content,
            })
        })
        .collect()
}

fn match_context(content: &str, start: usize, end: usize) -> String {
    let prefix_start = content[..start]
        .char_indices()
        .rev()
        .take(20)
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(start);
    let suffix_end = content[end..]
        .char_indices()
        .nth(20)
        .map(|(idx, _)| end + idx)
        .unwrap_or(content.len());
    format!("...{}...", &content[prefix_start..suffix_end])
}

fn chinese_ordinal(num: usize) -> String {
    const DIGITS: [&str; 11] = [
        "零", "一", "二", "三", "四", "五", "六", "七", "八", "九", "十",
    ];
    if num <= 10 {
        return DIGITS[num].to_string();
    }
    if num < 20 {
        return format!("十{}", DIGITS[num - 10]);
    }
    if num < 100 {
        let tens = num / 10;
        let ones = num % 10;
        if ones == 0 {
            format!("{}十", DIGITS[tens])
        } else {
            format!("{}十{}", DIGITS[tens], DIGITS[ones])
        }
    } else {
        num.to_string()
    }
}
