use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GroupKey {
    Table3,
    Table4,
    Text,
}

impl GroupKey {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupKey::Table3 => "table3",
            GroupKey::Table4 => "table4",
            GroupKey::Text => "text",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AutoStatus {
    Pass,
    Fail,
    Uncertain,
    NotAssessable,
}

impl AutoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AutoStatus::Pass => "PASS",
            AutoStatus::Fail => "FAIL",
            AutoStatus::Uncertain => "UNCERTAIN",
            AutoStatus::NotAssessable => "NOT_ASSESSABLE",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HumanStatus {
    Pending,
    Confirmed,
    Dismissed,
}

impl HumanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HumanStatus::Pending => "pending",
            HumanStatus::Confirmed => "confirmed",
            HumanStatus::Dismissed => "dismissed",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMatch {
    pub section_index: usize,
    pub section_title: String,
    pub matched: String,
    pub value: f64,
    pub context: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub paths: Vec<String>,
    pub values: BTreeMap<String, Option<f64>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text_matches: Vec<TextMatch>,
}

#[derive(Debug, Clone)]
pub struct CheckItem {
    pub group_key: GroupKey,
    pub check_key: String,
    pub fingerprint: String,
    pub title: String,
    pub expr: String,
    pub left_value: Option<f64>,
    pub right_value: Option<f64>,
    pub delta: Option<f64>,
    pub tolerance: f64,
    pub auto_status: AutoStatus,
    pub evidence: Evidence,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: i64,
    pub pass: i64,
    pub fail: i64,
    pub uncertain: i64,
    pub not_assessable: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub dismissed: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckRunManifest {
    pub manifest_version: u32,
    pub run_id: i64,
    pub engine_version: String,
    pub db_schema_version: String,
    pub report_version_id: i64,
    pub status: String,
    pub started_at: String,
    pub finished_at: String,
    pub item_count: usize,
    pub summary: RunSummary,
    pub db_path: String,
}
