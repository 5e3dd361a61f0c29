use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

#[derive(Copy, Clone, Debug, Default)]
pub struct Cell(Option<f64>);

impl Cell {
    pub fn value(self) -> Option<f64> {
        self.0
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(Cell(coerce_number(&raw)))
    }
}

pub fn coerce_number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(number) => number.as_f64().filter(|value| value.is_finite()),
        Value::String(text) => {
            let trimmed = text.trim();
            if matches!(trimmed, "" | "-" | "—" | "/" | "N/A") {
                return None;
            }
            let cleaned = trimmed.replace(',', "");
            cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
        }
        _ => None,
    }
}

pub fn sum_all<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .try_fold(0.0, |acc, value| value.map(|v| acc + v))
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_default())
}

fn lenient_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(raw).ok())
}

fn lenient_elements<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    let Value::Array(entries) = raw else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .map(|entry| serde_json::from_value(entry).unwrap_or_default())
        .collect())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParsedReport {
    #[serde(deserialize_with = "lenient_elements")]
    pub sections: Vec<Section>,
}

impl ParsedReport {
    pub fn table3_data(&self) -> Option<&Table3Data> {
        self.sections.iter().find_map(|section| {
            if section.section_type == "table_3" {
                section.table_data.as_ref()
            } else {
                None
            }
        })
    }

    pub fn table4_data(&self) -> Option<&Table4Data> {
        self.sections.iter().find_map(|section| {
            if section.section_type == "table_4" {
                section.review_litigation_data.as_ref()
            } else {
                None
            }
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Section {
    #[serde(rename = "type", deserialize_with = "lenient")]
    pub section_type: String,
    #[serde(deserialize_with = "lenient")]
    pub title: String,
    #[serde(deserialize_with = "lenient_opt")]
    pub content: Option<String>,
    #[serde(deserialize_with = "lenient_opt")]
    pub table_data: Option<Table3Data>,
    #[serde(deserialize_with = "lenient_opt")]
    pub review_litigation_data: Option<Table4Data>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Table3Data {
    #[serde(deserialize_with = "lenient_opt")]
    pub natural_person: Option<EntityData>,
    #[serde(deserialize_with = "lenient")]
    pub legal_person: LegalPersonEntities,
    #[serde(deserialize_with = "lenient_opt")]
    pub total: Option<EntityData>,
}

impl Table3Data {
    pub fn entity(&self, key: EntityKey) -> Option<&EntityData> {
        match key {
            EntityKey::NaturalPerson => self.natural_person.as_ref(),
            EntityKey::Commercial => self.legal_person.commercial.as_ref(),
            EntityKey::Research => self.legal_person.research.as_ref(),
            EntityKey::Social => self.legal_person.social.as_ref(),
            EntityKey::Legal => self.legal_person.legal.as_ref(),
            EntityKey::OtherOrg => self.legal_person.other.as_ref(),
            EntityKey::Total => self.total.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegalPersonEntities {
    #[serde(deserialize_with = "lenient_opt")]
    pub commercial: Option<EntityData>,
    #[serde(deserialize_with = "lenient_opt")]
    pub research: Option<EntityData>,
    #[serde(deserialize_with = "lenient_opt")]
    pub social: Option<EntityData>,
    #[serde(deserialize_with = "lenient_opt")]
    pub legal: Option<EntityData>,
    #[serde(deserialize_with = "lenient_opt")]
    pub other: Option<EntityData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntityData {
    pub new_received: Cell,
    pub carried_over: Cell,
    #[serde(deserialize_with = "lenient_opt")]
    pub results: Option<EntityResults>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntityResults {
    pub granted: Cell,
    pub partial_grant: Cell,
    #[serde(deserialize_with = "lenient")]
    pub denied: DeniedBreakdown,
    #[serde(deserialize_with = "lenient")]
    pub unable_to_provide: UnableBreakdown,
    #[serde(deserialize_with = "lenient")]
    pub not_processed: NotProcessedBreakdown,
    #[serde(deserialize_with = "lenient")]
    pub other: OtherBreakdown,
    pub total_processed: Cell,
    pub carried_forward: Cell,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeniedBreakdown {
    pub state_secret: Cell,
    pub law_forbidden: Cell,
    pub safety_stability: Cell,
    pub third_party_rights: Cell,
    pub internal_affairs: Cell,
    pub process_info: Cell,
    pub enforcement_case: Cell,
    pub admin_query: Cell,
}

impl DeniedBreakdown {
    pub const MEMBERS: [&'static str; 8] = [
        "stateSecret",
        "lawForbidden",
        "safetyStability",
        "thirdPartyRights",
        "internalAffairs",
        "processInfo",
        "enforcementCase",
        "adminQuery",
    ];

    pub fn sum(&self) -> Option<f64> {
        sum_all([
            self.state_secret.value(),
            self.law_forbidden.value(),
            self.safety_stability.value(),
            self.third_party_rights.value(),
            self.internal_affairs.value(),
            self.process_info.value(),
            self.enforcement_case.value(),
            self.admin_query.value(),
        ])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnableBreakdown {
    pub no_info: Cell,
    pub need_creation: Cell,
    pub unclear: Cell,
}

impl UnableBreakdown {
    pub const MEMBERS: [&'static str; 3] = ["noInfo", "needCreation", "unclear"];

    pub fn sum(&self) -> Option<f64> {
        sum_all([
            self.no_info.value(),
            self.need_creation.value(),
            self.unclear.value(),
        ])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotProcessedBreakdown {
    pub complaint: Cell,
    pub repeat: Cell,
    pub publication: Cell,
    pub massive_requests: Cell,
    pub confirm_info: Cell,
}

impl NotProcessedBreakdown {
    pub const MEMBERS: [&'static str; 5] = [
        "complaint",
        "repeat",
        "publication",
        "massiveRequests",
        "confirmInfo",
    ];

    pub fn sum(&self) -> Option<f64> {
        sum_all([
            self.complaint.value(),
            self.repeat.value(),
            self.publication.value(),
            self.massive_requests.value(),
            self.confirm_info.value(),
        ])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OtherBreakdown {
    pub overdue_correction: Cell,
    pub overdue_fee: Cell,
    pub other_reasons: Cell,
}

impl OtherBreakdown {
    pub const MEMBERS: [&'static str; 3] = ["overdueCorrection", "overdueFee", "otherReasons"];

    pub fn sum(&self) -> Option<f64> {
        sum_all([
            self.overdue_correction.value(),
            self.overdue_fee.value(),
            self.other_reasons.value(),
        ])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Table4Data {
    #[serde(deserialize_with = "lenient_opt")]
    pub review: Option<Table4Category>,
    #[serde(deserialize_with = "lenient_opt")]
    pub litigation_direct: Option<Table4Category>,
    #[serde(deserialize_with = "lenient_opt")]
    pub litigation_post_review: Option<Table4Category>,
}

impl Table4Data {
    pub fn category(&self, kind: Table4Kind) -> Option<&Table4Category> {
        match kind {
            Table4Kind::Review => self.review.as_ref(),
            Table4Kind::LitigationDirect => self.litigation_direct.as_ref(),
            Table4Kind::LitigationPostReview => self.litigation_post_review.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Table4Category {
    pub maintain: Cell,
    pub correct: Cell,
    pub other: Cell,
    pub unfinished: Cell,
    pub total: Cell,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntityKey {
    NaturalPerson,
    Commercial,
    Research,
    Social,
    Legal,
    OtherOrg,
    Total,
}

impl EntityKey {
    pub const ALL: [EntityKey; 7] = [
        EntityKey::NaturalPerson,
        EntityKey::Commercial,
        EntityKey::Research,
        EntityKey::Social,
        EntityKey::Legal,
        EntityKey::OtherOrg,
        EntityKey::Total,
    ];

    pub const NON_TOTAL: [EntityKey; 6] = [
        EntityKey::NaturalPerson,
        EntityKey::Commercial,
        EntityKey::Research,
        EntityKey::Social,
        EntityKey::Legal,
        EntityKey::OtherOrg,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKey::NaturalPerson => "naturalPerson",
            EntityKey::Commercial => "legalPerson.commercial",
            EntityKey::Research => "legalPerson.research",
            EntityKey::Social => "legalPerson.social",
            EntityKey::Legal => "legalPerson.legal",
            EntityKey::OtherOrg => "legalPerson.other",
            EntityKey::Total => "total",
        }
    }

    pub fn check_suffix(self) -> &'static str {
        match self {
            EntityKey::NaturalPerson => "naturalPerson",
            EntityKey::Commercial => "legalPerson_commercial",
            EntityKey::Research => "legalPerson_research",
            EntityKey::Social => "legalPerson_social",
            EntityKey::Legal => "legalPerson_legal",
            EntityKey::OtherOrg => "legalPerson_other",
            EntityKey::Total => "total",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKey::NaturalPerson => "自然人列",
            EntityKey::Commercial => "商业企业列",
            EntityKey::Research => "科研机构列",
            EntityKey::Social => "社会公益组织列",
            EntityKey::Legal => "法律服务机构列",
            EntityKey::OtherOrg => "其他组织列",
            EntityKey::Total => "总计列",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Table4Kind {
    Review,
    LitigationDirect,
    LitigationPostReview,
}

impl Table4Kind {
    pub const ALL: [Table4Kind; 3] = [
        Table4Kind::Review,
        Table4Kind::LitigationDirect,
        Table4Kind::LitigationPostReview,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Table4Kind::Review => "review",
            Table4Kind::LitigationDirect => "litigationDirect",
            Table4Kind::LitigationPostReview => "litigationPostReview",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Table4Kind::Review => "行政复议",
            Table4Kind::LitigationDirect => "未经复议直接起诉",
            Table4Kind::LitigationPostReview => "行政诉讼-复议后起诉",
        }
    }
}

pub fn parse_report(raw: &str) -> ParsedReport {
    match serde_json::from_str(raw) {
        Ok(report) => report,
        Err(err) => {
            warn!(error = %err, "report json did not parse, treating every section as missing");
            ParsedReport::default()
        }
    }
}
