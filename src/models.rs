use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============ Plans ============

/// Request header carrying the caller's plan. Absent means `starter`.
pub const PLAN_HEADER: &str = "x-plan";

/// Subscription tier controlling feature entitlement.
///
/// Tiers are totally ordered: everything available at `Starter` is available
/// at `Growth`, and everything at `Growth` is available at `Scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Starter,
    Growth,
    Scale,
}

impl Plan {
    /// Every plan, cheapest first.
    pub const ALL: [Plan; 3] = [Plan::Starter, Plan::Growth, Plan::Scale];

    /// Wire/storage spelling (`"starter"`, `"growth"`, `"scale"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Starter => "starter",
            Plan::Growth => "growth",
            Plan::Scale => "scale",
        }
    }

    /// Capitalized name used in headings and notices.
    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Starter => "Starter",
            Plan::Growth => "Growth",
            Plan::Scale => "Scale",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the three plan names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown plan '{0}' (expected starter, growth or scale)")]
pub struct ParsePlanError(pub String);

impl FromStr for Plan {
    type Err = ParsePlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starter" => Ok(Plan::Starter),
            "growth" => Ok(Plan::Growth),
            "scale" => Ok(Plan::Scale),
            _ => Err(ParsePlanError(s.to_string())),
        }
    }
}

// ============ Datasets ============

/// The four per-widget datasets served by the dashboard API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetId {
    Leads,
    Seo,
    Keywords,
    AiLogs,
}

impl DatasetId {
    pub const ALL: [DatasetId; 4] = [
        DatasetId::Leads,
        DatasetId::Seo,
        DatasetId::Keywords,
        DatasetId::AiLogs,
    ];

    /// Endpoint path relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            DatasetId::Leads => "/api/leads",
            DatasetId::Seo => "/api/seo",
            DatasetId::Keywords => "/api/keywords",
            DatasetId::AiLogs => "/api/ai-logs",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetId::Leads => "leads",
            DatasetId::Seo => "seo",
            DatasetId::Keywords => "keywords",
            DatasetId::AiLogs => "ai-logs",
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Leads ============

/// How the lead reached the business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactType {
    #[serde(rename = "Phone Call")]
    PhoneCall,
    #[serde(rename = "Website Form")]
    WebsiteForm,
}

impl ContactType {
    pub fn label(&self) -> &'static str {
        match self {
            ContactType::PhoneCall => "Phone Call",
            ContactType::WebsiteForm => "Website Form",
        }
    }
}

/// Pipeline status of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    New,
    Contacted,
    #[serde(rename = "Quote Sent")]
    QuoteSent,
    Won,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::QuoteSent,
        LeadStatus::Won,
        LeadStatus::Lost,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::QuoteSent => "Quote Sent",
            LeadStatus::Won => "Won",
            LeadStatus::Lost => "Lost",
        }
    }
}

/// Returned when a string names no lead status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lead status '{0}' (expected new, contacted, quote-sent, won or lost)")]
pub struct ParseLeadStatusError(pub String);

impl FromStr for LeadStatus {
    type Err = ParseLeadStatusError;

    /// Accepts the display label in any case, with a space, hyphen or
    /// underscore in "Quote Sent".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "quotesent" => Ok(LeadStatus::QuoteSent),
            "won" => Ok(LeadStatus::Won),
            "lost" => Ok(LeadStatus::Lost),
            _ => Err(ParseLeadStatusError(s.to_string())),
        }
    }
}

/// A lead captured from a phone call or website form.
///
/// Source records carry exactly one of `phone` or `email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    /// Stable unique identifier.
    pub id: u32,
    /// Full contact name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    pub status: LeadStatus,
    /// Display string, never parsed.
    pub timestamp: String,
}

impl Lead {
    /// The phone number or email, whichever the record carries.
    pub fn contact(&self) -> Option<&str> {
        self.phone.as_deref().or(self.email.as_deref())
    }
}

/// What an entitlement-insufficient caller receives instead of a [`Lead`].
///
/// Carries no full name, no full phone, no email and no status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactedLead {
    pub id: u32,
    /// e.g. `"Lead from M..."`.
    pub teaser: String,
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    /// Masked phone (`"541-5***-****"`); absent for email leads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_hint: Option<String>,
    pub timestamp: String,
}

/// Payload of `GET /api/leads`, shaped by the caller's entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "access", rename_all = "lowercase")]
pub enum LeadsPayload {
    Full { leads: Vec<Lead> },
    Redacted { total: usize, leads: Vec<RedactedLead> },
}

impl LeadsPayload {
    pub fn len(&self) -> usize {
        match self {
            LeadsPayload::Full { leads } => leads.len(),
            LeadsPayload::Redacted { leads, .. } => leads.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Body of `PATCH /api/leads/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadStatusUpdate {
    pub status: LeadStatus,
}

// ============ SEO ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoCheck {
    pub name: String,
    pub status: bool,
}

/// Score plus ordered pass/fail checks for one plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoReport {
    /// 0-100.
    pub score: u8,
    pub checks: Vec<SeoCheck>,
}

/// How often the SEO audit runs for a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeoCadence {
    OneTime,
    Recurring,
}

/// Payload of `GET /api/seo`: only the caller's own plan report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSeoReport {
    pub plan: Plan,
    pub cadence: SeoCadence,
    #[serde(flatten)]
    pub report: SeoReport,
}

// ============ Keywords ============

/// One month of rank tracking. Ranks are 1-10, lower is better.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSample {
    pub month: String,
    #[serde(rename = "rank")]
    pub your_rank: u8,
    #[serde(rename = "competitor")]
    pub competitor_rank: u8,
}

// ============ AI receptionist ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiCallLogEntry {
    #[serde(rename = "time")]
    pub time_label: String,
    #[serde(rename = "text")]
    pub summary: String,
}

/// Monthly AI receptionist minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiUsage {
    pub minutes_used: u32,
    pub minutes_allotted: u32,
}

impl AiUsage {
    /// Share of the allotment used, as a percentage (0 when nothing is allotted).
    pub fn percent_used(&self) -> f64 {
        if self.minutes_allotted == 0 {
            return 0.0;
        }
        f64::from(self.minutes_used) * 100.0 / f64::from(self.minutes_allotted)
    }
}

/// Payload of `GET /api/ai-logs`. Entries are newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiLogsPayload {
    pub entries: Vec<AiCallLogEntry>,
    pub usage: AiUsage,
}

// ============ Envelope ============

/// Uniform response envelope: `{ "success": bool, "data": T }` on success,
/// `{ "success": false, "error": "..." }` on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiEnvelope<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}
