//! Backing store for the dashboard datasets.
//!
//! Leads are mutable (status updates); everything else is fixed sample data
//! shared by every business account.

use crate::models::{
    AiCallLogEntry, AiUsage, ContactType, KeywordSample, Lead, LeadStatus, Plan, SeoCheck,
    SeoReport,
};
use tokio::sync::RwLock;

/// Term shown on the keyword tracker widget.
pub const TRACKED_KEYWORD: &str = "roofing grants pass";

/// SEO reports keyed by plan.
#[derive(Debug, Clone)]
pub struct SeoReports {
    pub starter: SeoReport,
    pub growth: SeoReport,
    pub scale: SeoReport,
}

impl SeoReports {
    pub fn for_plan(&self, plan: Plan) -> &SeoReport {
        match plan {
            Plan::Starter => &self.starter,
            Plan::Growth => &self.growth,
            Plan::Scale => &self.scale,
        }
    }
}

/// Leads plus a counter bumped on every change.
#[derive(Debug)]
struct LeadBook {
    revision: u64,
    leads: Vec<Lead>,
}

/// All sample data the API serves.
#[derive(Debug)]
pub struct Catalog {
    leads: RwLock<LeadBook>,
    pub seo: SeoReports,
    pub keywords: Vec<KeywordSample>,
    pub ai_logs: Vec<AiCallLogEntry>,
    pub ai_usage: AiUsage,
}

impl Catalog {
    pub fn new(
        leads: Vec<Lead>,
        seo: SeoReports,
        keywords: Vec<KeywordSample>,
        ai_logs: Vec<AiCallLogEntry>,
        ai_usage: AiUsage,
    ) -> Self {
        Self {
            leads: RwLock::new(LeadBook { revision: 0, leads }),
            seo,
            keywords,
            ai_logs,
            ai_usage,
        }
    }

    /// The built-in sample account.
    pub fn sample() -> Self {
        Self::new(
            sample_leads(),
            sample_seo_reports(),
            sample_keywords(),
            sample_ai_logs(),
            AiUsage {
                minutes_used: 27,
                minutes_allotted: 250,
            },
        )
    }

    /// Snapshot of all leads, in display order.
    pub async fn leads(&self) -> Vec<Lead> {
        self.leads.read().await.leads.clone()
    }

    /// Snapshot of all leads together with the revision it was taken at.
    pub async fn leads_snapshot(&self) -> (u64, Vec<Lead>) {
        let book = self.leads.read().await;
        (book.revision, book.leads.clone())
    }

    pub async fn leads_revision(&self) -> u64 {
        self.leads.read().await.revision
    }

    /// Updates a lead's status, returning the updated record, or `None` when
    /// no lead has that id.
    pub async fn set_lead_status(&self, id: u32, status: LeadStatus) -> Option<Lead> {
        let mut book = self.leads.write().await;
        let lead = book.leads.iter_mut().find(|lead| lead.id == id)?;
        lead.status = status;
        let updated = lead.clone();
        book.revision += 1;
        Some(updated)
    }
}

fn lead(
    id: u32,
    name: &str,
    phone: Option<&str>,
    email: Option<&str>,
    contact_type: ContactType,
    status: LeadStatus,
    timestamp: &str,
) -> Lead {
    Lead {
        id,
        name: name.to_string(),
        phone: phone.map(str::to_string),
        email: email.map(str::to_string),
        contact_type,
        status,
        timestamp: timestamp.to_string(),
    }
}

pub fn sample_leads() -> Vec<Lead> {
    vec![
        lead(
            1,
            "Michael Davis",
            Some("541-555-1234"),
            None,
            ContactType::PhoneCall,
            LeadStatus::New,
            "4:52 PM",
        ),
        lead(
            2,
            "Jennifer Smith",
            None,
            Some("jen.smith@example.com"),
            ContactType::WebsiteForm,
            LeadStatus::New,
            "2:15 PM",
        ),
        lead(
            3,
            "David Wilson",
            Some("541-555-8765"),
            None,
            ContactType::PhoneCall,
            LeadStatus::Contacted,
            "11:03 AM",
        ),
        lead(
            4,
            "Sarah Miller",
            None,
            Some("sarahm@example.com"),
            ContactType::WebsiteForm,
            LeadStatus::QuoteSent,
            "Yesterday",
        ),
    ]
}

fn seo_report(score: u8, checks: [bool; 5]) -> SeoReport {
    const NAMES: [&str; 5] = [
        "Mobile Friendly",
        "Page Speed (Desktop)",
        "Page Speed (Mobile)",
        "Secure (HTTPS)",
        "Meta Description",
    ];
    SeoReport {
        score,
        checks: NAMES
            .iter()
            .zip(checks)
            .map(|(name, status)| SeoCheck {
                name: name.to_string(),
                status,
            })
            .collect(),
    }
}

pub fn sample_seo_reports() -> SeoReports {
    // TODO: growth and scale share one report until product defines a distinct scale audit.
    SeoReports {
        starter: seo_report(45, [false, true, false, true, false]),
        growth: seo_report(82, [true; 5]),
        scale: seo_report(82, [true; 5]),
    }
}

pub fn sample_keywords() -> Vec<KeywordSample> {
    [
        ("Jan", 9, 3),
        ("Feb", 8, 3),
        ("Mar", 8, 2),
        ("Apr", 6, 2),
        ("May", 5, 1),
        ("Jun", 4, 1),
    ]
    .into_iter()
    .map(|(month, your_rank, competitor_rank)| KeywordSample {
        month: month.to_string(),
        your_rank,
        competitor_rank,
    })
    .collect()
}

pub fn sample_ai_logs() -> Vec<AiCallLogEntry> {
    [
        ("4:52 PM", "Call from (541) 555-1234. Answered by AI. Caller asked for a quote for a metal roof. AI collected details, sent info packet via SMS. Lead created in CRM."),
        ("2:15 PM", "Call from (541) 555-1122. Answered by AI. Caller asked about business hours. AI provided hours from directory listing. No lead created."),
        ("11:03 AM", "Missed call from unknown number. AI sent \"Sorry we missed you...\" SMS."),
        ("Yesterday", "Call from (541) 555-9988. Answered by AI. Caller scheduled a consultation for Friday at 10 AM. Event added to calendar."),
    ]
    .into_iter()
    .map(|(time_label, summary)| AiCallLogEntry {
        time_label: time_label.to_string(),
        summary: summary.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_leads_carry_exactly_one_contact() {
        for lead in sample_leads() {
            assert!(lead.phone.is_some() ^ lead.email.is_some(), "{}", lead.name);
        }
    }

    #[test]
    fn sample_ranks_stay_in_range() {
        for sample in sample_keywords() {
            assert!((1..=10).contains(&sample.your_rank));
            assert!((1..=10).contains(&sample.competitor_rank));
        }
    }

    #[test]
    fn seo_reports_by_plan() {
        let reports = sample_seo_reports();
        assert_eq!(reports.for_plan(Plan::Starter).score, 45);
        assert_eq!(reports.for_plan(Plan::Growth).score, 82);
        assert_eq!(reports.for_plan(Plan::Growth).checks.len(), 5);
    }

    #[tokio::test]
    async fn status_update_changes_only_target_lead() {
        let catalog = Catalog::sample();
        let updated = catalog.set_lead_status(2, LeadStatus::Won).await.unwrap();
        assert_eq!(updated.status, LeadStatus::Won);

        let (revision, leads) = catalog.leads_snapshot().await;
        assert_eq!(revision, 1);
        assert_eq!(leads[1].status, LeadStatus::Won);
        assert_eq!(leads[0].status, LeadStatus::New);
    }

    #[tokio::test]
    async fn status_update_for_unknown_lead() {
        let catalog = Catalog::sample();
        assert!(catalog.set_lead_status(99, LeadStatus::Lost).await.is_none());
        assert_eq!(catalog.leads_revision().await, 0);
    }
}
