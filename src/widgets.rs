//! Dashboard widgets as plain view models.
//!
//! A widget view is a pure function of the plan, the dataset's fetch state
//! and the plan's entitlement for the widget's feature. Rendering to text is a
//! `Display` impl on the view, used by the terminal dashboard.

use crate::catalog::TRACKED_KEYWORD;
use crate::datasets::DatasetPayload;
use crate::entitlements::{entitlement, Entitlement, Feature};
use crate::errors::FetchError;
use crate::models::{
    AiCallLogEntry, AiLogsPayload, AiUsage, DatasetId, KeywordSample, LeadStatus, LeadsPayload,
    Plan, PlanSeoReport, RedactedLead, SeoCadence,
};
use crate::redaction::redact_lead;
use std::fmt;

pub const LEADS_TEASER_CTA: &str =
    "Upgrade to the Growth Plan to see details and manage your pipeline.";
pub const SEO_UPGRADE_CTA: &str = "Upgrade for Monthly Audits";

// ============ Lifecycle ============

/// Rejected widget state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} a widget that is {state}")]
pub struct InvalidTransition {
    pub action: &'static str,
    pub state: &'static str,
}

/// Fetch state of one widget: `Idle → Loading → {Ready | Failed}`.
///
/// `Ready → Loading` happens on refresh, `Failed → Loading` only on retry.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetState<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(FetchError),
}

impl<T> Default for WidgetState<T> {
    fn default() -> Self {
        WidgetState::Idle
    }
}

impl<T> WidgetState<T> {
    pub fn name(&self) -> &'static str {
        match self {
            WidgetState::Idle => "idle",
            WidgetState::Loading => "loading",
            WidgetState::Ready(_) => "ready",
            WidgetState::Failed(_) => "failed",
        }
    }

    /// First load or refresh.
    pub fn begin_load(&mut self) -> Result<(), InvalidTransition> {
        match self {
            WidgetState::Idle | WidgetState::Ready(_) => {
                *self = WidgetState::Loading;
                Ok(())
            }
            _ => Err(self.invalid("load")),
        }
    }

    /// Leaves `Failed` for another attempt.
    pub fn retry(&mut self) -> Result<(), InvalidTransition> {
        match self {
            WidgetState::Failed(_) => {
                *self = WidgetState::Loading;
                Ok(())
            }
            _ => Err(self.invalid("retry")),
        }
    }

    /// Records the outcome of the in-flight fetch.
    pub fn resolve(&mut self, result: Result<T, FetchError>) -> Result<(), InvalidTransition> {
        if !self.is_loading() {
            return Err(self.invalid("resolve"));
        }
        *self = match result {
            Ok(data) => WidgetState::Ready(data),
            Err(e) => WidgetState::Failed(e),
        };
        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, WidgetState::Loading)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, WidgetState::Ready(_) | WidgetState::Failed(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            WidgetState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            WidgetState::Failed(e) => Some(e),
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> InvalidTransition {
        InvalidTransition {
            action,
            state: self.name(),
        }
    }
}

// ============ View models ============

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetView {
    Skeleton(DatasetId),
    Error(ErrorView),
    Leads(LeadsView),
    Seo(SeoView),
    Keywords(KeywordView),
    AiReceptionist(AiReceptionistView),
}

impl WidgetView {
    pub fn is_skeleton(&self) -> bool {
        matches!(self, WidgetView::Skeleton(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorView {
    pub dataset: DatasetId,
    pub message: String,
    /// Every failure offers a retry.
    pub can_retry: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeadRow {
    pub id: u32,
    pub name: String,
    pub contact_line: String,
    pub status: LeadStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeaserRow {
    pub id: u32,
    pub teaser: String,
    pub contact_line: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeadsView {
    Full {
        rows: Vec<LeadRow>,
        status_choices: [LeadStatus; 5],
    },
    Teaser {
        rows: Vec<TeaserRow>,
        headline: String,
        call_to_action: &'static str,
    },
}

/// Colour band of an SEO score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Poor,
    Fair,
    Good,
}

impl ScoreBand {
    pub fn for_score(score: u8) -> Self {
        if score < 60 {
            ScoreBand::Poor
        } else if score < 80 {
            ScoreBand::Fair
        } else {
            ScoreBand::Good
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Poor => "poor",
            ScoreBand::Fair => "fair",
            ScoreBand::Good => "good",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeoView {
    pub title: &'static str,
    pub score: u8,
    pub band: ScoreBand,
    pub checks: Vec<(String, bool)>,
    pub upgrade_cta: Option<&'static str>,
}

/// Vertical rank axis with rank 1 drawn at the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankAxis {
    pub best: u8,
    pub worst: u8,
}

impl Default for RankAxis {
    fn default() -> Self {
        Self { best: 1, worst: 10 }
    }
}

impl RankAxis {
    /// Distance from the top of the chart, 0.0 for the best rank and 1.0 for
    /// the worst. Out-of-domain ranks are clamped.
    pub fn position(&self, rank: u8) -> f64 {
        let rank = rank.clamp(self.best, self.worst);
        f64::from(rank - self.best) / f64::from(self.worst - self.best)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordView {
    pub title: &'static str,
    pub tracked_term: &'static str,
    pub series: Vec<KeywordSample>,
    pub axis: RankAxis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AiReceptionistView {
    pub title: &'static str,
    pub entries: Vec<AiCallLogEntry>,
    pub usage: AiUsage,
    pub percent_used: f64,
}

impl AiReceptionistView {
    pub fn usage_label(&self) -> String {
        format!(
            "{} / {} minutes",
            self.usage.minutes_used, self.usage.minutes_allotted
        )
    }
}

// ============ Rendering ============

/// The view for one widget, or `None` when the plan does not mount it.
pub fn render_widget(
    plan: Plan,
    dataset: DatasetId,
    state: &WidgetState<DatasetPayload>,
) -> Option<WidgetView> {
    let mode = entitlement(plan, Feature::for_dataset(dataset));
    if !mode.is_mounted() {
        return None;
    }

    let view = match state {
        WidgetState::Idle | WidgetState::Loading => WidgetView::Skeleton(dataset),
        WidgetState::Failed(e) => WidgetView::Error(ErrorView {
            dataset,
            message: e.to_string(),
            can_retry: true,
        }),
        WidgetState::Ready(payload) if payload.dataset() != dataset => {
            WidgetView::Error(ErrorView {
                dataset,
                message: format!("expected {} data, got {}", dataset, payload.dataset()),
                can_retry: true,
            })
        }
        WidgetState::Ready(DatasetPayload::Leads(leads)) => WidgetView::Leads(leads_view(mode, leads)),
        WidgetState::Ready(DatasetPayload::Seo(report)) => WidgetView::Seo(seo_view(report)),
        WidgetState::Ready(DatasetPayload::Keywords(series)) => {
            WidgetView::Keywords(keyword_view(series))
        }
        WidgetState::Ready(DatasetPayload::AiLogs(logs)) => {
            WidgetView::AiReceptionist(ai_receptionist_view(logs))
        }
    };
    Some(view)
}

/// Locked plans always get teasers, even if handed full records.
pub fn leads_view(mode: Entitlement, payload: &LeadsPayload) -> LeadsView {
    match (mode, payload) {
        (Entitlement::Unlocked, LeadsPayload::Full { leads }) => LeadsView::Full {
            rows: leads
                .iter()
                .map(|lead| LeadRow {
                    id: lead.id,
                    name: lead.name.clone(),
                    contact_line: format!(
                        "{} - {}",
                        lead.contact_type.label(),
                        lead.contact().unwrap_or_default()
                    ),
                    status: lead.status,
                })
                .collect(),
            status_choices: LeadStatus::ALL,
        },
        (_, LeadsPayload::Full { leads }) => {
            let redacted: Vec<RedactedLead> = leads.iter().map(redact_lead).collect();
            teaser_view(leads.len(), &redacted)
        }
        (_, LeadsPayload::Redacted { total, leads }) => teaser_view(*total, leads),
    }
}

fn teaser_view(total: usize, leads: &[RedactedLead]) -> LeadsView {
    LeadsView::Teaser {
        rows: leads
            .iter()
            .map(|lead| TeaserRow {
                id: lead.id,
                teaser: lead.teaser.clone(),
                contact_line: format!(
                    "{} - ({})",
                    lead.contact_type.label(),
                    lead.contact_hint.as_deref().unwrap_or("...***-****")
                ),
            })
            .collect(),
        headline: format!("You have {} new leads waiting!", total),
        call_to_action: LEADS_TEASER_CTA,
    }
}

pub fn seo_view(report: &PlanSeoReport) -> SeoView {
    let (title, upgrade_cta) = match report.cadence {
        SeoCadence::OneTime => ("One-Time SEO Audit", Some(SEO_UPGRADE_CTA)),
        SeoCadence::Recurring => ("Monthly SEO Report", None),
    };
    SeoView {
        title,
        score: report.report.score,
        band: ScoreBand::for_score(report.report.score),
        checks: report
            .report
            .checks
            .iter()
            .map(|check| (check.name.clone(), check.status))
            .collect(),
        upgrade_cta,
    }
}

pub fn keyword_view(series: &[KeywordSample]) -> KeywordView {
    KeywordView {
        title: "Keyword Rank Tracking",
        tracked_term: TRACKED_KEYWORD,
        series: series.to_vec(),
        axis: RankAxis::default(),
    }
}

pub fn ai_receptionist_view(logs: &AiLogsPayload) -> AiReceptionistView {
    AiReceptionistView {
        title: "AI Receptionist Call Log",
        entries: logs.entries.clone(),
        usage: logs.usage,
        percent_used: logs.usage.percent_used(),
    }
}

impl fmt::Display for WidgetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetView::Skeleton(dataset) => writeln!(f, "[{}] loading...", dataset),
            WidgetView::Error(view) => {
                writeln!(f, "[{}] failed to load: {}", view.dataset, view.message)?;
                if view.can_retry {
                    writeln!(f, "  (retry available)")?;
                }
                Ok(())
            }
            WidgetView::Leads(LeadsView::Full { rows, .. }) => {
                writeln!(f, "Recent Leads")?;
                for row in rows {
                    writeln!(f, "  #{} {:<16} {:<32} [{}]", row.id, row.name, row.contact_line, row.status.label())?;
                }
                Ok(())
            }
            WidgetView::Leads(LeadsView::Teaser {
                rows,
                headline,
                call_to_action,
            }) => {
                writeln!(f, "Recent Leads")?;
                for row in rows {
                    writeln!(f, "  {:<18} {:<32} [locked]", row.teaser, row.contact_line)?;
                }
                writeln!(f, "  {}", headline)?;
                writeln!(f, "  {}", call_to_action)
            }
            WidgetView::Seo(view) => {
                writeln!(f, "{}", view.title)?;
                writeln!(f, "  Score: {}/100 ({})", view.score, view.band.label())?;
                for (name, passed) in &view.checks {
                    writeln!(f, "  [{}] {}", if *passed { "x" } else { " " }, name)?;
                }
                if let Some(cta) = view.upgrade_cta {
                    writeln!(f, "  {}", cta)?;
                }
                Ok(())
            }
            WidgetView::Keywords(view) => {
                writeln!(f, "{}", view.title)?;
                writeln!(f, "  Tracking: \"{}\"", view.tracked_term)?;
                for sample in &view.series {
                    writeln!(
                        f,
                        "  {:<4} you #{:<2} competitor #{}",
                        sample.month, sample.your_rank, sample.competitor_rank
                    )?;
                }
                Ok(())
            }
            WidgetView::AiReceptionist(view) => {
                writeln!(f, "{}", view.title)?;
                for entry in &view.entries {
                    writeln!(f, "  {:<10} {}", entry.time_label, entry.summary)?;
                }
                writeln!(
                    f,
                    "  Monthly Usage: {} ({:.1}%)",
                    view.usage_label(),
                    view.percent_used
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{sample_leads, sample_seo_reports};
    use crate::datasets::{leads_for, seo_for};

    #[test]
    fn lifecycle_follows_allowed_transitions() {
        let mut state: WidgetState<u8> = WidgetState::default();
        assert!(state.retry().is_err());
        state.begin_load().unwrap();
        assert!(state.begin_load().is_err());
        state
            .resolve(Err(FetchError::Transport("down".into())))
            .unwrap();
        assert!(state.begin_load().is_err());
        state.retry().unwrap();
        state.resolve(Ok(7)).unwrap();
        assert_eq!(state.data(), Some(&7));
        state.begin_load().unwrap();
        assert!(state.is_loading());
    }

    #[test]
    fn resolve_requires_loading() {
        let mut state: WidgetState<u8> = WidgetState::Idle;
        let err = state.resolve(Ok(1)).unwrap_err();
        assert_eq!(err.state, "idle");
    }

    #[test]
    fn loading_renders_skeleton_for_any_plan() {
        for plan in Plan::ALL {
            let view = render_widget(plan, DatasetId::Seo, &WidgetState::Loading).unwrap();
            assert!(view.is_skeleton());
        }
    }

    #[test]
    fn unavailable_widgets_are_not_mounted() {
        assert!(render_widget(Plan::Starter, DatasetId::Keywords, &WidgetState::Loading).is_none());
        assert!(render_widget(Plan::Growth, DatasetId::AiLogs, &WidgetState::Loading).is_none());
    }

    #[test]
    fn locked_leads_render_teaser_with_cta() {
        let payload = leads_for(Plan::Starter, &sample_leads()).unwrap();
        let state = WidgetState::Ready(DatasetPayload::Leads(payload));
        let view = render_widget(Plan::Starter, DatasetId::Leads, &state).unwrap();

        let text = view.to_string();
        assert!(text.contains("You have 4 new leads waiting!"));
        assert!(text.contains(LEADS_TEASER_CTA));
        assert!(text.contains("Website Form - (...***-****)"));
        assert!(!text.contains("Sarah Miller"));
    }

    #[test]
    fn locked_mode_redacts_full_records() {
        let full = LeadsPayload::Full {
            leads: sample_leads(),
        };
        match leads_view(Entitlement::Locked, &full) {
            LeadsView::Teaser { rows, .. } => {
                assert!(rows.iter().all(|row| row.teaser.ends_with("...")));
            }
            other => panic!("expected teaser, got {:?}", other),
        }
    }

    #[test]
    fn unlocked_leads_offer_status_choices() {
        let payload = leads_for(Plan::Growth, &sample_leads()).unwrap();
        match leads_view(Entitlement::Unlocked, &payload) {
            LeadsView::Full {
                rows,
                status_choices,
            } => {
                assert_eq!(rows.len(), 4);
                assert_eq!(status_choices.len(), 5);
            }
            other => panic!("expected full view, got {:?}", other),
        }
    }

    #[test]
    fn seo_title_and_band_follow_plan() {
        let reports = sample_seo_reports();
        let starter = seo_view(&seo_for(Plan::Starter, &reports).unwrap());
        assert_eq!(starter.title, "One-Time SEO Audit");
        assert_eq!(starter.band, ScoreBand::Poor);
        assert_eq!(starter.upgrade_cta, Some(SEO_UPGRADE_CTA));

        let growth = seo_view(&seo_for(Plan::Growth, &reports).unwrap());
        assert_eq!(growth.title, "Monthly SEO Report");
        assert_eq!(growth.band, ScoreBand::Good);
        assert!(growth.upgrade_cta.is_none());
    }

    #[test]
    fn score_band_boundaries() {
        assert_eq!(ScoreBand::for_score(59), ScoreBand::Poor);
        assert_eq!(ScoreBand::for_score(60), ScoreBand::Fair);
        assert_eq!(ScoreBand::for_score(79), ScoreBand::Fair);
        assert_eq!(ScoreBand::for_score(80), ScoreBand::Good);
    }

    #[test]
    fn rank_axis_is_inverted() {
        let axis = RankAxis::default();
        assert_eq!(axis.position(1), 0.0);
        assert_eq!(axis.position(10), 1.0);
        assert!(axis.position(3) < axis.position(9));
        assert_eq!(axis.position(0), 0.0);
    }

    #[test]
    fn ai_view_reports_usage_percent() {
        let logs = AiLogsPayload {
            entries: vec![],
            usage: AiUsage {
                minutes_used: 27,
                minutes_allotted: 250,
            },
        };
        let view = ai_receptionist_view(&logs);
        assert_eq!(view.percent_used, 10.8);
        assert!(WidgetView::AiReceptionist(view)
            .to_string()
            .contains("27 / 250 minutes (10.8%)"));
    }

    #[test]
    fn failure_renders_retry_affordance() {
        let state = WidgetState::Failed(FetchError::Application("boom".into()));
        match render_widget(Plan::Scale, DatasetId::AiLogs, &state) {
            Some(WidgetView::Error(view)) => assert!(view.can_retry),
            other => panic!("expected error view, got {:?}", other),
        }
    }
}
