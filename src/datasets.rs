/// Entitlement-aware dataset builders.
///
/// These are the only place where catalog data is shaped for a caller's plan.
/// The HTTP handlers and the in-process static source both go through them,
/// so an insufficient plan never receives fields it has not paid for.
use crate::catalog::{Catalog, SeoReports};
use crate::entitlements::{entitlement, seo_cadence, Entitlement, Feature};
use crate::models::{
    AiCallLogEntry, AiLogsPayload, AiUsage, DatasetId, KeywordSample, Lead, LeadsPayload, Plan,
    PlanSeoReport,
};
use crate::redaction::redact_lead;
use serde::{Deserialize, Serialize};

/// The caller's plan does not include the requested feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{feature:?} is not available on the {plan} plan")]
pub struct EntitlementDenied {
    pub plan: Plan,
    pub feature: Feature,
}

/// A dataset already shaped for one plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataset", content = "data", rename_all = "kebab-case")]
pub enum DatasetPayload {
    Leads(LeadsPayload),
    Seo(PlanSeoReport),
    Keywords(Vec<KeywordSample>),
    AiLogs(AiLogsPayload),
}

impl DatasetPayload {
    pub fn dataset(&self) -> DatasetId {
        match self {
            DatasetPayload::Leads(_) => DatasetId::Leads,
            DatasetPayload::Seo(_) => DatasetId::Seo,
            DatasetPayload::Keywords(_) => DatasetId::Keywords,
            DatasetPayload::AiLogs(_) => DatasetId::AiLogs,
        }
    }
}

fn require(plan: Plan, feature: Feature) -> Result<Entitlement, EntitlementDenied> {
    match entitlement(plan, feature) {
        Entitlement::Unavailable => Err(EntitlementDenied { plan, feature }),
        granted => Ok(granted),
    }
}

fn require_unlocked(plan: Plan, feature: Feature) -> Result<(), EntitlementDenied> {
    match entitlement(plan, feature) {
        Entitlement::Unlocked => Ok(()),
        _ => Err(EntitlementDenied { plan, feature }),
    }
}

/// Full leads for unlocked plans, redacted teasers for locked ones.
pub fn leads_for(plan: Plan, leads: &[Lead]) -> Result<LeadsPayload, EntitlementDenied> {
    let payload = match require(plan, Feature::LeadDetail)? {
        Entitlement::Unlocked => LeadsPayload::Full {
            leads: leads.to_vec(),
        },
        _ => LeadsPayload::Redacted {
            total: leads.len(),
            leads: leads.iter().map(redact_lead).collect(),
        },
    };
    Ok(payload)
}

/// Only the caller's own plan report is ever returned.
pub fn seo_for(plan: Plan, reports: &SeoReports) -> Result<PlanSeoReport, EntitlementDenied> {
    require(plan, Feature::SeoAudit)?;
    Ok(PlanSeoReport {
        plan,
        cadence: seo_cadence(plan),
        report: reports.for_plan(plan).clone(),
    })
}

pub fn keywords_for(
    plan: Plan,
    samples: &[KeywordSample],
) -> Result<Vec<KeywordSample>, EntitlementDenied> {
    require_unlocked(plan, Feature::KeywordTracking)?;
    Ok(samples.to_vec())
}

pub fn ai_logs_for(
    plan: Plan,
    entries: &[AiCallLogEntry],
    usage: AiUsage,
) -> Result<AiLogsPayload, EntitlementDenied> {
    require_unlocked(plan, Feature::AiReceptionist)?;
    Ok(AiLogsPayload {
        entries: entries.to_vec(),
        usage,
    })
}

/// Whether `plan` may change lead status.
pub fn can_manage_leads(plan: Plan) -> Result<(), EntitlementDenied> {
    require_unlocked(plan, Feature::LeadDetail)
}

/// Builds any dataset straight from the catalog.
pub async fn build(
    catalog: &Catalog,
    dataset: DatasetId,
    plan: Plan,
) -> Result<DatasetPayload, EntitlementDenied> {
    let payload = match dataset {
        DatasetId::Leads => DatasetPayload::Leads(leads_for(plan, &catalog.leads().await)?),
        DatasetId::Seo => DatasetPayload::Seo(seo_for(plan, &catalog.seo)?),
        DatasetId::Keywords => DatasetPayload::Keywords(keywords_for(plan, &catalog.keywords)?),
        DatasetId::AiLogs => DatasetPayload::AiLogs(ai_logs_for(
            plan,
            &catalog.ai_logs,
            catalog.ai_usage,
        )?),
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{sample_leads, sample_seo_reports};
    use crate::models::SeoCadence;

    #[test]
    fn starter_receives_redacted_leads() {
        let payload = leads_for(Plan::Starter, &sample_leads()).unwrap();
        match payload {
            LeadsPayload::Redacted { total, leads } => {
                assert_eq!(total, 4);
                assert_eq!(leads[2].contact_hint.as_deref(), Some("541-5***-****"));
            }
            other => panic!("expected redacted payload, got {:?}", other),
        }
    }

    #[test]
    fn growth_receives_full_leads() {
        let payload = leads_for(Plan::Growth, &sample_leads()).unwrap();
        assert!(matches!(payload, LeadsPayload::Full { ref leads } if leads.len() == 4));
    }

    #[test]
    fn seo_returns_only_callers_report() {
        let reports = sample_seo_reports();
        let starter = seo_for(Plan::Starter, &reports).unwrap();
        assert_eq!(starter.plan, Plan::Starter);
        assert_eq!(starter.cadence, SeoCadence::OneTime);
        assert_eq!(starter.report.score, 45);

        let scale = seo_for(Plan::Scale, &reports).unwrap();
        assert_eq!(scale.cadence, SeoCadence::Recurring);
    }

    #[test]
    fn unavailable_features_are_denied() {
        let denied = keywords_for(Plan::Starter, &[]).unwrap_err();
        assert_eq!(denied.feature, Feature::KeywordTracking);

        let usage = AiUsage {
            minutes_used: 0,
            minutes_allotted: 250,
        };
        assert!(ai_logs_for(Plan::Growth, &[], usage).is_err());
        assert!(ai_logs_for(Plan::Scale, &[], usage).is_ok());
    }

    #[test]
    fn only_unlocked_plans_manage_leads() {
        assert!(can_manage_leads(Plan::Starter).is_err());
        assert!(can_manage_leads(Plan::Growth).is_ok());
    }

    #[tokio::test]
    async fn build_tags_payload_with_dataset() {
        let catalog = Catalog::sample();
        for dataset in DatasetId::ALL {
            let payload = build(&catalog, dataset, Plan::Scale).await.unwrap();
            assert_eq!(payload.dataset(), dataset);
        }
    }
}
