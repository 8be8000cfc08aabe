//! Plan-based feature gating.
//!
//! Every (plan, feature) pair resolves to exactly one [`Entitlement`] through
//! [`ENTITLEMENT_TABLE`]. Widgets, handlers and the page shell all consult
//! [`entitlement`]; none of them branch on the plan directly.

use crate::models::{DatasetId, Plan, SeoCadence};
use serde::{Deserialize, Serialize};

/// Dashboard features sold per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    LeadDetail,
    KeywordTracking,
    SeoAudit,
    AiReceptionist,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::LeadDetail,
        Feature::KeywordTracking,
        Feature::SeoAudit,
        Feature::AiReceptionist,
    ];

    /// The dataset backing this feature's widget.
    pub fn dataset(&self) -> DatasetId {
        match self {
            Feature::LeadDetail => DatasetId::Leads,
            Feature::KeywordTracking => DatasetId::Keywords,
            Feature::SeoAudit => DatasetId::Seo,
            Feature::AiReceptionist => DatasetId::AiLogs,
        }
    }

    pub fn for_dataset(dataset: DatasetId) -> Self {
        match dataset {
            DatasetId::Leads => Feature::LeadDetail,
            DatasetId::Keywords => Feature::KeywordTracking,
            DatasetId::Seo => Feature::SeoAudit,
            DatasetId::AiLogs => Feature::AiReceptionist,
        }
    }

    fn index(&self) -> usize {
        match self {
            Feature::LeadDetail => 0,
            Feature::KeywordTracking => 1,
            Feature::SeoAudit => 2,
            Feature::AiReceptionist => 3,
        }
    }
}

/// Access level of a feature for a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entitlement {
    /// Not sold at this tier; the widget is not mounted.
    Unavailable,
    /// Present as a teaser; data is withheld or redacted.
    Locked,
    /// Full data and full interactivity.
    Unlocked,
}

impl Entitlement {
    pub fn is_mounted(&self) -> bool {
        !matches!(self, Entitlement::Unavailable)
    }
}

use self::Entitlement::{Locked, Unavailable, Unlocked};

/// Rows are features (in [`Feature::ALL`] order), columns are plans
/// (in [`Plan::ALL`] order).
pub const ENTITLEMENT_TABLE: [[Entitlement; 3]; 4] = [
    // starter, growth, scale
    [Locked, Unlocked, Unlocked],         // lead detail
    [Unavailable, Unlocked, Unlocked],    // keyword tracking
    [Unlocked, Unlocked, Unlocked],       // seo audit
    [Unavailable, Unavailable, Unlocked], // ai receptionist
];

fn plan_index(plan: Plan) -> usize {
    match plan {
        Plan::Starter => 0,
        Plan::Growth => 1,
        Plan::Scale => 2,
    }
}

/// Resolves the access level of `feature` for `plan`.
pub fn entitlement(plan: Plan, feature: Feature) -> Entitlement {
    ENTITLEMENT_TABLE[feature.index()][plan_index(plan)]
}

/// SEO audits are a one-time report on Starter and recurring above it.
pub fn seo_cadence(plan: Plan) -> SeoCadence {
    match plan {
        Plan::Starter => SeoCadence::OneTime,
        Plan::Growth | Plan::Scale => SeoCadence::Recurring,
    }
}

/// Cheapest plan that unlocks `feature`, used for upgrade prompts.
pub fn minimum_plan_for(feature: Feature) -> Option<Plan> {
    Plan::ALL
        .into_iter()
        .find(|plan| entitlement(*plan, feature) == Unlocked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_pricing() {
        assert_eq!(entitlement(Plan::Starter, Feature::LeadDetail), Locked);
        assert_eq!(entitlement(Plan::Growth, Feature::LeadDetail), Unlocked);
        assert_eq!(entitlement(Plan::Starter, Feature::KeywordTracking), Unavailable);
        assert_eq!(entitlement(Plan::Growth, Feature::KeywordTracking), Unlocked);
        assert_eq!(entitlement(Plan::Starter, Feature::SeoAudit), Unlocked);
        assert_eq!(entitlement(Plan::Growth, Feature::AiReceptionist), Unavailable);
        assert_eq!(entitlement(Plan::Scale, Feature::AiReceptionist), Unlocked);
    }

    #[test]
    fn higher_tiers_never_lose_access() {
        let rank = |e: Entitlement| match e {
            Entitlement::Unavailable => 0,
            Entitlement::Locked => 1,
            Entitlement::Unlocked => 2,
        };
        for feature in Feature::ALL {
            let levels: Vec<_> = Plan::ALL
                .iter()
                .map(|plan| rank(entitlement(*plan, feature)))
                .collect();
            assert!(levels.windows(2).all(|w| w[0] <= w[1]), "{:?}", feature);
        }
    }

    #[test]
    fn feature_dataset_mapping_round_trips() {
        for feature in Feature::ALL {
            assert_eq!(Feature::for_dataset(feature.dataset()), feature);
        }
    }

    #[test]
    fn upgrade_targets() {
        assert_eq!(minimum_plan_for(Feature::LeadDetail), Some(Plan::Growth));
        assert_eq!(minimum_plan_for(Feature::AiReceptionist), Some(Plan::Scale));
        assert_eq!(minimum_plan_for(Feature::SeoAudit), Some(Plan::Starter));
    }

    #[test]
    fn seo_cadence_by_plan() {
        assert_eq!(seo_cadence(Plan::Starter), SeoCadence::OneTime);
        assert_eq!(seo_cadence(Plan::Scale), SeoCadence::Recurring);
    }
}
