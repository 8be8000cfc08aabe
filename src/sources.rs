//! Where the dashboard gets its datasets: the live API or the in-process
//! sample catalog. Both return payloads already shaped for the plan.

use crate::catalog::Catalog;
use crate::config::{Config, DataSource};
use crate::datasets::{self, DatasetPayload};
use crate::errors::FetchError;
use crate::gateway_client::DashboardClient;
use crate::models::{DatasetId, Lead, LeadStatus, Plan};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch(&self, dataset: DatasetId, plan: Plan) -> Result<DatasetPayload, FetchError>;

    /// Moves a lead to another pipeline status. Requires lead detail to be
    /// unlocked for `plan`.
    async fn update_lead_status(
        &self,
        plan: Plan,
        lead_id: u32,
        status: LeadStatus,
    ) -> Result<Lead, FetchError>;
}

#[async_trait]
impl DatasetSource for DashboardClient {
    async fn fetch(&self, dataset: DatasetId, plan: Plan) -> Result<DatasetPayload, FetchError> {
        self.fetch_dataset(dataset, plan).await
    }

    async fn update_lead_status(
        &self,
        plan: Plan,
        lead_id: u32,
        status: LeadStatus,
    ) -> Result<Lead, FetchError> {
        DashboardClient::update_lead_status(self, plan, lead_id, status).await
    }
}

/// Serves the sample catalog without a network hop.
///
/// Entitlement refusals are reported the way the API reports them (403), so
/// widgets behave the same under either source.
#[derive(Debug, Clone)]
pub struct StaticSource {
    catalog: Arc<Catalog>,
}

impl StaticSource {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn sample() -> Self {
        Self::new(Arc::new(Catalog::sample()))
    }
}

#[async_trait]
impl DatasetSource for StaticSource {
    async fn fetch(&self, dataset: DatasetId, plan: Plan) -> Result<DatasetPayload, FetchError> {
        datasets::build(&self.catalog, dataset, plan)
            .await
            .map_err(|denied| FetchError::Protocol {
                status: Some(403),
                message: denied.to_string(),
            })
    }

    async fn update_lead_status(
        &self,
        plan: Plan,
        lead_id: u32,
        status: LeadStatus,
    ) -> Result<Lead, FetchError> {
        datasets::can_manage_leads(plan).map_err(|denied| FetchError::Protocol {
            status: Some(403),
            message: denied.to_string(),
        })?;
        self.catalog
            .set_lead_status(lead_id, status)
            .await
            .ok_or_else(|| FetchError::Protocol {
                status: Some(404),
                message: format!("Lead with id {} not found", lead_id),
            })
    }
}

/// Picks the source named by `DATA_SOURCE`.
pub fn from_config(config: &Config) -> Result<Arc<dyn DatasetSource>, FetchError> {
    match config.data_source {
        DataSource::Live => {
            tracing::info!("Using live data from {}", config.api_base_url);
            Ok(Arc::new(DashboardClient::from_config(config)?))
        }
        DataSource::Static => {
            tracing::info!("Using static sample data");
            Ok(Arc::new(StaticSource::sample()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LeadsPayload;

    #[tokio::test]
    async fn test_static_source_redacts_for_starter() {
        let source = StaticSource::sample();
        let payload = source.fetch(DatasetId::Leads, Plan::Starter).await.unwrap();
        assert!(matches!(
            payload,
            DatasetPayload::Leads(LeadsPayload::Redacted { .. })
        ));
    }

    #[tokio::test]
    async fn test_static_source_refuses_unavailable_dataset() {
        let source = StaticSource::sample();
        let err = source
            .fetch(DatasetId::AiLogs, Plan::Growth)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::Protocol {
                status: Some(403),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_static_source_updates_lead_status() {
        let source = StaticSource::sample();

        let err = source
            .update_lead_status(Plan::Starter, 1, LeadStatus::Won)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Protocol { status: Some(403), .. }));

        let lead = source
            .update_lead_status(Plan::Growth, 1, LeadStatus::Won)
            .await
            .unwrap();
        assert_eq!(lead.status, LeadStatus::Won);

        let err = source
            .update_lead_status(Plan::Growth, 99, LeadStatus::Won)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Protocol { status: Some(404), .. }));
    }

    #[test]
    fn test_source_selection() {
        let config = Config {
            data_source: DataSource::Static,
            ..Config::default()
        };
        assert!(from_config(&config).is_ok());

        let config = Config {
            data_source: DataSource::Live,
            ..Config::default()
        };
        assert!(from_config(&config).is_ok());
    }
}
