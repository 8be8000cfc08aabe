//! One mounted dashboard view and its in-flight fetches.
//!
//! Mounting issues one fetch per mounted widget as independent tokio tasks.
//! Results come back over a channel in any order, tagged with the generation
//! of the view that issued them. Tearing the view down aborts outstanding
//! tasks and bumps the generation, so anything that still arrives for the old
//! view is dropped instead of being applied to the new one.

use crate::datasets::DatasetPayload;
use crate::entitlements::{entitlement, Feature};
use crate::errors::FetchError;
use crate::models::{DatasetId, Lead, LeadStatus, Plan};
use crate::sources::DatasetSource;
use crate::widgets::{render_widget, InvalidTransition, WidgetState, WidgetView};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};

/// Result of one dataset fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub generation: u64,
    pub dataset: DatasetId,
    pub result: Result<DatasetPayload, FetchError>,
}

/// A spawned fetch and the task that reports its outcome.
struct FetchTask {
    fetch: AbortHandle,
    report: JoinHandle<()>,
}

impl FetchTask {
    fn abort(&self) {
        self.fetch.abort();
        self.report.abort();
    }
}

pub struct DashboardSession {
    source: Arc<dyn DatasetSource>,
    plan: Plan,
    generation: u64,
    widgets: HashMap<DatasetId, WidgetState<DatasetPayload>>,
    in_flight: HashMap<DatasetId, FetchTask>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl DashboardSession {
    pub fn new(source: Arc<dyn DatasetSource>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            plan: Plan::Starter,
            generation: 0,
            widgets: HashMap::new(),
            in_flight: HashMap::new(),
            tx,
            rx,
        }
    }

    pub fn plan(&self) -> Plan {
        self.plan
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces the current view with a fresh one for `plan` and starts
    /// loading every widget the plan mounts.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(&mut self, plan: Plan) {
        self.teardown();
        self.plan = plan;

        let mounted: Vec<DatasetId> = DatasetId::ALL
            .into_iter()
            .filter(|dataset| entitlement(plan, Feature::for_dataset(*dataset)).is_mounted())
            .collect();

        tracing::info!(
            "Mounting {} dashboard (generation {}, {} widgets)",
            plan,
            self.generation,
            mounted.len()
        );

        for dataset in mounted {
            let mut state = WidgetState::Idle;
            if state.begin_load().is_ok() {
                self.widgets.insert(dataset, state);
                self.spawn_fetch(dataset);
            }
        }
    }

    /// Aborts outstanding fetches and invalidates the current view.
    pub fn teardown(&mut self) {
        for (dataset, task) in self.in_flight.drain() {
            tracing::debug!("Aborting in-flight {} fetch", dataset);
            task.abort();
        }
        self.widgets.clear();
        self.generation += 1;
    }

    /// Applies a completion to its widget. Returns `false` when it belongs to
    /// a previous view or to a widget that is not waiting for data.
    pub fn apply(&mut self, completion: Completion) -> bool {
        if completion.generation != self.generation {
            tracing::debug!(
                "Discarding late {} result from generation {} (current {})",
                completion.dataset,
                completion.generation,
                self.generation
            );
            return false;
        }

        let Some(state) = self.widgets.get_mut(&completion.dataset) else {
            return false;
        };

        if let Err(e) = &completion.result {
            tracing::warn!("{} widget failed: {}", completion.dataset, e);
        }

        match state.resolve(completion.result) {
            Ok(()) => {
                self.in_flight.remove(&completion.dataset);
                true
            }
            Err(e) => {
                tracing::debug!("Ignoring {} completion: {}", completion.dataset, e);
                false
            }
        }
    }

    /// Waits for the next completion of the current view and applies it.
    pub async fn next_event(&mut self) -> Option<DatasetId> {
        while self.is_loading() {
            let completion = self.rx.recv().await?;
            let dataset = completion.dataset;
            if self.apply(completion) {
                return Some(dataset);
            }
        }
        None
    }

    /// Drives the view until no widget is loading.
    pub async fn settle(&mut self) {
        while self.next_event().await.is_some() {}
    }

    /// Reloads a widget that already has data.
    pub fn refresh(&mut self, dataset: DatasetId) -> Result<(), InvalidTransition> {
        self.widget_mut(dataset, "refresh")?.begin_load()?;
        self.spawn_fetch(dataset);
        Ok(())
    }

    /// Reloads a widget whose last fetch failed.
    pub fn retry(&mut self, dataset: DatasetId) -> Result<(), InvalidTransition> {
        self.widget_mut(dataset, "retry")?.retry()?;
        self.spawn_fetch(dataset);
        Ok(())
    }

    /// Moves a lead to another status, then reloads the leads widget so the
    /// change shows up.
    pub async fn set_lead_status(
        &mut self,
        lead_id: u32,
        status: LeadStatus,
    ) -> Result<Lead, FetchError> {
        let lead = self
            .source
            .update_lead_status(self.plan, lead_id, status)
            .await?;
        if let Err(e) = self.refresh(DatasetId::Leads) {
            tracing::debug!("Leads widget not reloaded after status change: {}", e);
        }
        Ok(lead)
    }

    /// Retries every failed widget. Returns how many were restarted.
    pub fn retry_failed(&mut self) -> usize {
        let failed: Vec<DatasetId> = self
            .widgets
            .iter()
            .filter(|(_, state)| state.error().is_some())
            .map(|(dataset, _)| *dataset)
            .collect();
        failed
            .into_iter()
            .filter(|dataset| self.retry(*dataset).is_ok())
            .count()
    }

    pub fn state(&self, dataset: DatasetId) -> Option<&WidgetState<DatasetPayload>> {
        self.widgets.get(&dataset)
    }

    pub fn is_mounted(&self, dataset: DatasetId) -> bool {
        self.widgets.contains_key(&dataset)
    }

    pub fn is_loading(&self) -> bool {
        self.widgets.values().any(WidgetState::is_loading)
    }

    /// Views of the mounted widgets, in dashboard order.
    pub fn views(&self) -> Vec<WidgetView> {
        DatasetId::ALL
            .into_iter()
            .filter_map(|dataset| {
                let state = self.widgets.get(&dataset)?;
                render_widget(self.plan, dataset, state)
            })
            .collect()
    }

    fn widget_mut(
        &mut self,
        dataset: DatasetId,
        action: &'static str,
    ) -> Result<&mut WidgetState<DatasetPayload>, InvalidTransition> {
        self.widgets.get_mut(&dataset).ok_or(InvalidTransition {
            action,
            state: "unmounted",
        })
    }

    fn spawn_fetch(&mut self, dataset: DatasetId) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let plan = self.plan;
        let generation = self.generation;

        let fetch = tokio::spawn(async move { source.fetch(dataset, plan).await });
        let fetch_abort = fetch.abort_handle();

        // Every fetch reports back, even one that panicked, so the widget
        // always leaves Loading.
        let report = tokio::spawn(async move {
            let result = match fetch.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("{} fetch task ended abnormally: {}", dataset, e);
                    Err(FetchError::Transport(format!("fetch task failed: {}", e)))
                }
            };
            // The session may already be gone.
            let _ = tx.send(Completion {
                generation,
                dataset,
                result,
            });
        });

        let task = FetchTask {
            fetch: fetch_abort,
            report,
        };
        if let Some(previous) = self.in_flight.insert(dataset, task) {
            previous.abort();
        }
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        for (_, task) in self.in_flight.drain() {
            task.abort();
        }
    }
}
