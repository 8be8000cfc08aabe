//! Single source of truth for the active subscription plan.
//!
//! The store is created once and handed to whoever needs it (`Arc<PlanStore>`);
//! there is no global instance. The persisted plan is read lazily on first
//! access. Concurrent first readers block on that read and all observe the
//! same resolved value.
//!
//! Persisted record, stored under [`PLAN_STORAGE_KEY`]:
//!
//! ```json
//! {"state":{"plan":"scale"},"version":1,"savedAt":"2026-01-01T00:00:00Z"}
//! ```
//!
//! Version 0 records (no `savedAt`) are accepted and rewritten as version 1
//! on the next change.

use crate::errors::StorageError;
use crate::models::Plan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tokio::sync::watch;

/// Namespaced key of the persisted plan record.
pub const PLAN_STORAGE_KEY: &str = "oregon-smb-plan-storage";

const RECORD_VERSION: u32 = 1;

/// Durable key-value storage for client state.
pub trait PlanStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Non-durable storage, for tests and for sessions without a writable disk.
#[derive(Debug, Default)]
pub struct MemoryPlanStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryPlanStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlanStorage for MemoryPlanStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.items).get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.items).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A JSON object of string keys to string values kept in one file.
#[derive(Debug, Clone)]
pub struct FilePlanStorage {
    path: PathBuf,
}

impl FilePlanStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_items(&self) -> Result<HashMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        match serde_json::from_str(&content) {
            Ok(items) => Ok(items),
            Err(e) => {
                // Treated as holding no record; the next write replaces it.
                tracing::warn!("Ignoring corrupt storage file {}: {}", self.path.display(), e);
                Ok(HashMap::new())
            }
        }
    }
}

impl PlanStorage for FilePlanStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_items()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.read_items()?;
        items.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&items)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    plan: Plan,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedPlan {
    state: PersistedState,
    version: u32,
    #[serde(rename = "savedAt", default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
}

fn encode_record(plan: Plan) -> Result<String, StorageError> {
    let record = PersistedPlan {
        state: PersistedState { plan },
        version: RECORD_VERSION,
        saved_at: Some(Utc::now()),
    };
    Ok(serde_json::to_string(&record)?)
}

/// Returns the stored plan, or `None` for a record that is malformed or
/// written by an unknown version.
fn decode_record(raw: &str) -> Option<Plan> {
    let record: PersistedPlan = match serde_json::from_str(raw) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("Ignoring malformed persisted plan record: {}", e);
            return None;
        }
    };
    if record.version > RECORD_VERSION {
        tracing::warn!(
            "Ignoring persisted plan record with unsupported version {}",
            record.version
        );
        return None;
    }
    Some(record.state.plan)
}

/// Handle returned by [`PlanStore::subscribe`].
pub type SubscriptionId = u64;

type Listener = Arc<dyn Fn(Plan) + Send + Sync>;

pub struct PlanStore {
    storage: Box<dyn PlanStorage>,
    default_plan: Plan,
    current: OnceLock<watch::Sender<Plan>>,
    write_lock: Mutex<()>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
    degraded: AtomicBool,
}

impl PlanStore {
    /// Creates a store backed by `storage`. Nothing is read until first use.
    pub fn new(storage: impl PlanStorage + 'static, default_plan: Plan) -> Self {
        Self {
            storage: Box::new(storage),
            default_plan,
            current: OnceLock::new(),
            write_lock: Mutex::new(()),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            degraded: AtomicBool::new(false),
        }
    }

    /// In-memory store, mostly for tests.
    pub fn in_memory(default_plan: Plan) -> Self {
        Self::new(MemoryPlanStorage::new(), default_plan)
    }

    /// The active plan.
    pub fn get(&self) -> Plan {
        *self.sender().borrow()
    }

    /// Replaces the active plan, persists it and notifies every subscriber
    /// before returning.
    ///
    /// Listeners run on the calling thread and must not call `set` themselves.
    pub fn set(&self, plan: Plan) {
        let _guard = lock(&self.write_lock);

        let previous = self.sender().send_replace(plan);
        self.persist(plan);

        if previous != plan {
            tracing::info!("Plan changed from {} to {}", previous, plan);
        }

        let listeners: Vec<Listener> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(plan);
        }
    }

    /// Registers a callback invoked synchronously on every `set`.
    pub fn subscribe(&self, listener: impl Fn(Plan) + Send + Sync + 'static) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners).push((id, Arc::new(listener)));
        id
    }

    /// Removes a callback. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Async view of the plan, for tasks that await changes.
    pub fn watch(&self) -> watch::Receiver<Plan> {
        self.sender().subscribe()
    }

    /// False once a storage failure has switched the store to memory-only.
    pub fn is_persistent(&self) -> bool {
        !self.degraded.load(Ordering::SeqCst)
    }

    fn sender(&self) -> &watch::Sender<Plan> {
        self.current.get_or_init(|| {
            let plan = self.load_initial();
            watch::channel(plan).0
        })
    }

    fn load_initial(&self) -> Plan {
        match self.storage.get_item(PLAN_STORAGE_KEY) {
            Ok(Some(raw)) => decode_record(&raw).unwrap_or(self.default_plan),
            Ok(None) => {
                tracing::debug!("No persisted plan, using default {}", self.default_plan);
                self.default_plan
            }
            Err(e) => {
                self.degrade(&e);
                self.default_plan
            }
        }
    }

    fn persist(&self, plan: Plan) {
        if self.degraded.load(Ordering::SeqCst) {
            return;
        }
        let result =
            encode_record(plan).and_then(|raw| self.storage.set_item(PLAN_STORAGE_KEY, &raw));
        if let Err(e) = result {
            self.degrade(&e);
        }
    }

    fn degrade(&self, err: &StorageError) {
        if !self.degraded.swap(true, Ordering::SeqCst) {
            tracing::warn!(
                "Plan storage unavailable, keeping plan in memory for this session: {}",
                err
            );
        }
    }
}

impl std::fmt::Debug for PlanStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanStore")
            .field("default_plan", &self.default_plan)
            .field("current", &self.current.get().map(|tx| *tx.borrow()))
            .field("persistent", &self.is_persistent())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
