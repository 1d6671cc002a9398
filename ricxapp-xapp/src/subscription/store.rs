//! Subscription persistence
//!
//! Active subscriptions are written to a shared store keyed by their
//! identity string (`node/requestor/function`) so that a restarted xApp can
//! take them over. Persistence is best effort; the manager keeps working
//! from memory when the store fails.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use ricxapp_common::{E2NodeId, RicRequestId};
use ricxapp_e2ap::procedures::{RicAction, RicActionType, SubsequentAction};
use serde::{Deserialize, Serialize};

use super::state::{Subscription, SubscriptionId};
use crate::error::StoreError;

/// Persisted form of one requested action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// RIC action id
    pub id: u8,
    /// Action type
    pub action_type: RicActionType,
    /// Action definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<Vec<u8>>,
    /// Subsequent action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsequent_action: Option<SubsequentAction>,
}

impl From<&RicAction> for ActionRecord {
    fn from(action: &RicAction) -> Self {
        Self {
            id: action.id,
            action_type: action.action_type,
            definition: action.definition.as_ref().map(|d| d.to_vec()),
            subsequent_action: action.subsequent_action,
        }
    }
}

impl From<&ActionRecord> for RicAction {
    fn from(record: &ActionRecord) -> Self {
        RicAction {
            id: record.id,
            action_type: record.action_type,
            definition: record.definition.clone().map(Bytes::from),
            subsequent_action: record.subsequent_action,
        }
    }
}

/// Persisted subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// E2 node
    pub e2_node: E2NodeId,
    /// RIC requestor id
    pub requestor_id: u16,
    /// RAN function id
    pub ran_function_id: u16,
    /// RIC instance id of the subscription request
    #[serde(default)]
    pub instance_id: u16,
    /// Event trigger definition
    pub event_trigger: Vec<u8>,
    /// Requested actions
    pub actions: Vec<ActionRecord>,
    /// Admitted action ids
    #[serde(default)]
    pub admitted: Vec<u8>,
}

impl SubscriptionRecord {
    /// Identity of the persisted subscription.
    pub fn subscription_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.requestor_id, self.ran_function_id, self.e2_node.clone())
    }

    /// RIC request id the subscription was created with.
    pub fn request_id(&self) -> RicRequestId {
        RicRequestId::new(self.requestor_id, self.instance_id)
    }

    /// Store key.
    pub fn key(&self) -> String {
        self.subscription_id().to_string()
    }

    /// Requested actions as protocol structures.
    pub fn ric_actions(&self) -> Vec<RicAction> {
        self.actions.iter().map(RicAction::from).collect()
    }
}

impl From<&Subscription> for SubscriptionRecord {
    fn from(sub: &Subscription) -> Self {
        Self {
            e2_node: sub.id.e2_node.clone(),
            requestor_id: sub.id.requestor_id,
            ran_function_id: sub.id.ran_function_id,
            instance_id: sub.request_id.instance_id,
            event_trigger: sub.event_trigger.to_vec(),
            actions: sub.actions.iter().map(ActionRecord::from).collect(),
            admitted: sub.admitted.clone(),
        }
    }
}

/// Shared subscription store
pub trait SubscriptionStore: Send {
    /// Inserts or replaces a record.
    fn save(&mut self, record: &SubscriptionRecord) -> Result<(), StoreError>;

    /// Removes a record; removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Loads every record.
    fn load_all(&self) -> Result<Vec<SubscriptionRecord>, StoreError>;
}

/// In-memory store. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<BTreeMap<String, SubscriptionRecord>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Record stored under `key`.
    pub fn get(&self, key: &str) -> Option<SubscriptionRecord> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, SubscriptionRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SubscriptionStore for MemoryStore {
    fn save(&mut self, record: &SubscriptionRecord) -> Result<(), StoreError> {
        self.lock().insert(record.key(), record.clone());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<SubscriptionRecord>, StoreError> {
        Ok(self.lock().values().cloned().collect())
    }
}

/// Store backed by a single JSON file
///
/// Every change rewrites the file through a temporary sibling and a rename,
/// so a crash leaves either the old or the new content.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: BTreeMap<String, SubscriptionRecord>,
}

impl JsonFileStore {
    /// Opens the store, loading the file if it exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            if data.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, records })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(&self.records)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SubscriptionStore for JsonFileStore {
    fn save(&mut self, record: &SubscriptionRecord) -> Result<(), StoreError> {
        self.records.insert(record.key(), record.clone());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.records.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<SubscriptionRecord>, StoreError> {
        Ok(self.records.values().cloned().collect())
    }
}
