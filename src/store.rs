use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::models::pool::{PoolEntry, Profiles};

/// Read/write access to pool entries and profiles. The matcher only ever sees
/// snapshots taken through this trait.
pub trait PoolStore: Send + Sync {
    fn submit_entry(&self, entry: PoolEntry) -> StoredEntry;

    /// Entries in submission order.
    fn snapshot_pool(&self) -> Vec<PoolEntry>;

    fn list_entries(&self) -> Vec<StoredEntry>;

    fn upsert_profile(&self, user_id: &str, display_name: &str);

    fn snapshot_profiles(&self) -> Profiles;

    fn pool_len(&self) -> usize;

    fn profiles_len(&self) -> usize;
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredEntry {
    pub id: Uuid,
    #[serde(skip)]
    pub sequence: u64,
    #[serde(flatten)]
    pub entry: PoolEntry,
}

#[derive(Debug, Default)]
pub struct InMemoryPoolStore {
    entries: DashMap<Uuid, StoredEntry>,
    profiles: DashMap<String, String>,
    next_sequence: AtomicU64,
}

impl InMemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PoolStore for InMemoryPoolStore {
    fn submit_entry(&self, entry: PoolEntry) -> StoredEntry {
        let stored = StoredEntry {
            id: Uuid::new_v4(),
            sequence: self.next_sequence.fetch_add(1, Ordering::SeqCst),
            entry,
        };

        self.entries.insert(stored.id, stored.clone());
        stored
    }

    fn snapshot_pool(&self) -> Vec<PoolEntry> {
        self.list_entries()
            .into_iter()
            .map(|stored| stored.entry)
            .collect()
    }

    fn list_entries(&self) -> Vec<StoredEntry> {
        let mut stored: Vec<StoredEntry> = self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        stored.sort_by_key(|entry| entry.sequence);
        stored
    }

    fn upsert_profile(&self, user_id: &str, display_name: &str) {
        self.profiles
            .insert(user_id.trim().to_string(), display_name.trim().to_string());
    }

    fn snapshot_profiles(&self) -> Profiles {
        self.profiles
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn pool_len(&self) -> usize {
        self.entries.len()
    }

    fn profiles_len(&self) -> usize {
        self.profiles.len()
    }
}
