//! Deduplicating artifact stores.
//!
//! One [`ArtifactStore`] exists per artifact kind, bundled in [`ArtifactStores`].
//! The stores are plain owned values: the intake worker is their only writer,
//! so no locking happens here.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::artifact::{
    ArtifactKind, DnsNameMapping, NetworkConnection, NetworkFile, NetworkHash, NetworkPassword,
    VoipCallPresentation,
};
use crate::identity::Identity;

/// Holds at most one record per identity.
pub struct ArtifactStore<R: Identity> {
    records: HashMap<R::Key, R>,
}

impl<R: Identity> Default for ArtifactStore<R> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
        }
    }
}

impl<R: Identity + fmt::Debug> fmt::Debug for ArtifactStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("len", &self.records.len())
            .finish()
    }
}

impl<R: Identity> ArtifactStore<R> {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Returns true iff its identity was not present yet.
    ///
    /// A record whose identity is already stored is discarded; the stored one
    /// is left untouched.
    pub fn add(&mut self, record: R) -> bool {
        match self.records.entry(record.identity()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// True if a record with this identity is stored.
    #[must_use]
    pub fn contains(&self, key: &R::Key) -> bool {
        self.records.contains_key(key)
    }

    /// Looks up a record by identity.
    #[must_use]
    pub fn find(&self, key: &R::Key) -> Option<&R> {
        self.records.get(key)
    }

    /// Mutable lookup for in-place updates.
    ///
    /// Callers must not change the fields the identity key is derived from.
    pub(crate) fn find_mut(&mut self, key: &R::Key) -> Option<&mut R> {
        self.records.get_mut(key)
    }

    /// Iterates stored records in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.values()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl<R: Identity + Clone> ArtifactStore<R> {
    /// Snapshot of every stored record, in no particular order.
    #[must_use]
    pub fn all(&self) -> Vec<R> {
        self.records.values().cloned().collect()
    }
}

/// Record counts per store.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub passwords: usize,
    pub hashes: usize,
    pub files: usize,
    pub connections: usize,
    pub dns_mappings: usize,
    pub calls: usize,
}

impl StoreCounts {
    /// Count for one artifact kind.
    #[must_use]
    pub const fn get(&self, kind: ArtifactKind) -> usize {
        match kind {
            ArtifactKind::Password => self.passwords,
            ArtifactKind::Hash => self.hashes,
            ArtifactKind::File => self.files,
            ArtifactKind::Connection => self.connections,
            ArtifactKind::DnsMapping => self.dns_mappings,
            ArtifactKind::Call => self.calls,
        }
    }

    /// Total records across all stores.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passwords + self.hashes + self.files + self.connections + self.dns_mappings + self.calls
    }
}

/// Bundle of all six artifact stores for one run.
#[derive(Debug, Default)]
pub struct ArtifactStores {
    /// Password store.
    pub passwords: ArtifactStore<NetworkPassword>,
    /// Hash store.
    pub hashes: ArtifactStore<NetworkHash>,
    /// Extracted file store.
    pub files: ArtifactStore<NetworkFile>,
    /// Connection store.
    pub connections: ArtifactStore<NetworkConnection>,
    /// DNS mapping store.
    pub dns_mappings: ArtifactStore<DnsNameMapping>,
    /// VoIP call store.
    pub calls: ArtifactStore<VoipCallPresentation>,
}

impl ArtifactStores {
    /// Create a new bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record counts.
    #[must_use]
    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            passwords: self.passwords.len(),
            hashes: self.hashes.len(),
            files: self.files.len(),
            connections: self.connections.len(),
            dns_mappings: self.dns_mappings.len(),
            calls: self.calls.len(),
        }
    }

    /// Empties every store.
    pub fn clear(&mut self) {
        self.passwords.clear();
        self.hashes.clear();
        self.files.clear();
        self.connections.clear();
        self.dns_mappings.clear();
        self.calls.clear();
    }
}
