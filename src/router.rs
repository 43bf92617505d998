//! Routes detected and updated artifacts to their stores.

use std::sync::Arc;

use crate::artifact::{Artifact, ArtifactKind};
use crate::error::UpdateError;
use crate::identity::{self, Resolved};
use crate::notify::{Notice, Notifier};
use crate::store::ArtifactStores;
use crate::update::{self, ApplyOutcome};
use crate::value::PropertyValue;

/// What happened to an update event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDisposition {
    /// The update was handed to the call store, with this outcome.
    Routed(ApplyOutcome),
    /// Updates for this kind are not handled.
    Ignored(ArtifactKind),
}

/// Owns the artifact stores of a run and dispatches events into them.
pub struct EventRouter {
    stores: ArtifactStores,
    notifier: Arc<dyn Notifier>,
}

impl EventRouter {
    /// Create a router with empty stores.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            stores: ArtifactStores::new(),
            notifier,
        }
    }

    /// Stores a detected artifact. Returns true iff it was not stored yet.
    ///
    /// First-seen artifacts produce a `Found` notice, except connections,
    /// which are collected silently for the network map.
    pub fn on_detected(&mut self, artifact: Artifact) -> bool {
        let (inserted, text) = match identity::resolve(artifact) {
            Resolved::Connection(conn) => return self.stores.connections.add(conn),
            Resolved::Password(v) => {
                let text = v.to_string();
                (self.stores.passwords.add(v), text)
            }
            Resolved::Hash(v) => {
                let text = v.to_string();
                (self.stores.hashes.add(v), text)
            }
            Resolved::File(v) => {
                let text = v.to_string();
                (self.stores.files.add(v), text)
            }
            Resolved::DnsMapping(v) => {
                let text = v.to_string();
                (self.stores.dns_mappings.add(v), text)
            }
            Resolved::Call(v) => {
                let text = v.to_string();
                (self.stores.calls.add(v), text)
            }
        };

        if inserted {
            self.notifier.notify(Notice::Found(text));
        }
        inserted
    }

    /// Applies a property update.
    ///
    /// Only calls are updatable. Updates for any other kind are ignored, and an
    /// update for a call that was never detected changes nothing.
    pub fn on_updated(
        &mut self,
        artifact: &Artifact,
        field: &str,
        value: &PropertyValue,
    ) -> Result<UpdateDisposition, UpdateError> {
        match artifact {
            Artifact::Call(call) => {
                let id = identity::call_key(call);
                let outcome = update::apply_named(&mut self.stores.calls, &id, field, value)?;
                if outcome == ApplyOutcome::NotFound {
                    tracing::trace!(call = %id, field, "update for unknown call dropped");
                }
                Ok(UpdateDisposition::Routed(outcome))
            }
            other => Ok(UpdateDisposition::Ignored(other.kind())),
        }
    }

    /// The stores as they are now.
    #[must_use]
    pub const fn stores(&self) -> &ArtifactStores {
        &self.stores
    }

    /// Consumes the router, yielding its stores.
    #[must_use]
    pub fn into_stores(self) -> ArtifactStores {
        self.stores
    }
}
