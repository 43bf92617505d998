//! Identity resolution for detected artifacts.
//!
//! Each store is keyed by a dedicated key type. Value-identity kinds key on
//! their complete field set (a file's payload by digest); calls key on the call identifier reported by the
//! engine, never on the fields that later updates change.

use std::fmt;
use std::hash::Hash;

use crate::artifact::{
    Artifact, ArtifactKind, CallId, DnsNameMapping, NetworkConnection, NetworkFile, NetworkHash,
    NetworkPassword, VoipCall, VoipCallPresentation,
};

/// A storable record with an explicit identity key.
pub trait Identity {
    /// Key under which the record is deduplicated.
    type Key: Eq + Hash + Clone + fmt::Debug;

    /// Returns this record's identity key.
    fn identity(&self) -> Self::Key;
}

/// Identity key of a [`NetworkPassword`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PasswordKey {
    pub source: String,
    pub destination: String,
    pub protocol: String,
    pub username: String,
    pub password: String,
}

impl Identity for NetworkPassword {
    type Key = PasswordKey;

    fn identity(&self) -> Self::Key {
        PasswordKey {
            source: self.source.clone(),
            destination: self.destination.clone(),
            protocol: self.protocol.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// Identity key of a [`NetworkHash`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub source: String,
    pub destination: String,
    pub protocol: String,
    pub hash_type: String,
    pub username: String,
    pub hash: String,
}

impl Identity for NetworkHash {
    type Key = HashKey;

    fn identity(&self) -> Self::Key {
        HashKey {
            source: self.source.clone(),
            destination: self.destination.clone(),
            protocol: self.protocol.clone(),
            hash_type: self.hash_type.clone(),
            username: self.username.clone(),
            hash: self.hash.clone(),
        }
    }
}

/// Identity key of a [`NetworkFile`].
///
/// The payload is represented by its blake3 digest, so a key never holds a
/// copy of the carved bytes.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileKey {
    pub source: String,
    pub destination: String,
    pub protocol: String,
    pub extension: String,
    pub name: String,
    pub digest: blake3::Hash,
}

impl Identity for NetworkFile {
    type Key = FileKey;

    fn identity(&self) -> Self::Key {
        FileKey {
            source: self.source.clone(),
            destination: self.destination.clone(),
            protocol: self.protocol.clone(),
            extension: self.extension.clone(),
            name: self.name.clone(),
            digest: blake3::hash(&self.data),
        }
    }
}

/// Identity key of a [`NetworkConnection`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub source: String,
    pub destination: String,
    pub src_port: u16,
    pub dest_port: u16,
    pub protocol: String,
}

impl Identity for NetworkConnection {
    type Key = ConnectionKey;

    fn identity(&self) -> Self::Key {
        ConnectionKey {
            source: self.source.clone(),
            destination: self.destination.clone(),
            src_port: self.src_port,
            dest_port: self.dest_port,
            protocol: self.protocol.clone(),
        }
    }
}

/// Identity key of a [`DnsNameMapping`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DnsKey {
    pub query: String,
    pub destination: String,
}

impl Identity for DnsNameMapping {
    type Key = DnsKey;

    fn identity(&self) -> Self::Key {
        DnsKey {
            query: self.query.clone(),
            destination: self.destination.clone(),
        }
    }
}

impl Identity for VoipCallPresentation {
    type Key = CallId;

    fn identity(&self) -> Self::Key {
        self.id.clone()
    }
}

/// Call identifier carried by a raw call payload.
#[must_use]
pub fn call_key(call: &VoipCall) -> CallId {
    CallId::new(call.call_guid.clone())
}

/// A detected artifact turned into the record its store keeps.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Password(NetworkPassword),
    Hash(NetworkHash),
    File(NetworkFile),
    Connection(NetworkConnection),
    DnsMapping(DnsNameMapping),
    Call(VoipCallPresentation),
}

impl Resolved {
    /// Returns the kind of the originating artifact.
    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        match self {
            Self::Password(_) => ArtifactKind::Password,
            Self::Hash(_) => ArtifactKind::Hash,
            Self::File(_) => ArtifactKind::File,
            Self::Connection(_) => ArtifactKind::Connection,
            Self::DnsMapping(_) => ArtifactKind::DnsMapping,
            Self::Call(_) => ArtifactKind::Call,
        }
    }
}

/// Maps a raw artifact to its storable record.
///
/// Value-identity payloads are stored as-is. A call is stored as the
/// presentation built from its first sighting.
#[must_use]
pub fn resolve(artifact: Artifact) -> Resolved {
    match artifact {
        Artifact::Password(v) => Resolved::Password(v),
        Artifact::Hash(v) => Resolved::Hash(v),
        Artifact::File(v) => Resolved::File(v),
        Artifact::Connection(v) => Resolved::Connection(v),
        Artifact::DnsMapping(v) => Resolved::DnsMapping(v),
        Artifact::Call(call) => Resolved::Call(VoipCallPresentation::from_call(&call)),
    }
}
