//! Forensic artifact types produced by the analysis engine.
//!
//! Five kinds are value-identity records: two detections with identical fields
//! are the same artifact. VoIP calls are different. The engine reports a raw
//! [`VoipCall`] once and keeps refining it afterwards, so the stored form is a
//! [`VoipCallPresentation`] keyed by its [`CallId`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cleartext credential seen on the wire.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkPassword {
    pub source: String,
    pub destination: String,
    pub protocol: String,
    pub username: String,
    pub password: String,
}

impl fmt::Display for NetworkPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} password: {}:{} ({} -> {})",
            self.protocol, self.username, self.password, self.source, self.destination
        )
    }
}

/// A crackable authentication hash (NTLM, Kerberos, CRAM-MD5, ...).
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkHash {
    pub source: String,
    pub destination: String,
    pub protocol: String,
    pub hash_type: String,
    pub username: String,
    pub hash: String,
}

impl fmt::Display for NetworkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hash ({}) for {}: {} ({} -> {})",
            self.hash_type, self.protocol, self.username, self.hash, self.source, self.destination
        )
    }
}

/// A file carved out of a reassembled stream.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkFile {
    pub source: String,
    pub destination: String,
    pub protocol: String,
    pub extension: String,
    pub name: String,
    #[serde(default)]
    pub data: Vec<u8>,
}

impl fmt::Display for NetworkFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file: {}.{} ({} bytes, {} -> {})",
            self.protocol,
            self.name,
            self.extension,
            self.data.len(),
            self.source,
            self.destination
        )
    }
}

/// A transport-level connection between two hosts.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkConnection {
    pub source: String,
    pub destination: String,
    pub src_port: u16,
    pub dest_port: u16,
    pub protocol: String,
}

impl fmt::Display for NetworkConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} connection: {}:{} -> {}:{}",
            self.protocol, self.source, self.src_port, self.destination, self.dest_port
        )
    }
}

/// A resolved DNS answer.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DnsNameMapping {
    pub query: String,
    pub destination: String,
}

impl fmt::Display for DnsNameMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DNS mapping: {} -> {}", self.query, self.destination)
    }
}

/// Signalling state of a VoIP call.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    #[default]
    Unknown,
    Invite,
    Ringing,
    InCall,
    Completed,
    Rejected,
    Canceled,
}

impl CallState {
    /// Returns the canonical snake_case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Invite => "invite",
            Self::Ringing => "ringing",
            Self::InCall => "in_call",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "unknown" => Ok(Self::Unknown),
            "invite" => Ok(Self::Invite),
            "ringing" => Ok(Self::Ringing),
            "incall" => Ok(Self::InCall),
            "completed" | "ended" | "hangup" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            _ => Err(format!("unknown call state '{s}'")),
        }
    }
}

/// A VoIP call as reported by the engine.
///
/// The engine re-reports the same call (same `call_guid`) as signalling and
/// media packets for it arrive.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoipCall {
    pub call_guid: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(default)]
    pub state: CallState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_secs: u64,
}

impl VoipCall {
    /// Creates a call with only its identity and participants set.
    pub fn new(call_guid: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            call_guid: call_guid.into(),
            from: from.into(),
            to: to.into(),
            ip: String::new(),
            port: 0,
            codec: None,
            state: CallState::Unknown,
            start_time: None,
            end_time: None,
            duration_secs: 0,
        }
    }
}

impl fmt::Display for VoipCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoIP call {}: {} -> {}", self.call_guid, self.from, self.to)
    }
}

/// Stable identity of a VoIP call across updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    /// Wraps a call/session identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CallId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Stored form of a VoIP call.
///
/// Equality and hashing consider `id` only. Duration, timestamps, status and
/// codec change in place as updates arrive.
#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoipCallPresentation {
    pub id: CallId,
    pub participants: Vec<String>,
    pub codec: Option<String>,
    pub status: CallState,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_secs: u64,
}

impl VoipCallPresentation {
    /// Builds the presentation of a freshly detected call.
    #[must_use]
    pub fn from_call(call: &VoipCall) -> Self {
        Self {
            id: CallId::new(call.call_guid.clone()),
            participants: vec![call.from.clone(), call.to.clone()],
            codec: call.codec.clone(),
            status: call.state,
            start_time: call.start_time,
            end_time: call.end_time,
            duration_secs: call.duration_secs,
        }
    }
}

impl PartialEq for VoipCallPresentation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for VoipCallPresentation {}

impl Hash for VoipCallPresentation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for VoipCallPresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VoIP call {} [{}] {} ({}s)",
            self.id,
            self.participants.join(" -> "),
            self.status,
            self.duration_secs
        )
    }
}

/// Discriminator for the six artifact kinds.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Password,
    Hash,
    File,
    Connection,
    DnsMapping,
    Call,
}

impl ArtifactKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Password,
        Self::Hash,
        Self::File,
        Self::Connection,
        Self::DnsMapping,
        Self::Call,
    ];
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password => write!(f, "password"),
            Self::Hash => write!(f, "hash"),
            Self::File => write!(f, "file"),
            Self::Connection => write!(f, "connection"),
            Self::DnsMapping => write!(f, "dns_mapping"),
            Self::Call => write!(f, "call"),
        }
    }
}

/// One artifact reported by the analysis engine.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item", rename_all = "snake_case")]
pub enum Artifact {
    Password(NetworkPassword),
    Hash(NetworkHash),
    File(NetworkFile),
    Connection(NetworkConnection),
    DnsMapping(DnsNameMapping),
    Call(VoipCall),
}

impl Artifact {
    /// Returns the artifact's kind discriminator.
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

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(v) => v.fmt(f),
            Self::Hash(v) => v.fmt(f),
            Self::File(v) => v.fmt(f),
            Self::Connection(v) => v.fmt(f),
            Self::DnsMapping(v) => v.fmt(f),
            Self::Call(v) => v.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentation_identity_ignores_mutable_fields() {
        let call = VoipCall::new("c1", "alice", "bob");
        let a = VoipCallPresentation::from_call(&call);
        let mut b = a.clone();
        b.duration_secs = 42;
        b.status = CallState::Completed;
        b.end_time = Some(Utc::now());

        assert_eq!(a, b);

        let hash = |p: &VoipCallPresentation| {
            use std::collections::hash_map::DefaultHasher;
            let mut h = DefaultHasher::new();
            p.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn presentation_copies_raw_fields() {
        let mut call = VoipCall::new("c1", "alice", "bob");
        call.codec = Some("PCMU".to_string());
        call.state = CallState::Ringing;

        let p = VoipCallPresentation::from_call(&call);
        assert_eq!(p.id.as_str(), "c1");
        assert_eq!(p.participants, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(p.codec.as_deref(), Some("PCMU"));
        assert_eq!(p.status, CallState::Ringing);
        assert_eq!(p.duration_secs, 0);
    }

    #[test]
    fn call_state_parses_loose_spellings() {
        assert_eq!("InCall".parse::<CallState>().unwrap(), CallState::InCall);
        assert_eq!("in_call".parse::<CallState>().unwrap(), CallState::InCall);
        assert_eq!("Cancelled".parse::<CallState>().unwrap(), CallState::Canceled);
        assert!("dialing".parse::<CallState>().is_err());
    }

    #[test]
    fn artifact_json_is_tagged_by_kind() {
        let artifact = Artifact::DnsMapping(DnsNameMapping {
            query: "example.com".to_string(),
            destination: "93.184.216.34".to_string(),
        });
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["kind"], "dns_mapping");
        assert_eq!(json["item"]["query"], "example.com");

        let back: Artifact = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), ArtifactKind::DnsMapping);
    }

    #[test]
    fn display_is_used_for_found_notices() {
        let hash = NetworkHash {
            source: "10.0.0.1".to_string(),
            destination: "10.0.0.2".to_string(),
            protocol: "SMB".to_string(),
            hash_type: "NTLMv2".to_string(),
            username: "admin".to_string(),
            hash: "deadbeef".to_string(),
        };
        let text = Artifact::Hash(hash).to_string();
        assert!(text.contains("NTLMv2"));
        assert!(text.contains("admin"));
    }
}
