//! Classified DPI session records consumed by the engine
//!
//! A [`DpiRecord`] is the engine's view of one application-layer session as
//! delivered by the upstream DPI classifier. The engine never mutates a
//! record; it only reads the protocol tag and the raw attribute map.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application protocol family assigned by the DPI classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppProtocol {
    /// HTTP and other web traffic
    Web,
    /// SMTP/IMAP/POP mail sessions
    Mail,
    /// IRC/XMPP style chat sessions
    Chat,
    /// FTP and similar file-transfer sessions
    FileTransfer,
    /// Remote command protocols (SSH, telnet)
    Command,
    /// Traffic the classifier could not attribute
    #[default]
    Unknown,
}

impl AppProtocol {
    /// Every protocol family, in a fixed order usable for per-protocol counters
    pub const ALL: [AppProtocol; 6] = [
        AppProtocol::Web,
        AppProtocol::Mail,
        AppProtocol::Chat,
        AppProtocol::FileTransfer,
        AppProtocol::Command,
        AppProtocol::Unknown,
    ];

    /// Stable lowercase name used in rendered messages and stats keys
    pub fn as_str(&self) -> &'static str {
        match self {
            AppProtocol::Web => "web",
            AppProtocol::Mail => "mail",
            AppProtocol::Chat => "chat",
            AppProtocol::FileTransfer => "file_transfer",
            AppProtocol::Command => "command",
            AppProtocol::Unknown => "unknown",
        }
    }

    /// Position of this protocol in [`AppProtocol::ALL`]
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|p| p == self).unwrap_or(Self::ALL.len() - 1)
    }
}

impl std::fmt::Display for AppProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified DPI session record, immutable for the duration of a pass
///
/// The attribute map carries the raw protocol attributes keyed by logical
/// name ("login", "url", "sender", ...). Absent and empty attributes are
/// equivalent from the engine's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DpiRecord {
    /// Session identifier assigned by the capture layer
    pub session_id: Uuid,
    /// Time the session was classified
    pub captured_at: DateTime<Utc>,
    /// Application protocol family
    pub protocol: AppProtocol,
    /// Raw protocol attributes keyed by logical name
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl DpiRecord {
    /// Create a record for the given protocol with a fresh session id
    pub fn new(protocol: AppProtocol) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            captured_at: Utc::now(),
            protocol,
            attributes: HashMap::new(),
        }
    }

    /// Attach one attribute; used by producers and test fixtures
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Look up an attribute, treating an empty value as absent
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
