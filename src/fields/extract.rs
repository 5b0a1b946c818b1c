//! Per-protocol field extractors
//!
//! Each extractor inspects a [`DpiRecord`] for one logical attribute. When
//! the attribute is present and non-empty it appends `(next_index, (name,
//! value))` to the accumulator and returns `next_index + 1`; otherwise it
//! returns `next_index` unchanged, leaving no gap in the index sequence.
//! A missing attribute is a normal condition, never an error, and no
//! extractor mutates the record.
//!
//! The extractor order per protocol is part of the downstream contract:
//! SIEM consumers parse the required fields by position.

use crate::fields::IndexedFieldPairs;
use crate::record::{AppProtocol, DpiRecord};

/// Logical attribute names, shared between producers and extractors
pub mod attr {
    /// Account or user name observed in the session
    pub const LOGIN: &str = "login";
    /// DNS domain associated with the session
    pub const DOMAIN: &str = "domain";
    /// Full request URL
    pub const URL: &str = "url";
    /// Destination host name or address
    pub const DEST_HOST: &str = "dest_host";
    /// Protocol command verb
    pub const COMMAND: &str = "command";
    /// Mail sender address
    pub const SENDER: &str = "sender";
    /// Mail recipient address
    pub const RECIPIENT: &str = "recipient";
    /// Mail subject line
    pub const SUBJECT: &str = "subject";
    /// Application or protocol version string
    pub const VERSION: &str = "version";
    /// Session attribute reported by the classifier
    pub const SESSION: &str = "session";
    /// Remote path
    pub const PATH: &str = "path";
    /// Transferred file name
    pub const FILENAME: &str = "filename";
}

/// Key under which the record's session id is reported
pub const SESSION_KEY: &str = "session";
/// Key under which the record's capture time is reported
pub const TIME_KEY: &str = "time";

/// Signature shared by every field extractor
pub type FieldExtractor = fn(u32, &DpiRecord, &mut IndexedFieldPairs) -> u32;

fn append_attribute(
    next_field: u32,
    record: &DpiRecord,
    pairs: &mut IndexedFieldPairs,
    name: &str,
) -> u32 {
    match record.attribute(name) {
        Some(value) => {
            pairs.insert(next_field, name, value);
            next_field + 1
        }
        None => next_field,
    }
}

/// Extract the `login` attribute
pub fn login_field(next_field: u32, record: &DpiRecord, pairs: &mut IndexedFieldPairs) -> u32 {
    append_attribute(next_field, record, pairs, attr::LOGIN)
}

/// Extract the `domain` attribute
pub fn domain_field(next_field: u32, record: &DpiRecord, pairs: &mut IndexedFieldPairs) -> u32 {
    append_attribute(next_field, record, pairs, attr::DOMAIN)
}

/// Extract the `url` attribute
pub fn url_field(next_field: u32, record: &DpiRecord, pairs: &mut IndexedFieldPairs) -> u32 {
    append_attribute(next_field, record, pairs, attr::URL)
}

/// Extract the `dest_host` attribute
pub fn dest_host_field(next_field: u32, record: &DpiRecord, pairs: &mut IndexedFieldPairs) -> u32 {
    append_attribute(next_field, record, pairs, attr::DEST_HOST)
}

/// Extract the `command` attribute
pub fn command_field(next_field: u32, record: &DpiRecord, pairs: &mut IndexedFieldPairs) -> u32 {
    append_attribute(next_field, record, pairs, attr::COMMAND)
}

/// Extract the `sender` attribute
pub fn sender_field(next_field: u32, record: &DpiRecord, pairs: &mut IndexedFieldPairs) -> u32 {
    append_attribute(next_field, record, pairs, attr::SENDER)
}

/// Extract the `recipient` attribute
pub fn recipient_field(next_field: u32, record: &DpiRecord, pairs: &mut IndexedFieldPairs) -> u32 {
    append_attribute(next_field, record, pairs, attr::RECIPIENT)
}

/// Extract the `subject` attribute
pub fn subject_field(next_field: u32, record: &DpiRecord, pairs: &mut IndexedFieldPairs) -> u32 {
    append_attribute(next_field, record, pairs, attr::SUBJECT)
}

/// Extract the `version` attribute
pub fn version_field(next_field: u32, record: &DpiRecord, pairs: &mut IndexedFieldPairs) -> u32 {
    append_attribute(next_field, record, pairs, attr::VERSION)
}

/// Extract the `session` attribute
pub fn session_field(next_field: u32, record: &DpiRecord, pairs: &mut IndexedFieldPairs) -> u32 {
    append_attribute(next_field, record, pairs, attr::SESSION)
}

/// Extract the `path` attribute
pub fn path_field(next_field: u32, record: &DpiRecord, pairs: &mut IndexedFieldPairs) -> u32 {
    append_attribute(next_field, record, pairs, attr::PATH)
}

/// Extract the `filename` attribute
pub fn filename_field(next_field: u32, record: &DpiRecord, pairs: &mut IndexedFieldPairs) -> u32 {
    append_attribute(next_field, record, pairs, attr::FILENAME)
}

/// Ordered extractor subset for one protocol family
///
/// The order is load-bearing: downstream consumers parse by position.
pub fn extractor_sequence(protocol: AppProtocol) -> &'static [FieldExtractor] {
    match protocol {
        AppProtocol::Web => &[login_field, domain_field, url_field, dest_host_field],
        AppProtocol::Mail => &[
            login_field,
            sender_field,
            recipient_field,
            subject_field,
            dest_host_field,
        ],
        AppProtocol::Chat => &[login_field, domain_field, dest_host_field, command_field],
        AppProtocol::FileTransfer => &[
            login_field,
            command_field,
            path_field,
            filename_field,
            version_field,
        ],
        AppProtocol::Command => &[login_field, dest_host_field, command_field, version_field],
        AppProtocol::Unknown => &[],
    }
}

/// Seed the accumulator with the fields required for every message
///
/// Runs regardless of protocol family: the session identifier and the
/// capture timestamp. Returns the index at which application-specific
/// fields begin (the dynamic-start boundary).
pub fn siem_required_field_pairs(record: &DpiRecord, pairs: &mut IndexedFieldPairs) -> u32 {
    let mut next_field = 0;
    pairs.insert(next_field, SESSION_KEY, record.session_id.to_string());
    next_field += 1;
    pairs.insert(next_field, TIME_KEY, record.captured_at.to_rfc3339());
    next_field += 1;
    next_field
}

/// Run the protocol-appropriate extractor subset, appending from `start`
///
/// A protocol with zero matching extractors leaves the accumulator and the
/// index unchanged.
pub fn application_field_pairs(
    start: u32,
    record: &DpiRecord,
    pairs: &mut IndexedFieldPairs,
) -> u32 {
    extractor_sequence(record.protocol)
        .iter()
        .fold(start, |next_field, extractor| {
            extractor(next_field, record, pairs)
        })
}
