//! SIEM message composition
//!
//! The SIEM layout is a pipe-delimited `key=value` string opened by the
//! protocol family tag. Unlike the syslog path it is not length-bounded;
//! the downstream SIEM collector frames its own input. The path is fully
//! independent of the syslog composer and both may run for one record.

use crate::fields::{application_field_pairs, siem_required_field_pairs, IndexedFieldPairs};
use crate::record::{AppProtocol, DpiRecord};

/// Delimiter between fields in a SIEM message
const SIEM_SEPARATOR: &str = "|";

/// Builds SIEM-formatted messages from DPI records
#[derive(Debug, Clone)]
pub struct SiemComposer {
    debug_mode: bool,
}

impl SiemComposer {
    /// Create a composer; `debug_mode` adds a diagnostic trailer to each
    /// message without affecting the production fields
    pub fn new(debug_mode: bool) -> Self {
        Self { debug_mode }
    }

    /// Whether verbose diagnostic rendering is enabled
    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// Render the SIEM message(s) for one record
    ///
    /// Runs the required-field pass followed by the application-specific
    /// pass. Returns an empty sequence when the record yields no required
    /// fields, which is the case for traffic the classifier could not
    /// attribute to a reportable protocol family.
    pub fn siem_message(&self, record: &DpiRecord) -> Vec<String> {
        if record.protocol == AppProtocol::Unknown {
            return Vec::new();
        }

        let mut pairs = IndexedFieldPairs::new();
        let dynamic_start = siem_required_field_pairs(record, &mut pairs);
        if pairs.is_empty() {
            return Vec::new();
        }
        application_field_pairs(dynamic_start, record, &mut pairs);

        let mut message = record.protocol.as_str().to_string();
        let mut cursor = pairs.cursor();
        loop {
            let token = cursor.next_data_pair();
            if token.is_empty() {
                break;
            }
            message.push_str(SIEM_SEPARATOR);
            message.push_str(&token);
        }

        if self.debug_mode {
            message.push_str(SIEM_SEPARATOR);
            message.push_str(&format!(
                "_dbg=fields:{};dynamic_start:{}",
                pairs.len(),
                dynamic_start
            ));
        }

        vec![message]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_record_renders_required_then_url() {
        let record = DpiRecord::new(AppProtocol::Web).with_attribute("url", "http://x/y");
        let messages = SiemComposer::new(false).siem_message(&record);
        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert!(message.starts_with("web|session="));
        assert!(message.contains("|time="));
        assert!(message.ends_with("|url=http://x/y"));
    }

    #[test]
    fn unknown_protocol_yields_no_siem_output() {
        let record = DpiRecord::new(AppProtocol::Unknown).with_attribute("url", "http://x/y");
        assert!(SiemComposer::new(false).siem_message(&record).is_empty());
    }

    #[test]
    fn field_order_follows_extractor_sequence() {
        let record = DpiRecord::new(AppProtocol::FileTransfer)
            .with_attribute("filename", "notes.txt")
            .with_attribute("command", "RETR")
            .with_attribute("path", "/pub");
        let messages = SiemComposer::new(false).siem_message(&record);
        let message = &messages[0];
        let command_at = message.find("command=").unwrap();
        let path_at = message.find("path=").unwrap();
        let filename_at = message.find("filename=").unwrap();
        assert!(command_at < path_at && path_at < filename_at);
    }

    #[test]
    fn debug_mode_appends_trailer_without_touching_fields() {
        let record = DpiRecord::new(AppProtocol::Web).with_attribute("url", "http://x/y");
        let plain = SiemComposer::new(false).siem_message(&record);
        let debug = SiemComposer::new(true).siem_message(&record);
        assert!(debug[0].starts_with(plain[0].as_str()));
        assert!(debug[0].contains("_dbg=fields:3;dynamic_start:2"));
        assert!(!plain[0].contains("_dbg"));
    }
}
