//! Message composers
//!
//! Two independent output representations are built from one accumulator:
//! length-bounded syslog lines and pipe-delimited SIEM messages. Both may
//! run for the same record when both `syslog_enabled` and `siem_mode` are
//! set.

pub mod siem;
pub mod syslog;

pub use siem::SiemComposer;
pub use syslog::SyslogComposer;
