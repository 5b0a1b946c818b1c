//! End-to-end pipeline tests: records in, rendered messages and stats out

use std::time::Duration;

use dpi_relay::{
    AppProtocol, DpiRecord, EngineConfig, RuleEngine, SiemComposer, TransportError,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn single_worker_config() -> EngineConfig {
    EngineConfig::builder()
        .workers(1)
        .dpi_queue_max_depth(16)
        .build()
        .unwrap()
}

#[tokio::test]
async fn web_record_yields_one_syslog_line_with_url_token() {
    let mut handle = RuleEngine::new(single_worker_config())
        .unwrap()
        .start()
        .unwrap();

    let record = DpiRecord::new(AppProtocol::Web).with_attribute("url", "http://x/y");
    let session = record.session_id.to_string();
    handle.producer.send(record).await.unwrap();

    let line = tokio::time::timeout(Duration::from_secs(2), handle.syslog_rx.recv())
        .await
        .expect("no syslog line")
        .unwrap();

    // required-field static prefix, then exactly one dynamic token
    assert!(line.starts_with(&format!("session={session},time=")));
    assert!(line.ends_with(",url=http://x/y"));
    assert_eq!(line.matches("url=").count(), 1);

    // exactly one line: no further output arrives for this record
    let extra = tokio::time::timeout(Duration::from_millis(200), handle.syslog_rx.recv()).await;
    assert!(extra.is_err(), "unexpected extra output: {extra:?}");

    handle.shutdown(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn siem_mode_emits_both_representations_for_one_record() {
    let config = EngineConfig::builder()
        .workers(1)
        .dpi_queue_max_depth(16)
        .siem_mode(true)
        .build()
        .unwrap();
    let mut handle = RuleEngine::new(config).unwrap().start().unwrap();

    handle
        .producer
        .send(DpiRecord::new(AppProtocol::Web).with_attribute("url", "http://x/y"))
        .await
        .unwrap();

    let first = tokio::time::timeout(Duration::from_secs(2), handle.syslog_rx.recv())
        .await
        .expect("no syslog line")
        .unwrap();
    let second = tokio::time::timeout(Duration::from_secs(2), handle.syslog_rx.recv())
        .await
        .expect("no SIEM message")
        .unwrap();

    // syslog line first, then the pipe-delimited SIEM message
    assert!(first.starts_with("session="));
    assert!(first.contains("url=http://x/y"));
    assert!(second.starts_with("web|session="));
    assert!(second.contains("|url=http://x/y"));

    handle.shutdown(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn syslog_disabled_suppresses_all_lines_regardless_of_siem_mode() {
    let config = EngineConfig::builder()
        .workers(1)
        .dpi_queue_max_depth(16)
        .syslog_enabled(false)
        .siem_mode(true)
        .build()
        .unwrap();
    let mut handle = RuleEngine::new(config).unwrap().start().unwrap();

    handle
        .producer
        .send(DpiRecord::new(AppProtocol::Mail).with_attribute("sender", "a@b.c"))
        .await
        .unwrap();

    // only the SIEM message comes through
    let message = tokio::time::timeout(Duration::from_secs(2), handle.syslog_rx.recv())
        .await
        .expect("no SIEM message")
        .unwrap();
    assert!(message.starts_with("mail|"));

    let extra = tokio::time::timeout(Duration::from_millis(200), handle.syslog_rx.recv()).await;
    assert!(extra.is_err());

    handle.shutdown(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn unknown_protocol_record_still_produces_the_static_prefix_line() {
    let mut handle = RuleEngine::new(single_worker_config())
        .unwrap()
        .start()
        .unwrap();

    let record = DpiRecord::new(AppProtocol::Unknown).with_attribute("url", "ignored");
    let session = record.session_id.to_string();
    handle.producer.send(record).await.unwrap();

    let line = tokio::time::timeout(Duration::from_secs(2), handle.syslog_rx.recv())
        .await
        .expect("no syslog line")
        .unwrap();
    assert!(line.starts_with(&format!("session={session},time=")));
    assert!(!line.contains("url="));

    handle.shutdown(Duration::from_secs(1)).await.unwrap();
}

#[rstest]
#[case(AppProtocol::Web, "web")]
#[case(AppProtocol::Mail, "mail")]
#[case(AppProtocol::Chat, "chat")]
#[case(AppProtocol::FileTransfer, "file_transfer")]
#[case(AppProtocol::Command, "command")]
fn siem_messages_carry_the_protocol_label(#[case] protocol: AppProtocol, #[case] label: &str) {
    let composer = SiemComposer::new(false);
    let record = DpiRecord::new(protocol).with_attribute("login", "kjell");
    let messages = composer.siem_message(&record);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with(&format!("{label}|session=")));
    assert!(messages[0].contains("|login=kjell"));
}

#[tokio::test]
async fn unknown_protocol_yields_no_siem_message() {
    let composer = SiemComposer::new(false);
    let record = DpiRecord::new(AppProtocol::Unknown).with_attribute("login", "kjell");
    assert!(composer.siem_message(&record).is_empty());
}

#[tokio::test]
async fn producer_observes_backpressure_then_consumer_drains_without_loss() {
    let depth = 5;

    // Fill the queue before any consumer runs by building the transport alone.
    let (producer, source) = dpi_relay::queue::bounded_record_queue(depth);
    for i in 0..depth {
        producer
            .try_send(DpiRecord::new(AppProtocol::Web).with_attribute("url", format!("u{i}")))
            .expect("queue should accept up to its depth");
    }
    let overflow = producer.try_send(DpiRecord::new(AppProtocol::Web));
    assert!(matches!(overflow, Err(TransportError::Full)));

    // Once a consumer starts pulling, everything already queued survives.
    drop(producer);
    let mut drained = 0;
    use dpi_relay::queue::RecordSource;
    while source.pull().await.is_some() {
        drained += 1;
    }
    assert_eq!(drained, depth);
}

#[tokio::test]
async fn stats_records_arrive_for_every_processed_record() {
    let mut handle = RuleEngine::new(single_worker_config())
        .unwrap()
        .start()
        .unwrap();

    for protocol in [AppProtocol::Web, AppProtocol::Mail, AppProtocol::Web] {
        handle
            .producer
            .send(DpiRecord::new(protocol).with_attribute("login", "kjell"))
            .await
            .unwrap();
    }

    let mut last = None;
    let mut seen = 0;
    while seen < 3 {
        let record = tokio::time::timeout(Duration::from_secs(2), handle.stats_rx.recv())
            .await
            .expect("missing stats record")
            .unwrap();
        if record.scope == dpi_relay::engine::StatsScope::Record {
            seen += 1;
            last = Some(record);
        }
    }
    let last = last.unwrap();
    assert_eq!(last.processed, 3);
    assert_eq!(last.by_protocol.get("web"), Some(&2));
    assert_eq!(last.by_protocol.get("mail"), Some(&1));

    handle.shutdown(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn every_protocol_family_renders_its_own_field_order() {
    let config = EngineConfig::builder()
        .workers(1)
        .dpi_queue_max_depth(16)
        .siem_mode(true)
        .syslog_enabled(false)
        .build()
        .unwrap();
    let mut handle = RuleEngine::new(config).unwrap().start().unwrap();

    handle
        .producer
        .send(
            DpiRecord::new(AppProtocol::FileTransfer)
                .with_attribute("command", "RETR")
                .with_attribute("path", "/pub")
                .with_attribute("filename", "notes.txt"),
        )
        .await
        .unwrap();

    let message = tokio::time::timeout(Duration::from_secs(2), handle.syslog_rx.recv())
        .await
        .expect("no SIEM message")
        .unwrap();
    assert!(message.starts_with("file_transfer|session="));
    let command_at = message.find("command=RETR").unwrap();
    let path_at = message.find("path=/pub").unwrap();
    let filename_at = message.find("filename=notes.txt").unwrap();
    assert!(command_at < path_at && path_at < filename_at);

    handle.shutdown(Duration::from_secs(1)).await.unwrap();
}
