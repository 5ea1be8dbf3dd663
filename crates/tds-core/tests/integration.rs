//! End-to-end tests for tds-core: settings, session, events and export
//! working together through the public API.

use std::sync::Arc;
use std::time::Duration;

use tds_core::export::{self, ExportFormat};
use tds_core::{
    Error, MeterLink, MonitoringSession, Period, SequenceSource, SessionEvent, SessionStatus,
    Settings, SimulatedLink,
};
use tokio::time::sleep;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("tds_core=debug")
        .with_test_writer()
        .try_init();
}

#[tokio::test(start_paused = true)]
async fn test_settings_drive_session() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut settings = Settings::default();
    settings.set("monitoring_interval_ms", "500").unwrap();
    settings.set("data_retention", "10").unwrap();
    settings.set("calibration.offset", "5").unwrap();
    settings.save(&path).unwrap();

    let settings = Settings::load_validated(&path).unwrap();
    let session = MonitoringSession::builder()
        .config(settings.session_config())
        .source(SequenceSource::from_values((0..100).map(f64::from), 21.0))
        .build()
        .unwrap();

    session.connect("/dev/ttyUSB0", 9600).await.unwrap();
    session.start_monitoring().await.unwrap();
    sleep(Duration::from_millis(500 * 20 + 1)).await;

    let readings = session.readings();
    assert_eq!(readings.len(), 10);
    // Raw 20 plus the 5 ppm offset.
    assert_eq!(readings[0].value(), 25.0);
    assert_eq!(session.last_reading().as_ref(), readings.first());
}

#[tokio::test(start_paused = true)]
async fn test_subscriber_sees_every_tick() {
    init_tracing();
    let session = MonitoringSession::builder()
        .sampling_interval(Duration::from_millis(1000))
        .source(SequenceSource::from_values([100.0, 120.0, 140.0], 22.0))
        .build()
        .unwrap();
    let mut events = session.subscribe();

    let collector = tokio::spawn(async move {
        let mut values = Vec::new();
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::Reading { reading } => values.push(reading.value()),
                SessionEvent::Disconnected { .. } => break,
                _ => {}
            }
        }
        values
    });

    session.connect("COM3", 9600).await.unwrap();
    session.start_monitoring().await.unwrap();
    sleep(Duration::from_millis(3500)).await;
    session.disconnect().await.unwrap();

    let values = collector.await.unwrap();
    assert_eq!(values, vec![100.0, 120.0, 140.0, 100.0]);
}

#[tokio::test(start_paused = true)]
async fn test_state_watch_follows_lifecycle() {
    let session = MonitoringSession::new();
    let mut state = session.subscribe_state();

    session.connect("COM3", 9600).await.unwrap();
    assert!(state.has_changed().unwrap());
    assert_eq!(state.borrow_and_update().status, SessionStatus::Idle);

    session.start_monitoring().await.unwrap();
    sleep(Duration::from_millis(2001)).await;
    {
        let snapshot = state.borrow_and_update();
        assert!(snapshot.is_monitoring());
        assert_eq!(snapshot.readings.len(), 2);
    }

    session.disconnect().await.unwrap();
    assert_eq!(state.borrow().status, SessionStatus::Disconnected);
}

#[tokio::test]
async fn test_unavailable_device_then_recovery() {
    let link = Arc::new(SimulatedLink::new());
    let session = MonitoringSession::builder()
        .link(link.clone())
        .build()
        .unwrap();

    link.set_should_fail(true);
    let err = session.connect("COM9", 9600).await.unwrap_err();
    assert!(matches!(err, Error::DeviceUnavailable { .. }));
    assert!(matches!(
        session.start_monitoring().await,
        Err(Error::InvalidState { .. })
    ));

    link.set_should_fail(false);
    session.connect("COM9", 9600).await.unwrap();
    session.start_monitoring().await.unwrap();
    assert!(link.is_open());
    assert_eq!(link.open_count(), 1);

    session.disconnect().await.unwrap();
    assert!(!link.is_open());
}

#[tokio::test]
async fn test_export_history() {
    let session = MonitoringSession::builder()
        .source(SequenceSource::from_values([40.0, 200.0, 350.0], 23.5))
        .build()
        .unwrap();
    for _ in 0..3 {
        session.connect("COM3", 9600).await.unwrap();
    }

    let readings = session.readings_within(Period::LastDay);
    let csv = export::to_csv(&readings);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], export::CSV_HEADER);
    assert!(lines[1].ends_with(",350,23.5,poor"));
    assert!(lines[2].ends_with(",200,23.5,fair"));
    assert!(lines[3].ends_with(",40,23.5,excellent"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readings.json");
    export::write_file(&readings, &path, ExportFormat::Json).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["record_count"], 3);
    assert_eq!(value["records"][0]["quality"], "poor");
}
