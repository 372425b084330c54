use pulse_common::observability::{init_logging, LogConfig, LogFormat};
use tempfile::TempDir;

#[test]
fn init_logging_resolves_path_and_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let config = LogConfig {
        app_name: "pulse-test",
        log_dir: Some(tmp.path().to_path_buf()),
        emit_stderr: false,
        format: LogFormat::Text,
        default_filter: "debug",
    };

    let first = init_logging(config.clone()).expect("logging init");
    assert!(first.starts_with(tmp.path()));
    assert_eq!(
        first.file_name().and_then(|n| n.to_str()),
        Some("pulse-test.log")
    );

    tracing::info!(target: "pulse.test", "logging smoke event");

    // a second init is a no-op handing back the originally resolved path
    let second = init_logging(config).unwrap();
    assert_eq!(first, second);
}
