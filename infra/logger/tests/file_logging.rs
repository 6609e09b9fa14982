use std::fs;
use std::time::Duration;

use rollcall_logger::{LevelFilter, Logger};
use tempfile::tempdir;

#[test]
fn json_file_logging_writes_json_lines() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder()
        .name("integration-file-logging")
        .console(false)
        .json(true)
        .directory(&log_dir)
        .level(LevelFilter::INFO)
        .init()?;
    assert!(logger.writes_files());

    tracing::info!(class_id = "c1", "attendance marked");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(log_file)?;
    let line: serde_json::Value =
        serde_json::from_str(contents.lines().next().expect("at least one line"))?;
    assert_eq!(line["fields"]["message"], "attendance marked");
    assert_eq!(line["fields"]["class_id"], "c1");

    Ok(())
}
