use pbuild_logger::{LevelFilter, Logger};

#[test]
fn console_logger_writes_no_file() {
    let logger = Logger::builder()
        .name("pbuild-console-only")
        .level(LevelFilter::INFO)
        .init()
        .expect("logger should initialize");

    assert!(!logger.writes_file());
}
