use flexi_logger::{Duplicate, FileSpec, Logger};

pub mod file_format;

pub use file_format::{deserialize, read_file, serialize, FileFormat, FileFormatError};

/// Starts the process-wide logger.
///
/// Writes to `logs/`, mirrors everything to stdout and warnings to stderr.
/// Rotates at 1MB and keeps the last five files.
pub fn setup_logging(base_level: &str) {
    Logger::try_with_str(base_level)
        .unwrap_or_else(|e| panic!("Logger initialization failed with {}", e))
        .log_to_file(FileSpec::default().directory("logs"))
        .duplicate_to_stderr(Duplicate::Warn)
        .duplicate_to_stdout(Duplicate::All)
        .rotate(
            flexi_logger::Criterion::Size(1024 * 1024), //1MB
            flexi_logger::Naming::Timestamps,
            flexi_logger::Cleanup::KeepLogFiles(5),
        )
        .start()
        .unwrap_or_else(|e| panic!("Logger initialization failed with {}", e));
}
