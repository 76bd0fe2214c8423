// logging.rs
// Timestamped log lines for the bingo server

use chrono::Local;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Render one log line: `YYYY-mm-dd HH:MM:SS - LEVEL - message`.
pub fn format_line(level: LogLevel, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("{} - {} - {}", timestamp, level.as_str(), message)
}

pub fn log_message(level: LogLevel, message: &str) {
    println!("{}", format_line(level, message));
}

pub fn log_info(message: &str) {
    log_message(LogLevel::Info, message);
}

pub fn log_warning(message: &str) {
    log_message(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    log_message(LogLevel::Error, message);
}

/// Same as `log_error` but on stderr, for failures outside request handling.
pub fn log_error_stderr(message: &str) {
    eprintln!("{}", format_line(LogLevel::Error, message));
}
