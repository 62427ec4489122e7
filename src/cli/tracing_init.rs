//! Tracing initialization for the CLI.
//!
//! `-v`/`-vv` select debug/trace; otherwise `RESOURCEFUL_LOG` is used as the
//! filter. `RESOURCEFUL_LOG_FORMAT` picks `text` or `json` and
//! `RESOURCEFUL_LOG_FILE` redirects output away from stderr.

use crate::constants;
use std::fs::{File, OpenOptions};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "error";

/// Writes to the log file when one could be opened, stderr otherwise.
struct LogWriter {
    file: Option<Mutex<File>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogWriter {
    type Writer = Box<dyn std::io::Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        self.file
            .as_ref()
            .and_then(|mutex| mutex.lock().ok())
            .and_then(|file| file.try_clone().ok())
            .map_or_else(
                || Box::new(std::io::stderr()) as Self::Writer,
                |cloned| Box::new(cloned) as Self::Writer,
            )
    }
}

fn filter_directive(verbosity: u8) -> String {
    match verbosity {
        0 => std::env::var(constants::ENV_RESOURCEFUL_LOG)
            .unwrap_or_else(|_| DEFAULT_FILTER.to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn open_log_writer() -> LogWriter {
    let Ok(path) = std::env::var(constants::ENV_RESOURCEFUL_LOG_FILE) else {
        return LogWriter { file: None };
    };
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => LogWriter {
            file: Some(Mutex::new(file)),
        },
        Err(e) => {
            // Tracing is not initialized yet; stderr is the only channel.
            eprintln!("Warning: Could not open log file '{path}': {e}. Using stderr.");
            LogWriter { file: None }
        }
    }
}

/// Installs the global subscriber. Call once, before the first request.
pub fn init_tracing(verbosity: u8) {
    let env_filter = EnvFilter::try_new(filter_directive(verbosity))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let log_format = std::env::var(constants::ENV_RESOURCEFUL_LOG_FORMAT)
        .map_or_else(|_| "text".to_string(), |s| s.to_lowercase());
    if log_format != "json" && log_format != "text" {
        eprintln!(
            "Warning: Unrecognized {} '{log_format}'. Valid values: 'json', 'text'. Using 'text'.",
            constants::ENV_RESOURCEFUL_LOG_FORMAT
        );
    }

    let writer = open_log_writer();
    if log_format == "json" {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_list(false)
            .with_target(true)
            .with_line_number(true)
            .with_writer(writer);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(writer);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }
}
