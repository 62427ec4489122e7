pub mod tracing_init;

use crate::duration::parse_duration;
use crate::options::Method;
use anyhow::{anyhow, Context};
use clap::{ArgAction, Parser};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
#[command(
    author,
    version,
    about = "Resourceful: call REST resources described by URL templates",
    long_about = "Resourceful expands a URL template such as 'https://api.test/users/:id'\n\
                  with the given parameters and runs one resource action against it.\n\
                  Parameters that match no :token are sent as the query string.\n\n\
                  Examples:\n  \
                  resourceful https://api.test/users/:id get -p id=7\n  \
                  resourceful https://api.test/users/:id save -p id=7 -d '{\"name\":\"Ann\"}'\n  \
                  resourceful https://api.test/users query -p page=2 --cache\n  \
                  resourceful https://api.test/users/:id/lock lock -X POST -p id=7"
)]
pub struct Cli {
    /// URL template with `:name` path tokens
    #[arg(value_name = "URL_TEMPLATE")]
    pub url: String,

    /// Action to call: get, query, post, put, save, remove, delete, or a custom name with --method
    #[arg(value_name = "ACTION")]
    pub action: String,

    /// Parameter as NAME=VALUE; VALUE is parsed as JSON when possible
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, Value)>,

    /// Request payload as JSON
    #[arg(short = 'd', long = "data", value_name = "JSON")]
    pub data: Option<String>,

    /// Extra request header as 'Name: value'
    #[arg(short = 'H', long = "header", value_name = "HEADER", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Method of a custom action
    #[arg(short = 'X', long, value_name = "METHOD")]
    pub method: Option<Method>,

    /// Serve GET requests from and store responses in the default cache
    #[arg(long)]
    pub cache: bool,

    /// Request timeout, e.g. 500ms, 5s, 1m
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Expected response type: json, text, xml, html or a MIME type
    #[arg(long, value_name = "TYPE")]
    pub accept: Option<String>,

    /// Send cookies and store the ones the server sets
    #[arg(long)]
    pub with_credentials: bool,

    /// Keep the methods of custom actions defined under canonical names
    #[arg(long)]
    pub no_enforce_methods: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE", env = "RESOURCEFUL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output all errors as structured JSON to stderr
    #[arg(long, global = true, help = "Output errors in JSON format")]
    pub json_errors: bool,

    /// Increase logging verbosity
    #[arg(
        short = 'v',
        global = true,
        action = ArgAction::Count,
        help = "Increase logging verbosity (-v for debug, -vv for trace)"
    )]
    pub verbosity: u8,
}

impl Cli {
    /// Explicit parameters in command-line order, `None` when none were given.
    #[must_use]
    pub fn param_map(&self) -> Option<Map<String, Value>> {
        if self.params.is_empty() {
            return None;
        }
        Some(self.params.iter().cloned().collect())
    }

    /// The `--data` payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid JSON.
    pub fn payload(&self) -> anyhow::Result<Option<Value>> {
        self.data
            .as_deref()
            .map(|raw| serde_json::from_str(raw).context("--data is not valid JSON"))
            .transpose()
    }
}

fn parse_param(s: &str) -> anyhow::Result<(String, Value)> {
    let (name, raw) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("parameter name cannot be empty in '{s}'"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}

fn parse_header(s: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| anyhow!("expected 'Name: value', got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("header name cannot be empty in '{s}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
