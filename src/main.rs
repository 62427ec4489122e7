use clap::Parser;
use resourceful::cli::tracing_init::init_tracing;
use resourceful::cli::Cli;
use resourceful::config;
use resourceful::error::Error;
use resourceful::{ActionSpec, Args, CacheOption, Client, MemoryCache, RequestOptions, Resource};
use serde_json::Value;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;
    init_tracing(cli.verbosity);

    match run(cli).await {
        Ok(body) => print_body(&body),
        Err(e) => {
            print_error_with_json(&e, json_errors);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<Value, Error> {
    let settings = config::load_settings(cli.config.as_deref())?;
    let client = Client::with_reqwest()?
        .with_defaults(&settings.request_options()?)
        .with_default_cache(Arc::new(MemoryCache::new(settings.cache_config()?)));
    let client = Arc::new(client);

    let mut common = RequestOptions::new();
    for (name, value) in &cli.headers {
        common = common.header(name, value);
    }
    if let Some(accept) = &cli.accept {
        common = common.response_type(accept);
    }
    if let Some(timeout) = cli.timeout {
        common = common.timeout(timeout);
    }
    if cli.cache {
        common = common.cache(CacheOption::UseDefault);
    }
    if cli.with_credentials {
        common = common.with_credentials(true);
    }

    let mut builder = Resource::builder(&cli.url)
        .options(common)
        .enforce_canonical_methods(!cli.no_enforce_methods);
    if let Some(method) = cli.method {
        builder = builder.action(&cli.action, ActionSpec::new().method(method));
    }
    let resource = builder.build(&client);

    let payload = cli
        .payload()
        .map_err(|e| Error::invalid_arguments(format!("{e:#}")))?;
    resource
        .call(&cli.action, Args::Pair(cli.param_map(), payload))
        .await
}

fn print_body(body: &Value) {
    match body {
        Value::Null => {}
        Value::String(text) => println!("{text}"),
        other => match serde_json::to_string_pretty(other) {
            Ok(pretty) => println!("{pretty}"),
            Err(_) => println!("{other}"),
        },
    }
}

fn print_error_with_json(error: &Error, json_format: bool) {
    if json_format {
        if let Ok(json_output) = serde_json::to_string_pretty(&error.to_json()) {
            eprintln!("{json_output}");
            return;
        }
    }
    print_error(error);
}

/// Prints a user-friendly error message with a hint when one applies
fn print_error(error: &Error) {
    let json_error = error.to_json();
    eprintln!("Error ({}): {}", json_error.error_type, json_error.message);
    if let Some(context) = json_error.context {
        eprintln!("\nHint: {context}");
    }
}
