//! Binary-level bootstrapping: the `tracing_subscriber` install and the
//! provider-to-credential-env-var mapping. Library crates only emit
//! events; this is the one place in the workspace that installs a global
//! subscriber.

use taskgraph_core::config::LoggingConfig;

pub fn init_tracing(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Environment variable the credential for `provider` is expected in,
/// absent an explicit `llm.api_key` in config.
pub fn credential_env_var(provider: &str) -> &'static str {
    match provider {
        "openai" => "OPENAI_API_KEY",
        "anthropic" => "ANTHROPIC_API_KEY",
        _ => "TASKGRAPH_API_KEY",
    }
}
