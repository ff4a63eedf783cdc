//! Environment-based configuration example.
//!
//! Demonstrates how to configure the keychain storage facade using
//! environment variables.
//!
//! Run with: cargo run --example environment_config
//!
//! Environment variables:
//! - LOGINMUX_RELAXED_REALM: retry realm lookups without the realm (true/false)
//! - LOGINMUX_FALLBACK_ON_EMPTY: ask the fallback store on no match (true/false)
//! - LOGINMUX_KEYCHAIN_LABEL: label used for the keychain in logs
//! - RUST_LOG: log filter (default: loginmux=info)

use loginmux::backends::memory_keychain::MemoryKeychain;
use loginmux::backends::memory_logins::MemoryLoginStore;
use loginmux::{Config, KeychainStorage, LoginInfo, LoginQuery, LoginStorage, LoginmuxError};
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn flag_from_env(name: &str, default: bool) -> loginmux::Result<bool> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => match value.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(LoginmuxError::Other(anyhow::anyhow!(
                "Invalid value for {}: {}. Valid options: true, false",
                name,
                value
            ))),
        },
    }
}

fn build_config() -> loginmux::Result<Config> {
    let mut config = Config::new()
        .with_relaxed_realm_lookup(flag_from_env("LOGINMUX_RELAXED_REALM", true)?)
        .with_fallback_on_empty(flag_from_env("LOGINMUX_FALLBACK_ON_EMPTY", true)?);

    if let Ok(label) = env::var("LOGINMUX_KEYCHAIN_LABEL") {
        config = config.with_keychain_label(label);
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> loginmux::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("loginmux=info")),
        )
        .init();

    println!("=== Environment Configuration Example ===\n");

    let config = build_config()?;
    println!("Configuration:");
    println!("  relaxed realm lookup: {}", config.relaxed_realm_lookup);
    println!("  fallback on empty:    {}", config.fallback_on_empty);
    println!("  keychain label:       {}", config.keychain_label);

    let fallback = Arc::new(MemoryLoginStore::new());
    fallback
        .insert(LoginInfo::new_form("https://example.com", "", "legacy", "pw"))
        .await;

    let storage =
        KeychainStorage::with_config(Arc::new(MemoryKeychain::new()), fallback, config);
    storage.init().await?;

    let found = storage
        .find_logins(&LoginQuery::new("https://example.com", Some(""), None))
        .await?;

    println!("\nLookup for https://example.com:");
    if found.is_empty() {
        println!("  ✓ no logins (fallback store not consulted)");
    } else {
        for login in found {
            println!("  ✓ {} (from fallback store)", login.username);
        }
    }

    println!("\nTry: LOGINMUX_FALLBACK_ON_EMPTY=false cargo run --example environment_config");
    Ok(())
}
