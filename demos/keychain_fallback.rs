//! Keychain-first storage example.
//!
//! Shows which store answers each request: network logins land in the
//! keychain, internal pages in the fallback store, and HTTP-auth entries
//! written by other applications without a realm are still found.
//!
//! Run with: RUST_LOG=loginmux=debug cargo run --example keychain_fallback

use loginmux::backends::memory_keychain::MemoryKeychain;
use loginmux::backends::memory_logins::MemoryLoginStore;
use loginmux::{
    KeychainStorage, LoginInfo, LoginProperties, LoginQuery, LoginStorage, NativeKey, Protocol,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> loginmux::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("loginmux=info")),
        )
        .init();

    println!("=== Keychain Fallback Example ===\n");

    let keychain = Arc::new(MemoryKeychain::new());
    let fallback = Arc::new(MemoryLoginStore::new());
    let storage = KeychainStorage::new(keychain.clone(), fallback.clone());
    storage.init().await?;

    // 1. Network origin: stored in the keychain
    println!("1. Adding a form login for https://example.com");
    let site = LoginInfo::new_form("https://example.com", "https://example.com", "alice", "pw")
        .with_fields("user", "pass");
    storage.add_login(&site).await?;
    println!("   ✓ keychain entries: {}", keychain.len().await);

    // 2. Internal page: the keychain refuses, the fallback store takes it
    println!("\n2. Adding a login for chrome://app");
    storage
        .add_login(&LoginInfo::new_form("chrome://app", "", "alice", "pw"))
        .await?;
    println!("   ✓ fallback logins: {}", fallback.len().await);

    // 3. Entry written by another application, without a realm
    println!("\n3. Finding a realm-less entry written by another application");
    keychain
        .insert(
            NativeKey {
                account_name: Some("bob".to_string()),
                protocol: Some(Protocol::Http),
                server_name: Some("intranet.example".to_string()),
                security_domain: Some(String::new()),
                ..Default::default()
            },
            "hunter2",
        )
        .await;

    let query = LoginQuery::http_auth("http://intranet.example", "Members");
    for login in storage.find_logins(&query).await? {
        println!(
            "   ✓ {} in realm {:?} for user {}",
            login.hostname, login.http_realm, login.username
        );
    }

    // 4. Partial update keeps every other field
    println!("\n4. Rotating the password of the example.com login");
    let props = LoginProperties::new().set("password", "rotated");
    storage.modify_login(&site, &props.into()).await?;

    let found = storage
        .find_logins(&LoginQuery::new("https://example.com", Some(""), None))
        .await?;
    println!("   ✓ {} login(s), username still {}", found.len(), found[0].username);

    // 5. Enumeration only covers the keychain
    println!("\n5. Enumerating");
    println!("   keychain view: {} login(s)", storage.get_all_logins().await?.len());
    println!("   fallback store: {} login(s)", fallback.len().await);

    println!("\n=== Example Complete ===");
    Ok(())
}
