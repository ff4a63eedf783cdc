//! Error handling example.
//!
//! Demonstrates which errors the keychain storage facade surfaces and which
//! it absorbs by falling back.
//!
//! Run with: cargo run --example error_handling

use loginmux::backends::memory_keychain::MemoryKeychain;
use loginmux::backends::memory_logins::MemoryLoginStore;
use loginmux::{
    KeychainStorage, LoginInfo, LoginProperties, LoginStorage, LoginmuxError, NewLoginData,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> loginmux::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("loginmux=info"))
        .init();

    println!("=== Error Handling Example ===\n");

    // A keychain that refuses every write
    let mut keychain = MemoryKeychain::new();
    keychain.create_error = Some(LoginmuxError::PermissionDenied("keychain locked".to_string()));
    let fallback = Arc::new(MemoryLoginStore::new());
    let storage = KeychainStorage::new(Arc::new(keychain), fallback.clone());

    // Example 1: add absorbs keychain failures
    println!("1. Adding while the keychain is locked:");
    let login = LoginInfo::new_form("https://example.com", "", "alice", "pw");
    storage.add_login(&login).await?;
    println!("   ✓ stored in fallback store ({} login)", fallback.len().await);

    // Example 2: NotFound on modify
    println!("\n2. Modifying a login the keychain does not have:");
    match storage
        .modify_login(&login, &NewLoginData::Full(login.clone()))
        .await
    {
        Ok(_) => println!("   Modified"),
        Err(LoginmuxError::NotFound(hostname)) => {
            println!("   ✓ no login for '{}' (expected)", hostname);
        }
        Err(e) => println!("   Unexpected error: {}", e),
    }

    // Example 3: remove is a no-op when nothing matches
    println!("\n3. Removing a login that is not stored:");
    storage.remove_login(&login).await?;
    println!("   ✓ no error");

    // Example 4: malformed partial update
    println!("\n4. Unknown property in a partial update:");
    let other = MemoryLoginStore::new();
    other.add_login(&login).await?;
    let props = LoginProperties::new().set("colour", "blue");
    match other.modify_login(&login, &props.into()).await {
        Err(LoginmuxError::UnsupportedInputShape(msg)) => println!("   ✓ rejected: {}", msg),
        Err(e) => println!("   Unexpected error: {}", e),
        Ok(_) => println!("   Accepted"),
    }

    // Example 5: reserved operation
    println!("\n5. search_logins on the facade:");
    match storage.search_logins(&LoginProperties::new()).await {
        Err(e @ LoginmuxError::NotImplemented(_)) => println!("   ✓ {}", e),
        other => println!("   Unexpected result: {:?}", other.map(|v| v.len())),
    }

    // Example 6: error context from import
    println!("\n6. Importing into a locked keychain:");
    let summary = storage.import_from_fallback().await?;
    for err in &summary.failed {
        println!("   ✓ {}", err);
        println!("   → root cause: {}", err.root());
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
