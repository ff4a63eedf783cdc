//! Loginmux - Login-manager storage backed by the platform keychain.
//!
//! Loginmux implements the storage contract a browser-style login manager
//! expects ([`LoginStorage`]) on top of a native keychain ([`Keychain`]).
//! Logins the keychain cannot hold, or cannot find, are handed to a
//! fallback store of the same shape as the facade itself.
//!
//! # Features
//!
//! - **Keychain first**: network-origin logins live in the platform keychain
//! - **Transparent fallback**: internal pages and foreign entries keep working
//! - **Realm recovery**: finds HTTP-auth entries other applications wrote without a realm
//! - **Async/Await**: built on `async-trait` and tokio, strictly sequential per call
//! - **Error Context**: rich error types with chaining
//! - **Test Doubles**: in-memory stores with error injection (feature `mock`)
//!
//! # Quick Start
//!
//! ```
//! use loginmux::backends::memory_keychain::MemoryKeychain;
//! use loginmux::backends::memory_logins::MemoryLoginStore;
//! use loginmux::{Config, KeychainStorage, LoginInfo, LoginQuery, LoginStorage};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> loginmux::Result<()> {
//!     let storage = KeychainStorage::with_config(
//!         Arc::new(MemoryKeychain::new()),
//!         Arc::new(MemoryLoginStore::new()),
//!         Config::new().with_keychain_label("login-keychain"),
//!     );
//!     storage.init().await?;
//!
//!     let login = LoginInfo::new_http_auth("http://example.com", "Members", "bob", "pw");
//!     storage.add_login(&login).await?;
//!
//!     let query = LoginQuery::http_auth("http://example.com", "Members");
//!     assert_eq!(storage.count_logins(&query).await?, 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! | Feature | Default | Provides |
//! |---------|---------|----------|
//! | `mock` | yes | [`backends::memory_keychain`] and [`backends::memory_logins`] |

pub mod error;
pub mod matching;
pub mod login;
pub mod native;
pub mod classifier;
pub mod mapper;
pub mod keychain;
pub mod storage;
pub mod config;
pub mod fallback;
pub mod facade;
pub mod validation;
pub mod backends;

pub use config::Config;
pub use error::{LoginmuxError, Result};
pub use facade::{ImportSummary, KeychainStorage};
pub use keychain::Keychain;
pub use login::{LoginInfo, LoginProperties, LoginQuery, NewLoginData};
pub use matching::FieldMatch;
pub use native::{AuthType, NativeKey, NativeQuery, NativeRecord, Protocol, RecordHandle};
pub use storage::LoginStorage;
