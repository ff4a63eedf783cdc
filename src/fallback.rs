//! Tiered keychain lookup.
//!
//! Reads go through up to three tiers:
//!
//! 1. **Exact key**: the keychain query built from the full criteria.
//! 2. **Relaxed key**: for realm lookups only, the same query without the
//!    security domain. Some applications never write the realm, so entries
//!    with a blank security domain are accepted and reported under the
//!    requested realm.
//! 3. **Fallback store**: when the hostname is not representable or both
//!    keychain tiers came back empty.
//!
//! Tiers run strictly in order and the first non-empty answer wins; results
//! from the two stores are never merged. Mutations only use the exact key.

use crate::mapper;
use crate::native::{NativeQuery, NativeRecord};
use crate::{Config, Keychain, LoginInfo, LoginQuery, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Keychain tier that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Query with every criterion
    ExactKey,
    /// Query without the security domain
    RelaxedKey,
}

/// Why a request has to be answered by the fallback store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The hostname cannot be represented in the keychain
    UnsupportedHost,
    /// The keychain had no matching entry
    NoNativeMatch,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedHost => write!(f, "hostname not supported by the keychain"),
            Self::NoNativeMatch => write!(f, "no matching keychain entries"),
        }
    }
}

/// Outcome of a keychain read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeLookup {
    /// The keychain answered. `records` may only be empty when falling back
    /// on empty results is disabled.
    Found {
        /// Tier that produced the records
        tier: Tier,
        /// Matching entries, annotated for [`Tier::RelaxedKey`]
        records: Vec<NativeRecord>,
    },
    /// The fallback store must answer.
    Fallback(FallbackReason),
}

/// Decides which keychain query answers a request, and when to give up on
/// the keychain.
pub struct FallbackCoordinator {
    keychain: Arc<dyn Keychain>,
    label: String,
    relaxed_realm_lookup: bool,
    fallback_on_empty: bool,
}

impl FallbackCoordinator {
    /// Creates a coordinator over `keychain`.
    pub fn new(keychain: Arc<dyn Keychain>, config: &Config) -> Self {
        Self {
            keychain,
            label: config.keychain_label.clone(),
            relaxed_realm_lookup: config.relaxed_realm_lookup,
            fallback_on_empty: config.fallback_on_empty,
        }
    }

    /// Runs the read tiers for `query`.
    ///
    /// # Errors
    ///
    /// Keychain failures are returned unchanged; they never cause a fallback.
    pub async fn lookup(&self, query: &LoginQuery) -> Result<NativeLookup> {
        let Some(native_query) = mapper::query_for_search(query) else {
            return Ok(NativeLookup::Fallback(FallbackReason::UnsupportedHost));
        };

        let records = self.find(&native_query).await?;
        if !records.is_empty() {
            debug!(keychain = %self.label, count = records.len(), "exact key matched");
            return Ok(NativeLookup::Found {
                tier: Tier::ExactKey,
                records,
            });
        }

        if let Some(realm) = query.concrete_realm().filter(|_| self.relaxed_realm_lookup) {
            let records = self.find(&mapper::relax(&native_query)).await?;
            let records = annotate_realm(records, realm);

            if !records.is_empty() {
                info!(
                    keychain = %self.label,
                    count = records.len(),
                    realm,
                    "Found entries without a stored realm; reporting them under the requested realm"
                );
                return Ok(NativeLookup::Found {
                    tier: Tier::RelaxedKey,
                    records,
                });
            }
        }

        if self.fallback_on_empty {
            Ok(NativeLookup::Fallback(FallbackReason::NoNativeMatch))
        } else {
            Ok(NativeLookup::Found {
                tier: Tier::ExactKey,
                records: Vec::new(),
            })
        }
    }

    /// Finds the keychain entry a stored login lives in.
    ///
    /// Only the exact key is tried. Returns `Ok(None)` when nothing matches
    /// or when the hostname is not representable.
    pub async fn locate(&self, login: &LoginInfo) -> Result<Option<NativeRecord>> {
        let Some(native_query) = mapper::query_for_login(login) else {
            return Ok(None);
        };

        let mut records = self.find(&native_query).await?;
        if records.len() > 1 {
            debug!(count = records.len(), "several entries match; using the first");
        }

        Ok(if records.is_empty() {
            None
        } else {
            Some(records.swap_remove(0))
        })
    }

    async fn find(&self, query: &NativeQuery) -> Result<Vec<NativeRecord>> {
        debug!(keychain = %self.label, ?query, "querying keychain");
        self.keychain.find_records(query).await
    }
}

/// Keeps relaxed-key results that have no realm of their own and stamps
/// them with the requested one.
fn annotate_realm(records: Vec<NativeRecord>, realm: &str) -> Vec<NativeRecord> {
    records
        .into_iter()
        .filter(|record| record.key.security_domain().is_none())
        .map(|mut record| {
            record.key.security_domain = Some(realm.to_string());
            record
        })
        .collect()
}
