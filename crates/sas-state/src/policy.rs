//! # Ticketing Policy Coordinator
//!
//! Owns the persisted [`TicketingPolicy`]: expiration defaults set by the
//! host and the restricted pool ID with the expiration currently in force
//! for restricted credits.
//!
//! ## Pool and Expiration Resolution
//!
//! When a restricted ticket is redeemed, the incoming pool ID and expiration
//! are reconciled with what is stored:
//!
//! | Restricted balance | Pool ID   | Outcome                                    |
//! |--------------------|-----------|--------------------------------------------|
//! | zero               | any       | incoming pool and expiration replace stored |
//! | non-zero           | different | conflict; the transfer is refused           |
//! | non-zero           | same      | expirations merged (below)                  |
//!
//! Merging keeps the newer of two values of the same shape: the larger day
//! count or the later date. A date never displaces a day count while the
//! balance is non-zero. An incoming default (zero on the wire) never
//! clears anything; it resolves to the stored or configured value.
//!
//! Pool ID and expiration are one record, so they persist together.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use sas_core::{Cents, ConfigurationProvider, Expiration, PoolId};
use sas_store::{
    load_optional_record, PersistedRecord, PersistentStore, SaveReceipt, StorageError, WriteQueue,
};

use crate::error::PolicyError;

/// Persisted ticketing policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketingPolicy {
    /// Expiration in days printed on cashable tickets.
    pub cashable_expiration_days: u16,
    /// Expiration in days applied to restricted credits when none is given.
    pub default_restricted_expiration_days: u16,
    /// Restricted pool currently holding credits.
    pub pool_id: PoolId,
    /// Restricted expiration in force.
    pub restricted_combined_expiration: Expiration,
}

impl PersistedRecord for TicketingPolicy {
    const KEY: &'static str = "sas.ticketing.policy";
}

/// The pool and expiration in force after a resolution.
#[derive(Debug)]
pub struct PolicyResolution {
    /// Effective pool ID.
    pub pool_id: PoolId,
    /// Effective restricted expiration.
    pub expiration: Expiration,
    /// Persistence of the change; `None` when nothing changed.
    pub receipt: Option<SaveReceipt>,
}

/// Coordinator for the persisted ticketing policy.
#[derive(Debug)]
pub struct TicketingPolicyCoordinator {
    policy: Mutex<TicketingPolicy>,
    writer: WriteQueue<TicketingPolicy>,
}

impl TicketingPolicyCoordinator {
    /// Load the policy, seeding expiration defaults from configuration on
    /// first boot.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn load(
        store: Arc<dyn PersistentStore>,
        config: &dyn ConfigurationProvider,
    ) -> Result<Self, StorageError> {
        let policy = match load_optional_record::<TicketingPolicy>(store.as_ref())? {
            Some(policy) => policy,
            None => {
                tracing::debug!("no stored ticketing policy, seeding from configuration");
                TicketingPolicy {
                    cashable_expiration_days: config.cashable_expiration_days(),
                    default_restricted_expiration_days: config
                        .default_restricted_expiration_days(),
                    ..TicketingPolicy::default()
                }
            }
        };
        Ok(Self {
            policy: Mutex::new(policy),
            writer: WriteQueue::spawn(store)?,
        })
    }

    /// The policy in force.
    pub fn current(&self) -> TicketingPolicy {
        *self.policy.lock()
    }

    /// Reconcile an incoming restricted pool and expiration with the
    /// stored ones.
    pub fn resolve_pool_and_expiration(
        &self,
        incoming_pool: PoolId,
        incoming_expiration: Expiration,
        restricted_balance: Cents,
    ) -> Result<PolicyResolution, PolicyError> {
        let mut policy = self.policy.lock();
        let default_days = Expiration::Days(policy.default_restricted_expiration_days);

        let expiration = if restricted_balance.is_zero() {
            match incoming_expiration {
                Expiration::Default => default_days,
                other => other,
            }
        } else {
            if incoming_pool != policy.pool_id {
                tracing::warn!(
                    stored = %policy.pool_id,
                    incoming = %incoming_pool,
                    balance = %restricted_balance,
                    "restricted pool conflict"
                );
                return Err(PolicyError::PoolMismatch {
                    stored: policy.pool_id,
                    incoming: incoming_pool,
                });
            }
            let stored = match policy.restricted_combined_expiration {
                Expiration::Default => default_days,
                other => other,
            };
            merge_expiration(stored, incoming_expiration)
        };

        let changed =
            policy.pool_id != incoming_pool || policy.restricted_combined_expiration != expiration;
        let receipt = if changed {
            policy.pool_id = incoming_pool;
            policy.restricted_combined_expiration = expiration;
            tracing::info!(
                pool_id = %incoming_pool,
                expiration = %expiration,
                "restricted pool policy updated"
            );
            Some(self.writer.enqueue(*policy))
        } else {
            None
        };

        Ok(PolicyResolution {
            pool_id: incoming_pool,
            expiration,
            receipt,
        })
    }

    /// Apply host-set expiration defaults. `None` or zero leaves a value
    /// unchanged.
    pub fn set_expirations(
        &self,
        cashable_days: Option<u16>,
        restricted_default_days: Option<u16>,
    ) -> Option<SaveReceipt> {
        let mut policy = self.policy.lock();
        let before = *policy;
        if let Some(days) = cashable_days.filter(|d| *d != 0) {
            policy.cashable_expiration_days = days;
        }
        if let Some(days) = restricted_default_days.filter(|d| *d != 0) {
            policy.default_restricted_expiration_days = days;
        }
        if *policy == before {
            return None;
        }
        tracing::info!(
            cashable_days = policy.cashable_expiration_days,
            restricted_days = policy.default_restricted_expiration_days,
            "ticket expirations updated"
        );
        Some(self.writer.enqueue(*policy))
    }

    /// Queue the current policy behind any pending writes.
    pub fn flush(&self) -> SaveReceipt {
        self.writer.enqueue(*self.policy.lock())
    }
}

/// Merge an incoming expiration into the stored one for a matching pool.
fn merge_expiration(stored: Expiration, incoming: Expiration) -> Expiration {
    match (stored, incoming) {
        (_, Expiration::Default) => stored,
        (Expiration::Days(s), Expiration::Days(i)) => Expiration::Days(s.max(i)),
        (Expiration::Date(s), Expiration::Date(i)) => Expiration::Date(s.max(i)),
        (Expiration::Days(_), Expiration::Date(_)) => stored,
        (Expiration::Date(_), Expiration::Days(_)) => incoming,
        (Expiration::Default, other) => other,
    }
}
