//! Account ledger for Skylift.
//!
//! The ledger is the external collaborator that holds player balances. The
//! [`Ledger`] trait is its contract: a balance read that never fails
//! (unknown users read 0.0, accounts are created implicitly), and atomic
//! debit/credit mutations that either fully apply or fail with no effect.
//!
//! [`InMemoryLedger`] is the reference implementation. A database-backed
//! ledger implements the same trait; the engine only sees the contract.
//!
//! All monetary values are kept at 2 decimal places; see [`round2`].

mod error;

use std::collections::HashMap;
use std::sync::Mutex;

pub use error::LedgerError;
use skylift_protocol::UserId;

/// Rounds a monetary value (or a coefficient) to 2 decimal places.
///
/// This is the single rounding rule for every value at rest: balances,
/// stakes, winnings, and crash points.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The account-store contract.
///
/// Implementations must make each mutation an atomic read-modify-write:
/// two concurrent `debit`/`credit` calls for the same user must serialize,
/// never losing an update.
pub trait Ledger: Send + Sync + 'static {
    /// Returns the user's balance. Unknown users have balance 0.0.
    fn balance(&self, user: UserId) -> f64;

    /// Adds `amount` to the user's balance, creating the account if
    /// needed. Returns the new balance.
    fn credit(&self, user: UserId, amount: f64) -> Result<f64, LedgerError>;

    /// Removes `amount` from the user's balance. Fails with
    /// [`LedgerError::InsufficientFunds`] if the balance would go
    /// negative, leaving it untouched. Returns the new balance.
    fn debit(&self, user: UserId, amount: f64) -> Result<f64, LedgerError>;
}

/// A process-local [`Ledger`] backed by a mutex-guarded map.
///
/// The mutex gives every mutation the required atomic read-modify-write;
/// the critical section is a map lookup plus an add, so contention is not
/// a concern at crash-game scale.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: Mutex<HashMap<UserId, f64>>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts that have ever been touched.
    pub fn account_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, f64>> {
        // Poisoning only happens if a holder panicked; the critical
        // sections below cannot panic.
        self.accounts.lock().expect("ledger lock poisoned")
    }
}

impl Ledger for InMemoryLedger {
    fn balance(&self, user: UserId) -> f64 {
        self.lock().get(&user).copied().unwrap_or(0.0)
    }

    fn credit(&self, user: UserId, amount: f64) -> Result<f64, LedgerError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let mut accounts = self.lock();
        let balance = accounts.entry(user).or_insert(0.0);
        *balance = round2(*balance + amount);
        tracing::debug!(%user, amount, balance = *balance, "credit applied");
        Ok(*balance)
    }

    fn debit(&self, user: UserId, amount: f64) -> Result<f64, LedgerError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let mut accounts = self.lock();
        let available = accounts.get(&user).copied().unwrap_or(0.0);
        if amount > available {
            return Err(LedgerError::InsufficientFunds {
                user,
                requested: amount,
                available,
            });
        }
        let balance = accounts.entry(user).or_insert(0.0);
        *balance = round2(*balance - amount);
        tracing::debug!(%user, amount, balance = *balance, "debit applied");
        Ok(*balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn uid(id: u64) -> UserId {
        UserId(id)
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(2.718), 2.72);
        assert_eq!(round2(39.999_999), 40.0);
        assert_eq!(round2(2.0), 2.0);
    }

    #[test]
    fn test_unknown_user_reads_zero() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.balance(uid(404)), 0.0);
        assert_eq!(ledger.account_count(), 0);
    }

    #[test]
    fn test_credit_creates_account() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.credit(uid(1), 100.0).unwrap(), 100.0);
        assert_eq!(ledger.balance(uid(1)), 100.0);
        assert_eq!(ledger.account_count(), 1);
    }

    #[test]
    fn test_debit_success_reduces_balance() {
        let ledger = InMemoryLedger::new();
        ledger.credit(uid(1), 100.0).unwrap();
        assert_eq!(ledger.debit(uid(1), 20.0).unwrap(), 80.0);
        assert_eq!(ledger.balance(uid(1)), 80.0);
    }

    #[test]
    fn test_debit_insufficient_leaves_balance_untouched() {
        let ledger = InMemoryLedger::new();
        ledger.credit(uid(1), 10.0).unwrap();

        let err = ledger.debit(uid(1), 10.01).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(ledger.balance(uid(1)), 10.0);
    }

    #[test]
    fn test_debit_unknown_user_is_insufficient() {
        let ledger = InMemoryLedger::new();
        let err = ledger.debit(uid(7), 1.0).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds { available, .. } if available == 0.0
        ));
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        let ledger = InMemoryLedger::new();
        assert!(matches!(ledger.credit(uid(1), 0.0), Err(LedgerError::InvalidAmount(_))));
        assert!(matches!(ledger.credit(uid(1), -5.0), Err(LedgerError::InvalidAmount(_))));
        assert!(matches!(ledger.debit(uid(1), f64::NAN), Err(LedgerError::InvalidAmount(_))));
        assert_eq!(ledger.balance(uid(1)), 0.0);
    }

    #[test]
    fn test_amounts_round_to_cents() {
        let ledger = InMemoryLedger::new();
        ledger.credit(uid(1), 0.1).unwrap();
        ledger.credit(uid(1), 0.2).unwrap();
        // 0.1 + 0.2 in f64 is 0.30000000000000004 without round2.
        assert_eq!(ledger.balance(uid(1)), 0.3);
    }

    #[test]
    fn test_concurrent_credits_lose_no_updates() {
        let ledger = Arc::new(InMemoryLedger::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = Arc::clone(&ledger);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    ledger.credit(uid(1), 1.0).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ledger.balance(uid(1)), 800.0);
    }
}
