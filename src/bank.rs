// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Bank facade.
//!
//! The [`Bank`] ties the [`AccountRegistry`] and the [`Ledger`] together:
//! it finds the account, runs the operation under the account's own lock,
//! then appends the matching record to the ledger.
//!
//! # Account Opening
//!
//! | Customer | Account | Minimum initial deposit |
//! |----------|---------|-------------------------|
//! | Regular | Savings | 500 |
//! | Regular | Checking | 0 |
//! | Premium | any | 10 000 |
//!
//! These are gates at opening time only. Afterwards only the savings
//! minimum balance applies, and only to withdrawals.
//!
//! # Thread Safety
//!
//! Operations on different accounts run fully in parallel. The ledger is the
//! only shared point they pass through.

use crate::account::{Account, AccountKind, AccountPolicy};
use crate::base::{AccountId, CustomerId, IdSequence};
use crate::customer::{ContactDetails, Customer, CustomerKind, NewCustomer};
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::registry::AccountRegistry;
use crate::storage::AccountRecord;
use crate::transaction::{NewTransaction, Transaction};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{debug, warn};

/// Minimum deposit required to open an account of `account` kind for a
/// customer of `customer` kind.
pub fn minimum_initial_deposit(customer: CustomerKind, account: AccountKind) -> Decimal {
    match (customer, account) {
        (CustomerKind::Premium, _) => dec!(10000),
        (CustomerKind::Regular, AccountKind::Savings) => dec!(500),
        (CustomerKind::Regular, AccountKind::Checking) => Decimal::ZERO,
    }
}

#[derive(Debug, Default)]
pub struct Bank {
    registry: AccountRegistry,
    ledger: Ledger,
    customer_ids: IdSequence,
}

impl Bank {
    /// Creates a bank with no customers, accounts or transactions.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Validates and creates a customer with the next customer identifier.
    pub fn register_customer(&self, new: NewCustomer) -> Result<Arc<Customer>, LedgerError> {
        let id = CustomerId(self.customer_ids.next());
        Customer::new(id, new).map(Arc::new)
    }

    /// Opens an account for `customer`, enforcing the opening table above.
    ///
    /// A positive `initial_deposit` is applied and recorded as the first
    /// deposit.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `initial_deposit` is negative.
    /// - [`LedgerError::InitialDepositTooLow`] if it is below the minimum.
    pub fn open_account(
        &self,
        customer: Arc<Customer>,
        policy: AccountPolicy,
        initial_deposit: Decimal,
    ) -> Result<Arc<Account>, LedgerError> {
        if initial_deposit < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount {
                amount: initial_deposit.to_string(),
            });
        }
        let required = minimum_initial_deposit(customer.kind(), policy.kind());
        if initial_deposit < required {
            return Err(LedgerError::InitialDepositTooLow {
                required,
                provided: initial_deposit,
            });
        }

        let id = self.registry.next_account_id();
        let account = self.registry.register(Account::new(id, customer, policy))?;
        if initial_deposit > Decimal::ZERO {
            self.deposit_to(&account, initial_deposit)?;
        }
        debug!(account = %id, kind = %policy.kind(), %initial_deposit, "account opened");
        Ok(account)
    }

    pub fn find(&self, id: &AccountId) -> Option<Arc<Account>> {
        self.registry.find(id)
    }

    /// Like [`find`](Self::find) but absence is an error.
    pub fn account(&self, id: &AccountId) -> Result<Arc<Account>, LedgerError> {
        self.registry
            .find(id)
            .ok_or(LedgerError::AccountNotFound(*id))
    }

    /// Deposits into the account with identifier `id` and records it.
    pub fn deposit(&self, id: &AccountId, amount: Decimal) -> Result<Arc<Transaction>, LedgerError> {
        let account = self.account(id)?;
        self.deposit_to(&account, amount)
    }

    /// Withdraws from the account with identifier `id` and records it.
    pub fn withdraw(&self, id: &AccountId, amount: Decimal) -> Result<Arc<Transaction>, LedgerError> {
        let account = self.account(id)?;
        self.withdraw_from(&account, amount)
    }

    /// Deposits into an account already in hand and records it.
    pub fn deposit_to(&self, account: &Account, amount: Decimal) -> Result<Arc<Transaction>, LedgerError> {
        let balance = account.deposit(amount)?;
        Ok(self
            .ledger
            .record(NewTransaction::deposit(account.id(), amount, balance)))
    }

    /// Withdraws from an account already in hand and records it.
    pub fn withdraw_from(&self, account: &Account, amount: Decimal) -> Result<Arc<Transaction>, LedgerError> {
        let balance = account.withdraw(amount)?;
        Ok(self
            .ledger
            .record(NewTransaction::withdrawal(account.id(), amount, balance)))
    }

    /// Sum of all account balances.
    pub fn total_balance(&self) -> Decimal {
        self.registry.total_balance()
    }

    /// Flattens every account into its persisted form.
    pub fn account_records(&self) -> Vec<AccountRecord> {
        self.registry
            .accounts()
            .iter()
            .map(|account| AccountRecord::from_account(account))
            .collect()
    }

    /// Rebuilds one persisted account under its stored identifier.
    ///
    /// The customer gets a fresh identifier. Balance and status are taken as
    /// stored; the opening table is not applied.
    pub fn restore_account(&self, record: AccountRecord) -> Result<Arc<Account>, LedgerError> {
        let customer = self.register_customer(NewCustomer {
            name: record.customer_name,
            age: record.age,
            kind: record.customer_kind,
            details: ContactDetails {
                contact: record.contact,
                address: record.address,
                email: record.email,
            },
        })?;
        let account = Account::restore(
            record.account_id,
            customer,
            AccountPolicy::for_kind(record.account_kind),
            record.balance,
            record.status,
        );
        self.registry.register(account)
    }

    /// Restores every record it can and returns the ones it rejected.
    pub fn restore_accounts(&self, records: impl IntoIterator<Item = AccountRecord>) -> Vec<LedgerError> {
        let mut rejected = Vec::new();
        for record in records {
            let id = record.account_id;
            if let Err(e) = self.restore_account(record) {
                warn!(account = %id, error = %e, "skipping persisted account");
                rejected.push(e);
            }
        }
        rejected
    }

    /// Restores ledger records, keeping their identifiers. Returns rejects.
    pub fn restore_transactions(
        &self,
        transactions: impl IntoIterator<Item = Transaction>,
    ) -> Vec<LedgerError> {
        let mut rejected = Vec::new();
        for transaction in transactions {
            let id = transaction.id;
            if let Err(e) = self.ledger.restore(transaction) {
                warn!(transaction = %id, error = %e, "skipping persisted transaction");
                rejected.push(e);
            }
        }
        rejected
    }
}
