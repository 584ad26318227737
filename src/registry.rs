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

//! Account registry.
//!
//! Keeps accounts in registration order alongside a [`DashMap`] index for
//! O(1) lookup. Both are updated while the ordered list's write lock is held,
//! so they always agree. Accounts are never removed.

use crate::account::Account;
use crate::base::{AccountId, IdSequence};
use crate::error::LedgerError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct AccountRegistry {
    /// Accounts in registration order.
    accounts: RwLock<Vec<Arc<Account>>>,
    /// Accounts indexed by account ID.
    index: DashMap<AccountId, Arc<Account>>,
    ids: IdSequence,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues an identifier for an account about to be registered.
    pub fn next_account_id(&self) -> AccountId {
        AccountId(self.ids.next())
    }

    /// Adds `account`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateAccount`] if its identifier is taken.
    pub fn register(&self, account: Account) -> Result<Arc<Account>, LedgerError> {
        let mut accounts = self.accounts.write();
        let id = account.id();
        match self.index.entry(id) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateAccount(id)),
            Entry::Vacant(entry) => {
                let account = Arc::new(account);
                entry.insert(Arc::clone(&account));
                accounts.push(Arc::clone(&account));
                // Restored accounts carry their own numbers.
                self.ids.observe(id.number());
                Ok(account)
            }
        }
    }

    /// Looks up an account. Absence is an ordinary outcome, not an error.
    pub fn find(&self, id: &AccountId) -> Option<Arc<Account>> {
        self.index.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Copy of the account list in registration order.
    pub fn accounts(&self) -> Vec<Arc<Account>> {
        self.accounts.read().clone()
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }

    /// Sum of all balances.
    ///
    /// Iterates a copy of the account list and reads each balance on its own,
    /// so concurrent operations may land between reads.
    pub fn total_balance(&self) -> Decimal {
        self.accounts()
            .iter()
            .map(|account| account.balance())
            .sum()
    }
}
