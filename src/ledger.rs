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

//! Append-only transaction log.
//!
//! Identifier assignment and append happen under the same write lock, so
//! identifiers are strictly increasing in append order even when accounts are
//! operated on in parallel.

use crate::base::{AccountId, IdSequence, TransactionId};
use crate::error::LedgerError;
use crate::transaction::{NewTransaction, Transaction, TransactionKind};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Insertion-ordered log of completed balance changes.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Records in append order.
    entries: RwLock<Vec<Arc<Transaction>>>,
    /// Identifier lookup and duplicate detection for restored records.
    index: DashMap<TransactionId, Arc<Transaction>>,
    ids: IdSequence,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next identifier to `new` and appends it.
    pub fn record(&self, new: NewTransaction) -> Arc<Transaction> {
        let mut entries = self.entries.write();
        let id = TransactionId(self.ids.next());
        let transaction = Arc::new(Transaction::new(id, new));
        self.index.insert(id, Arc::clone(&transaction));
        entries.push(Arc::clone(&transaction));
        transaction
    }

    /// Appends a previously persisted record, keeping its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateTransaction`] if the identifier is
    /// already present.
    pub fn restore(&self, transaction: Transaction) -> Result<Arc<Transaction>, LedgerError> {
        let mut entries = self.entries.write();
        let id = transaction.id;
        match self.index.entry(id) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateTransaction(id)),
            Entry::Vacant(entry) => {
                let transaction = Arc::new(transaction);
                entry.insert(Arc::clone(&transaction));
                entries.push(Arc::clone(&transaction));
                self.ids.observe(id.number());
                Ok(transaction)
            }
        }
    }

    pub fn get(&self, id: &TransactionId) -> Option<Arc<Transaction>> {
        self.index.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of every record in append order.
    pub fn snapshot(&self) -> Vec<Arc<Transaction>> {
        self.entries.read().clone()
    }

    /// Records appended after the first `offset`.
    pub fn since(&self, offset: usize) -> Vec<Arc<Transaction>> {
        self.entries
            .read()
            .get(offset..)
            .map(<[_]>::to_vec)
            .unwrap_or_default()
    }

    /// Records for `account_id` in append order.
    pub fn transactions_for(&self, account_id: &AccountId) -> Vec<Arc<Transaction>> {
        self.filtered(|tx| tx.account_id == *account_id)
    }

    pub fn by_kind(&self, kind: TransactionKind) -> Vec<Arc<Transaction>> {
        self.filtered(|tx| tx.kind == kind)
    }

    /// Sum of the `balance_after` snapshots of `account_id`'s records of `kind`.
    ///
    /// This adds up post-operation balances, not amounts. See
    /// [`reporting::total_amount_by_kind`](crate::reporting::total_amount_by_kind)
    /// for the sum of amounts.
    pub fn total_by_kind(&self, account_id: &AccountId, kind: TransactionKind) -> Decimal {
        self.entries
            .read()
            .iter()
            .filter(|tx| tx.account_id == *account_id && tx.kind == kind)
            .map(|tx| tx.balance_after)
            .sum()
    }

    fn filtered(&self, predicate: impl Fn(&Transaction) -> bool) -> Vec<Arc<Transaction>> {
        self.entries
            .read()
            .iter()
            .filter(|tx| predicate(tx))
            .cloned()
            .collect()
    }
}
