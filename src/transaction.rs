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

//! Transaction records.
//!
//! A [`Transaction`] is created exactly once per successful balance change and
//! never modified afterwards.

use crate::base::{AccountId, TransactionId};
use chrono::{NaiveDateTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 3] = [Self::Deposit, Self::Withdrawal, Self::Transfer];
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => f.write_str("Deposit"),
            Self::Withdrawal => f.write_str("Withdrawal"),
            Self::Transfer => f.write_str("Transfer"),
        }
    }
}

/// Side of a transfer a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferDirection {
    To,
    From,
}

/// A transaction before the ledger assigns its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub transfer: Option<TransferDirection>,
}

impl NewTransaction {
    pub fn deposit(account_id: AccountId, amount: Decimal, balance_after: Decimal) -> Self {
        Self {
            account_id,
            kind: TransactionKind::Deposit,
            amount,
            balance_after,
            transfer: None,
        }
    }

    pub fn withdrawal(account_id: AccountId, amount: Decimal, balance_after: Decimal) -> Self {
        Self {
            account_id,
            kind: TransactionKind::Withdrawal,
            amount,
            balance_after,
            transfer: None,
        }
    }
}

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub timestamp: NaiveDateTime,
    pub transfer: Option<TransferDirection>,
}

impl Transaction {
    /// Timestamp layout used when records are written to text.
    pub const TIMESTAMP_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

    /// Stamps `new` with `id` and the current time, truncated to seconds.
    pub fn new(id: TransactionId, new: NewTransaction) -> Self {
        let now = Utc::now().naive_utc();
        Self::at(id, new, now.with_nanosecond(0).unwrap_or(now))
    }

    pub fn at(id: TransactionId, new: NewTransaction, timestamp: NaiveDateTime) -> Self {
        Self {
            id,
            account_id: new.account_id,
            kind: new.kind,
            amount: new.amount,
            balance_after: new.balance_after,
            timestamp,
            transfer: new.transfer,
        }
    }

    /// Signed effect of this record on its account's balance.
    pub fn signed_amount(&self) -> Decimal {
        match (self.kind, self.transfer) {
            (TransactionKind::Deposit, _) => self.amount,
            (TransactionKind::Withdrawal, _) => -self.amount,
            (TransactionKind::Transfer, Some(TransferDirection::From)) => self.amount,
            (TransactionKind::Transfer, _) => -self.amount,
        }
    }
}
