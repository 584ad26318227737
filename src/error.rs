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

//! Error types for ledger operations.

use crate::base::{AccountId, TransactionId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Ledger errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Amount is zero, negative, or not a finite number
    #[error("invalid amount {amount} (must be a positive, finite number)")]
    InvalidAmount { amount: String },

    /// Savings withdrawal would breach the minimum balance
    #[error(
        "insufficient funds in {account}: balance {balance}, requested {requested}, minimum balance {minimum}"
    )]
    InsufficientFunds {
        account: AccountId,
        balance: Decimal,
        requested: Decimal,
        minimum: Decimal,
    },

    /// Checking withdrawal would breach the overdraft limit
    #[error(
        "overdraft limit exceeded for {account}: balance {balance}, requested {requested}, limit {limit}"
    )]
    OverdraftExceeded {
        account: AccountId,
        balance: Decimal,
        requested: Decimal,
        limit: Decimal,
    },

    /// No account with this identifier
    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    /// Account identifier registered twice
    #[error("account {0} is already registered")]
    DuplicateAccount(AccountId),

    /// Transaction identifier restored twice
    #[error("duplicate transaction ID {0}")]
    DuplicateTransaction(TransactionId),

    /// Persisted record could not be decoded
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// Customer details failed validation
    #[error("invalid customer {field}: {reason}")]
    InvalidCustomer { field: &'static str, reason: String },

    /// Opening deposit is below the policy minimum
    #[error("initial deposit {provided} is below the required minimum {required}")]
    InitialDepositTooLow { required: Decimal, provided: Decimal },

    /// Configuration value out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Underlying file or encoding failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Whether this is one of the errors an account operation raises for a
    /// well-formed request that its policy refuses.
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. } | Self::InsufficientFunds { .. } | Self::OverdraftExceeded { .. }
        )
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<csv::Error> for LedgerError {
    fn from(err: csv::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
