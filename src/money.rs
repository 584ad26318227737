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

//! Amount validation.
//!
//! Balances are [`Decimal`], so they can never be NaN or infinite. Amounts
//! arriving as `f64` or text are checked here before they reach an account.

use crate::error::LedgerError;
use rust_decimal::Decimal;

/// Checks that `amount` is strictly positive.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount {
            amount: amount.to_string(),
        });
    }
    Ok(amount)
}

/// Converts a floating point amount, rejecting NaN, infinities and values
/// outside the `Decimal` range, then validates it.
pub fn amount_from_f64(amount: f64) -> Result<Decimal, LedgerError> {
    if !amount.is_finite() {
        return Err(LedgerError::InvalidAmount {
            amount: amount.to_string(),
        });
    }
    let value = Decimal::try_from(amount).map_err(|_| LedgerError::InvalidAmount {
        amount: amount.to_string(),
    })?;
    validate_amount(value)
}

/// Parses a textual amount such as `"125.50"`.
pub fn parse_amount(raw: &str) -> Result<Decimal, LedgerError> {
    let value = raw
        .trim()
        .parse::<Decimal>()
        .map_err(|_| LedgerError::InvalidAmount {
            amount: raw.to_string(),
        })?;
    validate_amount(value)
}

/// Adds `delta` to `balance`, treating overflow as an invalid amount.
pub(crate) fn checked_add(balance: Decimal, delta: Decimal) -> Result<Decimal, LedgerError> {
    balance
        .checked_add(delta)
        .ok_or_else(|| LedgerError::InvalidAmount {
            amount: delta.to_string(),
        })
}

/// Subtracts `delta` from `balance`, treating overflow as an invalid amount.
pub(crate) fn checked_sub(balance: Decimal, delta: Decimal) -> Result<Decimal, LedgerError> {
    balance
        .checked_sub(delta)
        .ok_or_else(|| LedgerError::InvalidAmount {
            amount: delta.to_string(),
        })
}
