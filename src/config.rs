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

//! Runtime settings for the simulation and the file store.

use crate::error::LedgerError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding a fixed simulation seed.
pub const SEED_ENV: &str = "LEDGER_SEED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub workers: usize,
    pub operations_per_worker: usize,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    /// Upper bound of the random pause between operations.
    pub max_pause_ms: u64,
    pub timeout_secs: u64,
    /// Fixed seed for reproducible runs; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub const WORKER_RANGE: RangeInclusive<usize> = 1..=64;

    /// Defaults with `seed` taken from `LEDGER_SEED` when set.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidConfig`] if the variable is set but is not
    /// an unsigned integer.
    pub fn from_env() -> Result<Self, LedgerError> {
        let seed = match env::var(SEED_ENV) {
            Ok(value) => Some(value.trim().parse::<u64>().map_err(|e| {
                LedgerError::InvalidConfig(format!("{SEED_ENV} '{value}': {e}"))
            })?),
            Err(env::VarError::NotPresent) => None,
            Err(e) => return Err(LedgerError::InvalidConfig(format!("{SEED_ENV}: {e}"))),
        };
        Ok(Self {
            seed,
            ..Self::default()
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_pause(&self) -> Duration {
        Duration::from_millis(self.max_pause_ms)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if !Self::WORKER_RANGE.contains(&self.workers) {
            return Err(LedgerError::InvalidConfig(format!(
                "workers must be between {} and {}, got {}",
                Self::WORKER_RANGE.start(),
                Self::WORKER_RANGE.end(),
                self.workers
            )));
        }
        if self.min_amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidConfig(format!(
                "min_amount must be positive, got {}",
                self.min_amount
            )));
        }
        if self.max_amount < self.min_amount {
            return Err(LedgerError::InvalidConfig(format!(
                "max_amount {} is below min_amount {}",
                self.max_amount, self.min_amount
            )));
        }
        if self.timeout_secs == 0 {
            return Err(LedgerError::InvalidConfig("timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            operations_per_worker: 5,
            min_amount: dec!(10),
            max_amount: dec!(500),
            max_pause_ms: 100,
            timeout_secs: 30,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub accounts_file: String,
    pub transactions_file: String,
}

impl StorageConfig {
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        for (field, name) in [
            ("accounts_file", &self.accounts_file),
            ("transactions_file", &self.transactions_file),
        ] {
            if name.trim().is_empty() {
                return Err(LedgerError::InvalidConfig(format!("{field} must not be empty")));
            }
        }
        if self.accounts_file == self.transactions_file {
            return Err(LedgerError::InvalidConfig(format!(
                "accounts and transactions share the file '{}'",
                self.accounts_file
            )));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            accounts_file: "accounts.txt".into(),
            transactions_file: "transactions.txt".into(),
        }
    }
}
