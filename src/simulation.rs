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

//! Concurrent workload runner.
//!
//! Spawns worker threads that issue random deposits and withdrawals against
//! the accounts registered in a [`Bank`], waits for them up to a deadline and
//! then reconciles every balance against the ledger records written during the
//! run.
//!
//! # Concurrency Model
//!
//! - One OS thread per worker, sharing the bank through an [`Arc`].
//! - Each operation locks only its target account; the ledger serializes
//!   identifier assignment on its own.
//! - Completion is signalled over a crossbeam channel. On timeout a shared
//!   cancel flag is raised and workers stop at their next check, so the final
//!   join is bounded by a single operation plus one pause.

use crate::account::Account;
use crate::bank::Bank;
use crate::base::AccountId;
use crate::config::SimulationConfig;
use crate::error::LedgerError;
use crossbeam::channel::{self, RecvTimeoutError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Failed operations grouped by cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FailureCounts {
    pub invalid_amount: usize,
    pub insufficient_funds: usize,
    pub overdraft_exceeded: usize,
    pub other: usize,
}

impl FailureCounts {
    fn record(&mut self, error: &LedgerError) {
        match error {
            LedgerError::InvalidAmount { .. } => self.invalid_amount += 1,
            LedgerError::InsufficientFunds { .. } => self.insufficient_funds += 1,
            LedgerError::OverdraftExceeded { .. } => self.overdraft_exceeded += 1,
            _ => self.other += 1,
        }
    }

    fn merge(&mut self, other: &FailureCounts) {
        self.invalid_amount += other.invalid_amount;
        self.insufficient_funds += other.insufficient_funds;
        self.overdraft_exceeded += other.overdraft_exceeded;
        self.other += other.other;
    }

    pub fn total(&self) -> usize {
        self.invalid_amount + self.insufficient_funds + self.overdraft_exceeded + self.other
    }
}

/// Account whose final balance does not match its recorded history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityViolation {
    pub account_id: AccountId,
    pub expected: Decimal,
    pub actual: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub workers: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: FailureCounts,
    pub elapsed: Duration,
    /// `false` if the deadline passed or a worker panicked.
    pub completed: bool,
    pub violations: Vec<IntegrityViolation>,
    /// Ledger records appended while the simulation ran.
    pub records_written: usize,
}

impl SimulationReport {
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Default)]
struct WorkerStats {
    attempted: usize,
    succeeded: usize,
    failures: FailureCounts,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Deposit,
    Withdrawal,
}

#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    /// Amount range in hundredths.
    cents: RangeInclusive<i64>,
}

impl Simulation {
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidConfig`] if `config` does not validate or
    /// its amount range holds no whole cent.
    pub fn new(config: SimulationConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        let to_cents = |amount: Decimal, round_up: bool| {
            let scaled = amount * Decimal::ONE_HUNDRED;
            let scaled = if round_up { scaled.ceil() } else { scaled.floor() };
            scaled
                .to_i64()
                .ok_or_else(|| LedgerError::InvalidConfig(format!("amount {amount} is out of range")))
        };
        let low = to_cents(config.min_amount, true)?;
        let high = to_cents(config.max_amount, false)?;
        if high < low {
            return Err(LedgerError::InvalidConfig(format!(
                "amount range {}..={} holds no whole cent",
                config.min_amount, config.max_amount
            )));
        }
        Ok(Self {
            config,
            cents: low..=high,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Runs the workload against every account currently registered in `bank`.
    pub fn run(&self, bank: Arc<Bank>) -> SimulationReport {
        let accounts = Arc::new(bank.registry().accounts());
        let before: HashMap<AccountId, (Decimal, Decimal)> = accounts
            .iter()
            .map(|account| (account.id(), account.balance_and_fees()))
            .collect();
        let offset = bank.ledger().len();

        let workers = self.config.workers;
        let base_seed = self.config.seed;
        info!(
            workers,
            operations = self.config.operations_per_worker,
            accounts = accounts.len(),
            seed = ?base_seed,
            "simulation started"
        );

        let started = Instant::now();
        let cancel = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = channel::bounded::<usize>(workers);

        let handles: Vec<_> = (0..workers)
            .map(|index| {
                let worker = Worker {
                    index,
                    bank: Arc::clone(&bank),
                    accounts: Arc::clone(&accounts),
                    cancel: Arc::clone(&cancel),
                    rng: worker_rng(base_seed, index),
                    operations: self.config.operations_per_worker,
                    cents: self.cents.clone(),
                    max_pause_ms: self.config.max_pause_ms,
                };
                let done = done_tx.clone();
                thread::spawn(move || {
                    let stats = worker.run();
                    // The receiver may have given up already.
                    let _ = done.send(index);
                    stats
                })
            })
            .collect();
        drop(done_tx);

        let deadline = started + self.config.timeout();
        let mut finished = 0;
        let mut completed = true;
        while finished < workers {
            match done_rx.recv_deadline(deadline) {
                Ok(_) => finished += 1,
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        finished,
                        workers,
                        timeout_secs = self.config.timeout_secs,
                        "simulation timed out, cancelling workers"
                    );
                    cancel.store(true, Ordering::SeqCst);
                    completed = false;
                    break;
                }
                // Every sender is gone, so a worker died before reporting.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let mut report = SimulationReport {
            workers,
            attempted: 0,
            succeeded: 0,
            failures: FailureCounts::default(),
            elapsed: Duration::ZERO,
            completed,
            violations: Vec::new(),
            records_written: 0,
        };
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(stats) => {
                    report.attempted += stats.attempted;
                    report.succeeded += stats.succeeded;
                    report.failures.merge(&stats.failures);
                }
                Err(_) => {
                    error!(worker = index, "worker panicked");
                    report.completed = false;
                }
            }
        }
        report.elapsed = started.elapsed();
        report.records_written = bank.ledger().len().saturating_sub(offset);
        report.violations = reconcile(&bank, &accounts, &before, offset);

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failures.total(),
            records = report.records_written,
            violations = report.violations.len(),
            completed = report.completed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "simulation finished"
        );
        report
    }
}

/// Independent stream per worker; seeded runs are reproducible per worker.
fn worker_rng(seed: Option<u64>, index: usize) -> StdRng {
    match seed {
        Some(seed) => {
            let stream = (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            StdRng::seed_from_u64(seed ^ stream)
        }
        None => StdRng::from_os_rng(),
    }
}

struct Worker {
    index: usize,
    bank: Arc<Bank>,
    accounts: Arc<Vec<Arc<Account>>>,
    cancel: Arc<AtomicBool>,
    rng: StdRng,
    operations: usize,
    cents: RangeInclusive<i64>,
    max_pause_ms: u64,
}

impl Worker {
    fn run(mut self) -> WorkerStats {
        let mut stats = WorkerStats::default();
        if self.accounts.is_empty() {
            return stats;
        }
        for _ in 0..self.operations {
            if self.cancel.load(Ordering::SeqCst) {
                debug!(worker = self.index, "worker cancelled");
                break;
            }
            let account = &self.accounts[self.rng.random_range(0..self.accounts.len())];
            let amount = Decimal::new(self.rng.random_range(self.cents.clone()), 2);
            let operation = if self.rng.random_bool(0.5) {
                Operation::Deposit
            } else {
                Operation::Withdrawal
            };

            stats.attempted += 1;
            let result = match operation {
                Operation::Deposit => self.bank.deposit_to(account, amount),
                Operation::Withdrawal => self.bank.withdraw_from(account, amount),
            };
            match result {
                Ok(_) => stats.succeeded += 1,
                Err(e) => {
                    debug!(
                        worker = self.index,
                        account = %account.id(),
                        ?operation,
                        %amount,
                        error = %e,
                        "operation rejected"
                    );
                    stats.failures.record(&e);
                }
            }

            if self.max_pause_ms > 0 {
                thread::sleep(Duration::from_millis(self.rng.random_range(0..=self.max_pause_ms)));
            }
        }
        stats
    }
}

/// Checks `final = initial + recorded deltas - fees charged` for each account.
fn reconcile(
    bank: &Bank,
    accounts: &[Arc<Account>],
    before: &HashMap<AccountId, (Decimal, Decimal)>,
    offset: usize,
) -> Vec<IntegrityViolation> {
    let mut deltas: HashMap<AccountId, Decimal> = HashMap::new();
    for tx in bank.ledger().since(offset) {
        *deltas.entry(tx.account_id).or_default() += tx.signed_amount();
    }

    accounts
        .iter()
        .filter_map(|account| {
            let (initial, fees_before) = before.get(&account.id()).copied()?;
            let (actual, fees_after) = account.balance_and_fees();
            let delta = deltas.get(&account.id()).copied().unwrap_or_default();
            let expected = initial + delta - (fees_after - fees_before);
            if actual == expected {
                None
            } else {
                warn!(account = %account.id(), %expected, %actual, "balance does not reconcile");
                Some(IntegrityViolation {
                    account_id: account.id(),
                    expected,
                    actual,
                })
            }
        })
        .collect()
}
