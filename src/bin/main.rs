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

use anyhow::{Context, Result, bail};
use bank_ledger_rs::simulation::{Simulation, SimulationReport};
use bank_ledger_rs::storage::{self, LoadReport};
use bank_ledger_rs::{
    AccountPolicy, Bank, ContactDetails, CustomerKind, FileStore, NewCustomer, SimulationConfig,
    StorageConfig, money,
};
use clap::{Parser, Subcommand};
use csv::Writer;
use rust_decimal::Decimal;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Bank Ledger - Concurrent account simulation and flat-file storage
///
/// Diagnostics go to stderr and are filtered with `RUST_LOG`.
#[derive(Parser, Debug)]
#[command(name = "bank-ledger")]
#[command(about = "An in-memory bank ledger with a concurrent workload runner", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run random deposits and withdrawals from many threads and print a report
    Simulate {
        /// Accounts to open when the data directory holds none
        #[arg(long, default_value_t = 5)]
        accounts: usize,

        /// Worker threads (1 to 64)
        #[arg(long, default_value_t = 10)]
        workers: usize,

        /// Operations issued by each worker
        #[arg(long, default_value_t = 5)]
        operations: usize,

        /// Fixed RNG seed; falls back to LEDGER_SEED
        #[arg(long)]
        seed: Option<u64>,

        /// Seconds to wait for the workers
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,

        /// Deposit used to open each seeded account
        #[arg(long, default_value = "1000", value_parser = parse_money)]
        initial_deposit: Decimal,

        /// Load accounts from and save them back to this directory
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },
    /// Print stored accounts as CSV
    ///
    /// Columns: account,customer,kind,balance,status
    Report {
        #[arg(long, value_name = "DIR")]
        data_dir: PathBuf,
    },
}

fn parse_money(raw: &str) -> Result<Decimal, String> {
    money::parse_amount(raw).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bank_ledger_rs=info".into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    match Args::parse().command {
        Command::Simulate {
            accounts,
            workers,
            operations,
            seed,
            timeout_secs,
            initial_deposit,
            data_dir,
        } => {
            let env = SimulationConfig::from_env()?;
            let config = SimulationConfig {
                workers,
                operations_per_worker: operations,
                timeout_secs,
                seed: seed.or(env.seed),
                ..env
            };
            let simulation = Simulation::new(config).context("invalid simulation settings")?;

            let store = data_dir.map(|dir| FileStore::new(&StorageConfig::in_dir(dir)));
            let bank = prepare_bank(store.as_ref(), accounts, initial_deposit)?;

            let bank = Arc::new(bank);
            let report = simulation.run(Arc::clone(&bank));
            write_report(&report, std::io::stdout().lock())?;

            if let Some(store) = &store {
                let (accounts, transactions) = storage::save_bank(store, &bank)
                    .with_context(|| format!("saving to {}", store.accounts_path().display()))?;
                info!(accounts, transactions, "ledger saved");
            }
            if !report.is_consistent() {
                bail!("{} account(s) failed the integrity check", report.violations.len());
            }
        }
        Command::Report { data_dir } => {
            let store = FileStore::new(&StorageConfig::in_dir(&data_dir));
            if !store.accounts_path().exists() {
                bail!("no accounts file in '{}'", data_dir.display());
            }
            let bank = load(&store)?;
            write_accounts(&bank, std::io::stdout()).context("writing accounts")?;
        }
    }
    Ok(())
}

fn load(store: &FileStore) -> Result<Bank> {
    let (bank, LoadReport { accounts, transactions, skipped }) = storage::load_bank(store)
        .with_context(|| format!("loading from {}", store.accounts_path().display()))?;
    for error in &skipped {
        warn!(%error, "record not loaded");
    }
    info!(accounts, transactions, skipped = skipped.len(), "ledger loaded");
    Ok(bank)
}

/// Loads whatever `store` holds and seeds fresh accounts only when no account
/// was loaded. A missing file loads as empty.
fn prepare_bank(
    store: Option<&FileStore>,
    accounts: usize,
    initial_deposit: Decimal,
) -> Result<Bank> {
    let bank = match store {
        Some(store) => load(store)?,
        None => Bank::new(),
    };
    if bank.registry().is_empty() {
        seed_accounts(&bank, accounts, initial_deposit)?;
    }
    Ok(bank)
}

/// Opens `count` accounts for regular customers, alternating savings and
/// checking.
fn seed_accounts(bank: &Bank, count: usize, initial_deposit: Decimal) -> Result<()> {
    for n in 1..=count {
        let customer = bank.register_customer(NewCustomer {
            name: format!("Customer {n}"),
            age: 30,
            kind: CustomerKind::Regular,
            details: ContactDetails {
                contact: format!("+233-555-{n:06}"),
                address: "Accra, Ghana".into(),
                email: format!("customer{n}@example.com"),
            },
        })?;
        let policy = if n % 2 == 1 {
            AccountPolicy::savings()
        } else {
            AccountPolicy::checking()
        };
        bank.open_account(customer, policy, initial_deposit)
            .with_context(|| format!("opening account {n}"))?;
    }
    Ok(())
}

/// Writes a plain-text summary of `report`.
fn write_report<W: Write>(report: &SimulationReport, mut out: W) -> std::io::Result<()> {
    writeln!(out, "workers:            {}", report.workers)?;
    writeln!(out, "attempted:          {}", report.attempted)?;
    writeln!(out, "succeeded:          {}", report.succeeded)?;
    writeln!(out, "invalid amount:     {}", report.failures.invalid_amount)?;
    writeln!(out, "insufficient funds: {}", report.failures.insufficient_funds)?;
    writeln!(out, "overdraft exceeded: {}", report.failures.overdraft_exceeded)?;
    writeln!(out, "other failures:     {}", report.failures.other)?;
    writeln!(out, "records written:    {}", report.records_written)?;
    writeln!(out, "completed:          {}", report.completed)?;
    writeln!(out, "elapsed:            {:.3}s", report.elapsed.as_secs_f64())?;
    writeln!(out, "violations:         {}", report.violations.len())?;
    for violation in &report.violations {
        writeln!(
            out,
            "  {} expected {} found {}",
            violation.account_id, violation.expected, violation.actual
        )?;
    }
    Ok(())
}

/// Write account states to a CSV writer
///
/// Outputs accounts in registration order with 4 decimal precision.
///
/// # CSV Format
///
/// ```csv
/// account,customer,kind,balance,status
/// ACC001,Customer 1,SAVINGS,1000,Active
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_accounts<W: Write>(bank: &Bank, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for account in bank.registry().accounts() {
        wtr.serialize(account.as_ref())?;
    }
    wtr.flush()?;
    Ok(())
}
