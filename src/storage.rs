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

//! Flat-file persistence.
//!
//! Accounts and transactions are stored one record per line with `|` as the
//! field separator and no header row.
//!
//! # Account Format
//!
//! ```text
//! accountId|customerKind|customerName|age|contact|address|accountKind|balance|status|email
//! ACC001|REGULAR|Gideon Dakore|23|+233-559-372538|Bomso, Kumasi|SAVINGS|1000|Active|doe@example.com
//! ```
//!
//! # Transaction Format
//!
//! ```text
//! transactionId|accountId|kind|amount|balanceAfter|timestamp|transferDirection
//! TXN001|ACC001|Deposit|1000|1000|2025-01-02 03:04:05|NONE
//! ```
//!
//! Malformed lines are skipped and reported; they never abort a load.

use crate::account::{Account, AccountKind, AccountStatus};
use crate::bank::Bank;
use crate::base::{AccountId, TransactionId};
use crate::config::StorageConfig;
use crate::customer::CustomerKind;
use crate::error::LedgerError;
use crate::transaction::{Transaction, TransactionKind, TransferDirection};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const ACCOUNT_FIELDS: usize = 10;
const TRANSACTION_FIELDS: usize = 7;

/// Persisted form of an account and its customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_id: AccountId,
    pub customer_kind: CustomerKind,
    pub customer_name: String,
    pub age: u8,
    pub contact: String,
    pub address: String,
    pub account_kind: AccountKind,
    pub balance: Decimal,
    pub status: AccountStatus,
    pub email: String,
}

impl AccountRecord {
    pub fn from_account(account: &Account) -> Self {
        let customer = account.customer();
        let details = customer.details();
        let summary = account.summary();
        Self {
            account_id: account.id(),
            customer_kind: customer.kind(),
            customer_name: customer.name().to_string(),
            age: customer.age(),
            contact: details.contact,
            address: details.address,
            account_kind: account.kind(),
            balance: summary.balance,
            status: summary.status,
            email: details.email,
        }
    }
}

/// Transfer column; `NONE` when the record is not part of a transfer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum DirectionField {
    #[serde(rename = "TO")]
    To,
    #[serde(rename = "FROM")]
    From,
    #[serde(rename = "NONE")]
    None,
}

impl From<Option<TransferDirection>> for DirectionField {
    fn from(direction: Option<TransferDirection>) -> Self {
        match direction {
            Some(TransferDirection::To) => Self::To,
            Some(TransferDirection::From) => Self::From,
            None => Self::None,
        }
    }
}

impl From<DirectionField> for Option<TransferDirection> {
    fn from(field: DirectionField) -> Self {
        match field {
            DirectionField::To => Some(TransferDirection::To),
            DirectionField::From => Some(TransferDirection::From),
            DirectionField::None => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TransactionRow {
    id: TransactionId,
    account_id: AccountId,
    kind: TransactionKind,
    amount: Decimal,
    balance_after: Decimal,
    timestamp: String,
    transfer: DirectionField,
}

impl From<&Transaction> for TransactionRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id,
            account_id: tx.account_id,
            kind: tx.kind,
            amount: tx.amount,
            balance_after: tx.balance_after,
            timestamp: tx.timestamp.format(Transaction::TIMESTAMP_FORMAT).to_string(),
            transfer: tx.transfer.into(),
        }
    }
}

impl TransactionRow {
    fn into_transaction(self) -> Result<Transaction, String> {
        let timestamp = NaiveDateTime::parse_from_str(&self.timestamp, Transaction::TIMESTAMP_FORMAT)
            .map_err(|e| format!("bad timestamp '{}': {}", self.timestamp, e))?;
        Ok(Transaction {
            id: self.id,
            account_id: self.account_id,
            kind: self.kind,
            amount: self.amount,
            balance_after: self.balance_after,
            timestamp,
            transfer: self.transfer.into(),
        })
    }
}

/// Result of a load: decoded records plus one error per skipped line.
#[derive(Debug)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub skipped: Vec<LedgerError>,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Storage collaborator for accounts and transactions.
pub trait Persistence {
    fn load_accounts(&self) -> Result<Loaded<AccountRecord>, LedgerError>;
    fn load_transactions(&self) -> Result<Loaded<Transaction>, LedgerError>;
    /// Replaces stored accounts. Returns the number written.
    fn save_accounts(&self, accounts: &[AccountRecord]) -> Result<usize, LedgerError>;
    /// Replaces stored transactions. Returns the number written.
    fn save_transactions(&self, transactions: &[Arc<Transaction>]) -> Result<usize, LedgerError>;
}

/// [`Persistence`] backed by two text files in one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    accounts_path: PathBuf,
    transactions_path: PathBuf,
}

impl FileStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            accounts_path: config.data_dir.join(&config.accounts_file),
            transactions_path: config.data_dir.join(&config.transactions_file),
        }
    }

    pub fn accounts_path(&self) -> &Path {
        &self.accounts_path
    }

    pub fn transactions_path(&self) -> &Path {
        &self.transactions_path
    }

    fn open(path: &Path) -> Result<Option<BufReader<File>>, LedgerError> {
        if !path.exists() {
            info!(path = %path.display(), "no data file, starting empty");
            return Ok(None);
        }
        Ok(Some(BufReader::new(File::open(path)?)))
    }

    fn create(path: &Path) -> Result<BufWriter<File>, LedgerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(BufWriter::new(File::create(path)?))
    }
}

impl Persistence for FileStore {
    fn load_accounts(&self) -> Result<Loaded<AccountRecord>, LedgerError> {
        let Some(reader) = Self::open(&self.accounts_path)? else {
            return Ok(Loaded::default());
        };
        let loaded = read_accounts(reader)?;
        info!(
            loaded = loaded.records.len(),
            skipped = loaded.skipped.len(),
            path = %self.accounts_path.display(),
            "accounts loaded"
        );
        Ok(loaded)
    }

    fn load_transactions(&self) -> Result<Loaded<Transaction>, LedgerError> {
        let Some(reader) = Self::open(&self.transactions_path)? else {
            return Ok(Loaded::default());
        };
        let loaded = read_transactions(reader)?;
        info!(
            loaded = loaded.records.len(),
            skipped = loaded.skipped.len(),
            path = %self.transactions_path.display(),
            "transactions loaded"
        );
        Ok(loaded)
    }

    fn save_accounts(&self, accounts: &[AccountRecord]) -> Result<usize, LedgerError> {
        let written = write_accounts(Self::create(&self.accounts_path)?, accounts)?;
        info!(written, path = %self.accounts_path.display(), "accounts saved");
        Ok(written)
    }

    fn save_transactions(&self, transactions: &[Arc<Transaction>]) -> Result<usize, LedgerError> {
        let written = write_transactions(Self::create(&self.transactions_path)?, transactions)?;
        info!(written, path = %self.transactions_path.display(), "transactions saved");
        Ok(written)
    }
}

/// Decodes account lines from `reader`.
pub fn read_accounts<R: Read>(reader: R) -> Result<Loaded<AccountRecord>, LedgerError> {
    read_lines(reader, ACCOUNT_FIELDS, |record| decode::<AccountRecord>(record))
}

/// Decodes transaction lines from `reader`.
pub fn read_transactions<R: Read>(reader: R) -> Result<Loaded<Transaction>, LedgerError> {
    read_lines(reader, TRANSACTION_FIELDS, |record| {
        decode::<TransactionRow>(record)?.into_transaction()
    })
}

/// Encodes `accounts`, one per line.
pub fn write_accounts<W: Write>(writer: W, accounts: &[AccountRecord]) -> Result<usize, LedgerError> {
    let mut wtr = pipe_writer(writer);
    for account in accounts {
        wtr.serialize(account)?;
    }
    wtr.flush()?;
    Ok(accounts.len())
}

/// Encodes `transactions`, one per line.
pub fn write_transactions<W: Write>(
    writer: W,
    transactions: &[Arc<Transaction>],
) -> Result<usize, LedgerError> {
    let mut wtr = pipe_writer(writer);
    for tx in transactions {
        wtr.serialize(TransactionRow::from(tx.as_ref()))?;
    }
    wtr.flush()?;
    Ok(transactions.len())
}

/// Summary of [`load_bank`].
#[derive(Debug, Default)]
pub struct LoadReport {
    pub accounts: usize,
    pub transactions: usize,
    /// Malformed lines and records the bank refused.
    pub skipped: Vec<LedgerError>,
}

/// Builds a [`Bank`] from everything `store` holds.
pub fn load_bank(store: &dyn Persistence) -> Result<(Bank, LoadReport), LedgerError> {
    let bank = Bank::new();
    let accounts = store.load_accounts()?;
    let transactions = store.load_transactions()?;

    let mut report = LoadReport {
        skipped: accounts.skipped,
        ..LoadReport::default()
    };
    report.skipped.extend(transactions.skipped);

    let account_count = accounts.records.len();
    let rejected = bank.restore_accounts(accounts.records);
    report.accounts = account_count - rejected.len();
    report.skipped.extend(rejected);

    let transaction_count = transactions.records.len();
    let rejected = bank.restore_transactions(transactions.records);
    report.transactions = transaction_count - rejected.len();
    report.skipped.extend(rejected);

    Ok((bank, report))
}

/// Writes every account and transaction of `bank` to `store`.
pub fn save_bank(store: &dyn Persistence, bank: &Bank) -> Result<(usize, usize), LedgerError> {
    let accounts = store.save_accounts(&bank.account_records())?;
    let transactions = store.save_transactions(&bank.ledger().snapshot())?;
    Ok((accounts, transactions))
}

fn pipe_writer<W: Write>(writer: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .from_writer(writer)
}

fn decode<T: DeserializeOwned>(record: &StringRecord) -> Result<T, String> {
    record.deserialize(None).map_err(|e| match e.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
        _ => e.to_string(),
    })
}

fn read_lines<R, T, F>(reader: R, fields: usize, parse: F) -> Result<Loaded<T>, LedgerError>
where
    R: Read,
    F: Fn(&StringRecord) -> Result<T, String>,
{
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'|')
        .trim(Trim::All)
        .flexible(true)
        .has_headers(false)
        .from_reader(reader);

    let mut loaded = Loaded::default();
    for (index, result) in rdr.records().enumerate() {
        let fallback_line = index as u64 + 1;
        let outcome = match result {
            Ok(record) => {
                let line = record.position().map_or(fallback_line, |p| p.line());
                if record.len() != fields {
                    Err((line, format!("expected {} fields, found {}", fields, record.len())))
                } else {
                    parse(&record).map_err(|reason| (line, reason))
                }
            }
            // I/O failures are fatal; anything else is a bad line.
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                let line = e.position().map_or(fallback_line, |p| p.line());
                Err((line, e.to_string()))
            }
        };

        match outcome {
            Ok(value) => loaded.records.push(value),
            Err((line, reason)) => {
                warn!(line, %reason, "skipping malformed record");
                loaded.skipped.push(LedgerError::MalformedRecord { line, reason });
            }
        }
    }
    Ok(loaded)
}
