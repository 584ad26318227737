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

//! # Bank Ledger
//!
//! In-memory bank ledger: customers, savings and checking accounts with
//! per-kind withdrawal rules, an append-only transaction log, a concurrent
//! workload runner and flat-file persistence.
//!
//! ## Core Components
//!
//! - [`Bank`]: Facade that opens accounts and records every balance change
//! - [`Account`]: Balance and status guarded by a per-account lock
//! - [`AccountPolicy`]: Savings floor or checking overdraft rules
//! - [`Ledger`]: Ordered log of [`Transaction`] records
//! - [`AccountRegistry`]: Accounts indexed by [`AccountId`]
//! - [`simulation::Simulation`]: Multi-threaded random workload with a
//!   post-run integrity check
//! - [`storage::FileStore`]: Pipe-delimited account and transaction files
//!
//! ## Example
//!
//! ```
//! use bank_ledger_rs::{AccountPolicy, Bank, ContactDetails, CustomerKind, LedgerError, NewCustomer};
//! use rust_decimal_macros::dec;
//!
//! let bank = Bank::new();
//! let customer = bank
//!     .register_customer(NewCustomer {
//!         name: "Gideon Dakore".into(),
//!         age: 23,
//!         kind: CustomerKind::Regular,
//!         details: ContactDetails {
//!             contact: "+233-559-372538".into(),
//!             address: "Bomso, Kumasi".into(),
//!             email: "gideon@example.com".into(),
//!         },
//!     })
//!     .unwrap();
//!
//! let account = bank
//!     .open_account(customer, AccountPolicy::savings(), dec!(1000))
//!     .unwrap();
//!
//! // The savings floor of 500 rejects this one.
//! let rejected = bank.withdraw(&account.id(), dec!(600));
//! assert!(matches!(rejected, Err(LedgerError::InsufficientFunds { .. })));
//!
//! bank.withdraw(&account.id(), dec!(400)).unwrap();
//! assert_eq!(account.balance(), dec!(600));
//! assert_eq!(bank.ledger().len(), 2);
//! ```
//!
//! ## Thread Safety
//!
//! Operations on one account are serialized by that account's lock; operations
//! on different accounts run in parallel. The ledger assigns identifiers in
//! append order.

pub mod account;
mod bank;
mod base;
pub mod config;
mod customer;
pub mod error;
mod ledger;
pub mod money;
mod registry;
pub mod reporting;
pub mod simulation;
pub mod storage;
mod transaction;

pub use account::{
    Account, AccountKind, AccountPolicy, AccountStatus, AccountSummary, CheckingPolicy,
    SavingsPolicy,
};
pub use bank::{Bank, minimum_initial_deposit};
pub use base::{AccountId, CustomerId, IdSequence, TransactionId};
pub use config::{SimulationConfig, StorageConfig};
pub use customer::{ContactDetails, Customer, CustomerKind, NewCustomer};
pub use error::LedgerError;
pub use ledger::Ledger;
pub use registry::AccountRegistry;
pub use simulation::{Simulation, SimulationReport};
pub use storage::{AccountRecord, FileStore, Persistence};
pub use transaction::{NewTransaction, Transaction, TransactionKind, TransferDirection};
