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

//! Concurrent workload integration tests.

use bank_ledger_rs::{
    Account, AccountPolicy, Bank, ContactDetails, CustomerKind, NewCustomer, Simulation,
    SimulationConfig, reporting,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn bank(accounts: usize) -> Arc<Bank> {
    let bank = Bank::new();
    for n in 0..accounts {
        let customer = bank
            .register_customer(NewCustomer {
                name: format!("Worker Test {n}"),
                age: 45,
                kind: CustomerKind::Regular,
                details: ContactDetails {
                    contact: format!("+233-20-{n:04}"),
                    address: "Cape Coast".into(),
                    email: format!("w{n}@example.com"),
                },
            })
            .unwrap();
        let policy = if n % 2 == 0 {
            AccountPolicy::savings()
        } else {
            AccountPolicy::checking()
        };
        bank.open_account(customer, policy, dec!(600)).unwrap();
    }
    Arc::new(bank)
}

#[test]
fn ten_workers_with_fixed_seed() {
    let bank = bank(4);
    let ledger_before = bank.ledger().len();
    let config = SimulationConfig {
        workers: 10,
        operations_per_worker: 50,
        max_pause_ms: 1,
        seed: Some(2024),
        ..SimulationConfig::default()
    };

    let report = Simulation::new(config).unwrap().run(Arc::clone(&bank));

    assert!(report.completed);
    assert!(report.is_consistent(), "violations: {:?}", report.violations);
    assert_eq!(report.attempted, 500);
    assert_eq!(report.succeeded + report.failures.total(), 500);
    assert_eq!(report.failures.other, 0);
    assert_eq!(bank.ledger().len() - ledger_before, report.succeeded);

    for account in bank.registry().accounts() {
        match account.policy() {
            AccountPolicy::Savings(policy) => assert!(account.balance() >= policy.minimum_balance),
            AccountPolicy::Checking(policy) => {
                assert!(account.balance() >= -policy.overdraft_limit)
            }
        }
    }
}

#[test]
fn ledger_replays_to_final_balances() {
    let bank = bank(3);
    let config = SimulationConfig {
        workers: 6,
        operations_per_worker: 40,
        max_pause_ms: 0,
        seed: Some(99),
        ..SimulationConfig::default()
    };
    Simulation::new(config).unwrap().run(Arc::clone(&bank));

    for account in bank.registry().accounts() {
        let replayed: Decimal = bank
            .ledger()
            .transactions_for(&account.id())
            .iter()
            .map(|tx| tx.signed_amount())
            .sum();
        assert_eq!(replayed, account.balance());
    }

    let records = bank.ledger().snapshot();
    let ids: Vec<u64> = records.iter().map(|tx| tx.id.number()).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(
        reporting::total_balance(&bank.registry().accounts()),
        bank.total_balance()
    );
}

#[test]
fn amounts_have_two_decimal_places() {
    let bank = bank(2);
    let config = SimulationConfig {
        workers: 2,
        operations_per_worker: 25,
        max_pause_ms: 0,
        min_amount: dec!(0.5),
        max_amount: dec!(3.5),
        seed: Some(5),
        ..SimulationConfig::default()
    };
    let before = bank.ledger().len();
    Simulation::new(config).unwrap().run(Arc::clone(&bank));

    for tx in bank.ledger().since(before) {
        assert!(tx.amount >= dec!(0.5) && tx.amount <= dec!(3.5));
        assert!(tx.amount.scale() <= 2);
    }
}

#[test]
fn fees_on_aged_checking_account_reconcile() {
    let bank = Bank::new();
    let customer = bank
        .register_customer(NewCustomer {
            name: "Efua Mensah".into(),
            age: 52,
            kind: CustomerKind::Regular,
            details: ContactDetails {
                contact: "+233-24-5550".into(),
                address: "Takoradi".into(),
                email: "efua@example.com".into(),
            },
        })
        .unwrap();
    let id = bank.registry().next_account_id();
    let opened = Utc::now() - Duration::days(45);
    let account = bank
        .registry()
        .register(Account::open_at(id, customer, AccountPolicy::checking(), opened))
        .unwrap();
    bank.deposit_to(&account, dec!(800)).unwrap();
    let bank = Arc::new(bank);

    let config = SimulationConfig {
        workers: 4,
        operations_per_worker: 50,
        max_pause_ms: 0,
        seed: Some(31),
        ..SimulationConfig::default()
    };
    let report = Simulation::new(config).unwrap().run(Arc::clone(&bank));

    assert!(report.completed);
    assert!(report.is_consistent(), "violations: {:?}", report.violations);
    assert!(account.fees_charged() > Decimal::ZERO);
    assert_eq!(account.fees_charged() % dec!(10), Decimal::ZERO);
}
