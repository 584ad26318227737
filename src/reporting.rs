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

//! Read-only aggregates over accounts and transactions.
//!
//! Every function reads each balance once, so results stay internally
//! consistent even while other threads keep operating on the accounts.

use crate::account::{Account, AccountKind};
use crate::base::AccountId;
use crate::transaction::{Transaction, TransactionKind};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Count, sum, extremes and mean of a set of amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub count: usize,
    pub sum: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    pub average: Decimal,
}

impl Statistics {
    /// `None` when there are no values.
    fn of(values: &[Decimal]) -> Option<Self> {
        let min = values.iter().copied().min()?;
        let max = values.iter().copied().max()?;
        let sum: Decimal = values.iter().sum();
        let count = values.len();
        Some(Self {
            count,
            sum,
            min,
            max,
            average: sum / Decimal::from(count),
        })
    }
}

fn with_balances(accounts: &[Arc<Account>]) -> Vec<(Arc<Account>, Decimal)> {
    accounts
        .iter()
        .map(|account| (Arc::clone(account), account.balance()))
        .collect()
}

pub fn total_balance(accounts: &[Arc<Account>]) -> Decimal {
    accounts.iter().map(|account| account.balance()).sum()
}

/// `None` for an empty slice.
pub fn balance_statistics(accounts: &[Arc<Account>]) -> Option<Statistics> {
    let balances: Vec<Decimal> = accounts.iter().map(|account| account.balance()).collect();
    Statistics::of(&balances)
}

/// Mean balance, zero when there are no accounts.
pub fn average_balance(accounts: &[Arc<Account>]) -> Decimal {
    balance_statistics(accounts).map_or(Decimal::ZERO, |stats| stats.average)
}

/// Account numbers in input order.
pub fn account_ids(accounts: &[Arc<Account>]) -> Vec<AccountId> {
    accounts.iter().map(|account| account.id()).collect()
}

pub fn filter_by_kind(accounts: &[Arc<Account>], kind: AccountKind) -> Vec<Arc<Account>> {
    accounts
        .iter()
        .filter(|account| account.kind() == kind)
        .cloned()
        .collect()
}

pub fn filter_by_min_balance(accounts: &[Arc<Account>], min: Decimal) -> Vec<Arc<Account>> {
    accounts
        .iter()
        .filter(|account| account.balance() >= min)
        .cloned()
        .collect()
}

pub fn group_by_kind(accounts: &[Arc<Account>]) -> BTreeMap<AccountKind, Vec<Arc<Account>>> {
    let mut groups: BTreeMap<AccountKind, Vec<Arc<Account>>> = BTreeMap::new();
    for account in accounts {
        groups.entry(account.kind()).or_default().push(Arc::clone(account));
    }
    groups
}

/// First account holding the highest balance.
pub fn highest_balance(accounts: &[Arc<Account>]) -> Option<Arc<Account>> {
    with_balances(accounts)
        .into_iter()
        .reduce(|best, next| if next.1 > best.1 { next } else { best })
        .map(|(account, _)| account)
}

/// First account holding the lowest balance.
pub fn lowest_balance(accounts: &[Arc<Account>]) -> Option<Arc<Account>> {
    with_balances(accounts)
        .into_iter()
        .reduce(|best, next| if next.1 < best.1 { next } else { best })
        .map(|(account, _)| account)
}

/// Accounts ordered by balance; equal balances keep their input order.
pub fn sort_by_balance(accounts: &[Arc<Account>], descending: bool) -> Vec<Arc<Account>> {
    let mut pairs = with_balances(accounts);
    if descending {
        pairs.sort_by(|a, b| b.1.cmp(&a.1));
    } else {
        pairs.sort_by(|a, b| a.1.cmp(&b.1));
    }
    pairs.into_iter().map(|(account, _)| account).collect()
}

pub fn sort_by_customer_name(accounts: &[Arc<Account>]) -> Vec<Arc<Account>> {
    let mut sorted = accounts.to_vec();
    sorted.sort_by(|a, b| a.customer().name().cmp(b.customer().name()));
    sorted
}

/// Sum of amounts of every record of `kind`.
pub fn total_amount_by_kind(transactions: &[Arc<Transaction>], kind: TransactionKind) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.kind == kind)
        .map(|tx| tx.amount)
        .sum()
}

/// Statistics over record amounts, `None` when there are no records.
pub fn transaction_statistics(transactions: &[Arc<Transaction>]) -> Option<Statistics> {
    let amounts: Vec<Decimal> = transactions.iter().map(|tx| tx.amount).collect();
    Statistics::of(&amounts)
}

/// Records ordered by amount; equal amounts keep their input order.
pub fn sort_transactions_by_amount(
    transactions: &[Arc<Transaction>],
    descending: bool,
) -> Vec<Arc<Transaction>> {
    let mut sorted = transactions.to_vec();
    if descending {
        sorted.sort_by(|a, b| b.amount.cmp(&a.amount));
    } else {
        sorted.sort_by(|a, b| a.amount.cmp(&b.amount));
    }
    sorted
}

/// Records ordered by timestamp; records from the same second keep their
/// input order.
pub fn sort_transactions_by_timestamp(
    transactions: &[Arc<Transaction>],
    descending: bool,
) -> Vec<Arc<Transaction>> {
    let mut sorted = transactions.to_vec();
    if descending {
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    } else {
        sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    }
    sorted
}

/// Record count per kind; kinds with no records are present with zero.
pub fn count_by_kind(transactions: &[Arc<Transaction>]) -> BTreeMap<TransactionKind, usize> {
    let mut counts: BTreeMap<TransactionKind, usize> =
        TransactionKind::ALL.iter().map(|kind| (*kind, 0)).collect();
    for tx in transactions {
        *counts.entry(tx.kind).or_default() += 1;
    }
    counts
}

/// Interest each savings account would earn on its current balance.
pub fn interest_projection(accounts: &[Arc<Account>]) -> Vec<(Arc<Account>, Decimal)> {
    accounts
        .iter()
        .filter_map(|account| {
            account
                .calculate_interest()
                .map(|interest| (Arc::clone(account), interest))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountPolicy;
    use crate::base::{CustomerId, TransactionId};
    use chrono::NaiveDate;
    use crate::customer::{ContactDetails, Customer, CustomerKind, NewCustomer};
    use crate::transaction::NewTransaction;
    use rust_decimal_macros::dec;

    fn account(id: u64, name: &str, policy: AccountPolicy, balance: Decimal) -> Arc<Account> {
        let customer = Customer::new(
            CustomerId(id),
            NewCustomer {
                name: name.into(),
                age: 30,
                kind: CustomerKind::Regular,
                details: ContactDetails {
                    contact: "+233-000".into(),
                    address: "Accra".into(),
                    email: "x@example.com".into(),
                },
            },
        )
        .unwrap();
        let account = Account::new(AccountId(id), Arc::new(customer), policy);
        if balance > Decimal::ZERO {
            account.deposit(balance).unwrap();
        }
        Arc::new(account)
    }

    fn sample() -> Vec<Arc<Account>> {
        vec![
            account(1, "Yaw", AccountPolicy::savings(), dec!(1000)),
            account(2, "Ama", AccountPolicy::checking(), dec!(250)),
            account(3, "Kofi", AccountPolicy::savings(), dec!(4000)),
        ]
    }

    fn ids(accounts: &[Arc<Account>]) -> Vec<u64> {
        account_ids(accounts).into_iter().map(|id| id.0).collect()
    }

    fn records(amounts: &[(Decimal, u32)]) -> Vec<Arc<Transaction>> {
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        amounts
            .iter()
            .enumerate()
            .map(|(i, (amount, hour))| {
                let new = NewTransaction::deposit(AccountId(1), *amount, *amount);
                let at = day.and_hms_opt(*hour, 0, 0).unwrap();
                Arc::new(Transaction::at(TransactionId(i as u64 + 1), new, at))
            })
            .collect()
    }

    fn tx_ids(records: &[Arc<Transaction>]) -> Vec<u64> {
        records.iter().map(|tx| tx.id.0).collect()
    }

    #[test]
    fn statistics_over_balances() {
        let stats = balance_statistics(&sample()).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.sum, dec!(5250));
        assert_eq!(stats.min, dec!(250));
        assert_eq!(stats.max, dec!(4000));
        assert_eq!(stats.average, dec!(1750));
        assert_eq!(total_balance(&sample()), dec!(5250));
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(balance_statistics(&[]), None);
        assert_eq!(average_balance(&[]), Decimal::ZERO);
        assert!(highest_balance(&[]).is_none());
        assert!(group_by_kind(&[]).is_empty());
    }

    #[test]
    fn extremes_and_sorting() {
        let accounts = sample();
        assert_eq!(highest_balance(&accounts).unwrap().id(), AccountId(3));
        assert_eq!(lowest_balance(&accounts).unwrap().id(), AccountId(2));
        assert_eq!(ids(&sort_by_balance(&accounts, false)), vec![2, 1, 3]);
        assert_eq!(ids(&sort_by_balance(&accounts, true)), vec![3, 1, 2]);
        assert_eq!(ids(&sort_by_customer_name(&accounts)), vec![2, 3, 1]);
    }

    #[test]
    fn grouping_and_filtering() {
        let accounts = sample();
        let groups = group_by_kind(&accounts);
        assert_eq!(ids(&groups[&AccountKind::Savings]), vec![1, 3]);
        assert_eq!(ids(&groups[&AccountKind::Checking]), vec![2]);
        assert_eq!(ids(&filter_by_kind(&accounts, AccountKind::Checking)), vec![2]);
        assert_eq!(ids(&filter_by_min_balance(&accounts, dec!(1000))), vec![1, 3]);
    }

    #[test]
    fn amount_sums_and_counts() {
        let records: Vec<Arc<Transaction>> = [
            NewTransaction::deposit(AccountId(1), dec!(100), dec!(100)),
            NewTransaction::deposit(AccountId(1), dec!(200), dec!(300)),
            NewTransaction::withdrawal(AccountId(1), dec!(50), dec!(250)),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, new)| Arc::new(Transaction::new(TransactionId(i as u64 + 1), new)))
        .collect();

        assert_eq!(total_amount_by_kind(&records, TransactionKind::Deposit), dec!(300));
        assert_eq!(total_amount_by_kind(&records, TransactionKind::Withdrawal), dec!(50));
        assert_eq!(total_amount_by_kind(&records, TransactionKind::Transfer), Decimal::ZERO);

        let counts = count_by_kind(&records);
        assert_eq!(counts[&TransactionKind::Deposit], 2);
        assert_eq!(counts[&TransactionKind::Withdrawal], 1);
        assert_eq!(counts[&TransactionKind::Transfer], 0);
    }

    #[test]
    fn statistics_over_amounts() {
        let records = records(&[(dec!(100), 9), (dec!(25.50), 8), (dec!(300), 10)]);
        let stats = transaction_statistics(&records).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.sum, dec!(425.50));
        assert_eq!(stats.min, dec!(25.50));
        assert_eq!(stats.max, dec!(300));
        assert_eq!(stats.average.round_dp(4), dec!(141.8333));
        assert_eq!(transaction_statistics(&[]), None);
    }

    #[test]
    fn transactions_sorted_by_amount_and_time() {
        let records = records(&[(dec!(100), 9), (dec!(25.50), 11), (dec!(300), 8), (dec!(100), 7)]);
        assert_eq!(tx_ids(&sort_transactions_by_amount(&records, false)), vec![2, 1, 4, 3]);
        assert_eq!(tx_ids(&sort_transactions_by_amount(&records, true)), vec![3, 1, 4, 2]);
        assert_eq!(tx_ids(&sort_transactions_by_timestamp(&records, false)), vec![4, 3, 1, 2]);
        assert_eq!(tx_ids(&sort_transactions_by_timestamp(&records, true)), vec![2, 1, 3, 4]);
        assert!(sort_transactions_by_amount(&[], true).is_empty());
    }

    #[test]
    fn account_numbers_in_input_order() {
        let accounts = sample();
        assert_eq!(
            account_ids(&accounts),
            vec![AccountId(1), AccountId(2), AccountId(3)]
        );
        assert_eq!(account_ids(&sort_by_balance(&accounts, true))[0], AccountId(3));
    }

    #[test]
    fn interest_only_for_savings() {
        let projection = interest_projection(&sample());
        let pairs: Vec<(u64, Decimal)> = projection.iter().map(|(a, i)| (a.id().0, *i)).collect();
        assert_eq!(pairs, vec![(1, dec!(35.000)), (3, dec!(140.000))]);
    }
}
