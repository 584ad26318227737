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

//! Account management.
//!
//! An [`Account`] owns its balance behind its own mutex. Every
//! read-check-write sequence (fee, limit check, mutation) runs inside that
//! critical section, so two operations on one account never interleave while
//! operations on different accounts never contend.
//!
//! Withdrawal rules depend on the [`AccountPolicy`]:
//!
//! - **Savings**: the balance may not drop below the minimum balance.
//! - **Checking**: a monthly fee is charged first once 30 days have passed,
//!   then the balance may go negative down to the overdraft limit. The fee
//!   stays charged even if the withdrawal is refused.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rust_decimal_macros::dec;
//! use bank_ledger_rs::{Account, AccountId, AccountPolicy, ContactDetails, Customer,
//!     CustomerId, CustomerKind, NewCustomer};
//!
//! let customer = Arc::new(Customer::new(CustomerId(1), NewCustomer {
//!     name: "Jane Smith".into(),
//!     age: 35,
//!     kind: CustomerKind::Regular,
//!     details: ContactDetails {
//!         contact: "+233-559-123456".into(),
//!         address: "Accra, Ghana".into(),
//!         email: "jane@example.com".into(),
//!     },
//! }).unwrap());
//!
//! let account = Account::new(AccountId(1), customer, AccountPolicy::checking());
//! account.deposit(dec!(500)).unwrap();
//! assert_eq!(account.withdraw(dec!(1000)).unwrap(), dec!(-500));
//! ```

use crate::base::{AccountId, CustomerId};
use crate::customer::Customer;
use crate::error::LedgerError;
use crate::money::{checked_add, checked_sub, validate_amount};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    Savings,
    Checking,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Savings => f.write_str("Savings"),
            Self::Checking => f.write_str("Checking"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("Active"),
            Self::Inactive => f.write_str("Inactive"),
        }
    }
}

/// Savings rules: interest on positive balances and a withdrawal floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsPolicy {
    pub interest_rate: Decimal,
    pub minimum_balance: Decimal,
}

impl SavingsPolicy {
    pub const DEFAULT_INTEREST_RATE: Decimal = dec!(0.035);
    pub const DEFAULT_MINIMUM_BALANCE: Decimal = dec!(500);

    /// Interest on `balance`; zero unless the balance is positive.
    pub fn interest(&self, balance: Decimal) -> Decimal {
        if balance > Decimal::ZERO {
            balance * self.interest_rate
        } else {
            Decimal::ZERO
        }
    }

    fn withdraw(
        &self,
        account: AccountId,
        data: &mut AccountData,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let projected = checked_sub(data.balance, amount)?;
        if projected < self.minimum_balance {
            return Err(LedgerError::InsufficientFunds {
                account,
                balance: data.balance,
                requested: amount,
                minimum: self.minimum_balance,
            });
        }
        data.balance = projected;
        debug_assert!(
            data.balance >= self.minimum_balance,
            "Invariant violated: savings balance {} below minimum {}",
            data.balance,
            self.minimum_balance
        );
        Ok(data.balance)
    }
}

impl Default for SavingsPolicy {
    fn default() -> Self {
        Self {
            interest_rate: Self::DEFAULT_INTEREST_RATE,
            minimum_balance: Self::DEFAULT_MINIMUM_BALANCE,
        }
    }
}

/// Checking rules: overdraft down to `-overdraft_limit` and a monthly fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckingPolicy {
    pub overdraft_limit: Decimal,
    pub monthly_fee: Decimal,
}

impl CheckingPolicy {
    pub const DEFAULT_OVERDRAFT_LIMIT: Decimal = dec!(1000);
    pub const DEFAULT_MONTHLY_FEE: Decimal = dec!(10);
    pub const FEE_PERIOD_DAYS: i64 = 30;

    /// Charges the fee if the account is at least one fee period old.
    ///
    /// Age is measured from opening, so every withdrawal after day 30 pays
    /// the fee.
    fn apply_monthly_fee(&self, data: &mut AccountData, opened_at: DateTime<Utc>, now: DateTime<Utc>) {
        if now.signed_duration_since(opened_at) < Duration::days(Self::FEE_PERIOD_DAYS) {
            return;
        }
        // A fee large enough to overflow is skipped rather than wrapping.
        if let Ok(balance) = checked_sub(data.balance, self.monthly_fee) {
            data.balance = balance;
            data.fees_charged += self.monthly_fee;
        }
    }

    fn withdraw(
        &self,
        account: AccountId,
        data: &mut AccountData,
        amount: Decimal,
        opened_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError> {
        // The fee is not rolled back if the withdrawal below is refused.
        self.apply_monthly_fee(data, opened_at, now);

        let projected = checked_sub(data.balance, amount)?;
        if projected < -self.overdraft_limit {
            return Err(LedgerError::OverdraftExceeded {
                account,
                balance: data.balance,
                requested: amount,
                limit: self.overdraft_limit,
            });
        }
        data.balance = projected;
        debug_assert!(
            data.balance >= -self.overdraft_limit,
            "Invariant violated: checking balance {} beyond overdraft limit {}",
            data.balance,
            self.overdraft_limit
        );
        Ok(data.balance)
    }
}

impl Default for CheckingPolicy {
    fn default() -> Self {
        Self {
            overdraft_limit: Self::DEFAULT_OVERDRAFT_LIMIT,
            monthly_fee: Self::DEFAULT_MONTHLY_FEE,
        }
    }
}

/// Kind-specific rule set of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountPolicy {
    Savings(SavingsPolicy),
    Checking(CheckingPolicy),
}

impl AccountPolicy {
    /// Savings policy with the default rate and floor.
    pub fn savings() -> Self {
        Self::Savings(SavingsPolicy::default())
    }

    /// Checking policy with the default limit and fee.
    pub fn checking() -> Self {
        Self::Checking(CheckingPolicy::default())
    }

    pub fn for_kind(kind: AccountKind) -> Self {
        match kind {
            AccountKind::Savings => Self::savings(),
            AccountKind::Checking => Self::checking(),
        }
    }

    pub fn kind(&self) -> AccountKind {
        match self {
            Self::Savings(_) => AccountKind::Savings,
            Self::Checking(_) => AccountKind::Checking,
        }
    }
}

#[derive(Debug)]
struct AccountData {
    balance: Decimal,
    status: AccountStatus,
    fees_charged: Decimal,
}

impl AccountData {
    fn new() -> Self {
        Self {
            balance: Decimal::ZERO,
            status: AccountStatus::Active,
            fees_charged: Decimal::ZERO,
        }
    }

    fn deposit(&mut self, amount: Decimal) -> Result<Decimal, LedgerError> {
        self.balance = checked_add(self.balance, amount)?;
        Ok(self.balance)
    }
}

/// Point-in-time view of an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    pub account_id: AccountId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub policy: AccountPolicy,
    pub balance: Decimal,
    pub status: AccountStatus,
    pub opened_at: DateTime<Utc>,
}

/// Ledger account.
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    customer: Arc<Customer>,
    policy: AccountPolicy,
    opened_at: DateTime<Utc>,
    inner: Mutex<AccountData>,
}

impl Account {
    const DECIMAL_PRECISION: u32 = 4;

    /// Opens an account now with a zero balance.
    pub fn new(id: AccountId, customer: Arc<Customer>, policy: AccountPolicy) -> Self {
        Self::open_at(id, customer, policy, Utc::now())
    }

    /// Opens an account with an explicit opening instant.
    pub fn open_at(
        id: AccountId,
        customer: Arc<Customer>,
        policy: AccountPolicy,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer,
            policy,
            opened_at,
            inner: Mutex::new(AccountData::new()),
        }
    }

    /// Rebuilds a persisted account with its stored balance and status.
    ///
    /// The stored format carries no opening date, so the account counts as
    /// opened now: a restored checking account pays no monthly fee until it
    /// is 30 days past its restore.
    pub fn restore(
        id: AccountId,
        customer: Arc<Customer>,
        policy: AccountPolicy,
        balance: Decimal,
        status: AccountStatus,
    ) -> Self {
        let account = Self::new(id, customer, policy);
        {
            let mut data = account.inner.lock();
            data.balance = balance;
            data.status = status;
        }
        account
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn customer(&self) -> &Arc<Customer> {
        &self.customer
    }

    pub fn policy(&self) -> &AccountPolicy {
        &self.policy
    }

    pub fn kind(&self) -> AccountKind {
        self.policy.kind()
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn balance(&self) -> Decimal {
        self.inner.lock().balance
    }

    pub fn status(&self) -> AccountStatus {
        self.inner.lock().status
    }

    pub fn set_status(&self, status: AccountStatus) {
        self.inner.lock().status = status;
    }

    /// Total monthly fees charged so far.
    pub fn fees_charged(&self) -> Decimal {
        self.inner.lock().fees_charged
    }

    /// Balance and fees charged, read under one lock acquisition.
    pub fn balance_and_fees(&self) -> (Decimal, Decimal) {
        let data = self.inner.lock();
        (data.balance, data.fees_charged)
    }

    /// Credits `amount` and returns the new balance.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidAmount`] if `amount` is not positive.
    pub fn deposit(&self, amount: Decimal) -> Result<Decimal, LedgerError> {
        let amount = validate_amount(amount)?;
        self.inner.lock().deposit(amount)
    }

    /// Debits `amount` under this account's policy and returns the new balance.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `amount` is not positive.
    /// - [`LedgerError::InsufficientFunds`] if a savings floor would be breached.
    /// - [`LedgerError::OverdraftExceeded`] if a checking limit would be breached.
    pub fn withdraw(&self, amount: Decimal) -> Result<Decimal, LedgerError> {
        self.withdraw_at(amount, Utc::now())
    }

    /// Same as [`withdraw`](Self::withdraw) with an explicit current instant,
    /// which decides whether the checking fee is due.
    pub fn withdraw_at(&self, amount: Decimal, now: DateTime<Utc>) -> Result<Decimal, LedgerError> {
        let amount = validate_amount(amount)?;
        let mut data = self.inner.lock();
        match &self.policy {
            AccountPolicy::Savings(policy) => policy.withdraw(self.id, &mut data, amount),
            AccountPolicy::Checking(policy) => {
                policy.withdraw(self.id, &mut data, amount, self.opened_at, now)
            }
        }
    }

    /// Interest on the current balance; `None` for checking accounts.
    pub fn calculate_interest(&self) -> Option<Decimal> {
        match &self.policy {
            AccountPolicy::Savings(policy) => Some(policy.interest(self.balance())),
            AccountPolicy::Checking(_) => None,
        }
    }

    pub fn summary(&self) -> AccountSummary {
        let data = self.inner.lock();
        AccountSummary {
            account_id: self.id,
            customer_id: self.customer.id(),
            customer_name: self.customer.name().to_string(),
            policy: self.policy,
            balance: data.balance,
            status: data.status,
            opened_at: self.opened_at,
        }
    }
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Account", 5)?;
        state.serialize_field("account", &self.id)?;
        state.serialize_field("customer", self.customer.name())?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field(
            "balance",
            &data.balance.round_dp(Account::DECIMAL_PRECISION),
        )?;
        state.serialize_field("status", &data.status)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::{ContactDetails, CustomerKind, NewCustomer};

    fn customer() -> Arc<Customer> {
        Arc::new(
            Customer::new(
                CustomerId(1),
                NewCustomer {
                    name: "Gideon Dakore".into(),
                    age: 23,
                    kind: CustomerKind::Regular,
                    details: ContactDetails {
                        contact: "+233-559-372538".into(),
                        address: "Bomso, Kumasi".into(),
                        email: "doe@example.com".into(),
                    },
                },
            )
            .unwrap(),
        )
    }

    fn checking_opened_days_ago(days: i64) -> (Account, DateTime<Utc>) {
        let now = Utc::now();
        let account = Account::open_at(
            AccountId(1),
            customer(),
            AccountPolicy::checking(),
            now - Duration::days(days),
        );
        (account, now)
    }

    // === AccountData Internal Tests ===

    #[test]
    fn account_data_starts_active_and_empty() {
        let data = AccountData::new();
        assert_eq!(data.balance, Decimal::ZERO);
        assert_eq!(data.status, AccountStatus::Active);
        assert_eq!(data.fees_charged, Decimal::ZERO);
    }

    #[test]
    fn savings_withdraw_refusal_leaves_data_untouched() {
        let policy = SavingsPolicy::default();
        let mut data = AccountData::new();
        data.deposit(dec!(1000)).unwrap();

        let result = policy.withdraw(AccountId(1), &mut data, dec!(600));
        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        assert_eq!(data.balance, dec!(1000));
    }

    #[test]
    fn savings_withdraw_exactly_to_minimum() {
        let policy = SavingsPolicy::default();
        let mut data = AccountData::new();
        data.deposit(dec!(1000)).unwrap();

        assert_eq!(policy.withdraw(AccountId(1), &mut data, dec!(500)), Ok(dec!(500)));
    }

    #[test]
    fn checking_withdraw_exactly_to_limit() {
        let policy = CheckingPolicy::default();
        let now = Utc::now();
        let mut data = AccountData::new();

        assert_eq!(
            policy.withdraw(AccountId(1), &mut data, dec!(1000), now, now),
            Ok(dec!(-1000))
        );
    }

    // === Fee Tests ===

    #[test]
    fn no_fee_before_thirty_days() {
        let (account, now) = checking_opened_days_ago(29);
        account.deposit(dec!(100)).unwrap();
        assert_eq!(account.withdraw_at(dec!(50), now), Ok(dec!(50)));
        assert_eq!(account.fees_charged(), Decimal::ZERO);
    }

    #[test]
    fn fee_is_charged_before_withdrawal_after_thirty_days() {
        let (account, now) = checking_opened_days_ago(30);
        account.deposit(dec!(100)).unwrap();
        assert_eq!(account.withdraw_at(dec!(50), now), Ok(dec!(40)));
        assert_eq!(account.fees_charged(), dec!(10));
    }

    #[test]
    fn fee_survives_refused_withdrawal() {
        let (account, now) = checking_opened_days_ago(45);
        account.deposit(dec!(100)).unwrap();

        let result = account.withdraw_at(dec!(2000), now);
        assert!(matches!(result, Err(LedgerError::OverdraftExceeded { .. })));
        assert_eq!(account.balance(), dec!(90));
        assert_eq!(account.fees_charged(), dec!(10));
    }

    #[test]
    fn fee_is_charged_on_every_withdrawal_after_thirty_days() {
        let (account, now) = checking_opened_days_ago(40);
        account.deposit(dec!(100)).unwrap();
        assert_eq!(account.withdraw_at(dec!(10), now), Ok(dec!(80)));
        assert_eq!(account.withdraw_at(dec!(10), now), Ok(dec!(60)));
        assert_eq!(account.fees_charged(), dec!(20));

        // Deposits never trigger the fee.
        account.deposit(dec!(5)).unwrap();
        assert_eq!(account.balance(), dec!(65));
        assert_eq!(account.fees_charged(), dec!(20));
    }

    #[test]
    fn invalid_amount_does_not_charge_fee() {
        let (account, now) = checking_opened_days_ago(60);
        account.deposit(dec!(100)).unwrap();
        assert!(account.withdraw_at(dec!(0), now).is_err());
        assert_eq!(account.balance(), dec!(100));
    }

    // === Interest Tests ===

    #[test]
    fn savings_interest_on_positive_balance() {
        let account = Account::new(AccountId(1), customer(), AccountPolicy::savings());
        account.deposit(dec!(10000)).unwrap();
        assert_eq!(account.calculate_interest(), Some(dec!(350.000)));
        assert_eq!(account.balance(), dec!(10000));
    }

    #[test]
    fn savings_interest_zero_balance() {
        let account = Account::new(AccountId(1), customer(), AccountPolicy::savings());
        assert_eq!(account.calculate_interest(), Some(Decimal::ZERO));
    }

    #[test]
    fn checking_has_no_interest() {
        let account = Account::new(AccountId(1), customer(), AccountPolicy::checking());
        account.deposit(dec!(10000)).unwrap();
        assert_eq!(account.calculate_interest(), None);
    }

    // === Restore / Summary ===

    #[test]
    fn restore_keeps_balance_and_status() {
        let account = Account::restore(
            AccountId(7),
            customer(),
            AccountPolicy::checking(),
            dec!(-250.75),
            AccountStatus::Inactive,
        );
        assert_eq!(account.balance(), dec!(-250.75));
        assert_eq!(account.status(), AccountStatus::Inactive);
        assert_eq!(account.fees_charged(), Decimal::ZERO);
    }

    #[test]
    fn restored_account_fee_clock_starts_at_restore() {
        let before = Utc::now();
        let account = Account::restore(
            AccountId(8),
            customer(),
            AccountPolicy::checking(),
            dec!(100),
            AccountStatus::Active,
        );
        assert!(account.opened_at() >= before);

        assert_eq!(account.withdraw_at(dec!(10), before + Duration::days(29)), Ok(dec!(90)));
        assert_eq!(account.fees_charged(), Decimal::ZERO);
        assert_eq!(account.withdraw_at(dec!(10), before + Duration::days(31)), Ok(dec!(70)));
        assert_eq!(account.fees_charged(), dec!(10));
    }

    #[test]
    fn summary_reflects_current_state() {
        let account = Account::new(AccountId(3), customer(), AccountPolicy::savings());
        account.deposit(dec!(750)).unwrap();
        let summary = account.summary();
        assert_eq!(summary.account_id, AccountId(3));
        assert_eq!(summary.customer_name, "Gideon Dakore");
        assert_eq!(summary.policy.kind(), AccountKind::Savings);
        assert_eq!(summary.balance, dec!(750));
        assert_eq!(summary.status, AccountStatus::Active);
    }

    // === Serialization Tests ===

    #[test]
    fn serializer_rounds_to_four_decimal_places() {
        let account = Account::new(AccountId(1), customer(), AccountPolicy::checking());
        account.inner.lock().balance = dec!(123.456789);

        let json = serde_json::to_string(&account).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["account"], "ACC001");
        assert_eq!(parsed["customer"], "Gideon Dakore");
        assert_eq!(parsed["kind"], "CHECKING");
        assert_eq!(parsed["balance"].as_str().unwrap(), "123.4568");
        assert_eq!(parsed["status"], "Active");
    }

    #[test]
    fn serializer_uses_bankers_rounding() {
        let account = Account::new(AccountId(1), customer(), AccountPolicy::savings());
        account.inner.lock().balance = dec!(0.00015);

        let json = serde_json::to_string(&account).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["balance"].as_str().unwrap(), "0.0002");
    }

    #[test]
    fn policy_serializes_with_kind_tag() {
        let json = serde_json::to_value(AccountPolicy::savings()).unwrap();
        assert_eq!(json["kind"], "SAVINGS");
        assert_eq!(json["minimum_balance"], "500");
        assert_eq!(json["interest_rate"], "0.035");
    }

    #[test]
    fn serializer_precision_constant_is_four() {
        assert_eq!(Account::DECIMAL_PRECISION, 4);
    }
}
