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

//! Account holders.

use crate::base::CustomerId;
use crate::error::LedgerError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerKind {
    Regular,
    Premium,
}

impl fmt::Display for CustomerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular => f.write_str("Regular"),
            Self::Premium => f.write_str("Premium"),
        }
    }
}

/// Mutable contact fields of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub contact: String,
    pub address: String,
    pub email: String,
}

/// Input for creating a [`Customer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub age: u8,
    pub kind: CustomerKind,
    pub details: ContactDetails,
}

/// An account holder. Identity, name, age and kind are fixed at construction.
#[derive(Debug)]
pub struct Customer {
    id: CustomerId,
    name: String,
    age: u8,
    kind: CustomerKind,
    details: RwLock<ContactDetails>,
}

impl Customer {
    pub const AGE_RANGE: RangeInclusive<u8> = 1..=120;

    /// Validates `new` and builds a customer with the given identifier.
    pub fn new(id: CustomerId, new: NewCustomer) -> Result<Self, LedgerError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidCustomer {
                field: "name",
                reason: "must not be blank".into(),
            });
        }
        if !Self::AGE_RANGE.contains(&new.age) {
            return Err(LedgerError::InvalidCustomer {
                field: "age",
                reason: format!("{} is outside 1-120", new.age),
            });
        }
        Ok(Self {
            id,
            name: name.to_string(),
            age: new.age,
            kind: new.kind,
            details: RwLock::new(new.details),
        })
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn kind(&self) -> CustomerKind {
        self.kind
    }

    pub fn details(&self) -> ContactDetails {
        self.details.read().clone()
    }

    pub fn update_contact(&self, details: ContactDetails) {
        *self.details.write() = details;
    }
}
