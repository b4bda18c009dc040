// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CURRENCY: &str = "TWD";
pub const DEFAULT_COLOR: &str = "bg-blue-500";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" | "in" => Ok(TransactionType::Income),
            "expense" | "out" => Ok(TransactionType::Expense),
            other => Err(format!("Unknown transaction type '{}' (use income|expense)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub bank_name: String,
    pub balance: Decimal,
    pub currency: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub r#type: TransactionType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub category_id: String,
    pub amount: Decimal, // non-negative magnitude
    pub r#type: TransactionType,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Account fields supplied by the user; the id is assigned by whoever stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub name: String,
    pub bank_name: String,
    pub balance: Decimal,
    pub currency: String,
    pub color: String,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, bank_name: impl Into<String>, balance: Decimal) -> Self {
        Self {
            name: name.into(),
            bank_name: bank_name.into(),
            balance,
            currency: DEFAULT_CURRENCY.to_string(),
            color: DEFAULT_COLOR.to_string(),
        }
    }

    pub fn with_id(self, id: String) -> Account {
        Account {
            id,
            name: self.name,
            bank_name: self.bank_name,
            balance: self.balance,
            currency: self.currency,
            color: self.color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub account_id: String,
    pub category_id: String,
    pub amount: Decimal,
    pub r#type: TransactionType,
    pub date: NaiveDate,
    pub note: String,
}

impl NewTransaction {
    pub fn with_id(self, id: String) -> Transaction {
        Transaction {
            id,
            account_id: self.account_id,
            category_id: self.category_id,
            amount: self.amount,
            r#type: self.r#type,
            date: self.date,
            note: self.note,
        }
    }
}
