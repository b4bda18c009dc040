// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Dashboard figures derived from the in-memory collections.
//!
//! Everything here is recomputed from scratch on each call.

use crate::fixtures::find_category;
use crate::models::{Account, Category, Transaction, TransactionType};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

/// Label for expenses whose category id does not resolve.
pub const OTHER_LABEL: &str = "其他";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub label: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountBalance {
    pub name: String,
    pub balance: Decimal,
    pub color: String,
}

pub fn total_balance(accounts: &[Account]) -> Decimal {
    accounts.iter().map(|a| a.balance).sum()
}

/// Sum of `kind` transactions dated in the same calendar month as `today`.
/// Only the month index is compared, not the year.
pub fn monthly_total(transactions: &[Transaction], kind: TransactionType, today: NaiveDate) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.r#type == kind && t.date.month() == today.month())
        .map(|t| t.amount)
        .sum()
}

pub fn monthly_income(transactions: &[Transaction], today: NaiveDate) -> Decimal {
    monthly_total(transactions, TransactionType::Income, today)
}

pub fn monthly_expense(transactions: &[Transaction], today: NaiveDate) -> Decimal {
    monthly_total(transactions, TransactionType::Expense, today)
}

/// Expense totals per category name, in order of first appearance.
pub fn category_breakdown(transactions: &[Transaction], categories: &[Category]) -> Vec<CategoryTotal> {
    let mut out: Vec<CategoryTotal> = Vec::new();
    for t in transactions.iter().filter(|t| t.r#type == TransactionType::Expense) {
        let label = find_category(categories, &t.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or(OTHER_LABEL);
        match out.iter_mut().find(|e| e.label == label) {
            Some(entry) => entry.total += t.amount,
            None => out.push(CategoryTotal {
                label: label.to_string(),
                total: t.amount,
            }),
        }
    }
    out
}

pub fn balance_distribution(accounts: &[Account]) -> Vec<AccountBalance> {
    accounts
        .iter()
        .map(|a| AccountBalance {
            name: a.name.clone(),
            balance: a.balance,
            color: a.color.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub as_of: NaiveDate,
    pub total_balance: Decimal,
    pub account_count: usize,
    pub monthly_income: Decimal,
    pub monthly_expense: Decimal,
    pub by_category: Vec<CategoryTotal>,
    pub balances: Vec<AccountBalance>,
}

impl DashboardSummary {
    pub fn compute(
        accounts: &[Account],
        transactions: &[Transaction],
        categories: &[Category],
        today: NaiveDate,
    ) -> Self {
        Self {
            as_of: today,
            total_balance: total_balance(accounts),
            account_count: accounts.len(),
            monthly_income: monthly_income(transactions, today),
            monthly_expense: monthly_expense(transactions, today),
            by_category: category_breakdown(transactions, categories),
            balances: balance_distribution(accounts),
        }
    }
}
