// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Seed data: the fixed category set and the demo-mode accounts and transactions.

use crate::models::{Account, Category, Transaction, TransactionType};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;

pub const ACCOUNT_COLORS: [(&str, &str); 6] = [
    ("藍色", "bg-blue-500"),
    ("綠色", "bg-green-500"),
    ("橘色", "bg-orange-500"),
    ("紫色", "bg-purple-500"),
    ("紅色", "bg-red-500"),
    ("石板", "bg-slate-700"),
];

static CATEGORIES: Lazy<Vec<Category>> = Lazy::new(|| {
    use TransactionType::{Expense, Income};
    [
        ("cat_1", "餐飲飲食", "Utensils", Expense),
        ("cat_2", "交通出行", "Car", Expense),
        ("cat_3", "薪資收入", "Wallet", Income),
        ("cat_4", "日常購物", "ShoppingBag", Expense),
        ("cat_5", "娛樂休閒", "Gamepad2", Expense),
        ("cat_6", "醫療健康", "HeartPulse", Expense),
        ("cat_7", "投資回報", "TrendingUp", Income),
    ]
    .into_iter()
    .map(|(id, name, icon, r#type)| Category {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        r#type,
    })
    .collect()
});

/// The fixed category set shared by both modes.
pub fn categories() -> &'static [Category] {
    &CATEGORIES
}

pub fn demo_accounts() -> Vec<Account> {
    [
        ("acc_1", "主要薪轉", "國泰世華", 52000, "bg-green-500"),
        ("acc_2", "日常消費", "台新銀行", 8400, "bg-blue-500"),
        ("acc_3", "投資帳戶", "富邦銀行", 120000, "bg-purple-500"),
    ]
    .into_iter()
    .map(|(id, name, bank, balance, color)| Account {
        id: id.to_string(),
        name: name.to_string(),
        bank_name: bank.to_string(),
        balance: Decimal::from(balance),
        currency: "TWD".to_string(),
        color: color.to_string(),
    })
    .collect()
}

pub fn demo_transactions() -> Vec<Transaction> {
    use TransactionType::{Expense, Income};
    [
        ("t1", "acc_1", "cat_3", 55000, Income, (2024, 3, 5), "3月薪資"),
        ("t2", "acc_2", "cat_1", 150, Expense, (2024, 3, 6), "午餐"),
        ("t3", "acc_2", "cat_2", 45, Expense, (2024, 3, 6), "捷運"),
        ("t4", "acc_1", "cat_4", 1200, Expense, (2024, 3, 7), "生活百貨"),
    ]
    .into_iter()
    .filter_map(|(id, acct, cat, amount, r#type, (y, m, d), note)| {
        Some(Transaction {
            id: id.to_string(),
            account_id: acct.to_string(),
            category_id: cat.to_string(),
            amount: Decimal::from(amount),
            r#type,
            date: NaiveDate::from_ymd_opt(y, m, d)?,
            note: note.to_string(),
        })
    })
    .collect()
}

pub fn find_category<'a>(categories: &'a [Category], id: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.id == id)
}
