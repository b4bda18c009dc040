// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::dashboard::DashboardSummary;
use crate::sync::Session;
use crate::utils::{maybe_print_json, pretty_table, today};
use anyhow::Result;
use chrono::Datelike;
use rust_decimal::Decimal;

pub fn handle(session: &Session, m: &clap::ArgMatches) -> Result<()> {
    let summary = DashboardSummary::compute(
        &session.accounts(),
        &session.transactions(),
        session.categories(),
        today(),
    );
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &summary)? {
        return Ok(());
    }

    println!(
        "{}",
        pretty_table(
            &["Total balance", "Accounts", "Income (month)", "Expense (month)"],
            vec![vec![
                format!("{:.2}", summary.total_balance),
                summary.account_count.to_string(),
                format!("{:.2}", summary.monthly_income),
                format!("{:.2}", summary.monthly_expense),
            ]],
        )
    );

    let spent: Decimal = summary.by_category.iter().map(|c| c.total).sum();
    let mut items = summary.by_category.clone();
    items.sort_by(|a, b| b.total.cmp(&a.total));
    let data = items
        .into_iter()
        .map(|c| {
            let share = if spent.is_zero() {
                Decimal::ZERO
            } else {
                c.total / spent * Decimal::ONE_HUNDRED
            };
            vec![c.label, format!("{:.2}", c.total), format!("{:.0}%", share)]
        })
        .collect();
    println!("{}", pretty_table(&["Category", "Spent", "Share"], data));

    let data = summary
        .balances
        .iter()
        .map(|b| vec![b.name.clone(), format!("{:.2}", b.balance)])
        .collect();
    println!("{}", pretty_table(&["Account", "Balance"], data));
    println!("Month: {:02} (as of {})", summary.as_of.month(), summary.as_of);
    Ok(())
}
