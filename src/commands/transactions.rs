// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::fixtures::find_category;
use crate::models::{NewTransaction, TransactionType};
use crate::sync::Session;
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table, today};
use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;

/// Shown for transactions whose category id does not resolve.
pub const UNCATEGORIZED_LABEL: &str = "未分類";

pub fn handle(session: &mut Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(session, sub)?,
        Some(("list", sub)) => list(session, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let kind = sub
        .get_one::<String>("type")
        .unwrap()
        .parse::<TransactionType>()
        .map_err(|e| anyhow!(e))?;
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => today(),
    };
    let note = sub
        .get_one::<String>("note")
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let account_id = match sub.get_one::<String>("account") {
        Some(id) => id.trim().to_string(),
        None => session
            .accounts()
            .first()
            .map(|a| a.id.clone())
            .context("No accounts yet; add one with `account add` or pass --account")?,
    };
    let category_id = match sub.get_one::<String>("category") {
        Some(id) => id.trim().to_string(),
        None => session
            .categories()
            .iter()
            .find(|c| c.r#type == kind)
            .map(|c| c.id.clone())
            .with_context(|| format!("No {} category available", kind))?,
    };
    if amount.is_sign_negative() {
        bail!("Amount must be a non-negative magnitude; use --type to record expenses");
    }

    let new = NewTransaction {
        account_id: account_id.clone(),
        category_id,
        amount,
        r#type: kind,
        date,
        note,
    };
    let id = session.add_transaction(new)?;
    println!(
        "Recorded {} {} on {} (acct: {}) [{}]",
        kind, amount, date, account_id, id
    );
    Ok(())
}

fn list(session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(session, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                let sign = if r.r#type == TransactionType::Income { "+" } else { "-" };
                vec![
                    r.date.clone(),
                    r.account.clone(),
                    r.category.clone(),
                    r.note.clone(),
                    format!("{}{}", sign, r.amount),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Account", "Category", "Note", "Amount"], rows)
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    pub account: String,
    pub category: String,
    pub r#type: TransactionType,
    pub amount: String,
    pub note: String,
}

/// Transactions newest first, joined with account and category names.
pub fn query_rows(session: &Session, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let accounts = session.accounts();
    let categories = session.categories();
    let mut txs = session.transactions();
    if let Some(acct) = sub.get_one::<String>("account") {
        txs.retain(|t| &t.account_id == acct);
    }
    txs.sort_by(|a, b| b.date.cmp(&a.date));
    if let Some(limit) = sub.get_one::<usize>("limit") {
        txs.truncate(*limit);
    }

    let data = txs
        .into_iter()
        .map(|t| TransactionRow {
            account: accounts
                .iter()
                .find(|a| a.id == t.account_id)
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            category: find_category(categories, &t.category_id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| UNCATEGORIZED_LABEL.to_string()),
            id: t.id,
            date: t.date.to_string(),
            r#type: t.r#type,
            amount: t.amount.to_string(),
            note: if t.note.is_empty() { "-".to_string() } else { t.note },
        })
        .collect();
    Ok(data)
}
