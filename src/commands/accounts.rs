// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::NewAccount;
use crate::sync::Session;
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;

pub fn handle(session: &mut Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            let bank = sub.get_one::<String>("bank").unwrap().trim().to_string();
            let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;
            let mut new = NewAccount::new(name, bank, balance);
            new.currency = sub.get_one::<String>("currency").unwrap().to_uppercase();
            new.color = sub.get_one::<String>("color").unwrap().to_string();
            let label = format!("{} ({})", new.name, fmt_money(&new.balance, &new.currency));
            let id = session.add_account(new)?;
            println!("Added account '{}' [{}]", label, id);
        }
        Some(("list", sub)) => {
            let accounts = session.accounts();
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
                let data = accounts
                    .into_iter()
                    .map(|a| {
                        vec![
                            a.id,
                            a.name,
                            a.bank_name,
                            format!("{:.2}", a.balance),
                            a.currency,
                            a.color,
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Name", "Bank", "Balance", "CCY", "Color"], data)
                );
            }
        }
        Some(("rm", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim();
            session.delete_account(id)?;
            println!("Removed account '{}'", id);
        }
        _ => {}
    }
    Ok(())
}
