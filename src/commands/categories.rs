// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Category, TransactionType};
use crate::sync::Session;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Result, anyhow};

pub fn handle(session: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let kind = sub
                .get_one::<String>("type")
                .map(|s| s.parse::<TransactionType>().map_err(|e| anyhow!(e)))
                .transpose()?;
            let cats: Vec<&Category> = session
                .categories()
                .iter()
                .filter(|c| kind.is_none_or(|k| c.r#type == k))
                .collect();
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cats)? {
                let data = cats
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.clone(),
                            c.name.clone(),
                            c.icon.clone(),
                            c.r#type.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["ID", "Category", "Icon", "Type"], data));
            }
        }
        _ => {}
    }
    Ok(())
}
