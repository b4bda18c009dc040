// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::advice::AdviceRequester;
use crate::sync::{Mode, Session};
use crate::utils::pretty_table;
use anyhow::Result;

pub fn handle(session: &Session, advisor: &AdviceRequester) -> Result<()> {
    let (mode, detail) = match session.mode() {
        Mode::Demo => ("🚀 展示模式", "數據僅儲存於本地記憶體".to_string()),
        Mode::Authenticated(user) => (
            "💎 正式模式",
            match &user.display_name {
                Some(name) => format!("{} <{}>", name, user.email),
                None => user.email.clone(),
            },
        ),
    };
    let rows = vec![
        vec!["mode".to_string(), mode.to_string()],
        vec!["user".to_string(), detail],
        vec![
            "store".to_string(),
            if session.has_backend() { "configured" } else { "not configured" }.to_string(),
        ],
        vec![
            "ai".to_string(),
            if advisor.is_enabled() { "enabled" } else { "disabled" }.to_string(),
        ],
        vec!["accounts".to_string(), session.accounts().len().to_string()],
        vec!["transactions".to_string(), session.transactions().len().to_string()],
    ];
    println!("{}", pretty_table(&["Key", "Value"], rows));
    Ok(())
}

/// `mode demo`: refused while a real account is signed in.
pub fn handle_mode(session: &mut Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("demo", _)) => match session.enter_demo() {
            Ok(()) => println!("Demo mode: fixture data, nothing is saved"),
            Err(err) => eprintln!("{}", err),
        },
        _ => {}
    }
    Ok(())
}
