// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use smartfinance::advice::AdviceRequester;
use smartfinance::config::AppConfig;
use smartfinance::remote::Backend;
use smartfinance::sync::Session;
use smartfinance::{cli, commands};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartfinance=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let config = AppConfig::from_env();
    let backend = config.store.as_ref().and_then(|cfg| match Backend::connect(cfg) {
        Ok(b) => Some(b),
        Err(err) => {
            warn!(error = %err, "document store unavailable, running in demo mode");
            None
        }
    });
    let mut session = Session::start(backend);
    let advisor = AdviceRequester::from_config(config.advice.as_ref());

    match matches.subcommand() {
        Some(("status", _)) => commands::status::handle(&session, &advisor)?,
        Some(("mode", sub)) => commands::status::handle_mode(&mut session, sub)?,
        Some(("auth", sub)) => commands::auth::handle(&mut session, sub)?,
        Some(("account", sub)) => commands::accounts::handle(&mut session, sub)?,
        Some(("category", sub)) => commands::categories::handle(&session, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut session, sub)?,
        Some(("dashboard", sub)) => commands::dashboard::handle(&session, sub)?,
        Some(("advice", _)) => commands::advice::handle(&session, &advisor)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
