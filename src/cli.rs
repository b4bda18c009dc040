// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::fixtures::ACCOUNT_COLORS;
use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON document per line"),
    )
}

fn credentials(cmd: Command) -> Command {
    cmd.arg(Arg::new("email").long("email").required(true))
        .arg(Arg::new("password").long("password").required(true))
}

pub fn build_cli() -> Command {
    Command::new("smartfinance")
        .version(clap::crate_version!())
        .about("Bank accounts, income/expense records, dashboards and AI advice")
        .subcommand(Command::new("status").about("Show the current mode and signed-in user"))
        .subcommand(
            Command::new("mode")
                .about("Switch data mode")
                .subcommand(Command::new("demo").about("Use local fixture data (requires sign-out)")),
        )
        .subcommand(
            Command::new("auth")
                .about("Sign in, register or sign out")
                .subcommand(credentials(Command::new("login")))
                .subcommand(
                    credentials(Command::new("register"))
                        .arg(Arg::new("name").long("name").help("Display name")),
                )
                .subcommand(Command::new("logout")),
        )
        .subcommand(
            Command::new("account")
                .about("Manage bank accounts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("bank").long("bank").required(true))
                        .arg(
                            Arg::new("balance")
                                .long("balance")
                                .default_value("0")
                                .allow_hyphen_values(true),
                        )
                        .arg(Arg::new("currency").long("currency").default_value("TWD"))
                        .arg(
                            Arg::new("color")
                                .long("color")
                                .default_value("bg-blue-500")
                                .value_parser(PossibleValuesParser::new(
                                    ACCOUNT_COLORS.map(|(_, class)| class),
                                )),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("rm").arg(Arg::new("id").long("id").required(true))),
        )
        .subcommand(
            Command::new("category").about("Show the fixed categories").subcommand(
                json_flags(Command::new("list")).arg(
                    Arg::new("type")
                        .long("type")
                        .value_parser(["income", "expense"]),
                ),
            ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("expense")
                                .value_parser(["income", "expense"]),
                        )
                        .arg(Arg::new("account").long("account").help("Account id (default: first account)"))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .help("Category id (default: first category of the type)"),
                        )
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD (default: today)"))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(
                    json_flags(Command::new("list"))
                        .arg(Arg::new("account").long("account"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ),
        )
        .subcommand(json_flags(
            Command::new("dashboard").about("Balances, this month's cash flow and spending by category"),
        ))
        .subcommand(Command::new("advice").about("Ask the AI advisor about your finances"))
}
