// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::UserProfile;
use crate::sync::{Session, SessionError};
use anyhow::Result;

/// Authentication failures are reported inline and do not abort the program.
pub fn handle(session: &mut Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("login", sub)) => {
            let email = sub.get_one::<String>("email").unwrap();
            let password = sub.get_one::<String>("password").unwrap();
            let result = session.sign_in(email, password);
            signed_in(session, result, "Signed in as");
        }
        Some(("register", sub)) => {
            let email = sub.get_one::<String>("email").unwrap();
            let password = sub.get_one::<String>("password").unwrap();
            let name = sub.get_one::<String>("name").map(String::as_str);
            let result = session.register(email, password, name);
            signed_in(session, result, "Registered and signed in as");
        }
        Some(("logout", _)) => match session.sign_out() {
            Ok(()) => println!("Signed out; now in demo mode"),
            Err(err) => eprintln!("Sign-out failed: {}", err),
        },
        _ => {}
    }
    Ok(())
}

fn signed_in(session: &Session, result: Result<UserProfile, SessionError>, verb: &str) {
    match result {
        Ok(user) => {
            println!("{} {}", verb, user.email);
            if session.is_demo() {
                println!("The data store is unavailable; showing demo data instead.");
            }
        }
        Err(err) => eprintln!("Authentication failed: {}", err),
    }
}
