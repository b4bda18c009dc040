// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::advice::AdviceRequester;
use crate::sync::Session;
use anyhow::Result;

pub fn handle(session: &Session, advisor: &AdviceRequester) -> Result<()> {
    if advisor.is_enabled() {
        eprintln!("Asking the AI advisor...");
    }
    match advisor.try_advise(&session.accounts(), &session.transactions(), session.categories()) {
        Some(text) => {
            println!("{}", text.trim());
            println!();
            println!("建議僅供參考，不構成投資意向。");
        }
        None => eprintln!("An advice request is already running."),
    }
    Ok(())
}
