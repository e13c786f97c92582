//! Verify command

use super::Context;
use crate::output::key_value_table;
use anyhow::{Context as _, Result};
use colored::Colorize;
use firstlogin_core::{Store, Verifier};
use std::path::PathBuf;

pub fn handle(ctx: &Context, level: u8, aud: &str, store: Option<PathBuf>) -> Result<()> {
    let path = ctx.store_path(store);
    let store = Store::load(&path)?;
    let verification = Verifier::new(&ctx.registry, ctx.codec)
        .verify_store(&store, level, aud)
        .with_context(|| format!("verifying level {} code in {}", level, path.display()))?;

    if ctx.format.is_structured() {
        return ctx.format.print(&verification);
    }

    println!(
        "{}",
        key_value_table([
            ("Tier", format!("{} ({})", verification.level, verification.tier)),
            ("Storage key", verification.storage_key.clone()),
            ("Array length", verification.length.to_string()),
            ("Decoded payload", verification.decoded.clone()),
            ("Locator", verification.locator.clone()),
        ])
    );
    if verification.locator_current {
        println!("{}", "Verified".green().bold());
    } else {
        println!(
            "{} (locator differs from the current tier table)",
            "Verified".yellow().bold()
        );
    }
    Ok(())
}
