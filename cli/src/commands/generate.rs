//! Generate command

use super::Context;
use crate::output::key_value_table;
use anyhow::Result;
use colored::Colorize;
use firstlogin_core::{FirstLoginGenerator, GenerateRequest, GenerationReport, MergeOutcome};
use std::path::PathBuf;

pub fn handle(
    ctx: &Context,
    level: u8,
    aud: String,
    output: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let request = GenerateRequest {
        level,
        audience: aud,
        output: ctx.store_path(output),
        dry_run,
    };
    let report = FirstLoginGenerator::new(&ctx.registry, ctx.codec).run(&request)?;

    if ctx.format.is_structured() {
        return ctx.format.print(&report);
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &GenerationReport) {
    println!("{}", "Generated first-login array".bold());
    println!(
        "{}",
        key_value_table([
            ("Level", format!("{} ({})", report.level, report.tier)),
            ("Locator", report.locator.clone()),
            ("Payload", report.payload.clone()),
            ("Payload length", report.payload_len.to_string()),
            ("Audience", report.audience.clone()),
            ("Storage key", report.storage_key.clone()),
            ("Array length", report.length.to_string()),
        ])
    );

    match &report.store {
        None => {
            println!("{}", "DRY RUN - no files modified".yellow());
            println!(
                "Preview (first {} values): {:?}",
                report.preview.len(),
                report.preview
            );
        }
        Some(update) => {
            let action = match update.outcome {
                MergeOutcome::Inserted => "Added",
                MergeOutcome::Replaced => "Replaced",
            };
            println!(
                "{} {} ({} key {}, {} keys total)",
                "Updated".green().bold(),
                update.path.display(),
                action,
                report.storage_key,
                update.total_keys
            );
        }
    }

    println!("Bootstrap PIN for this tier: {}", report.pin.as_str().bold());
    println!("Access level constraint: {}", report.access_constraint);
}
