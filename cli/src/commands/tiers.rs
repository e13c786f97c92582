//! Tiers command

use super::Context;
use anyhow::Result;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Debug, Serialize, Tabled)]
pub struct TierRow {
    #[tabled(rename = "Level")]
    pub level: u8,
    #[tabled(rename = "Name")]
    pub name: &'static str,
    #[tabled(rename = "Access")]
    pub access: String,
    #[tabled(rename = "Locator")]
    pub locator: String,
}

pub fn rows(ctx: &Context) -> Vec<TierRow> {
    ctx.registry
        .iter()
        .map(|tier| TierRow {
            level: tier.level.as_u8(),
            name: tier.name(),
            access: tier.constraint_description(),
            locator: tier.locator.clone(),
        })
        .collect()
}

pub fn handle(ctx: &Context) -> Result<()> {
    let rows = rows(ctx);
    if ctx.format.is_structured() {
        return ctx.format.print(&rows);
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    Ok(())
}
