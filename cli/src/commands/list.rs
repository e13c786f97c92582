//! List command

use super::Context;
use anyhow::Result;
use firstlogin_core::{Store, StoreEntry};
use serde::Serialize;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

#[derive(Debug, Serialize)]
pub struct Listing {
    pub path: PathBuf,
    pub total_keys: usize,
    pub entries: Vec<StoreEntry>,
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Level")]
    level: u8,
    #[tabled(rename = "Tier")]
    tier: &'static str,
    #[tabled(rename = "Audience")]
    audience: String,
    #[tabled(rename = "Values")]
    values: usize,
}

impl From<&StoreEntry> for EntryRow {
    fn from(entry: &StoreEntry) -> Self {
        Self {
            level: entry.level.as_u8(),
            tier: entry.level.name(),
            audience: abbreviate(&entry.audience),
            values: entry.values,
        }
    }
}

fn abbreviate(audience: &str) -> String {
    if audience.len() > 24 && audience.is_ascii() {
        format!("{}...{}", &audience[..10], &audience[audience.len() - 10..])
    } else {
        audience.to_string()
    }
}

pub fn handle(ctx: &Context, store: Option<PathBuf>) -> Result<()> {
    let path = ctx.store_path(store);
    let store = Store::load(&path)?;
    let listing = Listing {
        total_keys: store.len(),
        entries: store.first_login_entries(),
        path,
    };

    if ctx.format.is_structured() {
        return ctx.format.print(&listing);
    }

    if listing.entries.is_empty() {
        println!("No first-login entries in {}", listing.path.display());
    } else {
        let mut table = Table::new(listing.entries.iter().map(EntryRow::from));
        table.with(Style::rounded());
        println!("{}", table);
    }
    println!(
        "{} keys total, {} first-login",
        listing.total_keys,
        listing.entries.len()
    );
    Ok(())
}
