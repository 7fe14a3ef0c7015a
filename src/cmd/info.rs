use std::path::PathBuf;

use anyhow::Result;
use argh::FromArgs;
use maplib::format::item::ItemKind;
use serde_json::json;
use strum::IntoEnumIterator;

use crate::cmd::{display_string, load_map};

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// print map header and info
#[argh(subcommand, name = "info")]
pub struct Args {
    #[argh(positional)]
    /// input map
    input: PathBuf,
    #[argh(switch, short = 'j')]
    /// print as JSON
    json: bool,
}

pub fn run(args: Args) -> Result<()> {
    let map = load_map(&args.input)?;
    let blocks = &map.data_blocks;
    let info = map.info();
    let author = info.map(|i| display_string(i.author.get(blocks)));
    let map_version = info.map(|i| display_string(i.map_version.get(blocks)));
    let credits = info.map(|i| display_string(i.credits.get(blocks)));
    let license = info.map(|i| display_string(i.license.get(blocks)));
    let settings = match info.map(|i| i.settings(blocks)).transpose()? {
        Some(Some(settings)) => settings.clone(),
        _ => Vec::new(),
    };
    let counts: Vec<(ItemKind, usize)> =
        ItemKind::iter().map(|kind| (kind, map.items_of_kind(kind).count())).collect();
    let unknown = map.items.iter().filter(|item| item.kind().is_none()).count();

    if args.json {
        let items: serde_json::Map<String, serde_json::Value> =
            counts.iter().map(|(kind, count)| (kind.to_string(), json!(count))).collect();
        let value = json!({
            "version": map.version(),
            "items": map.items.len(),
            "data_blocks": map.data_blocks.len(),
            "item_counts": items,
            "unknown_items": unknown,
            "author": author,
            "map_version": map_version,
            "credits": credits,
            "license": license,
            "settings": settings,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    log::info!("Map {}:", args.input.display());
    log::info!("  Items: {} ({} types)", map.items.len(), map.item_types.len());
    log::info!("  Data blocks: {}", map.data_blocks.len());
    for (kind, count) in counts.iter().filter(|(_, count)| *count > 0) {
        log::info!("    {kind}: {count}");
    }
    if unknown > 0 {
        log::info!("    Unknown: {unknown}");
    }
    if let Some(version) = map.version() {
        log::info!("  Version: {version}");
    }
    if info.is_some() {
        log::info!("  Author: {}", author.unwrap_or_default());
        log::info!("  Map version: {}", map_version.unwrap_or_default());
        log::info!("  Credits: {}", credits.unwrap_or_default());
        log::info!("  License: {}", license.unwrap_or_default());
    }
    for setting in &settings {
        log::info!("  Setting: {setting}");
    }
    Ok(())
}
