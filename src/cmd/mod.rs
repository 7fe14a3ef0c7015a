pub mod extract;
pub mod info;
pub mod layers;

use std::path::Path;

use anyhow::{Context, Result};
use argh::FromArgs;
use maplib::{util::file::map_file, MapFile};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
pub enum SubCommand {
    Info(info::Args),
    Layers(layers::Args),
    Extract(extract::Args),
}

/// Maps and decodes a map file.
pub fn load_map(path: &Path) -> Result<MapFile> {
    let data = map_file(path)
        .with_context(|| format!("Failed to open map file '{}'", path.display()))?;
    maplib::parse(&data).with_context(|| format!("Could not read map file '{}'", path.display()))
}

/// Formats a lazily decoded string field for display.
pub fn display_string(value: maplib::Result<Option<&String>>) -> String {
    match value {
        Ok(Some(s)) => s.clone(),
        Ok(None) => "-".to_string(),
        Err(e) => format!("<{e}>"),
    }
}
