use std::path::PathBuf;

use anyhow::Result;
use argh::FromArgs;
use maplib::format::layer::{Layer, LayerData};

use crate::cmd::load_map;

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// list groups and layers
#[argh(subcommand, name = "layers")]
pub struct Args {
    #[argh(positional)]
    /// input map
    input: PathBuf,
}

fn describe(layer: &Layer) -> String {
    let detail = if layer.header.is_detail() { " (detail)" } else { "" };
    match &layer.data {
        LayerData::Tilemap(t) => {
            let purpose = if t.flags.is_game() {
                "game"
            } else if t.flags.is_front() {
                "front"
            } else if t.flags.is_tele() {
                "tele"
            } else if t.flags.is_speedup() {
                "speedup"
            } else if t.flags.is_switch() {
                "switch"
            } else if t.flags.is_tune() {
                "tune"
            } else {
                "design"
            };
            format!("tiles {}x{} {purpose}{detail}", t.width, t.height)
        }
        LayerData::Quads(q) => format!("quads x{}{detail}", q.num_quads),
        LayerData::Sounds(s) => format!("sounds x{}{detail}", s.num_sources),
        LayerData::Unknown(words) => {
            format!("unknown type {} ({} words)", layer.header.kind, words.len())
        }
    }
}

pub fn run(args: Args) -> Result<()> {
    let map = load_map(&args.input)?;
    for (index, group) in map.groups().enumerate() {
        let name = group.name.as_ref().map(|n| n.get()).transpose()?.unwrap_or_default();
        log::info!(
            "Group {index} '{name}': offset {:?} parallax {:?}",
            group.offset.to_f64(),
            group.parallax.to_f64()
        );
        for layer in map.group_layers(group) {
            let name = layer.name().map(|n| n.get()).transpose()?.unwrap_or_default();
            log::info!("  - '{name}': {}", describe(layer));
        }
    }
    Ok(())
}
