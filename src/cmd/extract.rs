use std::{
    fs::{DirBuilder, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, ensure, Context, Result};
use argh::FromArgs;
use maplib::format::item::{EImageFormat, ImageFormat, SMapItemImage};

use crate::cmd::load_map;

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// extract embedded images and sounds
#[argh(subcommand, name = "extract")]
pub struct Args {
    #[argh(positional)]
    /// input map
    input: PathBuf,
    #[argh(positional)]
    /// output directory
    output: PathBuf,
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(
        File::create(path)
            .with_context(|| format!("Failed to create file '{}'", path.display()))?,
    ))
}

/// Whether a name read from the map can be used as a file name inside the
/// output directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.contains(&['/', '\\', ':', '\0'][..])
        && Path::new(name).file_name().map_or(false, |f| f == name)
}

fn output_stem(name: Option<&String>, fallback: String) -> String {
    match name {
        Some(name) if is_plain_file_name(name) => name.clone(),
        Some(name) => {
            log::warn!("Not using {name:?} as a file name, writing {fallback}");
            fallback
        }
        None => fallback,
    }
}

fn write_png(path: &Path, image: &SMapItemImage, data: &[u8]) -> Result<()> {
    let (color, channels) = match image.format() {
        ImageFormat::Known(EImageFormat::Rgb) => (png::ColorType::Rgb, 3),
        ImageFormat::Known(EImageFormat::Rgba) => (png::ColorType::Rgba, 4),
        ImageFormat::Unknown(format) => bail!("Unsupported image format {format}"),
    };
    let (width, height) = (image.width.max(0) as u32, image.height.max(0) as u32);
    ensure!(
        data.len() == width as usize * height as usize * channels,
        "Image data size {:#X} does not match {width}x{height}",
        data.len()
    );
    let mut file = create(path)?;
    let mut encoder = png::Encoder::new(&mut file, width, height);
    encoder.set_color(color);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(data)?;
    writer.finish()?;
    file.flush()?;
    Ok(())
}

pub fn run(args: Args) -> Result<()> {
    let map = load_map(&args.input)?;
    let blocks = &map.data_blocks;
    DirBuilder::new().recursive(true).create(&args.output)?;

    for (index, image) in map.images().enumerate() {
        let name = output_stem(image.name.get(blocks)?, format!("image_{index}"));
        let Some(data) = image.embedded_data(blocks)? else {
            log::info!("Skipping external image {name}");
            continue;
        };
        let path = args.output.join(format!("{name}.png"));
        log::info!("Writing {} ({}x{})", path.display(), image.width, image.height);
        write_png(&path, image, data)?;
    }

    for (index, sound) in map.sounds().enumerate() {
        let name = output_stem(sound.name.get(blocks)?, format!("sound_{index}"));
        if sound.external {
            log::info!("Skipping external sound {name}");
            continue;
        }
        let path = args.output.join(format!("{name}.opus"));
        log::info!("Writing {}", path.display());
        let mut file = create(&path)?;
        file.write_all(sound.opus_data(blocks)?)?;
        file.flush()?;
    }
    Ok(())
}
