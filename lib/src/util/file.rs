use std::{fs::File, path::Path};

use memmap2::{Mmap, MmapOptions};

use crate::error::Result;

/// Opens a memory mapped file.
pub fn map_file<P: AsRef<Path>>(path: P) -> Result<Mmap> {
    let file = File::open(&path)?;
    let map = unsafe { MmapOptions::new().map(&file) }?;
    Ok(map)
}
