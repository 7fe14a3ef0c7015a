use std::io::Read;

use flate2::bufread::ZlibDecoder;

use crate::error::{MapError, Result};

/// Reservation limit relative to the compressed length.
const MAX_RESERVE_RATIO: usize = 64;

/// Inflates a zlib stream. `size_hint` is only used to reserve capacity and
/// is capped, since it comes straight from the file.
pub fn decompress_zlib(compressed_data: &[u8], size_hint: usize) -> Result<Vec<u8>> {
    let mut reader = ZlibDecoder::new(compressed_data);
    let reserve = size_hint.min(compressed_data.len().saturating_mul(MAX_RESERVE_RATIO));
    let mut out = Vec::with_capacity(reserve);
    reader
        .read_to_end(&mut out)
        .map_err(|e| MapError::format(format!("Decompression failed: {e}")))?;
    Ok(out)
}
