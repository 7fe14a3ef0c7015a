use std::io::Cursor;

use binrw::{binrw, BinReaderExt, Endian};

use crate::error::{MapError, Result};

pub const K_MAGIC: [u8; 4] = *b"DATA";
pub const K_VERSION: u32 = 4;

/// Datafile header. Magic and version are checked in that order before
/// anything else is read.
#[binrw]
#[brw(magic = b"DATA")]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SDatafileHeader {
    #[br(assert(version == K_VERSION, "Unsupported datafile version {:#X}", version))]
    pub version: u32,
    /// Size of the file after this field.
    pub size: u32,
    /// Length of the part that a big-endian reader would need to swap.
    pub swap_len: u32,
    pub num_item_types: u32,
    pub num_items: u32,
    pub num_data: u32,
    /// Byte size of the item section.
    pub item_size: u32,
    /// Byte size of the data section.
    pub data_size: u32,
}

impl SDatafileHeader {
    /// Encoded width, magic included.
    pub const SIZE: usize = 36;

    pub fn read(data: &[u8]) -> Result<Self> {
        Cursor::new(data)
            .read_type(Endian::Little)
            .map_err(|e| MapError::from_binrw(e, "header"))
    }

    /// Byte size of the index tables that follow the header.
    pub fn index_size(&self) -> u64 {
        self.num_item_types as u64 * 12 + self.num_items as u64 * 4 + self.num_data as u64 * 8
    }
}
