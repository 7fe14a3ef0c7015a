use std::io::Cursor;

use binrw::{BinReaderExt, Endian};
use binrw_derive::binread;

use crate::{
    error::{MapError, Result},
    format::header::SDatafileHeader,
};

/// Maps a type tag to the contiguous range of items carrying it.
#[binread]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SItemType {
    pub type_id: i32,
    pub start: i32,
    pub num: i32,
}

impl SItemType {
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.start.max(0) as usize;
        start..start + self.num.max(0) as usize
    }
}

/// The three tables between the header and the item section.
#[binread]
#[derive(Clone, Debug, Default)]
#[br(import(num_item_types: u32, num_items: u32, num_data: u32))]
pub struct IndexTables {
    #[br(count = num_item_types)]
    pub item_types: Vec<SItemType>,
    /// Item offsets relative to the item section.
    #[br(count = num_items)]
    pub item_offsets: Vec<i32>,
    /// Compressed data offsets relative to the data section.
    #[br(count = num_data)]
    pub data_offsets: Vec<i32>,
    /// Decompressed data sizes. Informational only.
    #[br(count = num_data)]
    pub data_sizes: Vec<i32>,
}

impl IndexTables {
    /// Reads the tables from `data`, which starts right after the header.
    pub fn read(data: &[u8], header: &SDatafileHeader) -> Result<Self> {
        // Counts come straight from the file; make sure they fit before
        // allocating anything.
        if (data.len() as u64) < header.index_size() {
            return Err(MapError::Truncated { context: "index tables" });
        }
        let tables: Self = Cursor::new(data)
            .read_type_args(
                Endian::Little,
                (header.num_item_types, header.num_items, header.num_data),
            )
            .map_err(|e| MapError::from_binrw(e, "index tables"))?;
        log::debug!(
            "Index: {} item types, {} items, {} data blocks",
            tables.item_types.len(),
            tables.item_offsets.len(),
            tables.data_offsets.len()
        );
        Ok(tables)
    }

    /// Index entry for a type tag, if the file lists one.
    pub fn item_type(&self, type_id: i32) -> Option<&SItemType> {
        self.item_types.iter().find(|t| t.type_id == type_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(values: &[i32]) -> Vec<u8> { values.iter().flat_map(|v| v.to_le_bytes()).collect() }

    fn header(num_item_types: u32, num_items: u32, num_data: u32) -> SDatafileHeader {
        SDatafileHeader { version: 4, num_item_types, num_items, num_data, ..Default::default() }
    }

    #[test]
    fn reads_tables_in_order() {
        let data = words(&[
            5, 0, 2, // layer items 0..2
            0, 12, // item offsets
            0, 40, 90, // data offsets
            7, 120, 300, // data sizes
        ]);
        let tables = IndexTables::read(&data, &header(1, 2, 3)).unwrap();
        assert_eq!(tables.item_types, [SItemType { type_id: 5, start: 0, num: 2 }]);
        assert_eq!(tables.item_offsets, [0, 12]);
        assert_eq!(tables.data_offsets, [0, 40, 90]);
        assert_eq!(tables.data_sizes, [7, 120, 300]);
        assert_eq!(tables.item_type(5).unwrap().range(), 0..2);
        assert!(tables.item_type(3).is_none());
    }

    #[test]
    fn short_tables_are_truncated() {
        let data = words(&[0, 4]);
        let err = IndexTables::read(&data, &header(0, 2, 1)).unwrap_err();
        assert!(matches!(err, MapError::Truncated { .. }));
    }

    #[test]
    fn huge_counts_do_not_allocate() {
        let err = IndexTables::read(&[], &header(u32::MAX, u32::MAX, u32::MAX)).unwrap_err();
        assert!(matches!(err, MapError::Truncated { .. }));
    }
}
