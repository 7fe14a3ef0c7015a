use std::{
    cell::OnceCell,
    fmt::{Debug, Formatter},
    io::{Cursor, Read, Seek, SeekFrom},
};

use binrw::{BinRead, BinResult, Endian};

use crate::{
    error::{MapError, Result},
    format::index::IndexTables,
    util::compression::decompress_zlib,
};

/// Index value marking an optional data reference as unset.
pub const NO_DATA: i32 = -1;

/// Maps the -1 sentinel of an index field to `None`.
#[inline]
pub fn optional_index(index: i32) -> Option<i32> { (index != NO_DATA).then_some(index) }

/// One entry of the data section.
#[derive(Clone, Debug)]
pub struct DataBlock {
    /// Offset of the compressed stream, relative to the data section.
    pub offset: i32,
    /// Length of the compressed stream.
    pub compressed_size: usize,
    /// Decompressed size as recorded in the index tables.
    pub size: i32,
    pub data: Vec<u8>,
}

/// Compressed span of block `index`: up to the next offset, or to the end
/// of the data section for the last block.
pub fn block_span(offsets: &[i32], data_size: u32, index: usize) -> Result<(usize, usize)> {
    let start = offsets[index];
    let end = match offsets.get(index + 1) {
        Some(&next) => next as i64,
        None => data_size as i64,
    };
    if start < 0 || end < start as i64 {
        return Err(MapError::format(format!(
            "Invalid span for data block {index}: {start}..{end}"
        )));
    }
    Ok((start as usize, end as usize))
}

/// Splits the data section into blocks and inflates each of them.
pub fn read_data_blocks(
    tables: &IndexTables,
    data_size: u32,
    section: &[u8],
) -> Result<Vec<DataBlock>> {
    let mut blocks = Vec::with_capacity(tables.data_offsets.len());
    for (index, &size) in tables.data_sizes.iter().enumerate() {
        let (start, end) = block_span(&tables.data_offsets, data_size, index)?;
        let compressed = section
            .get(start..end)
            .ok_or(MapError::Truncated { context: "data block" })?;
        let data = decompress_zlib(compressed, size.max(0) as usize)?;
        if data.len() != size as usize {
            log::warn!(
                "Data block {index} inflated to {} bytes, index table says {size}",
                data.len()
            );
        }
        log::debug!("Data block {index}: {:#X} -> {:#X}", compressed.len(), data.len());
        blocks.push(DataBlock { offset: start as i32, compressed_size: end - start, size, data });
    }
    Ok(blocks)
}

/// Looks up the decompressed bytes of a data block.
pub fn block_data(blocks: &[DataBlock], index: i32) -> Result<&[u8]> {
    usize::try_from(index)
        .ok()
        .and_then(|i| blocks.get(i))
        .map(|b| b.data.as_slice())
        .ok_or(MapError::DataIndex { index, count: blocks.len() })
}

/// A structured interpretation of a data block's bytes.
pub trait DataView: Sized {
    fn decode(data: &[u8]) -> Result<Self>;
}

/// Fixed-layout records packed back to back in a data block.
pub trait Record: for<'a> BinRead<Args<'a> = ()> {
    const NAME: &'static str;
}

/// Marker for references whose block is only ever consumed as raw bytes.
#[derive(Copy, Clone, Debug)]
pub enum Bytes {}

impl DataView for String {
    fn decode(data: &[u8]) -> Result<Self> {
        String::from_utf8(data.to_vec())
            .map_err(|e| MapError::format(format!("Invalid string data: {e}")))
    }
}

/// NUL-terminated strings. Unterminated trailing bytes form a final entry.
impl DataView for Vec<String> {
    fn decode(data: &[u8]) -> Result<Self> {
        let mut parts: Vec<&[u8]> = data.split(|&b| b == 0).collect();
        if data.last().map_or(true, |&b| b == 0) {
            parts.pop();
        }
        parts
            .into_iter()
            .map(|s| {
                String::from_utf8(s.to_vec())
                    .map_err(|e| MapError::format(format!("Invalid string data: {e}")))
            })
            .collect()
    }
}

impl<T: Record> DataView for Vec<T> {
    fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = Cursor::new(data);
        let mut out = Vec::new();
        while (reader.position() as usize) < data.len() {
            let record = T::read_options(&mut reader, Endian::Little, ())
                .map_err(|e| MapError::from_binrw(e, T::NAME))?;
            out.push(record);
        }
        Ok(out)
    }
}

/// Parser for fields appended by later format revisions: `None` when the
/// payload ends before the field, an error when it is only partly present.
pub fn trailing<R, T>(reader: &mut R, endian: Endian, _args: ()) -> BinResult<Option<T>>
where
    R: Read + Seek,
    T: for<'a> BinRead<Args<'a> = ()>,
{
    let pos = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(pos))?;
    if pos >= end {
        return Ok(None);
    }
    T::read_options(reader, endian, ()).map(Some)
}

/// A data index that may be -1, resolved and decoded on first access.
#[derive(Clone)]
pub struct OptionalRef<T> {
    pub index: i32,
    cache: OnceCell<Option<T>>,
}

/// A data index that must name a block, resolved and decoded on first access.
#[derive(Clone)]
pub struct DataRef<T> {
    pub index: i32,
    cache: OnceCell<T>,
}

impl<T> OptionalRef<T> {
    pub fn new(index: i32) -> Self { Self { index, cache: OnceCell::new() } }

    #[inline]
    pub fn is_set(&self) -> bool { self.index != NO_DATA }

    #[inline]
    pub fn index(&self) -> Option<i32> { self.is_set().then_some(self.index) }

    /// Raw block bytes, without decoding or caching.
    pub fn raw<'a>(&self, blocks: &'a [DataBlock]) -> Result<Option<&'a [u8]>> {
        match self.index() {
            Some(index) => block_data(blocks, index).map(Some),
            None => Ok(None),
        }
    }
}

impl<T: DataView> OptionalRef<T> {
    pub fn get(&self, blocks: &[DataBlock]) -> Result<Option<&T>> {
        if let Some(value) = self.cache.get() {
            return Ok(value.as_ref());
        }
        let value = match self.raw(blocks)? {
            Some(data) => Some(T::decode(data)?),
            None => None,
        };
        Ok(self.cache.get_or_init(|| value).as_ref())
    }
}

impl<T> DataRef<T> {
    pub fn new(index: i32) -> Self { Self { index, cache: OnceCell::new() } }

    /// Raw block bytes, without decoding or caching.
    pub fn raw<'a>(&self, blocks: &'a [DataBlock]) -> Result<&'a [u8]> {
        block_data(blocks, self.index)
    }
}

impl<T: DataView> DataRef<T> {
    pub fn get(&self, blocks: &[DataBlock]) -> Result<&T> {
        if let Some(value) = self.cache.get() {
            return Ok(value);
        }
        let value = T::decode(self.raw(blocks)?)?;
        Ok(self.cache.get_or_init(|| value))
    }
}

impl<T> Debug for OptionalRef<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.index() {
            Some(index) => write!(f, "data[{index}]"),
            None => f.write_str("None"),
        }
    }
}

impl<T> Debug for DataRef<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "data[{}]", self.index) }
}

impl<T> BinRead for OptionalRef<T> {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        Ok(Self::new(i32::read_options(reader, endian, ())?))
    }
}

impl<T> BinRead for DataRef<T> {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        Ok(Self::new(i32::read_options(reader, endian, ())?))
    }
}
