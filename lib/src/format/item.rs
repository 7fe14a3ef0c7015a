use std::io::Cursor;

use binrw::{BinRead, BinReaderExt, Endian};
use binrw_derive::binread;
use uuid::Uuid;

use crate::{
    error::{MapError, Result},
    format::{
        data::{trailing, Bytes, DataBlock, DataRef, OptionalRef},
        envelope::{EnvPoints, SMapItemEnvelope},
        group::SMapItemGroup,
        layer::Layer,
    },
};

/// Item type tags with a known payload layout.
#[repr(u16)]
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Hash, strum::Display, strum::EnumIter, strum::FromRepr,
)]
pub enum ItemKind {
    Version = 0,
    Info = 1,
    Image = 2,
    Envelope = 3,
    Group = 4,
    Layer = 5,
    EnvPoints = 6,
    Sound = 7,
    ExTypeIndex = 0xFFFF,
}

impl ItemKind {
    #[inline]
    pub fn from_type_id(type_id: u16) -> Option<Self> { Self::from_repr(type_id) }
}

/// Per-item header in the item section.
#[binread]
#[derive(Copy, Clone, Debug)]
pub struct SItemHeader {
    pub id: u16,
    pub type_id: u16,
    pub size: i32,
}

impl SItemHeader {
    pub const SIZE: usize = 8;
}

#[binread]
#[derive(Clone, Debug)]
pub struct SMapItemVersion {
    pub version: i32,
}

#[binread]
#[derive(Clone, Debug)]
pub struct SMapItemInfo {
    pub version: i32,
    pub author: OptionalRef<String>,
    pub map_version: OptionalRef<String>,
    pub credits: OptionalRef<String>,
    pub license: OptionalRef<String>,
    /// Absent in maps written before server settings were stored.
    #[br(parse_with = trailing)]
    pub settings: Option<OptionalRef<Vec<String>>>,
}

impl SMapItemInfo {
    pub fn settings<'a>(&'a self, blocks: &[DataBlock]) -> Result<Option<&'a Vec<String>>> {
        match &self.settings {
            Some(settings) => settings.get(blocks),
            None => Ok(None),
        }
    }
}

#[binread]
#[repr(i32)]
#[br(repr(i32))]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EImageFormat {
    Rgb = 0,
    Rgba = 1,
}

#[binread]
#[br(return_all_errors)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ImageFormat {
    Known(EImageFormat),
    Unknown(i32),
}

#[binread]
#[derive(Clone, Debug)]
pub struct SMapItemImage {
    pub version: i32,
    pub width: i32,
    pub height: i32,
    #[br(map = |v: i32| v != 0)]
    pub external: bool,
    pub name: OptionalRef<String>,
    /// Unset for external images, which ship with the client.
    pub data: OptionalRef<Bytes>,
    /// Only written by version 2 and later.
    #[br(if(version >= 2))]
    pub format: Option<ImageFormat>,
}

impl SMapItemImage {
    /// Decompressed pixel data of an embedded image.
    pub fn embedded_data<'a>(&self, blocks: &'a [DataBlock]) -> Result<Option<&'a [u8]>> {
        if self.external {
            return Ok(None);
        }
        self.data.raw(blocks)
    }

    /// Pixel format; images older than version 2 are always RGBA.
    pub fn format(&self) -> ImageFormat {
        self.format.unwrap_or(ImageFormat::Known(EImageFormat::Rgba))
    }
}

#[binread]
#[derive(Clone, Debug)]
pub struct SMapItemSound {
    pub version: i32,
    #[br(map = |v: i32| v != 0)]
    pub external: bool,
    pub name: OptionalRef<String>,
    pub data: DataRef<Bytes>,
    #[br(parse_with = trailing)]
    pub data_size: Option<i32>,
}

impl SMapItemSound {
    /// Embedded opus stream.
    pub fn opus_data<'a>(&self, blocks: &'a [DataBlock]) -> Result<&'a [u8]> {
        self.data.raw(blocks)
    }
}

/// Stored as four words, each holding four UUID bytes in big-endian order.
fn uuid_from_words(words: [u32; 4]) -> Uuid {
    let mut bytes = [0u8; 16];
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    Uuid::from_bytes(bytes)
}

#[binread]
#[derive(Clone, Debug)]
pub struct SMapItemExTypeIndex {
    #[br(map = uuid_from_words)]
    pub uuid: Uuid,
}

/// Decoded payload of an item.
#[derive(Clone, Debug)]
pub enum Content {
    Version(SMapItemVersion),
    Info(SMapItemInfo),
    Image(SMapItemImage),
    Envelope(SMapItemEnvelope),
    Group(SMapItemGroup),
    Layer(Layer),
    EnvPoints(EnvPoints),
    Sound(SMapItemSound),
    ExTypeIndex(SMapItemExTypeIndex),
    /// Payload of an unrecognized type tag, as 32-bit words.
    Unknown(Vec<i32>),
}

#[derive(Clone, Debug)]
pub struct Item {
    pub id: u16,
    pub type_id: u16,
    /// Payload size in bytes.
    pub size: i32,
    pub content: Content,
}

impl Item {
    #[inline]
    pub fn kind(&self) -> Option<ItemKind> { ItemKind::from_type_id(self.type_id) }
}

/// Remaining bytes of a payload as 32-bit words.
#[binread]
#[derive(Clone, Debug)]
struct RawWords {
    #[br(parse_with = binrw::until_eof)]
    words: Vec<i32>,
}

/// Reads `data` as whole words. A partial last word is a read past the
/// payload bound.
pub(crate) fn read_words(data: &[u8], context: &'static str) -> Result<Vec<i32>> {
    if data.len() % 4 != 0 {
        return Err(MapError::Truncated { context });
    }
    let raw: RawWords = read_payload(data, context)?;
    Ok(raw.words)
}

fn read_payload<T>(payload: &[u8], context: &'static str) -> Result<T>
where T: for<'a> BinRead<Args<'a> = ()> {
    T::read_options(&mut Cursor::new(payload), Endian::Little, ())
        .map_err(|e| MapError::from_binrw(e, context))
}

/// Decodes an item payload according to its type tag.
pub fn decode_content(type_id: u16, payload: &[u8]) -> Result<Content> {
    let Some(kind) = ItemKind::from_type_id(type_id) else {
        log::warn!("Unknown item type {type_id:#X}, keeping {} raw bytes", payload.len());
        return Ok(Content::Unknown(read_words(payload, "unknown item")?));
    };
    Ok(match kind {
        ItemKind::Version => Content::Version(read_payload(payload, "version item")?),
        ItemKind::Info => Content::Info(read_payload(payload, "info item")?),
        ItemKind::Image => Content::Image(read_payload(payload, "image item")?),
        ItemKind::Envelope => Content::Envelope(read_payload(payload, "envelope item")?),
        ItemKind::Group => Content::Group(read_payload(payload, "group item")?),
        ItemKind::Layer => Content::Layer(Layer::read(payload)?),
        ItemKind::EnvPoints => Content::EnvPoints(EnvPoints::new(payload.to_vec())),
        ItemKind::Sound => Content::Sound(read_payload(payload, "sound item")?),
        ItemKind::ExTypeIndex => Content::ExTypeIndex(read_payload(payload, "ex type item")?),
    })
}

/// Walks the item section, decoding each item in turn.
pub fn read_items(section: &[u8], count: usize, offsets: &[i32]) -> Result<Vec<Item>> {
    let mut reader = Cursor::new(section);
    let mut items = Vec::with_capacity(count.min(section.len() / SItemHeader::SIZE));
    for index in 0..count {
        let pos = reader.position() as usize;
        if offsets.get(index).map_or(false, |&o| o as usize != pos) {
            log::warn!("Item {index} found at {pos:#X}, offset table says {:#X}", offsets[index]);
        }
        let header: SItemHeader = reader
            .read_type(Endian::Little)
            .map_err(|e| MapError::from_binrw(e, "item header"))?;
        let size = usize::try_from(header.size)
            .map_err(|_| MapError::format(format!("Item {index} has size {}", header.size)))?;
        let start = pos + SItemHeader::SIZE;
        let payload = section
            .get(start..start + size)
            .ok_or(MapError::Truncated { context: "item payload" })?;
        reader.set_position((start + size) as u64);

        let content = decode_content(header.type_id, payload)?;
        log::debug!("Item {index}: type {:#X} id {} size {size:#X}", header.type_id, header.id);
        items.push(Item { id: header.id, type_id: header.type_id, size: header.size, content });
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(values: &[i32]) -> Vec<u8> { values.iter().flat_map(|v| v.to_le_bytes()).collect() }

    #[test]
    fn kind_from_type_id() {
        assert_eq!(ItemKind::from_type_id(5), Some(ItemKind::Layer));
        assert_eq!(ItemKind::from_type_id(0xFFFF), Some(ItemKind::ExTypeIndex));
        assert_eq!(ItemKind::from_type_id(8), None);
    }

    #[test]
    fn info_without_settings() {
        let Content::Info(info) = decode_content(1, &words(&[1, 0, -1, -1, 1])).unwrap() else {
            panic!("expected info");
        };
        assert_eq!(info.author.index(), Some(0));
        assert!(!info.map_version.is_set());
        assert_eq!(info.license.index(), Some(1));
        assert!(info.settings.is_none());
        assert!(info.settings(&[]).unwrap().is_none());
    }

    #[test]
    fn info_with_settings() {
        let Content::Info(info) = decode_content(1, &words(&[1, -1, -1, -1, -1, 2])).unwrap()
        else {
            panic!("expected info");
        };
        assert_eq!(info.settings.as_ref().and_then(|s| s.index()), Some(2));
    }

    #[test]
    fn external_image() {
        let payload = words(&[1, 1024, 512, 1, 4, -1]);
        let Content::Image(image) = decode_content(2, &payload).unwrap() else {
            panic!("expected image");
        };
        assert_eq!((image.width, image.height), (1024, 512));
        assert!(image.external);
        assert_eq!(image.name.index(), Some(4));
        assert!(!image.data.is_set());
        assert!(image.format.is_none());
        assert_eq!(image.format(), ImageFormat::Known(EImageFormat::Rgba));
        assert!(image.embedded_data(&[]).unwrap().is_none());
    }

    #[test]
    fn image_with_format() {
        let payload = words(&[2, 16, 16, 0, 0, 1, 0]);
        let Content::Image(image) = decode_content(2, &payload).unwrap() else {
            panic!("expected image");
        };
        assert_eq!(image.format, Some(ImageFormat::Known(EImageFormat::Rgb)));
        assert_eq!(image.format(), ImageFormat::Known(EImageFormat::Rgb));
    }

    #[test]
    fn unrecognized_image_format_is_kept() {
        let payload = words(&[2, 16, 16, 0, -1, 0, 7]);
        let Content::Image(image) = decode_content(2, &payload).unwrap() else {
            panic!("expected image");
        };
        assert_eq!(image.format(), ImageFormat::Unknown(7));
    }

    #[test]
    fn version_two_image_requires_format() {
        let err = decode_content(2, &words(&[2, 16, 16, 0, -1, 0])).unwrap_err();
        assert!(matches!(err, MapError::Truncated { .. }), "{err:?}");
    }

    #[test]
    fn partial_settings_reference_is_truncated() {
        let mut payload = words(&[1, -1, -1, -1, -1]);
        payload.extend([0x02, 0x00]);
        let err = decode_content(1, &payload).unwrap_err();
        assert!(matches!(err, MapError::Truncated { .. }), "{err:?}");
    }

    #[test]
    fn sound_item() {
        let Content::Sound(sound) = decode_content(7, &words(&[1, 0, 3, 4, 1000])).unwrap() else {
            panic!("expected sound");
        };
        assert!(!sound.external);
        assert_eq!(sound.data.index, 4);
        assert_eq!(sound.data_size, Some(1000));
    }

    #[test]
    fn ex_type_index_uuid() {
        let payload = words(&[0x3E1B2716, 0x178C3978, 0x9BD9B11Au32 as i32, 0xE1FEBE61u32 as i32]);
        let Content::ExTypeIndex(ex) = decode_content(0xFFFF, &payload).unwrap() else {
            panic!("expected ex type index");
        };
        assert_eq!(ex.uuid.to_string(), "3e1b2716-178c-3978-9bd9-b11ae1febe61");
    }

    #[test]
    fn unknown_type_keeps_words() {
        let content = decode_content(9999, &words(&[7, -1, 42])).unwrap();
        assert!(matches!(content, Content::Unknown(w) if w == [7, -1, 42]));
    }

    #[test]
    fn unknown_type_with_partial_word_is_truncated() {
        let mut payload = words(&[1, 2]);
        payload.extend([0xAA, 0xBB]);
        let err = decode_content(9999, &payload).unwrap_err();
        assert!(matches!(err, MapError::Truncated { .. }), "{err:?}");
    }

    #[test]
    fn short_payload_is_truncated() {
        let err = decode_content(2, &words(&[1, 64, 64])).unwrap_err();
        assert!(matches!(err, MapError::Truncated { .. }), "{err:?}");
    }

    #[test]
    fn walks_items_sequentially() {
        let mut section = Vec::new();
        section.extend(words(&[3, 4, 1]));
        section.extend(words(&[(0x1234 << 16) | 9, 8, 5, 6]));
        let items = read_items(&section, 2, &[0, 12]).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!((items[0].id, items[0].type_id), (3, 0));
        assert!(matches!(items[0].content, Content::Version(SMapItemVersion { version: 1 })));
        assert_eq!((items[1].id, items[1].type_id), (9, 0x1234));
        assert!(items[1].kind().is_none());
    }

    #[test]
    fn payload_past_section_is_truncated() {
        let section = words(&[0, 8, 1]);
        let err = read_items(&section, 1, &[0]).unwrap_err();
        assert!(matches!(err, MapError::Truncated { .. }));
    }

    #[test]
    fn negative_size_is_format_error() {
        let section = words(&[0, -4]);
        assert!(matches!(read_items(&section, 1, &[0]), Err(MapError::Format(_))));
    }
}
