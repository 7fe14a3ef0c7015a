pub mod data;
pub mod envelope;
pub mod group;
pub mod header;
pub mod index;
pub mod item;
pub mod layer;

use uuid::Uuid;

use crate::{
    error::{MapError, Result},
    format::{
        data::{read_data_blocks, DataBlock},
        envelope::{EnvPoints, SMapItemEnvelope},
        group::SMapItemGroup,
        header::SDatafileHeader,
        index::{IndexTables, SItemType},
        item::{
            read_items, Content, Item, ItemKind, SMapItemImage, SMapItemInfo, SMapItemSound,
            SMapItemVersion,
        },
        layer::Layer,
    },
};

/// A fully decoded map file.
#[derive(Debug, Clone)]
pub struct MapFile {
    pub header: SDatafileHeader,
    pub item_types: Vec<SItemType>,
    /// Item offsets as stored; items are decoded sequentially.
    pub item_offsets: Vec<i32>,
    pub items: Vec<Item>,
    pub data_blocks: Vec<DataBlock>,
}

/// Decodes a complete map file held in memory.
pub fn parse(data: &[u8]) -> Result<MapFile> { MapFile::parse(data) }

macro_rules! content_iter {
    ($name:ident, $variant:ident, $ty:ty) => {
        pub fn $name(&self) -> impl Iterator<Item = &$ty> + '_ {
            self.items.iter().filter_map(|item| match &item.content {
                Content::$variant(v) => Some(v),
                _ => None,
            })
        }
    };
}

impl MapFile {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = SDatafileHeader::read(data)?;
        log::debug!("{header:?}");

        let mut pos = SDatafileHeader::SIZE;
        let tables = IndexTables::read(&data[pos..], &header)?;
        pos += header.index_size() as usize;

        let item_section = section(data, pos, header.item_size, "item section")?;
        pos += item_section.len();
        let data_section = section(data, pos, header.data_size, "data section")?;

        let items = read_items(item_section, header.num_items as usize, &tables.item_offsets)?;
        let data_blocks = read_data_blocks(&tables, header.data_size, data_section)?;

        let IndexTables { item_types, item_offsets, .. } = tables;
        Ok(Self { header, item_types, item_offsets, items, data_blocks })
    }

    /// Decompressed bytes of a data block.
    pub fn data_block(&self, index: i32) -> Result<&[u8]> {
        data::block_data(&self.data_blocks, index)
    }

    pub fn items_of_kind(&self, kind: ItemKind) -> impl Iterator<Item = &Item> + '_ {
        self.items.iter().filter(move |item| item.type_id == kind as u16)
    }

    pub fn find_item(&self, kind: ItemKind, id: u16) -> Option<&Item> {
        self.items_of_kind(kind).find(|item| item.id == id)
    }

    /// Item index range listed for `kind` in the type index.
    pub fn item_type_range(&self, kind: ItemKind) -> Option<std::ops::Range<usize>> {
        self.item_types.iter().find(|t| t.type_id == kind as i32).map(SItemType::range)
    }

    content_iter!(versions, Version, SMapItemVersion);
    content_iter!(infos, Info, SMapItemInfo);
    content_iter!(images, Image, SMapItemImage);
    content_iter!(envelopes, Envelope, SMapItemEnvelope);
    content_iter!(groups, Group, SMapItemGroup);
    content_iter!(layers, Layer, Layer);
    content_iter!(sounds, Sound, SMapItemSound);

    pub fn version(&self) -> Option<i32> { self.versions().next().map(|v| v.version) }

    pub fn info(&self) -> Option<&SMapItemInfo> { self.infos().next() }

    /// The envelope point storage, normally a single item.
    pub fn env_points(&self) -> Option<&EnvPoints> {
        self.items.iter().find_map(|item| match &item.content {
            Content::EnvPoints(p) => Some(p),
            _ => None,
        })
    }

    /// UUID registered for an extended item type id.
    pub fn ex_type_uuid(&self, type_id: u16) -> Option<Uuid> {
        self.items_of_kind(ItemKind::ExTypeIndex)
            .find(|item| item.id == type_id)
            .and_then(|item| match &item.content {
                Content::ExTypeIndex(ex) => Some(ex.uuid),
                _ => None,
            })
    }

    /// Layers belonging to a group, in drawing order.
    pub fn group_layers<'a>(&'a self, group: &SMapItemGroup) -> impl Iterator<Item = &'a Layer> {
        self.layers().skip(group.layer_range().start).take(group.layer_range().len())
    }
}

fn section<'a>(data: &'a [u8], start: usize, size: u32, context: &'static str) -> Result<&'a [u8]> {
    data.get(start..start + size as usize).ok_or(MapError::Truncated { context })
}
