use std::io::Cursor;

use binrw::{BinReaderExt, Endian};
use binrw_derive::binread;

use crate::{
    error::{MapError, Result},
    format::{
        data::{optional_index, trailing, DataBlock, DataRef, OptionalRef, Record},
        item::read_words,
    },
    util::{
        fixed::{FxPoint, WorldPoint},
        name::ShortName,
    },
};

#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, strum::Display, strum::FromRepr)]
pub enum ELayerType {
    Invalid = 0,
    Game = 1,
    Tiles = 2,
    Quads = 3,
    Front = 4,
    Tele = 5,
    Speedup = 6,
    Switch = 7,
    Tune = 8,
    SoundsDeprecated = 9,
    Sounds = 10,
}

/// Shared prefix of every layer item.
#[binread]
#[derive(Copy, Clone, Debug)]
pub struct SLayerHeader {
    /// Legacy field, ignored by every client.
    pub version: i32,
    pub kind: i32,
    pub flags: i32,
}

impl SLayerHeader {
    pub const FLAG_DETAIL: i32 = 1;

    #[inline]
    pub fn kind(&self) -> Option<ELayerType> { ELayerType::from_repr(self.kind) }

    /// Detail layers are skipped by clients on low quality settings.
    #[inline]
    pub fn is_detail(&self) -> bool { self.flags & Self::FLAG_DETAIL != 0 }
}

#[binread]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Color {
    pub r: i32,
    pub g: i32,
    pub b: i32,
    pub a: i32,
}

/// Marks which special purpose a tile layer serves.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TilemapFlags(pub i32);

impl TilemapFlags {
    pub const GAME: i32 = 1;
    pub const TELE: i32 = 2;
    pub const SPEEDUP: i32 = 4;
    pub const FRONT: i32 = 8;
    pub const SWITCH: i32 = 16;
    pub const TUNE: i32 = 32;

    #[inline]
    pub fn contains(&self, flag: i32) -> bool { self.0 & flag != 0 }

    pub fn is_game(&self) -> bool { self.contains(Self::GAME) }

    pub fn is_tele(&self) -> bool { self.contains(Self::TELE) }

    pub fn is_speedup(&self) -> bool { self.contains(Self::SPEEDUP) }

    pub fn is_front(&self) -> bool { self.contains(Self::FRONT) }

    pub fn is_switch(&self) -> bool { self.contains(Self::SWITCH) }

    pub fn is_tune(&self) -> bool { self.contains(Self::TUNE) }

    /// Whether this is an ordinary design layer.
    pub fn is_design(&self) -> bool { self.0 == 0 }
}

#[binread]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Tile {
    pub index: u8,
    pub flags: u8,
    pub skip: u8,
    pub reserved: u8,
}

impl Record for Tile {
    const NAME: &'static str = "tile";
}

#[binread]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TeleTile {
    pub number: u8,
    pub kind: u8,
}

impl Record for TeleTile {
    const NAME: &'static str = "tele tile";
}

#[binread]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SpeedupTile {
    pub force: u8,
    pub max_speed: u8,
    pub kind: u8,
    pub padding: u8,
    pub angle: i16,
}

impl Record for SpeedupTile {
    const NAME: &'static str = "speedup tile";
}

#[binread]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SwitchTile {
    pub number: u8,
    pub kind: u8,
    pub flags: u8,
    pub delay: u8,
}

impl Record for SwitchTile {
    const NAME: &'static str = "switch tile";
}

#[binread]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TuneTile {
    pub number: u8,
    pub kind: u8,
}

impl Record for TuneTile {
    const NAME: &'static str = "tune tile";
}

#[binread]
#[derive(Clone, Debug)]
pub struct SLayerTilemap {
    pub version: i32,
    pub width: i32,
    pub height: i32,
    #[br(map = TilemapFlags)]
    pub flags: TilemapFlags,
    pub color: Color,
    #[br(map = optional_index)]
    pub color_env: Option<i32>,
    pub color_env_offset: i32,
    #[br(map = optional_index)]
    pub image: Option<i32>,
    pub data: DataRef<Vec<Tile>>,
    #[br(parse_with = trailing)]
    pub name: Option<ShortName>,
    // Added one at a time by later clients; each may be missing.
    #[br(parse_with = trailing)]
    pub tele: Option<OptionalRef<Vec<TeleTile>>>,
    #[br(parse_with = trailing)]
    pub speedup: Option<OptionalRef<Vec<SpeedupTile>>>,
    #[br(parse_with = trailing)]
    pub front: Option<OptionalRef<Vec<Tile>>>,
    #[br(parse_with = trailing)]
    pub switch: Option<OptionalRef<Vec<SwitchTile>>>,
    #[br(parse_with = trailing)]
    pub tune: Option<OptionalRef<Vec<TuneTile>>>,
}

fn resolve_trailing<'a, T>(
    field: &'a Option<OptionalRef<Vec<T>>>,
    blocks: &[DataBlock],
) -> Result<Option<&'a [T]>>
where
    T: Record,
{
    match field {
        Some(r) => Ok(r.get(blocks)?.map(Vec::as_slice)),
        None => Ok(None),
    }
}

impl SLayerTilemap {
    pub fn tiles(&self, blocks: &[DataBlock]) -> Result<&[Tile]> {
        Ok(self.data.get(blocks)?.as_slice())
    }

    pub fn tele_tiles(&self, blocks: &[DataBlock]) -> Result<Option<&[TeleTile]>> {
        resolve_trailing(&self.tele, blocks)
    }

    pub fn speedup_tiles(&self, blocks: &[DataBlock]) -> Result<Option<&[SpeedupTile]>> {
        resolve_trailing(&self.speedup, blocks)
    }

    pub fn front_tiles(&self, blocks: &[DataBlock]) -> Result<Option<&[Tile]>> {
        resolve_trailing(&self.front, blocks)
    }

    pub fn switch_tiles(&self, blocks: &[DataBlock]) -> Result<Option<&[SwitchTile]>> {
        resolve_trailing(&self.switch, blocks)
    }

    pub fn tune_tiles(&self, blocks: &[DataBlock]) -> Result<Option<&[TuneTile]>> {
        resolve_trailing(&self.tune, blocks)
    }

    #[inline]
    pub fn tile_count(&self) -> usize { self.width.max(0) as usize * self.height.max(0) as usize }
}

#[binread]
#[derive(Clone, Debug, PartialEq)]
pub struct Quad {
    pub corners: [WorldPoint; 4],
    pub center: WorldPoint,
    pub colors: [Color; 4],
    pub tex_coords: [FxPoint; 4],
    #[br(map = optional_index)]
    pub pos_env: Option<i32>,
    pub pos_env_offset: i32,
    #[br(map = optional_index)]
    pub color_env: Option<i32>,
    pub color_env_offset: i32,
}

impl Record for Quad {
    const NAME: &'static str = "quad";
}

#[binread]
#[derive(Clone, Debug)]
pub struct SLayerQuads {
    pub version: i32,
    pub num_quads: i32,
    pub data: DataRef<Vec<Quad>>,
    #[br(map = optional_index)]
    pub image: Option<i32>,
    #[br(if(version >= 2))]
    pub name: Option<ShortName>,
}

impl SLayerQuads {
    pub fn quads(&self, blocks: &[DataBlock]) -> Result<&[Quad]> {
        Ok(self.data.get(blocks)?.as_slice())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SoundShape {
    /// Width and height.
    Rectangle(WorldPoint),
    /// Radius in pixels.
    Circle(i32),
    Unknown { kind: i32, words: [i32; 2] },
}

impl SoundShape {
    fn from_words([kind, a, b]: [i32; 3]) -> Self {
        match kind {
            0 => Self::Rectangle(WorldPoint::new(a, b)),
            1 => Self::Circle(a),
            _ => Self::Unknown { kind, words: [a, b] },
        }
    }
}

#[binread]
#[derive(Clone, Debug, PartialEq)]
pub struct SoundSource {
    pub position: WorldPoint,
    #[br(map = |v: i32| v != 0)]
    pub looped: bool,
    #[br(map = |v: i32| v != 0)]
    pub panning: bool,
    /// Seconds.
    pub delay: i32,
    /// 0 to 255.
    pub falloff: i32,
    #[br(map = optional_index)]
    pub pos_env: Option<i32>,
    pub pos_env_offset: i32,
    #[br(map = optional_index)]
    pub sound_env: Option<i32>,
    pub sound_env_offset: i32,
    #[br(map = SoundShape::from_words)]
    pub shape: SoundShape,
}

impl Record for SoundSource {
    const NAME: &'static str = "sound source";
}

#[binread]
#[derive(Clone, Debug)]
pub struct SLayerSounds {
    pub version: i32,
    pub num_sources: i32,
    pub data: DataRef<Vec<SoundSource>>,
    #[br(map = optional_index)]
    pub sound: Option<i32>,
    pub name: ShortName,
}

impl SLayerSounds {
    pub fn sources(&self, blocks: &[DataBlock]) -> Result<&[SoundSource]> {
        Ok(self.data.get(blocks)?.as_slice())
    }
}

#[derive(Clone, Debug)]
pub enum LayerData {
    Tilemap(SLayerTilemap),
    Quads(SLayerQuads),
    Sounds(SLayerSounds),
    /// Remaining payload of a layer kind without a known layout.
    Unknown(Vec<i32>),
}

#[derive(Clone, Debug)]
pub struct Layer {
    pub header: SLayerHeader,
    pub data: LayerData,
}

impl Layer {
    pub fn read(payload: &[u8]) -> Result<Self> {
        let mut reader = Cursor::new(payload);
        let header: SLayerHeader =
            reader.read_type(Endian::Little).map_err(|e| MapError::from_binrw(e, "layer header"))?;
        let data = match header.kind() {
            Some(ELayerType::Tiles) => LayerData::Tilemap(
                reader.read_type(Endian::Little).map_err(|e| MapError::from_binrw(e, "tile layer"))?,
            ),
            Some(ELayerType::Quads) => LayerData::Quads(
                reader.read_type(Endian::Little).map_err(|e| MapError::from_binrw(e, "quad layer"))?,
            ),
            Some(ELayerType::Sounds) => LayerData::Sounds(
                reader
                    .read_type(Endian::Little)
                    .map_err(|e| MapError::from_binrw(e, "sound layer"))?,
            ),
            _ => {
                log::warn!("Unknown layer type {}", header.kind);
                let rest = &payload[reader.position() as usize..];
                LayerData::Unknown(read_words(rest, "unknown layer")?)
            }
        };
        Ok(Self { header, data })
    }

    pub fn name(&self) -> Option<&ShortName> {
        match &self.data {
            LayerData::Tilemap(t) => t.name.as_ref(),
            LayerData::Quads(q) => q.name.as_ref(),
            LayerData::Sounds(s) => Some(&s.name),
            LayerData::Unknown(_) => None,
        }
    }
}
