use std::ops::Range;

use binrw_derive::binread;

use crate::{
    format::data::trailing,
    util::{
        fixed::{Percent, TilePoint},
        name::ShortName,
    },
};

#[binread]
#[derive(Clone, Debug)]
pub struct SMapItemGroup {
    pub version: i32,
    pub offset: TilePoint,
    pub parallax: Percent,
    pub start_layer: i32,
    pub num_layers: i32,
    #[br(if(version >= 2), map = |v: i32| Some(v != 0))]
    pub use_clipping: Option<bool>,
    #[br(if(version >= 2))]
    pub clip_pos: Option<TilePoint>,
    #[br(if(version >= 2))]
    pub clip_size: Option<TilePoint>,
    #[br(parse_with = trailing)]
    pub name: Option<ShortName>,
}

impl SMapItemGroup {
    /// Indices of this group's layers among the layer items.
    pub fn layer_range(&self) -> Range<usize> {
        let start = self.start_layer.max(0) as usize;
        start..start + self.num_layers.max(0) as usize
    }

    pub fn is_clipping(&self) -> bool { self.use_clipping.unwrap_or(false) }
}
