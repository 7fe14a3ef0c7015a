use std::cell::OnceCell;

use binrw_derive::binread;

use crate::{
    error::Result,
    format::data::{trailing, DataView, Record},
    util::{
        fixed::{FxPoint, DIV_FX},
        name::LongName,
    },
};

#[binread]
#[repr(i32)]
#[br(repr(i32))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EEnvelopeChannels {
    Volume = 1,
    Position = 3,
    Color = 4,
}

#[binread]
#[br(return_all_errors)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EnvelopeKind {
    Known(EEnvelopeChannels),
    Unknown(i32),
}

#[binread]
#[derive(Clone, Debug)]
pub struct SMapItemEnvelope {
    pub version: i32,
    pub kind: EnvelopeKind,
    pub start_point: i32,
    pub num_points: i32,
    #[br(parse_with = trailing)]
    pub name: Option<LongName>,
    #[br(if(version >= 2), map = |v: i32| Some(v != 0))]
    pub synchronized: Option<bool>,
}

impl SMapItemEnvelope {
    /// This envelope's slice of a decoded point list.
    pub fn points<'a, T>(&self, all: &'a [T]) -> &'a [T] {
        let start = (self.start_point.max(0) as usize).min(all.len());
        let end = (start + self.num_points.max(0) as usize).min(all.len());
        &all[start..end]
    }
}

#[binread]
#[repr(i32)]
#[br(repr(i32))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ECurveType {
    Step = 0,
    Linear = 1,
    Slow = 2,
    Fast = 3,
    Smooth = 4,
    Bezier = 5,
}

#[binread]
#[br(return_all_errors)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CurveKind {
    Known(ECurveType),
    Unknown(i32),
}

#[binread]
#[derive(Clone, Debug, PartialEq)]
pub struct EnvPoint {
    /// Milliseconds.
    pub time: i32,
    pub curve: CurveKind,
    /// Channel values in 22.10 fixed point.
    pub values: [i32; 4],
}

impl EnvPoint {
    #[inline]
    pub fn value(&self, channel: usize) -> f64 { self.values[channel] as f64 / DIV_FX as f64 }
}

impl Record for EnvPoint {
    const NAME: &'static str = "envelope point";
}

#[binread]
#[derive(Clone, Debug, PartialEq)]
pub struct EnvPointBezier {
    pub point: EnvPoint,
    pub in_tangent: FxPoint,
    pub out_tangent: FxPoint,
}

impl Record for EnvPointBezier {
    const NAME: &'static str = "bezier envelope point";
}

/// Envelope point storage. The layout depends on the version of the
/// client that wrote the map and is not recorded in the item, so both
/// interpretations are offered and the caller picks one.
#[derive(Clone, Debug)]
pub struct EnvPoints {
    pub raw: Vec<u8>,
    points: OnceCell<Vec<EnvPoint>>,
    bezier_points: OnceCell<Vec<EnvPointBezier>>,
}

impl EnvPoints {
    pub fn new(raw: Vec<u8>) -> Self {
        Self { raw, points: OnceCell::new(), bezier_points: OnceCell::new() }
    }

    /// Interprets the item as plain points.
    pub fn points(&self) -> Result<&[EnvPoint]> {
        if let Some(points) = self.points.get() {
            return Ok(points);
        }
        let points = Vec::<EnvPoint>::decode(&self.raw)?;
        Ok(self.points.get_or_init(|| points))
    }

    /// Interprets the item as points each followed by bezier handles.
    pub fn bezier_points(&self) -> Result<&[EnvPointBezier]> {
        if let Some(points) = self.bezier_points.get() {
            return Ok(points);
        }
        let points = Vec::<EnvPointBezier>::decode(&self.raw)?;
        Ok(self.bezier_points.get_or_init(|| points))
    }
}
