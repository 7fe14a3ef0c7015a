use std::{
    fmt::{Debug, Formatter},
    io::{Read, Seek},
};

use binrw::{BinRead, BinResult, Endian};

/// Divisor for group offsets and clip rectangles (pixels to tiles).
pub const DIV_TILE: i32 = 32;
/// Divisor for group parallax (percent).
pub const DIV_PERCENT: i32 = 100;
/// Divisor for 22.10 fixed-point values (texture coordinates, bezier handles).
pub const DIV_FX: i32 = 1024;
/// Divisor for world positions stored as 22.10 fixed-point pixels.
pub const DIV_WORLD: i32 = 1024 * 32;

/// A pair of raw integers representing a real 2D value as `raw / DIV`.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct FixedPoint<const DIV: i32> {
    pub x_raw: i32,
    pub y_raw: i32,
}

pub type TilePoint = FixedPoint<DIV_TILE>;
pub type Percent = FixedPoint<DIV_PERCENT>;
pub type FxPoint = FixedPoint<DIV_FX>;
pub type WorldPoint = FixedPoint<DIV_WORLD>;

impl<const DIV: i32> FixedPoint<DIV> {
    pub const DIVISOR: i32 = DIV;

    #[inline]
    pub const fn new(x_raw: i32, y_raw: i32) -> Self { Self { x_raw, y_raw } }

    #[inline]
    pub fn x(&self) -> f64 { self.x_raw as f64 / DIV as f64 }

    #[inline]
    pub fn y(&self) -> f64 { self.y_raw as f64 / DIV as f64 }

    #[inline]
    pub fn to_f64(&self) -> (f64, f64) { (self.x(), self.y()) }
}

impl<const DIV: i32> Debug for FixedPoint<DIV> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x(), self.y())
    }
}

impl<const DIV: i32> BinRead for FixedPoint<DIV> {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let x_raw = i32::read_options(reader, endian, ())?;
        let y_raw = i32::read_options(reader, endian, ())?;
        Ok(Self { x_raw, y_raw })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use binrw::BinReaderExt;

    use super::*;

    #[test]
    fn divides_as_float() {
        let p = FixedPoint::<32>::new(3200, -3200);
        assert_eq!(p.x(), 100.0);
        assert_eq!(p.y(), -100.0);

        let p = FxPoint::new(512, 1);
        assert_eq!(p.x(), 0.5);
        assert_eq!(p.y(), 1.0 / 1024.0);
    }

    #[test]
    fn world_divisor() {
        let p = WorldPoint::new(DIV_WORLD * 3, -(DIV_WORLD / 2));
        assert_eq!(p.to_f64(), (3.0, -0.5));
    }

    #[test]
    fn reads_little_endian_pair() {
        let bytes = [0x80, 0x0C, 0x00, 0x00, 0x9C, 0xFF, 0xFF, 0xFF];
        let p: Percent = Cursor::new(&bytes).read_type(Endian::Little).unwrap();
        assert_eq!(p.x_raw, 3200);
        assert_eq!(p.y_raw, -100);
        assert_eq!(p.x(), 32.0);
        assert_eq!(p.y(), -1.0);
    }
}
