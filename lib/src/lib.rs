//! Decoder for the datafile container used by Teeworlds and DDNet maps.
//!
//! [`parse`] turns a complete file into a [`MapFile`]: the header, the
//! item list with every payload decoded by kind, and the inflated data
//! blocks. Strings, quads, tiles, sound sources and envelope points are
//! stored in data blocks and decoded lazily through the references held
//! by each item.
pub mod error;
pub mod format;
pub mod util;

pub use error::{MapError, Result};
pub use format::{parse, MapFile};
