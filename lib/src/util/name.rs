use std::{
    cell::OnceCell,
    fmt::{Debug, Formatter},
    io::{Read, Seek},
};

use binrw::{BinRead, BinResult, Endian};

use crate::error::{MapError, Result};

const MASK: u8 = 0x80;

/// A fixed-width name stored as `N` masked, byte-reversed 32-bit words.
///
/// Each word holds four characters in big-endian order with every byte
/// offset by 0x80. The final byte of the last word is a terminator slot and
/// never part of the name, so a name holds at most `N * 4 - 1` bytes.
#[derive(Clone)]
pub struct ObfuscatedName<const N: usize> {
    pub words: [i32; N],
    cache: OnceCell<String>,
}

/// Names of groups and layers.
pub type ShortName = ObfuscatedName<3>;
/// Names of envelopes.
pub type LongName = ObfuscatedName<8>;

impl<const N: usize> ObfuscatedName<N> {
    pub fn from_words(words: [i32; N]) -> Self { Self { words, cache: OnceCell::new() } }

    /// Encodes `name`, truncating it to the available width.
    pub fn from_name(name: &str) -> Self {
        let mut buf = vec![0u8; N * 4];
        let len = name.len().min(N * 4 - 1);
        buf[..len].copy_from_slice(&name.as_bytes()[..len]);
        let mut words = [0i32; N];
        for (word, chunk) in words.iter_mut().zip(buf.chunks_exact(4)) {
            let bytes = [chunk[0] ^ MASK, chunk[1] ^ MASK, chunk[2] ^ MASK, chunk[3] ^ MASK];
            *word = i32::from_be_bytes(bytes);
        }
        Self::from_words(words)
    }

    /// Decoded name, computed on first access.
    pub fn get(&self) -> Result<&str> {
        if let Some(name) = self.cache.get() {
            return Ok(name);
        }
        let name = decode_words(&self.words)?;
        Ok(self.cache.get_or_init(|| name))
    }
}

fn decode_words(words: &[i32]) -> Result<String> {
    let mut bytes = Vec::with_capacity(words.len() * 4);
    for word in words {
        bytes.extend(word.to_be_bytes().iter().map(|b| b ^ MASK));
    }
    // Terminator slot
    bytes.pop();
    if let Some(end) = bytes.iter().position(|&b| b == 0) {
        bytes.truncate(end);
    }
    String::from_utf8(bytes).map_err(|e| MapError::format(format!("Invalid name: {e}")))
}

impl<const N: usize> PartialEq for ObfuscatedName<N> {
    fn eq(&self, other: &Self) -> bool { self.words == other.words }
}

impl<const N: usize> Debug for ObfuscatedName<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.get() {
            Ok(name) => write!(f, "{name:?}"),
            Err(_) => write!(f, "{:?}", self.words),
        }
    }
}

impl<const N: usize> BinRead for ObfuscatedName<N> {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut words = [0i32; N];
        for word in &mut words {
            *word = i32::read_options(reader, endian, ())?;
        }
        Ok(Self::from_words(words))
    }
}
