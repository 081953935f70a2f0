//! Read access to a binary `.map` file held in memory.

use byteorder::{ByteOrder, LittleEndian};
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::model::layout::{self, Element, Region};

/// The whole file. Regions are read and written in place, so bytes the
/// converter does not own are carried through untouched.
#[derive(Debug, Clone)]
pub struct MapFile {
    bytes: Vec<u8>,
}

impl MapFile {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let min = layout::min_file_size();
        if bytes.len() < min {
            return Err(ConvertError::FileTooSmall { len: bytes.len(), min });
        }
        Ok(MapFile { bytes })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| ConvertError::io(path, e))?;
        tracing::debug!(path = %path.display(), len = bytes.len(), "map file loaded");
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn span(&self, region: Region) -> &[u8] {
        &self.bytes[region.offset()..region.end()]
    }

    fn span_mut(&mut self, region: Region) -> &mut [u8] {
        &mut self.bytes[region.offset()..region.end()]
    }

    /// All `i16` elements of a grid region.
    pub fn read_grid(&self, region: Region) -> Vec<i16> {
        debug_assert_eq!(region.element(), Element::I16);
        let mut data = vec![0i16; region.len()];
        LittleEndian::read_i16_into(self.span(region), &mut data);
        data
    }

    pub fn read_scalar(&self, region: Region) -> i32 {
        debug_assert_eq!(region.element(), Element::I32);
        LittleEndian::read_i32(self.span(region))
    }

    /// Overwrite a grid region; `data` must hold exactly `region.len()` cells.
    pub fn write_grid(&mut self, region: Region, data: &[i16]) {
        debug_assert_eq!(region.element(), Element::I16);
        LittleEndian::write_i16_into(data, self.span_mut(region));
    }

    pub fn write_scalar(&mut self, region: Region, value: i32) {
        debug_assert_eq!(region.element(), Element::I32);
        LittleEndian::write_i32(self.span_mut(region), value);
    }
}
