//! Byte layout of a binary `.map` file.
//!
//! Every grid is a flat run of little-endian `i16`s; `area` and `version`
//! are single little-endian `i32`s. Offsets are part of the file format
//! and must not change.

use super::{MAP_SIZE, MINIMAP_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Map,
    Event,
    RoomType,
    RoomColor,
    RoomBg,
    Items,
    Area,
    Tiles(u8),
    Version,
}

/// Width in bytes of one element of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    I16,
    I32,
}

impl Element {
    pub fn width(self) -> usize {
        match self {
            Element::I16 => 2,
            Element::I32 => 4,
        }
    }
}

const TILES_0: usize = 602_704;
const TILES_STRIDE: usize = MAP_SIZE * 2;

impl Region {
    pub const ALL: [Region; 15] = [
        Region::Map,
        Region::Event,
        Region::RoomType,
        Region::RoomColor,
        Region::RoomBg,
        Region::Items,
        Region::Area,
        Region::Tiles(0),
        Region::Tiles(1),
        Region::Tiles(2),
        Region::Tiles(3),
        Region::Tiles(4),
        Region::Tiles(5),
        Region::Tiles(6),
        Region::Version,
    ];

    /// Byte offset of the first element.
    pub fn offset(self) -> usize {
        match self {
            Region::Map => 0,
            Region::Event => 200_000,
            Region::RoomType => 400_000,
            Region::RoomColor => 400_900,
            Region::RoomBg => 401_800,
            Region::Items => 402_700,
            Region::Area => 602_700,
            Region::Tiles(n) => TILES_0 + n as usize * TILES_STRIDE,
            Region::Version => 2_002_704,
        }
    }

    /// Number of elements.
    pub fn len(self) -> usize {
        match self {
            Region::Map | Region::Event | Region::Items | Region::Tiles(_) => MAP_SIZE,
            Region::RoomType | Region::RoomColor | Region::RoomBg => MINIMAP_SIZE,
            Region::Area | Region::Version => 1,
        }
    }

    pub fn element(self) -> Element {
        match self {
            Region::Area | Region::Version => Element::I32,
            _ => Element::I16,
        }
    }

    pub fn end(self) -> usize {
        self.address(self.len())
    }

    /// Byte address of element `index`.
    pub fn address(self, index: usize) -> usize {
        self.offset() + index * self.element().width()
    }
}

/// Smallest file that contains every region.
pub fn min_file_size() -> usize {
    Region::ALL.iter().map(|r| r.end()).max().unwrap_or(0)
}
