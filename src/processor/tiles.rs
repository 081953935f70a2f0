//! Per-cell codecs for the collision layer and the seven tile layers.
//!
//! Document GIDs are `u32`: bit 31 marks a negative (vertically flipped)
//! raw value, bit 30 marks the alternate tileset (raw value ≥ 5000) and
//! the low 16 bits hold the 1-based id inside the tileset.

use crate::model::{ALT_TILESET_THRESHOLD, COLLISION_TILESET_OFFSET, Tileset};

pub const FLAG_FLIP: u32 = 0x8000_0000;
pub const FLAG_ALT: u32 = 0x4000_0000;
pub const FLAG_MASK: u32 = FLAG_FLIP | FLAG_ALT;
/// Bits between the flags and the id that the map format has no use for.
pub const UNUSED_BITS: u32 = 0x3FFF_0000;
pub const ID_MASK: u32 = 0x0000_FFFF;
const ID_SPACE: u32 = ID_MASK + 1;

/// Every 32 raw tile indices are packed into 30 editor indices.
const RAW_ROW: i32 = 32;
const PACKED_ROW: i32 = 30;

/// Half-open GID interval `[firstgid, firstgid + span)` owned by one tileset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilesetRange {
    pub firstgid: u32,
    pub span: u32,
}

impl TilesetRange {
    pub fn contains(&self, id: u32) -> bool {
        id >= self.firstgid && id - self.firstgid < self.span
    }

    pub fn last(&self) -> u32 {
        self.firstgid + self.span.saturating_sub(1)
    }
}

/// Ranges of the two tilesets the converter cares about.
#[derive(Debug, Clone, Copy, Default)]
pub struct TilesetRanges {
    pub tiles: Option<TilesetRange>,
    pub collision: Option<TilesetRange>,
}

pub const TILES_TILESET: &str = "TILE_A";
pub const COLLISION_TILESET: &str = "collision";

/// Sort every declared firstgid; each tileset spans up to the next one,
/// the last one up to the end of the 16-bit id space.
pub fn resolve_tilesets(tilesets: &[Tileset]) -> TilesetRanges {
    let mut starts: Vec<u32> = tilesets.iter().map(|t| t.firstgid).collect();
    starts.sort_unstable();
    starts.dedup();

    let range_of = |firstgid: u32| {
        let end = starts
            .iter()
            .copied()
            .find(|&s| s > firstgid)
            .unwrap_or(ID_SPACE.max(firstgid));
        TilesetRange { firstgid, span: end - firstgid }
    };

    let find = |needle: &str| tilesets.iter().find(|t| t.matches(needle)).map(|t| range_of(t.firstgid));

    TilesetRanges {
        tiles: find(TILES_TILESET),
        collision: find(COLLISION_TILESET),
    }
}

/// Why a document cell could not be turned back into a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellError {
    /// The id is not inside the tileset the layer draws from.
    OutOfRange,
    /// The id decodes to something a 16-bit cell cannot hold.
    Overflow,
    /// The id names the tileset's first tile, which stands for an empty cell.
    Blank,
}

// ─────────────────────────────────────────────────────
// Collision
// ─────────────────────────────────────────────────────

/// Raw collision value → GID. `None` for negative values, which the
/// collision tileset cannot represent.
pub fn encode_collision(value: i16) -> Option<u32> {
    if value == 0 {
        return Some(0);
    }
    if value < 0 {
        return None;
    }
    Some((value as i32 + COLLISION_TILESET_OFFSET) as u32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionCell {
    pub value: i16,
    /// Collision tiles must not be flipped; the flags are ignored.
    pub flipped: bool,
}

pub fn decode_collision(gid: u32, range: TilesetRange) -> Result<CollisionCell, CellError> {
    if gid == 0 {
        return Ok(CollisionCell { value: 0, flipped: false });
    }
    let flipped = gid & FLAG_MASK != 0;
    let id = gid & ID_MASK;
    if !range.contains(id) {
        return Err(CellError::OutOfRange);
    }
    let value = id - range.firstgid;
    if value == 0 {
        return Err(CellError::Blank);
    }
    let value = i16::try_from(value).map_err(|_| CellError::Overflow)?;
    Ok(CollisionCell { value, flipped })
}

// ─────────────────────────────────────────────────────
// Tiles
// ─────────────────────────────────────────────────────

/// Raw tile value → GID relative to a tileset starting at `firstgid`.
pub fn encode_tile(value: i16, firstgid: u32) -> u32 {
    if value == 0 {
        return 0;
    }
    let mut flags = 0;
    let mut index = value as i32;
    if index < 0 {
        flags |= FLAG_FLIP;
        index = -index;
    }
    if index >= ALT_TILESET_THRESHOLD {
        flags |= FLAG_ALT;
        index -= ALT_TILESET_THRESHOLD;
    }
    index -= 2 * (index / RAW_ROW);
    flags | (firstgid + index as u32)
}

/// The last two raw columns of every 32 have no editor id; such values
/// encode to the id of the next row and cannot come back unchanged.
pub fn tile_round_trips(value: i16) -> bool {
    let mut index = (value as i32).abs();
    if index >= ALT_TILESET_THRESHOLD {
        index -= ALT_TILESET_THRESHOLD;
    }
    index % RAW_ROW < PACKED_ROW
}

pub fn decode_tile(gid: u32, range: TilesetRange) -> Result<i16, CellError> {
    if gid == 0 {
        return Ok(0);
    }
    let id = gid & ID_MASK;
    if !range.contains(id) {
        return Err(CellError::OutOfRange);
    }
    let packed = (id - range.firstgid) as i32;
    let mut value = packed + 2 * (packed / PACKED_ROW);
    if gid & FLAG_ALT != 0 {
        value += ALT_TILESET_THRESHOLD;
    }
    if value == 0 {
        return Err(CellError::Blank);
    }
    if gid & FLAG_FLIP != 0 {
        value = -value;
    }
    i16::try_from(value).map_err(|_| CellError::Overflow)
}
