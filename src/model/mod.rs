// numeric constants that describe the map grid
pub const MAP_W: usize = 500;
pub const MAP_H: usize = 200;
pub const MAP_SIZE: usize = MAP_W * MAP_H; // 100000

pub const TILE_PX: u32 = 32;

// minimap: 25 columns of 18 rooms each
pub const MINIMAP_ROWS: usize = 18;
pub const MINIMAP_COLS: usize = 25;
pub const MINIMAP_SIZE: usize = MINIMAP_ROWS * MINIMAP_COLS; // 450
pub const ROOM_PX_W: u32 = 640;

/// Added to raw collision values so they land in the collision tileset.
pub const COLLISION_TILESET_OFFSET: i32 = 5000;
/// Raw tile values at or above this select the alternate tileset.
pub const ALT_TILESET_THRESHOLD: i32 = 5000;

pub const TILE_A_FIRSTGID: u32 = 1;
pub const COLLISION_FIRSTGID: u32 = COLLISION_TILESET_OFFSET as u32;

pub mod document;
pub mod layout;
pub mod properties;

pub use document::{Document, Layer, MapObject, ObjectLayer, TileLayer, Tileset};
pub use layout::Region;

/// Every layer the converter knows about, in the order it is written
/// to the document (this is also the draw order in the editor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerName {
    Collision,
    Event,
    Items,
    RoomType,
    RoomColor,
    RoomBg,
    Tiles(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Collision,
    Tiles,
    Objects,
    Minimap,
}

impl LayerName {
    pub const DRAW_ORDER: [LayerName; 13] = [
        LayerName::Collision,
        LayerName::Event,
        LayerName::Items,
        LayerName::RoomType,
        LayerName::RoomColor,
        LayerName::RoomBg,
        LayerName::Tiles(0),
        LayerName::Tiles(3),
        LayerName::Tiles(4),
        LayerName::Tiles(1),
        LayerName::Tiles(5),
        LayerName::Tiles(6),
        LayerName::Tiles(2),
    ];

    pub fn parse(name: &str) -> Option<LayerName> {
        let layer = match name {
            "collision" => LayerName::Collision,
            "event" => LayerName::Event,
            "items" => LayerName::Items,
            "roomtype" => LayerName::RoomType,
            "roomcolor" => LayerName::RoomColor,
            "roombg" => LayerName::RoomBg,
            other => {
                let n: u8 = other.strip_prefix("tiles")?.parse().ok()?;
                if n > 6 {
                    return None;
                }
                LayerName::Tiles(n)
            }
        };
        Some(layer)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayerName::Collision => "collision",
            LayerName::Event => "event",
            LayerName::Items => "items",
            LayerName::RoomType => "roomtype",
            LayerName::RoomColor => "roomcolor",
            LayerName::RoomBg => "roombg",
            LayerName::Tiles(n) => ["tiles0", "tiles1", "tiles2", "tiles3", "tiles4", "tiles5", "tiles6"]
                [n.min(6) as usize],
        }
    }

    pub fn kind(self) -> LayerKind {
        match self {
            LayerName::Collision => LayerKind::Collision,
            LayerName::Event | LayerName::Items => LayerKind::Objects,
            LayerName::RoomType | LayerName::RoomColor | LayerName::RoomBg => LayerKind::Minimap,
            LayerName::Tiles(_) => LayerKind::Tiles,
        }
    }

    /// Minimap layers may be left out of a document; everything else must be present.
    pub fn is_required(self) -> bool {
        self.kind() != LayerKind::Minimap
    }

    pub fn region(self) -> Region {
        match self {
            LayerName::Collision => Region::Map,
            LayerName::Event => Region::Event,
            LayerName::Items => Region::Items,
            LayerName::RoomType => Region::RoomType,
            LayerName::RoomColor => Region::RoomColor,
            LayerName::RoomBg => Region::RoomBg,
            LayerName::Tiles(n) => Region::Tiles(n),
        }
    }
}

impl std::fmt::Display for LayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
