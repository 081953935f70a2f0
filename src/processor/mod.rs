//! The conversion passes: binary map → editable document and back.
//!
//! Neither direction keeps state between calls; warnings go into the
//! caller's [`Diagnostics`], fatal problems come back as errors.
pub mod diagnostics;
pub mod metadata;
pub mod objects;
pub mod tiles;
pub mod transpose;

use serde_json::Value;

use crate::error::{ConvertError, Result};
use crate::model::layout::Region;
use crate::model::document::RawProperties;
use crate::model::properties::MapProperties;
use crate::model::{
    COLLISION_FIRSTGID, Document, Layer, LayerKind, LayerName, MAP_H, MAP_SIZE, MAP_W, MapObject, ObjectLayer,
    TILE_A_FIRSTGID, TILE_PX, TileLayer, Tileset,
};
use crate::parser::{self, MapFile};

use diagnostics::Diagnostics;
use objects::{MinimapError, ObjectCell};
use tiles::{CellError, TilesetRange};

pub const TILED_VERSION: &str = "1.0.2402";

/// What to do with a document tile id outside its tileset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfRange {
    /// Clear the cell and record a warning.
    #[default]
    Warn,
    /// Abort the conversion.
    Fatal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodecPolicy {
    pub out_of_range: OutOfRange,
    /// Property type mismatches abort instead of falling back to defaults.
    pub strict_properties: bool,
}

/// Coordinates listed in a single warning before the rest is summarised.
const LISTED_CELLS: usize = 8;

/// One warning per layer and problem, naming the affected cells.
fn report_cells(diag: &mut Diagnostics, layer: LayerName, problem: &str, cells: &[(usize, usize)]) {
    if cells.is_empty() {
        return;
    }
    let mut listed: Vec<String> = cells.iter().take(LISTED_CELLS).map(|(x, y)| format!("({x}, {y})")).collect();
    if cells.len() > LISTED_CELLS {
        listed.push(format!("and {} more", cells.len() - LISTED_CELLS));
    }
    diag.warn(layer.as_str(), format!("{} cell(s) {problem}: {}", cells.len(), listed.join(", ")));
}

/// Editor coordinates of a row-major index.
fn row_major_coords(index: usize) -> (usize, usize) {
    (index % MAP_W, index / MAP_W)
}

// ─────────────────────────────────────────────────────
// Binary → document
// ─────────────────────────────────────────────────────

fn collision_layer(data: &[i16], diag: &mut Diagnostics) -> TileLayer {
    let mut rejected = Vec::new();
    let gids: Vec<u32> = data
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            tiles::encode_collision(value).unwrap_or_else(|| {
                rejected.push(transpose::binary_coords(index));
                0
            })
        })
        .collect();
    report_cells(diag, LayerName::Collision, "hold negative collision values and were cleared", &rejected);
    TileLayer::new(LayerName::Collision.as_str(), transpose::to_row_major(&gids))
}

fn tile_layer(name: LayerName, data: &[i16], range: Option<TilesetRange>, diag: &mut Diagnostics) -> TileLayer {
    let mut lossy = Vec::new();
    let mut outside = Vec::new();
    let gids: Vec<u32> = data
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            if !tiles::tile_round_trips(value) {
                lossy.push(transpose::binary_coords(index));
            }
            let gid = tiles::encode_tile(value, TILE_A_FIRSTGID);
            if gid != 0 && range.is_some_and(|r| !r.contains(gid & tiles::ID_MASK)) {
                outside.push(transpose::binary_coords(index));
            }
            gid
        })
        .collect();
    report_cells(diag, name, "use an unpackable tile column and will not convert back unchanged", &lossy);
    let bounds = format!("fall outside the {} tileset and will not convert back", tiles::TILES_TILESET);
    report_cells(diag, name, &bounds, &outside);
    TileLayer::new(name.as_str(), transpose::to_row_major(&gids))
}

fn document_tilesets() -> Vec<Tileset> {
    vec![
        Tileset { firstgid: TILE_A_FIRSTGID, source: Some("TILE_A.tsx".into()), name: None },
        Tileset { firstgid: COLLISION_FIRSTGID, source: Some("collision.tsx".into()), name: None },
    ]
}

/// Build the editable document for a binary map.
pub fn map_to_document(map: &MapFile, diag: &mut Diagnostics) -> Document {
    let mut event = map.read_grid(Region::Event);
    let found = metadata::extract(&mut event, diag);

    let props = MapProperties {
        bunmania: found.is_some(),
        metadata: found.unwrap_or_default(),
        area: Some(map.read_scalar(Region::Area)),
        map_version: Some(map.read_scalar(Region::Version)),
    };

    let tilesets = document_tilesets();
    let tiles_range = tiles::resolve_tilesets(&tilesets).tiles;

    let layers = LayerName::DRAW_ORDER
        .iter()
        .map(|&name| {
            let data = if name == LayerName::Event { event.clone() } else { map.read_grid(name.region()) };
            match name.kind() {
                LayerKind::Collision => Layer::Tiles(collision_layer(&data, diag)),
                LayerKind::Tiles => Layer::Tiles(tile_layer(name, &data, tiles_range, diag)),
                LayerKind::Objects => Layer::Objects(ObjectLayer::new(name.as_str(), objects::grid_to_objects(&data))),
                LayerKind::Minimap => {
                    Layer::Objects(ObjectLayer::new(name.as_str(), objects::minimap_to_objects(&data)))
                }
            }
        })
        .collect();

    let (properties, propertytypes) = props.to_document();

    Document {
        width: MAP_W as u32,
        height: MAP_H as u32,
        tilewidth: TILE_PX,
        tileheight: TILE_PX,
        orientation: "orthogonal".into(),
        renderorder: "right-down".into(),
        tiledversion: Some(TILED_VERSION.into()),
        kind: "map".into(),
        version: Value::from(1),
        tilesets,
        layers,
        properties: RawProperties::Legacy(properties),
        propertytypes,
    }
}

// ─────────────────────────────────────────────────────
// Document → binary
// ─────────────────────────────────────────────────────

fn layer_data<'a>(name: LayerName, layer: &'a TileLayer) -> Result<&'a [u32]> {
    if layer.data.len() != MAP_SIZE {
        return Err(ConvertError::BadLayerSize { layer: name.as_str(), len: layer.data.len(), expected: MAP_SIZE });
    }
    Ok(&layer.data)
}

/// Per-cell problems found while decoding one tile layer.
#[derive(Default)]
struct CellIssues {
    out_of_range: Vec<(usize, usize)>,
    blank: Vec<(usize, usize)>,
    overflow: Vec<(usize, usize)>,
    flipped: Vec<(usize, usize)>,
    unused_bits: Vec<(usize, usize)>,
}

impl CellIssues {
    fn record(&mut self, index: usize, err: CellError) {
        let at = row_major_coords(index);
        match err {
            CellError::OutOfRange => self.out_of_range.push(at),
            CellError::Blank => self.blank.push(at),
            CellError::Overflow => self.overflow.push(at),
        }
    }

    fn report(self, name: LayerName, range: TilesetRange, diag: &mut Diagnostics) {
        let bounds = format!("have ids outside {}..={} and were cleared", range.firstgid, range.last());
        report_cells(diag, name, &bounds, &self.out_of_range);
        report_cells(diag, name, "name the tileset's empty tile and were cleared", &self.blank);
        report_cells(diag, name, "decode past 16 bits and were cleared", &self.overflow);
        report_cells(diag, name, "are flipped, which collision tiles cannot be; flags ignored", &self.flipped);
        report_cells(diag, name, "carry unsupported flag bits; bits ignored", &self.unused_bits);
    }
}

fn out_of_range_error(name: LayerName, data: &[u32], policy: CodecPolicy, issues: &CellIssues) -> Result<()> {
    if policy.out_of_range != OutOfRange::Fatal {
        return Ok(());
    }
    match issues.out_of_range.first() {
        Some(&(x, y)) => Err(ConvertError::TileOutOfRange { layer: name.as_str(), gid: data[y * MAP_W + x], x, y }),
        None => Ok(()),
    }
}

fn decode_collision_layer(
    layer: &TileLayer,
    range: TilesetRange,
    policy: CodecPolicy,
    diag: &mut Diagnostics,
) -> Result<Vec<i16>> {
    let name = LayerName::Collision;
    let data = layer_data(name, layer)?;
    let mut issues = CellIssues::default();
    let cells: Vec<i16> = data
        .iter()
        .enumerate()
        .map(|(index, &gid)| match tiles::decode_collision(gid, range) {
            Ok(cell) => {
                if cell.flipped {
                    issues.flipped.push(row_major_coords(index));
                }
                cell.value
            }
            Err(err) => {
                issues.record(index, err);
                0
            }
        })
        .collect();
    out_of_range_error(name, data, policy, &issues)?;
    issues.report(name, range, diag);
    Ok(transpose::to_column_major(&cells))
}

fn decode_tile_layer(
    name: LayerName,
    layer: &TileLayer,
    range: TilesetRange,
    policy: CodecPolicy,
    diag: &mut Diagnostics,
) -> Result<Vec<i16>> {
    let data = layer_data(name, layer)?;
    let mut issues = CellIssues::default();
    let cells: Vec<i16> = data
        .iter()
        .enumerate()
        .map(|(index, &gid)| {
            if gid & tiles::UNUSED_BITS != 0 && gid & tiles::ID_MASK != 0 {
                issues.unused_bits.push(row_major_coords(index));
            }
            tiles::decode_tile(gid, range).unwrap_or_else(|err| {
                issues.record(index, err);
                0
            })
        })
        .collect();
    out_of_range_error(name, data, policy, &issues)?;
    issues.report(name, range, diag);
    Ok(transpose::to_column_major(&cells))
}

fn decode_object_layer(name: LayerName, layer: &ObjectLayer, diag: &mut Diagnostics) -> Vec<i16> {
    objects::objects_to_grid(&layer.objects, |object: &MapObject, problem| {
        let why = match problem {
            ObjectCell::NotANumber => "is not an integer",
            ObjectCell::OutOfRange => "does not fit a 16-bit cell",
            ObjectCell::Misaligned => "is not on the 32px tile grid",
            ObjectCell::Placed { .. } => return,
        };
        diag.warn(
            name.as_str(),
            format!("object `{}` at ({}, {}) {why}, dropping it", object.name, object.x, object.y),
        );
    })
}

fn decode_minimap_layer(name: LayerName, layer: &ObjectLayer) -> Result<Vec<i16>> {
    let layer_name = name.as_str();
    objects::objects_to_minimap(&layer.objects).map_err(|err| match err {
        MinimapError::Misaligned { name, x, y } => ConvertError::MinimapMisaligned { layer: layer_name, name, x, y },
        MinimapError::BadValue { name, x, y } => ConvertError::MinimapBadValue { layer: layer_name, name, x, y },
        MinimapError::Duplicate { col, row } => ConvertError::MinimapDuplicate { layer: layer_name, col, row },
        MinimapError::Missing { col, row } => ConvertError::MinimapMissing { layer: layer_name, col, row },
    })
}

fn require(range: Option<TilesetRange>, tileset: &'static str) -> Result<TilesetRange> {
    range.ok_or(ConvertError::MissingTileset(tileset))
}

/// Apply a document on top of `base`, the original binary map. Regions
/// without a layer in the document keep their original bytes.
pub fn document_to_map(
    doc: &Document,
    mut base: MapFile,
    policy: CodecPolicy,
    diag: &mut Diagnostics,
) -> Result<MapFile> {
    let layers = parser::collect_layers(doc, diag)?;
    let ranges = tiles::resolve_tilesets(&doc.tilesets);
    let props = MapProperties::from_document(doc, policy.strict_properties, diag)?;

    // decode everything before touching `base`
    let mut grids: Vec<(Region, Vec<i16>)> = Vec::new();
    for (name, layer) in layers.iter() {
        let grid = match (name.kind(), layer) {
            (LayerKind::Collision, Layer::Tiles(grid_layer)) => {
                let range = require(ranges.collision, tiles::COLLISION_TILESET)?;
                decode_collision_layer(grid_layer, range, policy, diag)?
            }
            (LayerKind::Tiles, Layer::Tiles(grid_layer)) => {
                let range = require(ranges.tiles, tiles::TILES_TILESET)?;
                decode_tile_layer(name, grid_layer, range, policy, diag)?
            }
            (LayerKind::Objects, Layer::Objects(object_layer)) => {
                let mut grid = decode_object_layer(name, object_layer, diag);
                if name == LayerName::Event && props.bunmania {
                    metadata::overlay(&mut grid, &props.metadata)?;
                }
                grid
            }
            (LayerKind::Minimap, Layer::Objects(object_layer)) => decode_minimap_layer(name, object_layer)?,
            _ => {
                return Err(ConvertError::WrongLayerKind {
                    layer: name.as_str(),
                    expected: if matches!(layer, Layer::Tiles(_)) { "object" } else { "tile" },
                });
            }
        };
        grids.push((name.region(), grid));
    }

    for name in LayerName::DRAW_ORDER {
        if !name.is_required() && layers.get(name).is_none() {
            diag.warn(name.as_str(), "layer is missing, leaving the original minimap data in place");
        }
    }

    for (region, grid) in &grids {
        base.write_grid(*region, grid);
    }
    if let Some(area) = props.area {
        base.write_scalar(Region::Area, area);
    }
    if let Some(version) = props.map_version {
        base.write_scalar(Region::Version, version);
    }
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::layout;
    use crate::model::properties::Metadata;

    fn blank_map() -> MapFile {
        MapFile::from_bytes(vec![0u8; layout::min_file_size()]).unwrap()
    }

    fn set_cell(map: &mut MapFile, region: Region, x: usize, y: usize, value: i16) {
        let mut grid = map.read_grid(region);
        grid[transpose::binary_index(x, y)] = value;
        map.write_grid(region, &grid);
    }

    fn tile_data<'a>(doc: &'a Document, name: &str) -> &'a [u32] {
        doc.layers
            .iter()
            .find_map(|l| match l {
                Layer::Tiles(t) if t.name == name => Some(t.data.as_slice()),
                _ => None,
            })
            .unwrap()
    }

    fn tile_data_mut<'a>(doc: &'a mut Document, name: &str) -> &'a mut Vec<u32> {
        doc.layers
            .iter_mut()
            .find_map(|l| match l {
                Layer::Tiles(t) if t.name == name => Some(&mut t.data),
                _ => None,
            })
            .unwrap()
    }

    fn objects_mut<'a>(doc: &'a mut Document, name: &str) -> &'a mut Vec<MapObject> {
        doc.layers
            .iter_mut()
            .find_map(|l| match l {
                Layer::Objects(o) if o.name == name => Some(&mut o.objects),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_document_shape() {
        let mut diag = Diagnostics::new();
        let doc = map_to_document(&blank_map(), &mut diag);
        assert!(diag.is_empty());
        let names: Vec<&str> = doc.layers.iter().filter_map(|l| l.name()).collect();
        assert_eq!(
            names,
            vec![
                "collision", "event", "items", "roomtype", "roomcolor", "roombg", "tiles0", "tiles3", "tiles4",
                "tiles1", "tiles5", "tiles6", "tiles2"
            ]
        );
        assert_eq!(doc.tilesets[1].firstgid, 5000);
    }

    #[test]
    fn test_cells_land_in_row_major_order() {
        let mut map = blank_map();
        set_cell(&mut map, Region::Map, 10, 3, 4);
        set_cell(&mut map, Region::Tiles(2), 499, 199, -5032);
        let doc = map_to_document(&map, &mut Diagnostics::new());
        assert_eq!(tile_data(&doc, "collision")[3 * 500 + 10], 5004);
        assert_eq!(
            tile_data(&doc, "tiles2")[199 * 500 + 499],
            tiles::FLAG_FLIP | tiles::FLAG_ALT | (32 - 2 + 1)
        );
    }

    #[test]
    fn test_round_trip_is_exact() {
        let mut map = blank_map();
        set_cell(&mut map, Region::Map, 1, 1, 12);
        set_cell(&mut map, Region::Event, 40, 150, 33);
        set_cell(&mut map, Region::Items, 2, 3, -7);
        set_cell(&mut map, Region::Tiles(0), 5, 6, 5040);
        set_cell(&mut map, Region::Tiles(6), 0, 0, -1);
        let mut minimap = map.read_grid(Region::RoomColor);
        minimap[17] = 3;
        minimap[449] = -2;
        map.write_grid(Region::RoomColor, &minimap);
        map.write_scalar(Region::Area, 5);
        map.write_scalar(Region::Version, 2);

        let mut diag = Diagnostics::new();
        let doc = map_to_document(&map, &mut diag);
        let rebuilt = document_to_map(&doc, blank_map(), CodecPolicy::default(), &mut diag).unwrap();
        assert!(diag.is_empty(), "{:?}", diag.warnings());
        assert_eq!(rebuilt.as_bytes(), map.as_bytes());
    }

    #[test]
    fn test_metadata_round_trip() {
        let mut map = blank_map();
        let meta = Metadata { name: "Warren".into(), egg_count: 5, ..Metadata::default() };
        let mut event = map.read_grid(Region::Event);
        metadata::overlay(&mut event, &meta).unwrap();
        event[transpose::binary_index(100, 100)] = 9;
        map.write_grid(Region::Event, &event);

        let mut diag = Diagnostics::new();
        let doc = map_to_document(&map, &mut diag);
        assert!(diag.is_empty());
        let RawProperties::Legacy(props) = &doc.properties else {
            panic!("legacy properties expected");
        };
        assert_eq!(props["bunmania"], Value::from(true));
        assert_eq!(props["name"], Value::from("Warren"));
        // only the ordinary event is exposed as an object
        let events = doc.layers.iter().find_map(|l| match l {
            Layer::Objects(o) if o.name == "event" => Some(o.objects.len()),
            _ => None,
        });
        assert_eq!(events, Some(1));

        let rebuilt = document_to_map(&doc, blank_map(), CodecPolicy::default(), &mut diag).unwrap();
        assert_eq!(rebuilt.as_bytes(), map.as_bytes());
    }

    #[test]
    fn test_out_of_range_policy() {
        let mut doc = map_to_document(&blank_map(), &mut Diagnostics::new());
        tile_data_mut(&mut doc, "tiles4")[2 * 500 + 7] = 6000;

        let mut diag = Diagnostics::new();
        let map = document_to_map(&doc, blank_map(), CodecPolicy::default(), &mut diag).unwrap();
        assert!(map.read_grid(Region::Tiles(4)).iter().all(|&v| v == 0));
        assert_eq!(diag.len(), 1);
        assert!(diag.warnings()[0].message.contains("(7, 2)"), "{}", diag.warnings()[0]);

        let policy = CodecPolicy { out_of_range: OutOfRange::Fatal, ..CodecPolicy::default() };
        let err = document_to_map(&doc, blank_map(), policy, &mut Diagnostics::new()).unwrap_err();
        assert!(
            matches!(err, ConvertError::TileOutOfRange { layer: "tiles4", gid: 6000, x: 7, y: 2 }),
            "{err}"
        );
    }

    #[test]
    fn test_flipped_collision_warns_but_decodes() {
        let mut doc = map_to_document(&blank_map(), &mut Diagnostics::new());
        tile_data_mut(&mut doc, "collision")[0] = tiles::FLAG_FLIP | 5003;
        let mut diag = Diagnostics::new();
        let map = document_to_map(&doc, blank_map(), CodecPolicy::default(), &mut diag).unwrap();
        assert_eq!(map.read_grid(Region::Map)[0], 3);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn test_bad_objects_warn() {
        let mut doc = map_to_document(&blank_map(), &mut Diagnostics::new());
        objects_mut(&mut doc, "items").push(MapObject { width: 32.0, height: 32.0, x: 64.0, y: 96.0, name: "7".into() });
        objects_mut(&mut doc, "items").push(MapObject { width: 32.0, height: 32.0, x: 0.0, y: 0.0, name: "key".into() });
        let mut diag = Diagnostics::new();
        let map = document_to_map(&doc, blank_map(), CodecPolicy::default(), &mut diag).unwrap();
        assert_eq!(map.read_grid(Region::Items)[403], 7);
        assert_eq!(diag.len(), 1);
        assert!(diag.warnings()[0].to_string().starts_with("items: object `key`"));
    }

    #[test]
    fn test_missing_minimap_leaves_region_untouched() {
        let mut original = blank_map();
        let mut roombg = original.read_grid(Region::RoomBg);
        roombg[5] = 8;
        original.write_grid(Region::RoomBg, &roombg);

        let mut doc = map_to_document(&blank_map(), &mut Diagnostics::new());
        doc.layers.retain(|l| l.name() != Some("roombg"));

        let mut diag = Diagnostics::new();
        let map = document_to_map(&doc, original, CodecPolicy::default(), &mut diag).unwrap();
        assert_eq!(map.read_grid(Region::RoomBg)[5], 8);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn test_minimap_duplicate_is_fatal() {
        let mut doc = map_to_document(&blank_map(), &mut Diagnostics::new());
        objects_mut(&mut doc, "roomtype").push(MapObject {
            width: 640.0,
            height: 32.0,
            x: 640.0,
            y: 32.0,
            name: "1".into(),
        });
        let err = document_to_map(&doc, blank_map(), CodecPolicy::default(), &mut Diagnostics::new()).unwrap_err();
        assert!(matches!(err, ConvertError::MinimapDuplicate { layer: "roomtype", col: 1, row: 0 }), "{err}");
    }

    #[test]
    fn test_missing_tileset_is_fatal() {
        let mut doc = map_to_document(&blank_map(), &mut Diagnostics::new());
        doc.tilesets.retain(|t| !t.matches("collision"));
        let err = document_to_map(&doc, blank_map(), CodecPolicy::default(), &mut Diagnostics::new()).unwrap_err();
        assert!(matches!(err, ConvertError::MissingTileset("collision")), "{err}");
    }

    #[test]
    fn test_wrong_layer_size_is_fatal() {
        let mut doc = map_to_document(&blank_map(), &mut Diagnostics::new());
        tile_data_mut(&mut doc, "tiles1").truncate(10);
        let err = document_to_map(&doc, blank_map(), CodecPolicy::default(), &mut Diagnostics::new()).unwrap_err();
        assert!(matches!(err, ConvertError::BadLayerSize { layer: "tiles1", len: 10, .. }), "{err}");
    }

    #[test]
    fn test_lossy_tile_column_warns() {
        let mut map = blank_map();
        set_cell(&mut map, Region::Tiles(3), 4, 4, 31);
        let mut diag = Diagnostics::new();
        map_to_document(&map, &mut diag);
        assert_eq!(diag.len(), 1);
        assert!(diag.warnings()[0].to_string().starts_with("tiles3: 1 cell(s)"));
    }

    #[test]
    fn test_tile_outside_tileset_warns_before_it_is_lost() {
        let mut map = blank_map();
        set_cell(&mut map, Region::Tiles(0), 0, 0, 10332);
        set_cell(&mut map, Region::Tiles(0), 0, 1, 10331);
        set_cell(&mut map, Region::Tiles(0), 0, 2, -10330);
        let mut diag = Diagnostics::new();
        let doc = map_to_document(&map, &mut diag);
        assert_eq!(diag.len(), 1);
        let warning = diag.warnings()[0].to_string();
        assert!(warning.starts_with("tiles0: 2 cell(s) fall outside the TILE_A tileset"), "{warning}");
        assert!(warning.contains("(0, 0), (0, 1)"), "{warning}");

        let mut back_diag = Diagnostics::new();
        let back = document_to_map(&doc, map.clone(), CodecPolicy::default(), &mut back_diag).unwrap();
        let grid = back.read_grid(Region::Tiles(0));
        assert_eq!(grid[transpose::binary_index(0, 2)], -10330);
        assert_eq!(grid[transpose::binary_index(0, 0)], 0);
    }
}
