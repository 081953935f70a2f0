use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{MAP_H, MAP_W, TILE_PX};

/// Entire editable map as it is stored on disk.
///
/// Only the fields the converter reads or writes are modelled; anything
/// else the editor adds is ignored on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub width: u32,
    pub height: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
    #[serde(default = "default_orientation")]
    pub orientation: String,
    #[serde(default = "default_renderorder")]
    pub renderorder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiledversion: Option<String>,
    #[serde(rename = "type", default = "default_map_type")]
    pub kind: String,
    #[serde(default)]
    pub version: Value,
    pub tilesets: Vec<Tileset>,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub properties: RawProperties,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub propertytypes: Map<String, Value>,
}

fn default_orientation() -> String {
    "orthogonal".into()
}

fn default_renderorder() -> String {
    "right-down".into()
}

fn default_map_type() -> String {
    "map".into()
}

/// Properties come either as the legacy `{name: value}` object (paired
/// with `propertytypes`) or as the newer `[{name, type, value}]` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawProperties {
    Legacy(Map<String, Value>),
    List(Vec<PropertyEntry>),
}

impl Default for RawProperties {
    fn default() -> Self {
        RawProperties::Legacy(Map::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyEntry {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tileset {
    pub firstgid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Embedded tilesets carry a name instead of a source file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Tileset {
    /// True when either the source file or the embedded name mentions `needle`.
    pub fn matches(&self, needle: &str) -> bool {
        self.source.as_deref().is_some_and(|s| s.contains(needle))
            || self.name.as_deref().is_some_and(|s| s.contains(needle))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Layer {
    #[serde(rename = "tilelayer")]
    Tiles(TileLayer),
    #[serde(rename = "objectgroup")]
    Objects(ObjectLayer),
    /// Image layers, groups and anything else the editor may add.
    #[serde(other)]
    Other,
}

impl Layer {
    pub fn name(&self) -> Option<&str> {
        match self {
            Layer::Tiles(t) => Some(&t.name),
            Layer::Objects(o) => Some(&o.name),
            Layer::Other => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    pub data: Vec<u32>,
}

impl TileLayer {
    pub fn new(name: &str, data: Vec<u32>) -> Self {
        TileLayer {
            name: name.to_string(),
            width: MAP_W as u32,
            height: MAP_H as u32,
            x: 0,
            y: 0,
            visible: true,
            opacity: 1.0,
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectLayer {
    pub name: String,
    #[serde(default = "default_draworder")]
    pub draworder: String,
    #[serde(default)]
    pub objects: Vec<MapObject>,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

impl ObjectLayer {
    pub fn new(name: &str, objects: Vec<MapObject>) -> Self {
        ObjectLayer {
            name: name.to_string(),
            draworder: default_draworder(),
            objects,
            opacity: 1.0,
            visible: true,
            x: 0,
            y: 0,
        }
    }
}

/// A single point object. Positions are pixels; the editor is free to
/// write them as floats, so they are kept as `f64` until validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapObject {
    #[serde(default = "default_tile_px")]
    pub width: f64,
    #[serde(default = "default_tile_px")]
    pub height: f64,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub name: String,
}

impl MapObject {
    pub fn new(x: u32, y: u32, width: u32, value: i16) -> Self {
        MapObject {
            width: width as f64,
            height: TILE_PX as f64,
            x: x as f64,
            y: y as f64,
            name: value.to_string(),
        }
    }
}

fn default_width() -> u32 {
    MAP_W as u32
}

fn default_height() -> u32 {
    MAP_H as u32
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f64 {
    1.0
}

fn default_draworder() -> String {
    "topdown".into()
}

fn default_tile_px() -> f64 {
    TILE_PX as f64
}
