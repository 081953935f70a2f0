use std::path::PathBuf;

/// Problems that abort the conversion of the current file.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("map file is {len} bytes, expected at least {min}")]
    FileTooSmall { len: usize, min: usize },

    #[error("required layer `{0}` is missing")]
    MissingLayer(&'static str),

    #[error("layer `{0}` appears more than once")]
    DuplicateLayer(&'static str),

    #[error("layer `{layer}` must be a {expected} layer")]
    WrongLayerKind { layer: &'static str, expected: &'static str },

    #[error("layer `{layer}` has {len} cells, expected {expected}")]
    BadLayerSize { layer: &'static str, len: usize, expected: usize },

    #[error("no tileset matching `{0}` is declared")]
    MissingTileset(&'static str),

    #[error("{layer}: out-of-range tile id {gid} at ({x}, {y})")]
    TileOutOfRange { layer: &'static str, gid: u32, x: usize, y: usize },

    #[error("{layer}: minimap object `{name}` at ({x}, {y}) is not on a room position")]
    MinimapMisaligned { layer: &'static str, name: String, x: f64, y: f64 },

    #[error("{layer}: minimap object `{name}` at ({x}, {y}) is not a 16-bit integer")]
    MinimapBadValue { layer: &'static str, name: String, x: f64, y: f64 },

    #[error("{layer}: duplicate minimap tile object at room ({col}, {row})")]
    MinimapDuplicate { layer: &'static str, col: usize, row: usize },

    #[error("{layer}: minimap room ({col}, {row}) has no object")]
    MinimapMissing { layer: &'static str, col: usize, row: usize },

    #[error("property `{name}` is {len} characters long, the limit is {max}")]
    PropertyTooLong { name: &'static str, len: usize, max: usize },

    #[error("property `{name}` contains non-ASCII characters")]
    PropertyNotAscii { name: &'static str },

    #[error("property `{name}` = {value} is not a time between 0 and 3600 seconds")]
    PropertyBadTime { name: &'static str, value: f64 },

    #[error("property `{name}` = {value} is outside {min}..={max}")]
    PropertyOutOfRange { name: &'static str, value: i64, min: i64, max: i64 },

    #[error("property `{name}` must be of type {expected}, found {found}")]
    PropertyType { name: &'static str, expected: &'static str, found: String },

    #[error("bunmania maps need a non-empty `name` property")]
    MissingMapName,
}

pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io { path: path.into(), source }
    }
}
