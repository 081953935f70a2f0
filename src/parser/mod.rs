pub mod binary;

use crate::error::{ConvertError, Result};
use crate::model::{Document, Layer, LayerKind, LayerName};
use crate::processor::diagnostics::Diagnostics;

pub use binary::MapFile;

/// Parse the editable JSON into a `Document`.
pub fn load_from_json(json: &str) -> Result<Document> {
    tracing::debug!(bytes = json.len(), "parsing document");
    let doc: Document = serde_json::from_str(json)?;
    tracing::debug!(layers = doc.layers.len(), tilesets = doc.tilesets.len(), "document parsed");
    Ok(doc)
}

/// Layers of a document keyed by the layer they stand for, in document order.
#[derive(Debug)]
pub struct Layers<'a> {
    entries: Vec<(LayerName, &'a Layer)>,
}

impl<'a> Layers<'a> {
    pub fn get(&self, name: LayerName) -> Option<&'a Layer> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, l)| *l)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerName, &'a Layer)> + '_ {
        self.entries.iter().copied()
    }
}

fn expected_type(kind: LayerKind) -> &'static str {
    match kind {
        LayerKind::Collision | LayerKind::Tiles => "tile",
        LayerKind::Objects | LayerKind::Minimap => "object",
    }
}

/// Match every document layer to a known layer.
///
/// Unknown layers are reported and skipped; a known layer that appears
/// twice, has the wrong type, or a required layer that is absent aborts
/// the conversion.
pub fn collect_layers<'a>(doc: &'a Document, diag: &mut Diagnostics) -> Result<Layers<'a>> {
    let mut entries: Vec<(LayerName, &'a Layer)> = Vec::with_capacity(doc.layers.len());

    for (i, layer) in doc.layers.iter().enumerate() {
        let Some(raw_name) = layer.name() else {
            diag.warn_global(format!("layer {i} has an unsupported type, ignoring it"));
            continue;
        };
        let Some(name) = LayerName::parse(raw_name) else {
            diag.warn(raw_name, "unknown layer, ignoring it");
            continue;
        };
        if entries.iter().any(|(n, _)| *n == name) {
            return Err(ConvertError::DuplicateLayer(name.as_str()));
        }

        let kind_ok = match (name.kind(), layer) {
            (LayerKind::Collision | LayerKind::Tiles, Layer::Tiles(_)) => true,
            (LayerKind::Objects | LayerKind::Minimap, Layer::Objects(_)) => true,
            _ => false,
        };
        if !kind_ok {
            return Err(ConvertError::WrongLayerKind {
                layer: name.as_str(),
                expected: expected_type(name.kind()),
            });
        }
        tracing::debug!(layer = %name, "layer found");
        entries.push((name, layer));
    }

    for name in LayerName::DRAW_ORDER {
        if name.is_required() && !entries.iter().any(|(n, _)| *n == name) {
            return Err(ConvertError::MissingLayer(name.as_str()));
        }
    }

    Ok(Layers { entries })
}
