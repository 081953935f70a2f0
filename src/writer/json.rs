//! Write the editable document.

use std::fs;
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::model::Document;

pub fn to_string(doc: &Document) -> Result<String> {
    Ok(serde_json::to_string(doc)?)
}

pub fn emit(doc: &Document, path: &Path) -> Result<()> {
    let json = to_string(doc)?;
    fs::write(path, json).map_err(|e| ConvertError::io(path, e))?;
    tracing::debug!(path = %path.display(), "document written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::layout;
    use crate::parser::{self, MapFile};
    use crate::processor::{self, diagnostics::Diagnostics};
    use serde_json::Value;

    #[test]
    fn test_written_document_reads_back() {
        let map = MapFile::from_bytes(vec![0u8; layout::min_file_size()]).unwrap();
        let doc = processor::map_to_document(&map, &mut Diagnostics::new());
        let json = to_string(&doc).unwrap();

        let raw: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(raw["width"], 500);
        assert_eq!(raw["tilewidth"], 32);
        assert_eq!(raw["layers"][0]["type"], "tilelayer");
        assert_eq!(raw["layers"][1]["type"], "objectgroup");
        assert_eq!(raw["layers"][0]["data"].as_array().map(Vec::len), Some(100_000));
        assert_eq!(raw["propertytypes"]["bunmania"], "bool");

        let back = parser::load_from_json(&json).unwrap();
        assert_eq!(back.layers.len(), doc.layers.len());
    }
}
