use std::fs;
use std::path::Path;

use mapconv_rust::batch;
use mapconv_rust::config::Settings;
use mapconv_rust::model::layout::{self, Region};
use mapconv_rust::parser::{self, MapFile};
use serde_json::Value;

fn settings(root: &Path) -> Settings {
    let settings = Settings {
        original_maps_dir: root.join("original"),
        editable_maps_dir: root.join("editable"),
        final_maps_dir: root.join("final"),
        ..Settings::default()
    };
    fs::create_dir_all(&settings.original_maps_dir).unwrap();
    settings
}

/// A map with something in every region and a few bytes after the last one.
fn sample_map() -> Vec<u8> {
    let mut map = MapFile::from_bytes(vec![0u8; layout::min_file_size() + 32]).unwrap();
    for (n, region) in Region::ALL.iter().enumerate() {
        match *region {
            Region::Area | Region::Version => map.write_scalar(*region, n as i32),
            Region::RoomType | Region::RoomColor | Region::RoomBg => {
                let grid: Vec<i16> = (0..region.len()).map(|i| (i % 11) as i16).collect();
                map.write_grid(*region, &grid);
            }
            Region::Map => {
                let grid: Vec<i16> = (0..region.len()).map(|i| (i % 97 == 0) as i16 * 3).collect();
                map.write_grid(*region, &grid);
            }
            Region::Event | Region::Items => {
                // keep the metadata rows free
                let grid: Vec<i16> =
                    (0..region.len()).map(|i| if i % 200 > 10 && i % 1013 == 0 { 42 } else { 0 }).collect();
                map.write_grid(*region, &grid);
            }
            Region::Tiles(t) => {
                let grid: Vec<i16> = (0..region.len())
                    .map(|i| match i % 5 {
                        0 => 0,
                        1 => t as i16 + 1,
                        2 => -(64 + t as i16),
                        3 => 5000 + 96 + t as i16,
                        _ => -5003,
                    })
                    .collect();
                map.write_grid(*region, &grid);
            }
        }
    }
    let mut bytes = map.into_bytes();
    let len = bytes.len();
    bytes[len - 32..].copy_from_slice(&[0xAB; 32]);
    bytes
}

#[test]
fn binary_to_document_and_back_is_byte_exact() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    let original = sample_map();
    fs::write(settings.original_maps_dir.join("area1.map"), &original).unwrap();

    let report = batch::map_to_json(&settings, None, false).unwrap();
    assert_eq!(report.status(), 0, "{:?}", report.files);

    let json = fs::read_to_string(settings.editable_maps_dir.join("area1.json")).unwrap();
    let doc = parser::load_from_json(&json).unwrap();
    assert_eq!(doc.layers.len(), 13);

    let report = batch::json_to_map(&settings, None).unwrap();
    assert_eq!(report.status(), 0, "{:?}", report.files);

    let rebuilt = fs::read(settings.final_maps_dir.join("area1.map")).unwrap();
    assert_eq!(rebuilt.len(), original.len());
    assert!(rebuilt == original, "final map differs from the original");
}

#[test]
fn edited_object_reaches_the_binary() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    fs::write(settings.original_maps_dir.join("town.map"), sample_map()).unwrap();
    batch::map_to_json(&settings, None, false).unwrap();

    let path = settings.editable_maps_dir.join("town.json");
    let mut doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let items = doc["layers"]
        .as_array_mut()
        .unwrap()
        .iter_mut()
        .find(|l| l["name"] == "items")
        .unwrap();
    items["objects"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!({"x": 64, "y": 96, "width": 32, "height": 32, "name": "7"}));
    fs::write(&path, doc.to_string()).unwrap();

    batch::json_to_map(&settings, Some(vec!["town".into()])).unwrap();
    let map = MapFile::open(&settings.final_maps_dir.join("town.map")).unwrap();
    assert_eq!(map.read_grid(Region::Items)[403], 7);
}

#[test]
fn bunmania_properties_are_packed_into_events() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    fs::write(settings.original_maps_dir.join("bun.map"), sample_map()).unwrap();
    batch::map_to_json(&settings, None, false).unwrap();

    let path = settings.editable_maps_dir.join("bun.json");
    let mut doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["properties"]["bunmania"], false);
    doc["properties"]["bunmania"] = Value::from(true);
    doc["properties"]["name"] = Value::from("Hop");
    doc["properties"]["egg_count"] = Value::from(8);
    fs::write(&path, doc.to_string()).unwrap();

    let report = batch::json_to_map(&settings, None).unwrap();
    assert_eq!(report.status(), 0, "{:?}", report.files);

    // the final map decodes with the metadata attached
    fs::copy(settings.final_maps_dir.join("bun.map"), settings.original_maps_dir.join("bun2.map")).unwrap();
    batch::map_to_json(&settings, Some(vec!["bun2".into()]), false).unwrap();
    let json = fs::read_to_string(settings.editable_maps_dir.join("bun2.json")).unwrap();
    let doc: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(doc["properties"]["bunmania"], true);
    assert_eq!(doc["properties"]["name"], "Hop");
    assert_eq!(doc["properties"]["egg_count"], 8);
}

#[test]
fn fatal_error_fails_only_that_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    fs::write(settings.original_maps_dir.join("good.map"), sample_map()).unwrap();
    fs::write(settings.original_maps_dir.join("bad.map"), sample_map()).unwrap();
    batch::map_to_json(&settings, None, false).unwrap();

    let path = settings.editable_maps_dir.join("bad.json");
    let mut doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    doc["properties"]["bunmania"] = Value::from(true);
    doc["properties"]["name"] = Value::from("x".repeat(65));
    fs::write(&path, doc.to_string()).unwrap();

    let report = batch::json_to_map(&settings, None).unwrap();
    assert_eq!(report.status(), 2);
    assert_eq!(report.failed(), 1);
    assert!(!settings.final_maps_dir.join("bad.map").exists());
    assert!(!settings.final_maps_dir.join("bad.map.tmp").exists());
    assert!(settings.final_maps_dir.join("good.map").exists());
}

#[test]
fn refuses_to_overwrite_editable_documents() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    fs::write(settings.original_maps_dir.join("area2.map"), sample_map()).unwrap();
    fs::create_dir_all(&settings.editable_maps_dir).unwrap();
    fs::write(settings.editable_maps_dir.join("area2.json"), "unsaved").unwrap();

    assert!(batch::map_to_json(&settings, None, false).is_err());
    assert_eq!(fs::read_to_string(settings.editable_maps_dir.join("area2.json")).unwrap(), "unsaved");

    let report = batch::map_to_json(&settings, None, true).unwrap();
    assert_eq!(report.status(), 0);
}

#[test]
fn refuses_documents_without_an_original_map() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    fs::create_dir_all(&settings.editable_maps_dir).unwrap();
    fs::write(settings.editable_maps_dir.join("orphan.json"), "{}").unwrap();

    assert!(batch::json_to_map(&settings, None).is_err());
    assert!(!settings.final_maps_dir.exists());
}
