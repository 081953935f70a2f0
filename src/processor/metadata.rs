//! Bunmania metadata hidden in the first rows of the event layer.
//!
//! Field `f` lives in event row `f.row()`, i.e. binary cells
//! `x * 200 + row` for `x` in `0..f.capacity()`. Each stored value is the
//! payload plus [`METADATA_OFFSET`]; ordinary event values stay below it.

use crate::error::{ConvertError, Result};
use crate::model::properties::{MetaField, Metadata};

use super::diagnostics::Diagnostics;
use super::transpose::binary_index;

pub const METADATA_OFFSET: i16 = 5000;

/// Largest time (in sixtieths of a second) that fits minutes below 60.
const MAX_FRAMES: i64 = 60 * 60 * 60 - 1;
const MAX_INT: i64 = (i16::MAX - METADATA_OFFSET) as i64;

fn cell(field: MetaField, x: usize) -> usize {
    binary_index(x, field.row())
}

fn payload(value: i16) -> Option<i16> {
    (value >= METADATA_OFFSET).then(|| value - METADATA_OFFSET)
}

/// One field read out of the event grid, with the cells it came from.
#[derive(Debug, Default)]
struct Decoded {
    values: Vec<i16>,
    cells: Vec<usize>,
}

/// Strings may contain gaps (cells below the offset), which read as
/// spaces; the string ends at the last encoded cell.
fn decode_string(event: &[i16], field: MetaField, diag: &mut Diagnostics) -> (String, Vec<usize>) {
    let mut text = String::new();
    let mut cells = Vec::new();
    let mut end = 0;
    for x in 0..field.capacity() {
        let index = cell(field, x);
        match payload(event[index]) {
            Some(code) => {
                let ch = match u8::try_from(code) {
                    Ok(byte) if byte.is_ascii() => byte as char,
                    _ => {
                        diag.warn(
                            "event",
                            format!("metadata `{}` has non-ASCII code {code} at ({x}, {})", field.property(), field.row()),
                        );
                        '?'
                    }
                };
                text.push(ch);
                cells.push(index);
                end = text.len();
            }
            None => text.push(' '),
        }
    }
    text.truncate(end);
    (text, cells)
}

/// Fixed-width fields need every one of their cells encoded.
fn decode_fixed(event: &[i16], field: MetaField) -> Option<Decoded> {
    let mut decoded = Decoded::default();
    for x in 0..field.capacity() {
        let index = cell(field, x);
        decoded.values.push(payload(event[index])?);
        decoded.cells.push(index);
    }
    Some(decoded)
}

/// Minutes, seconds and sixtieths, each clamped to 0..=59.
fn time_from_cells(values: &[i16]) -> f64 {
    let part = |i: usize| values.get(i).copied().unwrap_or(0).clamp(0, 59) as f64;
    part(0) * 60.0 + part(1) + part(2) / 60.0
}

/// Positive times shorter than half a frame still take one frame, so the
/// stored value never reads back as zero.
fn time_to_cells(seconds: f64) -> [i16; 3] {
    let frames = ((seconds * 60.0).round() as i64).clamp(1, MAX_FRAMES);
    [(frames / 3600) as i16, (frames / 60 % 60) as i16, (frames % 60) as i16]
}

/// Look for metadata in the binary event grid. When the map name decodes
/// to something non-empty the block is present: its cells are cleared from
/// `event` and the decoded fields are returned. Fields that are not fully
/// encoded fall back to their defaults with a warning.
pub fn extract(event: &mut [i16], diag: &mut Diagnostics) -> Option<Metadata> {
    let (name, name_cells) = decode_string(event, MetaField::Name, diag);
    if name.is_empty() {
        return None;
    }

    let mut meta = Metadata { name, ..Metadata::default() };
    let mut consumed = name_cells;

    for field in MetaField::ALL.into_iter().skip(1) {
        if field == MetaField::Author {
            let (author, cells) = decode_string(event, field, diag);
            meta.author = author;
            consumed.extend(cells);
            continue;
        }
        let Some(decoded) = decode_fixed(event, field) else {
            diag.warn(
                "event",
                format!("metadata `{}` is not encoded in row {}, using the default", field.property(), field.row()),
            );
            continue;
        };
        let raw = decoded.values[0];
        match field {
            MetaField::ParTime(n) => meta.par_times[n as usize] = time_from_cells(&decoded.values),
            MetaField::FullCompletion => meta.full_completion = raw != 0,
            MetaField::Difficulty => meta.difficulty = raw.into(),
            MetaField::EggCount => meta.egg_count = raw.into(),
            MetaField::Name | MetaField::Author => {}
        }
        consumed.extend(decoded.cells);
    }

    for index in consumed {
        event[index] = 0;
    }
    tracing::debug!(name = %meta.name, author = %meta.author, "found bunmania metadata");
    Some(meta)
}

fn check_string(field: MetaField, text: &str) -> Result<()> {
    if !text.is_ascii() {
        return Err(ConvertError::PropertyNotAscii { name: field.property() });
    }
    if text.len() > field.capacity() {
        return Err(ConvertError::PropertyTooLong {
            name: field.property(),
            len: text.chars().count(),
            max: field.capacity(),
        });
    }
    Ok(())
}

fn check_int(field: MetaField, value: i64) -> Result<i16> {
    if !(0..=MAX_INT).contains(&value) {
        return Err(ConvertError::PropertyOutOfRange { name: field.property(), value, min: 0, max: MAX_INT });
    }
    Ok(value as i16)
}

/// Cell writes for `meta`, or the first validation failure.
pub fn encode(meta: &Metadata) -> Result<Vec<(usize, i16)>> {
    if meta.name.is_empty() {
        return Err(ConvertError::MissingMapName);
    }
    let mut writes = Vec::new();
    for field in MetaField::ALL {
        let values: Vec<i16> = match field {
            MetaField::Name | MetaField::Author => {
                let text = if field == MetaField::Name { &meta.name } else { &meta.author };
                check_string(field, text)?;
                text.bytes().map(|b| b as i16).collect()
            }
            MetaField::ParTime(n) => {
                let seconds = meta.par_times[n as usize];
                if !(seconds > 0.0 && seconds < 3600.0) {
                    return Err(ConvertError::PropertyBadTime { name: field.property(), value: seconds });
                }
                time_to_cells(seconds).to_vec()
            }
            MetaField::FullCompletion => vec![meta.full_completion as i16],
            MetaField::Difficulty => vec![check_int(field, meta.difficulty)?],
            MetaField::EggCount => vec![check_int(field, meta.egg_count)?],
        };
        writes.extend(values.into_iter().enumerate().map(|(x, v)| (cell(field, x), v + METADATA_OFFSET)));
    }
    Ok(writes)
}

/// Validate `meta` and write it over the binary event grid.
pub fn overlay(event: &mut [i16], meta: &Metadata) -> Result<()> {
    for (index, value) in encode(meta)? {
        event[index] = value;
    }
    Ok(())
}
