//! Object layers: the `event` and `items` grids become point objects named
//! after their cell value, and the three minimap grids become one object per
//! room.

use crate::model::{
    MAP_H, MAP_SIZE, MAP_W, MINIMAP_COLS, MINIMAP_ROWS, MINIMAP_SIZE, MapObject, ROOM_PX_W, TILE_PX,
};

use super::transpose::{binary_coords, binary_index};

/// Every non-zero cell becomes an object at its pixel position.
pub fn grid_to_objects(data: &[i16]) -> Vec<MapObject> {
    data.iter()
        .enumerate()
        .filter(|&(_, &value)| value != 0)
        .map(|(index, &value)| {
            let (x, y) = binary_coords(index);
            MapObject::new(TILE_PX * x as u32, TILE_PX * y as u32, TILE_PX, value)
        })
        .collect()
}

/// Outcome of reading one object back into a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectCell {
    Placed { index: usize, value: i16 },
    NotANumber,
    /// The name is an integer but does not fit a 16-bit cell.
    OutOfRange,
    /// The position is not on a tile corner, or lies outside the grid.
    Misaligned,
}

/// Parse an object name as a cell value.
fn parse_value(name: &str) -> Result<i16, ObjectCell> {
    let wide: i64 = name.trim().parse().map_err(|_| ObjectCell::NotANumber)?;
    i16::try_from(wide).map_err(|_| ObjectCell::OutOfRange)
}

/// Whole pixel position divisible by `step`, as a multiple of it.
fn grid_step(px: f64, step: u32) -> Option<usize> {
    if px < 0.0 || px.fract() != 0.0 {
        return None;
    }
    let px = px as u64;
    let step = step as u64;
    if px % step != 0 {
        return None;
    }
    Some((px / step) as usize)
}

pub fn classify_object(object: &MapObject) -> ObjectCell {
    let value = match parse_value(&object.name) {
        Ok(value) => value,
        Err(cell) => return cell,
    };
    let (Some(x), Some(y)) = (grid_step(object.x, TILE_PX), grid_step(object.y, TILE_PX)) else {
        return ObjectCell::Misaligned;
    };
    if x >= MAP_W || y >= MAP_H {
        return ObjectCell::Misaligned;
    }
    ObjectCell::Placed { index: binary_index(x, y), value }
}

/// Rebuild a binary grid from objects. Bad objects are dropped and reported
/// through `on_drop`; two objects on one cell leave the later one in place.
pub fn objects_to_grid(objects: &[MapObject], mut on_drop: impl FnMut(&MapObject, ObjectCell)) -> Vec<i16> {
    let mut data = vec![0i16; MAP_SIZE];
    for object in objects {
        match classify_object(object) {
            ObjectCell::Placed { index, value } => data[index] = value,
            problem => on_drop(object, problem),
        }
    }
    data
}

// ─────────────────────────────────────────────────────
// Minimap
// ─────────────────────────────────────────────────────

/// Rooms are 20 tiles wide and 11¼ tiles tall, so every fourth room row
/// gains an extra tile of height.
pub fn room_position(index: usize) -> (u32, u32) {
    let col = (index / MINIMAP_ROWS) as u32;
    let row = (index % MINIMAP_ROWS) as u32;
    let tile_y = 11 * row + (row + 3) / 4;
    (ROOM_PX_W * col, TILE_PX * tile_y)
}

/// Inverse of [`room_position`]. Any tile row inside a room maps to that
/// room; `None` when the position is off the tile grid, not on a room's
/// left edge, or outside the minimap.
pub fn room_index(x: f64, y: f64) -> Option<usize> {
    let col = grid_step(x, ROOM_PX_W)?;
    let tile_y = grid_step(y, TILE_PX)?;
    let row = 4 * (tile_y / 45) + (tile_y % 45).saturating_sub(1) / 11;
    if col >= MINIMAP_COLS || row >= MINIMAP_ROWS {
        return None;
    }
    Some(col * MINIMAP_ROWS + row)
}

pub fn minimap_to_objects(data: &[i16]) -> Vec<MapObject> {
    data.iter()
        .enumerate()
        .map(|(index, &value)| {
            let (x, y) = room_position(index);
            MapObject::new(x, y, ROOM_PX_W, value)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum MinimapError {
    Misaligned { name: String, x: f64, y: f64 },
    BadValue { name: String, x: f64, y: f64 },
    Duplicate { col: usize, row: usize },
    Missing { col: usize, row: usize },
}

/// Strict: every room must be named by exactly one object.
pub fn objects_to_minimap(objects: &[MapObject]) -> Result<Vec<i16>, MinimapError> {
    let mut data: Vec<Option<i16>> = vec![None; MINIMAP_SIZE];
    for object in objects {
        let value = parse_value(&object.name).map_err(|_| MinimapError::BadValue {
            name: object.name.clone(),
            x: object.x,
            y: object.y,
        })?;
        let index = room_index(object.x, object.y).ok_or_else(|| MinimapError::Misaligned {
            name: object.name.clone(),
            x: object.x,
            y: object.y,
        })?;
        if data[index].replace(value).is_some() {
            return Err(MinimapError::Duplicate {
                col: index / MINIMAP_ROWS,
                row: index % MINIMAP_ROWS,
            });
        }
    }

    data.iter()
        .enumerate()
        .map(|(index, cell)| {
            cell.ok_or(MinimapError::Missing {
                col: index / MINIMAP_ROWS,
                row: index % MINIMAP_ROWS,
            })
        })
        .collect()
}
