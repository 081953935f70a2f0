//! Typed map properties and their document representation.
//!
//! The document stores properties either as `{name: value}` plus a parallel
//! `{name: type}` table, or as a list of `{name, type, value}` entries. Both
//! are read into [`PropertyValue`]s checked against a fixed schema.

use serde_json::{Map, Value};

use super::document::{Document, RawProperties};
use crate::error::{ConvertError, Result};
use crate::processor::diagnostics::Diagnostics;

pub const PROPERTIES_LAYER: &str = "properties";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Bool,
    Int,
    Float,
}

impl PropertyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::String => "string",
            PropertyKind::Bool => "bool",
            PropertyKind::Int => "int",
            PropertyKind::Float => "float",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::String(_) => PropertyKind::String,
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::Int(_) => PropertyKind::Int,
            PropertyValue::Float(_) => PropertyKind::Float,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::String(s) => Value::from(s.as_str()),
            PropertyValue::Bool(b) => Value::from(*b),
            PropertyValue::Int(i) => Value::from(*i),
            PropertyValue::Float(f) => Value::from(*f),
        }
    }

    /// Read a JSON value as `kind`. Integral numbers are accepted for
    /// floats since editors drop the fraction of whole values.
    pub fn from_json(kind: PropertyKind, value: &Value) -> Option<PropertyValue> {
        match kind {
            PropertyKind::String => value.as_str().map(|s| PropertyValue::String(s.to_string())),
            PropertyKind::Bool => value.as_bool().map(PropertyValue::Bool),
            PropertyKind::Int => value.as_i64().map(PropertyValue::Int),
            PropertyKind::Float => value.as_f64().map(PropertyValue::Float),
        }
    }
}

/// Number of bunmania par times.
pub const PAR_TIMES: usize = 5;

pub const DEFAULT_PAR_TIME: f64 = 300.0;

/// One field of the bunmania metadata block. The discriminant order is the
/// event-layer row the field is packed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    Name,
    Author,
    ParTime(u8),
    FullCompletion,
    Difficulty,
    EggCount,
}

impl MetaField {
    pub const ALL: [MetaField; 10] = [
        MetaField::Name,
        MetaField::Author,
        MetaField::ParTime(0),
        MetaField::ParTime(1),
        MetaField::ParTime(2),
        MetaField::ParTime(3),
        MetaField::ParTime(4),
        MetaField::FullCompletion,
        MetaField::Difficulty,
        MetaField::EggCount,
    ];

    pub fn row(self) -> usize {
        match self {
            MetaField::Name => 0,
            MetaField::Author => 1,
            MetaField::ParTime(n) => 2 + n as usize,
            MetaField::FullCompletion => 7,
            MetaField::Difficulty => 8,
            MetaField::EggCount => 9,
        }
    }

    pub fn property(self) -> &'static str {
        match self {
            MetaField::Name => "name",
            MetaField::Author => "author",
            MetaField::ParTime(n) => ["par_time_1", "par_time_2", "par_time_3", "par_time_4", "par_time_5"]
                [(n as usize).min(PAR_TIMES - 1)],
            MetaField::FullCompletion => "full_completion",
            MetaField::Difficulty => "difficulty",
            MetaField::EggCount => "egg_count",
        }
    }

    pub fn kind(self) -> PropertyKind {
        match self {
            MetaField::Name | MetaField::Author => PropertyKind::String,
            MetaField::ParTime(_) => PropertyKind::Float,
            MetaField::FullCompletion => PropertyKind::Bool,
            MetaField::Difficulty | MetaField::EggCount => PropertyKind::Int,
        }
    }

    /// Number of event cells the field may occupy.
    pub fn capacity(self) -> usize {
        match self {
            MetaField::Name | MetaField::Author => 64,
            MetaField::ParTime(_) => 3,
            _ => 1,
        }
    }
}

/// Decoded bunmania metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub name: String,
    pub author: String,
    /// Seconds.
    pub par_times: [f64; PAR_TIMES],
    pub full_completion: bool,
    pub difficulty: i64,
    pub egg_count: i64,
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata {
            name: String::new(),
            author: String::new(),
            par_times: [DEFAULT_PAR_TIME; PAR_TIMES],
            full_completion: false,
            difficulty: 0,
            egg_count: 0,
        }
    }
}

impl Metadata {
    pub fn get(&self, field: MetaField) -> PropertyValue {
        match field {
            MetaField::Name => PropertyValue::String(self.name.clone()),
            MetaField::Author => PropertyValue::String(self.author.clone()),
            MetaField::ParTime(n) => PropertyValue::Float(self.par_times[n as usize]),
            MetaField::FullCompletion => PropertyValue::Bool(self.full_completion),
            MetaField::Difficulty => PropertyValue::Int(self.difficulty),
            MetaField::EggCount => PropertyValue::Int(self.egg_count),
        }
    }

    /// Store `value` if it has the field's kind; returns whether it did.
    pub fn set(&mut self, field: MetaField, value: PropertyValue) -> bool {
        match (field, value) {
            (MetaField::Name, PropertyValue::String(s)) => self.name = s,
            (MetaField::Author, PropertyValue::String(s)) => self.author = s,
            (MetaField::ParTime(n), PropertyValue::Float(t)) => self.par_times[n as usize] = t,
            (MetaField::FullCompletion, PropertyValue::Bool(b)) => self.full_completion = b,
            (MetaField::Difficulty, PropertyValue::Int(i)) => self.difficulty = i,
            (MetaField::EggCount, PropertyValue::Int(i)) => self.egg_count = i,
            _ => return false,
        }
        true
    }
}

/// Everything the converter keeps in the document's property table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapProperties {
    pub bunmania: bool,
    pub metadata: Metadata,
    pub area: Option<i32>,
    pub map_version: Option<i32>,
}

const BUNMANIA: &str = "bunmania";
const AREA: &str = "area";
const MAP_VERSION: &str = "map_version";

impl MapProperties {
    /// Legacy `properties` / `propertytypes` pair.
    pub fn to_document(&self) -> (Map<String, Value>, Map<String, Value>) {
        let mut values = Map::new();
        let mut types = Map::new();
        let mut put = |name: &str, value: PropertyValue| {
            types.insert(name.to_string(), Value::from(value.kind().as_str()));
            values.insert(name.to_string(), value.to_json());
        };

        put(BUNMANIA, PropertyValue::Bool(self.bunmania));
        for field in MetaField::ALL {
            put(field.property(), self.metadata.get(field));
        }
        if let Some(area) = self.area {
            put(AREA, PropertyValue::Int(area.into()));
        }
        if let Some(version) = self.map_version {
            put(MAP_VERSION, PropertyValue::Int(version.into()));
        }
        (values, types)
    }

    /// Read the property table. Type problems are warnings (the default is
    /// kept) unless `strict`, in which case they abort the conversion.
    pub fn from_document(doc: &Document, strict: bool, diag: &mut Diagnostics) -> Result<MapProperties> {
        let table = PropertyTable::new(doc);
        let mut props = MapProperties {
            bunmania: matches!(table.read(BUNMANIA, PropertyKind::Bool, strict, diag)?, Some(PropertyValue::Bool(true))),
            ..MapProperties::default()
        };

        props.area = table.read_i32(AREA, strict, diag)?;
        props.map_version = table.read_i32(MAP_VERSION, strict, diag)?;

        if !props.bunmania {
            return Ok(props);
        }

        for field in MetaField::ALL {
            match table.read(field.property(), field.kind(), strict, diag)? {
                Some(value) => {
                    props.metadata.set(field, value);
                }
                None if !table.has(field.property()) => diag.warn(
                    PROPERTIES_LAYER,
                    format!("property `{}` is missing, using {:?}", field.property(), props.metadata.get(field)),
                ),
                None => {}
            }
        }
        Ok(props)
    }
}

/// Name → (declared type, value) view over either property form.
struct PropertyTable<'a> {
    entries: Vec<(&'a str, Option<&'a str>, &'a Value)>,
}

impl<'a> PropertyTable<'a> {
    fn new(doc: &'a Document) -> Self {
        let entries = match &doc.properties {
            RawProperties::Legacy(values) => values
                .iter()
                .map(|(name, value)| {
                    let declared = doc.propertytypes.get(name).and_then(Value::as_str);
                    (name.as_str(), declared, value)
                })
                .collect(),
            RawProperties::List(list) => list
                .iter()
                .map(|p| (p.name.as_str(), p.kind.as_deref(), &p.value))
                .collect(),
        };
        PropertyTable { entries }
    }

    fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _, _)| *n == name)
    }

    fn read(
        &self,
        name: &'static str,
        kind: PropertyKind,
        strict: bool,
        diag: &mut Diagnostics,
    ) -> Result<Option<PropertyValue>> {
        let Some(&(_, declared, value)) = self.entries.iter().find(|(n, _, _)| *n == name) else {
            return Ok(None);
        };

        let found = match declared {
            Some(declared) if declared != kind.as_str() => Some(declared.to_string()),
            _ => None,
        };
        let parsed = PropertyValue::from_json(kind, value);
        let found = match (found, &parsed) {
            (Some(declared), _) => declared,
            (None, None) => format!("value {value}"),
            (None, Some(value)) => return Ok(Some(value.clone())),
        };

        if strict {
            return Err(ConvertError::PropertyType { name, expected: kind.as_str(), found });
        }
        diag.warn(
            PROPERTIES_LAYER,
            format!("property `{name}` should be {}, found {found}; using the default", kind.as_str()),
        );
        Ok(None)
    }

    fn read_i32(&self, name: &'static str, strict: bool, diag: &mut Diagnostics) -> Result<Option<i32>> {
        let Some(PropertyValue::Int(value)) = self.read(name, PropertyKind::Int, strict, diag)? else {
            return Ok(None);
        };
        match i32::try_from(value) {
            Ok(v) => Ok(Some(v)),
            Err(_) if strict => Err(ConvertError::PropertyOutOfRange {
                name,
                value,
                min: i32::MIN.into(),
                max: i32::MAX.into(),
            }),
            Err(_) => {
                diag.warn(PROPERTIES_LAYER, format!("property `{name}` = {value} does not fit 32 bits, ignoring it"));
                Ok(None)
            }
        }
    }
}
