use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::geometry::polygon::Polygon;

/// A point in logical canvas space (not pixels).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

impl Vertex {
    pub const fn new(x: f64, y: f64) -> Self {
        Vertex { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn midpoint(&self, other: &Vertex) -> Vertex {
        Vertex {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    pub fn offset_to(&self, other: &Vertex) -> (f64, f64) {
        (other.x - self.x, other.y - self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn rgba(&self, alpha: f32) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }
}

/// Building or unit identifier. Storage holds either numbers or strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Ident {
    Number(i64),
    Text(String),
}

pub const UNKNOWN_IDENT: &str = "unknown";

impl Ident {
    pub fn unknown() -> Self {
        Ident::Text(UNKNOWN_IDENT.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        match self {
            Ident::Number(_) => false,
            Ident::Text(s) => s.trim().is_empty() || s == UNKNOWN_IDENT,
        }
    }

    /// Trimmed copy; text is uppercased when `upper` is set.
    pub fn normalized(&self, upper: bool) -> Ident {
        match self {
            Ident::Number(n) => Ident::Number(*n),
            Ident::Text(s) => {
                let t = s.trim();
                Ident::Text(if upper { t.to_uppercase() } else { t.to_string() })
            }
        }
    }

    /// Numeric reading of the identifier, if it has one ("07" -> 7).
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Ident::Number(n) => Some(*n),
            Ident::Text(s) => {
                let v: f64 = s.trim().parse().ok()?;
                if v.is_finite() && v.fract() == 0.0 {
                    Some(v as i64)
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ident::Number(n) => write!(f, "{}", n),
            Ident::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Ident {
    fn from(n: i64) -> Self {
        Ident::Number(n)
    }
}

impl From<&str> for Ident {
    fn from(s: &str) -> Self {
        Ident::Text(s.to_string())
    }
}

impl From<String> for Ident {
    fn from(s: String) -> Self {
        Ident::Text(s)
    }
}

// Integral floats collapse to numbers so `1.0` and `1` name the same building.
impl<'de> Deserialize<'de> for Ident {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdentVisitor;

        impl<'de> Visitor<'de> for IdentVisitor {
            type Value = Ident;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string or number identifier")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Ident, E> {
                Ok(Ident::Number(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Ident, E> {
                i64::try_from(v)
                    .map(Ident::Number)
                    .or_else(|_| Ok(Ident::Text(v.to_string())))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Ident, E> {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                    Ok(Ident::Number(v as i64))
                } else {
                    Ok(Ident::Text(v.to_string()))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Ident, E> {
                Ok(Ident::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Ident, E> {
                Ok(Ident::Text(v))
            }
        }

        deserializer.deserialize_any(IdentVisitor)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitStatus {
    #[default]
    Available,
    Reserved,
    SoldTransferred,
    SoldNotTransferred,
    Unavailable,
    #[serde(other)]
    Unknown,
}

pub const GREEN: Rgb = Rgb { r: 34, g: 197, b: 94 };
pub const ORANGE: Rgb = Rgb { r: 249, g: 115, b: 22 };
pub const RED: Rgb = Rgb { r: 239, g: 68, b: 68 };
pub const GRAY: Rgb = Rgb { r: 107, g: 114, b: 128 };
pub const GOLD: Rgb = Rgb { r: 215, g: 194, b: 141 };

impl UnitStatus {
    pub fn label(&self) -> &'static str {
        match self {
            UnitStatus::Available => "Available",
            UnitStatus::Reserved => "Reserved",
            UnitStatus::SoldTransferred => "Sold",
            UnitStatus::SoldNotTransferred => "Sold (transfer pending)",
            UnitStatus::Unavailable => "Unavailable",
            UnitStatus::Unknown => "Unknown",
        }
    }

    pub fn highlight_color(&self) -> Rgb {
        match self {
            UnitStatus::Available => GREEN,
            UnitStatus::Reserved => ORANGE,
            UnitStatus::SoldTransferred | UnitStatus::SoldNotTransferred => RED,
            UnitStatus::Unavailable => GRAY,
            UnitStatus::Unknown => GOLD,
        }
    }

    /// Glow filter id used by the SVG overlay.
    pub fn glow_filter(&self) -> &'static str {
        match self {
            UnitStatus::Available => "greenGlow",
            UnitStatus::Reserved => "orangeGlow",
            UnitStatus::SoldTransferred | UnitStatus::SoldNotTransferred => "redGlow",
            UnitStatus::Unavailable => "grayGlow",
            UnitStatus::Unknown => "goldGlow",
        }
    }

    pub fn is_clickable(&self) -> bool {
        !matches!(self, UnitStatus::SoldTransferred)
    }

    /// Statuses shown by the table's "active" filter.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            UnitStatus::Available | UnitStatus::Reserved | UnitStatus::SoldNotTransferred
        )
    }
}

/// A unit record as handed over by the unit records provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRecord {
    pub building_number: Ident,
    pub unit_number: Ident,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub price_per_m2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UnitStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary_rooms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertices: Option<Vec<Vertex>>,
}

impl UnitRecord {
    pub fn new(building: impl Into<Ident>, unit: impl Into<Ident>) -> Self {
        UnitRecord {
            building_number: building.into(),
            unit_number: unit.into(),
            area: 0.0,
            price: 0.0,
            price_per_m2: 0.0,
            status: None,
            is_available: None,
            floor: None,
            auxiliary_rooms: None,
            vertices: None,
        }
    }

    pub fn with_status(mut self, status: UnitStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_vertices(mut self, vertices: Vec<Vertex>) -> Self {
        self.vertices = Some(vertices);
        self
    }

    pub fn status_or_default(&self) -> UnitStatus {
        self.status.unwrap_or_default()
    }

    pub fn key(&self) -> UnitKey {
        UnitKey::new(&self.building_number, &self.unit_number)
    }
}

/// Normalized (building, unit) identity used for lookups and matching.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnitKey {
    pub building: Ident,
    pub unit: Ident,
}

impl UnitKey {
    pub fn new(building: &Ident, unit: &Ident) -> Self {
        let building = match building.as_number() {
            Some(n) => Ident::Number(n),
            None => building.normalized(false),
        };
        UnitKey {
            building,
            unit: unit.normalized(true),
        }
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.building, self.unit)
    }
}

/// A unit positioned on the map.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub building_number: Ident,
    pub unit_number: Ident,
    pub polygon: Polygon,
    /// Index into the unit list the binding was derived from. Not an owner.
    pub source_unit_index: usize,
    pub status: UnitStatus,
    pub is_available: bool,
}

impl Binding {
    pub fn key(&self) -> UnitKey {
        UnitKey::new(&self.building_number, &self.unit_number)
    }

    pub fn is_sentinel(&self) -> bool {
        self.building_number.is_unknown() || self.unit_number.is_unknown()
    }
}

/// One entry of a geometry batch sent to or loaded from persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryRecord {
    pub building_number: Ident,
    pub unit_number: Ident,
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

impl GeometryRecord {
    pub fn key(&self) -> UnitKey {
        UnitKey::new(&self.building_number, &self.unit_number)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub level: Level,
}
