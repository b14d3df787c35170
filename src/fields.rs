//! The field catalog.
//!
//! Static knowledge of which field names exist per dataset kind and whether
//! each is numeric or textual. Fields are closed enums so an unknown name is
//! rejected once, at bind time, by a failed parse; everything downstream
//! works with exhaustive matches instead of string membership checks.

use serde_json::Value;

use crate::dataset::{Room, Section};

/// Whether a field holds numbers or text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Textual,
}

/// Fields of a course section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseField {
    Dept,
    Id,
    Instructor,
    Title,
    Uuid,
    Avg,
    Pass,
    Fail,
    Audit,
    Year,
}

impl CourseField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "dept" => Some(Self::Dept),
            "id" => Some(Self::Id),
            "instructor" => Some(Self::Instructor),
            "title" => Some(Self::Title),
            "uuid" => Some(Self::Uuid),
            "avg" => Some(Self::Avg),
            "pass" => Some(Self::Pass),
            "fail" => Some(Self::Fail),
            "audit" => Some(Self::Audit),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Dept | Self::Id | Self::Instructor | Self::Title | Self::Uuid => {
                FieldKind::Textual
            }
            Self::Avg | Self::Pass | Self::Fail | Self::Audit | Self::Year => FieldKind::Numeric,
        }
    }

    pub fn value(&self, section: &Section) -> FieldValue {
        match self {
            Self::Dept => FieldValue::Text(section.dept.clone()),
            Self::Id => FieldValue::Text(section.id.clone()),
            Self::Instructor => FieldValue::Text(section.instructor.clone()),
            Self::Title => FieldValue::Text(section.title.clone()),
            Self::Uuid => FieldValue::Text(section.uuid.clone()),
            Self::Avg => FieldValue::Number(section.avg),
            Self::Pass => FieldValue::Number(section.pass),
            Self::Fail => FieldValue::Number(section.fail),
            Self::Audit => FieldValue::Number(section.audit),
            Self::Year => FieldValue::Number(section.year),
        }
    }
}

/// Fields of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomField {
    Fullname,
    Shortname,
    Number,
    Name,
    Address,
    Type,
    Furniture,
    Href,
    Lat,
    Lon,
    Seats,
}

impl RoomField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "fullname" => Some(Self::Fullname),
            "shortname" => Some(Self::Shortname),
            "number" => Some(Self::Number),
            "name" => Some(Self::Name),
            "address" => Some(Self::Address),
            "type" => Some(Self::Type),
            "furniture" => Some(Self::Furniture),
            "href" => Some(Self::Href),
            "lat" => Some(Self::Lat),
            "lon" => Some(Self::Lon),
            "seats" => Some(Self::Seats),
            _ => None,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Fullname
            | Self::Shortname
            | Self::Number
            | Self::Name
            | Self::Address
            | Self::Type
            | Self::Furniture
            | Self::Href => FieldKind::Textual,
            Self::Lat | Self::Lon | Self::Seats => FieldKind::Numeric,
        }
    }

    pub fn value(&self, room: &Room) -> FieldValue {
        match self {
            Self::Fullname => FieldValue::Text(room.fullname.clone()),
            Self::Shortname => FieldValue::Text(room.shortname.clone()),
            Self::Number => FieldValue::Text(room.number.clone()),
            Self::Name => FieldValue::Text(room.name.clone()),
            Self::Address => FieldValue::Text(room.address.clone()),
            Self::Type => FieldValue::Text(room.room_type.clone()),
            Self::Furniture => FieldValue::Text(room.furniture.clone()),
            Self::Href => FieldValue::Text(room.href.clone()),
            Self::Lat => FieldValue::Number(room.lat),
            Self::Lon => FieldValue::Number(room.lon),
            Self::Seats => FieldValue::Number(room.seats),
        }
    }
}

/// A field of either dataset kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Course(CourseField),
    Room(RoomField),
}

impl Field {
    /// Look a field name up in the catalog of the given kind.
    pub fn parse(kind: crate::dataset::DatasetKind, name: &str) -> Option<Field> {
        match kind {
            crate::dataset::DatasetKind::Courses => CourseField::parse(name).map(Field::Course),
            crate::dataset::DatasetKind::Rooms => RoomField::parse(name).map(Field::Room),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Course(field) => field.kind(),
            Field::Room(field) => field.kind(),
        }
    }
}

/// A scalar field value read from a row or computed by an aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Convert to a JSON value. Numbers with no fractional part serialize as
    /// integers, matching the original wire output.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Number(n) => number_value(*n),
            FieldValue::Text(s) => Value::String(s.clone()),
        }
    }

    /// Canonical string form, used for group identity and distinct counting.
    pub fn canonical(&self) -> String {
        serde_json::to_string(&self.to_json()).unwrap_or_default()
    }
}

fn number_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9e15 {
        Value::Number(serde_json::Number::from(n as i64))
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
