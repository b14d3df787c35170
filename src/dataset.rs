//! Dataset kinds and row types.
//!
//! A dataset is an immutable, in-memory collection of typed rows. The engine
//! only ever borrows a dataset read-only for the duration of one query, so
//! concurrent evaluations over the same snapshot need no locking.

use serde::{Deserialize, Serialize};

use crate::fields::{Field, FieldValue};

/// The two supported dataset kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Courses,
    Rooms,
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetKind::Courses => write!(f, "courses"),
            DatasetKind::Rooms => write!(f, "rooms"),
        }
    }
}

/// One offering of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub dept: String,
    pub id: String,
    pub instructor: String,
    pub title: String,
    pub uuid: String,
    pub avg: f64,
    pub pass: f64,
    pub fail: f64,
    pub audit: f64,
    pub year: f64,
}

impl Section {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dept: impl Into<String>,
        id: impl Into<String>,
        instructor: impl Into<String>,
        title: impl Into<String>,
        uuid: impl Into<String>,
        avg: f64,
        pass: f64,
        fail: f64,
        audit: f64,
        year: f64,
    ) -> Self {
        Self {
            dept: dept.into(),
            id: id.into(),
            instructor: instructor.into(),
            title: title.into(),
            uuid: uuid.into(),
            avg,
            pass,
            fail,
            audit,
            year,
        }
    }
}

/// One campus room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub fullname: String,
    pub shortname: String,
    pub number: String,
    pub name: String,
    pub address: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub furniture: String,
    pub href: String,
    pub lat: f64,
    pub lon: f64,
    pub seats: f64,
}

impl Room {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fullname: impl Into<String>,
        shortname: impl Into<String>,
        number: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        room_type: impl Into<String>,
        furniture: impl Into<String>,
        href: impl Into<String>,
        lat: f64,
        lon: f64,
        seats: f64,
    ) -> Self {
        Self {
            fullname: fullname.into(),
            shortname: shortname.into(),
            number: number.into(),
            name: name.into(),
            address: address.into(),
            room_type: room_type.into(),
            furniture: furniture.into(),
            href: href.into(),
            lat,
            lon,
            seats,
        }
    }
}

/// A row of either dataset kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Row {
    Section(Section),
    Room(Room),
}

impl Row {
    /// Read one field of this row. Returns `None` when the field belongs to
    /// the other dataset kind, which a bound query can never produce.
    pub fn get(&self, field: Field) -> Option<FieldValue> {
        match (self, field) {
            (Row::Section(section), Field::Course(field)) => Some(field.value(section)),
            (Row::Room(room), Field::Room(field)) => Some(field.value(room)),
            _ => None,
        }
    }
}

/// An identified, immutable collection of rows of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub kind: DatasetKind,
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Build a courses dataset from sections.
    pub fn courses(id: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            id: id.into(),
            kind: DatasetKind::Courses,
            rows: sections.into_iter().map(Row::Section).collect(),
        }
    }

    /// Build a rooms dataset from rooms.
    pub fn rooms(id: impl Into<String>, rooms: Vec<Room>) -> Self {
        Self {
            id: id.into(),
            kind: DatasetKind::Rooms,
            rows: rooms.into_iter().map(Row::Room).collect(),
        }
    }
}
