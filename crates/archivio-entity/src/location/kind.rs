//! Location kind enumeration and the parent/child compatibility table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of physical containers in the archive hierarchy.
///
/// The hierarchy is fixed and shallow: an office contains rooms, a room
/// contains shelving units, and so on down to folders. Each kind admits a
/// closed set of child kinds, see [`LocationKind::allowed_children`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "location_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// A physical office (root of a subtree).
    Office,
    /// A room inside an office.
    Room,
    /// A free-standing shelf unit.
    Shelf,
    /// A closed cabinet.
    Cabinet,
    /// One door of a cabinet.
    Door,
    /// A single horizontal level of a shelf, cabinet, or door.
    ShelfLevel,
    /// An archive box sitting on a shelf level.
    Box,
    /// A folder inside a box.
    Folder,
}

impl LocationKind {
    /// The closed set of kinds this kind may contain as direct children.
    pub fn allowed_children(&self) -> &'static [LocationKind] {
        use LocationKind::*;
        match self {
            Office => &[Room],
            Room => &[Shelf, Cabinet, ShelfLevel],
            Cabinet => &[Door, ShelfLevel],
            Door => &[ShelfLevel],
            Shelf => &[ShelfLevel],
            ShelfLevel => &[Box],
            Box => &[Folder],
            Folder => &[],
        }
    }

    /// Whether this kind may contain `child` as a direct child.
    pub fn allows_child(&self, child: LocationKind) -> bool {
        self.allowed_children().contains(&child)
    }

    /// Whether this kind may appear at the root of the forest.
    /// Only offices exist without a parent.
    pub fn is_root_kind(&self) -> bool {
        matches!(self, Self::Office)
    }

    /// The conventional code prefix used when the caller does not
    /// supply one explicitly.
    pub fn default_prefix(&self) -> &'static str {
        match self {
            Self::Office => "OFF",
            Self::Room => "ROOM",
            Self::Shelf => "SHELF",
            Self::Cabinet => "CAB",
            Self::Door => "DOOR",
            Self::ShelfLevel => "LVL",
            Self::Box => "BOX",
            Self::Folder => "FLD",
        }
    }

    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Office => "office",
            Self::Room => "room",
            Self::Shelf => "shelf",
            Self::Cabinet => "cabinet",
            Self::Door => "door",
            Self::ShelfLevel => "shelf_level",
            Self::Box => "box",
            Self::Folder => "folder",
        }
    }

    /// All kinds, in hierarchy order.
    pub fn all() -> &'static [LocationKind] {
        use LocationKind::*;
        &[Office, Room, Shelf, Cabinet, Door, ShelfLevel, Box, Folder]
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LocationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "office" => Ok(Self::Office),
            "room" => Ok(Self::Room),
            "shelf" => Ok(Self::Shelf),
            "cabinet" => Ok(Self::Cabinet),
            "door" => Ok(Self::Door),
            "shelf_level" | "shelflevel" | "level" => Ok(Self::ShelfLevel),
            "box" => Ok(Self::Box),
            "folder" => Ok(Self::Folder),
            other => Err(format!("Unknown location kind: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_children_table() {
        use LocationKind::*;
        assert_eq!(Office.allowed_children(), &[Room]);
        assert_eq!(Room.allowed_children(), &[Shelf, Cabinet, ShelfLevel]);
        assert_eq!(Cabinet.allowed_children(), &[Door, ShelfLevel]);
        assert_eq!(Door.allowed_children(), &[ShelfLevel]);
        assert_eq!(Shelf.allowed_children(), &[ShelfLevel]);
        assert_eq!(ShelfLevel.allowed_children(), &[Box]);
        assert_eq!(Box.allowed_children(), &[Folder]);
        assert!(Folder.allowed_children().is_empty());
    }

    #[test]
    fn test_every_invalid_pair_is_rejected() {
        for parent in LocationKind::all() {
            for child in LocationKind::all() {
                let allowed = parent.allowed_children().contains(child);
                assert_eq!(parent.allows_child(*child), allowed);
            }
        }
    }

    #[test]
    fn test_only_office_is_root() {
        for kind in LocationKind::all() {
            assert_eq!(kind.is_root_kind(), *kind == LocationKind::Office);
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "shelf_level".parse::<LocationKind>().unwrap(),
            LocationKind::ShelfLevel
        );
        assert_eq!("BOX".parse::<LocationKind>().unwrap(), LocationKind::Box);
        assert!("drawer".parse::<LocationKind>().is_err());
    }
}
