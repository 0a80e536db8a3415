/// Attached world objects: the doors and actor terminals a puzzle guards.
///
/// Each object carries the flags the host consults before routing an
/// interaction: whether its puzzle is enabled at all, and which registered
/// package governs it (empty = use the default type for its kind). Objects
/// are fully independent; a session only ever mutates its own object.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Door,
    Actor,
}

impl ObjectKind {
    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::Door => "DOOR",
            ObjectKind::Actor => "TERMINAL",
        }
    }

    pub fn parse(s: &str) -> Option<ObjectKind> {
        match s.to_ascii_lowercase().as_str() {
            "door" => Some(ObjectKind::Door),
            "actor" => Some(ObjectKind::Actor),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WorldObject {
    pub name: String,
    pub kind: ObjectKind,
    pub locked: bool,
    pub puzzle_enabled: bool,
    /// Registered package id, or empty to use the kind default.
    pub puzzle_type: String,
}

impl WorldObject {
    pub fn new(name: &str, kind: ObjectKind) -> WorldObject {
        WorldObject {
            name: name.to_string(),
            kind,
            locked: true,
            puzzle_enabled: true,
            puzzle_type: String::new(),
        }
    }

    /// Built-in facility used when the config defines no objects,
    /// so the binary is playable out of the box.
    pub fn demo_facility() -> Vec<WorldObject> {
        let mut armory = WorldObject::new("Armory Door", ObjectKind::Door);
        armory.puzzle_enabled = false;
        vec![
            WorldObject::new("Maintenance Door", ObjectKind::Door),
            armory,
            WorldObject::new("Overseer Console", ObjectKind::Actor),
        ]
    }
}
