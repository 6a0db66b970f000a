//! Command encoder.
//!
//! Commands are plain values; [`Command::encode`] renders the bottle sent to
//! the world port. Size arity is not checked here: whatever sizes are given
//! are sent, and the simulator decides.

use glam::DVec3;

use simworld_bottle::Bottle;
use simworld_common::{ObjectKind, Rgb, SimulatorId};

const WORLD: &str = "world";

/// One request to the simulator's world port.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `world del all`
    DeleteAll,
    /// `world mk <kind> <size..> <x y z> <r g b>`
    Create {
        kind: ObjectKind,
        size: Vec<f64>,
        location: DVec3,
        colour: Rgb,
    },
    /// `world set <kind> <id> <x y z>`
    Move {
        kind: ObjectKind,
        id: SimulatorId,
        location: DVec3,
    },
    /// `world rot <kind> <id> <rx ry rz>`
    Rotate {
        kind: ObjectKind,
        id: SimulatorId,
        rotation: DVec3,
    },
    /// `world get <kind> <id>`
    GetLocation { kind: ObjectKind, id: SimulatorId },
}

impl Command {
    /// Verb tokens following `world`.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::DeleteAll => "del all",
            Command::Create { .. } => "mk",
            Command::Move { .. } => "set",
            Command::Rotate { .. } => "rot",
            Command::GetLocation { .. } => "get",
        }
    }

    pub fn encode(&self) -> Bottle {
        let mut b = Bottle::new();
        b.add_string(WORLD);
        match self {
            Command::DeleteAll => {
                b.add_string("del").add_string("all");
            }
            Command::Create {
                kind,
                size,
                location,
                colour,
            } => {
                b.add_string("mk").add_string(kind.token());
                for s in size {
                    b.add_double(*s);
                }
                add_vec3(&mut b, *location);
                for c in colour.to_array() {
                    b.add_double(c);
                }
            }
            Command::Move { kind, id, location } => {
                b.add_string("set").add_string(kind.token());
                b.add_int(i64::from(id.0));
                add_vec3(&mut b, *location);
            }
            Command::Rotate { kind, id, rotation } => {
                b.add_string("rot").add_string(kind.token());
                b.add_int(i64::from(id.0));
                add_vec3(&mut b, *rotation);
            }
            Command::GetLocation { kind, id } => {
                b.add_string("get").add_string(kind.token());
                b.add_int(i64::from(id.0));
            }
        }
        b
    }
}

fn add_vec3(b: &mut Bottle, v: DVec3) {
    b.add_double(v.x).add_double(v.y).add_double(v.z);
}
