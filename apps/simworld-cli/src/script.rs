//! YAML scripts of world operations.
//!
//! ```yaml
//! steps:
//!   - op: create
//!     kind: sbox
//!     size: [1.0, 1.0, 1.0]
//!     location: [0.0, 0.0, 1.0]
//!     colour: [1.0, 0.0, 0.0]
//!   - op: move
//!     handle: 0
//!     location: [0.0, 0.5, 1.0]
//!   - op: get
//!     handle: 0
//!   - op: delete_all
//! ```

use glam::DVec3;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use simworld_common::{Handle, ObjectKind, Rgb};
use simworld_control::{ControlError, WorldController};
use simworld_transport::RpcChannel;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Create {
        kind: ObjectKind,
        size: Vec<f64>,
        location: DVec3,
        colour: Rgb,
    },
    Move {
        handle: Handle,
        location: DVec3,
    },
    Rotate {
        handle: Handle,
        rotation: DVec3,
    },
    Get {
        handle: Handle,
    },
    DeleteAll,
}

impl Script {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

/// Result of one step, for printing.
#[derive(Debug)]
pub enum Outcome {
    Created(Handle),
    Acknowledged(bool),
    Location(DVec3),
    Failed(ControlError),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created(h) => write!(f, "created {h}"),
            Outcome::Acknowledged(true) => f.write_str("ok"),
            Outcome::Acknowledged(false) => f.write_str("rejected"),
            Outcome::Location(p) => write!(f, "at ({:.3}, {:.3}, {:.3})", p.x, p.y, p.z),
            Outcome::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

impl Step {
    pub fn run<C: RpcChannel>(&self, ctl: &mut WorldController<C>) -> Outcome {
        let result = match self {
            Step::Create {
                kind,
                size,
                location,
                colour,
            } => ctl
                .create(*kind, size, *location, *colour)
                .map(Outcome::Created),
            Step::Move { handle, location } => ctl
                .move_object(*handle, *location)
                .map(Outcome::Acknowledged),
            Step::Rotate { handle, rotation } => ctl
                .rotate_object(*handle, *rotation)
                .map(Outcome::Acknowledged),
            Step::Get { handle } => ctl.location(*handle).map(Outcome::Location),
            Step::DeleteAll => ctl.delete_all().map(Outcome::Acknowledged),
        };
        result.unwrap_or_else(Outcome::Failed)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Create { kind, size, .. } => write!(f, "create {kind} {size:?}"),
            Step::Move { handle, location } => write!(f, "move {handle} to {location}"),
            Step::Rotate { handle, rotation } => write!(f, "rotate {handle} to {rotation}"),
            Step::Get { handle } => write!(f, "get {handle}"),
            Step::DeleteAll => f.write_str("delete all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_step_kind() {
        let script = Script::from_yaml_str(
            r#"
steps:
  - op: create
    kind: ssph
    size: [0.1]
    location: [0.0, 0.0, 0.5]
    colour: [0.0, 1.0, 0.0]
  - op: move
    handle: 0
    location: [1.0, 0.0, 0.5]
  - op: rotate
    handle: 0
    rotation: [0.0, 0.0, 90.0]
  - op: get
    handle: 0
  - op: delete_all
"#,
        )
        .unwrap();

        assert_eq!(script.steps.len(), 5);
        assert_eq!(
            script.steps[0],
            Step::Create {
                kind: ObjectKind::StaticSphere,
                size: vec![0.1],
                location: DVec3::new(0.0, 0.0, 0.5),
                colour: Rgb::GREEN,
            }
        );
        assert_eq!(script.steps[3], Step::Get { handle: Handle(0) });
        assert_eq!(script.steps[4], Step::DeleteAll);
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let result = Script::from_yaml_str(
            "steps:\n  - op: create\n    kind: cube\n    size: [1]\n    location: [0, 0, 0]\n    colour: [1, 1, 1]\n",
        );
        assert!(result.is_err());
    }
}
