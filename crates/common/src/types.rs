use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of object the simulator world can hold.
///
/// Each kind has its own identifier namespace on the simulator side, and a
/// fixed number of size parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    #[serde(rename = "sph")]
    Sphere,
    #[serde(rename = "box")]
    Box,
    #[serde(rename = "cyl")]
    Cylinder,
    #[serde(rename = "ssph")]
    StaticSphere,
    #[serde(rename = "sbox")]
    StaticBox,
    #[serde(rename = "scyl")]
    StaticCylinder,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 6] = [
        ObjectKind::Sphere,
        ObjectKind::Box,
        ObjectKind::Cylinder,
        ObjectKind::StaticSphere,
        ObjectKind::StaticBox,
        ObjectKind::StaticCylinder,
    ];

    /// Token naming this kind in world commands.
    pub fn token(self) -> &'static str {
        match self {
            ObjectKind::Sphere => "sph",
            ObjectKind::Box => "box",
            ObjectKind::Cylinder => "cyl",
            ObjectKind::StaticSphere => "ssph",
            ObjectKind::StaticBox => "sbox",
            ObjectKind::StaticCylinder => "scyl",
        }
    }

    /// Number of size parameters the simulator expects:
    /// radius for spheres, radius and length for cylinders, x y z for boxes.
    pub fn size_arity(self) -> usize {
        match self {
            ObjectKind::Sphere | ObjectKind::StaticSphere => 1,
            ObjectKind::Cylinder | ObjectKind::StaticCylinder => 2,
            ObjectKind::Box | ObjectKind::StaticBox => 3,
        }
    }

    /// Static objects are not affected by gravity or collisions.
    pub fn is_static(self) -> bool {
        matches!(
            self,
            ObjectKind::StaticSphere | ObjectKind::StaticBox | ObjectKind::StaticCylinder
        )
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Error returned when a token does not name an object kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown object kind: {0:?}")]
pub struct UnknownKind(pub String);

impl FromStr for ObjectKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectKind::ALL
            .into_iter()
            .find(|kind| kind.token() == s)
            .ok_or_else(|| UnknownKind(s.to_owned()))
    }
}

/// Identifier assigned by the simulator, unique only within one [`ObjectKind`].
///
/// Starts at 1 for the first object of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimulatorId(pub u32);

impl fmt::Display for SimulatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-side handle for a created object, unique across all kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(pub usize);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Normalised RGB colour, each channel in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const RED: Rgb = Rgb::new(1.0, 0.0, 0.0);
    pub const GREEN: Rgb = Rgb::new(0.0, 1.0, 0.0);
    pub const BLUE: Rgb = Rgb::new(0.0, 0.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[f64; 3]> for Rgb {
    fn from([r, g, b]: [f64; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [f64; 3] {
    fn from(c: Rgb) -> Self {
        c.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tokens_round_trip() {
        for kind in ObjectKind::ALL {
            assert_eq!(kind.token().parse::<ObjectKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert_eq!(
            "cube".parse::<ObjectKind>(),
            Err(UnknownKind("cube".into()))
        );
        // Tokens are case-sensitive.
        assert!("BOX".parse::<ObjectKind>().is_err());
    }

    #[test]
    fn size_arity_per_kind() {
        assert_eq!(ObjectKind::Sphere.size_arity(), 1);
        assert_eq!(ObjectKind::StaticSphere.size_arity(), 1);
        assert_eq!(ObjectKind::Cylinder.size_arity(), 2);
        assert_eq!(ObjectKind::StaticCylinder.size_arity(), 2);
        assert_eq!(ObjectKind::Box.size_arity(), 3);
        assert_eq!(ObjectKind::StaticBox.size_arity(), 3);
    }

    #[test]
    fn static_kinds() {
        assert!(ObjectKind::StaticBox.is_static());
        assert!(!ObjectKind::Box.is_static());
    }

    #[test]
    fn rgb_from_array() {
        let c: Rgb = [1.0, 0.5, 0.0].into();
        assert_eq!(c, Rgb::new(1.0, 0.5, 0.0));
        assert_eq!(c.to_array(), [1.0, 0.5, 0.0]);
    }
}
