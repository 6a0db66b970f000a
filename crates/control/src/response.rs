//! Response interpreter.

use glam::DVec3;

use simworld_bottle::{Bottle, Value, Vocab};

/// A reply acknowledges a command iff it is exactly one `[ok]` field.
pub fn is_ack(reply: &Bottle) -> bool {
    reply.len() == 1 && reply.get(0).and_then(Value::as_vocab) == Some(Vocab::OK)
}

/// Read a location reply: exactly three numeric fields, x y z.
pub fn vector3(reply: &Bottle) -> Option<DVec3> {
    match reply.values() {
        [x, y, z] => Some(DVec3::new(x.as_f64()?, y.as_f64()?, z.as_f64()?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(text: &str) -> Bottle {
        text.parse().unwrap()
    }

    #[test]
    fn ok_is_ack() {
        assert!(is_ack(&reply("[ok]")));
    }

    #[test]
    fn anything_else_is_not_ack() {
        for text in ["", "[fail]", "[ok] [ok]", "[ok] 1", "ok", "27503", "([ok])"] {
            assert!(!is_ack(&reply(text)), "{text:?} must not acknowledge");
        }
    }

    #[test]
    fn three_numbers_make_a_vector() {
        assert_eq!(
            vector3(&reply("0.5 -1.25 2")),
            Some(DVec3::new(0.5, -1.25, 2.0))
        );
    }

    #[test]
    fn wrong_field_count_is_a_failure() {
        assert_eq!(vector3(&reply("1.0 2.0")), None);
        assert_eq!(vector3(&reply("1.0 2.0 3.0 4.0")), None);
        assert_eq!(vector3(&reply("[ok]")), None);
        assert_eq!(vector3(&reply("")), None);
    }

    #[test]
    fn non_numeric_field_is_a_failure() {
        assert_eq!(vector3(&reply("1.0 [fail] 3.0")), None);
        assert_eq!(vector3(&reply("1.0 two 3.0")), None);
    }
}
