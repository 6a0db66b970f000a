use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use simworld_bottle::{Bottle, Value, Vocab};
use simworld_common::{ObjectKind, Rgb, SimulatorId};
use simworld_transport::{Responder, TransportError};

/// An event record produced by every mutation of the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Created {
        kind: ObjectKind,
        id: SimulatorId,
        position: DVec3,
    },
    Moved {
        kind: ObjectKind,
        id: SimulatorId,
        old: DVec3,
        new: DVec3,
    },
    Rotated {
        kind: ObjectKind,
        id: SimulatorId,
        old: DVec3,
        new: DVec3,
    },
    /// All objects removed. Carries how many there were.
    Cleared { count: usize },
}

/// What `world del all` does to the per-kind id counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterPolicy {
    /// Counters restart, so the next object of each kind gets id 1.
    #[default]
    ResetOnClear,
    /// Counters keep growing for the whole session.
    Monotonic,
}

/// An object held by the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimObject {
    pub kind: ObjectKind,
    pub size: Vec<f64>,
    pub position: DVec3,
    /// Absolute rotation in degrees around x, y, z.
    pub rotation: DVec3,
    pub colour: Rgb,
}

/// Why a command was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("not a world command")]
    NotWorldCommand,
    #[error("unknown verb {0:?}")]
    UnknownVerb(String),
    #[error("unknown object kind {0:?}")]
    UnknownKind(String),
    #[error("{kind} takes {expected} size values, got {got}")]
    BadArity {
        kind: ObjectKind,
        expected: usize,
        got: usize,
    },
    #[error("field {0} is missing")]
    MissingField(usize),
    #[error("field {index} should be {expected}, got {found}")]
    WrongType {
        index: usize,
        expected: &'static str,
        found: Value,
    },
    #[error("unexpected trailing fields from {0}")]
    TrailingFields(usize),
    #[error("no {kind} with id {id}")]
    NoSuchObject { kind: ObjectKind, id: SimulatorId },
}

/// The simulator's world state.
///
/// Objects are keyed by (kind, id) in a BTreeMap so iteration is deterministic.
#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    objects: BTreeMap<(ObjectKind, SimulatorId), SimObject>,
    counters: BTreeMap<ObjectKind, u32>,
    policy: CounterPolicy,
    event_log: Vec<SimEvent>,
    /// Events only go to `tracing`, the log stays empty.
    trace_only: bool,
}

impl SimWorld {
    /// Create an empty world whose counters reset on clear.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CounterPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Stop keeping events in memory. They are still emitted at `debug`.
    ///
    /// Meant for long-running worlds where nobody drains the log.
    pub fn without_event_log(mut self) -> Self {
        self.trace_only = true;
        self.event_log.clear();
        self
    }

    pub fn policy(&self) -> CounterPolicy {
        self.policy
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn get(&self, kind: ObjectKind, id: SimulatorId) -> Option<&SimObject> {
        self.objects.get(&(kind, id))
    }

    /// Last id handed out for `kind`, 0 if none.
    pub fn counter(&self, kind: ObjectKind) -> u32 {
        self.counters.get(&kind).copied().unwrap_or(0)
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.event_log)
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.event_log
    }

    fn record(&mut self, event: SimEvent) {
        tracing::debug!(?event, objects = self.objects.len(), "world event");
        if !self.trace_only {
            self.event_log.push(event);
        }
    }

    /// Add an object and return the id assigned within its kind.
    pub fn create(
        &mut self,
        kind: ObjectKind,
        size: Vec<f64>,
        position: DVec3,
        colour: Rgb,
    ) -> Result<SimulatorId, CommandError> {
        if size.len() != kind.size_arity() {
            return Err(CommandError::BadArity {
                kind,
                expected: kind.size_arity(),
                got: size.len(),
            });
        }
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        let id = SimulatorId(*counter);
        self.objects.insert(
            (kind, id),
            SimObject {
                kind,
                size,
                position,
                rotation: DVec3::ZERO,
                colour,
            },
        );
        self.record(SimEvent::Created { kind, id, position });
        Ok(id)
    }

    pub fn set_position(
        &mut self,
        kind: ObjectKind,
        id: SimulatorId,
        new: DVec3,
    ) -> Result<(), CommandError> {
        let object = self
            .objects
            .get_mut(&(kind, id))
            .ok_or(CommandError::NoSuchObject { kind, id })?;
        let old = std::mem::replace(&mut object.position, new);
        self.record(SimEvent::Moved { kind, id, old, new });
        Ok(())
    }

    pub fn set_rotation(
        &mut self,
        kind: ObjectKind,
        id: SimulatorId,
        new: DVec3,
    ) -> Result<(), CommandError> {
        let object = self
            .objects
            .get_mut(&(kind, id))
            .ok_or(CommandError::NoSuchObject { kind, id })?;
        let old = std::mem::replace(&mut object.rotation, new);
        self.record(SimEvent::Rotated { kind, id, old, new });
        Ok(())
    }

    pub fn position(&self, kind: ObjectKind, id: SimulatorId) -> Result<DVec3, CommandError> {
        self.get(kind, id)
            .map(|o| o.position)
            .ok_or(CommandError::NoSuchObject { kind, id })
    }

    /// Remove every object. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.objects.len();
        self.objects.clear();
        if self.policy == CounterPolicy::ResetOnClear {
            self.counters.clear();
        }
        self.record(SimEvent::Cleared { count });
        count
    }

    /// Execute one command bottle, returning the reply for a successful command.
    pub fn execute(&mut self, command: &Bottle) -> Result<Bottle, CommandError> {
        let mut fields = Fields::new(command);
        if fields.word()? != "world" {
            return Err(CommandError::NotWorldCommand);
        }
        match fields.word()? {
            "del" => {
                match fields.word()? {
                    "all" => {}
                    other => return Err(CommandError::UnknownVerb(format!("del {other}"))),
                }
                fields.finish()?;
                self.clear();
                Ok(ok())
            }
            "mk" => {
                let kind = fields.kind()?;
                let numbers = fields.rest_numbers()?;
                // size values, then x y z, then r g b
                let Some(size_len) = numbers.len().checked_sub(6) else {
                    return Err(CommandError::MissingField(command.len()));
                };
                if size_len != kind.size_arity() {
                    return Err(CommandError::BadArity {
                        kind,
                        expected: kind.size_arity(),
                        got: size_len,
                    });
                }
                let (size, rest) = numbers.split_at(size_len);
                let position = DVec3::new(rest[0], rest[1], rest[2]);
                let colour = Rgb::new(rest[3], rest[4], rest[5]);
                self.create(kind, size.to_vec(), position, colour)?;
                Ok(ok())
            }
            "set" => {
                let (kind, id) = (fields.kind()?, fields.id()?);
                let position = fields.vec3()?;
                fields.finish()?;
                self.set_position(kind, id, position)?;
                Ok(ok())
            }
            "rot" => {
                let (kind, id) = (fields.kind()?, fields.id()?);
                let rotation = fields.vec3()?;
                fields.finish()?;
                self.set_rotation(kind, id, rotation)?;
                Ok(ok())
            }
            "get" => {
                let (kind, id) = (fields.kind()?, fields.id()?);
                fields.finish()?;
                let p = self.position(kind, id)?;
                let mut reply = Bottle::new();
                reply.add_double(p.x).add_double(p.y).add_double(p.z);
                Ok(reply)
            }
            other => Err(CommandError::UnknownVerb(other.to_owned())),
        }
    }

    /// Like [`SimWorld::execute`], but a rejected command yields a `[fail]` reply.
    pub fn respond(&mut self, command: &Bottle) -> Bottle {
        match self.execute(command) {
            Ok(reply) => {
                tracing::trace!(%command, %reply, "world command executed");
                reply
            }
            Err(e) => {
                tracing::debug!(%command, error = %e, "world command rejected");
                let mut reply = Bottle::new();
                reply.add_vocab(Vocab::FAIL);
                reply
            }
        }
    }
}

impl Responder for SimWorld {
    fn respond(&mut self, command: &Bottle) -> Result<Bottle, TransportError> {
        Ok(SimWorld::respond(self, command))
    }
}

fn ok() -> Bottle {
    let mut reply = Bottle::new();
    reply.add_vocab(Vocab::OK);
    reply
}

/// Cursor over the fields of a command bottle.
struct Fields<'a> {
    bottle: &'a Bottle,
    index: usize,
}

impl<'a> Fields<'a> {
    fn new(bottle: &'a Bottle) -> Self {
        Self { bottle, index: 0 }
    }

    fn next(&mut self) -> Result<(usize, &'a Value), CommandError> {
        let index = self.index;
        let value = self
            .bottle
            .get(index)
            .ok_or(CommandError::MissingField(index))?;
        self.index += 1;
        Ok((index, value))
    }

    fn word(&mut self) -> Result<&'a str, CommandError> {
        let (index, value) = self.next()?;
        value.as_str().ok_or_else(|| wrong_type(index, "a word", value))
    }

    fn kind(&mut self) -> Result<ObjectKind, CommandError> {
        let token = self.word()?;
        token
            .parse()
            .map_err(|_| CommandError::UnknownKind(token.to_owned()))
    }

    fn id(&mut self) -> Result<SimulatorId, CommandError> {
        let (index, value) = self.next()?;
        value
            .as_int()
            .and_then(|i| u32::try_from(i).ok())
            .map(SimulatorId)
            .ok_or_else(|| wrong_type(index, "an object id", value))
    }

    fn number(&mut self) -> Result<f64, CommandError> {
        let (index, value) = self.next()?;
        value.as_f64().ok_or_else(|| wrong_type(index, "a number", value))
    }

    fn vec3(&mut self) -> Result<DVec3, CommandError> {
        Ok(DVec3::new(self.number()?, self.number()?, self.number()?))
    }

    fn rest_numbers(&mut self) -> Result<Vec<f64>, CommandError> {
        let mut numbers = Vec::new();
        while self.index < self.bottle.len() {
            numbers.push(self.number()?);
        }
        Ok(numbers)
    }

    fn finish(&self) -> Result<(), CommandError> {
        if self.index < self.bottle.len() {
            Err(CommandError::TrailingFields(self.index))
        } else {
            Ok(())
        }
    }
}

fn wrong_type(index: usize, expected: &'static str, found: &Value) -> CommandError {
    CommandError::WrongType {
        index,
        expected,
        found: found.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(text: &str) -> Bottle {
        text.parse().unwrap()
    }

    fn is_ok(reply: &Bottle) -> bool {
        reply.len() == 1 && reply.get(0) == Some(&Value::Vocab(Vocab::OK))
    }

    fn is_fail(reply: &Bottle) -> bool {
        reply.len() == 1 && reply.get(0) == Some(&Value::Vocab(Vocab::FAIL))
    }

    #[test]
    fn world_starts_empty() {
        let w = SimWorld::new();
        assert_eq!(w.object_count(), 0);
        assert_eq!(w.counter(ObjectKind::Box), 0);
        assert_eq!(w.policy(), CounterPolicy::ResetOnClear);
    }

    #[test]
    fn ids_are_per_kind() {
        let mut w = SimWorld::new();
        assert!(is_ok(&w.respond(&cmd("world mk box 0.1 0.1 0.1 0 0 1 1 0 0"))));
        assert!(is_ok(&w.respond(&cmd("world mk sph 0.1 0 0 1 0 1 0"))));
        assert!(is_ok(&w.respond(&cmd("world mk box 0.2 0.2 0.2 1 0 1 0 0 1"))));
        assert_eq!(w.counter(ObjectKind::Box), 2);
        assert_eq!(w.counter(ObjectKind::Sphere), 1);
        let second_box = w.get(ObjectKind::Box, SimulatorId(2)).unwrap();
        assert_eq!(second_box.size, vec![0.2, 0.2, 0.2]);
        assert_eq!(second_box.position, DVec3::new(1.0, 0.0, 1.0));
        assert_eq!(second_box.colour, Rgb::BLUE);
    }

    #[test]
    fn wrong_size_arity_is_rejected() {
        let mut w = SimWorld::new();
        assert!(is_fail(&w.respond(&cmd("world mk cyl 0.1 0 0 1 1 0 0"))));
        assert_eq!(
            w.execute(&cmd("world mk cyl 0.1 0 0 1 1 0 0")),
            Err(CommandError::BadArity {
                kind: ObjectKind::Cylinder,
                expected: 2,
                got: 1
            })
        );
        assert_eq!(w.object_count(), 0);
        assert!(w.events().is_empty());
    }

    #[test]
    fn move_rotate_and_get() {
        let mut w = SimWorld::new();
        w.respond(&cmd("world mk ssph 0.05 0 0 0.5 0 1 0"));
        assert!(is_ok(&w.respond(&cmd("world set ssph 1 1 2 3"))));
        assert!(is_ok(&w.respond(&cmd("world rot ssph 1 90 0 45"))));

        let reply = w.respond(&cmd("world get ssph 1"));
        assert_eq!(
            reply.values(),
            &[Value::Double(1.0), Value::Double(2.0), Value::Double(3.0)]
        );
        let object = w.get(ObjectKind::StaticSphere, SimulatorId(1)).unwrap();
        assert_eq!(object.rotation, DVec3::new(90.0, 0.0, 45.0));
        // create + move + rotate
        assert_eq!(w.events().len(), 3);
    }

    #[test]
    fn unknown_object_is_rejected() {
        let mut w = SimWorld::new();
        assert!(is_fail(&w.respond(&cmd("world get box 1"))));
        assert_eq!(
            w.execute(&cmd("world set box 3 0 0 0")),
            Err(CommandError::NoSuchObject {
                kind: ObjectKind::Box,
                id: SimulatorId(3)
            })
        );
    }

    #[test]
    fn malformed_commands_are_rejected() {
        let mut w = SimWorld::new();
        for text in [
            "",
            "hello",
            "world",
            "world fly box 1",
            "world mk cube 1 0 0 0 1 1 1",
            "world get box",
            "world get box 1 2",
            "world get box one",
            "world set box 1 0 0",
            "world del some",
            "world del all now",
            "[ok]",
        ] {
            assert!(is_fail(&w.respond(&cmd(text))), "{text:?} should fail");
        }
        assert!(w.events().is_empty());
    }

    #[test]
    fn clear_resets_counters_by_default() {
        let mut w = SimWorld::new();
        w.respond(&cmd("world mk box 1 1 1 0 0 1 1 0 0"));
        w.respond(&cmd("world mk box 1 1 1 0 0 2 1 0 0"));
        assert!(is_ok(&w.respond(&cmd("world del all"))));
        assert_eq!(w.object_count(), 0);
        assert_eq!(w.counter(ObjectKind::Box), 0);

        w.respond(&cmd("world mk box 1 1 1 0 0 1 1 0 0"));
        assert!(w.get(ObjectKind::Box, SimulatorId(1)).is_some());
        assert_eq!(w.events()[2], SimEvent::Cleared { count: 2 });
    }

    #[test]
    fn monotonic_counters_survive_clear() {
        let mut w = SimWorld::with_policy(CounterPolicy::Monotonic);
        w.respond(&cmd("world mk sph 0.1 0 0 1 1 0 0"));
        w.respond(&cmd("world del all"));
        w.respond(&cmd("world mk sph 0.1 0 0 1 1 0 0"));
        assert!(w.get(ObjectKind::Sphere, SimulatorId(1)).is_none());
        assert!(w.get(ObjectKind::Sphere, SimulatorId(2)).is_some());
    }

    #[test]
    fn event_log_can_be_disabled() {
        let mut w = SimWorld::new().without_event_log();
        w.respond(&cmd("world mk box 0.1 0.1 0.1 0 0 1 1 0 0"));
        w.respond(&cmd("world set box 1 0 0 2"));
        w.respond(&cmd("world del all"));
        w.respond(&cmd("world mk sph 0.1 0 0 1 0 1 0"));
        assert!(w.events().is_empty());
        assert!(w.drain_events().is_empty());
        assert_eq!(w.object_count(), 1);
        assert_eq!(w.counter(ObjectKind::Sphere), 1);
    }

    #[test]
    fn drain_events_clears_log() {
        let mut w = SimWorld::new();
        w.create(ObjectKind::Box, vec![1.0, 1.0, 1.0], DVec3::ZERO, Rgb::RED)
            .unwrap();
        let events = w.drain_events();
        assert_eq!(events.len(), 1);
        assert!(w.events().is_empty());
    }

    #[test]
    fn integer_coordinates_are_accepted() {
        let mut w = SimWorld::new();
        let mut command = Bottle::new();
        command
            .add_string("world")
            .add_string("mk")
            .add_string("sph")
            .add_int(1)
            .add_int(0)
            .add_int(0)
            .add_int(2)
            .add_double(0.0)
            .add_double(0.0)
            .add_double(1.0);
        assert!(is_ok(&w.respond(&command)));
        assert_eq!(
            w.position(ObjectKind::Sphere, SimulatorId(1)),
            Ok(DVec3::new(0.0, 0.0, 2.0))
        );
    }
}
