use serde::{Deserialize, Serialize};
use std::fmt;

use crate::vocab::Vocab;

/// A single typed field of a bottle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Int(i64),
    Double(f64),
    String(String),
    Vocab(Vocab),
    List(Bottle),
}

impl Value {
    /// The text of a string field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// An integer field. Doubles are not truncated.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the field. Integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// A vocabulary field such as `[ok]`.
    pub fn as_vocab(&self) -> Option<Vocab> {
        match self {
            Value::Vocab(v) => Some(*v),
            _ => None,
        }
    }

    /// A nested list field.
    pub fn as_list(&self) -> Option<&Bottle> {
        match self {
            Value::List(b) => Some(b),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<Vocab> for Value {
    fn from(v: Vocab) -> Self {
        Value::Vocab(v)
    }
}

impl From<Bottle> for Value {
    fn from(b: Bottle) -> Self {
        Value::List(b)
    }
}

/// Ordered sequence of [`Value`]s.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bottle {
    values: Vec<Value>,
}

impl Bottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn push(&mut self, value: impl Into<Value>) -> &mut Self {
        self.values.push(value.into());
        self
    }

    pub fn add_string(&mut self, s: impl Into<String>) -> &mut Self {
        self.push(Value::String(s.into()))
    }

    pub fn add_int(&mut self, i: i64) -> &mut Self {
        self.push(Value::Int(i))
    }

    pub fn add_double(&mut self, d: f64) -> &mut Self {
        self.push(Value::Double(d))
    }

    pub fn add_vocab(&mut self, v: Vocab) -> &mut Self {
        self.push(Value::Vocab(v))
    }

    pub fn add_list(&mut self, list: Bottle) -> &mut Self {
        self.push(Value::List(list))
    }
}

impl From<Vec<Value>> for Bottle {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<Value> for Bottle {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Extend<Value> for Bottle {
    fn extend<I: IntoIterator<Item = Value>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

impl IntoIterator for Bottle {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Bottle {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            // Debug keeps a fractional part ("1.0") so the value reads back as a double.
            Value::Double(d) => write!(f, "{d:?}"),
            Value::String(s) => crate::text::write_string(f, s),
            Value::Vocab(v) => write!(f, "{v}"),
            Value::List(b) => write!(f, "({b})"),
        }
    }
}

impl fmt::Display for Bottle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_appends_in_order() {
        let mut b = Bottle::new();
        b.add_string("world").add_int(3).add_double(0.5);
        assert_eq!(b.len(), 3);
        assert_eq!(b.get(0).and_then(Value::as_str), Some("world"));
        assert_eq!(b.get(1).and_then(Value::as_int), Some(3));
        assert_eq!(b.get(2).and_then(Value::as_f64), Some(0.5));
        assert!(b.get(3).is_none());
    }

    #[test]
    fn int_widens_to_f64() {
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
        assert_eq!(Value::from("2").as_f64(), None);
        assert_eq!(Value::Vocab(Vocab::OK).as_f64(), None);
    }

    #[test]
    fn display_uses_text_form() {
        let mut inner = Bottle::new();
        inner.add_int(1).add_double(2.0);
        let mut b = Bottle::new();
        b.add_string("get")
            .add_vocab(Vocab::OK)
            .add_list(inner)
            .add_string("two words");
        assert_eq!(b.to_string(), r#"get [ok] (1 2.0) "two words""#);
    }

    #[test]
    fn serde_json_shape() {
        let b: Bottle = vec![Value::from("ok"), Value::Int(1)].into();
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, r#"[{"string":"ok"},{"int":1}]"#);
        let back: Bottle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }
}
