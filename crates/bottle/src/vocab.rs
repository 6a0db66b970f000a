use serde::{Deserialize, Serialize};
use std::fmt;

/// Vocabulary code: up to four ASCII characters packed little-endian into an `i32`.
///
/// `[ok]` is `'o' | 'k' << 8` = 27503. Codes whose tag would not parse back
/// (zero, control or non-ASCII bytes) print as their plain integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vocab(pub i32);

impl Vocab {
    /// Acknowledgment sentinel.
    pub const OK: Vocab = Vocab::from_tag("ok");
    /// Generic failure reply.
    pub const FAIL: Vocab = Vocab::from_tag("fail");

    /// Pack a tag of at most four bytes. Extra bytes are ignored.
    pub const fn from_tag(tag: &str) -> Self {
        let bytes = tag.as_bytes();
        let mut code: i32 = 0;
        let mut i = 0;
        while i < bytes.len() && i < 4 {
            code |= (bytes[i] as i32) << (8 * i);
            i += 1;
        }
        Vocab(code)
    }

    /// Parse a tag, rejecting empty, overlong or non-ASCII-graphic tags.
    pub fn parse_tag(tag: &str) -> Option<Self> {
        let valid = !tag.is_empty()
            && tag.len() <= 4
            && tag.bytes().all(|b| b.is_ascii_graphic() && b != b']');
        valid.then(|| Vocab::from_tag(tag))
    }

    /// The packed characters, stopping at the first zero byte.
    pub fn tag(self) -> String {
        self.0
            .to_le_bytes()
            .into_iter()
            .take_while(|b| *b != 0)
            .map(char::from)
            .collect()
    }
}

impl fmt::Display for Vocab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag();
        if Vocab::parse_tag(&tag) == Some(*self) {
            write!(f, "[{tag}]")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
