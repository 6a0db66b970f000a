use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;
use std::str::FromStr;

use crate::value::{Bottle, Value};
use crate::vocab::Vocab;

/// Errors from parsing the text form of a bottle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("unterminated list starting at offset {0}")]
    UnterminatedList(usize),
    #[error("unexpected ')' at offset {0}")]
    UnexpectedClose(usize),
    #[error("unterminated vocab starting at offset {0}")]
    UnterminatedVocab(usize),
    #[error("invalid vocab tag {0:?}")]
    InvalidVocab(String),
    #[error("unexpected {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    #[error("invalid escape '\\{escape}' at offset {offset}")]
    InvalidEscape { escape: char, offset: usize },
}

impl FromStr for Bottle {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser {
            chars: s.char_indices().peekable(),
        };
        parser.values(None)
    }
}

pub(crate) fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    if !needs_quotes(s) {
        return f.write_str(s);
    }
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

/// A bare word must read back as the same string, not as a number or a delimiter.
fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.parse::<f64>().is_ok()
        || s.parse::<i64>().is_ok()
        || s.chars().any(|c| c.is_whitespace() || is_delimiter(c))
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | '"' | '\\')
}

struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl Parser<'_> {
    /// Parse values until end of input, or until the `)` closing a list opened at `open`.
    fn values(&mut self, open: Option<usize>) -> Result<Bottle, ParseError> {
        let mut bottle = Bottle::new();
        loop {
            self.skip_whitespace();
            let Some(&(offset, c)) = self.chars.peek() else {
                return match open {
                    Some(start) => Err(ParseError::UnterminatedList(start)),
                    None => Ok(bottle),
                };
            };
            match c {
                '(' => {
                    self.chars.next();
                    let list = self.values(Some(offset))?;
                    bottle.add_list(list);
                }
                ')' => {
                    self.chars.next();
                    return match open {
                        Some(_) => Ok(bottle),
                        None => Err(ParseError::UnexpectedClose(offset)),
                    };
                }
                '"' => {
                    self.chars.next();
                    let s = self.quoted(offset)?;
                    bottle.add_string(s);
                }
                '[' => {
                    self.chars.next();
                    let v = self.vocab(offset)?;
                    bottle.add_vocab(v);
                }
                ']' | '\\' => return Err(ParseError::UnexpectedChar { found: c, offset }),
                _ => {
                    let word = self.word();
                    bottle.push(classify(word));
                }
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn quoted(&mut self, start: usize) -> Result<String, ParseError> {
        let mut out = String::new();
        while let Some((offset, c)) = self.chars.next() {
            match c {
                '"' => return Ok(out),
                '\\' => match self.chars.next() {
                    Some((_, '"')) => out.push('"'),
                    Some((_, '\\')) => out.push('\\'),
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, escape)) => return Err(ParseError::InvalidEscape { escape, offset }),
                    None => break,
                },
                c => out.push(c),
            }
        }
        Err(ParseError::UnterminatedString(start))
    }

    fn vocab(&mut self, start: usize) -> Result<Vocab, ParseError> {
        let mut tag = String::new();
        for (_, c) in self.chars.by_ref() {
            if c == ']' {
                return Vocab::parse_tag(&tag).ok_or(ParseError::InvalidVocab(tag));
            }
            tag.push(c);
        }
        Err(ParseError::UnterminatedVocab(start))
    }

    fn word(&mut self) -> String {
        let mut word = String::new();
        while let Some((_, c)) = self
            .chars
            .next_if(|(_, c)| !c.is_whitespace() && !is_delimiter(*c))
        {
            word.push(c);
        }
        word
    }
}

fn classify(word: String) -> Value {
    if let Ok(i) = word.parse::<i64>() {
        Value::Int(i)
    } else if let Ok(d) = word.parse::<f64>() {
        Value::Double(d)
    } else {
        Value::String(word)
    }
}
