// SPDX-License-Identifier: MIT

//! Field path parser and resolver
//!
//! Parses locators like:
//! - `status.phase`
//! - `items[0].state`, `items[-1]`
//! - `metadata.labels["app.kubernetes.io/name"]`
//! - `$.spec.replicas`

use serde_json::Value;
use thiserror::Error;

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object key. All-digit keys also address array elements.
    Key(String),
    /// Bracketed array index; negative values count from the end
    Index(i64),
}

/// A parsed field locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

/// Errors produced while parsing a field path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("field path is empty")]
    Empty,

    #[error("empty segment at offset {0}")]
    EmptySegment(usize),

    #[error("unterminated bracket starting at offset {0}")]
    UnterminatedBracket(usize),

    #[error("unterminated quoted key starting at offset {0}")]
    UnterminatedQuote(usize),

    #[error("invalid index '{index}' at offset {offset}")]
    InvalidIndex { index: String, offset: usize },

    #[error("unexpected character '{ch}' at offset {offset}")]
    Unexpected { ch: char, offset: usize },

    #[error("dangling escape at end of path")]
    DanglingEscape,
}

impl FieldPath {
    /// The path as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Walk `root` along this path. Returns `None` when any step is missing.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| step(node, segment))
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

fn step<'a>(node: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match (segment, node) {
        (Segment::Key(key), Value::Object(map)) => map.get(key),
        (Segment::Key(key), Value::Array(items)) => {
            if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            key.parse::<usize>().ok().and_then(|i| items.get(i))
        }
        (Segment::Index(index), Value::Array(items)) => {
            let idx = if *index < 0 {
                items.len().checked_sub(index.unsigned_abs() as usize)?
            } else {
                *index as usize
            };
            items.get(idx)
        }
        _ => None,
    }
}

/// Parse a field path
pub fn parse(input: &str) -> Result<FieldPath, PathError> {
    if input.is_empty() {
        return Err(PathError::Empty);
    }

    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let end = input.len();
    let offset = |pos: usize| chars.get(pos).map(|(o, _)| *o).unwrap_or(end);

    let mut segments = Vec::new();
    let mut pos = 0;

    // Optional root marker
    if chars[0].1 == '$' {
        match chars.get(1) {
            None => {
                return Ok(FieldPath {
                    raw: input.to_string(),
                    segments,
                })
            }
            Some((_, '.')) => {
                pos = 2;
                if pos == chars.len() {
                    return Err(PathError::EmptySegment(end));
                }
            }
            Some((_, '[')) => pos = 1,
            Some((o, ch)) => {
                return Err(PathError::Unexpected {
                    ch: *ch,
                    offset: *o,
                })
            }
        }
    }

    loop {
        // Start of a segment
        match chars.get(pos) {
            None => return Err(PathError::EmptySegment(end)),
            Some((o, '.')) => return Err(PathError::EmptySegment(*o)),
            Some((_, '[')) => {
                let (segment, next) = parse_bracket(&chars, pos)?;
                segments.push(segment);
                pos = next;
            }
            Some(_) => {
                let (key, next) = parse_key(&chars, pos)?;
                segments.push(Segment::Key(key));
                pos = next;
            }
        }

        // After a segment: end of input, a separator, or another bracket
        match chars.get(pos) {
            None => break,
            Some((_, '.')) => {
                pos += 1;
                if pos == chars.len() {
                    return Err(PathError::EmptySegment(end));
                }
            }
            Some((_, '[')) => {}
            Some(_) => {
                let ch = chars[pos].1;
                return Err(PathError::Unexpected {
                    ch,
                    offset: offset(pos),
                });
            }
        }
    }

    Ok(FieldPath {
        raw: input.to_string(),
        segments,
    })
}

/// Read a dotted key starting at `pos`. Stops at an unescaped `.` or `[`.
fn parse_key(chars: &[(usize, char)], mut pos: usize) -> Result<(String, usize), PathError> {
    let mut key = String::new();
    while let Some((_, c)) = chars.get(pos) {
        match c {
            '.' | '[' => break,
            '\\' => {
                pos += 1;
                let (_, escaped) = chars.get(pos).ok_or(PathError::DanglingEscape)?;
                key.push(*escaped);
            }
            other => key.push(*other),
        }
        pos += 1;
    }
    Ok((key, pos))
}

/// Read a bracketed segment; `chars[pos]` is the opening `[`.
fn parse_bracket(chars: &[(usize, char)], pos: usize) -> Result<(Segment, usize), PathError> {
    let open = chars[pos].0;
    let mut i = pos + 1;

    match chars.get(i) {
        Some((_, quote @ ('"' | '\''))) => {
            let quote = *quote;
            let mut key = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err(PathError::UnterminatedQuote(open)),
                    Some((_, '\\')) => {
                        i += 1;
                        let (_, escaped) =
                            chars.get(i).ok_or(PathError::UnterminatedQuote(open))?;
                        key.push(*escaped);
                    }
                    Some((_, c)) if *c == quote => {
                        i += 1;
                        break;
                    }
                    Some((_, c)) => key.push(*c),
                }
                i += 1;
            }
            match chars.get(i) {
                Some((_, ']')) => Ok((Segment::Key(key), i + 1)),
                Some((o, ch)) => Err(PathError::Unexpected {
                    ch: *ch,
                    offset: *o,
                }),
                None => Err(PathError::UnterminatedBracket(open)),
            }
        }
        _ => {
            let mut text = String::new();
            loop {
                match chars.get(i) {
                    None => return Err(PathError::UnterminatedBracket(open)),
                    Some((_, ']')) => break,
                    Some((_, c)) => text.push(*c),
                }
                i += 1;
            }
            let index = text.trim().parse::<i64>().map_err(|_| PathError::InvalidIndex {
                index: text.clone(),
                offset: open,
            })?;
            Ok((Segment::Index(index), i + 1))
        }
    }
}
