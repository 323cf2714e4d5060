//! JSON Pointer paths (RFC 6901).
//!
//! A [`Pointer`] is a sequence of reference tokens addressing one node of a
//! document tree. Tokens are stored unescaped; `~0`/`~1` escaping only
//! happens at the string boundary ([`Pointer::parse`] and `Display`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::PatchError;

/// Token that addresses the position after the last array element in `add`.
pub const APPEND_TOKEN: &str = "-";

/// A parsed JSON Pointer.
///
/// The empty pointer addresses the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pointer {
    tokens: Vec<String>,
}

impl Pointer {
    /// The pointer to the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a pointer from already unescaped tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse the RFC 6901 string form.
    ///
    /// `""` is the root. Any other pointer must start with `/`, and `~` must
    /// be followed by `0` or `1`.
    pub fn parse(pointer: &str) -> Result<Self, PatchError> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = pointer.strip_prefix('/') else {
            return Err(PatchError::InvalidPointer {
                pointer: pointer.to_string(),
                reason: "must be empty or start with '/'".to_string(),
            });
        };
        let tokens = rest
            .split('/')
            .map(|raw| {
                unescape(raw).ok_or_else(|| PatchError::InvalidPointer {
                    pointer: pointer.to_string(),
                    reason: format!("invalid escape sequence in token {raw:?}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Pointer to a child of this node.
    pub fn child(&self, token: impl Into<String>) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token.into());
        Self { tokens }
    }

    /// Pointer to an array element of this node.
    pub fn index(&self, index: usize) -> Self {
        self.child(index.to_string())
    }

    /// Split into the parent pointer and the last token.
    ///
    /// Returns `None` for the root.
    pub fn split_last(&self) -> Option<(Pointer, &str)> {
        let (last, parent) = self.tokens.split_last()?;
        Some((
            Pointer {
                tokens: parent.to_vec(),
            },
            last.as_str(),
        ))
    }

    /// Whether `self` lies strictly below `ancestor` in the tree.
    pub fn is_descendant_of(&self, ancestor: &Pointer) -> bool {
        ancestor.tokens.len() < self.tokens.len()
            && self.tokens[..ancestor.tokens.len()] == ancestor.tokens[..]
    }
}

/// Parse an array index token.
///
/// Only canonical decimal forms are accepted: `0`, or a non-zero digit
/// followed by digits. `01`, `+1` and `-` are rejected.
pub fn parse_index(token: &str) -> Option<usize> {
    let bytes = token.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    token.parse().ok()
}

fn unescape(raw: &str) -> Option<String> {
    if !raw.contains('~') {
        return Some(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

fn escape(token: &str) -> String {
    if !token.contains(['~', '/']) {
        return token.to_string();
    }
    token.replace('~', "~0").replace('/', "~1")
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}

impl FromStr for Pointer {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Pointer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pointer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Pointer::parse(&raw).map_err(serde::de::Error::custom)
    }
}
