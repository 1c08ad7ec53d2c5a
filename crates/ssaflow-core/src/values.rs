use serde::{Deserialize, Serialize};

/// Identity of one instruction inside a [`crate::Program`].
///
/// Ids are dense arena indices assigned by the builder and stay stable for the lifetime of the
/// program, so analyses key their visited sets on them instead of on wrapper addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstId(pub i64);

impl InstId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for InstId {
    fn from(index: usize) -> Self {
        InstId(index as i64)
    }
}

impl std::fmt::Display for InstId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Null,
}

impl Constant {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Constant::Int(v) => Some(*v),
            Constant::Bool(b) => Some(if *b { 1 } else { 0 }),
            _ => None,
        }
    }

    /// Interprets the constant as a position, as used by indexed multi-return extraction.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Constant::Int(v) if *v >= 0 => Some(*v as usize),
            _ => None,
        }
    }

    /// Renders the constant the way it reads as an object key: strings without quotes.
    pub fn key_string(&self) -> String {
        match self {
            Constant::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl From<i64> for Constant {
    fn from(v: i64) -> Self {
        Constant::Int(v)
    }
}

impl From<i32> for Constant {
    fn from(v: i32) -> Self {
        Constant::Int(v as i64)
    }
}

impl From<f64> for Constant {
    fn from(v: f64) -> Self {
        Constant::Float(v)
    }
}

impl From<bool> for Constant {
    fn from(v: bool) -> Self {
        Constant::Bool(v)
    }
}

impl From<&str> for Constant {
    fn from(v: &str) -> Self {
        Constant::String(v.to_string())
    }
}

impl From<String> for Constant {
    fn from(v: String) -> Self {
        Constant::String(v)
    }
}

impl std::fmt::Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Float(v) => write!(f, "{}", v),
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::String(s) => write!(f, "\"{}\"", s),
            Constant::Null => write!(f, "null"),
        }
    }
}
