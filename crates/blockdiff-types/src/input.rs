use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Kind of an input slot on a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Holds a reporter block through its output connection.
    Value,
    /// Holds a statement chain through the child's previous connection.
    Statement,
    /// A label-only row with no connection.
    Dummy,
}

impl InputKind {
    /// Element name used in the interchange format. Dummy inputs are never
    /// serialized.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Self::Value => Some("value"),
            Self::Statement => Some("statement"),
            Self::Dummy => None,
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(self, Self::Statement)
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => f.write_str("value"),
            Self::Statement => f.write_str("statement"),
            Self::Dummy => f.write_str("dummy"),
        }
    }
}

impl FromStr for InputKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "value" => Ok(Self::Value),
            "statement" => Ok(Self::Statement),
            "dummy" => Ok(Self::Dummy),
            other => Err(TypeError::UnknownInputKind(other.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags() {
        assert_eq!(InputKind::Value.tag(), Some("value"));
        assert_eq!(InputKind::Statement.tag(), Some("statement"));
        assert_eq!(InputKind::Dummy.tag(), None);
    }

    #[test]
    fn parse() {
        assert_eq!("statement".parse::<InputKind>(), Ok(InputKind::Statement));
        assert!("next".parse::<InputKind>().is_err());
    }
}
