//! State inspection for debuggers, tests and the headless runner.
//!
//! Queries never change emulation state.

use std::fmt;

/// A dynamically-typed value returned by a state query.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    String(String),
    Array(Vec<Value>),
}

impl Value {
    /// Widen any unsigned integer variant.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => Some(v),
            Value::Bool(v) => Some(v.into()),
            Value::String(_) | Value::Array(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "${v:02X}"),
            Value::U16(v) => write!(f, "${v:04X}"),
            Value::U32(v) => write!(f, "${v:08X}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from!(bool => Bool, u8 => U8, u16 => U16, u32 => U32, u64 => U64, String => String);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

/// A component whose state can be inspected by path.
///
/// Paths are dot-separated, e.g. `cpu.pc`, `mmu.xe_bank`, `cart.bank`.
pub trait Observable {
    /// Query one property. Returns `None` for an unknown path.
    fn query(&self, path: &str) -> Option<Value>;

    /// Every path accepted by [`query`](Self::query).
    fn query_paths(&self) -> &'static [&'static str];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_hex_for_registers() {
        assert_eq!(Value::from(0x0Au8).to_string(), "$0A");
        assert_eq!(Value::from(0xBFFFu16).to_string(), "$BFFF");
        assert_eq!(
            Value::Array(vec![true.into(), 3u64.into()]).to_string(),
            "[true, 3]"
        );
    }

    #[test]
    fn as_u64_widens() {
        assert_eq!(Value::from(0x80u8).as_u64(), Some(0x80));
        assert_eq!(Value::from("x").as_u64(), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_string(&Value::from(7u16)).expect("serialize");
        assert_eq!(json, "7");
    }
}
