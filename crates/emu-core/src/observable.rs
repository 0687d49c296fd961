//! State inspection for debuggers and tests.
//!
//! Queries read state; they never advance the clock or fire hooks.

use std::fmt;

/// A dynamically-typed value returned by a state query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Flag or run-state bit.
    Bool(bool),
    /// 8-bit register, port latch or memory byte.
    U8(u8),
    /// 16-bit register pair or address.
    U16(u16),
    /// Cycle counter.
    U32(u32),
    /// Wide counter (frames, timestamps).
    U64(u64),
    /// Symbolic state such as a bank name.
    Str(String),
}

impl Value {
    /// The value widened to `u64`, if it is numeric or boolean.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Bool(v) => Some(u64::from(v)),
            Value::U8(v) => Some(u64::from(v)),
            Value::U16(v) => Some(u64::from(v)),
            Value::U32(v) => Some(u64::from(v)),
            Value::U64(v) => Some(v),
            Value::Str(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:02x}"),
            Value::U16(v) => write!(f, "{v:04x}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
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

value_from!(bool => Bool, u8 => U8, u16 => U16, u32 => U32, u64 => U64, String => Str);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

/// A component whose state can be inspected by path.
pub trait Observable {
    /// Query a property by dotted path (`pc`, `flags.z`, `cpu.hl`).
    ///
    /// Returns `None` if the path is not recognised.
    fn query(&self, path: &str) -> Option<Value>;

    /// Paths accepted by `query()`. Placeholders are written in angle
    /// brackets (`memory.<address>`).
    fn query_paths(&self) -> &'static [&'static str];
}
