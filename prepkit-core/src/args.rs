use crate::Value;
use std::collections::BTreeMap;

/// Arguments of a statement execution: positional values, named values or none.
///
/// A statement accepts either style depending on its markers, supplying the other one
/// is an error.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Args {
    pub positional: Vec<Value>,
    pub named: BTreeMap<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

impl From<Vec<Value>> for Args {
    fn from(positional: Vec<Value>) -> Self {
        Self {
            positional,
            ..Default::default()
        }
    }
}

impl From<BTreeMap<String, Value>> for Args {
    fn from(named: BTreeMap<String, Value>) -> Self {
        Self {
            named,
            ..Default::default()
        }
    }
}

/// Build [`Args`]: `args![]`, `args![1, "x"]` or `args![pk = 1, name = "x"]`.
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($name:ident = $value:expr),+ $(,)?) => {
        $crate::Args::new()$(.set(stringify!($name), $value))+
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::new()$(.push($value))+
    };
}
