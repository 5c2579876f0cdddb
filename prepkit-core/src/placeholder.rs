use crate::{AsValue, Result, StatementError, Value};
use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt::{self, Display},
};

/// Character reserved by the positional marker (`%s`) and by partial-match
/// wildcards, placeholder names cannot contain it.
pub const RESERVED_MARKER_CHAR: char = '%';

const MARKER_PREFIX: &str = "prepkit.placeholder.";

/// A named hole in a query, bound to a concrete value only when the prepared
/// statement is executed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placeholder {
    name: Cow<'static, str>,
}

impl Placeholder {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Result<Self> {
        let name = name.into();
        if name.contains(RESERVED_MARKER_CHAR) {
            return Err(StatementError::InvalidPlaceholderName(name.into_owned()).into());
        }
        Ok(Self { name })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Text standing for this placeholder inside a partial-match template.
    pub fn marker(&self) -> String {
        format!("{MARKER_PREFIX}{}", self.name)
    }
}

impl Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MARKER_PREFIX)?;
        f.write_str(&self.name)
    }
}

/// Placeholder bound to a sequence of values, used by set membership filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListPlaceholder(Placeholder);

impl ListPlaceholder {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Result<Self> {
        Placeholder::new(name).map(Self)
    }
    pub fn name(&self) -> &str {
        self.0.name()
    }
    pub fn placeholder(&self) -> &Placeholder {
        &self.0
    }
}

/// Partial-match pattern, `%` being the wildcard, whose segments may be placeholder
/// markers.
///
/// `PartialMatch::contains(&name)` produces `%prepkit.placeholder.name%`. At execution
/// time the template is split on the wildcard, every segment that is a marker is
/// replaced by the text of the corresponding argument and the pieces are joined back
/// with the wildcard. Argument text is inserted as is: a `%` or `_` it contains keeps
/// its pattern meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialMatch(String);

impl PartialMatch {
    pub fn contains(placeholder: &Placeholder) -> Self {
        Self(format!(
            "{RESERVED_MARKER_CHAR}{}{RESERVED_MARKER_CHAR}",
            placeholder.marker()
        ))
    }
    pub fn template(&self) -> &str {
        &self.0
    }
    pub fn placeholder_names(&self) -> impl Iterator<Item = &str> {
        self.0
            .split(RESERVED_MARKER_CHAR)
            .filter_map(|v| v.strip_prefix(MARKER_PREFIX))
    }
    /// Substitute the placeholders taking their values out of `named`.
    pub fn resolve(&self, named: &mut BTreeMap<String, Value>) -> Result<Value> {
        let mut result = String::with_capacity(self.0.len());
        for (i, segment) in self.0.split(RESERVED_MARKER_CHAR).enumerate() {
            if i > 0 {
                result.push(RESERVED_MARKER_CHAR);
            }
            let Some(name) = segment.strip_prefix(MARKER_PREFIX) else {
                result.push_str(segment);
                continue;
            };
            let Some(value) = named.remove(name) else {
                return Err(StatementError::MissingParameter(name.to_string()).into());
            };
            match value {
                Value::Varchar(Some(v)) | Value::Unknown(Some(v)) => result.push_str(&v),
                v => {
                    let Some(v) = v.as_i64() else {
                        return Err(StatementError::InvalidInput(format!(
                            "Parameter {name} is used in a partial match and must be text, got {v:?}"
                        ))
                        .into());
                    };
                    result.push_str(itoa::Buffer::new().format(v));
                }
            }
        }
        Ok(Value::Varchar(Some(result)))
    }
}

/// A parameter of a query produced by the builder: either a constant known when the
/// query is built or a value deferred to execution time.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Constant(Value),
    Placeholder(Placeholder),
    List(ListPlaceholder),
    PartialMatch(PartialMatch),
}

impl Param {
    pub fn is_deferred(&self) -> bool {
        !matches!(self, Param::Constant(..))
    }
    /// Placeholder names referenced by this parameter.
    pub fn placeholder_names(&self) -> Vec<&str> {
        match self {
            Param::Constant(..) => vec![],
            Param::Placeholder(v) => vec![v.name()],
            Param::List(v) => vec![v.name()],
            Param::PartialMatch(v) => v.placeholder_names().collect(),
        }
    }
}

/// Anything that can be used as a value in a builder condition.
pub trait AsParam {
    fn as_param(self) -> Param;
}

impl<V: AsValue> AsParam for V {
    fn as_param(self) -> Param {
        Param::Constant(self.as_value())
    }
}

impl AsParam for &str {
    fn as_param(self) -> Param {
        Param::Constant(self.into())
    }
}

impl AsParam for Value {
    fn as_param(self) -> Param {
        Param::Constant(self)
    }
}

impl AsParam for Placeholder {
    fn as_param(self) -> Param {
        Param::Placeholder(self)
    }
}

impl AsParam for ListPlaceholder {
    fn as_param(self) -> Param {
        Param::List(self)
    }
}

impl AsParam for Param {
    fn as_param(self) -> Param {
        self
    }
}
