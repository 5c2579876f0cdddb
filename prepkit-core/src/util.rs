use std::borrow::Cow;

pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Name of the statement as seen by the database.
///
/// Statement names are usually module qualified (`crate::module::function` or
/// `package.module.function`) but dots and path separators are not valid in a
/// prepared statement identifier, both become `__`. The database folds unquoted
/// identifiers to lower case, so does this.
pub fn backend_statement_name(name: &str) -> Cow<'_, str> {
    if name.contains(['.', ':']) || name.chars().any(char::is_uppercase) {
        name.replace("::", "__").replace('.', "__").to_lowercase().into()
    } else {
        name.into()
    }
}

/// Longest prefix of `value` that fits in `max` bytes and ends on a char boundary.
pub fn truncate_on_char_boundary(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}\n",
            $crate::truncate_on_char_boundary(&$query, 497).trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

/// Fully qualified name of a generator function, the key it is registered under.
#[macro_export]
macro_rules! statement_name {
    ($func:ident) => {
        concat!(module_path!(), "::", stringify!($func))
    };
}
