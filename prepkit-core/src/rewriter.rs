use crate::{Result, StatementError};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static POSITIONAL_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%s").expect("valid positional marker regex"));
static NAMED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%\([\w-]+\)s").expect("valid named marker regex"));

/// Query text translated into numbered parameter syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    pub text: String,
    pub parameter_count: usize,
    /// Original named markers (`%(name)s`) in order of appearance, `None` when the
    /// query has no named marker.
    pub named_parameters: Option<Vec<String>>,
}

/// Name of the argument referenced by a named marker: `%(record_id)s` -> `record_id`.
pub fn marker_name(marker: &str) -> &str {
    marker
        .strip_prefix("%(")
        .and_then(|v| v.strip_suffix(")s"))
        .unwrap_or(marker)
}

/// Translate `%s` and `%(name)s` markers into `$1`, `$2`, ...
///
/// The input is lower cased, a single trailing `;` is removed, the text is split on
/// whitespace and markers are searched token by token. The output tokens are joined
/// with single spaces and terminated by `;`. Numbering is sequential across the whole
/// text and each occurrence gets its own number, a repeated named marker included.
///
/// This is a token substitution, not a SQL parser. Markers inside string literals are
/// replaced as well, whitespace inside literals is collapsed and literals are lower
/// cased together with the rest of the query. Positional and named markers cannot be
/// mixed in the same text.
pub fn rewrite(input: &str) -> Result<RewriteResult> {
    let lowered = input.to_lowercase();
    let mut sql = lowered.trim();
    if let Some(stripped) = sql.strip_suffix(';') {
        sql = stripped;
    }
    if sql.trim().is_empty() {
        return Ok(RewriteResult {
            text: input.to_string(),
            parameter_count: 0,
            named_parameters: None,
        });
    }
    let mut tokens: Vec<String> = sql.split_whitespace().map(ToString::to_string).collect();
    let mut counter = 0;
    for token in tokens.iter_mut() {
        if POSITIONAL_MARKER.is_match(token) {
            *token = POSITIONAL_MARKER
                .replace_all(token, |_: &Captures| {
                    counter += 1;
                    format!("${counter}")
                })
                .into_owned();
        }
    }
    let positional_only = counter > 0;
    let mut named = Vec::new();
    for token in tokens.iter_mut() {
        if !NAMED_MARKER.is_match(token) {
            continue;
        }
        if positional_only {
            return Err(StatementError::MixedPlaceholderStyle.into());
        }
        *token = NAMED_MARKER
            .replace_all(token, |captures: &Captures| {
                named.push(captures[0].to_string());
                counter += 1;
                format!("${counter}")
            })
            .into_owned();
    }
    let mut text = tokens.join(" ");
    text.push(';');
    Ok(RewriteResult {
        text,
        parameter_count: counter,
        named_parameters: if named.is_empty() { None } else { Some(named) },
    })
}
