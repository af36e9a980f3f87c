//! Positional template formatting.
//!
//! Templates use `{N}` placeholders that refer to the N-th argument. Any
//! braced span that is not a valid in-range index fails the whole call with
//! a [`FormatError`]; the logger recovers from that by emitting the raw
//! template instead.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Matches a single `{...}` placeholder without nested braces.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([^{}]*)\}")
        .expect("placeholder regex is a compile-time constant and must be valid")
});

/// A positional template argument.
#[derive(Clone, Copy)]
pub enum Arg<'a> {
    Value(&'a dyn fmt::Display),
    /// Explicitly missing value; its placeholder is kept verbatim.
    Absent,
}

impl<'a> Arg<'a> {
    /// Build an argument from an optional value.
    pub fn opt<T: fmt::Display>(value: Option<&'a T>) -> Self {
        match value {
            Some(v) => Arg::Value(v),
            None => Arg::Absent,
        }
    }
}

impl<'a, T: fmt::Display> From<&'a T> for Arg<'a> {
    fn from(value: &'a T) -> Self {
        Arg::Value(value)
    }
}

impl fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(v) => f.debug_tuple("Value").field(&v.to_string()).finish(),
            Arg::Absent => f.write_str("Absent"),
        }
    }
}

/// A placeholder that does not name a usable argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Invalid argument index: {token}")]
    NotAnIndex { token: String },

    #[error("Invalid argument index: {token} (negative)")]
    Negative { token: String },

    #[error("Invalid argument index: {token} (only {len} arguments)")]
    OutOfRange { token: String, len: usize },
}

impl FormatError {
    /// Text between the braces of the offending placeholder.
    pub fn token(&self) -> &str {
        match self {
            FormatError::NotAnIndex { token }
            | FormatError::Negative { token }
            | FormatError::OutOfRange { token, .. } => token,
        }
    }
}

fn resolve_index(token: &str, len: usize) -> Result<usize, FormatError> {
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    if let Some(rest) = token.strip_prefix('-')
        && is_digits(rest)
    {
        return Err(FormatError::Negative {
            token: token.to_string(),
        });
    }
    if !is_digits(token) {
        return Err(FormatError::NotAnIndex {
            token: token.to_string(),
        });
    }
    match token.parse::<usize>() {
        Ok(index) if index < len => Ok(index),
        _ => Err(FormatError::OutOfRange {
            token: token.to_string(),
            len,
        }),
    }
}

/// Fill `template` with `args`.
pub fn format(template: &str, args: &[Arg<'_>]) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let index = resolve_index(inner.as_str(), args.len())?;

        out.push_str(&template[last..whole.start()]);
        match args[index] {
            Arg::Value(value) => {
                use fmt::Write;
                // Writing into a String cannot fail.
                let _ = write!(out, "{value}");
            }
            Arg::Absent => out.push_str(whole.as_str()),
        }
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}
