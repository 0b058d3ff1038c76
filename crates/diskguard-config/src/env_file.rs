//! `.env` file reader
//!
//! Accepts `KEY=value` (or `KEY: value`) statements with an optional `export`
//! prefix. Lines starting with `#` are comments. Values may be single quoted
//! (taken literally), double quoted (`\n`, `\r` and `\<char>` escapes, may span
//! lines) or unquoted. Unquoted values run to the end of the line or to a `#`
//! preceded by whitespace, and backslashes in them are kept as written.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct EnvFileError {
    pub line: usize,
    pub reason: String,
}

impl EnvFileError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Parse `.env` contents into key/value pairs in file order
pub fn parse(src: &str) -> Result<Vec<(String, String)>, EnvFileError> {
    let mut entries = Vec::new();
    let mut lines = src.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let statement = trimmed
            .strip_prefix("export")
            .filter(|rest| rest.starts_with(char::is_whitespace))
            .map(str::trim_start)
            .unwrap_or(trimmed);

        let separator = statement
            .find(|c: char| c == '=' || c == ':')
            .ok_or_else(|| EnvFileError::new(line_no, "expected KEY=value"))?;

        let key = statement[..separator].trim();
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            return Err(EnvFileError::new(line_no, format!("invalid key {:?}", key)));
        }

        let rest = statement[separator + 1..].trim_start();
        let value = match rest.chars().next() {
            Some(quote @ ('\'' | '"')) => {
                let mut body = String::new();
                let mut current = &rest[1..];
                loop {
                    if let Some(end) = closing_quote(current, quote) {
                        body.push_str(&current[..end]);
                        let trailing = current[end + 1..].trim();
                        if !trailing.is_empty() && !trailing.starts_with('#') {
                            return Err(EnvFileError::new(
                                line_no,
                                format!("unexpected {:?} after closing quote", trailing),
                            ));
                        }
                        break;
                    }
                    body.push_str(current);
                    body.push('\n');
                    current = match lines.next() {
                        Some((_, next)) => next,
                        None => {
                            return Err(EnvFileError::new(
                                line_no,
                                format!("unterminated {} quote", quote),
                            ))
                        }
                    };
                }

                if quote == '"' {
                    unescape(&body)
                } else {
                    body
                }
            }
            _ => unquoted(rest),
        };

        entries.push((key.to_string(), value));
    }

    Ok(entries)
}

fn closing_quote(s: &str, quote: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' && quote == '"' {
            escaped = true;
        } else if c == quote {
            return Some(i);
        }
    }
    None
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn unquoted(s: &str) -> String {
    let mut end = s.len();
    let mut after_space = false;
    for (i, c) in s.char_indices() {
        if c == '#' && after_space {
            end = i;
            break;
        }
        after_space = c.is_whitespace();
    }
    s[..end].trim_end().to_string()
}
