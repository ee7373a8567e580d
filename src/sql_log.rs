//! Turn a logged SQL statement into an executable one.
//!
//! Jimmer logs statements in two shapes. The pretty form annotates every
//! placeholder inline:
//!
//! ```text
//! select tb_1_.ID from USER tb_1_ where tb_1_.NAME = ? /* Alice */
//! JDBC response status: success
//! ```
//!
//! The native form lists the parameters after the statement:
//!
//! ```text
//! select ID from USER where NAME = ? and AGE > ?, variables: [Alice, 18], purpose: QUERY
//! ```
//!
//! [`format_sql_log`] substitutes the parameters back into the statement.

use regex::Regex;
use std::sync::OnceLock;

const NATIVE_VARIABLES_KEY: &str = ", variables: [";
const PRETTY_COMMAND_KEY: &str = "Affected row count: ";
const PRETTY_QUERY_KEY: &str = "JDBC response status: ";

fn statement_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(select|insert|update|delete).{10,}").expect("static pattern is valid"))
}

fn native_variables_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r", variables: \[(.*)],").expect("static pattern is valid"))
}

fn native_placeholder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\?,?").expect("static pattern is valid"))
}

fn pretty_placeholder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\?\s+/\*\s+([^?]*)\s+\*/").expect("static pattern is valid"))
}

fn number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("static pattern is valid"))
}

/// Everything before the last occurrence of `key`, or `text` when absent.
fn before_last<'t>(text: &'t str, key: &str) -> &'t str {
    text.rfind(key).map_or(text, |idx| &text[..idx])
}

fn strip_trailers(sql: &str) -> &str {
    before_last(before_last(sql, PRETTY_COMMAND_KEY), PRETTY_QUERY_KEY)
}

/// Render a logged parameter as a SQL literal.
///
/// Numbers, booleans and `null` are kept as they are; anything else is
/// quoted with embedded quotes doubled.
pub fn wrap_value(value: &str) -> String {
    let value = value.trim();
    if number_pattern().is_match(value) || matches!(value, "true" | "false" | "null") {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}

fn replace_pretty(sql: &str) -> String {
    pretty_placeholder_pattern()
        .replace_all(strip_trailers(sql), |caps: &regex::Captures| wrap_value(&caps[1]))
        .into_owned()
}

fn replace_native(sql: &str) -> Option<String> {
    let Some(caps) = native_variables_pattern().captures(sql) else {
        return Some(sql.to_string());
    };
    let statement = before_last(sql, NATIVE_VARIABLES_KEY);
    let params = &caps[1];
    if params.trim().is_empty() {
        return Some(statement.to_string());
    }

    let values: Vec<&str> = params.split(", ").collect();
    let placeholders = native_placeholder_pattern().find_iter(statement).count();
    if values.len() != placeholders {
        return None;
    }

    let mut values = values.into_iter();
    let mut out = String::with_capacity(statement.len() + params.len());
    for c in statement.chars() {
        if c != '?' {
            out.push(c);
        } else if let Some(value) = values.next() {
            out.push_str(&wrap_value(value));
        }
    }
    Some(out)
}

/// Extract the statement from a SQL log excerpt and fill in its parameters.
///
/// Returns `None` when no statement is found, when the parameter count does
/// not match the placeholders, or when the result is blank.
pub fn format_sql_log(text: &str) -> Option<String> {
    let flattened = text.replace('\n', " ");
    let sql = statement_pattern().find(&flattened)?.as_str();

    let result = if pretty_placeholder_pattern().is_match(sql) || sql.contains(PRETTY_COMMAND_KEY) {
        replace_pretty(sql)
    } else if native_placeholder_pattern().is_match(sql) || sql.contains(NATIVE_VARIABLES_KEY) {
        replace_native(sql)?
    } else {
        strip_trailers(before_last(sql, NATIVE_VARIABLES_KEY)).to_string()
    };

    if result.trim().is_empty() {
        None
    } else {
        Some(result)
    }
}
