//! Rendering helpers shared by command handlers.

use std::io::{self, Write};

use serde_json::Value;

/// Writes `value` as JSON indented by two spaces.
///
/// # Errors
///
/// Fails when the writer does.
pub fn print_dict(output: &mut dyn Write, value: &Value) -> io::Result<()> {
    let rendered = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writeln!(output, "{rendered}")
}

/// Like [`print_dict`], but a bare string is written without its quotes.
///
/// # Errors
///
/// Fails when the writer does.
pub fn print_json(output: &mut dyn Write, value: &Value) -> io::Result<()> {
    match value {
        Value::String(text) => writeln!(output, "{text}"),
        other => print_dict(output, other),
    }
}

/// Writes the elements of an array on one line, shell-quoted and separated
/// by spaces. Anything other than an array is written as a single element.
///
/// # Errors
///
/// Fails when an element contains a NUL byte or the writer fails.
pub fn print_array(output: &mut dyn Write, value: &Value) -> io::Result<()> {
    let elements = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    let mut quoted = Vec::with_capacity(elements.len());
    for element in elements {
        let text = match element {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        let word = shlex::try_quote(&text)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;
        quoted.push(word.into_owned());
    }
    writeln!(output, "{}", quoted.join(" "))
}
