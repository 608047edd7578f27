//! Reading `@property` tags out of a type's documentation block.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocBlockError {
    #[error("Documentation block is not terminated")]
    Unterminated,

    #[error("@property tag on line {0} has no type")]
    MissingType(usize),

    #[error("@property tag on line {0} has no variable name")]
    MissingName(usize),

    #[error("@property tag on line {line} has an invalid variable name '{name}'")]
    InvalidName { line: usize, name: String },
}

/// One `@property <type> $<name> <description>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTag {
    pub type_token: String,
    pub name: String,
    pub description: String,
}

/// Parses a documentation block, with or without `/** */` delimiters.
///
/// Untagged lines following a tag extend that tag's description.
pub fn parse_property_tags(doc: &str) -> Result<Vec<PropertyTag>, DocBlockError> {
    let body = strip_delimiters(doc)?;
    let mut tags = Vec::new();
    // Whether untagged lines currently belong to a @property description.
    let mut in_property = false;

    for (index, raw_line) in body.lines().enumerate() {
        let line = strip_gutter(raw_line);
        let line_no = index + 1;

        if line.starts_with('@') {
            in_property = false;
            let (tag, rest) = split_word(&line[1..]);
            if tag != "property" {
                continue;
            }
            tags.push(parse_property(rest, line_no)?);
            in_property = true;
        } else if in_property && !line.is_empty() {
            if let Some(tag) = tags.last_mut() {
                if !tag.description.is_empty() {
                    tag.description.push('\n');
                }
                tag.description.push_str(line);
            }
        } else if line.is_empty() {
            in_property = false;
        }
    }

    Ok(tags)
}

fn parse_property(rest: &str, line: usize) -> Result<PropertyTag, DocBlockError> {
    let (type_token, rest) = split_word(rest);
    if type_token.is_empty() {
        return Err(DocBlockError::MissingType(line));
    }
    if type_token.starts_with('$') {
        return Err(DocBlockError::MissingType(line));
    }

    let (variable, description) = split_word(rest);
    let Some(name) = variable.strip_prefix('$') else {
        return Err(DocBlockError::MissingName(line));
    };
    if !is_identifier(name) {
        return Err(DocBlockError::InvalidName {
            line,
            name: name.to_string(),
        });
    }

    Ok(PropertyTag {
        type_token: type_token.to_string(),
        name: name.to_string(),
        description: description.trim().to_string(),
    })
}

fn strip_delimiters(doc: &str) -> Result<&str, DocBlockError> {
    let trimmed = doc.trim();
    match trimmed.strip_prefix("/**") {
        Some(inner) => inner.strip_suffix("*/").ok_or(DocBlockError::Unterminated),
        None => Ok(trimmed),
    }
}

fn strip_gutter(line: &str) -> &str {
    let line = line.trim();
    match line.strip_prefix('*') {
        Some(rest) => rest.trim(),
        None => line,
    }
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(pos) => (&input[..pos], &input[pos..]),
        None => (input, ""),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
