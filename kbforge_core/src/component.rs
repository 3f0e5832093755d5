//! Canonical fact components.
//!
//! Every subject, relation and object stored in a theme is a token in one of
//! two syntactic shapes:
//!
//! - a *reference* delimited by angle brackets (`<Albert_Einstein>`,
//!   `<de/Berlin>`) or written as a standard qualified name (`rdf:type`);
//! - a *literal* in double quotes, optionally followed by `^^datatype` or
//!   `@language` (`"1879-03-14"^^xsd:date`, `"Berlin"@de`).
//!
//! The functions here never fail. Inputs that cannot be represented are
//! sanitized into a best-effort token so extraction loops keep running.

use std::fmt::Write as _;

/// Datatype of date literals.
pub const XSD_DATE: &str = "xsd:date";
/// Datatype of plain decimal literals.
pub const XSD_DECIMAL: &str = "xsd:decimal";
/// Datatype of plain strings. Literals with this datatype are written bare.
pub const XSD_STRING: &str = "xsd:string";

/// Token used when a reference would otherwise be empty.
pub const EMPTY_ENTITY: &str = "<_>";

const STANDARD_PREFIXES: [&str; 5] = ["rdf:", "rdfs:", "xsd:", "owl:", "skos:"];

const FOREIGN_PREFIXES: [&str; 6] = [
    "http://yago-knowledge.org/resource/",
    "https://yago-knowledge.org/resource/",
    "http://dbpedia.org/resource/",
    "https://dbpedia.org/resource/",
    "dbp:",
    "y:",
];

/// Syntactic kind of a canonical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Reference,
    Literal,
}

impl ComponentKind {
    #[must_use]
    pub fn of(token: &str) -> Self {
        if token.starts_with('"') {
            Self::Literal
        } else {
            Self::Reference
        }
    }
}

#[must_use]
pub fn is_literal(token: &str) -> bool {
    ComponentKind::of(token) == ComponentKind::Literal
}

/// Returns true for the language codes treated as English.
#[must_use]
pub fn is_english(language: &str) -> bool {
    matches!(language, "en" | "eng")
}

fn is_reserved(c: char) -> bool {
    matches!(
        c,
        '<' | '>' | '"' | '\\' | '%' | '{' | '}' | '|' | '^' | '`'
    ) || c.is_control()
}

fn percent_encode(c: char, out: &mut String) {
    let mut buf = [0_u8; 4];
    for byte in c.encode_utf8(&mut buf).as_bytes() {
        let _ = write!(out, "%{byte:02X}");
    }
}

/// Normalizes a title into the body of a reference: whitespace and underscore
/// runs become a single `_`, leading and trailing separators are dropped and
/// reserved characters are percent-escaped.
fn entity_body(name: &str) -> String {
    let mut body = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.chars() {
        if c.is_whitespace() || c == '_' {
            pending_separator = true;
            continue;
        }
        if pending_separator && !body.is_empty() {
            body.push('_');
        }
        pending_separator = false;
        if is_reserved(c) {
            percent_encode(c, &mut body);
        } else {
            body.push(c);
        }
    }
    body
}

/// Builds the reference for a source title.
///
/// Deterministic and total: `for_entity("Albert  Einstein")` and
/// `for_entity("Albert_Einstein")` both give `<Albert_Einstein>`, and an empty
/// title gives [`EMPTY_ENTITY`].
#[must_use]
pub fn for_entity(name: &str) -> String {
    let body = entity_body(name);
    if body.is_empty() {
        EMPTY_ENTITY.to_string()
    } else {
        format!("<{body}>")
    }
}

/// Builds a language-tagged reference. English titles map to the plain
/// entity, other languages to `<lang/Title>`.
#[must_use]
pub fn for_foreign_entity(name: &str, language: &str) -> String {
    if is_english(language) || language.is_empty() {
        return for_entity(name);
    }
    let body = entity_body(name);
    if body.is_empty() {
        EMPTY_ENTITY.to_string()
    } else {
        format!("<{language}/{body}>")
    }
}

/// Wraps a URI as a reference.
#[must_use]
pub fn for_uri(uri: &str) -> String {
    let mut body = String::with_capacity(uri.len() + 2);
    for c in uri.trim().chars() {
        if c.is_whitespace() || matches!(c, '<' | '>' | '"') || c.is_control() {
            percent_encode(c, &mut body);
        } else {
            body.push(c);
        }
    }
    if body.is_empty() {
        EMPTY_ENTITY.to_string()
    } else {
        format!("<{body}>")
    }
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Quotes a plain string literal.
#[must_use]
pub fn for_string(value: &str) -> String {
    escape_literal(value)
}

#[must_use]
pub fn for_string_with_language(value: &str, language: &str) -> String {
    if language.is_empty() {
        return escape_literal(value);
    }
    format!("{}@{language}", escape_literal(value))
}

/// Quotes a literal and attaches a datatype or unit.
///
/// Qualified names (`xsd:date`) and references (`<m>`) are kept as they are;
/// a bare unit such as `km` is turned into the reference `<km>`. An empty
/// datatype or `xsd:string` yields a plain string literal.
#[must_use]
pub fn for_string_with_datatype(value: &str, datatype: &str) -> String {
    let datatype = datatype.trim();
    if datatype.is_empty() || datatype == XSD_STRING {
        return escape_literal(value);
    }
    let datatype = if datatype.starts_with('<') || is_qname(datatype) {
        datatype.to_string()
    } else {
        for_entity(datatype)
    };
    format!("{}^^{datatype}", escape_literal(value))
}

#[must_use]
pub fn for_date(value: &str) -> String {
    for_string_with_datatype(value, XSD_DATE)
}

#[must_use]
pub fn for_number(value: &str) -> String {
    for_string_with_datatype(value, XSD_DECIMAL)
}

fn is_qname(token: &str) -> bool {
    STANDARD_PREFIXES.iter().any(|p| token.starts_with(p))
}

/// Converts an identifier or literal coming from an external source into the
/// internal syntax.
///
/// Literals pass through unchanged. References lose their angle brackets and
/// any known foreign namespace before being re-wrapped; standard qualified
/// names such as `rdf:type` are left alone.
#[must_use]
pub fn from_external(token: &str) -> String {
    let token = token.trim();
    if is_literal(token) {
        return token.to_string();
    }
    let (bracketed, inner) = match token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        Some(inner) => (true, inner),
        None => (false, token),
    };
    if !bracketed && is_qname(inner) {
        return inner.to_string();
    }
    let body = FOREIGN_PREFIXES
        .iter()
        .find_map(|prefix| inner.strip_prefix(prefix))
        .unwrap_or(inner);
    let body = body.replace(' ', "_");
    if body.is_empty() {
        EMPTY_ENTITY.to_string()
    } else {
        format!("<{body}>")
    }
}

/// Decoded view of a literal token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralParts<'a> {
    pub value: String,
    pub datatype: Option<&'a str>,
    pub language: Option<&'a str>,
}

/// Splits a literal token into its unescaped value and its suffix.
/// Returns `None` for references and for unterminated literals.
#[must_use]
pub fn literal_parts(token: &str) -> Option<LiteralParts<'_>> {
    let rest = token.strip_prefix('"')?;
    let mut value = String::with_capacity(rest.len());
    let mut chars = rest.char_indices();
    let mut end = None;
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, other)) => value.push(other),
                None => return None,
            },
            '"' => {
                end = Some(i);
                break;
            }
            _ => value.push(c),
        }
    }
    let suffix = &rest[end? + 1..];
    let (datatype, language) = if let Some(datatype) = suffix.strip_prefix("^^") {
        (Some(datatype), None)
    } else if let Some(language) = suffix.strip_prefix('@') {
        (None, Some(language))
    } else {
        (None, None)
    };
    Some(LiteralParts {
        value,
        datatype,
        language,
    })
}

/// Returns the datatype of a literal token, if any.
#[must_use]
pub fn datatype(token: &str) -> Option<&str> {
    literal_parts(token).and_then(|parts| parts.datatype)
}

/// Returns the language tag of a literal token, if any.
#[must_use]
pub fn language(token: &str) -> Option<&str> {
    literal_parts(token).and_then(|parts| parts.language)
}

/// Removes surrounding double quotes. Literal tokens are decoded, other text
/// only loses one pair of enclosing quotes.
#[must_use]
pub fn strip_quotes(text: &str) -> String {
    if let Some(parts) = literal_parts(text) {
        return parts.value;
    }
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
        .to_string()
}

/// Removes the angle brackets around a reference.
#[must_use]
pub fn strip_brackets(token: &str) -> &str {
    token
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(token)
}
