//! Path patterns with named placeholders.
//!
//! # Syntax
//! ```text
//! ""                       matches the empty path only
//! "settings/"              literal
//! "entries/{id:int}/"      typed placeholder
//! "{slug:page}/"           page slug (alphanumerics, '-', '_', '.', '/')
//! ```
//!
//! Patterns are relative: they never carry a leading slash. Routers strip
//! exactly one leading slash from the incoming path before matching.
//!
//! # Design Decisions
//! - Compiled once into an anchored regex
//! - Reversal re-checks every value against its converter, so a reversed
//!   path always resolves back to the same route

use std::collections::BTreeMap;

use regex::Regex;

use crate::routing::RoutingError;

/// Placeholder value classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// Any non-empty text without a slash. The default.
    Str,
    /// ASCII letters, digits, hyphens and underscores.
    Slug,
    /// Unsigned decimal digits.
    Int,
    /// Any non-empty text, slashes included.
    Path,
    /// Content-tree slug chain: alphanumerics, `-`, `_`, `.` and `/`.
    Page,
}

impl Converter {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "" | "str" => Some(Self::Str),
            "slug" => Some(Self::Slug),
            "int" => Some(Self::Int),
            "path" => Some(Self::Path),
            "page" => Some(Self::Page),
            _ => None,
        }
    }

    fn regex(self) -> &'static str {
        match self {
            Self::Str => r"[^/]+",
            Self::Slug => r"[-a-zA-Z0-9_]+",
            Self::Int => r"[0-9]+",
            Self::Path => r".+",
            Self::Page => r"[0-9A-Za-z\-_./]+",
        }
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Param { name: String, converter: Converter },
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    regex: Regex,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse and compile a pattern.
    pub fn parse(raw: &str) -> Result<Self, RoutingError> {
        let invalid = |reason: &str| RoutingError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '{' => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    let mut body = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        body.push(c);
                    }
                    if !closed {
                        return Err(invalid("unterminated placeholder"));
                    }
                    let (name, conv) = body.split_once(':').unwrap_or((body.as_str(), ""));
                    if name.is_empty() {
                        return Err(invalid("placeholder without a name"));
                    }
                    let converter = Converter::parse(conv)
                        .ok_or_else(|| invalid(&format!("unknown converter '{}'", conv)))?;
                    let duplicate = segments.iter().any(
                        |s| matches!(s, Segment::Param { name: n, .. } if n == name),
                    );
                    if duplicate {
                        return Err(invalid(&format!("duplicate placeholder '{}'", name)));
                    }
                    segments.push(Segment::Param {
                        name: name.to_string(),
                        converter,
                    });
                }
                '}' => return Err(invalid("unmatched '}'")),
                _ => literal.push(ch),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let mut source = String::from("^");
        for segment in &segments {
            match segment {
                Segment::Literal(text) => source.push_str(&regex::escape(text)),
                Segment::Param { name, converter } => {
                    source.push_str(&format!("(?P<{}>{})", name, converter.regex()));
                }
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            regex,
            segments,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in declaration order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a whole (relative) path, returning the captured values.
    pub fn match_path(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let captures = self.regex.captures(path)?;
        let mut kwargs = BTreeMap::new();
        for name in self.params() {
            if let Some(value) = captures.name(name) {
                kwargs.insert(name.to_string(), value.as_str().to_string());
            }
        }
        Some(kwargs)
    }

    /// Build the relative path for the given arguments.
    ///
    /// Positional arguments fill placeholders in order; named arguments must
    /// name exactly the pattern's placeholders. Mixing both never matches.
    pub fn reverse(&self, args: &ReverseArgs) -> Option<String> {
        let names: Vec<&str> = self.params().collect();
        let values: Vec<&str> = if !args.positional.is_empty() {
            if !args.named.is_empty() || args.positional.len() != names.len() {
                return None;
            }
            args.positional.iter().map(String::as_str).collect()
        } else {
            if args.named.len() != names.len() {
                return None;
            }
            names
                .iter()
                .map(|n| args.named.get(*n).map(String::as_str))
                .collect::<Option<Vec<_>>>()?
        };

        let mut out = String::with_capacity(self.raw.len());
        let mut values = values.into_iter();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Param { converter, .. } => {
                    let value = values.next()?;
                    if !converter_accepts(*converter, value) {
                        return None;
                    }
                    out.push_str(value);
                }
            }
        }
        Some(out)
    }
}

fn converter_accepts(converter: Converter, value: &str) -> bool {
    match converter {
        Converter::Str => !value.is_empty() && !value.contains('/'),
        Converter::Slug => {
            !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        Converter::Int => !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()),
        Converter::Path => !value.is_empty(),
        Converter::Page => {
            !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
        }
    }
}

/// Arguments for reverse resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseArgs {
    pub positional: Vec<String>,
    pub named: BTreeMap<String, String>,
}

impl ReverseArgs {
    /// No arguments.
    pub fn none() -> Self {
        Self::default()
    }

    /// Positional arguments.
    pub fn positional<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            named: BTreeMap::new(),
        }
    }

    /// Named arguments.
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            positional: Vec::new(),
            named: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
