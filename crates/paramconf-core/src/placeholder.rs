//! Placeholder parsing
//!
//! Scalars may embed placeholders of the form:
//! - `{!ENV: VAR}` - process environment variable
//! - `{!SSM: key}` - parameter store key (relative keys are qualified by root paths)
//! - `{!ENV: VAR !DEFAULT: value}` - with an inline default
//!
//! Placeholders do not nest. A scalar may hold several of them in sequence;
//! [`find`] returns the leftmost well-formed one and the resolver peels them
//! off one at a time.

use std::fmt;

const MARKER: &str = "{!";
const DEFAULT_MARKER: &str = "!DEFAULT:";
const CLOSE: char = '}';

/// Where a placeholder's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// The invoking process's environment (`ENV`)
    Environment,
    /// The remote parameter store (`SSM`)
    ParameterStore,
}

impl SourceType {
    /// The tag used in placeholder syntax
    pub fn tag(&self) -> &'static str {
        match self {
            SourceType::Environment => "ENV",
            SourceType::ParameterStore => "SSM",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ENV" => Some(SourceType::Environment),
            "SSM" => Some(SourceType::ParameterStore),
            _ => None,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Environment => write!(f, "environment variable"),
            SourceType::ParameterStore => write!(f, "SSM parameter"),
        }
    }
}

/// A placeholder located inside a scalar string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Literal text before the token
    pub prefix: &'a str,
    /// Value source
    pub source: SourceType,
    /// Key, trimmed, not yet qualified with a root path
    pub key: &'a str,
    /// Inline default, trimmed. `None` when absent or blank.
    pub default: Option<&'a str>,
    /// Text after the token (may hold further placeholders)
    pub suffix: &'a str,
}

impl Placeholder<'_> {
    /// Rebuild the scalar with the token replaced by `value`
    pub fn substitute(&self, value: &str) -> String {
        let mut out = String::with_capacity(self.prefix.len() + value.len() + self.suffix.len());
        out.push_str(self.prefix);
        out.push_str(value);
        out.push_str(self.suffix);
        out
    }
}

/// Scanner that locates placeholder tokens in a string
pub struct PlaceholderParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> PlaceholderParser<'a> {
    /// Create a new parser for the given input
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Find the next well-formed placeholder, skipping malformed candidates
    pub fn next_placeholder(&mut self) -> Option<Placeholder<'a>> {
        while self.pos < self.input.len() {
            let start = self.pos + self.input[self.pos..].find(MARKER)?;
            if let Some(placeholder) = self.parse_at(start) {
                return Some(placeholder);
            }
            // '{' is one byte, so this stays on a char boundary
            self.pos = start + 1;
        }
        None
    }

    /// Try to parse a token starting at `start` (which points at `{!`)
    fn parse_at(&self, start: usize) -> Option<Placeholder<'a>> {
        let mut cursor = start + MARKER.len();

        // Source tag followed by ':'
        let rest = &self.input[cursor..];
        let colon = rest.find(':')?;
        let source = SourceType::from_tag(&rest[..colon])?;
        cursor += colon + 1;

        // Key runs until the close marker or the start of a default marker
        let key_len = self.input[cursor..].find(|c: char| c == CLOSE || c == '!')?;
        let key = self.input[cursor..cursor + key_len].trim();
        cursor += key_len;

        let rest = &self.input[cursor..];
        let (default, end) = if rest.starts_with(CLOSE) {
            (None, cursor + 1)
        } else if let Some(after) = rest.strip_prefix(DEFAULT_MARKER) {
            let default_len = after.find(CLOSE)?;
            let default = after[..default_len].trim();
            let end = cursor + DEFAULT_MARKER.len() + default_len + 1;
            ((!default.is_empty()).then_some(default), end)
        } else {
            return None;
        };

        Some(Placeholder {
            prefix: &self.input[..start],
            source,
            key,
            default,
            suffix: &self.input[end..],
        })
    }
}

/// Find the leftmost placeholder in a string
pub fn find(input: &str) -> Option<Placeholder<'_>> {
    PlaceholderParser::new(input).next_placeholder()
}

/// Check if a string contains at least one well-formed placeholder
pub fn contains_placeholder(input: &str) -> bool {
    input.contains(MARKER) && find(input).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_string_has_no_placeholder() {
        assert_eq!(find("hello world"), None);
        assert_eq!(find(""), None);
        assert!(!contains_placeholder("just {braces} and !bangs"));
    }

    #[test]
    fn test_env_placeholder() {
        let p = find("{!ENV: HOME}").unwrap();
        assert_eq!(
            p,
            Placeholder {
                prefix: "",
                source: SourceType::Environment,
                key: "HOME",
                default: None,
                suffix: "",
            }
        );
    }

    #[test]
    fn test_ssm_placeholder_with_default() {
        let p = find("{!SSM: db/password !DEFAULT: changeme}").unwrap();
        assert_eq!(p.source, SourceType::ParameterStore);
        assert_eq!(p.key, "db/password");
        assert_eq!(p.default, Some("changeme"));
    }

    #[test]
    fn test_key_is_trimmed() {
        let p = find("{!ENV:    SPACED   }").unwrap();
        assert_eq!(p.key, "SPACED");
    }

    #[test]
    fn test_blank_default_is_no_default() {
        assert_eq!(find("{!ENV: A !DEFAULT:    }").unwrap().default, None);
        assert_eq!(find("{!ENV: A !DEFAULT:}").unwrap().default, None);
    }

    #[test]
    fn test_default_keeps_inner_whitespace() {
        let p = find("{!ENV: A !DEFAULT:  two words  }").unwrap();
        assert_eq!(p.default, Some("two words"));
    }

    #[test]
    fn test_prefix_and_suffix() {
        let p = find("aaa{!ENV: X !DEFAULT: def}bbb").unwrap();
        assert_eq!(p.prefix, "aaa");
        assert_eq!(p.suffix, "bbb");
        assert_eq!(p.substitute("100"), "aaa100bbb");
    }

    #[test]
    fn test_compound_returns_leftmost() {
        let input = "AA/{!SSM: p1 !DEFAULT: d1}{!ENV: p2 !DEFAULT: d2}/ccc";
        let p = find(input).unwrap();
        assert_eq!(p.prefix, "AA/");
        assert_eq!(p.source, SourceType::ParameterStore);
        assert_eq!(p.key, "p1");
        assert_eq!(p.default, Some("d1"));
        assert_eq!(p.suffix, "{!ENV: p2 !DEFAULT: d2}/ccc");
    }

    #[test]
    fn test_unknown_source_is_skipped() {
        let p = find("{!FOO: x} then {!ENV: Y}").unwrap();
        assert_eq!(p.prefix, "{!FOO: x} then ");
        assert_eq!(p.key, "Y");
    }

    #[test]
    fn test_source_tag_is_case_sensitive() {
        assert_eq!(find("{!env: HOME}"), None);
    }

    #[test]
    fn test_unclosed_placeholder() {
        assert_eq!(find("{!ENV: HOME"), None);
        assert_eq!(find("{!ENV: HOME !DEFAULT: x"), None);
    }

    #[test]
    fn test_stray_bang_in_key_is_not_a_placeholder() {
        assert_eq!(find("{!ENV: a!b}"), None);
    }

    #[test]
    fn test_unclosed_candidate_before_valid_one() {
        let p = find("{!ENV: a {!ENV: b}").unwrap();
        assert_eq!(p.prefix, "{!ENV: a ");
        assert_eq!(p.key, "b");
    }

    #[test]
    fn test_multibyte_prefix() {
        let p = find("héllo→{!ENV: X}✓").unwrap();
        assert_eq!(p.prefix, "héllo→");
        assert_eq!(p.suffix, "✓");
    }

    #[test]
    fn test_parser_stops_at_first_candidate() {
        let mut parser = PlaceholderParser::new("{!ENV: A}{!SSM: B}");
        assert_eq!(parser.next_placeholder().unwrap().key, "A");
    }

    #[test]
    fn test_source_type_tags() {
        assert_eq!(SourceType::Environment.tag(), "ENV");
        assert_eq!(SourceType::ParameterStore.tag(), "SSM");
        assert_eq!(SourceType::from_tag("SSM"), Some(SourceType::ParameterStore));
        assert_eq!(SourceType::from_tag("XYZ"), None);
    }
}
