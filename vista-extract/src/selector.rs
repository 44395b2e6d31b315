//! Lookup kinds and their translation to W3C WebDriver location strategies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vista_common::VistaError;

/// How a selector expression is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Selector {
    Class,
    Css,
    Id,
    LinkText,
    PartialLinkText,
    Name,
    Tag,
    XPath,
}

/// Location strategy understood by a WebDriver endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Css,
    LinkText,
    XPath,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Css => "css selector",
            Strategy::LinkText => "link text",
            Strategy::XPath => "xpath",
        }
    }
}

/// A selector resolved into a concrete strategy and expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub strategy: Strategy,
    pub expression: String,
}

impl Selector {
    pub const ALL: [Selector; 8] = [
        Selector::Class,
        Selector::Css,
        Selector::Id,
        Selector::LinkText,
        Selector::PartialLinkText,
        Selector::Name,
        Selector::Tag,
        Selector::XPath,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Selector::Class => "class",
            Selector::Css => "css",
            Selector::Id => "id",
            Selector::LinkText => "link_text",
            Selector::PartialLinkText => "partial_link_text",
            Selector::Name => "name",
            Selector::Tag => "tag",
            Selector::XPath => "xpath",
        }
    }

    /// Resolve `value` into the query a WebDriver endpoint executes.
    ///
    /// Class, id and name lookups become attribute selectors the same way the
    /// reference WebDriver clients rewrite them. Partial link text becomes an
    /// XPath over anchors so that drivers without that strategy can run it.
    ///
    /// ```
    /// use vista_extract::{Selector, Strategy};
    ///
    /// let q = Selector::Name.query("q");
    /// assert_eq!(q.strategy, Strategy::Css);
    /// assert_eq!(q.expression, r#"[name="q"]"#);
    /// ```
    pub fn query(self, value: &str) -> Query {
        let (strategy, expression) = match self {
            Selector::Class => (Strategy::Css, format!(".{}", css_ident(value))),
            Selector::Css => (Strategy::Css, value.to_string()),
            Selector::Id => (Strategy::Css, format!("[id=\"{}\"]", css_string(value))),
            Selector::Name => (Strategy::Css, format!("[name=\"{}\"]", css_string(value))),
            Selector::Tag => (Strategy::Css, value.to_string()),
            Selector::LinkText => (Strategy::LinkText, value.to_string()),
            Selector::PartialLinkText => (
                Strategy::XPath,
                format!(".//a[contains(., {})]", xpath_literal(value)),
            ),
            Selector::XPath => (Strategy::XPath, value.to_string()),
        };
        Query {
            strategy,
            expression,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Selector {
    type Err = VistaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let selector = match normalized.as_str() {
            "class" | "class_name" => Selector::Class,
            "css" | "css_selector" => Selector::Css,
            "id" => Selector::Id,
            "link" | "link_text" => Selector::LinkText,
            "plink" | "partial_link" | "partial_link_text" => Selector::PartialLinkText,
            "name" => Selector::Name,
            "tag" | "tag_name" => Selector::Tag,
            "xpath" => Selector::XPath,
            _ => return Err(VistaError::Config(format!("unknown selector kind `{s}`"))),
        };
        Ok(selector)
    }
}

impl TryFrom<String> for Selector {
    type Error = VistaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.as_str().to_string()
    }
}

fn css_ident(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, ch) in value.chars().enumerate() {
        let plain = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii();
        if plain && !(i == 0 && ch.is_ascii_digit()) {
            out.push(ch);
        } else if ch.is_ascii_digit() {
            out.push_str(&format!("\\{:x} ", ch as u32));
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}

fn css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// XPath 1.0 has no escapes, so mixed quotes need `concat()`.
fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    let parts: Vec<String> = value
        .split('"')
        .map(|part| format!("\"{part}\""))
        .collect();
    format!("concat({})", parts.join(", '\"', "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_selector_resolves_to_a_strategy() {
        let table: Vec<(Selector, Strategy, &str)> = vec![
            (Selector::Class, Strategy::Css, ".item"),
            (Selector::Css, Strategy::Css, "item"),
            (Selector::Id, Strategy::Css, "[id=\"item\"]"),
            (Selector::LinkText, Strategy::LinkText, "item"),
            (
                Selector::PartialLinkText,
                Strategy::XPath,
                ".//a[contains(., \"item\")]",
            ),
            (Selector::Name, Strategy::Css, "[name=\"item\"]"),
            (Selector::Tag, Strategy::Css, "item"),
            (Selector::XPath, Strategy::XPath, "item"),
        ];
        assert_eq!(table.len(), Selector::ALL.len());
        for (selector, strategy, expression) in table {
            let q = selector.query("item");
            assert_eq!(q.strategy, strategy, "{selector}");
            assert_eq!(q.expression, expression, "{selector}");
        }
    }

    #[test]
    fn attribute_values_escape_quotes() {
        assert_eq!(
            Selector::Id.query(r#"a"b"#).expression,
            r#"[id="a\"b"]"#
        );
    }

    #[test]
    fn class_names_escape_css_syntax() {
        assert_eq!(Selector::Class.query("col.md").expression, ".col\\.md");
        assert_eq!(Selector::Class.query("1st").expression, ".\\31 st");
    }

    #[test]
    fn xpath_literals_handle_both_quote_kinds() {
        assert_eq!(xpath_literal("plain"), "\"plain\"");
        assert_eq!(xpath_literal("say \"hi\""), "'say \"hi\"'");
        assert_eq!(
            xpath_literal("it's \"x\""),
            "concat(\"it's \", '\"', \"x\", '\"', \"\")"
        );
    }

    #[test]
    fn parses_aliases_case_insensitively() {
        assert_eq!("XPATH".parse::<Selector>().unwrap(), Selector::XPath);
        assert_eq!("link".parse::<Selector>().unwrap(), Selector::LinkText);
        assert_eq!("plink".parse::<Selector>().unwrap(), Selector::PartialLinkText);
        assert_eq!("Tag-Name".parse::<Selector>().unwrap(), Selector::Tag);
        assert!("jquery".parse::<Selector>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for selector in Selector::ALL {
            assert_eq!(selector.to_string().parse::<Selector>().unwrap(), selector);
        }
    }
}
