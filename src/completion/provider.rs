//! Property and value suggestions
//!
//! This module provides the [`PropertyDatabase`] trait for CSS property and
//! keyword lookups, a built-in table, and the prefix scans that turn the
//! sorted tables into candidates.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::debug;

use super::context::Candidate;
use crate::error::Result;

/// Pseudo value offered in every value position once the user types
const IMPORTANT: &str = "!important;";

/// Keywords every property accepts
const GLOBAL_KEYWORDS: &[&str] = &["inherit", "initial", "revert", "unset"];

const COLORS: &[&str] = &[
    "aqua",
    "black",
    "blue",
    "currentcolor",
    "fuchsia",
    "gray",
    "green",
    "lime",
    "maroon",
    "navy",
    "olive",
    "orange",
    "purple",
    "red",
    "rebeccapurple",
    "silver",
    "teal",
    "transparent",
    "white",
    "yellow",
];

const BORDER_STYLES: &[&str] = &[
    "dashed", "dotted", "double", "groove", "hidden", "inset", "none", "outset", "ridge", "solid",
];

const LENGTH_AUTO: &[&str] = &["auto"];

/// Built-in property table: name and its keyword values
const BUILTIN_PROPERTIES: &[(&str, &[&str])] = &[
    ("align-content", &["center", "flex-end", "flex-start", "space-around", "space-between", "stretch"]),
    ("align-items", &["baseline", "center", "flex-end", "flex-start", "stretch"]),
    ("align-self", &["auto", "baseline", "center", "flex-end", "flex-start", "stretch"]),
    ("animation", &["none"]),
    ("animation-direction", &["alternate", "alternate-reverse", "normal", "reverse"]),
    ("animation-duration", &[]),
    ("animation-fill-mode", &["backwards", "both", "forwards", "none"]),
    ("animation-iteration-count", &["infinite"]),
    ("animation-name", &["none"]),
    ("animation-play-state", &["paused", "running"]),
    ("animation-timing-function", &["ease", "ease-in", "ease-in-out", "ease-out", "linear", "step-end", "step-start"]),
    ("background", &["none"]),
    ("background-attachment", &["fixed", "local", "scroll"]),
    ("background-color", COLORS),
    ("background-image", &["none"]),
    ("background-position", &["bottom", "center", "left", "right", "top"]),
    ("background-repeat", &["no-repeat", "repeat", "repeat-x", "repeat-y", "round", "space"]),
    ("background-size", &["auto", "contain", "cover"]),
    ("border", BORDER_STYLES),
    ("border-bottom", BORDER_STYLES),
    ("border-collapse", &["collapse", "separate"]),
    ("border-color", COLORS),
    ("border-left", BORDER_STYLES),
    ("border-radius", &[]),
    ("border-right", BORDER_STYLES),
    ("border-style", BORDER_STYLES),
    ("border-top", BORDER_STYLES),
    ("border-width", &["medium", "thick", "thin"]),
    ("bottom", LENGTH_AUTO),
    ("box-shadow", &["none"]),
    ("box-sizing", &["border-box", "content-box"]),
    ("clear", &["both", "left", "none", "right"]),
    ("color", COLORS),
    ("content", &["close-quote", "no-close-quote", "no-open-quote", "none", "normal", "open-quote"]),
    ("cursor", &["auto", "crosshair", "default", "help", "move", "not-allowed", "pointer", "progress", "text", "wait"]),
    ("direction", &["ltr", "rtl"]),
    ("display", &["block", "contents", "flex", "grid", "inline", "inline-block", "inline-flex", "inline-grid", "list-item", "none", "table"]),
    ("flex", &["auto", "none"]),
    ("flex-basis", &["auto", "content"]),
    ("flex-direction", &["column", "column-reverse", "row", "row-reverse"]),
    ("flex-wrap", &["nowrap", "wrap", "wrap-reverse"]),
    ("float", &["left", "none", "right"]),
    ("font", &["caption", "icon", "menu", "message-box", "small-caption", "status-bar"]),
    ("font-family", &["cursive", "fantasy", "monospace", "sans-serif", "serif"]),
    ("font-size", &["large", "larger", "medium", "small", "smaller", "x-large", "x-small", "xx-large", "xx-small"]),
    ("font-style", &["italic", "normal", "oblique"]),
    ("font-variant", &["normal", "small-caps"]),
    ("font-weight", &["bold", "bolder", "lighter", "normal"]),
    ("gap", &["normal"]),
    ("grid-template-columns", &["none", "subgrid"]),
    ("grid-template-rows", &["none", "subgrid"]),
    ("height", &["auto", "fit-content", "max-content", "min-content"]),
    ("justify-content", &["center", "flex-end", "flex-start", "space-around", "space-between", "space-evenly"]),
    ("left", LENGTH_AUTO),
    ("letter-spacing", &["normal"]),
    ("line-height", &["normal"]),
    ("list-style", &["none"]),
    ("list-style-position", &["inside", "outside"]),
    ("list-style-type", &["circle", "decimal", "disc", "lower-alpha", "lower-roman", "none", "square", "upper-alpha", "upper-roman"]),
    ("margin", LENGTH_AUTO),
    ("margin-bottom", LENGTH_AUTO),
    ("margin-left", LENGTH_AUTO),
    ("margin-right", LENGTH_AUTO),
    ("margin-top", LENGTH_AUTO),
    ("max-height", &["none"]),
    ("max-width", &["none"]),
    ("min-height", &["auto"]),
    ("min-width", &["auto"]),
    ("opacity", &[]),
    ("outline", BORDER_STYLES),
    ("outline-color", COLORS),
    ("overflow", &["auto", "clip", "hidden", "scroll", "visible"]),
    ("overflow-x", &["auto", "clip", "hidden", "scroll", "visible"]),
    ("overflow-y", &["auto", "clip", "hidden", "scroll", "visible"]),
    ("padding", &[]),
    ("padding-bottom", &[]),
    ("padding-left", &[]),
    ("padding-right", &[]),
    ("padding-top", &[]),
    ("pointer-events", &["auto", "none"]),
    ("position", &["absolute", "fixed", "relative", "static", "sticky"]),
    ("right", LENGTH_AUTO),
    ("text-align", &["center", "end", "justify", "left", "right", "start"]),
    ("text-decoration", &["blink", "line-through", "none", "overline", "underline"]),
    ("text-overflow", &["clip", "ellipsis"]),
    ("text-shadow", &["none"]),
    ("text-transform", &["capitalize", "lowercase", "none", "uppercase"]),
    ("top", LENGTH_AUTO),
    ("transform", &["none"]),
    ("transition", &["none"]),
    ("transition-timing-function", &["ease", "ease-in", "ease-in-out", "ease-out", "linear", "step-end", "step-start"]),
    ("vertical-align", &["baseline", "bottom", "middle", "sub", "super", "text-bottom", "text-top", "top"]),
    ("visibility", &["collapse", "hidden", "visible"]),
    ("white-space", &["normal", "nowrap", "pre", "pre-line", "pre-wrap"]),
    ("width", &["auto", "fit-content", "max-content", "min-content"]),
    ("word-break", &["break-all", "keep-all", "normal"]),
    ("word-wrap", &["break-word", "normal"]),
    ("z-index", &["auto"]),
];

/// Source of CSS property names and their keyword values
pub trait PropertyDatabase: Send + Sync {
    /// All known property names, sorted ascending
    fn property_names(&self) -> &[String];

    /// Keyword values of `property`, sorted ascending; empty when unknown
    fn value_keywords(&self, property: &str) -> &[String];
}

/// In-memory [`PropertyDatabase`]
#[derive(Debug, Clone)]
pub struct StaticPropertyDatabase {
    names: Vec<String>,
    values: HashMap<String, Vec<String>>,
}

impl StaticPropertyDatabase {
    /// Build from a property → keywords map
    ///
    /// Global keywords (`inherit`, `initial`, ...) are added to every
    /// property, and each list is sorted and de-duplicated.
    pub fn from_map(map: BTreeMap<String, Vec<String>>) -> Self {
        let names: Vec<String> = map.keys().cloned().collect();
        let values = map
            .into_iter()
            .map(|(name, mut keywords)| {
                keywords.extend(GLOBAL_KEYWORDS.iter().map(|k| k.to_string()));
                keywords.sort();
                keywords.dedup();
                (name, keywords)
            })
            .collect();

        Self { names, values }
    }

    /// Parse a JSON object of `{ "property": ["value", ...] }`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let map: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
        Ok(Self::from_map(map))
    }

    /// Load a JSON property table from disk
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let db = Self::from_json_str(&content)?;
        debug!(path = %path.display(), properties = db.names.len(), "loaded property database");
        Ok(db)
    }
}

impl Default for StaticPropertyDatabase {
    fn default() -> Self {
        let map = BUILTIN_PROPERTIES
            .iter()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect();
        Self::from_map(map)
    }
}

impl PropertyDatabase for StaticPropertyDatabase {
    fn property_names(&self) -> &[String] {
        &self.names
    }

    fn value_keywords(&self, property: &str) -> &[String] {
        self.values.get(property).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Collect entries of a sorted list that start with `prefix`.
///
/// Matches are contiguous in a sorted list, so the scan stops at the first
/// entry that sorts past `prefix` without matching it.
fn sorted_prefix_scan<'a, I>(entries: I, prefix: &str, max_entries: usize) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut matches = Vec::new();
    for entry in entries {
        if matches.len() >= max_entries {
            break;
        }
        if entry.starts_with(prefix) {
            matches.push(entry);
        } else if entry > prefix {
            break;
        }
    }
    matches
}

/// Property names starting with `prefix`; nothing for an empty prefix
pub fn complete_properties(
    db: &dyn PropertyDatabase,
    prefix: &str,
    max_entries: usize,
) -> Vec<Candidate> {
    if prefix.is_empty() {
        return Vec::new();
    }

    let names = db.property_names().iter().map(String::as_str);
    sorted_prefix_scan(names, prefix, max_entries)
        .into_iter()
        .map(|name| Candidate::new(name, prefix, format!("{name}: ")))
        .collect()
}

/// Keyword values of `property` starting with `prefix`.
///
/// `!important;` sorts first and is offered only once something is typed.
pub fn complete_values(
    db: &dyn PropertyDatabase,
    property: &str,
    prefix: &str,
    max_entries: usize,
) -> Vec<Candidate> {
    let important = (!prefix.is_empty()).then_some(IMPORTANT);
    let keywords = db.value_keywords(property).iter().map(String::as_str);

    sorted_prefix_scan(important.into_iter().chain(keywords), prefix, max_entries)
        .into_iter()
        .map(|value| Candidate::new(value, prefix, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.label.as_str()).collect()
    }

    #[test]
    fn test_builtin_names_are_sorted() {
        let db = StaticPropertyDatabase::default();
        let names = db.property_names();
        assert!(names.windows(2).all(|w| w[0] < w[1]));
        assert!(names.iter().any(|n| n == "color"));
    }

    #[test]
    fn test_complete_properties_prefix() {
        let db = StaticPropertyDatabase::default();
        let candidates = complete_properties(&db, "colo", 15);
        assert_eq!(candidates, vec![Candidate::new("color", "colo", "color: ")]);
    }

    #[test]
    fn test_complete_properties_empty_prefix() {
        let db = StaticPropertyDatabase::default();
        assert!(complete_properties(&db, "", 15).is_empty());
    }

    #[test]
    fn test_complete_properties_caps_entries() {
        let db = StaticPropertyDatabase::default();
        let candidates = complete_properties(&db, "b", 3);
        assert_eq!(
            labels(&candidates),
            vec!["background", "background-attachment", "background-color"]
        );
    }

    #[test]
    fn test_complete_properties_no_match() {
        let db = StaticPropertyDatabase::default();
        assert!(complete_properties(&db, "zz", 15).is_empty());
    }

    #[test]
    fn test_complete_values_includes_red() {
        let db = StaticPropertyDatabase::default();
        let candidates = complete_values(&db, "color", "r", 15);
        assert!(candidates.contains(&Candidate::new("red", "r", "red")));
        assert!(candidates.iter().all(|c| c.label.starts_with('r')));
    }

    #[test]
    fn test_complete_values_important_needs_prefix() {
        let db = StaticPropertyDatabase::default();

        let candidates = complete_values(&db, "color", "", 100);
        assert!(!labels(&candidates).contains(&IMPORTANT));
        assert!(labels(&candidates).contains(&"inherit"));

        let candidates = complete_values(&db, "color", "!imp", 15);
        assert_eq!(candidates, vec![Candidate::new(IMPORTANT, "!imp", IMPORTANT)]);
    }

    #[test]
    fn test_complete_values_unknown_property() {
        let db = StaticPropertyDatabase::default();
        assert!(complete_values(&db, "no-such-thing", "a", 15).is_empty());
    }

    #[test]
    fn test_from_json_str() {
        let db = StaticPropertyDatabase::from_json_str(
            r#"{ "zoom": ["normal", "reset"], "accent-color": ["auto"] }"#,
        )
        .unwrap();
        assert_eq!(db.property_names(), ["accent-color", "zoom"]);
        assert_eq!(
            db.value_keywords("zoom"),
            ["inherit", "initial", "normal", "reset", "revert", "unset"]
        );
    }

    #[test]
    fn test_from_json_str_rejects_garbage() {
        assert!(StaticPropertyDatabase::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_sorted_prefix_scan_stops_early() {
        let entries = ["a", "ba", "bb", "c", "bz"];
        // `bz` is out of order and must not be reached
        let matches = sorted_prefix_scan(entries, "b", 10);
        assert_eq!(matches, vec!["ba", "bb"]);
    }
}
