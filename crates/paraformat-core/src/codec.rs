use std::fmt;

use serde::{Deserialize, Serialize};

use crate::format::{ClassList, Format};

/// Canonical string key of a [`Format`]: `tag#id.class1.class2`.
///
/// Formats that differ only in class order or surrounding whitespace share one key.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatId(String);

impl FormatId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FormatId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for FormatId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for FormatId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Builds the canonical key of a format. The title does not take part.
pub fn encode(format: &Format) -> FormatId {
    let mut out = String::new();
    if let Some(tag) = format.tag() {
        out.push_str(&tag);
    }
    if let Some(id) = format.id() {
        out.push('#');
        out.push_str(id);
    }
    for token in format.class_tokens() {
        out.push('.');
        out.push_str(token);
    }
    FormatId(out)
}

/// Splits a key back into tag, id and classes.
///
/// Total over all strings. A `#` with no id ends the key: `h1#.lead` reads as `h1`.
pub fn decode(format_id: &str) -> Format {
    let parts = split_format_id(format_id);
    let tag = parts.tag.to_ascii_lowercase();
    let class_list = if parts.classes.is_empty() {
        None
    } else {
        Some(ClassList::Text(parts.classes.join(" ")))
    };

    Format {
        title: None,
        tag: (!tag.is_empty()).then_some(tag),
        id: (!parts.id.is_empty()).then(|| parts.id.to_string()),
        class_list,
    }
}

struct FormatIdParts<'a> {
    tag: &'a str,
    id: &'a str,
    classes: Vec<&'a str>,
}

fn split_format_id(input: &str) -> FormatIdParts<'_> {
    let tag_end = input.find(['#', '.']).unwrap_or(input.len());
    let (tag, rest) = input.split_at(tag_end);

    let (id, rest) = match rest.strip_prefix('#') {
        Some(after_hash) => {
            let id_end = after_hash.find('.').unwrap_or(after_hash.len());
            if id_end == 0 {
                tracing::debug!(format_id = input, "format id has an empty id, ignoring the rest");
                return FormatIdParts {
                    tag,
                    id: "",
                    classes: Vec::new(),
                };
            }
            after_hash.split_at(id_end)
        }
        None => ("", rest),
    };

    let classes = rest.split('.').filter(|token| !token.is_empty()).collect();
    FormatIdParts { tag, id, classes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_reads_all_three_parts() {
        let parts = split_format_id("h4#intro.b.a");
        assert_eq!(parts.tag, "h4");
        assert_eq!(parts.id, "intro");
        assert_eq!(parts.classes, vec!["b", "a"]);
    }

    #[test]
    fn split_stops_at_hash_without_id() {
        let parts = split_format_id("h1#.lead");
        assert_eq!(parts.tag, "h1");
        assert_eq!(parts.id, "");
        assert!(parts.classes.is_empty());

        let parts = split_format_id("#.a");
        assert_eq!(parts.tag, "");
        assert!(parts.classes.is_empty());
    }

    #[test]
    fn split_keeps_hash_inside_class_token() {
        let parts = split_format_id("p.a#b");
        assert_eq!(parts.tag, "p");
        assert_eq!(parts.id, "");
        assert_eq!(parts.classes, vec!["a#b"]);
    }

    #[test]
    fn split_ignores_empty_class_tokens() {
        let parts = split_format_id("pre..x.");
        assert_eq!(parts.classes, vec!["x"]);
    }
}
