//! Which configured formats describe the block under the caret.

use crate::codec::{FormatId, encode};
use crate::format::{ClassList, Format, PluginOptions};

/// Shown on the toolbar button when no configured format matches.
pub const NO_MATCH_LABEL: &str = "\u{2014}";

/// Tags that carry no format of their own and read as the default tag.
const DEFAULT_LIKE_TAGS: &[&str] = &["li", "td", "th"];

/// Tag, id and class attribute of a block as the host reports them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ElementFormat {
    pub tag: String,
    pub id: Option<String>,
    pub class: Option<String>,
}

/// Format keys matching `element`, or the default tag when the selection has no block.
///
/// A block in the default tag also matches the same format without a tag, so tag-less
/// entries such as "Normal" light up.
pub fn element_format_ids(
    element: Option<&ElementFormat>,
    default_tag: Option<&str>,
) -> Vec<FormatId> {
    let default_tag = default_tag
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_ascii_lowercase);

    let format = match element {
        Some(element) => {
            let tag = element.tag.to_ascii_lowercase();
            Format {
                title: None,
                tag: if DEFAULT_LIKE_TAGS.contains(&tag.as_str()) {
                    default_tag.clone()
                } else {
                    Some(tag)
                },
                id: element.id.clone(),
                class_list: element.class.clone().map(ClassList::Text),
            }
        }
        None => Format {
            tag: default_tag.clone(),
            ..Format::default()
        },
    };

    let mut ids = vec![encode(&format)];
    if format.tag() == default_tag {
        let untagged = encode(&Format {
            tag: None,
            ..format
        });
        if !ids.contains(&untagged) {
            ids.push(untagged);
        }
    }
    ids
}

/// Configured formats whose key is among `ids`, in configuration order.
pub fn active_formats<'a>(formats: &'a [Format], ids: &[FormatId]) -> Vec<&'a Format> {
    formats
        .iter()
        .filter(|format| ids.contains(&encode(format)))
        .collect()
}

/// Label for the toolbar button, `None` when the host should keep its icon.
pub fn selection_label(options: &PluginOptions, ids: &[FormatId]) -> Option<String> {
    if !options.show_selection {
        return None;
    }
    let title = active_formats(&options.formats, ids)
        .into_iter()
        .next()
        .map(|format| format.title.clone().unwrap_or_default())
        .unwrap_or_else(|| NO_MATCH_LABEL.to_string());
    Some(title)
}
