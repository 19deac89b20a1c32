use serde::{Deserialize, Serialize};

/// Class tokens of a format, configured either as one space-delimited string or as a list.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassList {
    Text(String),
    Tokens(Vec<String>),
}

impl ClassList {
    /// Non-empty tokens in configuration order.
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            ClassList::Text(text) => text.split_whitespace().collect(),
            ClassList::Tokens(tokens) => tokens
                .iter()
                .flat_map(|token| token.split_whitespace())
                .collect(),
        }
    }

    /// Sorted, deduplicated tokens.
    pub fn canonical_tokens(&self) -> Vec<&str> {
        let mut tokens = self.tokens();
        tokens.sort_unstable();
        tokens.dedup();
        tokens
    }
}

impl From<&str> for ClassList {
    fn from(value: &str) -> Self {
        ClassList::Text(value.to_string())
    }
}

impl From<String> for ClassList {
    fn from(value: String) -> Self {
        ClassList::Text(value)
    }
}

impl From<Vec<String>> for ClassList {
    fn from(value: Vec<String>) -> Self {
        ClassList::Tokens(value)
    }
}

/// Target paragraph style: a tag/id/class combination plus the label shown for it.
///
/// A missing `tag` stands for the host's default block tag.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Format {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        default,
        rename = "class",
        alias = "classList",
        skip_serializing_if = "Option::is_none"
    )]
    pub class_list: Option<ClassList>,
}

impl Format {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class_list: impl Into<ClassList>) -> Self {
        self.class_list = Some(class_list.into());
        self
    }

    /// Lowercased tag, `None` when absent or blank.
    pub fn tag(&self) -> Option<String> {
        self.tag
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_ascii_lowercase)
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    pub fn class_tokens(&self) -> Vec<&str> {
        self.class_list
            .as_ref()
            .map(ClassList::canonical_tokens)
            .unwrap_or_default()
    }

    /// Class attribute value, `None` when there are no tokens.
    pub fn class_attr(&self) -> Option<String> {
        let tokens = self.class_tokens();
        if tokens.is_empty() {
            None
        } else {
            Some(tokens.join(" "))
        }
    }

    /// An id or class forces an explicit wrapper element even for the default tag.
    pub fn needs_block_element(&self) -> bool {
        self.id().is_some() || !self.class_tokens().is_empty()
    }
}

/// Options a host passes when registering the paragraph format dropdown.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginOptions {
    #[serde(default = "default_formats", alias = "paragraphFormatExtended")]
    pub formats: Vec<Format>,
    #[serde(default, alias = "paragraphFormatExtendedSelection")]
    pub show_selection: bool,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            show_selection: false,
        }
    }
}

/// Built-in dropdown entries.
pub fn default_formats() -> Vec<Format> {
    vec![
        Format::titled("Normal"),
        Format::titled("Heading 1").with_tag("h1"),
        Format::titled("Heading 2").with_tag("h2"),
        Format::titled("Heading 3").with_tag("h3"),
        Format::titled("Heading 4").with_tag("h4"),
        Format::titled("Header 4 bordered")
            .with_tag("h4")
            .with_class("fr-text-bordered"),
        Format::titled("Code").with_tag("pre"),
    ]
}
