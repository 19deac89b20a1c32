//! In-memory editable document: an arena of element and text nodes under one editor root.
//!
//! Used wherever no live DOM exists (tests, the command line). Fragments load from
//! well-formed XHTML; elements marked `data-selected` become the selection block set.

use std::collections::HashSet;

use ammonia::Builder;

use crate::dom::DocumentAccess;
use crate::error::{RewriteError, TreeError};

pub const SELECTED_ATTR: &str = "data-selected";

const ROOT_TAG: &str = "div";
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "wbr", "col"];
/// Elements that count as content even without text.
const CONTENT_TAGS: &[&str] = &["img", "hr", "iframe", "input", "video", "audio", "canvas"];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    default_tag: Option<String>,
    selection: Vec<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document whose default block tag is `p`.
    pub fn new() -> Self {
        let root = NodeData {
            kind: NodeKind::Element {
                tag: ROOT_TAG.to_string(),
                attrs: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            default_tag: Some("p".to_string()),
            selection: Vec::new(),
        }
    }

    pub fn with_default_tag(mut self, tag: Option<&str>) -> Self {
        self.default_tag = tag.map(str::to_ascii_lowercase);
        self
    }

    /// Loads a well-formed XHTML fragment as the root's content.
    pub fn from_xhtml(fragment: &str) -> Result<Self, TreeError> {
        let wrapped = format!("<{ROOT_TAG}>{fragment}</{ROOT_TAG}>");
        let xml = roxmltree::Document::parse(&wrapped)?;
        let mut doc = Self::new();
        let root = doc.root;
        doc.load_children(xml.root_element(), root)?;
        Ok(doc)
    }

    fn load_children(
        &mut self,
        source: roxmltree::Node<'_, '_>,
        parent: NodeId,
    ) -> Result<(), TreeError> {
        for child in source.children() {
            if child.is_element() {
                let id = self.append_element(parent, child.tag_name().name());
                for attr in child.attributes() {
                    if attr.name() == SELECTED_ATTR {
                        self.selection.push(id);
                    } else {
                        self.set_attr(id, attr.name(), attr.value());
                    }
                }
                self.load_children(child, id)?;
            } else if child.is_text() {
                if let Some(text) = child.text() {
                    self.append_text(parent, text);
                }
            } else if child.is_pi() {
                return Err(TreeError::UnsupportedNode(format!(
                    "processing instruction `{}`",
                    child.pi().map(|pi| pi.target).unwrap_or_default()
                )));
            }
        }
        Ok(())
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Selection block set in document order.
    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    pub fn set_selection(&mut self, blocks: Vec<NodeId>) {
        self.selection = blocks;
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        });
        self.attach_last(parent, id);
        id
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.alloc(NodeKind::Text(text.to_string()));
        self.attach_last(parent, id);
        id
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.0].kind {
            match attrs.iter_mut().find(|(key, _)| key == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.0].kind {
            attrs.retain(|(key, _)| key != name);
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Whether `id` is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            current = parent;
        }
        current == self.root
    }

    /// First element with `tag` below the root, in document order.
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.tag(*id) == Some(tag))
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { .. } => {
                for child in &self.nodes[id.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Serializes the root's content.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in &self.nodes[self.root.0].children {
            self.write_node(*child, &mut out);
        }
        out
    }

    /// Serializes the root's content through an allow-list sanitizer.
    pub fn to_html_sanitized(&self) -> String {
        let tags: HashSet<&'static str> = [
            "a",
            "b",
            "blockquote",
            "br",
            "code",
            "div",
            "em",
            "h1",
            "h2",
            "h3",
            "h4",
            "h5",
            "h6",
            "hr",
            "i",
            "img",
            "li",
            "ol",
            "p",
            "pre",
            "s",
            "span",
            "strong",
            "sub",
            "sup",
            "table",
            "tbody",
            "td",
            "th",
            "thead",
            "tr",
            "u",
            "ul",
        ]
        .iter()
        .copied()
        .collect();

        let generic_attributes: HashSet<&'static str> = ["class", "id"].iter().copied().collect();
        let mut generic_attribute_prefixes = HashSet::new();
        generic_attribute_prefixes.insert("data-");

        Builder::new()
            .tags(tags)
            .generic_attributes(generic_attributes)
            .generic_attribute_prefixes(generic_attribute_prefixes)
            .clean(&self.to_html())
            .to_string()
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => out.push_str(&escape_html(text)),
            NodeKind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
                }
                out.push('>');
                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }
                for child in &self.nodes[id.0].children {
                    self.write_node(*child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    fn attach_last(&mut self, parent: NodeId, id: NodeId) {
        self.detach(id);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
    }

    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        out
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes[node.0].parent;
        }
        false
    }

    fn has_content(&self, id: NodeId, ignore_whitespace: bool) -> bool {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => {
                if ignore_whitespace {
                    !text.trim().is_empty()
                } else {
                    !text.is_empty()
                }
            }
            NodeKind::Element { tag, .. } => {
                if CONTENT_TAGS.contains(&tag.as_str()) {
                    return true;
                }
                self.nodes[id.0]
                    .children
                    .iter()
                    .any(|child| self.has_content(*child, ignore_whitespace))
            }
        }
    }

    fn element_or_err(&self, id: NodeId, operation: &'static str) -> Result<(), RewriteError> {
        match self.nodes.get(id.0).map(|node| &node.kind) {
            Some(NodeKind::Element { .. }) => Ok(()),
            Some(NodeKind::Text(_)) => Err(RewriteError::host(operation, "not an element")),
            None => Err(RewriteError::host(operation, "unknown node")),
        }
    }
}

impl DocumentAccess for Document {
    type Element = NodeId;
    type Node = NodeId;

    fn default_block_tag(&self) -> Option<String> {
        self.default_tag.clone()
    }

    fn tag_name(&self, element: &NodeId) -> String {
        self.tag(*element).unwrap_or_default().to_string()
    }

    fn parent(&self, element: &NodeId) -> Option<NodeId> {
        self.nodes[element.0].parent
    }

    fn is_empty(&self, element: &NodeId, ignore_whitespace: bool) -> bool {
        !self.has_content(*element, ignore_whitespace)
    }

    fn attribute(&self, element: &NodeId, name: &str) -> Option<String> {
        self.attr(*element, name).map(str::to_string)
    }

    fn attributes_excluding_format(&self, element: &NodeId) -> Vec<(String, String)> {
        match &self.nodes[element.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .filter(|(name, _)| name != "id" && name != "class")
                .cloned()
                .collect(),
            NodeKind::Text(_) => Vec::new(),
        }
    }

    fn child_nodes(&self, element: &NodeId) -> Vec<NodeId> {
        self.nodes[element.0].children.clone()
    }

    fn as_element(&self, node: &NodeId) -> Option<NodeId> {
        self.tag(*node).map(|_| *node)
    }

    fn as_node(&self, element: &NodeId) -> NodeId {
        *element
    }

    fn next_element_sibling(&self, element: &NodeId) -> Option<NodeId> {
        let parent = self.nodes[element.0].parent?;
        let siblings = &self.nodes[parent.0].children;
        let index = siblings.iter().position(|child| child == element)?;
        siblings[index + 1..]
            .iter()
            .copied()
            .find(|sibling| self.tag(*sibling).is_some())
    }

    fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.tag(*id) == Some(tag))
            .collect()
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId, RewriteError> {
        if tag.trim().is_empty() {
            return Err(RewriteError::host("create_element", "empty tag name"));
        }
        Ok(self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }))
    }

    fn set_attribute(
        &mut self,
        element: &NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), RewriteError> {
        self.element_or_err(*element, "set_attribute")?;
        self.set_attr(*element, name, value);
        Ok(())
    }

    fn remove_attribute(&mut self, element: &NodeId, name: &str) -> Result<(), RewriteError> {
        self.element_or_err(*element, "remove_attribute")?;
        self.remove_attr(*element, name);
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, node: &NodeId) -> Result<(), RewriteError> {
        self.element_or_err(*parent, "append_child")?;
        if self.is_ancestor_or_self(*node, *parent) {
            return Err(RewriteError::host("append_child", "hierarchy request"));
        }
        self.attach_last(*parent, *node);
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        node: &NodeId,
        reference: &NodeId,
    ) -> Result<(), RewriteError> {
        self.element_or_err(*parent, "insert_before")?;
        if self.is_ancestor_or_self(*node, *parent) {
            return Err(RewriteError::host("insert_before", "hierarchy request"));
        }
        if self.nodes[reference.0].parent != Some(*parent) {
            return Err(RewriteError::host(
                "insert_before",
                "reference is not a child of parent",
            ));
        }
        self.detach(*node);
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|child| child == reference)
            .unwrap_or(self.nodes[parent.0].children.len());
        self.nodes[node.0].parent = Some(*parent);
        self.nodes[parent.0].children.insert(index, *node);
        Ok(())
    }

    fn replace_element(
        &mut self,
        element: &NodeId,
        replacement: &NodeId,
    ) -> Result<(), RewriteError> {
        let parent = self.nodes[element.0]
            .parent
            .ok_or_else(|| RewriteError::Detached {
                tag: self.tag_name(element),
            })?;
        self.insert_before(&parent, replacement, element)?;
        self.detach(*element);
        Ok(())
    }

    fn remove_element(&mut self, element: &NodeId) -> Result<(), RewriteError> {
        if *element == self.root {
            return Err(RewriteError::host("remove_element", "cannot remove the root"));
        }
        self.detach(*element);
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
