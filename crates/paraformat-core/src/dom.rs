//! The document-access contract a host editor provides to the rewriter.
//!
//! Reads are infallible. Mutations may be refused by the host and report
//! [`RewriteError::Host`]. Nodes handed to `append_child`/`insert_before` are moved, not copied.

use std::fmt;

use crate::active::ElementFormat;
use crate::error::RewriteError;

pub const LIST_CONTAINER_TAGS: &[&str] = &["ul", "ol"];
pub const TABLE_CELL_TAGS: &[&str] = &["td", "th"];
pub const LINE_BREAK_TAG: &str = "br";
/// Elements that start a new line on their own.
pub const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figure", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "nav", "ol", "p", "pre",
    "section", "table", "ul",
];

pub trait DocumentAccess {
    /// Handle to an element. Equality is identity.
    type Element: Clone + PartialEq + fmt::Debug;
    /// Handle to any child node (element or text).
    type Node: Clone;

    /// Configured fallback block tag, `None` when the host works without one.
    fn default_block_tag(&self) -> Option<String>;

    /// Lowercased tag name.
    fn tag_name(&self, element: &Self::Element) -> String;

    fn parent(&self, element: &Self::Element) -> Option<Self::Element>;

    fn is_list_container(&self, element: &Self::Element) -> bool {
        LIST_CONTAINER_TAGS.contains(&self.tag_name(element).as_str())
    }

    fn is_empty(&self, element: &Self::Element, ignore_whitespace: bool) -> bool;

    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

    /// Every attribute except `id` and `class`, in document order.
    fn attributes_excluding_format(&self, element: &Self::Element) -> Vec<(String, String)>;

    fn child_nodes(&self, element: &Self::Element) -> Vec<Self::Node>;

    fn as_element(&self, node: &Self::Node) -> Option<Self::Element>;

    fn as_node(&self, element: &Self::Element) -> Self::Node;

    fn next_element_sibling(&self, element: &Self::Element) -> Option<Self::Element>;

    /// Elements with `tag` inside the editable root, in document order.
    fn elements_by_tag(&self, tag: &str) -> Vec<Self::Element>;

    fn create_element(&mut self, tag: &str) -> Result<Self::Element, RewriteError>;

    fn set_attribute(
        &mut self,
        element: &Self::Element,
        name: &str,
        value: &str,
    ) -> Result<(), RewriteError>;

    fn remove_attribute(&mut self, element: &Self::Element, name: &str)
    -> Result<(), RewriteError>;

    fn append_child(&mut self, parent: &Self::Element, node: &Self::Node)
    -> Result<(), RewriteError>;

    fn insert_before(
        &mut self,
        parent: &Self::Element,
        node: &Self::Node,
        reference: &Self::Node,
    ) -> Result<(), RewriteError>;

    /// Puts `replacement` where `element` was and detaches `element`.
    fn replace_element(
        &mut self,
        element: &Self::Element,
        replacement: &Self::Element,
    ) -> Result<(), RewriteError>;

    fn remove_element(&mut self, element: &Self::Element) -> Result<(), RewriteError>;

    /// Replaces `element` by its own children.
    fn unwrap_element(&mut self, element: &Self::Element) -> Result<(), RewriteError> {
        let parent = self
            .parent(element)
            .ok_or_else(|| RewriteError::Detached {
                tag: self.tag_name(element),
            })?;
        let anchor = self.as_node(element);
        for child in self.child_nodes(element) {
            self.insert_before(&parent, &child, &anchor)?;
        }
        self.remove_element(element)
    }

    /// Moves every child of `from` to the end of `to`.
    fn move_children(
        &mut self,
        from: &Self::Element,
        to: &Self::Element,
    ) -> Result<(), RewriteError> {
        for child in self.child_nodes(from) {
            self.append_child(to, &child)?;
        }
        Ok(())
    }

    fn append_line_break(&mut self, parent: &Self::Element) -> Result<(), RewriteError> {
        let line_break = self.create_element(LINE_BREAK_TAG)?;
        let node = self.as_node(&line_break);
        self.append_child(parent, &node)
    }

    /// Tag, id and class as the active-state queries read them.
    fn element_format(&self, element: &Self::Element) -> ElementFormat {
        ElementFormat {
            tag: self.tag_name(element),
            id: self.attribute(element, "id"),
            class: self.attribute(element, "class"),
        }
    }
}
