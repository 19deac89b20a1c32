//! Block substitution: converts the blocks touched by a selection to a target format.
//!
//! Each selected block is classified by its structural context and rewritten by that
//! context's policy. Afterwards, `<pre>` blocks created side by side by the same call are
//! merged into one.

use crate::dom::{DocumentAccess, TABLE_CELL_TAGS};
use crate::error::RewriteError;
use crate::format::Format;

/// Marks a wrapper synthesized because the host has no default block tag.
pub const TEMP_BLOCK_ATTR: &str = "data-temp-block";
/// Marks a synthesized wrapper whose source block had no content.
pub const EMPTY_ATTR: &str = "data-empty";

pub(crate) const TEMP_BLOCK_TAG: &str = "div";
const PRE_TAG: &str = "pre";
const LIST_ITEM_TAG: &str = "li";
const TABLE_STRUCTURE_TAGS: &[&str] = &["table", "thead", "tbody", "tfoot", "tr", "td", "th"];

/// Structural position of a block, read from its own tag and its parent's.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockContext {
    Plain,
    ListItem,
    ListItemChild,
    TableCellChild,
}

impl BlockContext {
    pub fn classify(tag: &str, parent_tag: Option<&str>) -> Self {
        if tag.eq_ignore_ascii_case(LIST_ITEM_TAG) {
            return BlockContext::ListItem;
        }
        match parent_tag.map(str::to_ascii_lowercase).as_deref() {
            Some(LIST_ITEM_TAG) => BlockContext::ListItemChild,
            Some(parent) if TABLE_CELL_TAGS.contains(&parent) => BlockContext::TableCellChild,
            _ => BlockContext::Plain,
        }
    }
}

/// What one `apply` call changed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RewriteReport {
    /// Blocks replaced or wrapped by a new element.
    pub replaced: usize,
    /// Blocks flattened into their parent.
    pub unwrapped: usize,
    /// `<pre>` siblings folded into their predecessor.
    pub merged: usize,
}

enum Substitution<E> {
    Replaced(E),
    Unwrapped,
    Unchanged,
}

struct Target<'a> {
    format: &'a Format,
    tag: Option<String>,
    default_tag: Option<String>,
    needs_block: bool,
}

impl Target<'_> {
    fn is_default_tag(&self) -> bool {
        self.tag == self.default_tag
    }

    /// The default tag without id or class means "Normal": nothing to wrap.
    fn is_plain_default(&self) -> bool {
        self.is_default_tag() && !self.needs_block
    }

    /// List items are left as they are, so they never hide selected blocks inside them.
    fn keeps_list_items(&self) -> bool {
        (self.tag.is_none() || self.is_default_tag()) && !self.needs_block
    }
}

/// Applies `format` to the selection block set `blocks`.
///
/// List containers and table structure are never rewritten themselves. A block below
/// another block of the set (or below a replacement made earlier in the same call) is
/// skipped; list containers and table cells end that ancestry, so nested list items and
/// cell content are handled on their own.
pub fn apply<D: DocumentAccess>(
    doc: &mut D,
    format: &Format,
    blocks: &[D::Element],
) -> Result<RewriteReport, RewriteError> {
    let default_tag = doc
        .default_block_tag()
        .map(|tag| tag.trim().to_ascii_lowercase())
        .filter(|tag| !tag.is_empty());
    let target = Target {
        format,
        tag: format.tag().or_else(|| default_tag.clone()),
        default_tag,
        needs_block: format.needs_block_element(),
    };
    tracing::debug!(
        tag = ?target.tag,
        needs_block = target.needs_block,
        blocks = blocks.len(),
        "applying paragraph format"
    );

    let original_pres = doc.elements_by_tag(PRE_TAG);
    let mut handled: Vec<D::Element> = blocks
        .iter()
        .filter(|block| !(target.keeps_list_items() && doc.tag_name(block) == LIST_ITEM_TAG))
        .cloned()
        .collect();
    let mut report = RewriteReport::default();

    for (index, block) in blocks.iter().enumerate() {
        if blocks[..index].contains(block) || is_structural(doc, block) {
            continue;
        }
        if is_shadowed(doc, block, &handled) {
            tracing::trace!(?block, "skipping block nested in a handled block");
            continue;
        }

        let tag = doc.tag_name(block);
        let parent = doc
            .parent(block)
            .ok_or_else(|| RewriteError::Detached { tag: tag.clone() })?;
        let context = BlockContext::classify(&tag, Some(&doc.tag_name(&parent)));
        tracing::trace!(?block, ?context, "substituting block");

        let outcome = match context {
            BlockContext::Plain => substitute_plain(doc, block, &target)?,
            BlockContext::ListItem => substitute_list_item(doc, block, &target)?,
            BlockContext::ListItemChild => substitute_list_item_child(doc, block, &target)?,
            BlockContext::TableCellChild => substitute_table_cell_child(doc, block, &target)?,
        };

        match outcome {
            Substitution::Replaced(replacement) => {
                assign_format_attrs(doc, &replacement, target.format)?;
                handled.push(replacement);
                report.replaced += 1;
            }
            Substitution::Unwrapped => report.unwrapped += 1,
            Substitution::Unchanged => {}
        }
    }

    report.merged = merge_adjacent_pre(doc, &original_pres)?;
    tracing::debug!(?report, "paragraph format applied");
    Ok(report)
}

fn is_structural<D: DocumentAccess>(doc: &D, element: &D::Element) -> bool {
    doc.is_list_container(element)
        || TABLE_STRUCTURE_TAGS.contains(&doc.tag_name(element).as_str())
}

fn is_shadowed<D: DocumentAccess>(doc: &D, block: &D::Element, handled: &[D::Element]) -> bool {
    let mut current = doc.parent(block);
    while let Some(ancestor) = current {
        if is_structural(doc, &ancestor) {
            return false;
        }
        if handled.contains(&ancestor) {
            return true;
        }
        current = doc.parent(&ancestor);
    }
    false
}

/// Full overwrite: a format without id or class strips the attribute.
fn assign_format_attrs<D: DocumentAccess>(
    doc: &mut D,
    element: &D::Element,
    format: &Format,
) -> Result<(), RewriteError> {
    match format.class_attr() {
        Some(class) => doc.set_attribute(element, "class", &class)?,
        None => doc.remove_attribute(element, "class")?,
    }
    match format.id() {
        Some(id) => doc.set_attribute(element, "id", id),
        None => doc.remove_attribute(element, "id"),
    }
}

/// New element in the target tag, or a marked neutral wrapper when there is no tag at all.
fn create_block<D: DocumentAccess>(
    doc: &mut D,
    source: &D::Element,
    target: &Target<'_>,
) -> Result<D::Element, RewriteError> {
    match target.tag.as_deref() {
        Some(tag) => doc.create_element(tag),
        None => {
            let empty = doc.is_empty(source, true);
            let wrapper = doc.create_element(TEMP_BLOCK_TAG)?;
            doc.set_attribute(&wrapper, TEMP_BLOCK_ATTR, "true")?;
            if empty {
                doc.set_attribute(&wrapper, EMPTY_ATTR, "true")?;
            }
            Ok(wrapper)
        }
    }
}

/// "Normal" over a bare default-tag block: the block already is what a replacement would be.
fn already_plain<D: DocumentAccess>(doc: &D, block: &D::Element, target: &Target<'_>) -> bool {
    let Some(tag) = target.tag.as_deref() else {
        return false;
    };
    let bare = |name: &str| doc.attribute(block, name).is_none_or(|value| value.trim().is_empty());
    target.is_plain_default() && doc.tag_name(block) == tag && bare("id") && bare("class")
}

fn substitute_plain<D: DocumentAccess>(
    doc: &mut D,
    block: &D::Element,
    target: &Target<'_>,
) -> Result<Substitution<D::Element>, RewriteError> {
    if already_plain(doc, block, target) {
        return Ok(Substitution::Unchanged);
    }
    let replacement = create_block(doc, block, target)?;
    for (name, value) in doc.attributes_excluding_format(block) {
        doc.set_attribute(&replacement, &name, &value)?;
    }
    doc.move_children(block, &replacement)?;
    doc.replace_element(block, &replacement)?;
    Ok(Substitution::Replaced(replacement))
}

fn substitute_list_item<D: DocumentAccess>(
    doc: &mut D,
    item: &D::Element,
    target: &Target<'_>,
) -> Result<Substitution<D::Element>, RewriteError> {
    if target.keeps_list_items() {
        return Ok(Substitution::Unchanged);
    }

    let children = doc.child_nodes(item);
    let is_list = |doc: &D, node: &D::Node| {
        doc.as_element(node)
            .is_some_and(|element| doc.is_list_container(&element))
    };
    let wrapper = create_block(doc, item, target)?;
    let wrapper_node = doc.as_node(&wrapper);

    match children.iter().position(|child| is_list(&*doc, child)) {
        // A nested list stays a direct child of the item; only the content before it moves.
        Some(list_index) => {
            doc.insert_before(item, &wrapper_node, &children[0])?;
            for child in &children[..list_index] {
                doc.append_child(&wrapper, child)?;
            }
        }
        None => {
            doc.move_children(item, &wrapper)?;
            doc.append_child(item, &wrapper_node)?;
        }
    }
    Ok(Substitution::Replaced(wrapper))
}

fn substitute_list_item_child<D: DocumentAccess>(
    doc: &mut D,
    block: &D::Element,
    target: &Target<'_>,
) -> Result<Substitution<D::Element>, RewriteError> {
    if target.is_plain_default() {
        doc.unwrap_element(block)?;
        return Ok(Substitution::Unwrapped);
    }
    substitute_plain(doc, block, target)
}

fn substitute_table_cell_child<D: DocumentAccess>(
    doc: &mut D,
    block: &D::Element,
    target: &Target<'_>,
) -> Result<Substitution<D::Element>, RewriteError> {
    if target.is_plain_default() {
        // Keeps the flattened content on its own line inside the cell.
        if !doc.is_empty(block, true) {
            doc.append_line_break(block)?;
        }
        doc.unwrap_element(block)?;
        return Ok(Substitution::Unwrapped);
    }
    substitute_plain(doc, block, target)
}

/// Folds each `<pre>` created by this call into a directly preceding `<pre>` that was also
/// created by it. `<pre>` elements present before the call never take part.
fn merge_adjacent_pre<D: DocumentAccess>(
    doc: &mut D,
    original: &[D::Element],
) -> Result<usize, RewriteError> {
    let mut merged = 0;
    for pre in doc.elements_by_tag(PRE_TAG) {
        if original.contains(&pre) || doc.parent(&pre).is_none() {
            continue;
        }
        while let Some(next) = doc.next_element_sibling(&pre) {
            if doc.tag_name(&next) != PRE_TAG || original.contains(&next) {
                break;
            }
            tracing::debug!(?pre, ?next, "merging adjacent pre blocks");
            doc.append_line_break(&pre)?;
            doc.move_children(&next, &pre)?;
            doc.remove_element(&next)?;
            merged += 1;
        }
    }
    Ok(merged)
}
