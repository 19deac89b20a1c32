use crate::dom::{BLOCK_TAGS, DocumentAccess};
use crate::error::RewriteError;
use crate::rewrite::{EMPTY_ATTR, TEMP_BLOCK_ATTR, TEMP_BLOCK_TAG};

/// Dissolves the neutral wrappers `apply` creates when the host has no default block tag.
///
/// A non-empty wrapper followed by inline content gets a trailing `<br>` first, so its text
/// stays on its own line. Returns the number of wrappers removed.
pub fn unwrap_temporary_blocks<D: DocumentAccess>(doc: &mut D) -> Result<usize, RewriteError> {
    let mut count = 0;
    for wrapper in doc.elements_by_tag(TEMP_BLOCK_TAG) {
        if doc.attribute(&wrapper, TEMP_BLOCK_ATTR).is_none() || doc.parent(&wrapper).is_none() {
            continue;
        }
        let empty = doc.attribute(&wrapper, EMPTY_ATTR).is_some();
        let followed_inline = doc.next_element_sibling(&wrapper).is_some_and(|next| {
            doc.attribute(&next, TEMP_BLOCK_ATTR).is_some()
                || !BLOCK_TAGS.contains(&doc.tag_name(&next).as_str())
        });
        if !empty && followed_inline {
            doc.append_line_break(&wrapper)?;
        }
        doc.unwrap_element(&wrapper)?;
        count += 1;
    }
    tracing::debug!(count, "unwrapped temporary blocks");
    Ok(count)
}
