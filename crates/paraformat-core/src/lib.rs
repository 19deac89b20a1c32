mod active;
mod codec;
mod dom;
mod error;
mod format;
mod rewrite;
mod tree;
mod unwrap;

pub use active::{
    ElementFormat, NO_MATCH_LABEL, active_formats, element_format_ids, selection_label,
};
pub use codec::{FormatId, decode, encode};
pub use dom::{BLOCK_TAGS, DocumentAccess, LIST_CONTAINER_TAGS, TABLE_CELL_TAGS};
pub use error::{RewriteError, TreeError};
pub use format::{ClassList, Format, PluginOptions, default_formats};
pub use rewrite::{BlockContext, EMPTY_ATTR, RewriteReport, TEMP_BLOCK_ATTR, apply};
pub use tree::{Document, NodeId, SELECTED_ATTR};
pub use unwrap::unwrap_temporary_blocks;
