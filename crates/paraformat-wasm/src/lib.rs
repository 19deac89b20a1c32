use paraformat_core::{DocumentAccess, ElementFormat, Format, PluginOptions, RewriteError};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Node};

/// Content tags that make a block non-empty without any text.
const CONTENT_SELECTOR: &str = "img, hr, iframe, input, video, audio, canvas";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplyResult {
    replaced: usize,
    unwrapped: usize,
    merged: usize,
    temporary_blocks_removed: usize,
}

/// The live editable area of a host editor.
struct DomDocument {
    root: Element,
    document: web_sys::Document,
    default_tag: Option<String>,
}

impl DomDocument {
    fn new(root: Element, default_tag: Option<String>) -> Result<Self, JsValue> {
        let document = root
            .owner_document()
            .ok_or_else(|| JsValue::from_str("editor root is not attached to a document"))?;
        Ok(Self {
            root,
            document,
            default_tag: default_tag.filter(|tag| !tag.trim().is_empty()),
        })
    }
}

fn host_error(operation: &'static str) -> impl Fn(JsValue) -> RewriteError {
    move |err| {
        let message = err.as_string().unwrap_or_else(|| format!("{:?}", err));
        RewriteError::host(operation, message)
    }
}

impl DocumentAccess for DomDocument {
    type Element = Element;
    type Node = Node;

    fn default_block_tag(&self) -> Option<String> {
        self.default_tag.clone()
    }

    fn tag_name(&self, element: &Element) -> String {
        element.tag_name().to_ascii_lowercase()
    }

    fn parent(&self, element: &Element) -> Option<Element> {
        if element == &self.root {
            None
        } else {
            element.parent_element()
        }
    }

    fn is_empty(&self, element: &Element, ignore_whitespace: bool) -> bool {
        if matches!(element.query_selector(CONTENT_SELECTOR), Ok(Some(_))) {
            return false;
        }
        let text = element.text_content().unwrap_or_default();
        if ignore_whitespace {
            text.trim().is_empty()
        } else {
            text.is_empty()
        }
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn attributes_excluding_format(&self, element: &Element) -> Vec<(String, String)> {
        element
            .get_attribute_names()
            .iter()
            .filter_map(|name| name.as_string())
            .filter(|name| name != "id" && name != "class")
            .filter_map(|name| {
                let value = element.get_attribute(&name)?;
                Some((name, value))
            })
            .collect()
    }

    fn child_nodes(&self, element: &Element) -> Vec<Node> {
        let children = element.child_nodes();
        (0..children.length())
            .filter_map(|index| children.item(index))
            .collect()
    }

    fn as_element(&self, node: &Node) -> Option<Element> {
        node.dyn_ref::<Element>().cloned()
    }

    fn as_node(&self, element: &Element) -> Node {
        let node: &Node = element.as_ref();
        node.clone()
    }

    fn next_element_sibling(&self, element: &Element) -> Option<Element> {
        element.next_element_sibling()
    }

    fn elements_by_tag(&self, tag: &str) -> Vec<Element> {
        let found = self.root.get_elements_by_tag_name(tag);
        (0..found.length())
            .filter_map(|index| found.item(index))
            .collect()
    }

    fn create_element(&mut self, tag: &str) -> Result<Element, RewriteError> {
        self.document
            .create_element(tag)
            .map_err(host_error("create_element"))
    }

    fn set_attribute(
        &mut self,
        element: &Element,
        name: &str,
        value: &str,
    ) -> Result<(), RewriteError> {
        element
            .set_attribute(name, value)
            .map_err(host_error("set_attribute"))
    }

    fn remove_attribute(&mut self, element: &Element, name: &str) -> Result<(), RewriteError> {
        element
            .remove_attribute(name)
            .map_err(host_error("remove_attribute"))
    }

    fn append_child(&mut self, parent: &Element, node: &Node) -> Result<(), RewriteError> {
        parent
            .append_child(node)
            .map(|_| ())
            .map_err(host_error("append_child"))
    }

    fn insert_before(
        &mut self,
        parent: &Element,
        node: &Node,
        reference: &Node,
    ) -> Result<(), RewriteError> {
        parent
            .insert_before(node, Some(reference))
            .map(|_| ())
            .map_err(host_error("insert_before"))
    }

    fn replace_element(
        &mut self,
        element: &Element,
        replacement: &Element,
    ) -> Result<(), RewriteError> {
        if element.parent_node().is_none() {
            return Err(RewriteError::Detached {
                tag: self.tag_name(element),
            });
        }
        element
            .replace_with_with_node_1(replacement)
            .map_err(host_error("replace_element"))
    }

    fn remove_element(&mut self, element: &Element) -> Result<(), RewriteError> {
        element.remove();
        Ok(())
    }
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn options_from_js(value: JsValue) -> Result<PluginOptions, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(PluginOptions::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(to_js_error)
}

fn block_format(block: Option<Element>) -> Result<Option<ElementFormat>, JsValue> {
    let Some(block) = block else {
        return Ok(None);
    };
    let doc = DomDocument::new(block.clone(), None)?;
    Ok(Some(doc.element_format(&block)))
}

/// Canonical key of a format object (`{tag, id, class}`).
#[wasm_bindgen]
pub fn encode(format: JsValue) -> Result<String, JsValue> {
    let format: Format = serde_wasm_bindgen::from_value(format).map_err(to_js_error)?;
    Ok(paraformat_core::encode(&format).into_string())
}

/// Format object for a key. Never fails on malformed keys.
#[wasm_bindgen]
pub fn decode(format_id: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&paraformat_core::decode(format_id)).map_err(to_js_error)
}

/// Built-in options: the dropdown entries and `showSelection: false`.
#[wasm_bindgen(js_name = defaultOptions)]
pub fn default_options() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&PluginOptions::default()).map_err(to_js_error)
}

/// Applies the format behind `format_id` to the selection blocks inside `root`.
///
/// The host saves and restores the selection around this call.
#[wasm_bindgen(js_name = applyFormat)]
pub fn apply_format(
    root: Element,
    blocks: js_sys::Array,
    format_id: &str,
    default_tag: Option<String>,
) -> Result<JsValue, JsValue> {
    let blocks: Vec<Element> = blocks
        .iter()
        .filter_map(|value| value.dyn_into::<Element>().ok())
        .collect();
    let format = paraformat_core::decode(format_id);
    let mut doc = DomDocument::new(root, default_tag)?;

    let report = paraformat_core::apply(&mut doc, &format, &blocks).map_err(to_js_error)?;
    let temporary_blocks_removed =
        paraformat_core::unwrap_temporary_blocks(&mut doc).map_err(to_js_error)?;

    let result = ApplyResult {
        replaced: report.replaced,
        unwrapped: report.unwrapped,
        merged: report.merged,
        temporary_blocks_removed,
    };
    serde_wasm_bindgen::to_value(&result).map_err(to_js_error)
}

/// Keys of every format the block matches; the dropdown highlights entries with these keys.
#[wasm_bindgen(js_name = activeFormatIds)]
pub fn active_format_ids(
    block: Option<Element>,
    default_tag: Option<String>,
) -> Result<JsValue, JsValue> {
    let block = block_format(block)?;
    let ids: Vec<String> =
        paraformat_core::element_format_ids(block.as_ref(), default_tag.as_deref())
            .into_iter()
            .map(|id| id.into_string())
            .collect();
    serde_wasm_bindgen::to_value(&ids).map_err(to_js_error)
}

/// Toolbar button text for the block, or `undefined` when the button keeps its icon.
#[wasm_bindgen(js_name = selectionLabel)]
pub fn selection_label(
    options: JsValue,
    block: Option<Element>,
    default_tag: Option<String>,
) -> Result<Option<String>, JsValue> {
    let options = options_from_js(options)?;
    let block = block_format(block)?;
    let ids = paraformat_core::element_format_ids(block.as_ref(), default_tag.as_deref());
    Ok(paraformat_core::selection_label(&options, &ids))
}
