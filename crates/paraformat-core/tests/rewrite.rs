use std::error::Error;

use paraformat_core::{
    ClassList, Document, DocumentAccess, Format, RewriteError, RewriteReport, apply,
    unwrap_temporary_blocks,
};
use pretty_assertions::assert_eq;

fn run(fragment: &str, format: &Format) -> Result<(String, RewriteReport), Box<dyn Error>> {
    let mut doc = Document::from_xhtml(fragment)?;
    let blocks = doc.selection().to_vec();
    let report = apply(&mut doc, format, &blocks)?;
    Ok((doc.to_html(), report))
}

fn normal() -> Format {
    Format::titled("Normal")
}

fn tagged(tag: &str) -> Format {
    Format::new().with_tag(tag)
}

#[test]
fn normal_over_normal_paragraph_changes_nothing() -> Result<(), Box<dyn Error>> {
    let (html, report) = run("<p data-selected=\"\">Hello</p>", &normal())?;
    assert_eq!(html, "<p>Hello</p>");
    assert_eq!(report, RewriteReport::default());
    Ok(())
}

#[test]
fn heading_replaces_paragraph_and_keeps_other_attributes() -> Result<(), Box<dyn Error>> {
    let (html, report) = run(
        "<p data-selected=\"\" data-x=\"1\" class=\"old\" id=\"old\">Hi <b>there</b></p>",
        &tagged("h1"),
    )?;
    assert_eq!(html, "<h1 data-x=\"1\">Hi <b>there</b></h1>");
    assert_eq!(report.replaced, 1);
    Ok(())
}

#[test]
fn format_id_and_class_overwrite_existing_ones() -> Result<(), Box<dyn Error>> {
    let format = tagged("h2").with_id("z").with_class("b a");
    let (html, _) = run("<p data-selected=\"\" id=\"a\" class=\"c\">x</p>", &format)?;
    assert_eq!(html, "<h2 class=\"a b\" id=\"z\">x</h2>");
    Ok(())
}

#[test]
fn class_on_default_tag_still_rewrites() -> Result<(), Box<dyn Error>> {
    let format = Format::new().with_class("note");
    let (html, report) = run("<p data-selected=\"\">x</p>", &format)?;
    assert_eq!(html, "<p class=\"note\">x</p>");
    assert_eq!(report.replaced, 1);
    Ok(())
}

#[test]
fn block_already_in_target_format_is_rebuilt_in_place() -> Result<(), Box<dyn Error>> {
    let format = tagged("h4").with_class(ClassList::Tokens(vec!["b".into(), "a".into()]));
    let (html, report) = run("<h4 data-selected=\"\" class=\"a b\">x</h4>", &format)?;
    assert_eq!(html, "<h4 class=\"a b\">x</h4>");
    assert_eq!(report.replaced, 1);
    Ok(())
}

#[test]
fn normal_on_list_item_is_a_no_op() -> Result<(), Box<dyn Error>> {
    let (html, report) = run("<ul><li data-selected=\"\">item</li></ul>", &normal())?;
    assert_eq!(html, "<ul><li>item</li></ul>");
    assert_eq!(report, RewriteReport::default());
    Ok(())
}

#[test]
fn heading_wraps_list_item_content() -> Result<(), Box<dyn Error>> {
    let (html, report) = run(
        "<ul><li data-selected=\"\">item <i>one</i></li></ul>",
        &tagged("h2"),
    )?;
    assert_eq!(html, "<ul><li><h2>item <i>one</i></h2></li></ul>");
    assert_eq!(report.replaced, 1);
    Ok(())
}

#[test]
fn nested_list_stays_a_direct_child_of_the_item() -> Result<(), Box<dyn Error>> {
    let (html, _) = run(
        "<ul><li data-selected=\"\">text<ul><li>inner</li></ul></li></ul>",
        &tagged("h2"),
    )?;
    assert_eq!(html, "<ul><li><h2>text</h2><ul><li>inner</li></ul></li></ul>");
    Ok(())
}

#[test]
fn nested_list_items_are_formatted_independently() -> Result<(), Box<dyn Error>> {
    let (html, report) = run(
        "<ul><li data-selected=\"\">a<ul><li data-selected=\"\">b</li></ul></li></ul>",
        &tagged("h3"),
    )?;
    assert_eq!(
        html,
        "<ul><li><h3>a</h3><ul><li><h3>b</h3></li></ul></li></ul>"
    );
    assert_eq!(report.replaced, 2);
    Ok(())
}

#[test]
fn list_container_is_never_reformatted() -> Result<(), Box<dyn Error>> {
    let (html, report) = run(
        "<ol data-selected=\"\"><li data-selected=\"\">a</li><li data-selected=\"\">b</li></ol>",
        &tagged("h2"),
    )?;
    assert_eq!(html, "<ol><li><h2>a</h2></li><li><h2>b</h2></li></ol>");
    assert_eq!(report.replaced, 2);
    Ok(())
}

#[test]
fn class_on_default_tag_wraps_list_item_content() -> Result<(), Box<dyn Error>> {
    let format = Format::new().with_class("x");
    let (html, report) = run("<ul><li data-selected=\"\">item</li></ul>", &format)?;
    assert_eq!(html, "<ul><li><p class=\"x\">item</p></li></ul>");
    assert_eq!(report.replaced, 1);
    Ok(())
}

#[test]
fn normal_unwraps_child_when_its_list_item_is_selected_too() -> Result<(), Box<dyn Error>> {
    let (html, report) = run(
        "<ul><li data-selected=\"\"><h2 data-selected=\"\">t</h2></li></ul>",
        &normal(),
    )?;
    assert_eq!(html, "<ul><li>t</li></ul>");
    assert_eq!(report.unwrapped, 1);
    assert_eq!(report.replaced, 0);
    Ok(())
}

#[test]
fn class_on_default_tag_replaces_list_item_child() -> Result<(), Box<dyn Error>> {
    let format = Format::new().with_class("x");
    let (html, report) = run("<ul><li><h2 data-selected=\"\">t</h2></li></ul>", &format)?;
    assert_eq!(html, "<ul><li><p class=\"x\">t</p></li></ul>");
    assert_eq!(report.replaced, 1);
    assert_eq!(report.unwrapped, 0);
    Ok(())
}

#[test]
fn normal_unwraps_list_item_child() -> Result<(), Box<dyn Error>> {
    let (html, report) = run("<ul><li><h2 data-selected=\"\">t</h2></li></ul>", &normal())?;
    assert_eq!(html, "<ul><li>t</li></ul>");
    assert_eq!(report.unwrapped, 1);
    Ok(())
}

#[test]
fn list_item_child_takes_new_tag() -> Result<(), Box<dyn Error>> {
    let (html, report) = run("<ul><li><h2 data-selected=\"\">t</h2></li></ul>", &tagged("h3"))?;
    assert_eq!(html, "<ul><li><h3>t</h3></li></ul>");
    assert_eq!(report.replaced, 1);
    Ok(())
}

#[test]
fn table_cell_child_unwrap_keeps_line_separation() -> Result<(), Box<dyn Error>> {
    let (html, report) = run(
        "<table><tbody><tr><td><h2 data-selected=\"\">a</h2>b</td></tr></tbody></table>",
        &normal(),
    )?;
    assert_eq!(
        html,
        "<table><tbody><tr><td>a<br>b</td></tr></tbody></table>"
    );
    assert_eq!(report.unwrapped, 1);
    Ok(())
}

#[test]
fn empty_table_cell_child_unwraps_without_break() -> Result<(), Box<dyn Error>> {
    let (html, _) = run(
        "<table><tr><th><p data-selected=\"\" class=\"x\"> </p></th></tr></table>",
        &normal(),
    )?;
    assert_eq!(html, "<table><tr><th> </th></tr></table>");
    Ok(())
}

#[test]
fn id_on_default_tag_replaces_table_cell_child() -> Result<(), Box<dyn Error>> {
    let format = Format::new().with_id("cell");
    let (html, report) = run(
        "<table><tr><td><h2 data-selected=\"\">a</h2>b</td></tr></table>",
        &format,
    )?;
    assert_eq!(html, "<table><tr><td><p id=\"cell\">a</p>b</td></tr></table>");
    assert_eq!(report.replaced, 1);
    assert_eq!(report.unwrapped, 0);
    Ok(())
}

#[test]
fn table_cell_child_takes_new_tag() -> Result<(), Box<dyn Error>> {
    let (html, _) = run(
        "<table><tr><td><p data-selected=\"\">a</p></td></tr></table>",
        &tagged("pre"),
    )?;
    assert_eq!(html, "<table><tr><td><pre>a</pre></td></tr></table>");
    Ok(())
}

#[test]
fn adjacent_new_pre_blocks_merge() -> Result<(), Box<dyn Error>> {
    let (html, report) = run(
        "<p data-selected=\"\">one</p><p data-selected=\"\">two</p><p data-selected=\"\">three</p>",
        &tagged("pre"),
    )?;
    assert_eq!(html, "<pre>one<br>two<br>three</pre>");
    assert_eq!(report.replaced, 3);
    assert_eq!(report.merged, 2);
    Ok(())
}

#[test]
fn existing_pre_is_not_merged() -> Result<(), Box<dyn Error>> {
    let (html, report) = run(
        "<pre>old</pre><p data-selected=\"\">new</p>",
        &tagged("pre"),
    )?;
    assert_eq!(html, "<pre>old</pre><pre>new</pre>");
    assert_eq!(report.merged, 0);
    Ok(())
}

#[test]
fn selected_existing_pre_blocks_merge() -> Result<(), Box<dyn Error>> {
    let (html, report) = run(
        "<pre data-selected=\"\">a</pre><pre data-selected=\"\">b</pre>",
        &tagged("pre"),
    )?;
    assert_eq!(html, "<pre>a<br>b</pre>");
    assert_eq!(report.replaced, 2);
    assert_eq!(report.merged, 1);
    Ok(())
}

#[test]
fn selected_pre_merges_with_following_paragraph() -> Result<(), Box<dyn Error>> {
    let (html, report) = run(
        "<pre data-selected=\"\">A</pre><p data-selected=\"\">B</p>",
        &tagged("pre"),
    )?;
    assert_eq!(html, "<pre>A<br>B</pre>");
    assert_eq!(report.merged, 1);
    Ok(())
}

#[test]
fn pre_blocks_do_not_merge_across_an_intervening_block() -> Result<(), Box<dyn Error>> {
    let (html, report) = run(
        "<p data-selected=\"\">a</p><p>b</p><p data-selected=\"\">c</p>",
        &tagged("pre"),
    )?;
    assert_eq!(html, "<pre>a</pre><p>b</p><pre>c</pre>");
    assert_eq!(report.merged, 0);
    Ok(())
}

#[test]
fn outer_block_wins_over_nested_selection() -> Result<(), Box<dyn Error>> {
    let (html, report) = run(
        "<div data-selected=\"\"><p data-selected=\"\">x</p></div>",
        &tagged("h1"),
    )?;
    assert_eq!(html, "<h1><p>x</p></h1>");
    assert_eq!(report.replaced, 1);
    Ok(())
}

#[test]
fn nested_selection_reported_inner_first_is_still_deduplicated() -> Result<(), Box<dyn Error>> {
    let mut doc = Document::from_xhtml("<div><p>x</p></div>")?;
    let div = doc.find_first("div").ok_or("div")?;
    let p = doc.find_first("p").ok_or("p")?;
    let report = apply(&mut doc, &tagged("h1"), &[p, div])?;
    assert_eq!(doc.to_html(), "<h1><p>x</p></h1>");
    assert_eq!(report.replaced, 1);
    Ok(())
}

#[test]
fn repeated_block_is_processed_once() -> Result<(), Box<dyn Error>> {
    let mut doc = Document::from_xhtml("<p>x</p>")?;
    let p = doc.find_first("p").ok_or("p")?;
    let report = apply(&mut doc, &tagged("h5"), &[p, p])?;
    assert_eq!(doc.to_html(), "<h5>x</h5>");
    assert_eq!(report.replaced, 1);
    Ok(())
}

#[test]
fn missing_default_tag_creates_marked_wrappers() -> Result<(), Box<dyn Error>> {
    let mut doc = Document::from_xhtml(
        "<h1 data-selected=\"\">x</h1><h2 data-selected=\"\"><br/></h2><p>tail</p>",
    )?
    .with_default_tag(None);
    let blocks = doc.selection().to_vec();
    let report = apply(&mut doc, &normal(), &blocks)?;
    assert_eq!(report.replaced, 2);
    assert_eq!(
        doc.to_html(),
        "<div data-temp-block=\"true\">x</div>\
         <div data-temp-block=\"true\" data-empty=\"true\"><br></div><p>tail</p>"
    );

    let unwrapped = unwrap_temporary_blocks(&mut doc)?;
    assert_eq!(unwrapped, 2);
    assert_eq!(doc.to_html(), "x<br><br><p>tail</p>");
    Ok(())
}

#[test]
fn wrapper_before_a_block_element_unwraps_without_break() -> Result<(), Box<dyn Error>> {
    let mut doc = Document::from_xhtml("<h1 data-selected=\"\">x</h1><p>tail</p>")?
        .with_default_tag(None);
    let blocks = doc.selection().to_vec();
    apply(&mut doc, &normal(), &blocks)?;

    let unwrapped = unwrap_temporary_blocks(&mut doc)?;
    assert_eq!(unwrapped, 1);
    assert_eq!(doc.to_html(), "x<p>tail</p>");
    Ok(())
}

#[test]
fn detached_block_is_a_precondition_failure() -> Result<(), Box<dyn Error>> {
    let mut doc = Document::from_xhtml("<p>x</p>")?;
    let p = doc.find_first("p").ok_or("p")?;
    doc.remove_element(&p)?;
    let err = apply(&mut doc, &tagged("h1"), &[p]).expect_err("detached block");
    assert_eq!(err, RewriteError::Detached { tag: "p".into() });
    Ok(())
}

#[test]
fn sanitized_output_drops_unsafe_markup() -> Result<(), Box<dyn Error>> {
    let mut doc = Document::from_xhtml(
        "<p data-selected=\"\" onclick=\"alert(1)\" data-note=\"n\">x<script>bad()</script></p>",
    )?;
    let blocks = doc.selection().to_vec();
    apply(&mut doc, &tagged("h2").with_class("lead"), &blocks)?;
    let html = doc.to_html_sanitized();
    assert!(html.starts_with("<h2"));
    assert!(html.contains("class=\"lead\""));
    assert!(html.contains("data-note=\"n\""));
    assert!(!html.contains("onclick"));
    assert!(!html.contains("script"));
    Ok(())
}
