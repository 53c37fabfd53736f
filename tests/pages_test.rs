use audio_scribe::pages::{render_markdown, result};

#[test]
fn markdown_headings_and_lists_become_html() {
    let html = render_markdown("# Action items\n\n- follow up with Alex\n- send notes");

    assert!(html.contains("<h1>Action items</h1>"));
    assert!(html.contains("<li>follow up with Alex</li>"));
}

#[test]
fn result_page_renders_summary_as_formatted_html() {
    let page = result(None, None, "## Key points\n\nShip it.", "raw words");

    assert!(page.contains("<h2>Key points</h2>"));
    // The markdown syntax itself must not leak through as literal text
    assert!(!page.contains("## Key points"));
}

#[test]
fn result_page_escapes_raw_transcript() {
    let page = result(None, None, "summary", "<script>alert(1)</script>");

    assert!(page.contains("&lt;script&gt;"));
    assert!(!page.contains("<script>alert(1)</script>"));
}
