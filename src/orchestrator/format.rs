use pulldown_cmark::{html, Options, Parser};

/// Renders a finished reply (markdown, fenced code, tables) to HTML.
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(text, options);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Escapes user text for display, keeping line breaks.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push_str("<br>");
        }
        // Writing into a String cannot fail.
        let _ = pulldown_cmark_escape::escape_html(&mut out, line);
    }
    out
}
