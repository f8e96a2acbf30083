//! Server-rendered HTML for `GET /p/{id}`.

use vanish_core::Paste;

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:800px;margin:0 auto;padding:2rem}\
.meta{display:flex;gap:2rem;font-size:.9rem;color:#666}\
pre{white-space:pre-wrap;word-wrap:break-word;background:#f6f8fa;padding:1rem}";

/// Escapes text for use in HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

/// Renders a paste that was just read.
pub fn paste_page(paste: &Paste) -> String {
    let view = paste.view();
    let id = escape_html(paste.id.as_str());

    let mut meta = String::new();
    if let Some(remaining) = view.remaining_views {
        meta.push_str(&format!(
            "<div><strong>Remaining Views:</strong> {remaining}</div>"
        ));
    }
    if let Some(expires_at) = view.expires_at {
        meta.push_str(&format!(
            "<div><strong>Expires At:</strong> <time datetime=\"{at}\">{at}</time></div>",
            at = escape_html(&expires_at)
        ));
    }

    let body = format!(
        "<h1>Paste: {id}</h1>\n<div class=\"meta\">{meta}</div>\n\
         <pre><code>{content}</code></pre>",
        content = escape_html(&view.content),
    );
    layout(&format!("Paste {}", paste.id), &body)
}

pub fn not_found_page() -> String {
    layout(
        "Paste Not Found",
        "<h1>Paste Not Found</h1>\n\
         <p>This paste does not exist, has expired, or exceeded its view limit.</p>",
    )
}

pub fn error_page() -> String {
    layout(
        "Error",
        "<h1>Error</h1>\n<p>An unexpected error occurred while retrieving the paste.</p>",
    )
}
