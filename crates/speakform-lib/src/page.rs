//! HTML rendering of the submission form.

use std::fmt::Write;

use speakform_core::state::SubmissionView;

/// Render the full page for a view, with `text` kept in the textarea.
pub fn render(view: &SubmissionView, text: &str) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str(HEAD);

    html.push_str(r#"<form method="post" action="/submit" enctype="multipart/form-data">"#);
    let _ = write!(
        html,
        r#"<textarea name="text" rows="12" placeholder="Speaker 1: ...&#10;Speaker 2: ...">{}</textarea>"#,
        escape(text)
    );
    html.push_str(r#"<label>or upload a text file <input type="file" name="file" accept=".txt,text/plain"></label>"#);
    if view.submit_enabled {
        html.push_str(r#"<button type="submit">Generate audio</button>"#);
    } else {
        html.push_str(r#"<button type="submit" disabled>Processing...</button>"#);
    }
    html.push_str("</form>");

    if let Some(message) = &view.notification {
        let _ = write!(html, r#"<p class="notice" role="alert">{}</p>"#, escape(message));
    }

    if let Some(url) = &view.audio_url {
        let url = escape(url);
        let _ = write!(
            html,
            r#"<section class="result"><audio controls src="{url}"></audio><a href="{url}" download>Download audio</a></section>"#
        );
    }

    html.push_str("</main></body></html>");
    html
}

const HEAD: &str = r#"<!doctype html><html lang="en"><head><meta charset="utf-8"><title>speakform</title><style>body{font-family:sans-serif;max-width:48rem;margin:2rem auto}textarea{width:100%}.notice{color:#a40000}.result{margin-top:1rem;display:flex;gap:1rem;align-items:center}</style></head><body><main><h1>Text to speech</h1>"#;

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
