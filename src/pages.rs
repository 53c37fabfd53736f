//! Minimal server-rendered HTML pages
//!
//! Page styling is deliberately out of scope; these templates carry just
//! enough structure for the flows to be usable and testable.

use pulldown_cmark::{html, Options, Parser};

use crate::db::{TranscriptionRecord, UserRecord};
use crate::flash::Flash;
use crate::session::Session;

/// Escape text for safe interpolation into HTML
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

fn nav(session: Option<&Session>) -> String {
    match session {
        Some(session) => format!(
            r#"<nav><a href="/">Home</a> <a href="/workshop">Workshop</a> <a href="/dashboard">Dashboard</a> <a href="/profile">Profile</a>{admin} <a href="/logout">Log out ({name})</a></nav>"#,
            admin = if session.is_admin {
                r#" <a href="/admin">Admin</a>"#
            } else {
                ""
            },
            name = escape_html(&session.name),
        ),
        None => r#"<nav><a href="/">Home</a> <a href="/workshop">Workshop</a> <a href="/pricing">Pricing</a> <a href="/login">Log in</a> <a href="/register">Register</a></nav>"#.to_string(),
    }
}

fn flash_banner(flash: Option<&Flash>) -> String {
    match flash {
        Some(flash) => format!(
            r#"<div class="notice notice-{}" role="alert">{}</div>"#,
            flash.level.as_str(),
            escape_html(&flash.message)
        ),
        None => String::new(),
    }
}

/// Shared page shell
pub fn layout(title: &str, flash: Option<&Flash>, session: Option<&Session>, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} - Audio Scribe</title></head>
<body>
{nav}
{banner}
<main>
{body}
</main>
</body>
</html>"#,
        title = escape_html(title),
        nav = nav(session),
        banner = flash_banner(flash),
        body = body,
    )
}

pub fn index(flash: Option<&Flash>, session: Option<&Session>) -> String {
    layout(
        "Home",
        flash,
        session,
        "<h1>Audio Scribe</h1>\
         <p>Upload or record audio, get a transcript and an AI-written summary.</p>\
         <p><a href=\"/workshop\">Open the workshop</a></p>",
    )
}

pub fn pricing(flash: Option<&Flash>, session: Option<&Session>) -> String {
    layout(
        "Pricing",
        flash,
        session,
        "<h1>Pricing</h1>\
         <p>The free trial includes one transcription. Paid plans are coming soon.</p>",
    )
}

pub fn register(flash: Option<&Flash>) -> String {
    layout(
        "Register",
        flash,
        None,
        r#"<h1>Create an account</h1>
<form method="post" action="/register">
  <label>Name <input type="text" name="name" required></label>
  <label>Email <input type="email" name="email" required></label>
  <label>Password <input type="password" name="password" required></label>
  <button type="submit">Register</button>
</form>"#,
    )
}

pub fn login(flash: Option<&Flash>) -> String {
    layout(
        "Log in",
        flash,
        None,
        r#"<h1>Log in</h1>
<form method="post" action="/login">
  <label>Email <input type="email" name="email" required></label>
  <label>Password <input type="password" name="password" required></label>
  <button type="submit">Log in</button>
</form>"#,
    )
}

pub fn workshop(flash: Option<&Flash>, session: Option<&Session>) -> String {
    layout(
        "Workshop",
        flash,
        session,
        r#"<h1>Transcription workshop</h1>
<form method="post" action="/file_upload" enctype="multipart/form-data">
  <label>Audio file <input type="file" name="file" accept="audio/*"></label>
  <button type="submit">Transcribe</button>
</form>
<p>Or record in the browser; the recording is submitted as a base64
<code>recorded_audio</code> field on the same form.</p>"#,
    )
}

pub fn dashboard(
    flash: Option<&Flash>,
    session: &Session,
    transcriptions: &[TranscriptionRecord],
) -> String {
    let mut rows = String::new();
    for t in transcriptions {
        rows.push_str(&format!(
            r#"<tr><td><a href="/transcription/{id}">{filename}</a></td><td>{created}</td></tr>"#,
            id = t.id,
            filename = escape_html(&t.filename),
            created = t.created_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    let body = if transcriptions.is_empty() {
        "<h1>Dashboard</h1><p>No saved transcriptions yet. \
         <a href=\"/workshop\">Create one in the workshop.</a></p>"
            .to_string()
    } else {
        format!(
            r#"<h1>Dashboard</h1>
<table>
<thead><tr><th>File</th><th>Created</th></tr></thead>
<tbody>{rows}</tbody>
</table>"#
        )
    };
    layout("Dashboard", flash, Some(session), &body)
}

/// Render the model's markdown summary to HTML
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Result page for both fresh and saved transcriptions. The summary is
/// markdown from the model, rendered to HTML; the raw transcript sits behind
/// a disclosure element, escaped.
pub fn result(
    flash: Option<&Flash>,
    session: Option<&Session>,
    summary: &str,
    raw_text: &str,
) -> String {
    let body = format!(
        r#"<h1>Summary</h1>
<article class="summary">{summary}</article>
<details>
  <summary>Raw transcription</summary>
  <pre>{raw}</pre>
</details>"#,
        summary = render_markdown(summary),
        raw = escape_html(raw_text),
    );
    layout("Result", flash, session, &body)
}

pub fn profile(flash: Option<&Flash>, session: &Session) -> String {
    let body = format!(
        r#"<h1>Profile</h1>
<p>Email: {email}</p>
<p>Transcriptions used: {usage}</p>
<form method="post" action="/update_profile">
  <label>Name <input type="text" name="name" value="{name}" required></label>
  <button type="submit">Save</button>
</form>"#,
        email = escape_html(&session.email),
        usage = session.usage_count,
        name = escape_html(&session.name),
    );
    layout("Profile", flash, Some(session), &body)
}

pub fn admin(flash: Option<&Flash>, session: &Session, users: &[UserRecord]) -> String {
    let mut rows = String::new();
    for user in users {
        rows.push_str(&format!(
            r#"<tr><td>{name}</td><td>{email}</td><td>{usage}</td><td>{admin}</td>
<td><form method="post" action="/admin/toggle_admin/{id}"><button type="submit">{action}</button></form></td></tr>"#,
            name = escape_html(&user.name),
            email = escape_html(&user.email),
            usage = user.usage_count,
            admin = if user.is_admin { "yes" } else { "no" },
            id = user.id,
            action = if user.is_admin {
                "Revoke admin"
            } else {
                "Make admin"
            },
        ));
    }
    let body = format!(
        r#"<h1>Admin</h1>
<table>
<thead><tr><th>Name</th><th>Email</th><th>Usage</th><th>Admin</th><th></th></tr></thead>
<tbody>{rows}</tbody>
</table>"#
    );
    layout("Admin", flash, Some(session), &body)
}
