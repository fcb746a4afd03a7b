//! HTML status page

use crate::build::{Build, BuildStatus};
use std::fmt::Write;
use std::sync::Arc;

const STYLE: &str = r#"table { width: 100%; }
      th, td { text-align: left; }
      body { font-family: "Source Code Pro", monospace; font-size: 14pt; }"#;

/// Render the index page listing `builds` in the order given, each with
/// the status it was ranked by
pub fn render_index(builds: &[(Arc<Build>, BuildStatus)]) -> String {
    let version = env!("CARGO_PKG_VERSION");

    let mut rows = String::new();
    for (build, status) in builds {
        let _ = write!(
            rows,
            r#"<tr><td><a href="/build/{id}/log">{id}</a></td><td>{repo}</td><td>{created}</td><td>{status}</td></tr>"#,
            id = build.id(),
            repo = escape(&build.repository().to_string()),
            created = build.created_at().format("%Y-%m-%d %H:%M:%S UTC"),
            status = status,
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>Buildy v{version}</title>
    <style>
      {STYLE}
    </style>
  </head>
  <body>
    <h1>Buildy v{version}</h1>
    <table>
      <tr><th>id</th><th>repository</th><th>created</th><th>status</th></tr>
      {rows}
    </table>
  </body>
</html>
"#
    )
}

/// Escape text for HTML element content and attribute values
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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
