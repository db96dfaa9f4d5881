use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Where the summary goes
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Stdout,
    File(&'a Path),
}

/// Write the summary, optionally as a standalone HTML document.
pub async fn write_summary(summary: &str, target: Target<'_>, html: bool, title: &str) -> Result<()> {
    let rendered = if html {
        render_html(summary, title)
    } else {
        format!("{}\n", summary.trim_end())
    };

    match target {
        Target::Stdout => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(rendered.as_bytes())
                .await
                .context("Failed to write summary to stdout")?;
            stdout.flush().await.context("Failed to flush stdout")?;
        }
        Target::File(path) => {
            tokio::fs::write(path, rendered.as_bytes())
                .await
                .with_context(|| format!("Failed to write summary to {}", path.display()))?;
            info!(path = %path.display(), bytes = rendered.len(), "summary written");
        }
    }
    Ok(())
}

/// Render bullet lines (`-`, `*`, `•`) as a list and every other non-empty line as a paragraph.
pub fn render_html(summary: &str, title: &str) -> String {
    let mut body = String::new();
    let mut in_list = false;

    for line in summary.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match bullet_text(line) {
            Some(item) => {
                if !in_list {
                    body.push_str("<ul>\n");
                    in_list = true;
                }
                body.push_str(&format!("  <li>{}</li>\n", escape(item)));
            }
            None => {
                if in_list {
                    body.push_str("</ul>\n");
                    in_list = false;
                }
                body.push_str(&format!("<p>{}</p>\n", escape(line)));
            }
        }
    }
    if in_list {
        body.push_str("</ul>\n");
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n",
        title = escape(title),
        body = body,
    )
}

fn bullet_text(line: &str) -> Option<&str> {
    ["- ", "* ", "\u{2022} "]
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
        .map(str::trim)
}

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
