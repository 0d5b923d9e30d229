//! Full-page HTML wrappers around rendered markdown.

use std::fmt::Display;
use std::path::Path;

const STYLESHEET: &str = r"
    :root {
        --preview-background: #ffffff;
        --preview-foreground: #24292f;
        --preview-muted: #57606a;
        --preview-border: #d0d7de;
        --preview-code-background: #f6f8fa;
        --preview-link: #0969da;
        --preview-button: #007acc;
        --preview-button-hover: #0062a3;
    }
    body {
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
        font-size: 16px;
        line-height: 1.5;
        word-wrap: break-word;
        color: var(--preview-foreground);
        background-color: var(--preview-background);
        margin: 0;
        padding: 20px;
    }
    .container { max-width: 100%; margin: 0 auto; }
    .header {
        border-bottom: 1px solid var(--preview-border);
        padding-bottom: 16px;
        margin-bottom: 24px;
        display: flex;
        justify-content: space-between;
        align-items: center;
    }
    .readme-name { font-size: 18px; font-weight: 600; }
    .refresh-btn {
        background-color: var(--preview-button);
        color: white;
        border: none;
        padding: 8px 16px;
        border-radius: 6px;
        cursor: pointer;
        font-size: 14px;
    }
    .refresh-btn:hover { background-color: var(--preview-button-hover); }
    .file-path {
        font-size: 14px;
        color: var(--preview-muted);
        margin-bottom: 16px;
        text-align: center;
    }
    .content img { max-width: 100%; height: auto; border-radius: 6px; margin: 16px 0; }
    .content h1, .content h2, .content h3 {
        border-bottom: 1px solid var(--preview-border);
        padding-bottom: 0.3em;
    }
    .content a { color: var(--preview-link); }
    .content code {
        background-color: var(--preview-code-background);
        padding: 0.2em 0.4em;
        border-radius: 6px;
        font-size: 85%;
    }
    .content pre {
        background-color: var(--preview-code-background);
        border: 1px solid var(--preview-border);
        border-radius: 6px;
        padding: 16px;
        overflow: auto;
    }
    .content pre code { padding: 0; background: transparent; }
    .content blockquote {
        color: var(--preview-muted);
        border-left: 0.25em solid var(--preview-border);
        margin: 0;
        padding: 0 1em;
    }
    .content hr { border: 0; height: 0.25em; background-color: var(--preview-border); }
";

const SCRIPT: &str = r"
    function refreshPreview() {
        window.parent.postMessage({ command: 'refresh' }, '*');
    }
";

fn file_name(file: &Path) -> String {
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Title shown on the display surface for `file`.
pub fn panel_title(file: &Path) -> String {
    format!("README Preview - {}", file_name(file))
}

/// Wrap a rendered markdown fragment in the preview page.
///
/// The page carries a header with the file name and a refresh button that
/// posts `{"command":"refresh"}` back to the host, followed by the full path.
pub fn render_page(file: &Path, body_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>README Preview</title>
    <style>{STYLESHEET}</style>
</head>
<body>
    <div class="container">
        <div class="header">
            <div class="readme-name">{name}</div>
            <button class="refresh-btn" onclick="refreshPreview()">Refresh</button>
        </div>
        <div class="file-path">{path}</div>
        <div class="content">
            {body_html}
        </div>
    </div>
    <script>{SCRIPT}</script>
</body>
</html>
"#,
        name = file_name(file),
        path = file.display(),
    )
}

/// Minimal page shown when the README could not be read.
pub fn render_error_page(error: impl Display) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>README Preview - Error</title>
</head>
<body>
    <div style="font-family: Arial, sans-serif; padding: 20px;">
        <h2>Error loading README</h2>
        <p>Could not read the README file: {error}</p>
    </div>
</body>
</html>
"#
    )
}
