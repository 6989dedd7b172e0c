use crate::domain::{
    ContentBlock, HistoryEntry, Message, ProjectListing, SessionListing, format_epoch_ms,
    format_system_time, truncate_chars,
};
use crate::infra::PREVIEW_CHARS;

const TOOL_RESULT_HTML_CHARS: usize = 500;
const TOOL_INPUT_HTML_CHARS: usize = 1000;
const SEARCH_DISPLAY_CHARS: usize = 150;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

pub fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title} - Claude History</title>
<style>
  * {{ box-sizing: border-box; }}
  body {{ font-family: -apple-system, "Segoe UI", Roboto, sans-serif; max-width: 900px;
         margin: 0 auto; padding: 1rem; background: #fafafa; color: #333; }}
  a {{ color: #0066cc; text-decoration: none; }}
  a:hover {{ text-decoration: underline; }}
  nav {{ margin-bottom: 1.5rem; padding-bottom: 1rem; border-bottom: 1px solid #ddd;
        display: flex; gap: 1rem; align-items: center; }}
  nav .title {{ font-weight: 600; margin-right: auto; }}
  .search-form input {{ padding: 0.4rem 0.6rem; border: 1px solid #ccc; border-radius: 4px; }}
  .search-form button {{ padding: 0.4rem 0.8rem; background: #0066cc; color: white;
                        border: none; border-radius: 4px; cursor: pointer; }}
  ul.listing {{ list-style: none; padding: 0; }}
  ul.listing li {{ padding: 0.75rem; background: white; margin-bottom: 0.5rem;
                  border-radius: 6px; border: 1px solid #e0e0e0; }}
  .meta {{ color: #666; font-size: 0.85rem; margin-left: 0.5rem; }}
  .preview {{ color: #888; font-size: 0.9rem; margin-top: 0.25rem; }}
  .breadcrumb {{ font-size: 0.9rem; color: #666; margin-bottom: 1rem; }}
  .breadcrumb a {{ color: #666; }}
  .message {{ margin-bottom: 1.5rem; padding: 1rem; border-radius: 8px; }}
  .message.user {{ background: #e3f2fd; border-left: 4px solid #2196f3; }}
  .message.assistant {{ background: white; border-left: 4px solid #4caf50; }}
  .message-label {{ font-weight: 600; font-size: 0.8rem; text-transform: uppercase;
                   margin-bottom: 0.5rem; color: #666; }}
  .message-content {{ white-space: pre-wrap; word-wrap: break-word; }}
  details {{ margin-top: 0.5rem; padding: 0.5rem; background: #f5f5f5; border-radius: 4px; }}
  details summary {{ cursor: pointer; font-size: 0.85rem; color: #666; }}
  details pre {{ margin: 0.5rem 0 0; font-size: 0.8rem; overflow-x: auto; }}
  .controls {{ margin-bottom: 1rem; padding: 0.75rem; background: white; border-radius: 6px;
              border: 1px solid #e0e0e0; display: flex; gap: 1.5rem; }}
  .controls label {{ display: flex; align-items: center; gap: 0.4rem; cursor: pointer;
                    font-size: 0.9rem; }}
  .thinking-block, .tool-block {{ display: none; }}
  .show-thinking .thinking-block {{ display: block; }}
  .show-tools .tool-block {{ display: block; }}
</style>
</head>
<body>
<nav>
  <span class="title"><a href="/">Claude History</a></span>
  <form class="search-form" action="/search" method="get">
    <input type="text" name="q" placeholder="Search history...">
    <button type="submit">Search</button>
  </form>
</nav>
{content}
</body>
</html>"#
    )
}

pub fn projects_page(projects: &[ProjectListing]) -> String {
    let mut items = String::new();
    for project in projects {
        items.push_str(&format!(
            r#"<li><a href="/project/{key}">{path}</a><span class="meta">({count} sessions)</span></li>
"#,
            key = escape_html(&project.key),
            path = escape_html(&project.path.display().to_string()),
            count = project.session_count,
        ));
    }
    layout(
        "Projects",
        &format!("<h1>Projects</h1>\n<ul class=\"listing\">\n{items}</ul>"),
    )
}

pub fn sessions_page(project_path: &str, sessions: &[SessionListing]) -> String {
    let mut items = String::new();
    for session in sessions {
        let ellipsis = if session.preview.chars().count() >= PREVIEW_CHARS {
            "..."
        } else {
            ""
        };
        items.push_str(&format!(
            r#"<li><a href="/session/{id}">{short}</a><span class="meta">{date} &middot; {size} KB</span>
<div class="preview">{preview}{ellipsis}</div></li>
"#,
            id = escape_html(&session.id),
            short = escape_html(&short_id(&session.id)),
            date = format_system_time(session.modified),
            size = session.size_kib,
            preview = escape_html(&session.preview),
        ));
    }
    layout(
        project_path,
        &format!(
            r#"<div class="breadcrumb"><a href="/">Projects</a> / {path}</div>
<h1>Sessions</h1>
<ul class="listing">
{items}</ul>"#,
            path = escape_html(project_path),
        ),
    )
}

pub fn session_page(session_id: &str, messages: &[Message]) -> String {
    let rendered = messages
        .iter()
        .map(render_message_html)
        .collect::<String>();
    let body = format!(
        r#"<div class="breadcrumb"><a href="/">Projects</a> / Session {short}</div>
<h1>Conversation</h1>
<div class="controls">
  <label><input type="checkbox" id="toggle-thinking"> Show thinking</label>
  <label><input type="checkbox" id="toggle-tools"> Show tool calls</label>
</div>
<div id="messages">
{rendered}</div>
<script>
  const container = document.getElementById('messages');
  document.getElementById('toggle-thinking').addEventListener('change', (e) => {{
    container.classList.toggle('show-thinking', e.target.checked);
  }});
  document.getElementById('toggle-tools').addEventListener('change', (e) => {{
    container.classList.toggle('show-tools', e.target.checked);
  }});
</script>"#,
        short = escape_html(&short_id(session_id)),
    );
    layout(&format!("Session {}", short_id(session_id)), &body)
}

fn render_message_html(message: &Message) -> String {
    match message {
        Message::User { text } => format!(
            r#"<div class="message user">
<div class="message-label">User</div>
<div class="message-content">{}</div>
</div>
"#,
            escape_html(text)
        ),
        Message::ToolResults { results } => {
            let blocks = results
                .iter()
                .map(|result| {
                    format!(
                        r#"<details class="tool-block"><summary>Tool Result</summary>
<pre><code>{}</code></pre></details>
"#,
                        escape_html(truncate_chars(result, TOOL_RESULT_HTML_CHARS))
                    )
                })
                .collect::<String>();
            format!("<div class=\"message user tool-block\">\n{blocks}</div>\n")
        }
        Message::Assistant { blocks } => {
            let rendered = blocks
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => {
                        format!(
                            "<div class=\"message-content\">{}</div>\n",
                            escape_html(text)
                        )
                    }
                    ContentBlock::Thinking { text } => format!(
                        r#"<details class="thinking-block"><summary>Thinking</summary>
<pre><code>{}</code></pre></details>
"#,
                        escape_html(text)
                    ),
                    ContentBlock::ToolUse { name, input } => format!(
                        r#"<details class="tool-block"><summary>Tool: {}</summary>
<pre><code>{}</code></pre></details>
"#,
                        escape_html(name),
                        escape_html(truncate_chars(input, TOOL_INPUT_HTML_CHARS))
                    ),
                })
                .collect::<String>();
            format!(
                r#"<div class="message assistant">
<div class="message-label">Assistant</div>
{rendered}</div>
"#
            )
        }
    }
}

pub fn search_form_page() -> String {
    layout("Search", "<h1>Search</h1><p>Enter a search term.</p>")
}

pub fn search_page(query: &str, entries: &[HistoryEntry]) -> String {
    let mut items = String::new();
    for entry in entries {
        items.push_str(&format!(
            r#"<li><a href="/session/{id}">{short}</a><span class="meta">{date}</span>
<div class="preview">{display}</div></li>
"#,
            id = escape_html(&entry.session_id),
            short = escape_html(&short_id(&entry.session_id)),
            date = format_epoch_ms(entry.timestamp),
            display = escape_html(truncate_chars(&entry.display, SEARCH_DISPLAY_CHARS)),
        ));
    }
    layout(
        &format!("Search: {query}"),
        &format!(
            r#"<h1>Search: "{query}"</h1>
<p>{count} results</p>
<ul class="listing">
{items}</ul>"#,
            query = escape_html(query),
            count = entries.len(),
        ),
    )
}

pub fn not_found_page(what: &str) -> String {
    layout("Not Found", &format!("<h1>{}</h1>", escape_html(what)))
}

pub fn error_page(message: &str) -> String {
    layout("Error", &format!("<h1>Error</h1><p>{}</p>", escape_html(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html_metacharacters() {
        assert_eq!(
            escape_html(r#"<b>&"quoted"</b>"#),
            "&lt;b&gt;&amp;&quot;quoted&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn session_page_marks_thinking_and_tool_blocks() {
        let messages = vec![
            Message::User {
                text: "hi".to_string(),
            },
            Message::Assistant {
                blocks: vec![
                    ContentBlock::Thinking {
                        text: "pondering".to_string(),
                    },
                    ContentBlock::Text {
                        text: "answer".to_string(),
                    },
                    ContentBlock::ToolUse {
                        name: "Bash".to_string(),
                        input: "{}".to_string(),
                    },
                ],
            },
        ];
        let page = session_page("aaaa1111-2222", &messages);
        assert!(page.contains("Session aaaa1111"));
        assert!(page.contains("class=\"thinking-block\""));
        assert!(page.contains("pondering"));
        assert!(page.contains("Tool: Bash"));
        assert!(page.contains("answer"));
    }

    #[test]
    fn search_page_escapes_the_query() {
        let page = search_page("<script>alert(1)</script>", &[]);
        assert!(!page.contains("<script>alert"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn sessions_page_appends_ellipsis_only_when_truncated() {
        let full = SessionListing {
            id: "aaaa".to_string(),
            modified: None,
            size_kib: 1,
            preview: "p".repeat(PREVIEW_CHARS),
        };
        let short = SessionListing {
            id: "bbbb".to_string(),
            modified: None,
            size_kib: 1,
            preview: "short".to_string(),
        };
        let page = sessions_page("/home/user/code", &[full, short]);
        assert!(page.contains(&format!("{}...", "p".repeat(PREVIEW_CHARS))));
        assert!(page.contains("short</div>"));
        assert!(!page.contains("short...</div>"));
    }
}
