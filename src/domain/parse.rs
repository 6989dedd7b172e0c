use crate::domain::{ContentBlock, Message, ReadOptions};
use serde_json::Value;

pub fn parse_message(value: &Value, opts: ReadOptions) -> Option<Message> {
    match value.get("type").and_then(|v| v.as_str()) {
        Some("user") => parse_user_message(value),
        Some("assistant") => parse_assistant_message(value, opts),
        // Unknown discriminators are skipped so newer record kinds in the
        // store do not break older readers.
        _ => None,
    }
}

fn message_content(value: &Value) -> &Value {
    value
        .get("message")
        .and_then(|m| m.get("content"))
        .unwrap_or(&Value::Null)
}

fn parse_user_message(value: &Value) -> Option<Message> {
    let content = message_content(value);

    if let Some(text) = content.as_str() {
        return Some(Message::User {
            text: text.to_string(),
        });
    }

    // Tool results come back as user records carrying `tool_result` blocks.
    let items = content.as_array()?;
    let results = items
        .iter()
        .filter(|block| block.get("type").and_then(|v| v.as_str()) == Some("tool_result"))
        .map(format_tool_result)
        .collect::<Vec<_>>();
    if results.is_empty() {
        return None;
    }
    Some(Message::ToolResults { results })
}

fn parse_assistant_message(value: &Value, opts: ReadOptions) -> Option<Message> {
    let items = message_content(value).as_array()?;

    let mut blocks = Vec::new();
    for block in items {
        match block.get("type").and_then(|v| v.as_str()) {
            Some("thinking") if opts.include_thinking => {
                let text = block
                    .get("thinking")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();
                blocks.push(ContentBlock::Thinking { text });
            }
            Some("text") => {
                let text = block
                    .get("text")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();
                blocks.push(ContentBlock::Text { text });
            }
            Some("tool_use") => {
                let name = block
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();
                let input = block.get("input").unwrap_or(&Value::Null);
                let input =
                    serde_json::to_string_pretty(input).unwrap_or_else(|_| input.to_string());
                blocks.push(ContentBlock::ToolUse { name, input });
            }
            _ => {}
        }
    }

    if blocks.is_empty() {
        return None;
    }
    Some(Message::Assistant { blocks })
}

fn format_tool_result(block: &Value) -> String {
    // Prefer plain string content; structured results fall back to pretty JSON.
    let content = block.get("content").unwrap_or(&Value::Null);
    if let Some(text) = content.as_str() {
        return text.to_string();
    }
    serde_json::to_string_pretty(content).unwrap_or_else(|_| content.to_string())
}

pub fn parse_user_text(value: &Value) -> Option<String> {
    if value.get("type").and_then(|v| v.as_str()) != Some("user") {
        return None;
    }
    message_content(value).as_str().map(|text| text.to_string())
}

pub fn collapse_preview(text: &str, budget: usize) -> String {
    text.chars()
        .take(budget)
        .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
        .collect()
}

pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(include_thinking: bool) -> ReadOptions {
        ReadOptions { include_thinking }
    }

    #[test]
    fn user_string_content_becomes_user_message() {
        let value = serde_json::json!({
            "type": "user",
            "message": { "content": "fix the tests" }
        });
        assert_eq!(
            parse_message(&value, opts(false)),
            Some(Message::User {
                text: "fix the tests".to_string()
            })
        );
    }

    #[test]
    fn user_list_without_tool_results_is_dropped() {
        let value = serde_json::json!({
            "type": "user",
            "message": { "content": [ { "type": "text", "text": "inline" } ] }
        });
        assert_eq!(parse_message(&value, opts(false)), None);
    }

    #[test]
    fn user_list_with_tool_results_collects_them() {
        let value = serde_json::json!({
            "type": "user",
            "message": { "content": [
                { "type": "tool_result", "tool_use_id": "t1", "content": "ok" },
                { "type": "text", "text": "ignored" },
                { "type": "tool_result", "content": { "lines": 3 } }
            ] }
        });
        let Some(Message::ToolResults { results }) = parse_message(&value, opts(false)) else {
            panic!("expected tool results");
        };
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], "ok");
        assert!(results[1].contains("\"lines\": 3"));
    }

    #[test]
    fn assistant_thinking_requires_opt_in() {
        let value = serde_json::json!({
            "type": "assistant",
            "message": { "content": [
                { "type": "thinking", "thinking": "hmm" },
                { "type": "text", "text": "done" }
            ] }
        });

        let Some(Message::Assistant { blocks }) = parse_message(&value, opts(false)) else {
            panic!("expected assistant message");
        };
        assert_eq!(
            blocks,
            vec![ContentBlock::Text {
                text: "done".to_string()
            }]
        );

        let Some(Message::Assistant { blocks }) = parse_message(&value, opts(true)) else {
            panic!("expected assistant message");
        };
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            ContentBlock::Thinking {
                text: "hmm".to_string()
            }
        );
    }

    #[test]
    fn assistant_with_no_qualifying_blocks_is_dropped() {
        let value = serde_json::json!({
            "type": "assistant",
            "message": { "content": [ { "type": "thinking", "thinking": "hidden" } ] }
        });
        assert_eq!(parse_message(&value, opts(false)), None);
    }

    #[test]
    fn assistant_tool_use_keeps_name_and_pretty_input() {
        let value = serde_json::json!({
            "type": "assistant",
            "message": { "content": [
                { "type": "tool_use", "id": "toolu_1", "name": "Bash", "input": { "cmd": "ls" } }
            ] }
        });
        let Some(Message::Assistant { blocks }) = parse_message(&value, opts(false)) else {
            panic!("expected assistant message");
        };
        let ContentBlock::ToolUse { name, input } = &blocks[0] else {
            panic!("expected tool use");
        };
        assert_eq!(name, "Bash");
        assert!(input.contains("\"cmd\": \"ls\""));
    }

    #[test]
    fn unknown_record_types_are_skipped() {
        let value = serde_json::json!({ "type": "file-history-snapshot" });
        assert_eq!(parse_message(&value, opts(true)), None);
    }

    #[test]
    fn preview_collapses_newlines_and_truncates() {
        assert_eq!(collapse_preview("one\ntwo\r\nthree", 100), "one two  three");
        assert_eq!(collapse_preview("abcdef", 3), "abc");
    }

    #[test]
    fn truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
