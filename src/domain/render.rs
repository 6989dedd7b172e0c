use crate::domain::{ContentBlock, Message, RenderFlags};
use crate::domain::parse::truncate_chars;
use std::io::{self, Write};
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

pub const TOOL_PREVIEW_CHARS: usize = 200;

const DISPLAY_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

// Timestamps are converted to calendar form for display only; ordering
// always follows file/log order.
pub fn format_system_time(value: Option<SystemTime>) -> String {
    value
        .map(OffsetDateTime::from)
        .and_then(|stamp| stamp.format(&DISPLAY_FORMAT).ok())
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_epoch_ms(ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .ok()
        .and_then(|stamp| stamp.format(&DISPLAY_FORMAT).ok())
        .unwrap_or_else(|| "-".to_string())
}

// Writes the terminal rendition of a transcript. Pure with respect to the
// message slice; the only effect is the writes on `out`.
pub fn render_transcript(
    out: &mut impl Write,
    messages: &[Message],
    flags: RenderFlags,
) -> io::Result<()> {
    for message in messages {
        match message {
            Message::User { text } => {
                writeln!(out)?;
                writeln!(out, "{}", "=".repeat(60))?;
                writeln!(out, "USER:")?;
                writeln!(out, "{text}")?;
            }
            Message::ToolResults { results } => {
                if !flags.tools {
                    continue;
                }
                for result in results {
                    writeln!(out)?;
                    writeln!(
                        out,
                        "[tool_result: {}...]",
                        truncate_chars(result, TOOL_PREVIEW_CHARS)
                    )?;
                }
            }
            Message::Assistant { blocks } => {
                for block in blocks {
                    match block {
                        ContentBlock::Thinking { text } => {
                            if !flags.thinking {
                                continue;
                            }
                            writeln!(out)?;
                            writeln!(out, "<thinking>")?;
                            writeln!(out, "{text}")?;
                            writeln!(out, "</thinking>")?;
                        }
                        ContentBlock::Text { text } => {
                            writeln!(out)?;
                            writeln!(out, "{}", "-".repeat(60))?;
                            writeln!(out, "ASSISTANT:")?;
                            writeln!(out, "{text}")?;
                        }
                        ContentBlock::ToolUse { name, input } => {
                            if !flags.tools {
                                continue;
                            }
                            writeln!(out)?;
                            writeln!(out, "[tool: {name}]")?;
                            writeln!(out, "{}", truncate_chars(input, TOOL_PREVIEW_CHARS))?;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(messages: &[Message], flags: RenderFlags) -> String {
        let mut out = Vec::new();
        render_transcript(&mut out, messages, flags).expect("render");
        String::from_utf8(out).expect("utf8")
    }

    fn sample_assistant() -> Message {
        Message::Assistant {
            blocks: vec![
                ContentBlock::Thinking {
                    text: "weighing options".to_string(),
                },
                ContentBlock::Text {
                    text: "here is the plan".to_string(),
                },
            ],
        }
    }

    #[test]
    fn thinking_is_hidden_unless_flagged() {
        let messages = vec![sample_assistant()];

        let plain = render(&messages, RenderFlags::default());
        assert!(!plain.contains("weighing options"));
        assert!(plain.contains("here is the plan"));

        let with_thinking = render(
            &messages,
            RenderFlags {
                thinking: true,
                tools: false,
            },
        );
        assert!(with_thinking.contains("<thinking>"));
        assert!(with_thinking.contains("weighing options"));
        assert!(with_thinking.contains("here is the plan"));
    }

    #[test]
    fn tool_output_is_hidden_unless_flagged() {
        let messages = vec![
            Message::ToolResults {
                results: vec!["file contents".to_string()],
            },
            Message::Assistant {
                blocks: vec![ContentBlock::ToolUse {
                    name: "Bash".to_string(),
                    input: "{\n  \"cmd\": \"ls\"\n}".to_string(),
                }],
            },
        ];

        let plain = render(&messages, RenderFlags::default());
        assert!(plain.is_empty());

        let with_tools = render(
            &messages,
            RenderFlags {
                thinking: false,
                tools: true,
            },
        );
        assert!(with_tools.contains("[tool_result: file contents...]"));
        assert!(with_tools.contains("[tool: Bash]"));
    }

    #[test]
    fn long_tool_results_are_preview_truncated() {
        let long = "x".repeat(500);
        let messages = vec![Message::ToolResults {
            results: vec![long.clone()],
        }];
        let rendered = render(
            &messages,
            RenderFlags {
                thinking: false,
                tools: true,
            },
        );
        assert!(rendered.contains(&"x".repeat(TOOL_PREVIEW_CHARS)));
        assert!(!rendered.contains(&"x".repeat(TOOL_PREVIEW_CHARS + 1)));
    }

    #[test]
    fn epoch_millis_format_as_calendar_minutes() {
        // 2026-01-15T12:30:00Z
        assert_eq!(format_epoch_ms(1_768_480_200_000), "2026-01-15 12:30");
        assert_eq!(format_system_time(None), "-");
    }

    #[test]
    fn user_messages_render_under_a_rule() {
        let messages = vec![Message::User {
            text: "hello there".to_string(),
        }];
        let rendered = render(&messages, RenderFlags::default());
        assert!(rendered.contains(&"=".repeat(60)));
        assert!(rendered.contains("USER:\nhello there\n"));
    }
}
