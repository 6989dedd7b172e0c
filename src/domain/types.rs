use serde::Deserialize;
use std::path::PathBuf;
use std::time::SystemTime;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContentBlock {
    Thinking { text: String },
    Text { text: String },
    ToolUse { name: String, input: String },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Message {
    User { text: String },
    ToolResults { results: Vec<String> },
    Assistant { blocks: Vec<ContentBlock> },
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SessionTranscript {
    pub messages: Vec<Message>,
    pub warnings: usize,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReadOptions {
    pub include_thinking: bool,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RenderFlags {
    pub thinking: bool,
    pub tools: bool,
}

// One row of the global ~/.claude/history.jsonl log. Every field is
// defaulted so a sparse record still scans.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct HistoryEntry {
    #[serde(default)]
    pub timestamp: i64,

    #[serde(rename = "sessionId", default)]
    pub session_id: String,

    #[serde(default)]
    pub display: String,

    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectListing {
    pub key: String,
    pub path: PathBuf,
    pub session_count: usize,
    pub last_modified: Option<SystemTime>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionListing {
    pub id: String,
    pub modified: Option<SystemTime>,
    pub size_kib: u64,
    pub preview: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionHit {
    pub log_path: PathBuf,
    pub project_key: String,
}
