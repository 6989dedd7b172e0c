use crate::domain::{
    ProjectListing, ReadOptions, SessionHit, SessionListing, SessionTranscript, collapse_preview,
    decode_project_key, encode_project_path, parse_message, parse_user_text,
};
use crate::infra::HistoryPaths;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SESSION_FILE_EXT: &str = "jsonl";
pub const PREVIEW_CHARS: usize = 100;

#[derive(Clone, Debug, Default)]
pub struct ProjectScan {
    pub projects: Vec<ProjectListing>,
    pub warnings: usize,
    pub notice: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct SessionScan {
    pub sessions: Vec<SessionListing>,
    pub warnings: usize,
}

#[derive(Debug, Error)]
pub enum ResolveProjectError {
    #[error("project not found: {0}")]
    NotFound(String),
}

pub fn scan_projects(paths: &HistoryPaths) -> ProjectScan {
    let projects_dir = paths.projects_dir();
    if !projects_dir.exists() {
        return ProjectScan {
            projects: Vec::new(),
            warnings: 0,
            notice: Some(format!(
                "projects dir not found: {}",
                projects_dir.display()
            )),
        };
    }

    let Ok(entries) = fs::read_dir(&projects_dir) else {
        return ProjectScan {
            projects: Vec::new(),
            warnings: 0,
            notice: Some(format!(
                "projects dir is not readable: {}",
                projects_dir.display()
            )),
        };
    };

    let mut warnings = 0usize;
    let mut projects: Vec<ProjectListing> = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => {
                warnings += 1;
                continue;
            }
        };

        let Ok(file_type) = entry.file_type() else {
            warnings += 1;
            continue;
        };
        if !file_type.is_dir() {
            continue;
        }

        let Some(key) = entry.file_name().to_str().map(|name| name.to_string()) else {
            warnings += 1;
            continue;
        };

        let (session_count, last_modified, dir_warnings) = scan_project_dir(&entry.path());
        warnings += dir_warnings;

        projects.push(ProjectListing {
            path: PathBuf::from(decode_project_key(&key)),
            key,
            session_count,
            last_modified,
        });
    }

    // Newest activity first; projects with no sessions trail, ties break on
    // the encoded name. The same ordering backs the CLI and the web index.
    projects.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| a.key.cmp(&b.key))
    });

    ProjectScan {
        projects,
        warnings,
        notice: None,
    }
}

fn scan_project_dir(project_dir: &Path) -> (usize, Option<std::time::SystemTime>, usize) {
    let entries = match fs::read_dir(project_dir) {
        Ok(entries) => entries,
        Err(_) => return (0, None, 1),
    };

    let mut count = 0usize;
    let mut latest: Option<std::time::SystemTime> = None;
    let mut warnings = 0usize;

    for entry in entries {
        let Ok(entry) = entry else {
            warnings += 1;
            continue;
        };
        let path = entry.path();
        if !is_session_file(&path) {
            continue;
        }
        count += 1;
        if let Some(modified) = fs::metadata(&path).ok().and_then(|m| m.modified().ok()) {
            latest = Some(match latest {
                Some(current) if current >= modified => current,
                _ => modified,
            });
        }
    }

    (count, latest, warnings)
}

fn is_session_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(SESSION_FILE_EXT)
}

// Accepts the project as a workspace path or an already-encoded key; exact
// directory match first, then a substring match over encoded names.
pub fn resolve_project_dir(
    paths: &HistoryPaths,
    project: &str,
) -> Result<PathBuf, ResolveProjectError> {
    let key = if project.starts_with('/') {
        encode_project_path(project)
    } else {
        project.to_string()
    };

    let projects_dir = paths.projects_dir();
    let exact = projects_dir.join(&key);
    if exact.is_dir() {
        return Ok(exact);
    }

    let mut names = project_dir_names(&projects_dir);
    names.sort();
    for name in names {
        if name.contains(&key) {
            return Ok(projects_dir.join(name));
        }
    }

    Err(ResolveProjectError::NotFound(project.to_string()))
}

fn project_dir_names(projects_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(projects_dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_dir()))
        .filter_map(|entry| entry.file_name().to_str().map(|name| name.to_string()))
        .collect()
}

pub fn list_sessions(
    paths: &HistoryPaths,
    project: &str,
) -> Result<SessionScan, ResolveProjectError> {
    let project_dir = resolve_project_dir(paths, project)?;
    Ok(list_sessions_in_dir(&project_dir))
}

pub fn list_sessions_in_dir(project_dir: &Path) -> SessionScan {
    let entries = match fs::read_dir(project_dir) {
        Ok(entries) => entries,
        Err(_) => {
            return SessionScan {
                sessions: Vec::new(),
                warnings: 1,
            };
        }
    };

    let mut warnings = 0usize;
    let mut sessions: Vec<SessionListing> = Vec::new();

    for entry in entries {
        let Ok(entry) = entry else {
            warnings += 1;
            continue;
        };
        let path = entry.path();
        if !is_session_file(&path) {
            continue;
        }

        let Some(id) = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(|stem| stem.to_string())
        else {
            warnings += 1;
            continue;
        };

        // One unreadable session degrades to defaults instead of failing the
        // whole listing.
        let (modified, size_kib) = match fs::metadata(&path) {
            Ok(metadata) => (metadata.modified().ok(), metadata.len() / 1024),
            Err(_) => {
                warnings += 1;
                (None, 0)
            }
        };

        sessions.push(SessionListing {
            id,
            modified,
            size_kib,
            preview: extract_preview(&path).unwrap_or_default(),
        });
    }

    sessions.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.id.cmp(&b.id)));

    SessionScan { sessions, warnings }
}

// First user message with plain string content, newlines collapsed,
// truncated to the preview budget. Any failure degrades to no preview.
fn extract_preview(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let reader = BufReader::new(file);

    for line_result in reader.lines() {
        let line = line_result.ok()?;
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(&line).ok()?;
        if let Some(text) = parse_user_text(&value) {
            return Some(collapse_preview(&text, PREVIEW_CHARS));
        }
    }

    None
}

// Exact `<id>.jsonl` match in any project directory wins; otherwise the
// first filename-prefix match in ascending directory/file order.
pub fn find_session(paths: &HistoryPaths, session_id: &str) -> Option<SessionHit> {
    if session_id.is_empty() {
        return None;
    }

    let projects_dir = paths.projects_dir();
    let mut keys = project_dir_names(&projects_dir);
    keys.sort();

    for key in &keys {
        let candidate = projects_dir
            .join(key)
            .join(format!("{session_id}.{SESSION_FILE_EXT}"));
        if candidate.is_file() {
            return Some(SessionHit {
                log_path: candidate,
                project_key: key.clone(),
            });
        }
    }

    for key in &keys {
        let project_dir = projects_dir.join(key);
        let Ok(entries) = fs::read_dir(&project_dir) else {
            continue;
        };
        let mut names = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_session_file(path))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(|stem| stem.to_string())
            })
            .collect::<Vec<_>>();
        names.sort();

        if let Some(stem) = names.iter().find(|stem| stem.starts_with(session_id)) {
            return Some(SessionHit {
                log_path: project_dir.join(format!("{stem}.{SESSION_FILE_EXT}")),
                project_key: key.clone(),
            });
        }
    }

    None
}

// Malformed lines are skipped and counted; only failing to open or read the
// file itself is an error.
pub fn read_session(path: &Path, opts: ReadOptions) -> io::Result<SessionTranscript> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut transcript = SessionTranscript::default();
    for line_result in reader.lines() {
        let line = match line_result {
            Ok(line) => line,
            Err(_) => {
                transcript.warnings += 1;
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let value: serde_json::Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(_) => {
                transcript.warnings += 1;
                continue;
            }
        };

        if let Some(message) = parse_message(&value, opts) {
            transcript.messages.push(message);
        }
    }

    Ok(transcript)
}
