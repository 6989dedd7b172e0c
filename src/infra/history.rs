use crate::domain::HistoryEntry;
use crate::infra::HistoryPaths;
use std::fs::File;
use std::io::{self, BufRead, BufReader, ErrorKind};

#[derive(Clone, Debug, Default)]
pub struct HistorySearch {
    pub entries: Vec<HistoryEntry>,
    pub warnings: usize,
}

// Scans the global log for entries whose display text contains the query,
// case-insensitively. The log is chronological by append order; the result
// is the last `limit` matches, most recent first (both entry points share
// this ordering). A missing log is an empty result, not an error.
pub fn search_history(
    paths: &HistoryPaths,
    query: &str,
    limit: usize,
) -> io::Result<HistorySearch> {
    let file = match File::open(paths.history_log_path()) {
        Ok(file) => file,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return Ok(HistorySearch::default());
        }
        Err(error) => return Err(error),
    };
    let reader = BufReader::new(file);

    let needle = query.to_lowercase();
    let mut warnings = 0usize;
    let mut matches: Vec<HistoryEntry> = Vec::new();

    for line_result in reader.lines() {
        let line = match line_result {
            Ok(line) => line,
            Err(_) => {
                warnings += 1;
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let entry: HistoryEntry = match serde_json::from_str(&line) {
            Ok(entry) => entry,
            Err(_) => {
                warnings += 1;
                continue;
            }
        };

        if entry.display.to_lowercase().contains(&needle) {
            matches.push(entry);
        }
    }

    let keep = matches.len().saturating_sub(limit);
    let mut entries = matches.split_off(keep);
    entries.reverse();

    Ok(HistorySearch { entries, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn fixture_paths(root: &Path) -> HistoryPaths {
        HistoryPaths::new(root.to_path_buf())
    }

    fn write_log(paths: &HistoryPaths, lines: &[&str]) {
        fs::create_dir_all(paths.claude_dir()).expect("create claude dir");
        fs::write(paths.history_log_path(), format!("{}\n", lines.join("\n")))
            .expect("write history log");
    }

    fn entry_line(timestamp: i64, session_id: &str, display: &str) -> String {
        format!(
            r#"{{"timestamp":{timestamp},"sessionId":"{session_id}","display":"{display}","project":"/home/user/code"}}"#
        )
    }

    #[test]
    fn matches_are_case_insensitive_and_most_recent_first() {
        let dir = tempdir().expect("tempdir");
        let paths = fixture_paths(dir.path());
        write_log(
            &paths,
            &[
                &entry_line(1000, "s1", "Fix the parser"),
                &entry_line(2000, "s2", "deploy the site"),
                &entry_line(3000, "s3", "fix the PARSER tests"),
            ],
        );

        let result = search_history(&paths, "parser", 10).expect("search");
        assert_eq!(result.warnings, 0);
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].session_id, "s3");
        assert_eq!(result.entries[1].session_id, "s1");
    }

    #[test]
    fn limit_keeps_the_most_recent_matches() {
        let dir = tempdir().expect("tempdir");
        let paths = fixture_paths(dir.path());
        let lines = (0..5)
            .map(|n| entry_line(n, &format!("s{n}"), "repeated prompt"))
            .collect::<Vec<_>>();
        write_log(&paths, &lines.iter().map(String::as_str).collect::<Vec<_>>());

        let result = search_history(&paths, "repeated", 2).expect("search");
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].session_id, "s4");
        assert_eq!(result.entries[1].session_id, "s3");
    }

    #[test]
    fn missing_log_is_an_empty_result() {
        let dir = tempdir().expect("tempdir");
        let result = search_history(&fixture_paths(dir.path()), "anything", 10).expect("search");
        assert!(result.entries.is_empty());
        assert_eq!(result.warnings, 0);
    }

    #[test]
    fn malformed_lines_are_counted_not_fatal() {
        let dir = tempdir().expect("tempdir");
        let paths = fixture_paths(dir.path());
        write_log(
            &paths,
            &["{broken", &entry_line(1000, "s1", "find the leak")],
        );

        let result = search_history(&paths, "leak", 10).expect("search");
        assert_eq!(result.warnings, 1);
        assert_eq!(result.entries.len(), 1);
    }

    #[test]
    fn sparse_records_scan_with_defaults() {
        let dir = tempdir().expect("tempdir");
        let paths = fixture_paths(dir.path());
        write_log(&paths, &[r#"{"display":"orphan prompt"}"#]);

        let result = search_history(&paths, "orphan", 10).expect("search");
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].timestamp, 0);
        assert_eq!(result.entries[0].session_id, "");
        assert_eq!(result.entries[0].project, None);
    }
}
