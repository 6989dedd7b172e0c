use scraper::{Html, Selector};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use thiserror::Error;
use walkdir::WalkDir;

pub const DEFAULT_JOBS: usize = 4;

const CHAPTER_SELECTOR: &str = "div#chapter_content";

#[derive(Clone, Debug)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub output: PathBuf,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ConvertReport {
    pub total: usize,
    pub converted: usize,
    pub failures: Vec<FileOutcome>,
    pub output_files: usize,
    pub output_bytes: u64,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("html root not found: {}", .0.display())]
    HtmlRootNotFound(PathBuf),

    #[error("no html files found under {}", .0.display())]
    NoInputs(PathBuf),

    #[error(transparent)]
    Io(#[from] io::Error),
}

// Converts every `*.html` under `html_root` into a mirrored `*.md` tree
// under `md_root`. Conversions are independent and stateless, so a fixed
// pool of threads pulls files from a shared cursor and reports outcomes
// over a channel as they complete; attribution rides on each outcome, so
// the unordered completion never loses which file a result belongs to.
pub fn convert_manual(
    out: &mut impl Write,
    html_root: &Path,
    md_root: &Path,
    jobs: usize,
) -> Result<ConvertReport, ConvertError> {
    if !html_root.is_dir() {
        return Err(ConvertError::HtmlRootNotFound(html_root.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(html_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("html"))
        .collect();
    files.sort();

    let total = files.len();
    if total == 0 {
        return Err(ConvertError::NoInputs(html_root.to_path_buf()));
    }

    writeln!(out, "Found {total} HTML files to convert")?;
    writeln!(out, "Input:  {}", html_root.display())?;
    writeln!(out, "Output: {}", md_root.display())?;
    writeln!(out)?;

    let workers = jobs.max(1).min(total);
    let cursor = AtomicUsize::new(0);
    let (result_tx, result_rx) = mpsc::channel::<FileOutcome>();

    let mut report = thread::scope(|scope| -> io::Result<ConvertReport> {
        for _ in 0..workers {
            let tx = result_tx.clone();
            let cursor = &cursor;
            let files = &files;
            scope.spawn(move || {
                loop {
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(source) = files.get(index) else {
                        break;
                    };
                    let outcome = convert_file(source, html_root, md_root);
                    if tx.send(outcome).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        let mut report = ConvertReport {
            total,
            ..ConvertReport::default()
        };
        for (done, outcome) in result_rx.iter().enumerate() {
            let name = source_name(&outcome);
            if outcome.error.is_none() {
                report.converted += 1;
                writeln!(out, "[{}/{total}] OK  {name}", done + 1)?;
            } else {
                writeln!(out, "[{}/{total}] ERR {name}", done + 1)?;
                report.failures.push(outcome);
            }
        }
        Ok(report)
    })?;

    let (output_files, output_bytes) = measure_outputs(md_root);
    report.output_files = output_files;
    report.output_bytes = output_bytes;

    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "Conversion complete!")?;
    writeln!(out, "  Success: {}", report.converted)?;
    writeln!(out, "  Errors:  {}", report.failures.len())?;
    if !report.failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "Errors encountered:")?;
        for failure in &report.failures {
            let name = source_name(failure);
            let message = failure.error.as_deref().unwrap_or("unknown error");
            writeln!(out, "  - {name}: {message}")?;
        }
    }
    writeln!(out)?;
    writeln!(out, "Output statistics:")?;
    writeln!(out, "  Files: {}", report.output_files)?;
    writeln!(out, "  Size:  {} bytes", report.output_bytes)?;

    Ok(report)
}

fn source_name(outcome: &FileOutcome) -> String {
    outcome
        .source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| outcome.source.display().to_string())
}

fn convert_file(source: &Path, html_root: &Path, md_root: &Path) -> FileOutcome {
    let relative = source.strip_prefix(html_root).unwrap_or(source);
    let output = md_root.join(relative).with_extension("md");

    let error = try_convert_file(source, &output).err();
    FileOutcome {
        source: source.to_path_buf(),
        output,
        error,
    }
}

fn try_convert_file(source: &Path, output: &Path) -> Result<(), String> {
    let html = fs::read_to_string(source).map_err(|error| error.to_string())?;

    let selector =
        Selector::parse(CHAPTER_SELECTOR).map_err(|error| format!("bad selector: {error}"))?;
    let document = Html::parse_document(&html);
    let Some(chapter) = document.select(&selector).next() else {
        return Err(format!("no {CHAPTER_SELECTOR} element found"));
    };

    let markdown = html2md::parse_html(&chapter.html());
    if markdown.trim().is_empty() {
        return Err("no content extracted".to_string());
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|error| error.to_string())?;
    }
    fs::write(output, markdown).map_err(|error| error.to_string())?;
    Ok(())
}

fn measure_outputs(md_root: &Path) -> (usize, u64) {
    let mut files = 0usize;
    let mut bytes = 0u64;
    for entry in WalkDir::new(md_root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|ext| ext.to_str()) != Some("md") {
            continue;
        }
        files += 1;
        bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
    }
    (files, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CHAPTER_HTML: &str = r#"<html><body>
        <div id="chapter_content"><h1>Routing</h1><p>Audio flows downstream.</p></div>
    </body></html>"#;

    fn write_html(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        fs::write(path, content).expect("write html");
    }

    #[test]
    fn converts_a_tree_into_a_mirrored_markdown_tree() {
        let dir = tempdir().expect("tempdir");
        let html_root = dir.path().join("html");
        let md_root = dir.path().join("md");
        write_html(&html_root, "intro.html", CHAPTER_HTML);
        write_html(&html_root, "chapters/routing.html", CHAPTER_HTML);
        write_html(&html_root, "chapters/notes.txt", "not html");

        let mut log = Vec::new();
        let report = convert_manual(&mut log, &html_root, &md_root, 3).expect("convert");

        assert_eq!(report.total, 2);
        assert_eq!(report.converted, 2);
        assert!(report.failures.is_empty());
        assert_eq!(report.output_files, 2);

        let nested = fs::read_to_string(md_root.join("chapters/routing.md")).expect("read md");
        assert!(nested.contains("Audio flows downstream."));
    }

    #[test]
    fn missing_chapter_div_fails_only_that_file() {
        let dir = tempdir().expect("tempdir");
        let html_root = dir.path().join("html");
        let md_root = dir.path().join("md");
        write_html(&html_root, "good.html", CHAPTER_HTML);
        write_html(&html_root, "bad.html", "<html><body><p>bare page</p></body></html>");

        let mut log = Vec::new();
        let report = convert_manual(&mut log, &html_root, &md_root, 2).expect("convert");

        assert_eq!(report.converted, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].source.ends_with("bad.html"));
        assert!(
            report.failures[0]
                .error
                .as_deref()
                .expect("error")
                .contains("chapter_content")
        );
        assert!(md_root.join("good.md").is_file());
        assert!(!md_root.join("bad.md").exists());
    }

    #[test]
    fn empty_tree_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let html_root = dir.path().join("html");
        fs::create_dir_all(&html_root).expect("create");
        let mut log = Vec::new();
        assert!(matches!(
            convert_manual(&mut log, &html_root, &dir.path().join("md"), 2),
            Err(ConvertError::NoInputs(_))
        ));
    }

    #[test]
    fn outcomes_stay_attributed_across_the_pool() {
        let dir = tempdir().expect("tempdir");
        let html_root = dir.path().join("html");
        let md_root = dir.path().join("md");
        for n in 0..12 {
            write_html(&html_root, &format!("page-{n:02}.html"), CHAPTER_HTML);
        }

        let mut log = Vec::new();
        let report = convert_manual(&mut log, &html_root, &md_root, 4).expect("convert");
        assert_eq!(report.converted, 12);
        for n in 0..12 {
            assert!(md_root.join(format!("page-{n:02}.md")).is_file());
        }
    }
}
