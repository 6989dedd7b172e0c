use crate::domain::auth::{BuildAuthPayloadError, build_auth_payload, parse_curl_headers};
use crate::domain::{
    ReadOptions, RenderFlags, collapse_preview, format_epoch_ms, format_system_time,
    render_transcript,
};
use crate::infra::{
    ConvertError, DEFAULT_JOBS, HistoryPaths, ResolveClaudeDirError, ResolveProjectError,
    convert_manual, find_session, list_sessions, read_session, resolve_claude_dir, scan_projects,
    search_history,
};
use crate::web::{DEFAULT_PORT, run_http_server};
use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_SEARCH_LIMIT: usize = 20;
const SEARCH_DISPLAY_CHARS: usize = 80;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Command(CliCommand),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    Projects,
    Ls {
        project: String,
    },
    Show {
        session_id: String,
        thinking: bool,
        tools: bool,
    },
    Search {
        query: String,
        limit: usize,
    },
    Serve {
        port: u16,
    },
    Auth {
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        print_only: bool,
    },
    Convert {
        html_root: PathBuf,
        md_root: PathBuf,
        jobs: usize,
    },
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: String, value: String },

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut iter = args.iter().skip(1);
    let Some(subcommand) = iter.next() else {
        return Ok(CliInvocation::PrintHelp);
    };

    match subcommand.as_str() {
        "projects" => {
            reject_remaining(iter)?;
            Ok(CliInvocation::Command(CliCommand::Projects))
        }
        "ls" => {
            let mut project: Option<String> = None;
            for arg in iter {
                if arg.starts_with('-') {
                    return Err(CliParseError::UnknownFlag(arg.to_string()));
                }
                if project.is_some() {
                    return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                }
                project = Some(arg.to_string());
            }
            let project = project.ok_or(CliParseError::MissingArgument("project path"))?;
            Ok(CliInvocation::Command(CliCommand::Ls { project }))
        }
        "show" => {
            let mut session_id: Option<String> = None;
            let mut thinking = false;
            let mut tools = false;
            for arg in iter {
                match arg.as_str() {
                    "--thinking" | "-t" => thinking = true,
                    "--tools" | "-T" => tools = true,
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        if session_id.is_some() {
                            return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                        }
                        session_id = Some(arg.to_string());
                    }
                }
            }
            let session_id = session_id.ok_or(CliParseError::MissingArgument("session id"))?;
            Ok(CliInvocation::Command(CliCommand::Show {
                session_id,
                thinking,
                tools,
            }))
        }
        "search" => {
            let mut query: Option<String> = None;
            let mut limit = DEFAULT_SEARCH_LIMIT;
            let mut args = iter.peekable();
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--limit" | "-n" => {
                        let value = args.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--limit".to_string())
                        })?;
                        limit = parse_usize_flag("--limit", value)?;
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        if query.is_some() {
                            return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                        }
                        query = Some(arg.to_string());
                    }
                }
            }
            let query = query.ok_or(CliParseError::MissingArgument("query"))?;
            Ok(CliInvocation::Command(CliCommand::Search { query, limit }))
        }
        "serve" => {
            let mut port = DEFAULT_PORT;
            let mut args = iter.peekable();
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--port" | "-p" => {
                        let value = args
                            .next()
                            .ok_or_else(|| CliParseError::MissingFlagValue("--port".to_string()))?;
                        port = value
                            .parse::<u16>()
                            .map_err(|_| CliParseError::InvalidFlagValue {
                                flag: "--port".to_string(),
                                value: value.to_string(),
                            })?;
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                    }
                }
            }
            Ok(CliInvocation::Command(CliCommand::Serve { port }))
        }
        "auth" => {
            let mut input: Option<PathBuf> = None;
            let mut output: Option<PathBuf> = None;
            let mut print_only = false;
            let mut args = iter.peekable();
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--input" | "-i" => {
                        let value = args.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--input".to_string())
                        })?;
                        input = Some(PathBuf::from(value));
                    }
                    "--output" | "-o" => {
                        let value = args.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--output".to_string())
                        })?;
                        output = Some(PathBuf::from(value));
                    }
                    "--print-only" => print_only = true,
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                    }
                }
            }
            Ok(CliInvocation::Command(CliCommand::Auth {
                input,
                output,
                print_only,
            }))
        }
        "convert" => {
            let mut positional: Vec<PathBuf> = Vec::new();
            let mut jobs = DEFAULT_JOBS;
            let mut args = iter.peekable();
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--jobs" | "-j" => {
                        let value = args
                            .next()
                            .ok_or_else(|| CliParseError::MissingFlagValue("--jobs".to_string()))?;
                        jobs = parse_usize_flag("--jobs", value)?;
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => positional.push(PathBuf::from(arg)),
                }
            }
            if positional.len() > 2 {
                return Err(CliParseError::UnexpectedArgument(
                    positional[2].display().to_string(),
                ));
            }
            let mut positional = positional.into_iter();
            let html_root = positional
                .next()
                .ok_or(CliParseError::MissingArgument("html root"))?;
            let md_root = positional
                .next()
                .ok_or(CliParseError::MissingArgument("markdown root"))?;
            Ok(CliInvocation::Command(CliCommand::Convert {
                html_root,
                md_root,
                jobs,
            }))
        }
        other => Err(CliParseError::UnknownSubcommand(other.to_string())),
    }
}

fn reject_remaining<'a>(mut iter: impl Iterator<Item = &'a String>) -> Result<(), CliParseError> {
    match iter.next() {
        None => Ok(()),
        Some(arg) if arg.starts_with('-') => Err(CliParseError::UnknownFlag(arg.to_string())),
        Some(arg) => Err(CliParseError::UnexpectedArgument(arg.to_string())),
    }
}

fn parse_usize_flag(flag: &str, value: &str) -> Result<usize, CliParseError> {
    value
        .parse::<usize>()
        .map_err(|_| CliParseError::InvalidFlagValue {
            flag: flag.to_string(),
            value: value.to_string(),
        })
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    ClaudeDir(#[from] ResolveClaudeDirError),

    #[error("project not found: {0}\nHint: run `cchist projects` and copy the project path.")]
    ProjectNotFound(String),

    #[error("session not found: {0}\nHint: run `cchist ls <project-path>` and copy the session id.")]
    SessionNotFound(String),

    #[error("no input provided")]
    EmptyAuthInput,

    #[error("could not parse curl headers from input")]
    UnparsableAuthInput,

    #[error(transparent)]
    AuthPayload(#[from] BuildAuthPayloadError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("conversion finished with {0} error(s)")]
    ConvertFailures(usize),

    #[error("server error: {0}")]
    Serve(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub fn run(command: CliCommand) -> Result<(), CliRunError> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let stderr = io::stderr();
    let mut err = io::BufWriter::new(stderr.lock());

    match command {
        CliCommand::Projects => {
            let paths = history_paths()?;
            let scan = scan_projects(&paths);
            for project in &scan.projects {
                let line = format!(
                    "{}  ({} sessions)",
                    project.path.display(),
                    project.session_count
                );
                if !write_line(&mut out, &line)? {
                    return Ok(());
                }
            }
            write_scan_notice(&mut err, scan.notice, scan.warnings)?;
            Ok(())
        }
        CliCommand::Ls { project } => {
            let paths = history_paths()?;
            let scan = list_sessions(&paths, &project).map_err(|error| match error {
                ResolveProjectError::NotFound(requested) => {
                    CliRunError::ProjectNotFound(requested)
                }
            })?;
            for session in &scan.sessions {
                let line = format!(
                    "{}  {}  {:>4}KB  {}...",
                    session.id,
                    format_system_time(session.modified),
                    session.size_kib,
                    session.preview
                );
                if !write_line(&mut out, &line)? {
                    return Ok(());
                }
            }
            write_scan_notice(&mut err, None, scan.warnings)?;
            Ok(())
        }
        CliCommand::Show {
            session_id,
            thinking,
            tools,
        } => {
            let paths = history_paths()?;
            let hit = find_session(&paths, &session_id)
                .ok_or_else(|| CliRunError::SessionNotFound(session_id.clone()))?;

            let transcript = read_session(
                &hit.log_path,
                ReadOptions {
                    include_thinking: thinking,
                },
            )?;
            match render_transcript(&mut out, &transcript.messages, RenderFlags { thinking, tools })
            {
                Ok(()) => {}
                Err(error) if error.kind() == io::ErrorKind::BrokenPipe => return Ok(()),
                Err(error) => return Err(error.into()),
            }
            write_scan_notice(&mut err, None, transcript.warnings)?;
            Ok(())
        }
        CliCommand::Search { query, limit } => {
            let paths = history_paths()?;
            let result = search_history(&paths, &query, limit)?;
            for entry in &result.entries {
                let line = format!(
                    "{}  {}  {}",
                    format_epoch_ms(entry.timestamp),
                    entry.session_id.chars().take(8).collect::<String>(),
                    collapse_preview(&entry.display, SEARCH_DISPLAY_CHARS)
                );
                if !write_line(&mut out, &line)? {
                    return Ok(());
                }
            }
            write_scan_notice(&mut err, None, result.warnings)?;
            Ok(())
        }
        CliCommand::Serve { port } => {
            let paths = history_paths()?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|error| CliRunError::Serve(error.to_string()))?;
            runtime
                .block_on(run_http_server(port, paths))
                .map_err(CliRunError::Serve)
        }
        CliCommand::Auth {
            input,
            output,
            print_only,
        } => {
            let text = read_auth_input(input)?;
            let text = text.trim();
            if text.is_empty() {
                return Err(CliRunError::EmptyAuthInput);
            }

            let headers = parse_curl_headers(text);
            if headers.is_empty() {
                return Err(CliRunError::UnparsableAuthInput);
            }

            let payload = build_auth_payload(&headers)?;
            let rendered = format!("{}\n", serde_json::to_string_pretty(&payload)?);

            match output {
                Some(path) if !print_only => {
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&path, rendered)?;
                    write_line(&mut out, &format!("Wrote {}", path.display()))?;
                    Ok(())
                }
                _ => {
                    write_line(&mut out, rendered.trim_end())?;
                    Ok(())
                }
            }
        }
        CliCommand::Convert {
            html_root,
            md_root,
            jobs,
        } => {
            let report = convert_manual(&mut out, &html_root, &md_root, jobs)?;
            out.flush()?;
            if report.failures.is_empty() {
                Ok(())
            } else {
                Err(CliRunError::ConvertFailures(report.failures.len()))
            }
        }
    }
}

fn history_paths() -> Result<HistoryPaths, CliRunError> {
    Ok(HistoryPaths::new(resolve_claude_dir()?))
}

fn read_auth_input(input: Option<PathBuf>) -> Result<String, CliRunError> {
    match input {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            if io::stdin().is_terminal() {
                eprintln!("Paste Chrome 'Copy as cURL (bash)', then Ctrl-D:");
            }
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn write_scan_notice(
    err: &mut impl Write,
    notice: Option<String>,
    warnings: usize,
) -> Result<(), CliRunError> {
    if let Some(notice) = notice {
        let _ = write_line(err, &notice)?;
    }
    if warnings > 0 {
        let _ = write_line(err, &format!("warnings: {warnings}"))?;
    }
    Ok(())
}

fn write_line(out: &mut impl Write, line: &str) -> io::Result<bool> {
    match writeln!(out, "{line}") {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(error) => Err(error),
    }
}
