mod cli;
mod domain;
mod infra;
mod web;

use crate::cli::CliInvocation;
use std::io::{self, Write};

fn main() {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => print_help(),
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
        }
        CliInvocation::Command(command) => {
            if let Err(error) = cli::run(command) {
                let mut err = io::stderr().lock();
                let _ = writeln!(err, "{error}");
                std::process::exit(1);
            }
        }
    }
}

fn print_help() {
    let text = format!(
        "{name} — browse Claude Code conversation history\n\nUSAGE:\n  {name} projects                          List projects with session counts\n  {name} ls <project-path>                 List sessions for a project\n  {name} show <session-id> [-t] [-T]       Print a session (id may be a prefix)\n  {name} search <query> [-n N]             Search the global history log\n  {name} serve [--port N]                  Start the read-only web UI (default port: 5000)\n  {name} auth [-i PATH] [-o PATH] [--print-only]  Convert a Chrome cURL capture to browser-auth JSON\n  {name} convert <html-root> <md-root> [--jobs N]  Convert a manual's HTML tree to Markdown\n  {name} --help | --version\n\nSHOW FLAGS:\n  -t, --thinking   Include assistant reasoning traces\n  -T, --tools      Include tool calls and tool results\n\nSEARCH FLAGS:\n  -n, --limit N    Max results (default: 20)\n\nEXIT CODES:\n  0 success, 1 not found or runtime failure, 2 usage error\n\nENV:\n  CLAUDE_DIR       Override the store root (default: ~/.claude)\n",
        name = env!("CARGO_PKG_NAME")
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}
