//! `krusty` binary.
//!
//! Two modes: interactive REPL (`krusty [--verbose] [--config PATH]`) and
//! one-shot (`krusty exec <command>`), matching the teacher's `just-bash`
//! binary's clap-derive CLI shape but replacing its sandboxed single-shot-
//! only design with a real interactive loop.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use krusty_core::builtins::BuiltinRegistry;
use krusty_core::config::Config;
use krusty_core::editor::{DefaultPromptRenderer, EditorSignal, LineEditor, PromptRenderer};
use krusty_core::error::KrustyError;
use krusty_core::hooks::{HookEvent, HookPayload, HookRegistry};
use krusty_core::history::History;
use krusty_core::script::run_script;
use krusty_core::state::ShellState;

#[derive(Parser)]
#[command(name = "krusty", version, about = "An interactive, POSIX-inspired command shell")]
struct Cli {
    /// Enable debug-level tracing to stderr.
    #[arg(long)]
    verbose: bool,

    /// Path to a JSON config file (overrides `KRUSTY_CONFIG`).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Parse and execute one line, print captured output, exit with its status.
    Exec {
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref());
    let mut state = build_state(&config);
    load_bookmarks(&mut state);

    let exit_code = match cli.command {
        Some(Cmd::Exec { command }) => run_one_shot(&command.join(" "), &mut state).await,
        None => run_repl(&mut state, &config).await,
    };

    save_bookmarks(&state);
    std::process::exit(exit_code);
}

fn build_state(config: &Config) -> ShellState {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    let mut environment: HashMap<String, String> = std::env::vars().collect();
    for (key, value) in &config.environment {
        environment.insert(key.clone(), value.clone());
    }
    environment.insert("PWD".to_string(), cwd.display().to_string());

    let mut state = ShellState::new(cwd, environment);
    state.history = History::new(config.history_config());
    state.expansion_caches = krusty_core::expansion::cache::ExpansionCaches::new(&config.expansion.cache_limits);
    state.history.load().ok();
    for (name, value) in &config.aliases {
        state.aliases.set(name, value);
    }
    state
}

fn bookmarks_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".krusty").join("bookmarks.json"))
}

fn load_bookmarks(state: &mut ShellState) {
    let Some(path) = bookmarks_path() else { return };
    let Ok(text) = std::fs::read_to_string(path) else { return };
    if let Ok(map) = serde_json::from_str::<HashMap<String, PathBuf>>(&text) {
        state.bookmarks = map;
    }
}

fn save_bookmarks(state: &ShellState) {
    let Some(path) = bookmarks_path() else { return };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    if let Ok(text) = serde_json::to_string_pretty(&state.bookmarks) {
        let _ = std::fs::write(path, text);
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Exit code for a top-level `KrustyError` that escaped the executor.
fn error_exit_code(e: &KrustyError) -> i32 {
    match e {
        KrustyError::Parse { .. } => 2,
        KrustyError::NotFound(_) => 127,
        KrustyError::Timeout(_) => 124,
        KrustyError::Errexit(code) => *code,
        _ => 1,
    }
}

/// `krusty exec <command>`: captured, not streamed — `state.capture_output`
/// forces even the pipeline's final stage to buffer its output instead of
/// inheriting the real stdio.
async fn run_one_shot(command: &str, state: &mut ShellState) -> i32 {
    state.capture_output = true;
    let registry = BuiltinRegistry::new();
    match krusty_core::exec::chain::run_chain(command, &registry, state).await {
        Ok(result) => {
            if !result.stdout.is_empty() {
                print!("{}", result.stdout);
            }
            if !result.stderr.is_empty() {
                eprint!("{}", result.stderr);
            }
            result.exit_code
        }
        Err(e) => {
            eprintln!("{e}");
            error_exit_code(&e)
        }
    }
}

async fn run_repl(state: &mut ShellState, config: &Config) -> i32 {
    let registry = BuiltinRegistry::new();
    let hooks = HookRegistry::from_config(&config.hooks);
    hooks.fire(HookEvent::ShellInit, &HookPayload::default(), state).await;
    hooks.fire(HookEvent::ShellStart, &HookPayload::default(), state).await;

    let renderer: Box<dyn PromptRenderer> = Box::new(DefaultPromptRenderer);
    let mut editor = LineEditor::new(renderer, &config.completion);

    loop {
        editor.sync(state, &registry);
        let signal = match editor.read_line() {
            Ok(signal) => signal,
            Err(e) => {
                tracing::error!(error = %e, "line editor error; shutting down");
                break;
            }
        };

        match signal {
            EditorSignal::Submit(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                run_one_line(&line, state, &registry, &hooks).await;
            }
            EditorSignal::Interrupted => continue,
            EditorSignal::Eof => break,
        }
    }

    hooks.fire(HookEvent::ShellStop, &HookPayload::default(), state).await;
    state.history.save().ok();
    hooks.fire(HookEvent::ShellExit, &HookPayload::default(), state).await;
    state.last_exit_code
}

async fn run_one_line(line: &str, state: &mut ShellState, registry: &BuiltinRegistry, hooks: &HookRegistry) {
    hooks
        .fire(HookEvent::CommandBefore, &HookPayload { command: Some(line.to_string()), ..Default::default() }, state)
        .await;

    let started = std::time::Instant::now();
    let result = run_script(line, state, registry).await;
    state.last_duration_ms = started.elapsed().as_millis() as u64;
    state.last_exit_code = result.exit_code;

    state.history.append(line);
    hooks.fire(HookEvent::HistoryAdd, &HookPayload { command: Some(line.to_string()), ..Default::default() }, state).await;

    if !result.stdout.is_empty() {
        print!("{}", result.stdout);
    }
    if !result.stderr.is_empty() {
        eprint!("{}", result.stderr);
    }

    hooks
        .fire(
            HookEvent::CommandAfter,
            &HookPayload { command: Some(line.to_string()), exit_code: Some(result.exit_code), ..Default::default() },
            state,
        )
        .await;
}
