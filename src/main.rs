//! clia binary
//!
//! Loads configuration, builds the adapter and tool registry, then hands
//! the terminal to the REPL.
//!
//! EXIT: 0 on `/exit` or end of input, 2 on configuration errors, 130 on
//! a double Ctrl+C.

use std::io;

use anyhow::Context;
use clap::Parser;

use clia::cli::{self, AppConfig, Args, EXIT_FAILURE, EXIT_SUCCESS};
use clia::file_tools::expand_home;
use clia::llm::adapters::create_adapter;
use clia::llm::chat_loop::ChatLoop;
use clia::llm::contracts::render_system_prompt;
use clia::logging::DebugLog;
use clia::ui::{
    install_sigint_handler, ApprovalGate, CancellationToken, LinePrompter, Renderer, Repl,
    SessionStore,
};

fn main() {
    let args = Args::parse();
    let code = match run(args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("[error] {:#}", e);
            e.downcast_ref::<cli::Error>()
                .map_or(EXIT_FAILURE, cli::Error::exit_code)
        }
    };
    std::process::exit(code);
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = AppConfig::load(args.config.as_deref()).map_err(cli::Error::from)?;
    config.apply_args(&args);

    let settings = config.adapter_settings().map_err(cli::Error::from)?;
    let adapter = create_adapter(&settings).map_err(cli::Error::from)?;

    let registry = config.build_registry(true).map_err(cli::Error::from)?;
    let template = config.system_prompt_template().map_err(cli::Error::from)?;
    let system_prompt = render_system_prompt(&template, &registry.describe_for_prompt());

    let workspace_root = std::env::current_dir().context("cannot determine working directory")?;
    let tool_context = config.tool_context(workspace_root);

    let approvals = match ApprovalGate::default_dir() {
        Some(dir) => ApprovalGate::load(&dir).unwrap_or_else(|e| {
            eprintln!("[warning] Failed to read allowed tools file: {}", e);
            ApprovalGate::with_storage(dir)
        }),
        None => ApprovalGate::in_memory(),
    };

    let debug = DebugLog::install(&config.debug.log_file, false).unwrap_or_else(|e| {
        eprintln!("[warning] {}", e);
        DebugLog::detached(&config.debug.log_file)
    });

    let cancel = CancellationToken::new();
    let _sigint = install_sigint_handler(cancel.clone())?;

    let chat = ChatLoop::new(adapter, config.llm.model.clone(), registry, tool_context)
        .with_options(config.chat_options())
        .with_approvals(approvals)
        .with_cancellation(cancel)
        .with_renderer(Renderer::new(!config.no_color));

    let sessions = SessionStore::new(expand_home(&config.session.dir.to_string_lossy()));
    let mut repl = Repl::new(chat, system_prompt, sessions, debug);

    let mut prompter = LinePrompter::stdio();
    let mut out = io::stdout();
    repl.run(&mut prompter, &mut out, args.initial_prompt())
        .context("terminal I/O failed")?;
    Ok(())
}
