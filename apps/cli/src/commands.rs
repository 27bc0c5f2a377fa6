//! CLI command definitions, routing, and tracing setup.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use ghostwriter_core::content::numbered_list;
use ghostwriter_core::{AgentProgress, Session, prompts};
use ghostwriter_lexical::LexicalInput;
use ghostwriter_sandbox::{ExecutionRequest, Judge0Client, Judge0Options};
use ghostwriter_shared::{AppConfig, Tone, env_value, init_config, load_config, validate_api_key};
use ghostwriter_storage::StateStore;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const NO_TOPICS_HINT: &str = "No topics stored. Use 'topics' command to find trending topics.";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Ghostwriter - research, write and publish blog posts with an AI agent.
#[derive(Parser)]
#[command(
    name = "ghostwriter",
    version,
    about = "Find trending topics, research them, and publish blog drafts to Ghost.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write JSON logs to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Session state file (overrides `[state] path`).
    #[arg(long, global = true, env = "GHOSTWRITER_STATE")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Ask the agent for trending AI and security topics.
    Topics,

    /// Research a topic in depth.
    Research {
        /// Topic to research.
        topic: String,
    },

    /// Generate a blog post about a topic.
    Blog {
        /// Topic to write about.
        topic: String,

        /// Writing tone: professional, casual, or technical.
        #[arg(short, long, default_value = "technical")]
        tone: Tone,
    },

    /// Publish a draft to Ghost. Without content the agent writes it first.
    Publish {
        /// Post title.
        title: String,

        /// Markdown content of the post.
        content: Option<String>,
    },

    /// Chat with the agent until you type `exit`.
    Interactive,

    /// Print the saved conversation.
    History,

    /// Forget the saved conversation (topics are kept).
    Clear,

    /// Convert Markdown to a Ghost Lexical document without publishing.
    Lexical {
        /// Read from this file instead of stdin.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Treat the input as JSON (a `{"content": ...}` envelope or any value).
        #[arg(long)]
        json: bool,

        /// Pretty-print the document.
        #[arg(long)]
        pretty: bool,
    },

    /// Execute a Python file in the Judge0 sandbox.
    Run {
        /// Python source file.
        file: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Console logs go to stderr so command output on stdout stays clean.
pub(crate) fn init_tracing(cli: &Cli) -> Result<()> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "ghostwriter=info",
        1 => "ghostwriter=debug",
        _ => "ghostwriter=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let console = match cli.log_format {
        LogFormat::Text => fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    let file = match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| eyre!("cannot open log file '{}': {e}", path.display()))?;
            Some(fmt::layer().json().with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();

    Ok(())
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let state = cli.state;
    match cli.command {
        Command::Topics => cmd_topics(state).await,
        Command::Research { topic } => cmd_prompt(state, &prompts::research(&topic)).await,
        Command::Blog { topic, tone } => cmd_prompt(state, &prompts::blog(&topic, tone)).await,
        Command::Publish { title, content } => {
            cmd_prompt(state, &prompts::publish(&title, content.as_deref())).await
        }
        Command::Interactive => cmd_interactive(state).await,
        Command::History => cmd_history(state),
        Command::Clear => cmd_clear(state),
        Command::Lexical {
            input,
            json,
            pretty,
        } => cmd_lexical(input.as_deref(), json, pretty),
        Command::Run { file } => cmd_run(&file).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

fn load_with_state(state: Option<PathBuf>) -> Result<AppConfig> {
    let mut config = load_config()?;
    if let Some(path) = state {
        config.state.path = path.to_string_lossy().into_owned();
    }
    Ok(config)
}

fn open_session(state: Option<PathBuf>) -> Result<Session> {
    let config = load_with_state(state)?;
    validate_api_key(&config)?;
    Ok(Session::from_config(&config)?)
}

fn open_store(state: Option<PathBuf>) -> Result<StateStore> {
    let config = load_with_state(state)?;
    Ok(StateStore::open(&config.state.path)?)
}

/// One agent turn behind a spinner.
async fn ask(session: &mut Session, prompt: &str) -> Result<String> {
    let progress = CliProgress::new();
    let result = session.ask(prompt, &progress).await;
    progress.finish();
    Ok(result?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_topics(state: Option<PathBuf>) -> Result<()> {
    let mut session = open_session(state)?;
    let reply = ask(&mut session, &prompts::trending_topics()).await?;
    println!("{reply}");

    let saved = session.store().topics().len();
    if saved > 0 {
        info!(saved, "topics saved to session");
    }
    Ok(())
}

async fn cmd_prompt(state: Option<PathBuf>, prompt: &str) -> Result<()> {
    let mut session = open_session(state)?;
    info!(prompt, "sending prompt");
    let reply = ask(&mut session, prompt).await?;
    println!("{reply}");
    Ok(())
}

async fn cmd_interactive(state: Option<PathBuf>) -> Result<()> {
    let mut session = open_session(state)?;

    println!("Welcome to the AI Blog Generator!");
    println!("You can ask me to:");
    println!("- Find trending topics");
    println!("- Research a specific topic");
    println!("- Generate a blog post");
    println!("- Post a draft to Ghost");
    println!("Type 'exit' to quit.");

    println!();
    println!("{}", stored_topics_summary(session.store()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.eq_ignore_ascii_case("exit") {
            break;
        }
        if input.is_empty() {
            continue;
        }

        match ask(&mut session, input).await {
            Ok(reply) => println!("\nAssistant: {reply}"),
            Err(e) => eprintln!("\nError: {e}"),
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Stored topics with their age, or a hint on how to find some.
fn stored_topics_summary(store: &StateStore) -> String {
    let topics = store.topics();
    if topics.is_empty() {
        return NO_TOPICS_HINT.to_string();
    }
    format!(
        "Topics found {}:\n{}",
        store.last_topics_update().format("%Y-%m-%d %H:%M UTC"),
        numbered_list(topics)
    )
}

fn cmd_history(state: Option<PathBuf>) -> Result<()> {
    let store = open_store(state)?;
    if store.chat_history().is_empty() {
        println!("No conversation history.");
        return Ok(());
    }

    for message in store.chat_history() {
        println!(
            "[{}] {}: {}",
            message.timestamp.format("%Y-%m-%d %H:%M:%S"),
            message.role,
            message.content
        );
    }
    Ok(())
}

fn cmd_clear(state: Option<PathBuf>) -> Result<()> {
    let mut store = open_store(state)?;
    let count = store.chat_history().len();
    store.clear_history()?;
    println!("Cleared {count} messages from {}", store.path().display());
    Ok(())
}

fn cmd_lexical(input: Option<&Path>, json: bool, pretty: bool) -> Result<()> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| eyre!("cannot read '{}': {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let content: LexicalInput = if json {
        serde_json::from_str::<serde_json::Value>(&raw)?.into()
    } else {
        raw.into()
    };

    if pretty {
        println!("{}", ghostwriter_lexical::build_tree(content).to_json_pretty());
    } else {
        println!("{}", ghostwriter_lexical::build(content));
    }
    Ok(())
}

async fn cmd_run(file: &Path) -> Result<()> {
    let config = load_config()?;
    let sandbox = &config.sandbox;
    let api_key = env_value(&sandbox.api_key_env).ok_or_else(|| {
        eyre!(
            "Judge0 API key not found. Set the {} environment variable.",
            sandbox.api_key_env
        )
    })?;

    let code = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;

    let client = Judge0Client::new(
        api_key,
        Judge0Options {
            api_url: sandbox.api_url.clone(),
            api_host: sandbox.api_host.clone(),
            poll_interval: Duration::from_millis(sandbox.poll_interval_ms),
            max_polls: sandbox.max_polls,
        },
    )?;

    info!(file = %file.display(), "executing in sandbox");
    let spinner = CliProgress::new();
    spinner.spinner.set_message("Running code");
    let outcome = client.execute(&ExecutionRequest::python(code)).await;
    spinner.finish();

    println!("{}", outcome?.to_message());
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Agent progress shown as an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl AgentProgress for CliProgress {
    fn thinking(&self, round: u32) {
        if round == 0 {
            self.spinner.set_message("Thinking");
        } else {
            self.spinner.set_message(format!("Thinking (round {})", round + 1));
        }
    }

    fn tool_started(&self, name: &str) {
        self.spinner.set_message(format!("Running {name}"));
    }

    fn tool_finished(&self, name: &str) {
        self.spinner.set_message(format!("Finished {name}"));
    }
}
