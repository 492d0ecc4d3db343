//! CLI binary for cv-review.
//!
//! A thin interactive shell over the library: submit a CV, read the review,
//! ask follow-up questions. Every library error is printed and the loop goes
//! on; only a missing API key stops the program, before the prompt appears.

use anyhow::{Context, Result};
use clap::Parser;
use cv_review::{
    CvAssistant, ProgressCallback, ReviewConfig, ReviewProgressCallback, Role, SessionState,
    ACCEPTED_EXTENSIONS,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Shows a spinner while a remote call is in flight.
struct CliProgressCallback {
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            spinner: Mutex::new(None),
        })
    }

    fn spin(&self, prefix: &str, msg: String) {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix(prefix.to_string());
        bar.set_message(msg);
        bar.enable_steady_tick(Duration::from_millis(80));
        *self.spinner.lock().unwrap() = Some(bar);
    }

    fn stop(&self) {
        if let Some(bar) = self.spinner.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

impl ReviewProgressCallback for CliProgressCallback {
    fn on_ingest_start(&self, file_name: &str, size: usize) {
        self.spin(
            "Reading",
            format!("extracting text from {file_name} ({} KB)…", size.div_ceil(1024)),
        );
    }

    fn on_ingest_complete(&self, pages: usize, text_len: usize) {
        self.stop();
        eprintln!(
            "{} Extracted {} chars from {} page(s)",
            green("✔"),
            bold(&text_len.to_string()),
            pages
        );
    }

    fn on_ingest_error(&self, _error: &str) {
        self.stop();
    }

    fn on_reply_start(&self, _turns: usize) {
        self.spin("Thinking", "waiting for the assistant…".to_string());
    }

    fn on_reply_complete(&self, _reply_len: usize) {
        self.stop();
    }

    fn on_reply_error(&self, _error: &str) {
        self.stop();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start with a CV, then chat
  cv-review resume.pdf

  # Start empty and type the path at the prompt
  cv-review

  # Use another chat model and keep the conversation
  cv-review --chat-model mistral-large-latest --transcript review.json cv.png

COMMANDS (inside the session):
  /upload <path>   Submit a CV (pdf, jpg, jpeg, png)
  /reset           Discard the CV and the conversation
  /history         Print the conversation so far
  /save <path>     Write the conversation to a JSON file
  /help            Show this list
  /quit            Leave

ENVIRONMENT VARIABLES:
  MISTRAL_API_KEY         Required. Used for OCR and for the default chat provider.
                          A .env file in the working directory is honoured.
  RUST_LOG                Override log filtering (e.g. cv_review=debug)
"#;

/// Get feedback on a CV from an OCR + chat assistant.
#[derive(Parser, Debug)]
#[command(
    name = "cv-review",
    version,
    about = "Get feedback on a CV from an OCR + chat assistant",
    long_about = "Upload a CV (PDF or image). Its text is extracted with Mistral OCR and \
reviewed by a chat model; you can then ask follow-up questions in the same conversation.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// CV to analyse right away (pdf, jpg, jpeg, png).
    file: Option<PathBuf>,

    /// OCR model ID.
    #[arg(long, env = "CV_REVIEW_OCR_MODEL", default_value = cv_review::config::DEFAULT_OCR_MODEL)]
    ocr_model: String,

    /// Chat model ID.
    #[arg(long, env = "CV_REVIEW_CHAT_MODEL", default_value = cv_review::config::DEFAULT_CHAT_MODEL)]
    chat_model: String,

    /// Chat provider (edgequake-llm name: mistral, openai, anthropic, ollama, …).
    #[arg(long, env = "CV_REVIEW_PROVIDER", default_value = cv_review::config::DEFAULT_CHAT_PROVIDER)]
    provider: String,

    /// OCR API base URL.
    #[arg(long, env = "CV_REVIEW_API_BASE", default_value = cv_review::config::DEFAULT_API_BASE_URL)]
    api_base: String,

    /// Chat temperature (0.0–2.0).
    #[arg(long, env = "CV_REVIEW_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Max tokens per reply.
    #[arg(long, env = "CV_REVIEW_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Per-call timeout in seconds for OCR and chat.
    #[arg(long, env = "CV_REVIEW_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "CV_REVIEW_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Save the conversation to this JSON file on exit.
    #[arg(long, env = "CV_REVIEW_TRANSCRIPT")]
    transcript: Option<PathBuf>,

    /// Don't ask OCR for inline images (smaller responses).
    #[arg(long)]
    no_images: bool,

    /// Disable spinners.
    #[arg(long, env = "CV_REVIEW_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CV_REVIEW_VERBOSE")]
    verbose: bool,

    /// Suppress everything except the conversation and errors.
    #[arg(short, long, env = "CV_REVIEW_QUIET")]
    quiet: bool,
}

/// One line of user input.
#[derive(Debug, PartialEq)]
enum Command {
    Upload(PathBuf),
    Reset,
    History,
    Save(PathBuf),
    Help,
    Quit,
    Text(String),
    Empty,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Text(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match (name.to_lowercase().as_str(), arg) {
        ("upload", a) if !a.is_empty() => Command::Upload(PathBuf::from(a)),
        ("save", a) if !a.is_empty() => Command::Save(PathBuf::from(a)),
        ("reset", _) => Command::Reset,
        ("history", _) => Command::History,
        ("help", _) | ("?", _) => Command::Help,
        ("quit", _) | ("exit", _) | ("q", _) => Command::Quit,
        // Absolute paths typed at the upload prompt.
        _ if rest.contains('/') || rest.contains('.') => Command::Text(line.to_string()),
        _ => Command::Unknown(line.to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would interleave with the conversation, so they are
    // only shown when the spinner is off and not in quiet mode.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config (fatal without the API key) ─────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ReviewProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;
    let mut assistant = CvAssistant::connect(config).context("Failed to set up clients")?;

    if !cli.quiet {
        eprintln!(
            "{} {}  {}",
            cyan("◆"),
            bold("CV review assistant"),
            dim("type /help for commands")
        );
    }

    if let Some(ref file) = cli.file {
        handle_upload(&mut assistant, file.clone()).await;
    }

    // ── Interaction loop ─────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt(assistant.state());
        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };

        match parse_command(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => eprintln!("{AFTER_HELP}"),
            Command::Reset => {
                assistant.reset();
                eprintln!("{} Session reset. Upload a new CV.", cyan("↺"));
            }
            Command::History => print_history(&assistant),
            Command::Save(path) => save(&assistant, &path).await,
            Command::Upload(path) => handle_upload(&mut assistant, path).await,
            Command::Text(text) => match assistant.state() {
                SessionState::Chatting => handle_message(&mut assistant, &text).await,
                _ => handle_upload(&mut assistant, PathBuf::from(text)).await,
            },
            Command::Unknown(cmd) => {
                eprintln!("{} Unknown command '{cmd}' (try /help)", red("✗"));
            }
        }
    }

    if let Some(ref path) = cli.transcript {
        save(&assistant, path).await;
    }

    Ok(())
}

/// Map CLI args to `ReviewConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ReviewConfig> {
    let mut builder = ReviewConfig::from_env()
        .context("Cannot start without an API key")?
        .api_base_url(cli.api_base.as_str())
        .ocr_model(cli.ocr_model.as_str())
        .chat_provider(cli.provider.as_str())
        .chat_model(cli.chat_model.as_str())
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout)
        .include_image_base64(!cli.no_images);

    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn handle_upload(assistant: &mut CvAssistant, path: PathBuf) {
    if assistant.state() == SessionState::Chatting {
        eprintln!(
            "{} A CV is already loaded. Use /reset before uploading another.",
            red("✗")
        );
        return;
    }

    let text = match assistant.ingest_path(&path).await {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{} {}", red("⚠"), red(&e.to_string()));
            return;
        }
    };

    let result = assistant.start_chat(&text).await;
    for message in assistant.session().transcript().visible() {
        print_message(message.role, &message.content);
    }
    if let Err(e) = result {
        eprintln!("{} Error in the review call: {}", red("⚠"), red(&e.to_string()));
    }
}

async fn handle_message(assistant: &mut CvAssistant, text: &str) {
    match assistant.send_message(text).await {
        Ok(reply) => print_message(Role::Assistant, &reply),
        Err(e) => eprintln!("{} {}", red("⚠"), red(&e.to_string())),
    }
}

async fn save(assistant: &CvAssistant, path: &Path) {
    match assistant.save_transcript(path).await {
        Ok(()) => eprintln!("{} Saved to {}", green("✔"), bold(&path.display().to_string())),
        Err(e) => eprintln!("{} {}", red("⚠"), red(&e.to_string())),
    }
}

fn print_prompt(state: SessionState) {
    let prompt = match state {
        SessionState::Chatting => format!("{} ", cyan("you ›")),
        _ => format!(
            "{} ",
            cyan(&format!("CV path ({}) ›", ACCEPTED_EXTENSIONS.join(", ")))
        ),
    };
    let mut err = io::stderr();
    let _ = write!(err, "{prompt}");
    let _ = err.flush();
}

fn print_message(role: Role, content: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let header = match role {
        Role::Assistant => green("assistant"),
        Role::User => bold("you"),
        Role::System => return,
    };
    let _ = writeln!(handle, "\n{header}\n{content}\n");
}

fn print_history(assistant: &CvAssistant) {
    let transcript = assistant.session().transcript();
    if transcript.is_empty() {
        eprintln!("{}", dim("(no conversation yet)"));
        return;
    }
    for message in transcript.visible() {
        print_message(message.role, &message.content);
    }
}
