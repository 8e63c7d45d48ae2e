use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use habla_appcore::TutorService;
use habla_core::config::{ConfigValue, Configuration};
use habla_core::reply::{CorrectionReply, TranslationReply, conversation_speech_line};
use habla_core::types::BackendOutcome;
use habla_runtime::logs;
use habla_runtime::paths::AppPaths;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Spanish practice assistant backed by a local or hosted model service
#[derive(Parser)]
#[command(name = "habla")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Append logs to today's file in the log directory instead of stderr
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate English text to Spanish
    Translate {
        text: Vec<String>,
    },

    /// Check Spanish text for mistakes
    Correct {
        text: Vec<String>,
    },

    /// Practice conversation; interactive when no message is given
    Chat {
        message: Vec<String>,

        /// The input is English rather than Spanish
        #[arg(long)]
        english: bool,
    },

    /// List models installed for the local service
    Models,

    /// List models offered by the cloud service
    CloudModels,

    /// Probe the local model service
    TestConnection,

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Store the cloud API key; read from stdin when omitted
    SetKey {
        key: Option<String>,
    },

    /// Log file housekeeping
    Logs {
        #[command(subcommand)]
        action: LogsAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print every setting as JSON
    Show,
    /// Print file locations and the active backend
    Info,
    /// Set one setting; the value is read as bool, number or text
    Set { key: String, value: String },
    /// Restore defaults
    Reset,
}

#[derive(Subcommand)]
enum LogsAction {
    /// Delete log files older than the given number of days
    Clean {
        #[arg(long, default_value = "30")]
        days: u32,
    },
    /// Count and size of log files
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let paths = AppPaths::discover()?;
    init_logging(&startup_log_level(&paths), &paths.logs_dir, cli.log_file)?;
    let svc = TutorService::new(paths)?;

    match cli.command {
        Commands::Translate { text } => {
            let out = svc.translate(&join(&text)?).await;
            Ok(print_outcome(out, |t| {
                let r = TranslationReply::parse(t);
                match r.spanish {
                    Some(es) => {
                        let mut s = format!("Spanish: {es}");
                        if let Some(notes) = r.notes {
                            s.push_str(&format!("\nNotes: {notes}"));
                        }
                        s
                    }
                    None => t.to_string(),
                }
            }))
        }
        Commands::Correct { text } => {
            let out = svc.correct(&join(&text)?).await;
            Ok(print_outcome(out, |t| {
                let r = CorrectionReply::parse(t);
                if r.is_confirmed_correct() {
                    format!("✓ Correct!\n{t}")
                } else {
                    t.to_string()
                }
            }))
        }
        Commands::Chat { message, english } => {
            if message.is_empty() {
                chat_loop(&svc, !english).await
            } else {
                let out = svc.converse(&join(&message)?, !english).await;
                Ok(print_outcome(out, str::to_string))
            }
        }
        Commands::Models => {
            let models = svc.list_local_models().await;
            if models.is_empty() {
                eprintln!("No local models found. Install one with: ollama pull <model>");
                return Ok(ExitCode::FAILURE);
            }
            for m in models {
                println!("{m}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::CloudModels => {
            let current = svc.load_config().preferred_model().to_string();
            for m in svc.list_cloud_models() {
                let marker = if m.name == current { "*" } else { " " };
                println!("{marker} {:<26} {}", m.name, m.description);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::TestConnection => {
            let status = svc.test_connection().await;
            if status.connected {
                println!("Connected: {} models found", status.models_found);
                for m in &status.models {
                    println!("  {m}");
                }
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!(
                    "Connection failed: {}",
                    status.error.as_deref().unwrap_or("unknown error")
                );
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Config { action } => config_command(&svc, action),
        Commands::SetKey { key } => {
            let key = match key {
                Some(k) => k,
                None => read_key().await?,
            };
            svc.set_api_key(&key)?;
            println!(
                "API key saved to {}",
                svc.config_info().secrets_file.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Logs { action } => {
            let dir = &svc.paths().logs_dir;
            match action {
                LogsAction::Clean { days } => {
                    let removed = logs::clear_old_logs(dir, days);
                    println!("Deleted {removed} log files older than {days} days");
                }
                LogsAction::Stats => {
                    let stats = logs::log_stats(dir);
                    println!("Log directory: {}", dir.display());
                    println!("Files: {}", stats.files);
                    println!("Total size: {:.2} MB", stats.total_bytes as f64 / 1_048_576.0);
                    if let Some(newest) = stats.newest {
                        let when = logs::format_modified(&newest).unwrap_or_default();
                        println!("Newest: {} {when}", newest.display());
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn config_command(svc: &TutorService, action: ConfigAction) -> anyhow::Result<ExitCode> {
    match action {
        ConfigAction::Show => {
            let cfg = svc.load_config();
            println!(
                "{}",
                serde_json::to_string_pretty(&cfg).context("encode configuration")?
            );
        }
        ConfigAction::Info => {
            let info = svc.config_info();
            println!("Config file:  {}", info.config_file.display());
            println!("Secrets file: {}", info.secrets_file.display());
            println!("Log dir:      {}", info.logs_dir.display());
            println!(
                "Backend:      {} ({})",
                if info.use_cloud { "cloud" } else { "local" },
                info.endpoint
            );
            println!("Model:        {}", info.preferred_model);
            println!(
                "API key:      {}",
                if info.has_api_key { "set" } else { "not set" }
            );
        }
        ConfigAction::Set { key, value } => {
            let cfg = svc.load_config().with(&key, ConfigValue::parse_loose(&value));
            svc.save_config(&cfg)?;
            println!("{key} = {}", ConfigValue::parse_loose(&value));
        }
        ConfigAction::Reset => {
            svc.reset_config()?;
            println!("Configuration reset to defaults");
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn chat_loop(svc: &TutorService, spanish: bool) -> anyhow::Result<ExitCode> {
    println!("Type a message and press Enter. Empty line or 'exit' to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.context("read stdin")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let out = svc.converse(line, spanish).await;
        if out.is_success() {
            let text = out.text();
            println!("{text}");
            if let Some(first) = conversation_speech_line(text) {
                log::debug!("speech line: {first}");
            }
        } else {
            eprintln!("{}", out.text());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_outcome(out: BackendOutcome, render: impl FnOnce(&str) -> String) -> ExitCode {
    match out {
        BackendOutcome::Success(text) => {
            println!("{}", render(&text));
            ExitCode::SUCCESS
        }
        BackendOutcome::Failure { category, message } => {
            log::debug!("request failed: {category}");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn join(words: &[String]) -> anyhow::Result<String> {
    let text = words.join(" ");
    if text.trim().is_empty() {
        anyhow::bail!("no text given");
    }
    Ok(text)
}

async fn read_key() -> anyhow::Result<String> {
    print!("API key: ");
    std::io::stdout().flush().ok();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let key = lines.next_line().await.context("read stdin")?.unwrap_or_default();
    Ok(key.trim().to_string())
}

/// Level saved in the config file, read without touching disk so the logger is up before the
/// service bootstraps its files.
fn startup_log_level(paths: &AppPaths) -> String {
    std::fs::read(&paths.config_file)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Configuration>(&bytes).ok())
        .map(|cfg| cfg.log_level().to_string())
        .unwrap_or_else(|| "INFO".to_string())
}

fn init_logging(level: &str, logs_dir: &Path, to_file: bool) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level_filter(level)).parse_default_env();
    if to_file {
        let file = logs::open_log_file(logs_dir)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().context("initialize logging")?;
    log::info!("logging initialized at {level}");
    Ok(())
}

/// Accepts the level names written by older config files as well as `log`'s own.
fn level_filter(name: &str) -> log::LevelFilter {
    match name.trim().to_ascii_uppercase().as_str() {
        "WARNING" => log::LevelFilter::Warn,
        "CRITICAL" | "FATAL" => log::LevelFilter::Error,
        other => other.parse().unwrap_or(log::LevelFilter::Info),
    }
}
