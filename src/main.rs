use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use polyglot_bot::daemon::Services;
use polyglot_bot::language::LanguageProfile;
use polyglot_bot::{Config, Daemon};

/// Polyglot - voice-enabled language tutor bot for Telegram
#[derive(Parser)]
#[command(name = "polyglot", version, about)]
struct Cli {
    /// Config file (default: ~/.config/polyglot/config.toml)
    #[arg(short, long, env = "POLYGLOT_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Transcribe a local voice note
    Transcribe {
        /// Path to an OGG/Opus voice note
        file: PathBuf,
    },
    /// Synthesize speech into an MP3 file
    Speak {
        /// Text to speak
        text: String,
        /// Language to speak in
        #[arg(short, long, default_value = "english")]
        language: String,
        /// Output file
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Generate and print one quiz question
    QuizPreview,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,polyglot_bot=info",
        1 => "info,polyglot_bot=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config.quiz, ?config.audio, "loaded configuration");

    match cli.command {
        Some(Command::Transcribe { file }) => transcribe(&config, &file).await,
        Some(Command::Speak {
            text,
            language,
            out,
        }) => speak(&config, &text, &language, &out).await,
        Some(Command::QuizPreview) => quiz_preview(&config).await,
        None => {
            tracing::info!("starting polyglot bot");
            Daemon::new(config).run().await?;
            Ok(())
        }
    }
}

/// Run a local voice note through the decode pipeline
async fn transcribe(config: &Config, file: &std::path::Path) -> anyhow::Result<()> {
    let services = Services::build(config)?;
    let raw = tokio::fs::read(file).await?;

    let transcript = services.pipeline.decode_voice_note(&raw).await?;
    println!("{transcript}");
    Ok(())
}

/// Synthesize `text` and write the MP3 to `out`
async fn speak(
    config: &Config,
    text: &str,
    language: &str,
    out: &std::path::Path,
) -> anyhow::Result<()> {
    let profile = LanguageProfile::lookup(language)
        .ok_or_else(|| anyhow::anyhow!("unsupported language: {language}"))?;
    let services = Services::build(config)?;

    let artifact = services.pipeline.synthesize_speech(text, profile).await?;
    let audio = artifact.read().await?;
    artifact.release();

    tokio::fs::write(out, &audio).await?;
    println!("Wrote {} bytes to {}", audio.len(), out.display());
    Ok(())
}

/// Print one generated quiz question
async fn quiz_preview(config: &Config) -> anyhow::Result<()> {
    let services = Services::build(config)?;
    let question = services.generator.generate().await?;

    println!(
        "{}: {}",
        services.generator.prompt_language().display_name(),
        question.prompt_sentence()
    );
    println!("{}", question.options_text());
    println!("Answer: {}", question.correct_answer());
    Ok(())
}
