//! CLI for Retouch - prompt-driven image editing.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use retouch::{EditClient, GeminiClient, Session, SessionState, SourceImage, SUGGESTED_PROMPTS};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "retouch")]
#[command(about = "Edit a photo with a natural-language instruction via Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit an image according to a prompt
    Edit(EditArgs),

    /// List the suggested quick prompts
    Prompts,
}

#[derive(Args)]
struct EditArgs {
    /// Input image (png, jpg, or webp)
    input: PathBuf,

    /// The editing instruction, or the 1-based number of a suggested prompt
    #[arg(short, long)]
    prompt: String,

    /// Output file path
    #[arg(short, long, default_value = "edited.png")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Edit(args) => run_edit(args, cli.json).await,
        Commands::Prompts => {
            list_prompts(cli.json)?;
            Ok(())
        }
    }
}

/// Expands a bare number like "2" into the matching suggested prompt.
fn resolve_prompt(raw: &str) -> String {
    if let Ok(n) = raw.trim().parse::<usize>() {
        if (1..=SUGGESTED_PROMPTS.len()).contains(&n) {
            return SUGGESTED_PROMPTS[n - 1].to_string();
        }
    }
    raw.to_string()
}

async fn run_edit(args: EditArgs, json_output: bool) -> anyhow::Result<()> {
    let prompt = resolve_prompt(&args.prompt);
    if prompt.trim().is_empty() {
        anyhow::bail!("prompt must not be empty");
    }

    let image = SourceImage::load(&args.input)
        .await
        .with_context(|| format!("failed to load {}", args.input.display()))?;

    let client = GeminiClient::builder().build()?;

    let mut session = Session::new();
    session.select_image(image);
    session.set_prompt(&prompt);

    let req = session
        .begin_edit()
        .context("submission was rejected by the session")?;
    let result = client.edit(&req.image, &req.prompt).await;
    session.apply(req.token, result);

    match session.state() {
        SessionState::Completed => {
            let outcome = session
                .outcome()
                .context("completed session is missing its outcome")?;
            let bytes = outcome.image_bytes()?;
            std::fs::write(&args.output, &bytes)
                .with_context(|| format!("failed to write {}", args.output.display()))?;

            if json_output {
                let result = serde_json::json!({
                    "success": true,
                    "output": args.output.display().to_string(),
                    "size_bytes": bytes.len(),
                    "note": outcome.note,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "Edited image: {} ({} bytes)",
                    args.output.display(),
                    bytes.len()
                );
                if let Some(ref note) = outcome.note {
                    println!("Model note: {note}");
                }
            }
            Ok(())
        }
        _ => {
            let message = session
                .error()
                .unwrap_or("Failed to generate image. Please try again.")
                .to_string();
            if json_output {
                let result = serde_json::json!({
                    "success": false,
                    "error": message,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            anyhow::bail!(message)
        }
    }
}

fn list_prompts(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(&SUGGESTED_PROMPTS)?);
    } else {
        println!("Suggested prompts:\n");
        for (i, p) in SUGGESTED_PROMPTS.iter().enumerate() {
            println!("  {}. {}", i + 1, p);
        }
    }
    Ok(())
}
