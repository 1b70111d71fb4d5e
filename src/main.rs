use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vision_describer::ai::{build_client, DescriptionService};
use vision_describer::image::{self, ImagePayload};
use vision_describer::models::{parse_max_tokens, AiProvider, Config, DetailLevel, Language};
use vision_describer::text::strip_markdown;

#[derive(Debug, Parser)]
#[command(name = "vision-describer")]
#[command(about = "Describe images with OpenAI or Gemini vision models")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Describe an image file or URL.
    Describe(DescribeArgs),
    /// Check that the configured API key is accepted.
    TestConnection(ProviderArgs),
}

#[derive(Debug, Args)]
struct ProviderArgs {
    /// Override AI_PROVIDER (openai or gemini).
    #[arg(long, value_parser = parse_provider_arg)]
    provider: Option<AiProvider>,
}

#[derive(Debug, Args)]
struct DescribeArgs {
    /// Path to an image file, or an http(s) URL.
    #[arg(value_name = "IMAGE")]
    image: String,

    #[command(flatten)]
    provider: ProviderArgs,

    /// low, auto or high. Unknown values use auto.
    #[arg(long)]
    detail: Option<String>,

    /// es, en or fr. Unknown values use es.
    #[arg(long)]
    language: Option<String>,

    /// Output token budget for the high detail level.
    #[arg(long, value_parser = parse_max_tokens_arg)]
    max_tokens: Option<u32>,

    /// Print the description as returned, without removing Markdown.
    #[arg(long)]
    markdown: bool,
}

fn parse_provider_arg(input: &str) -> std::result::Result<AiProvider, String> {
    input.parse().map_err(|e| format!("{}", e))
}

fn parse_max_tokens_arg(input: &str) -> std::result::Result<u32, String> {
    parse_max_tokens(input).map_err(|e| format!("{}", e))
}

fn is_url(image: &str) -> bool {
    image.starts_with("http://") || image.starts_with("https://")
}

async fn load_image(http: &reqwest::Client, source: &str) -> Result<ImagePayload> {
    let payload = if is_url(source) {
        image::load_from_url(http, source).await
    } else {
        image::load_from_file(&PathBuf::from(source)).await
    };
    payload.with_context(|| format!("Failed to load image from {}", source))
}

fn load_config(provider: Option<AiProvider>) -> Result<Config> {
    dotenvy::dotenv().ok();
    let override_provider = provider.map(|p| p.as_str().to_string());
    let config = Config::from_lookup(|key| match (key, &override_provider) {
        ("AI_PROVIDER", Some(p)) => Some(p.clone()),
        _ => std::env::var(key).ok(),
    })?;
    Ok(config)
}

async fn describe(args: DescribeArgs) -> Result<()> {
    let mut config = load_config(args.provider.provider)?;
    if let Some(detail) = &args.detail {
        config.options.detail = DetailLevel::from(detail.as_str());
    }
    if let Some(language) = &args.language {
        config.options.language = Language::from(language.as_str());
    }
    if let Some(max_tokens) = args.max_tokens {
        config.options.max_tokens = max_tokens;
    }

    let http = reqwest::Client::new();
    let client = build_client(&config, http.clone())?;
    let payload = load_image(&http, &args.image).await?;

    info!(
        "Describing {} (detail: {}, language: {})",
        args.image,
        config.options.detail.as_str(),
        config.options.language.as_str()
    );
    let description = client.describe_image(&payload, &config.options).await?;

    if args.markdown {
        println!("{}", description);
    } else {
        println!("{}", strip_markdown(&description));
    }
    Ok(())
}

async fn test_connection(args: ProviderArgs) -> Result<bool> {
    let config = load_config(args.provider)?;
    let client = build_client(&config, reqwest::Client::new())?;
    Ok(client.test_connection().await)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vision_describer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    match args.command {
        Command::Describe(describe_args) => {
            if let Err(e) = describe(describe_args).await {
                error!("Description failed: {:#}", e);
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
            Ok(())
        }
        Command::TestConnection(provider_args) => match test_connection(provider_args).await {
            Ok(true) => {
                println!("ok");
                Ok(())
            }
            Ok(false) => {
                println!("failed");
                std::process::exit(1);
            }
            Err(e) => {
                error!("Connection test failed: {:#}", e);
                println!("failed");
                std::process::exit(1);
            }
        },
    }
}
