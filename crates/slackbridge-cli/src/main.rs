use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slackbridge_core::{BridgeConfig, SourceMessage};
use slackbridge_parser::{ChannelNames, FileFetcher, MessageParser, SlackApiClient, StaticDirectory};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "slackbridge")]
#[command(author, version, about = "Render Slack message events as Matrix event content", long_about = None)]
struct Args {
    /// Path to slackbridge.toml
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single event
    Render {
        /// Event JSON file (stdin when omitted)
        #[arg(long)]
        event: Option<PathBuf>,
    },
    /// Render every event of a JSON-lines file, one output line per event
    Replay { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slackbridge=info".into()),
        )
        .init();

    let args = Args::parse();

    // explicit path > SLACKBRIDGE_CONFIG env > ~/.slackbridge/slackbridge.toml
    let config = BridgeConfig::load(args.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        BridgeConfig::default()
    });

    let slack = SlackApiClient::from_config(&config.slack).map(Arc::new);
    let parser = build_parser(&config, slack.clone());
    let file_client = slack.as_deref().map(|c| c as &dyn FileFetcher);

    match args.command {
        Command::Render { event } => {
            let raw = match event {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            println!("{}", render_event(&parser, file_client, &raw).await?);
        }
        Command::Replay { file } => {
            let reader = BufReader::new(
                std::fs::File::open(&file).with_context(|| format!("opening {}", file.display()))?,
            );
            let stdout = std::io::stdout();
            let (rendered, skipped) =
                replay(&parser, file_client, reader, &mut stdout.lock()).await?;
            info!(events = rendered, skipped, "replay complete");
        }
    }

    Ok(())
}

/// Wire the parser to the static directory, using the Web API for channel
/// names when a bot token is configured.
fn build_parser(config: &BridgeConfig, slack: Option<Arc<SlackApiClient>>) -> MessageParser {
    let dir = Arc::new(StaticDirectory::from_config(&config.directory));
    let channels: Arc<dyn ChannelNames> = match slack {
        Some(client) => client as Arc<dyn ChannelNames>,
        None => dir.clone(),
    };
    MessageParser::new(dir.clone(), dir.clone(), channels, dir).with_config(&config.parser)
}

/// One event in, one JSON document out (`null` when suppressed).
async fn render_event(
    parser: &MessageParser,
    file_client: Option<&dyn FileFetcher>,
    raw: &str,
) -> Result<String> {
    let msg = SourceMessage::from_json(raw).context("invalid event")?;
    debug!(channel = %msg.channel, ts = %msg.ts, "rendering event");
    let content = parser.parse(&msg, file_client).await?;
    Ok(serde_json::to_string(&content)?)
}

/// Render each non-blank line of `reader` to `out`. A line that fails is
/// logged and written as `null` so output lines stay aligned with input.
async fn replay<R: BufRead, W: Write>(
    parser: &MessageParser,
    file_client: Option<&dyn FileFetcher>,
    reader: R,
    out: &mut W,
) -> Result<(usize, usize)> {
    let (mut rendered, mut skipped) = (0usize, 0usize);
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match render_event(parser, file_client, &line).await {
            Ok(json) => {
                writeln!(out, "{json}")?;
                rendered += 1;
            }
            Err(e) => {
                warn!(line = idx + 1, error = %format!("{e:#}"), "skipping event");
                writeln!(out, "null")?;
                skipped += 1;
            }
        }
    }
    Ok((rendered, skipped))
}
