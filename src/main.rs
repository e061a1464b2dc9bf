use anyhow::{bail, Context, Result};
use app_events::api::ApiClient;
use app_events::applications::ApplicationsClient;
use app_events::config::{default_config_path, load_config, resolve_settings};
use app_events::event::{FixedScreen, ObjectId, Properties};
use app_events::transport::{HttpTransport, JsonlTransport, Transport};
use app_events::EventBatcher;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage:
  app-events [--config PATH] [--sink FILE] record <action> <object_type> <object_id> [key=value ...] [-- <action> ...]
  app-events [--config PATH] [--sink FILE] apps list [TERM]
  app-events [--config PATH] [--sink FILE] apps show <ID>";

struct CliArgs {
    config: Option<PathBuf>,
    sink: Option<PathBuf>,
    command: Command,
}

enum Command {
    Record(Vec<EventArgs>),
    ListApps(Option<String>),
    ShowApp(i64),
}

struct EventArgs {
    action: String,
    object_type: String,
    object_id: ObjectId,
    properties: Properties,
}

fn usage_exit() -> ! {
    eprintln!("{}", USAGE);
    std::process::exit(1);
}

fn parse_cli_args() -> CliArgs {
    let mut args = std::env::args().skip(1);
    let mut config = None;
    let mut sink = None;
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = args.next().map(PathBuf::from),
            "--sink" => sink = args.next().map(PathBuf::from),
            _ => positional.push(arg),
        }
    }

    let command = parse_command(positional).unwrap_or_else(|| usage_exit());
    CliArgs {
        config,
        sink,
        command,
    }
}

fn parse_command(positional: Vec<String>) -> Option<Command> {
    let (name, rest) = positional.split_first()?;
    match name.as_str() {
        "record" => {
            let events = rest
                .split(|arg| arg == "--")
                .filter(|group| !group.is_empty())
                .map(parse_event)
                .collect::<Option<Vec<_>>>()?;
            (!events.is_empty()).then_some(Command::Record(events))
        }
        "apps" => match rest {
            [sub] if sub == "list" => Some(Command::ListApps(None)),
            [sub, term] if sub == "list" => Some(Command::ListApps(Some(term.clone()))),
            [sub, id] if sub == "show" => id.parse().ok().map(Command::ShowApp),
            _ => None,
        },
        _ => None,
    }
}

fn parse_event(group: &[String]) -> Option<EventArgs> {
    let [action, object_type, raw_id, pairs @ ..] = group else {
        return None;
    };
    let object_id = match raw_id.parse::<i64>() {
        Ok(id) => ObjectId::Int(id),
        Err(_) => ObjectId::Str(raw_id.clone()),
    };

    let mut properties = Properties::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=')?;
        let value = serde_json::from_str::<Value>(value)
            .unwrap_or_else(|_| Value::String(value.to_string()));
        properties.insert(key.to_string(), value);
    }

    Some(EventArgs {
        action: action.clone(),
        object_type: object_type.clone(),
        object_id,
        properties,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("app_events=info")),
        )
        .init();

    let CliArgs {
        config,
        sink,
        command,
    } = parse_cli_args();

    let config_path = config.or_else(default_config_path);
    let loaded = config_path.as_deref().and_then(load_config);
    let settings = resolve_settings(loaded.as_ref(), |key| std::env::var(key).ok());
    for warning in &settings.warnings {
        warn!("{}", warning);
    }

    let transport: Arc<dyn Transport> = match &sink {
        Some(path) => Arc::new(
            JsonlTransport::new(path)
                .await
                .with_context(|| format!("failed to open event sink {}", path.display()))?,
        ),
        None => Arc::new(HttpTransport::new(
            settings.endpoint.clone(),
            settings.access_token.clone(),
        )),
    };

    // One batcher for the whole process; every event goes through it.
    let batcher = Arc::new(EventBatcher::spawn(
        transport,
        Arc::new(FixedScreen(settings.screen)),
        settings.quiescence,
    ));

    let outcome = run(command, &settings.api_base_url, settings.api_key.clone(), &batcher).await;

    info!(pending = batcher.pending_len(), "flushing recorded events");
    batcher.drain().await;
    outcome
}

async fn run(
    command: Command,
    api_base_url: &str,
    api_key: Option<String>,
    batcher: &Arc<EventBatcher>,
) -> Result<()> {
    match command {
        Command::Record(events) => {
            for event in events {
                let properties = (!event.properties.is_empty()).then_some(event.properties);
                batcher.record(&event.action, &event.object_type, event.object_id, properties);
            }
        }
        Command::ListApps(term) => {
            let apps = ApplicationsClient::new(ApiClient::new(api_base_url, api_key))
                .with_events(Arc::clone(batcher));
            let found = apps
                .query(term.as_deref())
                .await
                .context("failed to list applications")?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        Command::ShowApp(id) => {
            if id <= 0 {
                bail!("application id must be positive");
            }
            let apps = ApplicationsClient::new(ApiClient::new(api_base_url, api_key))
                .with_events(Arc::clone(batcher));
            let app = apps
                .get(id)
                .await
                .with_context(|| format!("failed to load application {}", id))?;
            println!("{}", serde_json::to_string_pretty(&app)?);
        }
    }
    Ok(())
}
