/**
 * SocialSync Agent Entry Point
 *
 * Command-line driver for the sync core. Queues actions into the local
 * database and drains them against the configured backend.
 */
use socialsync::client::cache::{CacheKey, CacheValue};
use socialsync::client::offline::ActionKind;
use socialsync::client::sync::DrainReport;
use socialsync::client::{Config, ConnectivityState, SyncRuntime};

const USAGE: &str = "usage: socialsync-agent <command>

commands:
  post <body>                          queue a new post
  comment <post_id> <body>             queue a comment
  like <post_id>                       queue a like
  message <conversation_id> <content>  queue a chat message
  sync                                 deliver everything queued
  status                               list queued actions
  conversations                        fetch the conversation list

environment:
  SOCIALSYNC_CONFIG    path to a TOML config file
  SOCIALSYNC_API_URL   backend base URL
  SOCIALSYNC_TOKEN     session token sent as a bearer token
  SOCIALSYNC_OFFLINE   set to queue without delivering";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let mut config = match std::env::var("SOCIALSYNC_CONFIG") {
        Ok(path) => Config::from_file(path)?,
        Err(_) => Config::new(),
    };
    config.set_token(std::env::var("SOCIALSYNC_TOKEN").ok());

    let connectivity = if std::env::var_os("SOCIALSYNC_OFFLINE").is_some() {
        ConnectivityState::Offline
    } else {
        ConnectivityState::Online
    };

    tracing::info!(server = config.server_url(), db = %config.database_path().display(), "agent starting");
    let runtime = SyncRuntime::builder(config)
        .initial_connectivity(connectivity)
        .build()
        .await?;
    let engine = runtime.engine();

    let kind = match (command, &args[1..]) {
        ("post", [body]) => Some(ActionKind::CreatePost { body: body.clone() }),
        ("comment", [post_id, body]) => Some(ActionKind::CreateComment {
            post_id: post_id.parse()?,
            body: body.clone(),
        }),
        ("like", [post_id]) => Some(ActionKind::LikePost {
            post_id: post_id.parse()?,
        }),
        ("message", [conversation_id, content]) => Some(ActionKind::SendMessage {
            conversation_id: conversation_id.parse()?,
            content: content.clone(),
        }),
        ("sync", []) => {
            print_report(&engine.request_sync().await);
            None
        }
        ("status", []) => {
            let pending = engine.pending().await;
            println!("{} pending", pending.len());
            for action in pending {
                println!("  {}  {:<14} {}", action.id, action.kind.name(), action.created_at.to_rfc3339());
            }
            None
        }
        ("conversations", []) => {
            let entry = runtime.cache().get(CacheKey::ConversationList).await?;
            if let CacheValue::Conversations(conversations) = entry.visible() {
                for conversation in conversations {
                    println!(
                        "  [{}] {} ({} unread): {}",
                        conversation.id, conversation.title, conversation.unread_count, conversation.last_message_preview
                    );
                }
            }
            None
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    if let Some(kind) = kind {
        let id = engine.enqueue(kind).await?;
        println!("queued {}", id);
        if runtime.connectivity().is_online() {
            // enqueue already spawned a drain; waiting on a second one waits for it
            print_report(&engine.drain().await);
        }
    }

    Ok(())
}

fn print_report(report: &DrainReport) {
    println!(
        "dispatched {}, succeeded {}, rejected {}, evicted {}",
        report.dispatched, report.succeeded, report.rejected, report.evicted
    );
    if let Some(stop) = &report.stopped {
        println!("stopped early: {:?}", stop);
    }
}
