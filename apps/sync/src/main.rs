use clap::Parser;

use callsync_elevenlabs::{ConversationQuery, ElevenLabsClient};
use callsync_http::ReqwestClient;
use callsync_importer::build_call_request;
use callsync_tuner::{CallScope, TunerClient};

#[derive(Parser)]
#[command(name = "callsync", about = "Sync ElevenLabs voice-agent calls into Tuner")]
struct Cli {
    #[arg(long, env = "ELEVENLABS_API_KEY", hide_env_values = true)]
    elevenlabs_api_key: String,

    #[arg(
        long,
        env = "ELEVENLABS_API_BASE",
        default_value = callsync_elevenlabs::DEFAULT_API_BASE
    )]
    elevenlabs_api_base: String,

    #[arg(long, env = "ELEVENLABS_AGENT_ID")]
    agent_id: String,

    #[arg(long, env = "TUNER_API_KEY", hide_env_values = true)]
    tuner_api_key: String,

    #[arg(long, env = "TUNER_API_BASE", default_value = "https://api.usetuner.ai")]
    tuner_api_base: String,

    #[arg(long, env = "TUNER_WORKSPACE_ID")]
    workspace_id: String,

    #[arg(long, env = "TUNER_AGENT_REMOTE_IDENTIFIER")]
    agent_remote_identifier: String,

    /// Sync window size when no explicit bounds are given.
    #[arg(long, env = "TIME_WINDOW_HOURS", default_value_t = 24)]
    time_window_hours: i64,

    /// Window start as a unix timestamp in seconds.
    #[arg(long, env = "START_TIME_UNIX")]
    start_time: Option<i64>,

    /// Window end as a unix timestamp in seconds.
    #[arg(long, env = "END_TIME_UNIX")]
    end_time: Option<i64>,
}

impl Cli {
    fn window(&self) -> (i64, i64) {
        let now = chrono::Utc::now().timestamp();
        let start = self
            .start_time
            .unwrap_or(now - self.time_window_hours * 3600);
        let end = self.end_time.unwrap_or(now);
        (start, end)
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, "sync_failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (start_time, end_time) = cli.window();

    let elevenlabs_http = ReqwestClient::new(&cli.elevenlabs_api_base)
        .map_err(|err| anyhow::anyhow!(err))?
        .with_header("xi-api-key", &cli.elevenlabs_api_key);
    let elevenlabs =
        ElevenLabsClient::new(elevenlabs_http).with_api_base(&cli.elevenlabs_api_base);

    let tuner_http = ReqwestClient::new(&cli.tuner_api_base)
        .map_err(|err| anyhow::anyhow!(err))?
        .with_header("X-API-Key", &cli.tuner_api_key);
    let tuner = TunerClient::new(tuner_http);

    let scope = CallScope {
        workspace_id: cli.workspace_id,
        agent_remote_identifier: cli.agent_remote_identifier,
    };

    let query = ConversationQuery {
        agent_id: cli.agent_id,
        call_start_after_unix: Some(start_time),
        call_start_before_unix: Some(end_time),
    };

    tracing::info!(agent_id = %query.agent_id, start_time, end_time, "sync_started");

    // Listing failure is fatal; per-conversation failures are tallied below.
    let conversations = elevenlabs.fetch_conversations(&query).await?;

    if conversations.is_empty() {
        tracing::info!("no_conversations_in_window");
        return Ok(());
    }

    let total = conversations.len();
    let mut pushed = 0usize;
    let mut failed = 0usize;

    for (index, conversation) in conversations.iter().enumerate() {
        let conversation_id = conversation.conversation.conversation_id.as_str();

        let request = match build_call_request(conversation) {
            Ok(request) => request,
            Err(err) => {
                failed += 1;
                tracing::warn!(
                    index = index + 1,
                    total,
                    conversation_id = %conversation_id,
                    error = %err,
                    "call_mapping_failed"
                );
                continue;
            }
        };

        match tuner.create_call(&scope, &request).await {
            Ok(response) => {
                pushed += 1;
                tracing::info!(
                    index = index + 1,
                    total,
                    conversation_id = %conversation_id,
                    tuner_call_id = response.id,
                    is_new = response.is_new,
                    "call_pushed"
                );
            }
            Err(err) => {
                failed += 1;
                tracing::warn!(
                    index = index + 1,
                    total,
                    conversation_id = %conversation_id,
                    error = %err,
                    "call_push_failed"
                );
            }
        }
    }

    tracing::info!(pushed, failed, total, "sync_finished");
    Ok(())
}
