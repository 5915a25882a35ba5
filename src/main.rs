use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use agrovoice_gateway::api::{ApiServer, ApiState};
use agrovoice_gateway::audio::{Normalizer, SAMPLE_RATE};
use agrovoice_gateway::{
    Config, EspeakTts, OllamaClient, PlaybackCoordinator, QaPipeline, SensorClient, SpeechToText,
    Synthesizer, Transcriber,
};

/// Agrovoice - voice question-answering gateway for a field assistant
#[derive(Parser)]
#[command(name = "agrovoice", version, about)]
struct Cli {
    /// Host to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Synthesize a phrase to a WAV file (checks the TTS install)
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hola, soy tu asistente de campo.")]
        text: String,
        /// Output file
        #[arg(short, long, default_value = "test-tts.wav")]
        output: PathBuf,
    },
    /// Poll the humidity sensor once and print the reading
    TestSensor,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,agrovoice_gateway=info",
        1 => "info,agrovoice_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestTts { text, output } => test_tts(&config, &text, &output).await,
            Command::TestSensor => test_sensor(&config).await,
        };
    }

    tracing::info!(
        host = %cli.host,
        port = cli.port,
        model = %config.ollama_model,
        local_stt = config.stt.use_local,
        "starting agrovoice gateway"
    );

    let state = build_state(&config)?;
    let server = ApiServer::new(state, cli.host, cli.port, config.static_dir.clone());

    server.run().await?;
    Ok(())
}

/// Wire the collaborators into shared API state
fn build_state(config: &Config) -> anyhow::Result<Arc<ApiState>> {
    let transcriber: Arc<dyn Transcriber> = if config.stt.use_local {
        Arc::new(SpeechToText::new_whisper_server(
            config.stt.whisper_url.clone(),
            config.stt.language.clone(),
            SAMPLE_RATE,
        )?)
    } else {
        let api_key = config.stt.google_api_key.clone().ok_or_else(|| {
            anyhow::anyhow!("GOOGLE_STT_API_KEY is required when USE_LOCAL_STT is off")
        })?;
        Arc::new(SpeechToText::new_google(
            api_key,
            config.stt.language.clone(),
            SAMPLE_RATE,
        )?)
    };

    let answerer = Arc::new(OllamaClient::new(
        config.ollama_url.clone(),
        config.ollama_model.clone(),
    )?);

    let synthesizer: Arc<dyn Synthesizer> = Arc::new(EspeakTts::new(
        config.tts.bin.clone(),
        config.tts.voice.clone(),
        SAMPLE_RATE,
    )?);

    let pipeline = QaPipeline::new(
        Normalizer::new(SAMPLE_RATE),
        transcriber,
        answerer,
        synthesizer.clone(),
    );

    let sensor = SensorClient::new(config.sensor.url.clone(), config.sensor.timeout)?;

    Ok(Arc::new(ApiState {
        coordinator: PlaybackCoordinator::new(),
        pipeline,
        synthesizer,
        sensor,
    }))
}

/// Synthesize a phrase and write it to disk
async fn test_tts(config: &Config, text: &str, output: &Path) -> anyhow::Result<()> {
    let tts = EspeakTts::new(config.tts.bin.clone(), config.tts.voice.clone(), SAMPLE_RATE)?;

    println!("Synthesizing: \"{text}\"");
    let wav = tts.synthesize(text).await?;
    std::fs::write(output, &wav)?;

    println!("Wrote {} bytes to {}", wav.len(), output.display());
    Ok(())
}

/// Poll the humidity sensor once
async fn test_sensor(config: &Config) -> anyhow::Result<()> {
    let sensor = SensorClient::new(config.sensor.url.clone(), config.sensor.timeout)?;

    println!("Polling {} ...", config.sensor.url);
    let humidity = sensor.read_humidity().await?;

    println!("Humidity: {humidity}%");
    println!("{}", agrovoice_gateway::sensor::humidity_message(humidity));
    Ok(())
}
