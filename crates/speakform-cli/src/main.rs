//! speakform CLI — submit text for speech synthesis.
//!
//! ```text
//! speakform submit "hello world" [--endpoint http://localhost:5000/process-text]
//! speakform submit --file notes.txt [--download out.mp3]
//! speakform serve [--port 3000] [--host 127.0.0.1]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, error, info};

use speakform_lib::controller::SubmissionController;
use speakform_lib::download::download_audio;
use speakform_lib::speakform_core::input::{FileRef, SubmissionForm};
use speakform_lib::speakform_core::types::{ClientConfig, DEFAULT_ENDPOINT, DEFAULT_MAX_FILE_BYTES};

/// speakform — turn text into a synthesized audio file
#[derive(Parser)]
#[command(name = "speakform", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit text or a .txt file and print the audio URL
    Submit {
        /// Text to synthesize. Ignored when --file is given.
        text: Option<String>,
        /// Text file to synthesize
        #[arg(long, short)]
        file: Option<PathBuf>,
        /// Save the resulting audio to this path
        #[arg(long, short)]
        download: Option<PathBuf>,
        #[command(flatten)]
        client: ClientArgs,
    },
    /// Serve the submission form over HTTP
    Serve {
        /// Listen port
        #[arg(long, default_value = "3000")]
        port: u16,
        /// Listen host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[command(flatten)]
        client: ClientArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct ClientArgs {
    /// Text processing endpoint
    #[arg(long, env = "SPEAKFORM_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
    /// Request timeout in seconds, 0 to wait indefinitely
    #[arg(long, env = "SPEAKFORM_TIMEOUT_SECS", default_value = "120")]
    timeout_secs: u64,
    /// Largest accepted text file in bytes
    #[arg(long, env = "SPEAKFORM_MAX_FILE_BYTES", default_value_t = DEFAULT_MAX_FILE_BYTES)]
    max_file_bytes: u64,
}

impl ClientArgs {
    fn config(&self) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            max_file_bytes: self.max_file_bytes,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "speakform=info,speakform_lib=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Submit {
            text,
            file,
            download,
            client,
        } => submit(text, file, download, &client.config()).await,

        Command::Serve { port, host, client } => serve(&host, port, &client.config()).await,
    }
}

async fn submit(
    text: Option<String>,
    file: Option<PathBuf>,
    download: Option<PathBuf>,
    config: &ClientConfig,
) -> ExitCode {
    let controller = match SubmissionController::new(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let form = SubmissionForm::new(text.unwrap_or_default(), file.map(FileRef::from_path));
    let audio_url = match controller.submit_form(&form).await {
        Ok(url) => url,
        Err(e) => {
            debug!("submission error: {e}");
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };
    println!("{audio_url}");

    if let Some(dest) = download {
        let result = download_audio(&audio_url, &dest, |p| {
            debug!("download {:.0}% ({} bytes)", p.percent, p.bytes_done);
        })
        .await;
        if let Err(e) = result {
            error!("{e}");
            eprintln!("audio is available at {audio_url} but could not be saved: {e}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

async fn serve(host: &str, port: u16, config: &ClientConfig) -> ExitCode {
    let controller = match SubmissionController::new(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let addr = format!("{host}:{port}");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("failed to bind {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("speakform listening on http://{addr}, posting to {}", controller.endpoint());

    let app = speakform_lib::server::router(controller);
    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
