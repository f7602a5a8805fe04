//! Lectern command-line client
//!
//! Inspects and resets the device fingerprint, stores credentials, resolves
//! protected lecture content through the authenticated session, and prints
//! watermark tilings.
//!
//! Usage:
//!   lectern device show
//!   lectern login --access-token A --refresh-token R
//!   lectern resolve --lecture lec-1 --kind document

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use lectern_cli::{plan_watermark, Client, ResolveSummary, Settings};
use lectern_types::{ContentKind, LectureId, LectureRef, ViewerIdentity};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(about = "Lectern protected-content client")]
struct Args {
    /// Session config file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend API base URL, overriding the config file
    #[arg(long, global = true)]
    api_base_url: Option<String>,

    /// Durable store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Device fingerprint operations
    Device {
        #[command(subcommand)]
        action: DeviceAction,
    },
    /// Print the watermark tile plan for a surface as JSON
    Watermark {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Resolve a lecture's protected content
    Resolve {
        #[arg(long)]
        lecture: LectureId,
        /// video or document
        #[arg(long)]
        kind: ContentKind,
    },
    /// Store credentials issued by the login service
    Login {
        #[arg(long)]
        access_token: String,
        #[arg(long)]
        refresh_token: String,
    },
}

#[derive(Subcommand, Debug)]
enum DeviceAction {
    /// Print the device fingerprint, creating it if needed
    Show,
    /// Replace the device fingerprint
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let settings = Settings {
        config: args.config,
        api_base_url: args.api_base_url,
        store: args.store,
    };

    match args.command {
        Command::Watermark {
            width,
            height,
            email,
            phone,
        } => {
            let identity = ViewerIdentity::new(email, phone);
            if identity.is_blank() {
                bail!("Watermark needs --email or --phone");
            }
            let plan = plan_watermark(width, height, &identity);
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Command::Device { action } => {
            let client = Client::open(&settings)?;
            match action {
                DeviceAction::Show => println!("{}", client.device_id()?),
                DeviceAction::Reset { yes: false } => {
                    bail!("Resetting the device fingerprint signs this device out everywhere; pass --yes to confirm")
                }
                DeviceAction::Reset { yes: true } => {
                    let id = client.reset_device()?;
                    info!("Device fingerprint reset");
                    println!("{id}");
                }
            }
        }
        Command::Login {
            access_token,
            refresh_token,
        } => {
            let client = Client::open(&settings)?;
            client.login(&access_token, &refresh_token)?;
            info!("Credentials stored in {}", settings.store_path().display());
        }
        Command::Resolve { lecture, kind } => {
            let client = Client::open(&settings)?;
            if !client.has_credentials()? {
                bail!("No stored credentials; run `lectern login` first");
            }
            let summary = client.resolve(&LectureRef::new(lecture, kind)).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if let ResolveSummary::LoggedOut { redirect, .. } = &summary {
                bail!(
                    "Session ended; sign in again at {}",
                    redirect.as_deref().unwrap_or("/login")
                );
            }
        }
    }

    Ok(())
}
