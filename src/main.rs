//! HueTalk - Voice Control for Hue Lights
//!
//! Each subcommand is one recognized voice intent.

use anyhow::Result;
use clap::{Parser, Subcommand};
use huetalk::audit::AuditLog;
use huetalk::bridge::HttpBridge;
use huetalk::commands::{Command, Direction};
use huetalk::config::{self, Config};
use huetalk::credentials::CredentialStore;
use huetalk::dialog::{Dialogs, Feedback};
use huetalk::discovery::{Discover, SsdpDiscovery};
use huetalk::dispatcher::{Dispatcher, Outcome};
use huetalk::session::BridgeSession;
use huetalk::tts;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Bridge address (skips discovery)
    #[arg(long)]
    ip: Option<String>,

    /// Bridge credential (skips registration)
    #[arg(long)]
    username: Option<String>,

    /// Group used when a command names none
    #[arg(long)]
    default_group: Option<String>,

    /// Speak confirmations after each command
    #[arg(long)]
    confirm: bool,

    /// Feedback engine: log or system
    #[arg(long)]
    tts: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Find a bridge on the local network and print its address
    Discover,
    /// Rediscover the bridge and reconnect
    Connect,
    /// Show the groups and scenes the bridge knows about
    Status,
    /// Turn lights on
    On { group: Option<String> },
    /// Turn lights off
    Off { group: Option<String> },
    /// Set brightness, e.g. "50%"
    Brightness {
        percent: String,
        #[arg(short, long)]
        group: Option<String>,
    },
    /// Set a named color
    Color {
        color: String,
        #[arg(short, long)]
        group: Option<String>,
    },
    /// Activate a scene
    Scene {
        scene: String,
        #[arg(short, long)]
        group: Option<String>,
    },
    /// Raise brightness by one step
    Brighter { group: Option<String> },
    /// Lower brightness by one step
    Dimmer { group: Option<String> },
    /// Raise color temperature by one step
    Cooler { group: Option<String> },
    /// Lower color temperature by one step
    Warmer { group: Option<String> },
}

impl Action {
    fn into_command(self) -> Option<Command> {
        Some(match self {
            Action::Discover | Action::Status => return None,
            Action::Connect => Command::Connect,
            Action::On { group } => Command::TurnOn { group },
            Action::Off { group } => Command::TurnOff { group },
            Action::Brightness { percent, group } => Command::SetBrightness { group, percent },
            Action::Color { color, group } => Command::SetColor { group, color },
            Action::Scene { scene, group } => Command::SetScene { group, scene },
            Action::Brighter { group } => Command::AdjustBrightness {
                group,
                direction: Direction::Increase,
            },
            Action::Dimmer { group } => Command::AdjustBrightness {
                group,
                direction: Direction::Decrease,
            },
            Action::Cooler { group } => Command::AdjustColorTemperature {
                group,
                direction: Direction::Increase,
            },
            Action::Warmer { group } => Command::AdjustColorTemperature {
                group,
                direction: Direction::Decrease,
            },
        })
    }
}

fn init_logging(verbose: bool, config: &Config) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new(Level::DEBUG.as_str())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_lowercase()))
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;
    if args.ip.is_some() {
        config.ip = args.ip.clone();
    }
    if args.username.is_some() {
        config.username = args.username.clone();
    }
    if args.default_group.is_some() {
        config.default_group = args.default_group.clone();
    }
    if args.confirm {
        config.verbose = true;
    }
    if let Some(engine) = &args.tts {
        config.tts_engine = engine.clone();
    }

    init_logging(args.verbose, &config)?;
    info!("💡 HueTalk v{} starting...", env!("CARGO_PKG_VERSION"));

    let discovery = Arc::new(SsdpDiscovery::new());
    if let Action::Discover = args.action {
        let address = discovery.discover().await?;
        println!("{}", address);
        return Ok(());
    }

    let data_dir = config::data_dir();
    let feedback = Feedback::new(
        tts::create_engine(&config.tts_engine),
        Dialogs::load(&data_dir),
    );
    let audit = AuditLog::open_default();
    let session = BridgeSession::new(
        Arc::new(HttpBridge::new()?),
        discovery,
        config,
        CredentialStore::new(data_dir),
        audit.clone(),
        feedback,
    );
    let mut dispatcher = Dispatcher::new(session, audit);

    let Some(command) = args.action.into_command() else {
        return print_status(&mut dispatcher).await;
    };

    let outcome = dispatcher.handle(&command).await?;
    info!("Outcome: {:?}", outcome);
    if outcome != Outcome::Done {
        std::process::exit(1);
    }
    Ok(())
}

async fn print_status(dispatcher: &mut Dispatcher) -> Result<()> {
    let session = dispatcher.session_mut();
    session.ensure_connected().await?;

    if let Some(conn) = session.connection() {
        println!("Bridge: {}", conn.address);
    }
    println!("Default group: {}", session.default_group());
    if let Some(vocab) = session.vocabulary() {
        println!("Groups:");
        for (name, id) in vocab.groups() {
            println!("  {:>3}  {}", id, name);
        }
        println!("Known names: {}", vocab.words().join(", "));
    }
    Ok(())
}
