//! Wardrobe Dashboard CLI
//!
//! Command-line front end for the wardrobe dashboard:
//! - Watch live device charts
//! - List devices
//! - Ask for an outfit suggestion
//! - Generate a default config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wardrobe_dashboard::{
    generate_default_config, Config, Dashboard, DashboardOptions, DeviceLoader, HttpApiClient,
    LoggingConfig, OutfitAdvisor, Page, Renderer, SessionResolver, Typewriter, ViewState,
    WardrobeApi,
};

#[derive(Parser)]
#[command(name = "wardrobe-dashboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live temperature charts for your smart wardrobe devices")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations, then environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Wardrobe backend URL, overrides the config file
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the dashboard and keep charts refreshed until Ctrl-C
    Watch {
        /// Renderer (svg, terminal)
        #[arg(short, long)]
        renderer: Option<Renderer>,
        /// Directory for SVG charts
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Refresh interval in milliseconds
        #[arg(short, long)]
        interval_ms: Option<u64>,
        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,
        /// Mark charts whose last refresh failed
        #[arg(long)]
        stale_badge: bool,
    },

    /// List devices registered to the current user
    Devices,

    /// Suggest an outfit for the given weather
    Outfit {
        /// Temperature in °C
        #[arg(allow_negative_numbers = true)]
        temperature: f64,
        /// Weather condition (e.g. "clear sky", "light rain")
        condition: String,
        /// Print the suggestion at once instead of typing it out
        #[arg(long)]
        instant: bool,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("writing config to {:?}", path))?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    // The configured subscriber needs the config, so warnings raised while
    // loading it go to a plain stderr subscriber.
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let mut config = tracing::subscriber::with_default(bootstrap, || match &cli.config {
        Some(path) => Config::load_with_env(path),
        None => Config::load_default(),
    })
    .context("loading configuration")?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    init_logging(&config.logging);
    tracing::info!("Wardrobe Dashboard v{}", env!("CARGO_PKG_VERSION"));

    let api: Arc<dyn WardrobeApi> = Arc::new(HttpApiClient::new(&config.api)?);

    match cli.command {
        Commands::Watch {
            renderer,
            output,
            interval_ms,
            duration,
            stale_badge,
        } => {
            if let Some(renderer) = renderer {
                config.dashboard.renderer = renderer;
            }
            if let Some(output) = output {
                config.dashboard.output_dir = output.to_string_lossy().to_string();
            }
            if let Some(ms) = interval_ms {
                config.dashboard.poll_interval_ms = ms;
            }
            config.dashboard.show_stale_badge |= stale_badge;

            watch(api, &config, duration.map(Duration::from_secs)).await?;
        }
        Commands::Devices => list_devices(api).await?,
        Commands::Outfit {
            temperature,
            condition,
            instant,
        } => suggest_outfit(api, temperature, &condition, instant).await?,
        Commands::Config { .. } => unreachable!("handled before config load"),
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("wardrobe_dashboard={}", logging.level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn watch(
    api: Arc<dyn WardrobeApi>,
    config: &Config,
    duration: Option<Duration>,
) -> anyhow::Result<()> {
    let page = match config.dashboard.renderer {
        Renderer::Svg => {
            let dir = PathBuf::from(&config.dashboard.output_dir);
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("creating chart directory {:?}", dir))?;
            tracing::info!("Writing charts to {:?}", dir);
            Page::svg(dir)
        }
        Renderer::Terminal => Page::terminal(),
    };

    let dashboard = Dashboard::new(api, DashboardOptions::from(&config.dashboard));
    let view = dashboard.load(page).await;

    match view.state() {
        ViewState::Initial => {
            eprintln!("Could not resolve the current user; nothing to show.");
            return Ok(());
        }
        ViewState::Empty { message } => {
            println!("{}", message);
            return Ok(());
        }
        ViewState::Charts { devices } => {
            println!("Watching {} device(s). Press Ctrl-C to stop.", devices.len());
        }
    }

    let stop = async {
        match duration {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("listening for Ctrl-C")?;
            tracing::info!("Received Ctrl-C");
        }
        _ = stop => {
            tracing::info!("Watch duration elapsed");
        }
    }

    let released = view.teardown().await;
    println!("Stopped, {} chart(s) released.", released);
    Ok(())
}

async fn list_devices(api: Arc<dyn WardrobeApi>) -> anyhow::Result<()> {
    let user = SessionResolver::new(api.clone()).resolve().await?;
    let devices = DeviceLoader::new(api).load(&user).await;

    if devices.is_empty() {
        println!("{}", wardrobe_dashboard::EMPTY_STATE_MESSAGE);
        return Ok(());
    }

    println!("{:<12} {:<20} {}", "DEVICE", "MAC ADDRESS", "NAME");
    for device in devices {
        println!(
            "{:<12} {:<20} {}",
            device.device_id, device.mac_address, device.name
        );
    }
    Ok(())
}

async fn suggest_outfit(
    api: Arc<dyn WardrobeApi>,
    temperature: f64,
    condition: &str,
    instant: bool,
) -> anyhow::Result<()> {
    let advisor = OutfitAdvisor::new(api.clone());

    if let Ok(user) = SessionResolver::new(api).resolve().await {
        match advisor.location(&user).await {
            Ok(location) => println!("Weather for {}: {:.1}°C, {}", location, temperature, condition),
            Err(e) => tracing::warn!(error = %e, "Could not resolve location"),
        }
    }

    let outfit = advisor.suggest(temperature, condition).await?;
    if instant {
        println!("{}", outfit);
        return Ok(());
    }

    use std::io::Write;
    let mut shown = 0;
    Typewriter::default()
        .type_out(&outfit, |prefix| {
            let mut out = std::io::stdout().lock();
            let _ = write!(out, "{}", &prefix[shown..]);
            let _ = out.flush();
            shown = prefix.len();
        })
        .await;
    println!();
    Ok(())
}
