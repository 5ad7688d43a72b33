//! iris-classifier: train the Iris model or serve predictions over HTTP.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use iris_classifier::config::Config;
use iris_classifier::serving::{self, AppContext, ModelState};
use iris_classifier::tasks::TrainingTask;
use iris_classifier::tracking::{ExperimentTracker, FileTracker, NoopTracker};

#[derive(Parser)]
#[command(name = "iris-classifier")]
#[command(version)]
#[command(about = "Train an Iris classifier and serve its predictions", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "IRIS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the model on the bundled dataset, record the run and save the model
    Train {
        /// Where to write the model artifact
        #[arg(long)]
        model_path: Option<PathBuf>,

        /// Where to write the confusion matrix plot (.svg, .csv or .json)
        #[arg(long)]
        confusion_matrix_path: Option<PathBuf>,

        /// Root of the local tracking store
        #[arg(long)]
        tracking_dir: Option<PathBuf>,

        /// Experiment name runs are grouped under
        #[arg(long)]
        experiment: Option<String>,

        /// Disable experiment tracking
        #[arg(long)]
        no_tracking: bool,

        /// Seed of the train/test split
        #[arg(long)]
        seed: Option<u64>,

        /// Fraction of each class held out for evaluation
        #[arg(long)]
        test_size: Option<f64>,

        /// Solver iteration cap
        #[arg(long)]
        max_iterations: Option<u64>,
    },

    /// Serve predictions over HTTP
    Serve {
        /// Address to bind
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Model artifact to load at startup
        #[arg(long)]
        model_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(cli.config.as_deref())
        .context("loading configuration")?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.logging.tracing_level()?)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(path) = &cli.config {
        info!("Loaded configuration from {}", path.display());
    }

    match cli.command {
        Commands::Train {
            model_path,
            confusion_matrix_path,
            tracking_dir,
            experiment,
            no_tracking,
            seed,
            test_size,
            max_iterations,
        } => {
            if let Some(p) = model_path {
                config.paths.model_path = p;
            }
            if let Some(p) = confusion_matrix_path {
                config.paths.confusion_matrix_path = p;
            }
            if let Some(d) = tracking_dir {
                config.tracking.dir = d;
            }
            if let Some(e) = experiment {
                config.training.experiment_name = e;
            }
            if no_tracking {
                config.tracking.enabled = false;
            }
            if let Some(s) = seed {
                config.training.seed = s;
            }
            if let Some(t) = test_size {
                config.training.test_size = t;
            }
            if let Some(m) = max_iterations {
                config.training.max_iterations = m;
            }
            config.validate()?;
            train(config)
        }

        Commands::Serve {
            bind,
            port,
            model_path,
        } => {
            if let Some(b) = bind {
                config.server.bind = b;
            }
            if let Some(p) = port {
                config.server.port = p;
            }
            if let Some(p) = model_path {
                config.paths.model_path = p;
            }
            config.validate()?;
            serve(config).await
        }
    }
}

fn train(config: Config) -> Result<()> {
    let tracker: Box<dyn ExperimentTracker> = if config.tracking.enabled {
        info!(
            "Tracking runs in {} (experiment '{}')",
            config.tracking.dir.display(),
            config.training.experiment_name
        );
        Box::new(FileTracker::new(
            &config.tracking.dir,
            &config.training.experiment_name,
        ))
    } else {
        warn!("Experiment tracking disabled");
        Box::new(NoopTracker::default())
    };

    let report = TrainingTask::new(config.paths, config.training, tracker).run()?;
    for m in &report.measurements {
        info!("{m}");
    }
    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    let ctx = AppContext::load(&config.paths.model_path);
    if ctx.state() == ModelState::Unavailable {
        warn!("Starting without a model; /predict answers 503");
    }

    let bind: IpAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {:?}", config.server.bind))?;
    let port = config.server.port;

    info!("Model state: {}", ctx.state());
    info!("Server listening on {}:{}", bind, port);

    warp::serve(serving::routes(ctx)).run((bind, port)).await;
    Ok(())
}
