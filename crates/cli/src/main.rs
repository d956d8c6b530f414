mod cli;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meetsync_core::{
    create_pacer, create_store, derive_password, load_config, load_plan, validate_config,
    BatchDriver, Config, MeetingApi, MeetingConfig, MeetingIdentifier, Reconciler,
    SanitizedConfig, SnapshotStore, UserDirectory, ZoomClient,
};

use cli::{Cli, Command, UsersCommand};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr so command output on stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    info!("Loading configuration from {:?}", cli.config);
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    validate_config(&config).context("Configuration validation failed")?;

    match cli.command {
        Command::Config => {
            print_json(&SanitizedConfig::from(&config))?;
        }
        Command::Password { title } => {
            println!(
                "{}",
                derive_password(
                    &title,
                    &config.passwords.salt,
                    config.passwords.derived_length
                )
            );
        }
        Command::Show { id } => {
            let services = Services::new(&config)?;
            let identifier = MeetingIdentifier::new(id)?;
            match services.reconciler.snapshot(&identifier)? {
                Some(snapshot) => print_json(&snapshot)?,
                None => bail!("No snapshot for {}", identifier),
            }
        }
        Command::Users { command } => {
            let services = Services::new(&config)?;
            let users = match command {
                UsersCommand::List => services.directory.users().await?,
                UsersCommand::Refresh => services.directory.refresh().await?,
            };
            for user in users {
                println!("{}\t{}", user.id, user.email);
            }
        }
        Command::Reconcile {
            id,
            host_email,
            topic,
            start,
            duration,
            password,
            no_waiting_room,
        } => {
            let services = Services::new(&config)?;
            let identifier = MeetingIdentifier::new(id)?;
            let meeting_config = MeetingConfig {
                topic,
                start_time: start,
                duration,
                password: password.unwrap_or_else(|| config.passwords.shared.clone()),
                waiting_room: !no_waiting_room,
            };

            let outcome = services
                .reconciler
                .reconcile_outcome(&identifier, &host_email, &meeting_config)
                .await
                .with_context(|| format!("Failed to reconcile {}", identifier))?;

            info!("{} {} (meeting {})", outcome.action, identifier, outcome.meeting.id);
            print_json(&outcome.meeting)?;
        }
        Command::Run { plan: plan_path } => {
            let plan = load_plan(&plan_path)
                .with_context(|| format!("Failed to load plan from {:?}", plan_path))?;
            let meetings = plan.resolve(&config)?;
            info!("Plan has {} meetings", meetings.len());

            let services = Services::new(&config)?;
            let driver = BatchDriver::new(services.reconciler, create_pacer(&config.batch))
                .with_continue_on_error(config.batch.continue_on_error);

            let report = driver.run(&meetings).await;
            print_json(&report)?;

            if !report.is_success() {
                bail!(
                    "{} of {} meetings failed",
                    report.failed(),
                    meetings.len()
                );
            }
        }
    }

    Ok(())
}

/// Components shared by the commands that talk to the meeting API.
struct Services {
    directory: Arc<UserDirectory>,
    reconciler: Arc<Reconciler>,
}

impl Services {
    fn new(config: &Config) -> Result<Self> {
        let api: Arc<dyn MeetingApi> =
            Arc::new(ZoomClient::new(&config.api).context("Failed to create API client")?);
        info!("Using meeting API at {}", config.api.base_url);

        let store: Arc<dyn SnapshotStore> =
            create_store(&config.store).context("Failed to open snapshot store")?;
        info!(
            "Snapshot store: {:?} at {:?}",
            config.store.backend, config.store.path
        );

        let directory = Arc::new(UserDirectory::new(Arc::clone(&api), Arc::clone(&store)));
        let reconciler = Arc::new(Reconciler::new(api, store, Arc::clone(&directory)));

        Ok(Self {
            directory,
            reconciler,
        })
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
