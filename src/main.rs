use std::path::PathBuf;
use std::sync::Arc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use borgx::domain::entities::Repository;
use borgx::domain::value_objects::Location;
use borgx::infrastructure::backing_store::StaticBackingStores;
use borgx::infrastructure::borg::BorgAdapter;
use borgx::infrastructure::cache::MokaPassphraseCache;
use borgx::infrastructure::store::JsonConfigStore;
use borgx::ports::backing_store::BackingStoreRegistry;
use borgx::ports::process::{ProcessHandle, ProcessState};
use borgx::services::context::AppContext;
use borgx::services::init_repository::{InitRepositoryRequest, InitRepositoryUseCase};
use borgx::services::log_delegate::LogDelegate;
use borgx::services::remove_repository::RemoveRepositoryUseCase;
use borgx::shared::config::AppConfig;
use borgx::shared::result::Result;

const PASSPHRASE_ENV: &str = "BORGX_PASSPHRASE";

#[derive(Parser, Debug)]
#[clap(name = "borgx")]
#[clap(version)]
#[clap(about = "Borg backup repository manager")]
pub struct Args {
    /// Settings file (TOML)
    #[clap(short, long, value_parser, default_value = "borgx.toml")]
    settings: PathBuf,

    /// Repository config file (JSON), overrides the settings file
    #[clap(short, long, value_parser)]
    config: Option<PathBuf>,

    /// Path to the borg binary, overrides the settings file
    #[clap(long, value_parser)]
    borg: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a new repository and register it (passphrase read from BORGX_PASSPHRASE)
    Init {
        name: String,

        /// Backing store id
        #[clap(long, default_value = "local")]
        store: String,

        /// Path inside the backing store, defaults to the repository name
        #[clap(long)]
        path: Option<String>,

        #[clap(short, long, default_value = "repokey")]
        encryption: String,
    },
    /// List registered repositories
    List,
    /// Forget a repository (backup data is left in place)
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 加载设置
    let settings = AppConfig::from_args_and_file(&args.settings, args.config.clone(), args.borg.clone())?;

    // 初始化日志
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let stores: Arc<dyn BackingStoreRegistry> =
        Arc::new(StaticBackingStores::from_config(&settings.backing_stores));
    info!("Backing stores: {:?}", stores.ids());

    let config_store = Arc::new(JsonConfigStore::new(
        settings.store.config_path.clone(),
        Arc::clone(&stores),
    ));
    let passphrases = Arc::new(MokaPassphraseCache::new(
        settings.passphrase.max_capacity,
        std::time::Duration::from_secs(settings.passphrase.ttl_secs),
    ));
    let adapter = Arc::new(BorgAdapter::new(&settings.borg, &settings.process, stores));

    let ctx = Arc::new(AppContext::load(config_store, passphrases, adapter).await?);

    match args.command {
        Commands::Init { name, store, path, encryption } => {
            let password = std::env::var(PASSPHRASE_ENV).unwrap_or_default();
            let path = path.unwrap_or_else(|| name.clone());
            let request = InitRepositoryRequest {
                name: name.clone(),
                location: Location::new(store, path),
                encryption_mode: encryption,
                password,
            };

            let delegate = Box::new(LogDelegate::new(format!("init {}", name)));
            let handle = InitRepositoryUseCase::new(Arc::clone(&ctx)).execute(
                request,
                Some(delegate),
                Some(Box::new(|repo: &Repository| println!("Registered repository {}", repo.name()))),
            )?;

            let state = tokio::select! {
                state = handle.join() => state,
                _ = tokio::signal::ctrl_c() => {
                    warn!("Interrupted, cancelling borg init");
                    handle.cancel();
                    handle.join().await
                }
            };

            if state != ProcessState::Completed(0) {
                return Err(anyhow::anyhow!(
                    "initializing {} failed: {:?} {}",
                    name,
                    state,
                    handle.last_error().unwrap_or_default()
                )
                .into());
            }
        }
        Commands::List => {
            let config = ctx.config.read().clone();
            let mut repositories: Vec<_> = config.repositories.iter().collect();
            repositories.sort_by(|a, b| a.name().cmp(b.name()));
            for repo in repositories {
                println!(
                    "{}\t{}\t{}\t{} job(s)",
                    repo.name(),
                    repo.location(),
                    repo.encryption_mode(),
                    repo.jobs().len()
                );
            }
        }
        Commands::Remove { name } => {
            let removed = RemoveRepositoryUseCase::new(Arc::clone(&ctx)).execute(&name).await?;
            println!("Removed repository {} ({})", removed.name(), removed.location());
        }
    }

    Ok(())
}
