// # njallactl - Njalla MX record driver
//
// Thin integration layer: reads configuration, initializes tracing and the
// runtime, wires the JSON-RPC client into the lifecycle driver and keeps
// the local state file up to date. All record logic lives in njalla-core
// and njalla-provider.
//
// ## Configuration
//
// - `NJALLA_API_TOKEN`: API token (required for commands that call the API)
// - `NJALLA_API_ENDPOINT`: JSON-RPC endpoint (default `https://njal.la/api/1/`)
// - `NJALLA_TIMEOUT_SECS`: Request timeout in seconds (default 30)
// - `NJALLA_STATE_PATH`: State file (default `njalla-state.json`, `--state`)
// - `NJALLA_LOG_LEVEL`: trace, debug, info, warn, error (default info, `--log-level`)
//
// ## Example
//
// ```bash
// export NJALLA_API_TOKEN=your_token
//
// njallactl create mail --domain example.com --ttl 3600 --priority 10 \
//     --content mail.example.com
// njallactl update mail --priority 20
// njallactl import backup example.com:43
// njallactl show
// ```

use anyhow::{Context as _, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use njalla_client::NjallaClient;
use njalla_core::import::format_import_id;
use njalla_core::{
    FileStateStore, MxRecordConfig, Provider, ProviderConfig, ResourceData, ResourceRegistry,
    StateEntry, StateStore,
};
use njalla_provider::resources::record_mx::TYPE_NAME;

/// Exit codes for different termination scenarios
///
/// - 0: Command succeeded
/// - 1: Configuration or startup error
/// - 2: Runtime error (API or state failure)
#[derive(Debug, Clone, Copy)]
enum NjallaExitCode {
    /// Command succeeded
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<NjallaExitCode> for ExitCode {
    fn from(code: NjallaExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "njallactl",
    version,
    about = "Manage Njalla MX records as declarative resources"
)]
struct Cli {
    /// Path to the local state file
    #[arg(long, env = "NJALLA_STATE_PATH", default_value = "njalla-state.json")]
    state: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "NJALLA_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an MX record and track it as RESOURCE
    Create {
        resource: String,
        #[command(flatten)]
        record: MxArgs,
    },
    /// Refresh RESOURCE from Njalla
    Read { resource: String },
    /// Edit RESOURCE in place; omitted fields keep their current value
    Update {
        resource: String,
        #[command(flatten)]
        changes: MxChanges,
    },
    /// Delete RESOURCE at Njalla and forget it
    Delete { resource: String },
    /// Adopt an existing record (`domain:id`) as RESOURCE
    Import { resource: String, import_id: String },
    /// Converge RESOURCE towards the given configuration
    Apply {
        resource: String,
        #[command(flatten)]
        record: MxArgs,
    },
    /// Print tracked state without calling the API
    Show { resource: Option<String> },
    /// List every record of a domain
    ListRecords { domain: String },
}

impl Command {
    fn needs_api(&self) -> bool {
        !matches!(self, Command::Show { .. })
    }
}

/// Full MX record configuration
#[derive(Args, Debug)]
struct MxArgs {
    /// Parent zone, e.g. example.com
    #[arg(long)]
    domain: String,

    /// Subdomain label
    #[arg(long, default_value = "@")]
    name: String,

    /// Time-to-live in seconds
    #[arg(long)]
    ttl: i64,

    /// Mail exchanger preference
    #[arg(long)]
    priority: i64,

    /// Mail exchanger hostname
    #[arg(long)]
    content: String,
}

impl From<&MxArgs> for ResourceData {
    fn from(args: &MxArgs) -> Self {
        let config = MxRecordConfig::new(&args.domain, args.ttl, args.priority, &args.content)
            .with_name(&args.name);
        ResourceData::from(&config)
    }
}

/// In-place changes to an MX record
#[derive(Args, Debug)]
struct MxChanges {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    ttl: Option<i64>,

    #[arg(long)]
    priority: Option<i64>,

    #[arg(long)]
    content: Option<String>,
}

impl MxChanges {
    fn apply_to(&self, data: &mut ResourceData) {
        if let Some(name) = &self.name {
            data.set("name", name.as_str());
        }
        if let Some(ttl) = self.ttl {
            data.set("ttl", ttl);
        }
        if let Some(priority) = self.priority {
            data.set("priority", priority);
        }
        if let Some(content) = &self.content {
            data.set("content", content.as_str());
        }
    }
}

fn parse_log_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(log_level) = parse_log_level(&cli.log_level) else {
        eprintln!(
            "NJALLA_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            cli.log_level
        );
        return NjallaExitCode::ConfigError.into();
    };

    // stdout carries command output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return NjallaExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return NjallaExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        let ctx = match Context::open(&cli).await {
            Ok(ctx) => ctx,
            Err(e) => {
                error!("Configuration error: {:#}", e);
                return NjallaExitCode::ConfigError;
            }
        };

        match ctx.execute(cli.command).await {
            Ok(()) => NjallaExitCode::Success,
            Err(e) => {
                error!("{:#}", e);
                NjallaExitCode::RuntimeError
            }
        }
    });

    code.into()
}

/// State store plus, when the command needs it, the lifecycle driver
struct Context {
    store: FileStateStore,
    provider: Option<Provider>,
}

impl Context {
    async fn open(cli: &Cli) -> Result<Self> {
        let store = FileStateStore::new(&cli.state)
            .await
            .with_context(|| format!("Failed to open state file {}", cli.state.display()))?;

        let provider = if cli.command.needs_api() {
            let config = ProviderConfig::from_env()?;
            let client = NjallaClient::new(&config)?;
            info!("Using Njalla API at {}", client.endpoint());

            let registry = Arc::new(ResourceRegistry::new());
            njalla_provider::register(&registry);
            Some(Provider::new(registry, Arc::new(client)))
        } else {
            None
        };

        Ok(Self { store, provider })
    }

    fn provider(&self) -> Result<&Provider> {
        self.provider
            .as_ref()
            .context("Command requires the Njalla API but no client was configured")
    }

    async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::Create { resource, record } => self.create(&resource, &record).await,
            Command::Read { resource } => self.read(&resource).await,
            Command::Update { resource, changes } => self.update(&resource, &changes).await,
            Command::Delete { resource } => self.delete(&resource).await,
            Command::Import {
                resource,
                import_id,
            } => self.import(&resource, &import_id).await,
            Command::Apply { resource, record } => self.apply(&resource, &record).await,
            Command::Show { resource } => self.show(resource.as_deref()).await,
            Command::ListRecords { domain } => self.list_records(&domain).await,
        }
    }

    async fn tracked(&self, resource: &str) -> Result<ResourceData> {
        match self.store.get(&address(resource)).await? {
            Some(entry) => Ok(entry.data),
            None => bail!("{} is not tracked in the state file", address(resource)),
        }
    }

    async fn save(&self, resource: &str, data: ResourceData) -> Result<()> {
        let address = address(resource);
        if data.has_id() {
            self.store
                .put(&address, StateEntry::new(TYPE_NAME, data.clone()))
                .await?;
            print_json(&data)
        } else {
            warn!("{} no longer exists at Njalla; forgetting it", address);
            self.store.remove(&address).await?;
            Ok(())
        }
    }

    async fn create(&self, resource: &str, record: &MxArgs) -> Result<()> {
        if self.store.get(&address(resource)).await?.is_some() {
            bail!(
                "{} is already tracked; use update or apply",
                address(resource)
            );
        }

        let data = self.provider()?.create(TYPE_NAME, record.into()).await?;
        self.save(resource, data).await
    }

    async fn read(&self, resource: &str) -> Result<()> {
        let data = self.tracked(resource).await?;
        let data = self.provider()?.read(TYPE_NAME, data).await?;
        self.save(resource, data).await
    }

    async fn update(&self, resource: &str, changes: &MxChanges) -> Result<()> {
        let mut data = self.tracked(resource).await?;
        changes.apply_to(&mut data);

        let data = self.provider()?.update(TYPE_NAME, data).await?;
        self.save(resource, data).await
    }

    async fn delete(&self, resource: &str) -> Result<()> {
        let data = self.tracked(resource).await?;
        self.provider()?.delete(TYPE_NAME, data).await?;
        self.store.remove(&address(resource)).await?;
        info!("Deleted {}", address(resource));
        Ok(())
    }

    async fn import(&self, resource: &str, import_id: &str) -> Result<()> {
        if self.store.get(&address(resource)).await?.is_some() {
            bail!("{} is already tracked", address(resource));
        }

        let mut imported = self.provider()?.import(TYPE_NAME, import_id).await?;
        let Some(data) = imported.pop() else {
            bail!("Import of {} returned nothing", import_id);
        };
        self.save(resource, data).await
    }

    async fn apply(&self, resource: &str, record: &MxArgs) -> Result<()> {
        let provider = self.provider()?;

        let prior = match self.store.get(&address(resource)).await? {
            Some(entry) => Some(provider.read(TYPE_NAME, entry.data).await?),
            None => None,
        };

        let data = provider.apply(TYPE_NAME, prior, record.into()).await?;
        self.save(resource, data).await
    }

    async fn show(&self, resource: Option<&str>) -> Result<()> {
        match resource {
            Some(resource) => {
                let entry = self
                    .store
                    .get(&address(resource))
                    .await?
                    .with_context(|| format!("{} is not tracked", address(resource)))?;
                print_json(&TrackedView {
                    address: address(resource),
                    import_id: import_id_of(&entry.data),
                    entry,
                })
            }
            None => {
                for address in self.store.list().await? {
                    let import_id = match self.store.get(&address).await? {
                        Some(entry) => import_id_of(&entry.data),
                        None => None,
                    };
                    println!("{address}\t{}", import_id.as_deref().unwrap_or("-"));
                }
                Ok(())
            }
        }
    }

    async fn list_records(&self, domain: &str) -> Result<()> {
        let records = self.provider()?.api().list_records(domain).await?;
        for record in records {
            println!("{record}");
        }
        Ok(())
    }
}

/// What `show` prints for one tracked resource
#[derive(serde::Serialize)]
struct TrackedView {
    address: String,
    /// `domain:id`, usable with `import`
    import_id: Option<String>,
    entry: StateEntry,
}

fn import_id_of(data: &ResourceData) -> Option<String> {
    let id = data.id()?.parse().ok()?;
    let domain = data.get_str("domain").ok()?;
    Some(format_import_id(domain, id))
}

fn address(resource: &str) -> String {
    format!("{TYPE_NAME}.{resource}")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
