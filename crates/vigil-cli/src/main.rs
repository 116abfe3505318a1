mod api;
mod config;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use vigil_chain::RpcEndpoints;
use vigil_core::TransactionIntent;
use vigil_guard::{
    DecisionSurface, ExplainPipeline, Guard, GuardCoordinator, NullSurface, TrustStore,
    WebhookSurface,
};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Explain, score, and hold EVM transactions before they are signed")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Serve {
        #[arg(short = 'f', long, default_value = "vigil.toml", help = "Path to config file")]
        config: String,
    },
    Explain {
        #[arg(long, default_value = "1")]
        chain_id: u64,
        #[arg(long, help = "Target contract address")]
        to: Option<String>,
        #[arg(long, help = "0x-prefixed calldata")]
        data: String,
        #[arg(long, help = "Custom RPC endpoint URL")]
        rpc_url: Option<String>,
    },
    Decode {
        #[arg(long, default_value = "1")]
        chain_id: u64,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        data: String,
    },
    Trust {
        #[arg(help = "Address to mark trusted")]
        address: String,
        #[arg(long, default_value = "./vigil-data/trust.db")]
        db: String,
    },
    Trusted {
        #[arg(long, default_value = "./vigil-data/trust.db")]
        db: String,
    },
}

fn etherscan_key() -> String {
    std::env::var("ETHERSCAN_API_KEY").unwrap_or_default()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config: config_path } => {
            match config::VigilConfig::from_file(&config_path) {
                Ok(cfg) => run_serve(cfg).await,
                Err(e) => Err(format!("failed to load config {}: {}", config_path, e).into()),
            }
        }
        Commands::Explain {
            chain_id,
            to,
            data,
            rpc_url,
        } => run_explain(chain_id, to, data, rpc_url).await,
        Commands::Decode { chain_id, to, data } => run_decode(chain_id, to, data).await,
        Commands::Trust { address, db } => run_trust(address, db),
        Commands::Trusted { db } => run_trusted(db),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run_serve(config: config::VigilConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = config.trust_db_path();
    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let trust = TrustStore::open(&db_path)?;

    let pipeline = ExplainPipeline::new(&config.etherscan_key(), config.endpoints());
    let coordinator = GuardCoordinator::new(config.decision_timeout());

    let webhooks = config.surface_webhooks();
    let surface: Arc<dyn DecisionSurface> = if webhooks.is_empty() {
        Arc::new(NullSurface)
    } else {
        Arc::new(WebhookSurface::new(webhooks))
    };

    let guard = Guard::new(pipeline, coordinator, trust, surface);
    let state = Arc::new(api::ApiState { guard });
    api::run_api(&config.api_bind(), config.api_port(), state).await
}

async fn run_explain(
    chain_id: u64,
    to: Option<String>,
    data: String,
    rpc_url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let endpoints = RpcEndpoints {
        overrides: Default::default(),
        default_url: rpc_url,
    };
    let pipeline = ExplainPipeline::new(&etherscan_key(), endpoints);
    let intent = TransactionIntent {
        chain_id,
        from: None,
        to,
        data,
        value: None,
    };

    println!("explaining transaction on chain {}...", chain_id);
    let report = pipeline.explain(&intent).await;

    println!("\n--- explanation ---");
    println!("{}", report.explanation);

    println!("\nrisk score: {} ({})", report.risk.score, report.risk.level);
    for reason in &report.risk.reasons {
        println!("  [{:>3}] {} - {}", reason.score, reason.id, reason.description);
    }

    match &report.decoded {
        Some(call) => {
            println!(
                "\nmethod: {}",
                call.signature.as_deref().unwrap_or(&call.method)
            );
            for param in &call.params {
                println!("  {}: {} = {}", param.name, param.kind, param.value);
            }
        }
        None => println!("\ncalldata could not be decoded"),
    }

    let meta = &report.bytecode_meta;
    println!("\nbytecode: {} bytes", meta.byte_length);
    if meta.is_proxy {
        println!("  proxy pattern (EIP-1967)");
    }
    if meta.has_delegatecall {
        println!("  DELEGATECALL present");
    }
    if meta.has_selfdestruct {
        println!("  SELFDESTRUCT present");
    }

    if let Some(age) = report.intel.age_days {
        println!("\ncontract age: {} days", age);
    }
    for label in &report.intel.labels {
        match &label.detail {
            Some(detail) => println!("label [{}]: {} ({})", label.source, label.label, detail),
            None => println!("label [{}]: {}", label.source, label.label),
        }
    }

    Ok(())
}

async fn run_decode(
    chain_id: u64,
    to: Option<String>,
    data: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = ExplainPipeline::new(&etherscan_key(), RpcEndpoints::default());
    let intent = TransactionIntent {
        chain_id,
        from: None,
        to,
        data,
        value: None,
    };

    let (decoded, abi_source, signature) = pipeline.decode_only(&intent).await;
    match decoded {
        Some(call) => {
            println!("method: {}", call.signature.as_deref().unwrap_or(&call.method));
            if let Some(source) = abi_source {
                println!("abi source: {}", source);
            }
            if let Some(sig) = signature {
                println!("directory signature: {}", sig);
            }
            for param in &call.params {
                println!("  {}: {} = {}", param.name, param.kind, param.value);
            }
        }
        None => println!("calldata could not be decoded"),
    }

    Ok(())
}

fn run_trust(address: String, db: String) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = std::path::Path::new(&db).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = TrustStore::open(&db)?;
    store.mark_trusted(&address)?;
    println!("{} marked trusted", address.to_lowercase());
    Ok(())
}

fn run_trusted(db: String) -> Result<(), Box<dyn std::error::Error>> {
    let store = TrustStore::open(&db)?;
    let addresses = store.all()?;
    if addresses.is_empty() {
        println!("no trusted addresses");
    }
    for address in addresses {
        println!("{}", address);
    }
    Ok(())
}
