use clap::{Parser, Subcommand};
use tracing::{error, info};

use address_resolver::config::Config;
use address_resolver::constants;
use address_resolver::domain::{Address, Resolution};
use address_resolver::infra::reasoning_client::OpenAiReasoningClient;
use address_resolver::infra::search_client::TavilySearchClient;
use address_resolver::logging;
use address_resolver::pipeline::AddressPipeline;
use address_resolver::server;
use address_resolver::store::JsonFileStore;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "address_resolver")]
#[command(about = "Resolves raw postal addresses against a canonical record store")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve addresses from a JSON file through the pipeline
    Resolve {
        /// JSON file holding an array of addresses to resolve
        #[arg(long, default_value = "addresses.json")]
        file: String,
        /// Override the record store location
        #[arg(long)]
        store: Option<String>,
        /// Optional description; skips the enrichment stage when set
        #[arg(long)]
        description: Option<String>,
    },
    /// Run the resolution HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = constants::DEFAULT_SERVER_PORT)]
        port: u16,
        /// Override the record store location
        #[arg(long)]
        store: Option<String>,
    },
}

fn build_pipeline(
    config: &Config,
    store_override: Option<String>,
) -> Result<Arc<AddressPipeline>, Box<dyn std::error::Error>> {
    let reasoning = Arc::new(OpenAiReasoningClient::from_env(&config.reasoning)?);
    let search = Arc::new(TavilySearchClient::from_env(&config.search)?);
    let store_path = store_override.unwrap_or_else(|| config.store.path.clone());
    let store = Arc::new(JsonFileStore::new(store_path));
    Ok(Arc::new(AddressPipeline::new(
        reasoning,
        search,
        store,
        config.search.max_results,
    )))
}

fn load_addresses(file: &str) -> Result<Vec<Address>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read address file '{}': {}", file, e))?;
    Ok(serde_json::from_str(&content)?)
}

fn print_address(label: &str, address: &Address) {
    println!("{label}");
    println!("   🏙️  City: {}", address.city);
    println!("   🗺️  Province: {}", address.province);
    println!("   🏳️  Country: {}", address.country);
    println!("   📫 Zip Code: {}", address.zip_code);
    println!("   📍 Address Lines: {}", address.joined_lines());
}

fn print_resolution(address: &Address, resolution: &Resolution) {
    println!("📍 Address Resolution Result:");
    println!("🕒 {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    println!("{}", "=".repeat(70));
    print_address("📮 Original Address:", address);
    println!();
    match resolution {
        Resolution::Matched { matched_addresses } => {
            println!("🎯 Matched Addresses: {} found", matched_addresses.len());
            for matched in matched_addresses {
                println!();
                print_address(&format!("   [{}]", matched.id), &matched.address);
            }
        }
        Resolution::Registered {
            normalized_address,
            description,
            error,
        } => {
            print_address("✅ Normalized Address:", normalized_address);
            println!();
            println!("📝 Description:\n   {}", description);
            let status = if *error { "❌ Error" } else { "✅ Success" };
            println!("🔍 Status: {}", status);
        }
    }
    println!("{}", "=".repeat(70));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load_or_default();

    match cli.command {
        Commands::Resolve {
            file,
            store,
            description,
        } => {
            let pipeline = build_pipeline(&config, store)?;
            let addresses = load_addresses(&file)?;
            println!("🏠 Found {} addresses to resolve\n", addresses.len());

            for address in addresses {
                let span = tracing::info_span!("Resolving address", city = %address.city);
                let _enter = span.enter();

                info!("Starting pipeline run");
                match pipeline.resolve(address.clone(), description.clone()).await {
                    Ok(resolution) => {
                        info!("Pipeline run finished");
                        print_resolution(&address, &resolution);
                        println!();
                    }
                    Err(e) => {
                        error!("Pipeline run failed: {}", e);
                        println!("❌ Resolution failed for {}: {}", address.city, e);
                    }
                }
            }
        }
        Commands::Serve { port, store } => {
            let pipeline = build_pipeline(&config, store)?;
            server::start_server(pipeline, port).await?;
        }
    }
    Ok(())
}
