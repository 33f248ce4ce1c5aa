use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

use store_service::observability::metrics::{sample_value, CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL};

#[derive(Parser)]
#[command(name = "store-cli")]
#[command(about = "Management CLI for the store service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service liveness
    Health,
    /// Read one store through the cache
    Get {
        #[arg(long, default_value_t = 1)]
        id: i64,
    },
    /// List all stores
    List,
    /// Create a store
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        revenue: f64,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Update fields of a store
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        revenue: Option<f64>,
        #[arg(long)]
        total_orders: Option<i64>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a store
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Show cache hit/miss counters
    Metrics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            println!("{} {}", res.status(), res.text().await?);
        }
        Commands::Get { id } => {
            let res = client
                .get(format!("{}/store", cli.url))
                .query(&[("id", id)])
                .send()
                .await?;
            let cache = res
                .headers()
                .get("x-cache")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();
            println!("X-Cache: {cache}");
            print_response(res).await?;
        }
        Commands::List => {
            run_operation(&client, &cli.url, "stores", Map::new()).await?;
        }
        Commands::Create {
            name,
            revenue,
            active,
        } => {
            let mut args = Map::new();
            args.insert("name".into(), json!(name));
            args.insert("revenue".into(), json!(revenue));
            if let Some(active) = active {
                args.insert("active".into(), json!(active));
            }
            run_operation(&client, &cli.url, "createStore", args).await?;
        }
        Commands::Update {
            id,
            name,
            revenue,
            total_orders,
            active,
        } => {
            let mut args = Map::new();
            args.insert("id".into(), json!(id));
            if let Some(name) = name {
                args.insert("name".into(), json!(name));
            }
            if let Some(revenue) = revenue {
                args.insert("revenue".into(), json!(revenue));
            }
            if let Some(total_orders) = total_orders {
                args.insert("total_orders".into(), json!(total_orders));
            }
            if let Some(active) = active {
                args.insert("active".into(), json!(active));
            }
            run_operation(&client, &cli.url, "updateStore", args).await?;
        }
        Commands::Delete { id } => {
            let mut args = Map::new();
            args.insert("id".into(), json!(id));
            run_operation(&client, &cli.url, "deleteStore", args).await?;
        }
        Commands::Metrics => {
            let text = client
                .get(format!("{}/metrics", cli.url))
                .send()
                .await?
                .text()
                .await?;
            let labels = [("cache_key_prefix", "store")];
            let hits = sample_value(&text, CACHE_HITS_TOTAL, &labels).unwrap_or(0.0);
            let misses = sample_value(&text, CACHE_MISSES_TOTAL, &labels).unwrap_or(0.0);
            let total = hits + misses;
            let ratio = if total > 0.0 { hits / total * 100.0 } else { 0.0 };
            println!("cache hits:   {hits}");
            println!("cache misses: {misses}");
            println!("hit ratio:    {ratio:.1}%");
        }
    }

    Ok(())
}

async fn run_operation(
    client: &reqwest::Client,
    url: &str,
    operation: &str,
    arguments: Map<String, Value>,
) -> Result<(), Box<dyn std::error::Error>> {
    let res = client
        .post(format!("{url}/graphql"))
        .json(&json!({ "operation": operation, "arguments": arguments }))
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
