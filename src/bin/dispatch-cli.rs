use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "dispatch-cli")]
#[command(about = "Management CLI for the API dispatcher", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:3001")]
    url: String,

    #[arg(short, long, env = "DISPATCH_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version, uptime and reload policy
    Status,
    /// List cached handler modules and cache counters
    Modules,
    /// Drop every cached handler module
    Clear,
    /// Evict the cached module(s) for one route, e.g. `users/list`
    Evict { path: String },
    /// List registered native handlers
    Handlers,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)),
        Commands::Modules => client.get(format!("{}/admin/modules", cli.url)),
        Commands::Clear => client.delete(format!("{}/admin/modules", cli.url)),
        Commands::Evict { path } => client
            .post(format!("{}/admin/modules/evict", cli.url))
            .json(&json!({ "path": path })),
        Commands::Handlers => client.get(format!("{}/admin/handlers", cli.url)),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
