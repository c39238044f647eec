use clap::{Parser, Subcommand};
use reqwest::header::{ACCESS_CONTROL_REQUEST_METHOD, ORIGIN};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "api-cli")]
#[command(about = "Operator CLI for assessment-api", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show service status and database connectivity
    Status,
    /// Send a CORS preflight and print the response
    Preflight {
        #[arg(short, long, default_value = "/api/status")]
        path: String,

        #[arg(short, long, default_value = "http://localhost")]
        origin: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/api/status", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Preflight { path, origin } => {
            let res = client
                .request(Method::OPTIONS, format!("{}{}", base, path))
                .header(ORIGIN, origin)
                .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .send()
                .await?;
            println!("{} {}", res.status(), path);
            for (name, value) in res.headers() {
                println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
