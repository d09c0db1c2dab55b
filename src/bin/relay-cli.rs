use clap::{Parser, Subcommand};
use serde_json::Value;

use inj_relay::blockchain::SigningIdentity;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Command-line client for the Injective transaction relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the account address derived from INJ_RELAY_PRIVATE_KEY
    Address,
    /// Execute a named function on the relay
    Execute {
        function: String,
        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
    /// Show the relay's account and session state
    Account,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Address => {
            let identity = SigningIdentity::from_env()?;
            println!("{}", identity.address());
            println!("0x{}", hex::encode(identity.eth_address().as_slice()));
        }
        Commands::Execute { function, args } => {
            let arguments: Value = serde_json::from_str(&args)?;
            let res = client
                .post(format!("{}/api/v1/execute", cli.url))
                .json(&serde_json::json!({ "function": function, "arguments": arguments }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Account => {
            let res = client.get(format!("{}/api/v1/account", cli.url)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
        std::process::exit(1);
    }
    Ok(())
}
