use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "payout-cli")]
#[command(about = "Command-line client for the payout relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3001")]
    url: String,

    /// Mnemonic or hex private key; falls back to PAYOUT_SENDER_CREDENTIAL.
    #[arg(long, env = "PAYOUT_SENDER_CREDENTIAL", hide_env_values = true)]
    credential: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check relay and node status
    Health,
    /// Query an address balance
    Balance {
        address: String,
        #[arg(long)]
        denom: Option<String>,
    },
    /// Send tokens to one recipient
    Send {
        recipient: String,
        amount: String,
        #[arg(long)]
        token: Option<String>,
        #[arg(long, default_value = "")]
        memo: String,
    },
    /// Pay several recipients in one transaction (`address:amount[:token]`)
    Multisend {
        #[arg(required = true)]
        recipients: Vec<String>,
        #[arg(long)]
        memo: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", cli.url)).send().await?,
        Commands::Balance { address, denom } => {
            client
                .post(format!("{}/balance", cli.url))
                .json(&json!({ "address": address, "denom": denom }))
                .send()
                .await?
        }
        Commands::Send {
            recipient,
            amount,
            token,
            memo,
        } => {
            let credential = require_credential(cli.credential)?;
            client
                .post(format!("{}/send", cli.url))
                .json(&json!({
                    "sender_credential": credential,
                    "recipient_address": recipient,
                    "amount": amount,
                    "token": token,
                    "memo": memo,
                }))
                .send()
                .await?
        }
        Commands::Multisend { recipients, memo } => {
            let credential = require_credential(cli.credential)?;
            let recipients = recipients
                .iter()
                .map(|r| parse_recipient(r))
                .collect::<Result<Vec<_>, _>>()?;
            client
                .post(format!("{}/multisend", cli.url))
                .json(&json!({
                    "sender_credential": credential,
                    "recipients": recipients,
                    "memo": memo,
                }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

fn require_credential(credential: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    credential.ok_or_else(|| "--credential or PAYOUT_SENDER_CREDENTIAL is required".into())
}

fn parse_recipient(raw: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let mut parts = raw.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(address), Some(amount), token) if !address.is_empty() && !amount.is_empty() => {
            Ok(json!({ "address": address, "amount": amount, "token": token }))
        }
        _ => Err(format!("Invalid recipient '{}', expected address:amount[:token]", raw).into()),
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = serde_json::from_str::<Value>(&text)
        .map(|v| serde_json::to_string_pretty(&v).unwrap_or_else(|_| text.clone()))
        .unwrap_or(text);

    if status.is_success() {
        println!("{}", body);
    } else {
        eprintln!("Error: relay returned status {}", status);
        eprintln!("{}", body);
        std::process::exit(1);
    }
    Ok(())
}
