use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

/// Cashier and kitchen cli for the POS server
#[derive(Parser, Debug)]
#[command(name = "restaurant-pos")]
#[command(about = "client cli used by restaurant staffs to interact with the server", version, long_about = None
)]
struct Cli {
    #[arg(long, global = true, default_value = "http://localhost:8080", help = "Server base url")]
    host: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// place an order from a cart file
    #[command(arg_required_else_help = true)]
    Checkout {
        #[arg(help = "Path to a JSON cart with `orderList` and `totalPrice`", value_name = "CART_JSON")]
        cart: PathBuf,
    },
    /// receipt related ops
    #[command(arg_required_else_help = true)]
    Receipt(ReceiptArgs),
    /// show stock levels
    Inventory,
}

#[derive(Debug, Args)]
struct ReceiptArgs {
    #[command(subcommand)]
    command: ReceiptCmds,
}

#[derive(Debug, Subcommand)]
enum ReceiptCmds {
    #[command(arg_required_else_help = true)]
    Get {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        id: i64,
    },
    List {
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long, help = "Pending, Fulfilled or Cancelled")]
        status: Option<String>,
    },
    #[command(arg_required_else_help = true)]
    Status {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        id: i64,
        status: String,
    },
    #[command(arg_required_else_help = true)]
    Delete {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        id: i64,
    },
}

#[derive(Debug, Deserialize)]
struct CheckoutResponse {
    result: i64,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Cli::parse();
    let host = args.host.trim_end_matches('/');
    let client = Client::new();

    match args.command {
        Commands::Checkout { cart } => {
            let body = std::fs::read_to_string(&cart)
                .with_context(|| format!("failed to read cart file {}", cart.display()))?;
            let body: Value = serde_json::from_str(&body)
                .with_context(|| format!("{} is not valid JSON", cart.display()))?;
            println!("submitting order from {}", cart.display());
            let res = client
                .post(format!("{host}/v1/checkout"))
                .json(&body)
                .send()
                .await?;
            match res.status() {
                StatusCode::OK => {
                    let res = res.json::<CheckoutResponse>().await?;
                    println!("order placed, receipt id = {}", res.result);
                }
                StatusCode::BAD_REQUEST => println!("the server could not read the cart"),
                StatusCode::INTERNAL_SERVER_ERROR => {
                    println!("order was not placed, nothing was charged")
                }
                unexpected => println!("got unexpected status code, {}", unexpected),
            }
        }
        Commands::Receipt(args) => match args.command {
            ReceiptCmds::Get { id } => {
                let res = client
                    .get(format!("{host}/v1/receipts/{id}"))
                    .send()
                    .await?;
                print_body(res).await?;
            }
            ReceiptCmds::List {
                offset,
                limit,
                status,
            } => {
                let mut query = vec![("offset", offset.to_string()), ("limit", limit.to_string())];
                if let Some(status) = status {
                    query.push(("status", status));
                }
                let res = client
                    .get(format!("{host}/v1/receipts"))
                    .query(&query)
                    .send()
                    .await?;
                print_body(res).await?;
            }
            ReceiptCmds::Status { id, status } => {
                println!("marking receipt={} as {}", id, status);
                let res = client
                    .patch(format!("{host}/v1/receipts/{id}/status"))
                    .json(&json!({ "status": status }))
                    .send()
                    .await?;
                print_body(res).await?;
            }
            ReceiptCmds::Delete { id } => {
                println!("deleting receipt={}", id);
                let res = client
                    .delete(format!("{host}/v1/receipts/{id}"))
                    .send()
                    .await?;
                print_body(res).await?;
            }
        },
        Commands::Inventory => {
            let res = client.get(format!("{host}/v1/inventory")).send().await?;
            print_body(res).await?;
        }
    };
    Ok(())
}

async fn print_body(res: Response) -> Result<(), anyhow::Error> {
    match res.status() {
        StatusCode::OK => {
            let body = res.json::<Value>().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        StatusCode::BAD_REQUEST => println!("Bad request"),
        StatusCode::NOT_FOUND => println!("Resource not found"),
        StatusCode::SERVICE_UNAVAILABLE => println!("server is busy, try again"),
        unexpected => println!("got unexpected status code, {}", unexpected),
    }
    Ok(())
}
