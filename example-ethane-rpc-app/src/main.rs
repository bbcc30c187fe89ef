use ethane_rpc::rpc::{RequestArguments, RpcError};
use ethane_tokio_rpc_client::{EthApi, RpcCallerInterface, RpcClient};
use futures::StreamExt;
use std::time::Duration;
use tokio::join;
use tracing_subscriber::EnvFilter;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8545";
const ENDPOINT_ENV_VAR: &str = "ETHANE_ENDPOINT";
const HEADS_TO_WATCH: usize = 3;
const WATCH_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), RpcError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let endpoint = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(ENDPOINT_ENV_VAR).ok())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    tracing::info!("Connecting to {}", endpoint);
    let rpc_client = RpcClient::new(&endpoint).await?;

    let syncing_args = RequestArguments::no_params("eth_syncing")?;

    // `join!` will await all responses before proceeding
    let (client_version, chain_id, block_number, syncing) = join!(
        rpc_client.web3_client_version(),
        rpc_client.eth_chain_id(),
        rpc_client.eth_block_number(),
        rpc_client.call(syncing_args)
    );

    println!("web3_clientVersion: {:?}", client_version);
    println!("eth_chainId: {:?}", chain_id);
    println!("eth_blockNumber: {:?}", block_number);
    println!("eth_syncing: {:?}", syncing);

    if rpc_client.supports_subscriptions() {
        let mut heads = rpc_client.eth_subscribe_new_heads().await?;
        println!("Watching new heads on subscription {}", heads.id());

        for _ in 0..HEADS_TO_WATCH {
            match tokio::time::timeout(WATCH_TIMEOUT, heads.next()).await {
                Ok(Some(head)) => println!("New head: {}", head["number"]),
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!("No new head within {:?}", WATCH_TIMEOUT);
                    break;
                }
            }
        }

        println!("Unsubscribed: {:?}", heads.unsubscribe(&rpc_client).await);
    }

    rpc_client.close("demo finished")?;
    Ok(())
}
