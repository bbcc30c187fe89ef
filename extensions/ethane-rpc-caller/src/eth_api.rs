use crate::{RpcCallerInterface, Subscription, constants::SUBSCRIBE_METHOD};
use ethane_rpc::rpc::{RequestArguments, RpcError};
use serde_json::{Value, json};

/// Named wrappers over the common `web3`, `net`, `eth`, `personal` and
/// `txpool` methods.
///
/// Every wrapper forwards to [`RpcCallerInterface::call`] with a fixed method
/// name and returns the node's JSON untouched. String parameters are checked
/// against the client's [`ParamValidation`](crate::ParamValidation) first.
#[async_trait::async_trait]
pub trait EthApi: RpcCallerInterface {
    async fn web3_client_version(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("web3_clientVersion")?).await
    }

    async fn web3_sha3(&self, data: &str) -> Result<Value, RpcError> {
        self.param_validation().data(0, data)?;
        self.call(RequestArguments::new("web3_sha3", vec![json!(data)])?)
            .await
    }

    async fn net_version(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("net_version")?).await
    }

    async fn net_peer_count(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("net_peerCount")?).await
    }

    async fn net_listening(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("net_listening")?).await
    }

    async fn eth_protocol_version(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("eth_protocolVersion")?).await
    }

    async fn eth_syncing(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("eth_syncing")?).await
    }

    async fn eth_coinbase(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("eth_coinbase")?).await
    }

    async fn eth_mining(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("eth_mining")?).await
    }

    async fn eth_hashrate(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("eth_hashrate")?).await
    }

    async fn eth_gas_price(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("eth_gasPrice")?).await
    }

    async fn eth_accounts(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("eth_accounts")?).await
    }

    /// EIP-1102 account access request, as issued by browser wallets.
    async fn eth_request_accounts(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("eth_requestAccounts")?).await
    }

    async fn eth_block_number(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("eth_blockNumber")?).await
    }

    async fn eth_chain_id(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("eth_chainId")?).await
    }

    async fn eth_get_balance(&self, address: &str, block: &str) -> Result<Value, RpcError> {
        self.call(address_at_block(self, "eth_getBalance", address, block)?)
            .await
    }

    async fn eth_get_transaction_count(
        &self,
        address: &str,
        block: &str,
    ) -> Result<Value, RpcError> {
        self.call(address_at_block(
            self,
            "eth_getTransactionCount",
            address,
            block,
        )?)
        .await
    }

    async fn eth_get_code(&self, address: &str, block: &str) -> Result<Value, RpcError> {
        self.call(address_at_block(self, "eth_getCode", address, block)?)
            .await
    }

    /// With `full_transactions` the block embeds transaction objects
    /// instead of their hashes.
    async fn eth_get_block_by_number(
        &self,
        block: &str,
        full_transactions: bool,
    ) -> Result<Value, RpcError> {
        self.param_validation().block(0, block)?;
        self.call(RequestArguments::new(
            "eth_getBlockByNumber",
            vec![json!(block), json!(full_transactions)],
        )?)
        .await
    }

    async fn eth_get_transaction_by_hash(&self, hash: &str) -> Result<Value, RpcError> {
        self.param_validation().hash(0, hash)?;
        self.call(RequestArguments::new(
            "eth_getTransactionByHash",
            vec![json!(hash)],
        )?)
        .await
    }

    async fn eth_get_transaction_receipt(&self, hash: &str) -> Result<Value, RpcError> {
        self.param_validation().hash(0, hash)?;
        self.call(RequestArguments::new(
            "eth_getTransactionReceipt",
            vec![json!(hash)],
        )?)
        .await
    }

    async fn eth_send_raw_transaction(&self, data: &str) -> Result<Value, RpcError> {
        self.param_validation().data(0, data)?;
        self.call(RequestArguments::new(
            "eth_sendRawTransaction",
            vec![json!(data)],
        )?)
        .await
    }

    async fn personal_list_accounts(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("personal_listAccounts")?).await
    }

    async fn txpool_status(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("txpool_status")?).await
    }

    async fn txpool_content(&self) -> Result<Value, RpcError> {
        self.call(RequestArguments::no_params("txpool_content")?).await
    }

    async fn eth_subscribe_new_heads(&self) -> Result<Subscription, RpcError> {
        self.subscribe(RequestArguments::new(
            SUBSCRIBE_METHOD,
            vec![json!("newHeads")],
        )?)
        .await
    }

    async fn eth_subscribe_new_pending_transactions(&self) -> Result<Subscription, RpcError> {
        self.subscribe(RequestArguments::new(
            SUBSCRIBE_METHOD,
            vec![json!("newPendingTransactions")],
        )?)
        .await
    }
}

impl<C: RpcCallerInterface> EthApi for C {}

fn address_at_block<C: RpcCallerInterface + ?Sized>(
    client: &C,
    method: &str,
    address: &str,
    block: &str,
) -> Result<RequestArguments, RpcError> {
    let validation = client.param_validation();
    validation.address(0, address)?;
    validation.block(1, block)?;
    RequestArguments::new(method, vec![json!(address), json!(block)])
}
