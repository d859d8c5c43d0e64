use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::DeployResult;
use ckb_jsonrpc_types::{
    BlockNumber, BlockView, CellOutput, CellWithStatus, JsonBytes, OutPoint, Script, Transaction,
    Uint32, Uint64,
};
use ckb_types::{core::BlockNumber as CoreBlockNumber, core::TransactionView, H256};
use serde::{Deserialize, Serialize};

lazy_static::lazy_static! {
    pub static ref HTTP_CLIENT: reqwest::blocking::Client = reqwest::blocking::Client::builder()
        .timeout(::std::time::Duration::from_secs(30))
        .build()
        .expect("reqwest Client build");
}

#[derive(Debug)]
pub struct IdGenerator {
    state: AtomicU64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        IdGenerator {
            state: AtomicU64::new(1),
        }
    }
}

impl IdGenerator {
    pub fn next(&self) -> u64 {
        self.state.fetch_add(1, Ordering::SeqCst)
    }
}

macro_rules! jsonrpc {
    (
        $(#[$struct_attr:meta])*
        pub struct $struct_name:ident {$(
            $(#[$attr:meta])*
            pub fn $method:ident(&$selff:ident $(, $arg_name:ident: $arg_ty:ty)*)
                -> $return_ty:ty;
        )*}
    ) => (
        $(#[$struct_attr])*
        pub struct $struct_name {
            pub client: &'static reqwest::blocking::Client,
            pub url: reqwest::Url,
            pub id_generator: $crate::wallet::rpc::IdGenerator,
        }

        impl $struct_name {
            pub fn new(uri: &str) -> $crate::error::DeployResult<Self> {
                let url = reqwest::Url::parse(uri).map_err(|err| {
                    $crate::error::DeployError::Network(format!("invalid url {}: {}", uri, err))
                })?;
                let id_generator = $crate::wallet::rpc::IdGenerator::default();
                Ok($struct_name { url, id_generator, client: &$crate::wallet::rpc::HTTP_CLIENT, })
            }

            $(
                $(#[$attr])*
                pub fn $method(&$selff $(, $arg_name: $arg_ty)*) -> $crate::error::DeployResult<$return_ty> {
                    let method = String::from(stringify!($method));
                    let params = serialize_parameters!($($arg_name,)*);
                    let id = $selff.id_generator.next();

                    let mut req_json = serde_json::Map::new();
                    req_json.insert("id".to_owned(), serde_json::json!(id));
                    req_json.insert("jsonrpc".to_owned(), serde_json::json!("2.0"));
                    req_json.insert("method".to_owned(), serde_json::json!(method));
                    req_json.insert("params".to_owned(), params);

                    log::trace!("rpc request {} #{} to {}", method, id, $selff.url);
                    let resp = $selff.client.post($selff.url.clone()).json(&req_json).send()?;
                    let output = resp.json::<jsonrpc_core::response::Output>()?;
                    match output {
                        jsonrpc_core::response::Output::Success(success) => {
                            serde_json::from_value(success.result).map_err(Into::into)
                        },
                        jsonrpc_core::response::Output::Failure(failure) => {
                            Err($crate::error::DeployError::Network(format!(
                                "{} failed: {}",
                                method,
                                serde_json::to_string(&failure.error).unwrap_or_default()
                            )))
                        }
                    }
                }
            )*
        }
    )
}

macro_rules! serialize_parameters {
    () => ( serde_json::Value::Null );
    ($($arg_name:ident,)+) => ( serde_json::to_value(($($arg_name,)+))?)
}

/// Broadcasts a signed transaction
pub trait TransactionSender {
    fn send_transaction(&self, tx: &TransactionView) -> DeployResult<H256>;
}

pub struct RpcClient {
    inner: Inner,
}

impl RpcClient {
    pub fn new(uri: &str) -> DeployResult<Self> {
        Ok(Self {
            inner: Inner::new(uri)?,
        })
    }

    pub fn get_block_by_number(&self, number: CoreBlockNumber) -> DeployResult<Option<BlockView>> {
        self.inner.get_block_by_number(number.into())
    }

    pub fn get_tip_block_number(&self) -> DeployResult<CoreBlockNumber> {
        self.inner
            .get_tip_block_number()
            .map(|number| number.value())
    }

    pub fn get_live_cell(&self, out_point: OutPoint, with_data: bool) -> DeployResult<CellWithStatus> {
        self.inner.get_live_cell(out_point, with_data)
    }
}

impl TransactionSender for RpcClient {
    fn send_transaction(&self, tx: &TransactionView) -> DeployResult<H256> {
        let tx: Transaction = tx.data().into();
        self.inner
            .send_transaction(tx, Some("passthrough".to_string()))
    }
}

jsonrpc!(pub struct Inner {
    pub fn send_transaction(&self, tx: Transaction, outputs_validator: Option<String>) -> H256;
    pub fn get_live_cell(&self, _out_point: OutPoint, _with_data: bool) -> CellWithStatus;
    pub fn get_block_by_number(&self, _number: BlockNumber) -> Option<BlockView>;
    pub fn get_tip_block_number(&self) -> BlockNumber;
});

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptType {
    Lock,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    Asc,
}

#[derive(Serialize, Debug, Clone)]
pub struct SearchKeyFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_len_range: Option<[Uint64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_data_len_range: Option<[Uint64; 2]>,
}

#[derive(Serialize, Debug, Clone)]
pub struct SearchKey {
    pub script: Script,
    pub script_type: ScriptType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<SearchKeyFilter>,
}

impl SearchKey {
    /// Cells locked by `lock` that carry neither a type script nor data
    pub fn plain_cells_of(lock: Script) -> Self {
        SearchKey {
            script: lock,
            script_type: ScriptType::Lock,
            filter: Some(SearchKeyFilter {
                script_len_range: Some([0u64.into(), 1u64.into()]),
                output_data_len_range: Some([0u64.into(), 1u64.into()]),
            }),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct IndexerCell {
    pub output: CellOutput,
    pub output_data: Option<JsonBytes>,
    pub out_point: OutPoint,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Pagination<T> {
    pub objects: Vec<T>,
    pub last_cursor: JsonBytes,
}

jsonrpc!(pub struct IndexerClient {
    pub fn get_cells(
        &self,
        search_key: SearchKey,
        order: Order,
        limit: Uint32,
        after: Option<JsonBytes>
    ) -> Pagination<IndexerCell>;
});
