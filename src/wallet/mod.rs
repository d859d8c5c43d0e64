mod collector;
mod human_capacity;
mod key;
mod rpc;
mod system_scripts;
mod util;

pub use collector::{CellCollector, CollectResult, IndexerCollector, LiveCell, ScanCollector};
pub use human_capacity::{HumanCapacity, ONE_CKB};
pub use key::Key;
pub use rpc::{IndexerClient, RpcClient, TransactionSender};
pub use system_scripts::SystemScripts;
pub use util::placeholder_witness;
