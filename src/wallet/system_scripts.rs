use super::rpc::RpcClient;
use crate::error::{DeployError, DeployResult};
use ckb_types::{
    core::{BlockView, DepType},
    packed,
    prelude::*,
};

/// Well-known scripts the signer's lock depends on
#[derive(Clone, Debug)]
pub struct SystemScripts {
    /// type hash of the secp256k1-blake160-sighash-all cell
    pub secp256k1_code_hash: packed::Byte32,
    /// dep-group bundling the secp256k1 code and its data
    pub secp256k1_dep: packed::CellDep,
}

impl SystemScripts {
    pub fn load(rpc_client: &RpcClient) -> DeployResult<Self> {
        let genesis: BlockView = rpc_client
            .get_block_by_number(0)?
            .ok_or_else(|| DeployError::Network("genesis block not found".to_string()))?
            .into();
        Self::from_genesis(&genesis)
    }

    /// The sighash code lives in genesis tx 0 output 1, its dep-group in tx 1 output 0
    pub fn from_genesis(genesis: &BlockView) -> DeployResult<Self> {
        let missing = |what: &str| DeployError::Network(format!("genesis block has no {}", what));
        let transactions = genesis.transactions();
        let cellbase = transactions.first().ok_or_else(|| missing("cellbase"))?;
        let secp256k1_code_hash = cellbase
            .outputs()
            .get(1)
            .and_then(|output| output.type_().to_opt())
            .ok_or_else(|| missing("secp256k1 type script"))?
            .calc_script_hash();
        let dep_group_tx = transactions.get(1).ok_or_else(|| missing("dep group tx"))?;
        let out_point = packed::OutPoint::new_builder()
            .tx_hash(dep_group_tx.hash())
            .index(0u32.pack())
            .build();
        let secp256k1_dep = packed::CellDep::new_builder()
            .out_point(out_point)
            .dep_type(DepType::DepGroup.into())
            .build();
        Ok(SystemScripts {
            secp256k1_code_hash,
            secp256k1_dep,
        })
    }
}
