//! Funds, shapes and prices the single deployment transaction.
//!
//! The principal output at index 0 carries the payload. A zero capacity change
//! output is appended only when the leftover can sustain a cell of its own, and
//! it receives `collected - requested - fee` once the fee is known. Without it the
//! principal output absorbs everything but the fee.

use super::type_id::build_type_id_script;
use crate::error::{DeployError, DeployResult};
use crate::wallet::{placeholder_witness, CollectResult, SystemScripts, ONE_CKB};
use ckb_types::{
    bytes::Bytes,
    core::{Capacity, TransactionBuilder, TransactionView},
    packed,
    prelude::*,
    H256,
};

/// capacity (8) + secp256k1 lock (32 + 1 + 20)
pub const CELL_OVERHEAD_BYTES: u64 = 61;
/// type id script (32 + 1 + 32)
pub const TYPE_ID_OVERHEAD_BYTES: u64 = 65;
/// Collected on top of the requested capacity to leave room for the fee
pub const CAPACITY_MARGIN: u64 = 100_000_000;

pub const DEPLOY_FEE_RATE: u64 = 1100;
pub const DEP_GROUP_FEE_RATE: u64 = 1000;

/// Capacity of the principal output holding `payload_len` bytes
pub fn requested_capacity(payload_len: usize, with_type_id: bool) -> DeployResult<u64> {
    let mut bytes = (payload_len as u64)
        .checked_add(CELL_OVERHEAD_BYTES)
        .ok_or(DeployError::CapacityOverflow)?;
    if with_type_id {
        bytes = bytes
            .checked_add(TYPE_ID_OVERHEAD_BYTES)
            .ok_or(DeployError::CapacityOverflow)?;
    }
    bytes
        .checked_mul(ONE_CKB)
        .ok_or(DeployError::CapacityOverflow)
}

/// Amount the collector has to reach
pub fn collection_target(requested: u64) -> DeployResult<u64> {
    requested
        .checked_add(CAPACITY_MARGIN)
        .ok_or(DeployError::CapacityOverflow)
}

/// Fee in shannons for `tx_size` bytes at `fee_rate` shannons per KB, rounded up
pub fn calculate_fee(tx_size: usize, fee_rate: u64) -> u64 {
    let weighted = (tx_size as u64).saturating_mul(fee_rate);
    let fee = weighted / 1000;
    if weighted % 1000 == 0 {
        fee
    } else {
        fee + 1
    }
}

/// What ends up in the principal output
#[derive(Clone, Debug)]
pub enum Payload {
    /// A script binary, optionally guarded by a type id
    Script { data: Bytes, type_id: bool },
    /// A packed `OutPointVec`
    DepGroup { data: Bytes },
}

impl Payload {
    pub fn data(&self) -> &Bytes {
        match self {
            Payload::Script { data, .. } => data,
            Payload::DepGroup { data } => data,
        }
    }

    pub fn enable_type_id(&self) -> bool {
        matches!(self, Payload::Script { type_id: true, .. })
    }

    pub fn requested_capacity(&self) -> DeployResult<u64> {
        requested_capacity(self.data().len(), self.enable_type_id())
    }
}

#[derive(Clone, Debug)]
pub struct AssembledTx {
    /// Unsigned; witness 0 carries the signature placeholder
    pub tx: TransactionView,
    /// Hash callers use to reference the deployed script, `None` for dep groups
    pub code_hash: Option<H256>,
    pub type_id: Option<packed::Script>,
    pub fee: u64,
    pub requested_capacity: u64,
    pub collected_capacity: u64,
}

impl AssembledTx {
    pub fn has_change(&self) -> bool {
        self.tx.outputs().len() > 1
    }
}

pub struct Assembler<'a> {
    lock: packed::Script,
    scripts: &'a SystemScripts,
    fee_rate: u64,
}

impl<'a> Assembler<'a> {
    pub fn new(lock: packed::Script, scripts: &'a SystemScripts, fee_rate: u64) -> Self {
        Assembler {
            lock,
            scripts,
            fee_rate,
        }
    }

    /// A change cell must at least pay for its own bytes, this is 61 CKB for the
    /// sighash lock
    pub fn change_threshold(&self) -> DeployResult<u64> {
        let change_output = packed::CellOutput::new_builder()
            .lock(self.lock.clone())
            .build();
        change_output
            .occupied_capacity(Capacity::zero())
            .map(|capacity| capacity.as_u64())
            .map_err(|_| DeployError::CapacityOverflow)
    }

    pub fn assemble(
        &self,
        payload: &Payload,
        collected: &CollectResult,
    ) -> DeployResult<AssembledTx> {
        let requested = payload.requested_capacity()?;
        let target = collection_target(requested)?;
        if collected.capacity < target || collected.live_cells.is_empty() {
            return Err(DeployError::InsufficientCapacity {
                available: collected.capacity,
                required: target,
            });
        }

        let inputs: Vec<packed::CellInput> =
            collected.live_cells.iter().map(|cell| cell.input()).collect();

        let mut principal = packed::CellOutput::new_builder()
            .capacity(requested.pack())
            .lock(self.lock.clone());
        let mut type_id = None;
        let code_hash: Option<H256> = match payload {
            Payload::Script { type_id: true, .. } => {
                let type_script = build_type_id_script(&inputs[0], 0);
                principal = principal.type_(Some(type_script.clone()).pack());
                let hash: H256 = type_script.calc_script_hash().unpack();
                type_id = Some(type_script);
                Some(hash)
            }
            Payload::Script { data, .. } => {
                Some(packed::CellOutput::calc_data_hash(data).unpack())
            }
            Payload::DepGroup { .. } => None,
        };

        let mut outputs = vec![principal.build()];
        let mut outputs_data = vec![payload.data().clone()];
        let leftover = collected.capacity - target;
        if leftover > self.change_threshold()? {
            outputs.push(
                packed::CellOutput::new_builder()
                    .capacity(0u64.pack())
                    .lock(self.lock.clone())
                    .build(),
            );
            outputs_data.push(Bytes::new());
        }

        // one witness per input, the group signature goes to the first one
        let mut witnesses = vec![placeholder_witness().as_bytes().pack()];
        witnesses.extend((1..inputs.len()).map(|_| Bytes::new().pack()));

        let tx = TransactionBuilder::default()
            .cell_dep(self.scripts.secp256k1_dep.clone())
            .inputs(inputs)
            .outputs(outputs)
            .outputs_data(outputs_data.iter().map(|data| data.pack()))
            .witnesses(witnesses)
            .build();

        let fee = calculate_fee(tx.data().serialized_size_in_block(), self.fee_rate);
        let mut outputs: Vec<packed::CellOutput> = tx.outputs().into_iter().collect();
        let (change_index, change_capacity) = if outputs.len() > 1 {
            (1, collected.capacity.checked_sub(requested + fee))
        } else {
            (0, collected.capacity.checked_sub(fee))
        };
        let change_capacity = change_capacity.ok_or(DeployError::InsufficientCapacity {
            available: collected.capacity,
            required: requested + fee,
        })?;
        outputs[change_index] = outputs[change_index]
            .clone()
            .as_builder()
            .capacity(change_capacity.pack())
            .build();
        let tx = tx.as_advanced_builder().set_outputs(outputs).build();

        // a high fee rate can eat into the cells' own bytes
        for (output, data) in tx.outputs_with_data_iter() {
            let occupied = Capacity::bytes(data.len())
                .and_then(|data_capacity| output.occupied_capacity(data_capacity))
                .map_err(|_| DeployError::CapacityOverflow)?
                .as_u64();
            let capacity: u64 = output.capacity().unpack();
            if capacity < occupied {
                return Err(DeployError::InsufficientCapacity {
                    available: collected.capacity,
                    required: collected.capacity.saturating_add(occupied - capacity),
                });
            }
        }

        log::info!(
            "assembled tx with {} inputs, {} outputs, fee {} shannons",
            tx.inputs().len(),
            tx.outputs().len(),
            fee
        );

        Ok(AssembledTx {
            tx,
            code_hash,
            type_id,
            fee,
            requested_capacity: requested,
            collected_capacity: collected.capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::LiveCell;
    use ckb_hash::blake2b_256;
    use ckb_types::packed::OutPoint;
    use rand::{thread_rng, Rng};

    fn random_hash() -> packed::Byte32 {
        let mut rng = thread_rng();
        let mut buf = [0u8; 32];
        rng.fill(&mut buf);
        buf.pack()
    }

    fn lock() -> packed::Script {
        packed::Script::new_builder()
            .code_hash(random_hash())
            .hash_type(ckb_types::core::ScriptHashType::Type.into())
            .args(Bytes::from(vec![1u8; 20]).pack())
            .build()
    }

    fn scripts() -> SystemScripts {
        SystemScripts {
            secp256k1_code_hash: random_hash(),
            secp256k1_dep: packed::CellDep::new_builder()
                .out_point(OutPoint::new(random_hash(), 0))
                .build(),
        }
    }

    fn collected(capacities: &[u64]) -> CollectResult {
        let live_cells: Vec<_> = capacities
            .iter()
            .map(|capacity| LiveCell {
                out_point: OutPoint::new(random_hash(), 0),
                capacity: *capacity,
            })
            .collect();
        CollectResult {
            capacity: capacities.iter().sum(),
            live_cells,
        }
    }

    fn output_capacity(tx: &TransactionView, index: usize) -> u64 {
        tx.outputs().get(index).unwrap().capacity().unpack()
    }

    #[test]
    fn test_requested_capacity() {
        assert_eq!(requested_capacity(0, false).unwrap(), 61 * ONE_CKB);
        assert_eq!(requested_capacity(100, false).unwrap(), 161 * ONE_CKB);
        assert_eq!(requested_capacity(100, true).unwrap(), 226 * ONE_CKB);
        assert_eq!(requested_capacity(1000, true).unwrap(), 1126 * ONE_CKB);
        assert!(matches!(
            requested_capacity(usize::MAX, false),
            Err(DeployError::CapacityOverflow)
        ));
        assert_eq!(
            collection_target(161 * ONE_CKB).unwrap(),
            161 * ONE_CKB + CAPACITY_MARGIN
        );
    }

    #[test]
    fn test_calculate_fee_rounds_up() {
        assert_eq!(calculate_fee(1000, 1000), 1000);
        assert_eq!(calculate_fee(1001, 1000), 1001);
        assert_eq!(calculate_fee(500, 1100), 550);
        assert_eq!(calculate_fee(333, 1100), 367);
        assert_eq!(calculate_fee(0, 1000), 0);
    }

    #[test]
    fn test_change_threshold_is_sighash_cell_size() {
        let scripts = scripts();
        let assembler = Assembler::new(lock(), &scripts, DEPLOY_FEE_RATE);
        assert_eq!(assembler.change_threshold().unwrap(), 61 * ONE_CKB);
    }

    #[test]
    fn test_insufficient_capacity() {
        let scripts = scripts();
        let assembler = Assembler::new(lock(), &scripts, DEPLOY_FEE_RATE);
        let payload = Payload::Script {
            data: Bytes::from(vec![0u8; 100]),
            type_id: false,
        };
        let target = 161 * ONE_CKB + CAPACITY_MARGIN;
        let err = assembler
            .assemble(&payload, &collected(&[target - 1]))
            .unwrap_err();
        match err {
            DeployError::InsufficientCapacity {
                available,
                required,
            } => {
                assert_eq!(available, target - 1);
                assert_eq!(required, target);
            }
            err => panic!("unexpected error {}", err),
        }
        assert!(matches!(
            assembler.assemble(&payload, &collected(&[])),
            Err(DeployError::InsufficientCapacity { .. })
        ));
    }

    #[test]
    fn test_plain_deploy_without_change() {
        let scripts = scripts();
        let lock = lock();
        let assembler = Assembler::new(lock.clone(), &scripts, DEPLOY_FEE_RATE);
        let binary = Bytes::from(vec![42u8; 100]);
        let payload = Payload::Script {
            data: binary.clone(),
            type_id: false,
        };
        let total = 161 * ONE_CKB + CAPACITY_MARGIN + 1;
        let assembled = assembler.assemble(&payload, &collected(&[total])).unwrap();
        let tx = &assembled.tx;

        assert!(!assembled.has_change());
        assert_eq!(tx.outputs().len(), 1);
        assert_eq!(tx.outputs_data().len(), 1);
        assert_eq!(tx.outputs_data().get(0).unwrap().raw_data(), binary);
        assert_eq!(tx.outputs().get(0).unwrap().lock(), lock);
        assert!(tx.outputs().get(0).unwrap().type_().to_opt().is_none());
        assert_eq!(output_capacity(tx, 0) + assembled.fee, total);
        assert!(output_capacity(tx, 0) >= 161 * ONE_CKB);
        assert_eq!(
            assembled.fee,
            calculate_fee(tx.data().serialized_size_in_block(), DEPLOY_FEE_RATE)
        );
        assert_eq!(assembled.code_hash.unwrap().as_bytes(), &blake2b_256(&binary));
        assert!(assembled.type_id.is_none());

        assert_eq!(tx.cell_deps().len(), 1);
        assert_eq!(tx.cell_deps().get(0).unwrap(), scripts.secp256k1_dep);
        assert_eq!(tx.witnesses().len(), 1);
    }

    #[test]
    fn test_deploy_with_change() {
        let scripts = scripts();
        let assembler = Assembler::new(lock(), &scripts, DEPLOY_FEE_RATE);
        let payload = Payload::Script {
            data: Bytes::from(vec![1u8; 100]),
            type_id: false,
        };
        let requested = 161 * ONE_CKB;
        let cells = collected(&[100 * ONE_CKB, 200 * ONE_CKB]);
        let assembled = assembler.assemble(&payload, &cells).unwrap();
        let tx = &assembled.tx;

        assert!(assembled.has_change());
        assert_eq!(tx.outputs().len(), 2);
        assert_eq!(tx.outputs_data().get(1).unwrap().raw_data().len(), 0);
        assert_eq!(output_capacity(tx, 0), requested);
        assert_eq!(
            output_capacity(tx, 1),
            300 * ONE_CKB - requested - assembled.fee
        );
        assert_eq!(tx.inputs().len(), 2);
        assert_eq!(tx.witnesses().len(), 2);
        assert!(tx.witnesses().get(1).unwrap().raw_data().is_empty());
    }

    #[test]
    fn test_leftover_at_threshold_has_no_change() {
        let scripts = scripts();
        let assembler = Assembler::new(lock(), &scripts, DEP_GROUP_FEE_RATE);
        let data = Bytes::from(vec![0u8; 4]);
        let payload = Payload::DepGroup { data };
        let target = 65 * ONE_CKB + CAPACITY_MARGIN;
        let at_threshold = assembler
            .assemble(&payload, &collected(&[target + 61 * ONE_CKB]))
            .unwrap();
        assert_eq!(at_threshold.tx.outputs().len(), 1);
        let above_threshold = assembler
            .assemble(&payload, &collected(&[target + 61 * ONE_CKB + 1]))
            .unwrap();
        assert_eq!(above_threshold.tx.outputs().len(), 2);
    }

    #[test]
    fn test_type_id_deploy() {
        let scripts = scripts();
        let assembler = Assembler::new(lock(), &scripts, DEPLOY_FEE_RATE);
        let payload = Payload::Script {
            data: Bytes::from(vec![7u8; 100]),
            type_id: true,
        };
        let cells = collected(&[1000 * ONE_CKB]);
        let assembled = assembler.assemble(&payload, &cells).unwrap();
        let tx = &assembled.tx;

        let expected = build_type_id_script(&cells.live_cells[0].input(), 0);
        let type_script = tx.outputs().get(0).unwrap().type_().to_opt().unwrap();
        assert_eq!(type_script, expected);
        assert_eq!(assembled.type_id, Some(expected.clone()));
        let code_hash: H256 = expected.calc_script_hash().unpack();
        assert_eq!(assembled.code_hash, Some(code_hash));
        assert_eq!(output_capacity(tx, 0), 226 * ONE_CKB);
        assert_eq!(tx.inputs().get(0).unwrap(), cells.live_cells[0].input());
    }

    #[test]
    fn test_dep_group_has_no_code_hash() {
        let scripts = scripts();
        let assembler = Assembler::new(lock(), &scripts, DEP_GROUP_FEE_RATE);
        let payload = Payload::DepGroup {
            data: Bytes::from(vec![0u8; 76]),
        };
        let assembled = assembler
            .assemble(&payload, &collected(&[500 * ONE_CKB]))
            .unwrap();
        assert!(assembled.code_hash.is_none());
        assert_eq!(output_capacity(&assembled.tx, 0), (76 + 61) * ONE_CKB);
        assert_eq!(
            assembled.fee,
            calculate_fee(
                assembled.tx.data().serialized_size_in_block(),
                DEP_GROUP_FEE_RATE
            )
        );
    }

    #[test]
    fn test_fee_eating_principal_capacity() {
        let scripts = scripts();
        let assembler = Assembler::new(lock(), &scripts, 1_000_000_000);
        let payload = Payload::Script {
            data: Bytes::from(vec![1u8; 100]),
            type_id: false,
        };
        let total = 161 * ONE_CKB + CAPACITY_MARGIN + 1;
        assert!(matches!(
            assembler.assemble(&payload, &collected(&[total])),
            Err(DeployError::InsufficientCapacity { .. })
        ));
    }

    #[test]
    fn test_fee_eating_change_capacity() {
        let scripts = scripts();
        let assembler = Assembler::new(lock(), &scripts, 20_000_000_000);
        let payload = Payload::Script {
            data: Bytes::from(vec![1u8; 100]),
            type_id: false,
        };
        // 139 CKB leftover opens a change cell, the fee leaves it under 61 CKB
        let cells = collected(&[100 * ONE_CKB, 200 * ONE_CKB]);
        match assembler.assemble(&payload, &cells) {
            Err(DeployError::InsufficientCapacity {
                available,
                required,
            }) => {
                assert_eq!(available, 300 * ONE_CKB);
                assert!(required > available);
            }
            other => panic!("unexpected result {:?}", other.map(|assembled| assembled.fee)),
        }
    }
}
