use super::assembly::{collection_target, AssembledTx, Assembler, Payload};
use super::dep_group::pack_dep_group;
use super::receipt::{DeployReceipt, ReceiptKind};
use crate::config::{DepGroupEntry, DeployMethod};
use crate::wallet::{CellCollector, HumanCapacity, Key, SystemScripts, TransactionSender};

use anyhow::{Context, Result};
use ckb_types::{bytes::Bytes, core::TransactionView, prelude::*, H256};

/// One deployment: collect, assemble, sign and broadcast
pub struct DeploymentProcess<'a> {
    collector: &'a dyn CellCollector,
    sender: &'a dyn TransactionSender,
    key: Key,
    scripts: SystemScripts,
    fee_rate: u64,
    dry_run: bool,
}

impl<'a> DeploymentProcess<'a> {
    pub fn new(
        collector: &'a dyn CellCollector,
        sender: &'a dyn TransactionSender,
        key: Key,
        scripts: SystemScripts,
        fee_rate: u64,
    ) -> Self {
        DeploymentProcess {
            collector,
            sender,
            key,
            scripts,
            fee_rate,
            dry_run: false,
        }
    }

    /// Skip the broadcast, the signed tx is printed instead
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn deploy_script(&self, binary: Bytes, method: DeployMethod) -> Result<DeployReceipt> {
        log::info!(
            "deploy script binary of {} bytes, type id {}",
            binary.len(),
            method.enable_type_id()
        );
        let payload = Payload::Script {
            data: binary,
            type_id: method.enable_type_id(),
        };
        self.deploy_payload(&payload, ReceiptKind::Script)
    }

    pub fn deploy_dep_group(&self, entries: &[DepGroupEntry]) -> Result<DeployReceipt> {
        log::info!("create dep_group of {} cells", entries.len());
        let payload = Payload::DepGroup {
            data: pack_dep_group(entries),
        };
        self.deploy_payload(&payload, ReceiptKind::DepGroup)
    }

    fn deploy_payload(&self, payload: &Payload, kind: ReceiptKind) -> Result<DeployReceipt> {
        let lock = self.key.lock_script(&self.scripts)?;
        let requested = payload.requested_capacity()?;
        let target = collection_target(requested)?;
        log::info!(
            "requested capacity {:#}, collecting {:#}",
            HumanCapacity::from(requested),
            HumanCapacity::from(target)
        );

        let collected = self
            .collector
            .collect(&lock, target)
            .context("collect cell error")?;
        log::info!(
            "collected {} cells, {:#}",
            collected.live_cells.len(),
            HumanCapacity::from(collected.capacity)
        );

        let assembled = Assembler::new(lock, &self.scripts, self.fee_rate)
            .assemble(payload, &collected)
            .context("build transaction error")?;
        log_assembled(&assembled);

        let tx = self
            .key
            .sign_tx(assembled.tx.clone())
            .context("sign transaction error")?;

        let tx_json = tx_json(&tx)?;
        log::debug!("signed transaction: {}", tx_json);

        let (tx_hash, sent) = if self.dry_run {
            println!("{}", tx_json);
            (tx.hash().unpack(), false)
        } else {
            let tx_hash = self
                .sender
                .send_transaction(&tx)
                .context("send transaction error")?;
            log::info!("sent transaction {:#x}", tx_hash);
            (tx_hash, true)
        };

        Ok(DeployReceipt {
            kind,
            tx_hash,
            index: 0,
            code_hash: assembled.code_hash,
            fee: assembled.fee,
            sent,
        })
    }
}

fn log_assembled(assembled: &AssembledTx) {
    if let Some(type_id) = &assembled.type_id {
        let type_hash: H256 = type_id.calc_script_hash().unpack();
        log::info!("type id script hash {:#x}", type_hash);
    }
    let principal: u64 = assembled
        .tx
        .outputs()
        .get(0)
        .map(|output| output.capacity().unpack())
        .unwrap_or_default();
    log::info!(
        "principal output {:#}, change output {}, fee {:#}",
        HumanCapacity::from(principal),
        assembled.has_change(),
        HumanCapacity::from(assembled.fee)
    );
    log::debug!(
        "requested {} collected {} shannons",
        assembled.requested_capacity,
        assembled.collected_capacity
    );
}

fn tx_json(tx: &TransactionView) -> Result<String> {
    let json_tx = ckb_jsonrpc_types::TransactionView::from(tx.clone());
    Ok(serde_json::to_string_pretty(&json_tx)?)
}
