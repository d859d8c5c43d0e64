use super::process::DeploymentProcess;
use super::receipt::DeployReceipt;
use crate::config::{load_dep_group_entries, ChainConfig, CollectorKind, DepGroupConfig, DeployConfig};
use crate::wallet::{
    CellCollector, IndexerClient, IndexerCollector, Key, RpcClient, ScanCollector, SystemScripts,
};
use anyhow::{anyhow, Context, Result};
use ckb_types::bytes::Bytes;
use std::fs;

/// Deploys a script binary as the data of a fresh cell
pub fn deploy(config: DeployConfig) -> Result<DeployReceipt> {
    let binary = fs::read(&config.binary)
        .with_context(|| format!("read binary {}", config.binary.display()))?;
    if binary.is_empty() {
        log::warn!("binary {} is empty", config.binary.display());
    }
    let method = config.method;
    with_process(&config.chain, |process| {
        process.deploy_script(Bytes::from(binary), method)
    })
}

/// Creates a dep group cell out of the out-points listed in the yaml file
pub fn dep_group(config: DepGroupConfig) -> Result<DeployReceipt> {
    let entries = load_dep_group_entries(&config.file)?;
    if entries.is_empty() {
        return Err(anyhow!(
            "no out-point found in {}",
            config.file.display()
        ));
    }
    with_process(&config.chain, |process| process.deploy_dep_group(&entries))
}

fn with_process<F>(chain: &ChainConfig, f: F) -> Result<DeployReceipt>
where
    F: FnOnce(&DeploymentProcess<'_>) -> Result<DeployReceipt>,
{
    let key = Key::from_hex(&chain.key).context("load private key")?;
    let rpc_client = RpcClient::new(&chain.rpc_url)?;
    let scripts = SystemScripts::load(&rpc_client).context("load system scripts from genesis")?;

    let indexer_collector;
    let scan_collector;
    let collector: &dyn CellCollector = match chain.collector {
        CollectorKind::Indexer => {
            indexer_collector = IndexerCollector::new(IndexerClient::new(&chain.indexer_url)?);
            &indexer_collector
        }
        CollectorKind::Scan => {
            scan_collector = ScanCollector::new(&rpc_client);
            &scan_collector
        }
    };

    let process = DeploymentProcess::new(collector, &rpc_client, key, scripts, chain.fee_rate)
        .dry_run(chain.dry_run);
    f(&process)
}
