use super::rpc::{IndexerCell, IndexerClient, Order, Pagination, RpcClient, SearchKey};
use crate::error::DeployResult;
use ckb_jsonrpc_types::JsonBytes;
use ckb_types::{
    core::BlockView,
    packed::{CellInput, OutPoint, Script},
    prelude::*,
};

/// A spendable cell of the signer
#[derive(Hash, Eq, PartialEq, Debug, Clone)]
pub struct LiveCell {
    pub out_point: OutPoint,
    pub capacity: u64,
}

impl LiveCell {
    pub fn input(&self) -> CellInput {
        CellInput::new(self.out_point.clone(), 0)
    }
}

#[derive(Default, Debug, Clone)]
pub struct CollectResult {
    pub live_cells: Vec<LiveCell>,
    pub capacity: u64,
}

impl CollectResult {
    fn push(&mut self, cell: LiveCell) {
        self.capacity = self.capacity.saturating_add(cell.capacity);
        self.live_cells.push(cell);
    }
}

/// Gathers plain capacity cells of `lock` until `target` shannons are reached.
///
/// A collector stops early once the target is met and otherwise returns whatever
/// it found; deciding whether that is enough is left to the caller.
pub trait CellCollector {
    fn collect(&self, lock: &Script, target: u64) -> DeployResult<CollectResult>;
}

/// Pages through the lock's cells with the ckb-indexer `get_cells` RPC
pub struct IndexerCollector {
    client: IndexerClient,
}

impl IndexerCollector {
    pub const PAGE_SIZE: u32 = 1000;

    pub fn new(client: IndexerClient) -> Self {
        IndexerCollector { client }
    }
}

impl CellCollector for IndexerCollector {
    fn collect(&self, lock: &Script, target: u64) -> DeployResult<CollectResult> {
        collect_pages(target, Self::PAGE_SIZE, |cursor| {
            let search_key = SearchKey::plain_cells_of(lock.clone().into());
            self.client
                .get_cells(search_key, Order::Asc, Self::PAGE_SIZE.into(), cursor)
        })
    }
}

/// Drains `fetch_page` until `target` is reached or a page comes back short.
/// Cells carrying a type script or data are skipped.
fn collect_pages<F>(
    target: u64,
    page_size: u32,
    mut fetch_page: F,
) -> DeployResult<CollectResult>
where
    F: FnMut(Option<JsonBytes>) -> DeployResult<Pagination<IndexerCell>>,
{
    let mut result = CollectResult::default();
    let mut cursor = None;
    loop {
        let page = fetch_page(cursor.take())?;
        let page_len = page.objects.len();
        for cell in page.objects {
            let has_data = cell
                .output_data
                .as_ref()
                .map(|data| !data.is_empty())
                .unwrap_or(false);
            if has_data || cell.output.type_.is_some() {
                continue;
            }
            let live_cell = LiveCell {
                out_point: cell.out_point.into(),
                capacity: cell.output.capacity.value(),
            };
            log::debug!("collect cell {} {}", live_cell.out_point, live_cell.capacity);
            result.push(live_cell);
            if result.capacity >= target {
                return Ok(result);
            }
        }
        if page_len < page_size as usize {
            break;
        }
        cursor = Some(page.last_cursor);
    }
    Ok(result)
}

/// Walks the chain from genesis without an indexer, confirming each candidate
/// with `get_live_cell`
pub struct ScanCollector<'a> {
    client: &'a RpcClient,
}

impl<'a> ScanCollector<'a> {
    pub fn new(client: &'a RpcClient) -> Self {
        ScanCollector { client }
    }

    fn candidates(block: &BlockView, lock: &Script) -> Vec<LiveCell> {
        let mut cells = Vec::new();
        for tx in block.transactions() {
            let tx_hash = tx.hash();
            for (index, (output, data)) in tx.outputs_with_data_iter().enumerate() {
                if &output.lock() != lock || output.type_().to_opt().is_some() || !data.is_empty() {
                    continue;
                }
                let capacity: u64 = output.capacity().unpack();
                cells.push(LiveCell {
                    out_point: OutPoint::new(tx_hash.clone(), index as u32),
                    capacity,
                });
            }
        }
        cells
    }
}

impl<'a> CellCollector for ScanCollector<'a> {
    fn collect(&self, lock: &Script, target: u64) -> DeployResult<CollectResult> {
        let tip = self.client.get_tip_block_number()?;
        let blocks = (0..=tip).map(|number| {
            self.client
                .get_block_by_number(number)
                .map(|block| block.map(Into::into))
        });
        scan_blocks(lock, target, blocks, |out_point| {
            let cell = self.client.get_live_cell(out_point.clone().into(), false)?;
            Ok(cell.status == "live")
        })
    }
}

/// Accumulates the lock's plain cells block by block, a missing block ends the walk
fn scan_blocks<I, F>(
    lock: &Script,
    target: u64,
    blocks: I,
    mut is_live: F,
) -> DeployResult<CollectResult>
where
    I: IntoIterator<Item = DeployResult<Option<BlockView>>>,
    F: FnMut(&OutPoint) -> DeployResult<bool>,
{
    let mut result = CollectResult::default();
    for block in blocks {
        let block = match block? {
            Some(block) => block,
            None => break,
        };
        for cell in ScanCollector::candidates(&block, lock) {
            if !is_live(&cell.out_point)? {
                continue;
            }
            log::debug!("collect cell {} {}", cell.out_point, cell.capacity);
            result.push(cell);
            if result.capacity >= target {
                return Ok(result);
            }
        }
    }
    Ok(result)
}
