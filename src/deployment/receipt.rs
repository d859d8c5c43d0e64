use ckb_types::H256;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiptKind {
    Script,
    DepGroup,
}

/// Result of a broadcast (or dry-run) deployment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployReceipt {
    pub kind: ReceiptKind,
    pub tx_hash: H256,
    /// The deployed cell is always the first output
    pub index: u32,
    pub code_hash: Option<H256>,
    pub fee: u64,
    pub sent: bool,
}

impl fmt::Display for DeployReceipt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ReceiptKind::Script => writeln!(f, "Deployed script info:")?,
            ReceiptKind::DepGroup => writeln!(f, "Create dep_group info:")?,
        }
        writeln!(f, "\ttxHash: {:#x}", self.tx_hash)?;
        writeln!(f, "\tindex: {}", self.index)?;
        if let Some(code_hash) = &self.code_hash {
            writeln!(f, "\tCodeHash: {:#x}", code_hash)?;
        }
        Ok(())
    }
}
