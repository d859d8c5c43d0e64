use crate::config::DepGroupEntry;
use ckb_types::{bytes::Bytes, packed, prelude::*};

impl From<&DepGroupEntry> for packed::OutPoint {
    fn from(entry: &DepGroupEntry) -> packed::OutPoint {
        packed::OutPoint::new_builder()
            .tx_hash(entry.tx_hash.pack())
            .index(entry.index.pack())
            .build()
    }
}

/// Packs the out-points into a molecule `OutPointVec`, keeping the entries order
pub fn pack_dep_group(entries: &[DepGroupEntry]) -> Bytes {
    let out_points: packed::OutPointVec = entries
        .iter()
        .map(packed::OutPoint::from)
        .collect::<Vec<_>>()
        .pack();
    out_points.as_bytes()
}

#[cfg(test)]
pub fn unpack_dep_group(data: &[u8]) -> crate::error::DeployResult<Vec<packed::OutPoint>> {
    let out_points = packed::OutPointVec::from_slice(data)
        .map_err(|err| crate::error::DeployError::Codec(format!("malformed dep group data: {}", err)))?;
    Ok(out_points.into_iter().collect())
}
