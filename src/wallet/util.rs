use ckb_hash::new_blake2b;
use ckb_types::{
    bytes::Bytes,
    core::TransactionView,
    packed::{self, WitnessArgs},
    prelude::*,
    H256,
};

pub const SIGNATURE_SIZE: usize = 65;

/// `WitnessArgs` whose lock is a zero filled signature slot
pub fn placeholder_witness() -> WitnessArgs {
    let zero_lock = Bytes::from(vec![0u8; SIGNATURE_SIZE]);
    WitnessArgs::new_builder()
        .lock(Some(zero_lock).pack())
        .build()
}

/// Sighash-all message of the input group starting at `begin_index` and
/// spanning `len` witnesses
pub fn tx_sign_message(tx: &TransactionView, begin_index: usize, len: usize) -> Option<H256> {
    let mut blake2b = new_blake2b();
    let mut message = [0u8; 32];
    blake2b.update(&tx.hash().raw_data());
    // digest the first witness
    let witness = WitnessArgs::from_slice(&tx.witnesses().get(begin_index)?.raw_data()).ok()?;
    let zero_lock = Bytes::from(vec![0u8; SIGNATURE_SIZE]);
    let witness_for_digest = witness.as_builder().lock(Some(zero_lock).pack()).build();
    let witness_len = witness_for_digest.as_bytes().len() as u64;
    blake2b.update(&witness_len.to_le_bytes());
    blake2b.update(&witness_for_digest.as_bytes());
    for n in (begin_index + 1)..(begin_index + len) {
        let witness = tx.witnesses().get(n)?;
        let witness_len = witness.raw_data().len() as u64;
        blake2b.update(&witness_len.to_le_bytes());
        blake2b.update(&witness.raw_data());
    }
    blake2b.finalize(&mut message);
    Some(H256::from(message))
}

pub fn attach_signature(
    tx: TransactionView,
    signature: Bytes,
    begin_index: usize,
) -> Option<TransactionView> {
    if signature.len() != SIGNATURE_SIZE {
        return None;
    }
    let mut signed_witnesses: Vec<packed::Bytes> = tx.witnesses().into_iter().collect();
    let witness = WitnessArgs::from_slice(&signed_witnesses.get(begin_index)?.raw_data()).ok()?;
    signed_witnesses[begin_index] = witness
        .as_builder()
        .lock(Some(signature).pack())
        .build()
        .as_bytes()
        .pack();
    Some(
        tx.as_advanced_builder()
            .set_witnesses(signed_witnesses)
            .build(),
    )
}
