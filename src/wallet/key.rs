use super::system_scripts::SystemScripts;
use super::util;
use crate::error::{DeployError, DeployResult};
use ckb_crypto::secp::Privkey;
use ckb_hash::blake2b_256;
use ckb_types::{
    bytes::Bytes,
    core::{ScriptHashType, TransactionView},
    packed,
    prelude::*,
};
use faster_hex::hex_decode;

/// secp256k1 key owning the funding cells
pub struct Key {
    privkey: Privkey,
}

impl Key {
    pub fn new(privkey: Privkey) -> Self {
        Key { privkey }
    }

    /// Imports a 32 bytes private key in hex, `0x` prefix optional
    pub fn from_hex(input: &str) -> DeployResult<Self> {
        let input = input.trim();
        let hex = input.strip_prefix("0x").unwrap_or(input);
        if hex.len() != 64 {
            return Err(DeployError::Signing(format!(
                "private key must be 32 bytes, got {} hex chars",
                hex.len()
            )));
        }
        let mut buf = [0u8; 32];
        hex_decode(hex.as_bytes(), &mut buf)
            .map_err(|err| DeployError::Signing(format!("invalid private key: {}", err)))?;
        let privkey = Privkey::from_slice(&buf);
        // reject zero or out of range scalars up front
        privkey
            .pubkey()
            .map_err(|err| DeployError::Signing(format!("invalid private key: {}", err)))?;
        Ok(Key::new(privkey))
    }

    /// blake160 of the compressed public key
    pub fn pubkey_hash(&self) -> DeployResult<[u8; 20]> {
        let pubkey = self
            .privkey
            .pubkey()
            .map_err(|err| DeployError::Signing(err.to_string()))?;
        let mut buf = [0u8; 20];
        buf.copy_from_slice(&blake2b_256(pubkey.serialize())[..20]);
        Ok(buf)
    }

    pub fn lock_script(&self, scripts: &SystemScripts) -> DeployResult<packed::Script> {
        let args = Bytes::from(self.pubkey_hash()?.to_vec());
        Ok(packed::Script::new_builder()
            .code_hash(scripts.secp256k1_code_hash.clone())
            .hash_type(ScriptHashType::Type.into())
            .args(args.pack())
            .build())
    }

    /// Signs every input as one group, witness 0 must hold a `WitnessArgs`
    pub fn sign_tx(&self, tx: TransactionView) -> DeployResult<TransactionView> {
        let witnesses_len = tx.witnesses().len();
        let message = util::tx_sign_message(&tx, 0, witnesses_len)
            .ok_or_else(|| DeployError::Signing("malformed witnesses".to_string()))?;
        let signature = self
            .privkey
            .sign_recoverable(&message)
            .map_err(|err| DeployError::Signing(err.to_string()))?;
        util::attach_signature(tx, Bytes::from(signature.serialize()), 0)
            .ok_or_else(|| DeployError::Signing("can't attach signature".to_string()))
    }
}
