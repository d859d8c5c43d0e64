use crate::error::{DeployError, DeployResult};
use anyhow::{anyhow, Error};
use ckb_types::H256;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CKB_RPC_URL: &str = "http://localhost:8114";
pub const DEFAULT_INDEXER_URL: &str = "http://localhost:8116";
pub const DEFAULT_DEP_GROUP_FILE: &str = "dep_group.yaml";

// deploy method
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum DeployMethod {
    Data,
    TypeId,
}

impl DeployMethod {
    /// Only the exact `typeID` selects a type id, anything else deploys as data.
    pub fn parse(s: &str) -> Self {
        if s == "typeID" {
            DeployMethod::TypeId
        } else {
            DeployMethod::Data
        }
    }

    pub fn enable_type_id(self) -> bool {
        self == DeployMethod::TypeId
    }
}

// how live cells are gathered
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum CollectorKind {
    Indexer,
    Scan,
}

impl FromStr for CollectorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_lowercase().as_str() {
            "indexer" => CollectorKind::Indexer,
            "scan" => CollectorKind::Scan,
            _ => {
                return Err(anyhow!("Unexpected collector '{}'", s));
            }
        };

        Ok(kind)
    }
}

/// Settings shared by both commands
#[derive(Clone, Debug)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub indexer_url: String,
    pub collector: CollectorKind,
    pub key: String,
    /// shannons per kilobyte
    pub fee_rate: u64,
    pub dry_run: bool,
}

#[derive(Clone, Debug)]
pub struct DeployConfig {
    pub chain: ChainConfig,
    pub binary: PathBuf,
    pub method: DeployMethod,
}

#[derive(Clone, Debug)]
pub struct DepGroupConfig {
    pub chain: ChainConfig,
    pub file: PathBuf,
}

/// One out-point listed in the dep_group file
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DepGroupEntry {
    #[serde(rename = "txHash")]
    pub tx_hash: H256,
    pub index: u32,
}

pub fn load_dep_group_entries<P: AsRef<Path>>(path: P) -> DeployResult<Vec<DepGroupEntry>> {
    let path = path.as_ref();
    let content = fs::read(path)?;
    serde_yaml::from_slice(&content).map_err(|err| DeployError::Config {
        path: path.to_owned(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ckb_types::h256;
    use std::io::Write;

    #[test]
    fn test_parse_deploy_method() {
        assert_eq!(DeployMethod::parse("typeID"), DeployMethod::TypeId);
        assert_eq!(DeployMethod::parse("typeid"), DeployMethod::Data);
        assert_eq!(DeployMethod::parse("TYPEID"), DeployMethod::Data);
        assert_eq!(DeployMethod::parse(" typeID "), DeployMethod::Data);
        assert_eq!(DeployMethod::parse(""), DeployMethod::Data);
        assert_eq!(DeployMethod::parse("data"), DeployMethod::Data);
        assert_eq!(DeployMethod::parse("whatever"), DeployMethod::Data);
        assert!(DeployMethod::TypeId.enable_type_id());
        assert!(!DeployMethod::Data.enable_type_id());
    }

    #[test]
    fn test_parse_collector_kind() {
        assert_eq!(
            "indexer".parse::<CollectorKind>().unwrap(),
            CollectorKind::Indexer
        );
        assert_eq!("Scan".parse::<CollectorKind>().unwrap(), CollectorKind::Scan);
        assert!("rpc".parse::<CollectorKind>().is_err());
    }

    #[test]
    fn test_load_dep_group_entries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "- txHash: \"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\"\n  index: 0\n\
             - txHash: \"0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb\"\n  index: 1"
        )
        .unwrap();
        let entries = load_dep_group_entries(file.path()).unwrap();
        assert_eq!(
            entries,
            vec![
                DepGroupEntry {
                    tx_hash: h256!(
                        "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
                    ),
                    index: 0,
                },
                DepGroupEntry {
                    tx_hash: h256!(
                        "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
                    ),
                    index: 1,
                },
            ]
        );
    }

    #[test]
    fn test_load_malformed_dep_group_entries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "- txHash: \"0x1234\"\n  index: 0").unwrap();
        let err = load_dep_group_entries(file.path()).unwrap_err();
        assert!(matches!(err, DeployError::Config { .. }));
    }

    #[test]
    fn test_load_missing_dep_group_file() {
        let err = load_dep_group_entries("/nonexistent/dep_group.yaml").unwrap_err();
        assert!(matches!(err, DeployError::Io(_)));
    }
}
