//! Chain records as returned by the node, in their JSON-RPC wire forms

use serde::{Deserialize, Serialize};

pub use alloy_primitives::{Address, Bytes, B256, U256, U64};

/// Block numbers and receipt status travel as hex quantities; keep them as
/// plain `u64` on our side.
mod opt_quantity {
    use alloy_primitives::U64;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        value.map(U64::from).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        Ok(Option::<U64>::deserialize(deserializer)?.map(|quantity| quantity.to::<u64>()))
    }
}

/// Log entry as returned by `eth_getLogs`, receipts and `eth_subscribe`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default, with = "opt_quantity", skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
}

/// Mined transaction receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: B256,
    #[serde(default, with = "opt_quantity", skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, with = "opt_quantity", skip_serializing_if = "Option::is_none")]
    pub status: Option<u64>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TxReceipt {
    /// Pre-Byzantium receipts carry no status; treat them as successful.
    pub fn succeeded(&self) -> bool {
        self.status != Some(0)
    }
}
