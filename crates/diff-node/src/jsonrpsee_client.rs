// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use diff_db::Header;
use futures::StreamExt;
use jsonrpsee::core::client::{ClientT, SubscriptionClientT};
use jsonrpsee::rpc_params;
use jsonrpsee::ws_client::{WsClient, WsClientBuilder};
use serde::Deserialize;

use crate::client::{NodeClient, PayloadStream};
use crate::error::Error;

const SUBSCRIBE_METHOD: &str = "statediff_stream";
const UNSUBSCRIBE_METHOD: &str = "statediff_unsubscribe";

/// A [`NodeClient`] backed by a single persistent `jsonrpsee` WebSocket
/// connection, mirroring how `subxt_rpcs::client::RpcClient` wraps a
/// `jsonrpsee` transport behind a small request/subscribe surface.
pub struct JsonRpcNodeClient {
    client: WsClient,
}

impl JsonRpcNodeClient {
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let client = WsClientBuilder::default()
            .build(url)
            .await
            .map_err(Error::Rpc)?;
        Ok(Self { client })
    }
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(rename = "stateDiffRlp", with = "hex_bytes")]
    state_diff_rlp: Vec<u8>,
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let trimmed = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(trimmed).map_err(serde::de::Error::custom)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHeader {
    block_number: i64,
    hash: String,
    raw: serde_json::Value,
    block_timestamp: i64,
}

impl From<RawHeader> for Header {
    fn from(raw: RawHeader) -> Self {
        Header {
            id: 0,
            block_number: raw.block_number,
            hash: raw.hash,
            raw: raw.raw,
            block_timestamp: raw.block_timestamp,
        }
    }
}

#[async_trait]
impl NodeClient for JsonRpcNodeClient {
    async fn subscribe_state_diffs(&self) -> Result<PayloadStream, Error> {
        let subscription = self
            .client
            .subscribe::<RawPayload, _>(SUBSCRIBE_METHOD, rpc_params![], UNSUBSCRIBE_METHOD)
            .await
            .map_err(Error::Rpc)?;

        let stream = subscription.map(|item| match item {
            Ok(payload) => Ok(payload.state_diff_rlp),
            Err(e) => Err(Error::Rpc(e)),
        });
        Ok(Box::pin(stream))
    }

    async fn storage_at(&self, address: Address, key: B256, block_number: i64) -> Result<Vec<u8>, Error> {
        let hex_value: String = self
            .client
            .request(
                "eth_getStorageAt",
                rpc_params![address.to_string(), key.to_string(), format!("0x{block_number:x}")],
            )
            .await
            .map_err(Error::Rpc)?;
        let trimmed = hex_value.strip_prefix("0x").unwrap_or(&hex_value);
        Ok(hex::decode(trimmed)?)
    }

    async fn header_by_number(&self, block_number: i64) -> Result<Header, Error> {
        let raw: RawHeader = self
            .client
            .request("vdb_getHeaderByNumber", rpc_params![block_number])
            .await
            .map_err(Error::Rpc)?;
        Ok(raw.into())
    }

    async fn headers_by_numbers(&self, block_numbers: &[i64]) -> Result<Vec<Header>, Error> {
        let raws: Vec<RawHeader> = self
            .client
            .request("vdb_getHeadersByNumbers", rpc_params![block_numbers])
            .await
            .map_err(Error::Rpc)?;
        Ok(raws.into_iter().map(Header::from).collect())
    }

    async fn last_block(&self) -> Result<i64, Error> {
        let hex_value: String = self
            .client
            .request("eth_blockNumber", rpc_params![])
            .await
            .map_err(Error::Rpc)?;
        let trimmed = hex_value.strip_prefix("0x").unwrap_or(&hex_value);
        Ok(i64::from_str_radix(trimmed, 16)?)
    }
}
