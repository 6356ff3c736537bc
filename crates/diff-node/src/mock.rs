// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use diff_db::Header;
use futures::stream;

use crate::client::{NodeClient, PayloadStream};
use crate::error::Error;

/// An in-memory [`NodeClient`] double for unit tests, the Rust analogue of
/// `pkg/fakes/MockBlockChain`: every call records what it was passed and
/// returns a preconfigured answer rather than talking to anything real.
#[derive(Default)]
pub struct MockNodeClient {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    payloads: Vec<Vec<u8>>,
    storage_values: HashMap<(Address, B256, i64), Vec<u8>>,
    headers_by_number: HashMap<i64, Header>,
    last_block: Option<i64>,
    storage_at_calls: Vec<(Address, B256, i64)>,
}

impl MockNodeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue payloads to be replayed, in order, by `subscribe_state_diffs`.
    pub fn push_payload(&self, payload: Vec<u8>) {
        self.inner.lock().unwrap().payloads.push(payload);
    }

    pub fn set_storage_value(&self, address: Address, key: B256, block_number: i64, value: Vec<u8>) {
        self.inner
            .lock()
            .unwrap()
            .storage_values
            .insert((address, key, block_number), value);
    }

    pub fn set_header(&self, header: Header) {
        self.inner
            .lock()
            .unwrap()
            .headers_by_number
            .insert(header.block_number, header);
    }

    pub fn set_last_block(&self, block_number: i64) {
        self.inner.lock().unwrap().last_block = Some(block_number);
    }

    /// The `(address, key, block_number)` tuples every `storage_at` call
    /// was made with, in call order.
    pub fn storage_at_calls(&self) -> Vec<(Address, B256, i64)> {
        self.inner.lock().unwrap().storage_at_calls.clone()
    }
}

#[async_trait]
impl NodeClient for MockNodeClient {
    async fn subscribe_state_diffs(&self) -> Result<PayloadStream, Error> {
        let payloads = self.inner.lock().unwrap().payloads.clone();
        Ok(Box::pin(stream::iter(payloads.into_iter().map(Ok))))
    }

    async fn storage_at(&self, address: Address, key: B256, block_number: i64) -> Result<Vec<u8>, Error> {
        let mut inner = self.inner.lock().unwrap();
        inner.storage_at_calls.push((address, key, block_number));
        inner
            .storage_values
            .get(&(address, key, block_number))
            .cloned()
            .ok_or(Error::NotFound(block_number))
    }

    async fn header_by_number(&self, block_number: i64) -> Result<Header, Error> {
        self.inner
            .lock()
            .unwrap()
            .headers_by_number
            .get(&block_number)
            .cloned()
            .ok_or(Error::NotFound(block_number))
    }

    async fn headers_by_numbers(&self, block_numbers: &[i64]) -> Result<Vec<Header>, Error> {
        let inner = self.inner.lock().unwrap();
        block_numbers
            .iter()
            .map(|n| inner.headers_by_number.get(n).cloned().ok_or(Error::NotFound(*n)))
            .collect()
    }

    async fn last_block(&self) -> Result<i64, Error> {
        self.inner.lock().unwrap().last_block.ok_or(Error::NotFound(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_queued_payloads_in_order() {
        use futures::StreamExt;

        let client = MockNodeClient::new();
        client.push_payload(vec![1, 2, 3]);
        client.push_payload(vec![4, 5, 6]);

        let mut stream = client.subscribe_state_diffs().await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), vec![1, 2, 3]);
        assert_eq!(stream.next().await.unwrap().unwrap(), vec![4, 5, 6]);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn storage_at_returns_not_found_when_unset() {
        let client = MockNodeClient::new();
        let err = client
            .storage_at(Address::repeat_byte(1), B256::repeat_byte(2), 100)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(100)));
        assert_eq!(client.storage_at_calls().len(), 1);
    }

    #[tokio::test]
    async fn headers_by_numbers_fails_fast_on_first_missing() {
        let client = MockNodeClient::new();
        client.set_header(Header {
            id: 0,
            block_number: 1,
            hash: "0x01".into(),
            raw: serde_json::json!({}),
            block_timestamp: 0,
        });

        let err = client.headers_by_numbers(&[1, 2]).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(2)));
    }
}
