// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use std::path::Path;

use diff_core::{DecodePayload, RawDiff};
use diff_node::NodeClient;
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::error::FetchError;

/// Subscribe to `node`'s state-diff stream and decode every payload with
/// `codec`, pushing each resulting [`RawDiff`] onto `out_diffs`.
///
/// Runs until the node closes the subscription or errors on it, at which
/// point the error is pushed onto `out_errors` and this returns
/// [`FetchError::Terminated`]. A decode failure on a single payload never
/// stops the loop: it is pushed onto `out_errors` and the next payload is
/// read as normal. `codec` determines which of the three historical wire
/// variants (V1/V2/V3) this fetcher instance speaks.
pub async fn fetch_storage_diffs<N, D>(
    node: &N,
    codec: &D,
    liveness_marker_path: Option<&Path>,
    out_diffs: &mpsc::Sender<RawDiff>,
    out_errors: &mpsc::Sender<FetchError>,
) -> Result<(), FetchError>
where
    N: NodeClient,
    D: DecodePayload,
{
    let mut stream = match node.subscribe_state_diffs().await {
        Ok(stream) => stream,
        Err(e) => {
            let message = e.to_string();
            tracing::error!(error = %e, "failed to open state-diff subscription");
            let _ = out_errors.send(FetchError::Node(e)).await;
            return Err(FetchError::Terminated(message));
        }
    };

    if let Some(path) = liveness_marker_path {
        diff_watcher::write_marker(path).await?;
    }

    loop {
        match stream.next().await {
            None => return Ok(()),
            Some(Ok(bytes)) => match codec.decode(&bytes) {
                Ok(diffs) => {
                    for diff in diffs {
                        if out_diffs.send(diff).await.is_err() {
                            // extractor side has gone away; nothing left to do.
                            return Ok(());
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to decode state-diff payload, skipping");
                    let _ = out_errors.send(FetchError::Decode(e)).await;
                }
            },
            Some(Err(e)) => {
                let message = e.to_string();
                tracing::error!(error = %e, "state-diff subscription errored");
                let _ = out_errors.send(FetchError::Node(e)).await;
                return Err(FetchError::Terminated(message));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{keccak256, Bytes, B256};
    use alloy_rlp::Encodable;
    use diff_node::MockNodeClient;

    // Mirrors the private wire shapes in diff-core's codec module closely
    // enough to build well-formed V3 test payloads without exposing them
    // from that crate.
    #[derive(alloy_rlp::RlpEncodable)]
    struct EncStorageDiffWire {
        key: Bytes,
        value: Bytes,
    }
    #[derive(alloy_rlp::RlpEncodable)]
    struct EncAccountDiffWire {
        key: Bytes,
        value: Bytes,
        storage: Vec<EncStorageDiffWire>,
    }
    #[derive(alloy_rlp::RlpEncodable)]
    struct EncFlatStateDiffWire {
        block_number: u64,
        block_hash: B256,
        updated_accounts: Vec<EncAccountDiffWire>,
    }

    fn rlp_wrapped(bytes: &[u8]) -> Bytes {
        let mut out = Vec::new();
        Bytes::copy_from_slice(bytes).encode(&mut out);
        Bytes::from(out)
    }

    fn sample_v3_payload() -> Vec<u8> {
        let storage = EncStorageDiffWire {
            key: Bytes::copy_from_slice(&[0u8; 32]),
            value: rlp_wrapped(&[3]),
        };
        let account = EncAccountDiffWire {
            key: Bytes::copy_from_slice(&[0xABu8; 20]),
            value: Bytes::new(),
            storage: vec![storage],
        };
        let wire = EncFlatStateDiffWire {
            block_number: 789,
            block_hash: B256::repeat_byte(0x22),
            updated_accounts: vec![account],
        };
        let mut out = Vec::new();
        wire.encode(&mut out);
        out
    }

    #[tokio::test]
    async fn decodes_queued_payload_and_pushes_diff() {
        let node = MockNodeClient::new();
        node.push_payload(sample_v3_payload());

        let (diffs_tx, mut diffs_rx) = mpsc::channel(8);
        let (errors_tx, mut errors_rx) = mpsc::channel(8);

        fetch_storage_diffs(&node, &diff_core::V3Codec, None, &diffs_tx, &errors_tx)
            .await
            .unwrap();
        drop(diffs_tx);
        drop(errors_tx);

        let diff = diffs_rx.recv().await.unwrap();
        assert_eq!(diff.hashed_address, keccak256([0xABu8; 20]));
        assert_eq!(diff.block_height, 789);
        assert!(diffs_rx.recv().await.is_none());
        assert!(errors_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn bad_payload_is_reported_but_does_not_abort() {
        let node = MockNodeClient::new();
        node.push_payload(vec![0xff, 0xff, 0xff]); // not valid RLP
        node.push_payload(sample_v3_payload());

        let (diffs_tx, mut diffs_rx) = mpsc::channel(8);
        let (errors_tx, mut errors_rx) = mpsc::channel(8);

        fetch_storage_diffs(&node, &diff_core::V3Codec, None, &diffs_tx, &errors_tx)
            .await
            .unwrap();
        drop(diffs_tx);
        drop(errors_tx);

        let err = errors_rx.recv().await.unwrap();
        assert!(matches!(err, FetchError::Decode(_)));
        assert!(!err.is_fatal());
        assert!(diffs_rx.recv().await.is_some());
    }
}
