// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

//! Abstraction over the execution node: subscribe to state-diff payloads,
//! point-read storage, and fetch headers/head.

mod client;
mod error;
mod jsonrpsee_client;
mod mock;

pub use client::{NodeClient, PayloadStream};
pub use error::Error;
pub use jsonrpsee_client::JsonRpcNodeClient;
pub use mock::MockNodeClient;
