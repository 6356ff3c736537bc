// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use alloy_primitives::B256;
use async_trait::async_trait;
use diff_core::{DiffStatus, PersistedDiff, RawDiff};
use sqlx::error::ErrorKind;
use sqlx::{PgPool, Row};

use crate::diff_repository::{DiffRepository, InsertOutcome};
use crate::error::Error;

/// A [`DiffRepository`] backed by a Postgres `storage_diff` table.
pub struct PostgresDiffRepository {
    pool: PgPool,
}

impl PostgresDiffRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn b256_column(row: &sqlx::postgres::PgRow, name: &'static str) -> Result<B256, Error> {
    let bytes: Vec<u8> = row.try_get(name).map_err(Error::Database)?;
    B256::try_from(bytes.as_slice())
        .map_err(|_| Error::Database(sqlx::Error::Decode(format!("column {name} is not 32 bytes").into())))
}

fn persisted_diff_from_row(row: &sqlx::postgres::PgRow) -> Result<PersistedDiff, Error> {
    let status_str: String = row.try_get("status").map_err(Error::Database)?;
    let status = DiffStatus::from_db_str(&status_str).ok_or_else(|| {
        Error::Database(sqlx::Error::Decode(
            format!("unrecognized status {status_str}").into(),
        ))
    })?;

    Ok(PersistedDiff {
        id: row.try_get("id").map_err(Error::Database)?,
        raw: RawDiff {
            hashed_address: b256_column(row, "hashed_address")?,
            block_hash: b256_column(row, "block_hash")?,
            block_height: row.try_get("block_height").map_err(Error::Database)?,
            storage_key: b256_column(row, "storage_key")?,
            storage_value: b256_column(row, "storage_value")?,
        },
        status,
        from_backfill: row.try_get("from_backfill").map_err(Error::Database)?,
    })
}

#[async_trait]
impl DiffRepository for PostgresDiffRepository {
    async fn create_storage_diff(&self, raw: &RawDiff) -> Result<InsertOutcome, Error> {
        let result = sqlx::query(
            "INSERT INTO public.storage_diff
                (hashed_address, block_hash, block_height, storage_key, storage_value, status, from_backfill)
             VALUES ($1, $2, $3, $4, $5, $6, FALSE)
             RETURNING id",
        )
        .bind(raw.hashed_address.as_slice())
        .bind(raw.block_hash.as_slice())
        .bind(raw.block_height)
        .bind(raw.storage_key.as_slice())
        .bind(raw.storage_value.as_slice())
        .bind(DiffStatus::New.as_db_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(InsertOutcome::Inserted(row.try_get("id").map_err(Error::Database)?)),
            Err(sqlx::Error::Database(db_err)) if db_err.kind() == ErrorKind::UniqueViolation => {
                tracing::trace!(block_height = raw.block_height, "diff already exists, skipping");
                Ok(InsertOutcome::AlreadyExists)
            }
            Err(e) => Err(super::classify_write_error(e)),
        }
    }

    async fn diffs_in_block_range(&self, start: i64, end: i64) -> Result<Vec<PersistedDiff>, Error> {
        let rows = sqlx::query(
            "SELECT id, hashed_address, block_hash, block_height, storage_key, storage_value,
                    status, from_backfill
             FROM public.storage_diff
             WHERE block_height BETWEEN $1 AND $2
             ORDER BY block_height ASC",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(persisted_diff_from_row).collect()
    }

    async fn mark_pending(&self, id: i64) -> Result<(), Error> {
        sqlx::query(
            "UPDATE public.storage_diff SET status = $1 WHERE id = $2 AND status = $3",
        )
        .bind(DiffStatus::Pending.as_db_str())
        .bind(id)
        .bind(DiffStatus::Transformed.as_db_str())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn mark_from_backfill(&self, id: i64) -> Result<(), Error> {
        sqlx::query("UPDATE public.storage_diff SET from_backfill = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
