// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::error::Error;
use crate::header::{within_reorg_window, Header, HeaderRepository};

/// A [`HeaderRepository`] backed by a Postgres `headers` table.
pub struct PostgresHeaderRepository {
    pool: PgPool,
}

impl PostgresHeaderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn header_from_row(row: &sqlx::postgres::PgRow) -> Result<Header, Error> {
    Ok(Header {
        id: row.try_get("id")?,
        block_number: row.try_get("block_number")?,
        hash: row.try_get("hash")?,
        raw: row.try_get("raw")?,
        block_timestamp: row.try_get("block_timestamp")?,
    })
}

#[async_trait]
impl HeaderRepository for PostgresHeaderRepository {
    async fn create_or_update_header(&self, header: &Header) -> Result<i64, Error> {
        let mut tx = self.pool.begin().await.map_err(super::classify_write_error)?;

        let max_block_number: Option<i64> =
            sqlx::query_scalar("SELECT max(block_number) FROM public.headers")
                .fetch_one(&mut *tx)
                .await
                .map_err(super::classify_write_error)?;

        let existing = sqlx::query("SELECT id, hash FROM public.headers WHERE block_number = $1")
            .bind(header.block_number)
            .fetch_optional(&mut *tx)
            .await
            .map_err(super::classify_write_error)?;

        let id = match existing {
            None => {
                let row = sqlx::query(
                    "INSERT INTO public.headers (block_number, hash, raw, block_timestamp, check_count)
                     VALUES ($1, $2, $3, $4, 0)
                     RETURNING id",
                )
                .bind(header.block_number)
                .bind(&header.hash)
                .bind(&header.raw)
                .bind(header.block_timestamp)
                .fetch_one(&mut *tx)
                .await
                .map_err(super::classify_write_error)?;
                row.try_get("id").map_err(super::classify_write_error)?
            }
            Some(existing_row) => {
                let existing_id: i64 = existing_row.try_get("id").map_err(super::classify_write_error)?;
                let existing_hash: String =
                    existing_row.try_get("hash").map_err(super::classify_write_error)?;

                if existing_hash != header.hash
                    && within_reorg_window(header.block_number, max_block_number)
                {
                    sqlx::query(
                        "UPDATE public.headers
                         SET hash = $1, raw = $2, block_timestamp = $3, check_count = 0
                         WHERE id = $4",
                    )
                    .bind(&header.hash)
                    .bind(&header.raw)
                    .bind(header.block_timestamp)
                    .bind(existing_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(super::classify_write_error)?;
                    tracing::debug!(block_number = header.block_number, "replaced header within reorg window");
                }

                existing_id
            }
        };

        tx.commit().await.map_err(super::classify_write_error)?;
        Ok(id)
    }

    async fn header_at(&self, block_number: i64) -> Result<Option<Header>, Error> {
        let row = sqlx::query(
            "SELECT id, block_number, hash, raw, block_timestamp
             FROM public.headers WHERE block_number = $1",
        )
        .bind(block_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(super::classify_write_error)?;

        row.as_ref().map(header_from_row).transpose()
    }

    async fn headers_in_range(&self, start: i64, end: i64) -> Result<Vec<Header>, Error> {
        let rows = sqlx::query(
            "SELECT id, block_number, hash, raw, block_timestamp
             FROM public.headers
             WHERE block_number BETWEEN $1 AND $2
             ORDER BY block_number ASC",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(super::classify_write_error)?;

        rows.iter().map(header_from_row).collect()
    }

    async fn max_block_number(&self) -> Result<Option<i64>, Error> {
        sqlx::query_scalar("SELECT max(block_number) FROM public.headers")
            .fetch_one(&self.pool)
            .await
            .map_err(super::classify_write_error)
    }

    async fn mark_header_unchecked(&self, block_number: i64) -> Result<(), Error> {
        sqlx::query("UPDATE public.headers SET check_count = 0 WHERE block_number = $1")
            .bind(block_number)
            .execute(&self.pool)
            .await
            .map_err(super::classify_write_error)?;
        Ok(())
    }
}
