// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

/// The lifecycle state of a persisted storage diff.
///
/// Transitions are driven entirely by the diff validator and the downstream
/// decoder (not modeled in this crate); only `Transformed -> Pending` is ever
/// legal, gated by [`crate::PersistedDiff::is_demotable`]. There is
/// deliberately no constructor that produces `Pending` directly from `New`:
/// a diff the decoder hasn't acted on yet has nothing to undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    /// Freshly inserted; not yet consumed by a downstream decoder.
    New,
    /// Consumed by a downstream decoder into a typed domain event.
    Transformed,
    /// Was `Transformed`, but the validator found its `block_hash` no longer
    /// names the canonical block at `block_height`. Awaiting re-transform.
    Pending,
    /// Reserved for diffs the validator has given up reconciling (e.g. the
    /// canonical chain no longer has a path through the diff's block at
    /// all). No code path currently produces this variant; see DESIGN.md.
    Noncanonical,
    /// Originated from the backfill loader rather than a stream. This is
    /// mutually orthogonal to the rest of the enum in the original design
    /// (`from_backfill` is a separate column) but is kept here as a status
    /// value too so a diff can be queried by "how did this get here"
    /// without joining on the boolean flag.
    FromBackfill,
}

impl DiffStatus {
    /// `true` for the one status from which demotion to `Pending` is legal.
    pub fn can_demote_to_pending(self) -> bool {
        matches!(self, DiffStatus::Transformed)
    }

    /// The string stored in the `status` column.
    pub fn as_db_str(self) -> &'static str {
        match self {
            DiffStatus::New => "new",
            DiffStatus::Transformed => "transformed",
            DiffStatus::Pending => "pending",
            DiffStatus::Noncanonical => "noncanonical",
            DiffStatus::FromBackfill => "from_backfill",
        }
    }

    /// Parse a `status` column value back into a [`DiffStatus`].
    pub fn from_db_str(s: &str) -> Option<Self> {
        Some(match s {
            "new" => DiffStatus::New,
            "transformed" => DiffStatus::Transformed,
            "pending" => DiffStatus::Pending,
            "noncanonical" => DiffStatus::Noncanonical,
            "from_backfill" => DiffStatus::FromBackfill,
            _ => return None,
        })
    }
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}
