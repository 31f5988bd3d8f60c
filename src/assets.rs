//! Asset slots: aspect-ratio-qualified buckets of uploaded images/videos.
//!
//! Each slot tracks server-persisted ("existing") assets and locally staged
//! ones separately so submission can be differential: staged bytes are
//! uploaded, untouched existing assets are skipped, and removals are either
//! deleted immediately (two-phase, idempotent on 404) or batched into a
//! removed-id list diffed against the hydration snapshot.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    Image,
    Video,
}

const fn default_content_type(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Image => "image/jpeg",
        AssetKind::Video => "video/mp4",
    }
}

/// `<category>_<ratio>`, e.g. `cover_image_16_by_9`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub category: String,
    pub ratio: String,
}

impl SlotKey {
    #[must_use]
    pub fn new(category: impl Into<String>, ratio: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ratio: ratio.into(),
        }
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.category, self.ratio)
    }
}

/// Cover-image slots hold exactly one asset per ratio; gallery slots are
/// unbounded. A per-slot property, not a universal rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MaxCount {
    One,
    #[default]
    Unbounded,
}

/// A file picked by the user but not yet persisted. The preview URL is a
/// shell-created blob handle the core must hand back for release when the
/// asset is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedUpload {
    pub name: String,
    pub content_type: String,
    pub kind: AssetKind,
    pub preview_url: Option<String>,
    #[serde(with = "serde_bytes")]
    pub bytes: Vec<u8>,
}

/// An asset already persisted server-side at hydration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingAsset {
    pub id: Option<String>,
    pub name: String,
    pub url: String,
    pub kind: AssetKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Locally unique handle; removal and delete completions key on this,
    /// never on array position.
    pub local_key: Uuid,
    pub name: String,
    pub preview_url: Option<String>,
    pub ratio: String,
    pub kind: AssetKind,
    pub content_type: String,
    /// Server id, present only for existing assets that the backend exposed
    /// one for. Existing assets without an id can only be removed locally.
    pub remote_id: Option<String>,
    pub is_existing: bool,
    #[serde(with = "serde_bytes")]
    pub bytes: Option<Vec<u8>>,
}

impl Asset {
    #[must_use]
    pub fn has_staged_bytes(&self) -> bool {
        self.bytes.as_ref().is_some_and(|b| !b.is_empty())
    }
}

/// What `remove` hands back so the caller can release the preview handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedAsset {
    pub preview_url: Option<String>,
    pub remote_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Slot {
    max: MaxCount,
    assets: Vec<Asset>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetStore {
    slots: BTreeMap<SlotKey, Slot>,
    /// Remote ids present in the freshly fetched snapshot, per slot. The
    /// diff against current state yields the batch-removal payload.
    snapshot: BTreeMap<SlotKey, BTreeSet<String>>,
}

impl AssetStore {
    pub fn register_slot(&mut self, key: SlotKey, max: MaxCount) {
        self.slots.entry(key).or_default().max = max;
    }

    /// Seed a slot from the fetched entity and record its snapshot ids.
    pub fn hydrate(&mut self, key: &SlotKey, existing: Vec<ExistingAsset>) {
        let ids = existing.iter().filter_map(|a| a.id.clone()).collect();

        let assets = existing
            .into_iter()
            .map(|a| Asset {
                local_key: Uuid::new_v4(),
                name: a.name,
                preview_url: Some(a.url),
                ratio: key.ratio.clone(),
                content_type: default_content_type(a.kind).to_string(),
                kind: a.kind,
                remote_id: a.id,
                is_existing: true,
                bytes: None,
            })
            .collect();

        let slot = self.slots.entry(key.clone()).or_default();
        slot.assets = assets;
        self.snapshot.insert(key.clone(), ids);
    }

    /// Append freshly staged uploads. Single-asset slots keep only the last
    /// upload, matching the cover-image replace behaviour.
    pub fn add(&mut self, key: &SlotKey, uploads: Vec<StagedUpload>) -> Vec<String> {
        let mut released = Vec::new();
        let ratio = key.ratio.clone();
        let slot = self.slots.entry(key.clone()).or_default();

        for upload in uploads {
            slot.assets.push(Asset {
                local_key: Uuid::new_v4(),
                name: upload.name,
                preview_url: upload.preview_url,
                ratio: ratio.clone(),
                content_type: upload.content_type,
                kind: upload.kind,
                remote_id: None,
                is_existing: false,
                bytes: Some(upload.bytes),
            });
        }

        if slot.max == MaxCount::One && slot.assets.len() > 1 {
            let keep = slot.assets.len() - 1;
            for dropped in slot.assets.drain(..keep) {
                released.extend(dropped.preview_url);
            }
        }

        released
    }

    /// Overwrite a single-asset slot. Returns preview URLs freed by the
    /// overwritten entries.
    pub fn replace(&mut self, key: &SlotKey, upload: StagedUpload) -> Vec<String> {
        let slot = self.slots.entry(key.clone()).or_default();
        slot.max = MaxCount::One;
        let released = slot
            .assets
            .drain(..)
            .filter(|a| !a.is_existing)
            .filter_map(|a| a.preview_url)
            .collect();
        slot.assets.push(Asset {
            local_key: Uuid::new_v4(),
            name: upload.name,
            preview_url: upload.preview_url,
            ratio: key.ratio.clone(),
            content_type: upload.content_type,
            kind: upload.kind,
            remote_id: None,
            is_existing: false,
            bytes: Some(upload.bytes),
        });
        released
    }

    #[must_use]
    pub fn get(&self, key: &SlotKey, local_key: Uuid) -> Option<&Asset> {
        self.slots
            .get(key)?
            .assets
            .iter()
            .find(|a| a.local_key == local_key)
    }

    /// Drop an asset from local state. The server-side half of a two-phase
    /// delete is the caller's job; this is invoked after it succeeded (or
    /// reported not-found), or directly for assets with no remote id.
    pub fn remove(&mut self, key: &SlotKey, local_key: Uuid) -> Option<RemovedAsset> {
        let slot = self.slots.get_mut(key)?;
        let idx = slot.assets.iter().position(|a| a.local_key == local_key)?;
        let asset = slot.assets.remove(idx);
        Some(RemovedAsset {
            // Hydrated preview URLs point at server copies; only locally
            // created blob handles need releasing.
            preview_url: if asset.is_existing { None } else { asset.preview_url },
            remote_id: asset.remote_id,
        })
    }

    #[must_use]
    pub fn assets(&self, key: &SlotKey) -> &[Asset] {
        self.slots.get(key).map_or(&[], |s| s.assets.as_slice())
    }

    pub fn slots(&self) -> impl Iterator<Item = (&SlotKey, &[Asset])> {
        self.slots.iter().map(|(k, s)| (k, s.assets.as_slice()))
    }

    /// Whether the slot was configured (or replaced into) single-asset mode.
    /// Single slots submit under `ns[slot]`, unbounded ones under `ns[slot][]`.
    #[must_use]
    pub fn is_single(&self, key: &SlotKey) -> bool {
        self.slots.get(key).is_some_and(|s| s.max == MaxCount::One)
    }

    #[must_use]
    pub fn staged_count(&self) -> usize {
        self.slots
            .values()
            .flat_map(|s| &s.assets)
            .filter(|a| a.has_staged_bytes())
            .count()
    }

    /// Remote ids present at hydration but absent now: the removed-id list
    /// for endpoints that batch-delete on submit. Empty right after
    /// hydration, by construction.
    #[must_use]
    pub fn diff_against_snapshot(&self, key: &SlotKey) -> BTreeSet<String> {
        let Some(snapshot_ids) = self.snapshot.get(key) else {
            return BTreeSet::new();
        };

        let present: BTreeSet<&String> = self
            .assets(key)
            .iter()
            .filter_map(|a| a.remote_id.as_ref())
            .collect();

        snapshot_ids
            .iter()
            .filter(|id| !present.contains(id))
            .cloned()
            .collect()
    }
}
