//! Per-page cache of lookup values consumed by form selectors.
//!
//! Each bucket is fetched once when the page opens and held read-only.

use serde::{Deserialize, Serialize};

/// `{id, name}`-shaped record the reference endpoints return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefItem {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Categories,
    SubCategories,
    Users,
    Groups,
}

impl ReferenceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::SubCategories => "sub_categories",
            Self::Users => "users",
            Self::Groups => "groups",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FetchState {
    #[default]
    NotRequested,
    InFlight,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Bucket {
    state: FetchState,
    items: Vec<RefItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCache {
    categories: Bucket,
    sub_categories: Bucket,
    users: Bucket,
    groups: Bucket,
}

impl ReferenceCache {
    fn bucket(&self, kind: ReferenceKind) -> &Bucket {
        match kind {
            ReferenceKind::Categories => &self.categories,
            ReferenceKind::SubCategories => &self.sub_categories,
            ReferenceKind::Users => &self.users,
            ReferenceKind::Groups => &self.groups,
        }
    }

    fn bucket_mut(&mut self, kind: ReferenceKind) -> &mut Bucket {
        match kind {
            ReferenceKind::Categories => &mut self.categories,
            ReferenceKind::SubCategories => &mut self.sub_categories,
            ReferenceKind::Users => &mut self.users,
            ReferenceKind::Groups => &mut self.groups,
        }
    }

    pub fn mark_in_flight(&mut self, kind: ReferenceKind) {
        self.bucket_mut(kind).state = FetchState::InFlight;
    }

    pub fn hydrate(&mut self, kind: ReferenceKind, items: Vec<RefItem>) {
        let bucket = self.bucket_mut(kind);
        bucket.items = items;
        bucket.state = FetchState::Loaded;
    }

    pub fn mark_failed(&mut self, kind: ReferenceKind) {
        self.bucket_mut(kind).state = FetchState::Failed;
    }

    #[must_use]
    pub fn items(&self, kind: ReferenceKind) -> &[RefItem] {
        &self.bucket(kind).items
    }

    #[must_use]
    pub fn state(&self, kind: ReferenceKind) -> FetchState {
        self.bucket(kind).state
    }

    #[must_use]
    pub fn name_of(&self, kind: ReferenceKind, id: &str) -> Option<&str> {
        self.items(kind)
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hydrate_replaces_and_marks_loaded() {
        let mut cache = ReferenceCache::default();
        assert_eq!(cache.state(ReferenceKind::Users), FetchState::NotRequested);

        cache.mark_in_flight(ReferenceKind::Users);
        assert_eq!(cache.state(ReferenceKind::Users), FetchState::InFlight);

        cache.hydrate(
            ReferenceKind::Users,
            vec![RefItem { id: "7".into(), name: "Asha".into() }],
        );
        assert_eq!(cache.state(ReferenceKind::Users), FetchState::Loaded);
        assert_eq!(cache.name_of(ReferenceKind::Users, "7"), Some("Asha"));
        assert!(cache.items(ReferenceKind::Categories).is_empty());
    }

    #[test]
    fn failed_fetch_keeps_previous_items() {
        let mut cache = ReferenceCache::default();
        cache.hydrate(
            ReferenceKind::Categories,
            vec![RefItem { id: "1".into(), name: "Fire".into() }],
        );
        cache.mark_failed(ReferenceKind::Categories);
        assert_eq!(cache.state(ReferenceKind::Categories), FetchState::Failed);
        assert_eq!(cache.items(ReferenceKind::Categories).len(), 1);
    }
}
