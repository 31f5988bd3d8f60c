use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a repeated sub-entity. New entries get a client-generated
/// token; fetched entries carry their server id. Update and remove key on
/// this, so reordering cannot corrupt the wrong entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryId {
    Client(Uuid),
    Server(String),
}

impl EntryId {
    #[must_use]
    pub fn fresh() -> Self {
        Self::Client(Uuid::new_v4())
    }

    #[must_use]
    pub fn server_id(&self) -> Option<&str> {
        match self {
            Self::Server(id) => Some(id),
            Self::Client(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracked<T> {
    pub id: EntryId,
    /// Server-backed entries removed by the user stay in the collection
    /// flagged for deletion, so the submit payload can tell the backend
    /// "explicitly removed" apart from "never existed".
    pub destroy: bool,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoveOutcome {
    /// Client-only entry, dropped outright.
    Dropped,
    /// Server-backed entry, kept and flagged `_destroy`.
    FlaggedDestroy,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedList<T> {
    entries: Vec<Tracked<T>>,
}

impl<T> Default for TrackedList<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> TrackedList<T> {
    /// Add a new, locally created entry.
    pub fn push_new(&mut self, value: T) -> EntryId {
        let id = EntryId::fresh();
        self.entries.push(Tracked {
            id: id.clone(),
            destroy: false,
            value,
        });
        id
    }

    /// Seed a server-backed entry during hydration.
    pub fn hydrate(&mut self, server_id: impl Into<String>, value: T) {
        self.entries.push(Tracked {
            id: EntryId::Server(server_id.into()),
            destroy: false,
            value,
        });
    }

    pub fn update(&mut self, id: &EntryId, f: impl FnOnce(&mut T)) -> bool {
        match self.entries.iter_mut().find(|e| &e.id == id && !e.destroy) {
            Some(entry) => {
                f(&mut entry.value);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &EntryId) -> RemoveOutcome {
        let Some(idx) = self.entries.iter().position(|e| &e.id == id && !e.destroy) else {
            return RemoveOutcome::NotFound;
        };

        match &self.entries[idx].id {
            EntryId::Server(_) => {
                self.entries[idx].destroy = true;
                RemoveOutcome::FlaggedDestroy
            }
            EntryId::Client(_) => {
                self.entries.remove(idx);
                RemoveOutcome::Dropped
            }
        }
    }

    /// All entries including destroy-flagged ones, for submission.
    #[must_use]
    pub fn entries(&self) -> &[Tracked<T>] {
        &self.entries
    }

    /// Entries still visible to the user.
    pub fn active(&self) -> impl Iterator<Item = &Tracked<T>> {
        self.entries.iter().filter(|e| !e.destroy)
    }

    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_client_entry_drops_it() {
        let mut list = TrackedList::default();
        let id = list.push_new("a");
        assert_eq!(list.remove(&id), RemoveOutcome::Dropped);
        assert!(list.is_empty());
    }

    #[test]
    fn removing_server_entry_flags_destroy() {
        let mut list = TrackedList::default();
        list.hydrate("7", "fetched");

        let id = EntryId::Server("7".into());
        assert_eq!(list.remove(&id), RemoveOutcome::FlaggedDestroy);

        // Still serialized, invisible to the user.
        assert_eq!(list.entries().len(), 1);
        assert!(list.entries()[0].destroy);
        assert_eq!(list.active_len(), 0);

        // A second removal finds nothing.
        assert_eq!(list.remove(&id), RemoveOutcome::NotFound);
    }

    #[test]
    fn update_keys_on_id_not_position() {
        let mut list = TrackedList::default();
        let first = list.push_new(1);
        list.push_new(2);
        list.remove(&first);

        let second = list.entries()[0].id.clone();
        assert!(list.update(&second, |v| *v = 20));
        assert_eq!(list.entries()[0].value, 20);
    }

    #[test]
    fn destroyed_entries_are_not_updatable() {
        let mut list = TrackedList::default();
        list.hydrate("9", 5);
        let id = EntryId::Server("9".into());
        list.remove(&id);
        assert!(!list.update(&id, |v| *v = 6));
    }
}
