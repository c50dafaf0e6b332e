//! Storage seam for authored story data.
//!
//! The engine and the graph store reach persistent storylet/arc/character/
//! clue data only through [`StoryletRepository`]; nothing in the core
//! assumes a particular storage technology. [`InMemoryRepository`] is the
//! default collaborator for tests, examples, and unsaved editing sessions.

use crate::story::{ArcId, Character, CharacterId, Clue, ClueId, StoryArc, Storylet, StoryletId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{kind} with ID \"{id}\" not found")]
    NotFound { kind: &'static str, id: String },

    #[error("storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn not_found(kind: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// CRUD access to authored story data, keyed by opaque ids.
#[async_trait]
pub trait StoryletRepository: Send + Sync {
    async fn storylet(&self, id: StoryletId) -> Result<Option<Storylet>, RepositoryError>;
    async fn create_storylet(&self, storylet: Storylet) -> Result<StoryletId, RepositoryError>;
    /// Full replacement of an existing storylet.
    async fn update_storylet(&self, storylet: Storylet) -> Result<(), RepositoryError>;
    async fn delete_storylet(&self, id: StoryletId) -> Result<(), RepositoryError>;
    async fn storylets(&self) -> Result<Vec<Storylet>, RepositoryError>;

    async fn arc(&self, id: ArcId) -> Result<Option<StoryArc>, RepositoryError>;
    async fn create_arc(&self, arc: StoryArc) -> Result<ArcId, RepositoryError>;
    async fn update_arc(&self, arc: StoryArc) -> Result<(), RepositoryError>;
    async fn delete_arc(&self, id: ArcId) -> Result<(), RepositoryError>;
    async fn arcs(&self) -> Result<Vec<StoryArc>, RepositoryError>;

    async fn character(&self, id: CharacterId) -> Result<Option<Character>, RepositoryError>;
    async fn create_character(&self, character: Character) -> Result<CharacterId, RepositoryError>;
    async fn update_character(&self, character: Character) -> Result<(), RepositoryError>;
    async fn delete_character(&self, id: CharacterId) -> Result<(), RepositoryError>;
    async fn characters(&self) -> Result<Vec<Character>, RepositoryError>;

    async fn clue(&self, id: ClueId) -> Result<Option<Clue>, RepositoryError>;
    async fn create_clue(&self, clue: Clue) -> Result<ClueId, RepositoryError>;
    async fn update_clue(&self, clue: Clue) -> Result<(), RepositoryError>;
    async fn delete_clue(&self, id: ClueId) -> Result<(), RepositoryError>;
    async fn clues(&self) -> Result<Vec<Clue>, RepositoryError>;
}

/// One id-keyed collection behind a read/write lock.
struct Collection<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Collection<K, V>
where
    K: Eq + Hash + Copy + fmt::Display,
    V: Clone,
{
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn from_entries(entries: HashMap<K, V>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    async fn get(&self, id: K) -> Option<V> {
        self.entries.read().await.get(&id).cloned()
    }

    async fn insert(&self, id: K, value: V) {
        self.entries.write().await.insert(id, value);
    }

    async fn replace(&self, kind: &'static str, id: K, value: V) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        if !entries.contains_key(&id) {
            return Err(RepositoryError::not_found(kind, id));
        }
        entries.insert(id, value);
        Ok(())
    }

    async fn remove(&self, kind: &'static str, id: K) -> Result<(), RepositoryError> {
        self.entries
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found(kind, id))
    }

    async fn all(&self) -> Vec<V> {
        self.entries.read().await.values().cloned().collect()
    }
}

/// In-memory repository backed by locked hash maps.
pub struct InMemoryRepository {
    storylets: Collection<StoryletId, Storylet>,
    arcs: Collection<ArcId, StoryArc>,
    characters: Collection<CharacterId, Character>,
    clues: Collection<ClueId, Clue>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            storylets: Collection::new(),
            arcs: Collection::new(),
            characters: Collection::new(),
            clues: Collection::new(),
        }
    }

    /// Build a repository pre-seeded with storylets.
    pub fn with_storylets(storylets: Vec<Storylet>) -> Self {
        let entries = storylets.into_iter().map(|s| (s.id, s)).collect();
        Self {
            storylets: Collection::from_entries(entries),
            arcs: Collection::new(),
            characters: Collection::new(),
            clues: Collection::new(),
        }
    }
}

#[async_trait]
impl StoryletRepository for InMemoryRepository {
    async fn storylet(&self, id: StoryletId) -> Result<Option<Storylet>, RepositoryError> {
        Ok(self.storylets.get(id).await)
    }

    async fn create_storylet(&self, storylet: Storylet) -> Result<StoryletId, RepositoryError> {
        let id = storylet.id;
        self.storylets.insert(id, storylet).await;
        Ok(id)
    }

    async fn update_storylet(&self, storylet: Storylet) -> Result<(), RepositoryError> {
        self.storylets
            .replace("Storylet", storylet.id, storylet)
            .await
    }

    async fn delete_storylet(&self, id: StoryletId) -> Result<(), RepositoryError> {
        self.storylets.remove("Storylet", id).await
    }

    async fn storylets(&self) -> Result<Vec<Storylet>, RepositoryError> {
        Ok(self.storylets.all().await)
    }

    async fn arc(&self, id: ArcId) -> Result<Option<StoryArc>, RepositoryError> {
        Ok(self.arcs.get(id).await)
    }

    async fn create_arc(&self, arc: StoryArc) -> Result<ArcId, RepositoryError> {
        let id = arc.id;
        self.arcs.insert(id, arc).await;
        Ok(id)
    }

    async fn update_arc(&self, arc: StoryArc) -> Result<(), RepositoryError> {
        self.arcs.replace("Arc", arc.id, arc).await
    }

    async fn delete_arc(&self, id: ArcId) -> Result<(), RepositoryError> {
        self.arcs.remove("Arc", id).await
    }

    async fn arcs(&self) -> Result<Vec<StoryArc>, RepositoryError> {
        Ok(self.arcs.all().await)
    }

    async fn character(&self, id: CharacterId) -> Result<Option<Character>, RepositoryError> {
        Ok(self.characters.get(id).await)
    }

    async fn create_character(&self, character: Character) -> Result<CharacterId, RepositoryError> {
        let id = character.id;
        self.characters.insert(id, character).await;
        Ok(id)
    }

    async fn update_character(&self, character: Character) -> Result<(), RepositoryError> {
        self.characters
            .replace("Character", character.id, character)
            .await
    }

    async fn delete_character(&self, id: CharacterId) -> Result<(), RepositoryError> {
        self.characters.remove("Character", id).await
    }

    async fn characters(&self) -> Result<Vec<Character>, RepositoryError> {
        Ok(self.characters.all().await)
    }

    async fn clue(&self, id: ClueId) -> Result<Option<Clue>, RepositoryError> {
        Ok(self.clues.get(id).await)
    }

    async fn create_clue(&self, clue: Clue) -> Result<ClueId, RepositoryError> {
        let id = clue.id;
        self.clues.insert(id, clue).await;
        Ok(id)
    }

    async fn update_clue(&self, clue: Clue) -> Result<(), RepositoryError> {
        self.clues.replace("Clue", clue.id, clue).await
    }

    async fn delete_clue(&self, id: ClueId) -> Result<(), RepositoryError> {
        self.clues.remove("Clue", id).await
    }

    async fn clues(&self) -> Result<Vec<Clue>, RepositoryError> {
        Ok(self.clues.all().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_storylet_crud_round_trip() {
        let repo = InMemoryRepository::new();
        let storylet = Storylet::new("The Dockside Tavern");
        let id = repo.create_storylet(storylet.clone()).await.unwrap();

        let fetched = repo.storylet(id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "The Dockside Tavern");

        let mut updated = fetched;
        updated.title = "The Dockside Tavern, After Dark".into();
        repo.update_storylet(updated).await.unwrap();

        let fetched = repo.storylet(id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "The Dockside Tavern, After Dark");

        repo.delete_storylet(id).await.unwrap();
        assert!(repo.storylet(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_storylet_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo
            .update_storylet(Storylet::new("never created"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_storylet_reads_as_none() {
        let repo = InMemoryRepository::new();
        assert!(repo.storylet(StoryletId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seeded_repository() {
        let a = Storylet::new("a");
        let b = Storylet::new("b");
        let id_a = a.id;

        let repo = InMemoryRepository::with_storylets(vec![a, b]);
        assert_eq!(repo.storylets().await.unwrap().len(), 2);
        assert!(repo.storylet(id_a).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clue_and_character_collections() {
        let repo = InMemoryRepository::new();
        let clue_id = repo.create_clue(Clue::new("torn ledger page")).await.unwrap();
        let char_id = repo
            .create_character(Character::new("Harbormaster Venn"))
            .await
            .unwrap();

        assert!(repo.clue(clue_id).await.unwrap().is_some());
        assert!(repo.character(char_id).await.unwrap().is_some());
        repo.delete_clue(clue_id).await.unwrap();
        assert!(repo.clue(clue_id).await.unwrap().is_none());
    }
}
