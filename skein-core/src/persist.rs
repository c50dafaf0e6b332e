//! Story project persistence.
//!
//! Serializes a whole authored story - storylets, arcs, characters,
//! clues, and the graph projection - into a versioned JSON save file, and
//! restores it into a repository plus a rebuilt [`GraphStore`].

use crate::graph::{Connection, GraphStore, Node};
use crate::repository::{RepositoryError, StoryletRepository};
use crate::story::{Character, Clue, StoryArc, Storylet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// A saved story project with everything needed to resume authoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedStory {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created.
    pub saved_at: String,

    /// Metadata about the save.
    pub metadata: SaveMetadata,

    pub storylets: Vec<Storylet>,
    pub arcs: Vec<StoryArc>,
    pub characters: Vec<Character>,
    pub clues: Vec<Clue>,

    /// The graph projection.
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}

/// Metadata about the save file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMetadata {
    /// Story title.
    pub title: String,

    pub storylet_count: usize,
    pub node_count: usize,

    /// When the save was created (duplicated from parent for peek access).
    #[serde(default)]
    pub saved_at: String,
}

impl SavedStory {
    /// Create a saved story from its parts.
    pub fn new(
        title: impl Into<String>,
        storylets: Vec<Storylet>,
        arcs: Vec<StoryArc>,
        characters: Vec<Character>,
        clues: Vec<Clue>,
        graph: &GraphStore,
    ) -> Self {
        let saved_at = timestamp_now();
        let metadata = SaveMetadata {
            title: title.into(),
            storylet_count: storylets.len(),
            node_count: graph.nodes().len(),
            saved_at: saved_at.clone(),
        };
        Self {
            version: SAVE_VERSION,
            saved_at,
            metadata,
            storylets,
            arcs,
            characters,
            clues,
            nodes: graph.nodes().to_vec(),
            connections: graph.connections().to_vec(),
        }
    }

    /// Snapshot a repository and graph into a saved story.
    pub async fn capture(
        title: impl Into<String>,
        repository: &dyn StoryletRepository,
        graph: &GraphStore,
    ) -> Result<Self, PersistError> {
        Ok(Self::new(
            title,
            repository.storylets().await?,
            repository.arcs().await?,
            repository.characters().await?,
            repository.clues().await?,
            graph,
        ))
    }

    /// Load this save into a repository and rebuild the graph projection.
    pub async fn restore(
        &self,
        repository: &dyn StoryletRepository,
    ) -> Result<GraphStore, PersistError> {
        for storylet in &self.storylets {
            repository.create_storylet(storylet.clone()).await?;
        }
        for arc in &self.arcs {
            repository.create_arc(arc.clone()).await?;
        }
        for character in &self.characters {
            repository.create_character(character.clone()).await?;
        }
        for clue in &self.clues {
            repository.create_clue(clue.clone()).await?;
        }

        let mut graph = GraphStore::new();
        for node in &self.nodes {
            graph.add_node(node.clone());
        }
        for connection in &self.connections {
            graph.add_connection(connection.clone());
        }
        Ok(graph)
    }
}

/// Save a story project to a file as pretty-printed JSON.
pub async fn save_story(path: impl AsRef<Path>, saved: &SavedStory) -> Result<(), PersistError> {
    let content = serde_json::to_string_pretty(saved)?;
    fs::write(path, content).await?;
    Ok(())
}

/// Load a story project from a file, checking the save version.
pub async fn load_story(path: impl AsRef<Path>) -> Result<SavedStory, PersistError> {
    let content = fs::read_to_string(path).await?;
    let saved: SavedStory = serde_json::from_str(&content)?;

    if saved.version != SAVE_VERSION {
        return Err(PersistError::VersionMismatch {
            expected: SAVE_VERSION,
            found: saved.version,
        });
    }
    Ok(saved)
}

/// Build a timestamped save path for a story title.
pub fn quick_save_path(base_dir: impl AsRef<Path>, title: &str) -> std::path::PathBuf {
    let sanitized = title
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    base_dir
        .as_ref()
        .join(format!("{sanitized}_{}.json", timestamp_now()))
}

/// Current timestamp as seconds since the epoch.
fn timestamp_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", now.as_secs())
}
