//! Graph projection of an authored story.
//!
//! A [`GraphStore`] holds the node/connection graph an author edits, and
//! the two synchronization passes that keep it honest against storylet
//! choice data: deriving connections from choices, and committing
//! connections back as rebuilt choice lists.
//!
//! Node and connection mutations on unknown ids are silent no-ops; a
//! stale reference from a view layer must never throw.

use crate::repository::StoryletRepository;
use crate::story::{Choice, ConnectionId, NodeId, Storylet, StoryletId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Handle id on the origin side of every connection.
pub const OUTPUT_HANDLE: &str = "output";

/// Handle id on the destination side of every connection.
pub const INPUT_HANDLE: &str = "input";

/// Label given to connections drawn by hand.
const DEFAULT_CONNECTION_LABEL: &str = "Continue";

// Labels derived from choice text are kept short enough to render on an
// edge.
const LABEL_MAX_CHARS: usize = 20;
const LABEL_KEPT_CHARS: usize = 17;

// Grid layout: fixed pitch, fixed origin, five columns.
const LAYOUT_COLUMNS: usize = 5;
const LAYOUT_ORIGIN_X: f64 = 200.0;
const LAYOUT_ORIGIN_Y: f64 = 100.0;
const LAYOUT_COLUMN_PITCH: f64 = 250.0;
const LAYOUT_ROW_PITCH: f64 = 200.0;

/// 2D canvas position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Role a node plays in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Entry point; never has incoming connections.
    Start,
    Storylet,
    /// Terminal; never has outgoing connections.
    End,
    Choice,
    Condition,
}

/// A visual node: an entry point, a storylet, or an exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Position,

    /// The storylet this node projects, for `Storylet` nodes.
    pub storylet: Option<StoryletId>,

    pub title: String,
    pub description: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind, title: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            position: Position::default(),
            storylet: None,
            title: title.into(),
            description: None,
        }
    }

    /// A storylet node projecting the given storylet.
    pub fn storylet(storylet: &Storylet) -> Self {
        Self {
            id: NodeId::new(),
            kind: NodeKind::Storylet,
            position: Position::default(),
            storylet: Some(storylet.id),
            title: storylet.title.clone(),
            description: Some(storylet.description.clone()),
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update for a node.
#[derive(Debug, Clone, Default)]
pub struct NodePatch {
    pub kind: Option<NodeKind>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub storylet: Option<StoryletId>,
    pub position: Option<Position>,
}

impl NodePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub from: NodeId,
    pub to: NodeId,

    /// Presented as choice text when committed back to story data.
    pub label: Option<String>,

    pub from_handle: String,
    pub to_handle: String,
}

impl Connection {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self {
            id: ConnectionId::new(),
            from,
            to,
            label: None,
            from_handle: OUTPUT_HANDLE.to_string(),
            to_handle: INPUT_HANDLE.to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Provisional state while the author drags out a new connection.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConnection {
    pub from: NodeId,
    pub handle: String,
}

/// Notice emitted once per hand-drawn connection, for the listener that
/// translates it into persisted choice data.
#[derive(Debug, Clone)]
pub struct ConnectionNotice {
    pub connection: Connection,
    pub from: Node,
    pub to: Node,
}

/// Nodes incident to one node, split by direction.
#[derive(Debug, Clone, Default)]
pub struct ConnectedNodes {
    /// Nodes with a connection landing on the queried node.
    pub inputs: Vec<Node>,

    /// Nodes the queried node connects out to.
    pub outputs: Vec<Node>,
}

/// Outcome of committing connections back to storylet choice data.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Storylets whose choice lists were rebuilt and written.
    pub updated: usize,

    /// Per-storylet failures; remaining storylets were still processed.
    pub errors: Vec<String>,
}

/// The authoritative in-memory graph.
#[derive(Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    selected_node: Option<NodeId>,
    selected_connection: Option<ConnectionId>,
    pending: Option<PendingConnection>,
    notices: Option<mpsc::UnboundedSender<ConnectionNotice>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.selected_node
    }

    pub fn selected_connection(&self) -> Option<ConnectionId> {
        self.selected_connection
    }

    /// The in-flight connection gesture, if any.
    pub fn pending(&self) -> Option<&PendingConnection> {
        self.pending.as_ref()
    }

    /// Resolve the nodes connected into and out of `id`.
    pub fn connected_nodes(&self, id: NodeId) -> ConnectedNodes {
        let mut connected = ConnectedNodes::default();
        for connection in &self.connections {
            if connection.to == id {
                if let Some(node) = self.node(connection.from) {
                    connected.inputs.push(node.clone());
                }
            }
            if connection.from == id {
                if let Some(node) = self.node(connection.to) {
                    connected.outputs.push(node.clone());
                }
            }
        }
        connected
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn select_node(&mut self, id: Option<NodeId>) {
        self.selected_node = id;
    }

    pub fn select_connection(&mut self, id: Option<ConnectionId>) {
        self.selected_connection = id;
    }

    // =========================================================================
    // Node mutations
    // =========================================================================

    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// Apply a partial update. Unknown ids are no-ops.
    pub fn update_node(&mut self, id: NodeId, patch: NodePatch) {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return;
        };
        if let Some(kind) = patch.kind {
            node.kind = kind;
        }
        if let Some(title) = patch.title {
            node.title = title;
        }
        if let Some(description) = patch.description {
            node.description = Some(description);
        }
        if let Some(storylet) = patch.storylet {
            node.storylet = Some(storylet);
        }
        if let Some(position) = patch.position {
            node.position = position;
        }
    }

    /// Move a node. Unknown ids are no-ops.
    pub fn move_node(&mut self, id: NodeId, position: Position) {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
            node.position = position;
        }
    }

    /// Remove a node, cascading to its incident connections. Clears the
    /// selection when the removed node (or a cascaded connection) was
    /// selected. Unknown ids are no-ops.
    pub fn remove_node(&mut self, id: NodeId) {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return;
        }

        self.connections.retain(|c| c.from != id && c.to != id);

        if self.selected_node == Some(id) {
            self.selected_node = None;
        }
        if let Some(selected) = self.selected_connection {
            if self.connection(selected).is_none() {
                self.selected_connection = None;
            }
        }
    }

    // =========================================================================
    // Connection mutations
    // =========================================================================

    /// Decide whether a connection from `from` to `to` would be legal.
    ///
    /// This predicate is the single source of truth for both interactive
    /// creation and derivation from stored choices: no self-loops, no
    /// duplicate (from, to) pairs, nothing out of an `End` node, nothing
    /// into a `Start` node.
    pub fn validate_connection(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return false;
        }
        if self
            .connections
            .iter()
            .any(|c| c.from == from && c.to == to)
        {
            return false;
        }
        if let Some(node) = self.node(from) {
            if node.kind == NodeKind::End {
                return false;
            }
        }
        if let Some(node) = self.node(to) {
            if node.kind == NodeKind::Start {
                return false;
            }
        }
        true
    }

    /// Insert a connection if it is legal. Returns the new id, or `None`
    /// when validation rejected it.
    pub fn add_connection(&mut self, connection: Connection) -> Option<ConnectionId> {
        if !self.validate_connection(connection.from, connection.to) {
            return None;
        }
        let id = connection.id;
        self.connections.push(connection);
        Some(id)
    }

    /// Remove a connection, clearing the selection if it was selected.
    /// Unknown ids are no-ops.
    pub fn remove_connection(&mut self, id: ConnectionId) {
        self.connections.retain(|c| c.id != id);
        if self.selected_connection == Some(id) {
            self.selected_connection = None;
        }
    }

    // =========================================================================
    // Connection gesture
    // =========================================================================

    /// Begin a connection gesture from a node handle.
    pub fn start_connecting(&mut self, from: NodeId, handle: impl Into<String>) {
        self.pending = Some(PendingConnection {
            from,
            handle: handle.into(),
        });
    }

    /// Complete the gesture onto a destination handle.
    ///
    /// The provisional state is cleared whether or not validation passes;
    /// an invalid finish must not leave the store stuck mid-gesture. On
    /// success the connection is created with a default label and a
    /// [`ConnectionNotice`] is pushed to the subscribed listener.
    pub fn finish_connecting(
        &mut self,
        to: NodeId,
        handle: impl Into<String>,
    ) -> Option<ConnectionId> {
        let pending = self.pending.take()?;
        if !self.validate_connection(pending.from, to) {
            return None;
        }

        let connection = Connection {
            id: ConnectionId::new(),
            from: pending.from,
            to,
            label: Some(DEFAULT_CONNECTION_LABEL.to_string()),
            from_handle: pending.handle,
            to_handle: handle.into(),
        };
        let id = connection.id;
        self.connections.push(connection.clone());
        self.notify(connection);
        Some(id)
    }

    /// Abandon the gesture.
    pub fn cancel_connecting(&mut self) {
        self.pending = None;
    }

    /// Register the single listener for connection-created notices.
    /// Replaces any previous subscription.
    pub fn subscribe_connections(&mut self) -> mpsc::UnboundedReceiver<ConnectionNotice> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.notices = Some(tx);
        rx
    }

    fn notify(&self, connection: Connection) {
        let Some(sender) = &self.notices else {
            return;
        };
        let (Some(from), Some(to)) = (self.node(connection.from), self.node(connection.to)) else {
            return;
        };
        // The listener may have gone away; dropped notices are fine.
        let _ = sender.send(ConnectionNotice {
            connection,
            from: from.clone(),
            to: to.clone(),
        });
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Deterministic grid placement: node `i` lands in column `i % 5`,
    /// row `i / 5`. A pure function of node order, not prior positions.
    pub fn auto_layout(&mut self) {
        for (index, node) in self.nodes.iter_mut().enumerate() {
            node.position = Position {
                x: LAYOUT_ORIGIN_X + (index % LAYOUT_COLUMNS) as f64 * LAYOUT_COLUMN_PITCH,
                y: LAYOUT_ORIGIN_Y + (index / LAYOUT_COLUMNS) as f64 * LAYOUT_ROW_PITCH,
            };
        }
    }

    // =========================================================================
    // Choice synchronization
    // =========================================================================

    /// Derive connections from storylet choice data.
    ///
    /// For every choice whose `next_storylet` resolves to a node in this
    /// graph, a connection is created from the owning storylet's node to
    /// the target's node, unless validation (including the duplicate
    /// check) rejects it. Running this twice adds nothing the second
    /// time. Returns the number of connections created.
    pub fn create_connections_from_storylet_choices(&mut self, storylets: &[Storylet]) -> usize {
        let node_for_storylet: HashMap<StoryletId, NodeId> = self
            .nodes
            .iter()
            .filter_map(|node| node.storylet.map(|storylet| (storylet, node.id)))
            .collect();

        let mut created = 0;
        for storylet in storylets {
            let Some(&from) = node_for_storylet.get(&storylet.id) else {
                continue;
            };
            for choice in &storylet.choices {
                let Some(next) = choice.next_storylet else {
                    continue;
                };
                let Some(&to) = node_for_storylet.get(&next) else {
                    continue;
                };
                if !self.validate_connection(from, to) {
                    continue;
                }
                // Derived connections carry choice text as their label but
                // do not notify: they came from choice data in the first
                // place.
                self.connections
                    .push(Connection::new(from, to).with_label(connection_label(&choice.text)));
                created += 1;
            }
        }
        created
    }

    /// Commit connections back to storylet choice data.
    ///
    /// Connections are grouped by the storylet of their origin node, and
    /// each origin storylet's choice list is rebuilt in full from its
    /// outgoing connections - a resynchronization that makes the graph
    /// authoritative, not a merge. One repository update per origin
    /// storylet; a failure is recorded and the remaining storylets are
    /// still processed.
    pub async fn save_connections_to_storylet_choices(
        &self,
        repository: &dyn StoryletRepository,
    ) -> SyncReport {
        let mut by_origin: HashMap<StoryletId, Vec<&Connection>> = HashMap::new();
        for connection in &self.connections {
            let Some(origin) = self.node(connection.from).and_then(|n| n.storylet) else {
                continue;
            };
            by_origin.entry(origin).or_default().push(connection);
        }

        let mut report = SyncReport::default();
        for (origin, connections) in by_origin {
            let storylet = match repository.storylet(origin).await {
                Ok(Some(storylet)) => storylet,
                Ok(None) => {
                    report
                        .errors
                        .push(format!("Storylet with ID \"{origin}\" not found"));
                    continue;
                }
                Err(err) => {
                    report.errors.push(format!("{origin}: {err}"));
                    continue;
                }
            };

            let mut choices = Vec::new();
            for connection in connections {
                let Some(target) = self.node(connection.to).and_then(|n| n.storylet) else {
                    continue;
                };
                let text = connection
                    .label
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CONNECTION_LABEL.to_string());
                choices.push(Choice::new(text).with_next(target));
            }

            let mut updated = storylet;
            updated.choices = choices;
            match repository.update_storylet(updated).await {
                Ok(()) => report.updated += 1,
                Err(err) => {
                    tracing::warn!(storylet = %origin, %err, "choice sync write failed");
                    report.errors.push(format!("{origin}: {err}"));
                }
            }
        }
        report
    }
}

/// Shorten choice text into an edge label.
fn connection_label(text: &str) -> String {
    if text.chars().count() > LABEL_MAX_CHARS {
        let kept: String = text.chars().take(LABEL_KEPT_CHARS).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}
