//! The physical graph: a graph store plus its spatial layout and render index.
//!
//! Physical node and line records live in a `StableGraph` arena whose indices
//! never move. The render index refers to those records by index and exposes
//! the dense three-range id space that selection and drawing rely on. A
//! `title -> NodeIndex` map is kept as a lookup index only.
//!
//! Every public mutation runs inside [`PhysicalGraph::transact`]: the records
//! are snapshotted, the operation runs, the full invariant check runs, and on
//! any failure the snapshot is put back.

use crate::codec::{decode_positions, encode_positions, POSITIONS_FILE};
use crate::physics::{self, PhysicsConfig, SimulationState};
use crate::render_index::{RenderIndex, RenderTarget};
use crate::snapshot::{GraphSnapshot, NodeSnapshot};
use crate::store::{is_reserved_title, same_title, GraphStore};
use crate::swap::{self, SwapPaths};
use modeller_core::error::{ModelError, PersistError, Result, Violation};
use modeller_core::filename::is_valid_filename;
use modeller_core::render::{RenderBackend, Renderable};
use modeller_core::selection::{resolve_selection, RenderLayout, Selection};
use modeller_core::types::{Highlight, Label, Line, ScreenPoint, Sphere, Vec3};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Name of the graph directory inside a save root.
pub const GRAPH_DIR: &str = "Mental-Model";

/// Title given to the first auto-named node. Later ones get a numeric suffix.
pub const NEW_NODE_TITLE: &str = "New Node";

/// Per-node physical record. Owns the node's sphere and label.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalNode {
    pub title: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub sphere: Sphere,
    pub label: Label,
}

impl PhysicalNode {
    fn new(title: &str, position: Vec3, config: &PhysicsConfig) -> Self {
        Self {
            title: title.to_string(),
            position,
            velocity: Vec3::ZERO,
            sphere: Sphere {
                center: position,
                radius: config.sphere_radius,
            },
            label: Label {
                anchor: position + config.label_offset,
                text: title.to_string(),
            },
        }
    }

    fn sync(&mut self, config: &PhysicsConfig) {
        self.sphere.center = self.position;
        self.label.anchor = self.position + config.label_offset;
    }
}

/// Per-connection physical record. Owns the connection's line.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalLine {
    pub line: Line,
}

/// Result of a mutation that user input may legitimately ask for in vain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored(Rejection),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// Why a user edit was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Both endpoints are the same node (compared case-insensitively).
    SelfConnection,
    AlreadyConnected,
    /// A rename to the title the node already has.
    SameTitle,
    InvalidTitle,
    TitleTaken,
    /// The title would collide with the connections file.
    ReservedTitle,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::SelfConnection => "a node cannot be connected to itself",
            Rejection::AlreadyConnected => "those nodes are already connected",
            Rejection::SameTitle => "the node already has that title",
            Rejection::InvalidTitle => "the title is not a usable file name",
            Rejection::TitleTaken => "another node already has that title",
            Rejection::ReservedTitle => "that title is reserved",
        };
        f.write_str(reason)
    }
}

/// Whether a connection removal runs the invariant check afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validation {
    #[default]
    Immediate,
    /// Skip the check; the caller validates once after a batch.
    Deferred,
}

/// Everything a mutation can touch. Cloned as the rollback snapshot.
#[derive(Debug, Clone, Default)]
struct Records {
    store: GraphStore,
    arena: StableUnGraph<PhysicalNode, PhysicalLine>,
    titles: HashMap<String, NodeIndex>,
    id_to_title: Vec<String>,
    index: RenderIndex,
}

/// A graph store with positions, velocities, renderables, and render ids.
#[derive(Debug, Clone)]
pub struct PhysicalGraph {
    records: Records,
    config: PhysicsConfig,
    state: SimulationState,
    rng: StdRng,
}

impl PhysicalGraph {
    /// Build with default physics and an entropy-seeded spawn layout.
    pub fn new(store: GraphStore) -> Result<Self> {
        Self::with_config(store, PhysicsConfig::default(), None)
    }

    /// Build with a reproducible spawn layout.
    pub fn with_seed(store: GraphStore, seed: u64) -> Result<Self> {
        Self::with_config(store, PhysicsConfig::default(), Some(seed))
    }

    /// Build from a store: random positions in the spawn cube, zero velocity,
    /// sphere ids `0..N` in title order, line ids `N..N+E` in connection
    /// order, label ids `N+E..2N+E`.
    ///
    /// Fails when a connection names a node that does not exist.
    pub fn with_config(store: GraphStore, config: PhysicsConfig, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        if let Some((a, b)) = store
            .connections
            .iter()
            .find(|(a, b)| !store.contains(a) || !store.contains(b))
        {
            return Err(ModelError::invariant(Violation::DanglingConnection(a.clone(), b.clone())));
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut records = Records::default();
        let n = store.nodes.len();
        let e = store.connections.len();

        for (i, title) in store.nodes.keys().enumerate() {
            let position = spawn_position(&mut rng, config.spawn_extent);
            let nx = records.arena.add_node(PhysicalNode::new(title, position, &config));
            records.titles.insert(title.clone(), nx);
            records.id_to_title.push(title.clone());
            records.index.push(i, RenderTarget::Sphere(nx));
        }

        for (k, (a, b)) in store.connections.iter().enumerate() {
            let (na, nb) = (records.titles[a], records.titles[b]);
            let line = records.new_line(na, nb, &config);
            let ex = records.arena.add_edge(na, nb, line);
            records.index.push(n + k, RenderTarget::Line(ex));
        }

        for (i, title) in records.id_to_title.iter().enumerate() {
            records.index.push(n + e + i, RenderTarget::Label(records.titles[title]));
        }

        records.store = store;
        debug!(nodes = n, connections = e, ids = records.index.len(), "built physical graph");

        Ok(Self {
            records,
            config,
            state: SimulationState::default(),
            rng,
        })
    }

    // ---- accessors ----

    pub fn store(&self) -> &GraphStore {
        &self.records.store
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn node_count(&self) -> usize {
        self.records.id_to_title.len()
    }

    pub fn connection_count(&self) -> usize {
        self.records.store.connections.len()
    }

    /// Node titles in sphere id order.
    pub fn id_to_title(&self) -> &[String] {
        &self.records.id_to_title
    }

    pub fn render_index(&self) -> &RenderIndex {
        &self.records.index
    }

    pub fn layout(&self) -> RenderLayout {
        self.records.layout()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.records.titles.contains_key(title)
    }

    pub fn node(&self, title: &str) -> Option<&PhysicalNode> {
        let nx = self.records.titles.get(title)?;
        self.records.arena.node_weight(*nx)
    }

    /// Physical records in sphere id order.
    pub fn nodes(&self) -> impl Iterator<Item = &PhysicalNode> + '_ {
        self.records
            .id_to_title
            .iter()
            .filter_map(|title| self.node(title))
    }

    /// Line record of the `k`th connection.
    pub fn line(&self, k: usize) -> Option<&PhysicalLine> {
        match self.records.index.get(self.layout().line_id(k))? {
            RenderTarget::Line(ex) => self.records.arena.edge_weight(ex),
            _ => None,
        }
    }

    pub fn body(&self, title: &str) -> Option<&str> {
        self.records.store.body(title)
    }

    pub fn position(&self, title: &str) -> Option<Vec3> {
        self.node(title).map(|node| node.position)
    }

    /// Index of `title` within the sphere range (equal to its sphere id).
    pub fn node_id(&self, title: &str) -> Option<usize> {
        self.records.id_to_title.iter().position(|t| t == title)
    }

    pub fn label_id(&self, title: &str) -> Option<usize> {
        let layout = self.layout();
        self.node_id(title).map(|i| layout.label_id(i))
    }

    /// Line id of the connection between `a` and `b`, in either order.
    pub fn line_id(&self, a: &str, b: &str) -> Option<usize> {
        let layout = self.layout();
        self.records
            .store
            .connection_position(a, b)
            .map(|k| layout.line_id(k))
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn set_state(&mut self, state: SimulationState) {
        self.state = state;
    }

    pub fn toggle_pause(&mut self) -> SimulationState {
        self.state = self.state.toggled();
        debug!(state = ?self.state, "simulation toggled");
        self.state
    }

    // ---- mutation protocol ----

    /// Run `op`, then the full invariant check. Any error restores the graph
    /// to how it was before `op` ran.
    pub fn transact<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let snapshot = self.records.clone();
        let result = op(self).and_then(|value| match self.records.validate() {
            Ok(()) => Ok(value),
            Err(violation) => {
                error!(%violation, "mutation broke an invariant; rolling back");
                Err(ModelError::invariant(violation))
            }
        });
        if result.is_err() {
            self.records = snapshot;
        }
        result
    }

    /// Add a node with the next free auto title. Returns the title.
    pub fn add_node(&mut self, position: Vec3) -> Result<String> {
        let title = self.free_title();
        self.transact(|graph| {
            graph.records.insert_node(&title, String::new(), position, &graph.config);
            Ok(())
        })?;
        Ok(title)
    }

    /// Add a node with a chosen title and body.
    pub fn insert_node(&mut self, title: &str, body: &str, position: Vec3) -> Result<Outcome> {
        if let Some(rejection) = self.title_rejection(title) {
            return Ok(Outcome::Ignored(rejection));
        }
        self.transact(|graph| {
            graph
                .records
                .insert_node(title, body.to_string(), position, &graph.config);
            Ok(Outcome::Applied)
        })
    }

    /// Remove a node and every connection touching it. Returns how many
    /// connections went with it.
    pub fn remove_node(&mut self, title: &str) -> Result<usize> {
        self.transact(|graph| graph.records.remove_node(title))
    }

    /// Rename a node, rewriting connection endpoints and the label text.
    pub fn rename_node(&mut self, old: &str, new: &str) -> Result<Outcome> {
        if !self.contains(old) {
            return Err(ModelError::node_not_found(old));
        }
        if old == new {
            return Ok(Outcome::Ignored(Rejection::SameTitle));
        }
        if let Some(rejection) = self.title_rejection(new) {
            return Ok(Outcome::Ignored(rejection));
        }
        // A neighbour whose title differs from `new` only in case would
        // become a self-connection.
        let neighbour_clash = self
            .records
            .store
            .incident_connections(old)
            .iter()
            .any(|(a, b)| {
                let other = if a == old { b } else { a };
                same_title(other, new)
            });
        if neighbour_clash {
            return Ok(Outcome::Ignored(Rejection::SelfConnection));
        }
        self.transact(|graph| {
            graph.records.rename(old, new)?;
            Ok(Outcome::Applied)
        })
    }

    pub fn set_body(&mut self, title: &str, body: &str) -> Result<()> {
        self.transact(|graph| {
            let slot = graph
                .records
                .store
                .nodes
                .get_mut(title)
                .ok_or_else(|| ModelError::node_not_found(title))?;
            *slot = body.to_string();
            debug!(title, bytes = body.len(), "body changed");
            Ok(())
        })
    }

    /// Connect two existing nodes.
    pub fn add_connection(&mut self, a: &str, b: &str) -> Result<Outcome> {
        for title in [a, b] {
            if !self.contains(title) {
                return Err(ModelError::node_not_found(title));
            }
        }
        if same_title(a, b) {
            return Ok(Outcome::Ignored(Rejection::SelfConnection));
        }
        if self.records.store.are_connected(a, b) {
            return Ok(Outcome::Ignored(Rejection::AlreadyConnected));
        }
        self.transact(|graph| {
            graph.records.link(a, b, &graph.config)?;
            Ok(Outcome::Applied)
        })
    }

    pub fn remove_connection(&mut self, a: &str, b: &str) -> Result<()> {
        self.remove_connection_with(a, b, Validation::Immediate)
    }

    /// Remove a connection. With [`Validation::Deferred`] the invariant check
    /// and rollback are skipped and the caller must call [`validate`] itself.
    ///
    /// [`validate`]: PhysicalGraph::validate
    pub fn remove_connection_with(&mut self, a: &str, b: &str, validation: Validation) -> Result<()> {
        match validation {
            Validation::Immediate => self.transact(|graph| graph.records.unlink(a, b)),
            Validation::Deferred => self.records.unlink(a, b),
        }
    }

    /// Move a node without touching its velocity.
    pub fn set_position(&mut self, title: &str, position: Vec3) -> Result<()> {
        let nx = self.records.node_index(title)?;
        if let Some(node) = self.records.arena.node_weight_mut(nx) {
            node.position = position;
            node.sync(&self.config);
        }
        self.records.sync_lines_of(nx);
        Ok(())
    }

    /// A uniformly random point in the spawn cube.
    pub fn spawn_position(&mut self) -> Vec3 {
        spawn_position(&mut self.rng, self.config.spawn_extent)
    }

    /// Check every invariant: store rules, record counts, and the render
    /// index partition.
    pub fn validate(&self) -> std::result::Result<(), Violation> {
        self.records.validate()
    }

    fn free_title(&self) -> String {
        if !self.contains(NEW_NODE_TITLE) {
            return NEW_NODE_TITLE.to_string();
        }
        (1..)
            .map(|n| format!("{NEW_NODE_TITLE} {n}"))
            .find(|title| !self.contains(title))
            .unwrap_or_else(|| NEW_NODE_TITLE.to_string())
    }

    fn title_rejection(&self, title: &str) -> Option<Rejection> {
        if is_reserved_title(title) {
            Some(Rejection::ReservedTitle)
        } else if !is_valid_filename(title) {
            Some(Rejection::InvalidTitle)
        } else if self.contains(title) {
            Some(Rejection::TitleTaken)
        } else {
            None
        }
    }

    // ---- physics ----

    /// Advance one step. Returns `false` without changing anything when paused.
    pub fn step(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }

        let records = &mut self.records;
        let order: Vec<NodeIndex> = records
            .id_to_title
            .iter()
            .filter_map(|title| records.titles.get(title).copied())
            .collect();
        let slot: HashMap<NodeIndex, usize> = order.iter().enumerate().map(|(i, nx)| (*nx, i)).collect();

        let mut positions = Vec::with_capacity(order.len());
        let mut velocities = Vec::with_capacity(order.len());
        for nx in &order {
            let node = &records.arena[*nx];
            positions.push(node.position);
            velocities.push(node.velocity);
        }

        let springs: Vec<(usize, usize)> = records
            .store
            .connections
            .iter()
            .filter_map(|(a, b)| {
                let u = slot.get(records.titles.get(a)?)?;
                let v = slot.get(records.titles.get(b)?)?;
                Some((*u, *v))
            })
            .collect();

        physics::step(&self.config, &mut positions, &mut velocities, &springs);

        for (i, nx) in order.iter().enumerate() {
            let node = &mut records.arena[*nx];
            node.position = positions[i];
            node.velocity = velocities[i];
            node.sync(&self.config);
        }
        records.sync_all_lines();
        true
    }

    /// Run up to `steps` steps. Returns how many ran.
    pub fn run(&mut self, steps: usize) -> usize {
        let mut ran = 0;
        while ran < steps && self.step() {
            ran += 1;
        }
        ran
    }

    // ---- persistence ----

    /// Load a save root with default physics.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_with(root, PhysicsConfig::default(), None)
    }

    /// Load `<root>/Mental-Model` and, if present, `<root>/physics.bin`.
    ///
    /// A missing root with a `<root>.bak` beside it is reported as
    /// [`PersistError::OrphanedBackup`]; see [`swap::restore_backup`].
    pub fn load_with(root: &Path, config: PhysicsConfig, seed: Option<u64>) -> Result<Self> {
        let paths = SwapPaths::for_save_root(root)?;
        if !root.exists() {
            if paths.has_orphaned_backup() {
                warn!(backup = %paths.backup.display(), "save root missing but a backup exists");
                return Err(PersistError::OrphanedBackup(paths.backup).into());
            }
            return Err(PersistError::MissingRoot(root.to_path_buf()).into());
        }

        let store = GraphStore::load(&root.join(GRAPH_DIR))?;
        let mut graph = Self::with_config(store, config, seed)?;

        let positions_path = root.join(POSITIONS_FILE);
        if positions_path.is_file() {
            let bytes = fs::read(&positions_path).map_err(|e| PersistError::io(&positions_path, e))?;
            let applied = graph.apply_positions(decode_positions(&bytes)?);
            debug!(applied, "applied saved positions");
        } else {
            debug!(root = %root.display(), "no position file; keeping spawn positions");
        }

        info!(
            root = %root.display(),
            nodes = graph.node_count(),
            connections = graph.connection_count(),
            "loaded save root"
        );
        Ok(graph)
    }

    /// Save the store and positions under `root`, replacing it atomically.
    pub fn save(&self, root: &Path) -> Result<()> {
        if let Err(violation) = self.records.check_counts() {
            error!(%violation, "refusing to save");
            return Err(PersistError::InconsistentState(violation).into());
        }

        let paths = SwapPaths::for_save_root(root)?;
        let positions = self.encode_positions();
        swap::replace_dir(&paths, |tmp| {
            let positions_path = tmp.join(POSITIONS_FILE);
            fs::write(&positions_path, &positions).map_err(|e| PersistError::io(&positions_path, e))?;

            let graph_dir = tmp.join(GRAPH_DIR);
            fs::create_dir(&graph_dir).map_err(|e| PersistError::io(&graph_dir, e))?;
            self.records.store.write_into(&graph_dir)
        })?;

        info!(
            root = %root.display(),
            nodes = self.node_count(),
            connections = self.connection_count(),
            "saved"
        );
        Ok(())
    }

    /// Position file contents: one record per node in sphere id order.
    pub fn encode_positions(&self) -> Vec<u8> {
        encode_positions(self.nodes().map(|node| (node.title.as_str(), node.position)))
    }

    fn apply_positions(&mut self, records: Vec<(String, Vec3)>) -> usize {
        let mut applied = 0;
        for (title, position) in records {
            if !position.is_finite() {
                warn!(title = %title, "ignoring non-finite saved position");
                continue;
            }
            match self.set_position(&title, position) {
                Ok(()) => applied += 1,
                Err(_) => warn!(title = %title, "ignoring saved position for unknown node"),
            }
        }
        applied
    }

    // ---- rendering ----

    /// Every renderable with its render id, in index order.
    pub fn renderables(&self) -> Vec<(usize, Renderable<'_>)> {
        let arena = &self.records.arena;
        self.records
            .index
            .entries()
            .iter()
            .filter_map(|entry| {
                let item = match entry.target {
                    RenderTarget::Sphere(nx) => Renderable::Sphere(&arena.node_weight(nx)?.sphere),
                    RenderTarget::Label(nx) => Renderable::Label(&arena.node_weight(nx)?.label),
                    RenderTarget::Line(ex) => Renderable::Line(&arena.edge_weight(ex)?.line),
                };
                Some((entry.id, item))
            })
            .collect()
    }

    /// Ids under `pointer`, front to back.
    pub fn hit_test<B: RenderBackend>(&self, backend: &B, pointer: ScreenPoint) -> Vec<usize> {
        let mut items = self.depth_sorted(backend);
        items.reverse();
        items
            .into_iter()
            .filter(|(_, _, item)| hits(backend, *item, pointer))
            .map(|(_, id, _)| id)
            .collect()
    }

    /// Draw one frame: everything back to front, with whatever the pointer
    /// resolves to highlighted. Returns that selection.
    pub fn render_frame<B: RenderBackend>(
        &self,
        backend: &mut B,
        pointer: Option<ScreenPoint>,
    ) -> Option<Selection> {
        let layout = self.layout();
        let items = self.depth_sorted(backend);

        let selection = pointer.and_then(|point| {
            let shared: &B = backend;
            let front_to_back = items
                .iter()
                .rev()
                .filter(|(_, _, item)| hits(shared, *item, point))
                .map(|(_, id, _)| *id);
            resolve_selection(layout, front_to_back)
        });

        let highlighted = selection
            .map(|s| s.highlighted_ids(layout))
            .unwrap_or_default();
        for (_, id, item) in &items {
            let highlight = if highlighted.contains(id) {
                Highlight::Selected
            } else {
                Highlight::Normal
            };
            backend.draw(*item, highlight);
        }
        selection
    }

    fn depth_sorted<B: RenderBackend>(&self, backend: &B) -> Vec<(f32, usize, Renderable<'_>)> {
        let mut items: Vec<(f32, usize, Renderable<'_>)> = self
            .renderables()
            .into_iter()
            .map(|(id, item)| (backend.depth(item), id, item))
            .collect();
        // Farthest first.
        items.sort_by(|a, b| b.0.total_cmp(&a.0));
        items
    }

    /// Serializable copy of titles, bodies, positions, and connections.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self
                .nodes()
                .map(|node| NodeSnapshot {
                    title: node.title.clone(),
                    body: self.body(&node.title).unwrap_or_default().to_string(),
                    position: node.position,
                })
                .collect(),
            connections: self.records.store.connections.clone(),
        }
    }
}

fn hits<B: RenderBackend>(backend: &B, item: Renderable<'_>, point: ScreenPoint) -> bool {
    backend
        .compute_shape(item)
        .is_some_and(|shape| backend.collides(&shape, point))
}

fn spawn_position(rng: &mut StdRng, extent: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-extent..=extent),
        rng.gen_range(-extent..=extent),
        rng.gen_range(-extent..=extent),
    )
}

impl Records {
    fn layout(&self) -> RenderLayout {
        RenderLayout::new(self.id_to_title.len(), self.store.connections.len())
    }

    fn node_index(&self, title: &str) -> Result<NodeIndex> {
        self.titles
            .get(title)
            .copied()
            .ok_or_else(|| ModelError::node_not_found(title))
    }

    fn new_line(&self, a: NodeIndex, b: NodeIndex, config: &PhysicsConfig) -> PhysicalLine {
        PhysicalLine {
            line: Line {
                a: self.arena[a].position,
                b: self.arena[b].position,
                width: config.line_width,
            },
        }
    }

    fn insert_node(&mut self, title: &str, body: String, position: Vec3, config: &PhysicsConfig) {
        let layout = self.layout();
        let nx = self.arena.add_node(PhysicalNode::new(title, position, config));

        // Sphere at old N shifts every line and label up by one.
        let sphere_id = layout.nodes;
        self.index.insert(sphere_id, RenderTarget::Sphere(nx));
        // Under the new sizes the label lands at N_new + E + N_old, the end.
        let label_id = RenderLayout::new(layout.nodes + 1, layout.connections).label_id(layout.nodes);
        self.index.insert(label_id, RenderTarget::Label(nx));

        self.id_to_title.push(title.to_string());
        self.titles.insert(title.to_string(), nx);
        self.store.nodes.insert(title.to_string(), body);
        debug!(title, sphere_id, label_id, ids = self.index.len(), "node added");
    }

    fn remove_node(&mut self, title: &str) -> Result<usize> {
        let i = self
            .id_to_title
            .iter()
            .position(|t| t == title)
            .ok_or_else(|| ModelError::node_not_found(title))?;
        let nx = self.node_index(title)?;

        let layout = self.layout();
        let (sphere_id, label_id) = (layout.sphere_id(i), layout.label_id(i));
        self.index.remove_ids(&[sphere_id, label_id]);
        self.id_to_title.remove(i);
        self.titles.remove(title);
        self.store.nodes.remove(title);

        let incident = self.store.incident_connections(title);
        for (a, b) in &incident {
            self.unlink(a, b)?;
        }
        self.arena.remove_node(nx);

        debug!(
            title,
            sphere_id,
            label_id,
            cascaded = incident.len(),
            ids = self.index.len(),
            "node removed"
        );
        Ok(incident.len())
    }

    fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let nx = self.node_index(old)?;
        self.store.rename_node(old, new);
        if let Some(slot) = self.id_to_title.iter_mut().find(|t| *t == old) {
            *slot = new.to_string();
        }
        self.titles.remove(old);
        self.titles.insert(new.to_string(), nx);
        if let Some(node) = self.arena.node_weight_mut(nx) {
            node.title = new.to_string();
            node.label.text = new.to_string();
        }
        debug!(old, new, "node renamed");
        Ok(())
    }

    fn link(&mut self, a: &str, b: &str, config: &PhysicsConfig) -> Result<()> {
        let (na, nb) = (self.node_index(a)?, self.node_index(b)?);
        let layout = self.layout();
        let line_id = layout.line_id(layout.connections);

        let line = self.new_line(na, nb, config);
        let ex = self.arena.add_edge(na, nb, line);
        self.index.insert(line_id, RenderTarget::Line(ex));
        self.store.connections.push((a.to_string(), b.to_string()));
        debug!(a, b, line_id, ids = self.index.len(), "connection added");
        Ok(())
    }

    fn unlink(&mut self, a: &str, b: &str) -> Result<()> {
        let k = self
            .store
            .connection_position(a, b)
            .ok_or_else(|| ModelError::connection_not_found(a, b))?;
        let line_id = self.layout().line_id(k);
        let Some(RenderTarget::Line(ex)) = self.index.get(line_id) else {
            return Err(ModelError::invariant(Violation::RenderIndex(format!(
                "id {line_id} should hold the line for {a:?} <-> {b:?}"
            ))));
        };

        self.index.remove_ids(&[line_id]);
        self.store.connections.remove(k);
        self.arena.remove_edge(ex);
        debug!(a, b, line_id, ids = self.index.len(), "connection removed");
        Ok(())
    }

    fn sync_all_lines(&mut self) {
        let edges: Vec<EdgeIndex> = self.arena.edge_indices().collect();
        for ex in edges {
            self.sync_line(ex);
        }
    }

    fn sync_lines_of(&mut self, nx: NodeIndex) {
        let edges: Vec<EdgeIndex> = self.arena.edges(nx).map(|edge| edge.id()).collect();
        for ex in edges {
            self.sync_line(ex);
        }
    }

    fn sync_line(&mut self, ex: EdgeIndex) {
        let Some((u, v)) = self.arena.edge_endpoints(ex) else {
            return;
        };
        let (pu, pv) = (self.arena[u].position, self.arena[v].position);
        if let Some(record) = self.arena.edge_weight_mut(ex) {
            record.line.a = pu;
            record.line.b = pv;
        }
    }

    fn check_counts(&self) -> std::result::Result<(), Violation> {
        let store_nodes = self.store.nodes.len();
        let store_connections = self.store.connections.len();
        let physical_nodes = self.arena.node_count();
        let physical_lines = self.arena.edge_count();
        if store_nodes != physical_nodes || store_connections != physical_lines {
            return Err(Violation::CountMismatch {
                store_nodes,
                physical_nodes,
                store_connections,
                physical_lines,
            });
        }
        if self.id_to_title.len() != store_nodes || self.titles.len() != store_nodes {
            return Err(Violation::RenderIndex(format!(
                "{} ordered titles and {} indexed titles for {store_nodes} nodes",
                self.id_to_title.len(),
                self.titles.len()
            )));
        }
        Ok(())
    }

    fn validate(&self) -> std::result::Result<(), Violation> {
        self.store.validate()?;
        self.check_counts()?;

        let layout = self.layout();
        let targets = self.index.dense_targets(layout.len()).ok_or_else(|| {
            Violation::RenderIndex(format!("ids are not exactly 0..{}", layout.len()))
        })?;

        for (i, title) in self.id_to_title.iter().enumerate() {
            let nx = self
                .titles
                .get(title)
                .copied()
                .filter(|_| self.store.contains(title))
                .ok_or_else(|| Violation::RenderIndex(format!("ordered title {title:?} is not a node")))?;
            if self.arena.node_weight(nx).map(|node| node.title.as_str()) != Some(title.as_str()) {
                return Err(Violation::RenderIndex(format!("record for {title:?} has another title")));
            }
            if targets[layout.sphere_id(i)] != RenderTarget::Sphere(nx) {
                return Err(Violation::RenderIndex(format!("id {i} is not the sphere of {title:?}")));
            }
            let label_id = layout.label_id(i);
            if targets[label_id] != RenderTarget::Label(nx) {
                return Err(Violation::RenderIndex(format!("id {label_id} is not the label of {title:?}")));
            }
        }

        for (k, (a, b)) in self.store.connections.iter().enumerate() {
            let line_id = layout.line_id(k);
            let RenderTarget::Line(ex) = targets[line_id] else {
                return Err(Violation::RenderIndex(format!("id {line_id} is not a line")));
            };
            let endpoints = self
                .arena
                .edge_endpoints(ex)
                .and_then(|(u, v)| Some((self.arena.node_weight(u)?, self.arena.node_weight(v)?)));
            let matches = endpoints.is_some_and(|(u, v)| {
                (u.title == *a && v.title == *b) || (u.title == *b && v.title == *a)
            });
            if !matches {
                return Err(Violation::RenderIndex(format!(
                    "id {line_id} is not the line for {a:?} <-> {b:?}"
                )));
            }
        }

        Ok(())
    }
}
