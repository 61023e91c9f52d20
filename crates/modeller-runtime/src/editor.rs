//! Interactive editing on top of a [`PhysicalGraph`].
//!
//! The windowing layer turns clicks and key presses into [`Intent`]s; the
//! editor keeps the current focus and mode and applies them. Focus is held by
//! title (or title pair) rather than render id, so it survives the id
//! renumbering every structural mutation causes.

use crate::physical::{Outcome, PhysicalGraph, Rejection};
use modeller_core::error::Result;
use modeller_core::selection::{resolve_selection, Selection};
use modeller_core::types::Vec3;
use std::path::PathBuf;
use tracing::debug;

/// What the editor is focused on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focus {
    Node(String),
    Connection(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    /// Waiting for the second endpoint of a new connection.
    Connecting { from: String },
    /// Waiting for the user to confirm a removal.
    Deleting(Focus),
}

/// A discrete user request.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    TogglePause,
    /// Hit-test results under the pointer, front to back.
    Select(Vec<usize>),
    BeginConnect,
    /// Render id of the node to connect to.
    ConfirmConnect(usize),
    BeginDelete,
    ConfirmDelete,
    Rename(String),
    EditBody(String),
    AddNode(Vec3),
    Save(PathBuf),
    Load(PathBuf),
    Cancel,
}

/// Why an intent did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    NothingSelected,
    NotANode,
    NotConnecting,
    NotDeleting,
    Rejected(Rejection),
}

/// What applying an intent did.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    Paused,
    Resumed,
    Selected(Option<Focus>),
    Connecting { from: String },
    Connected(String, String),
    ConfirmingDelete(Focus),
    Deleted(Focus),
    Renamed { old: String, new: String },
    BodyChanged(String),
    NodeAdded(String),
    Saved(PathBuf),
    Loaded(PathBuf),
    Cancelled,
    Refused(Refusal),
}

#[derive(Debug)]
pub struct Editor {
    graph: PhysicalGraph,
    focus: Option<Focus>,
    mode: Mode,
}

impl Editor {
    pub fn new(graph: PhysicalGraph) -> Self {
        Self {
            graph,
            focus: None,
            mode: Mode::Idle,
        }
    }

    pub fn graph(&self) -> &PhysicalGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut PhysicalGraph {
        &mut self.graph
    }

    pub fn into_graph(self) -> PhysicalGraph {
        self.graph
    }

    pub fn focus(&self) -> Option<&Focus> {
        self.focus.as_ref()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// The focus expressed in current render ids.
    pub fn selection(&self) -> Option<Selection> {
        match self.focus.as_ref()? {
            Focus::Node(title) => self.graph.node_id(title).map(Selection::Node),
            Focus::Connection(a, b) => self
                .graph
                .store()
                .connection_position(a, b)
                .map(Selection::Connection),
        }
    }

    pub fn apply(&mut self, intent: Intent) -> Result<EditorEvent> {
        self.drop_stale_focus();
        debug!(?intent, mode = ?self.mode, "applying intent");

        let event = match intent {
            Intent::TogglePause => {
                if self.graph.toggle_pause().is_running() {
                    EditorEvent::Resumed
                } else {
                    EditorEvent::Paused
                }
            }
            Intent::Select(hits) => {
                self.focus = resolve_selection(self.graph.layout(), hits).and_then(|s| self.focus_of(s));
                if matches!(self.mode, Mode::Deleting(_)) {
                    self.mode = Mode::Idle;
                }
                EditorEvent::Selected(self.focus.clone())
            }
            Intent::BeginConnect => match self.focused_node() {
                Ok(from) => {
                    self.mode = Mode::Connecting { from: from.clone() };
                    EditorEvent::Connecting { from }
                }
                Err(refusal) => EditorEvent::Refused(refusal),
            },
            Intent::ConfirmConnect(id) => self.confirm_connect(id)?,
            Intent::BeginDelete => match self.focus.clone() {
                Some(focus) => {
                    self.mode = Mode::Deleting(focus.clone());
                    EditorEvent::ConfirmingDelete(focus)
                }
                None => EditorEvent::Refused(Refusal::NothingSelected),
            },
            Intent::ConfirmDelete => self.confirm_delete()?,
            Intent::Rename(new) => match self.focused_node() {
                Ok(old) => match self.graph.rename_node(&old, &new)? {
                    Outcome::Applied => {
                        self.focus = Some(Focus::Node(new.clone()));
                        EditorEvent::Renamed { old, new }
                    }
                    Outcome::Ignored(rejection) => EditorEvent::Refused(Refusal::Rejected(rejection)),
                },
                Err(refusal) => EditorEvent::Refused(refusal),
            },
            Intent::EditBody(body) => match self.focused_node() {
                Ok(title) => {
                    self.graph.set_body(&title, &body)?;
                    EditorEvent::BodyChanged(title)
                }
                Err(refusal) => EditorEvent::Refused(refusal),
            },
            Intent::AddNode(position) => {
                let title = self.graph.add_node(position)?;
                self.focus = Some(Focus::Node(title.clone()));
                EditorEvent::NodeAdded(title)
            }
            Intent::Save(path) => {
                self.graph.save(&path)?;
                EditorEvent::Saved(path)
            }
            Intent::Load(path) => {
                let state = self.graph.state();
                let mut graph = PhysicalGraph::load_with(&path, self.graph.config().clone(), None)?;
                graph.set_state(state);
                self.graph = graph;
                self.focus = None;
                self.mode = Mode::Idle;
                EditorEvent::Loaded(path)
            }
            Intent::Cancel => {
                self.mode = Mode::Idle;
                EditorEvent::Cancelled
            }
        };

        Ok(event)
    }

    fn confirm_connect(&mut self, id: usize) -> Result<EditorEvent> {
        let Mode::Connecting { from } = std::mem::take(&mut self.mode) else {
            return Ok(EditorEvent::Refused(Refusal::NotConnecting));
        };

        let target = match resolve_selection(self.graph.layout(), [id]) {
            Some(Selection::Node(i)) => self.graph.id_to_title()[i].clone(),
            _ => return Ok(EditorEvent::Refused(Refusal::NotANode)),
        };

        Ok(match self.graph.add_connection(&from, &target)? {
            Outcome::Applied => {
                self.focus = Some(Focus::Connection(from.clone(), target.clone()));
                EditorEvent::Connected(from, target)
            }
            Outcome::Ignored(rejection) => EditorEvent::Refused(Refusal::Rejected(rejection)),
        })
    }

    fn confirm_delete(&mut self) -> Result<EditorEvent> {
        let Mode::Deleting(focus) = std::mem::take(&mut self.mode) else {
            return Ok(EditorEvent::Refused(Refusal::NotDeleting));
        };

        match &focus {
            Focus::Node(title) => {
                self.graph.remove_node(title)?;
            }
            Focus::Connection(a, b) => self.graph.remove_connection(a, b)?,
        }
        self.focus = None;
        Ok(EditorEvent::Deleted(focus))
    }

    fn focused_node(&self) -> std::result::Result<String, Refusal> {
        match &self.focus {
            Some(Focus::Node(title)) => Ok(title.clone()),
            Some(Focus::Connection(..)) => Err(Refusal::NotANode),
            None => Err(Refusal::NothingSelected),
        }
    }

    fn focus_of(&self, selection: Selection) -> Option<Focus> {
        match selection {
            Selection::Node(i) => self.graph.id_to_title().get(i).cloned().map(Focus::Node),
            Selection::Connection(k) => self
                .graph
                .store()
                .connections
                .get(k)
                .map(|(a, b)| Focus::Connection(a.clone(), b.clone())),
        }
    }

    fn drop_stale_focus(&mut self) {
        let live = match &self.focus {
            Some(Focus::Node(title)) => self.graph.contains(title),
            Some(Focus::Connection(a, b)) => self.graph.store().are_connected(a, b),
            None => true,
        };
        if !live {
            self.focus = None;
        }
    }
}
