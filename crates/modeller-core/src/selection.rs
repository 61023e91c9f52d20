//! Render id layout and hit resolution.
//!
//! Render ids are dense and split into three contiguous ranges for a graph of
//! `N` nodes and `E` connections:
//!
//! | Range | Denotes |
//! |-------|---------|
//! | `[0, N)` | node spheres, in node order |
//! | `[N, N+E)` | connection lines, in connection order |
//! | `[N+E, 2N+E)` | node labels, in node order |
//!
//! Node `i` therefore owns sphere id `i` and label id `N+E+i`.

/// Sizes of the three id ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderLayout {
    pub nodes: usize,
    pub connections: usize,
}

/// What a render id denotes, with the node or connection index it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Sphere(usize),
    Line(usize),
    Label(usize),
}

impl RenderLayout {
    pub fn new(nodes: usize, connections: usize) -> Self {
        Self { nodes, connections }
    }

    /// Total number of ids.
    pub fn len(&self) -> usize {
        2 * self.nodes + self.connections
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sphere_id(&self, node: usize) -> usize {
        node
    }

    pub fn line_id(&self, connection: usize) -> usize {
        self.nodes + connection
    }

    pub fn label_id(&self, node: usize) -> usize {
        self.nodes + self.connections + node
    }

    /// Classify an id by range. `None` when the id is past the end.
    pub fn classify(&self, id: usize) -> Option<RenderKind> {
        let lines_start = self.nodes;
        let labels_start = self.nodes + self.connections;
        if id < lines_start {
            Some(RenderKind::Sphere(id))
        } else if id < labels_start {
            Some(RenderKind::Line(id - lines_start))
        } else if id < self.len() {
            Some(RenderKind::Label(id - labels_start))
        } else {
            None
        }
    }
}

/// A resolved selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Node index (equal to its sphere id).
    Node(usize),
    /// Connection index within the connection sequence.
    Connection(usize),
}

impl Selection {
    /// The id a caller sees for this selection: the sphere id for a node,
    /// the line id for a connection.
    pub fn render_id(&self, layout: RenderLayout) -> usize {
        match *self {
            Selection::Node(i) => layout.sphere_id(i),
            Selection::Connection(k) => layout.line_id(k),
        }
    }

    /// Every id drawn highlighted for this selection.
    pub fn highlighted_ids(&self, layout: RenderLayout) -> Vec<usize> {
        match *self {
            Selection::Node(i) => vec![layout.sphere_id(i), layout.label_id(i)],
            Selection::Connection(k) => vec![layout.line_id(k)],
        }
    }
}

/// Pick a selection from hit-test results ordered front to back.
///
/// The first sphere or label hit wins, even if a line was hit in front of it.
/// Only when no node part was hit does the first line hit apply. Labels map
/// back to their node. Ids outside the layout are skipped.
pub fn resolve_selection<I>(layout: RenderLayout, hits: I) -> Option<Selection>
where
    I: IntoIterator<Item = usize>,
{
    let mut first_line = None;

    for id in hits {
        match layout.classify(id) {
            Some(RenderKind::Sphere(i)) | Some(RenderKind::Label(i)) => {
                return Some(Selection::Node(i));
            }
            Some(RenderKind::Line(k)) => {
                first_line.get_or_insert(Selection::Connection(k));
            }
            None => {}
        }
    }

    first_line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_splits_three_ranges() {
        let layout = RenderLayout::new(3, 2);
        assert_eq!(layout.len(), 8);
        assert_eq!(layout.classify(0), Some(RenderKind::Sphere(0)));
        assert_eq!(layout.classify(2), Some(RenderKind::Sphere(2)));
        assert_eq!(layout.classify(3), Some(RenderKind::Line(0)));
        assert_eq!(layout.classify(4), Some(RenderKind::Line(1)));
        assert_eq!(layout.classify(5), Some(RenderKind::Label(0)));
        assert_eq!(layout.classify(7), Some(RenderKind::Label(2)));
        assert_eq!(layout.classify(8), None);
    }

    #[test]
    fn sphere_and_label_ids_share_an_index() {
        let layout = RenderLayout::new(4, 3);
        for i in 0..4 {
            assert_eq!(layout.classify(layout.sphere_id(i)), Some(RenderKind::Sphere(i)));
            assert_eq!(layout.classify(layout.label_id(i)), Some(RenderKind::Label(i)));
        }
    }

    #[test]
    fn node_beats_connection_in_front_of_it() {
        let layout = RenderLayout::new(2, 1);
        // Line (id 2) is in front of sphere 1.
        let selection = resolve_selection(layout, [2, 1]);
        assert_eq!(selection, Some(Selection::Node(1)));
    }

    #[test]
    fn label_maps_back_to_its_node() {
        let layout = RenderLayout::new(2, 1);
        // id 4 is the label of node 1.
        assert_eq!(resolve_selection(layout, [4]), Some(Selection::Node(1)));
    }

    #[test]
    fn first_connection_is_the_fallback() {
        let layout = RenderLayout::new(2, 3);
        let selection = resolve_selection(layout, [3, 2, 4]);
        assert_eq!(selection, Some(Selection::Connection(1)));
        assert_eq!(selection.map(|s| s.render_id(layout)), Some(3));
    }

    #[test]
    fn no_hits_selects_nothing() {
        let layout = RenderLayout::new(2, 1);
        assert_eq!(resolve_selection(layout, std::iter::empty()), None);
        assert_eq!(resolve_selection(layout, [99]), None);
    }

    #[test]
    fn node_selection_highlights_sphere_and_label() {
        let layout = RenderLayout::new(3, 2);
        assert_eq!(Selection::Node(1).highlighted_ids(layout), vec![1, 6]);
        assert_eq!(Selection::Connection(1).highlighted_ids(layout), vec![4]);
    }
}
