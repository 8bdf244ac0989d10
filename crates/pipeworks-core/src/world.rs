//! The world as seen by pipe networks: cells, markers, and inventories.
//!
//! Hosts implement [`World`] over their own block storage. [`GridWorld`]
//! (in [`crate::grid`]) is the in-memory implementation used by tests and
//! headless tools.
//!
//! [`GridWorld`]: crate::grid::GridWorld

use crate::id::ColorTag;
use crate::item::{ContainerKind, Inventory};
use crate::location::{Face, Location};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// The material of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Block {
    #[default]
    Air,
    /// Any opaque block with no role in a pipe network.
    Solid,
    /// Passive transparent connector of one color.
    Connector(ColorTag),
    /// A block that holds items.
    Container(ContainerKind),
}

/// Everything discovery needs to know about one cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub block: Block,
    /// Direction the block points. Only meaningful for directional blocks.
    pub facing: Option<Face>,
    /// Identity label attached by whoever placed the block.
    pub label: Option<String>,
}

impl Cell {
    pub fn air() -> Self {
        Self::default()
    }

    pub fn solid() -> Self {
        Self {
            block: Block::Solid,
            ..Self::default()
        }
    }

    pub fn connector(color: ColorTag) -> Self {
        Self {
            block: Block::Connector(color),
            ..Self::default()
        }
    }

    pub fn container(kind: ContainerKind) -> Self {
        Self {
            block: Block::Container(kind),
            ..Self::default()
        }
    }

    pub fn facing(mut self, face: Face) -> Self {
        self.facing = Some(face);
        self
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn holds_items(&self) -> bool {
        matches!(self.block, Block::Container(_))
    }
}

// ---------------------------------------------------------------------------
// World trait
// ---------------------------------------------------------------------------

/// Cell and inventory access for one simulation host.
///
/// Lookups outside resident regions are the caller's responsibility: check
/// [`is_region_resident`](World::is_region_resident) first.
pub trait World {
    /// The cell at `at`. Unknown locations are air.
    fn cell(&self, at: Location) -> Cell;

    fn set_cell(&mut self, at: Location, cell: Cell);

    fn is_region_resident(&self, at: Location) -> bool;

    fn inventory(&self, at: Location) -> Option<&dyn Inventory>;

    fn inventory_mut(&mut self, at: Location) -> Option<&mut dyn Inventory>;
}

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

/// The recognized identity of a placed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    Input,
    Output,
    Loader,
    None,
}

/// Maps a cell to its marker. Must be pure: no I/O, same answer every time.
pub trait Classifier {
    fn marker(&self, cell: &Cell) -> Marker;
}

/// Labels that identify marked blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerLabels {
    pub input: String,
    pub output: String,
    pub loader: String,
}

impl Default for MarkerLabels {
    fn default() -> Self {
        Self {
            input: "pipe:input".to_string(),
            output: "pipe:output".to_string(),
            loader: "pipe:loader".to_string(),
        }
    }
}

/// Classifies cells by comparing their label against [`MarkerLabels`].
#[derive(Debug, Clone, Default)]
pub struct LabelClassifier {
    labels: MarkerLabels,
}

impl LabelClassifier {
    pub fn new(labels: MarkerLabels) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &MarkerLabels {
        &self.labels
    }
}

impl Classifier for LabelClassifier {
    fn marker(&self, cell: &Cell) -> Marker {
        match cell.label.as_deref() {
            Some(l) if l == self.labels.input => Marker::Input,
            Some(l) if l == self.labels.output => Marker::Output,
            Some(l) if l == self.labels.loader => Marker::Loader,
            _ => Marker::None,
        }
    }
}

impl<F> Classifier for F
where
    F: Fn(&Cell) -> Marker,
{
    fn marker(&self, cell: &Cell) -> Marker {
        self(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_classifier_recognizes_configured_labels() {
        let classifier = LabelClassifier::default();
        let input = Cell::container(ContainerKind::Dispenser).labelled("pipe:input");
        let output = Cell::container(ContainerKind::Dispenser).labelled("pipe:output");
        let loader = Cell::solid().labelled("pipe:loader");
        assert_eq!(classifier.marker(&input), Marker::Input);
        assert_eq!(classifier.marker(&output), Marker::Output);
        assert_eq!(classifier.marker(&loader), Marker::Loader);
        assert_eq!(classifier.marker(&Cell::solid()), Marker::None);
    }

    #[test]
    fn custom_labels_replace_defaults() {
        let classifier = LabelClassifier::new(MarkerLabels {
            input: "in".into(),
            output: "out".into(),
            loader: "anchor".into(),
        });
        let cell = Cell::container(ContainerKind::Dispenser).labelled("pipe:input");
        assert_eq!(classifier.marker(&cell), Marker::None);
        let cell = Cell::container(ContainerKind::Dispenser).labelled("in");
        assert_eq!(classifier.marker(&cell), Marker::Input);
    }

    #[test]
    fn closures_are_classifiers() {
        let everything_loads = |_: &Cell| Marker::Loader;
        assert_eq!(everything_loads.marker(&Cell::air()), Marker::Loader);
    }

    #[test]
    fn only_containers_hold_items() {
        assert!(Cell::container(ContainerKind::Storage).holds_items());
        assert!(!Cell::connector(ColorTag(2)).holds_items());
        assert!(!Cell::air().holds_items());
    }
}
