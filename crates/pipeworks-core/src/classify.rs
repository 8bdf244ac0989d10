//! Per-cell role classification, ahead of any neighbor checks.

use crate::id::ColorTag;
use crate::location::Face;
use crate::world::{Block, Cell, Classifier, Marker};

/// What a single cell can contribute to a network, judged in isolation.
///
/// Neighbor conditions (an input facing a connector, an output facing a
/// container) are checked by discovery, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Connector(ColorTag),
    Input { facing: Face },
    Output { facing: Face },
    Loader,
    None,
}

impl Role {
    pub fn is_member(&self) -> bool {
        !matches!(self, Role::None)
    }
}

/// Resolve a cell into its [`Role`].
///
/// Inputs and outputs must hold items and face somewhere. Loaders only need
/// the marker. Connectors are recognized by material alone.
pub fn classify<C>(cell: &Cell, classifier: &C) -> Role
where
    C: Classifier + ?Sized,
{
    if let Block::Connector(color) = cell.block {
        return Role::Connector(color);
    }
    match (classifier.marker(cell), cell.holds_items(), cell.facing) {
        (Marker::Input, true, Some(facing)) => Role::Input { facing },
        (Marker::Output, true, Some(facing)) => Role::Output { facing },
        (Marker::Loader, _, _) => Role::Loader,
        _ => Role::None,
    }
}
