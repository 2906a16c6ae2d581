//! Scene layer bitsets.

use serde::{Deserialize, Serialize};

/// Number of addressable scene layers.
pub const MAX_LAYERS: u8 = 32;

/// A bitset selecting which scene layers are visible to a render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Every layer visible.
    pub const EVERYTHING: LayerMask = LayerMask(u32::MAX);
    /// No layer visible.
    pub const NOTHING: LayerMask = LayerMask(0);

    /// Builds a mask from a list of layer indices. Indices past the last
    /// layer are ignored.
    #[must_use]
    pub fn from_layers(layers: &[u8]) -> Self {
        let bits = layers
            .iter()
            .filter(|&&layer| layer < MAX_LAYERS)
            .fold(0u32, |bits, &layer| bits | (1 << layer));
        LayerMask(bits)
    }

    /// Returns whether the given layer is visible through this mask.
    #[must_use]
    pub fn contains(self, layer: u8) -> bool {
        layer < MAX_LAYERS && self.0 & (1 << layer) != 0
    }

    /// Returns a copy of this mask with `layer` added.
    #[must_use]
    pub fn with_layer(self, layer: u8) -> Self {
        if layer < MAX_LAYERS {
            LayerMask(self.0 | (1 << layer))
        } else {
            self
        }
    }

    /// Returns the raw bits.
    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::EVERYTHING
    }
}
