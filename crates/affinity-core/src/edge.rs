//! Weighted edge - a counter attached to a graph edge

/// Edge weight counter
///
/// Foreground writers only increment; the pruner only decrements. An edge
/// whose weight would reach zero is removed by its owner rather than kept
/// at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeightedEdge {
    weight: u64,
}

impl WeightedEdge {
    /// New edge with weight 1
    pub fn new() -> Self {
        Self { weight: 1 }
    }

    /// New edge with the given weight
    pub fn with_weight(weight: u64) -> Self {
        Self { weight }
    }

    #[inline]
    pub fn weight(&self) -> u64 {
        self.weight
    }

    #[inline]
    pub fn increment(&mut self) {
        self.weight += 1;
    }

    #[inline]
    pub fn add_weight(&mut self, amount: u64) {
        self.weight += amount;
    }

    /// Subtract `amount`, saturating at zero. Returns the remaining weight.
    #[inline]
    pub fn subtract(&mut self, amount: u64) -> u64 {
        self.weight = self.weight.saturating_sub(amount);
        self.weight
    }
}

impl Default for WeightedEdge {
    fn default() -> Self {
        Self::new()
    }
}
