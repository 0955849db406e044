use std::collections::BTreeMap;
use std::sync::Arc;

type Layer = Arc<BTreeMap<String, String>>;

/// Ordered stack of read-only variable maps. Later layers shadow earlier ones,
/// so the usual chain is global, scenario, request, then the data row.
#[derive(Debug, Clone, Default)]
pub struct VariableScope {
    layers: Vec<Layer>,
}

impl VariableScope {
    #[must_use]
    pub fn new(global: Arc<BTreeMap<String, String>>) -> Self {
        Self {
            layers: vec![global],
        }
    }

    #[must_use]
    pub fn from_map(global: BTreeMap<String, String>) -> Self {
        Self::new(Arc::new(global))
    }

    /// Returns a scope with `layer` stacked on top. Layers are shared, not copied.
    #[must_use]
    pub fn with_layer(&self, layer: Arc<BTreeMap<String, String>>) -> Self {
        let mut layers = Vec::with_capacity(self.layers.len().saturating_add(1));
        layers.extend(self.layers.iter().cloned());
        layers.push(layer);
        Self { layers }
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.get(name))
            .map(String::as_str)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}
