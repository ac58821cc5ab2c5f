//! Per-model-kind point array selection.
//!
//! Each [`ModelKind`] owns an ordered list of field descriptors. The host
//! pipeline toggles them; the loaders only read the enabled ones.

use crate::data::model::ModelKind;
use serde::{Deserialize, Serialize};

/// One selectable point array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Point array name, e.g. `stress_xx`.
    pub name: String,
    /// Component index inside the model kind's field dataset.
    pub component: usize,
    /// Whether the array is loaded on the next data pass.
    pub enabled: bool,
}

/// Ordered field descriptors for one model kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelection {
    kind: ModelKind,
    fields: Vec<FieldDescriptor>,
}

impl FieldSelection {
    /// All arrays of `kind`, enabled.
    pub fn for_kind(kind: ModelKind) -> Self {
        let fields = kind
            .field_names()
            .iter()
            .enumerate()
            .map(|(component, name)| FieldDescriptor {
                name: (*name).to_string(),
                component,
                enabled: true,
            })
            .collect();
        Self { kind, fields }
    }

    #[inline]
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Number of selectable arrays.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Name of the array at `index`, if any.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|f| f.name.as_str())
    }

    /// `Some(enabled)` for a known array, `None` otherwise.
    pub fn status(&self, name: &str) -> Option<bool> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.enabled)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.status(name).unwrap_or(false)
    }

    /// Set the status of `name`. Returns `false` when the name is unknown.
    pub fn set_status(&mut self, name: &str, enabled: bool) -> bool {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn enable(&mut self, name: &str) -> bool {
        self.set_status(name, true)
    }

    pub fn disable(&mut self, name: &str) -> bool {
        self.set_status(name, false)
    }

    pub fn enable_all(&mut self) {
        self.fields.iter_mut().for_each(|f| f.enabled = true);
    }

    pub fn disable_all(&mut self) {
        self.fields.iter_mut().for_each(|f| f.enabled = false);
    }

    /// All descriptors in component order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    /// Enabled descriptors in component order.
    pub fn enabled(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.enabled)
    }
}
