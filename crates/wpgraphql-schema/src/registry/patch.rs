//! Field patches: ordered add/remove instructions attached to a type name.

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::field::{FieldConfig, PreparedField, prepare_field};
use super::{UnresolvedReference, field_key};

/// One instruction applied to a type's field set at materialization time.
#[derive(Debug, Clone)]
pub enum FieldPatch {
    /// Add a field unless a field registered under that name, or exposed
    /// under the same name, is already present.
    Add {
        /// Field name.
        field_name: String,
        /// Field config.
        config: FieldConfig,
    },
    /// Remove the field registered under that name, if present.
    Remove {
        /// Field name.
        field_name: String,
    },
}

impl FieldPatch {
    /// Applies this patch to a field set being materialized.
    pub(crate) fn apply(
        &self,
        owning_type: &str,
        fields: &mut IndexMap<String, PreparedField>,
        lookup: &dyn Fn(&str) -> Option<String>,
        unresolved: &mut Vec<UnresolvedReference>,
    ) {
        match self {
            Self::Add { field_name, config } => {
                let key = field_key(field_name);
                let exposed = config.name.clone().unwrap_or_else(|| key.clone());
                if fields.contains_key(&exposed) || fields.values().any(|f| f.key == key) {
                    debug!(type_name = %owning_type, field = %key, "Field already present, patch skipped");
                    return;
                }
                match prepare_field(field_name, config, owning_type, lookup, unresolved) {
                    Ok(Some(field)) => {
                        fields.insert(field.name.clone(), field);
                    }
                    Ok(None) => {}
                    // Configs are validated when the patch is registered.
                    Err(e) => warn!(error = %e, "Skipping invalid field patch"),
                }
            }
            Self::Remove { field_name } => {
                let key = field_key(field_name);
                if let Some(index) = fields.values().position(|f| f.key == key) {
                    fields.shift_remove_index(index);
                    debug!(type_name = %owning_type, field = %field_name, "Field removed by patch");
                }
            }
        }
    }
}
