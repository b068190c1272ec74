use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog entry for a named clinical measurement type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analyte {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub description: String,
}
