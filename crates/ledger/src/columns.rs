use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Header aliases for the movement log ("Entradas y Salidas").
///
/// Each field lists the header names accepted for it; the first one present
/// in the sheet wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementColumns {
    pub date: Vec<String>,
    pub movement_type: Vec<String>,
    pub client: Vec<String>,
    pub model: Vec<String>,
    pub lot: Vec<String>,
    pub quantity: Vec<String>,
}

impl Default for MovementColumns {
    fn default() -> Self {
        Self {
            date: aliases(&["Fecha", "date"]),
            movement_type: aliases(&["Tipo de Movimiento", "movement_type", "type"]),
            client: client_aliases(),
            model: model_aliases(),
            lot: lot_aliases(),
            quantity: aliases(&["Piezas", "quantity"]),
        }
    }
}

/// Header aliases for the stock snapshot ("Inventario").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotColumns {
    pub client: Vec<String>,
    pub model: Vec<String>,
    pub lot: Vec<String>,
    pub reported_quantity: Vec<String>,
}

impl Default for SnapshotColumns {
    fn default() -> Self {
        Self {
            client: client_aliases(),
            model: model_aliases(),
            lot: lot_aliases(),
            reported_quantity: aliases(&["Piezas en stock", "reported_quantity", "stock"]),
        }
    }
}

fn client_aliases() -> Vec<String> {
    aliases(&["Cliente", "client"])
}

fn model_aliases() -> Vec<String> {
    aliases(&["Modelo", "model"])
}

fn lot_aliases() -> Vec<String> {
    aliases(&["Lote", "lot"])
}

fn aliases(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
