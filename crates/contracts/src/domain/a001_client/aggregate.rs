use crate::domain::common::{AggregateId, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub Uuid);

impl ClientId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl AggregateId for ClientId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Client account, unique by tax identifier (CNPJ)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub tax_id: String,
    pub legal_name: String,
    pub municipality: String,
    pub credit_status: String,
    #[serde(flatten)]
    pub metadata: EntityMetadata,
}

impl Client {
    pub fn new_for_insert(data: ClientUpsert) -> Self {
        Self {
            id: ClientId::new_v4(),
            tax_id: data.tax_id,
            legal_name: data.legal_name,
            municipality: data.municipality,
            credit_status: data.credit_status,
            metadata: EntityMetadata::new(),
        }
    }

    /// Overwrites the descriptive fields; the tax id never changes.
    pub fn refresh(&mut self, data: &ClientUpsert) {
        self.legal_name = data.legal_name.clone();
        self.municipality = data.municipality.clone();
        self.credit_status = data.credit_status.clone();
        self.metadata.touch();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tax_id.trim().is_empty() {
            return Err("Tax id cannot be empty".into());
        }
        if self.legal_name.trim().is_empty() {
            return Err("Legal name cannot be empty".into());
        }
        Ok(())
    }

    pub fn is_credit_blocked(&self) -> bool {
        is_blocked_credit_status(&self.credit_status)
    }
}

/// Values of one imported row used to create or refresh a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientUpsert {
    pub tax_id: String,
    pub legal_name: String,
    pub municipality: String,
    pub credit_status: String,
}

pub const BLOCKED_CREDIT_STATUS: &str = "BLOQUEADO";

/// Credit status "BLOQUEADO", compared case-insensitively.
pub fn is_blocked_credit_status(status: &str) -> bool {
    status.trim().to_uppercase() == BLOCKED_CREDIT_STATUS
}
