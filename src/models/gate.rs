use serde::{Deserialize, Serialize};

/// Body of the QR code shown at the gate. It is plain JSON, not signed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatePayload {
    pub reservation_id: String,
    pub spot_number: String,
    pub user_id: String,
}

impl GatePayload {
    pub fn to_json(&self) -> String {
        // A struct of three strings always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Which side of the gate a scanned token opens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GateDirection {
    Entry,
    Exit,
}

pub fn entry_token(id: &str) -> String {
    format!("ENTRY-{id}")
}

pub fn exit_token(id: &str) -> String {
    format!("EXIT-{id}")
}
