use serde::{Deserialize, Serialize};

use super::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profession {
    pub id: RecordId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: RecordId,
    pub name: String,
    pub img: String,
}
