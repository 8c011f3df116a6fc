use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{VectorDbError, VectorDbResult};

/// Entity ids are unique within a collection
pub type EntityId = i64;

/// Metadata of one entity: field name -> JSON value
pub type Metadata = serde_json::Map<String, serde_json::Value>;

pub const MAX_NAME_LEN: usize = 255;
pub const DEFAULT_VECTOR_FIELD: &str = "vector";

/// Tenant and collection names: 1-255 characters, no `:`
pub fn validate_name(kind: &str, name: &str) -> VectorDbResult<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(VectorDbError::InvalidArgument(format!(
            "{} name must be 1-{} characters",
            kind, MAX_NAME_LEN
        )));
    }
    if name.contains(':') {
        return Err(VectorDbError::InvalidArgument(format!(
            "{} name must not contain ':'",
            kind
        )));
    }
    Ok(())
}

// ===== Identity =====

/// Authenticated caller of one request.
///
/// Never persisted. Root acts inside its own namespace for collection
/// operations and is the only context allowed to administer tenants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant: String,
    is_root: bool,
}

impl TenantContext {
    pub fn tenant(name: impl Into<String>) -> Self {
        Self {
            tenant: name.into(),
            is_root: false,
        }
    }

    pub fn root(name: impl Into<String>) -> Self {
        Self {
            tenant: name.into(),
            is_root: true,
        }
    }

    /// Namespace every collection operation is confined to
    pub fn namespace(&self) -> &str {
        &self.tenant
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }
}

/// `identity:secret` pair parsed from a bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identity: String,
    pub secret: String,
}

impl Credentials {
    /// Split on the first `:`; both halves must be non-empty
    pub fn parse(token: &str) -> VectorDbResult<Self> {
        match token.split_once(':') {
            Some((identity, secret)) if !identity.is_empty() && !secret.is_empty() => Ok(Self {
                identity: identity.to_string(),
                secret: secret.to_string(),
            }),
            _ => Err(VectorDbError::Unauthorized(
                "malformed credentials, expected identity:secret".to_string(),
            )),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Stored tenant identity. The secret only exists as an Argon2 PHC string.
#[derive(Clone, PartialEq, Eq)]
pub struct TenantRecord {
    pub name: String,
    pub secret_hash: String,
    pub pub_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for TenantRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantRecord")
            .field("name", &self.name)
            .field("pub_key", &self.pub_key)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct NewTenant {
    pub name: String,
    pub secret: String,
    pub pub_key: Option<String>,
}

// ===== Collections =====

/// Scoring used by search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum DistanceMetric {
    /// Squared Euclidean distance, smaller is closer
    #[default]
    #[serde(rename = "L2")]
    L2,
    /// Cosine similarity, larger is closer
    #[serde(rename = "COSINE", alias = "cosine")]
    Cosine,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::L2 => "L2",
            DistanceMetric::Cosine => "COSINE",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "L2" => Ok(DistanceMetric::L2),
            "COSINE" => Ok(DistanceMetric::Cosine),
            other => Err(format!("unknown metric '{}', expected L2 or COSINE", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: Uuid,
    #[serde(skip)]
    pub tenant: String,
    pub name: String,
    pub dimension: usize,
    #[serde(rename = "metricType")]
    pub metric: DistanceMetric,
    pub vector_field: String,
    /// Expected metadata fields. Advisory: inserts are not checked against it.
    pub fields: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCollection {
    pub name: String,
    pub dimension: i64,
    pub metric: Option<DistanceMetric>,
    pub vector_field: Option<String>,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDescription {
    #[serde(flatten)]
    pub collection: Collection,
    pub entity_count: u64,
}

// ===== Entities =====

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub vector: Vec<f32>,
    pub metadata: Metadata,
}

/// Entity as submitted for insert; `id` is assigned when omitted
#[derive(Debug, Clone, Default)]
pub struct NewEntity {
    pub id: Option<EntityId>,
    pub vector: Vec<f32>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub insert_count: usize,
    pub insert_ids: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub delete_count: u64,
}

/// Entity returned by point reads: id, vector and the projected metadata
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EntityRecord {
    pub id: EntityId,
    pub vector: Vec<f32>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub fields: Metadata,
}

// ===== Search =====

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub collection_name: String,
    pub vectors: Vec<Vec<f32>>,
    pub limit: i64,
    pub anns_field: Option<String>,
    pub output_fields: Vec<String>,
}

/// One ranked result. `distance` is the squared L2 distance for `L2`
/// collections and the cosine similarity for `COSINE` ones.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SearchHit {
    pub id: EntityId,
    pub distance: f32,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub fields: Metadata,
}
