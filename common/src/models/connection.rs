//! Connection inventory models.
//!
//! Contains the search request sent to the provider and the records it returns.

use serde::{Deserialize, Serialize};

/// Page size of the connection search. Only the first page is read.
pub const SEARCH_PAGE_LIMIT: u32 = 100;

/// Provisioning state of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    /// Connection is provisioned and carrying traffic.
    Active,
    Provisioning,
    Pending,
    Deprovisioning,
    Deprovisioned,
    Failed,
    /// Any state this collector does not know about.
    #[serde(other)]
    Other,
}

/// Connection inventory record as returned by the search API.
///
/// Every field is optional on the wire; records missing an id or a name are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Connection identifier.
    #[serde(rename = "uuid", default)]
    pub id: Option<String>,
    /// Connection display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Provisioning state.
    #[serde(default)]
    pub state: Option<ConnectionState>,
}

impl ConnectionRecord {
    /// Returns true if the provider reports the connection as ACTIVE.
    pub fn is_active(&self) -> bool {
        self.state == Some(ConnectionState::Active)
    }
}

/// Response body of `POST /fabric/v4/connections/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionSearchResponse {
    #[serde(default)]
    pub data: Vec<ConnectionRecord>,
}

/// Request body of `POST /fabric/v4/connections/search`.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionSearchRequest {
    pub filter: SearchFilter,
    pub pagination: SearchPagination,
    pub sort: Vec<SearchSort>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchFilter {
    pub and: Vec<SearchExpression>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchExpression {
    pub property: String,
    pub operator: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPagination {
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchSort {
    pub property: String,
    pub direction: String,
}

impl ConnectionSearchRequest {
    /// OUTGOING and INTERNAL connections, most recently updated first, first page only.
    pub fn outgoing_and_internal() -> Self {
        Self {
            filter: SearchFilter {
                and: vec![SearchExpression {
                    property: "/direction".to_string(),
                    operator: "=".to_string(),
                    values: vec!["OUTGOING".to_string(), "INTERNAL".to_string()],
                }],
            },
            pagination: SearchPagination {
                limit: SEARCH_PAGE_LIMIT,
                offset: 0,
            },
            sort: vec![SearchSort {
                property: "/changeLog/updatedDateTime".to_string(),
                direction: "DESC".to_string(),
            }],
        }
    }
}
