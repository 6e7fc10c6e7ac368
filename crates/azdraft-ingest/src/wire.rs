//! Shape of the document the generator streams.
//!
//! Every level is optional because the document is consumed while it is still
//! being written. Entries are read leniently and converted into core types.

use azdraft_core::{Connection, Position, Resource, CONNECTION_ID_PREFIX, RESOURCE_ID_PREFIX};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WireDocument {
    /// Prose explanation of the architecture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<WireArchitecture>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WireArchitecture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<WireResource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<WireConnection>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WirePosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WireResource {
    /// Defaults to `resource-<index+1>` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    /// camelCase resource type key, e.g. "appService" or "keyVault".
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<WirePosition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WireConnection {
    /// Defaults to `connection-<index+1>` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    /// dataFlow | dependency | network | authentication | integration
    #[serde(rename = "type")]
    pub connection_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl WireResource {
    pub fn into_resource(self, index: usize) -> Resource {
        Resource {
            id: self
                .id
                .unwrap_or_else(|| format!("{}{}", RESOURCE_ID_PREFIX, index + 1)),
            name: self.name,
            resource_type: self.resource_type.into(),
            description: self.description,
            position: self.position.map(|p| Position::new(p.x, p.y)),
        }
    }
}

impl WireConnection {
    pub fn into_connection(self, index: usize) -> Connection {
        Connection {
            id: self
                .id
                .unwrap_or_else(|| format!("{}{}", CONNECTION_ID_PREFIX, index + 1)),
            source: self.source,
            target: self.target,
            connection_type: self.connection_type.into(),
            label: self.label,
        }
    }
}

/// JSON Schema of the streamed document, for generator-side validation.
pub fn document_schema() -> serde_json::Value {
    schemars::schema_for!(WireDocument).to_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use azdraft_core::{ConnectionType, ResourceType};

    #[test]
    fn missing_ids_are_numbered_by_position() {
        let wire: WireResource =
            serde_json::from_str(r#"{"name":"db","type":"cosmosDb"}"#).unwrap();
        let resource = wire.into_resource(2);
        assert_eq!(resource.id, "resource-3");
        assert_eq!(resource.resource_type, ResourceType::CosmosDb);

        let wire: WireConnection = serde_json::from_str(
            r#"{"source":"resource-1","target":"resource-3","type":"dataFlow","label":"HTTP"}"#,
        )
        .unwrap();
        let connection = wire.into_connection(0);
        assert_eq!(connection.id, "connection-1");
        assert_eq!(connection.connection_type, ConnectionType::DataFlow);
        assert_eq!(connection.label.as_deref(), Some("HTTP"));
    }

    #[test]
    fn schema_describes_architecture_arrays() {
        let schema = document_schema();
        let text = schema.to_string();
        assert!(text.contains("architecture"));
        assert!(text.contains("WireResource"));
        assert!(text.contains("WireConnection"));
    }
}
