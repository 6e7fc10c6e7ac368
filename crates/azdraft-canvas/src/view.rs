//! Plain node/edge records handed to the rendering surface.

use azdraft_core::catalog::{resource_icon, Icon};
use azdraft_core::{Connection, ConnectionType, Position, Resource, ResourceType};
use serde::Serialize;

pub const NODE_TYPE: &str = "azureResource";
pub const EDGE_TYPE: &str = "smoothstep";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub icon: Icon,
    pub animate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub position: Position,
    pub data: NodeData,
}

impl NodeView {
    pub fn new(resource: &Resource, position: Position) -> Self {
        Self {
            id: resource.id.clone(),
            node_type: NODE_TYPE,
            position,
            data: NodeData {
                name: resource.name.clone(),
                resource_type: resource.resource_type.clone(),
                description: resource.description.clone(),
                icon: resource_icon(&resource.resource_type),
                animate: true,
            },
        }
    }

    /// Refresh the displayed fields from `resource`, keeping position and
    /// animation state.
    pub fn sync_from(&mut self, resource: &Resource) {
        self.data.name = resource.name.clone();
        self.data.resource_type = resource.resource_type.clone();
        self.data.description = resource.description.clone();
        self.data.icon = resource_icon(&resource.resource_type);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke: &'static str,
    pub opacity: f64,
    pub fade_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeView {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub edge_type: &'static str,
    pub animated: bool,
    pub style: EdgeStyle,
}

impl EdgeView {
    /// Edge for the connection at `index` in connection order. Starts
    /// transparent and fades in after `index * stagger_ms`.
    pub fn new(connection: &Connection, index: usize, stagger_ms: u64) -> Self {
        Self {
            id: connection.id.clone(),
            source: connection.source.clone(),
            target: connection.target.clone(),
            label: connection.label.clone(),
            edge_type: EDGE_TYPE,
            animated: connection.connection_type == ConnectionType::DataFlow,
            style: EdgeStyle {
                stroke: edge_color(&connection.connection_type),
                opacity: 0.0,
                fade_delay_ms: index as u64 * stagger_ms,
            },
        }
    }

    /// Restyle for `connection`, which kept this edge's id. Opacity and the
    /// fade delay are left to the next reveal.
    pub fn sync_from(&mut self, connection: &Connection) -> bool {
        let before = self.clone();
        self.source = connection.source.clone();
        self.target = connection.target.clone();
        self.label = connection.label.clone();
        self.animated = connection.connection_type == ConnectionType::DataFlow;
        self.style.stroke = edge_color(&connection.connection_type);
        *self != before
    }
}

pub fn edge_color(kind: &ConnectionType) -> &'static str {
    match kind {
        ConnectionType::DataFlow => "#0078d4",
        ConnectionType::Dependency => "#107c10",
        ConnectionType::Network => "#d83b01",
        ConnectionType::Authentication => "#5c2d91",
        ConnectionType::Integration => "#ff8c00",
        ConnectionType::Unknown(_) => "#666666",
    }
}
