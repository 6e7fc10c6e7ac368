pub mod bom;
pub mod catalog;
pub mod error;
pub mod settings;
pub mod store;
pub mod template;

use serde::{Deserialize, Serialize};

pub use error::{GraphError, SettingsError};
pub use store::{GraphChange, GraphSnapshot, GraphStore};

// --- Types (matching the generator's wire document) ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Managed-service category of a resource.
///
/// Serialized as the camelCase key used by the generator (`appService`,
/// `sqlDatabase`, ...). Keys outside the known set are kept verbatim in
/// `Unknown` so a generated diagram never fails to load over a type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceType {
    AppService,
    Function,
    SqlDatabase,
    CosmosDb,
    StorageAccount,
    VirtualMachine,
    ApiManagement,
    KeyVault,
    ServiceBus,
    EventHub,
    LogicApp,
    ApplicationGateway,
    LoadBalancer,
    ContainerInstance,
    KubernetesService,
    CognitiveServices,
    ApplicationInsights,
    FrontDoor,
    Unknown(String),
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::AppService => "appService",
            ResourceType::Function => "function",
            ResourceType::SqlDatabase => "sqlDatabase",
            ResourceType::CosmosDb => "cosmosDb",
            ResourceType::StorageAccount => "storageAccount",
            ResourceType::VirtualMachine => "virtualMachine",
            ResourceType::ApiManagement => "apiManagement",
            ResourceType::KeyVault => "keyVault",
            ResourceType::ServiceBus => "serviceBus",
            ResourceType::EventHub => "eventHub",
            ResourceType::LogicApp => "logicApp",
            ResourceType::ApplicationGateway => "applicationGateway",
            ResourceType::LoadBalancer => "loadBalancer",
            ResourceType::ContainerInstance => "containerInstance",
            ResourceType::KubernetesService => "kubernetesService",
            ResourceType::CognitiveServices => "cognitiveServices",
            ResourceType::ApplicationInsights => "applicationInsights",
            ResourceType::FrontDoor => "frontDoor",
            ResourceType::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ResourceType::Unknown(_))
    }
}

impl From<&str> for ResourceType {
    fn from(key: &str) -> Self {
        match key {
            "appService" => ResourceType::AppService,
            "function" => ResourceType::Function,
            "sqlDatabase" => ResourceType::SqlDatabase,
            "cosmosDb" => ResourceType::CosmosDb,
            "storageAccount" => ResourceType::StorageAccount,
            "virtualMachine" => ResourceType::VirtualMachine,
            "apiManagement" => ResourceType::ApiManagement,
            "keyVault" => ResourceType::KeyVault,
            "serviceBus" => ResourceType::ServiceBus,
            "eventHub" => ResourceType::EventHub,
            "logicApp" => ResourceType::LogicApp,
            "applicationGateway" => ResourceType::ApplicationGateway,
            "loadBalancer" => ResourceType::LoadBalancer,
            "containerInstance" => ResourceType::ContainerInstance,
            "kubernetesService" => ResourceType::KubernetesService,
            "cognitiveServices" => ResourceType::CognitiveServices,
            "applicationInsights" => ResourceType::ApplicationInsights,
            "frontDoor" => ResourceType::FrontDoor,
            other => ResourceType::Unknown(other.to_string()),
        }
    }
}

impl From<String> for ResourceType {
    fn from(key: String) -> Self {
        ResourceType::from(key.as_str())
    }
}

impl From<ResourceType> for String {
    fn from(kind: ResourceType) -> Self {
        match kind {
            ResourceType::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of relationship an edge represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectionType {
    DataFlow,
    Dependency,
    Network,
    Authentication,
    Integration,
    Unknown(String),
}

impl ConnectionType {
    pub fn as_str(&self) -> &str {
        match self {
            ConnectionType::DataFlow => "dataFlow",
            ConnectionType::Dependency => "dependency",
            ConnectionType::Network => "network",
            ConnectionType::Authentication => "authentication",
            ConnectionType::Integration => "integration",
            ConnectionType::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for ConnectionType {
    fn from(key: &str) -> Self {
        match key {
            "dataFlow" => ConnectionType::DataFlow,
            "dependency" => ConnectionType::Dependency,
            "network" => ConnectionType::Network,
            "authentication" => ConnectionType::Authentication,
            "integration" => ConnectionType::Integration,
            other => ConnectionType::Unknown(other.to_string()),
        }
    }
}

impl From<String> for ConnectionType {
    fn from(key: String) -> Self {
        ConnectionType::from(key.as_str())
    }
}

impl From<ConnectionType> for String {
    fn from(kind: ConnectionType) -> Self {
        match kind {
            ConnectionType::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the diagram: one managed cloud service instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// Caller-supplied fields of a resource; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl ResourceDraft {
    pub fn new(name: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            name: name.into(),
            resource_type,
            description: None,
            position: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A typed directed edge between two resources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Connection {
    pub fn touches(&self, resource_id: &str) -> bool {
        self.source == resource_id || self.target == resource_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDraft {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ConnectionDraft {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        connection_type: ConnectionType,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            connection_type,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

// --- Ids ---

pub const RESOURCE_ID_PREFIX: &str = "resource-";
pub const CONNECTION_ID_PREFIX: &str = "connection-";

/// Numeric suffix of an id shaped `{prefix}{N}`.
pub fn id_suffix(id: &str, prefix: &str) -> Option<u64> {
    id.strip_prefix(prefix).and_then(|s| s.parse::<u64>().ok())
}

/// Highest `{prefix}{N}` suffix among the given ids, 0 when none match.
pub fn max_id_suffix<'a>(ids: impl IntoIterator<Item = &'a str>, prefix: &str) -> u64 {
    ids.into_iter()
        .filter_map(|id| id_suffix(id, prefix))
        .max()
        .unwrap_or(0)
}
