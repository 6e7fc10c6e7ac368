//! Static lookup tables for resource and connection types.
//!
//! Single source of truth for display labels, icons, ARM resource types and
//! the placeholder pricing used by the bill of materials.

use serde::Serialize;

use crate::{ConnectionType, ResourceType};

/// ARM type used for resource types without a mapping.
pub const GENERIC_ARM_TYPE: &str = "Microsoft.Resources/deployments";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Icon {
    Globe,
    Database,
    HardDrive,
    Server,
    Webhook,
    Lock,
    Network,
    Workflow,
    Box,
    Cpu,
    BarChart,
    Cloud,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub unit: &'static str,
    pub price: f64,
    /// Assumed monthly consumption, expressed in `unit`s.
    pub monthly_usage: f64,
}

#[derive(Debug, Clone)]
pub struct ResourceSpec {
    pub kind: ResourceType,
    pub label: &'static str,
    pub icon: Icon,
    pub arm_type: &'static str,
    pub pricing: Pricing,
}

const fn pricing(unit: &'static str, price: f64, monthly_usage: f64) -> Pricing {
    Pricing {
        unit,
        price,
        monthly_usage,
    }
}

pub static RESOURCE_SPECS: [ResourceSpec; 18] = [
    ResourceSpec {
        kind: ResourceType::AppService,
        label: "App Service",
        icon: Icon::Globe,
        arm_type: "Microsoft.Web/sites",
        pricing: pricing("per hour", 0.075, 730.0),
    },
    ResourceSpec {
        kind: ResourceType::Function,
        label: "Function App",
        icon: Icon::Globe,
        arm_type: "Microsoft.Web/sites",
        pricing: pricing("per million executions", 0.000016667, 1_000_000.0),
    },
    ResourceSpec {
        kind: ResourceType::SqlDatabase,
        label: "SQL Database",
        icon: Icon::Database,
        arm_type: "Microsoft.Sql/servers/databases",
        pricing: pricing("per hour", 0.25, 730.0),
    },
    ResourceSpec {
        kind: ResourceType::CosmosDb,
        label: "Cosmos DB",
        icon: Icon::Database,
        arm_type: "Microsoft.DocumentDB/databaseAccounts",
        pricing: pricing("per hour", 0.25, 730.0),
    },
    ResourceSpec {
        kind: ResourceType::StorageAccount,
        label: "Storage Account",
        icon: Icon::HardDrive,
        arm_type: "Microsoft.Storage/storageAccounts",
        pricing: pricing("per GB/month", 0.0184, 100.0),
    },
    ResourceSpec {
        kind: ResourceType::VirtualMachine,
        label: "Virtual Machine",
        icon: Icon::Server,
        arm_type: "Microsoft.Compute/virtualMachines",
        pricing: pricing("per hour", 0.077, 730.0),
    },
    ResourceSpec {
        kind: ResourceType::ApiManagement,
        label: "API Management",
        icon: Icon::Webhook,
        arm_type: "Microsoft.ApiManagement/service",
        pricing: pricing("per hour", 0.25, 730.0),
    },
    ResourceSpec {
        kind: ResourceType::KeyVault,
        label: "Key Vault",
        icon: Icon::Lock,
        arm_type: "Microsoft.KeyVault/vaults",
        pricing: pricing("per 10,000 operations", 0.03, 100_000.0),
    },
    ResourceSpec {
        kind: ResourceType::ServiceBus,
        label: "Service Bus",
        icon: Icon::Network,
        arm_type: "Microsoft.ServiceBus/namespaces",
        pricing: pricing("per million operations", 0.05, 1_000_000.0),
    },
    ResourceSpec {
        kind: ResourceType::EventHub,
        label: "Event Hub",
        icon: Icon::Network,
        arm_type: "Microsoft.EventHub/namespaces",
        pricing: pricing("per hour", 0.25, 730.0),
    },
    ResourceSpec {
        kind: ResourceType::LogicApp,
        label: "Logic App",
        icon: Icon::Workflow,
        arm_type: "Microsoft.Logic/workflows",
        pricing: pricing("per execution", 0.0005, 10_000.0),
    },
    ResourceSpec {
        kind: ResourceType::ApplicationGateway,
        label: "Application Gateway",
        icon: Icon::Network,
        arm_type: "Microsoft.Network/applicationGateways",
        pricing: pricing("per hour", 0.025, 730.0),
    },
    ResourceSpec {
        kind: ResourceType::LoadBalancer,
        label: "Load Balancer",
        icon: Icon::Network,
        arm_type: "Microsoft.Network/loadBalancers",
        pricing: pricing("per hour", 0.025, 730.0),
    },
    ResourceSpec {
        kind: ResourceType::ContainerInstance,
        label: "Container Instance",
        icon: Icon::Box,
        arm_type: "Microsoft.ContainerInstance/containerGroups",
        pricing: pricing("per hour", 0.15, 730.0),
    },
    ResourceSpec {
        kind: ResourceType::KubernetesService,
        label: "Kubernetes Service",
        icon: Icon::Box,
        arm_type: "Microsoft.ContainerService/managedClusters",
        pricing: pricing("per hour", 0.10, 730.0),
    },
    ResourceSpec {
        kind: ResourceType::CognitiveServices,
        label: "Cognitive Services",
        icon: Icon::Cpu,
        arm_type: "Microsoft.CognitiveServices/accounts",
        pricing: pricing("per 1000 transactions", 0.50, 10_000.0),
    },
    ResourceSpec {
        kind: ResourceType::ApplicationInsights,
        label: "Application Insights",
        icon: Icon::BarChart,
        arm_type: "Microsoft.Insights/components",
        pricing: pricing("per GB", 2.30, 5.0),
    },
    ResourceSpec {
        kind: ResourceType::FrontDoor,
        label: "Front Door",
        icon: Icon::Webhook,
        arm_type: "Microsoft.Network/frontDoors",
        pricing: pricing("per GB", 0.15, 1000.0),
    },
];

pub fn resource_spec(kind: &ResourceType) -> Option<&'static ResourceSpec> {
    RESOURCE_SPECS.iter().find(|spec| &spec.kind == kind)
}

pub fn arm_resource_type(kind: &ResourceType) -> &'static str {
    resource_spec(kind)
        .map(|spec| spec.arm_type)
        .unwrap_or(GENERIC_ARM_TYPE)
}

pub fn resource_icon(kind: &ResourceType) -> Icon {
    resource_spec(kind).map(|spec| spec.icon).unwrap_or(Icon::Cloud)
}

/// Display label, falling back to the raw key for unknown types.
pub fn resource_label(kind: &ResourceType) -> &str {
    match resource_spec(kind) {
        Some(spec) => spec.label,
        None => kind.as_str(),
    }
}

pub static CONNECTION_LABELS: [(ConnectionType, &str); 5] = [
    (ConnectionType::DataFlow, "Data Flow"),
    (ConnectionType::Dependency, "Dependency"),
    (ConnectionType::Network, "Network Connection"),
    (ConnectionType::Authentication, "Authentication"),
    (ConnectionType::Integration, "Integration"),
];

pub fn connection_label(kind: &ConnectionType) -> &str {
    CONNECTION_LABELS
        .iter()
        .find(|(k, _)| k == kind)
        .map(|(_, label)| *label)
        .unwrap_or_else(|| kind.as_str())
}
