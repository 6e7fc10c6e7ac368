//! ARM deployment template derived from the current resources.

use serde::{Deserialize, Serialize};

use crate::catalog::arm_resource_type;
use crate::Resource;

pub const ARM_SCHEMA: &str =
    "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#";
pub const CONTENT_VERSION: &str = "1.0.0.0";
pub const API_VERSION: &str = "2021-02-01";
pub const RESOURCE_GROUP_LOCATION: &str = "[resourceGroup().location]";
/// File name the exported template is written under.
pub const EXPORT_FILE_NAME: &str = "azure-deployment.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArmTemplate {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub content_version: String,
    pub resources: Vec<ArmResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArmResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub api_version: String,
    pub name: String,
    pub location: String,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl ArmTemplate {
    pub fn from_resources(resources: &[Resource]) -> Self {
        Self {
            schema: ARM_SCHEMA.to_string(),
            content_version: CONTENT_VERSION.to_string(),
            resources: resources
                .iter()
                .map(|r| ArmResource {
                    resource_type: arm_resource_type(&r.resource_type).to_string(),
                    api_version: API_VERSION.to_string(),
                    name: r.name.clone(),
                    location: RESOURCE_GROUP_LOCATION.to_string(),
                    properties: serde_json::Map::new(),
                })
                .collect(),
        }
    }

    /// Two-space indented JSON, the form written to `azure-deployment.json`.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceType;

    fn resource(name: &str, kind: ResourceType) -> Resource {
        Resource {
            id: format!("resource-{name}"),
            name: name.to_string(),
            resource_type: kind,
            description: None,
            position: None,
        }
    }

    #[test]
    fn template_has_fixed_envelope_and_mapped_types() {
        let template = ArmTemplate::from_resources(&[
            resource("web", ResourceType::AppService),
            resource("legacy", ResourceType::from("web-app")),
        ]);
        let value: serde_json::Value =
            serde_json::from_str(&template.to_json_pretty().unwrap()).unwrap();

        assert_eq!(value["$schema"], ARM_SCHEMA);
        assert_eq!(value["contentVersion"], "1.0.0.0");
        assert_eq!(value["resources"][0]["type"], "Microsoft.Web/sites");
        assert_eq!(value["resources"][0]["apiVersion"], "2021-02-01");
        assert_eq!(value["resources"][0]["location"], "[resourceGroup().location]");
        assert_eq!(value["resources"][0]["properties"], serde_json::json!({}));
        assert_eq!(value["resources"][1]["type"], "Microsoft.Resources/deployments");
        assert_eq!(value["resources"][1]["name"], "legacy");
    }

    #[test]
    fn pretty_output_uses_two_space_indent() {
        let json = ArmTemplate::from_resources(&[]).to_json_pretty().unwrap();
        assert!(json.starts_with("{\n  \"$schema\""));
    }
}
