//! Bill of materials: placeholder monthly cost per resource.

use serde::Serialize;

use crate::catalog::{resource_label, resource_spec};
use crate::{Resource, ResourceType};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BomLine {
    pub resource_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub type_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub unit: &'static str,
    pub price_per_unit: f64,
    /// Rounded to cents.
    pub monthly_cost: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BillOfMaterials {
    pub lines: Vec<BomLine>,
    pub total_monthly_cost: f64,
}

impl BillOfMaterials {
    pub fn from_resources(resources: &[Resource]) -> Self {
        let lines: Vec<BomLine> = resources.iter().map(line_for).collect();
        let total = lines.iter().map(|l| l.monthly_cost).sum::<f64>();
        Self {
            lines,
            total_monthly_cost: round_cents(total),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn line_for(resource: &Resource) -> BomLine {
    let spec = resource_spec(&resource.resource_type);
    let (unit, price, cost) = match spec {
        Some(spec) => {
            let p = &spec.pricing;
            (p.unit, p.price, round_cents(p.monthly_usage * p.price))
        }
        None => ("N/A", 0.0, 0.0),
    };
    BomLine {
        resource_id: resource.id.clone(),
        name: resource.name.clone(),
        resource_type: resource.resource_type.clone(),
        type_label: resource_label(&resource.resource_type).to_string(),
        description: resource.description.clone(),
        unit,
        price_per_unit: price,
        monthly_cost: cost,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
