//! Declarative resource graph.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// A set of named resources plus the values reported after deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub resources: BTreeMap<String, Resource>,
    #[serde(default)]
    pub outputs: BTreeMap<String, Output>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: Value,
}

impl Resource {
    pub fn new(kind: &str, properties: Value) -> Self {
        Self {
            kind: kind.to_string(),
            properties,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub value: Value,
}

/// `{"ref": id}`: the resource itself.
pub fn reference(id: &str) -> Value {
    json!({ "ref": id })
}

/// `{"attr": [id, name]}`: an attribute only known after deployment.
pub fn attribute(id: &str, name: &str) -> Value {
    json!({ "attr": [id, name] })
}

impl Template {
    pub fn add_resource(&mut self, id: &str, resource: Resource) {
        self.resources.insert(id.to_string(), resource);
    }

    pub fn add_output(&mut self, name: &str, value: Value) {
        self.outputs.insert(name.to_string(), Output { value });
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Ids of resources of the given kind, sorted.
    pub fn ids_of_kind(&self, kind: &str) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|(_, r)| r.kind == kind)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Every `ref` or `attr` target that names no resource.
    pub fn dangling_references(&self) -> Vec<String> {
        let mut targets = Vec::new();
        for resource in self.resources.values() {
            collect_targets(&resource.properties, &mut targets);
        }
        for output in self.outputs.values() {
            collect_targets(&output.value, &mut targets);
        }
        targets.retain(|id| !self.resources.contains_key(id));
        targets.sort();
        targets.dedup();
        targets
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn collect_targets(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(id)) = map.get("ref") {
                out.push(id.clone());
            }
            if let Some(Value::String(id)) = map.get("attr").and_then(|a| a.get(0)) {
                out.push(id.clone());
            }
            for v in map.values() {
                collect_targets(v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_targets(v, out);
            }
        }
        _ => {}
    }
}
