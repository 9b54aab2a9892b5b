//! Template merge
//!
//! Loads a Clash/Mihomo template, replaces its `proxies` with the converted
//! entries and rewrites the member lists of its `proxy-groups`.

use std::path::Path;

use log::{debug, info};
use serde_yaml::{Mapping, Value};

use crate::generator::yaml::clash::ClashProxy;
use crate::interfaces::{ConvertError, ResourceKind};
use crate::models::ProxyEntry;
use crate::utils::file::{file_get, file_write_atomic};
use crate::utils::yaml::YamlNode;

/// A loaded configuration template.
#[derive(Debug, Clone)]
pub struct Template {
    node: YamlNode,
}

impl Template {
    /// Wraps an already parsed document; the root must be a mapping.
    pub fn from_node(node: YamlNode) -> Result<Self, ConvertError> {
        match &node.value {
            Value::Mapping(_) => Ok(Template { node }),
            Value::Null => Ok(Template {
                node: YamlNode {
                    value: Value::Mapping(Mapping::new()),
                },
            }),
            _ => Err(ConvertError::TemplateShape(
                "top level must be a mapping".to_string(),
            )),
        }
    }

    /// Loads a template, as JSON when the path ends in `.json` and as YAML
    /// otherwise.
    pub fn load(path: &str) -> Result<Self, ConvertError> {
        let content = file_get(path).map_err(|e| ConvertError::from_read(ResourceKind::Template, path, e))?;

        let is_json = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));

        let node = if is_json {
            YamlNode::from_json_str(&content).map_err(|e| ConvertError::TemplateParse {
                path: path.to_string(),
                reason: e.to_string(),
            })?
        } else {
            YamlNode::from_yaml_str(&content).map_err(|e| ConvertError::TemplateParse {
                path: path.to_string(),
                reason: e.to_string(),
            })?
        };

        debug!("Loaded template {}", path);
        Self::from_node(node)
    }

    pub fn node(&self) -> &YamlNode {
        &self.node
    }

    /// Number of entries under `proxy-groups`.
    pub fn group_count(&self) -> usize {
        match self.node.get_value("proxy-groups") {
            Some(Value::Sequence(groups)) => groups.len(),
            _ => 0,
        }
    }

    /// Replaces `proxies` with `entries` and refreshes every group member list.
    ///
    /// Members starting with `placeholder_prefix` are dropped, the rest are
    /// kept in place and followed by the names of all entries. Returns the
    /// number of groups that were rewritten.
    pub fn merge_proxies(
        &mut self,
        entries: &[ProxyEntry],
        placeholder_prefix: &str,
    ) -> Result<usize, ConvertError> {
        let clash_proxies: Vec<ClashProxy> = entries.iter().map(ClashProxy::from).collect();
        let names: Vec<Value> = clash_proxies
            .iter()
            .map(|proxy| Value::String(proxy.common().name.clone()))
            .collect();

        let proxies = clash_proxies
            .iter()
            .map(serde_yaml::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        if !self.node.set_value("proxies", Value::Sequence(proxies)) {
            return Err(ConvertError::TemplateShape(
                "top level must be a mapping".to_string(),
            ));
        }

        let groups = match self.node.get_value_mut("proxy-groups") {
            Some(Value::Sequence(groups)) => groups,
            Some(Value::Null) | None => return Ok(0),
            Some(_) => {
                return Err(ConvertError::TemplateShape(
                    "proxy-groups must be a list".to_string(),
                ))
            }
        };

        let mut updated = 0;
        for group in groups.iter_mut() {
            let members = match group.get_mut("proxies") {
                Some(Value::Sequence(members)) => members,
                _ => continue,
            };
            members.retain(|member| {
                member
                    .as_str()
                    .map_or(true, |name| !name.starts_with(placeholder_prefix))
            });
            members.extend(names.iter().cloned());
            updated += 1;

            if let Some(name) = group.get("name").and_then(Value::as_str) {
                debug!("Updated proxy group {}", name);
            }
        }

        info!(
            "Merged {} proxies into {} proxy groups",
            entries.len(),
            updated
        );
        Ok(updated)
    }

    /// Serializes the document and writes it to `path` in one step.
    pub fn write(&self, path: &str) -> Result<(), ConvertError> {
        let content = self.node.to_yaml_string()?;
        file_write_atomic(path, content.as_bytes()).map_err(|source| ConvertError::Write {
            path: path.to_string(),
            source,
        })?;
        info!("Configuration written to {}", path);
        Ok(())
    }
}
