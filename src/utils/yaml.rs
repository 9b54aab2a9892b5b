use serde_yaml::{self, Mapping, Value};

/// Wrapper around serde_yaml::Value for easier manipulation
#[derive(Debug, Clone, PartialEq)]
pub struct YamlNode {
    pub value: Value,
}

impl YamlNode {
    /// Create a new empty YAML node
    pub fn new() -> Self {
        YamlNode { value: Value::Null }
    }

    /// Create a YamlNode from a YAML string
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        let value = serde_yaml::from_str(content)?;
        Ok(YamlNode { value })
    }

    /// Create a YamlNode from a JSON string, keeping key order
    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        let value = serde_json::from_str(content)?;
        Ok(YamlNode { value })
    }

    /// Convert the YAML node to a string
    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.value)
    }

    /// Get a value from a dot separated path
    pub fn get_value(&self, path: &str) -> Option<&Value> {
        let mut current = &self.value;

        for part in path.split('.').filter(|p| !p.is_empty()) {
            current = match current {
                Value::Mapping(map) => map.get(part)?,
                Value::Sequence(seq) => seq.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        Some(current)
    }

    /// Mutable counterpart of [`YamlNode::get_value`]
    pub fn get_value_mut(&mut self, path: &str) -> Option<&mut Value> {
        let mut current = &mut self.value;

        for part in path.split('.').filter(|p| !p.is_empty()) {
            current = match current {
                Value::Mapping(map) => map.get_mut(part)?,
                Value::Sequence(seq) => seq.get_mut(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        Some(current)
    }

    /// Set a top-level key, keeping its position if it already exists
    ///
    /// A null root is turned into an empty mapping first. Returns `false`
    /// when the root is some other non-mapping value.
    pub fn set_value(&mut self, key: &str, value: Value) -> bool {
        if self.value.is_null() {
            self.value = Value::Mapping(Mapping::new());
        }
        match &mut self.value {
            Value::Mapping(map) => {
                map.insert(Value::String(key.to_string()), value);
                true
            }
            _ => false,
        }
    }
}

impl Default for YamlNode {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_value_paths() {
        let node = YamlNode::from_yaml_str("a:\n  b:\n    - x\n    - y\n").unwrap();
        assert_eq!(node.get_value("a.b.1"), Some(&Value::String("y".to_string())));
        assert_eq!(node.get_value("a.c"), None);
        assert_eq!(node.get_value("a.b.z"), None);
    }

    #[test]
    fn test_set_value_keeps_position() {
        let mut node = YamlNode::from_json_str(r#"{"port":7890,"proxies":[],"rules":[]}"#).unwrap();
        assert!(node.set_value("proxies", Value::Sequence(vec![Value::String("x".to_string())])));

        let out = node.to_yaml_string().unwrap();
        let port = out.find("port").unwrap();
        let proxies = out.find("proxies").unwrap();
        let rules = out.find("rules").unwrap();
        assert!(port < proxies && proxies < rules);
    }

    #[test]
    fn test_set_value_on_scalar_root() {
        let mut node = YamlNode::from_yaml_str("just text").unwrap();
        assert!(!node.set_value("proxies", Value::Null));

        let mut empty = YamlNode::new();
        assert!(empty.set_value("proxies", Value::Null));
    }
}
