use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shell::error::{ShellError, ShellResult};
use crate::shell::templates::TemplateRegistry;

/// Endpoint locators the client calls after start-up
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Endpoints {
    /// Camera-model transform fitting endpoint
    pub fit: String,
    /// Camera-model forward projection endpoint
    pub forward: String,
    /// Image enhancement endpoint
    pub enhance: String,
}

impl Endpoints {
    /// Reject locators that would need re-encoding inside a script string.
    pub fn validate(&self) -> ShellResult<()> {
        check_locator("fit", &self.fit)?;
        check_locator("forward", &self.forward)?;
        check_locator("enhance", &self.enhance)?;
        Ok(())
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            fit: "/tiepoint/cameraModelTransformFit/".to_string(),
            forward: "/tiepoint/cameraModelTransformForward/".to_string(),
            enhance: "/tiepoint/enhanceImage/".to_string(),
        }
    }
}

fn check_locator(label: &str, value: &str) -> ShellResult<()> {
    if value.is_empty() {
        return Err(ShellError::InvalidEndpoint(format!("{} endpoint is empty", label)));
    }
    let bad = value.chars().find(|c| {
        matches!(c, '"' | '\\' | '<' | '\u{2028}' | '\u{2029}') || c.is_control()
    });
    if let Some(c) = bad {
        return Err(ShellError::InvalidEndpoint(format!(
            "{} endpoint {:?} contains {:?}",
            label, value, c
        )));
    }
    Ok(())
}

/// Immutable client configuration, built once at start-up and borrowed by
/// every page render.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    settings: Map<String, Value>,
    endpoints: Endpoints,
}

impl ClientConfig {
    /// Build from an already-decoded settings value. The value must be a
    /// JSON object.
    pub fn new(settings: Value, endpoints: Endpoints) -> ShellResult<Self> {
        endpoints.validate()?;
        match settings {
            Value::Object(settings) => Ok(Self { settings, endpoints }),
            other => Err(ShellError::SerializationError(format!(
                "client settings must be a mapping, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Build from any serializable settings type.
    pub fn from_serializable<T: Serialize>(settings: &T, endpoints: Endpoints) -> ShellResult<Self> {
        let value = serde_json::to_value(settings)?;
        Self::new(value, endpoints)
    }

    pub fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// Everything one page render hands to the client. Constructed per request
/// and never mutated after it is passed to the assembler.
#[derive(Debug, Clone)]
pub struct BootstrapPayload<'a> {
    pub config: &'a ClientConfig,
    pub templates: &'a TemplateRegistry,
    /// Seed records for the client overlay collection; `None` starts empty
    pub initial_overlays: Option<Vec<Value>>,
}

impl<'a> BootstrapPayload<'a> {
    pub fn new(config: &'a ClientConfig, templates: &'a TemplateRegistry) -> Self {
        Self {
            config,
            templates,
            initial_overlays: None,
        }
    }

    pub fn with_overlays(mut self, overlays: Vec<Value>) -> Self {
        self.initial_overlays = Some(overlays);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_settings_must_be_mapping() {
        let result = ClientConfig::new(json!([1, 2]), Endpoints::default());
        assert!(matches!(result, Err(ShellError::SerializationError(_))));

        let config = ClientConfig::new(json!({"zoom": 3}), Endpoints::default()).unwrap();
        assert_eq!(config.settings().get("zoom"), Some(&json!(3)));
    }

    #[test]
    fn test_unserializable_settings_fail() {
        let mut settings = HashMap::new();
        settings.insert((1, 2), "tuple keys cannot become JSON object keys");

        let result = ClientConfig::from_serializable(&settings, Endpoints::default());
        assert!(matches!(result, Err(ShellError::SerializationError(_))));
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(Endpoints::default().validate().is_ok());

        let endpoints = Endpoints {
            fit: "/fit/?a=1&b=2".to_string(),
            ..Endpoints::default()
        };
        assert!(endpoints.validate().is_ok());

        let endpoints = Endpoints {
            enhance: "/enhance/\"</script>".to_string(),
            ..Endpoints::default()
        };
        assert!(matches!(endpoints.validate(), Err(ShellError::InvalidEndpoint(_))));

        let endpoints = Endpoints {
            forward: String::new(),
            ..Endpoints::default()
        };
        assert!(matches!(endpoints.validate(), Err(ShellError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_payload_starts_without_overlays() {
        let config = ClientConfig::new(json!({}), Endpoints::default()).unwrap();
        let templates = TemplateRegistry::new();

        let payload = BootstrapPayload::new(&config, &templates);
        assert!(payload.initial_overlays.is_none());

        let payload = payload.with_overlays(vec![json!({"key": 1})]);
        assert_eq!(payload.initial_overlays.as_ref().map(Vec::len), Some(1));
    }
}
