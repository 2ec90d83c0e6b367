//! Validation schema built from the API's discovery document
//!
//! Fetched once per connection, read-only thereafter. Declares, per endpoint
//! path and HTTP method, the primitive type of every known parameter. Unknown
//! parameters pass validation by default so that a stale client schema never
//! blocks server-added parameters; strict mode turns that escape hatch off.

use crate::error::{Error, Result};
use crate::types::{JsonValue, Method, ParamValue};
use std::collections::HashMap;


/// Primitive type declared for a parameter in the discovery document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Boolean,
    Number,
}

impl ParamType {
    /// Parse the wire name; unrecognized types default to string, matching
    /// the discovery document's own default
    fn from_wire(name: &str) -> Self {
        match name {
            "boolean" => ParamType::Boolean,
            "number" | "integer" => ParamType::Number,
            _ => ParamType::String,
        }
    }

    /// Check whether a value satisfies this declared type
    fn accepts(self, value: &ParamValue) -> bool {
        matches!(
            (self, value),
            (ParamType::String, ParamValue::Str(_))
                | (ParamType::Boolean, ParamValue::Bool(_))
                | (ParamType::Number, ParamValue::Int(_) | ParamValue::Float(_))
        )
    }
}

type EndpointParams = HashMap<String, ParamType>;
type MethodMap = HashMap<Method, EndpointParams>;

/// Read-only index of declared parameters, plus the raw discovery document
/// for documentation lookups
#[derive(Debug, Clone)]
pub struct ApiSchema {
    validation: HashMap<String, MethodMap>,
    paths_doc: JsonValue,
    strict: bool,
}

impl ApiSchema {
    /// Build the schema from a YAML discovery document.
    ///
    /// Paths are normalized by stripping `{placeholder}` segments and
    /// trailing slashes, and every path is indexed under a `/platform`
    /// alias as well.
    pub fn from_yaml(doc: &str, strict: bool) -> Result<Self> {
        let parsed: serde_yaml::Value = serde_yaml::from_str(doc)?;
        let as_json: JsonValue = serde_json::to_value(&parsed)?;

        let paths_doc = as_json
            .get("paths")
            .cloned()
            .ok_or_else(|| Error::schema_discovery("discovery document has no 'paths' section"))?;

        let paths = paths_doc
            .as_object()
            .ok_or_else(|| Error::schema_discovery("'paths' section is not a mapping"))?;

        let mut validation: HashMap<String, MethodMap> = HashMap::new();
        for (raw_path, path_data) in paths {
            let path = normalize_path(raw_path);
            let mut methods = MethodMap::new();

            if let Some(method_entries) = path_data.as_object() {
                for (method_name, method_data) in method_entries {
                    let method = match method_name.as_str() {
                        "get" => Method::Get,
                        "post" => Method::Post,
                        _ => continue,
                    };

                    let Some(parameters) =
                        method_data.get("parameters").and_then(JsonValue::as_array)
                    else {
                        continue;
                    };

                    let mut params = EndpointParams::new();
                    for parameter in parameters {
                        let Some(name) = parameter.get("name").and_then(JsonValue::as_str) else {
                            continue;
                        };
                        let declared = parameter
                            .get("type")
                            .and_then(JsonValue::as_str)
                            .unwrap_or("string");
                        params.insert(name.to_string(), ParamType::from_wire(declared));
                    }
                    methods.insert(method, params);
                }
            }

            validation.insert(format!("/platform{path}"), methods.clone());
            validation.insert(path, methods);
        }

        Ok(Self {
            validation,
            paths_doc,
            strict,
        })
    }

    /// Validate one parameter against the declared schema.
    ///
    /// Passes when the declared type accepts the value, or when the
    /// parameter (or endpoint) is unknown and strict mode is off. Fails with
    /// [`Error::Validation`] on a type mismatch.
    pub fn validate(
        &self,
        endpoint: &str,
        method: Method,
        name: &str,
        value: &ParamValue,
    ) -> Result<()> {
        let declared = self
            .validation
            .get(endpoint)
            .and_then(|methods| methods.get(&method))
            .and_then(|params| params.get(name));

        match declared {
            Some(param_type) if param_type.accepts(value) => Ok(()),
            Some(_) => Err(Error::validation(name, value.to_string(), endpoint)),
            None if self.strict => Err(Error::UnknownParameter {
                name: name.to_string(),
                endpoint: endpoint.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Declared type for a parameter, when known
    pub fn declared_type(&self, endpoint: &str, method: Method, name: &str) -> Option<ParamType> {
        self.validation
            .get(endpoint)?
            .get(&method)?
            .get(name)
            .copied()
    }

    /// Raw (un-normalized) endpoint paths from the discovery document
    pub fn endpoints(&self) -> Vec<String> {
        self.paths_doc
            .as_object()
            .map(|paths| paths.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Documentation subtree for one raw endpoint path
    pub fn endpoint_docs(&self, endpoint: &str) -> Result<&JsonValue> {
        self.paths_doc
            .get(endpoint)
            .ok_or_else(|| Error::EndpointNotFound {
                endpoint: endpoint.to_string(),
            })
    }

    /// Whether strict validation is enabled
    pub fn is_strict(&self) -> bool {
        self.strict
    }
}

/// Strip `{placeholder}` segments and trailing slashes from a documented path
fn normalize_path(path: &str) -> String {
    let stripped = path.split('{').next().unwrap_or(path);
    stripped.trim_end_matches('/').to_string()
}
