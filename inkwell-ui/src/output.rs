use crate::element::GeneratedUiSchema;
use crate::error::{json_type_name, UiError, UiResult};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// What a generator hands back: a UI tree or a code string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GeneratedOutput {
    Ui { ui: GeneratedUiSchema },
    Code { code: String },
}

impl GeneratedOutput {
    pub fn ui(schema: GeneratedUiSchema) -> Self {
        GeneratedOutput::Ui { ui: schema }
    }

    pub fn code(code: impl Into<String>) -> Self {
        GeneratedOutput::Code { code: code.into() }
    }

    /// Reads any of the accepted shapes:
    ///
    /// - `{kind: "ui", ui: {root}}` / `{kind: "code", code}`
    /// - a bare tree `{root}` (treated as `kind: "ui"`)
    /// - route responses `{ui: {root}}` / `{code}`
    pub fn from_value(value: &Value) -> UiResult<Self> {
        let obj = value.as_object().ok_or(UiError::NotAnObject {
            found: json_type_name(value),
        })?;

        match obj.get("kind").and_then(Value::as_str) {
            Some("ui") => {
                let ui = obj.get("ui").ok_or(UiError::MissingField {
                    kind: "ui".to_string(),
                    field: "ui",
                })?;
                Ok(GeneratedOutput::ui(GeneratedUiSchema::from_value(ui)?))
            }
            Some("code") => {
                let code = obj.get("code").and_then(Value::as_str).ok_or(UiError::MissingField {
                    kind: "code".to_string(),
                    field: "code",
                })?;
                Ok(GeneratedOutput::code(code))
            }
            Some(other) => Err(UiError::UnknownKind(other.to_string())),
            None => {
                if obj.contains_key("root") {
                    return Ok(GeneratedOutput::ui(GeneratedUiSchema::from_value(value)?));
                }
                if let Some(code) = obj.get("code").and_then(Value::as_str) {
                    return Ok(GeneratedOutput::code(code));
                }
                if let Some(ui) = obj.get("ui") {
                    return Ok(GeneratedOutput::ui(GeneratedUiSchema::from_value(ui)?));
                }
                Err(UiError::UnrecognizedOutput)
            }
        }
    }

    pub fn from_json_str(s: &str) -> UiResult<Self> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_value(&value)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GeneratedOutput::Ui { .. } => "ui",
            GeneratedOutput::Code { .. } => "code",
        }
    }

    pub fn as_ui(&self) -> Option<&GeneratedUiSchema> {
        match self {
            GeneratedOutput::Ui { ui } => Some(ui),
            GeneratedOutput::Code { .. } => None,
        }
    }

    pub fn as_code(&self) -> Option<&str> {
        match self {
            GeneratedOutput::Code { code } => Some(code),
            GeneratedOutput::Ui { .. } => None,
        }
    }
}

impl<'de> Deserialize<'de> for GeneratedOutput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        GeneratedOutput::from_value(&value).map_err(D::Error::custom)
    }
}
