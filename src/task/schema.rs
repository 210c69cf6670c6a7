use serde_json::Value;
use std::fmt;

/// Runtime type of a JSON value as named in validation messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Float,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl FieldType {
    /// Classify a JSON value. Numbers written without a fraction or exponent
    /// are integers, so `2` is not a float while `2.0` is.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => FieldType::String,
            Value::Number(n) if n.is_f64() => FieldType::Float,
            Value::Number(_) => FieldType::Integer,
            Value::Bool(_) => FieldType::Boolean,
            Value::Array(_) => FieldType::Array,
            Value::Object(_) => FieldType::Object,
            Value::Null => FieldType::Null,
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        Self::of(value) == self
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Float => "float",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Null => "null",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extra format constraint applied after the type check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    /// Strict `YYYY-MM-DD` calendar date
    CalendarDate,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    /// Assigned by the server; never required from or accepted from clients
    pub server_assigned: bool,
    pub format: Option<FieldFormat>,
}

impl FieldSpec {
    const fn new(name: &'static str, field_type: FieldType, required: bool) -> Self {
        Self {
            name,
            field_type,
            required,
            server_assigned: false,
            format: None,
        }
    }

    const fn server_assigned(mut self) -> Self {
        self.server_assigned = true;
        self
    }

    const fn with_format(mut self, format: FieldFormat) -> Self {
        self.format = Some(format);
        self
    }
}

pub const TASK_ID: &str = "task_id";
pub const USERID: &str = "userid";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Field schema of a task record, in validation order
pub const TASK_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(TASK_ID, FieldType::String, true).server_assigned(),
    FieldSpec::new(USERID, FieldType::String, true),
    FieldSpec::new("date", FieldType::String, true).with_format(FieldFormat::CalendarDate),
    FieldSpec::new("task_name", FieldType::String, true),
    FieldSpec::new("category", FieldType::String, true),
    FieldSpec::new("expected_hours", FieldType::Float, true),
    FieldSpec::new("actual_hours", FieldType::Float, false),
    FieldSpec::new("description", FieldType::String, false),
];

/// Timestamps managed by the server, exempt from the extension-field rule
pub const TIMESTAMP_FIELDS: &[&str] = &[CREATED_AT, UPDATED_AT];

pub fn is_schema_field(key: &str) -> bool {
    TASK_FIELDS.iter().any(|spec| spec.name == key)
}

pub fn is_timestamp_field(key: &str) -> bool {
    TIMESTAMP_FIELDS.contains(&key)
}
