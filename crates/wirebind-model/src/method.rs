//! Logical method model: the read-only input to the reflection pass.

use serde::{Deserialize, Serialize};

use crate::desc::QName;

/// Payload type of a parameter or return value, as seen by the binding
/// machinery. Deliberately coarse: strategies only need to know how a value
/// can travel on the wire, not what it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalType {
    Unit,
    String,
    StringArray,
    /// Primitive with a lossless string form (numbers, booleans, dates).
    Scalar(String),
    /// Raw XML passthrough.
    XmlNode,
    /// Opaque byte stream.
    Stream,
    /// Schema-described composite, named by its source type.
    Structured(String),
}

impl LogicalType {
    /// Whether a value of this type is representable as a flat string on the
    /// wire (query string, form field).
    pub fn is_string_encodable(&self) -> bool {
        matches!(
            self,
            LogicalType::String | LogicalType::StringArray | LogicalType::Scalar(_)
        )
    }

    /// Type name used in generated-code shapes.
    pub fn type_name(&self) -> String {
        match self {
            LogicalType::Unit => "()".to_string(),
            LogicalType::String => "String".to_string(),
            LogicalType::StringArray => "Vec<String>".to_string(),
            LogicalType::Scalar(name) => name.clone(),
            LogicalType::XmlNode => "XmlElement".to_string(),
            LogicalType::Stream => "ByteStream".to_string(),
            LogicalType::Structured(name) => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalParameter {
    pub name: String,
    pub ty: LogicalType,
}

impl LogicalParameter {
    pub fn new(name: impl Into<String>, ty: LogicalType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Explicit text-match declaration on a method, the only signal that engages
/// the text-match strategy during reflection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDeclaration {
    pub name: String,
    pub pattern: String,
    pub group: u32,
}

/// One exposed method of a service, in declaration order within
/// [`LogicalService`]. Read-only input to the reflector chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalMethod {
    pub name: String,
    pub parameters: Vec<LogicalParameter>,
    pub return_type: LogicalType,
    /// One-way methods produce no output message binding.
    pub one_way: bool,
    /// Overrides the default `{namespace}/{method}` SOAPAction.
    pub soap_action: Option<String>,
    /// Overrides the default request root element (local = method name,
    /// namespace = service namespace).
    pub request_element: Option<QName>,
    pub match_declarations: Vec<MatchDeclaration>,
}

impl LogicalMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: LogicalType::Unit,
            one_way: false,
            soap_action: None,
            request_element: None,
            match_declarations: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, ty: LogicalType) -> Self {
        self.parameters.push(LogicalParameter::new(name, ty));
        self
    }

    pub fn returning(mut self, ty: LogicalType) -> Self {
        self.return_type = ty;
        self
    }
}

/// A service to reflect: a name, a target namespace and its methods in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalService {
    pub name: String,
    pub namespace: String,
    pub methods: Vec<LogicalMethod>,
}

impl LogicalService {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            methods: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: LogicalMethod) -> Self {
        self.methods.push(method);
        self
    }
}
