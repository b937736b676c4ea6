//! MIME content-encoding negotiation for wirebind
//!
//! A fixed-priority chain of content-encoding strategies, used by both
//! pipelines: during reflection a strategy turns a method signature into MIME
//! extensibility elements; during import it turns those elements back into
//! parameter and return transfer descriptors.
//!
//! Parameters and the return value of one method are negotiated
//! independently, and may land on different strategies. Selection is strictly
//! first-match in chain order: XML body, form, text-match, opaque stream.

use serde::{Deserialize, Serialize};
use tracing::debug;

use wirebind_model::ext::{ExtensionCollection, ExtensionElement, ExtensionKind};
use wirebind_model::method::{LogicalMethod, LogicalType};
use wirebind_model::ns;
use wirebind_model::Message;

// ============================================================================
// Schema-type collaborator
// ============================================================================

/// Narrow interface to the external XSD type-mapping machinery: imports a
/// payload type into an XML type mapping under a caller-chosen key and
/// returns the mapped type name.
pub trait SchemaTypeImporter {
    fn import_type(&mut self, key: &str, type_name: &str) -> String;
}

/// Trivial built-in mapping: every type maps to itself. Sufficient for tests
/// and for descriptions whose payload types need no schema work.
#[derive(Debug, Default)]
pub struct IdentitySchemaImporter;

impl SchemaTypeImporter for IdentitySchemaImporter {
    fn import_type(&mut self, _key: &str, type_name: &str) -> String {
        type_name.to_string()
    }
}

// ============================================================================
// Transfer descriptors
// ============================================================================

/// How an imported parameter set is written onto the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterWriter {
    /// Query-string encoding (HTTP GET).
    UrlQuery,
    /// `application/x-www-form-urlencoded` body (HTTP POST).
    FormUrlEncoded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MimeParameter {
    pub name: String,
    pub type_name: String,
}

/// Parameter set selected by one strategy for one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MimeParameterCollection {
    pub parameters: Vec<MimeParameter>,
    pub content_type: Option<String>,
    pub writer: ParameterWriter,
    /// Extension kinds the strategy consumed; the caller marks these handled
    /// on the owning collection.
    pub consumed: Vec<ExtensionKind>,
}

/// How an imported return value is read off the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReturnReader {
    /// No payload (unit return).
    Nop,
    /// Schema-typed XML deserialization.
    Xml,
    /// Raw XML passthrough.
    RawXml,
    /// Pattern scrape of a textual response.
    TextMatch {
        name: String,
        pattern: String,
        group: u32,
    },
    /// Generic stream reader over an opaque byte stream.
    Stream,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MimeReturn {
    pub type_name: String,
    pub reader: ReturnReader,
    pub consumed: Vec<ExtensionKind>,
}

impl MimeReturn {
    /// Return descriptor of an operation with no output payload.
    pub fn unit() -> Self {
        Self {
            type_name: LogicalType::Unit.type_name(),
            reader: ReturnReader::Nop,
            consumed: Vec::new(),
        }
    }
}

// ============================================================================
// Reflection-direction outputs
// ============================================================================

/// Parameter encoding chosen while reflecting a method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectedParameters {
    /// Content type the input payload travels as; `None` for query-string
    /// placement, where the protocol reflector attaches its own marker.
    pub content_type: Option<String>,
}

impl ReflectedParameters {
    pub fn empty() -> Self {
        Self { content_type: None }
    }
}

/// Return encoding chosen while reflecting a method: the extensibility
/// elements to attach to the output message binding plus the mapped type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectedReturn {
    pub elements: Vec<ExtensionElement>,
    pub type_name: String,
}

// ============================================================================
// Import-direction context
// ============================================================================

/// Read-only view of one operation binding handed to import strategies.
pub struct MimeImportContext<'a> {
    pub operation: &'a str,
    pub input_extensions: Option<&'a ExtensionCollection>,
    pub output_extensions: Option<&'a ExtensionCollection>,
    pub input_message: Option<&'a Message>,
    pub output_message: Option<&'a Message>,
}

/// Flat string parameters from an abstract message: one parameter per typed
/// part. Declines when any part references a schema element instead of a
/// plain type.
pub fn import_string_parameters(message: &Message) -> Option<Vec<MimeParameter>> {
    let mut parameters = Vec::with_capacity(message.parts.len());
    for part in &message.parts {
        if part.element.is_some() {
            return None;
        }
        let type_name = part
            .type_name
            .clone()
            .unwrap_or_else(|| LogicalType::String.type_name());
        parameters.push(MimeParameter {
            name: part.name.clone(),
            type_name,
        });
    }
    Some(parameters)
}

// ============================================================================
// Strategy contract
// ============================================================================

/// One content-encoding strategy. Every method is a claim: `None` means the
/// strategy does not apply and the chain advances; no claim is ever an error.
pub trait MimeFormat {
    fn name(&self) -> &'static str;

    fn reflect_parameters(&self, _method: &LogicalMethod) -> Option<ReflectedParameters> {
        None
    }

    fn reflect_return(
        &self,
        _method: &LogicalMethod,
        _schema: &mut dyn SchemaTypeImporter,
    ) -> Option<ReflectedReturn> {
        None
    }

    fn import_parameters(&self, _ctx: &MimeImportContext) -> Option<MimeParameterCollection> {
        None
    }

    fn import_return(
        &self,
        _ctx: &MimeImportContext,
        _schema: &mut dyn SchemaTypeImporter,
    ) -> Option<MimeReturn> {
        None
    }
}

// ============================================================================
// XML body strategy
// ============================================================================

/// Claims return values only. Raw XML node types pass through as `text/xml`;
/// everything else with a payload becomes a schema-typed `mimeXml` framing.
#[derive(Debug, Default)]
pub struct XmlMimeFormat;

impl MimeFormat for XmlMimeFormat {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn reflect_return(
        &self,
        method: &LogicalMethod,
        schema: &mut dyn SchemaTypeImporter,
    ) -> Option<ReflectedReturn> {
        match &method.return_type {
            LogicalType::XmlNode => Some(ReflectedReturn {
                elements: vec![ExtensionElement::MimeContent {
                    part: None,
                    content_type: ns::TEXT_XML.to_string(),
                }],
                type_name: method.return_type.type_name(),
            }),
            LogicalType::String
            | LogicalType::StringArray
            | LogicalType::Scalar(_)
            | LogicalType::Structured(_) => {
                let type_name = schema.import_type(&method.name, &method.return_type.type_name());
                Some(ReflectedReturn {
                    elements: vec![ExtensionElement::MimeXml { part: None }],
                    type_name,
                })
            }
            LogicalType::Unit | LogicalType::Stream => None,
        }
    }

    fn import_return(
        &self,
        ctx: &MimeImportContext,
        schema: &mut dyn SchemaTypeImporter,
    ) -> Option<MimeReturn> {
        let exts = ctx.output_extensions?;
        if exts.find(ExtensionKind::MimeXml).is_some() {
            let type_name = import_xml_return_type(ctx, schema);
            return Some(MimeReturn {
                type_name,
                reader: ReturnReader::Xml,
                consumed: vec![ExtensionKind::MimeXml],
            });
        }
        match &exts.find(ExtensionKind::MimeContent)?.element {
            ExtensionElement::MimeContent { content_type, .. }
                if content_type == ns::TEXT_XML =>
            {
                Some(MimeReturn {
                    type_name: LogicalType::XmlNode.type_name(),
                    reader: ReturnReader::RawXml,
                    consumed: vec![ExtensionKind::MimeContent],
                })
            }
            _ => None,
        }
    }
}

/// Mapped type of a `mimeXml`-framed return: the first output part's schema
/// element or plain type, imported under the operation's key.
fn import_xml_return_type(ctx: &MimeImportContext, schema: &mut dyn SchemaTypeImporter) -> String {
    let part = ctx.output_message.and_then(|m| m.parts.first());
    let source = match part {
        Some(p) => match (&p.element, &p.type_name) {
            (Some(qname), _) => qname.local.clone(),
            (None, Some(type_name)) => type_name.clone(),
            (None, None) => LogicalType::XmlNode.type_name(),
        },
        None => LogicalType::XmlNode.type_name(),
    };
    schema.import_type(ctx.operation, &source)
}

// ============================================================================
// Form strategy
// ============================================================================

/// Claims parameters only, and only when every parameter travels as a flat
/// string. Yields `application/x-www-form-urlencoded` framing.
#[derive(Debug, Default)]
pub struct FormMimeFormat;

impl MimeFormat for FormMimeFormat {
    fn name(&self) -> &'static str {
        "form"
    }

    fn reflect_parameters(&self, method: &LogicalMethod) -> Option<ReflectedParameters> {
        if method.parameters.iter().all(|p| p.ty.is_string_encodable()) {
            Some(ReflectedParameters {
                content_type: Some(ns::FORM_URLENCODED.to_string()),
            })
        } else {
            None
        }
    }

    fn import_parameters(&self, ctx: &MimeImportContext) -> Option<MimeParameterCollection> {
        let exts = ctx.input_extensions?;
        match &exts.find(ExtensionKind::MimeContent)?.element {
            ExtensionElement::MimeContent { content_type, .. }
                if content_type == ns::FORM_URLENCODED => {}
            _ => return None,
        }
        let parameters = match ctx.input_message {
            Some(message) => import_string_parameters(message)?,
            None => Vec::new(),
        };
        Some(MimeParameterCollection {
            parameters,
            content_type: Some(ns::FORM_URLENCODED.to_string()),
            writer: ParameterWriter::FormUrlEncoded,
            consumed: vec![ExtensionKind::MimeContent],
        })
    }
}

// ============================================================================
// Text-match strategy
// ============================================================================

/// Pattern-based scraping of textual responses. Engaged only by explicit
/// declarations: match declarations on the method during reflection, the
/// text-match extension element during import. Without either it declines.
#[derive(Debug, Default)]
pub struct TextMatchFormat;

impl MimeFormat for TextMatchFormat {
    fn name(&self) -> &'static str {
        "text-match"
    }

    fn reflect_return(
        &self,
        method: &LogicalMethod,
        _schema: &mut dyn SchemaTypeImporter,
    ) -> Option<ReflectedReturn> {
        if method.match_declarations.is_empty() {
            return None;
        }
        let elements = method
            .match_declarations
            .iter()
            .map(|decl| ExtensionElement::MimeTextMatch {
                name: decl.name.clone(),
                pattern: decl.pattern.clone(),
                group: decl.group,
            })
            .collect();
        Some(ReflectedReturn {
            elements,
            type_name: LogicalType::String.type_name(),
        })
    }

    fn import_return(
        &self,
        ctx: &MimeImportContext,
        _schema: &mut dyn SchemaTypeImporter,
    ) -> Option<MimeReturn> {
        let exts = ctx.output_extensions?;
        match &exts.find(ExtensionKind::MimeTextMatch)?.element {
            ExtensionElement::MimeTextMatch {
                name,
                pattern,
                group,
            } => Some(MimeReturn {
                type_name: LogicalType::String.type_name(),
                reader: ReturnReader::TextMatch {
                    name: name.clone(),
                    pattern: pattern.clone(),
                    group: *group,
                },
                consumed: vec![ExtensionKind::MimeTextMatch],
            }),
            _ => None,
        }
    }
}

// ============================================================================
// Opaque stream fallback
// ============================================================================

/// Universal fallback for return values. On import it claims only when some
/// other layer already produced output framing (at least one extension
/// element on the output message); an output with no extensibility signal is
/// unsupported, not silently empty.
#[derive(Debug, Default)]
pub struct AnyMimeFormat;

impl MimeFormat for AnyMimeFormat {
    fn name(&self) -> &'static str {
        "any"
    }

    fn reflect_return(
        &self,
        method: &LogicalMethod,
        _schema: &mut dyn SchemaTypeImporter,
    ) -> Option<ReflectedReturn> {
        match method.return_type {
            LogicalType::Stream => Some(ReflectedReturn {
                elements: vec![ExtensionElement::MimeContent {
                    part: None,
                    content_type: ns::OCTET_STREAM.to_string(),
                }],
                type_name: method.return_type.type_name(),
            }),
            _ => None,
        }
    }

    fn import_return(
        &self,
        ctx: &MimeImportContext,
        _schema: &mut dyn SchemaTypeImporter,
    ) -> Option<MimeReturn> {
        let exts = ctx.output_extensions?;
        if exts.is_empty() {
            return None;
        }
        Some(MimeReturn {
            type_name: LogicalType::Stream.type_name(),
            reader: ReturnReader::Stream,
            consumed: Vec::new(),
        })
    }
}

// ============================================================================
// Chain
// ============================================================================

/// The fixed-priority strategy list. Parameters and return are negotiated
/// independently; the first claiming strategy wins each side.
pub struct MimeChain {
    formats: Vec<Box<dyn MimeFormat>>,
}

impl Default for MimeChain {
    fn default() -> Self {
        Self {
            formats: vec![
                Box::new(XmlMimeFormat),
                Box::new(FormMimeFormat),
                Box::new(TextMatchFormat),
                Box::new(AnyMimeFormat),
            ],
        }
    }
}

impl MimeChain {
    /// Chain with a caller-supplied strategy list, in priority order.
    pub fn with_formats(formats: Vec<Box<dyn MimeFormat>>) -> Self {
        Self { formats }
    }

    /// A method with zero parameters is trivially satisfied by an empty
    /// parameter set; otherwise the first claiming strategy wins.
    pub fn reflect_parameters(&self, method: &LogicalMethod) -> Option<ReflectedParameters> {
        if method.parameters.is_empty() {
            return Some(ReflectedParameters::empty());
        }
        for format in &self.formats {
            if let Some(parameters) = format.reflect_parameters(method) {
                debug!(method = %method.name, format = format.name(), "reflected parameters");
                return Some(parameters);
            }
        }
        None
    }

    pub fn reflect_return(
        &self,
        method: &LogicalMethod,
        schema: &mut dyn SchemaTypeImporter,
    ) -> Option<ReflectedReturn> {
        for format in &self.formats {
            if let Some(ret) = format.reflect_return(method, schema) {
                debug!(method = %method.name, format = format.name(), "reflected return");
                return Some(ret);
            }
        }
        None
    }

    pub fn import_parameters(&self, ctx: &MimeImportContext) -> Option<MimeParameterCollection> {
        for format in &self.formats {
            if let Some(parameters) = format.import_parameters(ctx) {
                debug!(operation = ctx.operation, format = format.name(), "imported parameters");
                return Some(parameters);
            }
        }
        None
    }

    pub fn import_return(
        &self,
        ctx: &MimeImportContext,
        schema: &mut dyn SchemaTypeImporter,
    ) -> Option<MimeReturn> {
        for format in &self.formats {
            if let Some(ret) = format.import_return(ctx, schema) {
                debug!(operation = ctx.operation, format = format.name(), "imported return");
                return Some(ret);
            }
        }
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
