//! Wire-format namespace URIs and literal tokens.
//!
//! These strings are binding discriminants and must match byte-for-byte; none
//! of them is ever normalized or compared case-insensitively.

/// SOAP 1.1 binding/operation/body/header/fault/address elements.
pub const SOAP11_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap/";

/// SOAP 1.2 equivalents of the SOAP 1.1 elements.
pub const SOAP12_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";

/// HTTP verb binding, address and operation elements.
pub const HTTP_NS: &str = "http://schemas.xmlsoap.org/wsdl/http/";

/// Generic MIME content/multipart/XML bindings.
pub const MIME_NS: &str = "http://schemas.xmlsoap.org/wsdl/mime/";

/// Text-match binding elements.
pub const TEXT_MATCHING_NS: &str = "http://microsoft.com/wsdl/mime/textMatching/";

/// Well-known SOAP-over-HTTP transport token.
pub const SOAP_HTTP_TRANSPORT: &str = "http://schemas.xmlsoap.org/soap/http";

/// Encoding-style token SOAP 1.2 bindings must not declare.
pub const SOAP12_ENCODING: &str = "http://www.w3.org/2003/05/soap-encoding";

/// Content type produced and recognized by the form strategy.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Content type recognized by the XML strategy for raw passthrough.
pub const TEXT_XML: &str = "text/xml";

/// Content type used for opaque byte-stream payloads.
pub const OCTET_STREAM: &str = "application/octet-stream";
