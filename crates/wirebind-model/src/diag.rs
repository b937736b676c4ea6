//! Warning-tier diagnostics shared by both passes.
//!
//! Warnings are the middle failure tier: a recorded, human-readable message
//! naming the offending value. They never abort a pass; the affected binding
//! or operation is simply excluded from the protocol's results.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningCode {
    /// A SOAP binding declared a transport URI no transport importer resolves.
    UnsupportedTransport,
    /// A SOAP 1.2 binding declared an encoding style the version rejects.
    UnsupportedEncoding,
    /// Two SOAP 1.1 operations share a SOAPAction; dispatch on action would
    /// be ambiguous even though their request elements differ.
    AmbiguousSoapAction,
    /// An operation was excluded from a protocol's results.
    UnsupportedOperation,
    /// An extension entry with `required` set was left unhandled by the
    /// winning importer.
    RequiredExtensionIgnored,
    /// An optional extension entry was left unhandled.
    OptionalExtensionIgnored,
    /// A binding was claimed but none of its operations imported.
    NoMethodsImported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub code: WarningCode,
    pub message: String,
}

impl Warning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}
