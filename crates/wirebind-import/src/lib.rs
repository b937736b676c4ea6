//! Protocol importer chain for wirebind
//!
//! The import pass is the inverse of reflection: given a description tree
//! produced elsewhere, decide per binding which protocol applies and derive
//! the generated-code shape (base type, constructor statements, method
//! shapes) needed to invoke or implement the service.
//!
//! Strategies are tried in fixed priority order — HTTP GET, HTTP POST,
//! SOAP 1.1, SOAP 1.2 — unless the caller supplies their own chain. At most
//! one strategy wins a binding. A declined binding is normal; a binding no
//! strategy claims is a fatal error for that binding only, and sibling
//! bindings continue to import.

pub mod codegen;
pub mod http;
pub mod soap;
pub mod transport;

pub use codegen::{BaseType, ClassKind, ClassShape, CtorStatement, MethodShape};
pub use http::HttpImporter;
pub use soap::SoapImporter;
pub use transport::{HttpTransport, TransportImporter, TransportResolver};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use wirebind_model::ext::ExtensionCollection;
use wirebind_model::{BindingId, PortId, ServiceDescription, Warning, WarningCode};

// ============================================================================
// Options and context
// ============================================================================

/// Whether generated code targets a calling client, a serving implementation,
/// or a server-side interface only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImportStyle {
    #[default]
    Client,
    Server,
    ServerInterface,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportOptions {
    pub style: ImportStyle,
}

/// Transient per-pass cursor threaded through the importer chain. Created per
/// pass, discarded at pass end.
pub struct ImportContext {
    pub style: ImportStyle,
    /// Port referencing the binding currently being imported, when one exists.
    pub port: Option<PortId>,
    pub warnings: Vec<Warning>,
}

impl ImportContext {
    pub fn new(style: ImportStyle) -> Self {
        Self {
            style,
            port: None,
            warnings: Vec::new(),
        }
    }

    /// Records a warning-tier diagnostic and emits it as a tracing event.
    pub fn warn(&mut self, code: WarningCode, message: impl Into<String>) {
        let warning = Warning::new(code, message);
        warn!(code = ?warning.code, "{}", warning.message);
        self.warnings.push(warning);
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Fatal import failures. Each aborts only the binding it names; the caller
/// decides whether to continue with sibling bindings (the engine does).
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("no protocol importer supports binding '{binding}'")]
    NoSupportedProtocol { binding: String },
    #[error("operation binding '{operation}' in binding '{binding}' has no {element} element")]
    MissingOperationElement {
        binding: String,
        operation: String,
        element: String,
    },
    #[error("operation binding '{operation}' in binding '{binding}' is invalid: {reason}")]
    InvalidOperationBinding {
        binding: String,
        operation: String,
        reason: String,
    },
}

// ============================================================================
// Strategy contract
// ============================================================================

pub trait ProtocolImporter {
    fn protocol_name(&self) -> &'static str;

    /// Whether this strategy claims the binding. `false` is the expected
    /// non-match outcome; degraded conditions (unsupported transport,
    /// disallowed encoding) record a warning on `ctx` and also return false.
    fn is_binding_supported(
        &self,
        desc: &ServiceDescription,
        binding: BindingId,
        ctx: &mut ImportContext,
    ) -> bool;

    /// Base type for the given style. Pure and side-effect-free.
    fn base_class(&self, style: ImportStyle) -> BaseType;

    /// Derives the class shape for a binding this strategy already claimed.
    fn import_class(
        &mut self,
        desc: &mut ServiceDescription,
        binding: BindingId,
        ctx: &mut ImportContext,
    ) -> Result<ClassShape, ImportError>;
}

// ============================================================================
// Engine
// ============================================================================

/// Result of one imported binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedBinding {
    pub binding: String,
    pub protocol: String,
    pub class: ClassShape,
}

/// Result of one import pass over a description tree.
#[derive(Debug, Default)]
pub struct ImportOutput {
    pub classes: Vec<ImportedBinding>,
    pub warnings: Vec<Warning>,
    pub errors: Vec<ImportError>,
}

/// Runs the importer chain over every binding of a description tree.
pub struct ServiceImporter {
    style: ImportStyle,
    importers: Vec<Box<dyn ProtocolImporter>>,
}

impl ServiceImporter {
    /// Importer with the default strategy order: HTTP GET, HTTP POST,
    /// SOAP 1.1, SOAP 1.2.
    pub fn new(options: ImportOptions) -> Self {
        Self::with_importers(
            options,
            vec![
                Box::new(HttpImporter::get()),
                Box::new(HttpImporter::post()),
                Box::new(SoapImporter::v1_1()),
                Box::new(SoapImporter::v1_2()),
            ],
        )
    }

    /// Importer with a caller-supplied strategy chain, tried in the given
    /// order.
    pub fn with_importers(
        options: ImportOptions,
        importers: Vec<Box<dyn ProtocolImporter>>,
    ) -> Self {
        Self {
            style: options.style,
            importers,
        }
    }

    pub fn import(&mut self, desc: &mut ServiceDescription) -> ImportOutput {
        let mut output = ImportOutput::default();
        let mut ctx = ImportContext::new(self.style);

        let bindings: Vec<BindingId> = desc.bindings().map(|(id, _)| id).collect();
        for binding in bindings {
            ctx.port = desc.port_for_binding(binding);
            let winner = self
                .importers
                .iter_mut()
                .find(|imp| imp.is_binding_supported(desc, binding, &mut ctx));
            let Some(importer) = winner else {
                output.errors.push(ImportError::NoSupportedProtocol {
                    binding: desc.binding(binding).name.clone(),
                });
                continue;
            };
            let protocol = importer.protocol_name();
            debug!(binding = %desc.binding(binding).name, protocol, "binding claimed");
            match importer.import_class(desc, binding, &mut ctx) {
                Ok(class) => {
                    unhandled_extension_warnings(desc, binding, &mut ctx);
                    output.classes.push(ImportedBinding {
                        binding: desc.binding(binding).name.clone(),
                        protocol: protocol.to_string(),
                        class,
                    });
                }
                Err(err) => output.errors.push(err),
            }
        }

        output.warnings.append(&mut ctx.warnings);
        output
    }
}

/// Records a warning for every extension entry the winning importer left
/// unhandled, across the binding, its port and all operation and message
/// bindings. Required entries warn at the stronger code.
fn unhandled_extension_warnings(
    desc: &ServiceDescription,
    binding: BindingId,
    ctx: &mut ImportContext,
) {
    let mut collections: Vec<&ExtensionCollection> = vec![&desc.binding(binding).extensions];
    if let Some(port) = ctx.port {
        collections.push(&desc.port(port).extensions);
    }
    for &op_id in desc.binding(binding).operations() {
        let op = desc.operation_binding(op_id);
        collections.push(&op.extensions);
        for msg_id in op.input().into_iter().chain(op.output()).chain(op.faults().iter().copied()) {
            collections.push(&desc.message_binding(msg_id).extensions);
        }
    }

    let mut warnings = Vec::new();
    for collection in collections {
        for entry in collection.iter() {
            if entry.handled {
                continue;
            }
            let descriptor = entry.element.descriptor();
            let (code, severity) = if entry.required {
                (WarningCode::RequiredExtensionIgnored, "required")
            } else {
                (WarningCode::OptionalExtensionIgnored, "optional")
            };
            warnings.push((
                code,
                format!(
                    "{} extension element '{}' ({}) was ignored",
                    severity, descriptor.element_name, descriptor.namespace
                ),
            ));
        }
    }
    for (code, message) in warnings {
        ctx.warn(code, message);
    }
}

// ============================================================================
// Tests
// ============================================================================
