//! Reflection: derive wire-format bindings from a service's method
//! signatures.
//!
//! The engine runs a fixed chain of protocol reflectors over a
//! [`LogicalService`]. Each reflector gets its own binding and port in the
//! shared description tree, named `{service}{suffix}`, and visits every method
//! in declaration order. A method a protocol cannot carry is skipped silently
//! for that protocol; a fatal error aborts only the protocol that raised it.
//!
//! Address elements are created empty and filled in later through registered
//! URL fix-ups, once the caller knows the endpoint base URL.

pub mod http;
pub mod soap;

pub use http::HttpReflector;
pub use soap::SoapReflector;

use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use wirebind_model::{
    BindingId, LogicalMethod, LogicalService, ModelError, PortId, QName, ServiceDescription,
    Warning, WarningCode,
};

// ============================================================================
// Errors
// ============================================================================

/// Fatal reflection failures. Each aborts the protocol pass that raised it;
/// other protocols continue.
#[derive(Debug, Error)]
pub enum ReflectError {
    #[error(
        "operation '{operation}' duplicates both SOAPAction '{soap_action}' and request element \
         '{element}' for {protocol}"
    )]
    DuplicateOperation {
        protocol: String,
        operation: String,
        soap_action: String,
        element: String,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}

// ============================================================================
// Pass context
// ============================================================================

/// Deferred address rewrite, applied by [`ReflectionOutput::apply_base_url`].
pub type UrlFixup = Box<dyn Fn(&mut ServiceDescription, &str)>;

/// How an operation's dispatch keys relate to keys registered earlier in the
/// same protocol pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchKeys {
    /// Both keys are new.
    Unique,
    /// The SOAPAction is taken by an operation with a different request
    /// element. Ambiguous for action-dispatched protocols only.
    ActionReused,
    /// Both the action and the request element are taken by one earlier
    /// operation. Never resolvable.
    Collision,
}

/// Transient per-(protocol, service) cursor. Holds the duplicate-detection
/// maps, the warning accumulator and the URL fix-up list; discarded when the
/// pass ends.
pub struct ReflectionContext {
    pub service_name: String,
    pub target_namespace: String,
    pub binding: BindingId,
    pub port: PortId,
    pub warnings: Vec<Warning>,
    actions: HashMap<String, String>,
    elements: HashMap<String, String>,
    fixups: Vec<UrlFixup>,
}

impl ReflectionContext {
    pub(crate) fn new(service: &LogicalService, binding: BindingId, port: PortId) -> Self {
        Self {
            service_name: service.name.clone(),
            target_namespace: service.namespace.clone(),
            binding,
            port,
            warnings: Vec::new(),
            actions: HashMap::new(),
            elements: HashMap::new(),
            fixups: Vec::new(),
        }
    }

    /// Records a warning-tier diagnostic and emits it as a tracing event.
    pub fn warn(&mut self, code: WarningCode, message: impl Into<String>) {
        let warning = Warning::new(code, message);
        warn!(code = ?warning.code, "{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn register_url_fixup(
        &mut self,
        fixup: impl Fn(&mut ServiceDescription, &str) + 'static,
    ) {
        self.fixups.push(Box::new(fixup));
    }

    /// Registers an operation's dispatch keys. The first operation to claim a
    /// key keeps it; later registrations only report how they relate.
    pub fn register_dispatch_keys(&mut self, soap_action: &str, element: &QName) -> DispatchKeys {
        let element_key = element.to_string();
        if let Some(prior_action) = self.elements.get(&element_key) {
            if prior_action == soap_action {
                return DispatchKeys::Collision;
            }
        }
        if let Some(prior_element) = self.actions.get(soap_action) {
            if *prior_element == element_key {
                return DispatchKeys::Collision;
            }
            self.elements
                .entry(element_key)
                .or_insert_with(|| soap_action.to_string());
            return DispatchKeys::ActionReused;
        }
        self.actions
            .insert(soap_action.to_string(), element_key.clone());
        self.elements
            .entry(element_key)
            .or_insert_with(|| soap_action.to_string());
        DispatchKeys::Unique
    }
}

// ============================================================================
// Strategy contract
// ============================================================================

pub trait ProtocolReflector {
    fn protocol_name(&self) -> &'static str;

    /// Suffix appended to the service name to form this protocol's binding
    /// and port names.
    fn binding_suffix(&self) -> &'static str;

    /// Called once per service, before any method. Attaches binding-level and
    /// port-level extension elements.
    fn begin_service(&mut self, desc: &mut ServiceDescription, ctx: &mut ReflectionContext);

    /// Reflects one method into the tree. `Ok(false)` means the protocol does
    /// not apply to this method; the method is skipped silently.
    fn reflect_method(
        &mut self,
        desc: &mut ServiceDescription,
        ctx: &mut ReflectionContext,
        method: &LogicalMethod,
    ) -> Result<bool, ReflectError>;

    /// Called once per service after the last method.
    fn end_service(
        &mut self,
        _desc: &mut ServiceDescription,
        _ctx: &mut ReflectionContext,
    ) -> Result<(), ReflectError> {
        Ok(())
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Everything one reflection run produced. Warnings and errors are
/// cross-protocol; the tree may hold partial results for protocols that
/// aborted.
pub struct ReflectionOutput {
    pub description: ServiceDescription,
    pub warnings: Vec<Warning>,
    pub errors: Vec<ReflectError>,
    fixups: Vec<UrlFixup>,
}

impl ReflectionOutput {
    /// Fills in every address element registered during reflection with the
    /// given endpoint base URL.
    pub fn apply_base_url(&mut self, base_url: &str) {
        for fixup in &self.fixups {
            fixup(&mut self.description, base_url);
        }
    }
}

/// Runs the protocol reflector chain over one service.
pub struct ServiceReflector {
    reflectors: Vec<Box<dyn ProtocolReflector>>,
}

impl Default for ServiceReflector {
    fn default() -> Self {
        Self {
            reflectors: vec![
                Box::new(HttpReflector::get()),
                Box::new(HttpReflector::post()),
                Box::new(SoapReflector::v1_1()),
                Box::new(SoapReflector::v1_2()),
            ],
        }
    }
}

impl ServiceReflector {
    /// Chain with a caller-supplied reflector list, in priority order.
    pub fn with_reflectors(reflectors: Vec<Box<dyn ProtocolReflector>>) -> Self {
        Self { reflectors }
    }

    pub fn reflect(&mut self, service: &LogicalService) -> ReflectionOutput {
        let mut description = ServiceDescription::new(&service.name, &service.namespace);
        let mut warnings = Vec::new();
        let mut errors = Vec::new();
        let mut fixups = Vec::new();

        for reflector in &mut self.reflectors {
            let binding_name = format!("{}{}", service.name, reflector.binding_suffix());
            let binding = description.add_binding(binding_name.clone());
            let port = description.add_port(binding_name, binding);
            let mut ctx = ReflectionContext::new(service, binding, port);

            reflector.begin_service(&mut description, &mut ctx);
            let mut aborted = false;
            for method in &service.methods {
                if let Err(err) = reflector.reflect_method(&mut description, &mut ctx, method) {
                    errors.push(err);
                    aborted = true;
                    break;
                }
            }
            if !aborted {
                if let Err(err) = reflector.end_service(&mut description, &mut ctx) {
                    errors.push(err);
                }
            }

            warnings.extend(ctx.warnings);
            fixups.extend(ctx.fixups);
        }

        ReflectionOutput {
            description,
            warnings,
            errors,
            fixups,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wirebind_model::{LogicalType, QName};

    fn ctx() -> ReflectionContext {
        let service = LogicalService::new("Quote", "urn:quote");
        let mut desc = ServiceDescription::new("Quote", "urn:quote");
        let binding = desc.add_binding("QuoteSoap");
        let port = desc.add_port("QuoteSoap", binding);
        ReflectionContext::new(&service, binding, port)
    }

    #[test]
    fn dispatch_keys_classify_reuse_and_collision() {
        let mut ctx = ctx();
        let ping = QName::new("Ping", "urn:quote");
        let echo = QName::new("Echo", "urn:quote");

        assert_eq!(
            ctx.register_dispatch_keys("urn:quote/Ping", &ping),
            DispatchKeys::Unique
        );
        assert_eq!(
            ctx.register_dispatch_keys("urn:quote/Ping", &ping),
            DispatchKeys::Collision
        );
        assert_eq!(
            ctx.register_dispatch_keys("urn:quote/Ping", &echo),
            DispatchKeys::ActionReused
        );
        // Distinct action against an element already paired with a different
        // action is allowed.
        assert_eq!(
            ctx.register_dispatch_keys("urn:quote/Other", &echo),
            DispatchKeys::Unique
        );
    }

    #[test]
    fn collision_is_detected_through_the_element_map_too() {
        let mut ctx = ctx();
        let ping = QName::new("Ping", "urn:quote");
        let echo = QName::new("Echo", "urn:quote");

        ctx.register_dispatch_keys("urn:act", &ping);
        // Same action, second element: action reuse.
        assert_eq!(
            ctx.register_dispatch_keys("urn:act", &echo),
            DispatchKeys::ActionReused
        );
        // Third operation repeating the (action, element) pair of the second
        // collides even though the action map still holds the first element.
        assert_eq!(
            ctx.register_dispatch_keys("urn:act", &echo),
            DispatchKeys::Collision
        );
    }

    #[test]
    fn each_protocol_gets_a_suffixed_binding_and_port() {
        let service = LogicalService::new("Quote", "urn:quote")
            .with_method(LogicalMethod::new("Ping").returning(LogicalType::String));
        let output = ServiceReflector::default().reflect(&service);

        let names: Vec<&str> = output
            .description
            .bindings()
            .map(|(_, b)| b.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["QuoteHttpGet", "QuoteHttpPost", "QuoteSoap", "QuoteSoap12"]
        );
        for (id, _) in output.description.bindings() {
            assert!(output.description.port_for_binding(id).is_some());
        }
        assert!(output.errors.is_empty());
    }

    #[test]
    fn apply_base_url_fills_every_registered_address() {
        let service = LogicalService::new("Quote", "urn:quote")
            .with_method(LogicalMethod::new("Ping").returning(LogicalType::String));
        let mut output = ServiceReflector::default().reflect(&service);
        output.apply_base_url("http://example.org/Quote");

        for (_, port) in output.description.ports() {
            let location = port.extensions.iter().find_map(|entry| match &entry.element {
                wirebind_model::ExtensionElement::HttpAddress { location } => Some(location),
                wirebind_model::ExtensionElement::SoapAddress { location, .. } => Some(location),
                _ => None,
            });
            assert_eq!(location.map(String::as_str), Some("http://example.org/Quote"));
        }
    }
}
