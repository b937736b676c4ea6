//! SOAP 1.1 and SOAP 1.2 protocol importers.
//!
//! One strategy type parameterized by version. Claiming a binding requires a
//! soap-binding element of the matching version whose transport URI resolves
//! through the transport resolver; SOAP 1.2 additionally refuses bindings
//! whose body declares the 2003/05 SOAP encoding.

use wirebind_mime::{IdentitySchemaImporter, SchemaTypeImporter};
use wirebind_model::ext::{ExtensionElement, ExtensionKind};
use wirebind_model::{
    ns, BindingId, Message, MessageBindingId, OperationBindingId, ServiceDescription, SoapVersion,
    WarningCode,
};

use crate::codegen::{constructor_statements, BaseType, ClassKind, ClassShape, CtorStatement, MethodShape};
use crate::transport::TransportResolver;
use crate::{ImportContext, ImportError, ImportStyle, ProtocolImporter};

pub struct SoapImporter {
    version: SoapVersion,
    transports: TransportResolver,
    schema: Box<dyn SchemaTypeImporter>,
}

impl SoapImporter {
    pub fn v1_1() -> Self {
        Self::with_version(SoapVersion::V1_1)
    }

    pub fn v1_2() -> Self {
        Self::with_version(SoapVersion::V1_2)
    }

    fn with_version(version: SoapVersion) -> Self {
        Self {
            version,
            transports: TransportResolver::default(),
            schema: Box::new(IdentitySchemaImporter),
        }
    }

    pub fn with_transports(mut self, transports: TransportResolver) -> Self {
        self.transports = transports;
        self
    }

    pub fn with_schema_importer(mut self, schema: Box<dyn SchemaTypeImporter>) -> Self {
        self.schema = schema;
        self
    }

    /// Whether any soap body under the binding declares the SOAP 1.2
    /// encoding. Only consulted by the 1.2 strategy.
    fn binding_uses_soap12_encoding(&self, desc: &ServiceDescription, binding: BindingId) -> bool {
        let mut message_bindings: Vec<MessageBindingId> = Vec::new();
        for &op_id in desc.binding(binding).operations() {
            let op = desc.operation_binding(op_id);
            message_bindings.extend(op.input());
            message_bindings.extend(op.output());
            message_bindings.extend(op.faults().iter().copied());
        }
        message_bindings.into_iter().any(|mb| {
            desc.message_binding(mb).extensions.iter().any(|entry| {
                matches!(
                    &entry.element,
                    ExtensionElement::SoapBody { version, encoding_style, .. }
                        if *version == self.version && is_soap12_encoding_present(encoding_style)
                )
            })
        })
    }

    fn import_operation(
        &mut self,
        desc: &mut ServiceDescription,
        binding_name: &str,
        op_id: OperationBindingId,
        _ctx: &mut ImportContext,
    ) -> Result<MethodShape, ImportError> {
        let op = desc.operation_binding(op_id);
        let op_name = op.name.clone();
        let soap_action = match op.extensions.find(ExtensionKind::SoapOperation(self.version)) {
            Some(entry) => match &entry.element {
                ExtensionElement::SoapOperation { soap_action, .. } => soap_action.clone(),
                _ => String::new(),
            },
            None => {
                return Err(ImportError::MissingOperationElement {
                    binding: binding_name.to_string(),
                    operation: op_name,
                    element: "soap:operation".to_string(),
                })
            }
        };
        let input_mb = op.input();
        let output_mb = op.output();

        let parameters = match op.input_message.map(|id| desc.message(id)) {
            Some(message) => message_parameters(&op_name, message, &mut *self.schema),
            None => Vec::new(),
        };
        let return_type = match (output_mb, op.output_message.map(|id| desc.message(id))) {
            (Some(_), Some(message)) => message_return_type(&op_name, message, &mut *self.schema),
            _ => "()".to_string(),
        };

        desc.operation_binding_mut(op_id)
            .extensions
            .mark_handled(ExtensionKind::SoapOperation(self.version));
        for mb in [input_mb, output_mb].into_iter().flatten() {
            desc.message_binding_mut(mb)
                .extensions
                .mark_handled(ExtensionKind::SoapBody(self.version));
        }

        Ok(MethodShape {
            name: op_name,
            parameters,
            return_type,
            href: None,
            soap_action: Some(soap_action),
        })
    }
}

/// Body parts mapped through the schema collaborator, in declaration order.
fn message_parameters(
    operation: &str,
    message: &Message,
    schema: &mut dyn SchemaTypeImporter,
) -> Vec<(String, String)> {
    message
        .parts
        .iter()
        .map(|part| {
            let source = match (&part.element, &part.type_name) {
                (Some(qname), _) => qname.local.clone(),
                (None, Some(type_name)) => type_name.clone(),
                (None, None) => "String".to_string(),
            };
            (part.name.clone(), schema.import_type(operation, &source))
        })
        .collect()
}

fn message_return_type(
    operation: &str,
    message: &Message,
    schema: &mut dyn SchemaTypeImporter,
) -> String {
    match message.parts.first() {
        Some(part) => {
            let source = match (&part.element, &part.type_name) {
                (Some(qname), _) => qname.local.clone(),
                (None, Some(type_name)) => type_name.clone(),
                (None, None) => "String".to_string(),
            };
            schema.import_type(operation, &source)
        }
        None => "()".to_string(),
    }
}

/// Exact whitespace-delimited token scan. The encoding URI embedded in a
/// longer token must not match.
fn is_soap12_encoding_present(encoding_style: &str) -> bool {
    encoding_style
        .split(' ')
        .any(|token| token == ns::SOAP12_ENCODING)
}

impl ProtocolImporter for SoapImporter {
    fn protocol_name(&self) -> &'static str {
        match self.version {
            SoapVersion::V1_1 => "Soap",
            SoapVersion::V1_2 => "Soap12",
        }
    }

    fn is_binding_supported(
        &self,
        desc: &ServiceDescription,
        binding: BindingId,
        ctx: &mut ImportContext,
    ) -> bool {
        let transport = match desc
            .binding(binding)
            .extensions
            .find(ExtensionKind::SoapBinding(self.version))
        {
            Some(entry) => match &entry.element {
                ExtensionElement::SoapBinding { transport, .. } => transport.clone(),
                _ => return false,
            },
            None => return false,
        };

        if self.transports.resolve(&transport).is_none() {
            ctx.warn(
                WarningCode::UnsupportedTransport,
                format!(
                    "binding '{}' ignored: transport '{transport}' is not recognized",
                    desc.binding(binding).name
                ),
            );
            return false;
        }

        if self.version == SoapVersion::V1_2 && self.binding_uses_soap12_encoding(desc, binding) {
            ctx.warn(
                WarningCode::UnsupportedEncoding,
                format!(
                    "binding '{}' ignored: SOAP 1.2 envelope encoding is not supported",
                    desc.binding(binding).name
                ),
            );
            return false;
        }

        true
    }

    fn base_class(&self, style: ImportStyle) -> BaseType {
        match style {
            ImportStyle::Client => BaseType::SoapClient,
            ImportStyle::Server | ImportStyle::ServerInterface => BaseType::Service,
        }
    }

    fn import_class(
        &mut self,
        desc: &mut ServiceDescription,
        binding: BindingId,
        ctx: &mut ImportContext,
    ) -> Result<ClassShape, ImportError> {
        let binding_name = desc.binding(binding).name.clone();
        let transport = match desc
            .binding(binding)
            .extensions
            .find(ExtensionKind::SoapBinding(self.version))
        {
            Some(entry) => match &entry.element {
                ExtensionElement::SoapBinding { transport, .. } => transport.clone(),
                _ => String::new(),
            },
            None => String::new(),
        };
        desc.binding_mut(binding)
            .extensions
            .mark_handled(ExtensionKind::SoapBinding(self.version));

        let base_type = match (ctx.style, self.transports.resolve(&transport)) {
            (ImportStyle::Client, Some(importer)) => importer.client_base_type(),
            (ImportStyle::Client, None) => BaseType::SoapClient,
            _ => BaseType::Service,
        };

        let mut ctor = Vec::new();
        if ctx.style == ImportStyle::Client {
            let location = ctx.port.and_then(|p| {
                desc.port(p)
                    .extensions
                    .find(ExtensionKind::SoapAddress(self.version))
                    .and_then(|entry| match &entry.element {
                        ExtensionElement::SoapAddress { location, .. } => Some(location.clone()),
                        _ => None,
                    })
            });
            if let Some(port) = ctx.port {
                desc.port_mut(port)
                    .extensions
                    .mark_handled(ExtensionKind::SoapAddress(self.version));
            }
            ctor = constructor_statements(
                location.as_deref(),
                desc.app_setting_url_key.as_deref(),
                desc.app_setting_base_url.as_deref(),
            );
            if self.version == SoapVersion::V1_2 {
                ctor.push(CtorStatement::SetSoapVersion(SoapVersion::V1_2));
            }
        }

        let (name, kind) = match ctx.style {
            ImportStyle::Client => (binding_name.clone(), ClassKind::Class),
            ImportStyle::Server => (binding_name.clone(), ClassKind::AbstractClass),
            ImportStyle::ServerInterface => (format!("I{binding_name}"), ClassKind::Interface),
        };

        let op_ids: Vec<OperationBindingId> = desc.binding(binding).operations().to_vec();
        let mut methods = Vec::with_capacity(op_ids.len());
        for op_id in op_ids {
            methods.push(self.import_operation(desc, &binding_name, op_id, ctx)?);
        }
        if methods.is_empty() {
            ctx.warn(
                WarningCode::NoMethodsImported,
                format!(
                    "no operations of binding '{}' could be imported for {}",
                    binding_name,
                    self.protocol_name()
                ),
            );
        }

        Ok(ClassShape {
            name,
            kind,
            base_type,
            ctor,
            methods,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
