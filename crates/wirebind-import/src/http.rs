//! HTTP GET/POST protocol importers.
//!
//! Both verbs share one strategy type: GET reads its parameters from the
//! url-encoded marker on the input message, POST runs the MIME chain over the
//! input payload. Returns always go through the MIME chain, except that an
//! output message with no extension elements imports as a unit return without
//! consulting any strategy.

use wirebind_mime::{
    import_string_parameters, IdentitySchemaImporter, MimeChain, MimeImportContext, MimeReturn,
    SchemaTypeImporter,
};
use wirebind_model::ext::{ExtensionElement, ExtensionKind};
use wirebind_model::{
    BindingId, MessageBindingId, OperationBindingId, ServiceDescription, WarningCode,
};

use crate::codegen::{constructor_statements, BaseType, ClassKind, ClassShape, MethodShape};
use crate::{ImportContext, ImportError, ImportStyle, ProtocolImporter};

pub struct HttpImporter {
    verb: &'static str,
    /// POST carries its parameters as an input payload; GET does not.
    has_input_payload: bool,
    chain: MimeChain,
    schema: Box<dyn SchemaTypeImporter>,
}

impl HttpImporter {
    pub fn get() -> Self {
        Self {
            verb: "GET",
            has_input_payload: false,
            chain: MimeChain::default(),
            schema: Box::new(IdentitySchemaImporter),
        }
    }

    pub fn post() -> Self {
        Self {
            verb: "POST",
            has_input_payload: true,
            chain: MimeChain::default(),
            schema: Box::new(IdentitySchemaImporter),
        }
    }

    pub fn with_schema_importer(mut self, schema: Box<dyn SchemaTypeImporter>) -> Self {
        self.schema = schema;
        self
    }

    fn import_operation(
        &mut self,
        desc: &mut ServiceDescription,
        binding_name: &str,
        op_id: OperationBindingId,
        ctx: &mut ImportContext,
    ) -> Result<Option<MethodShape>, ImportError> {
        let op = desc.operation_binding(op_id);
        let op_name = op.name.clone();
        let href = match op.extensions.find(ExtensionKind::HttpOperation) {
            Some(entry) => match &entry.element {
                ExtensionElement::HttpOperation { location } => location.clone(),
                _ => String::new(),
            },
            None => {
                return Err(ImportError::MissingOperationElement {
                    binding: binding_name.to_string(),
                    operation: op_name,
                    element: "http:operation".to_string(),
                })
            }
        };
        let input_mb = op.input();
        let output_mb = op.output();
        let input_message = op.input_message;
        let output_message = op.output_message;

        // Marks are applied after all reads; the mime context borrows the
        // tree immutably.
        let mut marks: Vec<(MessageBindingId, ExtensionKind)> = Vec::new();

        let parameters = if self.has_input_payload {
            let mime_ctx = MimeImportContext {
                operation: &op_name,
                input_extensions: input_mb.map(|id| &desc.message_binding(id).extensions),
                output_extensions: output_mb.map(|id| &desc.message_binding(id).extensions),
                input_message: input_message.map(|id| desc.message(id)),
                output_message: output_message.map(|id| desc.message(id)),
            };
            match self.chain.import_parameters(&mime_ctx) {
                Some(collection) => {
                    if let Some(input) = input_mb {
                        for kind in &collection.consumed {
                            marks.push((input, *kind));
                        }
                    }
                    collection
                        .parameters
                        .into_iter()
                        .map(|p| (p.name, p.type_name))
                        .collect()
                }
                None => {
                    ctx.warn(
                        WarningCode::UnsupportedOperation,
                        format!(
                            "operation '{op_name}' ignored: no input MIME formats were recognized"
                        ),
                    );
                    return Ok(None);
                }
            }
        } else {
            let url_encoded = input_mb.filter(|id| {
                desc.message_binding(*id)
                    .extensions
                    .find(ExtensionKind::HttpUrlEncoded)
                    .is_some()
            });
            if let Some(marker_mb) = url_encoded {
                let imported = input_message
                    .map(|id| desc.message(id))
                    .and_then(import_string_parameters);
                match imported {
                    Some(parameters) => {
                        marks.push((marker_mb, ExtensionKind::HttpUrlEncoded));
                        parameters
                            .into_iter()
                            .map(|p| (p.name, p.type_name))
                            .collect()
                    }
                    None => {
                        ctx.warn(
                            WarningCode::UnsupportedOperation,
                            format!(
                                "operation '{op_name}' ignored: no input HTTP formats were recognized"
                            ),
                        );
                        return Ok(None);
                    }
                }
            } else {
                // No marker means no URL parameters, not an error.
                Vec::new()
            }
        };

        let ret = match output_mb {
            Some(out_id) if !desc.message_binding(out_id).extensions.is_empty() => {
                let mime_ctx = MimeImportContext {
                    operation: &op_name,
                    input_extensions: input_mb.map(|id| &desc.message_binding(id).extensions),
                    output_extensions: Some(&desc.message_binding(out_id).extensions),
                    input_message: input_message.map(|id| desc.message(id)),
                    output_message: output_message.map(|id| desc.message(id)),
                };
                match self.chain.import_return(&mime_ctx, &mut *self.schema) {
                    Some(ret) => {
                        for kind in &ret.consumed {
                            marks.push((out_id, *kind));
                        }
                        ret
                    }
                    None => {
                        ctx.warn(
                            WarningCode::UnsupportedOperation,
                            format!(
                                "operation '{op_name}' ignored: no output MIME formats were recognized"
                            ),
                        );
                        return Ok(None);
                    }
                }
            }
            // No output framing at all imports as a unit return.
            _ => MimeReturn::unit(),
        };

        desc.operation_binding_mut(op_id)
            .extensions
            .mark_handled(ExtensionKind::HttpOperation);
        for (mb, kind) in marks {
            desc.message_binding_mut(mb).extensions.mark_handled(kind);
        }

        Ok(Some(MethodShape {
            name: op_name,
            parameters,
            return_type: ret.type_name,
            href: Some(href),
            soap_action: None,
        }))
    }
}

impl ProtocolImporter for HttpImporter {
    fn protocol_name(&self) -> &'static str {
        if self.verb == "GET" {
            "HttpGet"
        } else {
            "HttpPost"
        }
    }

    fn is_binding_supported(
        &self,
        desc: &ServiceDescription,
        binding: BindingId,
        _ctx: &mut ImportContext,
    ) -> bool {
        match desc.binding(binding).extensions.find(ExtensionKind::HttpBinding) {
            Some(entry) => matches!(
                &entry.element,
                ExtensionElement::HttpBinding { verb } if verb == self.verb
            ),
            None => false,
        }
    }

    fn base_class(&self, style: ImportStyle) -> BaseType {
        match style {
            ImportStyle::Client if self.verb == "GET" => BaseType::HttpGetClient,
            ImportStyle::Client => BaseType::HttpPostClient,
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
        desc.binding_mut(binding)
            .extensions
            .mark_handled(ExtensionKind::HttpBinding);

        let mut ctor = Vec::new();
        if ctx.style == ImportStyle::Client {
            let location = ctx.port.and_then(|p| {
                desc.port(p)
                    .extensions
                    .find(ExtensionKind::HttpAddress)
                    .and_then(|entry| match &entry.element {
                        ExtensionElement::HttpAddress { location } => Some(location.clone()),
                        _ => None,
                    })
            });
            if let Some(port) = ctx.port {
                desc.port_mut(port)
                    .extensions
                    .mark_handled(ExtensionKind::HttpAddress);
            }
            ctor = constructor_statements(
                location.as_deref(),
                desc.app_setting_url_key.as_deref(),
                desc.app_setting_base_url.as_deref(),
            );
        }

        let (name, kind) = match ctx.style {
            ImportStyle::Client => (binding_name.clone(), ClassKind::Class),
            ImportStyle::Server => (binding_name.clone(), ClassKind::AbstractClass),
            ImportStyle::ServerInterface => (format!("I{binding_name}"), ClassKind::Interface),
        };

        let op_ids: Vec<OperationBindingId> = desc.binding(binding).operations().to_vec();
        let mut methods = Vec::new();
        for op_id in op_ids {
            if let Some(method) = self.import_operation(desc, &binding_name, op_id, ctx)? {
                methods.push(method);
            }
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
            base_type: self.base_class(ctx.style),
            ctor,
            methods,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wirebind_model::{MessageDirection, MessagePart};

    fn get_binding(verb: &str) -> (ServiceDescription, BindingId) {
        let mut desc = ServiceDescription::new("Quote", "urn:quote");
        let binding = desc.add_binding("QuoteHttpGet");
        desc.binding_mut(binding).extensions.add(ExtensionElement::HttpBinding {
            verb: verb.to_string(),
        });
        (desc, binding)
    }

    #[test]
    fn verb_match_is_exact_and_case_sensitive() {
        let importer = HttpImporter::get();
        let mut ctx = ImportContext::new(ImportStyle::Client);

        for (verb, expected) in [
            ("GET", true),
            ("get", false),
            ("Get", false),
            ("POST", false),
            ("GET ", false),
        ] {
            let (desc, binding) = get_binding(verb);
            assert_eq!(
                importer.is_binding_supported(&desc, binding, &mut ctx),
                expected,
                "verb {verb:?}"
            );
        }

        let desc = {
            let mut d = ServiceDescription::new("Quote", "urn:quote");
            d.add_binding("NoHttpElement");
            d
        };
        let (id, _) = desc.bindings().next().unwrap();
        assert!(!importer.is_binding_supported(&desc, id, &mut ctx));
    }

    #[test]
    fn base_class_is_protocol_specific_for_clients_only() {
        let get = HttpImporter::get();
        let post = HttpImporter::post();
        assert_eq!(get.base_class(ImportStyle::Client), BaseType::HttpGetClient);
        assert_eq!(post.base_class(ImportStyle::Client), BaseType::HttpPostClient);
        assert_eq!(get.base_class(ImportStyle::Server), BaseType::Service);
        assert_eq!(post.base_class(ImportStyle::ServerInterface), BaseType::Service);
    }

    #[test]
    fn empty_output_extensions_import_as_unit_return() {
        let (mut desc, binding) = get_binding("GET");
        let op = desc.add_operation_binding(binding, "Ping");
        desc.operation_binding_mut(op)
            .extensions
            .add(ExtensionElement::HttpOperation {
                location: "/Ping".to_string(),
            });
        desc.add_message_binding(op, MessageDirection::Input, None).unwrap();
        desc.add_message_binding(op, MessageDirection::Output, None).unwrap();

        let mut importer = HttpImporter::get();
        let mut ctx = ImportContext::new(ImportStyle::Client);
        let class = importer.import_class(&mut desc, binding, &mut ctx).unwrap();

        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].return_type, "()");
        assert_eq!(class.methods[0].href.as_deref(), Some("/Ping"));
    }

    #[test]
    fn get_without_url_encoded_marker_imports_empty_parameters() {
        let (mut desc, binding) = get_binding("GET");
        let message = desc.add_message("PingIn");
        desc.add_part(message, MessagePart::typed("symbol", "String"));
        let op = desc.add_operation_binding(binding, "Ping");
        desc.operation_binding_mut(op)
            .extensions
            .add(ExtensionElement::HttpOperation {
                location: "/Ping".to_string(),
            });
        desc.operation_binding_mut(op).input_message = Some(message);
        desc.add_message_binding(op, MessageDirection::Input, None).unwrap();

        let mut importer = HttpImporter::get();
        let mut ctx = ImportContext::new(ImportStyle::Client);
        let class = importer.import_class(&mut desc, binding, &mut ctx).unwrap();
        assert!(class.methods[0].parameters.is_empty());
    }

    #[test]
    fn missing_http_operation_element_is_fatal_for_the_binding() {
        let (mut desc, binding) = get_binding("GET");
        desc.add_operation_binding(binding, "Ping");

        let mut importer = HttpImporter::get();
        let mut ctx = ImportContext::new(ImportStyle::Client);
        let err = importer
            .import_class(&mut desc, binding, &mut ctx)
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingOperationElement { operation, .. } if operation == "Ping"
        ));
    }

    #[test]
    fn constructor_wires_address_location_for_clients() {
        let (mut desc, binding) = get_binding("GET");
        let port = desc.add_port("QuotePort", binding);
        desc.port_mut(port).extensions.add(ExtensionElement::HttpAddress {
            location: "http://example.org/quote".to_string(),
        });

        let mut importer = HttpImporter::get();
        let mut ctx = ImportContext::new(ImportStyle::Client);
        ctx.port = Some(port);
        let class = importer.import_class(&mut desc, binding, &mut ctx).unwrap();
        assert_eq!(
            class.ctor,
            vec![crate::CtorStatement::SetUrl(
                "http://example.org/quote".to_string()
            )]
        );
        // The address element was consumed.
        assert!(
            desc.port(port)
                .extensions
                .find(ExtensionKind::HttpAddress)
                .unwrap()
                .handled
        );
    }
}
