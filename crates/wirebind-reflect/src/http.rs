//! HTTP GET/POST reflectors.
//!
//! Parameter and return encodings are delegated to the MIME chain; the
//! reflector itself only attaches the verb, the relative operation URL and
//! the input framing element. A method whose signature the MIME layer cannot
//! encode is skipped silently for the verb.

use wirebind_mime::{IdentitySchemaImporter, MimeChain, SchemaTypeImporter};
use wirebind_model::ext::{ExtensionElement, ExtensionKind};
use wirebind_model::{ns, LogicalMethod, LogicalType, MessageDirection, MessagePart, ServiceDescription};

use crate::{ProtocolReflector, ReflectError, ReflectionContext};

pub struct HttpReflector {
    verb: &'static str,
    suffix: &'static str,
    chain: MimeChain,
    schema: Box<dyn SchemaTypeImporter>,
}

impl HttpReflector {
    pub fn get() -> Self {
        Self {
            verb: "GET",
            suffix: "HttpGet",
            chain: MimeChain::default(),
            schema: Box::new(IdentitySchemaImporter),
        }
    }

    pub fn post() -> Self {
        Self {
            verb: "POST",
            suffix: "HttpPost",
            chain: MimeChain::default(),
            schema: Box::new(IdentitySchemaImporter),
        }
    }

    pub fn with_schema_importer(mut self, schema: Box<dyn SchemaTypeImporter>) -> Self {
        self.schema = schema;
        self
    }
}

impl ProtocolReflector for HttpReflector {
    fn protocol_name(&self) -> &'static str {
        self.suffix
    }

    fn binding_suffix(&self) -> &'static str {
        self.suffix
    }

    fn begin_service(&mut self, desc: &mut ServiceDescription, ctx: &mut ReflectionContext) {
        desc.binding_mut(ctx.binding)
            .extensions
            .add(ExtensionElement::HttpBinding {
                verb: self.verb.to_string(),
            });
        // The endpoint URL is unknown during reflection; the address is
        // filled in by apply_base_url.
        desc.port_mut(ctx.port).extensions.add(ExtensionElement::HttpAddress {
            location: String::new(),
        });
        let port = ctx.port;
        ctx.register_url_fixup(move |desc, base| {
            if let Some(entry) = desc
                .port_mut(port)
                .extensions
                .find_mut(ExtensionKind::HttpAddress)
            {
                if let ExtensionElement::HttpAddress { location } = &mut entry.element {
                    *location = base.to_string();
                }
            }
        });
    }

    fn reflect_method(
        &mut self,
        desc: &mut ServiceDescription,
        ctx: &mut ReflectionContext,
        method: &LogicalMethod,
    ) -> Result<bool, ReflectError> {
        let Some(parameters) = self.chain.reflect_parameters(method) else {
            return Ok(false);
        };
        let ret = match &method.return_type {
            LogicalType::Unit => None,
            _ => match self.chain.reflect_return(method, &mut *self.schema) {
                Some(ret) => Some(ret),
                None => return Ok(false),
            },
        };

        let input_msg = desc.add_message(format!("{}{}In", method.name, self.suffix));
        for parameter in &method.parameters {
            desc.add_part(
                input_msg,
                MessagePart::typed(&parameter.name, parameter.ty.type_name()),
            );
        }
        let output_msg = desc.add_message(format!("{}{}Out", method.name, self.suffix));
        if let Some(ret) = &ret {
            desc.add_part(output_msg, MessagePart::typed("Body", ret.type_name.clone()));
        }

        let op = desc.add_operation_binding(ctx.binding, &method.name);
        {
            let op_node = desc.operation_binding_mut(op);
            op_node.input_message = Some(input_msg);
            op_node.output_message = Some(output_msg);
            op_node.extensions.add(ExtensionElement::HttpOperation {
                location: format!("/{}", method.name),
            });
        }

        let input_mb = desc.add_message_binding(op, MessageDirection::Input, None)?;
        if self.verb == "GET" {
            desc.message_binding_mut(input_mb)
                .extensions
                .add(ExtensionElement::HttpUrlEncoded);
        } else {
            let content_type = parameters
                .content_type
                .unwrap_or_else(|| ns::FORM_URLENCODED.to_string());
            desc.message_binding_mut(input_mb)
                .extensions
                .add(ExtensionElement::MimeContent {
                    part: None,
                    content_type,
                });
        }

        let output_mb = desc.add_message_binding(op, MessageDirection::Output, None)?;
        if let Some(ret) = ret {
            for element in ret.elements {
                desc.message_binding_mut(output_mb).extensions.add(element);
            }
        }

        Ok(true)
    }
}

// ============================================================================
// Tests
// ============================================================================
