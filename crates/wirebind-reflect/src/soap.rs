//! SOAP 1.1/1.2 reflectors.
//!
//! Every method is carried as a document/literal operation whose request root
//! element defaults to `{namespace}:{method}`. Dispatch keys (SOAPAction,
//! request element) are tracked per pass: an operation that repeats both keys
//! of an earlier one is a fatal duplicate under either version, while reusing
//! only the SOAPAction excludes the operation under SOAP 1.1 and is accepted
//! under SOAP 1.2, where the receiver can dispatch on the request element.

use wirebind_model::ext::{ExtensionElement, ExtensionKind};
use wirebind_model::{
    ns, LogicalMethod, MessageDirection, MessagePart, QName, ServiceDescription, SoapBindingStyle,
    SoapBindingUse, SoapVersion, WarningCode,
};

use crate::{DispatchKeys, ProtocolReflector, ReflectError, ReflectionContext};

pub struct SoapReflector {
    version: SoapVersion,
    suffix: &'static str,
}

impl SoapReflector {
    pub fn v1_1() -> Self {
        Self {
            version: SoapVersion::V1_1,
            suffix: "Soap",
        }
    }

    pub fn v1_2() -> Self {
        Self {
            version: SoapVersion::V1_2,
            suffix: "Soap12",
        }
    }

    fn soap_body(&self, namespace: &str) -> ExtensionElement {
        ExtensionElement::SoapBody {
            version: self.version,
            usage: SoapBindingUse::Literal,
            namespace: namespace.to_string(),
            encoding_style: String::new(),
        }
    }
}

impl ProtocolReflector for SoapReflector {
    fn protocol_name(&self) -> &'static str {
        self.suffix
    }

    fn binding_suffix(&self) -> &'static str {
        self.suffix
    }

    fn begin_service(&mut self, desc: &mut ServiceDescription, ctx: &mut ReflectionContext) {
        desc.binding_mut(ctx.binding)
            .extensions
            .add(ExtensionElement::SoapBinding {
                version: self.version,
                transport: ns::SOAP_HTTP_TRANSPORT.to_string(),
                style: SoapBindingStyle::Document,
            });
        desc.port_mut(ctx.port).extensions.add(ExtensionElement::SoapAddress {
            version: self.version,
            location: String::new(),
        });
        let port = ctx.port;
        let version = self.version;
        ctx.register_url_fixup(move |desc, base| {
            if let Some(entry) = desc
                .port_mut(port)
                .extensions
                .find_mut(ExtensionKind::SoapAddress(version))
            {
                if let ExtensionElement::SoapAddress { location, .. } = &mut entry.element {
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
        let soap_action = method
            .soap_action
            .clone()
            .unwrap_or_else(|| format!("{}/{}", ctx.target_namespace, method.name));
        let request_element = method
            .request_element
            .clone()
            .unwrap_or_else(|| QName::new(&method.name, &ctx.target_namespace));

        match ctx.register_dispatch_keys(&soap_action, &request_element) {
            DispatchKeys::Collision => {
                return Err(ReflectError::DuplicateOperation {
                    protocol: self.protocol_name().to_string(),
                    operation: method.name.clone(),
                    soap_action,
                    element: request_element.to_string(),
                });
            }
            DispatchKeys::ActionReused if self.version == SoapVersion::V1_1 => {
                ctx.warn(
                    WarningCode::AmbiguousSoapAction,
                    format!(
                        "operation '{}' excluded: SOAPAction '{soap_action}' is already bound \
                         and SOAP 1.1 dispatch cannot disambiguate",
                        method.name
                    ),
                );
                return Ok(false);
            }
            DispatchKeys::ActionReused | DispatchKeys::Unique => {}
        }

        let input_msg = desc.add_message(format!("{}{}In", method.name, self.suffix));
        desc.add_part(
            input_msg,
            MessagePart::element("parameters", request_element),
        );
        let output_msg = if method.one_way {
            None
        } else {
            let id = desc.add_message(format!("{}{}Out", method.name, self.suffix));
            desc.add_part(
                id,
                MessagePart::element(
                    "parameters",
                    QName::new(format!("{}Response", method.name), &ctx.target_namespace),
                ),
            );
            Some(id)
        };

        let op = desc.add_operation_binding(ctx.binding, &method.name);
        {
            let op_node = desc.operation_binding_mut(op);
            op_node.input_message = Some(input_msg);
            op_node.output_message = output_msg;
            op_node.extensions.add(ExtensionElement::SoapOperation {
                version: self.version,
                soap_action,
                style: SoapBindingStyle::Document,
            });
        }

        let namespace = ctx.target_namespace.clone();
        let input_mb = desc.add_message_binding(op, MessageDirection::Input, None)?;
        desc.message_binding_mut(input_mb)
            .extensions
            .add(self.soap_body(&namespace));
        if !method.one_way {
            let output_mb = desc.add_message_binding(op, MessageDirection::Output, None)?;
            desc.message_binding_mut(output_mb)
                .extensions
                .add(self.soap_body(&namespace));
        }

        Ok(true)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceReflector;
    use wirebind_model::{LogicalService, LogicalType};

    fn service_with(methods: Vec<LogicalMethod>) -> LogicalService {
        let mut service = LogicalService::new("Quote", "urn:quote");
        for method in methods {
            service = service.with_method(method);
        }
        service
    }

    fn soap11_only() -> ServiceReflector {
        ServiceReflector::with_reflectors(vec![Box::new(SoapReflector::v1_1())])
    }

    fn soap12_only() -> ServiceReflector {
        ServiceReflector::with_reflectors(vec![Box::new(SoapReflector::v1_2())])
    }

    #[test]
    fn default_action_and_request_element_derive_from_the_namespace() {
        let service = service_with(vec![
            LogicalMethod::new("Ping").returning(LogicalType::String)
        ]);
        let output = soap11_only().reflect(&service);
        assert!(output.errors.is_empty());

        let desc = &output.description;
        let (_, binding) = desc.bindings().next().unwrap();
        let op = desc.operation_binding(binding.operations()[0]);
        let entry = op
            .extensions
            .find(ExtensionKind::SoapOperation(SoapVersion::V1_1))
            .unwrap();
        assert!(matches!(
            &entry.element,
            ExtensionElement::SoapOperation { soap_action, .. }
                if soap_action == "urn:quote/Ping"
        ));
        let input = desc.message(op.input_message.unwrap());
        assert_eq!(
            input.parts[0].element,
            Some(QName::new("Ping", "urn:quote"))
        );
    }

    #[test]
    fn repeating_both_dispatch_keys_is_fatal_under_either_version() {
        // Two methods forced onto the same action and the same request root.
        let mut clash = LogicalMethod::new("PingAgain").returning(LogicalType::String);
        clash.soap_action = Some("urn:quote/Ping".to_string());
        clash.request_element = Some(QName::new("Ping", "urn:quote"));
        let service = service_with(vec![
            LogicalMethod::new("Ping").returning(LogicalType::String),
            clash,
        ]);

        for mut reflector in [soap11_only(), soap12_only()] {
            let output = reflector.reflect(&service);
            assert_eq!(output.errors.len(), 1);
            assert!(matches!(
                &output.errors[0],
                ReflectError::DuplicateOperation { operation, .. } if operation == "PingAgain"
            ));
        }
    }

    #[test]
    fn action_reuse_excludes_under_soap11_but_not_soap12() {
        let mut reuse = LogicalMethod::new("Echo").returning(LogicalType::String);
        reuse.soap_action = Some("urn:quote/Ping".to_string());
        let service = service_with(vec![
            LogicalMethod::new("Ping").returning(LogicalType::String),
            reuse,
        ]);

        let output = soap11_only().reflect(&service);
        assert!(output.errors.is_empty());
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].code, WarningCode::AmbiguousSoapAction);
        let (_, binding) = output.description.bindings().next().unwrap();
        assert_eq!(binding.operations().len(), 1);

        let output = soap12_only().reflect(&service);
        assert!(output.errors.is_empty());
        assert!(output.warnings.is_empty());
        let (_, binding) = output.description.bindings().next().unwrap();
        assert_eq!(binding.operations().len(), 2);
    }

    #[test]
    fn one_way_methods_have_no_output_message_binding() {
        let mut notify = LogicalMethod::new("Notify");
        notify.one_way = true;
        let service = service_with(vec![notify]);

        let output = soap11_only().reflect(&service);
        let desc = &output.description;
        let (_, binding) = desc.bindings().next().unwrap();
        let op = desc.operation_binding(binding.operations()[0]);
        assert!(op.input().is_some());
        assert!(op.output().is_none());
        assert!(op.output_message.is_none());
    }

    #[test]
    fn a_fatal_soap11_duplicate_does_not_stop_the_soap12_pass() {
        let mut clash = LogicalMethod::new("PingAgain").returning(LogicalType::String);
        clash.soap_action = Some("urn:quote/Ping".to_string());
        clash.request_element = Some(QName::new("Ping", "urn:quote"));
        let mut distinct = clash.clone();
        distinct.request_element = Some(QName::new("PingAgain", "urn:quote"));

        // SOAP 1.1 sees a duplicate pair; SOAP 1.2 sees reusable actions.
        let service = service_with(vec![
            LogicalMethod::new("Ping").returning(LogicalType::String),
            clash,
        ]);
        let mut reflector = ServiceReflector::with_reflectors(vec![
            Box::new(SoapReflector::v1_1()),
            Box::new(SoapReflector::v1_2()),
        ]);
        let output = reflector.reflect(&service);
        assert_eq!(output.errors.len(), 2);

        let service = service_with(vec![
            LogicalMethod::new("Ping").returning(LogicalType::String),
            distinct,
        ]);
        let mut reflector = ServiceReflector::with_reflectors(vec![
            Box::new(SoapReflector::v1_1()),
            Box::new(SoapReflector::v1_2()),
        ]);
        let output = reflector.reflect(&service);
        // 1.1 excludes with a warning, 1.2 reflects both operations.
        assert!(output.errors.is_empty());
        assert_eq!(output.warnings.len(), 1);
        let soap12_binding = output
            .description
            .bindings()
            .find(|(_, b)| b.name == "QuoteSoap12")
            .unwrap()
            .1;
        assert_eq!(soap12_binding.operations().len(), 2);
    }
}
