//! SOAP transport resolution.
//!
//! A SOAP binding declares its delivery mechanism as a transport URI. The
//! resolver maps that URI, by exact match, to a transport importer able to
//! emit the transport-specific base type. An unknown URI resolves to `None`;
//! the SOAP importers turn that into a warning-tier rejection, never a panic
//! or error.

use wirebind_model::ns;

use crate::codegen::BaseType;

/// Code-generation strategy for one SOAP transport.
pub trait TransportImporter {
    fn name(&self) -> &'static str;

    /// Exact-match test against the binding's declared transport URI.
    fn is_supported_transport(&self, uri: &str) -> bool;

    /// Base type of generated clients on this transport.
    fn client_base_type(&self) -> BaseType;
}

/// The one required built-in: SOAP over HTTP.
#[derive(Debug, Default)]
pub struct HttpTransport;

impl TransportImporter for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    fn is_supported_transport(&self, uri: &str) -> bool {
        uri == ns::SOAP_HTTP_TRANSPORT
    }

    fn client_base_type(&self) -> BaseType {
        BaseType::SoapClient
    }
}

/// Ordered transport registry; first supporting importer wins.
pub struct TransportResolver {
    transports: Vec<Box<dyn TransportImporter>>,
}

impl Default for TransportResolver {
    fn default() -> Self {
        Self {
            transports: vec![Box::new(HttpTransport)],
        }
    }
}

impl TransportResolver {
    pub fn register(&mut self, transport: Box<dyn TransportImporter>) {
        self.transports.push(transport);
    }

    pub fn resolve(&self, uri: &str) -> Option<&dyn TransportImporter> {
        self.transports
            .iter()
            .map(|t| t.as_ref())
            .find(|t| t.is_supported_transport(uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_transport_matches_exact_token_only() {
        let resolver = TransportResolver::default();
        assert!(resolver.resolve(ns::SOAP_HTTP_TRANSPORT).is_some());
        assert!(resolver.resolve("http://schemas.xmlsoap.org/soap/http/").is_none());
        assert!(resolver.resolve("jms://queue").is_none());
        assert!(resolver.resolve("").is_none());
    }

    #[test]
    fn registered_transports_are_tried_in_order() {
        struct Jms;
        impl TransportImporter for Jms {
            fn name(&self) -> &'static str {
                "jms"
            }
            fn is_supported_transport(&self, uri: &str) -> bool {
                uri == "jms://queue"
            }
            fn client_base_type(&self) -> BaseType {
                BaseType::SoapClient
            }
        }

        let mut resolver = TransportResolver::default();
        resolver.register(Box::new(Jms));
        assert_eq!(resolver.resolve("jms://queue").map(|t| t.name()), Some("jms"));
        assert_eq!(
            resolver.resolve(ns::SOAP_HTTP_TRANSPORT).map(|t| t.name()),
            Some("http")
        );
    }
}
