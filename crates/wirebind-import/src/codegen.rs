//! Generated-code shape.
//!
//! Import never constructs source code; it produces these small shape values
//! and an external emitter turns them into statements. This is the narrow
//! code-emission surface: a base-type reference, constructor statements and
//! per-operation method shapes.

use serde::{Deserialize, Serialize};

use wirebind_model::SoapVersion;

/// Runtime base type the generated class derives from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseType {
    /// Client invoking operations as HTTP GET requests.
    HttpGetClient,
    /// Client invoking operations as HTTP POST requests.
    HttpPostClient,
    /// Client invoking operations as SOAP calls.
    SoapClient,
    /// Generic service base type for server-side code.
    Service,
}

/// Surface of the generated type, selected by the import style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    AbstractClass,
    Interface,
}

/// One constructor statement of a generated client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CtorStatement {
    /// Endpoint URL assigned from the description's address element.
    SetUrl(String),
    /// Endpoint URL read from application configuration.
    SetUrlFromConfig { url_key: String },
    /// Endpoint URL combined from a configured base URL and the relative
    /// part of the address element's location.
    CombineConfigBaseUrl {
        base_url_key: String,
        relative: String,
    },
    /// SOAP protocol version assignment (emitted for SOAP 1.2 clients).
    SetSoapVersion(SoapVersion),
}

/// Constructor statements wiring the endpoint URL, honoring the description's
/// configuration override keys. A configured URL key wins over the literal
/// location; a base-URL key combines with the location's relative part.
pub fn constructor_statements(
    location: Option<&str>,
    url_key: Option<&str>,
    base_url_key: Option<&str>,
) -> Vec<CtorStatement> {
    let location = location.unwrap_or("");
    match (url_key, base_url_key) {
        (Some(url_key), _) if !url_key.is_empty() => vec![CtorStatement::SetUrlFromConfig {
            url_key: url_key.to_string(),
        }],
        (_, Some(base_url_key)) if !base_url_key.is_empty() => {
            vec![CtorStatement::CombineConfigBaseUrl {
                base_url_key: base_url_key.to_string(),
                relative: relative_part(location),
            }]
        }
        _ => vec![CtorStatement::SetUrl(location.to_string())],
    }
}

/// Path-and-query part of an absolute URL, used when the endpoint is rebased
/// onto a configured base URL.
fn relative_part(location: &str) -> String {
    let after_scheme = match location.find("://") {
        Some(idx) => &location[idx + 3..],
        None => return location.to_string(),
    };
    match after_scheme.find('/') {
        Some(idx) => after_scheme[idx..].to_string(),
        None => String::new(),
    }
}

/// One imported operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodShape {
    pub name: String,
    /// Parameter name/type pairs, in wire order.
    pub parameters: Vec<(String, String)>,
    pub return_type: String,
    /// Relative URL of the operation (HTTP protocols).
    pub href: Option<String>,
    /// SOAPAction of the operation (SOAP protocols).
    pub soap_action: Option<String>,
}

/// Everything an external emitter needs to generate one binding class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassShape {
    pub name: String,
    pub kind: ClassKind,
    pub base_type: BaseType,
    /// Empty for server-side styles: only clients wire an endpoint.
    pub ctor: Vec<CtorStatement>,
    pub methods: Vec<MethodShape>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_url_without_config_keys() {
        let ctor = constructor_statements(Some("http://example.org/quote"), None, None);
        assert_eq!(
            ctor,
            vec![CtorStatement::SetUrl("http://example.org/quote".to_string())]
        );
    }

    #[test]
    fn url_key_wins_over_literal_and_base() {
        let ctor = constructor_statements(
            Some("http://example.org/quote"),
            Some("QuoteUrl"),
            Some("BaseUrl"),
        );
        assert_eq!(
            ctor,
            vec![CtorStatement::SetUrlFromConfig {
                url_key: "QuoteUrl".to_string()
            }]
        );
    }

    #[test]
    fn base_url_key_combines_relative_part() {
        let ctor =
            constructor_statements(Some("http://example.org/svc/quote"), None, Some("BaseUrl"));
        assert_eq!(
            ctor,
            vec![CtorStatement::CombineConfigBaseUrl {
                base_url_key: "BaseUrl".to_string(),
                relative: "/svc/quote".to_string(),
            }]
        );
    }

    #[test]
    fn missing_location_yields_empty_literal() {
        assert_eq!(
            constructor_statements(None, None, None),
            vec![CtorStatement::SetUrl(String::new())]
        );
    }
}
