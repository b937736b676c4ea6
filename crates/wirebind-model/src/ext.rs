//! Extensibility elements and their ordered collections.
//!
//! An extensibility element is a typed annotation attached to a description
//! tree node carrying protocol-specific metadata. Elements are a closed
//! tagged enum: every variant advertises a registration descriptor
//! `(element name, namespace URI, applicable parent kinds)` and the registry
//! discovers variants by iterating them, never by runtime reflection.

use serde::{Deserialize, Serialize};

use crate::desc::{BindingId, MessageBindingId, OperationBindingId, PortId, QName};
use crate::ns;

// ============================================================================
// Shared wire-format enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoapVersion {
    V1_1,
    V1_2,
}

impl SoapVersion {
    pub fn namespace(self) -> &'static str {
        match self {
            SoapVersion::V1_1 => ns::SOAP11_NS,
            SoapVersion::V1_2 => ns::SOAP12_NS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoapBindingStyle {
    Document,
    Rpc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoapBindingUse {
    Literal,
    Encoded,
}

// ============================================================================
// Elements
// ============================================================================

/// A typed wire-format annotation. SOAP variants carry their version; the
/// version selects the registration namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum ExtensionElement {
    /// Binding-level SOAP declaration: transport URI plus default style.
    SoapBinding {
        version: SoapVersion,
        transport: String,
        style: SoapBindingStyle,
    },
    /// Operation-level SOAP declaration: SOAPAction plus per-operation style.
    SoapOperation {
        version: SoapVersion,
        soap_action: String,
        style: SoapBindingStyle,
    },
    /// Message-level SOAP body declaration. `encoding_style` is a
    /// space-delimited URI list, kept verbatim.
    SoapBody {
        version: SoapVersion,
        usage: SoapBindingUse,
        namespace: String,
        encoding_style: String,
    },
    SoapHeader {
        version: SoapVersion,
        message: QName,
        part: String,
        usage: SoapBindingUse,
    },
    SoapFault {
        version: SoapVersion,
        name: String,
        usage: SoapBindingUse,
    },
    /// Port-level endpoint address.
    SoapAddress {
        version: SoapVersion,
        location: String,
    },
    /// Binding-level HTTP declaration carrying the verb string verbatim.
    HttpBinding { verb: String },
    HttpAddress { location: String },
    /// Operation-level relative URL.
    HttpOperation { location: String },
    /// Marker: input parameters travel URL-encoded in the query string.
    HttpUrlEncoded,
    /// Concrete MIME payload framing for one message.
    MimeContent {
        part: Option<String>,
        content_type: String,
    },
    /// Schema-typed XML payload framing.
    MimeXml { part: Option<String> },
    MimeMultipartRelated,
    /// Pattern-based scraping of a textual response.
    MimeTextMatch {
        name: String,
        pattern: String,
        group: u32,
    },
}

/// Discriminant of an [`ExtensionElement`] variant, used for first-match
/// collection lookups and registry discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtensionKind {
    SoapBinding(SoapVersion),
    SoapOperation(SoapVersion),
    SoapBody(SoapVersion),
    SoapHeader(SoapVersion),
    SoapFault(SoapVersion),
    SoapAddress(SoapVersion),
    HttpBinding,
    HttpAddress,
    HttpOperation,
    HttpUrlEncoded,
    MimeContent,
    MimeXml,
    MimeMultipartRelated,
    MimeTextMatch,
}

/// Node kinds an element may legally attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentKind {
    Types,
    Port,
    Binding,
    OperationBinding,
    InputBinding,
    OutputBinding,
    FaultBinding,
}

/// Registration tuple supplied to the extension registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionDescriptor {
    pub element_name: &'static str,
    pub namespace: &'static str,
    pub parents: &'static [ParentKind],
}

const MESSAGE_PARENTS: &[ParentKind] = &[ParentKind::InputBinding, ParentKind::OutputBinding];

impl ExtensionKind {
    /// Every registered kind, in registration order. SOAP 1.1 kinds precede
    /// their 1.2 equivalents; discovery iterates this list.
    pub const ALL: [ExtensionKind; 20] = [
        ExtensionKind::SoapBinding(SoapVersion::V1_1),
        ExtensionKind::SoapOperation(SoapVersion::V1_1),
        ExtensionKind::SoapBody(SoapVersion::V1_1),
        ExtensionKind::SoapHeader(SoapVersion::V1_1),
        ExtensionKind::SoapFault(SoapVersion::V1_1),
        ExtensionKind::SoapAddress(SoapVersion::V1_1),
        ExtensionKind::SoapBinding(SoapVersion::V1_2),
        ExtensionKind::SoapOperation(SoapVersion::V1_2),
        ExtensionKind::SoapBody(SoapVersion::V1_2),
        ExtensionKind::SoapHeader(SoapVersion::V1_2),
        ExtensionKind::SoapFault(SoapVersion::V1_2),
        ExtensionKind::SoapAddress(SoapVersion::V1_2),
        ExtensionKind::HttpBinding,
        ExtensionKind::HttpAddress,
        ExtensionKind::HttpOperation,
        ExtensionKind::HttpUrlEncoded,
        ExtensionKind::MimeContent,
        ExtensionKind::MimeXml,
        ExtensionKind::MimeMultipartRelated,
        ExtensionKind::MimeTextMatch,
    ];

    pub fn descriptor(self) -> ExtensionDescriptor {
        match self {
            ExtensionKind::SoapBinding(v) => ExtensionDescriptor {
                element_name: "binding",
                namespace: v.namespace(),
                parents: &[ParentKind::Binding],
            },
            ExtensionKind::SoapOperation(v) => ExtensionDescriptor {
                element_name: "operation",
                namespace: v.namespace(),
                parents: &[ParentKind::OperationBinding],
            },
            ExtensionKind::SoapBody(v) => ExtensionDescriptor {
                element_name: "body",
                namespace: v.namespace(),
                parents: MESSAGE_PARENTS,
            },
            ExtensionKind::SoapHeader(v) => ExtensionDescriptor {
                element_name: "header",
                namespace: v.namespace(),
                parents: MESSAGE_PARENTS,
            },
            ExtensionKind::SoapFault(v) => ExtensionDescriptor {
                element_name: "fault",
                namespace: v.namespace(),
                parents: &[ParentKind::FaultBinding],
            },
            ExtensionKind::SoapAddress(v) => ExtensionDescriptor {
                element_name: "address",
                namespace: v.namespace(),
                parents: &[ParentKind::Port],
            },
            ExtensionKind::HttpBinding => ExtensionDescriptor {
                element_name: "binding",
                namespace: ns::HTTP_NS,
                parents: &[ParentKind::Binding],
            },
            ExtensionKind::HttpAddress => ExtensionDescriptor {
                element_name: "address",
                namespace: ns::HTTP_NS,
                parents: &[ParentKind::Port],
            },
            ExtensionKind::HttpOperation => ExtensionDescriptor {
                element_name: "operation",
                namespace: ns::HTTP_NS,
                parents: &[ParentKind::OperationBinding],
            },
            ExtensionKind::HttpUrlEncoded => ExtensionDescriptor {
                element_name: "urlEncoded",
                namespace: ns::HTTP_NS,
                parents: &[ParentKind::InputBinding],
            },
            ExtensionKind::MimeContent => ExtensionDescriptor {
                element_name: "content",
                namespace: ns::MIME_NS,
                parents: MESSAGE_PARENTS,
            },
            ExtensionKind::MimeXml => ExtensionDescriptor {
                element_name: "mimeXml",
                namespace: ns::MIME_NS,
                parents: MESSAGE_PARENTS,
            },
            ExtensionKind::MimeMultipartRelated => ExtensionDescriptor {
                element_name: "multipartRelated",
                namespace: ns::MIME_NS,
                parents: MESSAGE_PARENTS,
            },
            ExtensionKind::MimeTextMatch => ExtensionDescriptor {
                element_name: "match",
                namespace: ns::TEXT_MATCHING_NS,
                parents: MESSAGE_PARENTS,
            },
        }
    }
}

impl ExtensionElement {
    pub fn kind(&self) -> ExtensionKind {
        match self {
            ExtensionElement::SoapBinding { version, .. } => ExtensionKind::SoapBinding(*version),
            ExtensionElement::SoapOperation { version, .. } => {
                ExtensionKind::SoapOperation(*version)
            }
            ExtensionElement::SoapBody { version, .. } => ExtensionKind::SoapBody(*version),
            ExtensionElement::SoapHeader { version, .. } => ExtensionKind::SoapHeader(*version),
            ExtensionElement::SoapFault { version, .. } => ExtensionKind::SoapFault(*version),
            ExtensionElement::SoapAddress { version, .. } => ExtensionKind::SoapAddress(*version),
            ExtensionElement::HttpBinding { .. } => ExtensionKind::HttpBinding,
            ExtensionElement::HttpAddress { .. } => ExtensionKind::HttpAddress,
            ExtensionElement::HttpOperation { .. } => ExtensionKind::HttpOperation,
            ExtensionElement::HttpUrlEncoded => ExtensionKind::HttpUrlEncoded,
            ExtensionElement::MimeContent { .. } => ExtensionKind::MimeContent,
            ExtensionElement::MimeXml { .. } => ExtensionKind::MimeXml,
            ExtensionElement::MimeMultipartRelated => ExtensionKind::MimeMultipartRelated,
            ExtensionElement::MimeTextMatch { .. } => ExtensionKind::MimeTextMatch,
        }
    }

    pub fn descriptor(&self) -> ExtensionDescriptor {
        self.kind().descriptor()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Discovery surface handed to external XML readers/writers: maps
/// `(element name, namespace)` pairs back to element kinds and answers parent
/// applicability. Kinds are tried in registration order.
#[derive(Debug, Clone)]
pub struct ExtensionRegistry {
    kinds: Vec<ExtensionKind>,
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self {
            kinds: ExtensionKind::ALL.to_vec(),
        }
    }
}

impl ExtensionRegistry {
    pub fn kinds(&self) -> &[ExtensionKind] {
        &self.kinds
    }

    /// First registered kind whose descriptor matches both strings exactly.
    pub fn find_by_name(&self, element_name: &str, namespace: &str) -> Option<ExtensionKind> {
        self.kinds.iter().copied().find(|kind| {
            let d = kind.descriptor();
            d.element_name == element_name && d.namespace == namespace
        })
    }

    pub fn allows_parent(&self, kind: ExtensionKind, parent: ParentKind) -> bool {
        kind.descriptor().parents.contains(&parent)
    }
}

// ============================================================================
// Collection
// ============================================================================

/// Identifies the tree node owning an [`ExtensionCollection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtensionParent {
    Types,
    Port(PortId),
    Binding(BindingId),
    OperationBinding(OperationBindingId),
    MessageBinding(MessageBindingId),
}

/// One attached element plus its contract flags.
///
/// `required` is declared by the document: an unrecognized required element
/// invalidates the binding it is attached to. `handled` is set by whichever
/// importer consumes the element; an entry left unhandled after import is a
/// contract-violation signal, not itself fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionEntry {
    pub element: ExtensionElement,
    pub required: bool,
    pub handled: bool,
}

/// Ordered extension container attached to one tree node.
///
/// `add` is the only ownership-transfer operation: once added, an element's
/// lifetime is tied to the collection, and there is no removal API. Lookup is
/// first-match in insertion order; later duplicates are shadowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionCollection {
    owner: ExtensionParent,
    entries: Vec<ExtensionEntry>,
}

impl ExtensionCollection {
    pub fn new(owner: ExtensionParent) -> Self {
        Self {
            owner,
            entries: Vec::new(),
        }
    }

    /// The node this collection (and every element in it) belongs to.
    pub fn owner(&self) -> ExtensionParent {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends an optional element, transferring ownership to this collection.
    pub fn add(&mut self, element: ExtensionElement) {
        self.push(element, false);
    }

    /// Appends an element whose `required` flag is set.
    pub fn add_required(&mut self, element: ExtensionElement) {
        self.push(element, true);
    }

    fn push(&mut self, element: ExtensionElement, required: bool) {
        self.entries.push(ExtensionEntry {
            element,
            required,
            handled: false,
        });
    }

    /// First entry of the given kind, in insertion order.
    pub fn find(&self, kind: ExtensionKind) -> Option<&ExtensionEntry> {
        self.entries.iter().find(|e| e.element.kind() == kind)
    }

    pub fn find_mut(&mut self, kind: ExtensionKind) -> Option<&mut ExtensionEntry> {
        self.entries.iter_mut().find(|e| e.element.kind() == kind)
    }

    /// Marks the first entry of the given kind handled. Returns false when no
    /// such entry exists.
    pub fn mark_handled(&mut self, kind: ExtensionKind) -> bool {
        match self.find_mut(kind) {
            Some(entry) => {
                entry.handled = true;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtensionEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ExtensionEntry> {
        self.entries.iter_mut()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> ExtensionCollection {
        ExtensionCollection::new(ExtensionParent::Types)
    }

    #[test]
    fn find_returns_first_added_of_kind() {
        let mut exts = collection();
        exts.add(ExtensionElement::HttpBinding {
            verb: "GET".to_string(),
        });
        exts.add(ExtensionElement::HttpBinding {
            verb: "POST".to_string(),
        });

        let found = exts.find(ExtensionKind::HttpBinding).expect("present");
        assert_eq!(
            found.element,
            ExtensionElement::HttpBinding {
                verb: "GET".to_string()
            }
        );
    }

    #[test]
    fn later_duplicate_does_not_change_find_result() {
        let mut exts = collection();
        exts.add(ExtensionElement::HttpAddress {
            location: "http://one".to_string(),
        });
        let before = exts.find(ExtensionKind::HttpAddress).cloned();
        exts.add(ExtensionElement::HttpAddress {
            location: "http://two".to_string(),
        });
        assert_eq!(exts.find(ExtensionKind::HttpAddress).cloned(), before);
        assert_eq!(exts.len(), 2);
    }

    #[test]
    fn find_is_kind_exact_across_soap_versions() {
        let mut exts = collection();
        exts.add(ExtensionElement::SoapAddress {
            version: SoapVersion::V1_2,
            location: "http://svc".to_string(),
        });
        assert!(exts
            .find(ExtensionKind::SoapAddress(SoapVersion::V1_1))
            .is_none());
        assert!(exts
            .find(ExtensionKind::SoapAddress(SoapVersion::V1_2))
            .is_some());
    }

    #[test]
    fn mark_handled_mutates_in_place() {
        let mut exts = collection();
        exts.add_required(ExtensionElement::HttpUrlEncoded);
        assert!(!exts.find(ExtensionKind::HttpUrlEncoded).unwrap().handled);
        assert!(exts.mark_handled(ExtensionKind::HttpUrlEncoded));
        assert!(exts.find(ExtensionKind::HttpUrlEncoded).unwrap().handled);
        assert!(!exts.mark_handled(ExtensionKind::MimeXml));
    }

    #[test]
    fn registry_resolves_names_byte_for_byte() {
        let registry = ExtensionRegistry::default();
        assert_eq!(
            registry.find_by_name("binding", crate::ns::SOAP11_NS),
            Some(ExtensionKind::SoapBinding(SoapVersion::V1_1))
        );
        assert_eq!(
            registry.find_by_name("binding", crate::ns::SOAP12_NS),
            Some(ExtensionKind::SoapBinding(SoapVersion::V1_2))
        );
        assert_eq!(
            registry.find_by_name("binding", crate::ns::HTTP_NS),
            Some(ExtensionKind::HttpBinding)
        );
        // Trailing-slash and case differences must not resolve.
        assert_eq!(
            registry.find_by_name("binding", "http://schemas.xmlsoap.org/wsdl/soap"),
            None
        );
        assert_eq!(registry.find_by_name("Binding", crate::ns::HTTP_NS), None);
    }

    #[test]
    fn registry_reports_applicable_parents() {
        let registry = ExtensionRegistry::default();
        assert!(registry.allows_parent(ExtensionKind::HttpUrlEncoded, ParentKind::InputBinding));
        assert!(!registry.allows_parent(ExtensionKind::HttpUrlEncoded, ParentKind::OutputBinding));
        assert!(registry.allows_parent(
            ExtensionKind::SoapAddress(SoapVersion::V1_1),
            ParentKind::Port
        ));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn arb_element() -> impl Strategy<Value = ExtensionElement> {
            prop_oneof![
                "[a-z]{1,8}".prop_map(|verb| ExtensionElement::HttpBinding { verb }),
                "[a-z]{1,8}".prop_map(|location| ExtensionElement::HttpAddress { location }),
                Just(ExtensionElement::HttpUrlEncoded),
                "[a-z]{1,8}".prop_map(|ct| ExtensionElement::MimeContent {
                    part: None,
                    content_type: ct
                }),
            ]
        }

        proptest! {
            /// First-match invariant: whatever else is appended afterwards,
            /// `find` keeps returning the earliest element of each kind.
            #[test]
            fn find_returns_earliest_of_each_kind(elements in prop::collection::vec(arb_element(), 1..20)) {
                let mut exts = ExtensionCollection::new(ExtensionParent::Types);
                for e in &elements {
                    exts.add(e.clone());
                }
                for kind in [
                    ExtensionKind::HttpBinding,
                    ExtensionKind::HttpAddress,
                    ExtensionKind::HttpUrlEncoded,
                    ExtensionKind::MimeContent,
                ] {
                    let expected = elements.iter().find(|e| e.kind() == kind);
                    prop_assert_eq!(exts.find(kind).map(|e| &e.element), expected);
                }
            }
        }
    }
}
