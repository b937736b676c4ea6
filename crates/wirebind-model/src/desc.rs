//! Arena-stored description tree.
//!
//! All nodes live in index tables on [`ServiceDescription`]. Ids are typed
//! newtypes over table indices; they are only meaningful against the tree
//! that issued them. Construction is append-only: nodes are never removed or
//! re-parented, which keeps every id stable for the lifetime of the tree.

use serde::{Deserialize, Serialize};

use crate::ext::{ExtensionCollection, ExtensionParent};
use crate::ModelError;

/// XML qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QName {
    pub local: String,
    pub namespace: String,
}

impl QName {
    pub fn new(local: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            namespace: namespace.into(),
        }
    }
}

impl std::fmt::Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local)
    }
}

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Index of a [`Message`] in its description tree.
    MessageId
);
arena_id!(
    /// Index of a [`Port`] in its description tree.
    PortId
);
arena_id!(
    /// Index of a [`Binding`] in its description tree.
    BindingId
);
arena_id!(
    /// Index of an [`OperationBinding`] in its description tree.
    OperationBindingId
);
arena_id!(
    /// Index of a [`MessageBinding`] in its description tree.
    MessageBindingId
);

// ============================================================================
// Nodes
// ============================================================================

/// Abstract message: an ordered list of named parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub name: String,
    pub parts: Vec<MessagePart>,
}

/// One part of an abstract message. A part references either a schema element
/// (structured payload) or a plain type name (scalar payload), never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePart {
    pub name: String,
    pub element: Option<QName>,
    pub type_name: Option<String>,
}

impl MessagePart {
    pub fn typed(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element: None,
            type_name: Some(type_name.into()),
        }
    }

    pub fn element(name: impl Into<String>, element: QName) -> Self {
        Self {
            name: name.into(),
            element: Some(element),
            type_name: None,
        }
    }
}

/// A named endpoint referencing one binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub binding: BindingId,
    pub extensions: ExtensionCollection,
}

/// A named set of concrete wire-format choices applied to a set of
/// operations. Owned by the root description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    operations: Vec<OperationBindingId>,
    pub extensions: ExtensionCollection,
}

impl Binding {
    pub fn operations(&self) -> &[OperationBindingId] {
        &self.operations
    }
}

/// One operation's concrete binding. Owns at most one input, one output and
/// any number of fault message bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationBinding {
    pub name: String,
    parent: BindingId,
    input: Option<MessageBindingId>,
    output: Option<MessageBindingId>,
    faults: Vec<MessageBindingId>,
    /// Abstract input message, when the operation takes one.
    pub input_message: Option<MessageId>,
    /// Abstract output message; `None` for one-way operations.
    pub output_message: Option<MessageId>,
    pub extensions: ExtensionCollection,
}

impl OperationBinding {
    pub fn parent(&self) -> BindingId {
        self.parent
    }

    pub fn input(&self) -> Option<MessageBindingId> {
        self.input
    }

    pub fn output(&self) -> Option<MessageBindingId> {
        self.output
    }

    pub fn faults(&self) -> &[MessageBindingId] {
        &self.faults
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageDirection {
    Input,
    Output,
    Fault,
}

/// Concrete binding of one message of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBinding {
    pub direction: MessageDirection,
    parent: OperationBindingId,
    /// Fault message bindings are named; input/output are not.
    pub name: Option<String>,
    pub extensions: ExtensionCollection,
}

impl MessageBinding {
    pub fn parent(&self) -> OperationBindingId {
        self.parent
    }
}

// ============================================================================
// Root
// ============================================================================

/// Root of the description tree and arena for every node in it.
///
/// The tree is single-owner for the duration of a pass; reflection and import
/// mutate it in place through `&mut` access and typed ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescription {
    pub name: String,
    pub target_namespace: String,
    /// Configuration override key for the client endpoint URL.
    pub app_setting_url_key: Option<String>,
    /// Configuration override key for the base URL the endpoint is relative to.
    pub app_setting_base_url: Option<String>,
    pub types_extensions: ExtensionCollection,
    messages: Vec<Message>,
    ports: Vec<Port>,
    bindings: Vec<Binding>,
    operation_bindings: Vec<OperationBinding>,
    message_bindings: Vec<MessageBinding>,
}

impl ServiceDescription {
    pub fn new(name: impl Into<String>, target_namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_namespace: target_namespace.into(),
            app_setting_url_key: None,
            app_setting_base_url: None,
            types_extensions: ExtensionCollection::new(ExtensionParent::Types),
            messages: Vec::new(),
            ports: Vec::new(),
            bindings: Vec::new(),
            operation_bindings: Vec::new(),
            message_bindings: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    pub fn add_message(&mut self, name: impl Into<String>) -> MessageId {
        self.messages.push(Message {
            name: name.into(),
            parts: Vec::new(),
        });
        MessageId(self.messages.len() - 1)
    }

    pub fn add_part(&mut self, message: MessageId, part: MessagePart) {
        self.messages[message.0].parts.push(part);
    }

    pub fn add_binding(&mut self, name: impl Into<String>) -> BindingId {
        let id = BindingId(self.bindings.len());
        self.bindings.push(Binding {
            name: name.into(),
            operations: Vec::new(),
            extensions: ExtensionCollection::new(ExtensionParent::Binding(id)),
        });
        id
    }

    pub fn add_port(&mut self, name: impl Into<String>, binding: BindingId) -> PortId {
        let id = PortId(self.ports.len());
        self.ports.push(Port {
            name: name.into(),
            binding,
            extensions: ExtensionCollection::new(ExtensionParent::Port(id)),
        });
        id
    }

    pub fn add_operation_binding(
        &mut self,
        binding: BindingId,
        name: impl Into<String>,
    ) -> OperationBindingId {
        let id = OperationBindingId(self.operation_bindings.len());
        self.operation_bindings.push(OperationBinding {
            name: name.into(),
            parent: binding,
            input: None,
            output: None,
            faults: Vec::new(),
            input_message: None,
            output_message: None,
            extensions: ExtensionCollection::new(ExtensionParent::OperationBinding(id)),
        });
        self.bindings[binding.0].operations.push(id);
        id
    }

    /// Attaches a message binding to an operation binding. Input and output
    /// slots accept exactly one binding each; faults accumulate.
    pub fn add_message_binding(
        &mut self,
        operation: OperationBindingId,
        direction: MessageDirection,
        name: Option<String>,
    ) -> Result<MessageBindingId, ModelError> {
        let id = MessageBindingId(self.message_bindings.len());
        let op = &mut self.operation_bindings[operation.0];
        match direction {
            MessageDirection::Input => {
                if op.input.is_some() {
                    return Err(ModelError::DuplicateMessageBinding {
                        operation: op.name.clone(),
                        direction,
                    });
                }
                op.input = Some(id);
            }
            MessageDirection::Output => {
                if op.output.is_some() {
                    return Err(ModelError::DuplicateMessageBinding {
                        operation: op.name.clone(),
                        direction,
                    });
                }
                op.output = Some(id);
            }
            MessageDirection::Fault => op.faults.push(id),
        }
        self.message_bindings.push(MessageBinding {
            direction,
            parent: operation,
            name,
            extensions: ExtensionCollection::new(ExtensionParent::MessageBinding(id)),
        });
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    pub fn message(&self, id: MessageId) -> &Message {
        &self.messages[id.0]
    }

    pub fn port(&self, id: PortId) -> &Port {
        &self.ports[id.0]
    }

    pub fn port_mut(&mut self, id: PortId) -> &mut Port {
        &mut self.ports[id.0]
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.0]
    }

    pub fn binding_mut(&mut self, id: BindingId) -> &mut Binding {
        &mut self.bindings[id.0]
    }

    pub fn operation_binding(&self, id: OperationBindingId) -> &OperationBinding {
        &self.operation_bindings[id.0]
    }

    pub fn operation_binding_mut(&mut self, id: OperationBindingId) -> &mut OperationBinding {
        &mut self.operation_bindings[id.0]
    }

    pub fn message_binding(&self, id: MessageBindingId) -> &MessageBinding {
        &self.message_bindings[id.0]
    }

    pub fn message_binding_mut(&mut self, id: MessageBindingId) -> &mut MessageBinding {
        &mut self.message_bindings[id.0]
    }

    pub fn bindings(&self) -> impl Iterator<Item = (BindingId, &Binding)> {
        self.bindings.iter().enumerate().map(|(i, b)| (BindingId(i), b))
    }

    pub fn ports(&self) -> impl Iterator<Item = (PortId, &Port)> {
        self.ports.iter().enumerate().map(|(i, p)| (PortId(i), p))
    }

    /// First port referencing the given binding, if any.
    pub fn port_for_binding(&self, binding: BindingId) -> Option<PortId> {
        self.ports
            .iter()
            .position(|p| p.binding == binding)
            .map(PortId)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::{ExtensionElement, ExtensionParent};

    #[test]
    fn children_record_their_owner() {
        let mut desc = ServiceDescription::new("Quote", "urn:quote");
        let binding = desc.add_binding("QuoteSoap");
        let op = desc.add_operation_binding(binding, "GetQuote");
        let input = desc
            .add_message_binding(op, MessageDirection::Input, None)
            .unwrap();

        assert_eq!(desc.operation_binding(op).parent(), binding);
        assert_eq!(desc.message_binding(input).parent(), op);
        assert_eq!(desc.binding(binding).operations(), &[op]);
        assert_eq!(
            desc.message_binding(input).extensions.owner(),
            ExtensionParent::MessageBinding(input)
        );
    }

    #[test]
    fn input_and_output_slots_are_exclusive() {
        let mut desc = ServiceDescription::new("Quote", "urn:quote");
        let binding = desc.add_binding("QuoteSoap");
        let op = desc.add_operation_binding(binding, "GetQuote");

        desc.add_message_binding(op, MessageDirection::Input, None)
            .unwrap();
        let err = desc
            .add_message_binding(op, MessageDirection::Input, None)
            .unwrap_err();
        assert!(err.to_string().contains("GetQuote"));

        desc.add_message_binding(op, MessageDirection::Fault, Some("Overflow".to_string()))
            .unwrap();
        desc.add_message_binding(op, MessageDirection::Fault, Some("Underflow".to_string()))
            .unwrap();
        assert_eq!(desc.operation_binding(op).faults().len(), 2);
    }

    #[test]
    fn port_for_binding_returns_first_port() {
        let mut desc = ServiceDescription::new("Quote", "urn:quote");
        let binding = desc.add_binding("QuoteGet");
        let first = desc.add_port("QuoteGetPort", binding);
        desc.add_port("QuoteGetPortAlt", binding);
        assert_eq!(desc.port_for_binding(binding), Some(first));
    }

    #[test]
    fn tree_round_trips_through_json() {
        let mut desc = ServiceDescription::new("Quote", "urn:quote");
        let binding = desc.add_binding("QuoteGet");
        let port = desc.add_port("QuoteGetPort", binding);
        desc.port_mut(port)
            .extensions
            .add(ExtensionElement::HttpAddress {
                location: "http://example.org/quote".to_string(),
            });

        let json = serde_json::to_string(&desc).unwrap();
        let back: ServiceDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
    }
}
