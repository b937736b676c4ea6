//! Service description data model for wirebind
//!
//! The description tree is the shared document both pipelines operate on:
//! reflection writes wire-format metadata into it, import reads that metadata
//! back out. Nodes live in arena tables on [`ServiceDescription`]; children
//! hold owning id lists and every child records a plain parent id, so owner
//! lookup is O(1) and the tree has no reference cycles.
//!
//! Wire-format metadata itself is carried by [`ext::ExtensionElement`] values
//! attached to tree nodes through ordered [`ext::ExtensionCollection`]s.
//! Insertion order is significant end to end: lookups are first-match and
//! later duplicates are shadowed, never merged.

pub mod desc;
pub mod diag;
pub mod ext;
pub mod method;
pub mod ns;

pub use desc::{
    Binding, BindingId, Message, MessageBinding, MessageBindingId, MessageDirection, MessageId,
    MessagePart, OperationBinding, OperationBindingId, Port, PortId, QName, ServiceDescription,
};
pub use diag::{Warning, WarningCode};
pub use ext::{
    ExtensionCollection, ExtensionDescriptor, ExtensionElement, ExtensionEntry, ExtensionKind,
    ExtensionParent, ExtensionRegistry, ParentKind, SoapBindingStyle, SoapBindingUse, SoapVersion,
};
pub use method::{LogicalMethod, LogicalParameter, LogicalService, LogicalType, MatchDeclaration};

use thiserror::Error;

/// Structural errors raised while building a description tree.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An operation binding may own at most one input and one output message
    /// binding.
    #[error("operation binding '{operation}' already has an {direction:?} message binding")]
    DuplicateMessageBinding {
        operation: String,
        direction: MessageDirection,
    },
}
