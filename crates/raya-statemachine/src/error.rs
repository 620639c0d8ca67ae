//! State machine lowering errors

use thiserror::Error;

use crate::ast::Span;

pub type StateMachineResult<T> = Result<T, StateMachineError>;

/// Unsupported constructs found while lowering a method.
///
/// These abort the lowering of the current method only; the rest of the
/// compilation carries on.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StateMachineError {
    /// A generic-mapped member access whose method declares its own generic
    /// parameters
    #[error("Mapping generic method '{method}' in a generator is not supported")]
    GenericMethodMapping {
        /// Name of the generic method
        method: String,
        /// Location of the member access
        span: Span,
    },

    /// A generic-mapped member access whose declaring type has no generic
    /// parameters
    #[error("Mapping member of non-generic type '{type_name}' through a generic instantiation is not supported")]
    MissingGenericInfo {
        /// Name of the declaring type
        type_name: String,
        /// Location of the member access
        span: Span,
    },

    /// A suspension point inside a catch or finally clause, or inside a
    /// protected block that has catch handlers
    #[error("Suspension point inside an exception handler is not supported")]
    SuspensionInHandler {
        /// Location of the suspension point
        span: Span,
    },
}

impl StateMachineError {
    /// Location of the node that triggered the error
    pub fn span(&self) -> Span {
        match self {
            StateMachineError::GenericMethodMapping { span, .. }
            | StateMachineError::MissingGenericInfo { span, .. }
            | StateMachineError::SuspensionInHandler { span } => *span,
        }
    }
}
