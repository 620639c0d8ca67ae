//! Resolved entities
//!
//! Every name in a bound tree points at one of the definitions declared here.
//! Definitions live in the arenas of [`Compilation`](crate::Compilation) and
//! are addressed by small copyable ids.

use std::fmt;

use crate::ast::{Block, Span};
use crate::ty::Ty;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Create an id from a raw arena index
            pub fn new(index: u32) -> Self {
                Self(index)
            }

            /// Raw arena index
            pub fn as_u32(self) -> u32 {
                self.0
            }

            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Id of a type definition (class)
    TypeDefId,
    "type"
);
entity_id!(
    /// Id of a method or constructor
    MethodId,
    "method"
);
entity_id!(
    /// Id of a field
    FieldId,
    "field"
);
entity_id!(
    /// Id of a method parameter
    ParamId,
    "param"
);
entity_id!(
    /// Id of a method-local variable
    LocalId,
    "local"
);
entity_id!(
    /// Id of a generic parameter of a type or a method
    GenericParamId,
    "generic"
);

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    /// Visible to everything in the same compilation
    Internal,
    Private,
}

/// Who declares a generic parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericOwner {
    Type(TypeDefId),
    Method(MethodId),
}

/// A generic parameter declaration
#[derive(Debug, Clone)]
pub struct GenericParamDef {
    pub name: String,
    pub owner: GenericOwner,
}

/// A class definition
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub span: Span,
    /// Generic parameters in declaration order
    pub generic_params: Vec<GenericParamId>,
    /// Supertype, `None` for the root object type
    pub base: Option<Ty>,
    /// Implemented capabilities (interfaces)
    pub interfaces: Vec<Ty>,
    pub fields: Vec<FieldId>,
    /// Methods, ensure-methods and accessors (constructors excluded)
    pub methods: Vec<MethodId>,
    pub constructors: Vec<MethodId>,
    /// Set on types synthesized by the compiler
    pub compiler_generated: bool,
}

impl TypeDef {
    /// Create an empty, non-generic class definition
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            generic_params: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            compiler_generated: false,
        }
    }

    /// Whether the type carries generic information
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }
}

/// A field declaration
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: Ty,
    pub declaring_type: TypeDefId,
    pub visibility: Visibility,
}

/// Whether a method is an ordinary method or a constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Constructor,
}

/// A method definition together with its bound body
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: String,
    pub span: Span,
    pub kind: MethodKind,
    pub declaring_type: TypeDefId,
    pub visibility: Visibility,
    /// The method's own generic parameters
    pub generic_params: Vec<GenericParamId>,
    pub params: Vec<ParamId>,
    pub return_ty: Ty,
    pub body: Block,
    /// Locals declared anywhere in the body
    pub locals: Vec<LocalId>,
}

impl MethodDef {
    /// Create a method with an empty body
    pub fn new(name: impl Into<String>, declaring_type: TypeDefId, return_ty: Ty, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            kind: MethodKind::Method,
            declaring_type,
            visibility: Visibility::Public,
            generic_params: Vec::new(),
            params: Vec::new(),
            return_ty,
            body: Block::default(),
            locals: Vec::new(),
        }
    }

    /// Whether the method declares generic parameters of its own
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }
}

/// A method parameter
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: String,
    pub ty: Ty,
    /// Set by semantic analysis when the body reads or writes the parameter
    pub used: bool,
}

/// Where a local's originating declaration sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalOrigin {
    /// Declared in the method body proper
    Body,
    /// Declared by or inside a catch clause
    CatchClause,
    /// Declared inside a finally clause
    FinallyClause,
    /// Introduced by an earlier lowering step
    Synthetic,
}

impl LocalOrigin {
    /// Whether the local lives entirely inside an exception handler
    pub fn is_exception_handler(self) -> bool {
        matches!(self, LocalOrigin::CatchClause | LocalOrigin::FinallyClause)
    }
}

/// A local variable
#[derive(Debug, Clone)]
pub struct LocalDef {
    pub name: String,
    pub ty: Ty,
    pub origin: LocalOrigin,
}
