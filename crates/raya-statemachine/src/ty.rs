//! Resolved type model

use crate::entity::{GenericParamId, TypeDefId};

/// A fully resolved type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    /// No value
    Void,
    Bool,
    Int,
    Str,
    /// The root object type
    Object,
    /// A non-generic class, or a generic class definition used without arguments
    Named(TypeDefId),
    /// A generic class instantiated over type arguments: `List<T>`
    Constructed { def: TypeDefId, args: Vec<Ty> },
    /// A reference to a generic parameter of a type or method
    GenericParam(GenericParamId),
    /// `T[]`
    Array(Box<Ty>),
    /// Callable signature `(A, B) -> R`
    Callable { params: Vec<Ty>, ret: Box<Ty> },
}

impl Ty {
    /// Construct `def<args>`; a class without arguments stays [`Ty::Named`]
    pub fn constructed(def: TypeDefId, args: Vec<Ty>) -> Ty {
        if args.is_empty() {
            Ty::Named(def)
        } else {
            Ty::Constructed { def, args }
        }
    }

    /// Construct an array of `element`
    pub fn array(element: Ty) -> Ty {
        Ty::Array(Box::new(element))
    }

    /// Construct a callable signature
    pub fn callable(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Callable {
            params,
            ret: Box::new(ret),
        }
    }

    /// The class definition this type refers to, if any
    pub fn type_def(&self) -> Option<TypeDefId> {
        match self {
            Ty::Named(def) | Ty::Constructed { def, .. } => Some(*def),
            _ => None,
        }
    }

    /// Generic arguments of a constructed type
    pub fn generic_args(&self) -> &[Ty] {
        match self {
            Ty::Constructed { args, .. } => args,
            _ => &[],
        }
    }

    /// Rebuild the type bottom-up, letting `f` replace generic parameters
    pub fn map_generic_params(&self, f: &impl Fn(GenericParamId) -> Ty) -> Ty {
        match self {
            Ty::GenericParam(id) => f(*id),
            Ty::Constructed { def, args } => Ty::Constructed {
                def: *def,
                args: args.iter().map(|a| a.map_generic_params(f)).collect(),
            },
            Ty::Array(element) => Ty::array(element.map_generic_params(f)),
            Ty::Callable { params, ret } => Ty::callable(
                params.iter().map(|p| p.map_generic_params(f)).collect(),
                ret.map_generic_params(f),
            ),
            other => other.clone(),
        }
    }

    /// Visit every generic parameter mentioned by the type
    pub fn for_each_generic_param(&self, f: &mut impl FnMut(GenericParamId)) {
        match self {
            Ty::GenericParam(id) => f(*id),
            Ty::Constructed { args, .. } => args.iter().for_each(|a| a.for_each_generic_param(f)),
            Ty::Array(element) => element.for_each_generic_param(f),
            Ty::Callable { params, ret } => {
                params.iter().for_each(|p| p.for_each_generic_param(f));
                ret.for_each_generic_param(f);
            }
            _ => {}
        }
    }
}
