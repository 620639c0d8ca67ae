//! Generic Parameter Substitution
//!
//! The synthetic type is declared outside the lexical scope of the source
//! method, so it cannot see the generics of the method or of its declaring
//! type. Each of them is cloned onto the synthetic type and every type
//! mentioned by the rewritten body is passed through this map.

use rustc_hash::FxHashMap;

use crate::compilation::Compilation;
use crate::entity::{GenericOwner, GenericParamId, TypeDefId};
use crate::ty::Ty;

/// Bidirectional mapping between source generic parameters and the
/// synthetic type's own copies
#[derive(Debug, Clone, Default)]
pub struct GenericMap {
    /// Source parameter -> synthetic parameter
    forward: FxHashMap<GenericParamId, GenericParamId>,
    /// Synthetic parameter -> source parameter
    backward: FxHashMap<GenericParamId, GenericParamId>,
    /// The synthetic type's parameter list, in declaration order
    synthetic: Vec<GenericParamId>,
}

impl GenericMap {
    /// Clone `source` (declaring-type generics first, then method generics)
    /// onto the synthetic type `owner`
    pub fn build(cx: &mut Compilation, source: &[GenericParamId], owner: TypeDefId) -> Self {
        let mut map = Self::default();
        for &param in source {
            let name = cx.generic_param(param).name.clone();
            let copy = cx.add_generic_param(name, GenericOwner::Type(owner));
            map.forward.insert(param, copy);
            map.backward.insert(copy, param);
            map.synthetic.push(copy);
        }
        map
    }

    /// The synthetic type's generic parameters, in order
    pub fn synthetic_params(&self) -> &[GenericParamId] {
        &self.synthetic
    }

    pub fn is_empty(&self) -> bool {
        self.synthetic.is_empty()
    }

    /// Map one parameter; parameters without a substitution map to themselves
    pub fn map_param(&self, param: GenericParamId) -> GenericParamId {
        self.forward.get(&param).copied().unwrap_or(param)
    }

    /// The source parameter a synthetic parameter was cloned from
    pub fn source_of(&self, synthetic: GenericParamId) -> Option<GenericParamId> {
        self.backward.get(&synthetic).copied()
    }

    /// Rewrite every generic parameter in `ty` through the map
    pub fn map_ty(&self, ty: &Ty) -> Ty {
        ty.map_generic_params(&|param| Ty::GenericParam(self.map_param(param)))
    }

    /// Find the synthetic parameter called `name`
    pub fn synthetic_by_name(&self, cx: &Compilation, name: &str) -> Option<GenericParamId> {
        self.synthetic
            .iter()
            .copied()
            .find(|&param| cx.generic_param(param).name == name)
    }

    /// The synthetic parameters as type arguments
    pub fn synthetic_args(&self) -> Vec<Ty> {
        self.synthetic.iter().map(|&p| Ty::GenericParam(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::entity::TypeDef;

    fn setup() -> (Compilation, GenericParamId, GenericParamId, TypeDefId, TypeDefId) {
        let mut cx = Compilation::new();
        let owner = cx.add_type(TypeDef::new("Box", Span::default()));
        let t = cx.add_generic_param("T", GenericOwner::Type(owner));
        let u = cx.add_generic_param("U", GenericOwner::Type(owner));
        let synthetic = cx.reserve_type();
        (cx, t, u, owner, synthetic)
    }

    #[test]
    fn test_build_preserves_order_and_names() {
        let (mut cx, t, u, _, synthetic) = setup();
        let map = GenericMap::build(&mut cx, &[t, u], synthetic);

        let names: Vec<&str> = map
            .synthetic_params()
            .iter()
            .map(|&p| cx.generic_param(p).name.as_str())
            .collect();
        assert_eq!(names, vec!["T", "U"]);
        assert_ne!(map.map_param(t), t);
        assert_eq!(map.source_of(map.map_param(u)), Some(u));
        assert_eq!(
            cx.generic_param(map.map_param(t)).owner,
            GenericOwner::Type(synthetic)
        );
    }

    #[test]
    fn test_map_ty_rewrites_nested_params() {
        let (mut cx, t, _, owner, synthetic) = setup();
        let map = GenericMap::build(&mut cx, &[t], synthetic);
        let t2 = map.map_param(t);

        let ty = Ty::array(Ty::constructed(owner, vec![Ty::GenericParam(t), Ty::Int]));
        assert_eq!(
            map.map_ty(&ty),
            Ty::array(Ty::constructed(owner, vec![Ty::GenericParam(t2), Ty::Int]))
        );
    }

    #[test]
    fn test_unmapped_param_is_identity() {
        let (mut cx, t, u, _, synthetic) = setup();
        let map = GenericMap::build(&mut cx, &[t], synthetic);

        assert_eq!(map.map_param(u), u);
        assert_eq!(map.map_ty(&Ty::GenericParam(u)), Ty::GenericParam(u));
        // Mapping is idempotent on the synthetic side
        let t2 = map.map_param(t);
        assert_eq!(map.map_param(t2), t2);
    }

    #[test]
    fn test_lookup_by_name() {
        let (mut cx, t, u, _, synthetic) = setup();
        let map = GenericMap::build(&mut cx, &[t, u], synthetic);

        assert_eq!(map.synthetic_by_name(&cx, "U"), Some(map.map_param(u)));
        assert_eq!(map.synthetic_by_name(&cx, "V"), None);
    }
}
