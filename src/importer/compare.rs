//! Scope-insensitive equivalence between entities of two different modules.
//!
//! Member matching (stub detection, edited-method discovery) compares a
//! source-module entity against a target-module entity. Tokens mean nothing
//! across modules, so token-carrying positions are resolved to declaring-name
//! chains in their own module and compared by name; everything else is
//! compared structurally.

use crate::metadata::{
    module::ModuleDef,
    signatures::{SignatureMethod, SignatureParameter, SignatureProperty, TypeSignature},
    token::{TableId, Token},
};

/// Depth cap for walks over nested-type and scope chains.
const MAX_CHAIN_DEPTH: usize = 500;

/// Resolves a type-def-or-ref token to its declaring-name chain, outermost
/// first. Each element is a (namespace, name) pair; nested entries carry an
/// empty namespace. Returns `None` for tokens that do not resolve or for
/// degenerate chains.
pub(crate) fn type_name_chain(module: &ModuleDef, token: Token) -> Option<Vec<(String, String)>> {
    let mut chain = Vec::new();
    if token.is_table(TableId::TypeDef) {
        let mut current = module.type_def(token)?;
        for _ in 0..MAX_CHAIN_DEPTH {
            chain.push((current.namespace.clone(), current.name.clone()));
            match current.enclosing_type {
                Some(outer) => current = module.type_def(outer)?,
                None => {
                    chain.reverse();
                    return Some(chain);
                }
            }
        }
        None
    } else if token.is_table(TableId::TypeRef) {
        let mut current = module.type_ref(token)?;
        for _ in 0..MAX_CHAIN_DEPTH {
            chain.push((current.namespace.clone(), current.name.clone()));
            match current.scope {
                crate::metadata::types::ResolutionScope::TypeRef(outer) => {
                    current = module.type_ref(outer)?;
                }
                _ => {
                    chain.reverse();
                    return Some(chain);
                }
            }
        }
        None
    } else {
        None
    }
}

/// True when two type-def-or-ref-or-spec tokens name the same type, ignoring
/// which scope each side resolves through.
pub(crate) fn types_equiv(
    src_module: &ModuleDef,
    src: Token,
    tgt_module: &ModuleDef,
    tgt: Token,
) -> bool {
    if src.is_table(TableId::TypeSpec) || tgt.is_table(TableId::TypeSpec) {
        let (Some(a), Some(b)) = (src_module.type_spec(src), tgt_module.type_spec(tgt)) else {
            return false;
        };
        return sigs_equiv(src_module, &a.signature, tgt_module, &b.signature);
    }
    match (
        type_name_chain(src_module, src),
        type_name_chain(tgt_module, tgt),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn params_equiv(
    src_module: &ModuleDef,
    a: &[SignatureParameter],
    tgt_module: &ModuleDef,
    b: &[SignatureParameter],
) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            x.by_ref == y.by_ref && sigs_equiv(src_module, &x.base, tgt_module, &y.base)
        })
}

/// Structural type-signature equivalence across two modules.
pub(crate) fn sigs_equiv(
    src_module: &ModuleDef,
    a: &TypeSignature,
    tgt_module: &ModuleDef,
    b: &TypeSignature,
) -> bool {
    use TypeSignature as T;
    match (a, b) {
        (T::ValueType(x), T::ValueType(y)) | (T::Class(x), T::Class(y)) => {
            types_equiv(src_module, *x, tgt_module, *y)
        }
        (
            T::GenericParamType { number: x, .. },
            T::GenericParamType { number: y, .. },
        )
        | (
            T::GenericParamMethod { number: x, .. },
            T::GenericParamMethod { number: y, .. },
        ) => x == y,
        (T::Ptr(x), T::Ptr(y)) => sigs_equiv(src_module, &x.base, tgt_module, &y.base),
        (T::ByRef(x), T::ByRef(y)) | (T::Pinned(x), T::Pinned(y)) => {
            sigs_equiv(src_module, x, tgt_module, y)
        }
        (T::SzArray(x), T::SzArray(y)) => sigs_equiv(src_module, &x.base, tgt_module, &y.base),
        (T::Array(x), T::Array(y)) => {
            x.rank == y.rank
                && x.sizes == y.sizes
                && x.lower_bounds == y.lower_bounds
                && sigs_equiv(src_module, &x.base, tgt_module, &y.base)
        }
        (T::GenericInst(x, xargs), T::GenericInst(y, yargs)) => {
            sigs_equiv(src_module, x, tgt_module, y)
                && xargs.len() == yargs.len()
                && xargs
                    .iter()
                    .zip(yargs)
                    .all(|(p, q)| sigs_equiv(src_module, p, tgt_module, q))
        }
        (T::FnPtr(x), T::FnPtr(y)) => method_sigs_equiv(src_module, x, tgt_module, y),
        (T::ModifiedRequired(xm, x), T::ModifiedRequired(ym, y))
        | (T::ModifiedOptional(xm, x), T::ModifiedOptional(ym, y)) => {
            types_equiv(src_module, *xm, tgt_module, *ym)
                && sigs_equiv(src_module, x, tgt_module, y)
        }
        (T::ValueArray(xl, x), T::ValueArray(yl, y)) => {
            xl == yl && sigs_equiv(src_module, x, tgt_module, y)
        }
        (T::Module(xi, x), T::Module(yi, y)) => {
            xi == yi && sigs_equiv(src_module, x, tgt_module, y)
        }
        // Unit variants (primitives, sentinels) compare by discriminant.
        _ => std::mem::discriminant(a) == std::mem::discriminant(b),
    }
}

/// Full method-signature equivalence: calling convention, generic arity,
/// return type, and parameters all match.
pub(crate) fn method_sigs_equiv(
    src_module: &ModuleDef,
    a: &SignatureMethod,
    tgt_module: &ModuleDef,
    b: &SignatureMethod,
) -> bool {
    a.has_this == b.has_this && method_sigs_equiv_ignoring_this(src_module, a, tgt_module, b)
}

/// Method-signature equivalence that ignores the `this` convention.
///
/// The edited-method discovery uses this form so an edit that toggles static
/// still resolves to its original method (and is then reported as IM0009).
pub(crate) fn method_sigs_equiv_ignoring_this(
    src_module: &ModuleDef,
    a: &SignatureMethod,
    tgt_module: &ModuleDef,
    b: &SignatureMethod,
) -> bool {
    a.explicit_this == b.explicit_this
        && a.vararg == b.vararg
        && a.param_count_generic == b.param_count_generic
        && sigs_equiv(src_module, &a.return_type.base, tgt_module, &b.return_type.base)
        && params_equiv(src_module, &a.params, tgt_module, &b.params)
}

/// Method-signature equivalence ignoring the return type, for collision keys
/// in the name deduplicator.
pub(crate) fn method_sigs_equiv_ignoring_return(
    src_module: &ModuleDef,
    a: &SignatureMethod,
    tgt_module: &ModuleDef,
    b: &SignatureMethod,
) -> bool {
    a.has_this == b.has_this
        && a.vararg == b.vararg
        && a.param_count_generic == b.param_count_generic
        && params_equiv(src_module, &a.params, tgt_module, &b.params)
}

/// Property-signature equivalence ignoring the property type, for collision
/// keys in the name deduplicator.
pub(crate) fn property_sigs_equiv_ignoring_return(
    src_module: &ModuleDef,
    a: &SignatureProperty,
    tgt_module: &ModuleDef,
    b: &SignatureProperty,
) -> bool {
    a.has_this == b.has_this && params_equiv(src_module, &a.params, tgt_module, &b.params)
}

/// Full property-signature equivalence, for stub matching.
pub(crate) fn property_sigs_equiv(
    src_module: &ModuleDef,
    a: &SignatureProperty,
    tgt_module: &ModuleDef,
    b: &SignatureProperty,
) -> bool {
    sigs_equiv(src_module, &a.base, tgt_module, &b.base)
        && property_sigs_equiv_ignoring_return(src_module, a, tgt_module, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        identity::{AssemblyIdentity, AssemblyVersion},
        types::{ResolutionScope, TypeAttributes, TypeDef, TypeRef},
    };

    fn module(name: &str) -> ModuleDef {
        ModuleDef::new(
            format!("{name}.dll"),
            AssemblyIdentity::new(name, AssemblyVersion::new(1, 0, 0, 0), None, None),
        )
    }

    #[test]
    fn name_chain_for_nested_def() {
        let mut m = module("Lib");
        let outer = m.push_type_def(TypeDef::new("NS", "Outer", TypeAttributes::PUBLIC));
        let mut inner = TypeDef::new("", "Inner", TypeAttributes::NESTED_PUBLIC);
        inner.enclosing_type = Some(outer);
        let inner = m.push_type_def(inner);

        assert_eq!(
            type_name_chain(&m, inner).unwrap(),
            vec![
                ("NS".to_string(), "Outer".to_string()),
                (String::new(), "Inner".to_string())
            ]
        );
    }

    #[test]
    fn def_and_ref_compare_by_chain() {
        let mut src = module("Source");
        let asm_ref = src.get_or_create_assembly_ref(&AssemblyIdentity::new(
            "Other",
            AssemblyVersion::new(1, 0, 0, 0),
            None,
            None,
        ));
        let r = src.push_type_ref(TypeRef::new(
            ResolutionScope::AssemblyRef(asm_ref),
            "NS",
            "Widget",
        ));

        let mut tgt = module("Target");
        let d = tgt.push_type_def(TypeDef::new("NS", "Widget", TypeAttributes::PUBLIC));

        assert!(types_equiv(&src, r, &tgt, d));

        let other = tgt.push_type_def(TypeDef::new("NS", "Gadget", TypeAttributes::PUBLIC));
        assert!(!types_equiv(&src, r, &tgt, other));
    }

    #[test]
    fn method_sig_equivalence_modes() {
        let src = module("Source");
        let tgt = module("Target");
        let instance = SignatureMethod::new(true, TypeSignature::Void, vec![TypeSignature::I4]);
        let stat = SignatureMethod::new(false, TypeSignature::Void, vec![TypeSignature::I4]);

        assert!(!method_sigs_equiv(&src, &stat, &tgt, &instance));
        assert!(method_sigs_equiv_ignoring_this(&src, &stat, &tgt, &instance));

        let other_ret = SignatureMethod::new(true, TypeSignature::I4, vec![TypeSignature::I4]);
        assert!(method_sigs_equiv_ignoring_return(&src, &instance, &tgt, &other_ret));
        assert!(!method_sigs_equiv(&src, &instance, &tgt, &other_ret));
    }
}
