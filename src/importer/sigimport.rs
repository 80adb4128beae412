//! Signature translation between identity spaces.
//!
//! Walks signature trees and rewrites every token-carrying position through
//! the type resolver. Primitive element kinds are unit variants, so the
//! translated signature carries the target's canonical primitives without any
//! explicit corlib mapping step.

use crate::{
    metadata::{
        signatures::{
            SignatureArray, SignatureField, SignatureLocalVariable, SignatureMethod,
            SignatureParameter, SignaturePointer, SignatureProperty, SignatureSzArray,
            TypeSignature,
        },
        token::Token,
    },
    Error, Result,
};

use super::ModuleImporter;

impl ModuleImporter<'_> {
    /// Translates a type signature into the target identity space.
    ///
    /// Token positions that fail to resolve recoverably (diagnostic already
    /// recorded) degrade to [`TypeSignature::Unknown`], the null analog.
    pub(crate) fn import_type_sig(&mut self, sig: &TypeSignature) -> Result<TypeSignature> {
        use TypeSignature as T;
        Ok(match sig {
            // Primitives are canonical in every module.
            T::Void | T::Boolean | T::Char | T::I1 | T::U1 | T::I2 | T::U2 | T::I4 | T::U4
            | T::I8 | T::U8 | T::R4 | T::R8 | T::String | T::I | T::U | T::Object
            | T::TypedByRef | T::Sentinel => sig.clone(),

            T::ValueType(token) => match self.import_type_def_or_ref(*token)? {
                Some(translated) => T::ValueType(translated),
                None => T::Unknown,
            },
            T::Class(token) => match self.import_type_def_or_ref(*token)? {
                Some(translated) => T::Class(translated),
                None => T::Unknown,
            },

            T::Ptr(inner) => T::Ptr(SignaturePointer {
                modifiers: self.import_modifier_tokens(&inner.modifiers)?,
                base: Box::new(self.import_type_sig(&inner.base)?),
            }),
            T::ByRef(inner) => T::ByRef(Box::new(self.import_type_sig(inner)?)),
            T::Pinned(inner) => T::Pinned(Box::new(self.import_type_sig(inner)?)),
            T::SzArray(inner) => T::SzArray(SignatureSzArray {
                modifiers: self.import_modifier_tokens(&inner.modifiers)?,
                base: Box::new(self.import_type_sig(&inner.base)?),
            }),
            T::Array(inner) => T::Array(SignatureArray {
                base: Box::new(self.import_type_sig(&inner.base)?),
                rank: inner.rank,
                sizes: inner.sizes.clone(),
                lower_bounds: inner.lower_bounds.clone(),
            }),
            T::ValueArray(length, inner) => {
                T::ValueArray(*length, Box::new(self.import_type_sig(inner)?))
            }
            T::Module(index, inner) => T::Module(*index, Box::new(self.import_type_sig(inner)?)),

            T::GenericInst(base, args) => {
                let translated_base = self.import_type_sig(base)?;
                let mut translated_args = Vec::with_capacity(args.len());
                for arg in args {
                    translated_args.push(self.import_type_sig(arg)?);
                }
                T::GenericInst(Box::new(translated_base), translated_args)
            }

            T::GenericParamType { number, owner } => {
                match self.import_type_def_or_ref(*owner)? {
                    Some(translated) => T::GenericParamType {
                        number: *number,
                        owner: translated,
                    },
                    None => T::Unknown,
                }
            }
            T::GenericParamMethod { number, owner } => {
                let translated = self.method_map.get(owner).copied().ok_or_else(|| {
                    Error::internal(format!("generic method parameter owner {owner} not imported"))
                })?;
                T::GenericParamMethod {
                    number: *number,
                    owner: translated,
                }
            }

            T::FnPtr(method) => T::FnPtr(Box::new(self.import_method_sig(method)?)),

            T::ModifiedRequired(modifier, inner) => {
                match self.import_type_def_or_ref(*modifier)? {
                    Some(translated) => {
                        T::ModifiedRequired(translated, Box::new(self.import_type_sig(inner)?))
                    }
                    None => self.import_type_sig(inner)?,
                }
            }
            T::ModifiedOptional(modifier, inner) => {
                match self.import_type_def_or_ref(*modifier)? {
                    Some(translated) => {
                        T::ModifiedOptional(translated, Box::new(self.import_type_sig(inner)?))
                    }
                    None => self.import_type_sig(inner)?,
                }
            }

            T::Unknown | T::Internal => T::Unknown,
        })
    }

    fn import_modifier_tokens(&mut self, modifiers: &[Token]) -> Result<Vec<Token>> {
        let mut translated = Vec::with_capacity(modifiers.len());
        for modifier in modifiers {
            match self.import_type_def_or_ref(*modifier)? {
                Some(token) => translated.push(token),
                None => log::warn!("dropping unresolvable custom modifier {modifier}"),
            }
        }
        Ok(translated)
    }

    pub(crate) fn import_sig_param(
        &mut self,
        param: &SignatureParameter,
    ) -> Result<SignatureParameter> {
        Ok(SignatureParameter {
            modifiers: self.import_modifier_tokens(&param.modifiers)?,
            by_ref: param.by_ref,
            base: self.import_type_sig(&param.base)?,
        })
    }

    /// Translates a method signature: calling convention copied, return type,
    /// parameters, and sentinel-trailing varargs each translated.
    pub(crate) fn import_method_sig(&mut self, sig: &SignatureMethod) -> Result<SignatureMethod> {
        let mut params = Vec::with_capacity(sig.params.len());
        for param in &sig.params {
            params.push(self.import_sig_param(param)?);
        }
        let mut varargs = Vec::with_capacity(sig.varargs.len());
        for param in &sig.varargs {
            varargs.push(self.import_sig_param(param)?);
        }
        Ok(SignatureMethod {
            has_this: sig.has_this,
            explicit_this: sig.explicit_this,
            default: sig.default,
            vararg: sig.vararg,
            cdecl: sig.cdecl,
            stdcall: sig.stdcall,
            thiscall: sig.thiscall,
            fastcall: sig.fastcall,
            param_count_generic: sig.param_count_generic,
            return_type: self.import_sig_param(&sig.return_type)?,
            params,
            varargs,
        })
    }

    pub(crate) fn import_field_sig(&mut self, sig: &SignatureField) -> Result<SignatureField> {
        Ok(SignatureField {
            modifiers: self.import_modifier_tokens(&sig.modifiers)?,
            base: self.import_type_sig(&sig.base)?,
        })
    }

    pub(crate) fn import_property_sig(
        &mut self,
        sig: &SignatureProperty,
    ) -> Result<SignatureProperty> {
        let mut params = Vec::with_capacity(sig.params.len());
        for param in &sig.params {
            params.push(self.import_sig_param(param)?);
        }
        Ok(SignatureProperty {
            has_this: sig.has_this,
            modifiers: self.import_modifier_tokens(&sig.modifiers)?,
            base: self.import_type_sig(&sig.base)?,
            params,
        })
    }

    pub(crate) fn import_local_sig(
        &mut self,
        local: &SignatureLocalVariable,
    ) -> Result<SignatureLocalVariable> {
        Ok(SignatureLocalVariable {
            modifiers: self.import_modifier_tokens(&local.modifiers)?,
            is_byref: local.is_byref,
            is_pinned: local.is_pinned,
            base: self.import_type_sig(&local.base)?,
        })
    }
}
