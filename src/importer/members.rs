//! Member translation: fields, methods, properties, events, parameters,
//! generic parameters, custom attributes, and the reference tables.
//!
//! Every member importer allocates the fresh target row and registers it in
//! its identity map *before* translating sub-signatures, so cyclic references
//! (a type whose field carries its own signature, a method whose generic
//! parameter constraint names the method) resolve against the registered
//! shell.

use crate::{
    metadata::{
        customattributes::{CustomAttribute, CustomAttributeArgument, CustomAttributeValue},
        members::{
            EventDef, FieldDef, GenericParam, ImplMap, MemberRef, MemberRefSignature, MethodDef,
            MethodSpec, ParamDef, PropertyDef, StandAloneSig,
        },
        token::{TableId, Token},
    },
    Error, Result,
};

use super::{
    compare,
    diagnostics::{DiagnosticCode, DiagnosticSeverity, ImportDiagnostic},
    ModuleImporter,
};

impl ModuleImporter<'_> {
    /// Allocates the fresh target row for a source field and registers the
    /// identity map entry. Signatures and attributes come later, once every
    /// member of the plan has an identity.
    pub(crate) fn register_field_shell(&mut self, src_token: Token) -> Result<Token> {
        let src = self.src()?;
        let field = src.field(src_token).ok_or(Error::TokenNotFound(src_token))?;
        let shell = FieldDef::new(field.name.clone(), Default::default(), field.flags);
        drop(src);
        let target_token = self.target.push_field(shell);
        self.field_map.insert(src_token, target_token);
        Ok(target_token)
    }

    /// Fills a registered field shell: signature, constant, marshalling,
    /// initial value, and custom attributes.
    ///
    /// The RVA resets to none unless [`crate::ImportOptions::keep_imported_rva`]
    /// is set; the initial value bytes copy verbatim either way.
    pub(crate) fn fill_field(&mut self, src_token: Token, target_token: Token) -> Result<()> {
        let src = self.src()?;
        let field = src.field(src_token).ok_or(Error::TokenNotFound(src_token))?.clone();
        drop(src);

        let signature = self.import_field_sig(&field.signature)?;
        let custom_attributes = self.import_custom_attributes(&field.custom_attributes)?;
        let rva = if self.options.keep_imported_rva {
            field.rva
        } else {
            None
        };

        let row = self
            .target
            .field_mut(target_token)
            .ok_or(Error::TokenNotFound(target_token))?;
        row.signature = signature;
        row.constant = field.constant;
        row.marshal = field.marshal;
        row.rva = rva;
        row.initial_value = field.initial_value;
        row.layout_offset = field.layout_offset;
        row.custom_attributes = custom_attributes;
        Ok(())
    }

    /// Allocates the fresh target row for a source method and registers the
    /// identity map entry.
    pub(crate) fn register_method_shell(&mut self, src_token: Token) -> Result<Token> {
        let src = self.src()?;
        let method = src.method(src_token).ok_or(Error::TokenNotFound(src_token))?;
        let mut shell = MethodDef::new(method.name.clone(), Default::default(), method.flags);
        shell.impl_flags = method.impl_flags;
        drop(src);
        let target_token = self.target.push_method(shell);
        self.method_map.insert(src_token, target_token);
        Ok(target_token)
    }

    /// Fills a registered method shell: signature, param defs, generic
    /// params, impl map, custom attributes, and security. The body is
    /// deferred to the wire pass.
    pub(crate) fn fill_method(&mut self, src_token: Token, target_token: Token) -> Result<()> {
        let src = self.src()?;
        let method = src
            .method(src_token)
            .ok_or(Error::TokenNotFound(src_token))?
            .clone();
        drop(src);

        let signature = self.import_method_sig(&method.signature)?;
        let params = self.import_param_defs(&method.params)?;
        let generic_params = self.import_generic_params(&method.generic_params)?;
        let impl_map = match &method.impl_map {
            Some(map) => Some(self.import_impl_map(map)?),
            None => None,
        };
        let custom_attributes = self.import_custom_attributes(&method.custom_attributes)?;

        let row = self
            .target
            .method_mut(target_token)
            .ok_or(Error::TokenNotFound(target_token))?;
        row.signature = signature;
        row.params = params;
        row.generic_params = generic_params;
        row.impl_map = impl_map;
        row.custom_attributes = custom_attributes;
        row.security = method.security;
        row.normalize_params();
        Ok(())
    }

    /// Imports a property, rebinding its accessors through the method map.
    /// Runs after the type's methods have been imported.
    pub(crate) fn import_property(&mut self, src_token: Token) -> Result<Token> {
        let src = self.src()?;
        let property = src
            .property(src_token)
            .ok_or(Error::TokenNotFound(src_token))?
            .clone();
        drop(src);

        let shell = PropertyDef::new(property.name.clone(), Default::default());
        let target_token = self.target.push_property(shell);
        self.property_map.insert(src_token, target_token);

        let signature = self.import_property_sig(&property.signature)?;
        let custom_attributes = self.import_custom_attributes(&property.custom_attributes)?;
        let getter = self.rebind_accessor(property.getter);
        let setter = self.rebind_accessor(property.setter);
        let others = property
            .others
            .iter()
            .filter_map(|m| self.rebind_accessor(Some(*m)))
            .collect();

        let row = self
            .target
            .property_mut(target_token)
            .ok_or(Error::TokenNotFound(target_token))?;
        row.flags = property.flags;
        row.signature = signature;
        row.constant = property.constant.clone();
        row.getter = getter;
        row.setter = setter;
        row.others = others;
        row.custom_attributes = custom_attributes;
        Ok(target_token)
    }

    /// Imports an event, rebinding its accessors through the method map.
    /// Runs after the type's methods have been imported.
    pub(crate) fn import_event(&mut self, src_token: Token) -> Result<Token> {
        let src = self.src()?;
        let event = src
            .event(src_token)
            .ok_or(Error::TokenNotFound(src_token))?
            .clone();
        drop(src);

        let shell = EventDef::new(event.name.clone());
        let target_token = self.target.push_event(shell);
        self.event_map.insert(src_token, target_token);

        let event_type = match event.event_type {
            Some(t) => self.import_type_def_or_ref(t)?,
            None => None,
        };
        let custom_attributes = self.import_custom_attributes(&event.custom_attributes)?;
        let add_method = self.rebind_accessor(event.add_method);
        let remove_method = self.rebind_accessor(event.remove_method);
        let raise_method = self.rebind_accessor(event.raise_method);
        let others = event
            .others
            .iter()
            .filter_map(|m| self.rebind_accessor(Some(*m)))
            .collect();

        let row = self
            .target
            .event_mut(target_token)
            .ok_or(Error::TokenNotFound(target_token))?;
        row.flags = event.flags;
        row.event_type = event_type;
        row.add_method = add_method;
        row.remove_method = remove_method;
        row.raise_method = raise_method;
        row.others = others;
        row.custom_attributes = custom_attributes;
        Ok(target_token)
    }

    fn rebind_accessor(&mut self, accessor: Option<Token>) -> Option<Token> {
        let source = accessor?;
        let rebound = self.method_map.get(&source).copied();
        if rebound.is_none() {
            log::warn!("accessor method {source} has no imported counterpart");
        }
        rebound
    }

    pub(crate) fn import_param_defs(&mut self, params: &[ParamDef]) -> Result<Vec<ParamDef>> {
        let mut translated = Vec::with_capacity(params.len());
        for param in params {
            let mut copy = ParamDef::new(param.sequence, param.name.clone(), param.flags);
            copy.constant = param.constant.clone();
            copy.marshal = param.marshal.clone();
            copy.custom_attributes = self.import_custom_attributes(&param.custom_attributes)?;
            translated.push(copy);
        }
        Ok(translated)
    }

    pub(crate) fn import_generic_params(
        &mut self,
        params: &[GenericParam],
    ) -> Result<Vec<GenericParam>> {
        let mut translated = Vec::with_capacity(params.len());
        for param in params {
            let mut constraints = Vec::with_capacity(param.constraints.len());
            for constraint in &param.constraints {
                if let Some(token) = self.import_type_def_or_ref(*constraint)? {
                    constraints.push(token);
                }
            }
            translated.push(GenericParam {
                number: param.number,
                flags: param.flags,
                name: param.name.clone(),
                constraints,
                custom_attributes: self.import_custom_attributes(&param.custom_attributes)?,
            });
        }
        Ok(translated)
    }

    pub(crate) fn import_impl_map(&mut self, map: &ImplMap) -> Result<ImplMap> {
        let src = self.src()?;
        let module_name = src
            .module_ref(map.import_scope)
            .ok_or(Error::TokenNotFound(map.import_scope))?
            .name
            .clone();
        drop(src);
        Ok(ImplMap {
            flags: map.flags,
            import_name: map.import_name.clone(),
            import_scope: self.target.get_or_create_module_ref(&module_name),
        })
    }

    /// Imports custom attributes: raw blobs copy verbatim, parsed values have
    /// their constructor and argument types rewritten.
    pub(crate) fn import_custom_attributes(
        &mut self,
        attributes: &[CustomAttribute],
    ) -> Result<Vec<CustomAttribute>> {
        let mut translated = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            let Some(constructor) = self.import_method_token(attribute.constructor)? else {
                continue;
            };
            let value = match &attribute.value {
                CustomAttributeValue::Raw(blob) => CustomAttributeValue::Raw(blob.clone()),
                CustomAttributeValue::Parsed {
                    fixed_args,
                    named_args,
                } => {
                    let mut fixed = Vec::with_capacity(fixed_args.len());
                    for arg in fixed_args {
                        fixed.push(self.import_ca_argument(arg)?);
                    }
                    let mut named = Vec::with_capacity(named_args.len());
                    for arg in named_args {
                        let mut copy = arg.clone();
                        copy.arg_type = self.import_type_sig(&arg.arg_type)?;
                        copy.value = self.import_ca_argument(&arg.value)?;
                        named.push(copy);
                    }
                    CustomAttributeValue::Parsed {
                        fixed_args: fixed,
                        named_args: named,
                    }
                }
            };
            translated.push(CustomAttribute { constructor, value });
        }
        Ok(translated)
    }

    fn import_ca_argument(
        &mut self,
        argument: &CustomAttributeArgument,
    ) -> Result<CustomAttributeArgument> {
        use CustomAttributeArgument as A;
        Ok(match argument {
            A::Type(sig) => A::Type(self.import_type_sig(sig)?),
            A::Enum(sig, value) => A::Enum(
                self.import_type_sig(sig)?,
                Box::new(self.import_ca_argument(value)?),
            ),
            A::Boxed(inner) => A::Boxed(Box::new(self.import_ca_argument(inner)?)),
            A::Array(Some(items)) => {
                let mut translated = Vec::with_capacity(items.len());
                for item in items {
                    translated.push(self.import_ca_argument(item)?);
                }
                A::Array(Some(translated))
            }
            other => other.clone(),
        })
    }

    /// Translates a method operand token: `MethodDef` through the identity
    /// map, `MemberRef` by redirection or synthesis, `MethodSpec` by
    /// instantiation.
    pub(crate) fn import_method_token(&mut self, token: Token) -> Result<Option<Token>> {
        if token.is_table(TableId::MethodDef) {
            if let Some(mapped) = self.method_map.get(&token).copied() {
                return Ok(Some(mapped));
            }
            let location = self.source_method_location(token);
            self.diagnostics.push(
                ImportDiagnostic::new(
                    DiagnosticSeverity::Error,
                    DiagnosticCode::MethodNotFound,
                    format!("Could not find referenced method {token} in either module"),
                )
                .with_location(location),
            );
            return Ok(None);
        }
        if token.is_table(TableId::MemberRef) {
            return self.import_member_ref(token);
        }
        if token.is_table(TableId::MethodSpec) {
            return self.import_method_spec(token);
        }
        Err(Error::internal(format!("token {token} is not a method")))
    }

    /// Translates a field operand token.
    pub(crate) fn import_field_token(&mut self, token: Token) -> Result<Option<Token>> {
        if token.is_table(TableId::Field) {
            if let Some(mapped) = self.field_map.get(&token).copied() {
                return Ok(Some(mapped));
            }
            self.diagnostics.error(
                DiagnosticCode::FieldNotFound,
                format!("Could not find referenced field {token} in either module"),
            );
            return Ok(None);
        }
        if token.is_table(TableId::MemberRef) {
            return self.import_member_ref(token);
        }
        Err(Error::internal(format!("token {token} is not a field")))
    }

    /// Translates a member reference. References whose parent resolves to a
    /// target type definition are redirected to the actual target member;
    /// references into foreign scopes are rebuilt as fresh member references.
    pub(crate) fn import_member_ref(&mut self, token: Token) -> Result<Option<Token>> {
        let src = self.src()?;
        let member_ref = src
            .member_ref(token)
            .ok_or(Error::TokenNotFound(token))?
            .clone();
        drop(src);

        // Vararg call sites reference their own method definition.
        if member_ref.parent.is_table(TableId::MethodDef) {
            let Some(parent) = self.method_map.get(&member_ref.parent).copied() else {
                self.diagnostics.error(
                    DiagnosticCode::MethodNotFound,
                    format!(
                        "Could not find referenced method '{}' in either module",
                        member_ref.name
                    ),
                );
                return Ok(None);
            };
            return Ok(Some(self.push_member_ref_copy(&member_ref, parent)?));
        }

        if member_ref.parent.is_table(TableId::ModuleRef) {
            let src = self.src()?;
            let module_name = src
                .module_ref(member_ref.parent)
                .ok_or(Error::TokenNotFound(member_ref.parent))?
                .name
                .clone();
            drop(src);
            let parent = self.target.get_or_create_module_ref(&module_name);
            return Ok(Some(self.push_member_ref_copy(&member_ref, parent)?));
        }

        let Some(parent) = self.import_type_def_or_ref(member_ref.parent)? else {
            return Ok(None);
        };

        if parent.is_table(TableId::TypeDef) {
            // The parent is a real target type: bind to its actual member.
            return self.redirect_member_ref(&member_ref, parent);
        }

        Ok(Some(self.push_member_ref_copy(&member_ref, parent)?))
    }

    fn push_member_ref_copy(&mut self, member_ref: &MemberRef, parent: Token) -> Result<Token> {
        let signature = match &member_ref.signature {
            MemberRefSignature::Method(sig) => {
                MemberRefSignature::Method(self.import_method_sig(sig)?)
            }
            MemberRefSignature::Field(sig) => {
                MemberRefSignature::Field(self.import_field_sig(sig)?)
            }
        };
        Ok(self.target.push_member_ref(MemberRef {
            rid: 0,
            token: Token::new(0),
            parent,
            name: member_ref.name.clone(),
            signature,
        }))
    }

    fn redirect_member_ref(
        &mut self,
        member_ref: &MemberRef,
        target_type: Token,
    ) -> Result<Option<Token>> {
        match &member_ref.signature {
            MemberRefSignature::Method(sig) => {
                let imported_sig = self.import_method_sig(sig)?;
                if let Some(found) =
                    self.find_method_in_target_type(target_type, &member_ref.name, &imported_sig)
                {
                    return Ok(Some(found));
                }
                let location = self
                    .target
                    .type_def(target_type)
                    .map(crate::metadata::types::TypeDef::fullname)
                    .unwrap_or_default();
                self.diagnostics.push(
                    ImportDiagnostic::new(
                        DiagnosticSeverity::Error,
                        DiagnosticCode::MethodNotFound,
                        format!(
                            "Could not find referenced method '{}' in either module",
                            member_ref.name
                        ),
                    )
                    .with_location(location),
                );
                Ok(None)
            }
            MemberRefSignature::Field(sig) => {
                let imported_sig = self.import_field_sig(sig)?;
                if let Some(found) =
                    self.find_field_in_target_type(target_type, &member_ref.name, &imported_sig)
                {
                    return Ok(Some(found));
                }
                let location = self
                    .target
                    .type_def(target_type)
                    .map(crate::metadata::types::TypeDef::fullname)
                    .unwrap_or_default();
                self.diagnostics.push(
                    ImportDiagnostic::new(
                        DiagnosticSeverity::Error,
                        DiagnosticCode::FieldNotFound,
                        format!(
                            "Could not find referenced field '{}' in either module",
                            member_ref.name
                        ),
                    )
                    .with_location(location),
                );
                Ok(None)
            }
        }
    }

    /// Searches a target type's declared methods plus any members newly
    /// imported onto it during this merge.
    fn find_method_in_target_type(
        &self,
        target_type: Token,
        name: &str,
        signature: &crate::metadata::signatures::SignatureMethod,
    ) -> Option<Token> {
        let type_def = self.target.type_def(target_type)?;
        let declared = type_def.methods.iter().copied();
        let added = self
            .planned_index_of_target(target_type)
            .map(|idx| self.planned[idx].new_methods.clone())
            .unwrap_or_default();
        for candidate in declared.chain(added) {
            let method = self.target.method(candidate)?;
            if method.name == name
                && compare::method_sigs_equiv(self.target, signature, self.target, &method.signature)
            {
                return Some(candidate);
            }
        }
        None
    }

    fn find_field_in_target_type(
        &self,
        target_type: Token,
        name: &str,
        signature: &crate::metadata::signatures::SignatureField,
    ) -> Option<Token> {
        let type_def = self.target.type_def(target_type)?;
        let declared = type_def.fields.iter().copied();
        let added = self
            .planned_index_of_target(target_type)
            .map(|idx| self.planned[idx].new_fields.clone())
            .unwrap_or_default();
        for candidate in declared.chain(added) {
            let field = self.target.field(candidate)?;
            if field.name == name
                && compare::sigs_equiv(
                    self.target,
                    &signature.base,
                    self.target,
                    &field.signature.base,
                )
            {
                return Some(candidate);
            }
        }
        None
    }

    fn import_method_spec(&mut self, token: Token) -> Result<Option<Token>> {
        let src = self.src()?;
        let spec = src
            .method_spec(token)
            .ok_or(Error::TokenNotFound(token))?
            .clone();
        drop(src);

        let Some(method) = self.import_method_token(spec.method)? else {
            return Ok(None);
        };
        let mut generic_args = Vec::with_capacity(spec.generic_args.len());
        for arg in &spec.generic_args {
            generic_args.push(self.import_type_sig(arg)?);
        }
        Ok(Some(self.target.push_method_spec(MethodSpec {
            rid: 0,
            token: Token::new(0),
            method,
            generic_args,
        })))
    }

    /// Translates a stand-alone signature token (`calli` operands).
    pub(crate) fn import_standalone_sig(&mut self, token: Token) -> Result<Option<Token>> {
        let src = self.src()?;
        let sig = src
            .standalone_sig(token)
            .ok_or(Error::TokenNotFound(token))?
            .signature
            .clone();
        drop(src);
        let signature = self.import_method_sig(&sig)?;
        Ok(Some(self.target.push_standalone_sig(StandAloneSig {
            rid: 0,
            token: Token::new(0),
            signature,
        })))
    }

    fn source_method_location(&self, token: Token) -> String {
        self.src()
            .ok()
            .and_then(|src| src.method(token).map(|m| m.name.clone()))
            .unwrap_or_default()
    }
}
