//! The in-memory module: one `Vec` per metadata table, with row-id allocation
//! on insertion and name-based lookups for types.

use rustc_hash::FxHashMap;

use crate::metadata::{
    identity::AssemblyIdentity,
    members::{EventDef, FieldDef, MemberRef, MethodDef, MethodSpec, PropertyDef, StandAloneSig},
    token::{TableId, Token},
    types::{TypeDef, TypeRef, TypeSpec},
};

/// A row of the AssemblyRef table.
#[derive(Debug, Clone)]
pub struct AssemblyRef {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// Identity of the referenced assembly
    pub identity: AssemblyIdentity,
}

/// A row of the ModuleRef table.
#[derive(Debug, Clone)]
pub struct ModuleRef {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// File name of the referenced module
    pub name: String,
}

macro_rules! table_impl {
    ($push:ident, $get:ident, $get_mut:ident, $field:ident, $ty:ty, $table:expr) => {
        /// Appends a row, assigning the next row id and token.
        pub fn $push(&mut self, mut row: $ty) -> Token {
            let rid = u32::try_from(self.$field.len()).unwrap_or(u32::MAX) + 1;
            row.rid = rid;
            row.token = Token::from_parts($table, rid);
            let token = row.token;
            self.$field.push(row);
            token
        }

        /// Resolves a token against this table.
        #[must_use]
        pub fn $get(&self, token: Token) -> Option<&$ty> {
            if !token.is_table($table) {
                return None;
            }
            self.$field.get(token.row().checked_sub(1)? as usize)
        }

        /// Resolves a token against this table, mutably.
        pub fn $get_mut(&mut self, token: Token) -> Option<&mut $ty> {
            if !token.is_table($table) {
                return None;
            }
            self.$field.get_mut(token.row().checked_sub(1)? as usize)
        }
    };
}

/// A parsed .NET module: metadata tables plus assembly identity.
///
/// Row ids are index+1 into each table's `Vec`; pushing a row assigns the next
/// free row id, which is how imported members obtain fresh identities in the
/// target module.
#[derive(Debug, Clone, Default)]
pub struct ModuleDef {
    /// Module file name (e.g. "MyApp.dll")
    pub name: String,
    /// Identity of the assembly this module belongs to
    pub assembly: Option<AssemblyIdentity>,
    /// TypeDef rows
    pub type_defs: Vec<TypeDef>,
    /// TypeRef rows
    pub type_refs: Vec<TypeRef>,
    /// TypeSpec rows
    pub type_specs: Vec<TypeSpec>,
    /// Field rows
    pub fields: Vec<FieldDef>,
    /// MethodDef rows
    pub methods: Vec<MethodDef>,
    /// Property rows
    pub properties: Vec<PropertyDef>,
    /// Event rows
    pub events: Vec<EventDef>,
    /// MemberRef rows
    pub member_refs: Vec<MemberRef>,
    /// MethodSpec rows
    pub method_specs: Vec<MethodSpec>,
    /// StandAloneSig rows
    pub standalone_sigs: Vec<StandAloneSig>,
    /// ModuleRef rows
    pub module_refs: Vec<ModuleRef>,
    /// AssemblyRef rows
    pub assembly_refs: Vec<AssemblyRef>,
}

impl ModuleDef {
    /// Creates an empty module with the given file name and assembly identity.
    #[must_use]
    pub fn new(name: impl Into<String>, assembly: AssemblyIdentity) -> Self {
        ModuleDef {
            name: name.into(),
            assembly: Some(assembly),
            ..ModuleDef::default()
        }
    }

    table_impl!(push_type_def, type_def, type_def_mut, type_defs, TypeDef, TableId::TypeDef);
    table_impl!(push_type_ref, type_ref, type_ref_mut, type_refs, TypeRef, TableId::TypeRef);
    table_impl!(push_type_spec, type_spec, type_spec_mut, type_specs, TypeSpec, TableId::TypeSpec);
    table_impl!(push_field, field, field_mut, fields, FieldDef, TableId::Field);
    table_impl!(push_method, method, method_mut, methods, MethodDef, TableId::MethodDef);
    table_impl!(push_property, property, property_mut, properties, PropertyDef, TableId::Property);
    table_impl!(push_event, event, event_mut, events, EventDef, TableId::Event);
    table_impl!(push_member_ref, member_ref, member_ref_mut, member_refs, MemberRef, TableId::MemberRef);
    table_impl!(push_method_spec, method_spec, method_spec_mut, method_specs, MethodSpec, TableId::MethodSpec);
    table_impl!(push_standalone_sig, standalone_sig, standalone_sig_mut, standalone_sigs, StandAloneSig, TableId::StandAloneSig);
    table_impl!(push_module_ref, module_ref, module_ref_mut, module_refs, ModuleRef, TableId::ModuleRef);
    table_impl!(push_assembly_ref, assembly_ref, assembly_ref_mut, assembly_refs, AssemblyRef, TableId::AssemblyRef);

    /// Finds a non-nested type by namespace and name.
    #[must_use]
    pub fn find_type(&self, namespace: &str, name: &str) -> Option<&TypeDef> {
        self.type_defs.iter().find(|t| {
            t.enclosing_type.is_none() && t.namespace == namespace && t.name == name
        })
    }

    /// Finds a type nested directly inside `enclosing` by name.
    #[must_use]
    pub fn find_nested_type(&self, enclosing: Token, name: &str) -> Option<&TypeDef> {
        let outer = self.type_def(enclosing)?;
        outer
            .nested_types
            .iter()
            .filter_map(|t| self.type_def(*t))
            .find(|t| t.name == name)
    }

    /// The module's global `<Module>` type, when present.
    #[must_use]
    pub fn global_type(&self) -> Option<&TypeDef> {
        self.type_defs.iter().find(|t| t.is_global_module_type())
    }

    /// All non-nested types.
    pub fn top_level_types(&self) -> impl Iterator<Item = &TypeDef> {
        self.type_defs.iter().filter(|t| t.enclosing_type.is_none())
    }

    /// The set of (namespace, name) pairs taken by non-nested types.
    #[must_use]
    pub fn top_level_name_set(&self) -> FxHashMap<(String, String), Token> {
        self.top_level_types()
            .map(|t| ((t.namespace.clone(), t.name.clone()), t.token))
            .collect()
    }

    /// Finds the type that declares the given method.
    #[must_use]
    pub fn declaring_type_of_method(&self, method: Token) -> Option<Token> {
        self.type_defs
            .iter()
            .find(|t| t.methods.contains(&method))
            .map(|t| t.token)
    }

    /// Walks the enclosing-type chain to the outermost type.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RecursionLimit`] on degenerate chains and
    /// [`crate::Error::TokenNotFound`] when a link does not resolve.
    pub fn outermost_type(&self, token: Token) -> crate::Result<Token> {
        const MAX_NESTING: usize = 500;
        let mut current = token;
        for _ in 0..MAX_NESTING {
            let type_def = self
                .type_def(current)
                .ok_or(crate::Error::TokenNotFound(current))?;
            match type_def.enclosing_type {
                Some(outer) => current = outer,
                None => return Ok(current),
            }
        }
        Err(crate::Error::RecursionLimit(MAX_NESTING))
    }

    /// Finds an assembly reference matching the given identity.
    #[must_use]
    pub fn find_assembly_ref(&self, identity: &AssemblyIdentity) -> Option<&AssemblyRef> {
        self.assembly_refs.iter().find(|r| r.identity.matches(identity))
    }

    /// Finds a module reference by case-insensitive name.
    #[must_use]
    pub fn find_module_ref(&self, name: &str) -> Option<&ModuleRef> {
        self.module_refs
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Returns an existing module reference with the given name, or creates one.
    pub fn get_or_create_module_ref(&mut self, name: &str) -> Token {
        if let Some(existing) = self.find_module_ref(name) {
            return existing.token;
        }
        self.push_module_ref(ModuleRef {
            rid: 0,
            token: Token::new(0),
            name: name.to_string(),
        })
    }

    /// Returns an existing assembly reference with the given identity, or creates one.
    pub fn get_or_create_assembly_ref(&mut self, identity: &AssemblyIdentity) -> Token {
        if let Some(existing) = self.find_assembly_ref(identity) {
            return existing.token;
        }
        self.push_assembly_ref(AssemblyRef {
            rid: 0,
            token: Token::new(0),
            identity: identity.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        identity::AssemblyVersion,
        types::TypeAttributes,
    };

    fn empty_module(name: &str) -> ModuleDef {
        ModuleDef::new(
            format!("{name}.dll"),
            AssemblyIdentity::new(name, AssemblyVersion::new(1, 0, 0, 0), None, None),
        )
    }

    #[test]
    fn push_assigns_sequential_rids() {
        let mut module = empty_module("Lib");
        let a = module.push_type_def(TypeDef::new("NS", "A", TypeAttributes::PUBLIC));
        let b = module.push_type_def(TypeDef::new("NS", "B", TypeAttributes::PUBLIC));
        assert_eq!(a, Token::new(0x0200_0001));
        assert_eq!(b, Token::new(0x0200_0002));
        assert_eq!(module.type_def(a).unwrap().name, "A");
        assert_eq!(module.type_def(b).unwrap().rid, 2);
    }

    #[test]
    fn lookup_rejects_wrong_table() {
        let mut module = empty_module("Lib");
        let a = module.push_type_def(TypeDef::new("NS", "A", TypeAttributes::PUBLIC));
        assert!(module.method(a).is_none());
        assert!(module.type_def(Token::new(0x0200_0099)).is_none());
    }

    #[test]
    fn find_type_skips_nested() {
        let mut module = empty_module("Lib");
        let outer = module.push_type_def(TypeDef::new("NS", "Outer", TypeAttributes::PUBLIC));
        let mut inner = TypeDef::new("", "Inner", TypeAttributes::NESTED_PUBLIC);
        inner.enclosing_type = Some(outer);
        let inner_token = module.push_type_def(inner);
        module.type_def_mut(outer).unwrap().nested_types.push(inner_token);

        assert!(module.find_type("", "Inner").is_none());
        assert_eq!(
            module.find_nested_type(outer, "Inner").unwrap().token,
            inner_token
        );
    }

    #[test]
    fn module_ref_reuse() {
        let mut module = empty_module("Lib");
        let a = module.get_or_create_module_ref("native.dll");
        let b = module.get_or_create_module_ref("NATIVE.DLL");
        assert_eq!(a, b);
        assert_eq!(module.module_refs.len(), 1);
    }
}
