//! End-to-end import scenarios.
//!
//! Each test builds a target module and a "compiler output" source module in
//! memory, runs one import, and checks the resulting descriptors, diagnostics,
//! and target rows.

use dotgraft::prelude::*;

const TARGET_NAME: &str = "MyApp";
const SOURCE_NAME: &str = "CompiledEdit";

fn identity(name: &str) -> AssemblyIdentity {
    AssemblyIdentity::new(name, AssemblyVersion::new(1, 2, 3, 4), None, None)
}

fn empty_module(name: &str) -> ModuleDef {
    ModuleDef::new(format!("{name}.dll"), identity(name))
}

fn add_type(module: &mut ModuleDef, namespace: &str, name: &str) -> Token {
    let flags = if name == "<Module>" {
        TypeAttributes::NOT_PUBLIC
    } else {
        TypeAttributes::PUBLIC
    };
    module.push_type_def(TypeDef::new(namespace, name, flags))
}

fn add_method(
    module: &mut ModuleDef,
    type_token: Token,
    name: &str,
    signature: SignatureMethod,
    flags: MethodAttributes,
    body: Option<CilBody>,
) -> Token {
    let mut method = MethodDef::new(name, signature, flags);
    method.body = body;
    let token = module.push_method(method);
    module.type_def_mut(type_token).unwrap().methods.push(token);
    token
}

fn add_field(module: &mut ModuleDef, type_token: Token, name: &str, base: TypeSignature) -> Token {
    let field = FieldDef::new(name, SignatureField::new(base), FieldAttributes::PRIVATE);
    let token = module.push_field(field);
    module.type_def_mut(type_token).unwrap().fields.push(token);
    token
}

fn int_binop_sig(instance: bool) -> SignatureMethod {
    SignatureMethod::new(
        instance,
        TypeSignature::I4,
        vec![TypeSignature::I4, TypeSignature::I4],
    )
}

/// `a + b` for an instance method: args 1 and 2.
fn add_body() -> CilBody {
    CilBody {
        init_locals: true,
        max_stack: 2,
        instructions: vec![
            Instruction::with_operand(0, opcodes::LDARG_S, Operand::Argument(1)),
            Instruction::with_operand(2, opcodes::LDARG_S, Operand::Argument(2)),
            Instruction::simple(4, opcodes::ADD),
            Instruction::simple(5, opcodes::RET),
        ],
        ..CilBody::default()
    }
}

fn trivial_body() -> CilBody {
    CilBody {
        max_stack: 1,
        instructions: vec![
            Instruction::simple(0, opcodes::LDC_I4_0),
            Instruction::simple(1, opcodes::RET),
        ],
        ..CilBody::default()
    }
}

/// Target: `<Module>` plus `App.Calculator { Add, Sub }`; `Add` is the edited
/// method.
fn build_target() -> (ModuleDef, Token) {
    let mut module = empty_module(TARGET_NAME);
    add_type(&mut module, "", "<Module>");
    let calculator = add_type(&mut module, "App", "Calculator");
    let edited = add_method(
        &mut module,
        calculator,
        "Add",
        int_binop_sig(true),
        MethodAttributes::PUBLIC | MethodAttributes::HIDE_BY_SIG,
        Some(add_body()),
    );
    add_method(
        &mut module,
        calculator,
        "Sub",
        int_binop_sig(true),
        MethodAttributes::PUBLIC | MethodAttributes::HIDE_BY_SIG,
        Some(add_body()),
    );
    (module, edited)
}

/// Source mirroring the target, as an unmodified recompile would produce it.
fn build_source() -> (ModuleDef, Token) {
    let mut module = empty_module(SOURCE_NAME);
    add_type(&mut module, "", "<Module>");
    let calculator = add_type(&mut module, "App", "Calculator");
    let add = add_method(
        &mut module,
        calculator,
        "Add",
        int_binop_sig(true),
        MethodAttributes::PUBLIC | MethodAttributes::HIDE_BY_SIG,
        Some(add_body()),
    );
    add_method(
        &mut module,
        calculator,
        "Sub",
        int_binop_sig(true),
        MethodAttributes::PUBLIC | MethodAttributes::HIDE_BY_SIG,
        Some(add_body()),
    );
    (module, add)
}

fn run_import(target: &mut ModuleDef, source: ModuleDef, edited: Token) -> ImportResult {
    ModuleImporter::new(target)
        .import(source, &DebugFileInfo::default(), edited)
        .expect("import must not hit an internal error")
}

#[test]
fn unmodified_recompile_yields_stubs_only() {
    let (mut target, edited) = build_target();
    let (source, _) = build_source();
    let source_body = add_body();

    let result = run_import(&mut target, source, edited);

    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert!(result.new_non_nested_types.is_empty());
    assert_eq!(result.merged_non_nested_types.len(), 1);

    let merged = &result.merged_non_nested_types[0];
    assert!(!merged.rename_duplicates);
    assert!(merged.new_fields.is_empty());
    assert!(merged.new_methods.is_empty());
    assert!(merged.new_properties.is_empty());
    assert!(merged.new_events.is_empty());
    assert!(merged.new_nested_types.is_empty());
    assert_eq!(merged.edited_method_bodies.len(), 1);

    // Body round-trip: same instruction count, opcodes, offsets; operands
    // non-null exactly where the source operands were.
    let edited_body = &merged.edited_method_bodies[0];
    assert_eq!(edited_body.target_method, edited);
    let body = edited_body.body.as_ref().unwrap();
    assert_eq!(body.instructions.len(), source_body.instructions.len());
    for (imported, original) in body.instructions.iter().zip(&source_body.instructions) {
        assert_eq!(imported.opcode, original.opcode);
        assert_eq!(imported.offset, original.offset);
        assert_eq!(imported.operand.is_some(), original.operand.is_some());
    }
}

#[test]
fn local_rename_carries_through_the_edited_body() {
    let (mut target, edited) = build_target();
    let (mut source, source_edited) = build_source();

    let method = source.method_mut(source_edited).unwrap();
    let body = method.body.as_mut().unwrap();
    body.locals.push(LocalVariable {
        name: "renamedLocal".to_string(),
        signature: SignatureLocalVariable {
            base: TypeSignature::I4,
            ..Default::default()
        },
    });

    let result = run_import(&mut target, source, edited);

    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.merged_non_nested_types.len(), 1);
    let merged = &result.merged_non_nested_types[0];
    assert!(merged.new_methods.is_empty());
    assert_eq!(merged.edited_method_bodies.len(), 1);

    let body = merged.edited_method_bodies[0].body.as_ref().unwrap();
    assert_eq!(body.locals.len(), 1);
    assert_eq!(body.locals[0].name, "renamedLocal");
    assert_eq!(body.locals[0].signature.base, TypeSignature::I4);
}

#[test]
fn added_field_imports_with_corlib_signature() {
    let (mut target, edited) = build_target();
    let (mut source, _) = build_source();
    let calculator = source.find_type("App", "Calculator").unwrap().token;
    add_field(&mut source, calculator, "counter", TypeSignature::I4);

    let result = run_import(&mut target, source, edited);

    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let merged = &result.merged_non_nested_types[0];
    assert_eq!(merged.new_fields.len(), 1);

    let field = target.field(merged.new_fields[0]).unwrap();
    assert_eq!(field.name, "counter");
    assert_eq!(field.signature.base, TypeSignature::I4);
    assert!(field.rva.is_none());
}

#[test]
fn colliding_global_helper_is_renamed() {
    let (mut target, edited) = build_target();
    let target_global = target.global_type().unwrap().token;
    add_method(
        &mut target,
        target_global,
        "Helper",
        SignatureMethod::new(false, TypeSignature::I4, vec![TypeSignature::I4]),
        MethodAttributes::PUBLIC | MethodAttributes::STATIC,
        Some(trivial_body()),
    );

    let (mut source, _) = build_source();
    let source_global = source.global_type().unwrap().token;
    add_method(
        &mut source,
        source_global,
        "Helper",
        SignatureMethod::new(false, TypeSignature::I4, vec![TypeSignature::I4]),
        MethodAttributes::PUBLIC | MethodAttributes::STATIC,
        Some(trivial_body()),
    );

    let result = run_import(&mut target, source, edited);

    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let global_merge = result
        .merged_non_nested_types
        .iter()
        .find(|m| m.rename_duplicates)
        .expect("global merge must survive pruning");
    assert_eq!(global_merge.new_methods.len(), 1);
    let imported = target.method(global_merge.new_methods[0]).unwrap();
    assert_eq!(imported.name, "Helper_0");
}

#[test]
fn rename_iterates_past_compiler_emitted_suffixes() {
    let (mut target, edited) = build_target();
    let target_global = target.global_type().unwrap().token;
    for name in ["Helper", "Helper_0"] {
        add_method(
            &mut target,
            target_global,
            name,
            SignatureMethod::new(false, TypeSignature::I4, vec![TypeSignature::I4]),
            MethodAttributes::PUBLIC | MethodAttributes::STATIC,
            Some(trivial_body()),
        );
    }

    let (mut source, _) = build_source();
    let source_global = source.global_type().unwrap().token;
    add_method(
        &mut source,
        source_global,
        "Helper",
        SignatureMethod::new(false, TypeSignature::I4, vec![TypeSignature::I4]),
        MethodAttributes::PUBLIC | MethodAttributes::STATIC,
        Some(trivial_body()),
    );

    let result = run_import(&mut target, source, edited);

    let global_merge = result
        .merged_non_nested_types
        .iter()
        .find(|m| m.rename_duplicates)
        .unwrap();
    let imported = target.method(global_merge.new_methods[0]).unwrap();
    assert_eq!(imported.name, "Helper_1");
}

#[test]
fn virtual_method_collision_reports_im0008_once() {
    let (mut target, edited) = build_target();
    let target_global = target.global_type().unwrap().token;
    add_method(
        &mut target,
        target_global,
        "Clash",
        SignatureMethod::new(true, TypeSignature::Void, vec![]),
        MethodAttributes::PUBLIC,
        Some(trivial_body()),
    );

    let (mut source, _) = build_source();
    let source_global = source.global_type().unwrap().token;
    add_method(
        &mut source,
        source_global,
        "Clash",
        SignatureMethod::new(true, TypeSignature::Void, vec![]),
        MethodAttributes::PUBLIC | MethodAttributes::VIRTUAL,
        Some(trivial_body()),
    );

    let result = run_import(&mut target, source, edited);

    let im0008: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::VirtualMethodRename)
        .collect();
    assert_eq!(im0008.len(), 1);

    // The colliding method keeps its name.
    let global_merge = result
        .merged_non_nested_types
        .iter()
        .find(|m| m.rename_duplicates)
        .unwrap();
    let imported = target.method(global_merge.new_methods[0]).unwrap();
    assert_eq!(imported.name, "Clash");
}

#[test]
fn static_toggle_on_edited_method_reports_im0009_but_imports_the_body() {
    let (mut target, edited) = build_target();

    let mut source = empty_module(SOURCE_NAME);
    add_type(&mut source, "", "<Module>");
    let calculator = add_type(&mut source, "App", "Calculator");
    // The user made Add static: args are now slots 0 and 1.
    let static_body = CilBody {
        max_stack: 2,
        instructions: vec![
            Instruction::with_operand(0, opcodes::LDARG_S, Operand::Argument(0)),
            Instruction::with_operand(2, opcodes::LDARG_S, Operand::Argument(1)),
            Instruction::simple(4, opcodes::ADD),
            Instruction::simple(5, opcodes::RET),
        ],
        ..CilBody::default()
    };
    add_method(
        &mut source,
        calculator,
        "Add",
        int_binop_sig(false),
        MethodAttributes::PUBLIC | MethodAttributes::HIDE_BY_SIG | MethodAttributes::STATIC,
        Some(static_body),
    );
    add_method(
        &mut source,
        calculator,
        "Sub",
        int_binop_sig(true),
        MethodAttributes::PUBLIC | MethodAttributes::HIDE_BY_SIG,
        Some(add_body()),
    );

    let result = run_import(&mut target, source, edited);

    assert!(!result.succeeded());
    assert_eq!(
        result
            .diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::EditedMethodStaticToggle)
            .count(),
        1
    );

    // The body is still imported, with argument slots remapped onto the
    // instance method's layout (slot 0 is `this`).
    let merged = &result.merged_non_nested_types[0];
    assert_eq!(merged.edited_method_bodies.len(), 1);
    let body = merged.edited_method_bodies[0].body.as_ref().unwrap();
    assert_eq!(body.instructions[0].operand, Operand::Argument(1));
    assert_eq!(body.instructions[1].operand, Operand::Argument(2));
}

#[test]
fn foreign_call_synthesizes_type_ref_and_member_ref() {
    let (mut target, edited) = build_target();
    let (mut source, source_edited) = build_source();

    let mscorlib_identity =
        AssemblyIdentity::new("mscorlib", AssemblyVersion::new(4, 0, 0, 0), None, None);
    let mscorlib = source.get_or_create_assembly_ref(&mscorlib_identity);
    let console = source.push_type_ref(TypeRef::new(
        ResolutionScope::AssemblyRef(mscorlib),
        "System",
        "Console",
    ));
    let write_line = source.push_member_ref(MemberRef {
        rid: 0,
        token: Token::new(0),
        parent: console,
        name: "WriteLine".to_string(),
        signature: MemberRefSignature::Method(SignatureMethod::new(
            false,
            TypeSignature::Void,
            vec![TypeSignature::String],
        )),
    });

    let method = source.method_mut(source_edited).unwrap();
    method.body = Some(CilBody {
        max_stack: 1,
        instructions: vec![
            Instruction::with_operand(0, opcodes::LDSTR, Operand::String("hi".to_string())),
            Instruction::with_operand(5, opcodes::CALL, Operand::Token(write_line)),
            Instruction::simple(10, opcodes::RET),
        ],
        ..CilBody::default()
    });

    let result = run_import(&mut target, source, edited);

    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

    // A new target TypeRef for System.Console, scoped to an AssemblyRef equal
    // to the foreign one.
    let console_ref = target
        .type_refs
        .iter()
        .find(|r| r.namespace == "System" && r.name == "Console")
        .expect("System.Console must be rebuilt in the target");
    let ResolutionScope::AssemblyRef(scope) = console_ref.scope else {
        panic!("scope must be an assembly reference");
    };
    assert!(target
        .assembly_ref(scope)
        .unwrap()
        .identity
        .matches(&mscorlib_identity));

    // The call operand binds to a target MemberRef hanging off that TypeRef.
    let merged = &result.merged_non_nested_types[0];
    let body = merged.edited_method_bodies[0].body.as_ref().unwrap();
    let Operand::Token(call_target) = body.instructions[1].operand else {
        panic!("call operand must stay a token");
    };
    let member_ref = target.member_ref(call_target).expect("must be a MemberRef");
    assert_eq!(member_ref.parent, console_ref.token);
    assert_eq!(member_ref.name, "WriteLine");
}

#[test]
fn extra_top_level_type_is_renamed_uniquely() {
    let (mut target, edited) = build_target();
    add_type(&mut target, "App", "Widget");

    let (mut source, _) = build_source();
    let widget = add_type(&mut source, "App", "Widget");
    add_method(
        &mut source,
        widget,
        "Run",
        SignatureMethod::new(true, TypeSignature::Void, vec![]),
        MethodAttributes::PUBLIC,
        Some(trivial_body()),
    );

    let result = run_import(&mut target, source, edited);

    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.new_non_nested_types.len(), 1);
    let new_type = &result.new_non_nested_types[0];
    assert!(new_type.renamed);

    let row = target.type_def(new_type.target).unwrap();
    assert_eq!(row.namespace, "App");
    assert_eq!(row.name, "__0__Widget");
    assert_eq!(row.methods.len(), 1);

    // Top-level (namespace, name) pairs stay unique after the import.
    let mut names: Vec<_> = target
        .top_level_types()
        .map(|t| (t.namespace.clone(), t.name.clone()))
        .collect();
    let before = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), before);
}

#[test]
fn nested_type_edit_merges_the_whole_chain() {
    let mut target = empty_module(TARGET_NAME);
    add_type(&mut target, "", "<Module>");
    let outer = add_type(&mut target, "App", "Outer");
    let mut inner_def = TypeDef::new("", "Inner", TypeAttributes::NESTED_PUBLIC);
    inner_def.enclosing_type = Some(outer);
    let inner = target.push_type_def(inner_def);
    target.type_def_mut(outer).unwrap().nested_types.push(inner);
    let edited = add_method(
        &mut target,
        inner,
        "Tick",
        SignatureMethod::new(true, TypeSignature::Void, vec![]),
        MethodAttributes::PUBLIC,
        Some(trivial_body()),
    );

    let mut source = empty_module(SOURCE_NAME);
    add_type(&mut source, "", "<Module>");
    let src_outer = add_type(&mut source, "App", "Outer");
    let mut src_inner_def = TypeDef::new("", "Inner", TypeAttributes::NESTED_PUBLIC);
    src_inner_def.enclosing_type = Some(src_outer);
    let src_inner = source.push_type_def(src_inner_def);
    source
        .type_def_mut(src_outer)
        .unwrap()
        .nested_types
        .push(src_inner);
    add_method(
        &mut source,
        src_inner,
        "Tick",
        SignatureMethod::new(true, TypeSignature::Void, vec![]),
        MethodAttributes::PUBLIC,
        Some(trivial_body()),
    );
    // The edit also introduces a brand-new nested sibling.
    let mut extra_def = TypeDef::new("", "Extra", TypeAttributes::NESTED_PUBLIC);
    extra_def.enclosing_type = Some(src_outer);
    let extra = source.push_type_def(extra_def);
    source
        .type_def_mut(src_outer)
        .unwrap()
        .nested_types
        .push(extra);

    let result = run_import(&mut target, source, edited);

    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.merged_non_nested_types.len(), 1);
    let outer_merge = &result.merged_non_nested_types[0];
    assert_eq!(outer_merge.target, outer);
    assert_eq!(outer_merge.new_nested_types.len(), 1);
    assert_eq!(
        target
            .type_def(outer_merge.new_nested_types[0].target)
            .unwrap()
            .name,
        "Extra"
    );

    // The edited body hangs off the nested merge.
    assert_eq!(outer_merge.merged_nested_types.len(), 1);
    let inner_merge = &outer_merge.merged_nested_types[0];
    assert_eq!(inner_merge.target, inner);
    assert_eq!(inner_merge.edited_method_bodies.len(), 1);
    assert_eq!(inner_merge.edited_method_bodies[0].target_method, edited);
}

#[test]
fn unresolvable_target_type_ref_reports_im0003() {
    let (mut target, edited) = build_target();
    let (mut source, source_edited) = build_source();

    // The compiled code references App.Missing in the target assembly, which
    // does not exist there.
    let target_asm = source.get_or_create_assembly_ref(&identity(TARGET_NAME));
    let missing = source.push_type_ref(TypeRef::new(
        ResolutionScope::AssemblyRef(target_asm),
        "App",
        "Missing",
    ));
    let ctor = source.push_member_ref(MemberRef {
        rid: 0,
        token: Token::new(0),
        parent: missing,
        name: ".ctor".to_string(),
        signature: MemberRefSignature::Method(SignatureMethod::new(
            true,
            TypeSignature::Void,
            vec![],
        )),
    });
    let method = source.method_mut(source_edited).unwrap();
    method.body = Some(CilBody {
        max_stack: 1,
        instructions: vec![
            Instruction::with_operand(0, opcodes::NEWOBJ, Operand::Token(ctor)),
            Instruction::simple(5, opcodes::RET),
        ],
        ..CilBody::default()
    });

    let result = run_import(&mut target, source, edited);

    assert!(!result.succeeded());
    assert_eq!(
        result
            .diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::TargetTypeRefNotFound)
            .count(),
        1
    );
    // Partial success: the merge is still produced.
    assert_eq!(result.merged_non_nested_types.len(), 1);
}

#[test]
fn missing_edited_method_reports_im0002_and_aborts() {
    let (mut target, edited) = build_target();

    let mut source = empty_module(SOURCE_NAME);
    add_type(&mut source, "", "<Module>");
    let calculator = add_type(&mut source, "App", "Calculator");
    // Only Sub survives in the recompile; Add is gone.
    add_method(
        &mut source,
        calculator,
        "Sub",
        int_binop_sig(true),
        MethodAttributes::PUBLIC | MethodAttributes::HIDE_BY_SIG,
        Some(add_body()),
    );

    let result = run_import(&mut target, source, edited);

    assert!(!result.succeeded());
    assert_eq!(
        result
            .diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::EditedMethodNotFound)
            .count(),
        1
    );
    assert!(result.new_non_nested_types.is_empty());
    assert!(result.merged_non_nested_types.is_empty());
}

#[test]
fn missing_declaring_type_reports_im0001_and_aborts() {
    let (mut target, edited) = build_target();

    let mut source = empty_module(SOURCE_NAME);
    add_type(&mut source, "", "<Module>");

    let result = run_import(&mut target, source, edited);

    assert!(!result.succeeded());
    assert_eq!(
        result
            .diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::DeclaringTypeNotFound)
            .count(),
        1
    );
    assert!(result.merged_non_nested_types.is_empty());
}

#[test]
fn portable_pdb_fails_fast_with_im0010() {
    let (mut target, edited) = build_target();
    let (source, _) = build_source();

    let debug = DebugFileInfo {
        format: DebugFileFormat::PortablePdb,
        raw_file: vec![0x42],
    };
    let result = ModuleImporter::new(&mut target)
        .import(source, &debug, edited)
        .unwrap();

    assert!(!result.succeeded());
    assert_eq!(
        result
            .diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::UnsupportedDebugFormat)
            .count(),
        1
    );
    assert!(result.new_non_nested_types.is_empty());
    assert!(result.merged_non_nested_types.is_empty());
}

#[test]
fn type_ref_chain_past_the_recursion_cap_resolves_to_null() {
    let (mut target, edited) = build_target();
    let (mut source, _) = build_source();

    let foreign = source.get_or_create_assembly_ref(&AssemblyIdentity::new(
        "Elsewhere",
        AssemblyVersion::new(1, 0, 0, 0),
        None,
        None,
    ));
    let mut current = source.push_type_ref(TypeRef::new(
        ResolutionScope::AssemblyRef(foreign),
        "Deep",
        "T0",
    ));
    for index in 1..=501 {
        current = source.push_type_ref(TypeRef::new(
            ResolutionScope::TypeRef(current),
            "",
            format!("T{index}"),
        ));
    }

    let calculator = source.find_type("App", "Calculator").unwrap().token;
    let field = FieldDef::new(
        "deep",
        SignatureField::new(TypeSignature::Class(current)),
        FieldAttributes::PRIVATE,
    );
    let field = source.push_field(field);
    source.type_def_mut(calculator).unwrap().fields.push(field);

    // Must terminate without a stack overflow; the unresolvable signature
    // degrades to Unknown.
    let result = run_import(&mut target, source, edited);
    let merged = &result.merged_non_nested_types[0];
    assert_eq!(merged.new_fields.len(), 1);
    let imported = target.field(merged.new_fields[0]).unwrap();
    assert_eq!(imported.signature.base, TypeSignature::Unknown);
}

#[test]
fn property_rename_seeds_accessor_names() {
    let (mut target, edited) = build_target();
    let target_global = target.global_type().unwrap().token;
    // Existing non-virtual property Value on the global type.
    let target_getter = add_method(
        &mut target,
        target_global,
        "get_Value",
        SignatureMethod::new(false, TypeSignature::I4, vec![]),
        MethodAttributes::PUBLIC | MethodAttributes::STATIC | MethodAttributes::SPECIAL_NAME,
        Some(trivial_body()),
    );
    let mut existing = PropertyDef::new(
        "Value",
        SignatureProperty {
            base: TypeSignature::I4,
            ..Default::default()
        },
    );
    existing.getter = Some(target_getter);
    let existing = target.push_property(existing);
    target
        .type_def_mut(target_global)
        .unwrap()
        .properties
        .push(existing);

    let (mut source, _) = build_source();
    let source_global = source.global_type().unwrap().token;
    let source_getter = add_method(
        &mut source,
        source_global,
        "get_Value",
        SignatureMethod::new(false, TypeSignature::I4, vec![]),
        MethodAttributes::PUBLIC | MethodAttributes::STATIC | MethodAttributes::SPECIAL_NAME,
        Some(trivial_body()),
    );
    let mut incoming = PropertyDef::new(
        "Value",
        SignatureProperty {
            base: TypeSignature::I4,
            ..Default::default()
        },
    );
    incoming.getter = Some(source_getter);
    let incoming = source.push_property(incoming);
    source
        .type_def_mut(source_global)
        .unwrap()
        .properties
        .push(incoming);

    let result = run_import(&mut target, source, edited);

    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let global_merge = result
        .merged_non_nested_types
        .iter()
        .find(|m| m.rename_duplicates)
        .unwrap();
    assert_eq!(global_merge.new_properties.len(), 1);

    let property = target.property(global_merge.new_properties[0]).unwrap();
    assert_eq!(property.name, "Value_0");
    let getter = target.method(property.getter.unwrap()).unwrap();
    assert_eq!(getter.name, "get_Value_0");
}
