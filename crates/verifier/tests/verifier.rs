use ir::{
    builder::{test_util::*, FunctionBuilder, ModuleBuilder},
    func_cursor::InstInserter,
    FuncRef, InstData, Linkage, Module, Signature, Type,
};
use intguard_verifier::{verify_function, verify_module, Report, Rule, Site, VerifierConfig};

fn verify(module: &Module, func_ref: FuncRef) -> Report {
    verify_function(module, func_ref, &VerifierConfig::default())
}

type Builder<'a> = FunctionBuilder<'a, InstInserter>;

fn single_block(build: impl FnOnce(&mut Builder<'_>)) -> (Module, FuncRef) {
    let mut mb = test_module_builder();
    let mut builder = test_func_builder(&mut mb, "f", &[Type::I8, Type::I8], Type::I8);
    let func_ref = builder.func_ref();
    let b0 = builder.append_block();
    builder.switch_to_block(b0);
    build(&mut builder);
    builder.finish();
    (mb.build(), func_ref)
}

#[test]
fn well_formed_function() {
    let mut mb = test_module_builder();
    let mut builder = test_func_builder(&mut mb, "abs", &[Type::I16], Type::I16);
    let func_ref = builder.func_ref();
    let arg = builder.args()[0];

    let b0 = builder.append_block();
    let b1 = builder.append_block();
    let b2 = builder.append_block();

    builder.switch_to_block(b0);
    let zero = builder.make_imm_value(0i16);
    let cond = builder.lt(arg, zero);
    builder.br(cond, b1, b2);

    builder.switch_to_block(b1);
    let neg = builder.neg(arg);
    builder.jump(b2);

    builder.switch_to_block(b2);
    let res = builder.phi(Type::I16, &[(arg, b0), (neg, b1)]);
    builder.ret(Some(res));
    builder.finish();

    let module = mb.build();
    let report = verify_module(&module, &VerifierConfig::default());
    assert!(report.is_ok(), "{report}");
    assert!(report.findings.is_empty());
    assert_eq!(report.to_string(), "no findings");
}

#[test]
fn missing_terminator() {
    let (module, func_ref) = single_block(|builder| {
        let (a, b) = (builder.args()[0], builder.args()[1]);
        builder.add(a, b);
    });

    let report = verify(&module, func_ref);
    assert!(!report.is_ok());
    assert!(report.violates(Rule::Unterminated));
}

#[test]
fn terminator_not_last() {
    let (module, func_ref) = single_block(|builder| {
        let (a, b) = (builder.args()[0], builder.args()[1]);
        builder.ret(Some(a));
        let sum = builder.add(a, b);
        builder.ret(Some(sum));
    });

    let report = verify(&module, func_ref);
    assert!(report.violates(Rule::CodeAfterTerminator));
    assert!(!report.violates(Rule::Unterminated));
}

#[test]
fn empty_block() {
    let mut mb = test_module_builder();
    let mut builder = test_func_builder(&mut mb, "f", &[], Type::Unit);
    let func_ref = builder.func_ref();
    let b0 = builder.append_block();
    builder.append_block();
    builder.switch_to_block(b0);
    builder.ret(None);
    builder.finish();

    let module = mb.build();
    let report = verify(&module, func_ref);
    assert!(report.violates(Rule::EmptyBlock));
}

#[test]
fn unreachable_block_is_a_warning() {
    let mut mb = test_module_builder();
    let mut builder = test_func_builder(&mut mb, "f", &[], Type::Unit);
    let func_ref = builder.func_ref();
    let b0 = builder.append_block();
    let b1 = builder.append_block();
    builder.switch_to_block(b0);
    builder.ret(None);
    builder.switch_to_block(b1);
    builder.ret(None);
    builder.finish();

    let module = mb.build();
    let report = verify(&module, func_ref);
    assert!(report.violates(Rule::UnreachableBlock));
    assert!(report.is_ok());
    assert_eq!(report.findings[0].site, Site::Block(func_ref, b1));
    assert_eq!(
        report.to_string(),
        format!("func{}/{b1}: warning: no path from the entry reaches this block (V202)\n", func_ref.as_u32())
    );
}

#[test]
fn body_less_functions() {
    let mut mb = ModuleBuilder::new("app");
    let external = mb.declare_function(Signature::new(
        "runtime.abort",
        Linkage::External,
        &[],
        Type::Unit,
    ));
    let public = mb.declare_function(Signature::new("f", Linkage::Public, &[], Type::Unit));
    let module = mb.build();

    assert!(verify(&module, external).is_ok());
    let report = verify(&module, public);
    assert!(report.violates(Rule::NoEntry));
}

#[test]
fn operand_type_mismatch() {
    let mut mb = test_module_builder();
    let mut builder = test_func_builder(&mut mb, "f", &[Type::I8, Type::I16], Type::I8);
    let func_ref = builder.func_ref();
    let b0 = builder.append_block();
    builder.switch_to_block(b0);
    let (a, b) = (builder.args()[0], builder.args()[1]);
    let sum = builder.add(a, b);
    builder.ret(Some(sum));
    builder.finish();

    let module = mb.build();
    let report = verify(&module, func_ref);
    assert!(report.violates(Rule::OperandType));

    let structure = VerifierConfig::structure_only();
    assert!(verify_function(&module, func_ref, &structure).is_ok());
}

#[test]
fn branch_condition_must_be_i1() {
    let mut mb = test_module_builder();
    let mut builder = test_func_builder(&mut mb, "f", &[Type::I8], Type::Unit);
    let func_ref = builder.func_ref();
    let cond = builder.args()[0];
    let b0 = builder.append_block();
    let b1 = builder.append_block();
    builder.switch_to_block(b0);
    builder.br(cond, b1, b1);
    builder.switch_to_block(b1);
    builder.ret(None);
    builder.finish();

    let module = mb.build();
    let report = verify(&module, func_ref);
    assert!(report.violates(Rule::OperandType));
}

#[test]
fn return_type_mismatch() {
    let (module, func_ref) = single_block(|builder| builder.ret(None));

    let report = verify(&module, func_ref);
    assert!(report.violates(Rule::ReturnType));
}

#[test]
fn call_checks() {
    let mut mb = test_module_builder();
    let callee = mb.declare_function(Signature::new(
        "ext.abs",
        Linkage::External,
        &[Type::I16],
        Type::I16,
    ));
    let mut builder = test_func_builder(&mut mb, "f", &[Type::I8], Type::Unit);
    let func_ref = builder.func_ref();
    let arg = builder.args()[0];
    let b0 = builder.append_block();
    builder.switch_to_block(b0);
    builder.insert_inst(InstData::call(callee, &[], Type::I16));
    builder.insert_inst(InstData::call(callee, &[arg], Type::I16));
    builder.ret(None);
    builder.finish();

    let module = mb.build();
    let report = verify(&module, func_ref);
    assert!(report.violates(Rule::CallArity));
    assert!(report.violates(Rule::CallArgType));
    assert_eq!(report.errors().count(), 2);
}

#[test]
fn phi_incoming_edges() {
    let mut mb = test_module_builder();
    let mut builder = test_func_builder(&mut mb, "f", &[Type::I1, Type::I8], Type::I8);
    let func_ref = builder.func_ref();
    let (cond, arg) = (builder.args()[0], builder.args()[1]);

    let b0 = builder.append_block();
    let b1 = builder.append_block();
    let b2 = builder.append_block();

    builder.switch_to_block(b0);
    builder.br(cond, b1, b2);
    builder.switch_to_block(b1);
    builder.jump(b2);
    builder.switch_to_block(b2);
    // `block2` itself isn't a predecessor, and `block1` is missing.
    let res = builder.phi(Type::I8, &[(arg, b0), (arg, b2)]);
    let sum = builder.add(res, arg);
    let late = builder.phi(Type::I8, &[(arg, b0), (arg, b1)]);
    let sum = builder.add(sum, late);
    builder.ret(Some(sum));
    builder.finish();

    let module = mb.build();
    let report = verify(&module, func_ref);
    assert!(report.violates(Rule::PhiFromNonPred));
    assert!(report.violates(Rule::MisplacedPhi));
    assert!(!report.violates(Rule::PhiEdgeCount));
}

#[test]
fn phi_count_mismatch() {
    let mut mb = test_module_builder();
    let mut builder = test_func_builder(&mut mb, "f", &[Type::I1, Type::I8], Type::I8);
    let func_ref = builder.func_ref();
    let (cond, arg) = (builder.args()[0], builder.args()[1]);

    let b0 = builder.append_block();
    let b1 = builder.append_block();
    let b2 = builder.append_block();

    builder.switch_to_block(b0);
    builder.br(cond, b1, b2);
    builder.switch_to_block(b1);
    builder.jump(b2);
    builder.switch_to_block(b2);
    let res = builder.phi(Type::I8, &[(arg, b1)]);
    builder.ret(Some(res));
    builder.finish();

    let module = mb.build();
    let report = verify(&module, func_ref);
    assert!(report.violates(Rule::PhiEdgeCount));
    assert!(!report.violates(Rule::PhiFromNonPred));
}

#[test]
fn use_before_def_and_removed_def() {
    let mut mb = test_module_builder();
    let mut builder = test_func_builder(&mut mb, "f", &[Type::I8, Type::I8], Type::I8);
    let func_ref = builder.func_ref();
    let (a, b) = (builder.args()[0], builder.args()[1]);
    let b0 = builder.append_block();
    builder.switch_to_block(b0);
    let v2 = builder.add(a, b);
    let v3 = builder.sub(v2, b);
    builder.ret(Some(v3));

    let def = builder.func.dfg.value_inst(v2).unwrap();
    let ret = builder.func.layout.last_inst_of(b0).unwrap();
    builder.func.layout.remove_inst(def);
    builder.func.layout.insert_inst_after(def, ret);
    builder.finish();

    let module = mb.build();
    let report = verify(&module, func_ref);
    assert!(report.violates(Rule::UseBeforeDef));
    // The moved definition now follows the terminator.
    assert!(report.violates(Rule::CodeAfterTerminator));
    assert!(report.violates(Rule::Unterminated));

    let mut module = module;
    module.funcs[func_ref].layout.remove_inst(def);
    let report = verify(&module, func_ref);
    assert!(report.violates(Rule::RemovedDef));
    assert!(!report.violates(Rule::UseBeforeDef));
}

#[test]
fn findings_are_capped() {
    let (module, func_ref) = single_block(|builder| {
        let (a, b) = (builder.args()[0], builder.args()[1]);
        for _ in 0..4 {
            builder.ret(Some(a));
        }
        builder.add(a, b);
    });

    let cfg = VerifierConfig {
        limit: Some(2),
        ..VerifierConfig::default()
    };
    let report = verify_function(&module, func_ref, &cfg);
    assert_eq!(report.findings.len(), 2);
    assert!(report.truncated);
    assert!(report.to_string().ends_with("(further findings omitted)"));

    let uncapped = VerifierConfig {
        limit: None,
        ..VerifierConfig::default()
    };
    let report = verify_function(&module, func_ref, &uncapped);
    assert!(!report.truncated);
    assert_eq!(
        report
            .findings
            .iter()
            .filter(|finding| finding.rule == Rule::CodeAfterTerminator)
            .count(),
        4
    );
    assert!(report.to_string().contains("(V104)"), "{report}");
}
