//! End-to-end tests of the two-pass module parse.

use modl_language::test_utils::static_context;
use modl_language::{
    parser, IonKind, ProcedureKind, SolveMethod, Status, SymbolEntry, VariableKind,
};

const KDR: &str = r#"TITLE Delayed rectifier potassium channel

NEURON {
    SUFFIX kdr
    USEION k READ ek WRITE ik
    RANGE gbar, g
    GLOBAL q10
}

UNITS {
    (mV) = (millivolt)
    (S) = (siemens)
    (mA) = (milliamp)
}

PARAMETER {
    gbar = 0.036 (S/cm2) <0, 1e9>
    q10 = 3
}

STATE {
    n
}

ASSIGNED {
    v (mV)
    g (S/cm2)
    ninf
    ntau (ms)
}

BREAKPOINT {
    SOLVE states METHOD cnexp
    g = gbar * n^4
    ik = g * (v - ek)
}

DERIVATIVE states {
    rates(v)
    n' = (ninf - n) / ntau
}

INITIAL {
    rates(v)
    n = ninf
}

PROCEDURE rates(v (mV)) {
    LOCAL a, b
    a = 0.01 * vtrap(10 - v, 10)
    b = 0.125 * exp(-v / 80)
    ntau = 1 / (a + b)
    ninf = a * ntau
}

FUNCTION vtrap(x, y) {
    if (abs(x / y) < 1e-6) {
        vtrap = y * (1 - x / y / 2)
    } else {
        vtrap = x / (exp(x / y) - 1)
    }
}
"#;

#[test]
fn kdr_parses_clean() {
    let (ctx, interner) = static_context();
    let module = parser::parse_module("kdr", KDR, interner, ctx);
    assert_eq!(module.status(), Status::Happy, "{:?}", module.first_error());
    assert_eq!(module.title(), "Delayed rectifier potassium channel");
}

#[test]
fn kdr_neuron_info_is_extracted() {
    let (ctx, interner) = static_context();
    let module = parser::parse_module("kdr", KDR, interner, ctx);

    let info = module.neuron_info();
    assert_eq!(info.suffix.as_deref(), Some("kdr"));
    assert!(info.point_process.is_none());
    assert_eq!(info.range, vec!["gbar", "g"]);
    assert_eq!(info.global, vec!["q10"]);

    assert_eq!(info.ion_deps.len(), 1);
    let ion = &info.ion_deps[0];
    assert_eq!(ion.name, "k");
    assert_eq!(ion.read, vec!["ek"]);
    assert_eq!(ion.write, vec!["ik"]);
    assert_eq!(ion.valence, None);
}

#[test]
fn neuron_info_serializes_for_downstream_emission() {
    let (ctx, interner) = static_context();
    let module = parser::parse_module("kdr", KDR, interner, ctx);

    let json = serde_json::to_value(module.neuron_info()).unwrap();
    assert_eq!(json["suffix"], "kdr");
    assert_eq!(json["ion_deps"][0]["name"], "k");
    assert_eq!(json["ion_deps"][0]["read"][0], "ek");
    assert_eq!(json["range"][1], "g");
}

#[test]
fn kdr_symbols_cover_blocks_variables_and_ion_indices() {
    let (ctx, interner) = static_context();
    let module = parser::parse_module("kdr", KDR, interner, ctx);

    for name in [
        "breakpoint",
        "states",
        "initial",
        "rates",
        "vtrap",
        "n",
        "gbar",
        "q10",
        "v",
        "g",
        "ninf",
        "ntau",
        "ek",
        "ik",
    ] {
        assert!(
            module.symbol_named(interner, name).is_some(),
            "missing symbol '{name}'"
        );
    }

    // No two entries share a name.
    assert_eq!(module.symbols().len(), 14);

    let n = module.symbol_named(interner, "n").unwrap();
    assert_eq!(n.as_variable(), Some(VariableKind::State));

    let gbar = module.symbol_named(interner, "gbar").unwrap();
    match gbar {
        SymbolEntry::Variable {
            default,
            unit,
            range,
            ..
        } => {
            assert_eq!(*default, Some(0.036));
            assert_eq!(unit.as_deref(), Some("S/cm2"));
            assert_eq!(*range, Some((0.0, 1e9)));
        }
        other => panic!("gbar should be a variable, got {other:?}"),
    }

    let ik = module.symbol_named(interner, "ik").unwrap();
    assert_eq!(ik.as_variable(), Some(VariableKind::Ion));

    assert_eq!(module.procedures().count(), 4);
    assert_eq!(module.functions().count(), 1);
}

#[test]
fn kdr_units_are_stored_verbatim() {
    let (ctx, interner) = static_context();
    let module = parser::parse_module("kdr", KDR, interner, ctx);
    let units = module.units();
    assert_eq!(units.len(), 3);
    assert_eq!(units[0].from, "mV");
    assert_eq!(units[0].to, "millivolt");
}

#[test]
fn kdr_procedural_bodies_are_attached() {
    let (ctx, interner) = static_context();
    let module = parser::parse_module("kdr", KDR, interner, ctx);

    let breakpoint = module.symbol_named(interner, "breakpoint").unwrap();
    assert_eq!(
        breakpoint.as_procedure().map(|(k, _)| k),
        Some(ProcedureKind::Breakpoint)
    );
    let (stmts, nested) = breakpoint.body().unwrap().as_block().unwrap();
    assert!(!nested);
    assert_eq!(stmts.len(), 3);
    assert!(matches!(
        stmts[0],
        modl_language::Expr::Solve {
            method: SolveMethod::Cnexp,
            ..
        }
    ));

    let states = module.symbol_named(interner, "states").unwrap();
    assert_eq!(
        states.as_procedure().map(|(k, _)| k),
        Some(ProcedureKind::Derivative)
    );
    assert!(states.body().is_some());

    let vtrap = module.symbol_named(interner, "vtrap").unwrap();
    let (body_stmts, _) = vtrap.body().unwrap().as_block().unwrap();
    assert_eq!(body_stmts.len(), 1);
    assert!(body_stmts[0].as_if().is_some());
}

#[test]
fn reparsing_a_body_is_idempotent() {
    let (ctx_a, interner) = static_context();
    let first = parser::parse_module("kdr", KDR, interner, ctx_a);
    let (ctx_b, _) = static_context();
    let second = parser::parse_module("kdr", KDR, interner, ctx_b);

    for name in ["breakpoint", "states", "rates", "vtrap"] {
        let a = first.symbol_named(interner, name).unwrap().body().unwrap();
        let b = second.symbol_named(interner, name).unwrap().body().unwrap();
        assert_eq!(format!("{a:?}"), format!("{b:?}"), "body of '{name}' differs");
    }
}

const CAPOOL: &str = r#"NEURON {
    SUFFIX capool
    USEION ca READ ica WRITE cai VALENCE 2
}

STATE {
    A B C
}

BREAKPOINT {
    SOLVE scheme METHOD sparse
}

KINETIC scheme {
    LOCAL kf, kb
    kf = 2
    kb = 4
    ~ A + B <-> C (kf, kb)
    CONSERVE A + B + C = 1
}
"#;

#[test]
fn kinetic_blocks_parse_reactions_and_conservation() {
    let (ctx, interner) = static_context();
    let module = parser::parse_module("capool", CAPOOL, interner, ctx);
    assert_eq!(module.status(), Status::Happy, "{:?}", module.first_error());

    let ion = &module.neuron_info().ion_deps[0];
    assert_eq!(ion.name, "ca");
    assert_eq!(ion.valence, Some(2));

    let scheme = module.symbol_named(interner, "scheme").unwrap();
    assert_eq!(
        scheme.as_procedure().map(|(k, _)| k),
        Some(ProcedureKind::Kinetic)
    );
    let (stmts, _) = scheme.body().unwrap().as_block().unwrap();
    assert_eq!(stmts.len(), 5);
    assert!(matches!(stmts[3], modl_language::Expr::Reaction { .. }));
    assert!(matches!(stmts[4], modl_language::Expr::Conserve { .. }));
}

const EXPSYN: &str = r#"NEURON {
    POINT_PROCESS ExpSyn
    NONSPECIFIC_CURRENT i
    RANGE tau, e
}

PARAMETER {
    tau = 2 (ms)
    e = 0 (mV)
}

ASSIGNED {
    v (mV)
    i (nA)
}

STATE {
    g (uS)
}

INITIAL {
    g = 0
}

BREAKPOINT {
    SOLVE state METHOD cnexp
    i = g * (v - e)
}

DERIVATIVE state {
    g' = -g / tau
}

NET_RECEIVE(weight (uS)) {
    g = g + weight
}
"#;

#[test]
fn point_processes_register_net_receive_arguments() {
    let (ctx, interner) = static_context();
    let module = parser::parse_module("expsyn", EXPSYN, interner, ctx);
    assert_eq!(module.status(), Status::Happy, "{:?}", module.first_error());

    let info = module.neuron_info();
    assert_eq!(info.point_process.as_deref(), Some("ExpSyn"));
    assert_eq!(info.nonspecific_currents, vec!["i"]);

    let net_receive = module.symbol_named(interner, "net_receive").unwrap();
    let (kind, args) = net_receive.as_procedure().unwrap();
    assert_eq!(kind, ProcedureKind::NetReceive);
    assert_eq!(args.len(), 1);
    assert_eq!(interner.resolve(args[0]), "weight");
    assert!(net_receive.body().is_some());
}

#[test]
fn conductance_statements_survive_to_the_ast() {
    let source = "NEURON { SUFFIX pas NONSPECIFIC_CURRENT i }\n\
                  PARAMETER { g = 0.001 }\n\
                  BREAKPOINT {\n    CONDUCTANCE g\n    i = g * v\n}\n";
    let (ctx, interner) = static_context();
    let module = parser::parse_module("pas", source, interner, ctx);
    assert_eq!(module.status(), Status::Happy, "{:?}", module.first_error());

    let breakpoint = module.symbol_named(interner, "breakpoint").unwrap();
    let (stmts, _) = breakpoint.body().unwrap().as_block().unwrap();
    assert!(matches!(
        stmts[0],
        modl_language::Expr::Conductance {
            ion: IonKind::Nonspecific,
            ..
        }
    ));
}

#[test]
fn parameters_accept_negative_defaults() {
    let source = "PARAMETER {\n    e = -65 (mV)\n    shift = -1.5\n}\n";
    let (ctx, interner) = static_context();
    let module = parser::parse_module("p", source, interner, ctx);
    assert_eq!(module.status(), Status::Happy, "{:?}", module.first_error());

    let params = module.parameters();
    assert_eq!(params[0].default, Some(-65.0));
    assert_eq!(params[0].unit.as_deref(), Some("mV"));
    assert_eq!(params[1].default, Some(-1.5));
}

#[test]
fn linear_blocks_register_and_parse() {
    let source = "STATE { a b }\nLINEAR lin {\n    ~ a <-> b (1, 1)\n}\n";
    let (ctx, interner) = static_context();
    let module = parser::parse_module("lin", source, interner, ctx);
    assert_eq!(module.status(), Status::Happy, "{:?}", module.first_error());

    let lin = module.symbol_named(interner, "lin").unwrap();
    assert_eq!(
        lin.as_procedure().map(|(k, _)| k),
        Some(ProcedureKind::Linear)
    );
    assert!(lin.body().is_some());
}

// ── Error paths ─────────────────────────────────────────────────────

#[test]
fn duplicate_declarations_across_sections_are_diagnosed() {
    let source = "STATE { m }\nPARAMETER { m = 1 }\nBREAKPOINT { m = 0 }\n";
    let (ctx, interner) = static_context();
    let module = parser::parse_module("dup", source, interner, ctx);
    assert_eq!(module.status(), Status::Error);
    let err = module.first_error().unwrap();
    assert!(err.message.contains("duplicate declaration of 'm'"), "{err}");
}

#[test]
fn unknown_ions_are_diagnosed() {
    let source = "NEURON { SUFFIX bad USEION zz READ ezz }\n";
    let (ctx, interner) = static_context();
    let module = parser::parse_module("bad", source, interner, ctx);
    assert_eq!(module.status(), Status::Error);
    assert!(module
        .first_error()
        .unwrap()
        .message
        .contains("unknown ion 'zz'"));
}

#[test]
fn malformed_valence_is_diagnosed() {
    let source = "NEURON { SUFFIX bad USEION ca READ cai VALENCE 0.5 }\n";
    let (ctx, interner) = static_context();
    let module = parser::parse_module("bad", source, interner, ctx);
    assert_eq!(module.status(), Status::Error);
    assert!(module
        .first_error()
        .unwrap()
        .message
        .contains("integer valence"));
}

#[test]
fn first_error_location_is_reported_and_scanning_resumes() {
    // The NEURON block is malformed, but the later STATE block still loads.
    let source = "NEURON { SUFFIX }\nSTATE { h }\n";
    let (ctx, interner) = static_context();
    let module = parser::parse_module("bad", source, interner, ctx);

    assert_eq!(module.status(), Status::Error);
    let err = module.first_error().unwrap();
    assert_eq!(err.location.line, 1);
    assert!(err.message.contains("expected a mechanism name"), "{err}");
    assert_eq!(module.state_vars().len(), 1);
}

#[test]
fn unbalanced_procedural_braces_are_diagnosed() {
    let source = "BREAKPOINT {\n    g = 1\n";
    let (ctx, interner) = static_context();
    let module = parser::parse_module("bad", source, interner, ctx);
    assert_eq!(module.status(), Status::Error);
    assert!(module
        .first_error()
        .unwrap()
        .message
        .contains("unbalanced braces"));
}

#[test]
fn pass_two_reports_body_errors() {
    let source = "BREAKPOINT {\n    1 = g\n}\n";
    let (ctx, interner) = static_context();
    let module = parser::parse_module("bad", source, interner, ctx);
    assert_eq!(module.status(), Status::Error);
    assert!(module
        .first_error()
        .unwrap()
        .message
        .contains("not assignable"));
}

#[test]
fn rendered_diagnostics_point_into_the_source() {
    let source = "BREAKPOINT {\n    g = * 2\n}\n";
    let (ctx, interner) = static_context();
    let module = parser::parse_module("bad", source, interner, ctx);
    assert_eq!(module.status(), Status::Error);

    let err = module.first_error().unwrap();
    let rendered = modl_language::render_with_source(err, source);
    assert!(rendered.contains("g = * 2"));
    assert!(rendered.contains('^'));
}
