/*!
 * Script Front-End Tests
 * Compile-time rejection and runtime behavior of the reference compiler
 */

use confine_engine::runtime::Compiler;
use confine_engine::{CapabilitySet, CompileError, Sandbox, ScriptCompiler, Value};
use pretty_assertions::assert_eq;

fn compile_err(source: &str) -> CompileError {
    match ScriptCompiler::new().compile("bad", source) {
        Ok(unit) => panic!("{:?} should not compile", unit),
        Err(err) => err,
    }
}

#[test]
fn test_syntax_error_position() {
    let err = compile_err("let x = 1;\nlet y = ;\n");
    assert_eq!((err.line, err.col), (2, 9));
    assert_eq!(err.message, "expected expression, found ';'");
}

#[test]
fn test_unknown_type_literal_fails_at_compile_time() {
    let err = compile_err("return type(Socket);");
    assert_eq!((err.line, err.col), (1, 13));
    assert_eq!(err.message, "unknown type 'Socket'");
}

#[test]
fn test_arity_checked() {
    let err = compile_err("field(String);");
    assert_eq!(err.message, "'field' takes 2 arguments, found 1");

    let err = compile_err("type(String).name(1);");
    assert_eq!(err.message, "'name' takes 0 arguments, found 1");
}

#[test]
fn test_failed_compile_registers_nothing() {
    let sandbox = Sandbox::new();
    assert!(sandbox.compile("broken", "return (1;").is_err());
    assert_eq!(sandbox.stats().invocations, 0);
    assert!(sandbox.registry().is_empty());
}

#[test]
fn test_eval_compile_error_surfaces() {
    let sandbox = Sandbox::new();
    let unit = sandbox.compile("outer", "return eval(\"return ;\");").unwrap();
    sandbox.confine(&unit, CapabilitySet::ALL);
    let err = sandbox.invoke(&unit, &[]).unwrap_err();
    assert!(!err.is_access_denied());
    assert!(err.to_string().starts_with("Compile error at 1:8"));
}

#[test]
fn test_call_linked_script() {
    let sandbox = Sandbox::new();
    let helper = sandbox
        .compile("helper", "return property(\"engine.version\") != null;")
        .unwrap();
    sandbox.link(helper);

    let main = sandbox.compile("main", "return call(\"helper\");").unwrap();
    sandbox.confine(&main, CapabilitySet::from_iter([confine_engine::Permission::ReadProperty]));
    assert_eq!(sandbox.invoke(&main, &[]).unwrap(), Value::Bool(true));

    sandbox.confine(&main, CapabilitySet::NONE);
    assert!(sandbox.invoke(&main, &[]).unwrap_err().is_access_denied());
}

#[test]
fn test_comments_and_whitespace() {
    let sandbox = Sandbox::new();
    let unit = sandbox
        .compile(
            "commented",
            "// leading comment\n  let a = \"x\"; // trailing\n\n return a == \"x\";",
        )
        .unwrap();
    sandbox.confine(&unit, CapabilitySet::NONE);
    assert_eq!(sandbox.invoke(&unit, &[]).unwrap(), Value::Bool(true));
}

#[test]
fn test_deep_nesting_rejected_without_running() {
    let sandbox = Sandbox::new();
    let source = format!("return {}true;", "!".repeat(200_000));
    let err = sandbox.compile("deep", &source).unwrap_err();
    assert_eq!(err.line, 1);
    assert!(err.message.contains("nested deeper"));
    assert_eq!(sandbox.stats().invocations, 0);
}

#[test]
fn test_deep_nesting_through_eval_fails_cleanly() {
    let sandbox = Sandbox::new();
    let inner = format!("return {}1{};", "(".repeat(50_000), ")".repeat(50_000));
    let source = format!("return eval(\"{}\");", inner);
    let unit = sandbox.compile("evaluator", &source).unwrap();
    sandbox.confine(&unit, CapabilitySet::from(confine_engine::Permission::DefineUnit));

    let err = sandbox.invoke(&unit, &[]).unwrap_err();
    assert!(!err.is_access_denied());
    assert!(err.to_string().contains("nested deeper"));
}
