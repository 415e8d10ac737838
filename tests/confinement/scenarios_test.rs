/*!
 * End-to-end Confinement Scenarios
 */

use confine_engine::{CapabilitySet, ExecResult, Permission, Sandbox, Value};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn run_script(grant: CapabilitySet, source: &str) -> ExecResult<Value> {
    let sandbox = Sandbox::new();
    let unit = sandbox.compile("scenario", source)?;
    sandbox.confine(&unit, grant);
    sandbox.invoke(&unit, &[])
}

fn assert_denied(result: ExecResult<Value>, permission: Permission) {
    match result {
        Err(err) => {
            assert!(err.is_access_denied(), "expected a denial, got {:?}", err);
            assert_eq!(err.denied_permission(), Some(permission));
        }
        Ok(value) => panic!("expected {} to be denied, got {}", permission, value),
    }
}

#[test]
fn test_grant_none_plain_computation() {
    assert_eq!(
        run_script(CapabilitySet::NONE, "return true;").unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_grant_none_read_property_denied() {
    assert_denied(
        run_script(CapabilitySet::NONE, "return property(\"user.home\");"),
        Permission::ReadProperty,
    );
}

#[test]
fn test_grant_none_delete_file_denied() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keep.txt");
    std::fs::write(&path, "precious").unwrap();

    let source = format!("return delete_file(\"{}\");", path.display());
    assert_denied(run_script(CapabilitySet::NONE, &source), Permission::DeleteFile);

    // Denied before the operation took effect.
    assert!(path.exists());
}

#[test]
fn test_grant_none_type_literal() {
    assert_eq!(
        run_script(CapabilitySet::NONE, "return type(String) != null;").unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_grant_none_resolve_by_name() {
    assert_eq!(
        run_script(CapabilitySet::NONE, "return resolve(\"core.String\") != null;").unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_grant_none_locate_field_denied() {
    assert_denied(
        run_script(CapabilitySet::NONE, "return field(String, \"value\") != null;"),
        Permission::ReflectMembers,
    );
}

#[test]
fn test_grant_all_suppress_access_checks() {
    let source = r#"
        let f = field(System, "props");
        f.set_accessible(true);
        return f != null;
    "#;
    assert_eq!(
        run_script(CapabilitySet::ALL, source).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_grant_none_denies_every_sensitive_category() {
    let attempts = [
        ("property(\"os.name\");", Permission::ReadProperty),
        ("set_property(\"k\", \"v\");", Permission::WriteProperty),
        ("read_file(\"/nonexistent\");", Permission::ReadFile),
        ("write_file(\"/nonexistent\", \"x\");", Permission::WriteFile),
        ("delete_file(\"/nonexistent\");", Permission::DeleteFile),
        ("exec(\"true\");", Permission::ExecProcess),
        ("connect(\"127.0.0.1:9\");", Permission::Connect),
        ("field(Object, \"x\");", Permission::ReflectMembers),
        ("eval(\"return 1;\");", Permission::DefineUnit),
    ];
    for (source, permission) in attempts {
        assert_denied(run_script(CapabilitySet::NONE, source), permission);
    }
}

#[test]
fn test_grant_all_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("note.txt");
    let source = format!(
        r#"
        write_file("{p}", "hello");
        let text = read_file("{p}");
        let first = delete_file("{p}");
        let second = delete_file("{p}");
        return text == "hello" == first == !second;
        "#,
        p = path.display()
    );
    assert_eq!(
        run_script(CapabilitySet::ALL, &source).unwrap(),
        Value::Bool(true)
    );
    assert!(!path.exists());
}

#[test]
fn test_partial_grant() {
    let grant = CapabilitySet::from_iter([Permission::ReadProperty, Permission::WriteProperty]);
    let sandbox = Sandbox::new();
    let unit = sandbox
        .compile("props", "set_property(\"app.mode\", \"safe\"); return property(\"app.mode\");")
        .unwrap();
    sandbox.confine(&unit, grant);
    assert_eq!(sandbox.invoke(&unit, &[]).unwrap(), Value::str("safe"));
    assert_eq!(sandbox.property("app.mode").as_deref(), Some("safe"));

    let other = sandbox.compile("reader", "return read_file(\"/etc/hostname\");").unwrap();
    sandbox.confine(&other, grant);
    assert_denied(sandbox.invoke(&other, &[]), Permission::ReadFile);
}

#[test]
fn test_eval_requires_define_unit_and_stays_bounded() {
    let grant = CapabilitySet::from(Permission::DefineUnit);
    assert_eq!(
        run_script(grant, "return eval(\"return 40 == 40;\");").unwrap(),
        Value::Bool(true)
    );
    // The evaluated code runs beneath its creator and inherits its bound.
    assert_denied(
        run_script(grant, "return eval(\"return property(\\\"os.name\\\");\");"),
        Permission::ReadProperty,
    );
}

#[test]
fn test_reconfine_overwrites() {
    let sandbox = Sandbox::new();
    let unit = sandbox.compile("flip", "return property(\"os.name\") != null;").unwrap();

    sandbox.confine(&unit, CapabilitySet::NONE);
    assert_denied(sandbox.invoke(&unit, &[]), Permission::ReadProperty);

    let previous = sandbox.confine(&unit, CapabilitySet::from(Permission::ReadProperty));
    assert_eq!(previous, Some(CapabilitySet::NONE));
    assert_eq!(sandbox.invoke(&unit, &[]).unwrap(), Value::Bool(true));

    sandbox.release(&unit);
    assert_eq!(sandbox.grant_of(&unit), None);
    assert_eq!(sandbox.invoke(&unit, &[]).unwrap(), Value::Bool(true));
}

#[test]
fn test_arguments_reach_script() {
    let sandbox = Sandbox::new();
    let unit = sandbox.compile("args", "return arg(0) == 5;").unwrap();
    sandbox.confine(&unit, CapabilitySet::NONE);
    assert_eq!(
        sandbox.invoke(&unit, &[Value::Int(5)]).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        sandbox.invoke(&unit, &[]).unwrap(),
        Value::Bool(false)
    );
}
