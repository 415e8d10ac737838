/*!
 * Audit Trail Tests
 */

use confine_engine::permissions::{Action, AuditSeverity};
use confine_engine::{CapabilitySet, CodeUnit, EngineConfig, Permission, Sandbox, Value};
use pretty_assertions::assert_eq;

#[test]
fn test_denials_recorded_with_severity() {
    let sandbox = Sandbox::new();
    let unit = CodeUnit::native("noisy", |ctx| {
        let _ = ctx.property("os.name");
        let _ = ctx.exec("true");
        Ok(Value::Null)
    });
    sandbox.confine(&unit, CapabilitySet::NONE);
    assert!(sandbox.invoke(&unit, &[]).is_err());

    let events = sandbox.audit().for_unit(unit.id(), 10);
    let summary: Vec<_> = events
        .iter()
        .map(|e| (e.action, e.denied, e.severity))
        .collect();
    assert_eq!(
        summary,
        vec![
            (
                Action::ExecProcess,
                Some(Permission::ExecProcess),
                AuditSeverity::Critical
            ),
            (
                Action::ReadProperty,
                Some(Permission::ReadProperty),
                AuditSeverity::Warning
            ),
        ]
    );
    assert_eq!(sandbox.audit().units_with_denials(), vec![(unit.id(), 2)]);
}

#[test]
fn test_allowed_checks_not_recorded_by_default() {
    let sandbox = Sandbox::new();
    let unit = CodeUnit::native("quiet", |ctx| ctx.property("os.name"));
    sandbox.confine(&unit, CapabilitySet::ALL);
    sandbox.invoke(&unit, &[]).unwrap();

    assert_eq!(sandbox.audit().stats().total_events, 0);
}

#[test]
fn test_event_serializes_timestamp_as_seconds() {
    let sandbox = Sandbox::new();
    let unit = CodeUnit::native("json", |ctx| {
        ctx.read_file("/nonexistent").map(Value::from)
    });
    sandbox.confine(&unit, CapabilitySet::NONE);
    let _ = sandbox.invoke(&unit, &[]);

    let events = sandbox.audit().recent(1);
    let json = serde_json::to_value(&events[0]).unwrap();
    assert!(json["logged_at"].is_i64());
    assert_eq!(json["action"], "read_file");
    assert_eq!(json["allowed"], false);
}

#[test]
fn test_repeated_eval_does_not_grow_unit_tracking() {
    let sandbox = Sandbox::with_config(EngineConfig::default().with_audit_allowed(true));
    let unit = sandbox
        .compile(
            "looper",
            r#"
            eval("return property(\"os.name\");");
            eval("return property(\"os.name\");");
            return eval("return property(\"os.name\");") != null;
            "#,
        )
        .unwrap();
    sandbox.confine(
        &unit,
        CapabilitySet::from_iter([Permission::DefineUnit, Permission::ReadProperty]),
    );
    assert_eq!(sandbox.invoke(&unit, &[]).unwrap(), Value::Bool(true));

    // Only the confined unit keeps a per-unit log; the global ring has everything.
    assert_eq!(sandbox.audit().stats().units_tracked, 1);
    assert_eq!(sandbox.audit().for_unit(unit.id(), 10).len(), 3);
    assert_eq!(sandbox.audit().recent(10).len(), 6);
}
