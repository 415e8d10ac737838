/*!
 * Call Path Semantics Tests
 * Nested invocation, denial propagation, unwinding and thread isolation
 */

use confine_engine::permissions::call_path;
use confine_engine::{Action, CapabilitySet, CodeUnit, ExecError, Permission, Sandbox, Value};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Barrier};
use std::thread;

fn property_reader() -> CodeUnit {
    CodeUnit::native("reader", |ctx| ctx.property("os.name"))
}

#[test]
fn test_confined_caller_restricts_unconfined_helper() {
    let sandbox = Sandbox::new();
    sandbox.link(property_reader());

    let caller = CodeUnit::native("caller", |ctx| ctx.call("reader", &[]));
    sandbox.confine(&caller, CapabilitySet::NONE);

    let err = sandbox.invoke(&caller, &[]).unwrap_err();
    assert_eq!(err.denied_permission(), Some(Permission::ReadProperty));
    assert_eq!(err.denied_by(), Some(caller.id()));
}

#[test]
fn test_unconfined_caller_restricted_only_inside_helper() {
    let sandbox = Sandbox::new();
    let helper = property_reader();
    sandbox.confine(&helper, CapabilitySet::NONE);
    sandbox.link(helper.clone());

    let caller = CodeUnit::native("caller", |ctx| {
        let own = ctx.property("os.name")?;
        assert!(!own.is_null());
        ctx.call("reader", &[])
    });

    let err = sandbox.invoke(&caller, &[]).unwrap_err();
    assert_eq!(err.denied_by(), Some(helper.id()));

    // Outside any frame the host is back to ambient trust.
    assert!(sandbox.check(Action::ReadProperty).is_ok());
}

#[test]
fn test_less_restricted_callee_cannot_widen() {
    let sandbox = Sandbox::new();
    let callee = CodeUnit::native("writer", |ctx| {
        ctx.set_property("k", "v")?;
        Ok(Value::Bool(true))
    });
    sandbox.confine(&callee, CapabilitySet::ALL);
    sandbox.link(callee);

    let caller = CodeUnit::native("caller", |ctx| ctx.call("writer", &[]));
    sandbox.confine(&caller, CapabilitySet::from(Permission::ReadProperty));

    let err = sandbox.invoke(&caller, &[]).unwrap_err();
    assert_eq!(err.denied_permission(), Some(Permission::WriteProperty));
    assert_eq!(err.denied_by(), Some(caller.id()));
    assert_eq!(sandbox.property("k"), None);
}

#[test]
fn test_caught_denial_still_reaches_host() {
    let sandbox = Sandbox::new();
    let unit = CodeUnit::native("catcher", |ctx| {
        match ctx.delete_file("/definitely/not/here") {
            Err(ExecError::AccessDenied(_)) => Ok(Value::str("recovered")),
            other => other.map(Value::Bool),
        }
    });
    sandbox.confine(&unit, CapabilitySet::NONE);

    let err = sandbox.invoke(&unit, &[]).unwrap_err();
    assert_eq!(err.denied_permission(), Some(Permission::DeleteFile));
}

#[test]
fn test_caught_nested_denial_still_reaches_host() {
    let sandbox = Sandbox::new();
    let helper = property_reader();
    sandbox.confine(&helper, CapabilitySet::NONE);
    sandbox.link(helper);

    let caller = CodeUnit::native("swallower", |ctx| {
        let _ = ctx.call("reader", &[]);
        Ok(Value::Null)
    });

    let err = sandbox.invoke(&caller, &[]).unwrap_err();
    assert!(err.is_access_denied());
    assert_eq!(sandbox.stats().denials, 1);
}

#[test]
fn test_frames_popped_on_error_and_panic() {
    let sandbox = Sandbox::new();

    let failing = CodeUnit::native("failing", |ctx| {
        assert_eq!(call_path::depth(), 1);
        Err(ExecError::fault(ctx.unit().name(), "boom"))
    });
    let err = sandbox.invoke(&failing, &[]).unwrap_err();
    assert!(!err.is_access_denied());
    assert_eq!(call_path::depth(), 0);

    let panicking = CodeUnit::native("panicking", |_| panic!("unit crashed"));
    let outer = CodeUnit::native("outer", {
        let sandbox = sandbox.clone();
        let panicking = panicking.clone();
        move |_| sandbox.invoke(&panicking, &[])
    });
    let outcome = catch_unwind(AssertUnwindSafe(|| sandbox.invoke(&outer, &[])));
    assert!(outcome.is_err());
    assert_eq!(call_path::depth(), 0);
    assert!(call_path::units().is_empty());
}

#[test]
fn test_path_is_per_thread() {
    let sandbox = Sandbox::new();
    let barrier = Arc::new(Barrier::new(2));

    let waiting = CodeUnit::native("waiting", {
        let barrier = barrier.clone();
        move |ctx| {
            // Hold the confined frame while the other thread runs.
            barrier.wait();
            barrier.wait();
            ctx.check(Action::TypeLiteral)?;
            Ok(Value::Null)
        }
    });
    sandbox.confine(&waiting, CapabilitySet::NONE);

    let confined = {
        let sandbox = sandbox.clone();
        let waiting = waiting.clone();
        thread::spawn(move || sandbox.invoke(&waiting, &[]))
    };

    barrier.wait();
    let free = CodeUnit::native("free", |ctx| ctx.property("os.name"));
    let value = sandbox.invoke(&free, &[]).unwrap();
    assert!(!value.is_null());
    barrier.wait();

    assert_eq!(confined.join().unwrap().unwrap(), Value::Null);
}

#[test]
fn test_depth_visible_inside_nested_calls() {
    let sandbox = Sandbox::new();
    sandbox.link(CodeUnit::native("leaf", |_| {
        Ok(Value::Int(call_path::depth() as i64))
    }));
    let root = CodeUnit::native("root", |ctx| ctx.call("leaf", &[]));
    assert_eq!(sandbox.invoke(&root, &[]).unwrap(), Value::Int(2));
}
