/*!
 * Confinement Registry Concurrency Tests
 */

use confine_engine::{
    CapabilitySet, CodeUnit, ConfinementRegistry, Permission, Sandbox, UnitId, Value,
};
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_registration_and_lookup() {
    let registry = Arc::new(ConfinementRegistry::new());
    let units: Vec<UnitId> = (0..64).map(|_| UnitId::next()).collect();

    let writers: Vec<_> = units
        .chunks(16)
        .map(|chunk| {
            let registry = registry.clone();
            let chunk = chunk.to_vec();
            thread::spawn(move || {
                for unit in chunk {
                    registry.confine(unit, CapabilitySet::from(Permission::ReadFile));
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = registry.clone();
            let units = units.clone();
            thread::spawn(move || {
                for unit in &units {
                    // Either not yet published or the full grant; never torn.
                    if let Some(grant) = registry.lookup(*unit) {
                        assert_eq!(grant, CapabilitySet::from(Permission::ReadFile));
                    }
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), units.len());
    let stats = registry.stats();
    assert_eq!(stats.records, 64);
    assert_eq!(stats.writes, 64);
}

#[test]
fn test_registration_before_spawn_is_visible() {
    let sandbox = Sandbox::new();
    let unit = CodeUnit::native("remote", |ctx| ctx.property("os.name"));
    sandbox.confine(&unit, CapabilitySet::NONE);

    let handle = {
        let sandbox = sandbox.clone();
        let unit = unit.clone();
        thread::spawn(move || sandbox.invoke(&unit, &[]))
    };
    let err = handle.join().unwrap().unwrap_err();
    assert_eq!(err.denied_permission(), Some(Permission::ReadProperty));
}

#[test]
fn test_confine_is_idempotent() {
    let sandbox = Sandbox::new();
    let unit = CodeUnit::native("twice", |ctx| {
        ctx.read_file("/nonexistent/file").map(Value::from)
    });
    let grant = CapabilitySet::from(Permission::ReadProperty);

    sandbox.confine(&unit, grant);
    let once = sandbox.invoke(&unit, &[]).unwrap_err();
    assert_eq!(sandbox.confine(&unit, grant), Some(grant));
    let twice = sandbox.invoke(&unit, &[]).unwrap_err();

    assert_eq!(once, twice);
    assert_eq!(sandbox.registry().len(), 1);
}

#[test]
fn test_grant_widens() {
    let sandbox = Sandbox::new();
    let unit = CodeUnit::native("widen", |ctx| ctx.property("os.name"));
    sandbox.confine(&unit, CapabilitySet::from(Permission::ReadFile));
    assert!(sandbox.invoke(&unit, &[]).is_err());

    let merged = sandbox.grant(&unit, CapabilitySet::from(Permission::ReadProperty));
    assert_eq!(
        merged,
        CapabilitySet::from_iter([Permission::ReadFile, Permission::ReadProperty])
    );
    assert!(matches!(sandbox.invoke(&unit, &[]), Ok(Value::Str(_))));
}

#[test]
fn test_snapshot_is_stable() {
    let registry = ConfinementRegistry::new();
    let unit = UnitId::next();
    registry.confine(unit, CapabilitySet::NONE);

    let before = registry.snapshot();
    registry.confine(unit, CapabilitySet::ALL);

    assert_eq!(before.lookup(unit), Some(CapabilitySet::NONE));
    assert_eq!(registry.snapshot().lookup(unit), Some(CapabilitySet::ALL));
    assert_eq!(before.records(), vec![(unit, CapabilitySet::NONE)]);
}
