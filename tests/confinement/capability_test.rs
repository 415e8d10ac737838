/*!
 * Capability Set Properties
 */

use confine_engine::permissions::{Action, DefaultPolicy, Policy};
use confine_engine::{CapabilitySet, CodeUnit, Permission, Sandbox, Value};
use proptest::prelude::*;

fn capability_set() -> impl Strategy<Value = CapabilitySet> {
    any::<u16>().prop_map(CapabilitySet::from_bits_truncate)
}

const SENSITIVE: [Action; 10] = [
    Action::ReadProperty,
    Action::WriteProperty,
    Action::ReadFile,
    Action::WriteFile,
    Action::DeleteFile,
    Action::ExecProcess,
    Action::Connect,
    Action::DeclaredMember,
    Action::SuppressAccessChecks,
    Action::DefineUnit,
];

/// Actions a unit under `grant` is denied, as observed through the audit trail
fn denied(grant: CapabilitySet) -> Vec<Action> {
    let sandbox = Sandbox::new();
    let unit = CodeUnit::native("sweep", |ctx| {
        for action in SENSITIVE {
            let _ = ctx.check(action);
        }
        Ok(Value::Null)
    });
    sandbox.confine(&unit, grant);
    let _ = sandbox.invoke(&unit, &[]);

    sandbox
        .audit()
        .for_unit(unit.id(), SENSITIVE.len())
        .into_iter()
        .filter(|event| !event.allowed)
        .map(|event| event.action)
        .collect()
}

proptest! {
    #[test]
    fn prop_intersection_is_commutative(a in capability_set(), b in capability_set()) {
        prop_assert_eq!(a.intersect(b), b.intersect(a));
    }

    #[test]
    fn prop_intersection_is_associative(
        a in capability_set(),
        b in capability_set(),
        c in capability_set(),
    ) {
        prop_assert_eq!(a.intersect(b).intersect(c), a.intersect(b.intersect(c)));
    }

    #[test]
    fn prop_all_is_identity_none_absorbs(a in capability_set()) {
        prop_assert_eq!(a.intersect(CapabilitySet::ALL), a);
        prop_assert_eq!(a.intersect(CapabilitySet::NONE), CapabilitySet::NONE);
    }

    #[test]
    fn prop_implies_matches_membership(a in capability_set()) {
        for permission in Permission::ALL {
            prop_assert_eq!(a.implies(permission), a.iter().any(|p| p == permission));
        }
    }

    #[test]
    fn prop_display_parses_back(a in capability_set()) {
        let text = a.to_string();
        let trimmed = text.trim_start_matches('{').trim_end_matches('}');
        let parsed: CapabilitySet = trimmed.parse().unwrap();
        prop_assert_eq!(parsed, a);
    }

    #[test]
    fn prop_denials_match_policy(a in capability_set()) {
        let policy = DefaultPolicy;
        let mut expected: Vec<Action> = SENSITIVE
            .iter()
            .copied()
            .filter(|action| !a.contains(policy.requirements(*action)))
            .collect();
        let mut observed = denied(a);
        expected.sort_by_key(|action| action.as_str());
        observed.sort_by_key(|action| action.as_str());
        prop_assert_eq!(observed, expected);
    }

    #[test]
    fn prop_larger_grant_denies_less(a in capability_set(), b in capability_set()) {
        let larger = a.union(b);
        let denied_small = denied(b);
        let denied_large = denied(larger);
        for action in &denied_large {
            prop_assert!(denied_small.contains(action));
        }
    }
}

#[test]
fn test_sweep_matches_audit_trail() {
    let sandbox = Sandbox::new();
    let unit = CodeUnit::native("sweep", |ctx| {
        for action in SENSITIVE {
            let _ = ctx.check(action);
        }
        Ok(Value::Null)
    });
    sandbox.confine(&unit, CapabilitySet::from(Permission::Connect));
    assert!(sandbox.invoke(&unit, &[]).is_err());

    assert_eq!(sandbox.audit().denial_count(unit.id()), 9);
}
