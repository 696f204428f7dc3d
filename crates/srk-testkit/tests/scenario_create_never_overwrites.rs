//! Scenario: create refuses an existing object and leaves it untouched.
//!
//! # Invariants under test
//!
//! 1. Creating lifecycle policy `policy-a` twice fails the second time with
//!    Fatal "already exists"; the stored policy is the first one and only one
//!    write reached the cluster.
//! 2. Kinds whose create endpoint dedups natively (index, template) surface
//!    the server's refusal as the same Fatal "already exists".
//! 3. A destination or monitor whose name is already taken is refused before
//!    any POST, with no identity hint from the host.
//! 4. A stale server-assigned id is checked, not trusted.
//! 5. A name with URL-reserved characters never lands on a neighbouring object.
//!
//! GREEN when: no second create ever overwrites the first.

use serde_json::json;
use srk_cluster::{CancelToken, Method};
use srk_reconcile::{Desired, Reconciler};
use srk_schemas::{Dialect, ErrorKind, Operation, ResourceIdentity, ResourceKind};
use srk_testkit::{sample_body, FakeCluster};

fn assert_already_exists(err: &srk_schemas::ReconcileError) {
    assert_eq!(err.kind, ErrorKind::Fatal, "{err}");
    assert_eq!(err.operation, Operation::Create);
    assert!(err.message.contains("already exists"), "{}", err.message);
}

#[test]
fn second_policy_create_is_refused_and_first_survives() {
    for dialect in [Dialect::V6, Dialect::V7] {
        let fake = FakeCluster::shared(dialect);
        let r = Reconciler::new(&fake.handle(), ResourceKind::LifecyclePolicy);
        let cancel = CancelToken::new();
        let id = ResourceIdentity::named("policy-a");

        let first = json!({"policy": {"phases": {"delete": {"min_age": "30d", "actions": {"delete": {}}}}}});
        r.create(&Desired::named(id.clone(), first), &cancel).unwrap();
        let stored = fake.policy("policy-a").unwrap();

        let second = json!({"policy": {"phases": {"delete": {"min_age": "1d", "actions": {"delete": {}}}}}});
        let err = r.create(&Desired::named(id.clone(), second), &cancel).unwrap_err();

        assert_already_exists(&err);
        assert_eq!(err.identity, Some(id));
        assert_eq!(fake.policy("policy-a").unwrap(), stored, "{dialect}");
        assert_eq!(fake.count(Method::Put, "/_ilm/policy/"), 1, "{dialect}");
    }
}

#[test]
fn native_dedup_refusals_read_as_already_exists() {
    for kind in [ResourceKind::Index, ResourceKind::IndexTemplate] {
        for dialect in Dialect::ALL {
            let fake = FakeCluster::shared(dialect);
            let r = Reconciler::new(&fake.handle(), kind);
            let cancel = CancelToken::new();
            let desired = Desired::named(ResourceIdentity::named("dup"), sample_body(kind));

            r.create(&desired, &cancel).unwrap();
            let err = r.create(&desired, &cancel).unwrap_err();

            assert_already_exists(&err);
            assert_eq!(err.wire.status, Some(400), "{dialect}/{kind}");
            // No read-before-create: both attempts went straight to the write.
            assert_eq!(fake.count(Method::Get, "/"), 0, "{dialect}/{kind}");
        }
    }
}

#[test]
fn destination_with_taken_name_is_refused() {
    for dialect in [Dialect::V6, Dialect::V7] {
        let fake = FakeCluster::shared(dialect);
        let r = Reconciler::new(&fake.handle(), ResourceKind::AlertingDestination);
        let cancel = CancelToken::new();
        let desired = Desired::new(sample_body(ResourceKind::AlertingDestination));

        let first = r.create(&desired, &cancel).unwrap();
        let err = r.create(&desired, &cancel).unwrap_err();

        assert_already_exists(&err);
        assert!(err.message.contains("'ops'"), "{}", err.message);
        assert_eq!(err.identity, Some(first.identity));
        assert_eq!(fake.destination_count(), 1, "{dialect}");
        assert_eq!(
            fake.count(Method::Post, "/_opendistro/_alerting/destinations"),
            1,
            "{dialect}"
        );
    }
}

#[test]
fn monitor_with_taken_name_is_refused() {
    for dialect in [Dialect::V6, Dialect::V7] {
        let fake = FakeCluster::shared(dialect);
        let r = Reconciler::new(&fake.handle(), ResourceKind::AlertingMonitor);
        let cancel = CancelToken::new();
        let desired = Desired::new(sample_body(ResourceKind::AlertingMonitor));

        let first = r.create(&desired, &cancel).unwrap();
        let err = r.create(&desired, &cancel).unwrap_err();

        assert_already_exists(&err);
        assert!(err.message.contains("'error-rate'"), "{}", err.message);
        assert_eq!(err.identity, Some(first.identity));
        assert_eq!(
            fake.count(Method::Post, "/_opendistro/_alerting/monitors"),
            1,
            "{dialect}"
        );
    }
}

#[test]
fn stale_monitor_id_is_checked_before_create() {
    let fake = FakeCluster::shared(Dialect::V7);
    let r = Reconciler::new(&fake.handle(), ResourceKind::AlertingMonitor);
    let cancel = CancelToken::new();
    let body = sample_body(ResourceKind::AlertingMonitor);

    let first = r.create(&Desired::new(body.clone()), &cancel).unwrap();

    // The host still holds the id of a live monitor: refuse.
    let live = Desired {
        identity: Some(first.identity.clone()),
        body: body.clone(),
    };
    assert_already_exists(&r.create(&live, &cancel).unwrap_err());

    // The id is stale but the name is still taken: refuse.
    let stale = Desired {
        identity: Some(ResourceIdentity::named("m-gone")),
        body: body.clone(),
    };
    assert_already_exists(&r.create(&stale, &cancel).unwrap_err());

    // Stale id, free name: create proceeds and a new id is assigned.
    let mut renamed = body;
    renamed["name"] = json!("error-rate-v2");
    let fresh = Desired {
        identity: Some(ResourceIdentity::named("m-gone")),
        body: renamed,
    };
    let second = r.create(&fresh, &cancel).unwrap();
    assert_ne!(second.identity, first.identity);
}

#[test]
fn reserved_characters_do_not_reach_a_neighbour() {
    let fake = FakeCluster::shared(Dialect::V7);
    let r = Reconciler::new(&fake.handle(), ResourceKind::SecurityRole);
    let cancel = CancelToken::new();
    let ops = json!({"cluster": ["all"]});
    r.create(&Desired::named(ResourceIdentity::named("ops"), ops.clone()), &cancel)
        .unwrap();

    for name in ["ops#team", "ops?x=1"] {
        let id = ResourceIdentity::named(name);
        r.create(&Desired::named(id.clone(), json!({"cluster": ["monitor"]})), &cancel)
            .unwrap();
        let read = r.read(&id, &cancel).unwrap();
        assert_eq!(read.body["cluster"], json!(["monitor"]), "{name}");
    }

    let untouched = r.read(&ResourceIdentity::named("ops"), &cancel).unwrap();
    assert!(r.diff(&ops, &untouched.body).is_equivalent());
    assert_eq!(fake.count(Method::Put, "/_security/role/ops%23team"), 1);
    assert_eq!(fake.count(Method::Put, "/_security/role/ops%3Fx%3D1"), 1);
}

#[test]
fn wildcard_name_is_refused_without_a_call() {
    let fake = FakeCluster::shared(Dialect::V7);
    let r = Reconciler::new(&fake.handle(), ResourceKind::IngestPipeline);
    let desired = Desired::named(
        ResourceIdentity::named("logs-*"),
        sample_body(ResourceKind::IngestPipeline),
    );

    let err = r.create(&desired, &CancelToken::new()).unwrap_err();

    assert_eq!(err.kind, ErrorKind::Fatal);
    assert_eq!(fake.call_count(), 0);
}
