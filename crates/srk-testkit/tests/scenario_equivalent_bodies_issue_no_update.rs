//! Scenario: diff suppression keeps converge from writing.
//!
//! # Invariants under test
//!
//! 1. A template created with `number_of_shards: 1` and desired again with
//!    `"1"` plans InSync; converge reports Unchanged and issues no PUT.
//! 2. A real divergence plans Update naming the path, and converge issues
//!    exactly one write.
//! 3. Index updates patch only the changed dynamic setting; a static
//!    setting change is refused before any write.
//! 4. A template desired in the legacy single-`template` form is in sync
//!    with the list form the cluster returns.
//! 5. Converge on an absent named object costs one read and one write.
//!
//! GREEN when: the fake cluster records no write for equivalent bodies.

use serde_json::json;
use srk_cluster::{CancelToken, Method};
use srk_reconcile::{ConvergeAction, Desired, Plan, Reconciler};
use srk_schemas::{Dialect, ErrorKind, ResourceIdentity, ResourceKind};
use srk_testkit::FakeCluster;

#[test]
fn numeric_and_string_shard_counts_are_in_sync() {
    for dialect in Dialect::ALL {
        let fake = FakeCluster::shared(dialect);
        let r = Reconciler::new(&fake.handle(), ResourceKind::IndexTemplate);
        let cancel = CancelToken::new();
        let id = ResourceIdentity::named("logs");

        let created = json!({"index_patterns": ["logs-*"], "settings": {"number_of_shards": 1}});
        r.create(&Desired::named(id.clone(), created), &cancel).unwrap();
        fake.clear_calls();

        let desired = json!({"index_patterns": ["logs-*"], "settings": {"number_of_shards": "1"}});
        assert_eq!(r.plan(Some(&id), &desired, &cancel).unwrap(), Plan::InSync);

        let converged = r.converge(&Desired::named(id, desired), &cancel).unwrap();
        assert_eq!(converged.action, ConvergeAction::Unchanged, "{dialect}");
        assert_eq!(fake.count(Method::Put, "/"), 0, "{dialect}");
        assert_eq!(fake.count(Method::Post, "/"), 0, "{dialect}");
    }
}

#[test]
fn divergence_plans_update_and_converges_with_one_write() {
    let fake = FakeCluster::shared(Dialect::V7);
    let r = Reconciler::new(&fake.handle(), ResourceKind::IngestPipeline);
    let cancel = CancelToken::new();
    let id = ResourceIdentity::named("p1");

    r.create(
        &Desired::named(id.clone(), json!({"description": "old", "processors": []})),
        &cancel,
    )
    .unwrap();
    fake.clear_calls();

    let desired = json!({"description": "new", "processors": []});
    let Plan::Update(diffs) = r.plan(Some(&id), &desired, &cancel).unwrap() else {
        panic!("expected an update plan");
    };
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].path, "description");
    assert_eq!(diffs[0].remote.as_deref(), Some("old"));
    assert_eq!(diffs[0].desired.as_deref(), Some("new"));

    let converged = r.converge(&Desired::named(id.clone(), desired.clone()), &cancel).unwrap();
    assert_eq!(converged.action, ConvergeAction::Updated);
    assert_eq!(fake.count(Method::Put, "/_ingest/pipeline/p1"), 1);

    assert_eq!(r.plan(Some(&id), &desired, &cancel).unwrap(), Plan::InSync);
}

#[test]
fn converge_creates_when_absent() {
    let fake = FakeCluster::shared(Dialect::V6);
    let r = Reconciler::new(&fake.handle(), ResourceKind::SecurityRole);
    let desired = Desired::named(
        ResourceIdentity::named("reader"),
        json!({"cluster": ["monitor"], "indices": []}),
    );

    let converged = r.converge(&desired, &CancelToken::new()).unwrap();

    assert_eq!(converged.action, ConvergeAction::Created);
    assert_eq!(fake.count(Method::Put, "/_xpack/security/role/reader"), 1);
    assert_eq!(fake.count(Method::Get, "/"), 1);
    assert_eq!(fake.call_count(), 2);
}

#[test]
fn legacy_template_field_converges_once() {
    for dialect in [Dialect::V6, Dialect::V7] {
        let fake = FakeCluster::shared(dialect);
        let r = Reconciler::new(&fake.handle(), ResourceKind::IndexTemplate);
        let cancel = CancelToken::new();
        let id = ResourceIdentity::named("legacy");
        let desired = Desired::named(
            id.clone(),
            json!({"template": "logs-*", "settings": {"number_of_shards": 1}}),
        );

        let first = r.converge(&desired, &cancel).unwrap();
        assert_eq!(first.action, ConvergeAction::Created, "{dialect}");
        fake.clear_calls();

        assert_eq!(r.plan(Some(&id), &desired.body, &cancel).unwrap(), Plan::InSync, "{dialect}");
        for _ in 0..2 {
            let again = r.converge(&desired, &cancel).unwrap();
            assert_eq!(again.action, ConvergeAction::Unchanged, "{dialect}");
        }
        assert_eq!(fake.count(Method::Put, "/"), 0, "{dialect}");
    }
}

#[test]
fn index_update_patches_only_changed_dynamic_settings() {
    let fake = FakeCluster::shared(Dialect::V7);
    let r = Reconciler::new(&fake.handle(), ResourceKind::Index);
    let cancel = CancelToken::new();
    let id = ResourceIdentity::named("events");

    r.create(
        &Desired::named(
            id.clone(),
            json!({"settings": {"number_of_shards": 3, "refresh_interval": "1s"}}),
        ),
        &cancel,
    )
    .unwrap();
    fake.clear_calls();

    let desired = json!({"settings": {"number_of_shards": 3, "refresh_interval": "30s"}});
    let converged = r.converge(&Desired::named(id.clone(), desired), &cancel).unwrap();
    assert_eq!(converged.action, ConvergeAction::Updated);

    let writes: Vec<_> = fake
        .calls()
        .into_iter()
        .filter(|c| c.method == Method::Put)
        .collect();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].path, "/events/_settings");
    assert_eq!(
        writes[0].body,
        Some(json!({"index.refresh_interval": "30s"}))
    );

    fake.clear_calls();
    let resize = json!({"settings": {"number_of_shards": 6, "refresh_interval": "30s"}});
    let err = r.update(&id, &resize, &cancel).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Fatal);
    assert!(err.message.contains("index.number_of_shards"), "{}", err.message);
    assert_eq!(fake.count(Method::Put, "/"), 0);
}

#[test]
fn v5_template_update_is_translated() {
    let fake = FakeCluster::shared(Dialect::V5);
    let r = Reconciler::new(&fake.handle(), ResourceKind::IndexTemplate);
    let cancel = CancelToken::new();
    let id = ResourceIdentity::named("logs");

    r.create(
        &Desired::named(id.clone(), json!({"index_patterns": ["logs-*"]})),
        &cancel,
    )
    .unwrap();
    r.update(&id, &json!({"index_patterns": ["logs-*"], "order": 2}), &cancel)
        .unwrap();

    let stored = fake.template("logs").unwrap();
    assert_eq!(stored["template"], json!("logs-*"));
    assert_eq!(stored["order"], json!(2));
    assert!(stored.get("index_patterns").is_none());
}
