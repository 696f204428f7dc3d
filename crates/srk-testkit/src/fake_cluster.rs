//! FakeCluster: an in-memory cluster that answers the REST surface the
//! reconcilers use, shaped per dialect the way a live cluster of that
//! generation answers.
//!
//! Rendering rules it reproduces:
//! - settings come back nested and string-valued, with server fields injected
//! - defaults the server fills in are present on read (`order`, `min_age`, `enabled`)
//! - routes a dialect lacks answer `400 no handler found`
//! - the alerting config index does not exist until the first monitor or destination

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};
use srk_cluster::{
    CancelToken, ClusterHandle, ClusterRequest, Method, RawResponse, Transport, TransportError,
};
use srk_schemas::Dialect;

use crate::render::{flatten_settings, nest, stringify};

const ALERTING_CONFIG_INDEX: &str = ".opendistro-alerting-config";

/// Index settings the settings endpoint refuses to change.
const STATIC_SETTINGS: &[&str] = &["index.number_of_shards", "index.codec"];

fn reply(status: u16, body: Value) -> RawResponse {
    RawResponse::new(status, body.to_string())
}

fn ok(body: Value) -> RawResponse {
    reply(200, body)
}

fn no_handler(method: Method, path: &str) -> RawResponse {
    reply(
        400,
        json!({
            "error": format!("no handler found for uri [{path}] and method [{method}]"),
            "status": 400
        }),
    )
}

fn error(status: u16, kind: &str, reason: impl Into<String>) -> RawResponse {
    reply(
        status,
        json!({
            "error": {"root_cause": [{"type": kind}], "type": kind, "reason": reason.into()},
            "status": status
        }),
    )
}

fn now_millis() -> String {
    Utc::now().timestamp_millis().to_string()
}

// ---------------------------------------------------------------------------
// Stored state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredIndex {
    settings: BTreeMap<String, Value>,
    mappings: Value,
    aliases: Value,
}

#[derive(Debug, Clone)]
struct Versioned {
    version: u64,
    body: Value,
}

#[derive(Debug, Default)]
struct State {
    indices: BTreeMap<String, StoredIndex>,
    templates: BTreeMap<String, Value>,
    policies: BTreeMap<String, Versioned>,
    pipelines: BTreeMap<String, Value>,
    repositories: BTreeMap<String, Value>,
    roles: BTreeMap<String, Value>,
    role_mappings: BTreeMap<String, Value>,
    users: BTreeMap<String, Value>,
    watches: BTreeMap<String, Versioned>,
    /// Keyed by `index/type/id`.
    documents: BTreeMap<String, Versioned>,
    monitors: BTreeMap<String, Versioned>,
    destinations: BTreeMap<String, Versioned>,

    next_id: u64,
    calls: Vec<ClusterRequest>,
    faults: VecDeque<Result<RawResponse, TransportError>>,
    duplicate_hits: bool,
}

impl State {
    fn assign(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:06}", self.next_id)
    }
}

// ---------------------------------------------------------------------------
// FakeCluster
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FakeCluster {
    dialect: Dialect,
    state: Mutex<State>,
}

impl FakeCluster {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            state: Mutex::new(State::default()),
        }
    }

    pub fn shared(dialect: Dialect) -> Arc<Self> {
        Arc::new(Self::new(dialect))
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// A handle tagged with this cluster's dialect, as `connect` would build.
    pub fn handle(self: &Arc<Self>) -> ClusterHandle {
        ClusterHandle::new(self.dialect, self.clone())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    // -----------------------------------------------------------------------
    // Inspection and fault injection
    // -----------------------------------------------------------------------

    /// Every request that reached the transport, in order.
    pub fn calls(&self) -> Vec<ClusterRequest> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Requests with `method` whose path starts with `path_prefix`.
    pub fn count(&self, method: Method, path_prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.method == method && c.path.starts_with(path_prefix))
            .count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// The next request gets this response instead of being routed.
    pub fn push_fault(&self, status: u16, body: Value) {
        self.lock().faults.push_back(Ok(reply(status, body)));
    }

    /// The next request fails at the transport layer.
    pub fn push_transport_fault(&self, err: TransportError) {
        self.lock().faults.push_back(Err(err));
    }

    /// Every search hit is returned twice, as a corrupted config index would.
    pub fn duplicate_search_hits(&self, on: bool) {
        self.lock().duplicate_hits = on;
    }

    /// Raw stored body of a template, for asserting a create left it untouched.
    pub fn template(&self, name: &str) -> Option<Value> {
        self.lock().templates.get(name).cloned()
    }

    pub fn policy(&self, name: &str) -> Option<Value> {
        self.lock().policies.get(name).map(|v| v.body.clone())
    }

    pub fn destination_count(&self) -> usize {
        self.lock().destinations.len()
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    fn security_prefix(&self) -> &'static [&'static str] {
        match self.dialect {
            Dialect::V5 | Dialect::V6 => &["_xpack", "security"],
            Dialect::V7 => &["_security"],
        }
    }

    fn watcher_prefix(&self) -> &'static [&'static str] {
        match self.dialect {
            Dialect::V5 | Dialect::V6 => &["_xpack", "watcher"],
            Dialect::V7 => &["_watcher"],
        }
    }

    fn route(&self, st: &mut State, req: &ClusterRequest) -> RawResponse {
        let (path, query) = req.path.split_once('?').unwrap_or((req.path.as_str(), ""));
        let decoded: Vec<String> = path
            .trim_start_matches('/')
            .split('/')
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect();
        let segs: Vec<&str> = decoded.iter().map(String::as_str).collect();
        let body = req.body.as_ref();
        let m = req.method;

        if let Some(rest) = segs.strip_prefix(self.security_prefix()) {
            return match rest {
                ["role", name] => self.role(st, m, name, body),
                ["role_mapping", name] => self.role_mapping(st, m, name, body),
                ["user", name] => self.user(st, m, name, body),
                _ => no_handler(m, path),
            };
        }
        if let Some(rest) = segs.strip_prefix(self.watcher_prefix()) {
            return match rest {
                ["watch", id] => self.watch(st, m, id, body),
                _ => no_handler(m, path),
            };
        }

        match segs.as_slice() {
            ["_template", name] => self.index_template(st, m, name, query, body),
            ["_ilm", "policy", name] if self.dialect != Dialect::V5 => {
                self.lifecycle_policy(st, m, name, body)
            }
            ["_ingest", "pipeline", name] => {
                keyed(&mut st.pipelines, m, name, body, "pipeline", |b| b.clone())
            }
            ["_snapshot", name] => keyed(&mut st.repositories, m, name, body, "repository", |b| {
                let mut b = b.clone();
                if let Some(settings) = b.get_mut("settings") {
                    *settings = stringify(settings);
                }
                b
            }),
            ["_opendistro", "_alerting", collection, rest @ ..] if self.dialect != Dialect::V5 => {
                self.alerting(st, m, collection, rest, body, path)
            }
            [index, "_search"] if m == Method::Post => self.search(st, index, body),
            [name, "_settings"] if !name.starts_with('_') && m == Method::Put => {
                self.index_settings(st, name, body)
            }
            [name] if !name.is_empty() && !name.starts_with('_') => self.index(st, m, name, body),
            [index, doc_type, id]
                if !index.starts_with('_') && (*doc_type == "_doc" || !doc_type.starts_with('_')) =>
            {
                self.document(st, m, index, doc_type, id, body)
            }
            _ => no_handler(m, path),
        }
    }

    // -----------------------------------------------------------------------
    // Indices
    // -----------------------------------------------------------------------

    fn index(&self, st: &mut State, m: Method, name: &str, body: Option<&Value>) -> RawResponse {
        match m {
            Method::Put | Method::Post => {
                if st.indices.contains_key(name) {
                    return error(
                        400,
                        "resource_already_exists_exception",
                        format!("index [{name}] already exists"),
                    );
                }
                let body = body.cloned().unwrap_or_else(|| json!({}));
                let mut settings = body
                    .get("settings")
                    .map(flatten_settings)
                    .unwrap_or_default();
                let shards = match self.dialect {
                    Dialect::V5 | Dialect::V6 => "5",
                    Dialect::V7 => "1",
                };
                let created = match self.dialect {
                    Dialect::V5 => "5061699",
                    Dialect::V6 => "6082399",
                    Dialect::V7 => "7100099",
                };
                settings
                    .entry("index.number_of_shards".into())
                    .or_insert_with(|| json!(shards));
                settings
                    .entry("index.number_of_replicas".into())
                    .or_insert_with(|| json!("1"));
                settings.insert("index.uuid".into(), json!(uuid::Uuid::new_v4().simple().to_string()));
                settings.insert("index.creation_date".into(), json!(now_millis()));
                settings.insert("index.provided_name".into(), json!(name));
                settings.insert("index.version.created".into(), json!(created));

                st.indices.insert(
                    name.to_string(),
                    StoredIndex {
                        settings,
                        mappings: body.get("mappings").cloned().unwrap_or_else(|| json!({})),
                        aliases: body.get("aliases").cloned().unwrap_or_else(|| json!({})),
                    },
                );
                ok(json!({"acknowledged": true, "shards_acknowledged": true, "index": name}))
            }
            Method::Get => match st.indices.get(name) {
                Some(ix) => ok(json!({ name: {
                    "aliases": ix.aliases,
                    "mappings": ix.mappings,
                    "settings": nest(&ix.settings),
                }})),
                None => index_missing(name),
            },
            Method::Delete => match st.indices.remove(name) {
                Some(_) => ok(json!({"acknowledged": true})),
                None => index_missing(name),
            },
            Method::Head => no_handler(m, name),
        }
    }

    fn index_settings(&self, st: &mut State, name: &str, body: Option<&Value>) -> RawResponse {
        let Some(ix) = st.indices.get_mut(name) else {
            return index_missing(name);
        };
        let body = body.cloned().unwrap_or_else(|| json!({}));
        let body = body.get("settings").cloned().unwrap_or(body);
        let patch = flatten_settings(&body);

        for (key, value) in &patch {
            if STATIC_SETTINGS.contains(&key.as_str()) && ix.settings.get(key) != Some(value) {
                return error(
                    400,
                    "illegal_argument_exception",
                    format!("Can't update non dynamic settings [[{key}]] for open indices [[{name}]]"),
                );
            }
        }
        ix.settings.extend(patch);
        ok(json!({"acknowledged": true}))
    }

    // -----------------------------------------------------------------------
    // Templates and lifecycle policies
    // -----------------------------------------------------------------------

    fn index_template(
        &self,
        st: &mut State,
        m: Method,
        name: &str,
        query: &str,
        body: Option<&Value>,
    ) -> RawResponse {
        match m {
            Method::Put | Method::Post => {
                let body = body.cloned().unwrap_or_else(|| json!({}));
                if query.split('&').any(|q| q == "create=true") && st.templates.contains_key(name) {
                    return error(
                        400,
                        "illegal_argument_exception",
                        format!("index_template [{name}] already exists"),
                    );
                }
                let (wanted, refused) = match self.dialect {
                    Dialect::V5 => ("template", "index_patterns"),
                    Dialect::V6 | Dialect::V7 => ("index_patterns", "template"),
                };
                if body.get(refused).is_some() || body.get(wanted).is_none() {
                    return error(
                        400,
                        "action_request_validation_exception",
                        format!("Validation Failed: 1: {wanted} is missing;"),
                    );
                }
                let mut stored = json!({
                    "order": body.get("order").cloned().unwrap_or(json!(0)),
                    wanted: body[wanted].clone(),
                    "settings": nest(&body.get("settings").map(flatten_settings).unwrap_or_default()),
                    "mappings": body.get("mappings").cloned().unwrap_or_else(|| json!({})),
                    "aliases": body.get("aliases").cloned().unwrap_or_else(|| json!({})),
                });
                if let Some(v) = body.get("version") {
                    stored["version"] = v.clone();
                }
                st.templates.insert(name.to_string(), stored);
                ok(json!({"acknowledged": true}))
            }
            Method::Get => match st.templates.get(name) {
                Some(t) => ok(json!({ name: t })),
                None => reply(404, json!({})),
            },
            Method::Delete => match st.templates.remove(name) {
                Some(_) => ok(json!({"acknowledged": true})),
                None => error(
                    404,
                    "index_template_missing_exception",
                    format!("index_template [{name}] missing"),
                ),
            },
            Method::Head => no_handler(m, name),
        }
    }

    fn lifecycle_policy(
        &self,
        st: &mut State,
        m: Method,
        name: &str,
        body: Option<&Value>,
    ) -> RawResponse {
        match m {
            Method::Put => {
                let Some(mut policy) = body.and_then(|b| b.get("policy")).cloned() else {
                    return error(400, "parse_exception", "request body is required");
                };
                if let Some(phases) = policy.get_mut("phases").and_then(Value::as_object_mut) {
                    for phase in phases.values_mut() {
                        if let Some(p) = phase.as_object_mut() {
                            p.entry("min_age").or_insert_with(|| json!("0ms"));
                        }
                    }
                }
                let version = st.policies.get(name).map_or(1, |v| v.version + 1);
                st.policies.insert(
                    name.to_string(),
                    Versioned {
                        version,
                        body: policy,
                    },
                );
                ok(json!({"acknowledged": true}))
            }
            Method::Get => match st.policies.get(name) {
                Some(v) => ok(json!({ name: {
                    "version": v.version,
                    "modified_date": Utc::now().to_rfc3339(),
                    "policy": v.body,
                }})),
                None => error(
                    404,
                    "resource_not_found_exception",
                    format!("Lifecycle policy not found: {name}"),
                ),
            },
            Method::Delete => match st.policies.remove(name) {
                Some(_) => ok(json!({"acknowledged": true})),
                None => error(
                    404,
                    "resource_not_found_exception",
                    format!("Lifecycle policy not found: {name}"),
                ),
            },
            _ => no_handler(m, name),
        }
    }

    // -----------------------------------------------------------------------
    // Security
    // -----------------------------------------------------------------------

    fn role(&self, st: &mut State, m: Method, name: &str, body: Option<&Value>) -> RawResponse {
        match m {
            Method::Put | Method::Post => {
                let created = !st.roles.contains_key(name);
                st.roles
                    .insert(name.to_string(), body.cloned().unwrap_or_else(|| json!({})));
                ok(json!({"role": {"created": created}}))
            }
            Method::Get => match st.roles.get(name) {
                Some(r) => {
                    let mut r = r.clone();
                    r["transient_metadata"] = json!({"enabled": true});
                    ok(json!({ name: r }))
                }
                None => reply(404, json!({})),
            },
            Method::Delete => security_delete(st.roles.remove(name).is_some()),
            Method::Head => no_handler(m, name),
        }
    }

    fn role_mapping(
        &self,
        st: &mut State,
        m: Method,
        name: &str,
        body: Option<&Value>,
    ) -> RawResponse {
        match m {
            Method::Put | Method::Post => {
                let body = body.cloned().unwrap_or_else(|| json!({}));
                if !body.get("rules").is_some_and(Value::is_object) {
                    return error(
                        400,
                        "parse_exception",
                        "failed to parse role-mapping: [rules] must be an object",
                    );
                }
                let created = !st.role_mappings.contains_key(name);
                st.role_mappings.insert(name.to_string(), body);
                ok(json!({"role_mapping": {"created": created}}))
            }
            Method::Get => match st.role_mappings.get(name) {
                Some(r) => {
                    let mut r = r.clone();
                    if r.get("enabled").is_none() {
                        r["enabled"] = json!(true);
                    }
                    if r.get("metadata").is_none() {
                        r["metadata"] = json!({});
                    }
                    ok(json!({ name: r }))
                }
                None => reply(404, json!({})),
            },
            Method::Delete => security_delete(st.role_mappings.remove(name).is_some()),
            Method::Head => no_handler(m, name),
        }
    }

    fn user(&self, st: &mut State, m: Method, name: &str, body: Option<&Value>) -> RawResponse {
        match m {
            Method::Put | Method::Post => {
                let mut body = body.cloned().unwrap_or_else(|| json!({}));
                let created = !st.users.contains_key(name);
                if created && body.get("password").is_none() {
                    return error(
                        400,
                        "action_request_validation_exception",
                        "Validation Failed: 1: password must be specified unless you are updating an existing user;",
                    );
                }
                if let Some(obj) = body.as_object_mut() {
                    obj.remove("password");
                }
                st.users.insert(name.to_string(), body);
                ok(json!({"created": created}))
            }
            Method::Get => match st.users.get(name) {
                Some(u) => ok(json!({ name: {
                    "username": name,
                    "roles": u.get("roles").cloned().unwrap_or_else(|| json!([])),
                    "full_name": u.get("full_name").cloned().unwrap_or(Value::Null),
                    "email": u.get("email").cloned().unwrap_or(Value::Null),
                    "metadata": u.get("metadata").cloned().unwrap_or_else(|| json!({})),
                    "enabled": u.get("enabled").cloned().unwrap_or(json!(true)),
                }})),
                None => reply(404, json!({})),
            },
            Method::Delete => security_delete(st.users.remove(name).is_some()),
            Method::Head => no_handler(m, name),
        }
    }

    // -----------------------------------------------------------------------
    // Watches and documents
    // -----------------------------------------------------------------------

    fn watch(&self, st: &mut State, m: Method, id: &str, body: Option<&Value>) -> RawResponse {
        match m {
            Method::Put | Method::Post => {
                let prior = st.watches.get(id).map(|v| v.version);
                let version = prior.map_or(1, |v| v + 1);
                st.watches.insert(
                    id.to_string(),
                    Versioned {
                        version,
                        body: body.cloned().unwrap_or_else(|| json!({})),
                    },
                );
                let code = if prior.is_some() { 200 } else { 201 };
                reply(
                    code,
                    json!({"_id": id, "_version": version, "created": prior.is_none()}),
                )
            }
            Method::Get => match st.watches.get(id) {
                Some(v) => ok(json!({
                    "found": true,
                    "_id": id,
                    "_version": v.version,
                    "status": {"state": {"active": true, "timestamp": Utc::now().to_rfc3339()}},
                    "watch": v.body,
                })),
                None => reply(404, json!({"found": false, "_id": id})),
            },
            Method::Delete => match st.watches.remove(id) {
                Some(v) => ok(json!({"found": true, "_id": id, "_version": v.version + 1})),
                None => reply(404, json!({"found": false, "_id": id})),
            },
            Method::Head => no_handler(m, id),
        }
    }

    fn document(
        &self,
        st: &mut State,
        m: Method,
        index: &str,
        doc_type: &str,
        id: &str,
        body: Option<&Value>,
    ) -> RawResponse {
        let expected = match self.dialect {
            Dialect::V5 => None,
            Dialect::V6 => Some("doc"),
            Dialect::V7 => Some("_doc"),
        };
        if expected.is_some_and(|t| t != doc_type) {
            return error(
                400,
                "illegal_argument_exception",
                format!("Rejecting mapping update to [{index}] as the final mapping would have more than 1 type"),
            );
        }
        let key = format!("{index}/{doc_type}/{id}");
        let head = json!({"_index": index, "_type": doc_type, "_id": id});

        match m {
            Method::Put | Method::Post => {
                let version = st.documents.get(&key).map_or(1, |v| v.version + 1);
                st.documents.insert(
                    key,
                    Versioned {
                        version,
                        body: body.cloned().unwrap_or_else(|| json!({})),
                    },
                );
                let result = if version == 1 { "created" } else { "updated" };
                let mut resp = head;
                resp["_version"] = json!(version);
                resp["result"] = json!(result);
                reply(if version == 1 { 201 } else { 200 }, resp)
            }
            Method::Get => {
                let mut resp = head;
                match st.documents.get(&key) {
                    Some(v) => {
                        let mut source = v.body.clone();
                        if source.is_object() {
                            source["updated_at"] = json!(Utc::now().to_rfc3339());
                        }
                        resp["_version"] = json!(v.version);
                        resp["found"] = json!(true);
                        resp["_source"] = source;
                        ok(resp)
                    }
                    None => {
                        resp["found"] = json!(false);
                        reply(404, resp)
                    }
                }
            }
            Method::Delete => {
                let mut resp = head;
                match st.documents.remove(&key) {
                    Some(_) => {
                        resp["result"] = json!("deleted");
                        ok(resp)
                    }
                    None => {
                        resp["result"] = json!("not_found");
                        reply(404, resp)
                    }
                }
            }
            Method::Head => no_handler(m, &key),
        }
    }

    // -----------------------------------------------------------------------
    // Alerting
    // -----------------------------------------------------------------------

    fn alerting(
        &self,
        st: &mut State,
        m: Method,
        collection: &str,
        rest: &[&str],
        body: Option<&Value>,
        path: &str,
    ) -> RawResponse {
        let (field, prefix) = match collection {
            "monitors" => ("monitor", "m"),
            "destinations" => ("destination", "d"),
            _ => return no_handler(m, path),
        };
        let now = Utc::now().timestamp_millis();

        match (m, rest) {
            (Method::Post, []) => {
                let id = st.assign(prefix);
                let stored = inject_alerting_fields(st, field, body, now);
                let resp = json!({"_id": id, "_version": 1, field: stored.clone()});
                store_alerting(st, field).insert(id, Versioned { version: 1, body: stored });
                reply(201, resp)
            }
            // V6 alerting has no single-destination GET.
            (Method::Get, [_]) if field == "destination" && self.dialect == Dialect::V6 => {
                reply(405, json!({"error": "Incorrect HTTP method for uri", "status": 405}))
            }
            (Method::Get, [id]) => match store_alerting(st, field).get(*id) {
                Some(v) => ok(json!({"_id": id, "_version": v.version, field: v.body})),
                None => alerting_missing(field, id),
            },
            (Method::Put, [id]) => {
                let Some(version) = store_alerting(st, field).get(*id).map(|v| v.version + 1) else {
                    return alerting_missing(field, id);
                };
                let stored = inject_alerting_fields(st, field, body, now);
                let resp = json!({"_id": id, "_version": version, field: stored.clone()});
                store_alerting(st, field).insert(id.to_string(), Versioned { version, body: stored });
                ok(resp)
            }
            (Method::Delete, [id]) => match store_alerting(st, field).remove(*id) {
                Some(_) => ok(json!({"_id": id, "result": "deleted"})),
                None => alerting_missing(field, id),
            },
            _ => no_handler(m, path),
        }
    }

    fn search(&self, st: &mut State, index: &str, body: Option<&Value>) -> RawResponse {
        if index != ALERTING_CONFIG_INDEX || (st.monitors.is_empty() && st.destinations.is_empty()) {
            return error(
                404,
                "index_not_found_exception",
                format!("no such index [{index}]"),
            );
        }
        let filters: Vec<Value> = body
            .and_then(|b| b.pointer("/query/bool/filter"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let docs = st
            .monitors
            .iter()
            .map(|(id, v)| (id, json!({"monitor": v.body})))
            .chain(
                st.destinations
                    .iter()
                    .map(|(id, v)| (id, json!({"destination": v.body}))),
            );

        let mut hits = Vec::new();
        for (id, source) in docs {
            if filters.iter().all(|f| filter_matches(f, id, &source)) {
                let hit = json!({"_index": index, "_id": id, "_score": 0.0, "_source": source});
                if st.duplicate_hits {
                    hits.push(hit.clone());
                }
                hits.push(hit);
            }
        }

        let total = match self.dialect {
            Dialect::V7 => json!({"value": hits.len(), "relation": "eq"}),
            Dialect::V5 | Dialect::V6 => json!(hits.len()),
        };
        ok(json!({"took": 1, "timed_out": false, "hits": {"total": total, "hits": hits}}))
    }
}

impl Transport for FakeCluster {
    fn perform(
        &self,
        req: &ClusterRequest,
        cancel: &CancelToken,
    ) -> Result<RawResponse, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        let mut st = self.lock();
        st.calls.push(req.clone());
        if let Some(fault) = st.faults.pop_front() {
            return fault;
        }
        Ok(self.route(&mut st, req))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn index_missing(name: &str) -> RawResponse {
    error(
        404,
        "index_not_found_exception",
        format!("no such index [{name}]"),
    )
}

fn security_delete(found: bool) -> RawResponse {
    if found {
        ok(json!({"found": true}))
    } else {
        reply(404, json!({"found": false}))
    }
}

fn alerting_missing(field: &str, id: &str) -> RawResponse {
    error(
        404,
        "status_exception",
        format!("{field} {id} not found"),
    )
}

/// Snapshot repositories and pipelines: PUT stores, GET is keyed by name.
fn keyed(
    store: &mut BTreeMap<String, Value>,
    m: Method,
    name: &str,
    body: Option<&Value>,
    what: &str,
    render: impl Fn(&Value) -> Value,
) -> RawResponse {
    match m {
        Method::Put | Method::Post => {
            let body = body.cloned().unwrap_or_else(|| json!({}));
            store.insert(name.to_string(), render(&body));
            ok(json!({"acknowledged": true}))
        }
        Method::Get => match store.get(name) {
            Some(v) => ok(json!({ name: v })),
            None => error(
                404,
                &format!("{what}_missing_exception"),
                format!("[{name}] missing"),
            ),
        },
        Method::Delete => match store.remove(name) {
            Some(_) => ok(json!({"acknowledged": true})),
            None => error(
                404,
                &format!("{what}_missing_exception"),
                format!("[{name}] missing"),
            ),
        },
        Method::Head => no_handler(m, name),
    }
}

fn store_alerting<'a>(st: &'a mut State, field: &str) -> &'a mut BTreeMap<String, Versioned> {
    if field == "monitor" {
        &mut st.monitors
    } else {
        &mut st.destinations
    }
}

/// Server bookkeeping the alerting plugin adds to every stored object.
fn inject_alerting_fields(st: &mut State, field: &str, body: Option<&Value>, now: i64) -> Value {
    let mut stored = body.cloned().unwrap_or_else(|| json!({}));
    let Some(obj) = stored.as_object_mut() else {
        return stored;
    };
    obj.insert("schema_version".into(), json!(1));
    obj.insert("last_update_time".into(), json!(now));
    if field == "monitor" {
        obj.entry("type").or_insert_with(|| json!("monitor"));
        if obj.get("enabled") == Some(&Value::Bool(true)) {
            obj.insert("enabled_time".into(), json!(now));
        }
        if let Some(triggers) = obj.get_mut("triggers").and_then(Value::as_array_mut) {
            for trigger in triggers {
                let Some(t) = trigger.as_object_mut() else { continue };
                st.next_id += 1;
                t.insert("id".into(), json!(format!("t-{}", st.next_id)));
                if let Some(actions) = t.get_mut("actions").and_then(Value::as_array_mut) {
                    for action in actions.iter_mut().filter_map(Value::as_object_mut) {
                        st.next_id += 1;
                        action.insert("id".into(), json!(format!("a-{}", st.next_id)));
                    }
                }
            }
        }
    }
    stored
}

/// `term` and `exists` filters over a hit's `_id` and `_source`.
fn filter_matches(filter: &Value, id: &str, source: &Value) -> bool {
    if let Some(term) = filter.get("term").and_then(Value::as_object) {
        return term.iter().all(|(field, want)| {
            if field == "_id" {
                return want.as_str() == Some(id);
            }
            let field = field.strip_suffix(".keyword").unwrap_or(field);
            lookup(source, field).is_some_and(|have| scalar_eq(have, want))
        });
    }
    if let Some(field) = filter.pointer("/exists/field").and_then(Value::as_str) {
        return lookup(source, field).is_some_and(|v| !v.is_null());
    }
    false
}

fn lookup<'a>(source: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(source, |cur, part| cur.get(part))
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x == y,
        _ => stringify(a) == stringify(b),
    }
}
