use serde_json::Value;
use srk_cluster::{CancelToken, ClusterHandle, ClusterRequest, Method};
use srk_schemas::{Dialect, ResourceIdentity, ResourceKind, WireContext};

use crate::api::{segment, Envelope, ResourceApi};
use crate::classify::{send, ApiError};
use crate::routes::Routes;

/// Kinds addressed as `{base}/{name}` with a caller-chosen name.
#[derive(Debug)]
pub struct NamedApi {
    handle: ClusterHandle,
    kind: ResourceKind,
    routes: &'static Routes,
    base: String,
    create_method: Method,
    create_query: &'static str,
    update_suffix: &'static str,
    native_dedup: bool,
    envelope: Envelope,
}

impl NamedApi {
    /// PUT create, PUT update, keyed read envelope, no create dedup.
    pub fn new(
        handle: ClusterHandle,
        kind: ResourceKind,
        routes: &'static Routes,
        base: impl Into<String>,
    ) -> Self {
        Self {
            handle,
            kind,
            routes,
            base: base.into(),
            create_method: Method::Put,
            create_query: "",
            update_suffix: "",
            native_dedup: false,
            envelope: Envelope::Keyed,
        }
    }

    pub fn create_with(mut self, method: Method, query: &'static str) -> Self {
        self.create_method = method;
        self.create_query = query;
        self
    }

    pub fn update_suffix(mut self, suffix: &'static str) -> Self {
        self.update_suffix = suffix;
        self
    }

    /// The create call fails on its own when the name is taken.
    pub fn native_dedup(mut self) -> Self {
        self.native_dedup = true;
        self
    }

    pub fn envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    fn path(&self, id: &ResourceIdentity) -> Result<String, ApiError> {
        Ok(format!("{}/{}", self.base, segment(&id.id)?))
    }
}

impl ResourceApi for NamedApi {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn dialect(&self) -> Dialect {
        self.routes.dialect
    }

    fn routes(&self) -> &'static Routes {
        self.routes
    }

    fn native_create_dedup(&self) -> bool {
        self.native_dedup
    }

    fn create(
        &self,
        target: Option<&ResourceIdentity>,
        body: &Value,
        cancel: &CancelToken,
    ) -> Result<ResourceIdentity, ApiError> {
        let Some(id) = target else {
            return Err(ApiError::fatal(
                format!("{} is caller-named; create needs a name", self.kind),
                WireContext::default(),
            ));
        };
        let path = format!("{}{}", self.path(id)?, self.create_query);
        send(
            &self.handle,
            ClusterRequest::new(self.create_method, path).with_body(body.clone()),
            cancel,
        )?;
        Ok(id.clone())
    }

    fn read(&self, id: &ResourceIdentity, cancel: &CancelToken) -> Result<Value, ApiError> {
        let req = ClusterRequest::new(Method::Get, self.path(id)?);
        let wire = WireContext::request(req.method.as_str(), req.path.clone());
        let resp = send(&self.handle, req, cancel)?;
        self.envelope.open(resp, &id.id, &wire)
    }

    fn update(
        &self,
        id: &ResourceIdentity,
        body: &Value,
        cancel: &CancelToken,
    ) -> Result<(), ApiError> {
        let path = format!("{}{}", self.path(id)?, self.update_suffix);
        send(
            &self.handle,
            ClusterRequest::new(Method::Put, path).with_body(body.clone()),
            cancel,
        )?;
        Ok(())
    }

    fn delete(&self, id: &ResourceIdentity, cancel: &CancelToken) -> Result<(), ApiError> {
        send(
            &self.handle,
            ClusterRequest::new(Method::Delete, self.path(id)?),
            cancel,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::V7_ROUTES;
    use serde_json::json;
    use srk_cluster::{RawResponse, Transport, TransportError};
    use srk_schemas::ErrorKind;
    use std::sync::{Arc, Mutex};

    /// Answers each request with the next scripted response.
    struct Scripted {
        replies: Mutex<Vec<RawResponse>>,
        seen: Mutex<Vec<ClusterRequest>>,
    }

    impl Scripted {
        fn new(replies: Vec<RawResponse>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl Transport for Scripted {
        fn perform(
            &self,
            req: &ClusterRequest,
            _cancel: &CancelToken,
        ) -> Result<RawResponse, TransportError> {
            self.seen.lock().unwrap().push(req.clone());
            Ok(self
                .replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| RawResponse::new(500, "no script")))
        }
    }

    fn template_api(t: Arc<Scripted>) -> NamedApi {
        NamedApi::new(
            ClusterHandle::v7(t),
            ResourceKind::IndexTemplate,
            &V7_ROUTES,
            "/_template",
        )
        .create_with(Method::Put, "?create=true")
        .native_dedup()
    }

    #[test]
    fn create_uses_configured_method_and_query() {
        let t = Scripted::new(vec![RawResponse::new(200, r#"{"acknowledged":true}"#)]);
        let api = template_api(t.clone());

        let id = api
            .create(
                Some(&ResourceIdentity::named("t1")),
                &json!({"index_patterns": ["a-*"]}),
                &CancelToken::new(),
            )
            .unwrap();

        assert_eq!(id, ResourceIdentity::named("t1"));
        let seen = t.seen.lock().unwrap();
        assert_eq!(seen[0].method, Method::Put);
        assert_eq!(seen[0].path, "/_template/t1?create=true");
    }

    #[test]
    fn read_unwraps_keyed_envelope() {
        let t = Scripted::new(vec![RawResponse::new(
            200,
            r#"{"t1":{"order":0,"index_patterns":["a-*"]}}"#,
        )]);
        let body = template_api(t)
            .read(&ResourceIdentity::named("t1"), &CancelToken::new())
            .unwrap();
        assert_eq!(body["index_patterns"], json!(["a-*"]));
    }

    #[test]
    fn delete_of_absent_is_not_found() {
        let t = Scripted::new(vec![RawResponse::new(404, r#"{"error":"missing"}"#)]);
        let err = template_api(t)
            .delete(&ResourceIdentity::named("t1"), &CancelToken::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.wire.method.as_deref(), Some("DELETE"));
    }

    #[test]
    fn update_appends_suffix() {
        let t = Scripted::new(vec![RawResponse::new(200, "{}")]);
        let api = NamedApi::new(ClusterHandle::v7(t.clone()), ResourceKind::Index, &V7_ROUTES, "")
            .create_with(Method::Post, "")
            .update_suffix("/_settings");

        api.update(
            &ResourceIdentity::named("logs"),
            &json!({"index": {"number_of_replicas": 2}}),
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(t.seen.lock().unwrap()[0].path, "/logs/_settings");
    }

    #[test]
    fn reserved_characters_stay_inside_the_name() {
        let t = Scripted::new(vec![
            RawResponse::new(200, r#"{"ops#team":{"order":0}}"#),
            RawResponse::new(200, "{}"),
        ]);
        let api = template_api(t.clone());

        let body = api
            .read(&ResourceIdentity::named("ops#team"), &CancelToken::new())
            .unwrap();
        assert_eq!(body, json!({"order": 0}));
        api.delete(&ResourceIdentity::named("ops?x=1"), &CancelToken::new())
            .unwrap();

        let seen = t.seen.lock().unwrap();
        assert_eq!(seen[0].path, "/_template/ops%23team");
        assert_eq!(seen[1].path, "/_template/ops%3Fx%3D1");
    }

    #[test]
    fn wildcard_name_is_refused_without_a_call() {
        let t = Scripted::new(vec![]);
        let err = template_api(t.clone())
            .delete(&ResourceIdentity::named("logs-*"), &CancelToken::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Fatal);
        assert!(t.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn create_without_name_makes_no_call() {
        let t = Scripted::new(vec![]);
        let err = template_api(t.clone())
            .create(None, &json!({}), &CancelToken::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Fatal);
        assert!(t.seen.lock().unwrap().is_empty());
    }
}
