use serde_json::Value;
use srk_cluster::{CancelToken, ClusterHandle, ClusterRequest, Method};
use srk_schemas::{Dialect, ResourceIdentity, ResourceKind, WireContext};

use crate::api::{segment, Envelope, ResourceApi};
use crate::classify::{send, ApiError};
use crate::routes::Routes;

/// Documents addressed as `/{index}/{type}/{id}` (saved dashboard objects).
///
/// The index defaults to the dialect's saved-object index. The mapping type
/// is fixed per dialect, except V5 where it comes from the identity.
#[derive(Debug)]
pub struct DocumentApi {
    handle: ClusterHandle,
    kind: ResourceKind,
    routes: &'static Routes,
}

impl DocumentApi {
    pub fn new(handle: ClusterHandle, kind: ResourceKind, routes: &'static Routes) -> Self {
        Self {
            handle,
            kind,
            routes,
        }
    }

    fn path(&self, id: &ResourceIdentity) -> Result<String, ApiError> {
        let id = self.canonical_identity(id)?;
        let index = id.index.as_deref().unwrap_or(self.routes.saved_object_index);
        let doc_type = match (self.routes.saved_object_type, id.doc_type.as_deref()) {
            (Some(t), _) => t,
            (None, Some(t)) => t,
            (None, None) => return Err(missing_type(&id)),
        };
        Ok(format!(
            "/{}/{}/{}",
            segment(index)?,
            segment(doc_type)?,
            segment(&id.id)?
        ))
    }
}

fn missing_type(id: &ResourceIdentity) -> ApiError {
    ApiError::fatal(
        format!("identity '{id}' needs the form index/type/id on this dialect"),
        WireContext::default(),
    )
}

impl ResourceApi for DocumentApi {
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
        false
    }

    fn canonical_identity(&self, target: &ResourceIdentity) -> Result<ResourceIdentity, ApiError> {
        let index = target
            .index
            .clone()
            .unwrap_or_else(|| self.routes.saved_object_index.to_string());
        match self.routes.saved_object_type {
            Some(_) => Ok(ResourceIdentity::in_index(index, target.id.clone())),
            None => match &target.doc_type {
                Some(t) => Ok(ResourceIdentity::typed(index, t.clone(), target.id.clone())),
                None => Err(missing_type(target)),
            },
        }
    }

    fn create(
        &self,
        target: Option<&ResourceIdentity>,
        body: &Value,
        cancel: &CancelToken,
    ) -> Result<ResourceIdentity, ApiError> {
        let Some(target) = target else {
            return Err(ApiError::fatal(
                format!("{} is caller-named; create needs an id", self.kind),
                WireContext::default(),
            ));
        };
        let id = self.canonical_identity(target)?;
        send(
            &self.handle,
            ClusterRequest::new(Method::Put, self.path(&id)?).with_body(body.clone()),
            cancel,
        )?;
        Ok(id)
    }

    fn read(&self, id: &ResourceIdentity, cancel: &CancelToken) -> Result<Value, ApiError> {
        let req = ClusterRequest::new(Method::Get, self.path(id)?);
        let wire = WireContext::request(req.method.as_str(), req.path.clone());
        let resp = send(&self.handle, req, cancel)?;
        Envelope::Source.open(resp, &id.id, &wire)
    }

    fn update(
        &self,
        id: &ResourceIdentity,
        body: &Value,
        cancel: &CancelToken,
    ) -> Result<(), ApiError> {
        send(
            &self.handle,
            ClusterRequest::new(Method::Put, self.path(id)?).with_body(body.clone()),
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
    use crate::routes::{V5_ROUTES, V6_ROUTES, V7_ROUTES};
    use srk_cluster::{RawResponse, Transport, TransportError};
    use std::sync::Arc;

    struct Nowhere;

    impl Transport for Nowhere {
        fn perform(
            &self,
            _req: &ClusterRequest,
            _cancel: &CancelToken,
        ) -> Result<RawResponse, TransportError> {
            Ok(RawResponse::new(200, "{}"))
        }
    }

    fn api(routes: &'static Routes) -> DocumentApi {
        DocumentApi::new(
            ClusterHandle::new(routes.dialect, Arc::new(Nowhere)),
            ResourceKind::SavedObject,
            routes,
        )
    }

    #[test]
    fn paths_per_dialect() {
        let typed = ResourceIdentity::typed(".kibana", "dashboard", "d1");
        assert_eq!(api(&V5_ROUTES).path(&typed).unwrap(), "/.kibana/dashboard/d1");

        let bare = ResourceIdentity::named("dashboard:d1");
        assert_eq!(api(&V6_ROUTES).path(&bare).unwrap(), "/.kibana/doc/dashboard:d1");
        assert_eq!(api(&V7_ROUTES).path(&bare).unwrap(), "/.kibana/_doc/dashboard:d1");
    }

    #[test]
    fn every_component_is_escaped() {
        let id = ResourceIdentity::typed(".kibana", "index-pattern", "logs#1");
        assert_eq!(
            api(&V5_ROUTES).path(&id).unwrap(),
            "/.kibana/index-pattern/logs%231"
        );
    }

    #[test]
    fn v5_without_type_is_fatal_before_any_call() {
        let err = api(&V5_ROUTES)
            .canonical_identity(&ResourceIdentity::named("d1"))
            .unwrap_err();
        assert!(err.message.contains("index/type/id"));
    }

    #[test]
    fn canonical_identity_fills_default_index() {
        let id = api(&V7_ROUTES)
            .canonical_identity(&ResourceIdentity::named("visualization:v1"))
            .unwrap();
        assert_eq!(id, ResourceIdentity::in_index(".kibana", "visualization:v1"));
    }
}
