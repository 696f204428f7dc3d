use srk_cluster::{ClusterHandle, Method};
use srk_schemas::{Dialect, ResourceKind};
use tracing::{debug, warn};

use crate::api::{Envelope, ResourceApi};
use crate::classify::ApiError;
use crate::collection::{CollectionApi, SearchLocatedApi, SearchLocator};
use crate::document::DocumentApi;
use crate::named::NamedApi;
use crate::routes::Routes;

/// Whether `kind` has an implementation on `dialect`. Pure.
pub fn supports(dialect: Dialect, kind: ResourceKind) -> bool {
    !matches!(
        (dialect, kind),
        (
            Dialect::V5,
            ResourceKind::LifecyclePolicy
                | ResourceKind::AlertingMonitor
                | ResourceKind::AlertingDestination
        )
    )
}

/// Read the handle's dialect tag once and return the implementation of
/// `kind` for it. Unsupported pairs fail here, before any network call.
pub fn select(handle: &ClusterHandle, kind: ResourceKind) -> Result<Box<dyn ResourceApi>, ApiError> {
    let dialect = handle.dialect();
    if !supports(dialect, kind) {
        warn!(%kind, %dialect, "kind not available on this dialect");
        return Err(ApiError::unsupported(format!(
            "{kind} is not available on dialect {dialect}"
        )));
    }

    let routes = Routes::for_dialect(dialect);
    let h = handle.clone();

    let api: Box<dyn ResourceApi> = match kind {
        ResourceKind::Index => Box::new(
            NamedApi::new(h, kind, routes, "")
                .create_with(Method::Post, "")
                .update_suffix("/_settings")
                .native_dedup(),
        ),
        ResourceKind::IndexTemplate => Box::new(
            NamedApi::new(h, kind, routes, "/_template")
                .create_with(Method::Put, "?create=true")
                .native_dedup(),
        ),
        ResourceKind::LifecyclePolicy => Box::new(NamedApi::new(h, kind, routes, "/_ilm/policy")),
        ResourceKind::IngestPipeline => {
            Box::new(NamedApi::new(h, kind, routes, "/_ingest/pipeline"))
        }
        ResourceKind::SnapshotRepository => Box::new(NamedApi::new(h, kind, routes, "/_snapshot")),
        ResourceKind::SecurityRole => Box::new(NamedApi::new(
            h,
            kind,
            routes,
            format!("{}/role", routes.security),
        )),
        ResourceKind::SecurityRoleMapping => Box::new(NamedApi::new(
            h,
            kind,
            routes,
            format!("{}/role_mapping", routes.security),
        )),
        ResourceKind::SecurityUser => Box::new(NamedApi::new(
            h,
            kind,
            routes,
            format!("{}/user", routes.security),
        )),
        ResourceKind::SavedObject => Box::new(DocumentApi::new(h, kind, routes)),
        ResourceKind::AlertingWatch => Box::new(
            NamedApi::new(h, kind, routes, format!("{}/watch", routes.watcher))
                .envelope(Envelope::Field("watch")),
        ),
        ResourceKind::AlertingMonitor => Box::new(
            CollectionApi::new(
                h,
                kind,
                routes,
                format!("{}/monitors", routes.alerting),
                "monitor",
            )
            .with_locator(SearchLocator {
                index: routes.alerting_config_index,
                field: "monitor",
                name_term: "monitor.name.keyword",
            }),
        ),
        ResourceKind::AlertingDestination => {
            let writes = CollectionApi::new(
                h,
                kind,
                routes,
                format!("{}/destinations", routes.alerting),
                "destination",
            );
            let locator = SearchLocator {
                index: routes.alerting_config_index,
                field: "destination",
                name_term: "destination.name.keyword",
            };
            // No per-id destination GET before V7.
            if dialect == Dialect::V6 {
                Box::new(SearchLocatedApi::new(writes, locator))
            } else {
                Box::new(writes.with_locator(locator))
            }
        }
    };

    debug!(%kind, %dialect, "dialect implementation selected");
    Ok(api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use srk_cluster::{CancelToken, ClusterRequest, RawResponse, Transport, TransportError};
    use srk_schemas::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl Transport for Counting {
        fn perform(
            &self,
            _req: &ClusterRequest,
            _cancel: &CancelToken,
        ) -> Result<RawResponse, TransportError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(RawResponse::new(200, "{}"))
        }
    }

    #[test]
    fn v5_lacks_three_kinds() {
        let missing: Vec<ResourceKind> = ResourceKind::ALL
            .into_iter()
            .filter(|k| !supports(Dialect::V5, *k))
            .collect();
        assert_eq!(
            missing,
            vec![
                ResourceKind::LifecyclePolicy,
                ResourceKind::AlertingDestination,
                ResourceKind::AlertingMonitor,
            ]
        );
        for k in ResourceKind::ALL {
            assert!(supports(Dialect::V6, k));
            assert!(supports(Dialect::V7, k));
        }
    }

    #[test]
    fn unsupported_selection_makes_no_call() {
        let t = Arc::new(Counting::default());
        let handle = ClusterHandle::v5(t.clone());

        let err = select(&handle, ResourceKind::LifecyclePolicy).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Unsupported);
        assert_eq!(t.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn every_supported_pair_selects_without_io() {
        let t = Arc::new(Counting::default());
        for d in Dialect::ALL {
            let handle = ClusterHandle::new(d, t.clone());
            for k in ResourceKind::ALL.into_iter().filter(|k| supports(d, *k)) {
                let api = select(&handle, k).unwrap();
                assert_eq!(api.kind(), k);
                assert_eq!(api.dialect(), d);
            }
        }
        assert_eq!(t.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn server_assigned_kinds_locate_by_name_on_both_dialects() {
        let t: Arc<dyn Transport> = Arc::new(Counting::default());
        for d in [Dialect::V6, Dialect::V7] {
            for k in [ResourceKind::AlertingDestination, ResourceKind::AlertingMonitor] {
                let api = select(&ClusterHandle::new(d, t.clone()), k).unwrap();
                assert!(api.can_locate_by_name(), "{d}/{k}");
            }
        }
    }

    #[test]
    fn only_index_and_template_dedup_natively() {
        let t: Arc<dyn Transport> = Arc::new(Counting::default());
        let handle = ClusterHandle::v7(t);
        for k in ResourceKind::ALL {
            let api = select(&handle, k).unwrap();
            let expected = matches!(k, ResourceKind::Index | ResourceKind::IndexTemplate);
            assert_eq!(api.native_create_dedup(), expected, "{k}");
        }
    }
}
