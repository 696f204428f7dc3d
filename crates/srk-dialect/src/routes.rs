use srk_schemas::Dialect;

/// Path prefixes and well-known internal index names for one dialect.
///
/// Immutable; one static value per dialect, handed out by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routes {
    pub dialect: Dialect,
    /// Security API root (roles, users, role mappings).
    pub security: &'static str,
    /// Watcher API root.
    pub watcher: &'static str,
    /// Alerting plugin root (monitors, destinations).
    pub alerting: &'static str,
    /// Internal index backing alerting monitors and destinations.
    pub alerting_config_index: &'static str,
    /// Default index for saved dashboard objects.
    pub saved_object_index: &'static str,
    /// Mapping type for saved objects. `None`: taken from the identity.
    pub saved_object_type: Option<&'static str>,
    /// Index-template field holding the index pattern(s).
    pub template_pattern_field: &'static str,
}

pub const V5_ROUTES: Routes = Routes {
    dialect: Dialect::V5,
    security: "/_xpack/security",
    watcher: "/_xpack/watcher",
    alerting: "/_opendistro/_alerting",
    alerting_config_index: ".opendistro-alerting-config",
    saved_object_index: ".kibana",
    saved_object_type: None,
    template_pattern_field: "template",
};

pub const V6_ROUTES: Routes = Routes {
    dialect: Dialect::V6,
    security: "/_xpack/security",
    watcher: "/_xpack/watcher",
    alerting: "/_opendistro/_alerting",
    alerting_config_index: ".opendistro-alerting-config",
    saved_object_index: ".kibana",
    saved_object_type: Some("doc"),
    template_pattern_field: "index_patterns",
};

pub const V7_ROUTES: Routes = Routes {
    dialect: Dialect::V7,
    security: "/_security",
    watcher: "/_watcher",
    alerting: "/_opendistro/_alerting",
    alerting_config_index: ".opendistro-alerting-config",
    saved_object_index: ".kibana",
    saved_object_type: Some("_doc"),
    template_pattern_field: "index_patterns",
};

impl Routes {
    pub fn for_dialect(dialect: Dialect) -> &'static Routes {
        match dialect {
            Dialect::V5 => &V5_ROUTES,
            Dialect::V6 => &V6_ROUTES,
            Dialect::V7 => &V7_ROUTES,
        }
    }
}
