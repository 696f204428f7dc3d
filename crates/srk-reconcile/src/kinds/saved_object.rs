use srk_normalize::NormalizeProfile;
use srk_schemas::{Dialect, ResourceKind};

use super::KindProfile;

/// Attribute fields that dashboards store as serialized JSON strings.
const EMBEDDED: &[&str] = &[
    "*.visState",
    "*.uiStateJSON",
    "*.optionsJSON",
    "*.panelsJSON",
    "*.kibanaSavedObjectMeta.searchSourceJSON",
];

#[derive(Debug)]
pub struct SavedObjectProfile;

impl KindProfile for SavedObjectProfile {
    fn kind(&self) -> ResourceKind {
        ResourceKind::SavedObject
    }

    fn normalize_profile(&self, _dialect: Dialect) -> NormalizeProfile {
        let p = NormalizeProfile::new().strip_all(&[
            "updated_at",
            "migrationVersion",
            "coreMigrationVersion",
            "namespaces",
        ]);
        EMBEDDED.iter().fold(p, |p, path| p.embedded_json(path))
    }
}
