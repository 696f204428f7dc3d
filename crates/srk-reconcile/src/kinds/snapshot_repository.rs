use srk_normalize::NormalizeProfile;
use srk_schemas::{Dialect, ResourceKind};

use super::KindProfile;

#[derive(Debug)]
pub struct SnapshotRepositoryProfile;

impl KindProfile for SnapshotRepositoryProfile {
    fn kind(&self) -> ResourceKind {
        ResourceKind::SnapshotRepository
    }

    // Repository settings come back as strings; scalar coercion covers that.
    fn normalize_profile(&self, _dialect: Dialect) -> NormalizeProfile {
        NormalizeProfile::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use srk_normalize::compare;

    #[test]
    fn stringified_settings_are_equivalent() {
        let desired = json!({"type": "fs", "settings": {"location": "/backups", "compress": true, "chunk_size": 64}});
        let remote = json!({"type": "fs", "settings": {"location": "/backups", "compress": "true", "chunk_size": "64"}});
        let p = SnapshotRepositoryProfile.normalize_profile(Dialect::V5);
        assert!(compare(&desired, &remote, &p).is_equivalent());
    }
}
