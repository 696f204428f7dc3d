use srk_normalize::NormalizeProfile;
use srk_schemas::{Dialect, ResourceKind};

use super::KindProfile;

/// Processors run in sequence, so their order is part of the configuration.
#[derive(Debug)]
pub struct IngestPipelineProfile;

impl KindProfile for IngestPipelineProfile {
    fn kind(&self) -> ResourceKind {
        ResourceKind::IngestPipeline
    }

    fn normalize_profile(&self, _dialect: Dialect) -> NormalizeProfile {
        NormalizeProfile::new()
            .ordered("processors")
            .ordered("on_failure")
            .ordered("processors.*.*.on_failure")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use srk_normalize::compare;

    #[test]
    fn processor_order_matters() {
        let p = IngestPipelineProfile.normalize_profile(Dialect::V6);
        let a = json!({"processors": [{"set": {"field": "a", "value": 1}}, {"lowercase": {"field": "b"}}]});
        let b = json!({"processors": [{"lowercase": {"field": "b"}}, {"set": {"field": "a", "value": "1"}}]});
        assert!(!compare(&a, &b, &p).is_equivalent());

        let a2 = json!({"processors": [{"set": {"value": "1", "field": "a"}}, {"lowercase": {"field": "b"}}]});
        assert!(compare(&a, &a2, &p).is_equivalent());
    }
}
