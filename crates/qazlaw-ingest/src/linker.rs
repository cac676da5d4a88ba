//! Second pass that upgrades version cause codes into act ids.

use std::collections::VecDeque;

use qazlaw_store::{DuckStore, StoreError};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Version rows whose cause now points at an act id.
    pub linked_versions: usize,
    pub resolved_codes: usize,
    /// Cause codes whose act is not in the corpus yet. Their versions keep the code.
    pub unresolved_codes: Vec<String>,
}

/// Resolve every pending cause code whose act has been ingested.
///
/// Safe to rerun: only versions without a cause id are touched.
pub fn link_causes(store: &DuckStore) -> Result<LinkReport, StoreError> {
    let mut worklist: VecDeque<String> = store.unresolved_cause_codes()?.into();
    let mut report = LinkReport::default();
    info!(pending = worklist.len(), "linking cause acts");

    while let Some(code) = worklist.pop_front() {
        match store.find_act_id(&code)? {
            Some(act_id) => {
                report.linked_versions += store.resolve_cause(&code, act_id)?;
                report.resolved_codes += 1;
            }
            None => {
                debug!(code = %code, "cause act not ingested");
                report.unresolved_codes.push(code);
            }
        }
    }

    info!(
        linked_versions = report.linked_versions,
        resolved = report.resolved_codes,
        unresolved = report.unresolved_codes.len(),
        "cause linking finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use qazlaw_core::Language;

    use super::*;
    use crate::fixtures::{FakeTransport, date, document, with_cause};
    use crate::{Coordinator, IngestConfig};

    #[tokio::test]
    async fn links_ingested_causes_and_keeps_the_rest() {
        let store = DuckStore::open().unwrap();
        store.init_schema(false).unwrap();

        let mut transport = FakeTransport::new();
        transport.bilingual_act("Z9");
        transport.catalog("K1");
        for language in Language::ALL {
            transport.latest(document("K1", language, date(2024, 1, 1)));
        }
        transport.version(with_cause(document("K1", Language::Rus, date(2020, 1, 1)), "Z9"));
        transport.version(with_cause(document("K1", Language::Kaz, date(2020, 1, 1)), "Z9"));
        transport.version(with_cause(document("K1", Language::Rus, date(2021, 1, 1)), "Z404"));

        let config = IngestConfig {
            page_delay: Duration::ZERO,
            ..IngestConfig::default()
        };
        Coordinator::new(Arc::new(transport), config)
            .run(&store)
            .await
            .unwrap();

        let report = link_causes(&store).unwrap();
        assert_eq!(report.linked_versions, 2);
        assert_eq!(report.resolved_codes, 1);
        assert_eq!(report.unresolved_codes, vec!["Z404"]);

        let cause_id = store.find_act_id("Z9").unwrap();
        let k1 = store.find_act_id("K1").unwrap().unwrap();
        let versions = store.versions_for_act(k1).unwrap();
        let linked: Vec<_> = versions.iter().filter(|v| v.cause_act_id.is_some()).collect();
        assert_eq!(linked.len(), 2);
        assert!(linked.iter().all(|v| v.cause_act_id == cause_id));

        let rerun = link_causes(&store).unwrap();
        assert_eq!(rerun.linked_versions, 0);
        assert_eq!(rerun.unresolved_codes, vec!["Z404"]);
    }
}
