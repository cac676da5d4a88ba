use std::time::Duration;

use qazlaw_core::ActTypeCode;

/// Codes never ingested: their Russian and Kazakh documents describe different acts.
pub const TROUBLED_CODES: &[&str] = &["2574"];

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Catalog page to start from (1-based). Resume a failed run from its last page.
    pub start_page: u32,
    pub page_size: u32,
    /// Number of acts processed at once.
    pub concurrency: usize,
    /// Pause after every catalog page.
    pub page_delay: Duration,
    /// Act types requested from the catalog. Empty walks everything.
    pub act_types: Vec<ActTypeCode>,
    pub excluded_codes: Vec<String>,
    /// Keep submitting acts after a transport failure.
    pub keep_going: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            start_page: 1,
            page_size: 20,
            concurrency: 2,
            page_delay: Duration::from_millis(100),
            act_types: ActTypeCode::INGESTED.to_vec(),
            excluded_codes: TROUBLED_CODES.iter().map(|code| code.to_string()).collect(),
            keep_going: false,
        }
    }
}

impl IngestConfig {
    pub fn is_excluded(&self, code: &str) -> bool {
        self.excluded_codes.iter().any(|excluded| excluded == code)
    }
}
