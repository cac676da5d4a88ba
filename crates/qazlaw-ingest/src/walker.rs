//! Lazy, restartable walk over the document catalog.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use qazlaw_client::{ApiError, SearchQuery, Transport};
use qazlaw_core::{ActTypeCode, SearchActMetadata};
use tracing::info;

use crate::IngestConfig;

/// One act summary together with the catalog page it was listed on.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub page: u32,
    pub summary: SearchActMetadata,
}

/// Pulls catalog pages on demand, one page ahead of the consumer at most.
///
/// The page count reported by each response bounds the walk, so the walk
/// ends after page `page_count` even when the catalog grows meanwhile.
pub struct CatalogWalker {
    transport: Arc<dyn Transport>,
    page_size: u32,
    act_types: Vec<ActTypeCode>,
    delay: Duration,
    next_page: u32,
    page_count: Option<u32>,
    buffer: VecDeque<SearchActMetadata>,
    buffered_page: u32,
    last_page: Option<u32>,
    failed: bool,
}

impl CatalogWalker {
    pub fn new(
        transport: Arc<dyn Transport>,
        start_page: u32,
        page_size: u32,
        act_types: Vec<ActTypeCode>,
    ) -> Self {
        Self {
            transport,
            page_size,
            act_types,
            delay: Duration::ZERO,
            next_page: start_page.max(1),
            page_count: None,
            buffer: VecDeque::new(),
            buffered_page: 0,
            last_page: None,
            failed: false,
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &IngestConfig) -> Self {
        Self::new(
            transport,
            config.start_page,
            config.page_size,
            config.act_types.clone(),
        )
        .with_delay(config.page_delay)
    }

    /// Pause after every page fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Page of the most recently yielded entry.
    pub fn last_page(&self) -> Option<u32> {
        self.last_page
    }

    fn exhausted(&self) -> bool {
        self.failed || self.page_count.is_some_and(|count| self.next_page > count)
    }

    /// Next catalog entry, or `None` once the last page has been consumed.
    ///
    /// A failed page fetch is returned once and ends the walk.
    pub async fn next(&mut self) -> Result<Option<CatalogEntry>, ApiError> {
        loop {
            if let Some(summary) = self.buffer.pop_front() {
                self.last_page = Some(self.buffered_page);
                return Ok(Some(CatalogEntry {
                    page: self.buffered_page,
                    summary,
                }));
            }
            if self.exhausted() {
                return Ok(None);
            }

            let query = SearchQuery {
                page: self.next_page,
                page_size: self.page_size,
                act_types: self.act_types.clone(),
            };
            let page = match self.transport.search_documents(&query).await {
                Ok(page) => page,
                Err(err) => {
                    self.failed = true;
                    return Err(err);
                }
            };
            info!(
                page = query.page,
                page_count = page.page_count,
                found = page.documents_found,
                "catalog page"
            );
            self.page_count = Some(page.page_count);
            self.buffered_page = query.page;
            self.next_page += 1;
            self.buffer.extend(page.documents);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<CatalogEntry, ApiError>> {
        futures::stream::unfold(self, |mut walker| async move {
            match walker.next().await {
                Ok(Some(entry)) => Some((Ok(entry), walker)),
                Ok(None) => None,
                Err(err) => Some((Err(err), walker)),
            }
        })
    }
}
