//! Version assembly: fetch every dated revision of a resolved act with its full content.

use std::collections::HashSet;

use chrono::NaiveDate;
use qazlaw_client::{DocumentRequest, Transport};
use qazlaw_core::{ActVersion, AssembledAct, ChangeCause, Document, Language};
use tracing::debug;

use crate::{IngestError, ResolvedAct};

/// Build the version list of `resolved`, one language after the other.
///
/// Versions keep their history-listing order within a language. A date listed
/// twice for the same language is fetched once; the first listing wins.
pub async fn assemble(
    transport: &dyn Transport,
    resolved: ResolvedAct,
) -> Result<AssembledAct, IngestError> {
    let code = resolved.act.code.clone();
    let mut seen = HashSet::new();
    let mut versions = Vec::new();

    for doc in &resolved.documents {
        let listing = transport.get_document_versions(&doc.id, doc.language).await?;
        debug!(code = %code, language = %doc.language, listed = listing.len(), "version history");
        for info in listing {
            if !seen.insert((doc.language, info.version_date)) {
                debug!(code = %code, date = %info.version_date, "duplicate version date skipped");
                continue;
            }
            let document =
                fetch_version(transport, &code, &doc.id, doc.language, info.version_date).await?;
            versions.push(build_version(&code, info.version_date, document, info.cause)?);
        }
    }

    Ok(AssembledAct {
        act: resolved.act,
        versions,
    })
}

/// Fetch a dated document and append the content of pages 2..N in order.
async fn fetch_version(
    transport: &dyn Transport,
    code: &str,
    id: &str,
    language: Language,
    date: NaiveDate,
) -> Result<Document, IngestError> {
    let request = DocumentRequest::at(id, language, date);
    let Some(mut document) = transport.get_document(&request).await? else {
        return Err(IngestError::MissingVersion {
            code: code.to_string(),
            language,
            date,
        });
    };

    let mut content = document.take_content();
    for page in 2..=document.pages_count {
        let mut next = transport
            .get_document(&request.clone().with_page(page))
            .await?
            .ok_or_else(|| IngestError::MissingPage {
                code: code.to_string(),
                language,
                date,
                page,
            })?;
        content.append(next.take_content(), page)?;
    }
    if document.pages_count > 1 {
        debug!(code, %language, %date, pages = document.pages_count, "multi-page version");
    }
    document.content = Some(content);
    Ok(document)
}

fn build_version(
    code: &str,
    date: NaiveDate,
    mut document: Document,
    listed_cause: Option<ChangeCause>,
) -> Result<ActVersion, IngestError> {
    let cause = document.version.cause.take().or(listed_cause);
    let cause_act_code = match cause {
        Some(cause) if cause.code == code => {
            debug!(code, %date, "version cites its own act as cause; ignored");
            None
        }
        Some(cause) if !cause.code.is_empty() => Some(cause.code),
        _ => None,
    };

    let content = document.take_content().to_json()?;
    Ok(ActVersion {
        date,
        language: document.language,
        is_actual: document.actual_version,
        version_id: document.version.id,
        content,
        cause_act_code,
    })
}
