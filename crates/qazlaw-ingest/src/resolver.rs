//! Bilingual act resolution: fetch both language editions and reconcile them
//! into one canonical [`Act`].

use std::fmt::Display;

use chrono::NaiveDate;
use qazlaw_client::{DocumentRequest, Transport};
use qazlaw_core::{Act, Document, Language};
use tracing::{debug, warn};

use crate::IngestError;

/// A reconciled act and the documents it was built from (Russian first).
#[derive(Debug, Clone)]
pub struct ResolvedAct {
    pub act: Act,
    pub documents: Vec<Document>,
}

/// Fetch the current Russian and Kazakh documents of `id` and reconcile them.
///
/// Returns `None` when neither language edition exists.
pub async fn resolve(
    transport: &dyn Transport,
    id: &str,
) -> Result<Option<ResolvedAct>, IngestError> {
    let rus_request = DocumentRequest::latest(id, Language::Rus);
    let kaz_request = DocumentRequest::latest(id, Language::Kaz);
    let (rus, kaz) = tokio::try_join!(
        transport.get_document(&rus_request),
        transport.get_document(&kaz_request),
    )?;
    if rus.is_none() {
        debug!(code = id, "no russian edition");
    }
    if kaz.is_none() {
        debug!(code = id, "no kazakh edition");
    }
    reconcile(rus, kaz)
}

/// Merge the two language editions of one act.
///
/// Identity fields must match exactly. Act types are merged as a sorted
/// union. Registry number, judiciary number, action and effective dates must
/// agree when both editions carry them and are taken from the Kazakh edition
/// when only it does. Title, requisites and all other fields come from the
/// Russian edition.
pub fn reconcile(
    rus: Option<Document>,
    kaz: Option<Document>,
) -> Result<Option<ResolvedAct>, IngestError> {
    let documents = match (rus, kaz) {
        (None, None) => return Ok(None),
        (Some(doc), None) | (None, Some(doc)) => vec![doc],
        (Some(mut rus), Some(mut kaz)) => {
            merge(&mut rus, &mut kaz)?;
            vec![rus, kaz]
        }
    };
    let act = build_act(&documents);
    Ok(Some(ResolvedAct { act, documents }))
}

fn merge(rus: &mut Document, kaz: &mut Document) -> Result<(), IngestError> {
    let code = rus.code.clone();
    require_equal(&code, "id", &rus.id, &kaz.id)?;
    require_equal(&code, "ngr", &rus.ngr, &kaz.ngr)?;
    require_equal(
        &code,
        "initial_publication_date",
        &DisplayDate(rus.initial_publication_date),
        &DisplayDate(kaz.initial_publication_date),
    )?;

    if rus.metadata.act_types != kaz.metadata.act_types {
        warn!(
            code = %code,
            rus = ?rus.metadata.act_types,
            kaz = ?kaz.metadata.act_types,
            "act types diverge; merging"
        );
        let mut types = rus.metadata.act_types.clone();
        types.extend(kaz.metadata.act_types.iter().copied());
        types.sort();
        types.dedup();
        rus.metadata.act_types = types.clone();
        kaz.metadata.act_types = types;
    }

    let (rm, km) = (&mut rus.metadata, &kaz.metadata);
    merge_text(&code, "registry_number", &mut rm.registry_number, &km.registry_number)?;
    merge_text(
        &code,
        "judiciary_doc_number",
        &mut rm.judiciary_doc_number,
        &km.judiciary_doc_number,
    )?;
    merge_date(&code, "action_date", &mut rm.action_date, km.action_date)?;
    merge_date(&code, "effective_date", &mut rm.effective_date, km.effective_date)?;
    Ok(())
}

fn require_equal<T: PartialEq + Display>(
    code: &str,
    field: &'static str,
    rus: &T,
    kaz: &T,
) -> Result<(), IngestError> {
    if rus != kaz {
        return Err(IngestError::Conflict {
            code: code.to_string(),
            field,
            rus: rus.to_string(),
            kaz: kaz.to_string(),
        });
    }
    Ok(())
}

fn merge_text(
    code: &str,
    field: &'static str,
    rus: &mut String,
    kaz: &str,
) -> Result<(), IngestError> {
    match (rus.is_empty(), kaz.is_empty()) {
        (false, false) => require_equal(code, field, &rus.as_str(), &kaz),
        (true, false) => {
            *rus = kaz.to_string();
            Ok(())
        }
        _ => Ok(()),
    }
}

fn merge_date(
    code: &str,
    field: &'static str,
    rus: &mut Option<NaiveDate>,
    kaz: Option<NaiveDate>,
) -> Result<(), IngestError> {
    match (*rus, kaz) {
        (Some(r), Some(k)) => require_equal(code, field, &r, &k),
        (None, Some(k)) => {
            *rus = Some(k);
            Ok(())
        }
        _ => Ok(()),
    }
}

#[derive(PartialEq)]
struct DisplayDate(Option<NaiveDate>);

impl Display for DisplayDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(date) => write!(f, "{date}"),
            None => f.write_str("none"),
        }
    }
}

fn build_act(documents: &[Document]) -> Act {
    let primary = &documents[0];
    let doc_number = |language: Language| {
        documents
            .iter()
            .find(|doc| doc.language == language)
            .map(|doc| doc.metadata.state_agency_doc_number.clone())
            .unwrap_or_default()
    };
    let meta = &primary.metadata;
    let mut types = meta.act_types.clone();
    types.sort();
    types.dedup();

    Act {
        code: primary.code.clone(),
        sa_doc_number_ru: doc_number(Language::Rus),
        sa_doc_number_kz: doc_number(Language::Kaz),
        ju_doc_number: meta.judiciary_doc_number.clone(),
        ngr: primary.ngr.clone(),
        status: meta.status,
        registry_number: meta.registry_number.clone(),
        sa_approval_date: meta.state_agency_approval_date,
        ju_approval_date: meta.judiciary_approval_date,
        action_date: meta.action_date,
        effective_date: meta.effective_date,
        initial_pub_date: primary.initial_publication_date,
        title: meta.title.rus.clone(),
        requisite: meta.requisites.rus.clone(),
        types,
    }
}
