use std::collections::HashMap;

use qazlaw_core::ActTypeCode;
use qazlaw_store::{ActTypeRow, StoreError, StoreSession};

use crate::IngestError;

/// Act type code to persisted id, loaded once per worker.
#[derive(Debug, Clone, Default)]
pub struct ActTypeRegistry {
    ids: HashMap<ActTypeCode, i64>,
}

impl ActTypeRegistry {
    pub fn load(session: &StoreSession) -> Result<Self, StoreError> {
        Ok(Self::from_rows(session.list_act_types()?))
    }

    pub fn from_rows(rows: impl IntoIterator<Item = ActTypeRow>) -> Self {
        Self {
            ids: rows.into_iter().map(|row| (row.code, row.id)).collect(),
        }
    }

    pub fn lookup(&self, code: ActTypeCode) -> Result<i64, IngestError> {
        self.ids
            .get(&code)
            .copied()
            .ok_or(IngestError::UnknownActType(code))
    }

    pub fn ids_for(&self, codes: &[ActTypeCode]) -> Result<Vec<i64>, IngestError> {
        codes.iter().map(|&code| self.lookup(code)).collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_and_unknown_codes() {
        let registry = ActTypeRegistry::from_rows([
            ActTypeRow {
                id: 1,
                code: ActTypeCode::Zak,
            },
            ActTypeRow {
                id: 7,
                code: ActTypeCode::Ukaz,
            },
        ]);
        assert_eq!(registry.lookup(ActTypeCode::Ukaz).unwrap(), 7);
        assert_eq!(
            registry.ids_for(&[ActTypeCode::Zak, ActTypeCode::Ukaz]).unwrap(),
            vec![1, 7]
        );
        assert!(matches!(
            registry.lookup(ActTypeCode::Post),
            Err(IngestError::UnknownActType(ActTypeCode::Post))
        ));
    }

    #[test]
    fn loads_from_a_seeded_store() {
        let store = qazlaw_store::DuckStore::open().unwrap();
        store.init_schema(false).unwrap();
        store.seed_act_types(ActTypeCode::ALL).unwrap();

        let registry = ActTypeRegistry::load(&store.session().unwrap()).unwrap();
        assert_eq!(registry.len(), ActTypeCode::ALL.len());
        assert!(registry.lookup(ActTypeCode::Kod).is_ok());
    }
}
