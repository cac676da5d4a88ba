//! Closed vocabularies used by zan.gov.kz: languages, act statuses, act types.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string that is not a member of one of the closed vocabularies below.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} code: {value:?}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub value: String,
}

/// Document language. The API publishes every act in Russian, Kazakh, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rus,
    Kaz,
}

impl Language {
    /// Both languages, Russian first (Russian is the canonical language).
    pub const ALL: [Language; 2] = [Language::Rus, Language::Kaz];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rus => "rus",
            Language::Kaz => "kaz",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rus" => Ok(Language::Rus),
            "kaz" => Ok(Language::Kaz),
            other => Err(UnknownCode {
                kind: "language",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle status of an act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActStatus {
    /// In force.
    #[serde(rename = "exe")]
    Active,
    #[serde(rename = "new")]
    New,
    /// Lost legal force.
    #[serde(rename = "yts")]
    Repealed,
    #[serde(rename = "temporaryRevoked")]
    TemporarilyRevoked,
    #[serde(rename = "upd")]
    Updated,
    #[serde(rename = "bak")]
    Archived,
    #[serde(rename = "vexp")]
    Expired,
    #[serde(rename = "stop")]
    Stopped,
}

impl ActStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ActStatus::Active => "exe",
            ActStatus::New => "new",
            ActStatus::Repealed => "yts",
            ActStatus::TemporarilyRevoked => "temporaryRevoked",
            ActStatus::Updated => "upd",
            ActStatus::Archived => "bak",
            ActStatus::Expired => "vexp",
            ActStatus::Stopped => "stop",
        }
    }
}

impl fmt::Display for ActStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActStatus {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exe" => Ok(ActStatus::Active),
            "new" => Ok(ActStatus::New),
            "yts" => Ok(ActStatus::Repealed),
            "temporaryRevoked" => Ok(ActStatus::TemporarilyRevoked),
            "upd" => Ok(ActStatus::Updated),
            "bak" => Ok(ActStatus::Archived),
            "vexp" => Ok(ActStatus::Expired),
            "stop" => Ok(ActStatus::Stopped),
            other => Err(UnknownCode {
                kind: "act status",
                value: other.to_string(),
            }),
        }
    }
}

macro_rules! act_type_codes {
    ($($(#[$doc:meta])* $variant:ident => $code:literal,)+) => {
        /// Act classification code, as used by the registry (Cyrillic abbreviations).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ActTypeCode {
            $($(#[$doc])* #[serde(rename = $code)] $variant,)+
        }

        impl ActTypeCode {
            /// Every known code, in declaration order. Seeded into `act_type` at start-up.
            pub const ALL: &'static [ActTypeCode] = &[$(ActTypeCode::$variant,)+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(ActTypeCode::$variant => $code,)+
                }
            }
        }

        impl FromStr for ActTypeCode {
            type Err = UnknownCode;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok(ActTypeCode::$variant),)+
                    other => Err(UnknownCode {
                        kind: "act type",
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

act_type_codes! {
    Dop => "ДОП",
    /// Law.
    Zak => "ЗАК",
    Izm => "ИЗМ",
    /// Constitutional law.
    Kzak => "КЗАК",
    /// Constitution.
    Kons => "КОНС",
    Por => "ПОР",
    /// Resolution (government or agency).
    Post => "ПОСТ",
    Prav => "ПРАВ",
    /// Order.
    Prik => "ПРИК",
    /// Decision.
    Resh => "РЕШ",
    Sogl => "СОГЛ",
    /// Presidential decree.
    Ukaz => "УКАЗ",
    /// Normative resolution.
    Npos => "НПОС",
    /// Code.
    Kod => "КОД",
    Mrp => "МРП",
    Pol => "ПОЛ",
    Prch => "ПРЧ",
    Inst => "ИНСТ",
    Dog => "ДОГ",
    Raz => "РАЗ",
    Met => "МЕТ",
    Ust => "УСТ",
    /// Decree having the force of law.
    Uzak => "УЗАК",
    Ukzn => "УКЗН",
    /// Decree having the force of constitutional law.
    Ukon => "УКОН",
    Norm => "НОРМ",
    Regl => "РЕГЛ",
    Prot => "ПРОТ",
    /// Disposition.
    Rasp => "РАСП",
    Konv => "КОНВ",
    Treb => "ТРЕБ",
    Pism => "ПИСМ",
    Stnd => "СТНД",
    Plan => "ПЛАН",
    Obra => "ОБРА",
    Prog => "ПРОГ",
    Memr => "МЕМР",
    Klas => "КЛАС",
    Nom => "НОМ",
    Shem => "СХЕМ",
    Proe => "ПРОЕ",
    Opis => "ОПИС",
    Dekl => "ДЕКЛ",
    Pres => "ПРЕС",
    Konts => "КОНЦ",
    Usl => "УСЛ",
    Krit => "КРИТ",
    Stra => "СТРА",
    Kont => "КОНТ",
    Supr => "СУПР",
    Opol => "ОПОЛ",
    Popr => "ПОПР",
    Zayav => "ЗАЯВ",
    Hart => "ХАРТ",
}

impl ActTypeCode {
    /// Normative act types walked by a default ingestion run.
    pub const INGESTED: &'static [ActTypeCode] = &[
        ActTypeCode::Kons,
        ActTypeCode::Kzak,
        ActTypeCode::Kod,
        ActTypeCode::Zak,
        ActTypeCode::Uzak,
        ActTypeCode::Ukaz,
        ActTypeCode::Ukon,
        ActTypeCode::Npos,
        ActTypeCode::Post,
        ActTypeCode::Prik,
        ActTypeCode::Rasp,
        ActTypeCode::Resh,
    ];
}

impl fmt::Display for ActTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Ordered by the code string so merged type sets sort the way the registry lists them.
impl Ord for ActTypeCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for ActTypeCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn act_type_codes_roundtrip_through_str() {
        for code in ActTypeCode::ALL {
            assert_eq!(code.as_str().parse::<ActTypeCode>().unwrap(), *code);
        }
        assert_eq!(ActTypeCode::ALL.len(), 54);
    }

    #[test]
    fn act_type_serde_uses_cyrillic_code() {
        let json = serde_json::to_string(&ActTypeCode::Ukaz).unwrap();
        assert_eq!(json, "\"УКАЗ\"");
        let parsed: ActTypeCode = serde_json::from_str("\"ПОСТ\"").unwrap();
        assert_eq!(parsed, ActTypeCode::Post);
    }

    #[test]
    fn act_types_order_by_code_string() {
        let mut types = vec![ActTypeCode::Ukaz, ActTypeCode::Zak, ActTypeCode::Kod];
        types.sort();
        assert_eq!(types, vec![ActTypeCode::Zak, ActTypeCode::Kod, ActTypeCode::Ukaz]);
    }

    #[test]
    fn unknown_act_type_is_rejected() {
        let err = "XYZ".parse::<ActTypeCode>().unwrap_err();
        assert_eq!(err.kind, "act type");
        assert!(serde_json::from_str::<ActTypeCode>("\"XYZ\"").is_err());
    }

    #[test]
    fn status_wire_values() {
        let parsed: ActStatus = serde_json::from_str("\"temporaryRevoked\"").unwrap();
        assert_eq!(parsed, ActStatus::TemporarilyRevoked);
        assert_eq!("yts".parse::<ActStatus>().unwrap(), ActStatus::Repealed);
        assert_eq!(ActStatus::Archived.to_string(), "bak");
    }

    #[test]
    fn language_wire_values() {
        let parsed: Language = serde_json::from_str("\"kaz\"").unwrap();
        assert_eq!(parsed, Language::Kaz);
        assert_eq!(Language::Rus.as_str(), "rus");
        assert!("eng".parse::<Language>().is_err());
    }
}
