pub mod act;
pub mod document;
pub mod enums;

pub use act::{Act, ActVersion, AssembledAct};
pub use document::{
    ActMetadata, BilingualText, ChangeCause, Document, DocumentContent, DocumentError,
    DocumentVersion, SearchActMetadata, SearchPage, VersionInfo,
};
pub use enums::{ActStatus, ActTypeCode, Language, UnknownCode};
