//! Clipboard payload model

mod data;
mod record;

pub use data::PasteData;
pub use record::{
    MimeType, PasteRecord, RecordContent, Want, MIMETYPE_TEXT_HTML, MIMETYPE_TEXT_PLAIN,
    MIMETYPE_TEXT_URI, MIMETYPE_TEXT_WANT,
};
