//! Paste data: the full clipboard payload of one session

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::{MimeType, PasteRecord, Want};

/// Ordered sequence of records.
///
/// Insertion order is significant: the last record is treated as the most
/// specific one when a single textual rendering is needed. Once handed to the
/// store a `PasteData` is only ever replaced whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteData {
    records: Vec<PasteRecord>,
}

impl PasteData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<PasteRecord>) -> Self {
        Self { records }
    }

    pub fn html(html: impl Into<String>) -> Self {
        Self::from_records(vec![PasteRecord::new_html(html)])
    }

    pub fn plain_text(text: impl Into<String>) -> Self {
        Self::from_records(vec![PasteRecord::new_plain_text(text)])
    }

    pub fn uri(uri: impl Into<String>) -> Self {
        Self::from_records(vec![PasteRecord::new_uri(uri)])
    }

    pub fn want(want: Want) -> Self {
        Self::from_records(vec![PasteRecord::new_want(want)])
    }

    pub fn add_record(&mut self, record: PasteRecord) {
        self.records.push(record);
    }

    pub fn add_html_record(&mut self, html: impl Into<String>) {
        self.add_record(PasteRecord::new_html(html));
    }

    pub fn add_text_record(&mut self, text: impl Into<String>) {
        self.add_record(PasteRecord::new_plain_text(text));
    }

    pub fn add_uri_record(&mut self, uri: impl Into<String>) {
        self.add_record(PasteRecord::new_uri(uri));
    }

    pub fn add_want_record(&mut self, want: Want) {
        self.add_record(PasteRecord::new_want(want));
    }

    pub fn records(&self) -> &[PasteRecord] {
        &self.records
    }

    pub fn record_at(&self, index: usize) -> Option<&PasteRecord> {
        self.records.get(index)
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct MIME types in first-seen order
    pub fn mime_types(&self) -> Vec<MimeType> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(record.mime_type()) {
                seen.push(record.mime_type().clone());
            }
        }
        seen
    }

    /// Number of records per MIME type
    pub fn mime_type_counts(&self) -> BTreeMap<MimeType, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.mime_type().clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Textual projection of the last record
    pub fn primary_text(&self) -> Option<String> {
        self.records.last().map(PasteRecord::convert_to_text)
    }

    /// Estimated payload size in bytes, 0 for empty data
    pub fn data_size(&self) -> usize {
        self.primary_text().map_or(0, |text| text.len())
    }
}
