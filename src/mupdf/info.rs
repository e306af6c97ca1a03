//! Document information dictionary

use mupdf::{Document, MetadataName};
use serde::Serialize;

/// PDF info dictionary fields
#[derive(Debug, Clone, Default, Serialize)]
pub struct PdfInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<String>,
}

/// Read the info dictionary; missing or unreadable entries become `None`
pub fn read_info(doc: &Document) -> PdfInfo {
    let get = |name: MetadataName| -> Option<String> {
        doc.metadata(name)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    PdfInfo {
        title: get(MetadataName::Title),
        author: get(MetadataName::Author),
        subject: get(MetadataName::Subject),
        keywords: get(MetadataName::Keywords),
        creator: get(MetadataName::Creator),
        producer: get(MetadataName::Producer),
        creation_date: get(MetadataName::CreationDate),
        modification_date: get(MetadataName::ModDate),
    }
}
