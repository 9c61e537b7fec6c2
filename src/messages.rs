//! Generation and conversion messages exchanged with the service.

use crate::hierarchy::HierarchyPath;
use crate::types::{ConfigurationId, RequestId, SubscriptionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output format of a generated or converted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    /// Plain text
    Txt,
    /// RTF; characters above 7 bits are escaped
    Rtf,
    /// Word 97 - 2007
    Doc,
    /// Office Open XML WordprocessingML (macro-free)
    Docx,
    Pdf,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 5] = [
        DocumentFormat::Txt,
        DocumentFormat::Rtf,
        DocumentFormat::Doc,
        DocumentFormat::Docx,
        DocumentFormat::Pdf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Txt => "Txt",
            DocumentFormat::Rtf => "Rtf",
            DocumentFormat::Doc => "Doc",
            DocumentFormat::Docx => "Docx",
            DocumentFormat::Pdf => "Pdf",
        }
    }

    /// File extension for downloads.
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Txt => "txt",
            DocumentFormat::Rtf => "rtf",
            DocumentFormat::Doc => "doc",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentFormat::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Invalid document format: {}. Must be txt, rtf, doc, docx, or pdf",
                    s
                )
            })
    }
}

/// PDF flavour of a converted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PdfFormat {
    PdfA1A,
    PdfA1B,
    PdfA2A,
    PdfA3A,
    PdfA2B,
    PdfA2U,
    PdfA3B,
    PdfA3U,
    V13,
    V14,
    V15,
    V16,
    V17,
    PdfUa1,
    PdfX1A,
    PdfX3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentGenerationState {
    /// Generation has been requested
    Requested,
    /// Document is ready for download
    Completed,
    Failed,
}

impl FromStr for DocumentGenerationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Requested" => Ok(DocumentGenerationState::Requested),
            "Completed" => Ok(DocumentGenerationState::Completed),
            "Failed" => Ok(DocumentGenerationState::Failed),
            other => Err(format!("Unknown document generation state: {}", other)),
        }
    }
}

/// Parameters of a generation request.
#[derive(Debug, Clone)]
pub struct DocumentGenerationRequestDetails {
    /// Directory to resolve templates from; ancestors are searched when the
    /// template is not found there
    pub hierarchy_path: HierarchyPath,
    pub template_id: String,
    /// ISO 639 language code (e.g. en, da)
    pub language: String,
    pub document_format: DocumentFormat,
    pub merge_data: serde_json::Value,
    /// Called by the service when generation completes
    pub callback_url: Option<String>,
    /// Run generation in diagnostic mode
    pub debug: bool,
}

/// Parameters of a conversion request.
#[derive(Debug, Clone)]
pub struct DocumentConversionRequestDetails {
    pub source_document_url: String,
    pub source_document_format: DocumentFormat,
    pub converted_document_format: DocumentFormat,
    pub converted_document_pdf_format: Option<PdfFormat>,
    pub callback_url: Option<String>,
    pub debug: bool,
}

impl DocumentConversionRequestDetails {
    /// Conversion to PDF/A-3u.
    pub fn to_pdf_a(source_document_url: impl Into<String>, source_document_format: DocumentFormat) -> Self {
        Self {
            source_document_url: source_document_url.into(),
            source_document_format,
            converted_document_format: DocumentFormat::Pdf,
            converted_document_pdf_format: Some(PdfFormat::PdfA3U),
            callback_url: None,
            debug: false,
        }
    }
}

/// State of one generation or conversion request.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentGenerationProgress {
    pub id: RequestId,
    pub subscription_id: SubscriptionId,
    pub configuration_id: Option<ConfigurationId>,
    pub template_id: Option<String>,
    pub language: Option<String>,
    pub document_format: Option<DocumentFormat>,
    pub hierarchy_path: HierarchyPath,
    pub state: DocumentGenerationState,
    pub callback_url: Option<String>,
    pub debug: Option<bool>,
    pub fail_reason: Option<String>,
}

/// Time-limited download link of a finished document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentGenerationUri {
    pub uri: String,
    pub uri_expiry_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentGenerationTemplate {
    pub template_id: String,
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationListItem {
    pub configuration_id: ConfigurationId,
    pub name: String,
}
