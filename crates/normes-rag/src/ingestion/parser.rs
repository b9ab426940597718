//! Text extraction for uploaded files

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::FileType;

/// Upper bound on a single PDF extraction
const PDF_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Replace typographic glyphs that pdf-extract leaves behind with ASCII
fn cleanup_pdf_text(text: &str) -> String {
    text.replace(['\u{2010}', '\u{2011}', '\u{2013}'], "-")
        .replace('\u{2014}', "--")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

/// Parsed document with extracted text
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Extracted text content
    pub content: String,
}

/// Extracts plain text from uploaded PDF, text and Markdown files
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let file_type = FileType::from_filename(filename);

        let content = match file_type {
            FileType::Pdf => Self::parse_pdf(filename, data)?,
            FileType::Txt | FileType::Markdown => Self::parse_text(filename, data)?,
            FileType::Unknown => {
                return Err(Error::UnsupportedFileType(format!(
                    "{} - only PDF, text and Markdown uploads are accepted",
                    filename
                )));
            }
        };

        if content.trim().is_empty() {
            return Err(Error::file_parse(filename, "no extractable text"));
        }

        tracing::debug!("Extracted {} chars from {}", content.len(), filename);

        Ok(ParsedDocument { file_type, content })
    }

    /// Extract PDF text on a worker thread so a pathological font cannot hang the request
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<String> {
        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(PDF_EXTRACTION_TIMEOUT) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                Ok(cleanup_pdf_text(&text))
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(Error::file_parse(filename, e.to_string()))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!(
                    "PDF extraction of {} exceeded {:?}",
                    filename,
                    PDF_EXTRACTION_TIMEOUT
                );
                Err(Error::file_parse(filename, "PDF extraction timed out"))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF extraction thread crashed for {}", filename);
                Err(Error::file_parse(filename, "PDF extraction failed"))
            }
        }
    }

    fn parse_text(filename: &str, data: &[u8]) -> Result<String> {
        String::from_utf8(data.to_vec())
            .map_err(|e| Error::file_parse(filename, format!("invalid UTF-8: {}", e)))
    }
}
