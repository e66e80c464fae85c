//! Plain-text extraction from uploaded resume files.

use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::extraction::word::{extract_doc_text, CFB_MAGIC};

const PDF_MIME: &str = "application/pdf";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const DOC_MIME: &str = "application/msword";

// Upper bound on the decompressed document body we are willing to read.
const MAX_DOCX_XML_BYTES: u64 = 32 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    Docx,
    Doc,
    PlainText,
}

#[derive(Debug, Error)]
pub enum ResumeParseError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX archive error: {0}")]
    Docx(#[from] zip::result::ZipError),

    #[error("DOC extraction failed: {0}")]
    Doc(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is not valid UTF-8 text")]
    Encoding,
}

/// Works out the format from the declared content type, the file name and,
/// as a last resort, the leading bytes.
pub fn detect_format(
    filename: &str,
    content_type: Option<&str>,
    data: &[u8],
) -> Result<ResumeFormat, ResumeParseError> {
    let lower = filename.to_lowercase();
    let mime = content_type.unwrap_or("").to_lowercase();

    if mime == PDF_MIME || lower.ends_with(".pdf") || data.starts_with(b"%PDF") {
        return Ok(ResumeFormat::Pdf);
    }
    if mime == DOCX_MIME || lower.ends_with(".docx") {
        return Ok(ResumeFormat::Docx);
    }
    if mime == DOC_MIME || lower.ends_with(".doc") || data.starts_with(&CFB_MAGIC) {
        return Ok(ResumeFormat::Doc);
    }
    if mime.starts_with("text/") || lower.ends_with(".txt") {
        return Ok(ResumeFormat::PlainText);
    }

    Err(ResumeParseError::Unsupported(if mime.is_empty() {
        filename.to_string()
    } else {
        mime
    }))
}

/// Converts the raw upload to plain text. CPU-bound; call from a blocking task.
pub fn extract_text(format: ResumeFormat, data: &[u8]) -> Result<String, ResumeParseError> {
    match format {
        ResumeFormat::Pdf => {
            pdf_extract::extract_text_from_mem(data).map_err(|e| ResumeParseError::Pdf(e.to_string()))
        }
        ResumeFormat::Docx => extract_docx_text(data),
        ResumeFormat::Doc => extract_doc_text(data),
        ResumeFormat::PlainText => {
            String::from_utf8(data.to_vec()).map_err(|_| ResumeParseError::Encoding)
        }
    }
}

fn extract_docx_text(data: &[u8]) -> Result<String, ResumeParseError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    let entry = archive.by_name("word/document.xml")?;

    let mut xml = String::new();
    entry.take(MAX_DOCX_XML_BYTES).read_to_string(&mut xml)?;

    Ok(docx_xml_to_text(&xml))
}

static DOCX_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|</w:p>|<w:tab\s*/>|<w:br\b[^>]*/>").unwrap()
});

/// Flattens WordprocessingML text runs: one line per paragraph.
fn docx_xml_to_text(xml: &str) -> String {
    let mut out = String::new();

    for caps in DOCX_TOKEN_RE.captures_iter(xml) {
        if let Some(run) = caps.get(1) {
            out.push_str(&unescape_xml(run.as_str()));
            continue;
        }
        match &caps[0] {
            "</w:p>" => out.push('\n'),
            token if token.starts_with("<w:tab") => out.push('\t'),
            _ => out.push('\n'),
        }
    }

    tidy_lines(&out)
}

/// Trims trailing whitespace per line and blank lines at either end.
pub(crate) fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
