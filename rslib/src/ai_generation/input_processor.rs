use std::path::Path;

use pdf_extract::extract_text_from_mem;
use tracing::debug;

use crate::ai_generation::AiResult;
use crate::ai_generation::FilePayload;

/// Largest upload accepted, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// A PDF yielding fewer readable characters is treated as scanned or empty.
pub const MIN_PDF_TEXT_CHARS: usize = 50;
/// Text beyond this many characters is not sent to the model.
pub const MAX_PROMPT_CHARS: usize = 6000;
pub const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct ProcessedInput {
    /// Normalized text, cut to [MAX_PROMPT_CHARS].
    pub text: String,
    /// The first [PREVIEW_CHARS] characters, with an ellipsis if cut.
    pub preview: String,
    pub truncated: bool,
    pub file: FilePayload,
}

impl ProcessedInput {
    fn new(text: &str, file: FilePayload) -> Self {
        let prompt_text = truncate_chars(text, MAX_PROMPT_CHARS);
        let preview = truncate_chars(prompt_text, PREVIEW_CHARS);
        let preview = if preview.len() < prompt_text.len() {
            format!("{preview}...")
        } else {
            preview.to_string()
        };

        Self {
            truncated: prompt_text.len() < text.len(),
            text: prompt_text.to_string(),
            preview,
            file,
        }
    }
}

pub struct InputProcessor;

impl InputProcessor {
    /// Extract prompt-ready text from an uploaded PDF. Other file types, files
    /// over [MAX_UPLOAD_BYTES], and PDFs with too little text are refused.
    pub fn prepare_pdf(file: &FilePayload) -> AiResult<ProcessedInput> {
        if !is_pdf_mime(infer_mime(file).as_deref()) {
            crate::invalid_input!("only PDF files are accepted, got {}", file.filename);
        }
        check_size(file)?;

        let text = normalize_whitespace(&extract_pdf_text(&file.data)?);
        let readable = text.chars().filter(|ch| !ch.is_whitespace()).count();
        debug!(filename = %file.filename, readable, "extracted PDF text");
        if readable < MIN_PDF_TEXT_CHARS {
            crate::invalid_input!(
                "{} does not contain enough readable text; it may be scanned or protected",
                file.filename
            );
        }

        Ok(ProcessedInput::new(&text, file.clone()))
    }
}

fn check_size(file: &FilePayload) -> AiResult<()> {
    if file.data.len() > MAX_UPLOAD_BYTES {
        crate::invalid_input!(
            "{} is too large ({} bytes, at most {} allowed)",
            file.filename,
            file.data.len(),
            MAX_UPLOAD_BYTES
        );
    }
    Ok(())
}

fn infer_mime(file: &FilePayload) -> Option<String> {
    if let Some(mimetype) = &file.mimetype {
        return Some(mimetype.to_ascii_lowercase());
    }

    Path::new(&file.filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some("application/pdf"),
            "txt" => Some("text/plain"),
            _ => None,
        })
        .map(|s| s.to_string())
}

fn is_pdf_mime(mime: Option<&str>) -> bool {
    mime.is_some_and(|mime| mime.contains("pdf"))
}

fn extract_pdf_text(data: &[u8]) -> AiResult<String> {
    match extract_text_from_mem(data) {
        Ok(text) => Ok(text),
        Err(err) => crate::invalid_input!(
            err,
            "unable to extract text from the PDF; make sure it contains text"
        ),
    }
}

/// Trim each line and collapse runs of blank lines into one.
fn normalize_whitespace(text: &str) -> String {
    let mut normalized = String::new();
    let mut previous_blank = true;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !previous_blank && !normalized.is_empty() {
                normalized.push_str("\n\n");
            }
            previous_blank = true;
        } else {
            if !normalized.is_empty() && !previous_blank {
                normalized.push('\n');
            }
            normalized.push_str(trimmed);
            previous_blank = false;
        }
    }

    normalized
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// A single-page PDF showing `lines` in Helvetica, one per line.
#[cfg(test)]
pub(crate) fn text_pdf(lines: &[&str]) -> Vec<u8> {
    let mut content = String::from("BT\n/F1 12 Tf\n72 720 Td\n");
    for line in lines {
        content.push_str(&format!("({line}) Tj\n0 -14 Td\n"));
    }
    content.push_str("ET");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (idx, object) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{object}\nendobj\n", idx + 1));
    }
    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudyError;

    fn file(name: &str, data: &[u8], mimetype: Option<&str>) -> FilePayload {
        FilePayload::new(name.into(), data.to_vec(), mimetype.map(Into::into))
    }

    #[test]
    fn extracts_text_from_pdf() {
        let pdf = text_pdf(&[
            "Photosynthesis converts light energy into chemical energy.",
            "Chlorophyll absorbs mostly red and blue light.",
        ]);
        let processed =
            InputProcessor::prepare_pdf(&file("biology.pdf", &pdf, Some("application/pdf")))
                .unwrap();
        assert!(processed.text.contains("Photosynthesis"));
        assert!(processed.text.contains("Chlorophyll"));
        assert!(!processed.truncated);
        assert_eq!(processed.preview, processed.text);
        assert_eq!(processed.file.filename, "biology.pdf");
    }

    #[test]
    fn pdf_with_too_little_text_is_refused() {
        let pdf = text_pdf(&["Cells divide."]);
        let err = InputProcessor::prepare_pdf(&file("short.pdf", &pdf, None)).unwrap_err();
        assert!(matches!(err, StudyError::InvalidInput { .. }));
        assert!(err.to_string().contains("enough readable text"));
    }

    #[test]
    fn normalizes_whitespace() {
        assert_eq!(
            normalize_whitespace("  Cells \n\n\n\n divide.\n"),
            "Cells\n\ndivide."
        );
    }

    #[test]
    fn truncates_on_char_boundary() {
        let text = "é".repeat(MAX_PROMPT_CHARS + 10);
        let processed = ProcessedInput::new(&text, file("long.pdf", b"", None));
        assert!(processed.truncated);
        assert_eq!(processed.text.chars().count(), MAX_PROMPT_CHARS);
        assert_eq!(processed.preview.chars().count(), PREVIEW_CHARS + 3);
        assert!(processed.preview.ends_with("..."));
    }

    #[test]
    fn pdf_checks_run_before_extraction() {
        let err = InputProcessor::prepare_pdf(&file("notes.txt", b"plain", Some("text/plain")))
            .unwrap_err();
        assert!(err.to_string().contains("only PDF files"));

        let oversized = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let err = InputProcessor::prepare_pdf(&file("big.pdf", &oversized, None)).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn mime_inference() {
        assert_eq!(
            infer_mime(&file("Course.PDF", b"", None)).as_deref(),
            Some("application/pdf")
        );
        assert_eq!(
            infer_mime(&file("x.bin", b"", Some("Application/PDF"))).as_deref(),
            Some("application/pdf")
        );
        assert_eq!(infer_mime(&file("archive.zip", b"", None)), None);
    }
}
