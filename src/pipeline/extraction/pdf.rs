use super::ExtractionError;

/// PDF text extractor using the pdf-extract crate.
/// Handles digital PDFs with embedded text layers.
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Extract the text of all pages, concatenated with newline separators.
    pub fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, ExtractionError> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;
        Ok(pages.join("\n"))
    }
}

/// Best-effort text extraction: any failure degrades to an empty string,
/// which downstream stages treat as "no OCR signal". pdf-extract can panic
/// on malformed documents, so the call is isolated behind catch_unwind.
pub fn extract_text_lossy(pdf_bytes: &[u8]) -> String {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        PdfTextExtractor.extract_text(pdf_bytes)
    }));
    match outcome {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "text extraction failed; continuing without text");
            String::new()
        }
        Err(_) => {
            tracing::warn!("text extraction panicked; continuing without text");
            String::new()
        }
    }
}

/// Generate a valid PDF with one page per text line using lopdf. Pages keep
/// the lines separate in extracted text (pages are joined with newlines),
/// which the line-oriented parsers rely on. Shared by extraction and
/// endpoint tests.
#[cfg(test)]
pub(crate) fn make_test_pdf(lines: &[&str]) -> Vec<u8> {
    use lopdf::dictionary;
    use lopdf::{Document, Object, Stream};

    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut page_ids: Vec<Object> = Vec::with_capacity(lines.len());
    for line in lines {
        let escaped = line
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)");
        let content = format!("BT /F1 12 Tf 72 720 Td ({escaped}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => font_id,
                },
            },
        });
        page_ids.push(page_id.into());
    }

    let count = page_ids.len() as i64;
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids.clone(),
        "Count" => count,
    });

    for page in &page_ids {
        if let Ok(reference) = page.as_reference() {
            if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(reference) {
                dict.set("Parent", pages_id);
            }
        }
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });

    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_from_digital_pdf() {
        let pdf_bytes = make_test_pdf(&["Nano Labs Diagnostics", "Glucose 95 mg/dL"]);
        let text = extract_text_lossy(&pdf_bytes);
        assert!(
            text.contains("Glucose"),
            "expected extracted text to contain 'Glucose', got: {text}"
        );
    }

    #[test]
    fn invalid_pdf_degrades_to_empty_text() {
        assert_eq!(extract_text_lossy(b"not a pdf"), "");
        assert_eq!(extract_text_lossy(&[]), "");
    }

    #[test]
    fn strict_extractor_reports_error_for_garbage() {
        let result = PdfTextExtractor.extract_text(b"garbage bytes");
        assert!(result.is_err());
    }
}
