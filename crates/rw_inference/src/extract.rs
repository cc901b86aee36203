use rw_core::{Error, FetchedPage, Result};
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

/// Whether a fetched article should be decoded as PDF.
pub fn is_pdf(url: &str, content_type: Option<&str>) -> bool {
    let by_type = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/pdf"))
        .unwrap_or(false);
    let by_extension = Url::parse(url)
        .map(|u| u.path().to_ascii_lowercase().ends_with(".pdf"))
        .unwrap_or_else(|_| url.to_ascii_lowercase().ends_with(".pdf"));
    by_type || by_extension
}

/// Text of every paragraph element, one per line.
pub fn extract_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("p") {
        Ok(selector) => selector,
        Err(_) => return String::new(),
    };
    document
        .select(&selector)
        .map(|p| p.text().collect::<String>())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The PDF decoder can panic on malformed input, so it runs on a blocking task.
pub async fn extract_pdf(bytes: Vec<u8>) -> Result<String> {
    let joined = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| format!("{:?}", e))
    })
    .await;
    match joined {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(Error::Extraction(format!("PDF decode failed: {}", e))),
        Err(e) => {
            warn!("PDF decoder aborted: {}", e);
            Err(Error::Extraction("PDF decoder aborted".to_string()))
        }
    }
}

/// Extracts article text from a fetched page; blank text is an error.
pub async fn extract_text(url: &str, page: &FetchedPage) -> Result<String> {
    let text = if is_pdf(url, page.content_type.as_deref()) {
        debug!("Extracting PDF text from {}", url);
        extract_pdf(page.body.clone()).await?
    } else {
        extract_html(&page.text())
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Extraction(format!("no text extracted from {}", url)));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str, content_type: Option<&str>) -> FetchedPage {
        FetchedPage {
            status: 200,
            content_type: content_type.map(|s| s.to_string()),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf("https://a.example/report.PDF", None));
        assert!(is_pdf("https://a.example/report.pdf?download=1", None));
        assert!(is_pdf("https://a.example/download", Some("application/pdf")));
        assert!(!is_pdf("https://a.example/pdf-guide/", Some("text/html; charset=utf-8")));
    }

    #[test]
    fn test_extract_html_paragraphs() {
        let html = r#"
            <html><body>
              <h1>Heading is ignored</h1>
              <p>First paragraph.</p>
              <div><p>  Second <b>bold</b> paragraph. </p></div>
              <p>   </p>
            </body></html>
        "#;
        assert_eq!(extract_html(html), "First paragraph.\nSecond bold paragraph.");
    }

    #[tokio::test]
    async fn test_blank_html_is_extraction_error() {
        let result = extract_text("https://a.example/x", &page("<html><div>no paragraphs</div></html>", None)).await;
        assert!(matches!(result, Err(Error::Extraction(_))));
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_extraction_error() {
        let result = extract_text("https://a.example/x.pdf", &page("not a pdf at all", None)).await;
        assert!(matches!(result, Err(Error::Extraction(_))));
    }
}
