//! Rendering of decoded bodies for the terminal

use anyhow::Result;
use unifetch::DecodedBody;

/// Format a body for printing
///
/// JSON is pretty printed, text is printed as is and binary bodies are
/// summarized by their size.
pub fn render(body: &DecodedBody) -> Result<String> {
    let rendered = match body {
        DecodedBody::Json(value) => serde_json::to_string_pretty(value)?,
        DecodedBody::Text(text) => text.clone(),
        DecodedBody::Blob(blob) => match blob.content_type() {
            Some(content_type) => format!("<{} bytes of {}>", blob.size(), content_type),
            None => format!("<{} bytes>", blob.size()),
        },
        DecodedBody::ArrayBuffer(bytes) => format!("<{} bytes>", bytes.len()),
        DecodedBody::Raw(raw) => raw.text(),
    };

    Ok(rendered)
}
