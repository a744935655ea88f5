use anyhow::{Context, Result};
use log::{debug, info, warn};
use mailparse::{DispositionType, ParsedMail};

/// Line width handed to html2text. Wide enough that links are never wrapped.
const HTML_WIDTH: usize = 10_000;

/// Parse a raw RFC 822 message and return the text of its first body branch.
pub fn extract_body(raw_rfc822: &[u8]) -> Result<String> {
    let parsed = mailparse::parse_mail(raw_rfc822).context("failed to parse message")?;
    Ok(extract_text(&parsed))
}

/// Walk the part tree depth-first along the first child only.
///
/// Later siblings (a second alternative, trailing attachments) are never looked at,
/// so a multipart whose first branch is an attachment yields an empty string.
pub fn extract_text(part: &ParsedMail) -> String {
    let mime = part.ctype.mimetype.to_ascii_lowercase();

    if mime == "text/plain" {
        return decoded_body(part);
    }

    if mime == "text/html" {
        return html_to_text(&decoded_body(part));
    }

    if let Some(first) = part.subparts.first() {
        debug!("descending into first part of {mime}");
        return extract_text(first);
    }

    if is_attachment(part, &mime) {
        info!("skipping attachment of type {mime}");
        return String::new();
    }

    warn!("type {mime} is unknown to handle");
    String::new()
}

fn decoded_body(part: &ParsedMail) -> String {
    part.get_body().unwrap_or_else(|e| {
        warn!("failed to decode {} body: {e}", part.ctype.mimetype);
        String::new()
    })
}

fn is_attachment(part: &ParsedMail, mime: &str) -> bool {
    if part.get_content_disposition().disposition == DispositionType::Attachment {
        return true;
    }
    ["application/", "image/", "audio/", "video/"]
        .iter()
        .any(|prefix| mime.starts_with(prefix))
}

/// Render HTML to plain text: tags dropped, entities decoded, text kept.
pub fn html_to_text(html: &str) -> String {
    match html2text::from_read(html.as_bytes(), HTML_WIDTH) {
        Ok(text) => text,
        Err(e) => {
            warn!("failed to render html body: {e}");
            String::new()
        }
    }
}
