use log::{debug, warn};
use regex::Regex;

/// Return the first `https` link in `text` that contains `sub_text`, or an empty string.
///
/// The link runs up to the next whitespace (or the end of the text) and needs at least
/// one character on either side of `sub_text`. Matching is case-sensitive and
/// `sub_text` is taken literally.
///
/// ```
/// use mailbox_probe::mail::links::find_link;
///
/// let text = "Click https://x.test/a/reset/AbC123 to continue\n";
/// assert_eq!(find_link(text, "reset"), "https://x.test/a/reset/AbC123");
/// assert_eq!(find_link(text, "verify"), "");
/// ```
pub fn find_link(text: &str, sub_text: &str) -> String {
    let pattern = format!(r"https\S+?{}\S+(?:\s|$)", regex::escape(sub_text));
    debug!("parse link with {pattern}");

    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!("invalid link pattern for '{sub_text}': {e}");
            return String::new();
        }
    };

    re.find(text)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
