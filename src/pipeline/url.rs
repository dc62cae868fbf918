//! URL classification and decoding for image references.
//!
//! Decoding follows `decodeURI` rules: escapes of URI-reserved characters
//! (`; / ? : @ & = + $ , #`) are kept as written so a query such as
//! `?q=a%26b` keeps its meaning after the round trip into `src="..."`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::string::FromUtf8Error;

/// Extensions recognised as images when the URL carries one.
const IMAGE_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

/// Path segment used by attachment hosts for extension-less image URLs.
const ATTACHMENT_PATH: &str = "/user-attachments/assets/";

static RE_RESERVED_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%(?:2[346BCFbcf]|3[ABDFabdf]|40)").unwrap());

/// True if `url` starts with `http://` or `https://` (scheme case-insensitive).
pub fn is_http(url: &str) -> bool {
    has_prefix_ignore_case(url, "http://") || has_prefix_ignore_case(url, "https://")
}

fn has_prefix_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// True if the URL's path ends in a recognised image extension or follows the
/// `<host>/user-attachments/assets/<id>` convention. Any query string is
/// ignored for the check.
pub fn is_image_url(url: &str) -> bool {
    let path = url.split_once('?').map_or(url, |(path, _)| path);
    let lower = path.to_ascii_lowercase();

    if IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return true;
    }

    match lower.find(ATTACHMENT_PATH) {
        Some(idx) => !lower[idx + ATTACHMENT_PATH.len()..].trim_matches('/').is_empty(),
        None => false,
    }
}

/// True if `url` contains characters that cannot appear in an unquoted
/// Markdown link target: whitespace, quotes or angle brackets. Quoted `src`
/// values are not checked.
pub fn has_illegal_chars(url: &str) -> bool {
    url.chars()
        .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>'))
}

/// Percent-decode `raw`, leaving reserved-character escapes intact.
///
/// Borrows when there is nothing to decode. Fails only when the decoded
/// bytes are not valid UTF-8.
pub fn decode_uri(raw: &str) -> Result<Cow<'_, str>, FromUtf8Error> {
    if !raw.contains('%') {
        return Ok(Cow::Borrowed(raw));
    }

    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    for m in RE_RESERVED_ESCAPE.find_iter(raw) {
        out.push_str(&urlencoding::decode(&raw[last..m.start()])?);
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&urlencoding::decode(&raw[last..])?);

    if out == raw {
        Ok(Cow::Borrowed(raw))
    } else {
        Ok(Cow::Owned(out))
    }
}
