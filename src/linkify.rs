//! Turns bare contact details into clickable links.
//!
//! Templates apply [`linkify`] to one contact field at a time, e.g.
//! `{{ contact.email|linkify }}`. A fragment is expected to look like
//! `"<icon> <text>"`; anything without a leading icon is left alone.
//!
//! Three passes run in a fixed order over the same text, each linking at
//! most its first match:
//!
//! 1. email addresses become `mailto:` links,
//! 2. international phone numbers become `tel:` links,
//! 3. domains and URLs become web links, unless the text contains an `@`.
//!
//! The `@` check in the last pass is literal: once a fragment holds an
//! email, a standalone URL elsewhere in it is not linked either. A later pass
//! never links text an earlier pass already linked.

use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static ICON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([^\p{L}\p{N}_\s]+)\s+(.+)$").expect("BUG: invalid ICON_RE regex literal")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.%+-]+@[\w.-]+\.[A-Za-z]{2,}").expect("BUG: invalid EMAIL_RE regex literal")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+[0-9]{1,3}[0-9\s().-]{6,}").expect("BUG: invalid PHONE_RE regex literal")
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?[\w.-]+\.[A-Za-z]{2,}")
        .expect("BUG: invalid URL_RE regex literal")
});

/// A linked stretch of the content: its byte range and link target.
struct Link {
    range: Range<usize>,
    href: String,
}

/// Link the first email, phone number and URL found in an icon-prefixed
/// contact fragment.
///
/// Returns the input unchanged when it has no leading icon or when nothing
/// was linked. Text after the icon may span several lines.
///
/// ```rust
/// use cvpress::linkify;
///
/// assert_eq!(
///     linkify("✉ jane@example.com"),
///     r#"✉ <a href="mailto:jane@example.com">jane@example.com</a>"#
/// );
/// assert_eq!(linkify("plain text"), "plain text");
/// ```
pub fn linkify(text: &str) -> String {
    linkify_with(text, |s| Cow::Borrowed(s))
}

/// [`linkify`] with every piece of visible text passed through `escape`.
///
/// Link targets are not escaped: the patterns that produce them admit no
/// character that needs escaping inside a quoted attribute.
pub(crate) fn linkify_with<F>(text: &str, escape: F) -> String
where
    F: Fn(&str) -> Cow<'_, str>,
{
    let Some(caps) = ICON_RE.captures(text) else {
        return escape(text).into_owned();
    };
    let (Some(icon), Some(content)) = (caps.get(1), caps.get(2)) else {
        return escape(text).into_owned();
    };
    let content = content.as_str();

    let mut links: Vec<Link> = Vec::with_capacity(3);
    if let Some(link) = find_email(content) {
        links.push(link);
    }
    if let Some(link) = find_phone(content, &links) {
        links.push(link);
    }
    if let Some(link) = find_url(content, &links) {
        links.push(link);
    }
    if links.is_empty() {
        return escape(text).into_owned();
    }
    links.sort_by_key(|link| link.range.start);

    let mut out = String::with_capacity(text.len() + links.len() * 32);
    out.push_str(&escape(icon.as_str()));
    out.push(' ');
    let mut cursor = 0;
    for link in &links {
        out.push_str(&escape(&content[cursor..link.range.start]));
        out.push_str(&anchor(&link.href, &escape(&content[link.range.clone()])));
        cursor = link.range.end;
    }
    out.push_str(&escape(&content[cursor..]));
    out
}

fn overlaps(range: &Range<usize>, links: &[Link]) -> bool {
    links
        .iter()
        .any(|link| range.start < link.range.end && link.range.start < range.end)
}

fn find_email(content: &str) -> Option<Link> {
    let m = EMAIL_RE.find(content)?;
    Some(Link {
        range: m.range(),
        href: format!("mailto:{}", m.as_str()),
    })
}

fn find_phone(content: &str, taken: &[Link]) -> Option<Link> {
    PHONE_RE.find_iter(content).find_map(|m| {
        // The character class admits whitespace, so a match can swallow the
        // separator that follows the number.
        let visible = m.as_str().trim_end();
        let range = m.start()..m.start() + visible.len();
        if overlaps(&range, taken) {
            return None;
        }
        let digits: String = visible.chars().filter(char::is_ascii_digit).collect();
        Some(Link {
            range,
            href: format!("tel:+{digits}"),
        })
    })
}

fn find_url(content: &str, taken: &[Link]) -> Option<Link> {
    if content.contains('@') {
        return None;
    }
    URL_RE
        .find_iter(content)
        .find(|m| !overlaps(&m.range(), taken))
        .map(|m| {
            let url = m.as_str();
            let href = if url.starts_with("http") {
                url.to_string()
            } else {
                format!("https://{url}")
            };
            Link {
                range: m.range(),
                href,
            }
        })
}

fn anchor(href: &str, text: &str) -> String {
    format!(r#"<a href="{href}">{text}</a>"#)
}
