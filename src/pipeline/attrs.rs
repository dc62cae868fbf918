//! Attribute extraction for a single `<img ...>` tag.
//!
//! The matcher hands over one tag at a time; parsing it here keeps a bad
//! tag's failure local to that tag. Values may be double-quoted,
//! single-quoted or bare, and attributes may come in any order.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#,
    )
    .unwrap()
});

/// One parsed attribute. `value` is `None` for bare attributes (`<img ismap>`)
/// and for `name=` with nothing usable after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
}

/// The attributes of one tag, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes<'a> {
    items: Vec<Attribute<'a>>,
}

impl<'a> Attributes<'a> {
    /// First attribute with this name (ASCII case-insensitive).
    pub fn find(&self, name: &str) -> Option<&Attribute<'a>> {
        self.items
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
    }

    /// Value of the first attribute with this name, if it has one.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.find(name).and_then(|attr| attr.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Returned when text between attributes contains a stray quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnbalancedQuotes;

/// Parse the attributes of a complete `<img ...>` tag.
///
/// `tag` must start with `<img` and end with `>`. Leftover text between
/// attributes is tolerated unless it contains a quote character, which means
/// some value was opened and never closed.
pub fn parse_img_attributes(tag: &str) -> Result<Attributes<'_>, UnbalancedQuotes> {
    let body = tag
        .get(4..)
        .unwrap_or_default()
        .trim_end_matches('>')
        .trim_end_matches('/');

    let mut items = Vec::new();
    let mut last = 0;
    for caps in RE_ATTR.captures_iter(body) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if has_quote(&body[last..whole.start()]) {
            return Err(UnbalancedQuotes);
        }
        last = whole.end();

        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str());
        items.push(Attribute {
            name: caps.get(1).map_or("", |m| m.as_str()),
            value,
        });
    }

    if has_quote(&body[last..]) {
        return Err(UnbalancedQuotes);
    }

    Ok(Attributes { items })
}

fn has_quote(s: &str) -> bool {
    s.contains(['"', '\''])
}
