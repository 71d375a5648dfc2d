//! webdav::propfind
//!
//! Minimal reader for `207 Multi-Status` PROPFIND responses.
//!
//! Only two properties of the first `response` element are needed:
//! `getcontentlength` and whether `resourcetype` contains `collection`.
//! Servers disagree on namespace prefixes (`D:`, `d:`, `lp1:`, none), so
//! elements are matched by local name.

/// Properties extracted from a PROPFIND response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Props {
    pub content_length: Option<u64>,
    pub is_collection: bool,
}

/// A start, end or empty-element tag.
#[derive(Debug)]
struct Tag<'a> {
    local_name: &'a str,
    closing: bool,
    self_closing: bool,
    /// Byte offset just past the closing `>`
    end: usize,
}

/// Iterate over the element tags of `xml`, skipping declarations,
/// comments and processing instructions.
fn tags(xml: &str) -> impl Iterator<Item = Tag<'_>> {
    let mut pos = 0;
    std::iter::from_fn(move || loop {
        let start = pos + xml[pos..].find('<')?;
        let close = start + xml[start..].find('>')?;
        pos = close + 1;

        let inner = &xml[start + 1..close];
        if inner.starts_with('?') || inner.starts_with('!') {
            continue;
        }
        let closing = inner.starts_with('/');
        let self_closing = inner.ends_with('/');
        let name = inner
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default();
        let local_name = name.rsplit(':').next().unwrap_or(name);
        return Some(Tag {
            local_name,
            closing,
            self_closing,
            end: pos,
        });
    })
}

/// Parse the first `response` of a multistatus body.
///
/// Properties inside a `propstat` count only if its `status` is 2xx; a
/// `propstat` without a status is trusted.
pub fn parse(xml: &str) -> Result<Props, String> {
    let mut props = Props::default();
    let mut in_response = false;
    let mut in_resourcetype = false;
    // Properties of the open propstat, and whether its status was 2xx
    let mut propstat: Option<(Props, bool)> = None;

    for tag in tags(xml) {
        match (tag.local_name, tag.closing) {
            ("response", false) => in_response = true,
            ("response", true) => return Ok(props),
            ("propstat", false) if in_response && !tag.self_closing => {
                propstat = Some((Props::default(), true))
            }
            ("propstat", true) => {
                if let Some((pending, true)) = propstat.take() {
                    props.is_collection |= pending.is_collection;
                    if pending.content_length.is_some() {
                        props.content_length = pending.content_length;
                    }
                }
            }
            ("status", false) if !tag.self_closing => {
                if let Some((_, ok)) = propstat.as_mut() {
                    *ok = status_is_success(text_after(xml, &tag));
                }
            }
            ("resourcetype", false) if in_response && !tag.self_closing => in_resourcetype = true,
            ("resourcetype", true) => in_resourcetype = false,
            ("collection", false) if in_resourcetype => {
                current(&mut props, &mut propstat).is_collection = true
            }
            ("getcontentlength", false) if in_response && !tag.self_closing => {
                let text = text_after(xml, &tag);
                if !text.is_empty() {
                    let length = text
                        .parse::<u64>()
                        .map_err(|e| format!("bad getcontentlength {:?}: {}", text, e))?;
                    current(&mut props, &mut propstat).content_length = Some(length);
                }
            }
            _ => {}
        }
    }

    if in_response {
        Ok(props)
    } else {
        Err("multistatus body has no response element".into())
    }
}

/// Properties being collected: the open propstat's, else the response's.
fn current<'a>(props: &'a mut Props, propstat: &'a mut Option<(Props, bool)>) -> &'a mut Props {
    match propstat {
        Some((pending, _)) => pending,
        None => props,
    }
}

/// Trimmed text between `tag` and the next tag.
fn text_after<'a>(xml: &'a str, tag: &Tag<'_>) -> &'a str {
    xml[tag.end..].split('<').next().unwrap_or_default().trim()
}

/// Whether a status line like `HTTP/1.1 200 OK` carries a 2xx code.
fn status_is_success(line: &str) -> bool {
    line.split_whitespace()
        .nth(1)
        .is_some_and(|code| code.len() == 3 && code.starts_with('2'))
}
