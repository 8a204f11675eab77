use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// SEC-003: Maximum allowed element nesting depth.
/// Prevents stack/memory abuse from maliciously crafted deeply nested XML.
const MAX_XML_DEPTH: usize = 50;

/// Errors that can occur while parsing feed XML.
///
/// All variants are per-feed failures: the caller logs them and moves on to
/// the next URL, never aborting the pass.
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML parsing failed (malformed markup, mismatched tags, bad escapes).
    #[error("XML parse error: {0}")]
    Xml(String),

    /// SEC-003: Element nesting depth exceeds the safety limit.
    #[error("XML nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    /// Well-formed XML, but no `rss > channel` element was found.
    #[error("document has no rss channel")]
    MissingChannel,
}

/// One entry in a feed channel.
///
/// All fields are optional: RSS in the wild omits any of them, and absence is
/// significant for fingerprinting (an absent title hashes differently from an
/// empty one). Ephemeral; only the item's fingerprint is ever persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
}

/// One feed's current snapshot: channel metadata plus its items in document
/// order. Rebuilt from scratch on every fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub items: Vec<FeedItem>,
}

/// Mutable build state threaded through the event loop.
#[derive(Default)]
struct FeedBuilder {
    feed: Feed,
    current_item: Option<FeedItem>,
}

impl FeedBuilder {
    /// Returns the field slot addressed by the current element path, if the
    /// path names one of the captured channel or item fields.
    ///
    /// A slot of `Some(String)` means the element is present; text and CDATA
    /// events append into it. Paths outside `rss > channel` are ignored, which
    /// is what makes stray markup (or an `<item>` nested inside an item)
    /// harmless.
    fn slot(&mut self, path: &[String]) -> Option<&mut Option<String>> {
        match path {
            [r, c, f] if r == "rss" && c == "channel" => match f.as_str() {
                "title" => Some(&mut self.feed.title),
                "description" => Some(&mut self.feed.description),
                "link" => Some(&mut self.feed.link),
                _ => None,
            },
            [r, c, i, f] if r == "rss" && c == "channel" && i == "item" => {
                let item = self.current_item.as_mut()?;
                match f.as_str() {
                    "title" => Some(&mut item.title),
                    "description" => Some(&mut item.description),
                    "link" => Some(&mut item.link),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Appends text to the slot at `path`, if that slot has been opened.
    fn append_text(&mut self, path: &[String], text: &str) {
        if let Some(slot) = self.slot(path) {
            if let Some(buf) = slot.as_mut() {
                buf.push_str(text);
            }
        }
    }

    /// Marks the element at `path` as present with no content yet.
    fn open_slot(&mut self, path: &[String]) {
        if let Some(slot) = self.slot(path) {
            if slot.is_none() {
                *slot = Some(String::new());
            }
        }
    }
}

fn path_is(path: &[String], expected: &[&str]) -> bool {
    path.len() == expected.len() && path.iter().zip(expected).all(|(a, b)| a == b)
}

/// Resolves one entity reference body (the text between `&` and `;`).
///
/// Character references and the five XML builtins resolve to their
/// characters; anything else is kept verbatim, which is where undeclared
/// custom entities end up, since quick-xml never expands `<!ENTITY>` definitions.
fn resolve_reference(name: &str) -> String {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => num.parse::<u32>().ok(),
        };
        if let Some(ch) = code.and_then(char::from_u32) {
            return ch.to_string();
        }
    } else if let Some(text) = resolve_predefined_entity(name) {
        return text.to_string();
    }
    format!("&{};", name)
}

/// Parses raw RSS XML into a normalized [`Feed`].
///
/// Walks the document with an event reader, tracking the element path from
/// the root, and captures `rss > channel > title|description|link` plus the
/// same three fields for every `rss > channel > item` element, in document
/// order. Field content is taken verbatim: no trimming, no URL validation.
///
/// Presence semantics: an element that appears but is empty (`<title></title>`
/// or `<title/>`) yields `Some("")`; an element that never appears yields
/// `None`. Text and CDATA sections are both captured.
///
/// Because every `<item>` element produces exactly one [`FeedItem`], a channel
/// with a single item parses to a one-element sequence; there is no
/// scalar-vs-array ambiguity to normalize away.
///
/// # Errors
///
/// Returns [`ParseError`] for malformed XML, nesting beyond the depth guard,
/// or a document with no `rss > channel` element. Never panics.
///
/// # Security
///
/// XXE is structurally mitigated: `quick-xml` (0.37) does not parse `<!ENTITY>`
/// declarations, so only the five predefined XML entities are ever resolved
/// (see the SEC-002 pin in Cargo.toml).
pub fn parse_feed(xml: &str) -> Result<Feed, ParseError> {
    let mut reader = Reader::from_str(xml);

    let mut builder = FeedBuilder::default();
    let mut path: Vec<String> = Vec::new();
    let mut saw_channel = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                path.push(name);
                if path.len() > MAX_XML_DEPTH {
                    return Err(ParseError::MaxDepthExceeded(MAX_XML_DEPTH));
                }

                if path_is(&path, &["rss", "channel"]) {
                    saw_channel = true;
                } else if path_is(&path, &["rss", "channel", "item"]) {
                    builder.current_item = Some(FeedItem::default());
                } else {
                    builder.open_slot(&path);
                }
            }
            Ok(Event::Empty(e)) => {
                // Self-closing element: present, no content.
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                path.push(name);
                if path.len() > MAX_XML_DEPTH {
                    return Err(ParseError::MaxDepthExceeded(MAX_XML_DEPTH));
                }

                if path_is(&path, &["rss", "channel"]) {
                    saw_channel = true;
                } else if path_is(&path, &["rss", "channel", "item"]) {
                    builder.feed.items.push(FeedItem::default());
                } else {
                    builder.open_slot(&path);
                }
                path.pop();
            }
            Ok(Event::End(_)) => {
                if path_is(&path, &["rss", "channel", "item"]) {
                    let item = builder.current_item.take().unwrap_or_default();
                    builder.feed.items.push(item);
                }
                path.pop();
            }
            Ok(Event::Text(t)) => {
                // Unescape resolves the predefined entities; fall back to the
                // raw bytes so a stray ampersand degrades instead of failing.
                let text = t
                    .decode()
                    .map(|c| c.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                builder.append_text(&path, &text);
            }
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                builder.append_text(&path, &text);
            }
            Ok(Event::GeneralRef(e)) => {
                // Entity references surface as their own events: resolve
                // character refs and the XML builtins, keep anything else
                // verbatim.
                let name = String::from_utf8_lossy(&e).into_owned();
                builder.append_text(&path, &resolve_reference(&name));
            }
            Ok(Event::Eof) => {
                if !path.is_empty() {
                    return Err(ParseError::Xml("unexpected end of document".into()));
                }
                break;
            }
            Ok(_) => {}
            Err(e) => return Err(ParseError::Xml(e.to_string())),
        }
        buf.clear();
    }

    if !saw_channel {
        return Err(ParseError::MissingChannel);
    }

    Ok(builder.feed)
}
