//! Minimal RSS 2.0 / Atom reader: only the fields the digest needs.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use crate::FeedError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: String,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Published,
    Updated,
}

#[derive(Default)]
struct Pending {
    title: String,
    link: String,
    published: String,
    updated: String,
}

impl Pending {
    fn push(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
        };
        slot.push_str(text);
    }

    fn link_href(&mut self, e: &BytesStart) -> Result<(), FeedError> {
        if !self.link.is_empty() {
            return Ok(());
        }
        let mut href = None;
        let mut alternate = true;
        for attr in e.attributes().filter_map(|a| a.ok()) {
            match attr.key.local_name().as_ref() {
                b"href" => href = Some(attr.unescape_value()?.into_owned()),
                b"rel" => alternate = attr.unescape_value()? == "alternate",
                _ => {}
            }
        }
        if let (Some(h), true) = (href, alternate) {
            self.link = h;
        }
        Ok(())
    }

    fn finish(self) -> FeedEntry {
        let published = if self.published.trim().is_empty() { self.updated } else { self.published };
        FeedEntry {
            title: self.title.trim().to_string(),
            link: self.link.trim().to_string(),
            published: published.trim().to_string(),
        }
    }
}

fn field_for(name: &[u8]) -> Option<Field> {
    match name {
        b"title" => Some(Field::Title),
        b"link" => Some(Field::Link),
        b"pubDate" | b"published" => Some(Field::Published),
        b"updated" => Some(Field::Updated),
        _ => None,
    }
}

/// Entries of an RSS (`<item>`) or Atom (`<entry>`) document, in document order.
/// Channel-level titles and links are ignored.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<Pending> = None;
    let mut field: Option<Field> = None;
    // nesting depth inside the current entry; only direct children are read
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name();
                if let Some(entry) = current.as_mut() {
                    depth += 1;
                    if depth == 1 {
                        field = field_for(name.as_ref());
                        if field == Some(Field::Link) {
                            entry.link_href(&e)?;
                        }
                    }
                } else if matches!(name.as_ref(), b"item" | b"entry") {
                    current = Some(Pending::default());
                    depth = 0;
                }
            }
            Event::Empty(e) => {
                if let Some(entry) = current.as_mut() {
                    if depth == 0 && e.local_name().as_ref() == b"link" {
                        entry.link_href(&e)?;
                    }
                }
            }
            Event::Text(t) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    entry.push(f, &t.unescape()?);
                }
            }
            Event::CData(t) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    entry.push(f, &String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(_) => {
                if current.is_some() {
                    if depth == 0 {
                        if let Some(done) = current.take() {
                            entries.push(done.finish());
                        }
                    } else {
                        depth -= 1;
                        if depth == 0 {
                            field = None;
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(entries)
}
