// src/ingest/parse.rs
//! Event-driven RSS 2.0 / RDF / Atom reader producing [`RawEntry`] records.
//!
//! Element names are matched by local name, so `dc:date`, `atom:updated`
//! and friends land in the same slots as their unprefixed forms.

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::reader::Reader;

use crate::error::ParseError;
use crate::ingest::dates::{parse_rfc2822, parse_rfc3339};
use crate::ingest::types::RawEntry;

/// Parse a feed document into entries. Entries keep every direct text
/// child in `RawEntry::fields`.
pub fn parse_feed(xml: &str) -> Result<Vec<RawEntry>, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut entry_at: Option<usize> = None;
    let mut current = EntryBuilder::default();
    let mut text = String::new();
    let mut saw_root = false;
    let mut out = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if stack.is_empty() {
                    check_root(&name)?;
                    saw_root = true;
                }
                match entry_at {
                    None if is_entry_element(&name) => {
                        entry_at = Some(stack.len());
                        current = EntryBuilder::default();
                    }
                    Some(at) => current.attributes(stack.len() - at, &name, &e),
                    None => {}
                }
                stack.push(name);
                text.clear();
            }
            Ok(Event::Empty(e)) => {
                let name = local_name(&e);
                if stack.is_empty() {
                    check_root(&name)?;
                    saw_root = true;
                }
                if let Some(at) = entry_at {
                    current.attributes(stack.len() - at, &name, &e);
                }
            }
            Ok(Event::Text(t)) => text.push_str(&decode_text(&t)),
            Ok(Event::CData(c)) => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
            Ok(Event::End(_)) => {
                let name = stack.pop().unwrap_or_default();
                match entry_at {
                    Some(at) if at == stack.len() => {
                        out.push(std::mem::take(&mut current).build());
                        entry_at = None;
                    }
                    Some(at) => {
                        let parent = stack.last().map(String::as_str).unwrap_or_default();
                        current.text(stack.len() - at, parent, &name, text.trim());
                    }
                    None => {}
                }
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseError::Xml(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err(ParseError::NotAFeed);
    }
    Ok(out)
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn check_root(name: &str) -> Result<(), ParseError> {
    if matches!(name, "rss" | "feed" | "RDF") {
        Ok(())
    } else {
        Err(ParseError::NotAFeed)
    }
}

fn is_entry_element(name: &str) -> bool {
    name == "item" || name == "entry"
}

// Feeds routinely carry HTML entities that are not valid XML.
fn decode_text(t: &BytesText<'_>) -> String {
    match t.unescape() {
        Ok(s) => s.into_owned(),
        Err(_) => html_escape::decode_html_entities(&String::from_utf8_lossy(t)).into_owned(),
    }
}

// Where the current `entry.link` came from; a higher rank replaces a lower one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LinkRank {
    #[default]
    None,
    // <link rel="self|related|..." href>
    OtherRel,
    // RSS <link>text</link>
    Text,
    // Atom <link href> without rel, or rel="alternate"
    Alternate,
}

#[derive(Default)]
struct EntryBuilder {
    entry: RawEntry,
    link_rank: LinkRank,
}

impl EntryBuilder {
    fn offer_link(&mut self, href: &str, rank: LinkRank) {
        if rank > self.link_rank {
            self.entry.link = Some(href.to_string());
            self.link_rank = rank;
        }
    }

    /// `depth` is relative to the entry element (1 = direct child).
    fn attributes(&mut self, depth: usize, name: &str, e: &BytesStart<'_>) {
        if depth != 1 {
            return;
        }
        match name {
            "link" => {
                let mut href = None;
                let mut rel = None;
                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value().ok().map(|v| v.trim().to_string());
                    match attr.key.local_name().as_ref() {
                        b"href" => href = value,
                        b"rel" => rel = value,
                        _ => {}
                    }
                }
                let rank = match rel.as_deref() {
                    None | Some("alternate") => LinkRank::Alternate,
                    Some(_) => LinkRank::OtherRel,
                };
                if let Some(href) = href.filter(|h| !h.is_empty()) {
                    self.offer_link(&href, rank);
                }
            }
            "source" => {
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"url" {
                        if let Ok(v) = attr.unescape_value() {
                            self.entry
                                .fields
                                .entry("source_url".to_string())
                                .or_insert_with(|| v.trim().to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, depth: usize, parent: &str, name: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        if depth == 2 && parent == "source" && name == "title" {
            self.entry.source_title = Some(text.to_string());
            return;
        }
        if depth != 1 {
            return;
        }
        if name == "link" {
            self.offer_link(text, LinkRank::Text);
        }

        let e = &mut self.entry;
        match name {
            "title" => e.title = Some(text.to_string()),
            "guid" | "id" => e.id = Some(text.to_string()),
            "source" => e.source_title = Some(text.to_string()),
            "pubDate" => {
                if e.published.is_none() {
                    e.published = parse_rfc2822(text);
                }
            }
            "published" | "issued" | "date" => {
                if e.published.is_none() {
                    e.published = parse_rfc3339(text);
                }
            }
            "updated" | "modified" => {
                if e.updated.is_none() {
                    e.updated = parse_rfc3339(text);
                }
            }
            _ => {}
        }
        let key = match name {
            "issued" | "date" => "published",
            "modified" => "updated",
            other => other,
        };
        e.fields
            .entry(key.to_string())
            .or_insert_with(|| text.to_string());
    }

    fn build(self) -> RawEntry {
        self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Google News</title>
    <item>
      <title>Gold up &amp; silver flat</title>
      <link>https://news.google.com/rss/articles/abc</link>
      <guid isPermaLink="false">CBMiabc</guid>
      <pubDate>Sat, 06 Sep 2025 09:00:00 GMT</pubDate>
      <description><![CDATA[<a href="x">Gold&nbsp;up</a>]]></description>
      <source url="https://www.bloomberght.com">Bloomberg HT</source>
    </item>
    <item>
      <title>No date</title>
      <link>https://example.test/n</link>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example</title>
  <entry>
    <title>Atom entry</title>
    <link rel="self" href="https://example.test/self"/>
    <link href="https://example.test/post"/>
    <id>urn:uuid:1</id>
    <updated>2025-09-06T10:00:00Z</updated>
    <published>2025-09-06T09:00:00+00:00</published>
    <source><title>Example Source</title></source>
  </entry>
</feed>"#;

    #[test]
    fn rss_items_are_read_with_fields_and_source() {
        let entries = parse_feed(RSS).expect("rss parses");
        assert_eq!(entries.len(), 2);
        let e = &entries[0];
        assert_eq!(e.title.as_deref(), Some("Gold up & silver flat"));
        assert_eq!(e.id.as_deref(), Some("CBMiabc"));
        assert_eq!(e.source_title.as_deref(), Some("Bloomberg HT"));
        assert_eq!(e.field("source_url"), Some("https://www.bloomberght.com"));
        assert_eq!(e.field("pubDate"), Some("Sat, 06 Sep 2025 09:00:00 GMT"));
        assert!(e.field("description").is_some());
        assert_eq!(entries[1].published, None);
        assert_eq!(entries[1].field("pubDate"), None);
    }

    #[test]
    fn atom_entries_prefer_alternate_link_and_parse_dates() {
        let entries = parse_feed(ATOM).expect("atom parses");
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.link.as_deref(), Some("https://example.test/post"));
        assert_eq!(e.id.as_deref(), Some("urn:uuid:1"));
        assert_eq!(e.source_title.as_deref(), Some("Example Source"));
        assert_eq!(e.published, Some(Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap()));
        assert_eq!(e.updated, Some(Utc.with_ymd_and_hms(2025, 9, 6, 10, 0, 0).unwrap()));
        // the feed-level <title> is not an entry field
        assert_eq!(e.title.as_deref(), Some("Atom entry"));
    }

    #[test]
    fn rss_link_text_beats_self_and_related_hrefs() {
        let xml = r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom"><channel>
          <item>
            <atom:link href="https://feeds.test/self" rel="self"/>
            <link>https://www.kap.org.tr/a</link>
            <title>A</title>
          </item>
          <item>
            <link>https://www.kap.org.tr/b</link>
            <atom:link href="https://feeds.test/related" rel="related"/>
          </item>
          <item>
            <atom:link href="https://feeds.test/self" rel="self"/>
          </item>
        </channel></rss>"#;
        let entries = parse_feed(xml).expect("rss parses");
        assert_eq!(entries[0].link.as_deref(), Some("https://www.kap.org.tr/a"));
        assert_eq!(entries[1].link.as_deref(), Some("https://www.kap.org.tr/b"));
        // a non-alternate href is still better than nothing
        assert_eq!(entries[2].link.as_deref(), Some("https://feeds.test/self"));
    }

    #[test]
    fn non_feed_documents_are_rejected() {
        assert!(matches!(parse_feed("<html><body/></html>"), Err(ParseError::NotAFeed)));
        assert!(matches!(parse_feed(""), Err(ParseError::NotAFeed)));
        assert!(matches!(parse_feed("<rss><channel></rss>"), Err(ParseError::Xml(_))));
    }
}
