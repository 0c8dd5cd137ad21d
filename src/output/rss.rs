use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

const ITUNES_NS: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";
const GENERATOR: &str = concat!("podmix ", env!("CARGO_PKG_VERSION"));
const DOCS: &str = "https://www.rssboard.org/rss-specification";

/// An RSS 2.0 `<channel>` with podcast extensions.
#[derive(Debug, Clone)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub author: String,
    pub explicit: bool,
    pub last_build_date: DateTime<Utc>,
    pub items: Vec<Item>,
}

/// An RSS 2.0 `<item>` carrying one audio enclosure.
#[derive(Debug, Clone)]
pub struct Item {
    pub title: String,
    pub link: String,
    pub description: String,
    pub guid: String,
    pub pub_date: DateTime<Utc>,
    pub enclosure: Enclosure,
}

#[derive(Debug, Clone)]
pub struct Enclosure {
    pub url: String,
    pub length: u64,
    pub mime_type: String,
}

/// RFC 822 date as RSS readers expect it.
pub fn rfc822(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Serializes a channel as a UTF-8 RSS 2.0 document.
///
/// `language`, `itunes:author` and `itunes:explicit` are written as the first
/// children of `<channel>`.
pub fn render_rss(channel: &Channel) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .context("Failed to write XML declaration")?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:itunes", ITUNES_NS));
    writer
        .write_event(Event::Start(rss))
        .context("Failed to write rss element")?;
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .context("Failed to write channel element")?;

    write_text_element(&mut writer, "language", &channel.language)?;
    write_text_element(&mut writer, "itunes:author", &channel.author)?;
    write_text_element(
        &mut writer,
        "itunes:explicit",
        if channel.explicit { "yes" } else { "no" },
    )?;
    write_text_element(&mut writer, "title", &channel.title)?;
    write_text_element(&mut writer, "link", &channel.link)?;
    write_text_element(&mut writer, "description", &channel.description)?;
    write_text_element(&mut writer, "lastBuildDate", &rfc822(channel.last_build_date))?;
    write_text_element(&mut writer, "generator", GENERATOR)?;
    write_text_element(&mut writer, "docs", DOCS)?;

    for item in &channel.items {
        write_item(&mut writer, item)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .context("Failed to write channel end")?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .context("Failed to write rss end")?;

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).context("Generated RSS contains invalid UTF-8")
}

fn write_item(writer: &mut Writer<Cursor<Vec<u8>>>, item: &Item) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("item")))
        .context("Failed to write item element")?;

    write_text_element(writer, "title", &item.title)?;
    write_text_element(writer, "link", &item.link)?;
    write_text_element(writer, "description", &item.description)?;

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "false"));
    writer
        .write_event(Event::Start(guid))
        .context("Failed to write guid element")?;
    writer
        .write_event(Event::Text(BytesText::new(&item.guid)))
        .context("Failed to write guid text")?;
    writer
        .write_event(Event::End(BytesEnd::new("guid")))
        .context("Failed to write guid end")?;

    write_text_element(writer, "pubDate", &rfc822(item.pub_date))?;

    let length = item.enclosure.length.to_string();
    let mut enclosure = BytesStart::new("enclosure");
    enclosure.push_attribute(("url", item.enclosure.url.as_str()));
    enclosure.push_attribute(("length", length.as_str()));
    enclosure.push_attribute(("type", item.enclosure.mime_type.as_str()));
    writer
        .write_event(Event::Empty(enclosure))
        .context("Failed to write enclosure element")?;

    writer
        .write_event(Event::End(BytesEnd::new("item")))
        .context("Failed to write item end")?;
    Ok(())
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .with_context(|| format!("Failed to write {} element", name))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .with_context(|| format!("Failed to write {} text", name))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("Failed to write {} end", name))?;
    Ok(())
}
