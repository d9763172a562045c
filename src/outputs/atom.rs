//! Atom 1.0 serialization.
//!
//! Entries are written in the order they appear in the [`Feed`]. Atom
//! requires `<updated>` on every entry; entries without a publication date
//! use the feed's generation time there and omit `<published>`.

use super::{GENERATOR, non_blank};
use crate::error::FeedError;
use crate::models::{Entry, Feed};
use atom_syndication::{Generator, Link, Person, Text};
use chrono::{DateTime, FixedOffset};
use tracing::{debug, instrument};

fn alternate(href: &str) -> Link {
    Link {
        href: href.to_string(),
        rel: "alternate".to_string(),
        ..Default::default()
    }
}

fn person(name: &str) -> Person {
    Person {
        name: name.to_string(),
        ..Default::default()
    }
}

/// Serialize `feed` as an Atom document.
#[instrument(level = "debug", skip_all, fields(entries = feed.entries.len()))]
pub fn write_atom(feed: &Feed) -> Result<String, FeedError> {
    let meta = &feed.metadata;
    let updated: DateTime<FixedOffset> = feed.generated_at.into();

    let document = atom_syndication::Feed {
        id: meta.id.clone(),
        title: Text::plain(meta.title.clone()),
        updated,
        authors: non_blank(&meta.author).map(|name| person(&name)).into_iter().collect(),
        links: vec![alternate(&meta.link)],
        generator: Some(Generator {
            value: GENERATOR.to_string(),
            uri: None,
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
        logo: non_blank(&meta.logo),
        subtitle: non_blank(&meta.subtitle).map(Text::plain),
        lang: non_blank(&meta.language),
        entries: feed.entries.iter().map(|entry| atom_entry(entry, updated)).collect(),
        ..Default::default()
    };

    let xml = String::from_utf8(document.write_to(Vec::new())?)?;
    debug!(bytes = xml.len(), "Rendered Atom feed");
    Ok(xml)
}

fn atom_entry(entry: &Entry, fallback_updated: DateTime<FixedOffset>) -> atom_syndication::Entry {
    let published: Option<DateTime<FixedOffset>> = entry.published.map(Into::into);

    atom_syndication::Entry {
        id: entry.id.clone(),
        title: Text::plain(entry.title.clone()),
        updated: published.unwrap_or(fallback_updated),
        authors: entry.author.as_deref().map(person).into_iter().collect(),
        links: vec![alternate(&entry.link)],
        summary: entry.summary.clone().map(Text::plain),
        published,
        ..Default::default()
    }
}
