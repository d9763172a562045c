//! RSS 2.0 serialization.
//!
//! RSS `<author>` must be an e-mail address, so entry authors go into
//! `dc:creator` instead. The feed subtitle doubles as the mandatory channel
//! `<description>`.

use super::{GENERATOR, non_blank};
use crate::error::FeedError;
use crate::models::{Entry, Feed};
use rss::extension::dublincore::{self, DublinCoreExtension};
use rss::{Channel, Guid, Image, Item};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Serialize `feed` as an RSS 2.0 document.
#[instrument(level = "debug", skip_all, fields(entries = feed.entries.len()))]
pub fn write_rss(feed: &Feed) -> Result<String, FeedError> {
    let meta = &feed.metadata;
    let namespaces = BTreeMap::from([("dc".to_string(), dublincore::NAMESPACE.to_string())]);

    let channel = Channel {
        title: meta.title.clone(),
        link: meta.link.clone(),
        description: meta.subtitle.clone(),
        language: non_blank(&meta.language),
        last_build_date: Some(feed.generated_at.to_rfc2822()),
        generator: Some(format!("{GENERATOR} {}", env!("CARGO_PKG_VERSION"))),
        image: non_blank(&meta.logo).map(|url| Image {
            url,
            title: meta.title.clone(),
            link: meta.link.clone(),
            ..Default::default()
        }),
        items: feed.entries.iter().map(rss_item).collect(),
        namespaces,
        ..Default::default()
    };

    let xml = String::from_utf8(channel.pretty_write_to(Vec::new(), b' ', 2)?)?;
    debug!(bytes = xml.len(), "Rendered RSS feed");
    Ok(xml)
}

fn rss_item(entry: &Entry) -> Item {
    let permalink = entry.id.starts_with("http://") || entry.id.starts_with("https://");

    Item {
        title: Some(entry.title.clone()),
        link: Some(entry.link.clone()),
        guid: Some(Guid {
            value: entry.id.clone(),
            permalink,
        }),
        description: entry.summary.clone(),
        pub_date: entry.published.map(|published| published.to_rfc2822()),
        dublin_core_ext: entry.author.clone().map(|author| DublinCoreExtension {
            creators: vec![author],
            ..Default::default()
        }),
        ..Default::default()
    }
}
