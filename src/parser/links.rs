//! Normalization and ranking of embedded video links

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::constants::hosts::PREFERRED;

/// Audio/subtitle variant of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Track {
    /// Original audio with subtitles
    #[serde(rename = "SUB")]
    Sub,
    /// Latin-Spanish dub
    #[serde(rename = "LAT")]
    Lat,
}

impl Track {
    /// Tracks in the order they are read from the embedded block
    pub const ALL: [Track; 2] = [Track::Sub, Track::Lat];

    /// Key of this track in the embedded block
    pub fn key(self) -> &'static str {
        match self {
            Track::Sub => "SUB",
            Track::Lat => "LAT",
        }
    }
}

/// One playable source for one episode under one track
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    /// Audio/subtitle track
    pub track: Track,
    /// Lowercased host name (e.g., "sw", "mega")
    pub server: String,
    /// Display title given by the page
    pub title: Option<String>,
    /// Embed code or embed URL
    pub code: Option<String>,
    /// Direct or download URL
    pub url: Option<String>,
}

/// Flatten the embedded `videos` object into link records
///
/// Tracks are read in [`Track::ALL`] order. Values that are not lists and
/// list elements that are not objects are skipped.
pub fn flatten(videos: &Map<String, Value>) -> Vec<LinkRecord> {
    let mut out = Vec::new();

    for track in Track::ALL {
        let Some(items) = videos.get(track.key()).and_then(Value::as_array) else {
            continue;
        };

        for item in items.iter().filter_map(Value::as_object) {
            out.push(LinkRecord {
                track,
                server: str_field(item, "server").unwrap_or_default().to_lowercase(),
                title: str_field(item, "title")
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                code: str_field(item, "code").and_then(unescape_slashes),
                url: str_field(item, "url").and_then(unescape_slashes),
            });
        }
    }

    out
}

/// Order records best first
///
/// Preferred hosts come first in [`PREFERRED`] order, unknown hosts after
/// them. Within one host, records with a code come first. The sort is stable.
pub fn rank(mut records: Vec<LinkRecord>) -> Vec<LinkRecord> {
    records.sort_by_key(rank_key);
    records
}

/// Flatten then rank
pub fn flatten_and_rank(videos: &Map<String, Value>) -> Vec<LinkRecord> {
    rank(flatten(videos))
}

/// The record [`rank`] would place first, or `None` for an empty list
pub fn pick_best(records: &[LinkRecord]) -> Option<&LinkRecord> {
    // min_by_key keeps the first of equal minimums, matching the stable sort
    records.iter().min_by_key(|r| rank_key(r))
}

fn rank_key(record: &LinkRecord) -> (usize, bool) {
    (preference_index(&record.server), record.code.is_none())
}

fn preference_index(server: &str) -> usize {
    PREFERRED
        .iter()
        .position(|name| name.eq_ignore_ascii_case(server))
        .unwrap_or(PREFERRED.len())
}

fn str_field<'a>(item: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str)
}

fn unescape_slashes(value: &str) -> Option<String> {
    let value = value.replace("\\/", "/");
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::parser::{EmbeddedDataExtractor, RegexExtractor};
    use proptest::prelude::*;

    /// Episode page markup declaring `records` in a `videos` block
    fn episode_markup(records: &[LinkRecord]) -> String {
        let mut videos = Map::new();
        for track in Track::ALL {
            let items = records
                .iter()
                .filter(|r| r.track == track)
                .map(|r| serde_json::json!({"server": r.server, "code": r.code}))
                .collect();
            videos.insert(track.key().to_string(), Value::Array(items));
        }
        format!(
            "<html><script>\nvar anime_id = 1;\nvar videos = {};\n</script></html>",
            Value::Object(videos)
        )
    }

    fn arbitrary_server() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("sw".to_string()),
            Just("streamwish".to_string()),
            Just("stape".to_string()),
            Just("okru".to_string()),
            Just("mega".to_string()),
            Just("yourupload".to_string()),
            Just("netu".to_string()),
            "[a-z]{1,8}",
        ]
    }

    fn arbitrary_record() -> impl Strategy<Value = LinkRecord> {
        (
            prop_oneof![Just(Track::Sub), Just(Track::Lat)],
            arbitrary_server(),
            proptest::option::of("[a-z0-9]{1,10}"),
        )
            .prop_map(|(track, server, code)| LinkRecord {
                track,
                server,
                title: None,
                code,
                url: None,
            })
    }

    proptest! {
        /// The best record is always one of the inputs, and none only for empty input
        #[test]
        fn property_pick_best_is_member(records in prop::collection::vec(arbitrary_record(), 0..12)) {
            match pick_best(&records) {
                Some(best) => prop_assert!(records.contains(best)),
                None => prop_assert!(records.is_empty()),
            }
        }

        /// A record hosted on "sw" always wins
        #[test]
        fn property_sw_ranks_first(
            mut records in prop::collection::vec(arbitrary_record(), 0..12),
            position in any::<prop::sample::Index>(),
            code in proptest::option::of("[a-z0-9]{1,10}"),
        ) {
            let sw = LinkRecord { track: Track::Sub, server: "sw".to_string(), title: None, code, url: None };
            let at = position.index(records.len() + 1);
            records.insert(at, sw);
            let best = pick_best(&records).unwrap();
            prop_assert_eq!(best.server.as_str(), "sw");
        }

        /// Ranking the same input twice gives the same order and keeps every record
        #[test]
        fn property_rank_is_deterministic(records in prop::collection::vec(arbitrary_record(), 0..12)) {
            let first = rank(records.clone());
            let second = rank(records.clone());
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), records.len());
        }

        /// Extracting and ranking the same markup twice gives the same links
        #[test]
        fn property_pipeline_is_deterministic(records in prop::collection::vec(arbitrary_record(), 0..12)) {
            let markup = episode_markup(&records);
            let extractor = RegexExtractor;

            let first = flatten_and_rank(&extractor.extract_links_blob(&markup).unwrap());
            let second = flatten_and_rank(&extractor.extract_links_blob(&markup).unwrap());
            prop_assert_eq!(&first, &second);

            let in_page_order: Vec<LinkRecord> = Track::ALL
                .iter()
                .flat_map(|track| records.iter().filter(move |r| r.track == *track).cloned())
                .collect();
            prop_assert_eq!(first, rank(in_page_order));
        }
    }
}
