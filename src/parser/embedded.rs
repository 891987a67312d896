//! Extraction of inline script variables from episode and series pages
//!
//! The upstream pages declare their data as `var videos = {...};`,
//! `var anime_id = 123;` and so on. Matching is done on the raw text; the
//! [`EmbeddedDataExtractor`] trait keeps callers independent of that choice.

use serde_json::{Map, Value};
use tracing::debug;

use super::{static_regex, ExtractionError};

static_regex!(VIDEOS_REGEX, r"(?is)\b(?:var|let|const)\s+videos\s*=\s*(\{.*?\});");
static_regex!(ANIME_ID_REGEX, r"(?i)\b(?:var|let|const)\s+anime_id\s*=\s*(\d+)\s*;");
static_regex!(EPISODE_ID_REGEX, r"(?i)\b(?:var|let|const)\s+episode_id\s*=\s*(\d+)\s*;");
static_regex!(EPISODE_NUMBER_REGEX, r"(?i)\b(?:var|let|const)\s+episode_number\s*=\s*(\d+)\s*;");
static_regex!(EPISODES_REGEX, r"(?is)\b(?:var|let|const)\s+episodes\s*=\s*(\[.*?\]);");

/// Numeric identifiers declared on an episode page
///
/// Each one is independent; a page missing some of them still yields the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScalarIds {
    pub anime_id: Option<String>,
    pub episode_id: Option<String>,
    pub episode_number: Option<String>,
}

/// Pulls embedded structured data out of page markup
pub trait EmbeddedDataExtractor: Send + Sync {
    /// Locate and decode the `videos` object
    fn extract_links_blob(&self, markup: &str) -> Result<Map<String, Value>, ExtractionError>;

    /// Locate the scalar identifiers, each optional
    fn extract_scalar_ids(&self, markup: &str) -> ScalarIds;

    /// Episode numbers declared by a series page, in page order
    fn extract_episode_numbers(&self, markup: &str) -> Result<Vec<u32>, ExtractionError>;
}

/// Regular-expression based extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexExtractor;

impl EmbeddedDataExtractor for RegexExtractor {
    fn extract_links_blob(&self, markup: &str) -> Result<Map<String, Value>, ExtractionError> {
        let raw = VIDEOS_REGEX
            .captures(markup)
            .and_then(|caps| caps.get(1))
            .ok_or(ExtractionError::BlockMissing("videos"))?;

        match parse_block("videos", raw.as_str())? {
            Value::Object(map) => Ok(map),
            other => Err(ExtractionError::Unparsable {
                name: "videos",
                reason: format!("expected an object, found {}", json_kind(&other)),
            }),
        }
    }

    fn extract_scalar_ids(&self, markup: &str) -> ScalarIds {
        let find = |re: &regex::Regex| {
            re.captures(markup)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        };

        ScalarIds {
            anime_id: find(&ANIME_ID_REGEX),
            episode_id: find(&EPISODE_ID_REGEX),
            episode_number: find(&EPISODE_NUMBER_REGEX),
        }
    }

    fn extract_episode_numbers(&self, markup: &str) -> Result<Vec<u32>, ExtractionError> {
        let raw = EPISODES_REGEX
            .captures(markup)
            .and_then(|caps| caps.get(1))
            .ok_or(ExtractionError::BlockMissing("episodes"))?;

        let rows = match parse_block("episodes", raw.as_str())? {
            Value::Array(rows) => rows,
            other => {
                return Err(ExtractionError::Unparsable {
                    name: "episodes",
                    reason: format!("expected an array, found {}", json_kind(&other)),
                })
            }
        };

        // Each row is `[number, internal_id]`
        Ok(rows
            .iter()
            .filter_map(|row| row.get(0))
            .filter_map(Value::as_u64)
            .filter_map(|n| u32::try_from(n).ok())
            .collect())
    }
}

/// Entity-decode a captured literal and parse it, retrying once with line breaks flattened
fn parse_block(name: &'static str, raw: &str) -> Result<Value, ExtractionError> {
    let decoded = html_escape::decode_html_entities(raw);

    match serde_json::from_str(&decoded) {
        Ok(value) => Ok(value),
        Err(first) => {
            debug!("Strict parse of '{}' failed ({}), retrying without line breaks", name, first);
            let cleaned = decoded.replace(['\n', '\r'], " ");
            serde_json::from_str(&cleaned).map_err(|e| ExtractionError::Unparsable {
                name,
                reason: e.to_string(),
            })
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPISODE_PAGE: &str = r#"
    <html><head></head><body>
    <script type="text/javascript">
        var anime_id = 3901;
        var episode_id = 78121;
        var episode_number = 12;
        var videos = {"SUB":[{"server":"sw","title":"SW","ads":0,"allow_mobile":true,"code":"https:\/\/streamwish.to\/e\/abc"}],"LAT":[]};
        $(document).ready(function(){});
    </script>
    </body></html>
    "#;

    #[test]
    fn test_extract_links_blob() {
        let blob = RegexExtractor.extract_links_blob(EPISODE_PAGE).unwrap();
        let sub = blob.get("SUB").and_then(Value::as_array).unwrap();
        assert_eq!(sub.len(), 1);
        assert_eq!(sub[0]["server"], "sw");
        assert_eq!(sub[0]["code"], "https://streamwish.to/e/abc");
        assert!(blob.get("LAT").unwrap().as_array().unwrap().is_empty());
    }

    #[test]
    fn test_extract_links_blob_is_case_insensitive() {
        let html = r#"<script>VAR Videos = {"SUB":[]};</script>"#;
        assert!(RegexExtractor.extract_links_blob(html).is_ok());
    }

    #[test]
    fn test_extract_links_blob_accepts_let_and_const() {
        let html = r#"<script>const videos = {"LAT":[{"server":"mega"}]};</script>"#;
        let blob = RegexExtractor.extract_links_blob(html).unwrap();
        assert!(blob.contains_key("LAT"));

        let html = r#"<script>let videos={"SUB":[]};</script>"#;
        assert!(RegexExtractor.extract_links_blob(html).is_ok());
    }

    #[test]
    fn test_extract_links_blob_decodes_entities() {
        let html = r#"<script>var videos = {&quot;SUB&quot;:[{&quot;server&quot;:&quot;okru&quot;}]};</script>"#;
        let blob = RegexExtractor.extract_links_blob(html).unwrap();
        assert_eq!(blob["SUB"][0]["server"], "okru");
    }

    #[test]
    fn test_extract_links_blob_spans_lines() {
        let html = "<script>var videos = {\n  \"SUB\": [\n    {\"server\": \"mega\"}\n  ]\n};</script>";
        let blob = RegexExtractor.extract_links_blob(html).unwrap();
        assert_eq!(blob["SUB"][0]["server"], "mega");
    }

    #[test]
    fn test_extract_links_blob_recovers_from_raw_newlines_in_strings() {
        let html = "<script>var videos = {\"SUB\":[{\"server\":\"sw\",\"title\":\"Stream\nWish\"}]};</script>";
        let blob = RegexExtractor.extract_links_blob(html).unwrap();
        assert_eq!(blob["SUB"][0]["title"], "Stream Wish");
    }

    #[test]
    fn test_extract_links_blob_missing() {
        let err = RegexExtractor
            .extract_links_blob("<html><body>nothing here</body></html>")
            .unwrap_err();
        assert_eq!(err, ExtractionError::BlockMissing("videos"));
    }

    #[test]
    fn test_extract_links_blob_unparsable() {
        let err = RegexExtractor
            .extract_links_blob("<script>var videos = {SUB: [broken};</script>")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Unparsable { name: "videos", .. }));
    }

    #[test]
    fn test_extract_scalar_ids() {
        let ids = RegexExtractor.extract_scalar_ids(EPISODE_PAGE);
        assert_eq!(
            ids,
            ScalarIds {
                anime_id: Some("3901".to_string()),
                episode_id: Some("78121".to_string()),
                episode_number: Some("12".to_string()),
            }
        );
    }

    #[test]
    fn test_extract_scalar_ids_partial() {
        let ids = RegexExtractor.extract_scalar_ids("<script>var episode_number = 4;</script>");
        assert_eq!(ids.anime_id, None);
        assert_eq!(ids.episode_id, None);
        assert_eq!(ids.episode_number, Some("4".to_string()));
    }

    #[test]
    fn test_extract_scalar_ids_ignores_non_numeric() {
        let ids = RegexExtractor.extract_scalar_ids("<script>var anime_id = \"abc\";</script>");
        assert_eq!(ids, ScalarIds::default());
    }

    #[test]
    fn test_extract_episode_numbers() {
        let html = r#"<script>var anime_info = ["3901","Naruto","naruto"];
        var episodes = [[3,78123],[2,78122],[1,78121]];</script>"#;
        let numbers = RegexExtractor.extract_episode_numbers(html).unwrap();
        assert_eq!(numbers, vec![3, 2, 1]);
    }

    #[test]
    fn test_extract_episode_numbers_empty_list() {
        let html = "<script>var episodes = [];</script>";
        assert!(RegexExtractor.extract_episode_numbers(html).unwrap().is_empty());
    }

    #[test]
    fn test_extract_episode_numbers_missing() {
        let err = RegexExtractor.extract_episode_numbers("<html></html>").unwrap_err();
        assert_eq!(err, ExtractionError::BlockMissing("episodes"));
    }
}
