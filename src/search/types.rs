//! Search request and result types.

use serde::{Deserialize, Serialize};

/// A search request; only free-text search is recognized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SearchRequest {
    TextSearch {
        #[serde(default)]
        term: Option<String>,
    },
    #[serde(other)]
    Other,
}

impl SearchRequest {
    pub fn text(term: impl Into<String>) -> Self {
        SearchRequest::TextSearch {
            term: Some(term.into()),
        }
    }

    /// Parse a JSON body. Anything unrecognizable is `Other`, never an error.
    pub fn from_slice(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or(SearchRequest::Other)
    }
}

/// Reference to a resolved asset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssetRef {
    pub id: u64,
    pub label: String,
}

/// One search hit. Lower weight ranks first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub weight: u32,
    pub weight_text: String,
    pub asset: AssetRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shapes() {
        let text: SearchRequest =
            serde_json::from_str(r#"{"type":"text-search","term":"https://x.test/asset/42"}"#).unwrap();
        assert_eq!(text, SearchRequest::text("https://x.test/asset/42"));

        let other: SearchRequest = serde_json::from_str(r#"{"type":"geo-search"}"#).unwrap();
        assert_eq!(other, SearchRequest::Other);
    }

    #[test]
    fn test_incomplete_requests_parse_without_error() {
        assert_eq!(
            SearchRequest::from_slice(br#"{"type":"text-search"}"#),
            SearchRequest::TextSearch { term: None }
        );
        assert_eq!(
            SearchRequest::from_slice(br#"{"type":"text-search","term":null}"#),
            SearchRequest::TextSearch { term: None }
        );
        assert_eq!(
            SearchRequest::from_slice(br#"{"term":"https://x.test/asset/42"}"#),
            SearchRequest::Other
        );
        assert_eq!(SearchRequest::from_slice(b"not json"), SearchRequest::Other);
        assert_eq!(
            SearchRequest::from_slice(br#"{"type":"text-search","term":7}"#),
            SearchRequest::Other
        );
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = SearchResult {
            weight: 0,
            weight_text: "Asset with id=42".into(),
            asset: AssetRef { id: 42, label: "Tractor".into() },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["weightText"], "Asset with id=42");
        assert_eq!(json["asset"]["id"], 42);
    }
}
