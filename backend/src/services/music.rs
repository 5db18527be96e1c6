//! NetEase Cloud Music search
//!
//! Talks to a self-hosted NeteaseCloudMusicApi instance
//! (<https://github.com/Binaryify/NeteaseCloudMusicApi>). Every failure maps
//! to `None`: the music feature is skipped rather than reported.

use fitbot_shared::{MusicKind, Segment};
use serde::Deserialize;
use tracing::debug;

/// `GET /search` response body
#[derive(Debug, Deserialize)]
struct SearchResponse {
    code: i64,
    #[serde(default)]
    result: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    songs: Option<Vec<Song>>,
}

#[derive(Debug, Deserialize)]
struct Song {
    id: i64,
}

/// Music search client
#[derive(Clone)]
pub struct MusicClient {
    http: reqwest::Client,
    base_url: String,
}

impl MusicClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Look up `keywords` and return a music segment for the first hit
    pub async fn search(&self, keywords: &str) -> Option<Segment> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return None;
        }

        let url = format!("{}/search", self.base_url);
        let response = match self
            .http
            .get(&url)
            .query(&[("keywords", keywords)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Music search request failed");
                return None;
            }
        };

        let body: SearchResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "Music search returned an unexpected body");
                return None;
            }
        };

        if body.code != 200 {
            debug!(code = body.code, "Music search returned an error code");
            return None;
        }

        let song = body.result?.songs?.into_iter().next()?;
        Some(Segment::Music {
            kind: MusicKind::NetEase,
            id: song.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> MusicClient {
        MusicClient::new(reqwest::Client::new(), server.uri())
    }

    #[tokio::test]
    async fn test_search_returns_first_song() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("keywords", "晴天"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "result": {"songs": [{"id": 186016, "name": "晴天"}, {"id": 1}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let segment = client_for(&server).await.search("晴天").await;
        assert_eq!(
            segment,
            Some(Segment::Music {
                kind: MusicKind::NetEase,
                id: 186016
            })
        );
    }

    #[tokio::test]
    async fn test_search_empty_songs_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"code": 200, "result": {"songs": []}})),
            )
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).await.search("nothing").await, None);
    }

    #[tokio::test]
    async fn test_search_error_code_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 400})))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).await.search("晴天").await, None);
    }

    #[tokio::test]
    async fn test_search_missing_fields_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 200, "result": {}})),
            )
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).await.search("晴天").await, None);
    }

    #[tokio::test]
    async fn test_search_non_json_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).await.search("晴天").await, None);
    }

    #[tokio::test]
    async fn test_search_network_error_is_absent() {
        // Nothing listens on port 1
        let client = MusicClient::new(reqwest::Client::new(), "http://127.0.0.1:1");
        assert_eq!(client.search("晴天").await, None);
    }

    #[tokio::test]
    async fn test_search_empty_keywords_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).await.search("  ").await, None);
    }
}
