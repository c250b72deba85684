// YouTube Data API v3 client for playlist metadata collection
// Docs: https://developers.google.com/youtube/v3
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{PlaylistRef, ScrapeError, VideoMetadata};
use crate::utils::clean_description;

/// Hard ceiling the API puts on `videos.list` id batches and page sizes
pub const VIDEO_BATCH_SIZE: usize = 50;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Read-only catalog operations the collection pipeline depends on.
/// Implemented by [`YouTubeClient`] for production and by in-memory stubs in
/// pipeline tests.
#[async_trait]
pub trait PlaylistCatalog: Send + Sync {
    /// Resolve a channel handle (e.g. `@3blue1brown`) to a channel id.
    /// `Ok(None)` means the search returned no match - a terminal lookup
    /// failure for that handle, not a transport error.
    async fn resolve_channel_id(&self, handle: &str) -> Result<Option<String>, ScrapeError>;

    /// Display title for a channel id.
    async fn channel_title(&self, channel_id: &str) -> Result<String, ScrapeError>;

    /// All playlists of a channel, in server enumeration order.
    async fn list_playlists(&self, channel_id: &str) -> Result<Vec<PlaylistRef>, ScrapeError>;

    /// All video ids of a playlist, in playlist order.
    async fn list_playlist_video_ids(&self, playlist_id: &str)
        -> Result<Vec<String>, ScrapeError>;

    /// Metadata for a batch of video ids, keyed by id. Videos the API omits
    /// or marks non-public are absent from the map.
    async fn videos_metadata(
        &self,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoMetadata>, ScrapeError>;

    /// Look up a single playlist by id; `Ok(None)` when the id is unknown.
    async fn playlist_info(&self, playlist_id: &str) -> Result<Option<PlaylistRef>, ScrapeError>;
}

#[derive(Debug, Clone)]
pub struct YouTubeClient {
    client: Client,
    api_key: String,
}

// ============================================================================
// API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    #[serde(rename = "channelId")]
    channel_id: String,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    snippet: TitleSnippet,
}

#[derive(Debug, Deserialize)]
struct TitleSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistListResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    id: String,
    snippet: PlaylistSnippet,
}

#[derive(Debug, Deserialize)]
struct PlaylistSnippet {
    title: String,
    #[serde(rename = "channelTitle")]
    channel_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistVideoItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistVideoItem {
    #[serde(rename = "contentDetails")]
    content_details: VideoContentRef,
}

#[derive(Debug, Deserialize)]
struct VideoContentRef {
    #[serde(rename = "videoId")]
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    #[serde(rename = "contentDetails")]
    content_details: VideoContentDetails,
    status: Option<VideoStatus>,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct VideoContentDetails {
    #[serde(default)]
    duration: String,
}

#[derive(Debug, Deserialize)]
struct VideoStatus {
    #[serde(rename = "privacyStatus")]
    privacy_status: Option<String>,
}

// ============================================================================
// Client Implementation
// ============================================================================

impl YouTubeClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    /// Issue a GET against an API endpoint, appending the key, and decode the
    /// JSON body. Non-2xx responses surface the API's error text.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ScrapeError> {
        let url = format!("{}/{}", API_BASE, endpoint);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("YouTube API {} returned {}: {}", endpoint, status, error_text);
            return Err(ScrapeError::Api(format!("{} ({})", error_text, status)));
        }

        Ok(response.json().await?)
    }

    /// One `videos.list` request for at most [`VIDEO_BATCH_SIZE`] ids.
    async fn fetch_video_items(&self, chunk: Vec<String>) -> Result<Vec<VideoItem>, ScrapeError> {
        let joined = chunk.join(",");
        let response: VideoListResponse = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,contentDetails,status"),
                    ("id", joined.as_str()),
                ],
            )
            .await?;
        Ok(response.items)
    }

    /// Build a client from `YOUTUBE_API_KEY`. A missing or blank key is a
    /// startup error, not something to discover on the first request.
    pub fn from_env() -> Result<Self, ScrapeError> {
        match std::env::var("YOUTUBE_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(ScrapeError::MissingApiKey),
        }
    }
}

/// Fan video ids out into `videos.list` sized requests and merge the public
/// results. `fetch_batch` performs one request and never sees more than
/// [`VIDEO_BATCH_SIZE`] ids at a time.
async fn fetch_in_batches<F, Fut>(
    video_ids: &[String],
    mut fetch_batch: F,
) -> Result<HashMap<String, VideoMetadata>, ScrapeError>
where
    F: FnMut(Vec<String>) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<VideoItem>, ScrapeError>>,
{
    let mut meta = HashMap::new();
    for chunk in video_ids.chunks(VIDEO_BATCH_SIZE) {
        let items = fetch_batch(chunk.to_vec()).await?;
        meta.extend(collect_public(items));
    }
    Ok(meta)
}

#[async_trait]
impl PlaylistCatalog for YouTubeClient {
    async fn resolve_channel_id(&self, handle: &str) -> Result<Option<String>, ScrapeError> {
        let response: SearchListResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("type", "channel"),
                    ("maxResults", "1"),
                    ("q", handle),
                ],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .next()
            .map(|item| item.snippet.channel_id))
    }

    async fn channel_title(&self, channel_id: &str) -> Result<String, ScrapeError> {
        let response: ChannelListResponse = self
            .get_json("channels", &[("part", "snippet"), ("id", channel_id)])
            .await?;

        response
            .items
            .into_iter()
            .next()
            .map(|item| item.snippet.title)
            .ok_or_else(|| ScrapeError::Api(format!("channel {} has no snippet", channel_id)))
    }

    async fn list_playlists(&self, channel_id: &str) -> Result<Vec<PlaylistRef>, ScrapeError> {
        let page_size = VIDEO_BATCH_SIZE.to_string();
        let mut playlists = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("part", "id,snippet"),
                ("channelId", channel_id),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let response: PlaylistListResponse = self.get_json("playlists", &query).await?;
            playlists.extend(response.items.into_iter().map(|item| PlaylistRef {
                id: item.id,
                title: item.snippet.title,
                channel_title: item.snippet.channel_title,
            }));

            page_token = response.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        Ok(playlists)
    }

    async fn list_playlist_video_ids(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<String>, ScrapeError> {
        let page_size = VIDEO_BATCH_SIZE.to_string();
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("part", "contentDetails"),
                ("playlistId", playlist_id),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let response: PlaylistItemsResponse = self.get_json("playlistItems", &query).await?;
            ids.extend(
                response
                    .items
                    .into_iter()
                    .map(|item| item.content_details.video_id),
            );

            page_token = response.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        Ok(ids)
    }

    async fn videos_metadata(
        &self,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoMetadata>, ScrapeError> {
        fetch_in_batches(video_ids, |chunk| self.fetch_video_items(chunk)).await
    }

    async fn playlist_info(&self, playlist_id: &str) -> Result<Option<PlaylistRef>, ScrapeError> {
        let response: PlaylistListResponse = self
            .get_json("playlists", &[("part", "snippet"), ("id", playlist_id)])
            .await?;

        Ok(response.items.into_iter().next().map(|item| PlaylistRef {
            id: playlist_id.to_string(),
            title: item.snippet.title,
            channel_title: item.snippet.channel_title,
        }))
    }
}

/// Keep only public videos from a `videos.list` response, keyed by id.
/// Unavailable videos are represented by absence, not by a flag.
fn collect_public(items: Vec<VideoItem>) -> HashMap<String, VideoMetadata> {
    items
        .into_iter()
        .filter(|item| {
            item.status
                .as_ref()
                .and_then(|s| s.privacy_status.as_deref())
                == Some("public")
        })
        .map(|item| {
            (
                item.id,
                VideoMetadata {
                    title: item.snippet.title,
                    description: clean_description(&item.snippet.description),
                    duration: item.content_details.duration,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, privacy: Option<&str>) -> VideoItem {
        VideoItem {
            id: id.to_string(),
            snippet: VideoSnippet {
                title: format!("title-{}", id),
                description: "first line\nsecond line".to_string(),
            },
            content_details: VideoContentDetails {
                duration: "PT2M10S".to_string(),
            },
            status: privacy.map(|p| VideoStatus {
                privacy_status: Some(p.to_string()),
            }),
        }
    }

    #[test]
    fn test_collect_public_drops_non_public() {
        let meta = collect_public(vec![
            video("a", Some("public")),
            video("b", Some("private")),
            video("c", Some("unlisted")),
            video("d", None),
        ]);

        assert_eq!(meta.len(), 1);
        assert!(meta.contains_key("a"));
        assert!(!meta.contains_key("b"));
    }

    #[test]
    fn test_collect_public_cleans_description() {
        let meta = collect_public(vec![video("a", Some("public"))]);
        assert_eq!(meta["a"].description, "first line second line");
        assert_eq!(meta["a"].duration, "PT2M10S");
    }

    #[tokio::test]
    async fn test_metadata_fetch_batches_by_fifty() {
        // one request per 50-id chunk, every id covered exactly once
        for (n, expected_requests) in [(0usize, 0usize), (1, 1), (50, 1), (51, 2), (125, 3)] {
            let ids: Vec<String> = (0..n).map(|i| format!("v{}", i)).collect();
            let mut batch_sizes = Vec::new();

            let meta = fetch_in_batches(&ids, |chunk| {
                batch_sizes.push(chunk.len());
                async move {
                    Ok(chunk
                        .iter()
                        .map(|id| video(id, Some("public")))
                        .collect())
                }
            })
            .await
            .unwrap();

            assert_eq!(batch_sizes.len(), expected_requests);
            assert!(batch_sizes.iter().all(|len| *len <= VIDEO_BATCH_SIZE));
            assert_eq!(batch_sizes.iter().sum::<usize>(), n);
            assert_eq!(meta.len(), n);
        }
    }

    #[tokio::test]
    async fn test_batch_request_failure_stops_fetch() {
        let ids: Vec<String> = (0..60).map(|i| format!("v{}", i)).collect();
        let mut requests = 0;

        let result = fetch_in_batches(&ids, |_chunk| {
            requests += 1;
            async { Err(ScrapeError::Api("quota exceeded".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(ScrapeError::Api(_))));
        assert_eq!(requests, 1);
    }

    #[test]
    fn test_from_env_requires_api_key() {
        std::env::remove_var("YOUTUBE_API_KEY");
        assert!(matches!(
            YouTubeClient::from_env(),
            Err(ScrapeError::MissingApiKey)
        ));

        std::env::set_var("YOUTUBE_API_KEY", "test-key");
        assert!(YouTubeClient::from_env().is_ok());
        std::env::remove_var("YOUTUBE_API_KEY");
    }
}
