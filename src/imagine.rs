use crate::model::{Asset, AssetDetails, Engagement};
use anyhow::{bail, Context};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const TIMEOUT_SEC: u64 = 10;

/// The v1 API the web app talks to.
pub const DEFAULT_API_BASE: &str = "https://imagine.vyro.ai/v1/";

/// Sent with every request. The API rejects calls that do not look like
/// they come from the web app, so this mirrors a desktop Chrome session.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("accept", "application/json, text/plain, */*"),
    (
        "accept-language",
        "en-GB,en-US;q=0.9,en;q=0.8,hi;q=0.7,gu;q=0.6",
    ),
    ("dnt", "1"),
    ("origin", "https://www.imagine.art"),
    ("priority", "u=1, i"),
    ("referer", "https://www.imagine.art/"),
    (
        "sec-ch-ua",
        "\"Chromium\";v=\"142\", \"Google Chrome\";v=\"142\", \"Not_A Brand\";v=\"99\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"macOS\""),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "cross-site"),
    (
        "user-agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36",
    ),
];

pub struct ImagineClient {
    client: Client,
    base: Url,
}

impl ImagineClient {
    pub fn new(token: &str, base: Url) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        for &(name, value) in BROWSER_HEADERS {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("Token is not a valid header value")?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(Self {
            client: Client::builder()
                .default_headers(headers)
                .timeout(Duration::from_secs(TIMEOUT_SEC))
                .build()?,
            base,
        })
    }

    /// Everything the account has published, up to `limit` entries.
    pub async fn published_assets(&self, username: &str, limit: u32) -> anyhow::Result<Vec<Asset>> {
        let url = self.base.join(&format!("user/{username}/published"))?;
        let response = self
            .client
            .get(url)
            .query(&[("limit", limit.to_string())])
            .send()
            .await?;
        let envelope = deserialize_response::<PublishedResponse>(response).await?;
        Ok(envelope.assets)
    }

    pub async fn asset_details(&self, asset_id: &str) -> anyhow::Result<AssetDetails> {
        let url = self.base.join(&format!("feed/asset/{asset_id}"))?;
        let response = self.client.get(url).send().await?;
        deserialize_response(response).await
    }

    /// Fire one engagement event. A non-success status is data here, not an
    /// error; the caller decides what counts.
    pub async fn record_engagement(
        &self,
        asset_id: &str,
        action: Engagement,
    ) -> anyhow::Result<EngagementReply> {
        let request = match action {
            Engagement::Favorite => {
                let url = self.base.join(&format!("assets/{asset_id}/favorite"))?;
                self.client.post(url)
            }
            Engagement::View => self.stats_request(asset_id, "viewed")?,
            Engagement::Download => self.stats_request(asset_id, "downloaded")?,
        };
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.context("Bad response text")?;
        Ok(EngagementReply { status, body })
    }

    /// The stats endpoint takes a multipart form with a single flag field,
    /// exactly as the web player submits it.
    fn stats_request(&self, asset_id: &str, field: &'static str) -> anyhow::Result<RequestBuilder> {
        let url = self.base.join(&format!("assets/{asset_id}/stats"))?;
        Ok(self.client.put(url).multipart(Form::new().text(field, "true")))
    }
}

/// Status and raw body of an engagement call.
pub struct EngagementReply {
    pub status: u16,
    pub body: String,
}

#[derive(Deserialize)]
struct PublishedResponse {
    #[serde(default)]
    assets: Vec<Asset>,
}

async fn deserialize_response<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
    let status = response.status();
    let text = response.text().await.context("Bad response text")?;
    if !status.is_success() {
        let code = status.as_u16();
        bail!(format!("Response was not successful: {code}\n{text}"))
    }
    match serde_json::from_str::<T>(&text) {
        Ok(instance) => Ok(instance),
        Err(e) => match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(json) => {
                let pretty = serde_json::to_string_pretty(&json).unwrap();
                bail!(format!("Unable to deserialize due to: {e}\nContents:\n{pretty}"))
            }
            Err(_) => bail!("Invalid JSON"),
        },
    }
}

/// `Url::join` treats a base without a trailing slash as a file and drops
/// the last segment, so normalize before parsing.
pub fn parse_api_base(input: &str) -> anyhow::Result<Url> {
    let normalized = if input.ends_with('/') {
        input.to_string()
    } else {
        format!("{input}/")
    };
    Url::parse(&normalized).with_context(|| format!("Invalid API base URL: {input}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> ImagineClient {
        let base = Url::parse(&server.url("/")).unwrap();
        ImagineClient::new("token123", base).unwrap()
    }

    #[tokio::test]
    async fn published_assets_sends_bearer_and_limit() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/user/someone/published")
                .query_param("limit", "5000")
                .header("authorization", "Bearer token123");
            then.status(200).json_body(json!({
                "assets": [
                    {"uuid": "aa11", "title": "First", "favorites": 3},
                    {"uuid": "bb22", "views": 17}
                ]
            }));
        });

        let assets = client_for(&server)
            .published_assets("someone", 5000)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].uuid, "aa11");
        assert_eq!(assets[0].favorites, 3);
        assert_eq!(assets[1].views, 17);
        assert_eq!(assets[1].favorites, 0);
    }

    #[tokio::test]
    async fn published_assets_tolerates_missing_envelope() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/user/someone/published");
            then.status(200).json_body(json!({}));
        });

        let assets = client_for(&server)
            .published_assets("someone", 10)
            .await
            .unwrap();
        assert!(assets.is_empty());
    }

    #[tokio::test]
    async fn published_assets_reports_error_status() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/user/someone/published");
            then.status(401).body("token expired");
        });

        let err = client_for(&server)
            .published_assets("someone", 10)
            .await
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("401"), "unexpected error: {message}");
        assert!(message.contains("token expired"));
    }

    #[tokio::test]
    async fn asset_details_parses_flat_document() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/feed/asset/abc123");
            then.status(200)
                .json_body(json!({"title": "Sunset", "favorites": 4, "views": 90}));
        });

        let details = client_for(&server).asset_details("abc123").await.unwrap();
        mock.assert();
        assert_eq!(details.title.as_deref(), Some("Sunset"));
        assert_eq!(details.favorites, 4);
        assert_eq!(details.views, 90);
    }

    #[tokio::test]
    async fn favorite_posts_to_the_favorite_endpoint() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/assets/abc123/favorite");
            then.status(201).body("{\"ok\":true}");
        });

        let reply = client_for(&server)
            .record_engagement("abc123", Engagement::Favorite)
            .await
            .unwrap();
        mock.assert();
        assert_eq!(reply.status, 201);
        assert!(reply.body.contains("ok"));
    }

    #[tokio::test]
    async fn stats_put_passes_failure_status_through() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT).path("/assets/abc123/stats");
            then.status(500).body("boom");
        });

        let reply = client_for(&server)
            .record_engagement("abc123", Engagement::View)
            .await
            .unwrap();
        mock.assert();
        assert_eq!(reply.status, 500);
        assert_eq!(reply.body, "boom");
    }

    #[test]
    fn api_base_gains_a_trailing_slash() {
        let base = parse_api_base("http://localhost:9999/v1").unwrap();
        assert_eq!(base.as_str(), "http://localhost:9999/v1/");
        let joined = base.join("user/me/published").unwrap();
        assert_eq!(joined.as_str(), "http://localhost:9999/v1/user/me/published");
    }

    #[test]
    fn api_base_rejects_garbage() {
        assert!(parse_api_base("not a url").is_err());
    }
}
