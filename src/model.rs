use serde::Deserialize;
use std::cmp::Reverse;
use std::fmt;

/// One published asset as the feed reports it. Counters default to zero
/// because the API omits fields that have never been touched.
#[derive(Deserialize, Debug, Clone)]
pub struct Asset {
    pub uuid: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub favorites: u64,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub downloads: u64,
}

impl Asset {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    /// Title cut down to `max` characters for fixed-width listings.
    pub fn title_clipped(&self, max: usize) -> String {
        self.display_title().chars().take(max).collect()
    }
}

/// The slice of a single-asset lookup that the announce step cares about.
#[derive(Deserialize, Debug, Default)]
pub struct AssetDetails {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub favorites: u64,
    #[serde(default)]
    pub views: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    View,
    Favorite,
    Download,
}

impl Engagement {
    /// Statuses the service answers with when the event actually registered.
    /// Favorites come back as 201 on the first like and 200 on repeats.
    pub fn is_success(self, status: u16) -> bool {
        match self {
            Engagement::Favorite => status == 200 || status == 201,
            Engagement::View | Engagement::Download => status == 200,
        }
    }
}

impl fmt::Display for Engagement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Engagement::View => "view",
            Engagement::Favorite => "like",
            Engagement::Download => "download",
        };
        f.write_str(verb)
    }
}

/// The `top_n` assets with the most favorites, best first. Ties keep the
/// feed order.
pub fn top_by_favorites(assets: &[Asset], top_n: usize) -> Vec<Asset> {
    let mut ranked = assets.to_vec();
    ranked.sort_by_key(|asset| Reverse(asset.favorites));
    ranked.truncate(top_n);
    ranked
}

/// The `top_n` assets with the most views, best first.
pub fn top_by_views(assets: &[Asset], top_n: usize) -> Vec<Asset> {
    let mut ranked = assets.to_vec();
    ranked.sort_by_key(|asset| Reverse(asset.views));
    ranked.truncate(top_n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(uuid: &str, favorites: u64, views: u64) -> Asset {
        Asset {
            uuid: uuid.to_string(),
            title: Some(format!("Post {uuid}")),
            favorites,
            views,
            downloads: 0,
        }
    }

    #[test]
    fn ranking_sorts_by_favorites_descending() {
        let assets = vec![asset("a1", 2, 0), asset("b2", 9, 0), asset("c3", 5, 0)];
        let ranked = top_by_favorites(&assets, 2);
        let uuids: Vec<&str> = ranked.iter().map(|a| a.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["b2", "c3"]);
    }

    #[test]
    fn ranking_keeps_feed_order_on_ties() {
        let assets = vec![asset("a1", 3, 0), asset("b2", 3, 0), asset("c3", 3, 0)];
        let ranked = top_by_favorites(&assets, 3);
        let uuids: Vec<&str> = ranked.iter().map(|a| a.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["a1", "b2", "c3"]);
    }

    #[test]
    fn ranking_handles_short_input() {
        let assets = vec![asset("a1", 1, 7)];
        assert_eq!(top_by_favorites(&assets, 10).len(), 1);
        assert_eq!(top_by_views(&[], 10).len(), 0);
    }

    #[test]
    fn ranking_by_views_ignores_favorites() {
        let assets = vec![asset("a1", 9, 1), asset("b2", 0, 8)];
        let ranked = top_by_views(&assets, 1);
        assert_eq!(ranked[0].uuid, "b2");
    }

    #[test]
    fn favorite_accepts_created_and_ok() {
        assert!(Engagement::Favorite.is_success(200));
        assert!(Engagement::Favorite.is_success(201));
        assert!(!Engagement::Favorite.is_success(204));
        assert!(!Engagement::Favorite.is_success(403));
    }

    #[test]
    fn view_and_download_accept_only_ok() {
        assert!(Engagement::View.is_success(200));
        assert!(!Engagement::View.is_success(201));
        assert!(Engagement::Download.is_success(200));
        assert!(!Engagement::Download.is_success(500));
    }

    #[test]
    fn missing_title_falls_back() {
        let asset = Asset {
            uuid: "a1".to_string(),
            title: None,
            favorites: 0,
            views: 0,
            downloads: 0,
        };
        assert_eq!(asset.display_title(), "Untitled");
    }

    #[test]
    fn clipping_counts_characters_not_bytes() {
        let asset = Asset {
            uuid: "a1".to_string(),
            title: Some("héllo wörld".to_string()),
            favorites: 0,
            views: 0,
            downloads: 0,
        };
        assert_eq!(asset.title_clipped(5), "héllo");
        assert_eq!(asset.title_clipped(64), "héllo wörld");
    }

    #[test]
    fn counters_default_when_absent() {
        let asset: Asset = serde_json::from_str(r#"{"uuid": "ab12"}"#).unwrap();
        assert_eq!(asset.uuid, "ab12");
        assert!(asset.title.is_none());
        assert_eq!(asset.favorites, 0);
        assert_eq!(asset.views, 0);
        assert_eq!(asset.downloads, 0);
    }
}
