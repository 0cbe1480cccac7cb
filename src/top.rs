use crate::imagine::ImagineClient;
use crate::model::{top_by_favorites, Asset};
use crate::posts::PostsFile;
use crate::{AppOptions, TopArgs};

pub async fn run(opts: &AppOptions, args: &TopArgs) -> anyhow::Result<()> {
    let mut posts = PostsFile::load(&opts.file).await?;
    let token = posts.require_auth()?;
    let client = ImagineClient::new(&token, opts.api.clone())?;

    log::info!("Fetching published posts for {}", args.user);
    let assets = match client.published_assets(&args.user, args.limit).await {
        Ok(assets) => assets,
        Err(e) => {
            log::warn!("API error: {:#}", e);
            Vec::new()
        }
    };
    if assets.is_empty() {
        log::info!("No posts found for {}", args.user);
        return Ok(());
    }

    let ranked = top_by_favorites(&assets, args.count);
    print_ranked(&ranked);

    let ids: Vec<String> = ranked.iter().map(|asset| asset.uuid.clone()).collect();
    posts.replace_most_liked(&ids)?;
    posts.save().await?;
    log::info!(
        "Updated MOST_LIKED_POST_IDS with {} ids in {}",
        ids.len(),
        opts.file.display()
    );
    Ok(())
}

fn print_ranked(ranked: &[Asset]) {
    let rule = "-".repeat(80);
    println!("\nTop {} posts by likes", ranked.len());
    println!("{rule}");
    for (index, asset) in ranked.iter().enumerate() {
        println!(
            "{:2}. {:<40} | likes {:>5} | views {:>7}",
            index + 1,
            asset.title_clipped(40),
            asset.favorites,
            asset.views
        );
        println!("    uuid: {}", asset.uuid);
        println!("{rule}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use url::Url;

    #[tokio::test]
    async fn top_rewrites_the_ranked_block_best_first() {
        let server = MockServer::start_async().await;
        let feed = server.mock(|when, then| {
            when.method(GET)
                .path("/user/me/published")
                .query_param("limit", "3000");
            then.status(200).json_body(json!({
                "assets": [
                    {"uuid": "aaa111", "title": "low", "favorites": 1},
                    {"uuid": "bbb222", "title": "high", "favorites": 9},
                    {"uuid": "ccc333", "title": "mid", "favorites": 5}
                ]
            }));
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post_ids.txt");
        std::fs::write(
            &path,
            "AUTH_ID = \"tok\"\n\nPOST_IDS = [\n    \"aaa111\",\n]\n\nMOST_LIKED_POST_IDS = [\n    \"eee000\",\n]\n",
        )
        .unwrap();

        let opts = AppOptions {
            file: path.clone(),
            api: Url::parse(&server.url("/")).unwrap(),
        };
        let args = TopArgs {
            user: "me".to_string(),
            limit: 3000,
            count: 2,
        };
        run(&opts, &args).await.unwrap();

        feed.assert();
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains(
            "MOST_LIKED_POST_IDS = [\n    \"bbb222\",\n    \"ccc333\",\n]"
        ));
        // the append-only list is not touched
        assert!(saved.contains("POST_IDS = [\n    \"aaa111\",\n]"));
    }

    #[tokio::test]
    async fn top_keeps_the_stale_ranking_when_the_feed_is_empty() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/user/me/published");
            then.status(200).json_body(json!({"assets": []}));
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post_ids.txt");
        let before = "AUTH_ID = \"tok\"\n\nPOST_IDS = [\n]\n\nMOST_LIKED_POST_IDS = [\n    \"eee000\",\n]\n";
        std::fs::write(&path, before).unwrap();

        let opts = AppOptions {
            file: path.clone(),
            api: Url::parse(&server.url("/")).unwrap(),
        };
        let args = TopArgs {
            user: "me".to_string(),
            limit: 3000,
            count: 50,
        };
        run(&opts, &args).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }
}
