use crate::imagine::ImagineClient;
use crate::model::Asset;
use crate::posts::PostsFile;
use crate::{AppOptions, SyncArgs};
use std::collections::HashSet;

pub async fn run(opts: &AppOptions, args: &SyncArgs) -> anyhow::Result<()> {
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

    let harvested = dedup_ids(&assets);
    log::info!(
        "Found {} unique ids across {} posts",
        harvested.len(),
        assets.len()
    );

    let outcome = posts.append_post_ids(&harvested)?;
    if outcome.added.is_empty() {
        log::info!("No new ids, {} already tracked", outcome.total);
        return Ok(());
    }
    for (index, id) in outcome.added.iter().enumerate() {
        log::info!("  {}. {}", index + 1, id);
    }
    posts.save().await?;
    log::info!(
        "Added {} new ids, {} now tracked in {}",
        outcome.added.len(),
        outcome.total,
        opts.file.display()
    );
    Ok(())
}

/// First occurrence wins; the feed repeats an asset when it sits in several
/// collections.
fn dedup_ids(assets: &[Asset]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for asset in assets {
        if seen.insert(asset.uuid.clone()) {
            ids.push(asset.uuid.clone());
        }
    }
    ids
}
