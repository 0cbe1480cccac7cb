use crate::imagine::ImagineClient;
use crate::model::Engagement;
use crate::posts::PostsFile;
use crate::{AppOptions, DownloadArgs, LikeArgs, LikeTopArgs};
use anyhow::bail;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::time::Duration;

/// Seconds to idle between calls, sampled uniformly per iteration.
#[derive(Debug, Clone, Copy)]
pub struct Pace {
    min_secs: f64,
    max_secs: f64,
}

impl Pace {
    pub const fn between(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    fn pick(self, rng: &mut impl Rng) -> Option<Duration> {
        if self.max_secs <= 0.0 {
            return None;
        }
        if self.max_secs <= self.min_secs {
            return Some(Duration::from_secs_f64(self.min_secs));
        }
        Some(Duration::from_secs_f64(
            rng.random_range(self.min_secs..self.max_secs),
        ))
    }
}

/// Windows the web client was observed using for each action.
fn pace_for(action: Engagement) -> Pace {
    match action {
        Engagement::View => Pace::between(4.0, 5.0),
        Engagement::Favorite => Pace::between(1.0, 6.0),
        Engagement::Download => Pace::between(2.0, 5.0),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Register a view on every tracked post, in file order.
pub async fn views(opts: &AppOptions) -> anyhow::Result<()> {
    let posts = PostsFile::load(&opts.file).await?;
    let token = posts.require_auth()?;
    let ids = posts.post_ids();
    let client = ImagineClient::new(&token, opts.api.clone())?;

    log::info!("Registering a view on {} posts", ids.len());
    let report = run(
        &client,
        &ids,
        Engagement::View,
        false,
        pace_for(Engagement::View),
    )
    .await;
    summarize("view", &report);
    Ok(())
}

/// Favorite a random selection of the tracked posts.
pub async fn like(opts: &AppOptions, args: &LikeArgs) -> anyhow::Result<()> {
    let posts = PostsFile::load(&opts.file).await?;
    let token = posts.require_auth()?;
    let ids = posts.post_ids();
    if ids.is_empty() {
        bail!("POST_IDS is empty, run `imagine-boost sync` first");
    }

    let picked = sample(&ids, args.count);
    let client = ImagineClient::new(&token, opts.api.clone())?;
    log::info!("Liking {} of {} tracked posts", picked.len(), ids.len());
    let report = run(
        &client,
        &picked,
        Engagement::Favorite,
        true,
        pace_for(Engagement::Favorite),
    )
    .await;
    summarize("like", &report);
    Ok(())
}

/// Favorite the head of the ranked list, in ranked order.
pub async fn like_top(opts: &AppOptions, args: &LikeTopArgs) -> anyhow::Result<()> {
    let posts = PostsFile::load(&opts.file).await?;
    let token = posts.require_auth()?;
    let ids = posts.most_liked_ids();
    if ids.is_empty() {
        bail!("MOST_LIKED_POST_IDS is empty, run `imagine-boost top` first");
    }

    let picked: Vec<String> = ids.iter().take(args.count).cloned().collect();
    let client = ImagineClient::new(&token, opts.api.clone())?;
    log::info!("Liking the top {} of {} ranked posts", picked.len(), ids.len());
    let report = run(
        &client,
        &picked,
        Engagement::Favorite,
        false,
        pace_for(Engagement::Favorite),
    )
    .await;
    summarize("like", &report);
    Ok(())
}

/// Register a download on a random selection of the tracked posts.
pub async fn download(opts: &AppOptions, args: &DownloadArgs) -> anyhow::Result<()> {
    let posts = PostsFile::load(&opts.file).await?;
    let token = posts.require_auth()?;
    let ids = posts.post_ids();
    if args.count > ids.len() {
        log::warn!("Only {} posts tracked, using all of them", ids.len());
    }

    let picked = sample(&ids, args.count);
    let client = ImagineClient::new(&token, opts.api.clone())?;
    log::info!(
        "Registering downloads on {} of {} tracked posts",
        picked.len(),
        ids.len()
    );
    let report = run(
        &client,
        &picked,
        Engagement::Download,
        false,
        pace_for(Engagement::Download),
    )
    .await;
    summarize("download", &report);
    Ok(())
}

/// One call per id, strictly sequential, with a random idle between
/// iterations but not after the last. Failures are counted and logged,
/// never fatal.
async fn run(
    client: &ImagineClient,
    ids: &[String],
    action: Engagement,
    announce: bool,
    pace: Pace,
) -> RunReport {
    let mut report = RunReport::default();
    let total = ids.len();
    for (index, id) in ids.iter().enumerate() {
        if announce {
            let (title, favorites, views) = match client.asset_details(id).await {
                Ok(details) => (
                    details.title.unwrap_or_else(|| "Untitled".to_string()),
                    details.favorites,
                    details.views,
                ),
                Err(_) => ("Unknown".to_string(), 0, 0),
            };
            log::info!(
                "{}/{}: '{}' ({} likes, {} views)",
                index + 1,
                total,
                title,
                favorites,
                views
            );
        }
        log::info!("{}/{}: sending {} for {}", index + 1, total, action, id);
        match client.record_engagement(id, action).await {
            Ok(reply) if action.is_success(reply.status) => {
                log::info!("   ok ({})", reply.status);
                report.succeeded += 1;
            }
            Ok(reply) => {
                log::warn!(
                    "   failed with status {}: {}",
                    reply.status,
                    clip(&reply.body, 200)
                );
                report.failed += 1;
            }
            Err(e) => {
                log::warn!("   request error: {:#}", e);
                report.failed += 1;
            }
        }
        if index + 1 < total {
            // the temporary rng must drop before the sleep await to keep
            // the future Send
            let delay = pace.pick(&mut rand::rng());
            if let Some(delay) = delay {
                log::debug!("   waiting {:.2}s", delay.as_secs_f64());
                tokio::time::sleep(delay).await;
            }
        }
    }
    report
}

fn sample(ids: &[String], count: usize) -> Vec<String> {
    let mut rng = rand::rng();
    ids.choose_multiple(&mut rng, count.min(ids.len()))
        .cloned()
        .collect()
}

/// At most `max` characters, without splitting a code point.
fn clip(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

fn summarize(label: &str, report: &RunReport) {
    println!("--------------------------------------");
    println!("{label} summary");
    println!("   successful requests : {}", report.succeeded);
    println!("   failed requests     : {}", report.failed);
    println!("--------------------------------------");
}
