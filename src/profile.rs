use crate::imagine::ImagineClient;
use crate::model::{top_by_favorites, top_by_views, Asset};
use crate::posts::PostsFile;
use crate::{AppOptions, ProfileArgs};
use anyhow::{bail, Context};
use std::io::{self, Write};

pub async fn run(opts: &AppOptions, args: &ProfileArgs) -> anyhow::Result<()> {
    let input = match &args.username {
        Some(username) => username.clone(),
        None => prompt("Enter profile link or username: ")?,
    };
    let username = match extract_username(&input) {
        Some(username) => username,
        None => bail!("No username provided"),
    };

    let posts = PostsFile::load(&opts.file).await?;
    let token = posts.require_auth()?;
    let client = ImagineClient::new(&token, opts.api.clone())?;

    log::info!("Fetching posts for @{username}");
    let assets = match client.published_assets(&username, args.limit).await {
        Ok(assets) => assets,
        Err(e) => {
            log::warn!("API error: {:#}", e);
            Vec::new()
        }
    };
    if assets.is_empty() {
        println!("No posts found for @{username}");
        println!("Check the username and make sure the profile is public.");
        return Ok(());
    }

    print_profile(&username, &assets, args.count);
    Ok(())
}

fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{message}");
    io::stdout().flush().context("Unable to flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Unable to read stdin")?;
    Ok(line)
}

/// Accepts a bare name, an `@name`, or a full profile URL. In a URL the
/// first `@` segment wins; otherwise the last segment without a dot does.
fn extract_username(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut username = trimmed.to_string();
    if trimmed.contains("imagine.art") {
        for part in trimmed.split('/') {
            if let Some(stripped) = part.strip_prefix('@') {
                username = stripped.to_string();
                break;
            }
            if !part.is_empty() && !part.starts_with("http") && !part.contains('.') {
                username = part.to_string();
            }
        }
    }
    Some(username.trim_start_matches('@').to_string())
}

fn print_profile(username: &str, assets: &[Asset], top_n: usize) {
    let rule = "=".repeat(100);
    let total_favorites: u64 = assets.iter().map(|a| a.favorites).sum();
    let total_views: u64 = assets.iter().map(|a| a.views).sum();
    let total_downloads: u64 = assets.iter().map(|a| a.downloads).sum();

    println!("\n{rule}");
    println!("Profile stats for @{username}");
    println!("{rule}");
    println!();
    println!("Summary");
    println!("   total posts     : {}", group_thousands(assets.len() as u64));
    println!("   total likes     : {}", group_thousands(total_favorites));
    println!("   total views     : {}", group_thousands(total_views));
    println!("   total downloads : {}", group_thousands(total_downloads));

    print_ranking(
        &format!("Top {top_n} most liked posts"),
        &top_by_favorites(assets, top_n),
        ("Likes", |a: &Asset| a.favorites),
        ("Views", |a: &Asset| a.views),
    );
    print_ranking(
        &format!("Top {top_n} most viewed posts"),
        &top_by_views(assets, top_n),
        ("Views", |a: &Asset| a.views),
        ("Likes", |a: &Asset| a.favorites),
    );
    println!("\n{rule}\n");
}

fn print_ranking(
    heading: &str,
    ranked: &[Asset],
    primary: (&str, fn(&Asset) -> u64),
    secondary: (&str, fn(&Asset) -> u64),
) {
    let rule = "=".repeat(100);
    let dashes = "-".repeat(100);
    println!("\n{rule}");
    println!("{heading}");
    println!("{rule}");
    println!("{:<4} {:<50} {:<15} {:<15}", "#", "Title", primary.0, secondary.0);
    println!("{dashes}");
    for (index, asset) in ranked.iter().enumerate() {
        println!(
            "{:<4} {:<50} {:<15} {:<15}",
            index + 1,
            asset.title_clipped(48),
            group_thousands(primary.1(asset)),
            group_thousands(secondary.1(asset)),
        );
    }
    println!("{dashes}");
}

/// 1234567 -> "1,234,567".
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
