use anyhow::Context;
use regex::{NoExpand, Regex};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Whole `POST_IDS = [ ... ]` assignment, anchored to a line start so it
/// cannot match inside `MOST_LIKED_POST_IDS`.
const POST_IDS_BLOCK: &str = r"(?m)^POST_IDS\s*=\s*\[([\s\S]*?)\]";
const MOST_LIKED_BLOCK: &str = r"(?m)^MOST_LIKED_POST_IDS\s*=\s*\[([\s\S]*?)\]";
const AUTH_LINE: &str = r#"(?m)^AUTH_ID\s*=\s*"([^"]*)""#;
/// Ids are UUID-shaped; anything else inside a block is ignored.
const ID_LITERAL: &str = r#""([a-f0-9\-]+)""#;

const TEMPLATE: &str = r#"# Asset ids tracked by imagine-boost.
#
# AUTH_ID is the bearer token the web app uses. It expires server-side and
# has to be pasted in again by hand. POST_IDS only ever grows, via `sync`;
# MOST_LIKED_POST_IDS is rewritten wholesale by `top`.

AUTH_ID = ""

POST_IDS = [
]

MOST_LIKED_POST_IDS = [
]
"#;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No POST_IDS block in {}", .0.display())]
    MissingPostIds(PathBuf),
    #[error("No MOST_LIKED_POST_IDS block in {}", .0.display())]
    MissingMostLiked(PathBuf),
    #[error("AUTH_ID is empty in {}, paste a fresh bearer token first", .0.display())]
    MissingAuth(PathBuf),
}

pub struct AppendOutcome {
    /// Ids that were not tracked before, in the order they were appended.
    pub added: Vec<String>,
    /// List length after the append.
    pub total: usize,
}

/// The id file, held in memory between `load` and `save`. Edits splice the
/// matching block and leave every other byte alone, so hand-written comments
/// survive round trips.
#[derive(Debug)]
pub struct PostsFile {
    path: PathBuf,
    content: String,
}

impl PostsFile {
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Unable to read post ids file: {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    pub async fn save(&self) -> anyhow::Result<()> {
        fs::write(&self.path, &self.content)
            .await
            .with_context(|| format!("Unable to write post ids file: {}", self.path.display()))
    }

    /// The bearer token, rejecting a missing or empty `AUTH_ID` line.
    pub fn require_auth(&self) -> Result<String, StoreError> {
        Regex::new(AUTH_LINE)
            .unwrap()
            .captures(&self.content)
            .map(|caps| caps[1].to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| StoreError::MissingAuth(self.path.clone()))
    }

    pub fn post_ids(&self) -> Vec<String> {
        block_ids(&self.content, POST_IDS_BLOCK)
    }

    pub fn most_liked_ids(&self) -> Vec<String> {
        block_ids(&self.content, MOST_LIKED_BLOCK)
    }

    /// Append the candidates that are not tracked yet, keeping existing
    /// entries in their current order. No new ids leaves the content
    /// byte-identical.
    pub fn append_post_ids(&mut self, candidates: &[String]) -> Result<AppendOutcome, StoreError> {
        let block_re = Regex::new(POST_IDS_BLOCK).unwrap();
        if !block_re.is_match(&self.content) {
            return Err(StoreError::MissingPostIds(self.path.clone()));
        }

        let mut ids = self.post_ids();
        let mut seen: HashSet<String> = ids.iter().cloned().collect();
        let mut added = Vec::new();
        for candidate in candidates {
            if seen.insert(candidate.clone()) {
                ids.push(candidate.clone());
                added.push(candidate.clone());
            }
        }
        if added.is_empty() {
            return Ok(AppendOutcome {
                added,
                total: ids.len(),
            });
        }

        let block = render_id_block("POST_IDS", &ids);
        self.content = block_re
            .replace(&self.content, NoExpand(&block))
            .into_owned();
        Ok(AppendOutcome {
            added,
            total: ids.len(),
        })
    }

    /// Replace the ranked list wholesale.
    pub fn replace_most_liked(&mut self, ids: &[String]) -> Result<(), StoreError> {
        let block_re = Regex::new(MOST_LIKED_BLOCK).unwrap();
        if !block_re.is_match(&self.content) {
            return Err(StoreError::MissingMostLiked(self.path.clone()));
        }
        let block = render_id_block("MOST_LIKED_POST_IDS", ids);
        self.content = block_re
            .replace(&self.content, NoExpand(&block))
            .into_owned();
        Ok(())
    }
}

/// Write a fresh template store. Refuses to clobber an existing file.
pub async fn init(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists, refusing to overwrite", path.display());
    }
    fs::write(path, TEMPLATE)
        .await
        .with_context(|| format!("Unable to write post ids file: {}", path.display()))?;
    log::info!("Wrote template post ids file to {}", path.display());
    Ok(())
}

fn block_ids(content: &str, block_pattern: &str) -> Vec<String> {
    let block_re = Regex::new(block_pattern).unwrap();
    let id_re = Regex::new(ID_LITERAL).unwrap();
    match block_re.captures(content) {
        Some(caps) => id_re
            .captures_iter(&caps[1])
            .map(|id| id[1].to_string())
            .collect(),
        None => Vec::new(),
    }
}

fn render_id_block(name: &str, ids: &[String]) -> String {
    let mut block = format!("{name} = [\n");
    for id in ids {
        block.push_str("    \"");
        block.push_str(id);
        block.push_str("\",\n");
    }
    block.push(']');
    block
}
