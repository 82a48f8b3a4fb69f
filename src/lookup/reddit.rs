//! Reddit search adapter.
//!
//! Uses the application-only OAuth flow: one token per run, requested the
//! first time a Reddit tool is called.

use crate::config::EndpointSettings;
use crate::conversation::ToolOutput;
use crate::error::{DelveError, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

/// Posts returned per subreddit search.
const POST_LIMIT: &str = "5";
/// Comments kept per post.
const COMMENT_LIMIT: usize = 8;
/// Characters kept per comment body.
const COMMENT_MAX_CHARS: usize = 1800;

const MISSING_CREDENTIALS_MESSAGE: &str = "Reddit search is unavailable. Please provide REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET to get real results.";
const NO_SUBREDDIT_MESSAGE: &str = "No subreddit found for the query.";
const EMPTY_SUBREDDIT_MESSAGE: &str =
    "Invalid subreddit name. Please provide a subreddit name such as 'rust'.";

/// A processed post handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedditPost {
    pub title: String,
    pub url: String,
    pub score: i64,
    pub selftext: String,
    pub comments: Vec<Comment>,
}

/// A comment body with its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub body: String,
    pub score: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
struct ListingData<T> {
    #[serde(default = "Vec::new")]
    children: Vec<Thing<T>>,
}

#[derive(Debug, Deserialize)]
struct Thing<T> {
    kind: String,
    data: T,
}

#[derive(Debug, Deserialize)]
struct SubredditData {
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    score: i64,
}

#[derive(Debug, Default, Deserialize)]
struct CommentData {
    #[serde(default)]
    body: String,
    #[serde(default)]
    score: i64,
    /// Either an empty string or a nested listing.
    #[serde(default)]
    replies: serde_json::Value,
}

/// Subreddit lookup and post search through the Reddit API.
pub struct RedditSearch {
    client: reqwest::Client,
    auth_url: String,
    api_base: String,
    credentials: Option<(String, String)>,
    token: OnceCell<String>,
}

impl RedditSearch {
    pub fn new(
        client: reqwest::Client,
        endpoints: &EndpointSettings,
        credentials: Option<(String, String)>,
    ) -> Self {
        Self {
            client,
            auth_url: endpoints.reddit_auth.clone(),
            api_base: endpoints.reddit_api.trim_end_matches('/').to_string(),
            credentials,
            token: OnceCell::new(),
        }
    }

    /// Return the name of the first subreddit matching `query`.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn find_subreddit(&self, query: &str) -> Result<String> {
        if self.credentials.is_none() {
            return Ok(MISSING_CREDENTIALS_MESSAGE.to_string());
        }

        let listing: Listing<SubredditData> = self
            .get("/subreddits/search", &[("q", query), ("limit", "1")])
            .await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .next()
            .map(|thing| thing.data.display_name)
            .unwrap_or_else(|| NO_SUBREDDIT_MESSAGE.to_string()))
    }

    /// Search a subreddit and return text posts with their top comments.
    #[instrument(skip(self), fields(subreddit = %subreddit, query = %query))]
    pub async fn search_posts(&self, subreddit: &str, query: &str) -> Result<ToolOutput> {
        if self.credentials.is_none() {
            return Ok(MISSING_CREDENTIALS_MESSAGE.into());
        }

        let subreddit = normalize_subreddit(subreddit);
        if !is_valid_subreddit(subreddit) {
            return Ok(EMPTY_SUBREDDIT_MESSAGE.into());
        }

        let listing: Listing<PostData> = self
            .get(
                &format!("/r/{}/search", subreddit),
                &[
                    ("q", query),
                    ("restrict_sr", "1"),
                    ("sort", "relevance"),
                    ("limit", POST_LIMIT),
                ],
            )
            .await?;

        let mut posts = Vec::new();
        for post in listing.data.children.into_iter().map(|t| t.data) {
            if post.selftext.trim().is_empty() {
                continue;
            }

            let comments = self.post_comments(&post.id).await?;
            posts.push(RedditPost {
                url: format!("https://www.reddit.com{}", post.permalink),
                title: post.title,
                score: post.score,
                selftext: post.selftext,
                comments: process_comments(comments),
            });
        }

        debug!("Kept {} posts from r/{}", posts.len(), subreddit);

        if posts.is_empty() {
            return Ok(format!("No text posts found in r/{} for the query.", subreddit).into());
        }

        Ok(ToolOutput::Structured(serde_json::to_value(posts)?))
    }

    async fn post_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        // The comments endpoint returns [post listing, comment listing].
        let (_, comments): (serde_json::Value, Listing<CommentData>) = self
            .get(&format!("/comments/{}", post_id), &[("sort", "top")])
            .await?;

        let mut flat = Vec::new();
        flatten_comments(comments.data.children, &mut flat);
        Ok(flat)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(format!("{}{}", self.api_base, path))
            .query(query)
            .query(&[("raw_json", "1")])
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    async fn access_token(&self) -> Result<&str> {
        let (client_id, client_secret) = self
            .credentials
            .as_ref()
            .ok_or_else(|| DelveError::Config("Reddit credentials are not set".to_string()))?;

        let token = self
            .token
            .get_or_try_init(|| async {
                debug!("Requesting Reddit access token");
                let response: TokenResponse = self
                    .client
                    .post(&self.auth_url)
                    .basic_auth(client_id, Some(client_secret))
                    .form(&[("grant_type", "client_credentials")])
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                Ok::<_, DelveError>(response.access_token)
            })
            .await?;

        Ok(token.as_str())
    }
}

fn normalize_subreddit(name: &str) -> &str {
    let name = name.trim().trim_start_matches('/');
    name.strip_prefix("r/").unwrap_or(name).trim_end_matches('/')
}

/// Subreddit names are 2 to 21 ASCII letters, digits or underscores.
fn is_valid_subreddit(name: &str) -> bool {
    (2..=21).contains(&name.len()) && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn flatten_comments(children: Vec<Thing<CommentData>>, out: &mut Vec<Comment>) {
    for child in children {
        if child.kind != "t1" {
            continue;
        }
        let CommentData {
            body,
            score,
            replies,
        } = child.data;

        out.push(Comment { body, score });

        if replies.is_object() {
            if let Ok(listing) = serde_json::from_value::<Listing<CommentData>>(replies) {
                flatten_comments(listing.data.children, out);
            }
        }
    }
}

/// Drop removed comments, keep the highest scored ones and truncate their bodies.
pub fn process_comments(comments: Vec<Comment>) -> Vec<Comment> {
    let mut kept: Vec<Comment> = comments
        .into_iter()
        .filter(|c| {
            let body = c.body.trim();
            !body.is_empty() && body != "[removed]" && body != "[deleted]"
        })
        .collect();

    kept.sort_by(|a, b| b.score.cmp(&a.score));
    kept.truncate(COMMENT_LIMIT);

    for comment in &mut kept {
        if comment.body.chars().count() > COMMENT_MAX_CHARS {
            comment.body = comment.body.chars().take(COMMENT_MAX_CHARS).collect();
        }
    }

    kept
}
