//! Lookup tools the agent can call.
//!
//! Each adapter wraps one external API: Brave web search, YouTube transcripts
//! and Reddit search. Adapters never fail on missing credentials or malformed
//! input; they return an explanatory string instead. Upstream HTTP failures are
//! returned as errors and end the run.

mod reddit;
mod web;
mod youtube;

pub use reddit::{process_comments, Comment, RedditPost, RedditSearch};
pub use web::{format_results, BraveSearch, WebResult};
pub use youtube::{extract_video_id, YoutubeTranscripts};

use crate::config::{Credentials, EndpointSettings};
use crate::conversation::ToolOutput;
use crate::error::{DelveError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

/// Identifies one registered tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    SearchWeb,
    GetYoutubeTranscript,
    FindSubreddit,
    SearchReddit,
}

impl ToolKind {
    /// Name the model uses to call the tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::SearchWeb => "search_web",
            ToolKind::GetYoutubeTranscript => "get_youtube_transcript",
            ToolKind::FindSubreddit => "find_subreddit",
            ToolKind::SearchReddit => "search_reddit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "search_web" => Some(ToolKind::SearchWeb),
            "get_youtube_transcript" => Some(ToolKind::GetYoutubeTranscript),
            "find_subreddit" => Some(ToolKind::FindSubreddit),
            "search_reddit" => Some(ToolKind::SearchReddit),
            _ => None,
        }
    }

    /// Function definition advertised to the model.
    pub fn definition(&self) -> ToolDefinition {
        match self {
            ToolKind::SearchWeb => ToolDefinition {
                name: self.name().to_string(),
                description: "Search the web given a query defined to answer the user's question. \
                    Returns the top results with title, summary and source URL."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "web_query": {
                            "type": "string",
                            "description": "The query for the web search"
                        }
                    },
                    "required": ["web_query"]
                }),
            },
            ToolKind::GetYoutubeTranscript => ToolDefinition {
                name: self.name().to_string(),
                description: "Get the transcript of a YouTube video. Use this to generate notes \
                    in markdown format based on the content of a YouTube video."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "video_url": {
                            "type": "string",
                            "description": "The URL of the YouTube video, e.g. https://www.youtube.com/watch?v=..."
                        }
                    },
                    "required": ["video_url"]
                }),
            },
            ToolKind::FindSubreddit => ToolDefinition {
                name: self.name().to_string(),
                description: "Find the subreddit that best matches a topic. \
                    Returns the name of the first matching subreddit."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Topic to find a community for"
                        }
                    },
                    "required": ["query"]
                }),
            },
            ToolKind::SearchReddit => ToolDefinition {
                name: self.name().to_string(),
                description: "Search posts in a subreddit. Returns up to 5 text posts with their \
                    highest scored comments."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "subreddit": {
                            "type": "string",
                            "description": "Subreddit name without the r/ prefix"
                        },
                        "query": {
                            "type": "string",
                            "description": "The search query"
                        }
                    },
                    "required": ["subreddit", "query"]
                }),
            },
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A tool definition in JSON-schema form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Tool definitions for a set of registered tools.
pub fn tool_definitions(tools: &[ToolKind]) -> Vec<ToolDefinition> {
    tools.iter().map(ToolKind::definition).collect()
}

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    SearchWeb { web_query: String },
    GetYoutubeTranscript { video_url: String },
    FindSubreddit { query: String },
    SearchReddit { subreddit: String, query: String },
}

impl ToolCall {
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolCall::SearchWeb { .. } => ToolKind::SearchWeb,
            ToolCall::GetYoutubeTranscript { .. } => ToolKind::GetYoutubeTranscript,
            ToolCall::FindSubreddit { .. } => ToolKind::FindSubreddit,
            ToolCall::SearchReddit { .. } => ToolKind::SearchReddit,
        }
    }
}

/// Parse and validate a tool call from the model's name and JSON arguments.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = if arguments.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(arguments)
            .map_err(|e| DelveError::ToolValidation(format!("Invalid tool arguments: {}", e)))?
    };

    if !args.is_object() {
        return Err(DelveError::ToolValidation(
            "Tool arguments must be a JSON object".to_string(),
        ));
    }

    match ToolKind::from_name(name) {
        Some(ToolKind::SearchWeb) => Ok(ToolCall::SearchWeb {
            web_query: required_str(&args, "web_query")?,
        }),
        Some(ToolKind::GetYoutubeTranscript) => Ok(ToolCall::GetYoutubeTranscript {
            video_url: required_str(&args, "video_url")?,
        }),
        Some(ToolKind::FindSubreddit) => Ok(ToolCall::FindSubreddit {
            query: required_str(&args, "query")?,
        }),
        Some(ToolKind::SearchReddit) => Ok(ToolCall::SearchReddit {
            subreddit: required_str(&args, "subreddit")?,
            query: required_str(&args, "query")?,
        }),
        None => Err(DelveError::ToolValidation(format!("Unknown tool: {}", name))),
    }
}

fn required_str(args: &serde_json::Value, field: &str) -> Result<String> {
    args[field]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DelveError::ToolValidation(format!("Missing '{}' argument", field)))
}

/// Per-run dependencies: one HTTP client and the credentials of the active tools.
///
/// A `Deps` is built for a single run and moved into it. The client and its
/// connection pool are released when the run finishes, fails or is dropped.
pub struct Deps {
    web: BraveSearch,
    youtube: YoutubeTranscripts,
    reddit: RedditSearch,
}

impl Deps {
    /// Build the dependency bundle with a fresh HTTP client.
    pub fn new(endpoints: &EndpointSettings, credentials: &Credentials) -> Result<Self> {
        endpoints.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(endpoints.reddit_user_agent.clone())
            .build()?;
        Ok(Self::with_client(client, endpoints, credentials))
    }

    /// Build the dependency bundle around an existing client.
    pub fn with_client(
        client: reqwest::Client,
        endpoints: &EndpointSettings,
        credentials: &Credentials,
    ) -> Self {
        Self {
            web: BraveSearch::new(
                client.clone(),
                &endpoints.brave_search,
                credentials.brave_api_key.clone(),
            ),
            youtube: YoutubeTranscripts::new(client.clone(), &endpoints.youtube),
            reddit: RedditSearch::new(client, endpoints, credentials.reddit()),
        }
    }

    /// Execute a tool call and return its output.
    pub async fn execute(&self, tool: &ToolCall) -> Result<ToolOutput> {
        info!(tool = %tool.kind(), "Executing tool");
        match tool {
            ToolCall::SearchWeb { web_query } => self.web.search(web_query).await.map(Into::into),
            ToolCall::GetYoutubeTranscript { video_url } => {
                self.youtube.transcript(video_url).await.map(Into::into)
            }
            ToolCall::FindSubreddit { query } => {
                self.reddit.find_subreddit(query).await.map(Into::into)
            }
            ToolCall::SearchReddit { subreddit, query } => {
                self.reddit.search_posts(subreddit, query).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_web() {
        let tool = parse_tool_call("search_web", r#"{"web_query": "react 19"}"#).unwrap();
        assert_eq!(
            tool,
            ToolCall::SearchWeb {
                web_query: "react 19".to_string()
            }
        );
    }

    #[test]
    fn test_parse_search_reddit() {
        let tool = parse_tool_call(
            "search_reddit",
            r#"{"subreddit": "rust", "query": "async traits"}"#,
        )
        .unwrap();
        match tool {
            ToolCall::SearchReddit { subreddit, query } => {
                assert_eq!(subreddit, "rust");
                assert_eq!(query, "async traits");
            }
            _ => panic!("Expected SearchReddit tool"),
        }
    }

    #[test]
    fn test_parse_rejects_invalid_calls() {
        assert!(matches!(
            parse_tool_call("search_web", "{}"),
            Err(DelveError::ToolValidation(_))
        ));
        assert!(matches!(
            parse_tool_call("search_web", "{not json"),
            Err(DelveError::ToolValidation(_))
        ));
        assert!(matches!(
            parse_tool_call("search_web", r#"["q"]"#),
            Err(DelveError::ToolValidation(_))
        ));
        assert!(matches!(
            parse_tool_call("delete_everything", "{}"),
            Err(DelveError::ToolValidation(_))
        ));
    }

    #[test]
    fn test_tool_names_roundtrip() {
        for kind in [
            ToolKind::SearchWeb,
            ToolKind::GetYoutubeTranscript,
            ToolKind::FindSubreddit,
            ToolKind::SearchReddit,
        ] {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
            assert_eq!(kind.definition().name, kind.name());
        }
    }

    #[tokio::test]
    async fn test_missing_credentials_return_placeholders() {
        let deps = Deps::new(&EndpointSettings::default(), &Credentials::default()).unwrap();

        let web = deps
            .execute(&ToolCall::SearchWeb {
                web_query: "anything".to_string(),
            })
            .await
            .unwrap();
        assert!(!web.to_model_string().is_empty());

        let reddit = deps
            .execute(&ToolCall::FindSubreddit {
                query: "anything".to_string(),
            })
            .await
            .unwrap();
        assert!(reddit.to_model_string().contains("REDDIT_CLIENT_ID"));
    }
}
