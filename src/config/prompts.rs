//! Agent variants and their system prompts.
//!
//! The web, strict Reddit and default Reddit assistants share one adapter set
//! and differ only in persona, tool set and default model.

use crate::lookup::ToolKind;
use serde::{Deserialize, Serialize};

/// Persona and tool set the assistant runs with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Web search plus YouTube transcripts.
    #[default]
    WebSearch,
    /// Reddit search with strict answer formatting.
    RedditStrict,
    /// Reddit search with a plain assistant persona.
    Reddit,
}

impl Variant {
    /// System prompt sent at the start of every run.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Variant::WebSearch => WEB_SEARCH_PROMPT,
            Variant::RedditStrict => REDDIT_STRICT_PROMPT,
            Variant::Reddit => REDDIT_DEFAULT_PROMPT,
        }
    }

    /// Tools registered with the agent.
    pub fn tools(&self) -> &'static [ToolKind] {
        match self {
            Variant::WebSearch => &[ToolKind::SearchWeb, ToolKind::GetYoutubeTranscript],
            Variant::RedditStrict | Variant::Reddit => {
                &[ToolKind::FindSubreddit, ToolKind::SearchReddit]
            }
        }
    }

    /// Model used when neither config nor `LLM_MODEL` names one.
    pub fn default_model(&self) -> &'static str {
        match self {
            Variant::WebSearch => "gpt-4o",
            Variant::RedditStrict | Variant::Reddit => "gpt-4o-mini",
        }
    }

    /// Title shown above the chat transcript.
    pub fn title(&self) -> &'static str {
        match self {
            Variant::WebSearch => "Web Research Assistant",
            Variant::RedditStrict | Variant::Reddit => "Reddit Search Analyzer",
        }
    }

    /// Placeholder text for the chat input.
    pub fn input_hint(&self) -> &'static str {
        match self {
            Variant::WebSearch => "What would you like to research today?",
            Variant::RedditStrict | Variant::Reddit => "What would you like to know about today?",
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "web" | "web-search" => Ok(Variant::WebSearch),
            "reddit-strict" => Ok(Variant::RedditStrict),
            "reddit" => Ok(Variant::Reddit),
            _ => Err(format!("Unknown variant: {}", s)),
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::WebSearch => write!(f, "web-search"),
            Variant::RedditStrict => write!(f, "reddit-strict"),
            Variant::Reddit => write!(f, "reddit"),
        }
    }
}

const WEB_SEARCH_PROMPT: &str = r#"You are an expert at researching the web to answer user questions.
Format your response in markdown and provide citations as well as the sources at the end of the response.
You also have the ability to fetch the transcript of YouTube videos. Use this functionality to generate notes in markdown format based on the content of a YouTube video.

When taking notes use the following guidelines:
Summarize the information as structured notes. Focus on capturing key points, omitting unnecessary details, and using bullet points or short paragraphs for readability. Prioritize clarity and conciseness by highlighting:
1. **Main topics or sections**
2. **Key points, insights, or findings**
3. **Supporting details** (only if essential)
4. **Action items or next steps** (if applicable)
5. **Dates, names, or specific terms** (only if relevant)

Format the notes in bullet points or short, clear sentences. Avoid repetition or filler words. Aim for a summary that is easy to scan and ideal for quick reference."#;

const REDDIT_STRICT_PROMPT: &str = r#"You are a Reddit research analyst. Answer the user's question using only what Reddit users have written.

Workflow:
1. Use 'find_subreddit' to locate the community most relevant to the question.
2. Use 'search_reddit' with that subreddit and a focused query.
3. Read the posts and their top comments before answering.

Format every answer exactly as follows:
## Summary
Two or three sentences answering the question directly.

## What Redditors Say
- One bullet per distinct opinion or recommendation, with the number of comments that support it when it is clear.

## Sources
- [Post title](post url) for every post you relied on.

Never invent posts, users or quotes. If the results do not answer the question, say so under Summary and leave the other sections empty."#;

const REDDIT_DEFAULT_PROMPT: &str = "You are a helpful assistant.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parse_and_display() {
        for variant in [Variant::WebSearch, Variant::RedditStrict, Variant::Reddit] {
            let parsed: Variant = variant.to_string().parse().unwrap();
            assert_eq!(parsed, variant);
        }
        assert_eq!("web".parse::<Variant>().unwrap(), Variant::WebSearch);
        assert!("forum".parse::<Variant>().is_err());
    }

    #[test]
    fn test_variant_tool_sets() {
        assert!(Variant::WebSearch.tools().contains(&ToolKind::SearchWeb));
        assert!(!Variant::WebSearch.tools().contains(&ToolKind::SearchReddit));
        assert_eq!(Variant::RedditStrict.tools(), Variant::Reddit.tools());
        assert_ne!(
            Variant::RedditStrict.system_prompt(),
            Variant::Reddit.system_prompt()
        );
    }
}
