use crate::guide::error::{GuideError, GuideResult};
use lazy_static::lazy_static;
use regex::Regex;

pub const TITLE_MARKER: &str = "Guide Title:";
pub const CONTENT_MARKER: &str = "Guide Content:";

lazy_static! {
    static ref THINK_BLOCK: Regex = Regex::new(r"(?is)<think>.*?</think>").unwrap();
}

/// Everything the guide prompt is rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptContext {
    pub poll_title: String,
    pub leading_option: String,
    pub percentage_block: String,
    pub follow_up_question: String,
    pub follow_up_answers: String,
    pub guide_type: String,
}

impl PromptContext {
    pub fn render(&self) -> String {
        format!(
            "Please generate a guide title and guide content for the following poll and its responses. \
             Give every field as plain text: do not escape characters with \\ and do not wrap the content in tags such as <content>. \
             The guide should be clear, informative, and in-depth.\n\n\
             Poll Title: {}\n\
             Option with the highest votes: {}\n\
             Voting Results (percentages):\n{}\n\n\
             Follow-up Question and Responses:\n{}\n{}\n\n\
             Write it like this:\n{}\n\n\
             Return the result in exactly the following format:\n\
             {}\n<<title>>\n\n\
             {}\n<<content>>\n",
            self.poll_title,
            self.leading_option,
            self.percentage_block,
            self.follow_up_question,
            self.follow_up_answers,
            self.guide_type,
            TITLE_MARKER,
            CONTENT_MARKER,
        )
    }
}

/// Drops `<think>...</think>` reasoning blocks some models prepend.
pub fn strip_reasoning(reply: &str) -> String {
    THINK_BLOCK.replace_all(reply, "").trim().to_string()
}

/// Pulls `(title, content)` out of a reply shaped like the prompt's format.
pub fn parse_reply(reply: &str) -> GuideResult<(String, String)> {
    let malformed = || GuideError::MalformedResponse { raw: reply.to_string() };

    let title_start = reply.find(TITLE_MARKER).ok_or_else(malformed)?;
    let content_start = reply.find(CONTENT_MARKER).ok_or_else(malformed)?;
    let title_end = title_start + TITLE_MARKER.len();
    if content_start < title_end {
        return Err(malformed());
    }

    let title = reply[title_end..content_start].trim().to_string();
    let content = reply[content_start + CONTENT_MARKER.len()..].trim().to_string();
    Ok((title, content))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lunch() -> PromptContext {
        PromptContext {
            poll_title: "Lunch?".into(),
            leading_option: "A".into(),
            percentage_block: "A - 75.0%\nB - 25.0%".into(),
            follow_up_question: "Why?".into(),
            follow_up_answers: "taste\nprice".into(),
            guide_type: "casual".into(),
        }
    }

    #[test]
    fn render_embeds_every_field() {
        let prompt = lunch().render();

        assert!(prompt.contains("Poll Title: Lunch?\n"));
        assert!(prompt.contains("Option with the highest votes: A\n"));
        assert!(prompt.contains("A - 75.0%\nB - 25.0%"));
        assert!(prompt.contains("Follow-up Question and Responses:\nWhy?\ntaste\nprice\n"));
        assert!(prompt.contains("Write it like this:\ncasual"));
        assert!(prompt.contains("Guide Title:\n<<title>>\n\nGuide Content:\n<<content>>"));
    }

    #[test]
    fn parses_title_and_content() {
        let (title, content) = parse_reply("Guide Title:\nLunch Pick\n\nGuide Content:\nMost prefer A.").unwrap();
        assert_eq!(title, "Lunch Pick");
        assert_eq!(content, "Most prefer A.");
    }

    #[test]
    fn missing_marker_is_malformed() {
        for reply in ["Guide Title:\nLunch Pick", "Guide Content:\nMost prefer A.", ""] {
            match parse_reply(reply) {
                Err(GuideError::MalformedResponse { raw }) => assert_eq!(raw, reply),
                other => panic!("expected malformed for {:?}, got {:?}", reply, other),
            }
        }
    }

    #[test]
    fn content_before_title_is_malformed() {
        assert!(matches!(
            parse_reply("Guide Content: body Guide Title: title"),
            Err(GuideError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn strips_reasoning_blocks_across_lines() {
        let reply = "<THINK>\nweighing options...\n</think>\nGuide Title:\nX\n<think>more</think>Guide Content:\nY";
        assert_eq!(strip_reasoning(reply), "Guide Title:\nX\nGuide Content:\nY");
    }
}
