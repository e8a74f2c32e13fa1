//! Context composition: format retrieved matches and splice them into the
//! conversation as one auxiliary system turn.
//!
//! Both functions are pure; `inject` never mutates the caller's sequence.

use knowledge::KnowledgeMatch;
use prompt::{ChatMessage, MessageRole};
use tracing::debug;

/// Preamble placed above the formatted reference sections.
const CONTEXT_PREAMBLE: &str =
    "以下は過去の相談事例に基づく参考情報です。内容をそのまま読み上げず、相談者の状況に合わせて応答に活かしてください。";

/// Formats matches into a context block: one labeled section per match with
/// a rounded similarity percentage and trimmed content, most relevant first,
/// blank-line separated. Returns `None` when there are no matches.
pub fn compose(matches: &[KnowledgeMatch]) -> Option<String> {
    if matches.is_empty() {
        return None;
    }

    let sections: Vec<String> = matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let percent = (m.similarity * 100.0).round() as i64;
            format!(
                "【参考{}】関連度 {}%\n{}",
                i + 1,
                percent,
                m.content.trim()
            )
        })
        .collect();

    Some(format!("{}\n\n{}", CONTEXT_PREAMBLE, sections.join("\n\n")))
}

/// Returns a new turn sequence with `block` inserted as a single system turn
/// immediately before the most recent user turn. A blank block, or a
/// sequence without any user turn, yields an unchanged clone.
pub fn inject(turns: &[ChatMessage], block: &str) -> Vec<ChatMessage> {
    let mut result = turns.to_vec();
    if block.trim().is_empty() {
        return result;
    }

    match result.iter().rposition(|t| t.role == MessageRole::User) {
        Some(index) => {
            result.insert(index, ChatMessage::system(block));
        }
        None => {
            debug!("inject: no user turn found, leaving sequence unchanged");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_match(content: &str, similarity: f32) -> KnowledgeMatch {
        KnowledgeMatch {
            id: Uuid::new_v4(),
            content: content.to_string(),
            metadata: None,
            similarity,
        }
    }

    #[test]
    fn test_compose_empty_is_none() {
        assert!(compose(&[]).is_none());
    }

    #[test]
    fn test_compose_formats_percentage_and_order() {
        let matches = vec![
            sample_match("  最初の参考  ", 0.823),
            sample_match("二番目の参考", 0.456),
        ];
        let block = compose(&matches).unwrap();

        assert!(block.contains("【参考1】関連度 82%"));
        assert!(block.contains("【参考2】関連度 46%"));
        // Content is trimmed, and order follows the retriever.
        assert!(block.contains("最初の参考"));
        assert!(!block.contains("  最初の参考  "));
        let first = block.find("最初の参考").unwrap();
        let second = block.find("二番目の参考").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_compose_sections_blank_line_separated() {
        let matches = vec![sample_match("a", 0.9), sample_match("b", 0.8)];
        let block = compose(&matches).unwrap();
        assert!(block.contains("\n\n【参考2】"));
    }

    #[test]
    fn test_inject_blank_block_is_noop() {
        let turns = vec![
            ChatMessage::system("persona"),
            ChatMessage::user("こんにちは"),
        ];
        let injected = inject(&turns, "  ");
        assert_eq!(injected, turns);
    }

    #[test]
    fn test_inject_before_last_user_turn() {
        let turns = vec![
            ChatMessage::system("persona"),
            ChatMessage::user("前の相談"),
            ChatMessage::assistant("前の応答"),
            ChatMessage::user("今回の相談"),
        ];
        let injected = inject(&turns, "参考情報");

        assert_eq!(injected.len(), 5);
        assert_eq!(injected[3].role, MessageRole::System);
        assert_eq!(injected[3].content, "参考情報");
        assert_eq!(injected[4].content, "今回の相談");
        // Earlier user turn untouched.
        assert_eq!(injected[1].content, "前の相談");
    }

    #[test]
    fn test_inject_does_not_mutate_input() {
        let turns = vec![ChatMessage::user("一件だけ")];
        let before = turns.clone();
        let injected = inject(&turns, "ブロック");

        assert_eq!(turns, before);
        assert_eq!(injected.len(), 2);
        assert_eq!(injected[0].role, MessageRole::System);
    }

    #[test]
    fn test_inject_no_user_turn_unchanged() {
        let turns = vec![ChatMessage::system("persona")];
        let injected = inject(&turns, "ブロック");
        assert_eq!(injected, turns);
    }
}
