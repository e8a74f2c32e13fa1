//! State guide: lexical keyword scoring over the latest user text, rendered
//! as a short system instruction that biases the response strategy.
//!
//! Best effort by design: false positives are acceptable, and the guide must
//! never error or block the chat flow. The rule tables are data, not code,
//! so categories and patterns can be extended independently of the scoring.

/// A keyword set tagged to one semantic category.
struct KeywordSet {
    keywords: &'static [&'static str],
}

/// A named emotion with its trigger keywords and a coaching hint.
struct EmotionPattern {
    label: &'static str,
    keywords: &'static [&'static str],
    hint: &'static str,
}

/// Per-keyword weight cap. Longer keywords score higher, up to this many
/// characters.
const KEYWORD_WEIGHT_CAP: u32 = 4;

/// Margin one side must lead by before a discrete label is chosen.
const DECISION_MARGIN: u32 = 2;

/// Maximum number of emotion hints rendered.
const MAX_EMOTION_HINTS: usize = 3;

/// Markers of acute distress: the user needs the feelings held first.
const DISTRESS: KeywordSet = KeywordSet {
    keywords: &[
        "つらい", "辛い", "しんどい", "苦しい", "限界", "疲れた", "眠れない",
        "泣いて", "涙が", "消えたい", "もうだめ", "もう無理",
    ],
};

/// Markers of reflection: the user is already examining the situation.
const REFLECTIVE: KeywordSet = KeywordSet {
    keywords: &[
        "整理したい", "振り返る", "考えたい", "なぜ", "どうして", "原因",
        "理由", "客観的", "冷静に",
    ],
};

/// Markers of readiness to act.
const READY: KeywordSet = KeywordSet {
    keywords: &[
        "やってみる", "行動したい", "試したい", "挑戦", "変わりたい",
        "決めた", "次は",
    ],
};

/// Markers of not being ready to act.
const NOT_READY: KeywordSet = KeywordSet {
    keywords: &[
        "まだ無理", "できない", "自信がない", "迷って", "わからない",
        "動けない", "怖くて",
    ],
};

/// Named emotion patterns with coaching hints.
const EMOTION_PATTERNS: &[EmotionPattern] = &[
    EmotionPattern {
        label: "怒り",
        keywords: &["怒", "むかつく", "イライラ", "腹が立つ", "許せない"],
        hint: "まず怒りを受け止め、その奥にある期待や傷つきを言葉にする",
    },
    EmotionPattern {
        label: "不安",
        keywords: &["不安", "心配", "こわい", "怖い", "緊張"],
        hint: "不安の対象を具体化し、今できる小さな一歩に焦点を当てる",
    },
    EmotionPattern {
        label: "悲しみ",
        keywords: &["悲しい", "さみしい", "寂しい", "涙", "泣い"],
        hint: "感情の表出を促し、急いで解決に向かわない",
    },
    EmotionPattern {
        label: "自責",
        keywords: &["自分のせい", "自分が悪い", "申し訳", "罪悪感", "後悔"],
        hint: "事実と解釈を分け、過度な自己否定を和らげる",
    },
    EmotionPattern {
        label: "疲弊",
        keywords: &["疲れ", "しんどい", "限界", "眠れない"],
        hint: "休息を正当な選択肢として提示する",
    },
];

/// Sums weights of the set's keywords found as substrings. Weight per found
/// keyword is its character count capped at [`KEYWORD_WEIGHT_CAP`].
fn score(text: &str, keywords: &[&str]) -> u32 {
    keywords
        .iter()
        .filter(|kw| text.contains(*kw))
        .map(|kw| (kw.chars().count() as u32).min(KEYWORD_WEIGHT_CAP))
        .sum()
}

/// Builds the state guide block for the latest user text, or `None` when the
/// input is blank. The output is a system instruction and is never shown to
/// the end user.
pub fn build_guide(latest_user_text: &str) -> Option<String> {
    let text = latest_user_text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    let distress = score(&text, DISTRESS.keywords);
    let reflective = score(&text, REFLECTIVE.keywords);
    let emotional_state = if distress >= reflective + DECISION_MARGIN {
        "気持ちの整理が必要な段階。共感と受容を優先する"
    } else if reflective >= distress + DECISION_MARGIN {
        "状況を見つめ直している段階。整理の手助けを優先する"
    } else {
        "感情と整理が入り混じった状態。様子を見ながら進める"
    };

    let ready = score(&text, READY.keywords);
    let not_ready = score(&text, NOT_READY.keywords);
    let readiness = if ready >= not_ready + DECISION_MARGIN {
        "行動への意欲が見えている。具体的な一歩を一緒に考えてよい"
    } else if not_ready >= ready + DECISION_MARGIN {
        "まだ行動を促さない。提案は控えめにする"
    } else {
        "行動の準備度は読み取れない。急がない"
    };

    let mut matched: Vec<(u32, &EmotionPattern)> = EMOTION_PATTERNS
        .iter()
        .map(|p| (score(&text, p.keywords), p))
        .filter(|(s, _)| *s > 0)
        .collect();
    matched.sort_by(|a, b| b.0.cmp(&a.0));
    matched.truncate(MAX_EMOTION_HINTS);

    let mut guide = String::from("[応答方針ガイド]\n");
    guide.push_str(&format!("感情状態: {}\n", emotional_state));
    guide.push_str(&format!("行動準備: {}", readiness));
    if !matched.is_empty() {
        guide.push_str("\n観察された感情:");
        for (_, pattern) in &matched {
            guide.push_str(&format!("\n・{}: {}", pattern.label, pattern.hint));
        }
    }

    Some(guide)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_returns_none() {
        assert!(build_guide("").is_none());
        assert!(build_guide("   \n ").is_none());
    }

    #[test]
    fn test_distress_text_selects_empathy_first() {
        let guide = build_guide("もう限界です。毎日つらいし眠れない").unwrap();
        assert!(guide.contains("気持ちの整理が必要な段階"));
    }

    #[test]
    fn test_reflective_text_selects_sorting_help() {
        let guide = build_guide("なぜこうなったのか原因を整理したいです").unwrap();
        assert!(guide.contains("状況を見つめ直している段階"));
    }

    #[test]
    fn test_neutral_text_reports_mixed_state() {
        let guide = build_guide("上司と昼ごはんに行きました").unwrap();
        assert!(guide.contains("感情と整理が入り混じった状態"));
        assert!(guide.contains("行動の準備度は読み取れない"));
    }

    #[test]
    fn test_readiness_detection() {
        let guide = build_guide("変わりたいので転職に挑戦してみる").unwrap();
        assert!(guide.contains("行動への意欲が見えている"));

        let guide = build_guide("まだ無理だし自信がない").unwrap();
        assert!(guide.contains("まだ行動を促さない"));
    }

    #[test]
    fn test_emotion_hints_capped() {
        let guide =
            build_guide("怒りで腹が立つし、不安で心配、悲しいし涙が出る、自分のせいで罪悪感、疲れた")
                .unwrap();
        let hint_count = guide.matches("・").count();
        assert!(hint_count <= MAX_EMOTION_HINTS);
    }

    #[test]
    fn test_anger_pattern_detected() {
        let guide = build_guide("会社の上司に怒られた").unwrap();
        assert!(guide.contains("怒り"));
    }

    #[test]
    fn test_no_emotion_section_when_nothing_matched() {
        let guide = build_guide("庭の手入れについて相談があります").unwrap();
        assert!(!guide.contains("観察された感情"));
    }

    #[test]
    fn test_keyword_weight_capped() {
        assert_eq!(score("やってみる", &["やってみる"]), KEYWORD_WEIGHT_CAP);
        assert_eq!(score("怒り", &["怒"]), 1);
    }

    #[test]
    fn test_latin_input_is_case_normalized() {
        // Scoring operates on the lowercased text; latin keywords would match
        // regardless of case. Japanese text passes through unchanged.
        let guide = build_guide("TSURAI...つらいです、もう無理").unwrap();
        assert!(guide.contains("気持ちの整理"));
    }
}
