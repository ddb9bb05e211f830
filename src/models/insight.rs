//! Insight data models.
//!
//! `RawInsight` is what the remote proxy's reply parses into and what the
//! cache persists; `DisplayableInsight` is the presentation-ready card handed
//! to the display surface and is never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel pattern type meaning "no actionable insight in this text".
pub const PATTERN_NONE: &str = "none";

/// Parsed remote analysis result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInsight {
    pub pattern_type: String,
    pub related_skill_id: Option<String>,
    pub explanation: String,
    pub challenge_prompt: String,
    pub highlight_selector: Option<String>,
    pub original_text_segment: Option<String>,
}

impl RawInsight {
    /// An insight is worth caching (and highlighting) only when the model
    /// actually found something.
    pub fn is_actionable(&self) -> bool {
        self.pattern_type != PATTERN_NONE || self.related_skill_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum InsightSource {
    Llm,
    Offline,
}

/// Presentation-ready card. Constructed fresh per delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayableInsight {
    pub id: String,
    pub title: String,
    pub source: InsightSource,
    pub pattern_type: String,
    pub related_skill_id: Option<String>,
    pub explanation: String,
    pub challenge_prompt: String,
    pub highlight_selector: Option<String>,
    pub original_text_segment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DisplayableInsight {
    /// Build a card from a model-produced insight.
    pub fn from_raw(insight: RawInsight, now: DateTime<Utc>) -> Self {
        let title = if insight.pattern_type == PATTERN_NONE {
            "All Clear".to_string()
        } else {
            format!("Pattern Spotted: {}", insight.pattern_type)
        };

        Self {
            id: Uuid::new_v4().to_string(),
            title,
            source: InsightSource::Llm,
            pattern_type: insight.pattern_type,
            related_skill_id: insight.related_skill_id,
            explanation: insight.explanation,
            challenge_prompt: insight.challenge_prompt,
            highlight_selector: insight.highlight_selector,
            original_text_segment: insight.original_text_segment,
            timestamp: now,
        }
    }

    /// Build a card from a static offline catalog entry.
    pub fn from_offline(entry: &OfflineInsight, now: DateTime<Utc>) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.kind.title().to_string(),
            source: InsightSource::Offline,
            pattern_type: entry.kind.as_str().to_string(),
            related_skill_id: entry.related_skill_id.clone(),
            explanation: entry.explanation.clone(),
            challenge_prompt: entry.challenge_prompt.clone(),
            highlight_selector: None,
            original_text_segment: None,
            timestamp: now,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OfflineKind {
    Tip,
    Question,
    Fact,
    Motivation,
}

impl OfflineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfflineKind::Tip => "tip",
            OfflineKind::Question => "question",
            OfflineKind::Fact => "fact",
            OfflineKind::Motivation => "motivation",
        }
    }

    /// Display title shown on the card for each catalog category.
    pub fn title(&self) -> &'static str {
        match self {
            OfflineKind::Tip => "Quick Tip",
            OfflineKind::Question => "Something to Ponder",
            OfflineKind::Fact => "Did You Know?",
            OfflineKind::Motivation => "Keep Going",
        }
    }
}

/// Static catalog entry served when remote analysis is unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineInsight {
    pub id: String,
    pub kind: OfflineKind,
    pub text: String,
    pub related_skill_id: Option<String>,
    pub explanation: String,
    pub challenge_prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actionable_when_pattern_named() {
        let insight = RawInsight {
            pattern_type: "Confirmation Bias".into(),
            related_skill_id: None,
            explanation: "x".into(),
            challenge_prompt: "y".into(),
            highlight_selector: None,
            original_text_segment: None,
        };
        assert!(insight.is_actionable());
    }

    #[test]
    fn actionable_when_skill_set_despite_none_pattern() {
        let insight = RawInsight {
            pattern_type: PATTERN_NONE.into(),
            related_skill_id: Some("evidence-based".into()),
            explanation: String::new(),
            challenge_prompt: String::new(),
            highlight_selector: None,
            original_text_segment: None,
        };
        assert!(insight.is_actionable());
    }

    #[test]
    fn not_actionable_when_none_and_no_skill() {
        let insight = RawInsight {
            pattern_type: PATTERN_NONE.into(),
            related_skill_id: None,
            explanation: String::new(),
            challenge_prompt: String::new(),
            highlight_selector: None,
            original_text_segment: None,
        };
        assert!(!insight.is_actionable());
    }

    #[test]
    fn llm_card_title_reflects_pattern() {
        let insight = RawInsight {
            pattern_type: "Anchoring".into(),
            related_skill_id: None,
            explanation: "e".into(),
            challenge_prompt: "c".into(),
            highlight_selector: None,
            original_text_segment: None,
        };
        let card = DisplayableInsight::from_raw(insight, Utc::now());
        assert_eq!(card.title, "Pattern Spotted: Anchoring");
        assert_eq!(card.source, InsightSource::Llm);
    }
}
