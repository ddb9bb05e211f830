//! Static insight bank served when remote analysis is unavailable.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{OfflineInsight, OfflineKind};

pub struct OfflineInsightProvider {
    catalog: Vec<OfflineInsight>,
    rng: Mutex<StdRng>,
}

impl OfflineInsightProvider {
    pub fn new() -> Self {
        Self::with_catalog(default_catalog())
    }

    pub fn with_catalog(catalog: Vec<OfflineInsight>) -> Self {
        Self {
            catalog,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic variant for tests.
    pub fn with_catalog_seeded(catalog: Vec<OfflineInsight>, seed: u64) -> Self {
        Self {
            catalog,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Uniform pick from the catalog. Never fails: an empty catalog yields
    /// the hardcoded degraded-mode entry.
    pub fn pick(&self) -> OfflineInsight {
        if self.catalog.is_empty() {
            return degraded_insight();
        }

        let index = {
            let mut rng = match self.rng.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            rng.gen_range(0..self.catalog.len())
        };
        self.catalog[index].clone()
    }
}

impl Default for OfflineInsightProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Last-resort card when even the static catalog is missing.
fn degraded_insight() -> OfflineInsight {
    OfflineInsight {
        id: "offline-degraded".into(),
        kind: OfflineKind::Tip,
        text: "Take a short pause before accepting a claim at face value.".into(),
        related_skill_id: None,
        explanation: "A brief pause interrupts automatic agreement and gives slower, \
                      deliberate reasoning a chance to catch up."
            .into(),
        challenge_prompt: "Re-read the last paragraph and name one assumption it makes.".into(),
    }
}

fn entry(
    id: &str,
    kind: OfflineKind,
    text: &str,
    skill: Option<&str>,
    explanation: &str,
    challenge: &str,
) -> OfflineInsight {
    OfflineInsight {
        id: id.into(),
        kind,
        text: text.into(),
        related_skill_id: skill.map(Into::into),
        explanation: explanation.into(),
        challenge_prompt: challenge.into(),
    }
}

fn default_catalog() -> Vec<OfflineInsight> {
    vec![
        entry(
            "offline-tip-counterargument",
            OfflineKind::Tip,
            "Strong claims deserve a devil's advocate.",
            Some("evidence-based"),
            "Arguing the other side, even briefly, surfaces evidence you would \
             otherwise never look for.",
            "Pick one claim you agreed with today and write its best counter-argument.",
        ),
        entry(
            "offline-tip-source",
            OfflineKind::Tip,
            "Check who benefits before checking who's right.",
            Some("critique"),
            "Knowing a source's incentives calibrates how much weight its claims deserve.",
            "For the page you're reading: who profits if you believe it?",
        ),
        entry(
            "offline-question-certainty",
            OfflineKind::Question,
            "How sure are you, on a scale of 1 to 10?",
            Some("epistemic-humility"),
            "Putting a number on confidence exposes overclaiming that vague words hide.",
            "Rate your confidence in the last opinion you formed, then list what would move it two points.",
        ),
        entry(
            "offline-question-change-mind",
            OfflineKind::Question,
            "What evidence would change your mind?",
            Some("evidence-based"),
            "If nothing could change your mind, the belief isn't held for reasons.",
            "Name one concrete observation that would make you drop a belief you hold.",
        ),
        entry(
            "offline-fact-firstimpression",
            OfflineKind::Fact,
            "First impressions anchor later judgments more than we notice.",
            Some("anchoring"),
            "Initial numbers and framings pull every later estimate toward them, even \
             when known to be arbitrary.",
            "Before estimating anything today, write your guess down first, then look at others'.",
        ),
        entry(
            "offline-fact-fluency",
            OfflineKind::Fact,
            "Easy-to-read claims feel truer than they are.",
            None,
            "Processing fluency gets mistaken for accuracy; clean typography is not evidence.",
            "Find one beautifully presented claim and check a primary source for it.",
        ),
        entry(
            "offline-motivation-practice",
            OfflineKind::Motivation,
            "Noticing a bias once is worth more than reading about ten.",
            None,
            "Recognition in the wild is the skill; catalogs of bias names are just the map.",
            "Catch yourself once today pattern-matching instead of reasoning, and write it down.",
        ),
        entry(
            "offline-motivation-streak",
            OfflineKind::Motivation,
            "Small daily checks compound into sharper thinking.",
            None,
            "A single question asked habitually beats an occasional deep audit.",
            "Ask \"what am I assuming?\" once before your next decision.",
        ),
    ]
}
