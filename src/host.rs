//! Seam to the browser host.
//!
//! Everything page-shaped (DOM snapshots, trigger events, connectivity,
//! the card surface) lives behind the types and traits here so the rest of
//! the pipeline never touches a real DOM. The embedding extension provides
//! the implementations; tests provide fakes.

use serde::{Deserialize, Serialize};

use crate::models::DisplayableInsight;

/// Element bounding box, page coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NodeRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NodeRect {
    pub fn is_zero(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether any part of this rect lies inside a viewport of the given
    /// size anchored at the current scroll offset.
    pub fn intersects_viewport(&self, viewport: &Viewport) -> bool {
        let bottom = self.y + self.height;
        let right = self.x + self.width;
        bottom > viewport.scroll_y
            && self.y < viewport.scroll_y + viewport.height
            && right > viewport.scroll_x
            && self.x < viewport.scroll_x + viewport.width
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub width: f64,
    pub height: f64,
}

/// One element in a page snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageNode {
    /// Lowercase tag name ("p", "h1", ...)
    pub tag: String,
    /// Own text content, children excluded
    pub text: String,
    pub rect: NodeRect,
    /// False for nodes detached between observation and snapshot
    pub attached: bool,
    pub children: Vec<PageNode>,
}

/// Immutable copy of the page taken at trigger time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub viewport: Viewport,
    pub root: PageNode,
}

/// Path of child indices from the snapshot root to a node.
pub type NodePath = Vec<usize>;

/// Sampling trigger reported by the host.
#[derive(Debug, Clone)]
pub enum PageEvent {
    /// Page finished loading
    Startup,
    /// DOM mutation batch; `changed_len` is the total changed text length
    Mutation { changed_len: usize },
    Scroll,
    /// Click; `target` locates the clicked node for subtree-scoped sampling
    Click { target: Option<NodePath> },
}

/// Provides page snapshots on demand.
pub trait PageSource: Send + Sync {
    fn snapshot(&self) -> PageSnapshot;
}

/// Reports whether the host currently has network connectivity.
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;
}

/// The display surface the pipeline delivers cards to.
pub trait InsightSink: Send + Sync {
    fn deliver(&self, insight: DisplayableInsight);

    /// Ask the host to visually mark the text the insight refers to.
    fn apply_highlight(&self, selector: &str);
}

/// User reactions reported back by the display surface. Consumed by the
/// gamification subsystem, which is outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum InsightFeedback {
    ChallengeAccepted {
        prompt: String,
        related_skill_id: Option<String>,
    },
    Dismissed,
}
