//! Display hooks for an external renderer.
//!
//! The simulation only ever writes to a [`Renderer`]; nothing it reports is
//! read back.

use crate::agent::AgentId;
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};

/// Normalized RGBA color; alpha 1.0 is fully opaque
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl Rgba {
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }
}

impl Strategy {
    /// Portrayal color for agents of this strategy
    pub fn color(self) -> Rgba {
        match self {
            Strategy::NaiveC => Rgba::new(0.0, 1.0, 0.0, 1.0),
            Strategy::NaiveD => Rgba::new(1.0, 0.0, 0.0, 1.0),
            Strategy::PavlovMobile => Rgba::new(1.0, 0.5, 0.0, 1.0),
            Strategy::PavlovStationary => Rgba::new(1.0, 1.0, 0.0, 1.0),
            Strategy::TftMobile => Rgba::new(1.0, 1.0, 1.0, 1.0),
            Strategy::TftStationary => Rgba::new(0.5, 0.5, 0.5, 1.0),
            Strategy::WalkawayC => Rgba::new(0.0, 0.0, 1.0, 1.0),
            Strategy::WalkawayD => Rgba::new(1.0, 0.0, 1.0, 1.0),
            Strategy::RealisticTft => Rgba::new(1.0, 0.5, 0.5, 1.0),
            Strategy::Retreat => Rgba::new(0.0, 1.0, 1.0, 1.0),
        }
    }
}

/// Receiver for agent lifecycle notifications
pub trait Renderer {
    /// Called once for every agent created, initial or offspring
    fn agent_created(&mut self, id: AgentId, strategy: Strategy, color: Rgba);

    /// Called when an agent dies or is culled
    fn agent_removed(&mut self, _id: AgentId) {}
}

/// Renderer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn agent_created(&mut self, _id: AgentId, _strategy: Strategy, _color: Rgba) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_are_opaque_and_normalized() {
        for strategy in Strategy::ALL {
            let c = strategy.color();
            assert_eq!(c.alpha, 1.0);
            for component in [c.red, c.green, c.blue] {
                assert!((0.0..=1.0).contains(&component));
            }
        }
    }

    #[test]
    fn test_colors_are_distinct() {
        for (i, a) in Strategy::ALL.iter().enumerate() {
            for b in &Strategy::ALL[i + 1..] {
                assert_ne!(a.color(), b.color(), "{a} and {b} share a color");
            }
        }
    }
}
