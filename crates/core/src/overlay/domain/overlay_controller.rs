//! Lifecycle of the overlay shapes attached to a display surface.
//!
//! Each detection delivery is a generation: the previous generation's shapes
//! are removed and the new ones attached, inside one call on the render
//! thread. Between calls the surface holds exactly one generation.

use std::marker::PhantomData;

use crate::overlay::domain::display_surface::{DisplaySurface, ShapeId};
use crate::overlay::domain::overlay_shape::OverlayShape;

/// What to do with a completion older than the last one applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StalePolicy {
    /// Ignore it; the newer generation stays on screen.
    #[default]
    DropStale,
    /// Apply every completion in arrival order.
    ApplyAll,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentOutcome {
    Applied { removed: usize, added: usize },
    DroppedStale,
}

/// Owns the ids of the current generation's shapes.
///
/// Not `Send`: overlay state belongs to the render thread and must never be
/// handed to a detection worker.
pub struct OverlayController {
    current: Vec<ShapeId>,
    last_sequence: Option<u64>,
    policy: StalePolicy,
    _render_thread: PhantomData<*const ()>,
}

impl OverlayController {
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            current: Vec::new(),
            last_sequence: None,
            policy,
            _render_thread: PhantomData,
        }
    }

    /// Ids currently attached to the surface, in attach order.
    pub fn current_ids(&self) -> &[ShapeId] {
        &self.current
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    /// Replaces the current generation with `shapes`.
    ///
    /// An empty `shapes` still clears the previous generation. Under
    /// [`StalePolicy::DropStale`] a `sequence` older than the last applied
    /// one leaves the surface untouched.
    pub fn present(
        &mut self,
        surface: &mut dyn DisplaySurface,
        sequence: u64,
        shapes: Vec<OverlayShape>,
    ) -> PresentOutcome {
        if self.policy == StalePolicy::DropStale
            && self.last_sequence.is_some_and(|last| sequence < last)
        {
            log::debug!(
                "Dropping stale generation {sequence} (showing {:?})",
                self.last_sequence
            );
            return PresentOutcome::DroppedStale;
        }

        let removed = self.clear(surface);
        self.current = shapes.into_iter().map(|s| surface.add_shape(s)).collect();
        self.last_sequence = Some(self.last_sequence.map_or(sequence, |l| l.max(sequence)));

        PresentOutcome::Applied {
            removed,
            added: self.current.len(),
        }
    }

    /// Removes every shape this controller attached. Returns how many were
    /// still on the surface.
    pub fn clear(&mut self, surface: &mut dyn DisplaySurface) -> usize {
        self.current
            .drain(..)
            .filter(|id| surface.remove_shape(*id))
            .count()
    }
}

impl Default for OverlayController {
    fn default() -> Self {
        Self::new(StalePolicy::default())
    }
}
