use crate::overlay::domain::overlay_shape::OverlayShape;

/// Opaque handle for a shape attached to a [`DisplaySurface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub(crate) u64);

impl ShapeId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// The platform surface overlays are drawn on.
///
/// Only the render thread touches a surface; it is passed by `&mut` to the
/// code that mutates it.
pub trait DisplaySurface {
    fn add_shape(&mut self, shape: OverlayShape) -> ShapeId;

    /// Detaches a shape. Returns `false` if `id` is not attached.
    fn remove_shape(&mut self, id: ShapeId) -> bool;

    fn shape_count(&self) -> usize;
}
