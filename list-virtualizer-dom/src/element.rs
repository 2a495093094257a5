use list_virtualizer::Axis;

/// A rendered item node that can report its size.
///
/// Implement this over whatever the host renders into (a DOM node handle, a terminal cell
/// block, a test double). Extents are raw layout values; they are rounded to whole units
/// before reaching the measurement cache.
pub trait MeasureElement {
    /// The border-box extent along `axis` (height for vertical lists, width for horizontal).
    fn extent(&self, axis: Axis) -> f64;
}

/// A fixed-size element, handy for hosts that know item sizes up front.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FixedElement {
    pub width: f64,
    pub height: f64,
}

impl MeasureElement for FixedElement {
    fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.height,
            Axis::Horizontal => self.width,
        }
    }
}
