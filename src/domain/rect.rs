/// Axis-aligned integer rectangles.
///
/// Half-open convention: `right = x + w` and `bottom = y + h` are the first
/// column/row *outside* the rectangle. Two rectangles that only share an
/// edge do not overlap. Edge arithmetic saturates at the `i32` limits.

use super::error::ValidationError;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    w: i32,
    h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Result<Self, ValidationError> {
        if w <= 0 || h <= 0 {
            return Err(ValidationError::NonPositiveSize { w, h });
        }
        Ok(Rect { x, y, w, h })
    }

    /// Construct from literal level data already known to be valid.
    pub(crate) const fn from_raw(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn width(&self) -> i32 { self.w }
    pub fn height(&self) -> i32 { self.h }
    pub fn size(&self) -> (i32, i32) { (self.w, self.h) }

    pub fn left(&self) -> i32 { self.x }
    pub fn top(&self) -> i32 { self.y }
    pub fn right(&self) -> i32 { self.x.saturating_add(self.w) }
    pub fn bottom(&self) -> i32 { self.y.saturating_add(self.h) }

    // Edge setters move the rectangle; the size never changes.
    pub fn set_left(&mut self, left: i32) { self.x = left; }
    pub fn set_top(&mut self, top: i32) { self.y = top; }
    pub fn set_right(&mut self, right: i32) { self.x = right.saturating_sub(self.w); }
    pub fn set_bottom(&mut self, bottom: i32) { self.y = bottom.saturating_sub(self.h); }

    pub fn set_size(&mut self, w: i32, h: i32) -> Result<(), ValidationError> {
        if w <= 0 || h <= 0 {
            return Err(ValidationError::NonPositiveSize { w, h });
        }
        self.w = w;
        self.h = h;
        Ok(())
    }

    /// Strict interior overlap.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    #[inline]
    pub fn contains_point(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: i32, y: i32, w: i32, h: i32) -> Rect {
        Rect::new(x, y, w, h).unwrap()
    }

    #[test]
    fn rejects_non_positive_size() {
        assert_eq!(
            Rect::new(0, 0, 0, 10),
            Err(ValidationError::NonPositiveSize { w: 0, h: 10 })
        );
        assert!(Rect::new(0, 0, 10, -1).is_err());
        assert!(Rect::new(-5, -5, 1, 1).is_ok());
    }

    #[test]
    fn edges_are_half_open() {
        let a = r(10, 20, 30, 40);
        assert_eq!(a.right(), 40);
        assert_eq!(a.bottom(), 60);
        assert!(a.contains_point(10, 20));
        assert!(!a.contains_point(40, 20));
        assert!(!a.contains_point(10, 60));
    }

    #[test]
    fn shared_edge_is_not_overlap() {
        let a = r(0, 0, 10, 10);
        assert!(!a.overlaps(&r(10, 0, 10, 10)));
        assert!(!a.overlaps(&r(0, 10, 10, 10)));
        assert!(a.overlaps(&r(9, 9, 10, 10)));
    }

    #[test]
    fn edge_setters_keep_size() {
        let mut a = r(0, 0, 40, 40);
        a.set_right(100);
        assert_eq!((a.x, a.size()), (60, (40, 40)));
        a.set_bottom(620);
        assert_eq!(a.y, 580);
        a.set_left(5);
        a.set_top(7);
        assert_eq!((a.x, a.y), (5, 7));
    }

    #[test]
    fn edges_saturate_at_i32_limits() {
        let mut a = r(i32::MAX - 10, i32::MAX - 5, 40, 40);
        assert_eq!(a.right(), i32::MAX);
        assert_eq!(a.bottom(), i32::MAX);
        assert!(a.overlaps(&r(i32::MAX - 1, i32::MAX - 1, 1, 1)));

        a.set_left(i32::MIN + 3);
        a.set_right(i32::MIN + 10);
        assert_eq!(a.x, i32::MIN);
        a.set_bottom(i32::MIN);
        assert_eq!(a.y, i32::MIN);
    }

    #[test]
    fn set_size_validates() {
        let mut a = r(0, 0, 40, 40);
        assert!(a.set_size(0, 5).is_err());
        assert_eq!(a.size(), (40, 40));
        a.set_size(20, 60).unwrap();
        assert_eq!(a.size(), (20, 60));
    }
}
