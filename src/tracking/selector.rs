use super::types::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// Pointer event in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: i32,
    pub y: i32,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: i32, y: i32) -> Self {
        Self { kind, x, y }
    }
}

/// Click-drag-release state machine producing a rectangle of interest
#[derive(Debug, Clone, Default)]
pub struct RegionSelector {
    /// Drag origin; `Some` while a drag is in progress
    origin: Option<(i32, i32)>,
    selection: Rect,
    bounds: Rect,
}

impl RegionSelector {
    pub fn new(frame_width: u32, frame_height: u32) -> Self {
        Self {
            origin: None,
            selection: Rect::default(),
            bounds: Rect::frame(frame_width, frame_height),
        }
    }

    /// Frame size the selection is clipped to
    pub fn set_bounds(&mut self, frame_width: u32, frame_height: u32) {
        self.bounds = Rect::frame(frame_width, frame_height);
    }

    pub fn is_selecting(&self) -> bool {
        self.origin.is_some()
    }

    /// Live (or last finalised) selection
    pub fn selection(&self) -> Rect {
        self.selection
    }

    /// Feed one pointer event; returns the frozen selection when a drag ends
    /// on a rectangle with non-zero area. An `Up` outside a drag returns `None`.
    pub fn handle(&mut self, event: PointerEvent) -> Option<Rect> {
        if let Some(origin) = self.origin {
            self.selection = Rect::spanning(origin, (event.x, event.y)).intersect(&self.bounds);
        }

        match event.kind {
            PointerKind::Down => {
                self.origin = Some((event.x, event.y));
                self.selection = Rect::new(event.x, event.y, 0, 0);
                None
            }
            PointerKind::Move => None,
            PointerKind::Up => {
                self.origin.take()?;
                if self.selection.is_empty() {
                    tracing::debug!("Ignoring degenerate selection {:?}", self.selection);
                    None
                } else {
                    Some(self.selection)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: PointerKind, x: i32, y: i32) -> PointerEvent {
        PointerEvent::new(kind, x, y)
    }

    #[test]
    fn drag_produces_and_freezes_rectangle() {
        let mut selector = RegionSelector::new(640, 480);

        assert_eq!(selector.handle(event(PointerKind::Down, 10, 10)), None);
        assert!(selector.is_selecting());
        assert_eq!(selector.selection(), Rect::new(10, 10, 0, 0));

        assert_eq!(selector.handle(event(PointerKind::Move, 50, 80)), None);
        assert_eq!(selector.selection(), Rect::new(10, 10, 40, 70));

        let frozen = selector.handle(event(PointerKind::Up, 50, 80));
        assert_eq!(frozen, Some(Rect::new(10, 10, 40, 70)));
        assert!(!selector.is_selecting());
    }

    #[test]
    fn drag_is_clipped_to_frame() {
        let mut selector = RegionSelector::new(100, 60);
        selector.handle(event(PointerKind::Down, 80, 40));
        selector.handle(event(PointerKind::Move, 150, 90));
        assert_eq!(selector.selection(), Rect::new(80, 40, 20, 20));

        selector.handle(event(PointerKind::Move, -30, -5));
        assert_eq!(selector.selection(), Rect::new(0, 0, 80, 40));
    }

    #[test]
    fn degenerate_drag_is_ignored() {
        let mut selector = RegionSelector::new(100, 100);
        selector.handle(event(PointerKind::Down, 20, 20));
        selector.handle(event(PointerKind::Move, 20, 70));
        assert_eq!(selector.handle(event(PointerKind::Up, 20, 70)), None);
        assert!(!selector.is_selecting());
    }

    #[test]
    fn events_outside_a_drag_are_ignored() {
        let mut selector = RegionSelector::new(100, 100);
        assert_eq!(selector.handle(event(PointerKind::Move, 30, 30)), None);
        assert_eq!(selector.handle(event(PointerKind::Up, 30, 30)), None);
        assert_eq!(selector.selection(), Rect::default());
    }
}
