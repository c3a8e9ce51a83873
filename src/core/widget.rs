//! Draggable floating control.
//!
//! Tracks where the control sits on screen and tells a click (toggle the panel) apart from a drag
//! (move the control) for both mouse and touch input: a gesture that never moved is a click.

/// Default edge length of the round control, in pixels.
pub const CONTROL_SIZE: f64 = 56.0;

/// Initial distance of the control's top-left corner from the right and bottom edges.
const INITIAL_INSET: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Size {
        Size { width, height }
    }
}

/// Screen position of a top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    /// `button` follows DOM numbering, 0 is the primary button.
    Mouse { button: u16 },
    Touch,
}

/// What the UI layer has to do after an input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Start listening for move/release events on the whole document.
    ListenersAttached,
    Moved(Position),
    /// Stop listening globally. `toggled` is set when the gesture counted as a click.
    ListenersDetached { toggled: bool },
}

#[derive(Debug, Clone, Copy)]
struct Gesture {
    /// Pointer position relative to the control's top-left corner at press time.
    offset: Point,
    origin: Point,
}

#[derive(Debug, Clone)]
pub struct DragController {
    viewport: Size,
    control: Size,
    position: Position,
    open: bool,
    gesture: Option<Gesture>,
    did_move: bool,
}

impl DragController {
    pub fn new(viewport: Size, control: Size) -> DragController {
        let mut controller = DragController {
            viewport,
            control,
            position: Position {
                top: viewport.height - INITIAL_INSET,
                left: viewport.width - INITIAL_INSET,
            },
            open: false,
            gesture: None,
            did_move: false,
        };
        controller.position = controller.clamp(controller.position);
        controller
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn control_size(&self) -> Size {
        self.control
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    /// Global listeners exist exactly while a gesture is active.
    pub fn listeners_attached(&self) -> bool {
        self.is_dragging()
    }

    /// Message input is disabled while the control is being dragged.
    pub fn input_enabled(&self) -> bool {
        !self.is_dragging()
    }

    pub fn press(&mut self, at: Point, source: PointerSource) -> Option<Effect> {
        if let PointerSource::Mouse { button } = source {
            if button != 0 {
                return None;
            }
        }

        let already_dragging = self.is_dragging();
        self.gesture = Some(Gesture {
            offset: Point::new(at.x - self.position.left, at.y - self.position.top),
            origin: at,
        });
        self.did_move = false;

        (!already_dragging).then_some(Effect::ListenersAttached)
    }

    pub fn drag_to(&mut self, at: Point) -> Option<Effect> {
        let gesture = self.gesture?;

        if at != gesture.origin {
            self.did_move = true;
        }

        self.position = self.clamp(Position {
            top: at.y - gesture.offset.y,
            left: at.x - gesture.offset.x,
        });

        Some(Effect::Moved(self.position))
    }

    /// Ends the gesture on button release, touch end or the pointer leaving the window.
    pub fn release(&mut self) -> Option<Effect> {
        self.gesture.take()?;

        let toggled = !self.did_move;
        if toggled {
            self.open = !self.open;
        }

        Some(Effect::ListenersDetached { toggled })
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Keeps the control on screen after the viewport changed size.
    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.position = self.clamp(self.position);
    }

    /// Both axes into `[0, viewport - control]`; the lower bound wins on tiny viewports.
    fn clamp(&self, position: Position) -> Position {
        let max_left = self.viewport.width - self.control.width;
        let max_top = self.viewport.height - self.control.height;

        Position {
            top: position.top.min(max_top).max(0.0),
            left: position.left.min(max_left).max(0.0),
        }
    }
}
