//! Canvas input routing.
//!
//! [`CanvasController`] turns platform-agnostic [`InputEvent`]s into editor
//! calls: selection on click, drag-moves, palette drops, ctrl+wheel zoom,
//! keyboard shortcuts, and the pan gesture. Pointer coordinates are screen
//! space, relative to the canvas origin.
//!
//! The pan gesture is engaged by a middle/secondary press, or by a primary
//! press while space is held. It ends on pointer-up, pointer-leave, and focus
//! loss, whatever else happens in between.

use crate::session::Editor;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use ab_core::persist::KvStore;
use ab_core::{ComponentId, ComponentKind, hit_test};
use kurbo::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };
}

/// Toolbar buttons over the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    ZoomIn,
    ZoomOut,
    ResetView,
    ToggleGrid,
    ToggleSnap,
    ToggleLock,
}

/// Input events delivered to the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64, button: PointerButton },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    /// Pointer left the canvas element.
    PointerLeave,
    /// Window lost focus.
    FocusLost,
    Wheel { delta_y: f64, modifiers: Modifiers },
    KeyDown { key: String, modifiers: Modifiers },
    KeyUp { key: String },
    /// A palette entry released over the canvas.
    PaletteDrop { kind: ComponentKind, x: f64, y: f64 },
    View(ViewCommand),
}

impl InputEvent {
    /// Screen position, for pointer events that carry one.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y }
            | Self::PointerUp { x, y }
            | Self::PaletteDrop { x, y, .. } => Some(Point::new(*x, *y)),
            _ => None,
        }
    }
}

/// What handling an event touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Ignored,
    /// Zoom, pan, grid, or lock changed. Nothing to save.
    View,
    Selection,
    /// The document changed and was saved.
    Document,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Gesture {
    #[default]
    Idle,
    Pan {
        last: Point,
    },
    Drag {
        id: ComponentId,
        moved: bool,
    },
}

/// Pointer and keyboard state for one canvas.
#[derive(Debug, Default)]
pub struct CanvasController {
    gesture: Gesture,
    space_held: bool,
}

impl CanvasController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Pan { .. })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Drag { .. })
    }

    /// Route one event to the editor.
    pub fn handle<S: KvStore>(&mut self, editor: &mut Editor<S>, event: &InputEvent) -> Response {
        match event {
            InputEvent::PointerDown { x, y, button } => {
                self.pointer_down(editor, Point::new(*x, *y), *button)
            }
            InputEvent::PointerMove { x, y } => {
                let screen = Point::new(*x, *y);
                match &mut self.gesture {
                    Gesture::Pan { last } => {
                        let delta = screen - *last;
                        *last = screen;
                        editor.canvas_mut().pan_by(delta);
                        Response::View
                    }
                    Gesture::Drag { moved, .. } => {
                        *moved = true;
                        Response::Ignored
                    }
                    Gesture::Idle => Response::Ignored,
                }
            }
            InputEvent::PointerUp { x, y } => match std::mem::take(&mut self.gesture) {
                Gesture::Drag { id, moved: true } => {
                    if editor.drop_component(id, Point::new(*x, *y)) {
                        Response::Document
                    } else {
                        Response::Ignored
                    }
                }
                _ => Response::Ignored,
            },
            InputEvent::PointerLeave => {
                self.gesture = Gesture::Idle;
                Response::Ignored
            }
            InputEvent::FocusLost => {
                self.gesture = Gesture::Idle;
                self.space_held = false;
                Response::Ignored
            }
            InputEvent::Wheel { delta_y, modifiers } => {
                if modifiers.ctrl || modifiers.meta {
                    editor.canvas_mut().zoom_wheel(*delta_y);
                    Response::View
                } else {
                    Response::Ignored
                }
            }
            InputEvent::KeyDown { key, modifiers } => {
                match ShortcutMap::resolve(key, modifiers.ctrl, modifiers.shift, modifiers.alt, modifiers.meta) {
                    Some(action) => self.shortcut(editor, action),
                    None => Response::Ignored,
                }
            }
            InputEvent::KeyUp { key } => match ShortcutMap::resolve_release(key) {
                Some(action) => self.shortcut(editor, action),
                None => Response::Ignored,
            },
            InputEvent::PaletteDrop { kind, x, y } => {
                match editor.place_component(kind, Point::new(*x, *y)) {
                    Ok(Some(_)) => Response::Document,
                    Ok(None) => Response::Ignored,
                    Err(e) => {
                        log::warn!("drop rejected: {e}");
                        Response::Ignored
                    }
                }
            }
            InputEvent::View(command) => {
                let canvas = editor.canvas_mut();
                match command {
                    ViewCommand::ZoomIn => {
                        canvas.zoom_in();
                    }
                    ViewCommand::ZoomOut => {
                        canvas.zoom_out();
                    }
                    ViewCommand::ResetView => canvas.reset_view(),
                    ViewCommand::ToggleGrid => canvas.show_grid = !canvas.show_grid,
                    ViewCommand::ToggleSnap => canvas.snap_to_grid = !canvas.snap_to_grid,
                    ViewCommand::ToggleLock => canvas.locked = !canvas.locked,
                }
                Response::View
            }
        }
    }

    fn pointer_down<S: KvStore>(&mut self, editor: &mut Editor<S>, screen: Point, button: PointerButton) -> Response {
        if button != PointerButton::Primary || self.space_held {
            self.gesture = Gesture::Pan { last: screen };
            return Response::Ignored;
        }
        let point = editor.canvas().screen_to_document(screen);
        match hit_test(editor.document().components(), point) {
            Some(id) => {
                editor.select_component(Some(id));
                if !editor.canvas().locked {
                    self.gesture = Gesture::Drag { id, moved: false };
                }
            }
            None => {
                editor.select_component(None);
            }
        }
        Response::Selection
    }

    fn shortcut<S: KvStore>(&mut self, editor: &mut Editor<S>, action: ShortcutAction) -> Response {
        match action {
            ShortcutAction::Delete => match editor.selection().component {
                Some(id) if editor.delete_component(id) => Response::Document,
                _ => Response::Ignored,
            },
            ShortcutAction::Duplicate => {
                let Some(id) = editor.selection().component else {
                    return Response::Ignored;
                };
                match editor.duplicate_component(id) {
                    Some(copy) => {
                        editor.select_component(Some(copy));
                        Response::Document
                    }
                    None => Response::Ignored,
                }
            }
            ShortcutAction::ZoomIn => {
                editor.canvas_mut().zoom_in();
                Response::View
            }
            ShortcutAction::ZoomOut => {
                editor.canvas_mut().zoom_out();
                Response::View
            }
            ShortcutAction::ZoomReset => {
                editor.canvas_mut().reset_view();
                Response::View
            }
            ShortcutAction::PanStart => {
                self.space_held = true;
                Response::Ignored
            }
            ShortcutAction::PanEnd => {
                self.space_held = false;
                Response::Ignored
            }
            ShortcutAction::Deselect => {
                editor.select_component(None);
                Response::Selection
            }
        }
    }
}
