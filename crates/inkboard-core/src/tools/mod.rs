//! Tool state machines.
//!
//! Each tool turns raw pointer and key events into [`ToolResult`]s. A tool
//! owns its gesture state; the editor creates a fresh instance whenever the
//! active tool changes.

mod freedraw;
mod hand;
pub mod handles;
mod linear;
mod select;
mod shape;

pub use freedraw::FreedrawTool;
pub use hand::HandTool;
pub use linear::LinearTool;
pub use select::SelectTool;
pub use shape::ShapeTool;

use crate::config::EditorConfig;
use crate::element::{Element, ElementId, Style};
use crate::scene::Scene;
use crate::state::{EditorState, ToolResult};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    #[default]
    Select,
    Hand,
    Rectangle,
    Ellipse,
    Diamond,
    Line,
    Arrow,
    Freedraw,
}

impl ToolType {
    /// Single-key tool shortcut.
    pub fn from_shortcut(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'v' | '1' => Some(ToolType::Select),
            'h' => Some(ToolType::Hand),
            'r' | '2' => Some(ToolType::Rectangle),
            'd' | '3' => Some(ToolType::Diamond),
            'o' | '4' => Some(ToolType::Ellipse),
            'a' | '5' => Some(ToolType::Arrow),
            'l' | '6' => Some(ToolType::Line),
            'p' | '7' => Some(ToolType::Freedraw),
            _ => None,
        }
    }
}

/// Keys the tools react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Enter,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Char(char),
}

impl Key {
    /// Whether this is the character `c`, ignoring case.
    pub fn is_char(self, c: char) -> bool {
        matches!(self, Key::Char(k) if k.eq_ignore_ascii_case(&c))
    }
}

/// Uncommitted preview state of a tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    /// Box of a shape being dragged out.
    pub creation_bounds: Option<Rect>,
    /// Points of a polyline or stroke in progress, including the live point.
    pub points: Vec<Point>,
    pub marquee: Option<Rect>,
    /// Element an arrow endpoint would bind to.
    pub bind_target: Option<ElementId>,
}

/// Read-only view of the editor handed to tools.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    pub scene: &'a Scene,
    pub selection: &'a BTreeSet<ElementId>,
    pub viewport: &'a Viewport,
    pub clipboard: &'a [Element],
    pub tool_locked: bool,
    pub style: &'a Style,
    pub config: &'a EditorConfig,
    /// Pressure of the current pointer sample, `0.0..=1.0`.
    pub pressure: f64,
}

impl<'a> ToolContext<'a> {
    pub fn new(state: &'a EditorState, style: &'a Style, config: &'a EditorConfig, pressure: f64) -> Self {
        Self {
            scene: &state.scene,
            selection: &state.selection,
            viewport: &state.viewport,
            clipboard: &state.clipboard,
            tool_locked: state.tool_locked,
            style,
            config,
            pressure,
        }
    }

    /// Element hit tolerance in world units.
    pub fn hit_tolerance(&self) -> f64 {
        self.viewport.screen_to_world_len(self.config.hit_tolerance)
    }

    /// Handle hit tolerance in world units.
    pub fn handle_tolerance(&self) -> f64 {
        self.viewport.screen_to_world_len(self.config.handle_tolerance)
    }
}

/// Common contract of every tool. Points are in world coordinates.
pub trait Tool {
    fn on_pointer_down(&mut self, point: Point, ctx: &ToolContext, shift: bool) -> Option<ToolResult>;

    fn on_pointer_move(&mut self, point: Point, ctx: &ToolContext, screen_delta: Vec2) -> Option<ToolResult>;

    fn on_pointer_up(&mut self, point: Point, ctx: &ToolContext, is_double_click: bool) -> Option<ToolResult>;

    fn on_key_event(&mut self, key: Key, shift: bool, ctrl: bool, ctx: &ToolContext) -> Option<ToolResult>;

    /// Drop any gesture in progress without committing.
    fn reset(&mut self);

    fn overlay(&self) -> Overlay;
}

/// The instance of whichever tool is active.
#[derive(Debug, Clone)]
pub enum ActiveTool {
    Select(SelectTool),
    Hand(HandTool),
    Shape(ShapeTool),
    Linear(LinearTool),
    Freedraw(FreedrawTool),
}

impl ActiveTool {
    pub fn new(tool: ToolType) -> Self {
        match tool {
            ToolType::Select => ActiveTool::Select(SelectTool::new()),
            ToolType::Hand => ActiveTool::Hand(HandTool::new()),
            ToolType::Rectangle | ToolType::Ellipse | ToolType::Diamond => {
                ActiveTool::Shape(ShapeTool::new(tool))
            }
            ToolType::Line | ToolType::Arrow => ActiveTool::Linear(LinearTool::new(tool)),
            ToolType::Freedraw => ActiveTool::Freedraw(FreedrawTool::new()),
        }
    }

    pub fn tool_type(&self) -> ToolType {
        match self {
            ActiveTool::Select(_) => ToolType::Select,
            ActiveTool::Hand(_) => ToolType::Hand,
            ActiveTool::Shape(tool) => tool.tool_type(),
            ActiveTool::Linear(tool) => tool.tool_type(),
            ActiveTool::Freedraw(_) => ToolType::Freedraw,
        }
    }

    fn as_tool(&mut self) -> &mut dyn Tool {
        match self {
            ActiveTool::Select(tool) => tool,
            ActiveTool::Hand(tool) => tool,
            ActiveTool::Shape(tool) => tool,
            ActiveTool::Linear(tool) => tool,
            ActiveTool::Freedraw(tool) => tool,
        }
    }
}

impl Tool for ActiveTool {
    fn on_pointer_down(&mut self, point: Point, ctx: &ToolContext, shift: bool) -> Option<ToolResult> {
        self.as_tool().on_pointer_down(point, ctx, shift)
    }

    fn on_pointer_move(&mut self, point: Point, ctx: &ToolContext, screen_delta: Vec2) -> Option<ToolResult> {
        self.as_tool().on_pointer_move(point, ctx, screen_delta)
    }

    fn on_pointer_up(&mut self, point: Point, ctx: &ToolContext, is_double_click: bool) -> Option<ToolResult> {
        self.as_tool().on_pointer_up(point, ctx, is_double_click)
    }

    fn on_key_event(&mut self, key: Key, shift: bool, ctrl: bool, ctx: &ToolContext) -> Option<ToolResult> {
        self.as_tool().on_key_event(key, shift, ctrl, ctx)
    }

    fn reset(&mut self) {
        self.as_tool().reset()
    }

    fn overlay(&self) -> Overlay {
        match self {
            ActiveTool::Select(tool) => tool.overlay(),
            ActiveTool::Hand(tool) => tool.overlay(),
            ActiveTool::Shape(tool) => tool.overlay(),
            ActiveTool::Linear(tool) => tool.overlay(),
            ActiveTool::Freedraw(tool) => tool.overlay(),
        }
    }
}

/// Center a bound text label on its container and match its rotation.
pub fn center_label(label: &Element, container: &Element) -> Element {
    let mut centered = label.clone();
    let center = container.center();
    centered.x = center.x - label.width / 2.0;
    centered.y = center.y - label.height / 2.0;
    centered.angle = container.angle;
    centered
}
