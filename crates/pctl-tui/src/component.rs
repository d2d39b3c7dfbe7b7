//! Component trait: the interface every UI panel implements.
//!
//! - Components own their view state (cursor, scroll) and render themselves.
//! - Components receive `AppState` (read-only) for data the controller owns.
//! - Components produce `Vec<Action>`; the App applies them to the controller.

use ratatui::crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{layout::Rect, Frame};

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;

pub trait Component {
    fn id(&self) -> ComponentId;

    /// Handle a key event. Only called when this component has focus.
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action>;

    /// Handle a mouse event inside (or, while dragging, outside) `area`.
    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action>;

    /// React to an action dispatched by the App, focused or not.
    fn on_action(&mut self, _action: &Action, _state: &AppState) {}

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState);
}
