use crate::engine::Coord;
use crate::flow::scene::WidgetId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Discrete input edges reported by the presentation layer for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// A button was pressed.
    Clicked(WidgetId),
    /// A cell of one of the two board widgets was pressed.
    CellPressed {
        board: WidgetId,
        coord: Coord,
        button: PointerButton,
    },
    /// The quit key.
    Escape,
}

impl UiEvent {
    pub fn primary(board: WidgetId, coord: Coord) -> Self {
        UiEvent::CellPressed {
            board,
            coord,
            button: PointerButton::Primary,
        }
    }

    pub fn secondary(board: WidgetId, coord: Coord) -> Self {
        UiEvent::CellPressed {
            board,
            coord,
            button: PointerButton::Secondary,
        }
    }
}
