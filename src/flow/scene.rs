//! Widgets owned by the game scene.
//!
//! The scene holds every widget in drawing order. The flow toggles
//! visibility, enabled state and label text; a presentation layer only reads
//! them back and reports presses as [`UiEvent`](super::UiEvent)s.

/// Identifies a widget of the scene. The discriminant is its drawing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetId {
    NewGameButton,
    JoinGameButton,
    ExitButton,
    StatusLabel,
    MyBoard,
    Shipyard,
    OpponentBoard,
    ReadyButton,
    NotReadyButton,
    ClearBoardButton,
    OpponentReadyLabel,
    TurnLabel,
    TheEndLabel,
}

impl WidgetId {
    pub const ALL: [WidgetId; 13] = [
        WidgetId::NewGameButton,
        WidgetId::JoinGameButton,
        WidgetId::ExitButton,
        WidgetId::StatusLabel,
        WidgetId::MyBoard,
        WidgetId::Shipyard,
        WidgetId::OpponentBoard,
        WidgetId::ReadyButton,
        WidgetId::NotReadyButton,
        WidgetId::ClearBoardButton,
        WidgetId::OpponentReadyLabel,
        WidgetId::TurnLabel,
        WidgetId::TheEndLabel,
    ];

    pub fn kind(self) -> WidgetKind {
        match self {
            WidgetId::NewGameButton
            | WidgetId::JoinGameButton
            | WidgetId::ExitButton
            | WidgetId::ReadyButton
            | WidgetId::NotReadyButton
            | WidgetId::ClearBoardButton => WidgetKind::Button,
            WidgetId::StatusLabel
            | WidgetId::OpponentReadyLabel
            | WidgetId::TurnLabel
            | WidgetId::TheEndLabel => WidgetKind::Label,
            WidgetId::MyBoard | WidgetId::OpponentBoard => WidgetKind::Board,
            WidgetId::Shipyard => WidgetKind::Shipyard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Button,
    Label,
    Board,
    Shipyard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    pub id: WidgetId,
    pub visible: bool,
    pub enabled: bool,
    pub text: String,
}

impl Widget {
    fn new(id: WidgetId) -> Self {
        Self {
            id,
            visible: false,
            enabled: false,
            text: default_text(id).to_string(),
        }
    }

    /// Whether presses on this widget should reach the flow.
    pub fn is_interactive(&self) -> bool {
        self.visible && self.enabled
    }
}

fn default_text(id: WidgetId) -> &'static str {
    match id {
        WidgetId::NewGameButton => "New game",
        WidgetId::JoinGameButton => "Join game",
        WidgetId::ExitButton => "Exit",
        WidgetId::ReadyButton => "Ready",
        WidgetId::NotReadyButton => "Not ready",
        WidgetId::ClearBoardButton => "Clear board",
        _ => "",
    }
}

/// Ordered collection of every widget, all hidden initially.
#[derive(Debug, Clone)]
pub struct Scene {
    widgets: Vec<Widget>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            widgets: WidgetId::ALL.iter().copied().map(Widget::new).collect(),
        }
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn get(&self, id: WidgetId) -> &Widget {
        &self.widgets[id as usize]
    }

    fn get_mut(&mut self, id: WidgetId) -> &mut Widget {
        &mut self.widgets[id as usize]
    }

    pub fn is_interactive(&self, id: WidgetId) -> bool {
        self.get(id).is_interactive()
    }

    pub fn hide_all(&mut self) {
        for widget in &mut self.widgets {
            widget.visible = false;
            widget.enabled = false;
        }
    }

    /// Keep everything on screen but stop accepting input.
    pub fn disable_all(&mut self) {
        for widget in &mut self.widgets {
            widget.enabled = false;
        }
    }

    /// Show `id` and make it accept input when `enabled`.
    pub fn show(&mut self, id: WidgetId, enabled: bool) {
        let widget = self.get_mut(id);
        widget.visible = true;
        widget.enabled = enabled;
    }

    pub fn set_text(&mut self, id: WidgetId, text: impl Into<String>) {
        self.get_mut(id).text = text.into();
    }

    pub fn text(&self, id: WidgetId) -> &str {
        &self.get(id).text
    }

    /// Widgets currently visible, in drawing order.
    pub fn visible(&self) -> impl Iterator<Item = &Widget> {
        self.widgets.iter().filter(|w| w.visible)
    }
}
