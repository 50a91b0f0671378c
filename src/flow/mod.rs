//! Client game flow: the phase machine driven once per tick by local input
//! and by events relayed from the opponent.

pub mod input;
pub mod scene;

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use crate::client::{Connector, SessionIntent, SessionLink};
use crate::engine::{
    is_ready, remaining, Board, CellState, Coord, FleetRule, MAX_SHIP_LENGTH, STANDARD_FLEET,
};
use crate::events::{GameEvent, GameEventKind};

pub use input::{PointerButton, UiEvent};
pub use scene::{Scene, Widget, WidgetId, WidgetKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Menu,
    NewGame,
    JoinGame,
    PlaceShips,
    PlayerReady,
    TheGame,
    TheEnd,
}

/// State of one player's client.
///
/// [`GameFlow::update`] never blocks: local input is applied first, then
/// every event that arrived since the previous tick. Entering `NewGame` or
/// `JoinGame` starts a background session task, so the flow must be driven
/// from within a Tokio runtime.
pub struct GameFlow {
    phase: Phase,
    connector: Arc<dyn Connector>,
    fleet: FleetRule,
    scene: Scene,
    my_board: Board,
    opponent_board: Board,
    sink: mpsc::UnboundedSender<GameEvent>,
    incoming: mpsc::UnboundedReceiver<GameEvent>,
    link: Option<SessionLink>,
    is_host: bool,
    opponent_ready: bool,
    my_turn: bool,
    /// Our last shot, until its outcome comes back.
    pending_shot: Option<Coord>,
    /// Set by the first coordinate event the peer sends in TheGame.
    peer_in_battle: bool,
    /// Shots that arrived before we re-entered TheGame after a withdrawal.
    early_shots: Vec<Coord>,
    disconnected: bool,
    exit_requested: bool,
    status: String,
}

impl GameFlow {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self::with_fleet(connector, STANDARD_FLEET)
    }

    pub fn with_fleet(connector: Arc<dyn Connector>, fleet: FleetRule) -> Self {
        let (sink, incoming) = mpsc::unbounded_channel();
        let mut flow = Self {
            phase: Phase::Menu,
            connector,
            fleet,
            scene: Scene::new(),
            my_board: Board::with_longest_ship(fleet.longest()),
            opponent_board: Board::with_longest_ship(fleet.longest()),
            sink,
            incoming,
            link: None,
            is_host: false,
            opponent_ready: false,
            my_turn: false,
            pending_shot: None,
            peer_in_battle: false,
            early_shots: Vec::new(),
            disconnected: false,
            exit_requested: false,
            status: String::new(),
        };
        flow.enter(Phase::Menu);
        flow.sync_scene();
        flow
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn fleet(&self) -> &FleetRule {
        &self.fleet
    }

    pub fn my_board(&self) -> &Board {
        &self.my_board
    }

    pub fn opponent_board(&self) -> &Board {
        &self.opponent_board
    }

    pub fn my_turn(&self) -> bool {
        self.my_turn
    }

    pub fn opponent_ready(&self) -> bool {
        self.opponent_ready
    }

    pub fn is_host(&self) -> bool {
        self.is_host
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// `Some(true)` once the game ended with ships of ours still afloat.
    pub fn outcome(&self) -> Option<bool> {
        (self.phase == Phase::TheEnd).then(|| self.my_board.has_alive_ships())
    }

    /// Flush everything queued for the opponent and end the session, giving
    /// up after `limit`.
    pub async fn shutdown(&mut self, limit: Duration) {
        if let Some(mut link) = self.link.take() {
            if timeout(limit, link.finish()).await.is_err() {
                warn!("Session did not finish within {:?}", limit);
            }
        }
    }

    /// Run one tick.
    pub fn update(&mut self, inputs: &[UiEvent]) {
        for input in inputs {
            self.handle_input(*input);
        }
        while let Ok(event) = self.incoming.try_recv() {
            self.handle_event(event);
        }
        self.sync_scene();
    }

    fn transition(&mut self, next: Phase) {
        debug!("Phase {:?} -> {:?}", self.phase, next);
        self.leave(self.phase);
        self.phase = next;
        self.enter(next);
    }

    fn enter(&mut self, phase: Phase) {
        match phase {
            Phase::Menu => {
                self.link = None;
                while self.incoming.try_recv().is_ok() {}
                self.is_host = false;
            }
            Phase::NewGame => self.open_session(SessionIntent::Host, "Creating session..."),
            Phase::JoinGame => self.open_session(SessionIntent::Join, "Joining session..."),
            Phase::PlaceShips => self.status = "Place your ships".to_string(),
            Phase::PlayerReady => {
                self.send(GameEvent::signal(GameEventKind::PlayerReady));
                if self.opponent_ready {
                    self.transition(Phase::TheGame);
                } else {
                    self.status = "Waiting for the opponent to get ready".to_string();
                }
            }
            Phase::TheGame => {
                // a shot still in flight keeps the turn with the defender
                self.my_turn = self.is_host && self.pending_shot.is_none();
                self.peer_in_battle = false;
                self.status = "Battle!".to_string();
                for coord in std::mem::take(&mut self.early_shots) {
                    if self.phase != Phase::TheGame || self.disconnected {
                        break;
                    }
                    self.peer_in_battle = true;
                    self.defend(coord);
                }
            }
            Phase::TheEnd => {
                self.my_turn = false;
                let banner = if self.my_board.has_alive_ships() {
                    "You won!"
                } else {
                    "You lost!"
                };
                info!("Game over: {}", banner);
                self.status = banner.to_string();
            }
        }
    }

    fn leave(&mut self, phase: Phase) {
        if phase == Phase::PlayerReady && !self.opponent_ready && !self.disconnected {
            self.send(GameEvent::signal(GameEventKind::PlayerNotReady));
        }
    }

    fn open_session(&mut self, intent: SessionIntent, status: &str) {
        self.my_board.clear();
        self.opponent_board.clear();
        self.is_host = intent == SessionIntent::Host;
        self.opponent_ready = false;
        self.my_turn = false;
        self.pending_shot = None;
        self.peer_in_battle = false;
        self.early_shots.clear();
        self.disconnected = false;
        self.status = status.to_string();
        self.link = Some(SessionLink::open(
            self.connector.clone(),
            intent,
            self.sink.clone(),
        ));
    }

    fn send(&mut self, event: GameEvent) {
        let result = match &self.link {
            Some(link) => link.send(event),
            None => Err(anyhow::anyhow!("No session to send {:?} on", event.kind())),
        };
        if let Err(e) = result {
            warn!("{}", e);
            self.mark_disconnected(&e.to_string());
        }
    }

    fn mark_disconnected(&mut self, reason: &str) {
        self.disconnected = true;
        self.my_turn = false;
        self.status = format!("Disconnected: {}", reason);
    }

    fn handle_input(&mut self, input: UiEvent) {
        match input {
            UiEvent::Escape => self.exit_requested = true,
            UiEvent::Clicked(id) => {
                if !self.scene.is_interactive(id) {
                    debug!("Ignoring click on inactive {:?}", id);
                    return;
                }
                self.on_click(id);
            }
            UiEvent::CellPressed {
                board,
                coord,
                button,
            } => {
                if self.disconnected || !self.scene.is_interactive(board) {
                    return;
                }
                self.on_cell_pressed(board, coord, button);
            }
        }
    }

    fn on_click(&mut self, id: WidgetId) {
        if id == WidgetId::ExitButton {
            self.exit_requested = true;
            return;
        }
        if self.disconnected {
            return;
        }
        match (self.phase, id) {
            (Phase::Menu, WidgetId::NewGameButton) => self.transition(Phase::NewGame),
            (Phase::Menu, WidgetId::JoinGameButton) => self.transition(Phase::JoinGame),
            (Phase::PlaceShips, WidgetId::ClearBoardButton) => self.my_board.clear(),
            (Phase::PlaceShips, WidgetId::ReadyButton) => {
                if is_ready(&self.my_board, &self.fleet) {
                    self.transition(Phase::PlayerReady);
                }
            }
            (Phase::PlayerReady, WidgetId::NotReadyButton) => self.transition(Phase::PlaceShips),
            (phase, id) => debug!("Ignoring click on {:?} in {:?}", id, phase),
        }
    }

    fn on_cell_pressed(&mut self, board: WidgetId, coord: Coord, button: PointerButton) {
        match (self.phase, board, button) {
            (Phase::PlaceShips, WidgetId::MyBoard, PointerButton::Primary) => {
                self.my_board.place_ship(coord)
            }
            (Phase::PlaceShips, WidgetId::MyBoard, PointerButton::Secondary) => {
                self.my_board.remove_ship(coord)
            }
            (Phase::TheGame, WidgetId::OpponentBoard, PointerButton::Primary) => self.fire(coord),
            _ => {}
        }
    }

    fn fire(&mut self, coord: Coord) {
        if !self.my_turn || !self.opponent_board.can_shoot(coord) {
            return;
        }
        debug!("Shooting at {}", coord);
        self.my_turn = false;
        self.pending_shot = Some(coord);
        self.send(GameEvent::shoot(coord));
    }

    fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Error(kind, reason) => self.on_error(kind, &reason),
            GameEvent::Signal(kind) => self.on_signal(kind),
            GameEvent::Coordinate(kind, coord) => self.on_coordinate(kind, coord),
        }
    }

    fn on_error(&mut self, kind: GameEventKind, reason: &str) {
        match self.phase {
            Phase::NewGame | Phase::JoinGame => {
                warn!("{:?}: {}", kind, reason);
                self.transition(Phase::Menu);
                self.status = format!("{:?}: {}", kind, reason);
            }
            Phase::Menu | Phase::TheEnd => debug!("Ignoring {:?} error: {}", kind, reason),
            _ => {
                warn!("Session lost ({:?}): {}", kind, reason);
                self.mark_disconnected(reason);
            }
        }
    }

    fn on_signal(&mut self, kind: GameEventKind) {
        match (self.phase, kind) {
            (Phase::NewGame, GameEventKind::NewGameStarted) => {
                self.status = "Waiting for an opponent".to_string();
            }
            (Phase::NewGame | Phase::JoinGame, GameEventKind::JoinedGame) => {
                info!("Opponent found");
                self.transition(Phase::PlaceShips);
            }
            (Phase::PlaceShips, GameEventKind::PlayerReady) => self.opponent_ready = true,
            (Phase::PlaceShips | Phase::PlayerReady, GameEventKind::PlayerNotReady) => {
                self.opponent_ready = false;
            }
            (Phase::PlayerReady, GameEventKind::PlayerReady) => {
                self.opponent_ready = true;
                self.transition(Phase::TheGame);
            }
            // the opponent withdrew while our ready was in flight; a shot we
            // fired meanwhile is held by the peer until it is ready again
            (Phase::TheGame, GameEventKind::PlayerNotReady) if !self.peer_in_battle => {
                info!("Opponent withdrew before the first exchange");
                self.opponent_ready = false;
                self.my_turn = false;
                self.transition(Phase::PlayerReady);
            }
            (Phase::TheGame, GameEventKind::GameEnded) => self.transition(Phase::TheEnd),
            (
                Phase::PlaceShips | Phase::PlayerReady | Phase::TheGame,
                GameEventKind::Disconnected,
            ) => {
                warn!("Opponent left the session");
                self.mark_disconnected("opponent left the session");
            }
            (phase, kind) => debug!("Ignoring {:?} in {:?}", kind, phase),
        }
    }

    fn on_coordinate(&mut self, kind: GameEventKind, coord: Coord) {
        if self.disconnected {
            debug!("Session is over, ignoring {:?} {}", kind, coord);
            return;
        }
        if self.phase != Phase::TheGame {
            let ready_again = matches!(self.phase, Phase::PlaceShips | Phase::PlayerReady);
            if kind == GameEventKind::Shoot && ready_again && self.opponent_ready {
                debug!("Holding shot at {} until we are back in battle", coord);
                self.early_shots.push(coord);
            } else {
                debug!("Ignoring {:?} {} in {:?}", kind, coord, self.phase);
            }
            return;
        }
        self.peer_in_battle = true;
        match kind {
            GameEventKind::Shoot => self.defend(coord),
            GameEventKind::Miss => {
                self.pending_shot = None;
                self.opponent_board.set(coord, CellState::Miss);
            }
            GameEventKind::Hit => {
                self.pending_shot = None;
                self.opponent_board.set(coord, CellState::ShipHit);
                self.my_turn = true;
            }
            GameEventKind::Destroyed => {
                self.pending_shot = None;
                self.opponent_board.set(coord, CellState::ShipHit);
                self.opponent_board.mark_destroyed_if_complete(coord);
                self.my_turn = true;
            }
            other => debug!("Ignoring {:?} {}", other, coord),
        }
    }

    /// Resolve an incoming shot against our board and report the outcome.
    fn defend(&mut self, coord: Coord) {
        let outcome = match self.my_board.shoot(coord) {
            Ok(true) => {
                if self.my_board.mark_destroyed_if_complete(coord) {
                    GameEventKind::Destroyed
                } else {
                    GameEventKind::Hit
                }
            }
            Ok(false) => GameEventKind::Miss,
            Err(e) => {
                warn!("Protocol violation, opponent shot at {}: {}", coord, e);
                self.mark_disconnected(&format!("opponent repeated a shot at {}", coord));
                return;
            }
        };
        debug!("Opponent shot at {}: {:?}", coord, outcome);
        self.my_turn = outcome == GameEventKind::Miss;
        self.send(GameEvent::Coordinate(outcome, coord));

        if !self.my_board.has_alive_ships() {
            self.send(GameEvent::signal(GameEventKind::GameEnded));
            self.transition(Phase::TheEnd);
        }
    }

    fn shipyard_text(&self) -> String {
        let left = remaining(&self.my_board, &self.fleet);
        (1..=MAX_SHIP_LENGTH)
            .rev()
            .filter(|len| self.fleet.required(*len) > 0 || left[len - 1] != 0)
            .map(|len| format!("{}: {}", len, left[len - 1]))
            .collect::<Vec<_>>()
            .join("  ")
    }

    /// Derive what is on screen from the current phase and state.
    fn sync_scene(&mut self) {
        let scene = &mut self.scene;
        scene.hide_all();
        scene.show(WidgetId::StatusLabel, false);
        scene.set_text(WidgetId::StatusLabel, self.status.clone());

        let opponent_text = if self.opponent_ready {
            "Opponent is ready"
        } else {
            "Opponent is placing ships"
        };
        scene.set_text(WidgetId::OpponentReadyLabel, opponent_text);

        match self.phase {
            Phase::Menu => {
                scene.show(WidgetId::NewGameButton, true);
                scene.show(WidgetId::JoinGameButton, true);
                scene.show(WidgetId::ExitButton, true);
            }
            Phase::NewGame | Phase::JoinGame => scene.show(WidgetId::ExitButton, true),
            Phase::PlaceShips => {
                let ready = is_ready(&self.my_board, &self.fleet);
                scene.show(WidgetId::MyBoard, true);
                scene.show(WidgetId::Shipyard, false);
                scene.show(WidgetId::ClearBoardButton, true);
                scene.show(WidgetId::ReadyButton, ready);
                scene.show(WidgetId::OpponentReadyLabel, false);
            }
            Phase::PlayerReady => {
                scene.show(WidgetId::MyBoard, false);
                scene.show(WidgetId::Shipyard, false);
                scene.show(WidgetId::NotReadyButton, true);
                scene.show(WidgetId::OpponentReadyLabel, false);
            }
            Phase::TheGame => {
                scene.show(WidgetId::MyBoard, false);
                scene.show(WidgetId::OpponentBoard, self.my_turn);
                scene.show(WidgetId::TurnLabel, false);
                let turn = if self.my_turn {
                    "Your turn"
                } else {
                    "Opponent's turn"
                };
                scene.set_text(WidgetId::TurnLabel, turn);
            }
            Phase::TheEnd => {
                scene.show(WidgetId::MyBoard, false);
                scene.show(WidgetId::OpponentBoard, false);
                scene.show(WidgetId::TheEndLabel, false);
                scene.set_text(WidgetId::TheEndLabel, self.status.clone());
                scene.show(WidgetId::ExitButton, true);
            }
        }
        if matches!(self.phase, Phase::PlaceShips | Phase::PlayerReady) {
            let text = self.shipyard_text();
            self.scene.set_text(WidgetId::Shipyard, text);
        }
        if self.disconnected {
            self.scene.disable_all();
            self.scene.show(WidgetId::ExitButton, true);
        }
    }
}
