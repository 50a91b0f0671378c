//! Automatic player: feeds a [`GameFlow`] the inputs a person would give it.

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::time::Duration;

use crate::client::SessionIntent;
use crate::engine::{is_ready, place_random_fleet, Board, CellState, Coord};
use crate::flow::{GameFlow, Phase, UiEvent, WidgetId};

/// Default pause between two ticks of a bot-driven flow.
pub const DEFAULT_TICK: Duration = Duration::from_millis(20);

const DEFAULT_MENU_ATTEMPTS: usize = 250;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Plays a random legal fleet and shoots at random, finishing off wounded
/// ships before searching elsewhere.
pub struct BotPlayer {
    rng: SmallRng,
    intent: SessionIntent,
    menu_attempts: usize,
    max_menu_attempts: usize,
}

impl BotPlayer {
    pub fn new(intent: SessionIntent, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        Self {
            rng,
            intent,
            menu_attempts: 0,
            max_menu_attempts: DEFAULT_MENU_ATTEMPTS,
        }
    }

    /// Give up after leaving the menu this many times without a game.
    pub fn with_max_menu_attempts(mut self, attempts: usize) -> Self {
        self.max_menu_attempts = attempts;
        self
    }

    /// Inputs for the next tick of `flow`.
    pub fn next_inputs(&mut self, flow: &GameFlow) -> Vec<UiEvent> {
        match flow.phase() {
            Phase::Menu => {
                if self.menu_attempts >= self.max_menu_attempts {
                    warn!("No game after {} attempts, giving up", self.menu_attempts);
                    return vec![UiEvent::Escape];
                }
                self.menu_attempts += 1;
                let button = match self.intent {
                    SessionIntent::Host => WidgetId::NewGameButton,
                    SessionIntent::Join => WidgetId::JoinGameButton,
                };
                vec![UiEvent::Clicked(button)]
            }
            Phase::PlaceShips => {
                if is_ready(flow.my_board(), flow.fleet()) {
                    return vec![UiEvent::Clicked(WidgetId::ReadyButton)];
                }
                self.layout_inputs(flow)
            }
            Phase::TheGame if flow.my_turn() => match self.choose_target(flow.opponent_board()) {
                Some(coord) => vec![UiEvent::primary(WidgetId::OpponentBoard, coord)],
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Clear the board, then press every cell of a freshly generated fleet.
    fn layout_inputs(&mut self, flow: &GameFlow) -> Vec<UiEvent> {
        let mut layout = Board::with_longest_ship(flow.fleet().longest());
        if let Err(e) = place_random_fleet(&mut layout, flow.fleet(), &mut self.rng) {
            warn!("Fleet layout failed: {}", e);
            return Vec::new();
        }
        let mut inputs = vec![UiEvent::Clicked(WidgetId::ClearBoardButton)];
        inputs.extend(
            Coord::all()
                .filter(|c| layout.get(*c) == CellState::Ship)
                .map(|c| UiEvent::primary(WidgetId::MyBoard, c)),
        );
        inputs
    }

    fn choose_target(&mut self, board: &Board) -> Option<Coord> {
        let wounded: Vec<Coord> = Coord::all()
            .filter(|c| board.get(*c) == CellState::ShipHit)
            .flat_map(neighbours)
            .filter(|c| board.can_shoot(*c))
            .collect();
        let candidates = if wounded.is_empty() {
            Coord::all().filter(|c| board.can_shoot(*c)).collect()
        } else {
            wounded
        };
        if candidates.is_empty() {
            return None;
        }
        let target = candidates[self.rng.random_range(0..candidates.len())];
        debug!("Bot targets {}", target);
        Some(target)
    }
}

fn neighbours(coord: Coord) -> impl Iterator<Item = Coord> {
    let (row, col) = (coord.row(), coord.col());
    [
        row.checked_sub(1).map(|r| (r, col)),
        Some((row + 1, col)),
        col.checked_sub(1).map(|c| (row, c)),
        Some((row, col + 1)),
    ]
    .into_iter()
    .flatten()
    .filter_map(|(r, c)| Coord::new(r, c))
}

/// Drive `flow` with `bot` until the game ends, the bot gives up or the
/// session is lost. Returns whether we won, or `None` without a result.
pub async fn play(flow: &mut GameFlow, bot: &mut BotPlayer, tick: Duration) -> Option<bool> {
    let result = drive(flow, bot, tick).await;
    flow.shutdown(FLUSH_TIMEOUT).await;
    result
}

async fn drive(flow: &mut GameFlow, bot: &mut BotPlayer, tick: Duration) -> Option<bool> {
    let mut ticker = tokio::time::interval(tick);
    loop {
        ticker.tick().await;
        let inputs = bot.next_inputs(flow);
        flow.update(&inputs);
        if let Some(won) = flow.outcome() {
            info!("Game finished, won: {}", won);
            return Some(won);
        }
        if flow.exit_requested() {
            return None;
        }
        if flow.is_disconnected() {
            warn!("{}", flow.status());
            return None;
        }
    }
}
