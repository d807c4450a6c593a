//! Game session manager.
//!
//! Owns the single live [`Session`], the derived [`GameState`] and the cached
//! [`UserProfile`]. Every operation validates local preconditions, delegates
//! I/O to the [`Transport`], merges the confirmed response and then publishes
//! on the [`EventBus`]. State is only ever written after a successful
//! response, so a failed call leaves everything as it was.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mines_core::{
    CashOutResponse, ErrorData, GameState, PickResponse, PickTileRequest, Session, SessionEvent,
    StartSessionRequest, UserProfile,
};
use mines_transport::{ApiRequest, Transport, TransportError, send_json};
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::bus::EventBus;

/// Result of a session operation.
pub type SessionResult<T> = Result<T, ErrorData>;

/// Outcome of a confirmed pick.
#[derive(Clone, Debug, PartialEq)]
pub struct PickResult {
    /// Response as received from the server.
    pub response: PickResponse,
    /// Session after the merge.
    pub session: Session,
    /// Game state after the merge.
    pub game_state: GameState,
}

impl PickResult {
    /// Whether the pick hit a mine.
    pub fn hit_mine(&self) -> bool {
        self.game_state == GameState::Lost
    }
}

/// Outcome of a confirmed cash-out.
#[derive(Clone, Debug, PartialEq)]
pub struct CashOutResult {
    /// Response as received from the server.
    pub response: CashOutResponse,
    /// Session after the merge.
    pub session: Session,
}

#[derive(Debug, Default)]
struct SessionState {
    session: Option<Session>,
    game_state: GameState,
    user: Option<UserProfile>,
    balance: Option<f64>,
}

/// Marks a mutating call as in flight; released on drop.
struct PendingGuard<'a>(&'a AtomicBool);

impl<'a> PendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool, action: &str) -> SessionResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| {
                debug!(action, "rejected: request pending");
                ErrorData::request_pending(action)
            })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Authoritative client-side owner of the game round.
///
/// Callers are expected to issue one mutating operation at a time; an
/// overlapping `start_game`, `pick_tile` or `cash_out` is rejected with
/// `REQUEST_PENDING` rather than queued.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    bus: Arc<EventBus>,
    state: RwLock<SessionState>,
    pending: AtomicBool,
    client_seed: RwLock<Option<String>>,
}

impl SessionManager {
    /// Create a manager with no session and no cached profile.
    pub fn new(transport: Arc<dyn Transport>, bus: Arc<EventBus>) -> Self {
        Self {
            transport,
            bus,
            state: RwLock::new(SessionState::default()),
            pending: AtomicBool::new(false),
            client_seed: RwLock::new(None),
        }
    }

    /// Bus this manager publishes on.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Set (or clear) the provably-fair seed sent with future session
    /// creation requests.
    pub fn set_client_seed(&self, seed: Option<String>) {
        *self.client_seed.write() = seed;
    }

    /// Seed sent with the next session creation request.
    pub fn client_seed(&self) -> Option<String> {
        self.client_seed.read().clone()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Create a new round, discarding the previous one on success.
    ///
    /// Bet and mine count are sent as given; the server enforces limits.
    #[instrument(skip(self))]
    pub async fn start_game(&self, bet_amount: f64, mine_count: u32) -> SessionResult<Session> {
        let guard = PendingGuard::acquire(&self.pending, "start game")?;

        let body = StartSessionRequest {
            bet_amount,
            mine_count,
            client_seed: self.client_seed(),
        };
        let result = match ApiRequest::start_session(&body) {
            Ok(request) => send_json::<Session>(self.transport.as_ref(), request).await,
            Err(e) => Err(e),
        };
        let session = match result {
            Ok(session) => session.into_fresh(),
            Err(e) => {
                drop(guard);
                return Err(self.fail("start game", e));
            }
        };

        {
            let mut state = self.state.write();
            if let Some(balance) = session.remaining_balance {
                state.balance = Some(balance);
            }
            state.session = Some(session.clone());
            state.game_state = GameState::Active;
        }
        drop(guard);

        info!(session_id = %session.session_id, "game session started");
        let _ = self.bus.publish(SessionEvent::GameSessionStarted(session.clone()));
        Ok(session)
    }

    /// Reveal `tile_index` in the active round.
    #[instrument(skip(self))]
    pub async fn pick_tile(&self, tile_index: u32) -> SessionResult<PickResult> {
        let session_id = self.active_session_id("pick tile")?;
        let guard = PendingGuard::acquire(&self.pending, "pick tile")?;

        let body = PickTileRequest {
            session_id: session_id.clone(),
            tile_index,
        };
        let result = match ApiRequest::pick_tile(&body) {
            Ok(request) => send_json::<PickResponse>(self.transport.as_ref(), request).await,
            Err(e) => Err(e),
        };
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                drop(guard);
                return Err(self.fail("pick tile", e));
            }
        };

        let (session, game_state) = {
            let mut state = self.state.write();
            let Some(session) = state.session.as_mut() else {
                return Err(ErrorData::no_active_session("pick tile"));
            };
            let status = session.apply_pick(tile_index, &response);
            let snapshot = session.clone();
            state.game_state = GameState::from(status);
            (snapshot, state.game_state)
        };
        drop(guard);

        match game_state {
            GameState::Lost => info!(
                session_id = %session_id,
                tile_index,
                mines = ?session.mine_positions,
                "mine hit"
            ),
            GameState::Completed => info!(session_id = %session_id, "all safe tiles revealed"),
            _ => debug!(session_id = %session_id, revealed = session.tiles_revealed.len(), "safe tile"),
        }

        let _ = self
            .bus
            .publish(SessionEvent::PickTileResponseReceived(response.clone()));
        Ok(PickResult {
            response,
            session,
            game_state,
        })
    }

    /// Cash out the active round.
    #[instrument(skip(self))]
    pub async fn cash_out(&self) -> SessionResult<CashOutResult> {
        let session_id = self.active_session_id("cash out")?;
        let guard = PendingGuard::acquire(&self.pending, "cash out")?;

        let request = ApiRequest::cash_out(&session_id);
        let response = match send_json::<CashOutResponse>(self.transport.as_ref(), request).await {
            Ok(response) => response,
            Err(e) => {
                drop(guard);
                return Err(self.fail("cash out", e));
            }
        };

        let session = {
            let mut state = self.state.write();
            let Some(session) = state.session.as_mut() else {
                return Err(ErrorData::no_active_session("cash out"));
            };
            session.apply_cash_out(&response);
            let snapshot = session.clone();
            state.game_state = GameState::Win;
            if response.balance.is_some() {
                state.balance = response.balance;
            }
            snapshot
        };
        drop(guard);

        info!(session_id = %session_id, win_amount = response.win_amount, "cashed out");
        let _ = self.bus.publish(SessionEvent::CashOutReceived(response.clone()));
        Ok(CashOutResult { response, session })
    }

    /// Fetch and cache the player's profile.
    #[instrument(skip(self))]
    pub async fn request_user_information(&self) -> SessionResult<UserProfile> {
        let profile = match send_json::<UserProfile>(self.transport.as_ref(), ApiRequest::user()).await {
            Ok(profile) => profile,
            Err(e) => return Err(self.fail("request user information", e)),
        };

        {
            let mut state = self.state.write();
            state.balance = Some(profile.balance);
            state.user = Some(profile.clone());
        }

        info!(user_id = %profile.user_id, balance = profile.balance, "user information updated");
        let _ = self.bus.publish(SessionEvent::UserInfoUpdated(profile.clone()));
        Ok(profile)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    /// Snapshot of the live session, if any.
    pub fn session(&self) -> Option<Session> {
        self.state.read().session.clone()
    }

    /// Current game state.
    pub fn game_state(&self) -> GameState {
        self.state.read().game_state
    }

    /// Cached user profile, if fetched.
    pub fn user_profile(&self) -> Option<UserProfile> {
        self.state.read().user.clone()
    }

    /// Latest known balance from user info, session creation or cash-out.
    pub fn balance(&self) -> Option<f64> {
        self.state.read().balance
    }

    /// Whether a mutating call is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Mine positions disclosed for the live session; empty while active.
    pub fn revealed_mines(&self) -> Vec<u32> {
        self.state
            .read()
            .session
            .as_ref()
            .map(|s| s.mine_positions.clone())
            .unwrap_or_default()
    }

    /// The tile that ended the live session, if it was lost.
    pub fn fatal_tile(&self) -> Option<u32> {
        self.state.read().session.as_ref().and_then(|s| s.fatal_tile)
    }

    // ─────────────────────────────────────────────────────────────────────

    fn active_session_id(&self, action: &str) -> SessionResult<mines_core::SessionId> {
        let state = self.state.read();
        match &state.session {
            Some(session) if state.game_state.is_active() => Ok(session.session_id.clone()),
            _ => {
                if state.game_state.is_terminal() {
                    debug!(action, game_state = ?state.game_state, "rejected: round already ended");
                } else {
                    debug!(action, "rejected: no session started");
                }
                Err(ErrorData::no_active_session(action))
            }
        }
    }

    /// Lower a transport failure, publish it and hand it back.
    fn fail(&self, action: &str, err: TransportError) -> ErrorData {
        warn!(action, kind = err.error_kind(), error = %err, "request failed");
        let data = ErrorData::from(err);
        let _ = self.bus.publish(SessionEvent::RequestError(data.clone()));
        data
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.read())
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}
