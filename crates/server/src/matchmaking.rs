//! Matchmaking coordinator: pairs waiting players into game sessions.
//!
//! One `Matchmaker` is built at startup and shared behind an `Arc`. All state sits
//! behind a single mutex held for one logical operation. Session creation goes
//! through the injected `SessionStore` with the lock released; the choice of
//! which two players pair is made under the lock, so nobody is paired twice.
//!
//! Per player: Idle -> Waiting -> Paired -> Idle (claimed by polling), or
//! Waiting -> Idle (cancel or expiry).

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chess_core::{PlayerId, SessionId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::db::matches;
use crate::error::AppError;

pub const DEFAULT_WAITING_TTL_SECS: i64 = 5 * 60;
pub const DEFAULT_SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MatchStatus {
    Matched {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
    Queued,
    StillWaiting,
    Unknown,
}

#[derive(Debug, thiserror::Error)]
pub enum MatchmakingError {
    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("Session store error: {0}")]
    Store(String),
}

impl From<MatchmakingError> for AppError {
    fn from(e: MatchmakingError) -> Self {
        match e {
            MatchmakingError::UnknownPlayer(_) => AppError::NotFound(e.to_string()),
            MatchmakingError::Store(msg) => AppError::Internal(msg),
        }
    }
}

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Creates and persists a game session for two paired players.
pub trait SessionStore: Send + Sync + 'static {
    /// Fails with `UnknownPlayer` unless both ids resolve to existing, distinct
    /// players.
    fn create_session(
        &self,
        white: PlayerId,
        black: PlayerId,
    ) -> impl Future<Output = Result<SessionId, MatchmakingError>> + Send;
}

/// Postgres-backed store: one row in `matches` per session.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SessionStore for PgSessionStore {
    fn create_session(
        &self,
        white: PlayerId,
        black: PlayerId,
    ) -> impl Future<Output = Result<SessionId, MatchmakingError>> + Send {
        let pool = self.pool.clone();
        async move {
            match matches::create_match(&pool, white, black).await {
                Ok(Some(id)) => Ok(id),
                Ok(None) => {
                    let missing = match matches::missing_player(&pool, white, black).await {
                        Ok(Some(id)) => id,
                        _ => white,
                    };
                    Err(MatchmakingError::UnknownPlayer(missing))
                }
                Err(e) => Err(MatchmakingError::Store(e.to_string())),
            }
        }
    }
}

/// Two paired players. Each side is told about the session once, by polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub session_id: SessionId,
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    created_at: DateTime<Utc>,
    delivered_a: bool,
    delivered_b: bool,
}

impl Pairing {
    fn new(session_id: SessionId, player_a: PlayerId, player_b: PlayerId, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            player_a,
            player_b,
            created_at: now,
            delivered_a: false,
            delivered_b: false,
        }
    }

    fn awaits(&self, player: PlayerId) -> bool {
        (player == self.player_a && !self.delivered_a) || (player == self.player_b && !self.delivered_b)
    }

    fn deliver(&mut self, player: PlayerId) {
        if player == self.player_a {
            self.delivered_a = true;
        }
        if player == self.player_b {
            self.delivered_b = true;
        }
    }

    fn fully_delivered(&self) -> bool {
        self.delivered_a && self.delivered_b
    }
}

#[derive(Default)]
struct State {
    /// player -> when they (last) asked for a game
    waiting: HashMap<PlayerId, DateTime<Utc>>,
    /// players chosen for a pairing whose session is being created
    in_flight: HashSet<PlayerId>,
    pairings: HashMap<SessionId, Pairing>,
}

impl State {
    fn purge_waiting(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.waiting.len();
        self.waiting.retain(|player, since| {
            let keep = *since >= cutoff;
            if !keep {
                debug!(player, "removed stale waiting player");
            }
            keep
        });
        before - self.waiting.len()
    }

    fn purge_pairings(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.pairings.len();
        self.pairings.retain(|_, p| p.created_at >= cutoff);
        before - self.pairings.len()
    }

    /// Insert or move the timestamp forward. Never rewinds.
    fn refresh(&mut self, player: PlayerId, now: DateTime<Utc>) {
        self.waiting
            .entry(player)
            .and_modify(|since| {
                if now > *since {
                    *since = now;
                }
            })
            .or_insert(now);
    }

    fn claim_pairing(&mut self, player: PlayerId) -> Option<SessionId> {
        self.claim_where(player, |p| p.awaits(player))
    }

    /// Claim a pairing the player has not heard about at all, i.e. one where
    /// they were the waiting side.
    fn claim_unannounced(&mut self, player: PlayerId) -> Option<SessionId> {
        self.claim_where(player, |p| p.player_a == player && p.awaits(player))
    }

    /// Mark as delivered every pairing whose session id the player already
    /// got back from their own request.
    fn release_announced(&mut self, player: PlayerId) {
        self.pairings.retain(|_, p| {
            if p.player_b == player && p.awaits(player) {
                p.deliver(player);
                debug!(player, session_id = p.session_id, "announced pairing released by new request");
            }
            !p.fully_delivered()
        });
    }

    fn claim_where(&mut self, player: PlayerId, pred: impl Fn(&Pairing) -> bool) -> Option<SessionId> {
        let session_id = self.pairings.values().find(|p| pred(p)).map(|p| p.session_id)?;
        let pairing = self.pairings.get_mut(&session_id)?;
        pairing.deliver(player);
        if pairing.fully_delivered() {
            self.pairings.remove(&session_id);
        }
        self.waiting.remove(&player);
        Some(session_id)
    }
}

pub struct Matchmaker<S, C = SystemClock> {
    store: S,
    clock: C,
    ttl: chrono::Duration,
    state: Mutex<State>,
}

pub type SharedMatchmaker = Arc<Matchmaker<PgSessionStore, SystemClock>>;

impl<S: SessionStore, C: Clock> Matchmaker<S, C> {
    pub fn new(store: S, clock: C, ttl: chrono::Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            state: Mutex::new(State::default()),
        }
    }

    fn cutoff(&self) -> DateTime<Utc> {
        self.clock.now() - self.ttl
    }

    /// Pair `player` with any other waiting player, or queue them.
    ///
    /// The opponent is whichever waiting player the map yields first, not
    /// necessarily the longest waiting. The waiting opponent plays White.
    ///
    /// A waiting player who was paired but has not polled yet gets that
    /// pairing back. A pairing this player already received from an earlier
    /// request is given up, so asking again always looks for a new game.
    /// While the player's own pairing is being created the answer is
    /// `StillWaiting`, the same as `poll_match` gives.
    pub async fn request_match(&self, player: PlayerId) -> Result<MatchStatus, MatchmakingError> {
        let (opponent, opponent_since) = {
            let mut state = self.state.lock().await;
            state.purge_waiting(self.cutoff());

            if state.in_flight.contains(&player) {
                return Ok(MatchStatus::StillWaiting);
            }
            state.release_announced(player);
            if let Some(session_id) = state.claim_unannounced(player) {
                debug!(player, session_id, "request answered with pending pairing");
                return Ok(MatchStatus::Matched { session_id });
            }

            let found = state
                .waiting
                .iter()
                .find(|(p, _)| **p != player)
                .map(|(&p, &since)| (p, since));
            match found {
                Some((opponent, since)) => {
                    state.waiting.remove(&opponent);
                    state.waiting.remove(&player);
                    state.in_flight.insert(opponent);
                    state.in_flight.insert(player);
                    (opponent, since)
                }
                None => {
                    state.refresh(player, self.clock.now());
                    debug!(player, "player added to waiting queue");
                    return Ok(MatchStatus::Queued);
                }
            }
        };

        let created = self.store.create_session(opponent, player).await;

        let mut state = self.state.lock().await;
        state.in_flight.remove(&opponent);
        state.in_flight.remove(&player);
        match created {
            Ok(session_id) => {
                let pairing = Pairing::new(session_id, opponent, player, self.clock.now());
                state.pairings.insert(session_id, pairing);
                info!(session_id, white = opponent, black = player, "players paired");
                Ok(MatchStatus::Matched { session_id })
            }
            Err(e) => {
                let opponent_unknown = matches!(e, MatchmakingError::UnknownPlayer(id) if id == opponent);
                if !opponent_unknown {
                    state.waiting.entry(opponent).or_insert(opponent_since);
                }
                warn!(player, opponent, error = %e, "failed to create session for pairing");
                Err(e)
            }
        }
    }

    /// Status of a player who asked for a game earlier.
    pub async fn poll_match(&self, player: PlayerId) -> MatchStatus {
        let mut state = self.state.lock().await;
        state.purge_waiting(self.cutoff());

        if state.waiting.contains_key(&player) || state.in_flight.contains(&player) {
            return MatchStatus::StillWaiting;
        }
        match state.claim_pairing(player) {
            Some(session_id) => {
                debug!(player, session_id, "pairing delivered");
                MatchStatus::Matched { session_id }
            }
            None => MatchStatus::Unknown,
        }
    }

    /// Leave the waiting set. No effect once the player has been paired.
    pub async fn cancel_waiting(&self, player: PlayerId) -> bool {
        let mut state = self.state.lock().await;
        let removed = state.waiting.remove(&player).is_some();
        if removed {
            debug!(player, "player cancelled waiting");
        }
        removed
    }

    /// Drop waiting entries and undelivered pairings older than the TTL.
    /// Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let cutoff = self.cutoff();
        let mut state = self.state.lock().await;
        state.purge_waiting(cutoff) + state.purge_pairings(cutoff)
    }

    pub async fn waiting_count(&self) -> usize {
        self.state.lock().await.waiting.len()
    }

    pub async fn is_waiting(&self, player: PlayerId) -> bool {
        self.state.lock().await.waiting.contains_key(&player)
    }

    /// Run `sweep` every `period` until the returned handle is shut down or
    /// dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> SweeperHandle {
        let (shutdown, mut stop) = oneshot::channel::<()>();
        let this = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = this.sweep().await;
                        if removed > 0 {
                            debug!(removed, "matchmaking sweep");
                        }
                    }
                    _ = &mut stop => break,
                }
            }
            debug!("matchmaking sweeper stopped");
        });
        SweeperHandle { shutdown, task }
    }
}

/// Owns the background sweep task.
pub struct SweeperHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            warn!("matchmaking sweeper ended abnormally: {e}");
        }
    }
}
