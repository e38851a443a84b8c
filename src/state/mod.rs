mod sse;

use std::{collections::VecDeque, sync::Arc};

use tokio::sync::{Mutex, RwLock, watch};

use crate::{
    config::AppConfig,
    dao::stats_store::StatsStore,
    dto::sse::{RawFrame, ServerEvent},
    engine::MatchEngine,
    upstream::{UpstreamLink, auth::SessionHandle},
};

pub use self::sse::SseHub;
use self::sse::SseState;

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Broadcast capacity of the public display stream.
const PUBLIC_SSE_CAPACITY: usize = 64;
/// Broadcast capacity of the diagnostic stream.
const DEBUG_SSE_CAPACITY: usize = 256;
/// Number of raw upstream frames retained for diagnostics.
const RAW_LOG_CAPACITY: usize = 500;

/// Top-level shared state wiring configuration, the statistics store,
/// the match engine, SSE hubs, and the upstream session together.
pub struct AppState {
    config: AppConfig,
    http: reqwest::Client,
    stats_store: RwLock<Option<Arc<StatsStore>>>,
    degraded: watch::Sender<bool>,
    sse: SseState,
    engine: Mutex<MatchEngine>,
    upstream: RwLock<Option<UpstreamLink>>,
    board_address: RwLock<Option<String>>,
    session: SessionHandle,
    raw_log: Mutex<VecDeque<RawFrame>>,
}

impl AppState {
    /// Create the shared state. The instance starts degraded until the
    /// store supervisor installs a connection.
    pub fn new(config: AppConfig, http: reqwest::Client) -> SharedState {
        let (degraded, _watcher) = watch::channel(true);
        let use_db = config.database_url.is_some();
        Arc::new(Self {
            config,
            http,
            stats_store: RwLock::new(None),
            degraded,
            sse: SseState::new(PUBLIC_SSE_CAPACITY, DEBUG_SSE_CAPACITY),
            engine: Mutex::new(MatchEngine::new(use_db)),
            upstream: RwLock::new(None),
            board_address: RwLock::new(None),
            session: SessionHandle::default(),
            raw_log: Mutex::new(VecDeque::with_capacity(RAW_LOG_CAPACITY)),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared HTTP client used for every REST call.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Current statistics store, `None` while degraded.
    pub async fn stats_store(&self) -> Option<Arc<StatsStore>> {
        self.stats_store.read().await.clone()
    }

    /// Install a live store connection and leave degraded mode.
    pub async fn install_stats_store(&self, store: StatsStore) {
        *self.stats_store.write().await = Some(Arc::new(store));
        self.degraded.send_replace(false);
    }

    /// Drop the store connection and enter degraded mode.
    pub async fn clear_stats_store(&self) {
        *self.stats_store.write().await = None;
        self.degraded.send_replace(true);
    }

    /// Whether the instance currently runs without a statistics store.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Watch degraded-mode flips.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Hub fanning display events out to SSE clients.
    pub fn public_sse(&self) -> &SseHub {
        self.sse.public()
    }

    /// Hub fanning diagnostic events out to SSE observers.
    pub fn debug_sse(&self) -> &SseHub {
        self.sse.debug()
    }

    /// The match engine; lock once per inbound frame.
    pub fn engine(&self) -> &Mutex<MatchEngine> {
        &self.engine
    }

    /// Sender half of the live push connection, when one is up.
    pub async fn upstream_link(&self) -> Option<UpstreamLink> {
        self.upstream.read().await.clone()
    }

    /// Install the sender half of a fresh push connection.
    pub async fn install_upstream(&self, link: UpstreamLink) {
        *self.upstream.write().await = Some(link);
    }

    /// Drop the push connection sender after a disconnect.
    pub async fn clear_upstream(&self) {
        *self.upstream.write().await = None;
    }

    /// Resolved board controller base address, when known.
    pub async fn board_address(&self) -> Option<String> {
        self.board_address.read().await.clone()
    }

    /// Remember the board controller address resolved at connect time.
    pub async fn set_board_address(&self, address: String) {
        *self.board_address.write().await = Some(address);
    }

    /// Upstream session tokens shared with the refresh loop.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Append a raw upstream frame to the rolling diagnostic log and fan
    /// it out to live observers.
    pub async fn record_raw_frame(&self, text: &str) {
        let frame = RawFrame::now(text);
        {
            let mut log = self.raw_log.lock().await;
            if log.len() == RAW_LOG_CAPACITY {
                log.pop_front();
            }
            log.push_back(frame.clone());
        }
        if let Ok(event) = ServerEvent::json(Some("raw".to_string()), &frame) {
            self.sse.debug().broadcast(event);
        }
    }

    /// Snapshot of the rolling diagnostic log, oldest first.
    pub async fn raw_frames(&self) -> Vec<RawFrame> {
        self.raw_log.lock().await.iter().cloned().collect()
    }

    /// Drop the diagnostic log, done when a fresh lobby starts.
    pub async fn clear_raw_frames(&self) {
        self.raw_log.lock().await.clear();
    }
}
