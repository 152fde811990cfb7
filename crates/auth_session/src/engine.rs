//! Session engine - runs effects for the auth state machine
//!
//! The engine owns the machine, the token broker, and the bridge
//! registrations. External events (user actions, host callbacks,
//! provider signals) are funnelled into one command queue and processed
//! by a single task, so broker calls are inherently serialized and no
//! two effects mutate the session concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info, warn};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Notify, RwLock};

use graph_client::{
    GraphClient, LoginPrompt, TokenBroker, TokenCache, SCOPES,
};
use native_bridge::names::{
    ACTION_ACQUIRE_MOBILE_TOKEN, ACTION_USER_SIGN_IN, ACTION_USER_SIGN_OUT, CB_GET_NEW_ACCESS_TOKEN,
    CB_MOBILE_LOGIN, CB_MOBILE_LOGOUT, CB_ON_AUTH_ERROR, CB_SET_LOADING,
};
use native_bridge::{parse_loading_flag, BridgeMessage, NativeBridge};
use todo_core::CardConfig;

use crate::machine::{AuthEvent, AuthPhase, StateMachine};
use crate::session::Session;

/// Commands draining into the engine's single processing task.
#[derive(Debug)]
enum Command {
    Start,
    Login,
    Logout,
    BridgeTokenPush(Value),
    BridgeTokenOrPlatform(Value),
    BridgeLoading(Value),
    BridgeLogout,
    BridgeAuthError(Value),
    ProviderLogin,
    ProviderLogout,
    BridgeWaitElapsed,
}

struct EngineInner {
    config: CardConfig,
    bridge: Arc<dyn NativeBridge>,
    broker: Arc<TokenBroker>,
    machine: Mutex<StateMachine>,
    session: RwLock<Session>,
    notify: Notify,
    /// Set once the host has answered the cached-token request, which
    /// disarms the bounded-wait fallback.
    bridge_answered: AtomicBool,
}

/// Handle to the auth session. Cheap to clone.
#[derive(Clone)]
pub struct SessionEngine {
    inner: Arc<EngineInner>,
    tx: mpsc::UnboundedSender<Command>,
}

impl SessionEngine {
    /// Create an engine with its own broker over the injected cache.
    pub fn new(
        config: CardConfig,
        bridge: Arc<dyn NativeBridge>,
        cache: Arc<dyn TokenCache>,
    ) -> Self {
        let broker = TokenBroker::new(&config, cache, LoginPrompt::Browser);
        Self::with_broker(config, bridge, broker)
    }

    /// Create an engine around a pre-built broker (custom authority or
    /// prompt).
    pub fn with_broker(
        config: CardConfig,
        bridge: Arc<dyn NativeBridge>,
        broker: TokenBroker,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(EngineInner {
            config,
            bridge,
            broker: Arc::new(broker),
            machine: Mutex::new(StateMachine::new()),
            session: RwLock::new(Session::default()),
            notify: Notify::new(),
            bridge_answered: AtomicBool::new(false),
        });

        let engine = Self {
            inner: inner.clone(),
            tx,
        };
        engine.register_bridge_callbacks();
        tokio::spawn(run(inner, rx));

        let _ = engine.tx.send(Command::Start);
        engine.request_cached_host_token();
        engine
    }

    fn register_bridge_callbacks(&self) {
        let bridge = &self.inner.bridge;

        let tx = self.tx.clone();
        bridge.register_callback(
            CB_MOBILE_LOGIN,
            Box::new(move |payload| {
                let _ = tx.send(Command::BridgeTokenPush(payload));
            }),
        );

        let tx = self.tx.clone();
        bridge.register_callback(
            CB_GET_NEW_ACCESS_TOKEN,
            Box::new(move |payload| {
                let _ = tx.send(Command::BridgeTokenOrPlatform(payload));
            }),
        );

        let tx = self.tx.clone();
        bridge.register_callback(
            CB_SET_LOADING,
            Box::new(move |payload| {
                let _ = tx.send(Command::BridgeLoading(payload));
            }),
        );

        let tx = self.tx.clone();
        bridge.register_callback(
            CB_MOBILE_LOGOUT,
            Box::new(move |_payload| {
                let _ = tx.send(Command::BridgeLogout);
            }),
        );

        let tx = self.tx.clone();
        bridge.register_callback(
            CB_ON_AUTH_ERROR,
            Box::new(move |payload| {
                let _ = tx.send(Command::BridgeAuthError(payload));
            }),
        );
    }

    /// Ask the host for its cached token and arm the bounded wait that
    /// falls back to the browser flow if the host never answers.
    fn request_cached_host_token(&self) {
        if !self.inner.bridge.is_native_host() {
            return;
        }

        self.inner.bridge.invoke_host(
            ACTION_ACQUIRE_MOBILE_TOKEN,
            json!({
                "randomVal": uuid::Uuid::new_v4().to_string(),
                "extName": self.inner.config.extension_identity(),
            }),
            false,
        );

        let wait = Duration::from_secs(self.inner.config.bridge_wait_secs);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            let _ = tx.send(Command::BridgeWaitElapsed);
        });
    }

    /// UI action: start an interactive sign-in.
    pub fn login(&self) {
        let _ = self.tx.send(Command::Login);
    }

    /// UI action: sign out.
    pub fn logout(&self) {
        let _ = self.tx.send(Command::Logout);
    }

    /// Identity-provider listener: background login signal.
    pub fn provider_login_event(&self) {
        let _ = self.tx.send(Command::ProviderLogin);
    }

    /// Identity-provider listener: background logout signal.
    pub fn provider_logout_event(&self) {
        let _ = self.tx.send(Command::ProviderLogout);
    }

    /// Deliver the authorization redirect query to a pending interactive
    /// login.
    pub fn deliver_redirect(&self, query: &str) -> bool {
        self.inner.broker.deliver_redirect(query)
    }

    /// Snapshot of the current session.
    pub async fn session(&self) -> Session {
        self.inner.session.read().await.clone()
    }

    /// Wait until the next session change.
    pub async fn changed(&self) {
        self.inner.notify.notified().await;
    }

    pub fn is_native_host(&self) -> bool {
        self.inner.bridge.is_native_host()
    }
}

async fn run(inner: Arc<EngineInner>, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        inner.handle_command(command).await;
        inner.notify.notify_waiters();
    }
    debug!("session engine command queue closed");
}

impl EngineInner {
    async fn handle_command(&self, command: Command) {
        match command {
            Command::Start => self.start().await,
            Command::Login => self.login().await,
            Command::Logout => self.logout().await,
            Command::BridgeTokenPush(payload) => self.bridge_token_push(&payload).await,
            Command::BridgeTokenOrPlatform(payload) => {
                self.bridge_token_or_platform(&payload).await
            }
            Command::BridgeLoading(payload) => self.bridge_loading(&payload).await,
            Command::BridgeLogout | Command::ProviderLogout => self.background_logout().await,
            Command::BridgeAuthError(payload) => self.bridge_auth_error(&payload).await,
            Command::ProviderLogin => self.provider_login().await,
            Command::BridgeWaitElapsed => self.bridge_wait_elapsed().await,
        }
    }

    fn phase(&self) -> AuthPhase {
        self.machine.lock().unwrap_or_else(|e| e.into_inner()).phase()
    }

    async fn apply_event(&self, event: AuthEvent) {
        let transition = self
            .machine
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .handle_event(event);
        if transition.changed {
            debug!(
                "auth phase {:?} -> {:?} on {:?}",
                transition.from, transition.to, transition.event
            );
        }
        self.session.write().await.phase = transition.to;
    }

    async fn start(&self) {
        if !self.config.is_complete() {
            info!("identity configuration incomplete; waiting");
            return;
        }
        self.silent_acquire(self.bridge.is_native_host()).await;
    }

    /// Run silent acquisition and feed its outcome into the machine.
    /// `native_host` decides whether a failure parks the machine for the
    /// host push or settles into the signed-out ready state.
    async fn silent_acquire(&self, native_host: bool) {
        match self.broker.acquire_silently(true).await {
            Ok(true) => {
                self.apply_event(AuthEvent::SilentAuthSucceeded).await;
                self.graph_initialize().await;
            }
            Ok(false) => {
                self.apply_event(AuthEvent::SilentAuthFailed { native_host })
                    .await;
            }
            Err(e) => {
                warn!("silent acquisition failed: {e}");
                self.session.write().await.error = true;
                self.apply_event(AuthEvent::SilentAuthFailed { native_host })
                    .await;
            }
        }
    }

    async fn login(&self) {
        self.apply_event(AuthEvent::LoginRequested).await;

        if self.bridge.is_native_host() {
            // The host owns sign-in; it answers through the token-push
            // callback rather than a return value.
            let platform = self.session.read().await.platform.clone();
            self.bridge.invoke_host(
                ACTION_USER_SIGN_IN,
                json!({
                    "clientId": self.config.aad_client_id,
                    "response_type": "token",
                    "scope": SCOPES.join(" "),
                    "provider": "microsoft",
                    "authority": self.broker.authorize_endpoint(),
                    "tokenUrl": self.broker.token_endpoint(),
                    "platform": platform,
                    "extName": self.config.extension_identity(),
                }),
                true,
            );
            return;
        }

        if !self.config.is_complete() {
            info!("login requested with incomplete configuration; waiting");
            return;
        }

        match self.broker.interactive_login().await {
            Ok(true) => {
                self.apply_event(AuthEvent::LoginSucceeded).await;
                self.graph_initialize().await;
            }
            Ok(false) => {
                // User likely bailed; no error flag.
                self.apply_event(AuthEvent::LoginFailed).await;
            }
            Err(e) => {
                warn!("interactive login failed: {e}");
                self.session.write().await.error = true;
                self.apply_event(AuthEvent::LoginFailed).await;
            }
        }
    }

    async fn logout(&self) {
        self.apply_event(AuthEvent::LogoutRequested).await;

        if self.bridge.is_native_host() {
            let platform = self.session.read().await.platform.clone();
            self.bridge.invoke_host(
                ACTION_USER_SIGN_OUT,
                json!({
                    "platform": platform,
                    "extName": self.config.extension_identity(),
                }),
                false,
            );
        }

        // Local cache clear plus best-effort provider revocation.
        self.broker.logout().await;

        {
            let mut session = self.session.write().await;
            session.logged_in = false;
            session.client = None;
        }
        self.apply_event(AuthEvent::LogoutCompleted).await;
    }

    /// Build the client handle from the broker's current token. Never
    /// runs on a native host, where the push path owns the client.
    async fn graph_initialize(&self) {
        if self.bridge.is_native_host() {
            return;
        }
        if !self.config.is_complete() {
            return;
        }

        match self.broker.cached_access_token().await {
            Some(token) => {
                let client = Arc::new(GraphClient::from_token(token));
                {
                    let mut session = self.session.write().await;
                    session.client = Some(client);
                    session.logged_in = true;
                    session.error = false;
                }
                self.apply_event(AuthEvent::ClientInitialized).await;
            }
            None => {
                self.apply_event(AuthEvent::ClientUnavailable).await;
            }
        }
    }

    /// Token push from the host: construct the client directly from the
    /// pushed token, no broker round-trip.
    async fn bridge_token_push(&self, payload: &Value) {
        let message = match BridgeMessage::parse(payload) {
            Ok(message) => message,
            Err(e) => {
                error!("dropping malformed token push: {e}");
                return;
            }
        };
        self.apply_token_push(message).await;
    }

    async fn apply_token_push(&self, message: BridgeMessage) {
        if let Some(platform) = message.platform.clone() {
            self.session.write().await.platform = Some(platform);
        }

        let Some(token) = message.token() else {
            warn!("token push without an access token; leaving session unchanged");
            return;
        };

        self.bridge_answered.store(true, Ordering::SeqCst);
        let client = Arc::new(GraphClient::from_token(token));
        {
            let mut session = self.session.write().await;
            session.client = Some(client);
            session.logged_in = true;
            session.error = false;
        }
        self.apply_event(AuthEvent::BridgeTokenApplied).await;
    }

    /// Host answer that carries either a token or only the platform.
    /// Platform-only means the host has no session for this user, which
    /// is an answered, signed-out state - distinct from "not asked yet".
    async fn bridge_token_or_platform(&self, payload: &Value) {
        let message = match BridgeMessage::parse(payload) {
            Ok(message) => message,
            Err(e) => {
                error!("dropping malformed host answer: {e}");
                return;
            }
        };

        if message.token().is_some() {
            self.apply_token_push(message).await;
            return;
        }

        if let Some(platform) = message.platform.clone() {
            self.session.write().await.platform = Some(platform);
            self.bridge_answered.store(true, Ordering::SeqCst);
            {
                let mut session = self.session.write().await;
                session.logged_in = false;
                session.client = None;
            }
            self.apply_event(AuthEvent::BridgeNoToken).await;
        } else {
            warn!("host answer carried neither token nor platform; dropping");
        }
    }

    async fn bridge_loading(&self, payload: &Value) {
        match parse_loading_flag(payload) {
            Some(true) => {
                self.session.write().await.loading = true;
            }
            Some(false) => {
                self.session.write().await.loading = false;
                self.apply_event(AuthEvent::BridgeLoadingFinished).await;
            }
            None => {
                warn!("unrecognized loading payload: {payload}");
            }
        }
    }

    async fn bridge_auth_error(&self, payload: &Value) {
        error!("host reported auth error: {payload}");
        self.bridge_answered.store(true, Ordering::SeqCst);
        self.session.write().await.error = true;
        self.apply_event(AuthEvent::AuthErrorReported).await;
    }

    async fn provider_login(&self) {
        self.apply_event(AuthEvent::ProviderLoginEvent).await;
        self.apply_event(AuthEvent::GraphInitializeRequested).await;
        self.graph_initialize().await;
    }

    async fn background_logout(&self) {
        self.apply_event(AuthEvent::ProviderLogoutEvent).await;
        {
            let mut session = self.session.write().await;
            session.logged_in = false;
            session.client = None;
        }
        self.apply_event(AuthEvent::SessionCleared).await;
    }

    /// The host never answered the cached-token request: stop waiting
    /// and fall back to the browser flow. A late push still applies.
    async fn bridge_wait_elapsed(&self) {
        if self.bridge_answered.load(Ordering::SeqCst) {
            return;
        }
        if self.phase() != AuthPhase::Initialize {
            return;
        }
        info!("native host did not answer; falling back to browser flow");
        self.silent_acquire(false).await;
    }
}
