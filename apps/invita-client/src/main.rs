//! Headless feed watcher: the full client pipeline without a UI.
//!
//! Absorbs a login-redirect URL (if one is supplied), gates the landing
//! path, fetches the feed, opens the reaction channel, and logs live
//! updates until Ctrl-C.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use invita_client::absorb::RedirectAbsorber;
use invita_client::channel::{ChannelConfig, ChannelEvent, ReactionChannel, TungsteniteConnector};
use invita_client::config::Config;
use invita_client::guard::{GateState, RouteGuard};
use invita_client::nav::LoggingNavigator;
use invita_client::store::{FileStore, SessionStore};
use invita_client::ClientState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing — env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let store = Arc::new(FileStore::open(&config.store_path));
    let navigator = Arc::new(LoggingNavigator);

    let state = ClientState::new(config, store.clone(), navigator.clone())
        .expect("failed to build client");

    // First effect of a page load: absorb a login redirect if one happened.
    if let Ok(raw) = std::env::var("INVITA_REDIRECT_URL") {
        match Url::parse(&raw) {
            Ok(url) => {
                let absorber = RedirectAbsorber::new(
                    store.clone(),
                    navigator.clone(),
                    state.config.landing_path.clone(),
                );
                let outcome = absorber.absorb(&url);
                tracing::info!(?outcome, "redirect absorption");
            }
            Err(e) => tracing::warn!(?e, "INVITA_REDIRECT_URL is not a valid URL"),
        }
    }

    // Gate the landing path the way a guarded view would.
    let guard = RouteGuard::new(store.clone());
    let session = match guard.check(&state.config.landing_path) {
        GateState::Authorized => state.store.session(),
        _ => {
            tracing::warn!(
                login_url = %state.api.login_url(),
                "no session; sign in and re-run with INVITA_REDIRECT_URL set"
            );
            return;
        }
    };
    let email = session.map(|s| s.email);

    // Baseline fetch, then seed the reaction board.
    let feed = match state.api.fetch_feed(email.as_deref()).await {
        Ok(feed) => feed,
        Err(e) => {
            tracing::error!(%e, "feed fetch failed");
            return;
        }
    };
    tracing::info!(posts = feed.len(), "feed loaded");
    for post in &feed {
        state.reactions.seed(&post.id, &post.reactions);
    }

    // Live updates.
    let token = match state.store.session() {
        Some(s) => s.access_token,
        None => return, // Session expired during the fetch.
    };
    let mut channel_config = ChannelConfig::new(state.config.gateway_host.clone(), token);
    channel_config.fallback_delay = Duration::from_millis(state.config.fallback_delay_ms);

    let mut channel = ReactionChannel::connect(channel_config, Arc::new(TungsteniteConnector));

    loop {
        tokio::select! {
            event = channel.next_event() => {
                match event {
                    Some(ChannelEvent::Reaction { invitation_id, kind, count }) => {
                        state.reactions.apply_push(&invitation_id, kind, count);
                        tracing::info!(%invitation_id, %kind, count, "reaction update");
                    }
                    Some(ChannelEvent::Open { transport }) => {
                        tracing::info!(%transport, "live updates connected");
                    }
                    Some(ChannelEvent::Closed { transport }) => {
                        tracing::info!(%transport, "connection dropped, falling back");
                    }
                    Some(ChannelEvent::Exhausted { attempts }) => {
                        tracing::warn!(attempts, "live updates unavailable; showing last-fetched state");
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }
    // Dropping the channel closes the socket and stops reconnection.
}
