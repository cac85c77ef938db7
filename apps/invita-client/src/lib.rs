pub mod absorb;
pub mod api;
pub mod channel;
pub mod config;
pub mod error;
pub mod guard;
pub mod nav;
pub mod reactions;
pub mod store;

use std::sync::Arc;

use api::ApiGateway;
use config::Config;
use nav::Navigator;
use reactions::ReactionBoard;
use store::SessionStore;

use crate::error::ClientError;

/// Shared client state: one store, one navigator, one gateway, one board.
///
/// Everything is injected so tests can swap in fakes; the persistent store
/// is the only cross-component mutable resource.
#[derive(Clone)]
pub struct ClientState {
    pub store: Arc<dyn SessionStore>,
    pub navigator: Arc<dyn Navigator>,
    pub config: Arc<Config>,
    pub api: ApiGateway,
    pub reactions: Arc<ReactionBoard>,
}

impl ClientState {
    pub fn new(
        config: Config,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let api = ApiGateway::new(&config, store.clone(), navigator.clone())?;
        Ok(Self {
            store,
            navigator,
            config: Arc::new(config),
            api,
            reactions: Arc::new(ReactionBoard::new()),
        })
    }
}
