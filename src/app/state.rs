use std::sync::Arc;

use chrono::Duration;

use crate::{
    app::events::EventBroadcaster,
    managers::{AttendanceLedger, Directory, InMemoryLedger, InMemoryTokenStore, TokenStore},
    services::{
        aggregator::LowAttendanceAggregator, identity::IdentityProvider, issuer::TokenIssuer,
        redemption::RedemptionValidator,
    },
    utils::clock::Clock,
};

/// Everything a request handler needs. Built once at startup and shared by clone.
#[derive(Clone)]
pub struct AppState {
    pub token_store: Arc<dyn TokenStore>,
    pub ledger: Arc<dyn AttendanceLedger>,
    pub directory: Arc<dyn Directory>,
    pub identity: Arc<dyn IdentityProvider>,
    pub clock: Arc<dyn Clock>,
    pub issuer: Arc<TokenIssuer>,
    pub validator: Arc<RedemptionValidator>,
    pub aggregator: Arc<LowAttendanceAggregator>,
    pub events: EventBroadcaster,
}

impl AppState {
    /// State backed by the in-memory token store and ledger.
    pub fn new(
        directory: Arc<dyn Directory>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        token_ttl: Duration,
    ) -> Self {
        Self::with_stores(
            Arc::new(InMemoryTokenStore::new()),
            Arc::new(InMemoryLedger::new()),
            directory,
            identity,
            clock,
            token_ttl,
        )
    }

    pub fn with_stores(
        token_store: Arc<dyn TokenStore>,
        ledger: Arc<dyn AttendanceLedger>,
        directory: Arc<dyn Directory>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        token_ttl: Duration,
    ) -> Self {
        let events = EventBroadcaster::new();

        let issuer = TokenIssuer::new(
            directory.clone(),
            token_store.clone(),
            clock.clone(),
            events.clone(),
            token_ttl,
        );
        let validator = RedemptionValidator::new(
            token_store.clone(),
            ledger.clone(),
            directory.clone(),
            clock.clone(),
            events.clone(),
        );
        let aggregator = LowAttendanceAggregator::new(ledger.clone(), directory.clone());

        Self {
            token_store,
            ledger,
            directory,
            identity,
            clock,
            issuer: Arc::new(issuer),
            validator: Arc::new(validator),
            aggregator: Arc::new(aggregator),
            events,
        }
    }
}
