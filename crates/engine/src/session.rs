//! The account scope controller.
//!
//! A [`Session`] owns the active [`Scope`] and the last computed
//! [`DashboardSnapshot`]. It starts unscoped; every switch or logout resets the
//! cached snapshot to zero before anything else, so figures of the previous
//! account are never shown under the new one. Changes are announced on the
//! session's [`EventBus`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    AccountId, Authenticator, DashboardSnapshot, Engine, EventBus, InventoryItem, ItemQuery,
    ItemUpdate, LedgerEvent, Money, MonthlyRevenue, NewItem, ProductRevenue, ResultEngine, SaleCmd,
    SaleQuery, SaleRow, Scope,
};

#[derive(Debug, Default)]
struct State {
    scope: Scope,
    /// Bumped on every scope change; recomputations started under an older
    /// epoch are discarded.
    epoch: u64,
    snapshot: Arc<DashboardSnapshot>,
}

#[derive(Clone, Debug)]
pub struct Session {
    engine: Engine,
    events: EventBus,
    state: Arc<Mutex<State>>,
}

impl Session {
    pub fn new(engine: Engine) -> Self {
        let events = EventBus::new(engine.config().event_capacity);
        Self {
            engine,
            events,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    pub fn scope(&self) -> Scope {
        self.lock().scope
    }

    /// The last snapshot computed for the active account, zeroed when
    /// unscoped.
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        Arc::clone(&self.lock().snapshot)
    }

    /// Switch to `account` after checking it exists, then recompute.
    ///
    /// Switching to the account that is already active does nothing.
    pub async fn set_active_account(&self, account: AccountId) -> ResultEngine<()> {
        if self.scope() == Scope::Account(account) {
            return Ok(());
        }
        let found = self.engine.require_account(account).await;
        self.report(found)?;
        self.enter(account).await;
        Ok(())
    }

    /// Drop the active account and zero every cached figure.
    pub fn logout(&self) {
        let previous = {
            let mut state = self.lock();
            if !state.scope.is_scoped() {
                return;
            }
            state.scope = Scope::Unscoped;
            state.epoch += 1;
            std::mem::take(&mut state.snapshot)
        };
        tracing::info!("session logged out");
        self.events
            .publish(LedgerEvent::ScopeChanged { account: None });
        let zero = Arc::new(DashboardSnapshot::default());
        self.publish_changes(&previous, &zero);
        self.events
            .publish(LedgerEvent::SnapshotReady { snapshot: zero });
    }

    /// Check the credentials with `auth` and scope the session to the account
    /// it returns.
    pub async fn login<A: Authenticator>(
        &self,
        auth: &A,
        username: &str,
        password: &str,
    ) -> ResultEngine<AccountId> {
        let account = self.report(auth.authenticate(username, password).await)?;
        self.enter(account).await;
        Ok(account)
    }

    /// Register through `auth` and scope the session to the new account.
    pub async fn signup<A: Authenticator>(
        &self,
        auth: &A,
        username: &str,
        password: &str,
        email: &str,
    ) -> ResultEngine<AccountId> {
        let account = self.report(auth.create_account(username, password, email).await)?;
        self.enter(account).await;
        Ok(account)
    }

    /// Recompute the snapshot for the active account and publish what changed.
    ///
    /// Returns the session's snapshot afterwards. If the scope changed while
    /// computing, the stale result is dropped.
    pub async fn refresh(&self) -> ResultEngine<Arc<DashboardSnapshot>> {
        let (scope, epoch) = {
            let state = self.lock();
            (state.scope, state.epoch)
        };
        let computed = self.engine.dashboard(&scope).await;
        let snapshot = Arc::new(self.report(computed)?);
        Ok(self.install(epoch, snapshot))
    }

    /// Run [`Session::refresh`] on a background task. The result arrives as a
    /// [`LedgerEvent::SnapshotReady`].
    pub fn spawn_refresh(&self) -> JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(async move {
            // Failures are already published as `ErrorOccurred`.
            let _ = session.refresh().await;
        })
    }

    pub async fn add_item(&self, item: NewItem) -> ResultEngine<Uuid> {
        let added = self.engine.add_item(&self.scope(), item).await;
        let id = self.report(added)?;
        self.refresh_quietly().await;
        Ok(id)
    }

    pub async fn update_item(&self, id: Uuid, update: ItemUpdate) -> ResultEngine<bool> {
        let updated = self.engine.update_item(&self.scope(), id, update).await;
        let updated = self.report(updated)?;
        if updated {
            self.refresh_quietly().await;
        }
        Ok(updated)
    }

    pub async fn delete_item(&self, id: Uuid) -> ResultEngine<bool> {
        let deleted = self.engine.delete_item(&self.scope(), id).await;
        let deleted = self.report(deleted)?;
        if deleted {
            self.refresh_quietly().await;
        }
        Ok(deleted)
    }

    pub async fn record_sale(&self, cmd: SaleCmd) -> ResultEngine<Uuid> {
        let recorded = self.engine.record_sale(&self.scope(), cmd).await;
        let id = self.report(recorded)?;
        self.refresh_quietly().await;
        Ok(id)
    }

    pub async fn item(&self, id: Uuid) -> ResultEngine<Option<InventoryItem>> {
        let item = self.engine.item(&self.scope(), id).await;
        self.report(item)
    }

    pub async fn list_items(&self, query: &ItemQuery) -> ResultEngine<Vec<InventoryItem>> {
        let items = self.engine.list_items(&self.scope(), query).await;
        self.report(items)
    }

    pub async fn list_sales(&self, query: &SaleQuery) -> ResultEngine<Vec<SaleRow>> {
        let rows = self.engine.list_sales(&self.scope(), query).await;
        self.report(rows)
    }

    /// Low stock items under the configured policy.
    pub async fn low_stock_items(&self) -> ResultEngine<Vec<InventoryItem>> {
        let policy = self.engine.config().low_stock;
        let items = self.engine.low_stock_items(&self.scope(), policy).await;
        self.report(items)
    }

    /// Items expiring within the configured horizon.
    pub async fn expiring_items(&self) -> ResultEngine<Vec<InventoryItem>> {
        let horizon = self.engine.config().expiry_horizon_days;
        let items = self.engine.expiring_items(&self.scope(), horizon).await;
        self.report(items)
    }

    pub async fn total_inventory_value(&self) -> ResultEngine<Money> {
        let value = self.engine.total_inventory_value(&self.scope()).await;
        self.report(value)
    }

    pub async fn total_revenue(&self) -> ResultEngine<Money> {
        let revenue = self.engine.total_revenue(&self.scope()).await;
        self.report(revenue)
    }

    pub async fn revenue_this_month(&self) -> ResultEngine<Money> {
        let revenue = self.engine.revenue_this_month(&self.scope()).await;
        self.report(revenue)
    }

    pub async fn monthly_revenue(&self, months_back: u32) -> ResultEngine<Vec<MonthlyRevenue>> {
        let series = self.engine.monthly_revenue(&self.scope(), months_back).await;
        self.report(series)
    }

    pub async fn top_products(&self, n: usize) -> ResultEngine<Vec<ProductRevenue>> {
        let ranked = self.engine.top_products(&self.scope(), n).await;
        self.report(ranked)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self, account: AccountId) {
        {
            let mut state = self.lock();
            state.scope = Scope::Account(account);
            state.epoch += 1;
            state.snapshot = Arc::default();
        }
        tracing::info!(%account, "session scoped");
        self.events.publish(LedgerEvent::ScopeChanged {
            account: Some(account),
        });
        self.refresh_quietly().await;
    }

    async fn refresh_quietly(&self) {
        if let Err(err) = self.refresh().await {
            tracing::warn!(error = %err, "snapshot refresh failed");
        }
    }

    /// Store `snapshot` if the scope is still the one it was computed for and
    /// announce the differences. Returns the session's current snapshot.
    fn install(&self, epoch: u64, snapshot: Arc<DashboardSnapshot>) -> Arc<DashboardSnapshot> {
        let previous = {
            let mut state = self.lock();
            if state.epoch != epoch {
                tracing::debug!(epoch, current = state.epoch, "stale snapshot dropped");
                return Arc::clone(&state.snapshot);
            }
            std::mem::replace(&mut state.snapshot, Arc::clone(&snapshot))
        };

        self.publish_changes(&previous, &snapshot);
        for item in &snapshot.expiring_items {
            if let Some(expiry_date) = item.expiry_date {
                self.events.publish(LedgerEvent::ItemNearExpiry {
                    item_id: item.id,
                    name: item.name.clone(),
                    expiry_date,
                });
            }
        }
        self.events.publish(LedgerEvent::SnapshotReady {
            snapshot: Arc::clone(&snapshot),
        });
        snapshot
    }

    fn publish_changes(&self, previous: &DashboardSnapshot, current: &DashboardSnapshot) {
        if previous.total_items != current.total_items {
            self.events.publish(LedgerEvent::ItemCountChanged {
                count: current.total_items,
            });
        }
        if previous.low_stock_count != current.low_stock_count {
            self.events.publish(LedgerEvent::LowStockChanged {
                count: current.low_stock_count,
            });
        }
        if previous.total_revenue != current.total_revenue
            || previous.revenue_this_month != current.revenue_this_month
        {
            self.events.publish(LedgerEvent::RevenueChanged {
                total: current.total_revenue,
                this_month: current.revenue_this_month,
            });
        }
    }

    /// Publish the error, if any, as `ErrorOccurred`.
    fn report<T>(&self, result: ResultEngine<T>) -> ResultEngine<T> {
        if let Err(err) = &result {
            self.events.publish(LedgerEvent::ErrorOccurred {
                message: err.to_string(),
            });
        }
        result
    }
}
