use chrono::{Duration, Local};
use sea_orm::Database;
use tokio::sync::broadcast::Receiver;

use engine::{
    AccountId, Authenticator, Engine, EngineError, LedgerEvent, Money, NewItem, ResultEngine,
    SaleCmd, Scope, Session,
};
use migration::MigratorTrait;

async fn session_with_db() -> (Session, AccountId, AccountId) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    let alice = engine
        .create_account("alice", "secret", "alice@example.com")
        .await
        .unwrap();
    let bob = engine
        .create_account("bob", "hunter2", "bob@example.com")
        .await
        .unwrap();
    (Session::new(engine), alice, bob)
}

/// Stores passwords as is. Good enough to drive the session.
struct PlainAuth {
    engine: Engine,
}

impl Authenticator for PlainAuth {
    async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<AccountId> {
        match self.engine.account_by_username(username).await? {
            Some(account) if account.credential_hash == password => Ok(account.id),
            _ => Err(EngineError::AuthenticationFailed),
        }
    }

    async fn create_account(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> ResultEngine<AccountId> {
        self.engine.create_account(username, password, email).await
    }
}

fn drain(rx: &mut Receiver<LedgerEvent>) -> Vec<LedgerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn money(s: &str) -> Money {
    s.parse().unwrap()
}

#[tokio::test]
async fn starts_unscoped_and_refuses_work() {
    let (session, _alice, _bob) = session_with_db().await;
    let mut rx = session.subscribe();

    assert_eq!(session.scope(), Scope::Unscoped);
    let err = session
        .add_item(NewItem::new("Widget", 1, money("1.00")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unscoped(_)));

    let events = drain(&mut rx);
    assert!(matches!(
        events.as_slice(),
        [LedgerEvent::ErrorOccurred { .. }]
    ));
}

#[tokio::test]
async fn scoping_publishes_the_new_figures() {
    let (session, alice, _bob) = session_with_db().await;
    session.set_active_account(alice).await.unwrap();
    session
        .add_item(NewItem::new("Widget", 50, money("2.00")))
        .await
        .unwrap();

    let mut rx = session.subscribe();
    let items = session.list_items(&Default::default()).await.unwrap();
    session
        .record_sale(SaleCmd::new(items[0].id, 5, money("2.00")))
        .await
        .unwrap();

    let events = drain(&mut rx);
    assert!(events.contains(&LedgerEvent::RevenueChanged {
        total: money("10.00"),
        this_month: money("10.00"),
    }));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, LedgerEvent::ItemCountChanged { .. }))
    );
    assert!(matches!(
        events.last(),
        Some(LedgerEvent::SnapshotReady { .. })
    ));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.account, Some(alice));
    assert_eq!(snapshot.total_revenue, money("10.00"));
    assert_eq!(snapshot.total_inventory_value, money("90.00"));
}

#[tokio::test]
async fn switching_accounts_replaces_every_figure() {
    let (session, alice, bob) = session_with_db().await;
    session.set_active_account(alice).await.unwrap();
    for quantity in [1, 2, 3] {
        session
            .add_item(NewItem::new(format!("Low {quantity}"), quantity, money("1.00")))
            .await
            .unwrap();
    }
    assert_eq!(session.snapshot().low_stock_count, 3);

    let mut rx = session.subscribe();
    session.set_active_account(bob).await.unwrap();

    let events = drain(&mut rx);
    assert_eq!(
        events.first(),
        Some(&LedgerEvent::ScopeChanged {
            account: Some(bob)
        })
    );

    let snapshot = session.snapshot();
    assert_eq!(snapshot.account, Some(bob));
    assert_eq!(snapshot.total_items, 0);
    assert_eq!(snapshot.low_stock_count, 0);
    assert!(session.low_stock_items().await.unwrap().is_empty());
    assert!(
        session
            .list_items(&Default::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn setting_the_active_account_again_is_a_no_op() {
    let (session, alice, _bob) = session_with_db().await;
    session.set_active_account(alice).await.unwrap();

    let mut rx = session.subscribe();
    session.set_active_account(alice).await.unwrap();
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn unknown_accounts_are_rejected() {
    let (session, _alice, _bob) = session_with_db().await;
    let err = session
        .set_active_account(AccountId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert_eq!(session.scope(), Scope::Unscoped);
}

#[tokio::test]
async fn logout_zeroes_the_snapshot() {
    let (session, alice, _bob) = session_with_db().await;
    session.set_active_account(alice).await.unwrap();
    let id = session
        .add_item(NewItem::new("Widget", 50, money("2.00")))
        .await
        .unwrap();
    session
        .record_sale(SaleCmd::new(id, 1, money("2.00")))
        .await
        .unwrap();

    let mut rx = session.subscribe();
    session.logout();

    assert_eq!(session.scope(), Scope::Unscoped);
    assert_eq!(*session.snapshot(), Default::default());

    let events = drain(&mut rx);
    assert_eq!(
        events.first(),
        Some(&LedgerEvent::ScopeChanged { account: None })
    );
    assert!(events.contains(&LedgerEvent::ItemCountChanged { count: 0 }));
    assert!(events.contains(&LedgerEvent::RevenueChanged {
        total: Money::ZERO,
        this_month: Money::ZERO,
    }));
    assert!(matches!(
        session.total_revenue().await,
        Err(EngineError::Unscoped(_))
    ));
}

#[tokio::test]
async fn login_and_signup_scope_the_session() {
    let (session, alice, _bob) = session_with_db().await;
    let auth = PlainAuth {
        engine: session.engine().clone(),
    };

    let err = session.login(&auth, "alice", "wrong").await.unwrap_err();
    assert_eq!(err, EngineError::AuthenticationFailed);
    assert_eq!(session.scope(), Scope::Unscoped);

    assert_eq!(session.login(&auth, "alice", "secret").await.unwrap(), alice);
    assert_eq!(session.scope(), Scope::Account(alice));

    let carol = session
        .signup(&auth, "carol", "pw", "carol@example.com")
        .await
        .unwrap();
    assert_eq!(session.scope(), Scope::Account(carol));

    let duplicate = session.signup(&auth, "carol", "pw", "x@example.com").await;
    assert_eq!(
        duplicate,
        Err(EngineError::DuplicateUsername("carol".to_string()))
    );
    assert_eq!(session.scope(), Scope::Account(carol));
}

#[tokio::test]
async fn near_expiry_items_are_announced_on_every_refresh() {
    let (session, alice, _bob) = session_with_db().await;
    session.set_active_account(alice).await.unwrap();
    let today = Local::now().date_naive();
    let milk = session
        .add_item(
            NewItem::new("Milk", 20, money("1.00")).expiry_date(today + Duration::days(2)),
        )
        .await
        .unwrap();

    let mut rx = session.subscribe();
    session.refresh().await.unwrap();
    session.refresh().await.unwrap();

    let expiring: Vec<LedgerEvent> = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, LedgerEvent::ItemNearExpiry { .. }))
        .collect();
    assert_eq!(expiring.len(), 2);
    assert_eq!(
        expiring[0],
        LedgerEvent::ItemNearExpiry {
            item_id: milk,
            name: "Milk".to_string(),
            expiry_date: today + Duration::days(2),
        }
    );
}

#[tokio::test]
async fn background_refresh_delivers_a_snapshot() {
    let (session, alice, _bob) = session_with_db().await;
    session.set_active_account(alice).await.unwrap();
    session
        .add_item(NewItem::new("Widget", 5, money("2.00")))
        .await
        .unwrap();

    let mut rx = session.subscribe();
    session.spawn_refresh().await.unwrap();

    let ready = drain(&mut rx).into_iter().find_map(|e| match e {
        LedgerEvent::SnapshotReady { snapshot } => Some(snapshot),
        _ => None,
    });
    let snapshot = ready.unwrap();
    assert_eq!(snapshot.account, Some(alice));
    assert_eq!(snapshot.total_items, 1);
    assert_eq!(snapshot.low_stock_count, 1);
}
