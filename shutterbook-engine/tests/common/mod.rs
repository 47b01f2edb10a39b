// Shared by every integration suite; not every suite uses every helper.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use shutterbook_domain::{
    Booking, ChargeRequest, EngineError, MiniSession, Notifier, PaymentProvider, PaymentResult,
    PaymentStatus, SessionDate, SessionRepository, Slot, SlotRepository, WaitlistEntry,
    WaitlistStatus,
};
use shutterbook_engine::{
    build_slots, BookingConfirmer, ExpirySweeper, HoldManager, WaitlistCoordinator,
};
use shutterbook_store::MemoryStore;

/// Base instant every test clock is derived from.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 7, 8, 0, 0).unwrap()
}

pub fn t(minutes: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(minutes)
}

/// Notification channel that counts what it was asked to send.
#[derive(Default)]
pub struct CountingNotifier {
    pub confirmed: AtomicUsize,
    pub cancelled: AtomicUsize,
    pub promoted: AtomicUsize,
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn booking_confirmed(&self, _booking: &Booking) {
        self.confirmed.fetch_add(1, Ordering::SeqCst);
    }
    async fn booking_cancelled(&self, _booking: &Booking) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }
    async fn waitlist_promoted(&self, _entry: &WaitlistEntry, _slot: &Slot) {
        self.promoted.fetch_add(1, Ordering::SeqCst);
    }
}

impl CountingNotifier {
    pub fn promoted_count(&self) -> usize {
        self.promoted.load(Ordering::SeqCst)
    }
}

/// Payment provider with a switchable decline mode.
#[derive(Default)]
pub struct ScriptedPayments {
    pub decline: AtomicBool,
    pub charges: AtomicUsize,
}

#[async_trait]
impl PaymentProvider for ScriptedPayments {
    async fn charge(&self, request: &ChargeRequest) -> Result<PaymentResult, EngineError> {
        self.charges.fetch_add(1, Ordering::SeqCst);
        if self.decline.load(Ordering::SeqCst) {
            Ok(PaymentResult {
                status: PaymentStatus::Failed,
                reference: None,
                failure_reason: Some("card declined".into()),
            })
        } else {
            Ok(PaymentResult {
                status: PaymentStatus::Succeeded,
                reference: Some(format!("txn-{}", request.slot_id)),
                failure_reason: None,
            })
        }
    }
}

pub struct SessionConfig {
    pub duration_minutes: i32,
    pub buffer_minutes: i32,
    pub hold_ttl_minutes: i64,
    pub deposit_amount: i64,
    pub capacity_per_slot: i32,
    pub allow_waitlist: bool,
    pub auto_confirm: bool,
    /// Date window length in minutes; slot count follows from duration.
    pub window_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            duration_minutes: 30,
            buffer_minutes: 0,
            hold_ttl_minutes: 5,
            deposit_amount: 0,
            capacity_per_slot: 1,
            allow_waitlist: true,
            auto_confirm: false,
            window_minutes: 30,
        }
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub holds: HoldManager,
    pub confirmer: BookingConfirmer,
    pub coordinator: Arc<WaitlistCoordinator>,
    pub sweeper: ExpirySweeper,
    pub notifier: Arc<CountingNotifier>,
    pub payments: Arc<ScriptedPayments>,
    pub session: MiniSession,
    pub date: SessionDate,
    pub slots: Vec<Slot>,
}

/// One session, one date, slots generated. All engine services share
/// the same in-memory store, so test interleavings exercise the same
/// conditional writes production would.
pub async fn harness(config: SessionConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let slots_repo: Arc<dyn SlotRepository> = store.clone();
    let sessions_repo: Arc<dyn SessionRepository> = store.clone();

    let session = MiniSession {
        id: Uuid::new_v4(),
        owner_id: "owner-1".into(),
        name: "Fall minis".into(),
        description: None,
        duration_minutes: config.duration_minutes,
        buffer_minutes: config.buffer_minutes,
        price: 20000,
        deposit_amount: config.deposit_amount,
        currency: "USD".into(),
        capacity_per_slot: config.capacity_per_slot,
        allow_waitlist: config.allow_waitlist,
        auto_confirm: config.auto_confirm,
        published: true,
        hold_ttl_minutes: Some(config.hold_ttl_minutes),
        location: None,
        created_at: t(-60),
        updated_at: t(-60),
    };
    let date = SessionDate {
        id: Uuid::new_v4(),
        mini_session_id: session.id,
        start_at: t0(),
        end_at: t(config.window_minutes),
        location_override: None,
        created_at: t(-60),
    };

    sessions_repo.create_session(session.clone()).await.unwrap();
    sessions_repo.create_date(date.clone()).await.unwrap();
    let generated = build_slots(&session, &date, t(-30));
    slots_repo.insert_slots(generated).await.unwrap();
    let slots = slots_repo.list_available(date.id, t(-30)).await.unwrap();

    let notifier = Arc::new(CountingNotifier::default());
    let payments = Arc::new(ScriptedPayments::default());

    let coordinator = Arc::new(WaitlistCoordinator::new(
        store.clone(),
        store.clone(),
        store.clone(),
        notifier.clone(),
        config.hold_ttl_minutes,
    ));
    let holds = HoldManager::new(store.clone(), store.clone(), config.hold_ttl_minutes);
    let confirmer = BookingConfirmer::new(
        store.clone(),
        store.clone(),
        store.clone(),
        payments.clone(),
        notifier.clone(),
        coordinator.clone(),
    );
    let sweeper = ExpirySweeper::new(store.clone(), coordinator.clone());

    Harness {
        store,
        holds,
        confirmer,
        coordinator,
        sweeper,
        notifier,
        payments,
        session,
        date,
        slots,
    }
}

impl Harness {
    pub async fn join_waitlist_at(
        &self,
        contact: &str,
        date_scoped: bool,
        preferred_times: Vec<String>,
        now: DateTime<Utc>,
    ) -> WaitlistEntry {
        self.coordinator
            .join(
                self.session.id,
                date_scoped.then_some(self.date.id),
                contact.to_string(),
                None,
                preferred_times,
                now,
            )
            .await
            .unwrap()
    }

    pub async fn entry_status(&self, entry_id: Uuid) -> WaitlistStatus {
        let repo: &dyn shutterbook_domain::WaitlistRepository = self.store.as_ref();
        repo.get(entry_id).await.unwrap().status
    }

    pub async fn slot_state(&self, slot_id: Uuid) -> Slot {
        let repo: &dyn SlotRepository = self.store.as_ref();
        repo.get(slot_id).await.unwrap()
    }
}
