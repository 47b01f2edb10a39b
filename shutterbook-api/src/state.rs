use std::sync::Arc;

use shutterbook_domain::{BookingRepository, SessionRepository, SlotRepository};
use shutterbook_engine::{BookingConfirmer, HoldManager, SlotGenerator, WaitlistCoordinator};

#[derive(Clone)]
pub struct AppState {
    pub slots: Arc<dyn SlotRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub holds: Arc<HoldManager>,
    pub confirmer: Arc<BookingConfirmer>,
    pub coordinator: Arc<WaitlistCoordinator>,
    pub generator: Arc<SlotGenerator>,
}
