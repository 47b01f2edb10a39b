pub mod confirm;
pub mod holds;
pub mod schedule;
pub mod sweeper;
pub mod waitlist;

pub use confirm::BookingConfirmer;
pub use holds::HoldManager;
pub use schedule::{build_slots, SlotGenerator};
pub use sweeper::{ExpirySweeper, SweepReport};
pub use waitlist::WaitlistCoordinator;
