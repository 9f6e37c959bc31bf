pub mod attendance;
pub mod event;
pub mod lot;
pub mod payment_intent;
pub mod ticket;
pub mod user;

pub use attendance::{AttendanceRecord, AttendanceStatus};
pub use event::{Event, EventPrivacy};
pub use lot::TicketLot;
pub use payment_intent::{PaymentIntent, PaymentIntentStatus};
pub use ticket::{Ticket, TicketStatus};
pub use user::User;
