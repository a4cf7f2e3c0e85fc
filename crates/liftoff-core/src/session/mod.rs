mod clock;
mod controller;
mod reducer;
mod state;
mod ticker;

pub use clock::{now_ms, RestClock};
pub use controller::SessionController;
pub use reducer::{reduce, ClockCommand, Transition};
pub use state::{Phase, SessionEvent, SessionState};
pub use ticker::RestTicker;
