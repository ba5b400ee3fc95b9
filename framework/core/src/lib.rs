mod case_id;
mod ticker;

pub mod prelude {
    pub use crate::case_id::CaseId;
    pub use crate::ticker::{
        ClockTicker, ManualTicker, Tick, TickSource, TickerHandle, TICK_INTERVAL,
    };
}
