mod clock;
mod host;
mod surface;

pub use clock::{ManualClock, TestScheduler};
pub use host::TestHost;
pub use surface::{MemorySurface, SurfaceOp};
