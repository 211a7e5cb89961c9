pub use tokio::time::{Instant, Sleep, sleep};
