//! Application state wired to the in-memory screening fakes

use crate::{config::AppConfig, AppState};
pub use screening_core::testing::{FakeValidator, RecordingNotifier};
use screening_core::Screener;
use std::sync::Arc;

pub fn test_state(validator: Arc<FakeValidator>, notifier: Arc<RecordingNotifier>) -> AppState {
    AppState {
        screener: Arc::new(Screener::new(validator, notifier)),
        config: Arc::new(AppConfig::default()),
    }
}
