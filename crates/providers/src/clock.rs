use async_trait::async_trait;
use chrono::Local;

use crate::{Panel, Provider};

/// Wall-clock panel, hours and minutes in local time.
pub struct ClockProvider;

#[async_trait]
impl Provider for ClockProvider {
    async fn panel(&self) -> Panel {
        Panel::bare(Local::now().format("%H : %M").to_string())
    }
}
