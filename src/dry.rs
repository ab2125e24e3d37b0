//! Dry/idle period tracker.
//!
//! Watches sump-level edges and emits exactly one `Dry` event per
//! continuous inactive period longer than the dry-age threshold, and
//! exactly one `Sump` event when water returns after such a period.
//!
//! ```text
//!   sump ON→OFF                 restart the idle clock
//!   sump OFF, idle ≥ dry_age    mark dry, emit Dry (once)
//!   sump OFF→ON while dry       clear dry, emit Sump (once)
//! ```

use log::info;

use crate::events::SumpEvent;
use crate::sensors::{FloatReading, Level};

#[derive(Debug, Default)]
pub struct DryTracker {
    dry: bool,
    /// When the sump level was last seen going (or starting) inactive.
    last_off_ms: Option<u32>,
}

impl DryTracker {
    pub const fn new() -> Self {
        Self {
            dry: false,
            last_off_ms: None,
        }
    }

    pub fn is_dry(&self) -> bool {
        self.dry
    }

    /// Advance the tracker with this tick's reading.
    pub fn update(&mut self, reading: &FloatReading, now_ms: u32, dry_age_ms: u32) -> Option<SumpEvent> {
        let sump_on = reading.current.is_on(Level::Sump);
        let changed = reading.changed(Level::Sump);

        if changed && sump_on {
            if self.dry {
                self.dry = false;
                info!("Dry: water returned to sump");
                return Some(SumpEvent::Sump);
            }
            return None;
        }

        if changed {
            self.last_off_ms = Some(now_ms);
            return None;
        }

        if sump_on || self.dry {
            return None;
        }

        let since = *self.last_off_ms.get_or_insert(now_ms);
        if now_ms.wrapping_sub(since) >= dry_age_ms {
            self.dry = true;
            info!("Dry: sump inactive for {}s", now_ms.wrapping_sub(since) / 1000);
            return Some(SumpEvent::Dry);
        }
        None
    }
}
