//! Fuzz target: remote configuration patch
//!
//! Feeds arbitrary bytes through `ConfigPatch::from_json` and applies any
//! parsed patch to the default configuration, verifying:
//! - No panics (including seconds → milliseconds overflow)
//! - Every accepted result passes `SystemConfig::validate`
//! - An empty patch is a no-op
//!
//! cargo fuzz run fuzz_config_patch

#![no_main]

use libfuzzer_sys::fuzz_target;
use sumpguard::config::{ConfigPatch, SystemConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(patch) = ConfigPatch::from_json(data) else {
        return;
    };

    let base = SystemConfig::default();
    match base.patched(&patch) {
        Ok(next) => {
            assert!(next.validate().is_ok());
            if patch.is_empty() {
                assert_eq!(next, base);
            }
        }
        Err(_) => {}
    }
});
