#![no_main]

use libfuzzer_sys::fuzz_target;
use quickdraw::config::ConfigLoader;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml) = std::str::from_utf8(data) {
        // Any input may be rejected, none may panic
        if let Ok(loaded) = ConfigLoader::with_defaults().load_from_str(yaml) {
            let config = &loaded.config;
            assert!(config.start_delay.min <= config.start_delay.max);
            assert!(config.alert_delay.min <= config.alert_delay.max);
            assert!(config.dirty_damage.min <= config.dirty_damage.max);
            assert!(config.initial_health > 0);
        }
    }
});
