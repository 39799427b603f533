#![no_main]

use libfuzzer_sys::fuzz_target;
use quickdraw::cli::commands::play::Command;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        for line in text.lines() {
            let _ = line.parse::<Command>();
        }
    }
});
