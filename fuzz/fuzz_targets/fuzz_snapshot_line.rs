#![no_main]

use libfuzzer_sys::fuzz_target;
use skiplite::{parse_line, DELIMITER};

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = std::str::from_utf8(data) {
        if let Ok((key, value)) = parse_line(line) {
            assert!(!key.is_empty() && !value.is_empty());
            assert!(!key.contains(DELIMITER));
            assert_eq!(format!("{}{}{}", key, DELIMITER, value), line);
        }
    }
});
