#![no_main]
use libfuzzer_sys::fuzz_target;
use phoenix_libc_core::stdio::{EOF, ScanArg, sscanf};

fuzz_target!(|data: &[u8]| {
    // Split at the first NUL: format before, input after.
    let split = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let (fmt, input) = (&data[..split], data.get(split + 1..).unwrap_or(&[]));

    let mut i = 0i32;
    let mut l = 0i64;
    let mut d = 0f64;
    let mut text = [0u8; 16];
    let mut grown = Vec::new();
    let n = sscanf(
        input,
        fmt,
        &mut [
            ScanArg::Int(&mut i),
            ScanArg::Long(&mut l),
            ScanArg::Double(&mut d),
            ScanArg::Chars(&mut text),
            ScanArg::Alloc(&mut grown),
        ],
    );
    assert!(n == EOF || (0..=5).contains(&n));
    assert!(grown.len() <= input.len());
});
