#![no_main]
use libfuzzer_sys::fuzz_target;
use phoenix_libc_core::stdio::{FormatArg, asprintf, snprintf};

fuzz_target!(|data: &[u8]| {
    // First byte picks the destination size; the rest is the format.
    let Some((&size, fmt)) = data.split_first() else {
        return;
    };
    // Huge widths only measure the allocator.
    if fmt.windows(5).any(|w| w.iter().all(u8::is_ascii_digit)) {
        return;
    }
    let args = [
        FormatArg::Int(i64::from(size) - 128),
        FormatArg::Uint(u64::from(size) << 40),
        FormatArg::Float(f64::from(size) / 7.0),
        FormatArg::Str(Some(b"fuzz")),
        FormatArg::Pointer(usize::from(size)),
    ];

    let mut buf = vec![0xAAu8; usize::from(size)];
    let n = snprintf(&mut buf, fmt, &args);
    if let Some(last) = buf.len().checked_sub(1)
        && n >= 0
    {
        assert!(buf[..=last].contains(&0), "snprintf left the buffer unterminated");
    }

    // The bounded and unbounded paths must agree on the full length.
    match asprintf(fmt, &args) {
        Ok(full) => {
            assert_eq!(n as usize, full.len());
            let kept = full.len().min(buf.len().saturating_sub(1));
            assert_eq!(&buf[..kept], &full[..kept]);
        }
        Err(_) => assert_eq!(n, -1),
    }
});
