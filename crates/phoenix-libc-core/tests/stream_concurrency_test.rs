use std::sync::Arc;
use std::thread;

use phoenix_libc_core::errno;
use phoenix_libc_core::stdio::table::StreamTable;
use phoenix_libc_core::stdio::{
    EOF, FOPEN_MAX, FormatArg, MemBackend, ScanArg, Stream, fgets, flockfile, fprintf, fputs,
    fscanf, fwide,
};

const THREADS: usize = 8;
const LINES: usize = 200;

#[test]
fn fprintf_lines_never_interleave() {
    let (stream, out) = Stream::memory(Vec::new(), b"w").unwrap();
    let stream = Arc::new(stream);
    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let stream = Arc::clone(&stream);
            thread::spawn(move || {
                for i in 0..LINES {
                    let n = fprintf(
                        &stream,
                        b"thread=%d line=%03d\n",
                        &[FormatArg::Int(t as i64), FormatArg::Int(i as i64)],
                    );
                    assert!(n > 0);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    stream.lock().flush_unlocked().unwrap();

    let text = String::from_utf8(out.contents()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), THREADS * LINES);
    for line in lines {
        let (thread_part, line_part) = line.split_once(' ').unwrap();
        assert!(thread_part.starts_with("thread="), "{line}");
        assert!(line_part.starts_with("line=") && line_part.len() == 8, "{line}");
    }
}

#[test]
fn flockfile_groups_several_calls() {
    let (stream, out) = Stream::memory(Vec::new(), b"w").unwrap();
    let stream = Arc::new(stream);
    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let stream = Arc::clone(&stream);
            thread::spawn(move || {
                for _ in 0..50 {
                    let _held = flockfile(&stream);
                    let tag = [b'a' + t as u8, 0];
                    fputs(&tag, &stream);
                    fputs(&tag, &stream);
                    fputs(b"\n", &stream);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    stream.lock().flush_unlocked().unwrap();

    let text = String::from_utf8(out.contents()).unwrap();
    for line in text.lines() {
        let bytes = line.as_bytes();
        assert_eq!(bytes.len(), 2, "{line:?}");
        assert_eq!(bytes[0], bytes[1], "{line:?}");
    }
}

#[test]
fn scan_and_read_share_one_position() {
    let (stream, _) = Stream::memory(b"7 apples\nrest of line\n".to_vec(), b"r").unwrap();
    let mut n = 0i32;
    let mut word = [0u8; 16];
    assert_eq!(
        fscanf(&stream, b"%d %s", &mut [ScanArg::Int(&mut n), ScanArg::Chars(&mut word)]),
        2
    );
    assert_eq!(n, 7);
    assert_eq!(&word[..7], b"apples\0");

    let mut line = [0u8; 32];
    assert_eq!(fgets(&mut line, &stream), Some(1));
    assert_eq!(fgets(&mut line, &stream), Some(13));
    assert_eq!(&line[..14], b"rest of line\n\0");
    assert_eq!(fscanf(&stream, b"%d", &mut [ScanArg::Int(&mut n)]), EOF);
}

#[test]
fn width_latch_survives_across_threads() {
    let (stream, _) = Stream::memory(Vec::new(), b"w").unwrap();
    let stream = Arc::new(stream);
    assert_eq!(fwide(&stream, 1), 1);
    let other = Arc::clone(&stream);
    let result = thread::spawn(move || {
        errno::set_errno(0);
        (fprintf(&other, b"narrow", &[]), errno::get_errno())
    })
    .join()
    .unwrap();
    assert_eq!(result, (-1, errno::EINVAL));
    assert!(stream.lock().is_error());
}

#[test]
fn table_limit_under_contention() {
    let table = Arc::new(StreamTable::new(FOPEN_MAX));
    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let mut opened = 0;
                let mut refused = 0;
                for _ in 0..4 {
                    let (backend, _) = MemBackend::new(Vec::new());
                    match table.open(Box::new(backend), b"w") {
                        Ok(_) => opened += 1,
                        Err(code) => {
                            assert_eq!(code, errno::EMFILE);
                            refused += 1;
                        }
                    }
                }
                (opened, refused)
            })
        })
        .collect();
    let (opened, refused) = workers
        .into_iter()
        .map(|w| w.join().unwrap())
        .fold((0, 0), |acc, r| (acc.0 + r.0, acc.1 + r.1));
    assert_eq!(opened, FOPEN_MAX);
    assert_eq!(refused, THREADS * 4 - FOPEN_MAX);
    assert_eq!(table.len(), FOPEN_MAX);
}
