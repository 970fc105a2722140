//! Read raw 16-bit little-endian PCM at 8 kHz from stdin and report the
//! first SIT or busy-signal classification to stderr.

use std::io::{ErrorKind, Read};
use switchyard_dsp::SitDetector;

const SAMPLES_PER_FRAME: usize = 160;

fn main() {
    let mut detector = SitDetector::new();
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut buf = [0u8; SAMPLES_PER_FRAME * 2];
    let mut ms = 0u64;

    loop {
        match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                ms += n as u64 / 16;
                let samples: Vec<i16> = buf[..n - n % 2]
                    .chunks_exact(2)
                    .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                detector.process(&samples);
                if let Some(cause) = detector.detection() {
                    eprintln!("Detected SIT at {}ms: {}", ms, cause);
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }
    }
}
