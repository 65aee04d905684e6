#![no_main]

use libfuzzer_sys::fuzz_target;
use poolkit::{BufferError, ByteBuffer};

fuzz_target!(|data: Vec<u8>| {
    let mut buf = ByteBuffer::new();
    let mut model: Vec<u8> = Vec::new();
    let mut scratch = [0u8; 256];

    // Each pair of input bytes is one operation: selector, argument
    for op in data.chunks(2) {
        let arg = op.get(1).copied().unwrap_or(0) as usize;
        match op[0] % 5 {
            0 => {
                let bytes = vec![op[0]; arg];
                buf.write(&bytes);
                model.extend_from_slice(&bytes);
            }
            1 => match buf.read(&mut scratch[..arg]) {
                Ok(n) => {
                    assert_eq!(&scratch[..n], &model[..n]);
                    model.drain(..n);
                }
                Err(BufferError::Eof) => assert!(model.is_empty()),
                Err(e) => panic!("unexpected error: {e}"),
            },
            2 => {
                buf.shift(arg);
                if arg <= model.len() {
                    model.drain(..arg);
                }
            }
            3 => {
                buf.grow(arg * 16);
                assert!(buf.cap() - buf.len() >= arg * 16);
            }
            _ => {
                let keep = arg.min(model.len());
                buf.truncate(keep);
                model.truncate(keep);
            }
        }

        // Verify: unread region always matches the model
        assert_eq!(buf.as_bytes(), &model[..]);
        assert!(buf.len() <= buf.cap());
    }
});
