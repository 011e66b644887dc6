//! Fuzz target for Frame::decode
//!
//! Arbitrary text must never panic the decoder. Anything that decodes must
//! pass validation and survive a re-encode.

#![no_main]

use chatsync_proto::Frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(frame) = Frame::decode(text) {
        assert!(frame.validate().is_ok(), "decoded frame failed validation: {frame:?}");
        let encoded = frame.encode().expect("decoded frame must re-encode");
        assert_eq!(Frame::decode(&encoded).ok(), Some(frame));
    }
});
