/*
 * Copyright 2023 The Hafnium Authors.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     https://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use core::fmt;

use crate::spinlock::*;

pub const DLOG_BUFFER_SIZE: usize = 8192;

/// Emits one byte on the host console.
pub type ConsolePutchar = fn(u8);

struct Writer {
    console: Option<ConsolePutchar>,
    buffer: [u8; DLOG_BUFFER_SIZE],
    offset: usize,
}

impl Writer {
    const fn new() -> Self {
        Self {
            console: None,
            buffer: [0; DLOG_BUFFER_SIZE],
            offset: 0,
        }
    }

    fn putchar(&mut self, c: u8) {
        self.buffer[self.offset] = c;
        self.offset = (self.offset + 1) % DLOG_BUFFER_SIZE;
        if let Some(console) = self.console {
            console(c);
        }
    }
}

impl fmt::Write for Writer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.putchar(byte);
        }
        Ok(())
    }
}

static WRITER: SpinLock<Writer> = SpinLock::new(Writer::new());

#[macro_export]
macro_rules! dlog {
    ($($arg:tt)*) => ($crate::dlog::_print(format_args!($($arg)*)));
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    use core::fmt::Write;
    // `Writer::write_str` never fails; a formatting error from a user `Display`
    // impl only truncates the line.
    let _ = WRITER.lock().write_fmt(args);
}

/// Routes log output to the host console in addition to the ring buffer.
pub fn dlog_set_console(console: ConsolePutchar) {
    WRITER.lock().console = Some(console);
}

/// Copies the log ring buffer into `out` and returns the offset at which the
/// next byte will be written.
pub fn dlog_snapshot(out: &mut [u8; DLOG_BUFFER_SIZE]) -> usize {
    let writer = WRITER.lock();
    out.copy_from_slice(&writer.buffer);
    writer.offset
}

#[cfg(test)]
mod test {
    use super::*;

    fn log_contains(needle: &str) -> bool {
        let mut buf = [0; DLOG_BUFFER_SIZE];
        dlog_snapshot(&mut buf);
        buf.windows(needle.len()).any(|w| w == needle.as_bytes())
    }

    #[test]
    fn dlog_reaches_ring_buffer() {
        dlog!("dlog test marker {:#x}\n", 0xf00du32);
        assert!(log_contains("dlog test marker 0xf00d"));
    }
}
