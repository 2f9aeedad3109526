use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Line-delimited JSON trace of composition and pagination decisions.
/// One logger is shared across a render; writes are serialized through a
/// mutex so events from measurement and page-break paths interleave cleanly.
pub struct DebugLogger {
    writer: Mutex<BufWriter<File>>,
    events: AtomicU64,
    page_breaks: AtomicU64,
    unboxed_fallbacks: AtomicU64,
}

impl DebugLogger {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            events: AtomicU64::new(0),
            page_breaks: AtomicU64::new(0),
            unboxed_fallbacks: AtomicU64::new(0),
        })
    }

    pub fn log(&self, event: &str, fields: &[(&str, String)]) {
        self.events.fetch_add(1, Ordering::Relaxed);
        match event {
            "page_break" => {
                self.page_breaks.fetch_add(1, Ordering::Relaxed);
            }
            "card_unboxed" => {
                self.unboxed_fallbacks.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        let mut line = String::with_capacity(64);
        line.push_str("{\"event\":\"");
        line.push_str(&json_escape(event));
        line.push('"');
        for (key, value) in fields {
            line.push_str(",\"");
            line.push_str(&json_escape(key));
            line.push_str("\":\"");
            line.push_str(&json_escape(value));
            line.push('"');
        }
        line.push_str("}\n");
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.write_all(line.as_bytes());
        }
    }

    pub fn emit_summary(&self) {
        let events = self.events.load(Ordering::Relaxed).to_string();
        let page_breaks = self.page_breaks.load(Ordering::Relaxed).to_string();
        let fallbacks = self.unboxed_fallbacks.load(Ordering::Relaxed).to_string();
        self.log(
            "summary",
            &[
                ("events", events),
                ("page_breaks", page_breaks),
                ("card_unboxed", fallbacks),
            ],
        );
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

fn json_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}
