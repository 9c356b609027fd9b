//! 浏览器侧的日志输出与 panic 钩子。

use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::OnceCell;
use wasm_bindgen::JsValue;

struct ConsoleLogger {
    level: LevelFilter,
}

static LOGGER: OnceCell<ConsoleLogger> = OnceCell::new();

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!(
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        ));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            _ => web_sys::console::log_1(&line),
        }
    }

    fn flush(&self) {}
}

/// 把 `log` 记录转发到浏览器控制台。重复调用时保留第一次的级别。
pub fn init_logging(level: LevelFilter) {
    let logger = LOGGER.get_or_init(|| ConsoleLogger { level });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level);
    }
}

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
pub fn set_panic_hook() {}
