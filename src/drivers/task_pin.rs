//! Core-pinned thread spawning for the ESP32 dual-core.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::spawn` creates a
//! FreeRTOS task pinned to a specific CPU core with explicit priority
//! and stack size. On non-ESP targets, falls back to plain thread spawn.
//!
//! `esp_pthread_set_cfg()` sets thread-local configuration that applies
//! to the *next* `pthread_create()` from the calling thread, so the
//! config→spawn pair must not be interleaved with other thread creation.

use std::io;
use std::thread::JoinHandle;

/// CPU core identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): protocol stacks and the command dispatcher.
    Pro = 0,
    /// Core 1 (APP_CPU): timing-sensitive sensor acquisition.
    App = 1,
}

/// Thread parameters for one firmware task.
#[derive(Debug, Clone, Copy)]
pub struct TaskParams {
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
    /// Must be null-terminated (e.g. `"dht11\0"`).
    pub name: &'static str,
}

pub const DHT11_TASK: TaskParams = TaskParams {
    core: Core::App,
    priority: 10,
    stack_kb: 4,
    name: "dht11\0",
};

pub const SHT3X_TASK: TaskParams = TaskParams {
    core: Core::App,
    priority: 5,
    stack_kb: 4,
    name: "sht3x\0",
};

pub const DISPATCH_TASK: TaskParams = TaskParams {
    core: Core::Pro,
    priority: 5,
    stack_kb: 8,
    name: "dispatch\0",
};

impl TaskParams {
    fn display_name(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }
}

/// Spawn a thread pinned to a specific core with explicit priority and stack.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    task: TaskParams,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    // SAFETY: the config struct is fully initialised by the IDF helper and
    // `task.name` is a 'static null-terminated string.
    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = task.core as i32;
        cfg.prio = i32::from(task.priority);
        cfg.stack_size = (task.stack_kb * 1024) as _;
        cfg.thread_name = task.name.as_ptr().cast();
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        task.display_name(),
        task.core,
        task.priority,
        task.stack_kb
    );

    std::thread::Builder::new()
        .name(task.display_name().into())
        .spawn(f)
}

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    task: TaskParams,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    log::info!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        task.display_name(),
        task.stack_kb
    );

    std::thread::Builder::new()
        .name(task.display_name().into())
        .stack_size(task.stack_kb * 1024)
        .spawn(f)
}
