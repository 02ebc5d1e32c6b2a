//! Runtime and function selection.

use parking_lot::RwLock;

use playtest_runner::{FunctionHandle, RuntimeHandle};

/// Exposes the runtime and function currently selected by the host.
///
/// A run is only accepted when both are present.
#[cfg_attr(test, mockall::automock)]
pub trait SelectionProvider: Send + Sync {
    fn runtime(&self) -> Option<RuntimeHandle>;
    fn function(&self) -> Option<FunctionHandle>;
}

/// In-memory selection that can be changed at any time.
#[derive(Debug, Default)]
pub struct StaticSelection {
    runtime: RwLock<Option<RuntimeHandle>>,
    function: RwLock<Option<FunctionHandle>>,
}

impl StaticSelection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a selection with both handles set.
    pub fn selected(runtime: RuntimeHandle, function: FunctionHandle) -> Self {
        Self {
            runtime: RwLock::new(Some(runtime)),
            function: RwLock::new(Some(function)),
        }
    }

    pub fn select_runtime(&self, runtime: RuntimeHandle) {
        *self.runtime.write() = Some(runtime);
    }

    pub fn select_function(&self, function: FunctionHandle) {
        *self.function.write() = Some(function);
    }

    pub fn clear_runtime(&self) {
        *self.runtime.write() = None;
    }

    pub fn clear_function(&self) {
        *self.function.write() = None;
    }
}

impl SelectionProvider for StaticSelection {
    fn runtime(&self) -> Option<RuntimeHandle> {
        self.runtime.read().clone()
    }

    fn function(&self) -> Option<FunctionHandle> {
        self.function.read().clone()
    }
}
