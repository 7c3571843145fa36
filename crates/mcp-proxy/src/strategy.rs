//! How `tools/list` is answered

/// `Delegate` asks the remote server for its own tool list; `Generic` answers
/// locally with the `call` wrapper and any catalog matching the server URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolsStrategy {
    Delegate,
    Generic,
}

impl Default for ToolsStrategy {
    fn default() -> Self {
        ToolsStrategy::Delegate
    }
}
