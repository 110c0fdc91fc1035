/// Channel sizing for sessions and the inbox
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pending user commands before callers wait (default: 32)
    pub command_buffer: usize,

    /// Undelivered notifications before new ones are dropped (default: 64)
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_buffer: 32,
            event_buffer: 64,
        }
    }
}
