/// Configuration for the controller actor.
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Capacity of the command queue.
    ///
    /// When full, async calls wait and `try_*` calls return `SubmitError::Full`.
    pub queue_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
        }
    }
}
