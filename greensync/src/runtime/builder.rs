use super::Runtime;

/// Builder for configuring and creating a runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .task_capacity(64)
///     .name("worker")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeBuilder {
    /// Task slots reserved up front.
    task_capacity: usize,

    /// Name attached to the runtime's log span.
    name: String,
}

impl RuntimeBuilder {
    /// Creates a new `RuntimeBuilder` with default configuration.
    ///
    /// No task slot is reserved and the runtime is named `"greensync"`.
    pub fn new() -> Self {
        Self {
            task_capacity: 0,
            name: String::from("greensync"),
        }
    }

    /// Reserves room for `n` tasks.
    ///
    /// This is only a hint: the task table still grows past `n` on demand.
    pub fn task_capacity(mut self, n: usize) -> Self {
        self.task_capacity = n;
        self
    }

    /// Sets the name recorded on the runtime's tracing span.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds the runtime with the configured options.
    pub fn build(self) -> Runtime {
        Runtime::new(self.task_capacity, self.name)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
