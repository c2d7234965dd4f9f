/// The pool-wide worker function. Every dispatched payload is fed to it
/// unless the submission bound its own callback.
pub(crate) type WorkerFn<T> = Box<dyn Fn(T) + Send + Sync + 'static>;

/// A callback bound to a single work item.
pub(crate) type ItemFn<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// One queued unit of work: an owned payload plus an optional callback
/// override. The queue owns the item from submit until a worker claims it;
/// running it consumes both the item and the payload.
pub(crate) struct WorkItem<T> {
    payload: T,
    item_fn: Option<ItemFn<T>>,
}

impl<T> WorkItem<T> {
    pub(crate) fn new(payload: T) -> Self {
        Self {
            payload,
            item_fn: None,
        }
    }

    pub(crate) fn with_fn(payload: T, item_fn: ItemFn<T>) -> Self {
        Self {
            payload,
            item_fn: Some(item_fn),
        }
    }

    /// Runs the item's own callback if it has one, the pool default
    /// otherwise.
    pub(crate) fn run(self, default: &WorkerFn<T>) {
        match self.item_fn {
            Some(item_fn) => item_fn(self.payload),
            None => default(self.payload),
        }
    }

    /// Takes the payload back without running anything. Used when an item
    /// is reclaimed at teardown.
    pub(crate) fn into_payload(self) -> T {
        self.payload
    }
}
