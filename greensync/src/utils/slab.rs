/// An index arena with slot reuse.
///
/// A `Slab` stores values of type `T` in a contiguous vector and hands out
/// stable indices. Removing a value pushes its index onto an explicit free
/// list; the next insertion pops from that list before growing the storage.
///
/// Storage grows one slot at a time, so the number of slots ever allocated
/// is exactly the high-water mark of simultaneously occupied slots.
pub(crate) struct Slab<T> {
    /// Slot storage. `None` marks a vacant slot.
    entries: Vec<Option<T>>,
    /// Stack of vacant indices that can be reused.
    free: Vec<usize>,
    /// Number of occupied slots.
    len: usize,
}

impl<T> Slab<T> {
    /// Creates an empty slab.
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty slab with room reserved for `capacity` values.
    ///
    /// Reserving memory does not create slots: [`slots`](Self::slots)
    /// still reports `0`.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Inserts a value into the slab and returns its index.
    ///
    /// A vacant slot is reused when one exists; otherwise exactly one
    /// new slot is appended.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let mut slab = Slab::new();
    /// let idx = slab.insert(42);
    /// ```
    pub(crate) fn insert(&mut self, item: T) -> usize {
        let index = match self.free.pop() {
            Some(index) => {
                self.entries[index] = Some(item);
                index
            }
            None => {
                self.entries.push(Some(item));
                self.entries.len() - 1
            }
        };

        self.len += 1;
        index
    }

    /// Index the next call to [`insert`](Self::insert) will return.
    pub(crate) fn next_index(&self) -> usize {
        self.free.last().copied().unwrap_or(self.entries.len())
    }

    /// Removes and returns the value stored at `index`.
    ///
    /// The slot becomes vacant and will be reused by a later insertion.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds or the slot is vacant.
    pub(crate) fn remove(&mut self, index: usize) -> T {
        match self.try_remove(index) {
            Some(item) => item,
            None => panic!("slab slot {index} is not occupied"),
        }
    }

    /// Removes the value at `index` if the slot is occupied.
    pub(crate) fn try_remove(&mut self, index: usize) -> Option<T> {
        let item = self.entries.get_mut(index)?.take()?;

        self.free.push(index);
        self.len -= 1;

        Some(item)
    }

    /// Returns a reference to the value at `index`, if occupied.
    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)?.as_ref()
    }

    /// Returns a mutable reference to the value at `index`, if occupied.
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.entries.get_mut(index)?.as_mut()
    }

    /// Number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Number of slots allocated so far, occupied or vacant.
    pub(crate) fn slots(&self) -> usize {
        self.entries.len()
    }

    /// Removes every value and returns them in index order.
    ///
    /// Slot storage is kept; every slot becomes vacant.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);

        for (index, slot) in self.entries.iter_mut().enumerate() {
            if let Some(item) = slot.take() {
                self.free.push(index);
                out.push(item);
            }
        }

        self.len = 0;
        out
    }

    /// Drops every value and releases all slot storage.
    pub(crate) fn clear(&mut self) {
        self.entries = Vec::new();
        self.free = Vec::new();
        self.len = 0;
    }
}

impl<T> Default for Slab<T> {
    fn default() -> Self {
        Self::new()
    }
}
