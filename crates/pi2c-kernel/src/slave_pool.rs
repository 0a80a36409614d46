//! [`SlavePool`] – the bounded run of slave handles attached to the bus.
//!
//! The pool is allocated once, in a single batch, at startup.  Handles live
//! in an arena owned by the pool and are chained into a singly-linked run
//! starting at the root: following [`SlaveHandle::next`] from the root is the
//! only way the pool is traversed.  Each handle also records the root index
//! as its pool origin; that relation is informational and never used to
//! release anything.
//!
//! [`SlavePool::free`] is the single release path.  It is idempotent, does
//! not allocate and does not log, so it is safe to reach from the shutdown
//! path at any point of the main loop.
//!
//! # Example
//!
//! ```rust
//! use pi2c_kernel::slave_pool::SlavePool;
//!
//! let mut pool = SlavePool::allocate(3).expect("valid slave count");
//! assert_eq!(pool.len(), 3);
//!
//! let report = pool.for_each(|_slave| Ok(()));
//! assert_eq!(report.visited, 3);
//!
//! assert_eq!(pool.free(), 3);
//! assert_eq!(pool.free(), 0); // second free is a no-op
//! ```

use pi2c_types::{AllocError, MAX_SLAVES_LIMIT, ProcessError, SlaveIndex, SlaveState, SlaveStatus};

// ────────────────────────────────────────────────────────────────────────────
// SlaveHandle
// ────────────────────────────────────────────────────────────────────────────

/// One attached peripheral device slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaveHandle {
    index: SlaveIndex,
    status: SlaveStatus,
    state: SlaveState,
    pool_origin: SlaveIndex,
    next: Option<SlaveIndex>,
}

impl SlaveHandle {
    /// Position of this handle in the pool.
    pub fn index(&self) -> SlaveIndex {
        self.index
    }

    /// Result of the last processing call made against this slave.
    pub fn status(&self) -> &SlaveStatus {
        &self.status
    }

    pub fn state(&self) -> SlaveState {
        self.state
    }

    /// Index of the first handle in the pool this handle belongs to.
    pub fn pool_origin(&self) -> SlaveIndex {
        self.pool_origin
    }

    /// Index of the next handle in the run, `None` for the last one.
    pub fn next(&self) -> Option<SlaveIndex> {
        self.next
    }

    pub fn is_active(&self) -> bool {
        self.state == SlaveState::Active
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PassReport
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of one [`SlavePool::for_each`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Number of handles the processing function was invoked on.
    pub visited: usize,
    /// Number of those invocations that returned an error.
    pub failed: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// SlavePool
// ────────────────────────────────────────────────────────────────────────────

/// Exclusive owner of every slave handle.
#[derive(Debug, Default)]
pub struct SlavePool {
    handles: Vec<SlaveHandle>,
    root: Option<SlaveIndex>,
}

impl SlavePool {
    /// Check that `max_slaves` is a usable pool size, i.e. within
    /// `1..=`[`MAX_SLAVES_LIMIT`].  Touches no state.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::InvalidConfig`] when the count is out of range.
    pub fn validate(max_slaves: usize) -> Result<SlaveIndex, AllocError> {
        SlaveIndex::try_from(max_slaves)
            .ok()
            .filter(|count| *count >= 1)
            .ok_or(AllocError::InvalidConfig {
                requested: max_slaves,
                max: MAX_SLAVES_LIMIT,
            })
    }

    /// Allocate `max_slaves` handles as one linked run.
    ///
    /// Every handle starts [`SlaveState::Active`] with a zeroed
    /// ([`SlaveStatus::Ok`]) status and its pool origin set to the root.
    /// Storage for the whole run is reserved up front; there is no partial
    /// pool on failure.
    ///
    /// # Errors
    ///
    /// - [`AllocError::InvalidConfig`] if `max_slaves` is 0 or exceeds
    ///   [`MAX_SLAVES_LIMIT`].  Nothing is allocated.
    /// - [`AllocError::AllocationFailure`] if the run cannot be reserved.
    pub fn allocate(max_slaves: usize) -> Result<Self, AllocError> {
        let count = Self::validate(max_slaves)?;

        let mut handles = Vec::new();
        handles
            .try_reserve_exact(usize::from(count))
            .map_err(|_| AllocError::AllocationFailure {
                requested: usize::from(count),
            })?;

        let root: SlaveIndex = 0;
        for index in 0..count {
            handles.push(SlaveHandle {
                index,
                status: SlaveStatus::Ok,
                state: SlaveState::Active,
                pool_origin: root,
                next: index.checked_add(1).filter(|next| *next < count),
            });
        }

        Ok(Self {
            handles,
            root: Some(root),
        })
    }

    /// Release every handle and clear the root.
    ///
    /// Walks the run from the root, closing each handle and cutting its link
    /// before releasing the arena.  Returns the number of handles released;
    /// calling it on an already-freed pool returns `0` and changes nothing.
    pub fn free(&mut self) -> usize {
        let mut released = 0;
        let mut cursor = self.root.take();
        while let Some(index) = cursor {
            let Some(handle) = self.handles.get_mut(usize::from(index)) else {
                break;
            };
            cursor = handle.next.take();
            handle.state = SlaveState::Closed;
            released += 1;
        }
        // Replacing with an empty Vec releases storage without allocating.
        self.handles = Vec::new();
        released
    }

    /// Apply `f` to every active handle in link order.
    ///
    /// The outcome of each call is stored in that handle's status.  An error
    /// on one handle never stops the pass: the remaining handles are still
    /// visited.
    pub fn for_each<F>(&mut self, mut f: F) -> PassReport
    where
        F: FnMut(&SlaveHandle) -> Result<(), ProcessError>,
    {
        let mut report = PassReport::default();
        let mut cursor = self.root;
        while let Some(index) = cursor {
            let Some(handle) = self.handles.get_mut(usize::from(index)) else {
                break;
            };
            cursor = handle.next;
            if !handle.is_active() {
                continue;
            }
            report.visited += 1;
            handle.status = match f(&*handle) {
                Ok(()) => SlaveStatus::Ok,
                Err(e) => {
                    report.failed += 1;
                    SlaveStatus::Failed(e)
                }
            };
        }
        report
    }

    /// Number of handles reachable from the root.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// `true` once the pool has been freed.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// First handle of the run, if any.
    pub fn root(&self) -> Option<&SlaveHandle> {
        self.root.and_then(|index| self.get(index))
    }

    pub fn get(&self, index: SlaveIndex) -> Option<&SlaveHandle> {
        self.handles.get(usize::from(index))
    }

    /// Iterate over the handles in link order, starting at the root.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            pool: self,
            cursor: self.root,
        }
    }
}

/// Link-order iterator over a [`SlavePool`].
pub struct Iter<'a> {
    pool: &'a SlavePool,
    cursor: Option<SlaveIndex>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a SlaveHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.pool.get(self.cursor?)?;
        self.cursor = handle.next;
        Some(handle)
    }
}

impl<'a> IntoIterator for &'a SlavePool {
    type Item = &'a SlaveHandle;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
