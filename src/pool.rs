use std::collections::VecDeque;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::buffer::BufferInfo;
use crate::error::{Error, Result};

/// Which caller a checked-out element belongs to: the hardware collaborator
/// filling it, or the application holding it between dequeue and requeue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Hardware,
    User,
}

/// Current list membership of one element.
///
/// Every element is in exactly one of these states at any instant;
/// transitions happen only under the pool's list lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Free,
    Queued,
    Done,
    CheckedOut(Owner),
}

/// Valid-data window of a completed element.
#[derive(Debug, Default, Clone, Copy)]
struct ValidRange {
    offset: u32,
    len: u32,
}

struct Lists {
    free: VecDeque<u32>,
    queued: VecDeque<u32>,
    done: VecDeque<u32>,
    membership: Box<[Membership]>,
    valid: Box<[ValidRange]>,
}

impl Lists {
    /// Removes `index` from the list its membership tag names.
    ///
    /// A membership tag that disagrees with the list contents means the
    /// partition invariant is already broken, so this panics.
    fn unlink(&mut self, index: u32) {
        let list = match self.membership[index as usize] {
            Membership::Free => &mut self.free,
            Membership::Queued => &mut self.queued,
            Membership::Done => &mut self.done,
            Membership::CheckedOut(_) => return,
        };
        match list.iter().position(|&i| i == index) {
            Some(pos) => {
                list.remove(pos);
            }
            None => panic!("buffer {} missing from its membership list", index),
        }
    }
}

/// Counting signal tracking how many buffers sit in the done list awaiting
/// consumption.
struct ReadySignal {
    count: Mutex<u32>,
    cond: Condvar,
}

impl ReadySignal {
    fn new() -> Self {
        ReadySignal {
            count: Mutex::new(0),
            cond: Condvar::new(),
        }
    }

    fn post(&self) {
        let mut count = self.count.lock().unwrap();
        *count += 1;
        drop(count);
        self.cond.notify_one();
    }

    /// Takes one unit, waiting up to `timeout` (`None` waits forever).
    fn acquire(&self, timeout: Option<Duration>) -> Result<()> {
        let mut count = self.count.lock().unwrap();
        match timeout {
            None => {
                while *count == 0 {
                    count = self.cond.wait(count).unwrap();
                }
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while *count == 0 {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(Error::Timeout);
                    }
                    let (guard, _) = self.cond.wait_timeout(count, deadline - now).unwrap();
                    count = guard;
                }
            }
        }
        *count -= 1;
        Ok(())
    }

    fn value(&self) -> u32 {
        *self.count.lock().unwrap()
    }

    fn reset(&self) {
        *self.count.lock().unwrap() = 0;
    }
}

/// Completed buffer returned by a blocking dequeue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dequeued {
    /// Element index within the pool
    pub index: u32,
    /// Offset of the first valid byte
    pub offset: u32,
    /// Number of valid bytes
    pub bytesused: u32,
}

/// Fixed-size pool of frame buffers for one stream direction.
///
/// The element set is fixed at creation; elements move between the free,
/// queued and done lists or are checked out to exactly one caller. List
/// operations take a short critical section and never block, so they are
/// safe to call from the hardware collaborator's interrupt context. Only
/// [`Pool::take_done`] may block.
pub struct Pool {
    info: BufferInfo,
    lists: Mutex<Lists>,
    ready: ReadySignal,
    payloads: Box<[Mutex<Box<[u8]>>]>,
}

impl Pool {
    /// Allocates a pool of `info.count` buffers of `info.size` bytes.
    ///
    /// All elements start out in the free list. Payload capacity is rounded
    /// up to the alignment grain; the usable size stays `info.size`.
    pub fn new(info: BufferInfo) -> Result<Arc<Self>> {
        if info.count == 0 || info.size == 0 {
            return Err(Error::InvalidArgument);
        }
        let align = if info.align == 0 { 1 } else { info.align };
        if !align.is_power_of_two() {
            return Err(Error::InvalidArgument);
        }

        let padded = ((info.size + align - 1) & !(align - 1)) as usize;
        let count = info.count as usize;

        let mut payloads = Vec::new();
        payloads
            .try_reserve_exact(count)
            .map_err(|_| Error::NoMemory)?;
        for _ in 0..count {
            let mut data = Vec::new();
            data.try_reserve_exact(padded).map_err(|_| {
                log::error!("failed to allocate {} byte payload", padded);
                Error::NoMemory
            })?;
            data.resize(padded, 0);
            payloads.push(Mutex::new(data.into_boxed_slice()));
        }

        Ok(Arc::new(Pool {
            info,
            lists: Mutex::new(Lists {
                free: (0..info.count).collect(),
                queued: VecDeque::new(),
                done: VecDeque::new(),
                membership: vec![Membership::Free; count].into_boxed_slice(),
                valid: vec![ValidRange::default(); count].into_boxed_slice(),
            }),
            ready: ReadySignal::new(),
            payloads: payloads.into_boxed_slice(),
        }))
    }

    /// Pool geometry
    pub fn info(&self) -> BufferInfo {
        self.info
    }

    /// Number of elements currently in the free list
    pub fn free_count(&self) -> u32 {
        self.lists.lock().unwrap().free.len() as u32
    }

    /// Number of elements currently queued for the producer
    pub fn queued_count(&self) -> u32 {
        self.lists.lock().unwrap().queued.len() as u32
    }

    /// Number of completed elements awaiting dequeue
    pub fn ready_count(&self) -> u32 {
        self.ready.value()
    }

    /// Checks out the head of the free list for filling.
    ///
    /// Never blocks; returns `None` if the free list is empty.
    pub fn alloc(self: &Arc<Self>) -> Option<Element> {
        self.checkout_head(Membership::Free)
    }

    /// Checks out the head of the queued list for filling.
    ///
    /// Never blocks; returns `None` if nothing is queued.
    pub fn take_queued(self: &Arc<Self>) -> Option<Element> {
        self.checkout_head(Membership::Queued)
    }

    fn checkout_head(self: &Arc<Self>, source: Membership) -> Option<Element> {
        let mut lists = self.lists.lock().unwrap();
        let index = match source {
            Membership::Free => lists.free.pop_front(),
            Membership::Queued => lists.queued.pop_front(),
            _ => None,
        }?;
        lists.membership[index as usize] = Membership::CheckedOut(Owner::Hardware);
        lists.valid[index as usize] = ValidRange::default();
        drop(lists);

        Some(Element {
            pool: Arc::clone(self),
            index,
            spent: false,
        })
    }

    /// Moves element `index` to the tail of the queued list.
    ///
    /// Legal for free elements and for elements the application holds after
    /// a dequeue; anything else is refused.
    pub fn queue(&self, index: u32) -> Result<()> {
        if index >= self.info.count {
            return Err(Error::InvalidArgument);
        }
        let mut lists = self.lists.lock().unwrap();
        match lists.membership[index as usize] {
            Membership::Free => lists.unlink(index),
            Membership::CheckedOut(Owner::User) => (),
            _ => return Err(Error::InvalidArgument),
        }
        lists.membership[index as usize] = Membership::Queued;
        lists.queued.push_back(index);
        Ok(())
    }

    /// Waits for a completed element and checks it out to the application.
    ///
    /// `None` waits forever, `Some(Duration::ZERO)` polls. On timeout no
    /// element is consumed.
    pub fn take_done(&self, timeout: Option<Duration>) -> Result<Dequeued> {
        self.ready.acquire(timeout)?;

        let mut lists = self.lists.lock().unwrap();
        // Reclaim may have emptied the done list between the signal and
        // this lock; treat that teardown race as a timeout.
        let index = match lists.done.pop_front() {
            Some(index) => index,
            None => return Err(Error::Timeout),
        };
        lists.membership[index as usize] = Membership::CheckedOut(Owner::User);
        let valid = lists.valid[index as usize];

        Ok(Dequeued {
            index,
            offset: valid.offset,
            bytesused: valid.len,
        })
    }

    /// Returns every element that is not checked out to the hardware back
    /// to the free list and clears the readiness signal.
    ///
    /// The stream layer calls this after stop, before destroying or
    /// replacing the pool. Fails if the hardware collaborator still holds
    /// an element.
    pub(crate) fn reclaim(&self) -> Result<()> {
        let mut lists = self.lists.lock().unwrap();
        if lists
            .membership
            .iter()
            .any(|m| *m == Membership::CheckedOut(Owner::Hardware))
        {
            return Err(Error::InvalidState);
        }

        lists.queued.clear();
        lists.done.clear();
        lists.free.clear();
        for index in 0..self.info.count {
            lists.membership[index as usize] = Membership::Free;
            lists.free.push_back(index);
        }
        drop(lists);
        self.ready.reset();
        Ok(())
    }

    /// Destroys the pool, freeing all buffer memory.
    ///
    /// Fails without freeing anything if any element is outside the free
    /// list; the caller is responsible for stopping and draining first.
    pub fn destroy(self: Arc<Self>) -> Result<()> {
        {
            let lists = self.lists.lock().unwrap();
            if lists.membership.iter().any(|m| *m != Membership::Free) {
                return Err(Error::InvalidState);
            }
        }
        drop(self);
        Ok(())
    }

    /// Read access to element `index`'s payload.
    ///
    /// Fails while the hardware collaborator has the element checked out.
    pub fn map(&self, index: u32) -> Result<Mapping<'_>> {
        self.check_mappable(index)?;
        Ok(Mapping {
            guard: self.payloads[index as usize].lock().unwrap(),
            len: self.info.size as usize,
        })
    }

    /// Write access to element `index`'s payload.
    pub fn map_mut(&self, index: u32) -> Result<MappingMut<'_>> {
        self.check_mappable(index)?;
        Ok(MappingMut {
            guard: self.payloads[index as usize].lock().unwrap(),
            len: self.info.size as usize,
        })
    }

    fn check_mappable(&self, index: u32) -> Result<()> {
        if index >= self.info.count {
            return Err(Error::InvalidArgument);
        }
        let lists = self.lists.lock().unwrap();
        if lists.membership[index as usize] == Membership::CheckedOut(Owner::Hardware) {
            return Err(Error::InvalidState);
        }
        Ok(())
    }

    /// Element completion; only reachable through an [`Element`] handle.
    fn finish(&self, index: u32, offset: u32, len: u32, target: Membership) {
        let mut lists = self.lists.lock().unwrap();
        assert_eq!(
            lists.membership[index as usize],
            Membership::CheckedOut(Owner::Hardware),
            "completing a buffer that is not checked out"
        );
        assert!(
            offset + len <= self.info.size,
            "valid data range exceeds the buffer size"
        );

        lists.membership[index as usize] = target;
        match target {
            Membership::Done => {
                lists.valid[index as usize] = ValidRange { offset, len };
                lists.done.push_back(index);
            }
            Membership::Free => lists.free.push_back(index),
            Membership::Queued => lists.queued.push_front(index),
            Membership::CheckedOut(_) => unreachable!(),
        }
        drop(lists);

        if target == Membership::Done {
            self.ready.post();
        }
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("info", &self.info)
            .field("free", &self.free_count())
            .field("queued", &self.queued_count())
            .field("done", &self.ready_count())
            .finish()
    }
}

/// A pool element checked out to the hardware collaborator for filling.
///
/// The handle owns exclusive fill access to the payload. Dropping it
/// without an explicit transition returns the element to the free list.
pub struct Element {
    pool: Arc<Pool>,
    index: u32,
    spent: bool,
}

impl Element {
    /// Element index within its pool
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Usable payload size in bytes
    pub fn capacity(&self) -> usize {
        self.pool.info.size as usize
    }

    /// Copies `data` to the start of the payload
    pub fn copy_from(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > self.capacity() {
            return Err(Error::InvalidArgument);
        }
        self.with_data_mut(|payload| payload[..data.len()].copy_from_slice(data));
        Ok(())
    }

    /// Runs `f` with read access to the payload
    pub fn with_data<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let size = self.capacity();
        let guard = self.pool.payloads[self.index as usize].lock().unwrap();
        f(&guard[..size])
    }

    /// Runs `f` with write access to the payload
    pub fn with_data_mut<R>(&mut self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let size = self.capacity();
        let mut guard = self.pool.payloads[self.index as usize].lock().unwrap();
        f(&mut guard[..size])
    }

    /// Hands the filled element to the done list and wakes one waiter.
    ///
    /// Panics if `valid_len` exceeds the buffer size; overrunning a frame
    /// buffer is not a recoverable condition.
    pub fn complete(self, valid_len: u32) {
        self.complete_with_offset(0, valid_len)
    }

    /// Like [`Element::complete`] with an explicit first-valid-byte offset
    pub fn complete_with_offset(mut self, offset: u32, valid_len: u32) {
        self.spent = true;
        self.pool.finish(self.index, offset, valid_len, Membership::Done);
    }

    /// Returns the element to the free list unfilled
    pub fn release(mut self) {
        self.spent = true;
        self.pool.finish(self.index, 0, 0, Membership::Free);
    }

    /// Puts the element back at the head of the queued list, preserving
    /// the consumption order for a later retry
    pub fn requeue(mut self) {
        self.spent = true;
        self.pool.finish(self.index, 0, 0, Membership::Queued);
    }
}

impl Drop for Element {
    fn drop(&mut self) {
        if !self.spent {
            self.pool.finish(self.index, 0, 0, Membership::Free);
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("index", &self.index)
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Read-only view of one element's payload, held under the payload lock
pub struct Mapping<'a> {
    guard: MutexGuard<'a, Box<[u8]>>,
    len: usize,
}

impl Deref for Mapping<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.guard[..self.len]
    }
}

/// Writable view of one element's payload, held under the payload lock
pub struct MappingMut<'a> {
    guard: MutexGuard<'a, Box<[u8]>>,
    len: usize,
}

impl Deref for MappingMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.guard[..self.len]
    }
}

impl DerefMut for MappingMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard[..self.len]
    }
}
