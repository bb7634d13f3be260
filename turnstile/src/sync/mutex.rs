use log::trace;
use parking_lot::Mutex;

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

/// An asynchronous FIFO mutex.
///
/// `AsyncMutex` serializes critical sections across tasks: at most one
/// [`ReleaseHandle`] granted by a given mutex is live at any instant, and
/// handles are granted strictly in the order [`acquire`](Self::acquire)
/// was called. Tasks waiting for their turn are suspended, never blocking
/// the thread.
///
/// The mutex does not own the protected resource. Callers keep it wherever
/// they like and only touch it from inside [`dispatch`](Self::dispatch) or
/// while holding a [`ReleaseHandle`].
///
/// Release is guaranteed: a `ReleaseHandle` releases on drop, so a unit of
/// work that returns early, returns an error or panics still hands the lock
/// to the next waiter. The only way to stall the queue is to leak a handle
/// (for example with [`std::mem::forget`]).
///
/// Locking is not re-entrant: a task that acquires twice without releasing
/// waits on itself forever.
///
/// # Examples
///
/// ```rust,ignore
/// let mutex = AsyncMutex::new();
///
/// let value = mutex
///     .dispatch(|| async {
///         // exclusive section
///         42
///     })
///     .await;
/// ```
pub struct AsyncMutex {
    state: Mutex<State>,
}

/// Queue state behind the internal lock.
///
/// The lock is held for a handful of instructions at a time and never
/// across an await point or a call to [`Waker::wake`].
struct State {
    /// Ticket of the live grant, if any.
    holder: Option<u64>,

    /// Requests not granted yet, in ticket order.
    queue: VecDeque<WaitCell>,

    /// Ticket handed to the next call to `acquire`.
    next_ticket: u64,
}

/// One queued acquisition request.
struct WaitCell {
    ticket: u64,

    /// Waker of the task awaiting this cell; `None` until first polled.
    waker: Option<Waker>,
}

impl State {
    fn position(&self, ticket: u64) -> Option<usize> {
        self.queue.binary_search_by_key(&ticket, |cell| cell.ticket).ok()
    }

    /// Ends the grant held by `ticket` and passes it to the queue head.
    ///
    /// Returns the waker to invoke once the lock is released.
    fn hand_over(&mut self, ticket: u64) -> Option<Waker> {
        debug_assert_eq!(self.holder, Some(ticket), "release by a non-holder");

        match self.queue.pop_front() {
            Some(next) => {
                trace!("ticket {ticket} released, ticket {} granted", next.ticket);
                self.holder = Some(next.ticket);
                next.waker
            }
            None => {
                trace!("ticket {ticket} released, mutex idle");
                self.holder = None;
                None
            }
        }
    }
}

impl AsyncMutex {
    /// Creates a new, unlocked mutex with an empty queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                holder: None,
                queue: VecDeque::new(),
                next_ticket: 0,
            }),
        }
    }

    /// Requests exclusive access.
    ///
    /// The request joins the queue when `acquire` is called, not when the
    /// returned future is first polled: requests issued one after another
    /// are granted in that order regardless of polling order. If the mutex
    /// is idle the request is granted on the spot.
    ///
    /// The returned future resolves to the [`ReleaseHandle`] once every
    /// earlier request has been released. It never fails; it stays pending
    /// forever if an earlier holder leaks its handle.
    ///
    /// Dropping the future before it resolves withdraws the request: a
    /// queued request leaves the queue and a request that was already
    /// granted passes the grant on.
    pub fn acquire(&self) -> Acquire<'_> {
        let mut state = self.state.lock();

        let ticket = state.next_ticket;
        state.next_ticket += 1;

        if state.holder.is_none() {
            trace!("ticket {ticket} granted immediately");
            state.holder = Some(ticket);
        } else {
            trace!("ticket {ticket} queued behind {} request(s)", state.queue.len());
            state.queue.push_back(WaitCell {
                ticket,
                waker: None,
            });
        }

        Acquire {
            mutex: self,
            ticket,
            done: false,
        }
    }

    /// Runs `work` with exclusive access and returns its output.
    ///
    /// The request is queued immediately, like [`acquire`](Self::acquire).
    /// Once granted, `work` is called and its future awaited. The lock is
    /// released exactly once afterwards, whatever happened: success, an
    /// `Err` value, or a panic unwinding through the critical section.
    ///
    /// The output of `work` is returned unchanged; failures are neither
    /// wrapped nor swallowed.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result: Result<(), Error> = mutex.dispatch(|| write_record(&db)).await;
    /// ```
    pub fn dispatch<F, Fut, T>(&self, work: F) -> impl Future<Output = T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let acquire = self.acquire();

        async move {
            let handle = acquire.await;
            let output = work().await;
            handle.release();
            output
        }
    }

    /// Runs a synchronous `work` with exclusive access and returns its
    /// output.
    ///
    /// Same contract as [`dispatch`](Self::dispatch): queued on call,
    /// released on every exit path, output returned unchanged.
    pub fn dispatch_sync<F, T>(&self, work: F) -> impl Future<Output = T>
    where
        F: FnOnce() -> T,
    {
        let acquire = self.acquire();

        async move {
            let handle = acquire.await;
            let output = work();
            handle.release();
            output
        }
    }

    /// Returns `true` while a grant is live.
    pub fn is_locked(&self) -> bool {
        self.state.lock().holder.is_some()
    }

    /// Returns the number of requests waiting for their turn.
    ///
    /// The live grant, if any, is not counted.
    pub fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }

    fn release(&self, ticket: u64) {
        let waker = self.state.lock().hand_over(ticket);

        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn abandon(&self, ticket: u64) {
        let waker = {
            let mut state = self.state.lock();

            if state.holder == Some(ticket) {
                trace!("ticket {ticket} abandoned after being granted");
                state.hand_over(ticket)
            } else {
                trace!("ticket {ticket} abandoned while queued");
                if let Some(index) = state.position(ticket) {
                    state.queue.remove(index);
                }
                None
            }
        };

        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl Default for AsyncMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AsyncMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();

        f.debug_struct("AsyncMutex")
            .field("holder", &state.holder)
            .field("queued", &state.queue.len())
            .finish()
    }
}

/// Future returned by [`AsyncMutex::acquire`].
///
/// Resolves to a [`ReleaseHandle`] once the request reaches the front of
/// the queue.
#[must_use = "dropping an Acquire withdraws the request"]
pub struct Acquire<'a> {
    mutex: &'a AsyncMutex,
    ticket: u64,
    done: bool,
}

impl<'a> Acquire<'a> {
    /// Returns this request's position in issue order.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl<'a> Future for Acquire<'a> {
    type Output = ReleaseHandle<'a>;

    /// Checks whether the request has been granted.
    ///
    /// While it waits, the latest waker is stored in the request's wait
    /// cell so that the release preceding it wakes the right task.
    ///
    /// # Panics
    ///
    /// Panics if polled again after returning `Poll::Ready`.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        assert!(!this.done, "Acquire polled after completion");

        let mut state = this.mutex.state.lock();

        if state.holder == Some(this.ticket) {
            drop(state);
            this.done = true;

            return Poll::Ready(ReleaseHandle {
                mutex: this.mutex,
                ticket: this.ticket,
            });
        }

        if let Some(index) = state.position(this.ticket) {
            let cell = &mut state.queue[index];

            if !cell.waker.as_ref().is_some_and(|w| w.will_wake(cx.waker())) {
                cell.waker = Some(cx.waker().clone());
            }
        }

        Poll::Pending
    }
}

impl Drop for Acquire<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.mutex.abandon(self.ticket);
        }
    }
}

/// Single-use permission to relinquish exclusive access.
///
/// Returned by awaiting [`AsyncMutex::acquire`]. Calling
/// [`release`](Self::release) consumes the handle, so releasing twice is
/// impossible; dropping it without calling `release` releases as well.
/// Either way the next queued request is granted and its task woken.
#[must_use = "dropping a ReleaseHandle releases the lock immediately"]
pub struct ReleaseHandle<'a> {
    mutex: &'a AsyncMutex,
    ticket: u64,
}

impl ReleaseHandle<'_> {
    /// Releases the lock and grants the next queued request, if any.
    pub fn release(self) {
        drop(self);
    }

    /// Returns the position in issue order of the request this grant
    /// belongs to.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl Drop for ReleaseHandle<'_> {
    fn drop(&mut self) {
        self.mutex.release(self.ticket);
    }
}

impl fmt::Debug for ReleaseHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseHandle")
            .field("ticket", &self.ticket)
            .finish()
    }
}
