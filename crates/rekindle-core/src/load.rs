//! Deferred load results.
//!
//! A load is represented by a [`LoadHandle`] / [`LoadResolver`] pair. The
//! handle is a cheap shared view that observers clone, poll, or await; the
//! resolver is the single producer side that settles it. Cancelling the
//! handle detaches it from its producer: a settlement arriving after
//! cancellation is discarded silently.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use thiserror::Error;

/// Why a load produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The load was cancelled before it settled.
    #[error("load cancelled")]
    Cancelled,
    /// The producer rejected the load.
    #[error("{0}")]
    Failed(String),
}

enum State<T> {
    Pending,
    Settled(Result<T, LoadError>),
    Cancelled,
}

struct Inner<T> {
    state: RefCell<State<T>>,
    wakers: RefCell<Vec<Waker>>,
}

impl<T> Inner<T> {
    fn wake_all(&self) {
        let wakers: Vec<Waker> = self.wakers.borrow_mut().drain(..).collect();
        for waker in wakers {
            waker.wake();
        }
    }
}

/// Shared observer handle for one load.
pub struct LoadHandle<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for LoadHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> LoadHandle<T> {
    /// Create an unsettled load, returning the producer and observer sides.
    pub fn new() -> (LoadResolver<T>, LoadHandle<T>) {
        let inner = Rc::new(Inner {
            state: RefCell::new(State::Pending),
            wakers: RefCell::new(Vec::new()),
        });
        let handle = LoadHandle {
            inner: Rc::clone(&inner),
        };
        (LoadResolver { inner }, handle)
    }

    /// A handle already settled with `value`.
    pub fn ready(value: T) -> Self {
        let (resolver, handle) = Self::new();
        resolver.resolve(value);
        handle
    }

    /// A handle already settled with `error`.
    pub fn failed(error: LoadError) -> Self {
        let (resolver, handle) = Self::new();
        resolver.reject(error);
        handle
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.inner.state.borrow(), State::Pending)
    }

    pub fn is_settled(&self) -> bool {
        matches!(*self.inner.state.borrow(), State::Settled(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.inner.state.borrow(), State::Cancelled)
    }

    /// Detach from the producer. A pending load becomes cancelled; a
    /// settled or already cancelled load is left as is.
    pub fn cancel(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            match *state {
                State::Pending => *state = State::Cancelled,
                _ => return,
            }
        }
        self.inner.wake_all();
    }

    /// Whether `other` observes the same load.
    pub fn same(&self, other: &LoadHandle<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> LoadHandle<T> {
    /// The outcome, if the load is no longer pending.
    pub fn try_result(&self) -> Option<Result<T, LoadError>> {
        match &*self.inner.state.borrow() {
            State::Pending => None,
            State::Settled(result) => Some(result.clone()),
            State::Cancelled => Some(Err(LoadError::Cancelled)),
        }
    }
}

impl<T: Clone> Future for LoadHandle<T> {
    type Output = Result<T, LoadError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &*self.inner.state.borrow() {
            State::Pending => {}
            State::Settled(result) => return Poll::Ready(result.clone()),
            State::Cancelled => return Poll::Ready(Err(LoadError::Cancelled)),
        }
        let mut wakers = self.inner.wakers.borrow_mut();
        if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
            wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl<T> fmt::Debug for LoadHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.inner.state.borrow() {
            State::Pending => "pending",
            State::Settled(_) => "settled",
            State::Cancelled => "cancelled",
        };
        f.debug_struct("LoadHandle").field("state", &state).finish()
    }
}

/// Producer side of one load. Consumed by settlement; dropping an
/// unsettled resolver cancels the load.
pub struct LoadResolver<T> {
    inner: Rc<Inner<T>>,
}

impl<T> LoadResolver<T> {
    /// Settle with a value. Discarded silently if the load was cancelled.
    pub fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    /// Settle with an error. Discarded silently if the load was cancelled.
    pub fn reject(self, error: LoadError) {
        self.settle(Err(error));
    }

    /// Whether the observer side cancelled this load.
    pub fn is_cancelled(&self) -> bool {
        matches!(*self.inner.state.borrow(), State::Cancelled)
    }

    fn settle(self, result: Result<T, LoadError>) {
        {
            let mut state = self.inner.state.borrow_mut();
            match *state {
                State::Pending => *state = State::Settled(result),
                _ => return,
            }
        }
        self.inner.wake_all();
    }
}

impl<T> Drop for LoadResolver<T> {
    fn drop(&mut self) {
        {
            let mut state = self.inner.state.borrow_mut();
            match *state {
                State::Pending => *state = State::Cancelled,
                _ => return,
            }
        }
        self.inner.wake_all();
    }
}

impl<T> fmt::Debug for LoadResolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadResolver")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::task::Wake;

    fn poll_once<T: Clone>(handle: &mut LoadHandle<T>) -> Poll<Result<T, LoadError>> {
        let waker = Waker::noop();
        let mut cx = Context::from_waker(waker);
        Pin::new(handle).poll(&mut cx)
    }

    #[test]
    fn test_resolve_settles_all_handles() {
        let (resolver, handle) = LoadHandle::new();
        let peer = handle.clone();
        assert!(handle.is_pending());
        assert_eq!(handle.try_result(), None);

        resolver.resolve(5u32);
        assert!(handle.is_settled());
        assert_eq!(handle.try_result(), Some(Ok(5)));
        assert_eq!(peer.try_result(), Some(Ok(5)));
    }

    #[test]
    fn test_reject_settles_with_error() {
        let (resolver, handle) = LoadHandle::<u32>::new();
        resolver.reject(LoadError::Failed("no such module".into()));
        assert_eq!(
            handle.try_result(),
            Some(Err(LoadError::Failed("no such module".into())))
        );
    }

    #[test]
    fn test_cancel_discards_late_settlement() {
        let (resolver, handle) = LoadHandle::new();
        handle.cancel();
        assert!(resolver.is_cancelled());

        resolver.resolve(9u32);
        assert!(handle.is_cancelled());
        assert_eq!(handle.try_result(), Some(Err(LoadError::Cancelled)));
    }

    #[test]
    fn test_cancel_after_settlement_is_noop() {
        let (resolver, handle) = LoadHandle::new();
        resolver.resolve(3u32);
        handle.cancel();
        assert_eq!(handle.try_result(), Some(Ok(3)));
    }

    #[test]
    fn test_dropping_resolver_cancels() {
        let (resolver, handle) = LoadHandle::<u32>::new();
        drop(resolver);
        assert!(handle.is_cancelled());
        assert_eq!(handle.try_result(), Some(Err(LoadError::Cancelled)));
    }

    #[test]
    fn test_same_identifies_shared_load() {
        let (_resolver, handle) = LoadHandle::<u32>::new();
        let peer = handle.clone();
        let (_other_resolver, other) = LoadHandle::<u32>::new();
        assert!(handle.same(&peer));
        assert!(!handle.same(&other));
    }

    #[test]
    fn test_poll_pending_then_ready() {
        let (resolver, mut handle) = LoadHandle::new();
        assert!(poll_once(&mut handle).is_pending());

        resolver.resolve(11u32);
        assert_eq!(poll_once(&mut handle), Poll::Ready(Ok(11)));
    }

    #[test]
    fn test_poll_cancelled_is_ready_error() {
        let (_resolver, mut handle) = LoadHandle::<u32>::new();
        handle.cancel();
        assert_eq!(poll_once(&mut handle), Poll::Ready(Err(LoadError::Cancelled)));
    }

    #[test]
    fn test_settlement_wakes_stored_waker() {
        struct Flag(AtomicBool);
        impl Wake for Flag {
            fn wake(self: Arc<Self>) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let flag = Arc::new(Flag(AtomicBool::new(false)));
        let waker = Waker::from(Arc::clone(&flag));
        let mut cx = Context::from_waker(&waker);

        let (resolver, mut handle) = LoadHandle::new();
        assert!(Pin::new(&mut handle).poll(&mut cx).is_pending());
        assert!(!flag.0.load(Ordering::SeqCst));

        resolver.resolve(1u32);
        assert!(flag.0.load(Ordering::SeqCst));
    }
}
