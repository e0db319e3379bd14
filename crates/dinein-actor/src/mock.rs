//! # Mock Handles
//!
//! `MockHandle<T>` hands out a real [`StateHandle<T>`] whose requests are answered from a
//! queue of expectations instead of a running actor. Use it to test code that wraps a
//! handle (a cart store, a checkout flow) and to inject failures that a real actor never
//! produces.
//!
//! ```rust
//! use dinein_actor::mock::MockHandle;
//! use dinein_actor::{ActorError, StateEntity};
//! use std::convert::Infallible;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Counter(u32);
//! impl StateEntity for Counter {
//!     type Id = u32; type Action = u32; type Output = u32; type Error = Infallible;
//!     fn init(_: &u32) -> Self { Counter(0) }
//!     fn apply(&mut self, by: u32) -> Result<u32, Infallible> { self.0 += by; Ok(self.0) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockHandle::<Counter>::new();
//!     mock.expect_snapshot(1).return_ok(Counter(7));
//!     mock.expect_apply(1).return_err(ActorError::Closed);
//!
//!     let handle = mock.handle();
//!     assert_eq!(handle.snapshot(1).await.unwrap(), Counter(7));
//!     assert!(matches!(handle.apply(1, 1).await, Err(ActorError::Closed)));
//!     mock.verify();
//! }
//! ```
//!
//! For step-by-step control use [`create_mock_handle`] together with [`expect_apply`] and
//! [`expect_snapshot`], which hand the raw request and its responder to the test.

use crate::entity::StateEntity;
use crate::error::ActorError;
use crate::handle::StateHandle;
use crate::message::StateRequest;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

enum Expectation<T: StateEntity> {
    Snapshot {
        id: T::Id,
        response: Result<T, ActorError>,
    },
    Apply {
        id: T::Id,
        response: Result<T::Output, ActorError>,
    },
    Reset {
        id: T::Id,
        response: Result<bool, ActorError>,
    },
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A mock handle with ordered expectations.
pub struct MockHandle<T: StateEntity> {
    handle: StateHandle<T>,
    expectations: Queue<T>,
    applied: Arc<Mutex<Vec<T::Action>>>,
    _task: tokio::task::JoinHandle<()>,
}

impl<T: StateEntity> MockHandle<T> {
    /// Creates a mock with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<StateRequest<T>>(64);
        let expectations: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let applied = Arc::new(Mutex::new(Vec::new()));
        let queue = expectations.clone();
        let log = applied.clone();

        let task = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let next = queue.lock().expect("mock queue poisoned").pop_front();
                match (request, next) {
                    (
                        StateRequest::Snapshot { id, respond_to },
                        Some(Expectation::Snapshot { id: expected, response }),
                    ) => {
                        assert_eq!(id, expected, "snapshot for unexpected id");
                        let _ = respond_to.send(response);
                    }
                    (
                        StateRequest::Apply {
                            id,
                            action,
                            respond_to,
                        },
                        Some(Expectation::Apply { id: expected, response }),
                    ) => {
                        assert_eq!(id, expected, "apply for unexpected id");
                        log.lock().expect("mock log poisoned").push(action);
                        let _ = respond_to.send(response);
                    }
                    (
                        StateRequest::Reset { id, respond_to },
                        Some(Expectation::Reset { id: expected, response }),
                    ) => {
                        assert_eq!(id, expected, "reset for unexpected id");
                        let _ = respond_to.send(response);
                    }
                    (request, _) => panic!("Unexpected request: {request:?}"),
                }
            }
        });

        Self {
            handle: StateHandle::new(sender),
            expectations,
            applied,
            _task: task,
        }
    }

    /// The handle to pass to the code under test.
    pub fn handle(&self) -> StateHandle<T> {
        self.handle.clone()
    }

    pub fn expect_snapshot(&mut self, id: T::Id) -> ExpectationBuilder<T, T> {
        ExpectationBuilder::new(self.expectations.clone(), move |response| {
            Expectation::Snapshot { id, response }
        })
    }

    pub fn expect_apply(&mut self, id: T::Id) -> ExpectationBuilder<T, T::Output> {
        ExpectationBuilder::new(self.expectations.clone(), move |response| {
            Expectation::Apply { id, response }
        })
    }

    pub fn expect_reset(&mut self, id: T::Id) -> ExpectationBuilder<T, bool> {
        ExpectationBuilder::new(self.expectations.clone(), move |response| {
            Expectation::Reset { id, response }
        })
    }

    /// Actions received by `apply`, in order.
    pub fn applied(&self) -> Vec<T::Action>
    where
        T::Action: Clone,
    {
        self.applied.lock().expect("mock log poisoned").clone()
    }

    /// Panics if any expectation was not consumed.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().expect("mock queue poisoned").len();
        if remaining > 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }
}

impl<T: StateEntity> Default for MockHandle<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder returned by the `expect_*` methods.
pub struct ExpectationBuilder<T: StateEntity, R> {
    queue: Queue<T>,
    make: Box<dyn FnOnce(Result<R, ActorError>) -> Expectation<T> + Send>,
}

impl<T: StateEntity, R> ExpectationBuilder<T, R> {
    fn new(
        queue: Queue<T>,
        make: impl FnOnce(Result<R, ActorError>) -> Expectation<T> + Send + 'static,
    ) -> Self {
        Self {
            queue,
            make: Box::new(make),
        }
    }

    pub fn return_ok(self, value: R) {
        let expectation = (self.make)(Ok(value));
        self.queue.lock().expect("mock queue poisoned").push_back(expectation);
    }

    pub fn return_err(self, error: ActorError) {
        let expectation = (self.make)(Err(error));
        self.queue.lock().expect("mock queue poisoned").push_back(expectation);
    }
}

/// Creates a handle plus the raw receiver, for tests that answer requests by hand.
pub fn create_mock_handle<T: StateEntity>(
    buffer_size: usize,
) -> (StateHandle<T>, mpsc::Receiver<StateRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StateHandle::new(sender), receiver)
}

/// Next request must be an `Apply`.
pub async fn expect_apply<T: StateEntity>(
    receiver: &mut mpsc::Receiver<StateRequest<T>>,
) -> Option<(T::Id, T::Action, oneshot::Sender<Result<T::Output, ActorError>>)> {
    match receiver.recv().await {
        Some(StateRequest::Apply {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}

/// Next request must be a `Snapshot`.
pub async fn expect_snapshot<T: StateEntity>(
    receiver: &mut mpsc::Receiver<StateRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<T, ActorError>>)> {
    match receiver.recv().await {
        Some(StateRequest::Snapshot { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}
