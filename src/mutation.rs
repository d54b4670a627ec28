//! Async mutations (create/update/delete) with pending/success/error state.
//!
//! The write-side counterpart of [`crate::query::Query`]: a view calls
//! `mutate(variables)`, polls on each tick, and reacts when the state
//! changes. Errors keep their type so views can render structured failures
//! such as per-field validation messages.

use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum MutationState<T, E> {
  Idle,
  Pending,
  Success(T),
  Error(E),
}

type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

type MutatorFn<V, T, E> = Box<dyn Fn(V) -> BoxFuture<T, E> + Send + Sync>;

pub struct Mutation<V, T, E> {
  state: MutationState<T, E>,
  mutator: MutatorFn<V, T, E>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, E>>>,
  variables: Option<V>,
}

impl<V, T, E> Mutation<V, T, E>
where
  V: Clone + Send + 'static,
  T: Send + 'static,
  E: Send + 'static,
{
  pub fn new<F, Fut>(mutator: F) -> Self
  where
    F: Fn(V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    Self {
      state: MutationState::Idle,
      mutator: Box::new(move |vars| Box::pin(mutator(vars))),
      receiver: None,
      variables: None,
    }
  }

  pub fn state(&self) -> &MutationState<T, E> {
    &self.state
  }

  pub fn is_pending(&self) -> bool {
    matches!(self.state, MutationState::Pending)
  }

  pub fn data(&self) -> Option<&T> {
    match &self.state {
      MutationState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&E> {
    match &self.state {
      MutationState::Error(e) => Some(e),
      _ => None,
    }
  }

  /// Variables passed to the most recent `mutate`
  pub fn variables(&self) -> Option<&V> {
    self.variables.as_ref()
  }

  /// Run the mutation. A result still pending from an earlier call is dropped.
  pub fn mutate(&mut self, variables: V) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = MutationState::Pending;
    self.variables = Some(variables.clone());

    let future = (self.mutator)(variables);
    tokio::spawn(async move {
      let _ = tx.send(future.await);
    });
  }

  /// Forget the last result (and any pending one).
  pub fn reset(&mut self) {
    self.state = MutationState::Idle;
    self.receiver = None;
    self.variables = None;
  }

  /// Poll for the result of a pending mutation.
  ///
  /// Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = MutationState::Success(data);
        self.receiver = None;
        true
      }
      Ok(Err(e)) => {
        self.state = MutationState::Error(e);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        tracing::warn!("mutation task ended without a result");
        self.state = MutationState::Idle;
        self.receiver = None;
        true
      }
    }
  }
}
