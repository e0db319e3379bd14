use dinein_actor::{ActorError, StateActor, StateEntity};

// --- Test Entity ---

#[derive(Clone, Debug, PartialEq)]
struct Tab {
    table: u32,
    covers: u32,
    closed: bool,
}

#[derive(Debug)]
enum TabAction {
    Seat(u32),
    Close,
}

#[derive(Debug, thiserror::Error, PartialEq)]
enum TabError {
    #[error("tab {0} is closed")]
    Closed(u32),
}

impl StateEntity for Tab {
    type Id = u32;
    type Action = TabAction;
    type Output = u32;
    type Error = TabError;

    fn init(id: &u32) -> Self {
        Self {
            table: *id,
            covers: 0,
            closed: false,
        }
    }

    fn apply(&mut self, action: TabAction) -> Result<u32, TabError> {
        match action {
            TabAction::Seat(n) => {
                // mutate first so a rejected apply would leave a dirty scratch copy
                self.covers += n;
                if self.closed {
                    return Err(TabError::Closed(self.table));
                }
                Ok(self.covers)
            }
            TabAction::Close => {
                self.closed = true;
                Ok(self.covers)
            }
        }
    }
}

#[tokio::test]
async fn test_apply_snapshot_reset_lifecycle() {
    let (actor, handle) = StateActor::<Tab>::new(8);
    let task = tokio::spawn(actor.run());

    // Untouched ids snapshot as their initial state
    let fresh = handle.snapshot(4).await.unwrap();
    assert_eq!(fresh.covers, 0);

    assert_eq!(handle.apply(4, TabAction::Seat(2)).await.unwrap(), 2);
    assert_eq!(handle.apply(4, TabAction::Seat(3)).await.unwrap(), 5);
    assert_eq!(handle.snapshot(4).await.unwrap().covers, 5);

    // Other ids are independent
    assert_eq!(handle.apply(7, TabAction::Seat(1)).await.unwrap(), 1);

    assert!(handle.reset(4).await.unwrap());
    assert!(!handle.reset(4).await.unwrap());
    assert_eq!(handle.snapshot(4).await.unwrap().covers, 0);

    drop(handle);
    task.await.unwrap();
}

#[tokio::test]
async fn test_rejected_apply_is_not_committed() {
    let (actor, handle) = StateActor::<Tab>::new(8);
    tokio::spawn(actor.run());

    handle.apply(1, TabAction::Seat(2)).await.unwrap();
    handle.apply(1, TabAction::Close).await.unwrap();

    let err = handle.apply(1, TabAction::Seat(9)).await.unwrap_err();
    assert_eq!(err.into_entity::<TabError>().unwrap(), TabError::Closed(1));

    let tab = handle.snapshot(1).await.unwrap();
    assert_eq!(tab.covers, 2);
    assert!(tab.closed);
}

#[tokio::test]
async fn test_watchers_see_committed_changes_in_order() {
    let (actor, handle) = StateActor::<Tab>::new(8);
    tokio::spawn(actor.run());

    let mut rx = handle.watch(3).await.unwrap();
    assert_eq!(rx.borrow().covers, 0);

    handle.apply(3, TabAction::Seat(2)).await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().covers, 2);

    // A rejected action publishes nothing
    handle.apply(3, TabAction::Close).await.unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().closed);
    assert!(handle.apply(3, TabAction::Seat(1)).await.is_err());
    assert!(!rx.has_changed().unwrap());

    // Reset drops the sender side
    handle.reset(3).await.unwrap();
    assert!(rx.changed().await.is_err());
}

#[tokio::test]
async fn test_closed_actor_reports_closed() {
    let (actor, handle) = StateActor::<Tab>::new(8);
    drop(actor);
    assert!(handle.is_closed());
    assert!(matches!(handle.snapshot(1).await, Err(ActorError::Closed)));
}
