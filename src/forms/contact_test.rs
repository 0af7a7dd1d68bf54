use super::*;
use crate::backend::BackendError;
use crate::backend::mock::MockBackend;

fn draft() -> ContactDraft {
    ContactDraft {
        name: "Jane".into(),
        email: "jane@example.com".into(),
        subject: "Hello".into(),
        message: "Let's build something.".into(),
    }
}

async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn success_clears_fields_then_reverts() {
    let mock = MockBackend::new();
    let view = ContactView::new();

    let status = view.submit(&mock, None, draft()).await.unwrap();
    assert_eq!(status, ContactStatus::Success);
    assert_eq!(view.snapshot(), (ContactDraft::default(), ContactStatus::Success));

    let rows = mock.contact_rows.lock().unwrap().clone();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].subject, "Hello");
    assert!(!rows[0].created_at.is_empty());

    settle().await;
    tokio::time::advance(BANNER_WINDOW).await;
    settle().await;
    assert_eq!(view.snapshot().1, ContactStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn failure_keeps_fields_then_reverts() {
    let mock = MockBackend::new();
    mock.push_contact(Err(BackendError::api(403, Some("42501"), "new row violates row-level security policy")));
    let view = ContactView::new();

    let status = view.submit(&mock, None, draft()).await.unwrap();
    assert_eq!(status, ContactStatus::Error);
    assert_eq!(view.snapshot(), (draft(), ContactStatus::Error));

    settle().await;
    tokio::time::advance(BANNER_WINDOW).await;
    settle().await;
    assert_eq!(view.snapshot(), (draft(), ContactStatus::Idle));
    assert_eq!(mock.call_count("insert_contact_message"), 1);
}

#[tokio::test(start_paused = true)]
async fn banner_holds_for_the_whole_window() {
    let mock = MockBackend::new();
    let view = ContactView::new();
    view.submit(&mock, None, draft()).await.unwrap();

    settle().await;
    tokio::time::advance(BANNER_WINDOW - std::time::Duration::from_millis(1)).await;
    settle().await;
    assert_eq!(view.snapshot().1, ContactStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn resubmit_replaces_pending_revert() {
    let mock = MockBackend::new();
    let view = ContactView::new();
    view.submit(&mock, None, draft()).await.unwrap();
    settle().await;

    tokio::time::advance(std::time::Duration::from_secs(2)).await;
    mock.push_contact(Err(BackendError::Transport("offline".into())));
    view.submit(&mock, None, draft()).await.unwrap();
    settle().await;

    // The first banner's timer would have fired here.
    tokio::time::advance(std::time::Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(view.snapshot().1, ContactStatus::Error);

    tokio::time::advance(std::time::Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(view.snapshot().1, ContactStatus::Idle);
}

#[tokio::test]
async fn blank_field_is_rejected_and_kept() {
    let mock = MockBackend::new();
    let view = ContactView::new();
    let mut partial = draft();
    partial.subject = String::new();

    let err = view.submit(&mock, None, partial.clone()).await.unwrap_err();
    assert_eq!(err, FormError::Missing("Subject"));
    assert_eq!(view.snapshot(), (partial, ContactStatus::Idle));
    assert_eq!(mock.call_count("insert_contact_message"), 0);
}
