use std::path::Path;
use std::sync::Arc;

use clipnote_core::Attachment;
use clipnote_engine::{AttachmentStaging, MemoryStore, PreviewStore, TempFilePreviews};

fn attachment(name: &str, local_url: Option<String>) -> Attachment {
    Attachment {
        name: name.to_string(),
        path: format!("/file/{name}"),
        size: 1,
        content_type: "image/png".to_string(),
        original_url: Some(format!("https://e.com/{name}")),
        local_url,
    }
}

fn staging() -> (AttachmentStaging, Arc<TempFilePreviews>) {
    let previews = Arc::new(TempFilePreviews::new().expect("previews"));
    let staging = AttachmentStaging::new(Arc::new(MemoryStore::new()), previews.clone());
    (staging, previews)
}

#[tokio::test]
async fn staged_attachments_round_trip() {
    let (staging, _previews) = staging();
    assert!(staging.list().await.expect("list").is_empty());

    staging.stage(attachment("a.png", None)).await.expect("stage");
    staging.stage(attachment("b.png", None)).await.expect("stage");

    let listed = staging.list().await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].name, "a.png");
    assert_eq!(listed[1].name, "b.png");
}

#[tokio::test]
async fn removing_an_entry_revokes_its_preview_first() {
    let (staging, previews) = staging();
    let keep = previews.create(b"keep").expect("preview");
    let drop = previews.create(b"drop").expect("preview");

    staging
        .stage(attachment("keep.png", Some(keep.clone())))
        .await
        .expect("stage");
    staging
        .stage(attachment("drop.png", Some(drop.clone())))
        .await
        .expect("stage");

    staging.remove(1).await.expect("remove");

    assert!(Path::new(&keep).exists());
    assert!(!Path::new(&drop).exists(), "removed entry's preview released");
    let listed = staging.list().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "keep.png");

    // Out-of-range removal is a no-op.
    staging.remove(7).await.expect("remove");
    assert_eq!(staging.list().await.expect("list").len(), 1);
}

#[tokio::test]
async fn clear_releases_every_preview() {
    let (staging, previews) = staging();
    let first = previews.create(b"1").expect("preview");
    let second = previews.create(b"2").expect("preview");
    staging
        .stage(attachment("a.png", Some(first.clone())))
        .await
        .expect("stage");
    staging
        .stage(attachment("b.png", Some(second.clone())))
        .await
        .expect("stage");

    staging.clear().await.expect("clear");

    assert!(!Path::new(&first).exists());
    assert!(!Path::new(&second).exists());
    assert!(staging.list().await.expect("list").is_empty());
}

#[tokio::test]
async fn hydrate_creates_previews_only_where_missing() {
    let (staging, previews) = staging();
    let existing = previews.create(b"already").expect("preview");
    staging
        .stage(attachment("have.png", Some(existing.clone())))
        .await
        .expect("stage");
    staging.stage(attachment("need.png", None)).await.expect("stage");

    let hydrated = staging
        .hydrate_previews(|url| async move {
            assert_eq!(url, "https://e.com/need.png");
            Some(b"fetched bytes".to_vec())
        })
        .await
        .expect("hydrate");

    assert_eq!(hydrated[0].local_url.as_deref(), Some(existing.as_str()));
    let created = hydrated[1].local_url.clone().expect("preview created");
    assert!(Path::new(&created).exists());

    // The hydrated handle is persisted for the next panel open.
    let listed = staging.list().await.expect("list");
    assert_eq!(listed[1].local_url.as_deref(), Some(created.as_str()));
}

#[tokio::test]
async fn hydrate_tolerates_failed_fetches() {
    let (staging, _previews) = staging();
    staging.stage(attachment("need.png", None)).await.expect("stage");

    let hydrated = staging
        .hydrate_previews(|_url| async move { None })
        .await
        .expect("hydrate");
    assert_eq!(hydrated[0].local_url, None);
}
