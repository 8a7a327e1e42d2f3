//! End-to-end workflow tests against the in-memory backend: compose,
//! send, sign, complete, download, certificate.

use chrono::Utc;
use signflow_engine::{
    Actor, DocumentDraft, EngineError, FieldSpec, FileSpec, RecipientSpec, RequestMeta,
    SessionRejection, SignflowConfig, SignflowEngine, StaticBlobFetcher,
};
use signflow_notify::RecordingNotifier;
use signflow_storage::memory::InMemorySignflowStorage;
use signflow_storage::{DocumentStore, FieldStore, RecipientStore, SessionStore, UserStore};
use signflow_types::{
    AuditEventType, DocumentStatus, FieldId, FieldType, OrganizationId, RecipientRole,
    RecipientStatus, SigningOrder, User, UserId, UserRole,
};
use std::collections::HashMap;
use std::sync::Arc;

struct Harness {
    storage: Arc<InMemorySignflowStorage>,
    notifier: Arc<RecordingNotifier>,
    blobs: Arc<StaticBlobFetcher>,
    engine: SignflowEngine,
}

fn harness() -> Harness {
    let storage = Arc::new(InMemorySignflowStorage::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let blobs = Arc::new(StaticBlobFetcher::new());
    let engine = SignflowEngine::new(
        storage.clone(),
        notifier.clone(),
        blobs.clone(),
        SignflowConfig::default().with_base_url("https://sign.example.com"),
    );
    Harness {
        storage,
        notifier,
        blobs,
        engine,
    }
}

async fn seed_creator(storage: &InMemorySignflowStorage) {
    storage
        .insert_user(User {
            id: UserId::new("user-1"),
            organization_id: OrganizationId::new("org-1"),
            email: "grace@sender.example.com".to_string(),
            full_name: Some("Grace Hopper".to_string()),
            role: UserRole::Owner,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
}

fn signer(name: &str, email: &str) -> RecipientSpec {
    RecipientSpec {
        name: name.to_string(),
        email: email.to_string(),
        role: RecipientRole::Signer,
        signing_order: 0,
        contact_id: None,
    }
}

fn cc(name: &str, email: &str) -> RecipientSpec {
    RecipientSpec {
        role: RecipientRole::Cc,
        ..signer(name, email)
    }
}

fn draft(recipients: Vec<RecipientSpec>) -> DocumentDraft {
    DocumentDraft {
        organization_id: OrganizationId::new("org-1"),
        created_by: UserId::new("user-1"),
        title: "Master Services Agreement".to_string(),
        description: None,
        signing_order: SigningOrder::Parallel,
        recipients,
        fields: vec![],
        file: None,
        send_now: false,
    }
}

fn signature_field(recipient_index: usize) -> FieldSpec {
    FieldSpec {
        recipient_index,
        kind: FieldType::Signature,
        page: 1,
        x: 10.0,
        y: 80.0,
        width: 25.0,
        height: 6.0,
        required: true,
        placeholder: None,
    }
}

async fn token_for(storage: &InMemorySignflowStorage, email: &str, doc: &signflow_types::DocumentId) -> String {
    let recipient = storage
        .list_recipients(doc)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.email == email)
        .unwrap();
    storage
        .find_session_for_recipient(&recipient.id)
        .await
        .unwrap()
        .unwrap()
        .token
}

fn no_values() -> HashMap<FieldId, serde_json::Value> {
    HashMap::new()
}

#[tokio::test]
async fn full_workflow_from_compose_to_certificate() {
    let h = harness();
    seed_creator(&h.storage).await;

    let document = h
        .engine
        .documents()
        .create_document(
            draft(vec![
                signer("Ada", "ada@example.com"),
                signer("Alan", "alan@example.com"),
                cc("Watcher", "watcher@example.com"),
            ]),
            Actor::System,
            &RequestMeta::default(),
        )
        .await
        .unwrap();
    assert_eq!(document.status, DocumentStatus::Draft);

    let outcome = h
        .engine
        .documents()
        .send_document(&document.id, Actor::System, &RequestMeta::default())
        .await
        .unwrap();
    assert_eq!(outcome.document.status, DocumentStatus::Pending);
    // Only signers are emailed a signing link; the cc waits for completion.
    assert_eq!(h.notifier.sent().len(), 2);
    assert!(h.notifier.sent_to("watcher@example.com").is_empty());

    let ada = token_for(&h.storage, "ada@example.com", &document.id).await;
    let first = h
        .engine
        .signing()
        .submit_signature(&ada, no_values(), &RequestMeta::default())
        .await
        .unwrap();
    assert!(!first.document_completed);

    let alan = token_for(&h.storage, "alan@example.com", &document.id).await;
    let second = h
        .engine
        .signing()
        .submit_signature(&alan, no_values(), &RequestMeta::default())
        .await
        .unwrap();
    assert!(second.document_completed);
    assert!(second.notify_failures.is_empty());

    // Completion fan-out reaches both signers, the cc, and the creator.
    assert_eq!(h.notifier.sent_to("ada@example.com").len(), 2);
    assert_eq!(h.notifier.sent_to("alan@example.com").len(), 2);
    assert_eq!(h.notifier.sent_to("watcher@example.com").len(), 1);
    assert_eq!(h.notifier.sent_to("grace@sender.example.com").len(), 1);

    let certificate = h.engine.documents().certificate(&document.id).await.unwrap();
    assert_eq!(certificate.signers.len(), 2);
    assert!(certificate.completed_at.is_some());

    let trail = h.engine.trail(&document.id).await.unwrap();
    let completed = trail
        .iter()
        .filter(|e| e.event_type == AuditEventType::DocumentCompleted)
        .count();
    assert_eq!(completed, 1);
}

#[tokio::test]
async fn concurrent_final_signatures_complete_exactly_once() {
    let h = harness();
    seed_creator(&h.storage).await;

    let document = h
        .engine
        .documents()
        .create_document(
            draft(vec![
                signer("Ada", "ada@example.com"),
                signer("Alan", "alan@example.com"),
            ]),
            Actor::System,
            &RequestMeta::default(),
        )
        .await
        .unwrap();
    h.engine
        .documents()
        .send_document(&document.id, Actor::System, &RequestMeta::default())
        .await
        .unwrap();

    let ada = token_for(&h.storage, "ada@example.com", &document.id).await;
    let alan = token_for(&h.storage, "alan@example.com", &document.id).await;

    let meta = RequestMeta::default();
    let (a, b) = tokio::join!(
        h.engine.signing().submit_signature(&ada, no_values(), &meta),
        h.engine.signing().submit_signature(&alan, no_values(), &meta),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    // Exactly one submission wins the completion write.
    assert_eq!(
        u8::from(a.document_completed) + u8::from(b.document_completed),
        1
    );
    let trail = h.engine.trail(&document.id).await.unwrap();
    let completed = trail
        .iter()
        .filter(|e| e.event_type == AuditEventType::DocumentCompleted)
        .count();
    assert_eq!(completed, 1);
    assert_eq!(
        h.storage
            .get_document(&document.id)
            .await
            .unwrap()
            .unwrap()
            .status,
        DocumentStatus::Completed
    );
}

#[tokio::test]
async fn duplicate_submission_from_the_same_token_is_rejected() {
    let h = harness();
    seed_creator(&h.storage).await;

    let document = h
        .engine
        .documents()
        .create_document(
            draft(vec![
                signer("Ada", "ada@example.com"),
                signer("Alan", "alan@example.com"),
            ]),
            Actor::System,
            &RequestMeta::default(),
        )
        .await
        .unwrap();
    h.engine
        .documents()
        .send_document(&document.id, Actor::System, &RequestMeta::default())
        .await
        .unwrap();

    let ada = token_for(&h.storage, "ada@example.com", &document.id).await;
    h.engine
        .signing()
        .submit_signature(&ada, no_values(), &RequestMeta::default())
        .await
        .unwrap();
    let replay = h
        .engine
        .signing()
        .submit_signature(&ada, no_values(), &RequestMeta::default())
        .await;
    assert!(matches!(
        replay,
        Err(EngineError::Rejected(SessionRejection::AlreadySigned))
    ));

    let trail = h.engine.trail(&document.id).await.unwrap();
    let signed = trail
        .iter()
        .filter(|e| e.event_type == AuditEventType::RecipientSigned)
        .count();
    assert_eq!(signed, 1);
}

#[tokio::test]
async fn voided_document_rejects_signing() {
    let h = harness();
    seed_creator(&h.storage).await;

    let document = h
        .engine
        .documents()
        .create_document(
            draft(vec![signer("Ada", "ada@example.com")]),
            Actor::System,
            &RequestMeta::default(),
        )
        .await
        .unwrap();
    h.engine
        .documents()
        .send_document(&document.id, Actor::System, &RequestMeta::default())
        .await
        .unwrap();
    let ada = token_for(&h.storage, "ada@example.com", &document.id).await;

    h.engine
        .documents()
        .void_document(
            &document.id,
            Some("deal fell through".to_string()),
            Actor::System,
            &RequestMeta::default(),
        )
        .await
        .unwrap();

    let result = h
        .engine
        .signing()
        .submit_signature(&ada, no_values(), &RequestMeta::default())
        .await;
    assert!(matches!(
        result,
        Err(EngineError::Rejected(SessionRejection::DocumentVoided))
    ));
    // The outstanding signer got a void notice.
    assert_eq!(h.notifier.sent_to("ada@example.com").len(), 2);
}

#[tokio::test]
async fn completion_fanout_survives_individual_email_failures() {
    let h = harness();
    seed_creator(&h.storage).await;
    h.notifier.fail_for("ada@example.com");

    let document = h
        .engine
        .documents()
        .create_document(
            draft(vec![
                signer("Ada", "ada@example.com"),
                signer("Alan", "alan@example.com"),
            ]),
            Actor::System,
            &RequestMeta::default(),
        )
        .await
        .unwrap();
    h.engine
        .documents()
        .send_document(&document.id, Actor::System, &RequestMeta::default())
        .await
        .unwrap();

    let ada = token_for(&h.storage, "ada@example.com", &document.id).await;
    let alan = token_for(&h.storage, "alan@example.com", &document.id).await;
    h.engine
        .signing()
        .submit_signature(&ada, no_values(), &RequestMeta::default())
        .await
        .unwrap();
    let outcome = h
        .engine
        .signing()
        .submit_signature(&alan, no_values(), &RequestMeta::default())
        .await
        .unwrap();

    // Ada's completion email fails; Alan and the creator still get theirs
    // and the completion itself stands.
    assert!(outcome.document_completed);
    assert_eq!(outcome.notify_failures.len(), 1);
    assert_eq!(outcome.notify_failures[0].email, "ada@example.com");
    assert_eq!(h.notifier.sent_to("alan@example.com").len(), 2);
    assert_eq!(h.notifier.sent_to("grace@sender.example.com").len(), 1);

    let trail = h.engine.trail(&document.id).await.unwrap();
    let failed_audits = trail
        .iter()
        .filter(|e| {
            e.event_type == AuditEventType::RecipientCompletionEmailSent
                && e.metadata["email_success"] == serde_json::json!(false)
        })
        .count();
    assert_eq!(failed_audits, 1);
}

#[tokio::test]
async fn declined_recipients_block_completion_without_voiding() {
    let h = harness();
    seed_creator(&h.storage).await;

    let document = h
        .engine
        .documents()
        .create_document(
            draft(vec![
                signer("Ada", "ada@example.com"),
                signer("Alan", "alan@example.com"),
            ]),
            Actor::System,
            &RequestMeta::default(),
        )
        .await
        .unwrap();
    h.engine
        .documents()
        .send_document(&document.id, Actor::System, &RequestMeta::default())
        .await
        .unwrap();

    let ada = token_for(&h.storage, "ada@example.com", &document.id).await;
    h.engine
        .signing()
        .decline_signature(&ada, Some("terms unacceptable".into()), &RequestMeta::default())
        .await
        .unwrap();

    // The declined link is retired outright.
    let retried = h
        .engine
        .signing()
        .submit_signature(&ada, no_values(), &RequestMeta::default())
        .await;
    assert!(matches!(
        retried,
        Err(EngineError::Rejected(SessionRejection::Declined))
    ));

    let alan = token_for(&h.storage, "alan@example.com", &document.id).await;
    let outcome = h
        .engine
        .signing()
        .submit_signature(&alan, no_values(), &RequestMeta::default())
        .await
        .unwrap();
    assert!(!outcome.document_completed);
    assert_eq!(
        h.storage
            .get_document(&document.id)
            .await
            .unwrap()
            .unwrap()
            .status,
        DocumentStatus::Pending
    );

    let trail = h.engine.trail(&document.id).await.unwrap();
    let declined = trail
        .iter()
        .find(|e| e.event_type == AuditEventType::DocumentDeclined)
        .unwrap();
    assert_eq!(
        declined.metadata["reason"],
        serde_json::json!("terms unacceptable")
    );
}

#[tokio::test]
async fn missing_required_fields_block_the_signature() {
    let h = harness();
    seed_creator(&h.storage).await;

    let mut d = draft(vec![signer("Ada", "ada@example.com")]);
    d.fields.push(signature_field(0));
    let document = h
        .engine
        .documents()
        .create_document(d, Actor::System, &RequestMeta::default())
        .await
        .unwrap();
    h.engine
        .documents()
        .send_document(&document.id, Actor::System, &RequestMeta::default())
        .await
        .unwrap();
    let ada = token_for(&h.storage, "ada@example.com", &document.id).await;

    let result = h
        .engine
        .signing()
        .submit_signature(&ada, no_values(), &RequestMeta::default())
        .await;
    assert!(matches!(
        result,
        Err(EngineError::MissingRequiredFields(ref names)) if names == &vec!["signature".to_string()]
    ));
    // The rejection left the recipient untouched.
    let recipient = &h.storage.list_recipients(&document.id).await.unwrap()[0];
    assert_ne!(recipient.status, RecipientStatus::Signed);

    // Supplying the value lets the same token through.
    let fields = h.storage.list_fields(&document.id).await.unwrap();
    let mut values = HashMap::new();
    values.insert(fields[0].id.clone(), serde_json::json!("data:image/png;base64,AAA"));
    let outcome = h
        .engine
        .signing()
        .submit_signature(&ada, values, &RequestMeta::default())
        .await
        .unwrap();
    assert!(outcome.document_completed);
}

#[tokio::test]
async fn one_recipient_cannot_write_anothers_field() {
    let h = harness();
    seed_creator(&h.storage).await;

    let mut d = draft(vec![
        signer("Ada", "ada@example.com"),
        signer("Alan", "alan@example.com"),
    ]);
    d.fields.push(signature_field(0));
    let document = h
        .engine
        .documents()
        .create_document(d, Actor::System, &RequestMeta::default())
        .await
        .unwrap();
    h.engine
        .documents()
        .send_document(&document.id, Actor::System, &RequestMeta::default())
        .await
        .unwrap();

    // Alan submits a value for Ada's field; the write matches no row.
    let ada_field = h.storage.list_fields(&document.id).await.unwrap()[0].clone();
    let alan = token_for(&h.storage, "alan@example.com", &document.id).await;
    let mut values = HashMap::new();
    values.insert(ada_field.id.clone(), serde_json::json!("forged"));
    h.engine
        .signing()
        .submit_signature(&alan, values, &RequestMeta::default())
        .await
        .unwrap();

    let field = h.storage.list_fields(&document.id).await.unwrap()[0].clone();
    assert!(field.value.is_none());
}

#[tokio::test]
async fn completion_email_attaches_small_signed_pdfs() {
    let h = harness();
    seed_creator(&h.storage).await;

    let mut d = draft(vec![signer("Ada", "ada@example.com")]);
    d.file = Some(FileSpec {
        url: "https://blobs.example.com/original.pdf".to_string(),
        filename: "original.pdf".to_string(),
        size_bytes: Some(1024),
        page_count: Some(3),
    });
    let document = h
        .engine
        .documents()
        .create_document(d, Actor::System, &RequestMeta::default())
        .await
        .unwrap();
    h.engine
        .documents()
        .send_document(&document.id, Actor::System, &RequestMeta::default())
        .await
        .unwrap();

    use signflow_storage::FileStore;
    h.storage
        .insert_file(signflow_types::DocumentFile {
            id: "signed-1".to_string(),
            document_id: document.id.clone(),
            kind: signflow_types::FileKind::Signed,
            url: "https://blobs.example.com/signed.pdf".to_string(),
            filename: "signed.pdf".to_string(),
            size_bytes: Some(2048),
            page_count: Some(3),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    h.blobs
        .insert("https://blobs.example.com/signed.pdf", "JVBERi0xLjc=");

    let ada = token_for(&h.storage, "ada@example.com", &document.id).await;
    h.engine
        .signing()
        .submit_signature(&ada, no_values(), &RequestMeta::default())
        .await
        .unwrap();

    let completion = h.notifier.sent_to("ada@example.com")[1].clone();
    assert_eq!(completion.attachments.len(), 1);
    assert_eq!(completion.attachments[0].filename, "signed.pdf");
}

#[tokio::test]
async fn download_token_serves_the_signed_file_and_stays_valid() {
    let h = harness();
    seed_creator(&h.storage).await;

    let mut d = draft(vec![signer("Ada", "ada@example.com")]);
    d.file = Some(FileSpec {
        url: "https://blobs.example.com/original.pdf".to_string(),
        filename: "original.pdf".to_string(),
        size_bytes: Some(1024),
        page_count: Some(1),
    });
    let document = h
        .engine
        .documents()
        .create_document(d, Actor::System, &RequestMeta::default())
        .await
        .unwrap();
    h.engine
        .documents()
        .send_document(&document.id, Actor::System, &RequestMeta::default())
        .await
        .unwrap();
    let ada = token_for(&h.storage, "ada@example.com", &document.id).await;
    h.engine
        .signing()
        .submit_signature(&ada, no_values(), &RequestMeta::default())
        .await
        .unwrap();

    use signflow_storage::DownloadTokenStore;
    // Pull Ada's download token straight from the completion email link.
    let email = h.notifier.sent_to("ada@example.com")[1].clone();
    let token = email
        .html
        .split("/download/")
        .nth(1)
        .unwrap()
        .split('"')
        .next()
        .unwrap()
        .to_string();

    let grant = h
        .engine
        .documents()
        .download_document(&token, &RequestMeta::default())
        .await
        .unwrap();
    assert_eq!(grant.file.filename, "original.pdf");

    // Tokens are reusable within the expiry window; first use is recorded.
    let again = h
        .engine
        .documents()
        .download_document(&token, &RequestMeta::default())
        .await
        .unwrap();
    assert!(h
        .storage
        .find_download_token(&again.token.token)
        .await
        .unwrap()
        .unwrap()
        .used_at
        .is_some());
}
