//! Exercises the HTTP client against a canned local server.

use casedesk_client::{
    ActivityAction, ApiClient, AuthService, EntityType, Error, ProfileUpdate, RecordKind,
    RecordService, TokenPair,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Serve `responses` in order, one per connection. Bodies may reference the
/// server's own address through a `{base}` placeholder. Each request line
/// (e.g. `GET /api/v1/users/ HTTP/1.1`) is reported on the returned channel.
async fn serve(responses: Vec<(u16, &str)>) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let responses: Vec<(u16, String)> = responses
        .into_iter()
        .map(|(status, body)| (status, body.replace("{base}", &base)))
        .collect();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(head_end) = find(&buf, b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
                    if buf.len() >= head_end + 4 + content_length(&head) {
                        let _ = tx.send(head.lines().next().unwrap_or_default().to_string());
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    (base, rx)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

fn client(base: &str) -> ApiClient {
    ApiClient::new(base, Duration::from_secs(5))
        .unwrap()
        .with_token("test-token")
}

#[tokio::test]
async fn list_users_follows_next_links() {
    let (base, mut requests) = serve(vec![
        (
            200,
            r#"{"count": 2, "next": "{base}/api/v1/users/?page=2", "previous": null, "results": [
                {"id": "u1", "full_name": "Dr. Lim", "email": "lim@clinic.test", "role": "doctor", "is_active": true, "created_at": "2025-01-01T00:00:00Z"}
            ]}"#,
        ),
        (
            200,
            r#"{"count": 2, "next": null, "previous": "{base}/api/v1/users/", "results": [
                {"id": "u2", "full_name": "Siti", "email": "siti@clinic.test", "role": "nurse", "is_active": false, "created_at": "2025-01-02T00:00:00Z"}
            ]}"#,
        ),
    ])
    .await;

    let users = client(&base).list_users().await.unwrap();
    let ids: Vec<_> = users.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["u1", "u2"]);

    assert_eq!(requests.recv().await.unwrap(), "GET /api/v1/users/ HTTP/1.1");
    assert_eq!(
        requests.recv().await.unwrap(),
        "GET /api/v1/users/?page=2 HTTP/1.1"
    );
}

#[tokio::test]
async fn deleted_patients_envelope_is_unwrapped() {
    let (base, mut requests) = serve(vec![(
        200,
        r#"{"count": 1, "patients": [
            {"id": "p1", "patient_code": "PT-1", "full_name": "Ali", "gender": "male", "created_at": "2025-01-01T00:00:00Z"}
        ]}"#,
    )])
    .await;

    let patients = client(&base).list_archived_patients().await.unwrap();
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0].patient_code, "PT-1");
    assert_eq!(
        requests.recv().await.unwrap(),
        "GET /api/v1/patients/deleted/ HTTP/1.1"
    );
}

#[tokio::test]
async fn restore_conflict_surfaces_structured_error() {
    let (base, mut requests) = serve(vec![(
        400,
        r#"{"error": "Cannot restore: email 'a@b.test' is already in use by an active user", "conflict_fields": ["email"]}"#,
    )])
    .await;

    let err = client(&base)
        .restore(RecordKind::User, "arch-1")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(
        err.display_message(),
        "Cannot restore: email 'a@b.test' is already in use by an active user"
    );
    assert_eq!(err.conflict_fields(), &["email".to_string()]);
    assert_eq!(
        requests.recv().await.unwrap(),
        "POST /api/v1/users/arch-1/restore/ HTTP/1.1"
    );
}

#[tokio::test]
async fn purge_reads_receipt() {
    let (base, mut requests) = serve(vec![(
        200,
        r#"{"status": "deleted", "message": "Case C-9 for Ali and all related data permanently deleted"}"#,
    )])
    .await;

    let receipt = client(&base).purge(RecordKind::Case, "c9").await.unwrap();
    assert_eq!(receipt.status.as_deref(), Some("deleted"));
    assert_eq!(
        requests.recv().await.unwrap(),
        "DELETE /api/v1/cases/c9/permanent-delete/ HTTP/1.1"
    );
}

#[tokio::test]
async fn rejected_code_is_not_an_error() {
    let (base, _requests) = serve(vec![(
        400,
        r#"{"detail": "Invalid or expired verification code.", "verified": false}"#,
    )])
    .await;

    let verified = client(&base)
        .verify_code("lim@clinic.test", "000000")
        .await
        .unwrap();
    assert!(!verified);
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let (base, _requests) = serve(vec![(
        401,
        r#"{"detail": "No active account found with the given credentials"}"#,
    )])
    .await;

    let err = client(&base)
        .login("lim@clinic.test", "wrong")
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(matches!(err, Error::Api { status: 401, .. }));
}

#[tokio::test]
async fn login_returns_token_pair() {
    let (base, mut requests) = serve(vec![(200, r#"{"access": "a.b.c", "refresh": "d.e.f"}"#)]).await;

    let tokens = client(&base)
        .login("lim@clinic.test", "secret")
        .await
        .unwrap();
    assert_eq!(tokens.access, "a.b.c");
    assert_eq!(requests.recv().await.unwrap(), "POST /api/login/ HTTP/1.1");
}

fn tokens() -> TokenPair {
    TokenPair {
        access: "a.b.c".into(),
        refresh: "d.e.f".into(),
    }
}

#[tokio::test]
async fn password_reset_round_trip() {
    let (base, mut requests) = serve(vec![
        (200, r#"{"detail": "Password reset email sent. Please check your email."}"#),
        (400, r#"{"token": ["Invalid or expired reset token."]}"#),
        (
            200,
            r#"{"detail": "Password has been reset successfully. You can now log in with your new password."}"#,
        ),
    ])
    .await;
    let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

    let sent = client.forgot_password("lim@clinic.test").await.unwrap();
    assert_eq!(sent.summary("Sent"), "Password reset email sent. Please check your email.");
    assert_eq!(
        requests.recv().await.unwrap(),
        "POST /api/v1/users/forgot-password/ HTTP/1.1"
    );

    let err = client
        .reset_password("lim@clinic.test", "stale", "new-secret")
        .await
        .unwrap_err();
    assert_eq!(err.display_message(), "Invalid or expired reset token.");

    let done = client
        .reset_password("lim@clinic.test", "fresh", "new-secret")
        .await
        .unwrap();
    assert!(done.summary("Reset").starts_with("Password has been reset"));
    assert_eq!(
        requests.recv().await.unwrap(),
        "POST /api/v1/users/reset-password/ HTTP/1.1"
    );
}

#[tokio::test]
async fn change_password_and_profile_use_profile_routes() {
    let (base, mut requests) = serve(vec![
        (400, r#"{"old_password": ["Old password is incorrect."]}"#),
        (200, r#"{"detail": "Password changed successfully."}"#),
        (
            200,
            r#"{"detail": "Profile updated successfully.", "user": {"full_name": "Dr. Lim", "email": "lim@clinic.test", "phone_number": "012", "two_factor_enabled": true}}"#,
        ),
    ])
    .await;
    let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

    let err = client
        .change_password(&tokens(), "wrong", "new-secret")
        .await
        .unwrap_err();
    assert_eq!(err.display_message(), "Old password is incorrect.");
    assert_eq!(
        requests.recv().await.unwrap(),
        "POST /api/v1/users/profile/change-password/ HTTP/1.1"
    );

    let changed = client
        .change_password(&tokens(), "old-secret", "new-secret")
        .await
        .unwrap();
    assert_eq!(changed.summary("Changed"), "Password changed successfully.");

    let update = ProfileUpdate {
        phone_number: Some("012".into()),
        ..Default::default()
    };
    let updated = client.update_profile(&tokens(), &update).await.unwrap();
    assert_eq!(updated.summary("Updated"), "Profile updated successfully.");
    requests.recv().await.unwrap();
    assert_eq!(
        requests.recv().await.unwrap(),
        "PATCH /api/v1/users/profile/update/ HTTP/1.1"
    );
}

#[tokio::test]
async fn activity_feed_follows_pages() {
    let (base, mut requests) = serve(vec![
        (
            200,
            r#"{"count": 2, "next": "{base}/api/v1/activities/?page=2", "previous": null, "results": [
                {"id": "a2", "user": "u1", "user_name": "Dr. Lim", "user_role": "doctor", "action": "create", "entity_type": "patient", "entity_id": "p1", "details": {}, "description": "Dr. Lim created Ali", "created_at": "2025-03-02T00:00:00Z"}
            ]}"#,
        ),
        (
            200,
            r#"{"count": 2, "next": null, "previous": null, "results": [
                {"id": "a1", "user": null, "action": "login", "entity_type": "user", "entity_id": "u1", "created_at": "2025-03-01T00:00:00Z"}
            ]}"#,
        ),
    ])
    .await;

    let feed = client(&base).list_activities().await.unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].action, ActivityAction::Create);
    assert_eq!(feed[1].entity_type, EntityType::User);
    assert_eq!(requests.recv().await.unwrap(), "GET /api/v1/activities/ HTTP/1.1");
}
