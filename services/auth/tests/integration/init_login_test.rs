use chrono::{Duration, Utc};

use otpgate_auth::domain::types::{LOGIN_CODE_TTL_SECS, LoginCodeStatus, OTP_LEN};
use otpgate_auth::error::AuthServiceError;
use otpgate_auth::usecase::login::InitLoginInput;

use crate::helpers::{MockOtpSender, TEST_USERNAME, TestEnv};

fn input(username: &str) -> InitLoginInput {
    InitLoginInput {
        username: username.to_owned(),
    }
}

#[tokio::test]
async fn should_issue_pending_code_and_send_it_to_username() {
    let env = TestEnv::new();
    let before = Utc::now();

    env.init_login().execute(input(TEST_USERNAME)).await.unwrap();

    let active = env.store.active_rows(TEST_USERNAME).await;
    assert_eq!(active.len(), 1);
    let code = &active[0];
    assert_eq!(code.status, LoginCodeStatus::Pending);
    assert_eq!(code.code.len(), OTP_LEN);
    assert!(code.expiry_time >= before + Duration::seconds(LOGIN_CODE_TTL_SECS));
    assert!(code.expiry_time <= Utc::now() + Duration::seconds(LOGIN_CODE_TTL_SECS));

    let sent = env.sender.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].destination, TEST_USERNAME);
    assert_eq!(sent[0].otp, code.code);
}

#[tokio::test]
async fn should_keep_single_active_code_across_repeated_init_login() {
    let env = TestEnv::new();
    let usecase = env.init_login();

    for _ in 0..5 {
        usecase.execute(input(TEST_USERNAME)).await.unwrap();
    }

    let active = env.store.active_rows(TEST_USERNAME).await;
    assert_eq!(active.len(), 1, "expected one active code, got {active:?}");
    assert_eq!(env.store.all_rows().await.len(), 1);
    assert_eq!(active[0].code, env.last_otp());
    assert_eq!(env.sent_count(), 5);
}

#[tokio::test]
async fn should_refresh_existing_row_in_place() {
    let env = TestEnv::new();
    let usecase = env.init_login();

    usecase.execute(input(TEST_USERNAME)).await.unwrap();
    let first = env.store.active_rows(TEST_USERNAME).await.remove(0);

    usecase.execute(input(TEST_USERNAME)).await.unwrap();
    let second = env.store.active_rows(TEST_USERNAME).await.remove(0);

    assert_eq!(first.id, second.id);
    assert_eq!(first.created_at, second.created_at);
    assert!(second.expiry_time >= first.expiry_time);
    assert_eq!(second.code, env.last_otp());
}

#[tokio::test]
async fn should_revive_expired_code_as_pending() {
    let env = TestEnv::new();
    let usecase = env.init_login();

    usecase.execute(input(TEST_USERNAME)).await.unwrap();
    env.store.expire_all().await;

    usecase.execute(input(TEST_USERNAME)).await.unwrap();

    let code = env.store.active_rows(TEST_USERNAME).await.remove(0);
    assert_eq!(code.status, LoginCodeStatus::Pending);
    assert!(code.is_usable_at(Utc::now()));
}

#[tokio::test]
async fn should_reject_unknown_identity_without_side_effects() {
    let env = TestEnv::new();

    let result = env.init_login().execute(input("+10000000000")).await;

    assert!(
        matches!(result, Err(AuthServiceError::IdentityNotFound)),
        "expected IdentityNotFound, got {result:?}"
    );
    assert!(env.store.all_rows().await.is_empty());
    assert_eq!(env.sent_count(), 0);
}

#[tokio::test]
async fn should_keep_issued_code_when_delivery_fails() {
    let env = TestEnv::with_sender(MockOtpSender::failing());

    let result = env.init_login().execute(input(TEST_USERNAME)).await;

    assert!(
        matches!(result, Err(AuthServiceError::DeliveryFailed(_))),
        "expected DeliveryFailed, got {result:?}"
    );
    let active = env.store.active_rows(TEST_USERNAME).await;
    assert_eq!(active.len(), 1);
    assert!(active[0].is_usable_at(Utc::now()));
}
