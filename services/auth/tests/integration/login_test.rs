use chrono::Utc;

use otpgate_auth::domain::repository::LoginCodeRepository;
use otpgate_auth::domain::types::LoginCodeStatus;
use otpgate_auth::error::AuthServiceError;
use otpgate_auth::usecase::login::{InitLoginInput, LoginInput};
use otpgate_auth_types::token::validate_access_token;

use crate::helpers::{
    FailingTokenIssuer, MockOtpSender, TEST_AUTH_SECRET, TEST_TOKEN_TTL_SECS, TEST_USERNAME,
    TestEnv,
};

async fn init_login(env: &TestEnv) -> String {
    env.init_login()
        .execute(InitLoginInput {
            username: TEST_USERNAME.to_owned(),
        })
        .await
        .unwrap();
    env.last_otp()
}

fn input(otp: &str) -> LoginInput {
    LoginInput {
        username: TEST_USERNAME.to_owned(),
        otp: otp.to_owned(),
    }
}

/// A six-digit code guaranteed to differ from `otp`.
fn wrong_otp(otp: &str) -> String {
    if otp == "000000" {
        "111111".to_owned()
    } else {
        "000000".to_owned()
    }
}

#[tokio::test]
async fn should_exchange_valid_otp_for_credential() {
    let env = TestEnv::new();
    let otp = init_login(&env).await;

    let credential = env.login().execute(input(&otp)).await.unwrap();

    assert_eq!(credential.expires_in, TEST_TOKEN_TTL_SECS);
    let info = validate_access_token(&credential.token, TEST_AUTH_SECRET).unwrap();
    assert_eq!(info.user_id, env.user.id);
    assert_eq!(info.user_role, env.user.role);
}

#[tokio::test]
async fn should_consume_code_on_success() {
    let env = TestEnv::new();
    let otp = init_login(&env).await;

    env.login().execute(input(&otp)).await.unwrap();

    assert!(env.store.active_rows(TEST_USERNAME).await.is_empty());
    let rows = env.store.all_rows().await;
    assert_eq!(rows.len(), 1);
    assert!(rows[0].deleted_at.is_some());
    assert_eq!(rows[0].status, LoginCodeStatus::Success);
}

#[tokio::test]
async fn should_accept_otp_only_once() {
    let env = TestEnv::new();
    let otp = init_login(&env).await;
    let usecase = env.login();

    usecase.execute(input(&otp)).await.unwrap();
    let result = usecase.execute(input(&otp)).await;

    assert!(
        matches!(result, Err(AuthServiceError::NoActiveCode)),
        "expected NoActiveCode, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_login_without_init() {
    let env = TestEnv::new();

    let result = env.login().execute(input("123456")).await;

    assert!(
        matches!(result, Err(AuthServiceError::NoActiveCode)),
        "expected NoActiveCode, got {result:?}"
    );
}

#[tokio::test]
async fn should_preserve_code_after_wrong_otp() {
    let env = TestEnv::new();
    let otp = init_login(&env).await;
    let usecase = env.login();
    let before = env.store.active_rows(TEST_USERNAME).await.remove(0);

    let result = usecase.execute(input(&wrong_otp(&otp))).await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidOtp)),
        "expected InvalidOtp, got {result:?}"
    );

    let after = env.store.active_rows(TEST_USERNAME).await.remove(0);
    assert_eq!(before.id, after.id);
    assert_eq!(before.code, after.code);
    assert_eq!(after.status, LoginCodeStatus::Pending);

    usecase.execute(input(&otp)).await.unwrap();
}

#[tokio::test]
async fn should_reject_expired_otp_even_when_correct() {
    let env = TestEnv::new();
    let otp = init_login(&env).await;
    env.store.expire_all().await;

    let result = env.login().execute(input(&otp)).await;

    assert!(
        matches!(result, Err(AuthServiceError::OtpExpired)),
        "expected OtpExpired, got {result:?}"
    );
    assert_eq!(env.store.active_rows(TEST_USERNAME).await.len(), 1);
}

#[tokio::test]
async fn should_report_invalid_otp_before_expiry() {
    let env = TestEnv::new();
    let otp = init_login(&env).await;
    env.store.expire_all().await;

    let result = env.login().execute(input(&wrong_otp(&otp))).await;

    assert!(
        matches!(result, Err(AuthServiceError::InvalidOtp)),
        "expected InvalidOtp, got {result:?}"
    );
}

#[tokio::test]
async fn should_invalidate_previous_otp_after_refresh() {
    let env = TestEnv::new();
    let first = init_login(&env).await;
    let mut second = init_login(&env).await;
    while second == first {
        second = init_login(&env).await;
    }
    let usecase = env.login();

    let result = usecase.execute(input(&first)).await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidOtp)),
        "expected InvalidOtp, got {result:?}"
    );

    usecase.execute(input(&second)).await.unwrap();
}

#[tokio::test]
async fn should_leave_code_active_when_token_generation_fails() {
    let env = TestEnv::new();
    let otp = init_login(&env).await;

    let result = env.login_with(FailingTokenIssuer).execute(input(&otp)).await;
    assert!(
        matches!(result, Err(AuthServiceError::Token(_))),
        "expected Token error, got {result:?}"
    );

    let active = env.store.active_rows(TEST_USERNAME).await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].status, LoginCodeStatus::Pending);

    env.login().execute(input(&otp)).await.unwrap();
}

#[tokio::test]
async fn should_leave_code_active_when_commit_fails() {
    let env = TestEnv::new();
    let otp = init_login(&env).await;
    let mut usecase = env.login();
    usecase.transactioner.fail_commit = true;

    let result = usecase.execute(input(&otp)).await;
    assert!(
        matches!(result, Err(AuthServiceError::Transaction(_))),
        "expected Transaction error, got {result:?}"
    );

    assert_eq!(env.store.active_rows(TEST_USERNAME).await.len(), 1);
    env.login().execute(input(&otp)).await.unwrap();
}

#[tokio::test]
async fn should_reject_unknown_identity_without_touching_codes() {
    let env = TestEnv::new();
    let otp = init_login(&env).await;

    let result = env
        .login()
        .execute(LoginInput {
            username: "+10000000000".to_owned(),
            otp: otp.clone(),
        })
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::IdentityNotFound)),
        "expected IdentityNotFound, got {result:?}"
    );
    let code = env.store.active_rows(TEST_USERNAME).await.remove(0);
    assert_eq!(code.code, otp);
}

#[tokio::test]
async fn should_login_with_code_whose_delivery_failed() {
    let env = TestEnv::with_sender(MockOtpSender::failing());
    let result = env
        .init_login()
        .execute(InitLoginInput {
            username: TEST_USERNAME.to_owned(),
        })
        .await;
    assert!(matches!(result, Err(AuthServiceError::DeliveryFailed(_))));

    // The code never reached the user; read it back from the store.
    let otp = env
        .store
        .find_by_username(None, TEST_USERNAME)
        .await
        .unwrap()
        .unwrap()
        .code;

    env.login().execute(input(&otp)).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn should_let_only_one_of_concurrent_logins_succeed() {
    let env = TestEnv::new();
    let otp = init_login(&env).await;
    let first = env.login();
    let second = env.login();

    let (a, b) = tokio::join!(first.execute(input(&otp)), second.execute(input(&otp)));

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "expected exactly one success, got {a:?} and {b:?}");
    let failure = if a.is_ok() { b } else { a };
    assert!(
        matches!(failure, Err(AuthServiceError::NoActiveCode)),
        "expected NoActiveCode, got {failure:?}"
    );

    let rows = env.store.all_rows().await;
    assert_eq!(rows.len(), 1);
    assert!(rows[0].deleted_at.is_some());
    assert!(rows[0].expiry_time > Utc::now());
}

#[tokio::test]
async fn should_fail_without_credential_when_consume_finds_no_row() {
    let env = TestEnv::new();
    let otp = init_login(&env).await;

    let result = env.login_outraced().execute(input(&otp)).await;

    assert!(
        matches!(result, Err(AuthServiceError::NoActiveCode)),
        "expected NoActiveCode, got {result:?}"
    );
    let active = env.store.active_rows(TEST_USERNAME).await;
    assert_eq!(active.len(), 1, "rollback should keep the code, got {active:?}");
    assert_eq!(active[0].code, otp);
    assert_eq!(active[0].status, LoginCodeStatus::Pending);
}
