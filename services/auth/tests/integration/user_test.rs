use uuid::Uuid;

use otpgate_auth::error::AuthServiceError;
use otpgate_auth::usecase::user::{GetUserUseCase, RegisterUserInput, RegisterUserUseCase};

use crate::helpers::{MockUserRepo, TEST_USERNAME, test_user};

fn register_input(username: &str) -> RegisterUserInput {
    RegisterUserInput {
        full_name: "Jane Roe".to_owned(),
        username: username.to_owned(),
        role: "USER".to_owned(),
    }
}

#[tokio::test]
async fn should_register_new_user() {
    let repo = MockUserRepo::empty();
    let usecase = RegisterUserUseCase { repo: repo.clone() };

    let user = usecase
        .execute(register_input(" +14155550100 "))
        .await
        .unwrap();

    assert_eq!(user.username, "+14155550100");
    assert_eq!(user.full_name, "Jane Roe");
    let stored = repo.users.lock().unwrap().clone();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, user.id);
}

#[tokio::test]
async fn should_reject_duplicate_username() {
    let usecase = RegisterUserUseCase {
        repo: MockUserRepo::new(vec![test_user()]),
    };

    let result = usecase.execute(register_input(TEST_USERNAME)).await;

    assert!(
        matches!(result, Err(AuthServiceError::UserAlreadyExists)),
        "expected UserAlreadyExists, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_blank_fields() {
    let usecase = RegisterUserUseCase {
        repo: MockUserRepo::empty(),
    };

    let result = usecase
        .execute(RegisterUserInput {
            full_name: "   ".to_owned(),
            username: TEST_USERNAME.to_owned(),
            role: "USER".to_owned(),
        })
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::MissingData)),
        "expected MissingData, got {result:?}"
    );
}

#[tokio::test]
async fn should_get_user_by_id() {
    let user = test_user();
    let usecase = GetUserUseCase {
        repo: MockUserRepo::new(vec![user.clone()]),
    };

    let found = usecase.execute(user.id).await.unwrap();

    assert_eq!(found.username, user.username);
}

#[tokio::test]
async fn should_return_not_found_for_unknown_id() {
    let usecase = GetUserUseCase {
        repo: MockUserRepo::new(vec![test_user()]),
    };

    let result = usecase.execute(Uuid::now_v7()).await;

    assert!(
        matches!(result, Err(AuthServiceError::IdentityNotFound)),
        "expected IdentityNotFound, got {result:?}"
    );
}
