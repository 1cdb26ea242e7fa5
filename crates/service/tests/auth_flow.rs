use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use service::auth::domain::Claims;
use service::auth::repo::seaorm::SeaOrmUserRegistry;
use service::auth::repository::mock::MockUserRegistry;
use service::auth::{
    AuthError, AuthService, Authenticator, CredentialHasher, ErrorKind, HashParams, SigningSecret, TokenIssuer,
    UserProvider, UserSaver,
};

const SECRET: &str = "integration-secret";

fn build<S: UserSaver, P: UserProvider>(saver: Arc<S>, provider: Arc<P>) -> AuthService<S, P> {
    let hasher = CredentialHasher::new(HashParams { memory_kib: 1024, iterations: 1, parallelism: 1 })
        .expect("hash params");
    let issuer = TokenIssuer::new(&SigningSecret::new(SECRET));
    AuthService::new(saver, provider, hasher, issuer, Duration::from_secs(3600))
}

fn claims(token: &str) -> Claims {
    decode::<Claims>(token, &DecodingKey::from_secret(SECRET.as_bytes()), &Validation::new(Algorithm::HS256))
        .expect("decode token")
        .claims
}

async fn scenario(svc: &dyn Authenticator) {
    assert_eq!(svc.register_new_user("a@x.com", "pw1").await.unwrap(), 1);

    let err = svc.register_new_user("a@x.com", "pw2").await.unwrap_err();
    assert!(matches!(err, AuthError::UserExists), "got {err:?}");

    let token = svc.login("a@x.com", "pw1", 5).await.unwrap();
    let c = claims(&token);
    assert_eq!(c.sub, "1");
    assert_eq!(c.app_id, 5);
    assert_eq!(c.exp, c.iat + 3600);

    // the second registration must not have replaced the first password
    let err = svc.login("a@x.com", "pw2", 5).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCredentials);

    let err = svc.login("a@x.com", "wrong", 5).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCredentials);

    let err = svc.login("never@x.com", "pw1", 5).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCredentials);
}

#[tokio::test]
async fn concrete_scenario_in_memory() {
    let repo = Arc::new(MockUserRegistry::default());
    let svc = build(repo.clone(), repo.clone());
    scenario(&svc).await;
    assert_eq!(repo.len(), 1);
}

#[tokio::test]
async fn concrete_scenario_sqlite() -> anyhow::Result<()> {
    let db = models::db::connect_in_memory().await?;
    let repo = Arc::new(SeaOrmUserRegistry::new(db.clone()));
    let svc = build(repo.clone(), repo);
    scenario(&svc).await;
    assert_eq!(models::user::count(&db).await?, 1);
    Ok(())
}

async fn race_same_email(svc: Arc<dyn Authenticator>, callers: usize) -> (usize, usize) {
    let mut handles = Vec::with_capacity(callers);
    for i in 0..callers {
        let svc = Arc::clone(&svc);
        handles.push(tokio::spawn(async move {
            svc.register_new_user("race@x.com", &format!("pw{i}")).await
        }));
    }

    let (mut ok, mut exists) = (0, 0);
    for h in handles {
        match h.await.expect("join") {
            Ok(_) => ok += 1,
            Err(AuthError::UserExists) => exists += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    (ok, exists)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_in_memory() {
    let repo = Arc::new(MockUserRegistry::default());
    let svc: Arc<dyn Authenticator> = Arc::new(build(repo.clone(), repo.clone()));

    let (ok, exists) = race_same_email(svc, 16).await;
    assert_eq!(ok, 1);
    assert_eq!(exists, 15);
    assert_eq!(repo.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_sqlite() -> anyhow::Result<()> {
    let db = models::db::connect_in_memory().await?;
    let repo = Arc::new(SeaOrmUserRegistry::new(db.clone()));
    let svc: Arc<dyn Authenticator> = Arc::new(build(repo.clone(), repo));

    let (ok, exists) = race_same_email(svc, 8).await;
    assert_eq!(ok, 1);
    assert_eq!(exists, 7);
    assert_eq!(models::user::count(&db).await?, 1);
    Ok(())
}
