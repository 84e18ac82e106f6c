use std::sync::Arc;

use session_context::middleware::{GateConfig, PageResponse, RedirectTarget, server_side_props};
use session_context::{
    CookieStatus, Credentials, Error, MemoryCookieStore, MemoryProvider, SessionConfig,
    SessionContext,
};

fn context(provider: Arc<MemoryProvider>) -> SessionContext<MemoryProvider, MemoryCookieStore> {
    SessionContext::new(provider, MemoryCookieStore::new(), SessionConfig::default())
}

fn admitted(ctx: &SessionContext<MemoryProvider, MemoryCookieStore>) -> bool {
    matches!(
        server_side_props(&ctx.cookies().jar(), &GateConfig::default()),
        PageResponse::Props(_)
    )
}

#[tokio::test]
async fn sign_up_sign_in_visit_sign_out() {
    let provider = Arc::new(MemoryProvider::new());
    let ctx = context(Arc::clone(&provider));
    assert_eq!(ctx.render(|_| ()), None, "nothing renders before the provider resolves");

    provider.resolve();
    let snapshot = ctx.ready().await;
    assert!(!snapshot.is_authenticated());
    assert!(!admitted(&ctx));

    ctx.sign_up(Credentials::new("ada@example.com", "engine42"))
        .await
        .unwrap();
    assert!(ctx.snapshot().is_authenticated());
    assert!(!admitted(&ctx), "sign-up alone issues no cookie");

    ctx.sign_out().await.unwrap();
    assert_eq!(ctx.session(), None);

    let outcome = ctx
        .sign_in(Credentials::new("ada@example.com", "engine42"))
        .await
        .unwrap();
    assert_eq!(outcome.cookie, CookieStatus::Issued);
    assert_eq!(outcome.redirect_to, "/dashboard");
    assert!(admitted(&ctx), "gate admits the freshly signed-in user");

    ctx.sign_out().await.unwrap();
    assert!(!admitted(&ctx), "cookie is cleared on sign-out");
    assert_eq!(
        server_side_props(&ctx.cookies().jar(), &GateConfig::default()),
        PageResponse::Redirect(RedirectTarget::temporary("/"))
    );
}

#[tokio::test]
async fn stale_cookie_still_admits_when_clearing_is_disabled() {
    let provider = Arc::new(MemoryProvider::resolved().with_account("ada@example.com", "engine42"));
    let ctx = SessionContext::new(
        provider,
        MemoryCookieStore::new(),
        SessionConfig::default().with_clear_cookie_on_sign_out(false),
    );

    ctx.sign_in(Credentials::new("ada@example.com", "engine42"))
        .await
        .unwrap();
    ctx.sign_out().await.unwrap();

    assert_eq!(ctx.session(), None);
    assert!(admitted(&ctx), "presence check passes until the cookie expires");
}

#[tokio::test]
async fn rejected_sign_in_leaves_gate_closed() {
    let provider = Arc::new(MemoryProvider::resolved().with_account("ada@example.com", "engine42"));
    let ctx = context(provider);

    let err = ctx
        .sign_in(Credentials::new("ada@example.com", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Provider(_)));
    assert!(err.to_string().contains("INVALID_LOGIN_CREDENTIALS"));
    assert!(!admitted(&ctx));
}

#[tokio::test]
async fn context_subscription_ends_with_context() {
    let provider = Arc::new(MemoryProvider::resolved());
    {
        let _ctx = context(Arc::clone(&provider));
        assert_eq!(provider.listener_count(), 1);
    }
    assert_eq!(provider.listener_count(), 0);
}
