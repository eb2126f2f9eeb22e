//! End-to-end lifecycle tests against a scripted transport.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{Reply, ScriptedTransport, provider};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use usefetch::{
    AuthToken, FetchContext, FetchProvider, Hook, Phase, RequestController, RequestDescriptor,
    RequestOptions, RequestState, Transport, Verb, use_fetch,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    id: u32,
}

fn counter() -> (Arc<AtomicUsize>, impl Fn(&RequestState<Value>) + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let hook_count = Arc::clone(&count);
    (count, move |_: &RequestState<Value>| {
        hook_count.fetch_add(1, Ordering::SeqCst);
    })
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_get_without_token() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Reply::Ok(
        json!({"id": 1}),
    )]));
    let provider = provider(&transport, None);

    let controller = RequestController::<User>::new(&provider.context(), "/users/1").unwrap();
    controller.dispatch(None).await;

    let request = transport.last();
    assert_eq!(request.url, "https://api.example.com/users/1");
    assert!(request.headers.get("authorization").is_none());

    let state = controller.state();
    assert_eq!(state.data, Some(User { id: 1 }));
    assert!(state.status.is_fulfilled());
    assert!(!state.status.is_pending());
    assert!(!state.status.is_rejected());
    assert_eq!(state.status.err(), "");
}

#[tokio::test]
async fn test_post_with_token_sends_payload() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, Some(AuthToken::new("tok")));

    let controller = RequestController::<Value>::new(
        &provider.context(),
        RequestDescriptor::new("/users").method(Verb::Post),
    )
    .unwrap();
    controller.dispatch(Some(json!({"name": "Ada"}))).await;

    let request = transport.last();
    assert_eq!(request.verb, Verb::Post);
    assert_eq!(request.headers["authorization"], "tok");
    assert_eq!(request.headers["access-control-allow-origin"], "*");
    assert_eq!(request.body, Some(json!({"name": "Ada"})));
    assert!(controller.state().status.is_fulfilled());
}

#[tokio::test]
async fn test_should_dispatch_false_with_empty_dependencies() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, None);

    let controller = use_fetch::<Value>(
        &provider.context(),
        RequestDescriptor::new("/users")
            .should_dispatch(false)
            .dependencies(vec![])
            .mock_data(json!([{"id": 0}])),
    )
    .await
    .unwrap();

    assert_eq!(transport.calls(), 0);
    let state = controller.state();
    assert_eq!(state.phase(), Phase::Idle);
    assert!(state.status.is_mocked());
    assert_eq!(state.data, Some(json!([{"id": 0}])));
}

// ============================================================================
// Cache
// ============================================================================

#[tokio::test]
async fn test_uncached_descriptor_never_writes_cache() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, None);
    let ctx = provider.context();

    let controller = RequestController::<Value>::new(&ctx, "/users").unwrap();
    controller.dispatch(None).await;
    controller.dispatch(None).await;
    controller.update(|_| json!("local")).await;

    assert_eq!(transport.calls(), 2);
    assert_eq!(ctx.cache_len().await, 0);
}

#[tokio::test]
async fn test_cache_hit_skips_transport() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Reply::Ok(json!([1, 2]))]));
    let provider = provider(&transport, None);
    let (after_calls, after) = counter();

    let controller = RequestController::<Value>::new(
        &provider.context(),
        RequestDescriptor::new("/users").cache(true).after(after),
    )
    .unwrap();

    controller.dispatch(None).await;
    assert!(!controller.state().status.is_cached());

    controller.dispatch(None).await;
    let state = controller.state();
    assert_eq!(transport.calls(), 1);
    assert!(state.status.is_cached());
    assert!(state.status.is_fulfilled());
    assert!(!state.status.is_mocked());
    assert_eq!(state.data, Some(json!([1, 2])));
    assert_eq!(after_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_is_shared_between_call_sites() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, None);
    let ctx = provider.context();
    let descriptor = RequestDescriptor::<Value>::new("/users").cache(true);

    let first = RequestController::<Value>::new(&ctx, descriptor.clone()).unwrap();
    first.dispatch(None).await;

    let second = RequestController::<Value>::new(&ctx, descriptor).unwrap();
    second.dispatch(None).await;

    assert_eq!(transport.calls(), 1);
    assert!(second.state().status.is_cached());
    assert_eq!(second.state().data, Some(json!({"n": 1})));
}

#[tokio::test]
async fn test_invalidation_forces_network() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, None);
    let ctx = provider.context();

    let controller =
        RequestController::<Value>::new(&ctx, RequestDescriptor::new("/users").cache(true))
            .unwrap();
    controller.dispatch(None).await;
    assert!(ctx.invalidate("/users").await.unwrap());

    controller.dispatch(None).await;
    assert_eq!(transport.calls(), 2);
    assert!(!controller.state().status.is_cached());
    assert_eq!(controller.state().data, Some(json!({"n": 2})));
}

#[tokio::test]
async fn test_post_is_never_cached() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, None);
    let ctx = provider.context();

    let controller = RequestController::<Value>::new(
        &ctx,
        RequestDescriptor::new("/users").method(Verb::Post).cache(true),
    )
    .unwrap();
    controller.dispatch(None).await;
    controller.dispatch(None).await;

    assert_eq!(transport.calls(), 2);
    assert_eq!(ctx.cache_len().await, 0);
}

#[tokio::test]
async fn test_expired_entry_goes_back_to_network() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = FetchProvider::builder("https://api.example.com")
        .transport(Arc::clone(&transport) as Arc<dyn Transport>)
        .cache_ttl(Duration::from_millis(1))
        .mount()
        .unwrap();

    let controller = RequestController::<Value>::new(
        &provider.context(),
        RequestDescriptor::new("/users").cache(true),
    )
    .unwrap();
    controller.dispatch(None).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    controller.dispatch(None).await;

    let state = controller.state();
    assert_eq!(transport.calls(), 2);
    assert!(!state.status.is_cached());
    assert_eq!(state.data, Some(json!({"n": 2})));
}

#[tokio::test]
async fn test_fresh_entry_within_ttl_is_served() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = FetchProvider::builder("https://api.example.com")
        .transport(Arc::clone(&transport) as Arc<dyn Transport>)
        .cache_ttl(Duration::from_secs(60))
        .mount()
        .unwrap();

    let controller = RequestController::<Value>::new(
        &provider.context(),
        RequestDescriptor::new("/users").cache(true),
    )
    .unwrap();
    controller.dispatch(None).await;
    controller.dispatch(None).await;

    assert_eq!(transport.calls(), 1);
    assert!(controller.state().status.is_cached());
}

#[tokio::test]
async fn test_optimistic_update_round_trip() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Reply::Ok(json!([1]))]));
    let provider = provider(&transport, None);
    let ctx = provider.context();

    let controller = RequestController::<Vec<u32>>::new(
        &ctx,
        RequestDescriptor::new("/ids").cache(true),
    )
    .unwrap();
    controller.dispatch(None).await;

    controller
        .update(|ids| {
            let mut ids = ids.clone();
            ids.push(2);
            ids
        })
        .await;

    let state = controller.state();
    assert_eq!(state.data, Some(vec![1, 2]));
    assert!(state.status.is_fulfilled());
    assert_eq!(transport.calls(), 1);

    let entry = ctx.cached("/ids").await.unwrap();
    assert_eq!(entry, RequestState::cached(json!([1, 2])));
    assert!(entry.status.is_cached());
    assert!(entry.status.is_fulfilled());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_rejection_keeps_data() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![
        Reply::Ok(json!({"id": 1})),
        Reply::Fail(500, json!({"message": "Database unavailable"})),
    ]));
    let provider = provider(&transport, None);
    let (after_calls, after) = counter();

    let controller = RequestController::<Value>::new(
        &provider.context(),
        RequestDescriptor::new("/users/1").after(after),
    )
    .unwrap();
    controller.dispatch(None).await;
    controller.dispatch(None).await;

    let state = controller.state();
    assert_eq!(state.data, Some(json!({"id": 1})));
    assert!(state.status.is_rejected());
    assert!(!state.status.is_fulfilled());
    assert!(!state.status.is_pending());
    assert_eq!(state.status.err(), "Database unavailable");
    assert_eq!(after_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_rejection_without_body_message() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Reply::Fail(
        404,
        Value::Null,
    )]));
    let provider = provider(&transport, None);

    let controller = RequestController::<Value>::new(&provider.context(), "/missing").unwrap();
    controller.dispatch(None).await;

    let state = controller.state();
    assert!(state.status.is_rejected());
    assert_eq!(state.status.err(), "Request failed with status code 404");
    assert!(state.data.is_none());
}

#[tokio::test]
async fn test_pending_is_never_fulfilled() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Reply::Ok(json!(1))]));
    let provider = provider(&transport, None);

    let controller = RequestController::<Value>::new(&provider.context(), "/x").unwrap();
    transport.observe(controller.subscribe());
    controller.dispatch(None).await;

    let observed = transport.observed();
    assert_eq!(observed.len(), 1);
    assert!(observed[0].status.is_pending());
    assert!(!observed[0].status.is_fulfilled());

    let settled = controller.state();
    assert!(settled.status.is_fulfilled());
    assert!(!settled.status.is_pending());
}

#[tokio::test]
async fn test_pending_keeps_previous_data() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, None);

    let controller = RequestController::<Value>::new(&provider.context(), "/x").unwrap();
    controller.dispatch(None).await;

    transport.observe(controller.subscribe());
    controller.dispatch(None).await;

    let observed = transport.observed();
    assert!(observed[0].status.is_pending());
    assert_eq!(observed[0].data, Some(json!({"n": 1})));
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_rapid_double_dispatch_keeps_second() {
    let transport = Arc::new(ScriptedTransport::stalling_first());
    let provider = provider(&transport, None);
    let (after_calls, after) = counter();

    let controller = RequestController::<Value>::new(
        &provider.context(),
        RequestDescriptor::new("/search").cancelable(true).after(after),
    )
    .unwrap();

    let first = controller.dispatch(None);
    let second = async {
        transport.started.notified().await;
        controller.dispatch(None).await;
    };
    futures::join!(first, second);

    let state = controller.state();
    assert_eq!(transport.calls(), 2);
    assert!(state.status.is_fulfilled());
    assert_eq!(state.data, Some(json!({"n": 2})));
    assert_eq!(after_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cache_hit_cancels_in_flight_request() {
    let transport = Arc::new(ScriptedTransport::stalling_first());
    let provider = provider(&transport, None);
    let ctx = provider.context();
    let (after_calls, after) = counter();

    let cancelable = RequestController::<Value>::new(
        &ctx,
        RequestDescriptor::new("/feed").cancelable(true).cache(true).after(after),
    )
    .unwrap();
    let neighbour =
        RequestController::<Value>::new(&ctx, RequestDescriptor::new("/feed").cache(true))
            .unwrap();

    let stalled = cancelable.dispatch(None);
    let cache_hit = async {
        transport.started.notified().await;
        neighbour.dispatch(None).await;
        cancelable.dispatch(None).await;
    };
    let joined = tokio::time::timeout(Duration::from_secs(5), async {
        futures::join!(stalled, cache_hit);
    })
    .await;
    assert!(joined.is_ok(), "stalled request was not cancelled by the cache hit");

    let state = cancelable.state();
    assert_eq!(transport.calls(), 2);
    assert!(state.status.is_cached());
    assert!(state.status.is_fulfilled());
    assert_eq!(state.data, Some(json!({"n": 2})));
    assert_eq!(after_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unmount_cancels_in_flight_request() {
    let transport = Arc::new(ScriptedTransport::stalling_first());
    let provider = provider(&transport, None);
    let (after_calls, after) = counter();

    let controller = RequestController::<Value>::new(
        &provider.context(),
        RequestDescriptor::new("/slow").cancelable(true).after(after),
    )
    .unwrap();

    let dispatch = controller.dispatch(None);
    let teardown = async {
        transport.started.notified().await;
        controller.unmount();
    };
    futures::join!(dispatch, teardown);

    let state = controller.state();
    assert!(state.status.is_pending());
    assert!(!state.status.is_rejected());
    assert!(state.data.is_none());
    assert_eq!(after_calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Triggers
// ============================================================================

#[tokio::test]
async fn test_dependencies_drive_dispatch() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, None);

    let controller = RequestController::<Value>::new(
        &provider.context(),
        RequestDescriptor::new("/items").dependencies(vec![json!(1)]),
    )
    .unwrap();

    assert!(controller.mount().await);
    assert_eq!(transport.calls(), 1);

    assert!(!controller.set_dependencies(vec![json!(1)]).await);
    assert_eq!(transport.calls(), 1);

    assert!(controller.set_dependencies(vec![json!(2)]).await);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_no_condition_no_dependencies_waits() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, None);

    let controller = use_fetch::<Value>(&provider.context(), "/items").await.unwrap();

    assert_eq!(transport.calls(), 0);
    assert_eq!(controller.state().phase(), Phase::Idle);
}

#[tokio::test]
async fn test_condition_without_dependencies_dispatches_on_mount() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, None);

    let controller = use_fetch::<Value>(
        &provider.context(),
        RequestDescriptor::new("/items").should_dispatch(true),
    )
    .await
    .unwrap();

    assert_eq!(transport.calls(), 1);
    assert!(controller.state().status.is_fulfilled());
}

// ============================================================================
// Provider, Token and Hooks
// ============================================================================

#[test]
fn test_missing_provider_is_a_configuration_error() {
    let err = RequestController::<Value>::new(&FetchContext::detached(), "/x").unwrap_err();
    assert!(err.is_not_mounted());
}

#[tokio::test]
async fn test_unmounted_provider_is_a_configuration_error() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, None);
    let ctx = provider.context();
    provider.unmount().await;

    let err = RequestController::<Value>::new(&ctx, "/x").unwrap_err();
    assert!(err.is_not_mounted());
}

#[tokio::test]
async fn test_dynamic_token_resolves_per_dispatch() {
    let transport = Arc::new(ScriptedTransport::new());
    let rotations = Arc::new(AtomicUsize::new(0));
    let source = Arc::clone(&rotations);
    let token = AuthToken::from_fn(move || {
        format!("t{}", source.fetch_add(1, Ordering::SeqCst) + 1)
    });
    let provider = provider(&transport, Some(token));

    let controller = RequestController::<Value>::new(&provider.context(), "/me").unwrap();
    controller.dispatch(None).await;
    assert_eq!(transport.last().headers["authorization"], "t1");
    controller.dispatch(None).await;
    assert_eq!(transport.last().headers["authorization"], "t2");
}

#[tokio::test]
async fn test_empty_token_still_sends_request() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, Some(AuthToken::from_fn(String::new)));

    let controller = RequestController::<Value>::new(&provider.context(), "/me").unwrap();
    controller.dispatch(None).await;

    assert_eq!(transport.calls(), 1);
    assert!(transport.last().headers.get("authorization").is_none());
    assert!(controller.state().status.is_fulfilled());
}

#[tokio::test]
async fn test_descriptor_options_reach_the_request() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, Some(AuthToken::new("tok")));
    let options = RequestOptions::from_json(
        &json!({
            "headers": {"Authorization": "Bearer override", "X-Trace": "abc"},
            "params": {"page": 2},
            "timeout": 1500
        }),
        3,
    )
    .unwrap();

    let controller = RequestController::<Value>::new(
        &provider.context(),
        RequestDescriptor::new("/items").options(options),
    )
    .unwrap();
    controller.dispatch(None).await;

    let request = transport.last();
    assert_eq!(request.headers["authorization"], "Bearer override");
    assert_eq!(request.headers["access-control-allow-origin"], "*");
    assert_eq!(request.headers["x-trace"], "abc");
    assert_eq!(request.query, vec![("page".to_string(), "2".to_string())]);
    assert_eq!(request.timeout, Some(Duration::from_millis(1500)));
}

#[tokio::test]
async fn test_auth_token_opt_out() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, Some(AuthToken::new("tok")));

    let controller = RequestController::<Value>::new(
        &provider.context(),
        RequestDescriptor::new("/public").use_auth_token(false),
    )
    .unwrap();
    controller.dispatch(None).await;

    assert!(transport.last().headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_before_hook_runs_and_disabled_hook_is_skipped() {
    let transport = Arc::new(ScriptedTransport::new());
    let provider = provider(&transport, None);
    let ran = Arc::new(AtomicUsize::new(0));
    let hook_ran = Arc::clone(&ran);

    let controller = RequestController::<Value>::new(
        &provider.context(),
        RequestDescriptor::new("/x").before_service_call(Hook::new(move || {
            hook_ran.fetch_add(1, Ordering::SeqCst);
        })),
    )
    .unwrap();
    controller.dispatch(None).await;
    assert_eq!(ran.load(Ordering::SeqCst), 1);

    let disabled = RequestController::<Value>::new(
        &provider.context(),
        RequestDescriptor::new("/x").before_service_call(Hook::Disabled),
    )
    .unwrap();
    disabled.dispatch(None).await;
    assert!(disabled.state().status.is_fulfilled());
}

#[tokio::test]
async fn test_mock_flag_clears_on_real_response() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![
        Reply::Fail(503, json!({"message": "offline"})),
        Reply::Ok(json!("real")),
    ]));
    let provider = provider(&transport, None);

    let controller = RequestController::<Value>::new(
        &provider.context(),
        RequestDescriptor::new("/x").mock_data(json!("placeholder")),
    )
    .unwrap();
    assert!(controller.state().status.is_mocked());

    controller.dispatch(None).await;
    let state = controller.state();
    assert!(state.status.is_rejected());
    assert!(state.status.is_mocked());
    assert_eq!(state.data, Some(json!("placeholder")));

    controller.dispatch(None).await;
    let state = controller.state();
    assert!(!state.status.is_mocked());
    assert_eq!(state.data, Some(json!("real")));
}
