//! Integration tests for resource classes.
//!
//! These tests drive resource classes through an in-memory scripted
//! transport and verify method selection, URL rendering, pagination,
//! in-place replacement, callbacks, and settlement.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{Counter, ScriptedTransport};
use drf_resource::clients::{Headers, HttpMethod};
use drf_resource::rest::{
    ActionDescriptor, Arg, ArgumentError, Live, PageFetchError, ParamDefault, ParamDefaults,
    Record, ResourceClass, ResourceError,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

const NEXT_PAGE: &str = "http://api.test/api/users/?page=2";

fn users(transport: &Arc<ScriptedTransport>) -> ResourceClass {
    ResourceClass::builder(transport.clone(), "/api/users/:id/")
        .param("id", "@id")
        .build()
        .unwrap()
}

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn user(id: u64) -> Value {
    json!({"id": id, "username": format!("user{id}")})
}

fn ids(live: &Live) -> Vec<u64> {
    live.as_collection()
        .unwrap()
        .items()
        .iter()
        .map(|item| item.get("id").and_then(|id| id.as_u64()).unwrap())
        .collect()
}

// ============================================================================
// Method selection and URL rendering
// ============================================================================

#[tokio::test]
async fn test_save_without_id_posts_to_collection_url() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/", json!({"id": 1, "username": "ada"}));

    let live = users(&transport)
        .call("save", vec![json!({"username": "ada"}).into()])
        .unwrap();
    assert_ok!(live.settled().await);

    let request = transport.last_request();
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, "/api/users/");
    assert_eq!(request.data, Some(json!({"username": "ada"})));
    assert!(request.params.is_none());
}

#[tokio::test]
async fn test_save_with_null_id_posts() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/", user(2));

    let live = users(&transport)
        .call("save", vec![json!({"id": null, "username": "bob"}).into()])
        .unwrap();
    assert_ok!(live.settled().await);

    let request = transport.last_request();
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, "/api/users/");
}

#[tokio::test]
async fn test_save_with_id_puts_to_detail_url() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/3/", user(3));

    let live = users(&transport)
        .call("save", vec![json!({"id": 3, "username": "carol"}).into()])
        .unwrap();
    assert_ok!(live.settled().await);

    let request = transport.last_request();
    assert_eq!(request.method, HttpMethod::Put);
    assert_eq!(request.url, "/api/users/3/");
    assert_eq!(request.data, Some(json!({"id": 3, "username": "carol"})));
}

#[tokio::test]
async fn test_save_returns_instance_seeded_from_payload() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/", json!({"id": 10, "username": "dan"}));

    let live = users(&transport)
        .call("save", vec![json!({"username": "dan"}).into()])
        .unwrap();
    let instance = live.as_instance().unwrap().clone();
    assert_eq!(instance.get("username"), Some(json!("dan")));
    assert_eq!(instance.get("id"), None);

    assert_ok!(live.settled().await);
    assert_eq!(instance.get("id"), Some(json!(10)));
}

#[tokio::test]
async fn test_unconsumed_params_become_query() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/5/", user(5));

    let live = users(&transport)
        .call("get", vec![json!({"id": 5, "expand": "groups"}).into()])
        .unwrap();
    assert_ok!(live.settled().await);

    let request = transport.last_request();
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(request.url, "/api/users/5/");
    let query = request.params.unwrap();
    assert_eq!(query.len(), 1);
    assert_eq!(query["expand"], json!("groups"));
    assert!(request.data.is_none());
}

#[tokio::test]
async fn test_get_sends_no_body_even_with_data_argument() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/5/", user(5));

    let live = users(&transport)
        .call("get", vec![json!({"id": 5}).into(), json!({"ignored": true}).into()])
        .unwrap();
    assert_ok!(live.settled().await);

    assert!(transport.last_request().data.is_none());
}

#[tokio::test]
async fn test_custom_action_with_url_and_params() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/groups/staff/users/", json!([user(1)]));

    let class = ResourceClass::builder(transport.clone(), "/api/users/:id/")
        .param("id", "@id")
        .action(
            "staff",
            ActionDescriptor::new(HttpMethod::Get)
                .url("/api/groups/:group/users/")
                .param("group", "staff")
                .header("X-Requested-With", "XMLHttpRequest")
                .array(),
        )
        .build()
        .unwrap();

    let live = class.call("staff", vec![]).unwrap();
    assert_ok!(live.settled().await);

    let request = transport.last_request();
    assert_eq!(request.url, "/api/groups/staff/users/");
    assert_eq!(
        request.headers.unwrap()["X-Requested-With"],
        "XMLHttpRequest"
    );
    assert_eq!(ids(&live), vec![1]);
}

#[tokio::test]
async fn test_bind_adds_defaults() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/", json!([]));

    let mut extra = ParamDefaults::new();
    extra.insert("format".into(), ParamDefault::from("json"));
    let scoped = users(&transport).bind(extra);

    let live = scoped.call("query", vec![]).unwrap();
    assert_ok!(live.settled().await);

    let query = transport.last_request().params.unwrap();
    assert_eq!(query["format"], json!("json"));
}

#[tokio::test]
async fn test_lazy_default_is_evaluated_per_call() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/", json!([]));
    transport.respond("/api/users/", json!([]));

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let class = ResourceClass::builder(transport.clone(), "/api/users/:id/")
        .param("nonce", ParamDefault::lazy(move || json!(counter.fetch_add(1, Ordering::SeqCst))))
        .build()
        .unwrap();

    assert_ok!(class.call("query", vec![]).unwrap().settled().await);
    assert_ok!(class.call("query", vec![]).unwrap().settled().await);

    let requests = transport.requests();
    assert_eq!(requests[0].params.as_ref().unwrap()["nonce"], json!(0));
    assert_eq!(requests[1].params.as_ref().unwrap()["nonce"], json!(1));
}

// ============================================================================
// Collections and pagination
// ============================================================================

#[tokio::test]
async fn test_plain_array_fills_collection() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/", json!([user(1), user(2), user(3)]));

    let successes = Counter::new();
    let hits = successes.clone();
    let live = users(&transport)
        .call("query", vec![Arg::success(move |_, _| hits.hit())])
        .unwrap();
    assert!(live.as_collection().unwrap().is_empty());

    assert_ok!(live.settled().await);

    let collection = live.as_collection().unwrap();
    assert_eq!(collection.len(), 3);
    assert_eq!(ids(&live), vec![1, 2, 3]);
    assert_eq!(collection.get(0).unwrap().get("username"), Some(json!("user1")));
    assert_eq!(successes.get(), 1);
}

#[tokio::test]
async fn test_two_pages_are_concatenated_and_reported_once() {
    let transport = ScriptedTransport::new();
    transport.respond(
        "/api/users/",
        json!({"count": 5, "next": NEXT_PAGE, "previous": null, "results": [user(1), user(2)]}),
    );
    transport.respond(
        NEXT_PAGE,
        json!({"count": 5, "next": null, "previous": "http://api.test/api/users/", "results": [user(3), user(4), user(5)]}),
    );

    let successes = Counter::new();
    let seen = Arc::new(Mutex::new(None));
    let (hits, observed, scripted) = (successes.clone(), seen.clone(), transport.clone());
    let live = users(&transport)
        .call(
            "query",
            vec![
                json!({"search": "user"}).into(),
                Arg::success(move |live, _| {
                    hits.hit();
                    *observed.lock() = Some((scripted.request_count(), live.as_collection().unwrap().len()));
                }),
            ],
        )
        .unwrap();

    assert_ok!(live.settled().await);

    assert_eq!(ids(&live), vec![1, 2, 3, 4, 5]);
    assert_eq!(successes.get(), 1);
    assert_eq!(*seen.lock(), Some((2, 5)));

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].params.as_ref().unwrap()["search"], json!("user"));
    assert_eq!(requests[1].url, NEXT_PAGE);
    assert!(requests[1].params.is_none());
    assert_eq!(requests[1].method, HttpMethod::Get);
}

#[tokio::test]
async fn test_pagination_limit_from_class_defaults() {
    let transport = ScriptedTransport::new();
    transport.respond(
        "/api/users/",
        json!({"count": 9, "next": NEXT_PAGE, "previous": null, "results": [user(1), user(2)]}),
    );

    let class = ResourceClass::builder(transport.clone(), "/api/users/:id/")
        .param("id", "@id")
        .param("paginationLimit", 2_i64)
        .build()
        .unwrap();

    let live = class.call("query", vec![]).unwrap();
    assert_ok!(live.settled().await);

    assert_eq!(transport.request_count(), 1);
    assert_eq!(ids(&live), vec![1, 2]);
    assert!(transport.last_request().params.is_none());
}

#[tokio::test]
async fn test_pagination_limit_from_action_params_is_overridden_by_call() {
    let transport = ScriptedTransport::new();
    transport.respond(
        "/api/users/",
        json!({"count": 4, "next": NEXT_PAGE, "previous": null, "results": [user(1), user(2)]}),
    );
    transport.respond(
        NEXT_PAGE,
        json!({"count": 4, "next": null, "previous": null, "results": [user(3), user(4)]}),
    );

    let class = ResourceClass::builder(transport.clone(), "/api/users/:id/")
        .action(
            "first_page",
            ActionDescriptor::new(HttpMethod::Get)
                .param("paginationLimit", 1_i64)
                .array(),
        )
        .build()
        .unwrap();

    let live = class
        .call("first_page", vec![json!({"paginationLimit": 10}).into()])
        .unwrap();
    assert_ok!(live.settled().await);

    assert_eq!(transport.request_count(), 2);
    assert_eq!(ids(&live), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_pagination_limit_reached_on_first_page_stops() {
    let transport = ScriptedTransport::new();
    transport.respond(
        "/api/users/",
        json!({"count": 9, "next": NEXT_PAGE, "previous": null, "results": [user(1), user(2), user(3)]}),
    );

    let live = users(&transport)
        .call("query", vec![json!({"paginationLimit": 3}).into()])
        .unwrap();
    assert_ok!(live.settled().await);

    assert_eq!(transport.request_count(), 1);
    assert_eq!(ids(&live), vec![1, 2, 3]);
    let sent = transport.last_request().params;
    assert!(sent.map_or(true, |p| !p.contains_key("paginationLimit")));
}

#[tokio::test]
async fn test_pagination_limit_loads_whole_pages() {
    let transport = ScriptedTransport::new();
    transport.respond(
        "/api/users/",
        json!({"count": 5, "next": NEXT_PAGE, "previous": null, "results": [user(1), user(2), user(3)]}),
    );
    transport.respond(
        NEXT_PAGE,
        json!({"count": 5, "next": "http://api.test/api/users/?page=3", "previous": null, "results": [user(4), user(5)]}),
    );

    let live = users(&transport)
        .call("query", vec![json!({"paginationLimit": "4"}).into()])
        .unwrap();
    assert_ok!(live.settled().await);

    assert_eq!(transport.request_count(), 2);
    assert_eq!(ids(&live), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_rejected_follow_up_page_keeps_collected_entries() {
    let transport = ScriptedTransport::new();
    transport.respond(
        "/api/users/",
        json!({"count": 4, "next": NEXT_PAGE, "previous": null, "results": [user(1), user(2)]}),
    );
    transport.fail(NEXT_PAGE, 500, json!({"detail": "Server error."}));

    let successes = Counter::new();
    let failures = Counter::new();
    let (ok_hits, err_hits) = (successes.clone(), failures.clone());
    let live = users(&transport)
        .call(
            "query",
            vec![
                Arg::success(move |_, _| ok_hits.hit()),
                Arg::error(move |_| err_hits.hit()),
            ],
        )
        .unwrap();

    let error = assert_err!(live.settled().await);
    match &error {
        ResourceError::PaginationFetch { url, source } => {
            assert_eq!(url, NEXT_PAGE);
            assert!(matches!(source, PageFetchError::Transport(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(error.status(), Some(500));

    assert_eq!(ids(&live), vec![1, 2]);
    assert_eq!(successes.get(), 0);
    assert_eq!(failures.get(), 1);
    assert!(live.is_resolved());
}

#[tokio::test]
async fn test_follow_up_page_that_is_not_an_envelope_fails() {
    let transport = ScriptedTransport::new();
    transport.respond(
        "/api/users/",
        json!({"count": 3, "next": NEXT_PAGE, "previous": null, "results": [user(1)]}),
    );
    transport.respond(NEXT_PAGE, json!([user(2), user(3)]));

    let live = users(&transport).call("query", vec![]).unwrap();
    let error = assert_err!(live.settled().await);

    assert!(matches!(
        error,
        ResourceError::PaginationFetch {
            source: PageFetchError::NotAnEnvelope(_),
            ..
        }
    ));
    assert_eq!(ids(&live), vec![1]);
}

#[tokio::test]
async fn test_non_object_items_become_empty_instances() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/", json!([user(1), 2, "three", null, user(4)]));

    let live = users(&transport).call("query", vec![]).unwrap();
    assert_ok!(live.settled().await);

    assert_eq!(live.as_collection().unwrap().len(), 5);
    assert_eq!(
        live.to_value(),
        json!([user(1), {}, {}, {}, user(4)])
    );
}

#[tokio::test]
async fn test_scalar_pages_count_toward_pagination_limit() {
    let transport = ScriptedTransport::new();
    transport.respond(
        "/api/users/",
        json!({"count": 6, "next": NEXT_PAGE, "previous": null, "results": [1, 2, 3]}),
    );

    let live = users(&transport)
        .call("query", vec![json!({"paginationLimit": 3}).into()])
        .unwrap();
    assert_ok!(live.settled().await);

    assert_eq!(live.as_collection().unwrap().len(), 3);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_object_response_to_array_action_leaves_empty_collection() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/", json!({"detail": "not a list"}));

    let live = users(&transport).call("query", vec![]).unwrap();
    assert_ok!(live.settled().await);

    assert!(live.as_collection().unwrap().is_empty());
}

#[tokio::test]
async fn test_each_class_call_allocates_a_fresh_collection() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/", json!([user(1)]));
    transport.respond("/api/users/", json!([user(2)]));

    let class = users(&transport);
    let first = class.call("query", vec![]).unwrap();
    assert_ok!(first.settled().await);
    let second = class.call("query", vec![]).unwrap();
    assert_ok!(second.settled().await);

    assert!(!first.ptr_eq(&second));
    assert_eq!(ids(&first), vec![1]);
    assert_eq!(ids(&second), vec![2]);
}

// ============================================================================
// Instances
// ============================================================================

#[tokio::test]
async fn test_instance_get_replaces_fields_in_place() {
    let transport = ScriptedTransport::new();
    transport.respond(
        "/api/users/7/",
        json!({"id": 7, "username": "new", "email": "new@example.com"}),
    );

    let class = users(&transport);
    let instance = class.instance(record(json!({"id": 7, "username": "old", "local": true})));

    let live = instance.call("get", vec![]).unwrap();
    assert!(live.as_instance().unwrap().ptr_eq(&instance));

    let response = assert_ok!(live.settled().await);
    assert!(response.resource.ptr_eq(&live));
    assert_eq!(transport.last_request().url, "/api/users/7/");
    assert_eq!(
        instance.to_value(),
        json!({"id": 7, "username": "new", "email": "new@example.com"})
    );
    assert_eq!(instance.get("local"), None);
}

#[tokio::test]
async fn test_instance_save_puts_itself() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/7/", json!({"id": 7, "username": "renamed"}));

    let instance = users(&transport).instance(record(user(7)));
    instance.set("username", "renamed");

    assert_ok!(instance.call("save", vec![]).unwrap().settled().await);

    let request = transport.last_request();
    assert_eq!(request.method, HttpMethod::Put);
    assert_eq!(request.url, "/api/users/7/");
    assert_eq!(request.data, Some(json!({"id": 7, "username": "renamed"})));
}

#[tokio::test]
async fn test_instance_remove_sends_no_body() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/7/", Value::Null);

    let instance = users(&transport).instance(record(user(7)));
    assert_ok!(instance.call("remove", vec![]).unwrap().settled().await);

    let request = transport.last_request();
    assert_eq!(request.method, HttpMethod::Delete);
    assert_eq!(request.url, "/api/users/7/");
    assert!(request.data.is_none());
    assert_eq!(instance.get("username"), Some(json!("user7")));
}

#[tokio::test]
async fn test_instance_call_with_explicit_params() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/8/", user(8));

    let instance = users(&transport).instance(record(user(7)));
    let live = instance
        .call("get", vec![json!({"id": 8}).into()])
        .unwrap();
    assert_ok!(live.settled().await);

    assert_eq!(transport.last_request().url, "/api/users/8/");
    assert_eq!(instance.get("username"), Some(json!("user8")));
}

#[tokio::test]
async fn test_instance_custom_action() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/7/activate/", json!({"is_active": true}));

    let class = ResourceClass::builder(transport.clone(), "/api/users/:id/")
        .param("id", "@id")
        .action(
            "activate",
            ActionDescriptor::new(HttpMethod::Post).url("/api/users/:id/activate/"),
        )
        .build()
        .unwrap();
    let instance = class.instance(record(user(7)));

    assert_ok!(instance.call("activate", vec![]).unwrap().settled().await);

    let request = transport.last_request();
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, "/api/users/7/activate/");
    assert_eq!(instance.get("is_active"), Some(json!(true)));
}

#[tokio::test]
async fn test_instance_call_on_array_action_returns_collection() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/7/", json!([user(1)]));

    let instance = users(&transport).instance(record(user(7)));
    let live = instance.call("query", vec![]).unwrap();
    assert_ok!(live.settled().await);

    assert_eq!(ids(&live), vec![1]);
    assert_eq!(instance.get("id"), Some(json!(7)));
}

#[tokio::test]
async fn test_non_object_response_leaves_instance_unchanged() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/7/", json!(["unexpected"]));

    let successes = Counter::new();
    let hits = successes.clone();
    let instance = users(&transport).instance(record(user(7)));
    let live = instance
        .call("get", vec![Arg::success(move |_, _| hits.hit())])
        .unwrap();
    assert_ok!(live.settled().await);

    assert_eq!(instance.to_value(), user(7));
    assert_eq!(successes.get(), 1);
}

// ============================================================================
// Callbacks and settlement
// ============================================================================

#[tokio::test]
async fn test_reference_is_pending_until_settled() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/1/", user(1));

    let live = users(&transport)
        .call("get", vec![json!({"id": 1}).into()])
        .unwrap();
    assert!(!live.is_resolved());

    assert_ok!(live.settled().await);
    assert!(live.is_resolved());
}

#[tokio::test]
async fn test_success_callback_receives_the_returned_reference() {
    let transport = ScriptedTransport::new();
    let mut headers = Headers::new();
    headers.insert("x-request-id".to_string(), vec!["abc".to_string()]);
    transport.respond_with("/api/users/1/", 200, headers, user(1));

    let seen: Arc<Mutex<Option<(Live, bool, Option<String>)>>> = Arc::new(Mutex::new(None));
    let observed = seen.clone();
    let live = users(&transport)
        .call(
            "get",
            vec![
                json!({"id": 1}).into(),
                Arg::success(move |live, headers| {
                    let request_id = headers.get("x-request-id").and_then(|v| v.first()).cloned();
                    *observed.lock() = Some((live.clone(), live.is_resolved(), request_id));
                }),
            ],
        )
        .unwrap();

    let response = assert_ok!(live.settled().await);
    assert_eq!(response.status, 200);
    assert_eq!(response.data, user(1));

    let (reference, resolved, request_id) = seen.lock().take().unwrap();
    assert!(reference.ptr_eq(&live));
    assert!(resolved);
    assert_eq!(request_id.as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_transport_failure_reaches_error_callback_and_settlement() {
    let transport = ScriptedTransport::new();
    transport.fail("/api/users/9/", 404, json!({"detail": "Not found."}));

    let failures = Arc::new(Mutex::new(Vec::new()));
    let recorded = failures.clone();
    let live = users(&transport)
        .call(
            "get",
            vec![
                json!({"id": 9}).into(),
                Arg::success(|_, _| panic!("must not succeed")),
                Arg::error(move |e| recorded.lock().push(e.status())),
            ],
        )
        .unwrap();

    let error = assert_err!(live.settled().await);
    assert!(matches!(error, ResourceError::Transport(_)));
    assert_eq!(error.status(), Some(404));
    assert_eq!(*failures.lock(), vec![Some(404)]);
    assert!(live.is_resolved());
}

#[tokio::test]
async fn test_failure_without_error_callback_still_settles() {
    let transport = ScriptedTransport::new();

    let live = users(&transport).call("query", vec![]).unwrap();
    let error = assert_err!(live.settled().await);

    assert!(matches!(error, ResourceError::Transport(_)));
    assert!(live.is_resolved());
}

#[tokio::test]
async fn test_null_response_keeps_reference_and_succeeds() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/", Value::Null);

    let successes = Counter::new();
    let hits = successes.clone();
    let live = users(&transport)
        .call(
            "save",
            vec![json!({"username": "eve"}).into(), Arg::success(move |_, _| hits.hit())],
        )
        .unwrap();
    assert_ok!(live.settled().await);

    assert_eq!(live.to_value(), json!({"username": "eve"}));
    assert_eq!(successes.get(), 1);
}

#[tokio::test]
async fn test_call_started_from_success_callback_owns_the_settlement() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/7/", json!({"id": 7, "username": "a"}));
    transport.respond_with(
        "/api/users/7/",
        201,
        Headers::new(),
        json!({"id": 7, "username": "a", "abc": true}),
    );

    let instance = users(&transport).instance(record(json!({"id": 7})));
    let follow_up: Arc<Mutex<Option<Live>>> = Arc::new(Mutex::new(None));
    let started = follow_up.clone();
    let live = instance
        .call(
            "get",
            vec![Arg::success(move |live, _| {
                let user = live.as_instance().unwrap();
                user.set("abc", true);
                *started.lock() = Some(user.call("save", vec![]).unwrap());
            })],
        )
        .unwrap();

    let response = assert_ok!(live.settled().await);
    assert_eq!(response.status, 201);
    assert!(live.is_resolved());
    assert_eq!(transport.request_count(), 2);

    let save = transport.last_request();
    assert_eq!(save.method, HttpMethod::Put);
    assert_eq!(save.data, Some(json!({"id": 7, "username": "a", "abc": true})));

    let save_live = follow_up.lock().take().unwrap();
    assert!(save_live.ptr_eq(&live));
    assert_eq!(assert_ok!(save_live.settled().await).status, 201);
    let raw = assert_ok!(instance.transport_response().await);
    assert_eq!(raw.status, 201);
}

#[tokio::test]
async fn test_raw_transport_response_is_exposed() {
    let transport = ScriptedTransport::new();
    transport.respond_with("/api/users/", 201, Headers::new(), user(4));

    let live = users(&transport)
        .call("save", vec![json!({"username": "user4"}).into()])
        .unwrap();
    let instance = live.into_instance().unwrap();

    let raw = assert_ok!(instance.transport_response().await);
    assert_eq!(raw.status, 201);
    assert_eq!(raw.data, user(4));
}

#[tokio::test]
async fn test_settled_can_be_awaited_repeatedly() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/", json!([user(1)]));

    let live = users(&transport).call("query", vec![]).unwrap();
    let first = assert_ok!(live.settled().await);
    let second = assert_ok!(live.settled().await);
    assert!(first.resource.ptr_eq(&second.resource));
}

#[tokio::test]
async fn test_sequential_calls_on_one_instance() {
    let transport = ScriptedTransport::new();
    transport.respond("/api/users/7/", json!({"id": 7, "step": 1}));
    transport.respond("/api/users/7/", json!({"id": 7, "step": 2}));

    let instance = users(&transport).instance(record(user(7)));
    let first = instance.call("get", vec![]).unwrap();
    let second = instance.call("get", vec![]).unwrap();
    assert!(first.ptr_eq(&second));

    assert_ok!(second.settled().await);
    assert_eq!(transport.request_count(), 2);
    assert_eq!(instance.get("step"), Some(json!(2)));
    assert!(instance.is_resolved());
}

// ============================================================================
// Synchronous failures
// ============================================================================

#[tokio::test]
async fn test_too_many_arguments() {
    let transport = ScriptedTransport::new();
    let args = vec![Arg::from(json!({})); 5];

    let result = users(&transport).call("query", args);
    assert!(matches!(
        result,
        Err(ResourceError::Argument(ArgumentError::Arity { max: 4, got: 5 }))
    ));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_instance_too_many_arguments() {
    let transport = ScriptedTransport::new();
    let instance = users(&transport).instance(record(user(1)));

    let result = instance.call("get", vec![Arg::from(json!({})); 4]);
    assert!(matches!(
        result,
        Err(ResourceError::Argument(ArgumentError::Arity { max: 3, got: 4 }))
    ));
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let transport = ScriptedTransport::new();
    let result = users(&transport).call("archive", vec![]);
    assert!(matches!(result, Err(ResourceError::UnknownAction { .. })));
}
