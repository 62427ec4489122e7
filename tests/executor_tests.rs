mod common;

use common::{client_with, RecordingStore, RecordingTransport};
use resourceful::error::Error;
use resourceful::{
    CacheOption, Method, Recovery, RecoveryHook, RequestHook, RequestOptions, Response,
    ResponseHook, ResponseStore,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const URL: &str = "http://example.com/posts/";

#[tokio::test]
async fn test_request_with_response_type() {
    let transport = RecordingTransport::ok(json!({}));
    let client = client_with(&transport);

    client
        .get(URL, None, &RequestOptions::new().response_type("text"))
        .await
        .unwrap();
    assert_eq!(transport.last().accept, "text/plain");

    client.get(URL, None, &RequestOptions::new()).await.unwrap();
    assert_eq!(transport.last().accept, "application/json");
}

#[tokio::test]
async fn test_request_with_headers() {
    let transport = RecordingTransport::ok(json!({}));
    let client = client_with(&transport);

    let options = RequestOptions::new()
        .header("X-Custom", "1")
        .header("X-Other", "2");
    client.get(URL, None, &options).await.unwrap();

    let sent = transport.last();
    assert_eq!(sent.headers.get("X-Custom").map(String::as_str), Some("1"));
    assert_eq!(sent.headers.get("X-Other").map(String::as_str), Some("2"));
}

#[tokio::test]
async fn test_request_with_and_without_timeout() {
    let transport = RecordingTransport::ok(json!({}));
    let client = client_with(&transport);

    client
        .get(URL, None, &RequestOptions::new().timeout(Duration::from_millis(100)))
        .await
        .unwrap();
    assert_eq!(transport.last().timeout, Some(Duration::from_millis(100)));

    client.get(URL, None, &RequestOptions::new()).await.unwrap();
    assert_eq!(transport.last().timeout, None);
}

#[tokio::test]
async fn test_request_with_credentials() {
    let transport = RecordingTransport::ok(json!({}));
    let client = client_with(&transport);

    client
        .get(URL, None, &RequestOptions::new().with_credentials(true))
        .await
        .unwrap();
    assert!(transport.last().with_credentials);

    client.get(URL, None, &RequestOptions::new()).await.unwrap();
    assert!(!transport.last().with_credentials);
}

#[tokio::test]
async fn test_post_request_that_is_successful() {
    let body = json!({"test": "something", "test2": "something else"});
    let transport = RecordingTransport::ok(body.clone());
    let client = client_with(&transport);

    let response = client.post(URL, None, &RequestOptions::new()).await.unwrap();

    assert_eq!(transport.count(), 1);
    assert_eq!(transport.last().method, Method::Post);
    assert_eq!(response.status, 200);
    assert_eq!(response.body, body);
}

#[tokio::test]
async fn test_post_request_with_error() {
    let transport = RecordingTransport::failing(500, json!({"message": "Some error"}));
    let client = client_with(&transport);

    let err = client
        .post(URL, Some(json!({"foo": "bar"})), &RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(transport.count(), 1);
    assert!(matches!(
        err,
        Error::HttpStatus { status: 500, ref body } if *body == json!({"message": "Some error"})
    ));
}

#[tokio::test]
async fn test_get_with_data_moved_to_query_by_transform() {
    let transport = RecordingTransport::ok(json!({}));
    let client = client_with(&transport);
    let data = json!({"data": "something"});

    let options = RequestOptions::new().transform_request(RequestHook::new(|req, data| {
        req.set_query(&data)?;
        Ok(Value::Null)
    }));
    client.get(URL, Some(data.clone()), &options).await.unwrap();

    let sent = transport.last();
    assert_eq!(sent.query.map(Value::Object), Some(data));
    assert_eq!(sent.body, None);
}

#[tokio::test]
async fn test_post_with_request_transform() {
    let transport = RecordingTransport::ok(json!({}));
    let client = client_with(&transport);

    let options = RequestOptions::new().transform_request(RequestHook::new(|req, mut data| {
        assert_eq!(req.method, Method::Post);
        data["data"] = json!("something");
        Ok(data)
    }));
    client
        .post(URL, Some(json!({"data": 1})), &options)
        .await
        .unwrap();

    assert_eq!(transport.last().body, Some(json!({"data": "something"})));
}

#[tokio::test]
async fn test_string_body_skips_request_transforms() {
    let transport = RecordingTransport::ok(json!({}));
    let client = client_with(&transport);
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);

    let options = RequestOptions::new().transform_request(RequestHook::new(move |_, data| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(data)
    }));
    client
        .post(URL, Some(json!("raw=body")), &options)
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(transport.last().body, Some(json!("raw=body")));
}

#[tokio::test]
async fn test_post_with_request_error_transform() {
    let transport = RecordingTransport::ok(json!({}));
    let client = client_with(&transport);
    let caught = Arc::new(AtomicUsize::new(0));
    let caught_clone = Arc::clone(&caught);

    let options = RequestOptions::new()
        .transform_request(RequestHook::new(|_, data| {
            Err(Error::hook(format!("rejected {data}")))
        }))
        .catch_request_error(RecoveryHook::sync(move |err| {
            caught_clone.fetch_add(1, Ordering::SeqCst);
            Err(err)
        }));
    let err = client
        .post(URL, Some(json!({"data": "something"})), &options)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), r#"rejected {"data":"something"}"#);
    assert_eq!(caught.load(Ordering::SeqCst), 1);
    // Nothing reaches the network when the request cannot be built
    assert_eq!(transport.count(), 0);
}

#[tokio::test]
async fn test_request_error_recovered_into_value() {
    let transport = RecordingTransport::ok(json!({}));
    let client = client_with(&transport);

    let options = RequestOptions::new()
        .transform_request(RequestHook::new(|_, _| Err(Error::hook("bad body"))))
        .catch_request_error(RecoveryHook::sync(|_| {
            Ok(Recovery::Resolve(json!({"fallback": true})))
        }));
    let response = client
        .post(URL, Some(json!({})), &options)
        .await
        .unwrap();

    assert!(response.is_recovered());
    assert_eq!(response.body, json!({"fallback": true}));
    assert_eq!(transport.count(), 0);
}

#[tokio::test]
async fn test_post_with_response_transform() {
    let transport = RecordingTransport::ok(json!({"myData": 1}));
    let client = client_with(&transport);

    let options = RequestOptions::new().transform_response(ResponseHook::new(|response, body| {
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"myData": 1}));
        assert_eq!(body, json!({"myData": 1}));
        Ok(json!({"data": "something"}))
    }));
    let response = client.post(URL, Some(json!({})), &options).await.unwrap();

    assert_eq!(response.body, json!({"data": "something"}));
}

#[tokio::test]
async fn test_response_transforms_chain_in_order() {
    let transport = RecordingTransport::ok(json!({"data": {"items": [1, 2]}}));
    let client = client_with(&transport);

    let options = RequestOptions::new()
        .transform_response(ResponseHook::new(|_, body| Ok(body["data"].clone())))
        .transform_response(ResponseHook::new(|_, body| Ok(body["items"].clone())));
    let response = client.get(URL, None, &options).await.unwrap();

    assert_eq!(response.body, json!([1, 2]));
}

#[tokio::test]
async fn test_post_with_response_transform_error() {
    let transport = RecordingTransport::ok(json!({"myData": 1}));
    let client = client_with(&transport);
    let recovered = Arc::new(AtomicUsize::new(0));
    let recovered_clone = Arc::clone(&recovered);

    let options = RequestOptions::new()
        .transform_response(ResponseHook::new(|_, _| Err(Error::hook("bad response"))))
        .catch_response_error(RecoveryHook::sync(move |err| {
            recovered_clone.fetch_add(1, Ordering::SeqCst);
            Err(err)
        }));
    let err = client
        .post(URL, Some(json!({})), &options)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Hook(ref msg) if msg == "bad response"));
    // Response transform failures are final
    assert_eq!(recovered.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_post_with_response_error_transform() {
    let transport = RecordingTransport::failing(502, json!({"err": "foo"}));
    let client = client_with(&transport);
    let second = Arc::new(AtomicUsize::new(0));
    let second_clone = Arc::clone(&second);

    let options = RequestOptions::new()
        .catch_response_error(RecoveryHook::sync(|err| {
            assert_eq!(err.status(), Some(502));
            Ok(Recovery::Reject(Error::hook("bar")))
        }))
        .catch_response_error(RecoveryHook::sync(move |err| {
            second_clone.fetch_add(1, Ordering::SeqCst);
            Err(err)
        }));
    let err = client
        .post(URL, Some(json!({})), &options)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Hook(ref msg) if msg == "bar"));
    assert_eq!(second.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_async_response_error_handler_resolves() {
    let transport = RecordingTransport::failing(404, Value::Null);
    let client = client_with(&transport);

    let options = RequestOptions::new()
        .catch_response_error(RecoveryHook::sync(Err))
        .catch_response_error(RecoveryHook::new(|err| async move {
            tokio::task::yield_now().await;
            match err.status() {
                Some(404) => Ok(Recovery::Resolve(json!([]))),
                _ => Err(err),
            }
        }))
        .transform_response(ResponseHook::new(|_, _| Ok(json!("not applied"))));
    let response = client.get(URL, None, &options).await.unwrap();

    assert_eq!(response.body, json!([]));
}

#[tokio::test]
async fn test_post_request_with_built_in_cache() {
    let data = json!({"test": "something", "test2": "something else"});
    let transport = RecordingTransport::ok(json!({"result": "data"}));
    let client = client_with(&transport);

    client
        .post(URL, Some(data.clone()), &RequestOptions::new().cache(true))
        .await
        .unwrap();

    assert_eq!(transport.last().method, Method::Post);
    assert_eq!(transport.last().body, Some(data.clone()));
    let key = format!("{URL}_{{}}_{data}");
    let stored = client.default_cache().get(&key).await.unwrap();
    assert_eq!(stored.map(|r| r.body), Some(json!({"result": "data"})));
}

#[tokio::test]
async fn test_post_is_never_served_from_cache() {
    let key = format!("{URL}_{{}}_{{}}");
    let store = RecordingStore::seeded(&key, Response::new(200, json!("stale")));
    let transport = RecordingTransport::ok(json!("fresh"));
    let client = client_with(&transport);

    let shared: Arc<dyn ResponseStore> = store.clone();
    let response = client
        .post(URL, None, &RequestOptions::new().cache(shared))
        .await
        .unwrap();

    assert_eq!(response.body, json!("fresh"));
    assert!(store.gets().is_empty());
    assert_eq!(store.sets(), vec![key]);
}

#[tokio::test]
async fn test_get_request_with_built_in_cache() {
    let transport = RecordingTransport::ok(json!("from network"));
    let client = client_with(&transport);
    let options = RequestOptions::new().cache(true);

    let first = client.get(URL, None, &options).await.unwrap();
    let second = client.get(URL, None, &options).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(transport.count(), 1);
}

#[tokio::test]
async fn test_get_request_with_custom_cache() {
    let query = json!({"test": "something", "test2": "something else"});
    let key = format!("{URL}_{query}_{{}}");
    let cached = Response::new(200, json!({"result": "data"}));
    let store = RecordingStore::seeded(&key, cached.clone());
    let transport = RecordingTransport::ok(json!("from network"));
    let client = client_with(&transport);

    let shared: Arc<dyn ResponseStore> = store.clone();
    let request = resourceful::PreparedRequest::new(Method::Get, URL)
        .query(query.as_object().cloned());
    let response = client
        .execute(request, &RequestOptions::new().cache(CacheOption::Store(shared)))
        .await
        .unwrap();

    assert_eq!(response, cached);
    assert_eq!(transport.count(), 0);
    assert_eq!(store.gets(), vec![key]);
}

#[tokio::test]
async fn test_get_request_with_cache_miss_populates_store() {
    let query = json!({"test": "something", "test2": "something else"});
    let key = format!("{URL}_{query}_{{}}");
    let store = RecordingStore::new();
    let transport = RecordingTransport::ok(json!({"result": "data"}));
    let client = client_with(&transport);

    let shared: Arc<dyn ResponseStore> = store.clone();
    let request = resourceful::PreparedRequest::new(Method::Get, URL)
        .query(query.as_object().cloned());
    let response = client
        .execute(request, &RequestOptions::new().cache(shared))
        .await
        .unwrap();

    assert_eq!(response.body, json!({"result": "data"}));
    assert_eq!(transport.count(), 1);
    assert_eq!(store.sets(), vec![key.clone()]);
    assert_eq!(store.stored(&key), Some(response));
}

#[tokio::test]
async fn test_cache_key_uses_body_before_transforms() {
    let store = RecordingStore::new();
    let transport = RecordingTransport::ok(json!({}));
    let client = client_with(&transport);

    let shared: Arc<dyn ResponseStore> = store.clone();
    let options = RequestOptions::new()
        .cache(shared)
        .transform_request(RequestHook::new(|_, _| Ok(json!({"rewritten": true}))));
    client
        .put(URL, Some(json!({"original": 1})), &options)
        .await
        .unwrap();

    assert_eq!(transport.last().body, Some(json!({"rewritten": true})));
    assert_eq!(store.sets(), vec![format!(r#"{URL}_{{}}_{{"original":1}}"#)]);
}

#[tokio::test]
async fn test_client_defaults_apply_to_every_call() {
    let transport = RecordingTransport::ok(json!({}));
    let client = client_with(&transport);
    let client = (*client).clone().with_defaults(
        &RequestOptions::new()
            .header("X-Client", "tests")
            .timeout(Duration::from_secs(9)),
    );

    client
        .delete(URL, None, &RequestOptions::new().header("X-Call", "1"))
        .await
        .unwrap();

    let sent = transport.last();
    assert_eq!(sent.method, Method::Delete);
    assert_eq!(sent.timeout, Some(Duration::from_secs(9)));
    assert_eq!(sent.headers.len(), 2);
}
