//! Integration tests against a real Redis. Docker is required.

use jiff::Timestamp;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use vanish_core::{Admission, PasteId, PasteRecord, PasteRepository};
use vanish_storage::{RedisConnector, RedisRepository, RedisSettings};
use vanish_test_infra::RedisServer;

fn ts(ms: i64) -> Timestamp {
    Timestamp::from_millisecond(ms).unwrap()
}

fn record(id: &str, expires_at_ms: Option<i64>, max_views: Option<u32>) -> PasteRecord {
    PasteRecord {
        id: PasteId::parse(id).unwrap(),
        content: "hello <world> & \"friends\" / ünïcode".to_string(),
        created_at_ms: 1_700_000_000_000,
        expires_at_ms,
        max_views,
        views_used: 0,
    }
}

async fn repository(server: &RedisServer) -> RedisRepository {
    let settings = RedisSettings::builder()
        .url(server.url().await.unwrap())
        .build();
    RedisRepository::new(RedisConnector::new(settings).unwrap())
}

#[tokio::test]
async fn test_insert_get_delete() {
    let server = RedisServer::start().await.unwrap();
    let repo = repository(&server).await;
    let r = record("abc", None, None);

    repo.insert(&r, None).await.unwrap();
    assert_eq!(repo.get(&r.id).await.unwrap(), Some(r.clone()));

    assert!(repo.delete(&r.id).await.unwrap());
    assert!(!repo.delete(&r.id).await.unwrap());
    assert_eq!(repo.get(&r.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_insert_sets_backend_ttl() {
    let server = RedisServer::start().await.unwrap();
    let repo = repository(&server).await;
    let r = record("ttl", Some(1_700_000_060_000), None);

    repo.insert(&r, Some(Duration::from_secs(60))).await.unwrap();

    let mut conn = server.connection().await.unwrap();
    let ttl: i64 = conn.ttl("paste:ttl").await.unwrap();
    assert!((1..=60).contains(&ttl), "unexpected ttl {ttl}");
}

#[tokio::test]
async fn test_consume_keeps_ttl_and_counts_views() {
    let server = RedisServer::start().await.unwrap();
    let repo = repository(&server).await;
    let r = record("views", Some(1_700_000_060_000), Some(3));
    repo.insert(&r, Some(Duration::from_secs(60))).await.unwrap();

    let Admission::Admitted(first) = repo.consume(&r.id, ts(1_700_000_000_000)).await.unwrap()
    else {
        panic!("first view should be admitted");
    };
    assert_eq!(first.views_used, 1);
    assert_eq!(first.content, r.content);
    assert_eq!(first.created_at_ms, r.created_at_ms);
    assert_eq!(first.expires_at_ms, r.expires_at_ms);

    let stored = repo.get(&r.id).await.unwrap().unwrap();
    assert_eq!(stored.views_used, 1);

    let mut conn = server.connection().await.unwrap();
    let ttl: i64 = conn.ttl("paste:views").await.unwrap();
    assert!(ttl > 0, "KEEPTTL should preserve the expiry, got {ttl}");
}

#[tokio::test]
async fn test_consume_keeps_far_future_expiry_exact() {
    let server = RedisServer::start().await.unwrap();
    let repo = repository(&server).await;
    // 15 digits, past the 14 significant digits Lua's JSON encoder keeps
    let r = record("far", Some(201_790_000_000_001), Some(3));
    repo.insert(&r, None).await.unwrap();

    let Admission::Admitted(first) = repo.consume(&r.id, ts(1_700_000_000_000)).await.unwrap()
    else {
        panic!("first view should be admitted");
    };
    assert_eq!(first.expires_at_ms, Some(201_790_000_000_001));
    assert_eq!(first.views_used, 1);

    let mut conn = server.connection().await.unwrap();
    let raw: String = conn.get("paste:far").await.unwrap();
    assert!(raw.contains(r#""expires_at_ms":201790000000001"#), "{raw}");

    let stored = repo.get(&r.id).await.unwrap().unwrap();
    assert_eq!(stored, PasteRecord { views_used: 1, ..r.clone() });
    assert!(repo.consume(&r.id, ts(1_700_000_000_000)).await.unwrap().is_admitted());
}

#[tokio::test]
async fn test_consume_last_view_deletes() {
    let server = RedisServer::start().await.unwrap();
    let repo = repository(&server).await;
    let r = record("last", None, Some(2));
    repo.insert(&r, None).await.unwrap();

    assert!(repo.consume(&r.id, ts(0)).await.unwrap().is_admitted());
    let Admission::Admitted(last) = repo.consume(&r.id, ts(0)).await.unwrap() else {
        panic!("last view should be admitted");
    };
    assert_eq!(last.views_used, 2);

    assert_eq!(repo.get(&r.id).await.unwrap(), None);
    assert_eq!(repo.consume(&r.id, ts(0)).await.unwrap(), Admission::Missing);
}

#[tokio::test]
async fn test_consume_expired_deletes() {
    let server = RedisServer::start().await.unwrap();
    let repo = repository(&server).await;
    let r = record("old", Some(60_000), None);
    repo.insert(&r, None).await.unwrap();

    assert!(repo.consume(&r.id, ts(59_999)).await.unwrap().is_admitted());
    assert_eq!(
        repo.consume(&r.id, ts(60_000)).await.unwrap(),
        Admission::Expired
    );
    assert_eq!(repo.get(&r.id).await.unwrap(), None);

    // moving time backwards does not resurrect it
    assert_eq!(repo.consume(&r.id, ts(0)).await.unwrap(), Admission::Missing);
}

#[tokio::test]
async fn test_consume_exhausted_deletes() {
    let server = RedisServer::start().await.unwrap();
    let repo = repository(&server).await;
    let mut r = record("spent", None, Some(1));
    r.views_used = 1;
    repo.insert(&r, None).await.unwrap();

    assert_eq!(
        repo.consume(&r.id, ts(0)).await.unwrap(),
        Admission::Exhausted
    );
    assert_eq!(repo.get(&r.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_concurrent_consume_single_view() {
    let server = RedisServer::start().await.unwrap();
    let repo = Arc::new(repository(&server).await);
    let r = record("race", None, Some(1));
    repo.insert(&r, None).await.unwrap();

    let (a, b) = tokio::join!(
        {
            let repo = Arc::clone(&repo);
            let id = r.id.clone();
            tokio::spawn(async move { repo.consume(&id, ts(0)).await.unwrap() })
        },
        {
            let repo = Arc::clone(&repo);
            let id = r.id.clone();
            tokio::spawn(async move { repo.consume(&id, ts(0)).await.unwrap() })
        }
    );

    let admitted = [a.unwrap(), b.unwrap()]
        .iter()
        .filter(|admission| admission.is_admitted())
        .count();
    assert_eq!(admitted, 1);
}

#[tokio::test]
async fn test_concurrent_consume_from_separate_connections() {
    let server = RedisServer::start().await.unwrap();
    let r = record("many", None, Some(10));
    repository(&server).await.insert(&r, None).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        // each repository owns its own connection, like separate processes
        let repo = repository(&server).await;
        let id = r.id.clone();
        handles.push(tokio::spawn(async move {
            let mut admitted = 0;
            for _ in 0..5 {
                if repo.consume(&id, ts(0)).await.unwrap().is_admitted() {
                    admitted += 1;
                }
            }
            admitted
        }));
    }

    let mut total = 0;
    for handle in handles {
        total += handle.await.unwrap();
    }
    assert_eq!(total, 10);
}

#[tokio::test]
async fn test_ping() {
    let server = RedisServer::start().await.unwrap();
    let repo = repository(&server).await;
    repo.ping().await.unwrap();
}

#[tokio::test]
async fn test_ping_fails_when_server_is_gone() {
    let server = RedisServer::start().await.unwrap();
    let settings = RedisSettings::builder()
        .url(server.url().await.unwrap())
        .max_retries(0)
        .connect_timeout(Duration::from_millis(500))
        .response_timeout(Duration::from_millis(500))
        .build();
    let repo = RedisRepository::new(RedisConnector::new(settings).unwrap());
    repo.ping().await.unwrap();

    server.container().stop().await.unwrap();

    let err = repo.ping().await.unwrap_err();
    assert!(err.is_unavailable(), "unexpected error: {err:?}");
}

async fn connections_received(server: &RedisServer) -> u64 {
    let mut conn = server.connection().await.unwrap();
    let info: String = redis::cmd("INFO")
        .arg("stats")
        .query_async(&mut conn)
        .await
        .unwrap();
    info.lines()
        .find_map(|line| line.strip_prefix("total_connections_received:"))
        .unwrap()
        .trim()
        .parse()
        .unwrap()
}

#[tokio::test]
async fn test_reconnects_after_connection_failure() {
    let server = RedisServer::start().await.unwrap();
    let settings = RedisSettings::builder()
        .url(server.url().await.unwrap())
        .max_retries(0)
        .connect_timeout(Duration::from_millis(300))
        .response_timeout(Duration::from_millis(300))
        .build();
    let repo = RedisRepository::new(RedisConnector::new(settings).unwrap());
    let r = record("again", None, Some(5));
    repo.insert(&r, None).await.unwrap();

    server.container().pause().await.unwrap();
    assert!(repo.ping().await.is_err());
    assert!(repo.consume(&r.id, ts(0)).await.is_err());
    server.container().unpause().await.unwrap();

    repo.ping().await.unwrap();
    let Admission::Admitted(seen) = repo.consume(&r.id, ts(0)).await.unwrap() else {
        panic!("view should be admitted after reconnecting");
    };
    assert!(seen.views_used >= 1);
}

#[tokio::test]
async fn test_concurrent_first_callers_share_one_connect() {
    let server = RedisServer::start().await.unwrap();
    let settings = RedisSettings::builder()
        .url(server.url().await.unwrap())
        .build();
    let connector = RedisConnector::new(settings).unwrap();
    let before = connections_received(&server).await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let connector = connector.clone();
        handles.push(tokio::spawn(async move {
            let mut conn = connector.connection().await.unwrap();
            let _: String = redis::cmd("PING").query_async(&mut conn).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // one for the connector, one for the INFO query itself
    assert_eq!(connections_received(&server).await - before, 2);
}

#[tokio::test]
async fn test_custom_prefix() {
    let server = RedisServer::start().await.unwrap();
    let settings = RedisSettings::builder()
        .url(server.url().await.unwrap())
        .build();
    let repo = RedisRepository::with_prefix(RedisConnector::new(settings).unwrap(), "test:p:");
    let r = record("prefixed", None, None);
    repo.insert(&r, None).await.unwrap();

    let mut conn = server.connection().await.unwrap();
    let exists: bool = conn.exists("test:p:prefixed").await.unwrap();
    assert!(exists);
}
