//! SNMPv3 session tests against the in-process TestAgent.

mod common;

use common::{ORDERING_ROOT, TestAgent, V3User, fixtures};
use std::time::Duration;
use ups_snmp::v3::{AuthProtocol, PrivProtocol};
use ups_snmp::{Error, ReadValue, SnmpClient};

/// GET of a string scalar over authPriv SHA/AES.
#[tokio::test]
async fn get_identity_string() {
    let agent = TestAgent::new().await;
    let client = SnmpClient::new(agent.config());

    let result = client.get(".1.3.6.1.2.1.33.1.1.2.0").await.unwrap();

    assert_eq!(result.oid, ".1.3.6.1.2.1.33.1.1.2.0");
    assert_eq!(result.value, ReadValue::String(fixtures::MODEL.into()));
}

/// Every supported {MD5,SHA}×{DES,AES} pairing completes a GET.
#[tokio::test]
async fn get_with_every_protocol_pairing() {
    for auth in [AuthProtocol::Md5, AuthProtocol::Sha1] {
        for privacy in [PrivProtocol::Des, PrivProtocol::Aes128] {
            let user = V3User::auth_priv("pairing", auth, "authpassword", privacy, "privpassword");
            let agent = TestAgent::with_user(common::ups_mib(), user).await;
            let client = SnmpClient::new(agent.config());

            let result = client.get(".1.3.6.1.2.1.33.1.2.1.0").await.unwrap();
            assert_eq!(result.value, ReadValue::Integer(2), "{:?}/{:?}", auth, privacy);
        }
    }
}

/// Missing instances come back as Null rather than an error.
#[tokio::test]
async fn get_missing_instance_is_null() {
    let agent = TestAgent::new().await;
    let client = SnmpClient::new(agent.config());

    let result = client.get(".1.3.6.1.2.1.33.1.99.0").await.unwrap();
    assert!(result.value.is_null());
}

/// Each call opens its own session, so each GET rediscovers the engine.
#[tokio::test]
async fn each_get_uses_a_fresh_session() {
    let agent = TestAgent::new().await;
    let client = SnmpClient::new(agent.config());

    client.get(".1.3.6.1.2.1.33.1.1.1.0").await.unwrap();
    client.get(".1.3.6.1.2.1.33.1.1.1.0").await.unwrap();

    // discovery + GET, twice
    assert_eq!(agent.request_count(), 4);
}

/// Walk results follow numeric OID order: .2.1 < .2.2 < .2.10 < .2.100.
#[tokio::test]
async fn walk_orders_numerically() {
    let agent = TestAgent::with_data(common::combined()).await;
    let client = SnmpClient::new(agent.config());

    let results = client.walk(ORDERING_ROOT).await.unwrap();
    let oids: Vec<&str> = results.iter().map(|r| r.oid.as_str()).collect();

    assert_eq!(
        oids,
        [
            ".1.3.6.1.4.1.534.2.1",
            ".1.3.6.1.4.1.534.2.2",
            ".1.3.6.1.4.1.534.2.10",
            ".1.3.6.1.4.1.534.2.100",
        ]
    );
}

/// A walk spanning several GETBULK round trips stays inside its subtree.
#[tokio::test]
async fn walk_spans_multiple_bulk_requests() {
    let agent = TestAgent::new().await;
    let config = agent.config().with_max_repetitions(2);
    let client = SnmpClient::new(config);

    let results = client.walk(".1.3.6.1.2.1.33.1.3.3").await.unwrap();

    // 5 columns × 3 lines
    assert_eq!(results.len(), 15);
    assert!(
        results
            .iter()
            .all(|r| r.oid.starts_with(".1.3.6.1.2.1.33.1.3.3."))
    );
}

#[tokio::test]
async fn walk_of_empty_subtree_is_empty() {
    let agent = TestAgent::new().await;
    let client = SnmpClient::new(agent.config());

    let results = client.walk(".1.3.6.1.2.1.33.1.5.3").await.unwrap();
    assert!(results.is_empty());
}

/// A wrong auth passphrase is rejected by the agent with a wrongDigest Report.
#[tokio::test]
async fn wrong_auth_password_is_auth_error() {
    let agent = TestAgent::new().await;
    let mut user = agent.user().clone();
    user.auth.1 = "not-the-password".into();
    let client = SnmpClient::new(agent.config_for(&user));

    let err = client.get(".1.3.6.1.2.1.33.1.1.1.0").await.unwrap_err();
    assert!(matches!(*err, Error::Auth { .. }), "got {:?}", err);
    assert!(err.is_transport());
}

#[tokio::test]
async fn unknown_user_is_auth_error() {
    let agent = TestAgent::new().await;
    let mut user = agent.user().clone();
    user.username = "intruder".into();
    let client = SnmpClient::new(agent.config_for(&user));

    let err = client.get(".1.3.6.1.2.1.33.1.1.1.0").await.unwrap_err();
    assert!(matches!(*err, Error::Auth { .. }), "got {:?}", err);
}

/// A silent agent surfaces as a timeout, not a hang.
#[tokio::test]
async fn stopped_agent_times_out() {
    let agent = TestAgent::new().await;
    let config = agent.config().with_timeout(Duration::from_millis(100));
    agent.stop();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = SnmpClient::new(config)
        .get(".1.3.6.1.2.1.33.1.1.1.0")
        .await
        .unwrap_err();
    assert!(
        matches!(*err, Error::Timeout { .. } | Error::Network { .. }),
        "got {:?}",
        err
    );
}

/// Resolution happens at session time, so it fails as a transport error.
#[tokio::test]
async fn unresolvable_endpoint_is_transport_error() {
    let agent = TestAgent::new().await;
    let mut params = agent.params();
    params.insert("endpoint".into(), "no-such-host.invalid".into());
    let config = ups_snmp::ConnectionConfig::from_params(&params).unwrap();

    let err = SnmpClient::new(config)
        .get(".1.3.6.1.2.1.33.1.1.1.0")
        .await
        .unwrap_err();
    assert!(matches!(*err, Error::Network { .. }), "got {:?}", err);
    assert!(err.is_transport());
    // nothing reached the agent
    assert_eq!(agent.request_count(), 0);
}
