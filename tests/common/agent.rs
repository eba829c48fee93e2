//! In-process SNMPv3 agent for testing.
//!
//! Speaks just enough USM to serve the client: engine discovery Reports,
//! authPriv GET and GETBULK, and wrongDigest / unknownUserName Reports for
//! bad credentials. Data lives in a `BTreeMap<Oid, Value>`, so GETBULK
//! follows numeric OID order. Agents bind to ephemeral localhost ports and
//! shut down cleanly on drop.

use crate::common::fixtures;

use bytes::Bytes;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use ups_snmp::ber::Decoder;
use ups_snmp::message::{MsgFlags, MsgGlobalData, ScopedPdu, SecurityLevel, V3Message, V3MessageData};
use ups_snmp::pdu::{Pdu, PduType};
use ups_snmp::v3::auth::{authenticate_message, verify_message};
use ups_snmp::v3::{
    AuthProtocol, DEFAULT_MSG_MAX_SIZE, LocalizedKey, PrivKey, PrivProtocol, SaltCounter,
    UsmSecurityParams, report_oids,
};
use ups_snmp::{ConnectionConfig, Oid, SecurityParameters, Value, VarBind};

pub const USER: &str = "simulator";
pub const AUTH_PASSWORD: &str = "auctoritas";
pub const PRIV_PASSWORD: &str = "privatus";
pub const ENGINE_ID: &[u8] = b"\x80\x00\x1f\x88\x04ups-test";

/// USM user the agent accepts.
#[derive(Clone)]
pub struct V3User {
    pub username: String,
    pub auth: (AuthProtocol, String),
    pub priv_: (PrivProtocol, String),
}

impl V3User {
    pub fn auth_priv(
        username: impl Into<String>,
        auth_protocol: AuthProtocol,
        auth_password: impl Into<String>,
        priv_protocol: PrivProtocol,
        priv_password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            auth: (auth_protocol, auth_password.into()),
            priv_: (priv_protocol, priv_password.into()),
        }
    }

    pub fn security_parameters(&self) -> SecurityParameters {
        SecurityParameters::new(
            self.username.as_str(),
            Some(self.auth.0),
            self.auth.1.as_str(),
            Some(self.priv_.0),
            self.priv_.1.as_str(),
        )
        .expect("valid test credentials")
    }
}

impl Default for V3User {
    fn default() -> Self {
        Self::auth_priv(
            USER,
            AuthProtocol::Sha1,
            AUTH_PASSWORD,
            PrivProtocol::Aes128,
            PRIV_PASSWORD,
        )
    }
}

struct AgentState {
    data: Mutex<BTreeMap<Oid, Value>>,
    user: V3User,
    auth_key: LocalizedKey,
    priv_key: PrivKey,
    salt: SaltCounter,
    started: Instant,
    requests: AtomicUsize,
}

/// An in-process SNMPv3 agent.
///
/// Starts on creation and stops on drop.
///
/// # Example
///
/// ```ignore
/// let agent = TestAgent::new().await;
/// let client = SnmpClient::new(agent.config());
/// let result = client.get(".1.3.6.1.2.1.33.1.1.1.0").await?;
/// // Agent stops when dropped
/// ```
pub struct TestAgent {
    addr: SocketAddr,
    state: Arc<AgentState>,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl TestAgent {
    /// Agent serving the UPS-MIB fixture.
    pub async fn new() -> Self {
        Self::with_data(fixtures::ups_mib()).await
    }

    pub async fn with_data(data: BTreeMap<Oid, Value>) -> Self {
        Self::with_user(data, V3User::default()).await
    }

    pub async fn with_user(data: BTreeMap<Oid, Value>, user: V3User) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test agent");
        let addr = socket.local_addr().expect("bound socket has an address");

        let auth_key = LocalizedKey::from_password(user.auth.0, user.auth.1.as_bytes(), ENGINE_ID);
        let priv_key =
            PrivKey::from_password(user.auth.0, user.priv_.0, user.priv_.1.as_bytes(), ENGINE_ID);

        let state = Arc::new(AgentState {
            data: Mutex::new(data),
            user,
            auth_key,
            priv_key,
            salt: SaltCounter::new(),
            started: Instant::now(),
            requests: AtomicUsize::new(0),
        });

        let cancel = CancellationToken::new();
        let task = tokio::spawn(serve(socket, state.clone(), cancel.clone()));

        Self {
            addr,
            state,
            cancel,
            _task: task,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn user(&self) -> &V3User {
        &self.state.user
    }

    /// Connection config for this agent with the agent's own user.
    pub fn config(&self) -> ConnectionConfig {
        self.config_for(&self.state.user)
    }

    /// Connection config for this agent with arbitrary credentials.
    pub fn config_for(&self, user: &V3User) -> ConnectionConfig {
        ConnectionConfig::new(
            "v3",
            "127.0.0.1",
            self.addr.port(),
            Some(user.security_parameters()),
            "",
        )
        .expect("valid test config")
        .with_timeout(Duration::from_secs(2))
    }

    /// The connection parameter bag for this agent.
    pub fn params(&self) -> BTreeMap<String, String> {
        self.config().to_params()
    }

    pub fn set(&self, oid: Oid, value: Value) {
        self.state.data.lock().unwrap().insert(oid, value);
    }

    pub fn remove(&self, oid: &Oid) -> Option<Value> {
        self.state.data.lock().unwrap().remove(oid)
    }

    /// Number of datagrams received, discovery included.
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::Relaxed)
    }

    /// Stop early; also called on drop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TestAgent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn serve(socket: UdpSocket, state: Arc<AgentState>, cancel: CancellationToken) {
    let mut buf = vec![0u8; 65535];
    loop {
        let (len, source) = tokio::select! {
            _ = cancel.cancelled() => return,
            received = socket.recv_from(&mut buf) => match received {
                Ok(received) => received,
                Err(_) => continue,
            },
        };

        state.requests.fetch_add(1, Ordering::Relaxed);
        let request = Bytes::copy_from_slice(&buf[..len]);
        if let Some(reply) = state.handle(request) {
            let _ = socket.send_to(&reply, source).await;
        }
    }
}

impl AgentState {
    fn engine_boots(&self) -> u32 {
        1
    }

    fn engine_time(&self) -> u32 {
        self.started.elapsed().as_secs() as u32
    }

    fn handle(&self, data: Bytes) -> Option<Bytes> {
        let message = V3Message::decode(data.clone()).ok()?;
        let msg_id = message.msg_id();

        if message.security_level() == SecurityLevel::NoAuthNoPriv {
            let request_id = message.pdu().map(|p| p.request_id).unwrap_or(0);
            return Some(self.report(msg_id, request_id, report_oids::unknown_engine_ids()));
        }

        let usm = UsmSecurityParams::decode(message.security_params.clone()).ok()?;
        if usm.username.as_ref() != self.user.username.as_bytes() {
            return Some(self.report(msg_id, 0, report_oids::unknown_user_names()));
        }

        let verified = UsmSecurityParams::find_auth_params_offset(&data)
            .is_some_and(|(offset, len)| verify_message(&self.auth_key, &data, offset, len));
        if !verified {
            return Some(self.report(msg_id, 0, report_oids::wrong_digests()));
        }

        let V3MessageData::Encrypted(ciphertext) = message.data else {
            return None;
        };
        let Ok(plaintext) = self.priv_key.decrypt(
            &ciphertext,
            usm.engine_boots,
            usm.engine_time,
            &usm.priv_params,
        ) else {
            return Some(self.report(msg_id, 0, report_oids::decryption_errors()));
        };
        let scoped = ScopedPdu::decode(&mut Decoder::new(plaintext)).ok()?;

        let varbinds = match scoped.pdu.pdu_type {
            PduType::GetRequest => self.get(&scoped.pdu),
            PduType::GetBulkRequest => self.get_bulk(&scoped.pdu),
            _ => return None,
        };
        let response = ScopedPdu::new(
            Bytes::from_static(ENGINE_ID),
            scoped.context_name,
            Pdu::response(scoped.pdu.request_id, varbinds),
        );
        self.encrypt_and_sign(msg_id, response)
    }

    fn get(&self, pdu: &Pdu) -> Vec<VarBind> {
        let data = self.data.lock().unwrap();
        pdu.varbinds
            .iter()
            .map(|vb| match data.get(&vb.oid) {
                Some(value) => VarBind::new(vb.oid.clone(), value.clone()),
                None => VarBind::new(vb.oid.clone(), Value::NoSuchObject),
            })
            .collect()
    }

    /// Non-repeaters are ignored; every requested OID repeats.
    fn get_bulk(&self, pdu: &Pdu) -> Vec<VarBind> {
        let data = self.data.lock().unwrap();
        let max_repetitions = pdu.error_index.max(1) as usize;
        let mut out = Vec::new();

        for vb in &pdu.varbinds {
            let mut current = vb.oid.clone();
            for _ in 0..max_repetitions {
                let next = data
                    .range((Bound::Excluded(&current), Bound::Unbounded))
                    .next()
                    .map(|(oid, value)| (oid.clone(), value.clone()));
                match next {
                    Some((oid, value)) => {
                        current = oid.clone();
                        out.push(VarBind::new(oid, value));
                    }
                    None => {
                        out.push(VarBind::new(current.clone(), Value::EndOfMibView));
                        break;
                    }
                }
            }
        }
        out
    }

    /// Unauthenticated Report carrying one USM counter.
    fn report(&self, msg_id: i32, request_id: i32, counter: Oid) -> Bytes {
        let usm = UsmSecurityParams::new(
            Bytes::from_static(ENGINE_ID),
            self.engine_boots(),
            self.engine_time(),
            Bytes::new(),
        );
        let global = MsgGlobalData::new(
            msg_id,
            DEFAULT_MSG_MAX_SIZE as i32,
            MsgFlags::new(SecurityLevel::NoAuthNoPriv, false),
        );
        let scoped = ScopedPdu::new(
            Bytes::from_static(ENGINE_ID),
            Bytes::new(),
            Pdu::report(request_id, vec![VarBind::new(counter, Value::Counter32(1))]),
        );
        V3Message::new(global, usm.encode(), scoped).encode()
    }

    fn encrypt_and_sign(&self, msg_id: i32, scoped: ScopedPdu) -> Option<Bytes> {
        let boots = self.engine_boots();
        let time = self.engine_time();
        let (ciphertext, salt) = self
            .priv_key
            .encrypt(&scoped.encode_to_bytes(), boots, time, &self.salt)
            .ok()?;

        let usm = UsmSecurityParams::new(
            Bytes::from_static(ENGINE_ID),
            boots,
            time,
            Bytes::copy_from_slice(self.user.username.as_bytes()),
        )
        .with_auth_placeholder(self.auth_key.mac_len())
        .with_priv_params(salt);
        let global = MsgGlobalData::new(
            msg_id,
            DEFAULT_MSG_MAX_SIZE as i32,
            MsgFlags::new(SecurityLevel::AuthPriv, false),
        );

        let mut encoded = V3Message::new_encrypted(global, usm.encode(), ciphertext)
            .encode()
            .to_vec();
        let (offset, len) = UsmSecurityParams::find_auth_params_offset(&encoded)?;
        authenticate_message(&self.auth_key, &mut encoded, offset, len);
        Some(Bytes::from(encoded))
    }
}
