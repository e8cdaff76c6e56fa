use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, LastWill, MqttOptions, Outgoing, Packet, QoS};
use shared::protocol::{Topics, OFFLINE_PAYLOAD, ONLINE_PAYLOAD};
use tokio::{sync::Mutex, task::JoinHandle, time::timeout};
use tracing::{debug, warn};

use crate::{ControlEvents, StatusPublisher};

const EVENT_CHANNEL_CAPACITY: usize = 16;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// How long `shutdown` waits for the event loop to put the queued
/// offline publish and disconnect on the wire.
const SHUTDOWN_FLUSH_WINDOW: Duration = Duration::from_secs(5);

/// Broker connection parameters, as recognized by the daemon config.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub keep_alive_secs: u64,
    pub bind_address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    pub qos: u8,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            keep_alive_secs: 60,
            bind_address: None,
            username: None,
            password: None,
            client_id: "oled".into(),
            qos: 0,
        }
    }
}

fn qos_level(level: u8) -> QoS {
    match level {
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtMostOnce,
    }
}

/// True once the clean disconnect requested by `shutdown` has been
/// written to the wire. Anything queued ahead of it, the offline
/// presence publish included, went out first.
fn session_closed(event: &Event) -> bool {
    matches!(event, Event::Outgoing(Outgoing::Disconnect))
}

/// Owns the broker connection. Connecting never blocks the caller: the
/// event loop runs on its own task and retries transparently, surfacing
/// connectivity only through the handler callbacks.
pub struct MqttLink {
    client: AsyncClient,
    topics: Topics,
    qos: QoS,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MqttLink {
    pub fn connect(config: &BrokerConfig, topics: Topics, handler: Arc<dyn ControlEvents>) -> Arc<Self> {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }
        if let Some(bind) = &config.bind_address {
            // The transport picks the local address itself; the option is
            // recognized for config parity but cannot be applied.
            warn!(bind = %bind, "bind_address is configured but not supported by the MQTT transport");
        }
        let qos = qos_level(config.qos);
        options.set_last_will(LastWill::new(
            &topics.presence,
            OFFLINE_PAYLOAD.as_bytes().to_vec(),
            qos,
            false,
        ));

        let (client, mut eventloop) = AsyncClient::new(options, EVENT_CHANNEL_CAPACITY);
        let task = tokio::spawn({
            let client = client.clone();
            let topics = topics.clone();
            async move {
                loop {
                    match eventloop.poll().await {
                        Ok(event) if session_closed(&event) => {
                            debug!("clean disconnect written; event loop exiting");
                            break;
                        }
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            if let Err(err) = client.subscribe(&topics.command, qos).await {
                                warn!(%err, topic = %topics.command, "command subscribe failed");
                            }
                            if let Err(err) = client
                                .publish(&topics.presence, qos, false, ONLINE_PAYLOAD)
                                .await
                            {
                                warn!(%err, "online presence publish failed");
                            }
                            handler.on_connected().await;
                        }
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            if publish.topic == topics.command {
                                handler.on_command(&publish.payload).await;
                            }
                        }
                        Ok(Event::Incoming(Packet::Disconnect)) => {
                            // A clean broker disconnect is retried the same
                            // as an abnormal drop: remote operators have no
                            // way to ask this daemon to stay offline.
                            handler.on_disconnected("broker requested disconnect").await;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            handler.on_disconnected(&err.to_string()).await;
                            tokio::time::sleep(RECONNECT_DELAY).await;
                        }
                    }
                }
            }
        });

        Arc::new(Self {
            client,
            topics,
            qos,
            task: Mutex::new(Some(task)),
        })
    }

    /// Deterministically announces the daemon as offline and stops the
    /// event loop. The last-will stays registered for abnormal loss; this
    /// path covers orderly process exit, which the will does not.
    ///
    /// Publish and disconnect are only queued until the event loop polls
    /// them onto the wire, so the loop is awaited rather than aborted. It
    /// exits once it sees its own disconnect go out.
    pub async fn shutdown(&self) {
        if let Err(err) = self
            .client
            .publish(&self.topics.presence, self.qos, false, OFFLINE_PAYLOAD)
            .await
        {
            debug!(%err, "offline presence publish dropped during shutdown");
        }
        let _ = self.client.disconnect().await;
        if let Some(mut task) = self.task.lock().await.take() {
            if timeout(SHUTDOWN_FLUSH_WINDOW, &mut task).await.is_err() {
                warn!("event loop did not flush the offline publish in time");
                task.abort();
            }
        }
    }
}

#[async_trait]
impl StatusPublisher for MqttLink {
    async fn publish(&self, topic: &str, payload: &str, retain: bool) {
        if let Err(err) = self.client.publish(topic, self.qos, retain, payload).await {
            debug!(%err, topic, "status publish dropped");
        }
    }
}
