//! MQTT 구독자 — 브로커 이벤트 루프를 돌리며 수신 메시지를
//! 디코더와 싱크로 흘려보냅니다.
//!
//! 연결이 끊기면 짧게 대기한 뒤 이벤트 루프 폴링을 재개합니다.
//! 재연결 자체는 [`rumqttc`]의 이벤트 루프가 수행하고, 여기서는
//! 상태 추적과 백오프, 재구독 트리거만 담당합니다.

use std::time::Duration;

use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use trackgate_core::config::BrokerConfig;
use trackgate_core::error::{TrackgateError, TransportError};
use trackgate_core::metrics::{
    MESSAGES_RECEIVED_TOTAL, RAW_FALLBACK_TOTAL, RECONNECTS_TOTAL,
};
use trackgate_core::pipeline::DetectionSink;

use crate::decoder::DecoderRouter;

/// 연결 끊김 후 다음 폴링까지의 대기 시간.
const RECONNECT_DELAY: Duration = Duration::from_millis(250);

/// 클라이언트 → 이벤트 루프 사이 요청 채널 용량.
const REQUEST_CAP: usize = 64;

/// 구독자의 생명주기 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    /// 브로커와 연결되지 않음 (초기 또는 끊김 직후).
    Disconnected,
    /// 이벤트 루프 폴링 시작, CONNACK 대기 중.
    Connecting,
    /// CONNACK 수신, 구독 요청 전.
    Connected,
    /// 구독 요청까지 마친 정상 수신 상태.
    Subscribed,
    /// 정지 요청으로 루프 종료.
    Stopped,
}

impl SubscriberState {
    pub fn state_name(&self) -> &'static str {
        match self {
            SubscriberState::Disconnected => "disconnected",
            SubscriberState::Connecting => "connecting",
            SubscriberState::Connected => "connected",
            SubscriberState::Subscribed => "subscribed",
            SubscriberState::Stopped => "stopped",
        }
    }
}

/// MQTT 브로커를 구독해 탐지 페이로드를 수신하는 태스크 본체.
pub struct MqttSubscriber {
    config: BrokerConfig,
    router: DecoderRouter,
    sink: Box<dyn DetectionSink>,
    pretty: bool,
    client: AsyncClient,
    eventloop: EventLoop,
    state: SubscriberState,
    cancel: CancellationToken,
}

impl MqttSubscriber {
    /// 구독자를 생성합니다. 설정 검증이 먼저 수행되므로 잘못된
    /// 브로커 설정은 네트워크 I/O 없이 여기서 거부됩니다.
    pub fn new(
        config: BrokerConfig,
        router: DecoderRouter,
        sink: Box<dyn DetectionSink>,
        pretty: bool,
    ) -> Result<Self, TrackgateError> {
        config.validate()?;

        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keepalive_secs));
        if let Some(username) = &config.username {
            options.set_credentials(username, config.password.clone().unwrap_or_default());
        }

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAP);

        Ok(Self {
            config,
            router,
            sink,
            pretty,
            client,
            eventloop,
            state: SubscriberState::Disconnected,
            cancel: CancellationToken::new(),
        })
    }

    /// 현재 생명주기 상태를 반환합니다.
    pub fn state(&self) -> SubscriberState {
        self.state
    }

    /// 정지 신호용 토큰을 복제해 반환합니다. 다른 태스크에서
    /// [`CancellationToken::cancel`]을 호출하면 루프가 종료됩니다.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 정지를 요청합니다. 여러 번 호출해도 안전합니다.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// 이벤트 루프를 돌립니다. 정지 신호가 올 때까지 반환하지
    /// 않으며, 연결 오류는 내부에서 흡수하고 재시도합니다.
    pub async fn run(&mut self) -> Result<(), TrackgateError> {
        info!(
            host = %self.config.host,
            port = self.config.port,
            topics = ?self.config.topics,
            "mqtt subscriber starting"
        );
        self.state = SubscriberState::Connecting;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("stop requested; shutting down mqtt subscriber");
                    break;
                }
                event = self.eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        self.on_connack(ack.code);
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        self.on_message(&publish.topic, &publish.payload);
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        warn!("broker sent DISCONNECT");
                        self.on_connection_lost().await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "mqtt connection error");
                        self.on_connection_lost().await;
                    }
                },
            }
        }

        // 이미 끊긴 상태라면 disconnect 요청은 실패해도 무방합니다.
        if let Err(e) = self.client.disconnect().await {
            debug!(error = %e, "disconnect request failed during shutdown");
        }
        self.state = SubscriberState::Stopped;
        info!("mqtt subscriber stopped");
        Ok(())
    }

    fn on_connack(&mut self, code: ConnectReturnCode) {
        let status = conn_status(code);
        if code != ConnectReturnCode::Success {
            let err = TransportError::Refused {
                status: status.to_owned(),
            };
            error!(error = %err, "broker refused connection");
            return;
        }

        info!(status, "connected to broker");
        self.state = SubscriberState::Connected;

        let qos = qos_level(self.config.qos);
        for topic in &self.config.topics {
            // 구독 요청은 클라이언트 큐에 넣기만 하고 SUBACK은
            // 기다리지 않습니다.
            match self.client.try_subscribe(topic, qos) {
                Ok(()) => info!(topic = %topic, qos = self.config.qos, "subscribed"),
                Err(e) => error!(topic = %topic, error = %e, "subscribe request failed"),
            }
        }
        self.state = SubscriberState::Subscribed;
    }

    async fn on_connection_lost(&mut self) {
        self.state = SubscriberState::Disconnected;
        metrics::counter!(RECONNECTS_TOTAL).increment(1);
        tokio::time::sleep(RECONNECT_DELAY).await;
        self.state = SubscriberState::Connecting;
    }

    fn on_message(&self, topic: &str, payload: &[u8]) {
        metrics::counter!(MESSAGES_RECEIVED_TOTAL).increment(1);

        let events = self.router.decode(topic, payload);
        if events.is_empty() {
            metrics::counter!(RAW_FALLBACK_TOTAL).increment(1);
            let text = pretty_or_raw(payload, self.pretty);
            if let Err(e) = self.sink.handle_raw(topic, &text) {
                warn!(error = %e, "raw fallback delivery failed");
            }
            return;
        }

        for event in &events {
            debug!(%event, "decoded detection");
            if let Err(e) = self.sink.handle(event) {
                warn!(error = %e, track_id = %event.track_id, "event delivery failed");
            }
        }
    }
}

/// CONNACK 반환 코드를 사람이 읽을 수 있는 설명으로 변환합니다.
pub fn conn_status(code: ConnectReturnCode) -> &'static str {
    match code {
        ConnectReturnCode::Success => "Connected",
        ConnectReturnCode::RefusedProtocolVersion => "Incorrect protocol version",
        ConnectReturnCode::BadClientId => "Invalid client identifier",
        ConnectReturnCode::ServiceUnavailable => "Server unavailable",
        ConnectReturnCode::BadUserNamePassword => "Bad username or password",
        ConnectReturnCode::NotAuthorized => "Not authorised",
    }
}

/// 원문 페이로드를 표시용 텍스트로 변환합니다.
///
/// UTF-8 이면서 JSON 으로 파싱되면 `pretty` 여부에 따라 재렌더링하고,
/// JSON 이 아니면 텍스트 그대로, UTF-8 이 아니면 손실 변환합니다.
pub fn pretty_or_raw(payload: &[u8], pretty: bool) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => {
                let rendered = if pretty {
                    serde_json::to_string_pretty(&value)
                } else {
                    serde_json::to_string(&value)
                };
                rendered.unwrap_or_else(|_| text.to_owned())
            }
            Err(_) => text.to_owned(),
        },
        Err(_) => String::from_utf8_lossy(payload).into_owned(),
    }
}

/// 설정의 QoS 숫자를 [`QoS`] 값으로 변환합니다. 검증을 거친 값만
/// 들어오므로 범위 밖 숫자는 QoS 0 으로 취급합니다.
pub fn qos_level(qos: u8) -> QoS {
    match qos {
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtMostOnce,
    }
}
