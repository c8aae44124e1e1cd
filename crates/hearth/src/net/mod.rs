//! The network front door: server list pings, offline-mode login and the configuration phase.

use std::{
    io::{self, ErrorKind},
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use anyhow::{Context, bail};
use bytes::BytesMut;
use hearth_proto::{
    Encode, MINECRAFT_VERSION, PROTOCOL_VERSION, Packet, PacketDecoder, PacketEncoder,
    ServerboundPackets,
    listener::ServerCommonPacketListener as _,
    packets::{
        configuration::{ConfigurationC2s, CustomPayloadS2c, FinishConfigurationS2c},
        handshake::{HandshakeC2s, HandshakeNextState},
        login::{LoginC2s, LoginDisconnectS2c, LoginHelloC2s, LoginSuccessS2c},
        play,
        status::{PongResponseS2c, StatusC2s, StatusResponseS2c},
    },
};
use serde_json::json;
use sha2::Digest;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::watch,
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::common::runtime::AsyncRuntime;

mod configuration;

pub use configuration::{BRAND_CHANNEL, ConfigurationHandler};

pub const SERVER_BRAND: &str = "hearth";

/// Connections that have not reached the end of configuration by then are dropped.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

const PLAY_UNAVAILABLE: &str = "This server does not accept players into the world yet";

/// What the front door tells clients about the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSettings {
    pub motd: String,
    pub max_players: u32,
    pub enable_status: bool,
}

#[derive(Debug)]
struct Shared {
    settings: NetworkSettings,
    /// Clients between login and the end of configuration.
    online: AtomicU32,
}

/// A JSON text component holding plain text.
fn text(message: &str) -> String {
    json!({ "text": message }).to_string()
}

/// The id an offline-mode player gets for `username`.
pub fn offline_uuid(username: &str) -> anyhow::Result<Uuid> {
    let digest = sha2::Sha256::digest(username);
    Uuid::from_slice(&digest[..16]).context("failed to create uuid")
}

/// The listening socket and its accept loop.
#[derive(Debug)]
pub struct ServerConnection {
    local_addr: SocketAddr,
    shared: Arc<Shared>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    runtime: AsyncRuntime,
}

impl ServerConnection {
    /// Binds `host:port` and starts accepting on `runtime`. An empty host binds every interface.
    #[instrument(skip(runtime, settings))]
    pub fn bind(
        runtime: &AsyncRuntime,
        host: &str,
        port: u16,
        settings: NetworkSettings,
    ) -> anyhow::Result<Self> {
        let host = if host.is_empty() { "0.0.0.0" } else { host };

        let listener = runtime
            .block_on(TcpListener::bind((host, port)))
            .with_context(|| format!("failed to bind to {host}:{port}"))?;
        let local_addr = listener.local_addr()?;

        info!("Starting Minecraft server on {local_addr}");

        let shared = Arc::new(Shared {
            settings,
            online: AtomicU32::new(0),
        });

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = runtime.spawn(accept_loop(listener, shared.clone(), shutdown_rx));

        Ok(Self {
            local_addr,
            shared,
            shutdown,
            task: Some(task),
            runtime: runtime.clone(),
        })
    }

    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Clients currently logging in or being configured.
    #[must_use]
    pub fn connecting(&self) -> u32 {
        self.shared.online.load(Ordering::Relaxed)
    }

    /// Stops accepting and closes every open connection. Must not be called from the runtime.
    pub fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        if self.shutdown.send(true).is_err() {
            debug!("accept loop already stopped");
        }

        // The timeout's timer has to be created inside the runtime.
        match self
            .runtime
            .block_on(async { tokio::time::timeout(Duration::from_secs(5), task).await })
        {
            Ok(Ok(())) => info!("Network stopped"),
            Ok(Err(e)) => error!("accept loop failed: {e}"),
            Err(_) => warn!("timed out waiting for the accept loop"),
        }
    }
}

impl Drop for ServerConnection {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[instrument(skip_all)]
async fn accept_loop(
    listener: TcpListener,
    shared: Arc<Shared>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!("stopping accept loop");
                return;
            }
            accepted = listener.accept() => {
                let (stream, addr) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!("accept failed: {e}");
                        continue;
                    }
                };

                debug!("connection from {addr}");

                let io = Io::new(stream, Arc::clone(&shared));
                let mut shutdown = shutdown.clone();

                tokio::spawn(async move {
                    tokio::select! {
                        _ = shutdown.changed() => {}
                        () = print_errors(io.run()) => {}
                    }
                });
            }
        }
    }
}

/// Logs the error a connection ended with instead of tearing anything else down.
async fn print_errors(future: impl Future<Output = anyhow::Result<()>>) {
    if let Err(err) = future.await {
        debug!("connection closed: {err:#}");
    }
}

struct Io {
    stream: TcpStream,
    dec: PacketDecoder,
    enc: PacketEncoder,
    shared: Arc<Shared>,
}

impl Io {
    fn new(stream: TcpStream, shared: Arc<Shared>) -> Self {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("set_nodelay failed: {e}");
        }

        Self {
            stream,
            dec: PacketDecoder::new(),
            enc: PacketEncoder::new(),
            shared,
        }
    }

    async fn recv<P: ServerboundPackets>(&mut self) -> anyhow::Result<P> {
        loop {
            if let Some(frame) = self.dec.try_next_frame()? {
                return P::decode_frame(&frame)
                    .with_context(|| format!("bad packet in the {} phase", P::PROTOCOL));
            }

            let read = self.stream.read_buf(self.dec.buffer_mut()).await?;
            if read == 0 {
                return Err(io::Error::from(ErrorKind::UnexpectedEof).into());
            }
        }
    }

    async fn send<P: Packet>(&mut self, packet: &P) -> anyhow::Result<()> {
        self.enc.append_packet(packet);
        let bytes = self.enc.take();
        self.stream.write_all(&bytes).await?;
        Ok(())
    }

    async fn run(self) -> anyhow::Result<()> {
        tokio::time::timeout(CONNECTION_TIMEOUT, self.process_new_connection())
            .await
            .context("connection timed out")?
    }

    async fn process_new_connection(mut self) -> anyhow::Result<()> {
        let HandshakeC2s {
            protocol_version,
            next_state,
            ..
        } = self.recv().await?;

        match next_state {
            HandshakeNextState::Status if self.shared.settings.enable_status => {
                self.server_status().await
            }
            HandshakeNextState::Status => {
                debug!("status requests are disabled");
                Ok(())
            }
            HandshakeNextState::Login => self.server_login(protocol_version).await,
        }
    }

    async fn server_status(mut self) -> anyhow::Result<()> {
        loop {
            match self.recv::<StatusC2s>().await? {
                StatusC2s::StatusRequest(_) => {
                    let settings = &self.shared.settings;

                    // https://wiki.vg/Server_List_Ping#Response
                    let json = json!({
                        "version": {
                            "name": MINECRAFT_VERSION,
                            "protocol": PROTOCOL_VERSION,
                        },
                        "players": {
                            "online": self.shared.online.load(Ordering::Relaxed),
                            "max": settings.max_players,
                            "sample": [],
                        },
                        "description": { "text": settings.motd },
                        "enforcesSecureChat": false,
                    });

                    self.send(&StatusResponseS2c {
                        json: json.to_string(),
                    })
                    .await?;
                }
                StatusC2s::PingRequest(ping) => {
                    return self
                        .send(&PongResponseS2c {
                            payload: ping.payload,
                        })
                        .await;
                }
            }
        }
    }

    async fn server_login(mut self, protocol_version: i32) -> anyhow::Result<()> {
        if protocol_version != PROTOCOL_VERSION {
            let reason = if protocol_version < PROTOCOL_VERSION {
                format!("Outdated client! Please use {MINECRAFT_VERSION}")
            } else {
                format!("Outdated server! I'm still on {MINECRAFT_VERSION}")
            };

            info!("rejecting client with protocol version {protocol_version}");
            return self
                .send(&LoginDisconnectS2c {
                    reason: text(&reason),
                })
                .await;
        }

        let LoginC2s::Hello(LoginHelloC2s { username, .. }) = self.recv().await? else {
            bail!("expected login hello");
        };

        let uuid = offline_uuid(&username)?;
        self.send(&LoginSuccessS2c {
            uuid,
            username: username.clone(),
        })
        .await?;

        let LoginC2s::Acknowledged(_) = self.recv().await? else {
            bail!("expected login acknowledgement");
        };

        info!("{username} ({uuid}) logged in");

        let mut handler = ConfigurationHandler::new(username, uuid);

        self.shared.online.fetch_add(1, Ordering::Relaxed);
        let result = self.configure(&mut handler).await;
        self.shared.online.fetch_sub(1, Ordering::Relaxed);

        if let Err(e) = &result {
            handler.on_disconnect(&e.to_string());
        }
        result
    }

    async fn configure(&mut self, handler: &mut ConfigurationHandler) -> anyhow::Result<()> {
        let mut brand = BytesMut::new();
        SERVER_BRAND.encode(&mut brand);

        self.send(&CustomPayloadS2c {
            channel: BRAND_CHANNEL.to_owned(),
            data: brand.freeze(),
        })
        .await?;
        self.send(&FinishConfigurationS2c).await?;

        while !handler.is_finished() {
            let packet: ConfigurationC2s = self.recv().await?;
            packet.handle(handler);
        }

        info!("{} finished configuration", handler.username);

        self.send(&play::DisconnectS2c {
            reason: text(PLAY_UNAVAILABLE),
        })
        .await
    }
}
