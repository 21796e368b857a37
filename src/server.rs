use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, instrument};

use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::config::Config;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind(("127.0.0.1", config.port)).await?;

    serve(listener, config).await
}

/// Accepts connections on an already bound listener, one task per client, all sharing one store.
pub async fn serve(listener: TcpListener, config: Config) -> Result<(), Error> {
    let store = Store::new();

    info!("Redis server listening on {}", listener.local_addr()?);

    loop {
        let (socket, client_address) = listener.accept().await?;
        let store = store.clone();
        let config = config.clone();
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, store, config).await {
                error!("Connection error: {}", e);
            }
        });
    }
}

#[instrument(
    name = "connection",
    skip(stream, store, config),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: Store,
    config: Config,
) -> Result<(), Error> {
    let mut conn = Connection::with_config(stream, &config);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    while let Some(frame) = conn.read_frame().await? {
        debug!("Received frame from client: {}", frame);

        // Command errors are reported to the client, the connection stays open.
        let res = match Command::try_from(frame).and_then(|cmd| cmd.exec(store.clone())) {
            Ok(res) => res,
            Err(e) => {
                info!("Command failed: {}", e);
                Frame::Error(format!("ERR {}", e))
            }
        };

        debug!("Sending response to client: {}", res);
        conn.write_frame(res).await?;
    }

    info!("Connection closed");
    Ok(())
}
