use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use uuid::Uuid;

use crate::codec::FrameCodec;
use crate::config::Config;
use crate::frame::Frame;
use crate::Error;

/// A client connection, reading and writing whole frames. Partial reads stay buffered inside the
/// framed stream until a frame completes.
pub struct Connection {
    pub id: Uuid,
    frames: Framed<TcpStream, FrameCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        Connection::with_config(stream, &Config::default())
    }

    pub fn with_config(stream: TcpStream, config: &Config) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            frames: Framed::new(stream, FrameCodec::new(config.max_frame_size)),
        }
    }

    /// Returns `None` once the peer closed the connection.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        self.frames.next().await.transpose()
    }

    pub async fn write_frame(&mut self, frame: Frame) -> Result<(), Error> {
        self.frames.send(frame).await
    }
}
