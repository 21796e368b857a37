use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};

use zipdis::connection::Connection;
use zipdis::frame::Frame;

async fn create_tcp_connection() -> Result<(UnboundedSender<Vec<u8>>, TcpStream), std::io::Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let local_addr = listener.local_addr()?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            while let Some(data) = rx.recv().await {
                // Write the received channel data to the socket.
                if socket.write_all(&data).await.is_err() {
                    break;
                }
            }
        }
    });

    // Connect to the server as a client to complete the setup.
    let stream = TcpStream::connect(local_addr).await?;

    Ok((tx, stream))
}

#[tokio::test]
async fn test_parse_single_frames() {
    let (tcp_stream_tx, tcp_stream) = create_tcp_connection().await.unwrap();
    let mut connection = Connection::new(tcp_stream);

    tcp_stream_tx.send(b"+OK\r\n".to_vec()).unwrap();
    tcp_stream_tx.send(b"-Error message\r\n".to_vec()).unwrap();
    tcp_stream_tx.send(b":1000\r\n".to_vec()).unwrap();
    tcp_stream_tx.send(b"$5\r\nhello\r\n".to_vec()).unwrap();
    tcp_stream_tx.send(b"$-1\r\n".to_vec()).unwrap();

    let expected = [
        Frame::Simple("OK".to_string()),
        Frame::Error("Error message".to_string()),
        Frame::Integer(1000),
        Frame::Bulk(Bytes::from("hello")),
        Frame::Null,
    ];
    for expected in expected {
        let actual = connection.read_frame().await.unwrap();
        assert_eq!(actual, Some(expected));
    }
}

#[tokio::test]
async fn test_parse_multiple_commands_sequentially() {
    let (tcp_stream_tx, tcp_stream) = create_tcp_connection().await.unwrap();
    let mut connection = Connection::new(tcp_stream);

    let array_1 = b"*3\r\n$5\r\nRPUSH\r\n$6\r\nmylist\r\n$1\r\na\r\n";
    let array_2 = b"*2\r\n$4\r\nLLEN\r\n$6\r\nmylist\r\n";

    // Both commands arrive in a single write.
    tcp_stream_tx
        .send([&array_1[..], &array_2[..]].concat())
        .unwrap();

    let actual = connection.read_frame().await.unwrap();
    let expected = Some(Frame::Array(vec![
        Frame::Bulk(Bytes::from("RPUSH")),
        Frame::Bulk(Bytes::from("mylist")),
        Frame::Bulk(Bytes::from("a")),
    ]));
    assert_eq!(actual, expected);

    let actual = connection.read_frame().await.unwrap();
    let expected = Some(Frame::Array(vec![
        Frame::Bulk(Bytes::from("LLEN")),
        Frame::Bulk(Bytes::from("mylist")),
    ]));
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_parse_incomplete_frame() {
    let (tcp_stream_tx, tcp_stream) = create_tcp_connection().await.unwrap();
    let mut connection = Connection::new(tcp_stream);

    // Command split into three parts to simulate partial/incomplete data sending. The split
    // points fall inside a bulk payload that itself contains CRLF.
    let part1 = b"*3\r\n$5\r\nRPU";
    let part2 = b"SH\r\n$6\r\nmylist\r\n$7\r\nmy\r";
    let part3 = b"\nval\r\n";

    tokio::spawn(async move {
        let parts = vec![part1.to_vec(), part2.to_vec(), part3.to_vec()];
        for part in parts {
            tcp_stream_tx.send(part).unwrap();
            // Simulate a delay in sending/receiving the data.
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
    });

    let actual = connection.read_frame().await.unwrap();
    let expected = Some(Frame::Array(vec![
        Frame::Bulk(Bytes::from("RPUSH")),
        Frame::Bulk(Bytes::from("mylist")),
        Frame::Bulk(Bytes::from("my\r\nval")),
    ]));
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_closed_connection() {
    let (tcp_stream_tx, tcp_stream) = create_tcp_connection().await.unwrap();
    let mut connection = Connection::new(tcp_stream);

    tcp_stream_tx.send(b"+OK\r\n".to_vec()).unwrap();
    drop(tcp_stream_tx);

    let actual = connection.read_frame().await.unwrap();
    assert_eq!(actual, Some(Frame::Simple("OK".to_string())));

    assert_eq!(connection.read_frame().await.unwrap(), None);
}

#[tokio::test]
async fn test_write_frame() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let local_addr = listener.local_addr().unwrap();

    let reader = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = vec![];
        socket.read_to_end(&mut received).await.unwrap();
        received
    });

    let stream = TcpStream::connect(local_addr).await.unwrap();
    let mut connection = Connection::new(stream);
    connection
        .write_frame(Frame::Array(vec![
            Frame::Integer(2),
            Frame::Bulk(Bytes::from("two")),
        ]))
        .await
        .unwrap();
    drop(connection);

    let received = reader.await.unwrap();
    assert_eq!(received, b"*2\r\n:2\r\n$3\r\ntwo\r\n".to_vec());
}
