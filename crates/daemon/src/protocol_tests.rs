use super::*;
use brummer_core::CoderId;
use std::io::Cursor;

#[tokio::test]
async fn write_then_read_message_round_trips() {
    let mut buf = Vec::new();
    write_message(&mut buf, b"hello").await.unwrap();

    let mut cursor = Cursor::new(buf);
    let payload = read_message(&mut cursor).await.unwrap();
    assert_eq!(payload, b"hello");
}

#[tokio::test]
async fn read_message_on_empty_stream_reports_connection_closed() {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn read_message_rejects_oversized_length_prefix() {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(MAX_MESSAGE_SIZE + 1).to_be_bytes());
    let mut cursor = Cursor::new(buf);

    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge(_, _)));
}

#[tokio::test]
async fn request_round_trips_through_encode_and_message_framing() {
    let request = Request::GetCoder(CoderId::new("abc"));
    let mut buf = Vec::new();
    write_message(&mut buf, &encode(&request).unwrap()).await.unwrap();

    let mut cursor = Cursor::new(buf);
    let payload = read_message(&mut cursor).await.unwrap();
    let decoded: Request = decode(&payload).unwrap();
    assert!(matches!(decoded, Request::GetCoder(id) if id == CoderId::new("abc")));
}

#[tokio::test]
async fn response_round_trips_through_encode_and_message_framing() {
    let response = Response::Error("boom".to_string());
    let mut buf = Vec::new();
    write_response(&mut buf, &response).await.unwrap();

    let mut cursor = Cursor::new(buf);
    let payload = read_message(&mut cursor).await.unwrap();
    let decoded: Response = decode(&payload).unwrap();
    assert!(matches!(decoded, Response::Error(message) if message == "boom"));
}

#[tokio::test]
async fn read_request_decodes_a_ping() {
    let mut buf = Vec::new();
    write_message(&mut buf, &encode(&Request::Ping).unwrap()).await.unwrap();
    let mut cursor = Cursor::new(buf);
    let decoded = read_request(&mut cursor).await.unwrap();
    assert!(matches!(decoded, Request::Ping));
}
