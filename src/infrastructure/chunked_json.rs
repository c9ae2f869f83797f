// Chunked newline-delimited JSON streaming
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::{Stream, StreamExt};
use serde::Serialize;

/// One JSON document per line, flushed as each item arrives.
pub fn ndjson_stream<S, T>(stream: S) -> Response<Body>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + 'static,
{
    let byte_stream = stream.map(|item| serialize_line(&item));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(byte_stream));

    match response {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Stream response build error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn serialize_line<T: Serialize>(item: &T) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_vec(item)?;
    let mut line = BytesMut::with_capacity(json.len() + 1);
    line.put_slice(&json);
    line.put_u8(b'\n');
    Ok(line.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_lines_in_order() {
        let items = futures::stream::iter(vec![json!({"type": "skeleton"}), json!({"type": "complete"})]);
        let response = ndjson_stream(items);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/x-ndjson");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"{\"type\":\"skeleton\"}\n{\"type\":\"complete\"}\n");
    }
}
