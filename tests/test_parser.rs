use httplet::http::parser::{DecodeError, RequestDecoder, DEFAULT_MAX_LINE_LENGTH};
use httplet::http::request::Method;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

async fn decode_all(raw: &[u8], capacity: usize) -> Result<(Method, String, u64), DecodeError> {
    let mut reader = BufReader::with_capacity(capacity, raw);
    let req = RequestDecoder::new(DEFAULT_MAX_LINE_LENGTH)
        .decode(&mut reader)
        .await?;
    Ok((req.method, req.path.clone(), req.content_length))
}

#[tokio::test]
async fn test_parse_minimal_get() {
    let raw: &[u8] = b"GET /x HTTP/1.1\n\n";
    let mut reader = BufReader::new(raw);
    let req = RequestDecoder::new(DEFAULT_MAX_LINE_LENGTH)
        .decode(&mut reader)
        .await
        .unwrap();

    assert_eq!(req.method, Method::GET);
    assert_eq!(req.path, "/x");
    assert_eq!(req.version, "HTTP/1.1");
    assert_eq!(req.content_length, 0);
    assert_eq!(req.header("Content-Length"), Some("0"));
}

#[tokio::test]
async fn test_parse_crlf_request_with_headers() {
    let raw: &[u8] = b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let mut reader = BufReader::new(raw);
    let req = RequestDecoder::new(DEFAULT_MAX_LINE_LENGTH)
        .decode(&mut reader)
        .await
        .unwrap();

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("User-Agent"), Some("test-client"));
    assert_eq!(req.header("Accept"), Some("*/*"));
}

#[tokio::test]
async fn test_parse_across_fragmented_reads() {
    let raw = b"POST /api/items HTTP/1.1\nHost: example.com\nContent-Length: 5\n\nhello";

    for capacity in [1, 2, 3, 7, 64] {
        let (method, path, len) = decode_all(raw, capacity).await.unwrap();
        assert_eq!(method, Method::POST, "capacity {capacity}");
        assert_eq!(path, "/api/items");
        assert_eq!(len, 5);
    }
}

#[tokio::test]
async fn test_parse_path_and_query() {
    let raw: &[u8] = b"GET /search?q=rust HTTP/1.1\n\n";
    let mut reader = BufReader::new(raw);
    let req = RequestDecoder::new(DEFAULT_MAX_LINE_LENGTH)
        .decode(&mut reader)
        .await
        .unwrap();

    assert_eq!(req.target, "/search?q=rust");
    assert_eq!(req.path, "/search");
    assert_eq!(req.query.as_deref(), Some("q=rust"));
}

#[tokio::test]
async fn test_post_without_content_length_fails() {
    let result = decode_all(b"POST /api HTTP/1.1\nHost: localhost\n\n", 16).await;
    assert!(matches!(result, Err(DecodeError::MissingContentLength)));

    let (method, _, len) = decode_all(b"GET /api HTTP/1.1\nHost: localhost\n\n", 16)
        .await
        .unwrap();
    assert_eq!(method, Method::GET);
    assert_eq!(len, 0);
}

#[tokio::test]
async fn test_non_numeric_content_length_fails() {
    let result = decode_all(b"POST /api HTTP/1.1\nContent-Length: abc\n\n", 16).await;
    assert!(matches!(result, Err(DecodeError::InvalidContentLength(v)) if v == "abc"));

    let result = decode_all(b"POST /api HTTP/1.1\nContent-Length: -1\n\n", 16).await;
    assert!(matches!(result, Err(DecodeError::InvalidContentLength(_))));
}

#[tokio::test]
async fn test_content_length_lookup_ignores_case() {
    let (_, _, len) = decode_all(b"POST /api HTTP/1.1\ncontent-length: 3\n\nabc", 16)
        .await
        .unwrap();
    assert_eq!(len, 3);

    let raw: &[u8] = b"POST /api HTTP/1.1\ncOnTeNt-LeNgTh: 2\n\nhi";
    let mut reader = BufReader::new(raw);
    let req = RequestDecoder::new(DEFAULT_MAX_LINE_LENGTH)
        .decode(&mut reader)
        .await
        .unwrap();
    assert_eq!(req.header("Content-Length"), Some("2"));
    assert_eq!(req.header("cOnTeNt-LeNgTh"), None);
}

#[tokio::test]
async fn test_malformed_request_lines() {
    let cases: [&[u8]; 6] = [
        b"GET /\n\n",
        b"PUT / HTTP/1.1\n\n",
        b"get / HTTP/1.1\n\n",
        b"GET / HTTP/1.0\n\n",
        b"GET / HTTP/1.1 extra\n\n",
        b"GET  / HTTP/1.1\n\n",
    ];

    for raw in cases {
        let result = decode_all(raw, 16).await;
        assert!(
            matches!(result, Err(DecodeError::MalformedRequestLine(_))),
            "{:?} gave {:?}",
            String::from_utf8_lossy(raw),
            result
        );
    }
}

#[tokio::test]
async fn test_invalid_targets() {
    let cases: [&[u8]; 7] = [
        b"GET http://example.com/ HTTP/1.1\n\n",
        b"GET relative/path HTTP/1.1\n\n",
        b"GET //example.com/x HTTP/1.1\n\n",
        b"GET /\\example.com/x HTTP/1.1\n\n",
        b"GET /%zz HTTP/1.1\n\n",
        b"GET /a%2 HTTP/1.1\n\n",
        b"GET /%ff HTTP/1.1\n\n",
    ];

    for raw in cases {
        let result = decode_all(raw, 16).await;
        assert!(
            matches!(result, Err(DecodeError::InvalidTarget(_))),
            "{:?} gave {:?}",
            String::from_utf8_lossy(raw),
            result
        );
    }
}

#[tokio::test]
async fn test_path_is_percent_decoded_as_sent() {
    let cases = [
        ("/a%20b", "/a b"),
        ("/{id}", "/{id}"),
        ("/a/../b", "/a/../b"),
        ("/./x", "/./x"),
        ("/caf%C3%A9", "/caf\u{e9}"),
        ("/a+b", "/a+b"),
        ("/a%2Fb?x=%20", "/a/b"),
    ];

    for (target, path) in cases {
        let raw = format!("GET {target} HTTP/1.1\n\n");
        let (_, decoded, _) = decode_all(raw.as_bytes(), 16).await.unwrap();
        assert_eq!(decoded, path, "target {target}");
    }
}

#[tokio::test]
async fn test_query_is_kept_raw() {
    let raw: &[u8] = b"GET /s%20p?q=a%20b&x HTTP/1.1\n\n";
    let mut reader = BufReader::new(raw);
    let req = RequestDecoder::new(DEFAULT_MAX_LINE_LENGTH)
        .decode(&mut reader)
        .await
        .unwrap();

    assert_eq!(req.target, "/s%20p?q=a%20b&x");
    assert_eq!(req.path, "/s p");
    assert_eq!(req.query.as_deref(), Some("q=a%20b&x"));
}

#[tokio::test]
async fn test_conflicting_content_lengths_fail() {
    let raw = b"POST /a HTTP/1.1\nContent-Length: 5\ncontent-length: 0\n\nhello";

    // Same answer every time, whatever the header map's iteration order.
    for _ in 0..50 {
        let result = decode_all(raw, 16).await;
        assert!(matches!(result, Err(DecodeError::InvalidContentLength(_))));
    }

    let swapped = b"POST /a HTTP/1.1\ncontent-length: 0\nContent-Length: 5\n\nhello";
    let result = decode_all(swapped, 16).await;
    assert!(matches!(result, Err(DecodeError::InvalidContentLength(_))));
}

#[tokio::test]
async fn test_repeated_equal_content_length_is_accepted() {
    let raw: &[u8] = b"POST /a HTTP/1.1\nContent-Length: 3\nCONTENT-LENGTH: 3\n\nabc";
    let mut reader = BufReader::new(raw);
    let mut req = RequestDecoder::new(DEFAULT_MAX_LINE_LENGTH)
        .decode(&mut reader)
        .await
        .unwrap();

    assert_eq!(req.content_length, 3);
    assert_eq!(req.header("Content-Length"), Some("3"));
    assert_eq!(req.headers.len(), 1);
    assert_eq!(req.body.bytes().await.unwrap(), b"abc");
}

#[tokio::test]
async fn test_malformed_header() {
    let result = decode_all(b"GET / HTTP/1.1\nBrokenHeader\n\n", 16).await;
    assert!(matches!(result, Err(DecodeError::MalformedHeader(_))));

    let result = decode_all(b"GET / HTTP/1.1\nHost:no-space\n\n", 16).await;
    assert!(matches!(result, Err(DecodeError::MalformedHeader(_))));
}

#[tokio::test]
async fn test_empty_stream_is_clean_close() {
    let result = decode_all(b"", 16).await;
    assert!(matches!(result, Err(DecodeError::CleanClose)));
}

#[tokio::test]
async fn test_eof_inside_headers_is_read_error() {
    let result = decode_all(b"GET / HTTP/1.1\nHost: a\n", 16).await;
    assert!(matches!(result, Err(DecodeError::TransportRead(_))));

    let result = decode_all(b"GET / HTT", 16).await;
    assert!(matches!(result, Err(DecodeError::TransportRead(_))));
}

#[tokio::test]
async fn test_line_too_long() {
    let mut raw = b"GET /".to_vec();
    raw.extend(std::iter::repeat_n(b'a', 100));
    raw.extend_from_slice(b" HTTP/1.1\n\n");

    let mut reader = BufReader::with_capacity(8, &raw[..]);
    let result = RequestDecoder::new(32).decode(&mut reader).await;
    assert!(matches!(result, Err(DecodeError::LineTooLong(32))));
}

#[tokio::test]
async fn test_body_never_reads_past_content_length() {
    let raw: &[u8] = b"POST /echo HTTP/1.1\nContent-Length: 5\n\nhelloGET /next HTTP/1.1\n\n";
    let mut reader = BufReader::with_capacity(4, raw);

    {
        let mut req = RequestDecoder::new(DEFAULT_MAX_LINE_LENGTH)
            .decode(&mut reader)
            .await
            .unwrap();
        assert_eq!(req.body.remaining(), 5);

        let mut body = Vec::new();
        req.body.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"hello");
        assert_eq!(req.body.remaining(), 0);
    }

    let next = RequestDecoder::new(DEFAULT_MAX_LINE_LENGTH)
        .decode(&mut reader)
        .await
        .unwrap();
    assert_eq!(next.path, "/next");
}

#[tokio::test]
async fn test_drain_skips_unread_body() {
    let raw: &[u8] = b"POST /a HTTP/1.1\nContent-Length: 4\n\n\x00\x01\x02\x03rest";
    let mut reader = BufReader::new(raw);

    {
        let mut req = RequestDecoder::new(DEFAULT_MAX_LINE_LENGTH)
            .decode(&mut reader)
            .await
            .unwrap();
        assert_eq!(req.body.drain().await.unwrap(), 4);
    }

    let mut rest = String::new();
    reader.read_line(&mut rest).await.unwrap();
    assert_eq!(rest, "rest");
}
