use httpwire::http::{ParseState, Request};

#[test]
fn test_new_request_is_initialized() {
    let req = Request::new();

    assert_eq!(req.state(), ParseState::Initialized);
    assert!(!req.is_done());
    assert!(req.headers.is_empty());
    assert!(req.body.is_empty());
    assert_eq!(req.method(), "");
}

#[test]
fn test_request_header_retrieval() {
    let mut req = Request::new();
    req.parse(b"GET / HTTP/1.1\r\nHost: example.com\r\nContent-Type: application/json\r\n\r\n")
        .unwrap();

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_state_advances_per_piece() {
    let mut req = Request::new();

    req.parse(b"PUT /items/1 HTTP/1.1\r\n").unwrap();
    assert_eq!(req.state(), ParseState::ParsingHeaders);
    assert_eq!(req.target(), "/items/1");

    req.parse(b"Content-Length: 2\r\n\r\n").unwrap();
    assert_eq!(req.state(), ParseState::ParsingBody);

    req.parse(b"ok").unwrap();
    assert_eq!(req.state(), ParseState::Done);
    assert_eq!(req.body, b"ok".to_vec());
}

#[test]
fn test_default_matches_new() {
    let req = Request::default();
    assert_eq!(req.state(), ParseState::Initialized);
}
