use httpwire::http::Error;
use httpwire::http::headers::Headers;
use proptest::prelude::*;

fn parse_all(headers: &mut Headers, data: &[u8]) -> usize {
    let mut total = 0;
    loop {
        let (n, done) = headers.parse(&data[total..]).unwrap();
        total += n;
        if done || n == 0 {
            return total;
        }
    }
}

#[test]
fn test_valid_single_header() {
    let mut headers = Headers::new();
    let data = b"Host: localhost:42069\r\n\r\n";

    let (n, done) = headers.parse(data).unwrap();

    assert_eq!(headers.get("Host").unwrap(), "localhost:42069");
    assert_eq!(n, 23);
    assert!(!done);
}

#[test]
fn test_surrounding_whitespace_is_trimmed() {
    let mut headers = Headers::new();
    let data = b" Host: localhost:42069  \r\n  gUest: freakonaleash69\r\n\r\n";

    let (n, done) = headers.parse(data).unwrap();
    assert_eq!((n, done), (26, false));
    let (n2, done) = headers.parse(&data[n..]).unwrap();
    assert_eq!((n2, done), (26, false));
    let (n3, done) = headers.parse(&data[n + n2..]).unwrap();
    assert_eq!((n3, done), (2, true));

    assert_eq!(headers.get("host").unwrap(), "localhost:42069");
    assert_eq!(headers.get("GUEST").unwrap(), "freakonaleash69");
}

#[test]
fn test_names_are_stored_lowercase() {
    let mut headers = Headers::new();
    headers.parse(b"Content-Type: text/html\r\n").unwrap();

    let names: Vec<&str> = headers.iter().map(|(k, _)| k).collect();
    assert_eq!(names, vec!["content-type"]);
}

#[test]
fn test_space_before_colon_is_rejected() {
    let mut headers = Headers::new();
    let err = headers
        .parse(b"       Host : localhost:42069       \r\n\r\n")
        .unwrap_err();

    assert!(matches!(err, Error::TrailingWhitespaceInName(_)));
    assert!(headers.is_empty());
}

#[test]
fn test_name_whitespace_error_for_simple_line() {
    let mut headers = Headers::new();
    let err = headers.parse(b"Name : value\r\n").unwrap_err();
    assert!(matches!(err, Error::TrailingWhitespaceInName(_)));
}

#[test]
fn test_vertical_tab_before_colon_is_trailing_whitespace() {
    let mut headers = Headers::new();
    let err = headers.parse(b"Host\x0b: x\r\n").unwrap_err();
    assert!(matches!(err, Error::TrailingWhitespaceInName(_)));
}

#[test]
fn test_vertical_tab_is_trimmed_around_name_and_value() {
    let mut headers = Headers::new();
    let (n, done) = headers.parse(b"\x0bHost:\x0b localhost \x0b\r\n").unwrap();

    assert_eq!((n, done), (21, false));
    assert_eq!(headers.get("host").unwrap(), "localhost");
}

#[test]
fn test_missing_colon_is_rejected() {
    let mut headers = Headers::new();
    let err = headers.parse(b"BrokenHeader\r\n\r\n").unwrap_err();
    assert!(matches!(err, Error::MalformedHeaderLine(_)));
}

#[test]
fn test_invalid_character_in_name() {
    let mut headers = Headers::new();
    let err = headers.parse(b"H\xc2\xa9st: localhost\r\n\r\n").unwrap_err();
    assert!(matches!(err, Error::InvalidFieldName(_)));

    let err = headers.parse(b"Ho(st: localhost\r\n\r\n").unwrap_err();
    assert!(matches!(err, Error::InvalidFieldName(_)));
}

#[test]
fn test_existing_entries_are_kept() {
    let mut headers = Headers::new();
    headers.add_header("billy", "bob");
    headers.add_header("frank", "joke");

    parse_all(&mut headers, b" Host: localhost:42069  \r\n  gUest: freakonaleash69\r\n\r\n");

    assert_eq!(headers.get("billy").unwrap(), "bob");
    assert_eq!(headers.get("frank").unwrap(), "joke");
    assert_eq!(headers.get("host").unwrap(), "localhost:42069");
    assert_eq!(headers.len(), 4);
}

#[test]
fn test_repeated_fields_merge_case_insensitively() {
    let mut headers = Headers::new();
    parse_all(&mut headers, b"Host: a\r\nAccept: */*\r\nhOST: b\r\n\r\n");

    assert_eq!(headers.get("host").unwrap(), "a, b");
    let entries: Vec<(&str, &str)> = headers.iter().collect();
    assert_eq!(entries, vec![("host", "a, b"), ("accept", "*/*")]);
}

#[test]
fn test_get_missing_field() {
    let headers = Headers::new();
    let err = headers.get("X-Missing").unwrap_err();
    assert!(matches!(err, Error::FieldNotPresent(name) if name == "X-Missing"));
}

#[test]
fn test_add_header_replaces_in_place() {
    let mut headers = Headers::new();
    headers.add_header("Content-Type", "text/plain");
    headers.add_header("Connection", "close");
    headers.set_content_type("text/html");

    let entries: Vec<(&str, &str)> = headers.iter().collect();
    assert_eq!(
        entries,
        vec![("Content-Type", "text/html"), ("Connection", "close")]
    );
}

#[test]
fn test_add_trailers_declares_names() {
    let mut headers = Headers::new();
    headers.add_trailers(&["X-Content-SHA256", "X-Content-Length"]);

    assert_eq!(
        headers.get("trailer").unwrap(),
        "X-Content-SHA256, X-Content-Length"
    );
}

#[test]
fn test_to_bytes_keeps_insertion_order() {
    let mut headers = Headers::new();
    headers.add_header("B", "2");
    headers.add_header("A", "1");

    assert_eq!(headers.to_bytes(), b"B: 2\r\nA: 1\r\n\r\n".to_vec());
}

fn field_line() -> impl Strategy<Value = (String, String)> {
    (
        proptest::string::string_regex("[A-Za-z0-9!#$%&'*+.^_`|~-]{1,12}").unwrap(),
        proptest::string::string_regex("[a-z0-9 /:;,=]{0,16}").unwrap(),
    )
}

proptest! {
    #[test]
    fn byte_at_a_time_matches_whole_block(
        lines in proptest::collection::vec(field_line(), 0..8),
    ) {
        let mut block = String::new();
        for (name, value) in &lines {
            block.push_str(&format!("{name}: {value}\r\n"));
        }
        block.push_str("\r\n");
        let bytes = block.as_bytes();

        let mut whole = Headers::new();
        let consumed = parse_all(&mut whole, bytes);
        prop_assert_eq!(consumed, bytes.len());

        // Feed one byte at a time, keeping the unconsumed tail like the
        // connection's read buffer does.
        let mut incremental = Headers::new();
        let mut pending: Vec<u8> = Vec::new();
        let mut done = false;
        for &b in bytes {
            pending.push(b);
            loop {
                let (n, finished) = incremental.parse(&pending).unwrap();
                pending.drain(..n);
                if finished {
                    done = true;
                }
                if n == 0 || finished {
                    break;
                }
            }
        }

        prop_assert!(done);
        prop_assert!(pending.is_empty());
        prop_assert_eq!(incremental, whole);
    }
}
