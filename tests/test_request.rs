use localserve::http::request::{Method, Request};

fn request(raw_path: &str) -> Request {
    Request {
        method: Method::GET,
        raw_path: raw_path.to_string(),
        version: Some("HTTP/1.1".to_string()),
    }
}

#[test]
fn test_method_parse_known_methods() {
    assert_eq!(Method::parse("GET"), Method::GET);
    assert_eq!(Method::parse("POST"), Method::POST);
    assert_eq!(Method::parse("PUT"), Method::PUT);
    assert_eq!(Method::parse("DELETE"), Method::DELETE);
    assert_eq!(Method::parse("HEAD"), Method::HEAD);
    assert_eq!(Method::parse("OPTIONS"), Method::OPTIONS);
    assert_eq!(Method::parse("PATCH"), Method::PATCH);
}

#[test]
fn test_method_parse_is_case_sensitive() {
    assert_eq!(Method::parse("Get"), Method::Other("Get".to_string()));
}

#[test]
fn test_method_as_str_round_trips_token() {
    assert_eq!(Method::parse("BREW").as_str(), "BREW");
    assert_eq!(Method::HEAD.as_str(), "HEAD");
}

#[test]
fn test_request_path_without_query() {
    let req = request("/index.html?screen=1&speed=2");
    assert_eq!(req.path(), "/index.html");
}

#[test]
fn test_request_without_query() {
    let req = request("/app.js");
    assert_eq!(req.path(), "/app.js");
}

#[test]
fn test_request_empty_query() {
    let req = request("/?");
    assert_eq!(req.path(), "/");
}
