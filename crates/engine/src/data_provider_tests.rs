use super::*;
use chrono::Utc;

fn error(message: &str, process: &str) -> ErrorContext {
    ErrorContext {
        error_type: "RuntimeError".into(),
        severity: "error".into(),
        process: process.into(),
        time: Utc::now(),
        message: message.into(),
        stack: vec!["at foo (foo.js:1:1)".into()],
        context_lines: vec![],
    }
}

#[test]
fn last_error_returns_most_recently_pushed() {
    let provider = InMemoryDataProvider::new();
    provider.push_error(error("first failure", "web"));
    provider.push_error(error("second failure", "web"));

    let last = provider.get_last_error().unwrap();
    assert_eq!(last.message, "second failure");
}

#[test]
fn recent_logs_returns_last_n_in_chronological_order() {
    let provider = InMemoryDataProvider::new();
    for i in 0..5 {
        provider.push_log(LogEntry {
            process: "web".into(),
            time: Utc::now(),
            line: format!("line {i}"),
        });
    }

    let recent = provider.get_recent_logs(2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].line, "line 3");
    assert_eq!(recent[1].line, "line 4");
}

#[test]
fn test_failures_filters_by_test_keywords() {
    let provider = InMemoryDataProvider::new();
    provider.push_error(error("connection refused", "web"));
    provider.push_error(error("pytest failed: test_login", "web"));

    let failures = provider.get_test_failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].message.contains("pytest"));
}

#[test]
fn build_output_filters_by_build_keywords() {
    let provider = InMemoryDataProvider::new();
    provider.push_log(LogEntry {
        process: "web".into(),
        time: Utc::now(),
        line: "listening on port 3000".into(),
    });
    provider.push_log(LogEntry {
        process: "web".into(),
        time: Utc::now(),
        line: "webpack compiled successfully".into(),
    });

    let output = provider.get_build_output();
    assert_eq!(output, vec!["webpack compiled successfully".to_string()]);
}

#[test]
fn matches_any_keyword_is_case_insensitive() {
    assert!(matches_any_keyword("BUILD FAILED", BUILD_KEYWORDS));
    assert!(!matches_any_keyword("all quiet", BUILD_KEYWORDS));
}

#[test]
fn detected_urls_and_proxy_requests_round_trip() {
    let provider = InMemoryDataProvider::new();
    provider.push_url(UrlEntry {
        url: "http://localhost:3000".into(),
        proxy_url: "http://localhost:8080/proxy/3000".into(),
        process_name: "web".into(),
    });
    provider.push_proxy_request(ProxyRequestEntry {
        method: "GET".into(),
        url: "/api/health".into(),
        status: 200,
        duration_ms: 12,
        time: Utc::now(),
        host: "localhost:8080".into(),
        path: "/api/health".into(),
        error: None,
        process: Some("web".into()),
    });

    assert_eq!(provider.get_detected_urls().len(), 1);
    assert_eq!(provider.get_recent_proxy_requests(10).len(), 1);
}

#[test]
fn format_error_context_includes_all_fields() {
    let injector = DataInjector::default();
    let text = injector.format_error_context(&error("boom", "web"));
    assert!(text.contains("Type: RuntimeError"));
    assert!(text.contains("Process: web"));
    assert!(text.contains("Message: boom"));
    assert!(text.contains("at foo"));
}

#[test]
fn truncate_caps_line_count_and_appends_ellipsis() {
    let injector = DataInjector {
        max_lines: 3,
        max_chars: 2000,
    };
    let lines: Vec<String> = (0..10).map(|i| format!("line {i}")).collect();
    let text = injector.format_build_output(&lines);
    assert!(text.contains("line 0"));
    assert!(text.contains("line 2"));
    assert!(!text.contains("line 9"));
    assert!(text.ends_with("..."));
}

#[test]
fn truncate_caps_char_count() {
    let injector = DataInjector {
        max_lines: 1000,
        max_chars: 20,
    };
    let text = injector.format_system_message(&"x".repeat(100));
    assert!(text.len() <= 23);
    assert!(text.ends_with("..."));
}

#[test]
fn format_detected_urls_uses_arrow_separator() {
    let injector = DataInjector::default();
    let text = injector.format_detected_urls(&[UrlEntry {
        url: "http://localhost:3000".into(),
        proxy_url: "http://localhost:8080/proxy/3000".into(),
        process_name: "web".into(),
    }]);
    assert!(text.contains("http://localhost:3000"));
    assert!(text.contains("web"));
}

#[test]
fn inject_label_as_str_matches_banner_labels() {
    assert_eq!(InjectLabel::LastError.as_str(), "LAST ERROR");
    assert_eq!(InjectLabel::TestFailure.as_str(), "TEST FAILURE");
    assert_eq!(InjectLabel::BuildOutput.as_str(), "BUILD OUTPUT");
}
