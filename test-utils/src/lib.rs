//! `test-utils` is used for testing in both `hostlimit-lib` and `hostlimit-bin`.
//! This crate does not depend on `hostlimit-lib` or `hostlimit-bin`, else we would get dependency cycles.
//! Macros are used instead, so that the importer is responsible for providing the dependencies.

/// Create a mock web server, which responds with a predefined status when
/// handling a matching request
#[macro_export]
macro_rules! mock_server {
    ($status:expr $(, $func:tt ($($arg:expr),*))*) => {{
        let mock_server = wiremock::MockServer::start().await;
        let response_template = wiremock::ResponseTemplate::new($status);
        let template = response_template$(.$func($($arg),*))*;
        wiremock::Mock::given(wiremock::matchers::method("GET")).respond_with(template).mount(&mock_server).await;
        mock_server
    }};
}

/// Set up a mock server which fails with `503 Service Unavailable` for the
/// first `$failures` requests and answers `200 OK` afterwards.
#[macro_export]
macro_rules! flaky_mock_server {
    ($failures:expr) => {{
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .up_to_n_times($failures)
            .with_priority(1)
            .mount(&mock_server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .with_priority(2)
            .mount(&mock_server)
            .await;
        mock_server
    }};
}

/// Gets the "main" binary name (e.g. `hostlimit`)
#[macro_export]
macro_rules! main_command {
    () => {
        assert_cmd::Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .expect("Couldn't get cargo package name")
    };
}
