use internment::Intern;
use native_event_bridge::*;
use pretty_assertions::assert_eq;
use test_log::test;
use tokio_stream::StreamExt;
use tokio_util::codec::FramedRead;

const CFG: &str = "test_resources/fixtures/config.yaml";
const EVENTS: &str = "test_resources/fixtures/events.ndjson";

#[test]
fn fixture_config() {
    let cfg_str = std::fs::read_to_string(CFG).unwrap();
    let cfg = Config::from_yaml(&cfg_str).unwrap();
    assert_eq!(cfg.dsn, "https://public@errors.example.com/42");
    assert_eq!(cfg.log_level, DiagnosticLevel::Info);
    assert_eq!(
        cfg.options,
        SdkOptions {
            debug: true,
            environment: Some("staging".to_owned()),
            release: Some("com.example.app@1.4.0+17".to_owned()),
            dist: Some("17".to_owned()),
            enable_native_crash_handling: false,
        }
    );
}

#[test]
fn fixture_events_sync() {
    let normalizer = EventNormalizer::new();
    let contents = std::fs::read_to_string(EVENTS).unwrap();
    let events: Vec<NormalizedEvent> = contents
        .lines()
        .filter_map(|l| normalizer.parse_line(l).unwrap())
        .collect();
    check_events(events);
}

#[test(tokio::test)]
async fn fixture_events_async() {
    let stream = tokio::fs::File::open(EVENTS).await.unwrap();
    let mut reader = FramedRead::new(stream, EventDecoder::default());

    let mut events = Vec::new();
    while let Some(event) = reader.next().await {
        events.push(event.unwrap());
    }
    check_events(events);
}

#[test(tokio::test)]
async fn oversized_line_is_an_error() {
    let stream = tokio::fs::File::open(EVENTS).await.unwrap();
    let decoder = EventDecoder::default().with_max_line_bytes(64);
    let mut reader = FramedRead::new(stream, decoder);

    let res = reader.next().await.unwrap();
    assert!(matches!(res, Err(Error::LineTooLong { limit: 64, .. })));
}

fn check_events(events: Vec<NormalizedEvent>) {
    assert_eq!(events.len(), 3);
    check_unhandled_rejection(&events[0]);

    let checkout = &events[1];
    assert_eq!(checkout.id, None);
    assert_eq!(checkout.level, Level::Info);
    assert_eq!(
        checkout.message.as_deref(),
        Some(r#"{"message":"checkout started","params":[2]}"#)
    );
    assert_eq!(checkout.release, None);
    assert_eq!(checkout.exception, None);

    let broken = &events[2];
    assert_eq!(
        broken,
        &NormalizedEvent {
            level: Level::Error,
            ..Default::default()
        }
    );
}

fn check_unhandled_rejection(event: &NormalizedEvent) {
    assert_eq!(
        event.id.map(|id| id.to_string()).as_deref(),
        Some("d2132d31-b394-45f1-938d-5ba2ad1e5a3c")
    );
    assert_eq!(event.level, Level::Error);
    assert_eq!(event.logger, Some(Intern::new("javascript".to_owned())));
    assert_eq!(event.platform.as_deref(), Some("javascript"));
    assert_eq!(event.message.as_deref(), Some("Unhandled promise rejection"));

    assert_eq!(
        event.exception,
        Some(ExceptionRecord {
            typ: Some("Unhandled Promise Rejection".to_owned()),
            value: Some("Unhandled Promise Rejection".to_owned()),
            frames: vec![
                Frame {
                    function: Some("fetchProfile".to_owned()),
                    filename: Some(Intern::new("app:///index.android.bundle".to_owned())),
                    lineno: Some(812),
                    colno: Some(23),
                    in_app: Some(true),
                    ..Default::default()
                },
                Frame {
                    function: Some("tryCallOne".to_owned()),
                    filename: Some(Intern::new("app:///index.android.bundle".to_owned())),
                    lineno: Some(53),
                    colno: Some(16),
                    in_app: Some(false),
                    ..Default::default()
                },
            ],
        })
    );

    assert_eq!(
        event.breadcrumbs,
        vec![
            Breadcrumb {
                category: Some(Intern::new("xhr".to_owned())),
                typ: Some(BreadcrumbType::Http),
                level: Some(BreadcrumbLevel::Info),
                data: Some(
                    [
                        ("method", "GET"),
                        ("url", "https://api.example.com/profile"),
                        ("status_code", "500"),
                    ]
                    .into_iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect()
                ),
                message: String::new(),
                timestamp: Some(1700000000.5.into()),
            },
            Breadcrumb {
                category: Some(Intern::new("navigation".to_owned())),
                message: "ProfileScreen".to_owned(),
                ..Default::default()
            },
        ]
    );

    assert_eq!(event.tags["screen"], "Profile");
    assert_eq!(event.tags["build"], "17");
    assert_eq!(event.tags["session"], INVALID_TAG);
    assert_eq!(event.extra["jsEngine"], RawValue::from("hermes"));

    let user = event.user.as_ref().unwrap();
    assert_eq!(user.id.as_deref(), Some("u-123"));
    assert_eq!(user.email.as_deref(), Some("jane@example.com"));
    assert_eq!(user.data["plan"], RawValue::from("pro"));

    assert_eq!(
        event.fingerprint,
        Some(vec!["{{ default }}".to_owned(), "profile".to_owned()])
    );
    assert_eq!(event.environment.as_deref(), Some("staging"));
    assert_eq!(event.release.as_deref(), Some("com.example.app@1.4.0+17"));
    assert_eq!(event.dist, None);
    assert_eq!(
        event.sdk.as_ref().map(|s| s.integrations.clone()),
        Some(vec![
            "ReactNativeErrorHandlers".to_owned(),
            "Release".to_owned()
        ])
    );
}
