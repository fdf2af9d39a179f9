//! End-to-end tests: raw profile envelope JSON in, speedscope document out.

use serde_json::json;

use stackscope::parser::RawProfile;
use stackscope::speedscope::{Output, ProfileView};

fn envelope(platform: &str, payload: serde_json::Value) -> RawProfile {
    serde_json::from_value(json!({
        "platform": platform,
        "profile_id": "0123456789abcdef",
        "project_id": 7,
        "organization_id": 3,
        "transaction_name": "checkout",
        "duration_ns": 1_000_000u64,
        "version_name": "2.4.1",
        "version_code": "210",
        "profile": payload,
    }))
    .unwrap()
}

fn render(platform: &str, payload: serde_json::Value) -> Output {
    envelope(platform, payload).parse().unwrap().speedscope().unwrap()
}

fn android_payload() -> serde_json::Value {
    json!({
        "clock": "global",
        "start_time": 0,
        "methods": [
            {"id": 1, "class_name": "com.example.app.A", "name": "a", "source_file": "A.java", "source_line": 10},
            {"id": 2, "class_name": "com.example.app.A", "name": "b", "source_file": "A.java", "source_line": 20},
        ],
        "threads": [{"id": 1, "name": "main"}],
        "events": [
            {"action": "Enter", "thread_id": 1, "method_id": 1, "time": {"global": {"secs": 0, "nanos": 0}}},
            {"action": "Enter", "thread_id": 1, "method_id": 2, "time": {"global": {"secs": 0, "nanos": 5}}},
            {"action": "Exit",  "thread_id": 1, "method_id": 2, "time": {"global": {"secs": 0, "nanos": 8}}},
            {"action": "Exit",  "thread_id": 1, "method_id": 1, "time": {"global": {"secs": 0, "nanos": 10}}},
        ],
    })
}

#[test]
fn test_android_single_enter_exit() {
    let output = render("android", android_payload());

    let value = serde_json::to_value(&output).unwrap();
    assert_eq!(value["androidClock"], "global");
    assert_eq!(value["activeProfileIndex"], 0);

    let profile = &value["profiles"][0];
    assert_eq!(profile["type"], "evented");
    assert_eq!(profile["unit"], "nanoseconds");
    assert_eq!(profile["name"], "main");
    assert_eq!(profile["threadID"], 1);
    assert_eq!(profile["startValue"], 0);
    assert_eq!(profile["endValue"], 10);

    let events = profile["events"].as_array().unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0], json!({"type": "O", "frame": 0, "at": 0}));
    assert_eq!(events[1], json!({"type": "O", "frame": 1, "at": 5}));
    assert_eq!(events[2], json!({"type": "C", "frame": 1, "at": 8}));
    assert_eq!(events[3], json!({"type": "C", "frame": 0, "at": 10}));

    let frames = value["shared"]["frames"].as_array().unwrap();
    assert_eq!(frames[0]["name"], "com.example.app.A.a");
    assert_eq!(frames[0]["image"], "com.example.app");
    assert_eq!(frames[0]["is_application"], true);
}

#[test]
fn test_android_implicit_close_precedes_the_parent_close() {
    let mut payload = android_payload();
    // drop the explicit exit for method 2
    payload["events"].as_array_mut().unwrap().remove(2);
    let output = render("android", payload);

    let value = serde_json::to_value(&output).unwrap();
    let events = value["profiles"][0]["events"].as_array().unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(events[2], json!({"type": "C", "frame": 1, "at": 10}));
    assert_eq!(events[3], json!({"type": "C", "frame": 0, "at": 10}));
}

#[test]
fn test_android_open_close_balance() {
    let output = render("android", android_payload());
    let ProfileView::Evented(profile) = &output.profiles[0] else {
        panic!("expected an evented profile");
    };
    let opens = profile
        .events
        .iter()
        .filter(|e| matches!(e.event_type, stackscope::speedscope::FrameEventType::Open))
        .count();
    assert_eq!(opens * 2, profile.events.len());
}

#[test]
fn test_metadata_is_copied_onto_the_document() {
    let output = render("android", android_payload());

    assert_eq!(output.duration_ns, 1_000_000);
    assert_eq!(output.platform, "android");
    assert_eq!(output.profile_id, "0123456789abcdef");
    assert_eq!(output.project_id, 7);
    assert_eq!(output.transaction_name, "checkout");
    assert_eq!(output.version, "2.4.1 (build 210)");
}

#[test]
fn test_cocoa_trims_pre_main_frames() {
    let app = "/var/containers/Bundle/Application/X/App.app/App";
    let frame = |function: &str, addr: &str| {
        json!({
            "function": function,
            "instruction_addr": addr,
            "status": "symbolicated",
            "package": app,
        })
    };
    // leaf-first stacks: [foo, main, _start] then [bar, foo, main, _start]
    let payload = json!({
        "samples": [
            {
                "thread_id": 1,
                "relative_timestamp_ns": 0,
                "frames": [frame("foo", "0x3"), frame("main", "0x2"), frame("_start", "0x1")],
            },
            {
                "thread_id": 1,
                "relative_timestamp_ns": 10,
                "frames": [frame("bar", "0x4"), frame("foo", "0x3"), frame("main", "0x2"), frame("_start", "0x1")],
            },
        ],
    });

    let output = render("cocoa", payload);
    let value = serde_json::to_value(&output).unwrap();
    let profile = &value["profiles"][0];
    assert_eq!(profile["type"], "sampled");
    assert_eq!(profile["isMainThread"], true);

    // _start was trimmed; main (frame 1) leads every stack
    assert_eq!(profile["samples"], json!([[1, 2], [1, 2, 3]]));
    assert_eq!(profile["weights"], json!([10, 0]));
}

#[test]
fn test_rust_sorts_non_monotonic_samples() {
    let frame = json!({
        "function": "server::main",
        "instruction_addr": "0x1",
        "sym_addr": "0x1",
        "status": "symbolicated",
        "package": "/opt/service/bin/server",
    });
    let payload = json!({
        "samples": [
            {"thread_id": 1, "relative_timestamp_ns": 500, "frames": [frame.clone()]},
            {"thread_id": 1, "relative_timestamp_ns": 100, "frames": [frame.clone()]},
            {"thread_id": 1, "relative_timestamp_ns": 300, "frames": [frame]},
        ],
    });

    let output = render("rust", payload);
    let ProfileView::Sampled(profile) = &output.profiles[0] else {
        panic!("expected a sampled profile");
    };
    assert_eq!(profile.weights, vec![200, 200, 0]);
    assert_eq!(profile.start_value, 100);
    assert_eq!(profile.end_value, 500);
}

#[test]
fn test_sampled_weights_match_samples_and_cover_the_interval() {
    let payload = json!({
        "frames": [{"name": "main", "file": "app.py", "line": 1}],
        "samples": [
            {"thread_id": 4, "relative_timestamp_ns": 10, "frames": [0]},
            {"thread_id": 4, "relative_timestamp_ns": 25, "frames": [0]},
            {"thread_id": 4, "relative_timestamp_ns": 60, "frames": [0]},
        ],
    });

    let output = render("python", payload);
    assert_eq!(output.active_profile_index, 0);
    let ProfileView::Sampled(profile) = &output.profiles[0] else {
        panic!("expected a sampled profile");
    };
    assert_eq!(profile.weights.len(), profile.samples.len());
    assert_eq!(
        profile.weights.iter().sum::<u64>(),
        profile.end_value - profile.start_value
    );
}

#[test]
fn test_profiles_are_ordered_by_thread_id() {
    let payload = json!({
        "frames": [{"name": "work", "file": "app.py", "line": 1}],
        "samples": [
            {"thread_id": 9, "relative_timestamp_ns": 0, "frames": [0]},
            {"thread_id": 2, "relative_timestamp_ns": 0, "frames": [0]},
            {"thread_id": 5, "relative_timestamp_ns": 0, "frames": [0]},
        ],
    });

    let output = render("python", payload);
    let thread_ids: Vec<u64> = output.profiles.iter().map(|p| p.thread_id()).collect();
    assert_eq!(thread_ids, vec![2, 5, 9]);
}

#[test]
fn test_unsupported_platform_is_rejected() {
    let raw = envelope("php", json!({}));
    assert!(raw.parse().is_err());
}
