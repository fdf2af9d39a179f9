//! Constants and platform classification data.
//!
//! The system-package prefix lists change over time as platforms evolve,
//! so they live here as data rather than inside the classifier code.

/// Package prefixes that mark an Android method as platform/runtime code.
/// Matched against the full dotted method name (or the class name for
/// inline frames).
pub const ANDROID_SYSTEM_PACKAGE_PREFIXES: &[&str] = &[
    "android.",
    "androidx.",
    "com.android.",
    "com.google.android.",
    "com.motorola.",
    "java.",
    "javax.",
    "kotlin.",
    "kotlinx.",
    "retrofit2.",
    "sun.",
];

/// Path prefixes under which iOS system frameworks are installed.
pub const COCOA_SYSTEM_PATH_PREFIXES: &[&str] = &["/System/Library/", "/usr/lib/"];

/// Simulator images live under the runtime root of a .simruntime bundle.
pub const COCOA_SIMULATOR_PATH_FRAGMENT: &str = ".simruntime/Contents/Resources/RuntimeRoot/";

/// Path prefixes under which shared system libraries are installed on the
/// hosts the Rust profiler runs on.
pub const RUST_SYSTEM_PATH_PREFIXES: &[&str] = &["/usr/lib/", "/lib/", "/System/Library/"];

/// Dispatch queue label that marks the main thread on iOS.
pub const MAIN_THREAD_QUEUE_LABEL: &str = "com.apple.main-thread";

/// Name of the application entry-point frame.
pub const MAIN_FUNCTION: &str = "main";

/// Unit reported for every emitted speedscope profile.
pub const VALUE_UNIT_NANOSECONDS: &str = "nanoseconds";
