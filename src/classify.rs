//! Frame and image classification.
//!
//! Decides whether a frame belongs to user code or to the platform/runtime,
//! and computes the short image name shown in the frame table. All functions
//! here are pure; the prefix lists they consult live in `utils::config`.

use crate::utils::config::{
    ANDROID_SYSTEM_PACKAGE_PREFIXES, COCOA_SIMULATOR_PATH_FRAGMENT, COCOA_SYSTEM_PATH_PREFIXES,
    RUST_SYSTEM_PATH_PREFIXES,
};

/// Return the last path component of a package path.
///
/// `/System/Library/Frameworks/UIKit.framework/UIKit` becomes `UIKit`.
/// An empty package stays empty.
pub fn image_base_name(package: &str) -> &str {
    package.rsplit('/').next().unwrap_or(package)
}

/// Check whether a dotted Android identifier belongs to a system package.
///
/// The identifier is a full method name for regular methods and a class
/// name for inline frames; in both cases the leading dotted components
/// are what the prefix list matches.
pub fn is_android_system_package(identifier: &str) -> bool {
    ANDROID_SYSTEM_PACKAGE_PREFIXES
        .iter()
        .any(|prefix| identifier.starts_with(prefix))
}

/// Check whether an iOS image path belongs to the application.
///
/// System frameworks are installed under a small set of well-known roots;
/// everything else (the app bundle, embedded frameworks) is user code.
pub fn is_cocoa_application_image(package: &str) -> bool {
    !COCOA_SYSTEM_PATH_PREFIXES
        .iter()
        .any(|prefix| package.starts_with(prefix))
        && !package.contains(COCOA_SIMULATOR_PATH_FRAGMENT)
}

/// Check whether an image path from a Rust profile belongs to the
/// application binary rather than a shared system library.
pub fn is_rust_application_image(package: &str) -> bool {
    !RUST_SYSTEM_PATH_PREFIXES
        .iter()
        .any(|prefix| package.starts_with(prefix))
}
