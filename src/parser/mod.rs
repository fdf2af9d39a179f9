//! Raw profile envelope and platform dispatch.
//!
//! A raw profile is a JSON envelope: store metadata plus the
//! platform-specific payload under a `profile` key. Parsing dispatches on
//! the `platform` tag into one of the platform decoders; everything
//! downstream works on the resulting [`ProfileData`] variant.

pub mod android;
pub mod cocoa;
pub mod python;
pub mod rust;
pub mod schema;

use std::collections::HashMap;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::calltree::builder;
use crate::calltree::functions::{collect_functions, CallTreeFunction};
use crate::calltree::node::Node;
use crate::speedscope;
use crate::utils::error::ProfileError;

use self::android::AndroidProfile;
use self::cocoa::CocoaProfile;
use self::python::PythonProfile;
use self::rust::RustProfile;

/// The raw profile envelope as fetched from the profile store.
///
/// The payload is kept opaque until [`RawProfile::parse`] dispatches on
/// the platform tag.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProfile {
    pub platform: String,

    pub profile_id: String,

    pub project_id: u64,

    #[serde(default)]
    pub organization_id: u64,

    #[serde(default)]
    pub transaction_name: String,

    #[serde(default)]
    pub duration_ns: u64,

    #[serde(default)]
    pub received_at: Option<chrono::DateTime<chrono::Utc>>,

    #[serde(default)]
    pub version_name: String,

    #[serde(default)]
    pub version_code: String,

    /// Platform-specific payload, decoded by `parse`
    #[serde(default)]
    pub profile: serde_json::Value,
}

impl RawProfile {
    /// Release version string as recorded by the store.
    pub fn version(&self) -> String {
        format!("{} (build {})", self.version_name, self.version_code)
    }

    /// Decode the payload for the tagged platform.
    ///
    /// # Errors
    /// * `ProfileError::UnsupportedPlatform` - unrecognized platform tag
    /// * `ProfileError::Decode` - payload failed structural parsing
    pub fn parse(self) -> Result<Profile, ProfileError> {
        debug!(
            "decoding {} payload for profile {}",
            self.platform, self.profile_id
        );

        let data = match self.platform.as_str() {
            "android" => ProfileData::Android(decode_payload(&self.profile)?),
            "cocoa" => ProfileData::Cocoa(decode_payload(&self.profile)?),
            "python" => {
                let mut profile: PythonProfile = decode_payload(&self.profile)?;
                profile.normalize();
                ProfileData::Python(profile)
            }
            "rust" => {
                let mut profile: RustProfile = decode_payload(&self.profile)?;
                profile.normalize();
                ProfileData::Rust(profile)
            }
            other => return Err(ProfileError::UnsupportedPlatform(other.to_string())),
        };

        let version = self.version();
        Ok(Profile {
            platform: self.platform,
            profile_id: self.profile_id,
            project_id: self.project_id,
            organization_id: self.organization_id,
            transaction_name: self.transaction_name,
            duration_ns: self.duration_ns,
            version,
            data,
        })
    }
}

/// Deserialize a payload, reporting the JSON path of the offending field
/// on failure.
fn decode_payload<T: DeserializeOwned>(payload: &serde_json::Value) -> Result<T, ProfileError> {
    serde_path_to_error::deserialize(payload.clone()).map_err(ProfileError::Decode)
}

/// Decoded platform payloads. Each variant implements the two pipeline
/// capabilities: feeding the call-tree builder and feeding the
/// visualization emitter.
#[derive(Debug, Clone)]
pub enum ProfileData {
    Android(AndroidProfile),
    Cocoa(CocoaProfile),
    Python(PythonProfile),
    Rust(RustProfile),
}

/// A fully decoded profile: envelope metadata plus the platform payload.
#[derive(Debug, Clone)]
pub struct Profile {
    pub platform: String,
    pub profile_id: String,
    pub project_id: u64,
    pub organization_id: u64,
    pub transaction_name: String,
    pub duration_ns: u64,
    pub version: String,
    pub data: ProfileData,
}

impl Profile {
    /// Produce the speedscope visualization payload.
    pub fn speedscope(&self) -> Result<speedscope::Output, ProfileError> {
        speedscope::render(self)
    }

    /// Build the per-thread call-tree forests, collapsed.
    pub fn call_trees(&self) -> Result<HashMap<u64, Vec<Node>>, ProfileError> {
        let mut call_trees = builder::call_trees(&self.data, &self.profile_id)?;
        for trees in call_trees.values_mut() {
            let collapsed = std::mem::take(trees)
                .into_iter()
                .flat_map(Node::collapse)
                .collect();
            *trees = collapsed;
        }
        Ok(call_trees)
    }

    /// Aggregate per-function self times across every thread's trees.
    pub fn functions(&self) -> Result<HashMap<u64, CallTreeFunction>, ProfileError> {
        let call_trees = self.call_trees()?;
        let mut results = HashMap::new();
        for trees in call_trees.values() {
            for tree in trees {
                collect_functions(tree, &mut results);
            }
        }
        Ok(results)
    }
}
