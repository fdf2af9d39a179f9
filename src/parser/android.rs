//! Android method-trace decoder.
//!
//! Android payloads are evented: the runtime instruments method entry and
//! exit instead of sampling stacks. The payload carries a method table, an
//! ordered event list and per-thread metadata. Event times come from one of
//! several device clocks and are normalized to nanoseconds here.

use serde::{Deserialize, Serialize};

use crate::classify::is_android_system_package;
use crate::parser::schema::Frame;
use crate::utils::error::ProfileError;

/// Device clock the event timestamps were captured with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clock {
    Global,
    Cpu,
    Wall,
    #[default]
    Dual,
}

/// A `secs`/`nanos` pair as serialized by the device.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Duration {
    #[serde(default)]
    pub secs: u64,
    #[serde(default)]
    pub nanos: u64,
}

impl Duration {
    pub fn total_nanos(&self) -> u64 {
        self.secs * 1_000_000_000 + self.nanos
    }
}

/// Monotonic readings attached to an event when the device reports them.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EventMonotonic {
    #[serde(default)]
    pub wall: Duration,
    #[serde(default)]
    pub cpu: Duration,
}

/// Raw event time; which reading is authoritative depends on the clock.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EventTime {
    #[serde(default)]
    pub global: Duration,
    #[serde(default, alias = "Monotonic")]
    pub monotonic: EventMonotonic,
}

/// A single enter/exit record from the method trace.
///
/// `action` stays a plain string: an unrecognized action is a data
/// integrity problem diagnosed by the builder, not a parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub action: String,
    pub thread_id: u64,
    pub method_id: u64,
    #[serde(default)]
    pub time: EventTime,
}

/// An entry of the method table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Method {
    pub id: u64,

    #[serde(default)]
    pub class_name: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub signature: String,

    #[serde(default)]
    pub source_file: String,

    #[serde(default)]
    pub source_line: u32,

    /// Present when the compiler inlined other methods into this one;
    /// ordered outermost first.
    #[serde(default)]
    pub inline_frames: Vec<Method>,
}

impl Method {
    /// Full dotted method name, `"{class_name}.{name}"`.
    ///
    /// A method without a name cannot be attributed to anything and fails
    /// the whole profile.
    pub fn full_name(&self) -> Result<String, ProfileError> {
        if self.name.is_empty() {
            return Err(ProfileError::DataIntegrity(format!(
                "method {} has no name",
                self.id
            )));
        }
        if self.class_name.is_empty() {
            Ok(self.name.clone())
        } else {
            Ok(format!("{}.{}", self.class_name, self.name))
        }
    }

    /// Package part of the class name: everything before the last dot.
    pub fn package_name(&self) -> &str {
        match self.class_name.rfind('.') {
            Some(index) => &self.class_name[..index],
            None => &self.class_name,
        }
    }

    /// Split the method into its package and simple method name.
    pub fn package_and_simple_name(&self) -> Result<(String, String), ProfileError> {
        let full_name = self.full_name()?;
        let package = self.package_name();
        let simple = full_name
            .strip_prefix(package)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(&full_name);
        Ok((package.to_string(), simple.to_string()))
    }

    /// Convert the method into the frames it contributes to a stack:
    /// its inline chain (outermost first) when present, a single frame
    /// otherwise. Classification matches the full method name for regular
    /// methods and the class name for inline frames.
    pub fn frames(&self) -> Result<Vec<MethodFrame>, ProfileError> {
        if !self.inline_frames.is_empty() {
            return Ok(self
                .inline_frames
                .iter()
                .map(|inline| MethodFrame {
                    frame: Frame {
                        function: inline.name.clone(),
                        package: inline.class_name.clone(),
                        filename: inline.source_file.clone(),
                        lineno: inline.source_line,
                        inline: true,
                        ..Default::default()
                    },
                    is_application: !is_android_system_package(&inline.class_name),
                })
                .collect());
        }
        let (package, _) = self.package_and_simple_name()?;
        let full_name = self.full_name()?;
        let is_application = !is_android_system_package(&full_name);
        Ok(vec![MethodFrame {
            frame: Frame {
                function: full_name,
                package,
                filename: self.source_file.clone(),
                lineno: self.source_line,
                ..Default::default()
            },
            is_application,
        }])
    }
}

/// A method-table entry resolved to a renderable frame with its
/// application classification.
#[derive(Debug, Clone)]
pub struct MethodFrame {
    pub frame: Frame,
    pub is_application: bool,
}

/// Stand-in for an event whose method id is missing from the method
/// table. The trace is still usable, so no error is raised for these.
pub fn unknown_method_frame(method_id: u64) -> MethodFrame {
    MethodFrame {
        frame: Frame {
            function: format!("unknown (id {method_id})"),
            package: "unknown".to_string(),
            filename: "unknown".to_string(),
            ..Default::default()
        },
        is_application: false,
    }
}

/// Per-thread metadata from the method trace.
#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub priority: Option<u32>,
}

/// A decoded Android method-trace payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AndroidProfile {
    #[serde(default)]
    pub clock: Clock,

    #[serde(default)]
    pub events: Vec<Event>,

    #[serde(default)]
    pub methods: Vec<Method>,

    /// Trace start on the global clock, in nanoseconds
    #[serde(default)]
    pub start_time: u64,

    #[serde(default)]
    pub threads: Vec<Thread>,
}

impl AndroidProfile {
    /// Normalize an event time to nanoseconds since trace start, using
    /// the reading that matches the profile's clock.
    pub fn timestamp(&self, time: &EventTime) -> u64 {
        match self.clock {
            Clock::Global => time.global.total_nanos().saturating_sub(self.start_time),
            Clock::Cpu => time.monotonic.cpu.total_nanos(),
            Clock::Wall | Clock::Dual => time.monotonic.wall.total_nanos(),
        }
    }
}
