use bytes::Bytes;
use serde_json::Value;

/// Transport class of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Local,
    Remote,
    Usb,
}

impl DeviceType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Local => "local",
            DeviceType::Remote => "remote",
            DeviceType::Usb => "usb",
        }
    }
}

/// JavaScript runtime a script is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptRuntime {
    #[default]
    Default,
    Duk,
    V8,
}

/// Options forwarded to `spawn`. Empty fields are left to the engine's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnOptions {
    pub argv: Vec<String>,
    pub envp: Vec<String>,
    pub env: Vec<String>,
    pub cwd: Option<String>,
}

impl SpawnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn argv<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv = argv.into_iter().map(Into::into).collect();
        self
    }

    pub fn env<I, S>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env = env.into_iter().map(Into::into).collect();
        self
    }

    pub fn envp<I, S>(mut self, envp: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.envp = envp.into_iter().map(Into::into).collect();
        self
    }

    pub fn cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub pid: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub identifier: String,
    pub name: String,
    /// 0 when the application is not running.
    pub pid: u32,
}

/// Process held at launch by spawn gating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spawn {
    pub identifier: String,
    pub pid: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOrigin {
    Fork,
    Exec,
    Spawn,
    Unknown,
}

impl ChildOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            ChildOrigin::Fork => "fork",
            ChildOrigin::Exec => "exec",
            ChildOrigin::Spawn => "spawn",
            ChildOrigin::Unknown => "unknown",
        }
    }
}

/// Child process caught by child gating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child {
    pub pid: u32,
    pub parent_pid: u32,
    pub origin: ChildOrigin,
    pub identifier: Option<String>,
    pub path: Option<String>,
    pub argv: Vec<String>,
    pub envp: Vec<String>,
}

/// Chunk written by a spawned process to one of its stdio streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub pid: u32,
    pub fd: i32,
    pub data: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMonitorEventKind {
    Changed,
    ChangesDoneHint,
    Deleted,
    Created,
    AttributeChanged,
    PreUnmount,
    Unmounted,
    Moved,
    Renamed,
    MovedIn,
    MovedOut,
    Unknown,
}

impl FileMonitorEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileMonitorEventKind::Changed => "changed",
            FileMonitorEventKind::ChangesDoneHint => "changes done hint",
            FileMonitorEventKind::Deleted => "deleted",
            FileMonitorEventKind::Created => "created",
            FileMonitorEventKind::AttributeChanged => "attribute changed",
            FileMonitorEventKind::PreUnmount => "pre unmount",
            FileMonitorEventKind::Unmounted => "unmounted",
            FileMonitorEventKind::Moved => "moved",
            FileMonitorEventKind::Renamed => "renamed",
            FileMonitorEventKind::MovedIn => "moved in",
            FileMonitorEventKind::MovedOut => "moved out",
            FileMonitorEventKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMonitorEvent {
    pub path: String,
    pub other_path: Option<String>,
    pub event: FileMonitorEventKind,
}

/// Plain message sent by a script.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Position of this message among everything the script has sent.
    pub index: u64,
    pub payload: Value,
    pub data: Option<Bytes>,
    /// Opaque token supplied by the engine with the signal.
    pub user_data: usize,
}

/// Successful RPC result: binary data when the reply carried any, else the first result value.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcValue {
    Json(Value),
    Bytes(Bytes),
}

impl RpcValue {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            RpcValue::Json(v) => Some(v),
            RpcValue::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            RpcValue::Bytes(b) => Some(b),
            RpcValue::Json(_) => None,
        }
    }
}
