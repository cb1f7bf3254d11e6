//! Native signal arguments -> host records.

use bytes::Bytes;

use crate::engine::NativeChild;
use crate::types::{Child, ChildOrigin, FileMonitorEvent, FileMonitorEventKind, Output};

pub fn child_origin(code: u32) -> ChildOrigin {
    match code {
        0 => ChildOrigin::Fork,
        1 => ChildOrigin::Exec,
        2 => ChildOrigin::Spawn,
        _ => ChildOrigin::Unknown,
    }
}

pub fn child(native: NativeChild) -> Child {
    Child {
        pid: native.pid,
        parent_pid: native.parent_pid,
        origin: child_origin(native.origin),
        identifier: native.identifier,
        path: native.path,
        argv: native.argv,
        envp: native.envp,
    }
}

pub fn output(pid: u32, fd: i32, data: Option<Bytes>) -> Output {
    Output {
        pid,
        fd,
        data: data.unwrap_or_default(),
    }
}

/// GFileMonitorEvent code -> kind.
pub fn file_event_kind(code: u32) -> FileMonitorEventKind {
    match code {
        0 => FileMonitorEventKind::Changed,
        1 => FileMonitorEventKind::ChangesDoneHint,
        2 => FileMonitorEventKind::Deleted,
        3 => FileMonitorEventKind::Created,
        4 => FileMonitorEventKind::AttributeChanged,
        5 => FileMonitorEventKind::PreUnmount,
        6 => FileMonitorEventKind::Unmounted,
        7 => FileMonitorEventKind::Moved,
        8 => FileMonitorEventKind::Renamed,
        9 => FileMonitorEventKind::MovedIn,
        10 => FileMonitorEventKind::MovedOut,
        _ => FileMonitorEventKind::Unknown,
    }
}

pub fn file_event(path: String, other_path: Option<String>, code: u32) -> FileMonitorEvent {
    FileMonitorEvent {
        path,
        other_path,
        event: file_event_kind(code),
    }
}
