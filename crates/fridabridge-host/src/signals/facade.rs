use fridabridge_core::error::{check, BridgeError, Result};

use crate::correlation::{CorrelationKey, Target};
use crate::entities::EntityCore;
use crate::ingest::Trampoline;

use super::{EventKind, Sink};

/// Make `sink` the single active target for `(entity, kind)`.
///
/// The native signal is connected the first time a kind is subscribed on an
/// entity; later calls only swap the sink.
pub(crate) fn subscribe(core: &EntityCore, kind: EventKind, sink: Sink) -> Result<()> {
    if !core.kind.supports(kind) {
        return Err(BridgeError::UnsupportedSignal {
            entity: core.kind.as_str(),
            signal: kind.as_str().to_string(),
        }
        .logged());
    }
    if sink.kind() != kind {
        return Err(BridgeError::BadRequest(format!(
            "sink for {} cannot subscribe to {}",
            sink.kind(),
            kind
        ))
        .logged());
    }

    arm(core, kind)?;

    let key = CorrelationKey::sink(core.id, kind);
    if core.bridge.table().replace(key, Target::Sink(sink)).is_some() {
        tracing::debug!(entity = %core.id, signal = %kind, "previous sink replaced");
    }
    Ok(())
}

/// Connect the native signal for `kind` on this entity unless already connected.
pub(crate) fn arm(core: &EntityCore, kind: EventKind) -> Result<()> {
    core.live(|handle| {
        if core.armed.insert(kind) {
            let trampoline = Trampoline::new(core.bridge.queue(), core.id, kind);
            if let Err(e) = check(core.engine().connect_signal(handle, kind.as_str(), trampoline)) {
                core.armed.remove(&kind);
                return Err(e);
            }
            tracing::debug!(entity = %core.id, signal = %kind, "signal connected");
        }
        Ok(())
    })
}

/// Parse a signal name for `on`-style APIs taking strings.
pub(crate) fn parse_signal(core: &EntityCore, name: &str) -> Result<EventKind> {
    EventKind::parse(name).ok_or_else(|| {
        BridgeError::UnsupportedSignal {
            entity: core.kind.as_str(),
            signal: name.to_string(),
        }
        .logged()
    })
}
