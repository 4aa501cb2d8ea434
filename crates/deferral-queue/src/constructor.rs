//! Best-effort construction of queue entries from handler descriptions.
//!
//! The primary way to build an entry is [`QueueEntry::for_observer`], which
//! takes the owner and observer explicitly. The helpers here recover those
//! two names from a textual handler description instead, and only accept two
//! shapes:
//!
//! - plain function: `"<function <qualified_name> at <address>>"`
//! - bound method: `"<bound method <qualified_name> of <instance>>"`
//!
//! The qualified name is split on `.` and its last two segments become the
//! owner and the observer. Anything else is rejected with
//! [`QueueError::UnrecognizedHandlerFormat`].

use crate::entry::QueueEntry;
use crate::error::QueueError;
use deferral_store::SnapshotData;
use regex::Regex;

/// Builds an entry for `event_name` with event id 1 and an empty snapshot.
///
/// # Example
///
/// ```rust
/// use deferral_queue::deferred;
///
/// let entry = deferred("update_status", "<function MyCharm._on_event at 0x7f3a>")?;
/// assert_eq!(entry.handle_path(), "MyCharm/on/update_status[1]");
/// assert_eq!(entry.observer(), "_on_event");
/// # Ok::<(), deferral_queue::QueueError>(())
/// ```
pub fn deferred(event_name: &str, handler: &str) -> Result<QueueEntry, QueueError> {
    deferred_with(event_name, handler, 1, SnapshotData::new())
}

/// Builds an entry with an explicit event id and snapshot.
///
/// Different event types expect different snapshot keys; the host
/// framework's documentation lists them.
///
/// # Errors
///
/// Returns [`QueueError::UnrecognizedHandlerFormat`] if `handler` has neither
/// recognized shape, and [`QueueError::InvalidIdentifier`] if the recovered
/// names cannot form a handle path.
pub fn deferred_with(
    event_name: &str,
    handler: &str,
    event_id: u64,
    snapshot_data: SnapshotData,
) -> Result<QueueEntry, QueueError> {
    let (owner, observer) = parse_handler(handler)?;
    let entry = QueueEntry::for_observer(event_name, &owner, &observer, event_id)?;
    Ok(entry.with_snapshot(snapshot_data))
}

/// Builds an entry for a Rust handler function, using [`describe_handler`].
///
/// Only plain paths such as `my_crate::Charm::on_start` are accepted.
///
/// # Errors
///
/// Returns [`QueueError::UnrecognizedHandlerFormat`] for handlers whose type
/// name is not a plain path: fn pointers, closures, trait-qualified methods
/// and generic instantiations.
pub fn deferred_fn<F>(event_name: &str, handler: &F) -> Result<QueueEntry, QueueError> {
    let plain_path = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)+$")
        .expect("invalid regex");
    let description = describe_handler(handler);
    if !plain_path.is_match(std::any::type_name::<F>()) {
        return Err(unrecognized(&description));
    }
    deferred(event_name, &description)
}

/// Renders a handler in the plain-function shape.
///
/// The qualified name comes from [`std::any::type_name`] with `::` replaced
/// by `.`, so an associated function `Charm::on_start` is described as
/// `"<function my_crate.Charm.on_start at 0x...>"`. Closures and generic
/// functions render unpredictably and are refused by [`deferred_fn`]; use
/// [`QueueEntry::for_observer`] for those.
pub fn describe_handler<F>(handler: &F) -> String {
    let qualified = std::any::type_name::<F>().replace("::", ".");
    format!("<function {} at {:p}>", qualified, handler)
}

/// Extracts `(owner, observer)` from a handler description.
pub fn parse_handler(handler: &str) -> Result<(String, String), QueueError> {
    let function = Regex::new(r"^<function (.*) at .*>").expect("invalid regex");
    let bound_method = Regex::new(r"^<bound method (.*) of .*>").expect("invalid regex");

    let qualified = function
        .captures(handler)
        .or_else(|| bound_method.captures(handler))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| unrecognized(handler))?;

    let mut segments = qualified.rsplit('.');
    match (segments.next(), segments.next()) {
        (Some(observer), Some(owner)) => Ok((owner.to_string(), observer.to_string())),
        _ => Err(unrecognized(handler)),
    }
}

fn unrecognized(handler: &str) -> QueueError {
    QueueError::UnrecognizedHandlerFormat {
        input: handler.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Charm;

    impl Charm {
        fn on_event(&self) {}
    }

    trait Handler {
        fn on_event(&self);
    }

    impl Handler for Charm {
        fn on_event(&self) {}
    }

    fn generic_handler<T>(_event: T) {}

    fn assert_refused(result: Result<QueueEntry, QueueError>) {
        match result {
            Err(QueueError::UnrecognizedHandlerFormat { input }) => {
                assert!(input.starts_with("<function "));
            }
            other => panic!("expected UnrecognizedHandlerFormat, got {other:?}"),
        }
    }

    #[test]
    fn parses_plain_function() {
        let (owner, observer) =
            parse_handler("<function MyCharm._on_event at 0x7f0c2a1b3d30>").unwrap();
        assert_eq!(owner, "MyCharm");
        assert_eq!(observer, "_on_event");
    }

    #[test]
    fn parses_bound_method() {
        let (owner, observer) = parse_handler(
            "<bound method MyCharm._on_event of <charm.MyCharm object at 0x7f0c2a1b3d30>>",
        )
        .unwrap();
        assert_eq!(owner, "MyCharm");
        assert_eq!(observer, "_on_event");
    }

    #[test]
    fn keeps_last_two_segments() {
        let (owner, observer) =
            parse_handler("<function pkg.module.Outer.Inner.handle at 0x1>").unwrap();
        assert_eq!(owner, "Inner");
        assert_eq!(observer, "handle");
    }

    #[test]
    fn rejects_other_shapes() {
        for handler in [
            "",
            "MyCharm._on_event",
            "<built-in function print>",
            "<function lonely at 0x1>",
            "functools.partial(<function f at 0x1>)",
        ] {
            match parse_handler(handler) {
                Err(QueueError::UnrecognizedHandlerFormat { input }) => assert_eq!(input, handler),
                other => panic!("expected rejection for {handler:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn deferred_with_sets_id_and_snapshot() {
        let mut data = SnapshotData::new();
        data.insert("relation_id".to_string(), json!(9));

        let entry =
            deferred_with("db_relation_changed", "<function C.h at 0x1>", 4, data.clone()).unwrap();
        assert_eq!(entry.handle_path(), "C/on/db_relation_changed[4]");
        assert_eq!(entry.event_id(), Some(4));
        assert_eq!(entry.snapshot_data(), &data);
    }

    #[test]
    fn describes_rust_methods() {
        let description = describe_handler(&Charm::on_event);
        assert!(description.starts_with("<function "));
        assert!(description.contains(".Charm.on_event at "));

        let entry = deferred_fn("start", &Charm::on_event).unwrap();
        assert_eq!(entry.owner(), "Charm");
        assert_eq!(entry.observer(), "on_event");
        assert_eq!(entry.handle_path(), "Charm/on/start[1]");
    }

    #[test]
    fn refuses_fn_pointer() {
        let handler: fn(&Charm) = Charm::on_event;
        assert_refused(deferred_fn("start", &handler));
    }

    #[test]
    fn refuses_trait_qualified_method() {
        assert_refused(deferred_fn("start", &<Charm as Handler>::on_event));
    }

    #[test]
    fn refuses_generic_function() {
        assert_refused(deferred_fn("start", &generic_handler::<String>));
    }

    #[test]
    fn refuses_closure() {
        let handler = |_: &Charm| {};
        assert_refused(deferred_fn("start", &handler));
    }
}
