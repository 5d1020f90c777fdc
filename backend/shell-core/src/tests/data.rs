// Unit tests for the binary payload side channel

use crate::ipc::data::{DataManager, DataPayload};

/// **VALUE**: Verifies `create` assigns a nonzero id, stores the
/// payload, and returns a bootstrap script that fetches it back.
///
/// **WHY THIS MATTERS**: The renderer only learns about a payload
/// through this script; if the id in the script and the id in the store
/// diverge, the fetch 404s and the reply is silently lost.
///
/// **BUG THIS CATCHES**: Id assignment happening after the script is
/// rendered.
#[test]
fn given_payload_when_created_then_stored_and_script_references_id() {
    let manager = DataManager::new();
    let script = manager.create("3", "{}", DataPayload::new(vec![1, 2, 3]));

    let id = id_from_script(&script);
    assert_ne!(id, 0);
    assert!(script.contains("XMLHttpRequest"));
    assert_eq!(manager.get(id).map(|p| p.body), Some(vec![1, 2, 3]));
}

/// Recover the assigned id from the `ipc://data?id=<id>` fetch in the
/// bootstrap script.
fn id_from_script(script: &str) -> u64 {
    let marker = "ipc://data?id=";
    let start = script.find(marker).expect("script should fetch the payload") + marker.len();
    script[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .expect("id should be numeric")
}

/// **VALUE**: Verifies a caller-assigned id survives `create`.
#[test]
fn given_preassigned_id_when_created_then_kept() {
    let manager = DataManager::new();
    let payload = DataPayload {
        id: 42,
        body: vec![9],
        ..DataPayload::default()
    };

    manager.create("-1", "{}", payload);

    assert!(manager.has(42));
}

/// **VALUE**: Verifies removal is consumption: the payload comes back
/// once and the slot empties.
#[test]
fn given_stored_payload_when_removed_then_gone() {
    let manager = DataManager::new();
    manager.create("1", "{}", DataPayload {
        id: 7,
        body: vec![5],
        ..DataPayload::default()
    });

    assert_eq!(manager.remove(7).map(|p| p.body), Some(vec![5]));
    assert!(!manager.has(7));
    assert!(manager.remove(7).is_none());
}

/// **VALUE**: Verifies the TTL sweep keeps fresh entries and `clear`
/// drops everything.
///
/// **WHY THIS MATTERS**: `clear` runs on window teardown; a sweep that
/// evicted fresh entries would race legitimate in-flight fetches.
#[test]
fn given_fresh_entries_when_expired_then_kept_until_cleared() {
    let manager = DataManager::new();
    manager.create("1", "{}", DataPayload {
        id: 11,
        body: vec![1],
        ..DataPayload::default()
    });

    manager.expire();
    assert!(manager.has(11));

    manager.clear();
    assert!(!manager.has(11));
}
