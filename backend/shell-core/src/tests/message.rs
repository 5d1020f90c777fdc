// Unit tests for the ipc:// message codec
// Parsing is tolerant by contract: malformed input yields unroutable
// messages, never errors

use crate::ipc::message::{Message, SEQ_BROADCAST};

/// **VALUE**: Verifies the canonical parse: name from the path, value
/// decoded into its field, seq empty when absent.
///
/// **WHY THIS MATTERS**: This is the exact shape every route handler
/// receives; the renderer shim and native side agree on it bit-exactly.
///
/// **BUG THIS CATCHES**: Path/query splitting regressions that move the
/// name or drop the value.
#[test]
fn given_simple_uri_when_parsed_then_fields_populated() {
    let message = Message::parse("ipc://hello?value=world");

    assert_eq!(message.name, "hello");
    assert_eq!(message.value, "world");
    assert_eq!(message.seq, "");
    assert_eq!(message.index, -1);
    assert!(message.is_routable());
}

/// **VALUE**: Verifies missing scheme, bare scheme, and empty query all
/// yield an unroutable message instead of an error.
///
/// **WHY THIS MATTERS**: Scheme interception sees every navigation, not
/// just bridge calls; arbitrary URIs must degrade to "not ours".
///
/// **BUG THIS CATCHES**: A parser that panics or fabricates a name from
/// garbage input.
#[test]
fn given_malformed_uri_when_parsed_then_unroutable() {
    for source in ["hello?value=world", "ipc://", "ipc://?", ""] {
        let message = Message::parse(source);
        assert_eq!(message.name, "", "source: {source:?}");
        assert!(!message.is_routable());
    }
}

/// **VALUE**: Verifies query pairs without `=` are skipped rather than
/// recorded as empty-valued args.
#[test]
fn given_pair_without_equals_when_parsed_then_skipped() {
    let message = Message::parse("ipc://hello?flag&value=world");

    assert!(!message.has("flag"));
    assert_eq!(message.value, "world");
}

/// **VALUE**: Verifies a non-integer `index` leaves the field at its
/// default instead of aborting the parse.
///
/// **WHY THIS MATTERS**: `index` correlates replies to windows; a bad
/// value must degrade to "no window" while the rest of the message
/// stays usable.
///
/// **BUG THIS CATCHES**: A parse that propagates the integer error and
/// drops the whole message, or one that retains the unusable pair in
/// `args` where serialization would resurrect it.
#[test]
fn given_non_integer_index_when_parsed_then_default_kept() {
    let message = Message::parse("ipc://hello?index=abc&value=world");

    assert_eq!(message.index, -1);
    assert_eq!(message.value, "world");
    assert!(!message.has("index"));

    let message = Message::parse("ipc://hello?index=2");
    assert_eq!(message.index, 2);
}

/// **VALUE**: Verifies `value` and `seq` are eagerly percent-decoded
/// into their fields while `args` retains the raw form.
///
/// **WHY THIS MATTERS**: Handlers read the decoded fields; serialization
/// reads `args`. Decoding in the wrong place double-decodes.
#[test]
fn given_encoded_args_when_parsed_then_fields_decoded_args_raw() {
    let message = Message::parse("ipc://hello?value=a%20b&seq=R%311");

    assert_eq!(message.value, "a b");
    assert_eq!(message.seq, "R11");
    assert_eq!(message.args.get("value").map(String::as_str), Some("a%20b"));
}

/// **VALUE**: Verifies `get`/`get_or` decode on read and fall back when
/// the key is absent.
#[test]
fn given_args_when_read_by_name_then_decoded_with_fallback() {
    let message = Message::parse("ipc://hello?address=127%2E0%2E0%2E1");

    assert_eq!(message.get("address"), "127.0.0.1");
    assert_eq!(message.get("missing"), "");
    assert_eq!(message.get_or("missing", "0.0.0.0"), "0.0.0.0");
}

/// **VALUE**: Verifies serialize/parse round trips to a set-equal args
/// map, the only order-independent guarantee the codec makes.
///
/// **BUG THIS CATCHES**: An encoder whose escape set disagrees with the
/// decoder, corrupting values containing separators or spaces.
#[test]
fn given_message_when_serialized_and_reparsed_then_args_set_equal() {
    let mut message = Message::parse("ipc://hello?value=a%20b&seq=9");
    message.set("extra", "x=y&z");

    let reparsed = Message::parse(&message.to_uri());

    assert_eq!(reparsed.name, "hello");
    assert_eq!(reparsed.args.len(), message.args.len());
    for key in message.args.keys() {
        assert_eq!(reparsed.get(key), message.get(key), "key: {key:?}");
    }
}

/// **VALUE**: Verifies the broadcast predicate recognizes the literal
/// `-1` seq and nothing else.
#[test]
fn given_broadcast_seq_when_checked_then_recognized() {
    assert!(Message::parse("ipc://hello?seq=-1").is_broadcast());
    assert!(!Message::parse("ipc://hello?seq=1").is_broadcast());
    assert!(!Message::parse("ipc://hello").is_broadcast());
    assert_eq!(SEQ_BROADCAST, "-1");
}

/// **VALUE**: Verifies a buffer attached at parse time rides along with
/// the message.
#[test]
fn given_body_bytes_when_parsed_with_buffer_then_attached() {
    let message = Message::parse_with_buffer("ipc://udp.send?seq=2", vec![1, 2, 3]);

    let buffer = message.buffer.expect("buffer should be attached");
    assert_eq!(buffer.bytes, vec![1, 2, 3]);
    assert_eq!(buffer.size(), 3);
}
