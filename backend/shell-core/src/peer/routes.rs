//! Router glue for the peer contract.
//!
//! Each route is a thin translator: message args in, peer call, envelope
//! out. All routes run async (deferred onto the event loop) since peer
//! operations may touch the network backend.

use crate::ipc::message::Message;
use crate::ipc::reply::Reply;
use crate::ipc::router::{ResultCallback, Router};
use crate::peer::{Peer, PeerManager, PeerStateError, PeerType, error_envelope};

use std::sync::Arc;

use serde_json::json;

/// Register the `udp.*` and `dns.lookup` routes against `router`,
/// backed by `peers`.
pub fn bind_peer_routes(router: &Router, peers: Arc<dyn PeerManager>) {
    bind_udp_bind(router, Arc::clone(&peers));
    bind_with_peer(router, Arc::clone(&peers), "udp.connect", |message, peer| {
        if peer.is_connected() {
            return Err(PeerStateError::AlreadyConnected);
        }
        peer.connect(&message.get("address"), port_arg(message))
    });
    bind_with_peer(router, Arc::clone(&peers), "udp.disconnect", |_, peer| {
        if !peer.is_connected() {
            return Err(PeerStateError::NotConnected);
        }
        peer.disconnect()
    });
    bind_with_peer(router, Arc::clone(&peers), "udp.send", |message, peer| {
        if peer.is_closed() {
            return Err(PeerStateError::Closed);
        }

        let bytes = message
            .buffer
            .as_ref()
            .map(|buffer| buffer.bytes.as_slice())
            .unwrap_or_default();

        let address = message.get("address");
        let remote = if address.is_empty() {
            None
        } else {
            Some((address.as_str(), port_arg(message)))
        };

        peer.send(bytes, remote)
    });
    bind_with_peer(router, Arc::clone(&peers), "udp.readStart", |_, peer| {
        if peer.is_closing() {
            return Err(PeerStateError::Closing);
        }
        peer.recv_start()
    });
    bind_with_peer(router, Arc::clone(&peers), "udp.readStop", |_, peer| {
        peer.recv_stop()
    });
    bind_with_peer(router, Arc::clone(&peers), "udp.close", |_, peer| {
        if peer.is_closed() {
            return Err(PeerStateError::Closed);
        }
        peer.close()
    });
    bind_with_peer(router, Arc::clone(&peers), "udp.getState", |_, peer| {
        Ok(peer.state())
    });
    bind_dns_lookup(router, peers);
}

fn bind_udp_bind(router: &Router, peers: Arc<dyn PeerManager>) {
    router.map(
        "udp.bind",
        true,
        move |message: Message, _router: Router, callback: ResultCallback| {
            let Some(id) = peer_id(&message, &callback) else {
                return;
            };

            if let Some(peer) = peers.get_peer(id)
                && peer.is_bound()
            {
                callback(Reply::raw(
                    &message,
                    error_envelope(&message.name, id, PeerStateError::AlreadyBound),
                ));
                return;
            }

            let peer = peers.create_peer(PeerType::Udp, id, false);
            let address = message.get_or("address", "0.0.0.0");
            deliver(
                &message,
                id,
                peer.bind(&address, port_arg(&message)),
                &callback,
            );
        },
    );
}

fn bind_dns_lookup(router: &Router, peers: Arc<dyn PeerManager>) {
    router.map(
        "dns.lookup",
        true,
        move |message: Message, _router: Router, callback: ResultCallback| {
            let Some(id) = peer_id(&message, &callback) else {
                return;
            };

            let hostname = message.get("hostname");
            let family = message.get_or("family", "4").parse::<i32>().unwrap_or(4);

            let peer = peers.create_peer(PeerType::Dns, id, true);
            deliver(&message, id, peer.lookup(&hostname, family), &callback);
        },
    );
}

/// Register a route that requires an existing peer; a missing peer
/// reports `ERR_SOCKET_DGRAM_NOT_RUNNING`.
fn bind_with_peer<F>(router: &Router, peers: Arc<dyn PeerManager>, name: &str, operation: F)
where
    F: Fn(&Message, &dyn Peer) -> Result<serde_json::Value, PeerStateError>
        + Send
        + Sync
        + 'static,
{
    router.map(
        name,
        true,
        move |message: Message, _router: Router, callback: ResultCallback| {
            let Some(id) = peer_id(&message, &callback) else {
                return;
            };

            let Some(peer) = peers.get_peer(id) else {
                callback(Reply::raw(
                    &message,
                    error_envelope(&message.name, id, PeerStateError::NotRunning),
                ));
                return;
            };

            deliver(&message, id, operation(&message, peer.as_ref()), &callback);
        },
    );
}

fn deliver(
    message: &Message,
    id: u64,
    outcome: Result<serde_json::Value, PeerStateError>,
    callback: &ResultCallback,
) {
    match outcome {
        Ok(data) => callback(Reply::data(message, data)),
        Err(error) => callback(Reply::raw(
            message,
            error_envelope(&message.name, id, error),
        )),
    }
}

fn peer_id(message: &Message, callback: &ResultCallback) -> Option<u64> {
    match message.get("id").parse::<u64>() {
        Ok(id) => Some(id),
        Err(_) => {
            callback(Reply::err(
                message,
                json!({ "message": "Invalid peer id" }),
            ));
            None
        }
    }
}

fn port_arg(message: &Message) -> u16 {
    message.get("port").parse::<u16>().unwrap_or(0)
}
