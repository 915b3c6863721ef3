//! Wire protocol for mentord.
//!
//! Every exchange is a JSON text frame over the WebSocket. Clients send
//! [`ClientFrame`]s; the server answers with [`ServerFrame`]s. A client frame
//! may carry a `seq` token, which the server echoes back in exactly one
//! `ack` frame when the command completes. Frames without `seq` have no
//! completion channel and are only ever answered out-of-band.

mod command;
mod frame;

pub use command::commands;
pub use frame::{
    ClientFrame, DataPayload, FrameError, RequestStatus, ServerFrame, parse_client_frame,
};
