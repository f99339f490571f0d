//! Venue collaborators around the book core: frame decoding, request
//! signing, the stream transport, and the snapshot REST client.

pub mod auth;
pub mod error;
pub mod message;
pub mod rest;
pub mod websocket;

pub use auth::{FeedCredentials, public_subscribe_frame};
pub use error::FeedError;
pub use message::{
    ChangeMessage, DoneMessage, DoneReason, FeedMessage, Frame, HEARTBEAT_FRAME, MatchMessage,
    OpenMessage, ReceivedMessage, decode_frame,
};
pub use rest::{DEFAULT_API_URL, RestClient};
pub use websocket::{FeedClient, FeedHandle};
