//! Client side of the tug of war: a projector from server state to a render
//! model, plus the socket handle that feeds it.

pub mod animation;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod message_log;
pub mod transport;
pub mod types;
pub mod view;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{ViewController, ViewUpdate};
pub use error::ClientError;
pub use transport::{ClientEvent, GameClient, GameHandle};
pub use types::{GameState, ViewEvent};
pub use view::ViewFrame;
