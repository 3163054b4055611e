//! Client for the Spreedly subscription billing API.
//!
//! Requests and responses are XML documents. Responses carry a `type`
//! attribute on every element, which drives decoding into `Value`s; requests
//! are plain documents built from `Fields`.
//!
//! ```no_run
//! use spreedly::{Config, Fields, Spreedly};
//!
//! # fn main() -> spreedly::Result<()> {
//! let client = Spreedly::new(&Config::new("token", "mysite-test"));
//! let subscriber = client.create_subscriber(1, Fields::new().with("screen_name", "jb"))?;
//! println!("{:?}", subscriber.get("token"));
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod hosted;
pub mod protocol;
pub mod spreedly;

pub use config::Config;
pub use error::{Error, Result};
pub use hosted::{change_subscription_url, subscribe_url};
pub use protocol::encoding::Document;
pub use protocol::transport::{HttpsTransport, Method, Transport};
pub use protocol::value::{Decimal, Fields, Resource, Scalar, Value};
pub use protocol::Protocol;
pub use spreedly::Spreedly;
