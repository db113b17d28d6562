//! Conditional Mock Server
//!
//! A mock API server whose endpoints answer with predefined responses chosen
//! at request time. Every endpoint carries an ordered list of candidate
//! results; the first result whose condition holds for the request wins.
//!
//! # Features
//!
//! - **Query Matching**: Compare URL parameters by string form
//! - **Header Matching**: Case-insensitive header names
//! - **Payload Matching**: Recursive structural match over the JSON body
//! - **First-Match Selection**: Declaration order encodes priority
//! - **Fallback Results**: A result without `when` always matches
//!
//! # Example Configuration
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 8080
//! endpoints:
//!   - path: /users/:id
//!     method: POST
//!     results:
//!       - when:
//!           query:
//!             verbose: true
//!           payload:
//!             data:
//!               address: France
//!         response:
//!           returnCode: 200
//!           returnObject:
//!             message: "Bonjour"
//!       - response:
//!           returnCode: 400
//!           returnObject:
//!             error: "unsupported request"
//! ```

pub mod config;
pub mod error;
pub mod matcher;
pub mod method;
pub mod request;
pub mod route;
pub mod server;

pub use config::MockServerConfig;
pub use error::ConfigError;
pub use server::MockServer;
