//! A client layer over HTTP for REST resources.
//!
//! [`Client`] runs single requests through a hook pipeline (transforms,
//! recovery chains, response cache). [`Resource`] binds a URL template with
//! `:name` tokens to a set of CRUD actions executed through that client.
//!
//! ```no_run
//! use resourceful::{Client, DefaultParams, Resource};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), resourceful::error::Error> {
//! let client = Arc::new(Client::with_reqwest()?);
//! let users = Resource::builder("https://api.test/users/:id")
//!     .default_params(DefaultParams::new().with("id", "@id"))
//!     .build(&client);
//!
//! let user = users.get(json!({"id": 7})).await?;
//! users.save(json!({"id": 7, "name": "Ann"})).await?;
//! # let _ = user;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod duration;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod merge;
pub mod options;
pub mod params;
pub mod response_cache;
pub mod transport;
pub mod url_template;

pub use engine::action::{Args, ResourceAction};
pub use engine::executor::{Client, PreparedRequest};
pub use engine::generator::{define_resource, ActionSpec, Resource, ResourceBuilder};
pub use hooks::{ParamFactory, ParamPreprocessor, Recovery, RecoveryHook, RequestHook, ResponseHook};
pub use options::{CacheOption, Method, RequestOptions};
pub use params::{DefaultParam, DefaultParams};
pub use response_cache::{CacheConfig, MemoryCache, ResponseStore};
pub use transport::{OutgoingRequest, ReqwestTransport, Response, Transport};
