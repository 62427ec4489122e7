//! User supplied functions plugged into the request pipeline and the parameter resolver.
//!
//! Every hook is a cheap-to-clone `Arc` around a closure so option layers can be
//! merged and shared between actions.

use crate::error::Error;
use crate::transport::{OutgoingRequest, Response};
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Shapes an outgoing body. Receives the in-flight request so it can move data into the query.
pub type RequestTransformFn =
    dyn Fn(&mut OutgoingRequest, Value) -> Result<Value, Error> + Send + Sync + 'static;

/// Shapes an incoming body. Receives the response the body came from.
pub type ResponseTransformFn = dyn Fn(&Response, Value) -> Result<Value, Error> + Send + Sync + 'static;

/// One step of a recovery chain.
pub type RecoveryFn = dyn Fn(Error) -> BoxFuture<'static, Result<Recovery, Error>> + Send + Sync + 'static;

/// Computes a parameter from the caller's explicit params and the payload.
pub type ParamFactoryFn = dyn Fn(Arc<Map<String, Value>>, Option<Arc<Value>>) -> BoxFuture<'static, Result<Option<Value>, Error>>
    + Send
    + Sync
    + 'static;

/// Rewrites a resolved parameter value before it reaches the URL.
pub type ParamPreprocessorFn =
    dyn Fn(Value) -> BoxFuture<'static, Result<Value, Error>> + Send + Sync + 'static;

/// Outcome of a recovery handler that handled the error.
#[derive(Debug)]
pub enum Recovery {
    /// Ends the chain successfully with a substitute body.
    Resolve(Value),
    /// Ends the chain with this error; remaining handlers are skipped.
    Reject(Error),
}

/// A named pipeline function.
pub struct Hook<F: ?Sized> {
    name: String,
    func: Arc<F>,
}

impl<F: ?Sized> Hook<F> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<F: ?Sized> Clone for Hook<F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Hook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook({}: <fn>)", self.name)
    }
}

const ANONYMOUS: &str = "anonymous";

pub type RequestHook = Hook<RequestTransformFn>;
pub type ResponseHook = Hook<ResponseTransformFn>;
pub type RecoveryHook = Hook<RecoveryFn>;
pub type ParamFactory = Hook<ParamFactoryFn>;
pub type ParamPreprocessor = Hook<ParamPreprocessorFn>;

impl Hook<RequestTransformFn> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut OutgoingRequest, Value) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self::named(ANONYMOUS, f)
    }

    pub fn named<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut OutgoingRequest, Value) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(f),
        }
    }

    /// # Errors
    ///
    /// Returns whatever error the hook raises.
    pub fn apply(&self, request: &mut OutgoingRequest, body: Value) -> Result<Value, Error> {
        (self.func)(request, body)
    }
}

impl Hook<ResponseTransformFn> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Response, Value) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self::named(ANONYMOUS, f)
    }

    pub fn named<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Response, Value) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(f),
        }
    }

    /// # Errors
    ///
    /// Returns whatever error the hook raises.
    pub fn apply(&self, response: &Response, body: Value) -> Result<Value, Error> {
        (self.func)(response, body)
    }
}

impl Hook<RecoveryFn> {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Recovery, Error>> + Send + 'static,
    {
        Self {
            name: ANONYMOUS.to_string(),
            func: Arc::new(move |err| f(err).boxed()),
        }
    }

    /// Recovery handler that settles immediately.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Error) -> Result<Recovery, Error> + Send + Sync + 'static,
    {
        Self::new(move |err| futures::future::ready(f(err)))
    }

    pub async fn apply(&self, error: Error) -> Result<Recovery, Error> {
        (self.func)(error).await
    }
}

impl Hook<ParamFactoryFn> {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<Map<String, Value>>, Option<Arc<Value>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Value>, Error>> + Send + 'static,
    {
        Self {
            name: ANONYMOUS.to_string(),
            func: Arc::new(move |params, payload| f(params, payload).boxed()),
        }
    }

    /// Factory computed synchronously from borrowed params and payload.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Map<String, Value>, Option<&Value>) -> Result<Option<Value>, Error>
            + Send
            + Sync
            + 'static,
    {
        Self::new(move |params: Arc<Map<String, Value>>, payload: Option<Arc<Value>>| {
            futures::future::ready(f(&params, payload.as_deref()))
        })
    }

    pub async fn apply(
        &self,
        params: Arc<Map<String, Value>>,
        payload: Option<Arc<Value>>,
    ) -> Result<Option<Value>, Error> {
        (self.func)(params, payload).await
    }
}

impl Hook<ParamPreprocessorFn> {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, Error>> + Send + 'static,
    {
        Self {
            name: ANONYMOUS.to_string(),
            func: Arc::new(move |value| f(value).boxed()),
        }
    }

    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self::new(move |value| futures::future::ready(f(value)))
    }

    pub async fn apply(&self, value: Value) -> Result<Value, Error> {
        (self.func)(value).await
    }
}

/// Runs `error` through `chain` in order.
///
/// A handler either settles the chain (`Ok`) or passes a possibly different
/// error on to the next handler (`Err`). An exhausted chain yields the last error.
pub async fn recover(chain: &[RecoveryHook], error: Error) -> Result<Value, Error> {
    let mut current = error;
    for hook in chain {
        match hook.apply(current).await {
            Ok(Recovery::Resolve(value)) => return Ok(value),
            Ok(Recovery::Reject(err)) => return Err(err),
            Err(err) => current = err,
        }
    }
    Err(current)
}
