//! Closure-backed methods

use crate::{Context, Method, MethodMeta};
use async_trait::async_trait;
use learncard_core::{Result, Value};
use std::future::Future;

/// Synchronous method built from a closure
pub struct FnMethod<F> {
    f: F,
    meta: MethodMeta,
}

impl<F> FnMethod<F>
where
    F: Fn(&Context, &[Value]) -> Result<Value> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f, meta: MethodMeta::default() }
    }

    pub fn with_meta(mut self, meta: MethodMeta) -> Self {
        self.meta = meta;
        self
    }
}

#[async_trait]
impl<F> Method for FnMethod<F>
where
    F: Fn(&Context, &[Value]) -> Result<Value> + Send + Sync,
{
    fn meta(&self) -> MethodMeta {
        self.meta.clone()
    }

    async fn call(&self, ctx: &Context, args: Vec<Value>) -> Result<Value> {
        (self.f)(ctx, &args)
    }
}

/// Asynchronous method built from a closure returning a future.
///
/// The closure gets an owned `Context` so the future can outlive the call site.
pub struct AsyncFnMethod<F> {
    f: F,
    meta: MethodMeta,
}

impl<F, Fut> AsyncFnMethod<F>
where
    F: Fn(Context, Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f, meta: MethodMeta::default() }
    }

    pub fn with_meta(mut self, meta: MethodMeta) -> Self {
        self.meta = meta;
        self
    }
}

#[async_trait]
impl<F, Fut> Method for AsyncFnMethod<F>
where
    F: Fn(Context, Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn meta(&self) -> MethodMeta {
        self.meta.clone()
    }

    async fn call(&self, ctx: &Context, args: Vec<Value>) -> Result<Value> {
        (self.f)(ctx.clone(), args).await
    }
}
