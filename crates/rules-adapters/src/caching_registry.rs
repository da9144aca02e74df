//! Wraps a [`FunctionRegistry`] with a [`CacheProvider`], caching `rest_get`
//! responses by URL. Every other call passes straight through; `rest_get` is
//! the only built-in assumed idempotent enough to cache safely.

use std::time::Duration;

use rules_common::Value;
use rules_eval::adapters::{CacheProvider, FunctionRegistry};
use rules_eval::error::EvalError;

pub struct CachingFunctionRegistry<'a> {
    inner: &'a dyn FunctionRegistry,
    cache: &'a dyn CacheProvider,
    ttl: Duration,
}

impl<'a> CachingFunctionRegistry<'a> {
    pub fn new(inner: &'a dyn FunctionRegistry, cache: &'a dyn CacheProvider, ttl: Duration) -> Self {
        CachingFunctionRegistry { inner, cache, ttl }
    }

    fn cache_key(args: &[Value]) -> String {
        format!("rest_get:{}", args.first().and_then(Value::as_str).unwrap_or_default())
    }
}

impl<'a> FunctionRegistry for CachingFunctionRegistry<'a> {
    fn exists(&self, name: &str) -> bool {
        self.inner.exists(name)
    }

    fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        if name != "rest_get" {
            return self.inner.invoke(name, args);
        }
        let key = Self::cache_key(args);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }
        let result = self.inner.invoke(name, args)?;
        self.cache.put(&key, result.clone(), self.ttl);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    struct CountingRegistry {
        calls: std::cell::Cell<u32>,
    }

    impl FunctionRegistry for CountingRegistry {
        fn exists(&self, name: &str) -> bool {
            name == "rest_get"
        }

        fn invoke(&self, _name: &str, _args: &[Value]) -> Result<Value, EvalError> {
            self.calls.set(self.calls.get() + 1);
            Ok(Value::String("response".to_string()))
        }
    }

    #[test]
    fn repeated_rest_get_hits_cache_after_first_call() {
        let inner = CountingRegistry { calls: std::cell::Cell::new(0) };
        let cache = MemoryCache::new();
        let registry = CachingFunctionRegistry::new(&inner, &cache, Duration::from_secs(60));

        let args = vec![Value::String("https://example.com/a".to_string())];
        registry.invoke("rest_get", &args).unwrap();
        registry.invoke("rest_get", &args).unwrap();

        assert_eq!(inner.calls.get(), 1);
    }
}
