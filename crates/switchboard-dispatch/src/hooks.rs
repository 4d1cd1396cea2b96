//! Hook system for pre/post dispatch.
//!
//! Hooks run cross-cutting code around every handler without touching it.
//!
//! # Pipeline Position
//!
//! ```text
//! argv
//!   → route resolution
//!   → flag parsing
//!   → PRE-DISPATCH HOOK ← (validation, auth checks, state injection)
//!   → handler
//!   → POST-DISPATCH HOOK ← (inspect or override the exit code)
//! ```
//!
//! A failing pre-dispatch hook aborts the dispatch; the handler never runs.

use std::fmt;
use std::rc::Rc;
use thiserror::Error;

use switchboard_flags::ParsedInput;

use crate::handler::CommandContext;

/// The phase at which a hook error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    PreDispatch,
    PostDispatch,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::PreDispatch => write!(f, "pre-dispatch"),
            HookPhase::PostDispatch => write!(f, "post-dispatch"),
        }
    }
}

/// Error returned by a hook.
#[derive(Debug, Error)]
#[error("hook error ({phase}): {message}")]
pub struct HookError {
    pub message: String,
    pub phase: HookPhase,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl HookError {
    pub fn pre_dispatch(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phase: HookPhase::PreDispatch,
            source: None,
        }
    }

    pub fn post_dispatch(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phase: HookPhase::PostDispatch,
            source: None,
        }
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        self.source = Some(source.into());
        self
    }
}

/// Pre-dispatch hooks get the bound input and may inject state into
/// `ctx.extensions`.
pub type PreDispatchFn = Rc<dyn Fn(&ParsedInput, &mut CommandContext) -> Result<(), HookError>>;

/// Post-dispatch hooks get the handler's exit code and return the one to use.
pub type PostDispatchFn = Rc<dyn Fn(&CommandContext, i32) -> Result<i32, HookError>>;

/// Hooks run around every dispatch, in registration order.
#[derive(Clone, Default)]
pub struct Hooks {
    pre_dispatch: Vec<PreDispatchFn>,
    post_dispatch: Vec<PostDispatchFn>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pre_dispatch.is_empty() && self.post_dispatch.is_empty()
    }

    /// Adds a pre-dispatch hook.
    ///
    /// # Example
    ///
    /// ```rust
    /// use switchboard_dispatch::{HookError, Hooks};
    ///
    /// struct Verbose(bool);
    ///
    /// let hooks = Hooks::new()
    ///     .pre_dispatch(|input, ctx| {
    ///         ctx.extensions.insert(Verbose(input.get_bool("verbose")));
    ///         Ok(())
    ///     })
    ///     .pre_dispatch(|input, _ctx| {
    ///         if input.get_str("token") == Some("") {
    ///             return Err(HookError::pre_dispatch("empty token"));
    ///         }
    ///         Ok(())
    ///     });
    /// assert!(!hooks.is_empty());
    /// ```
    pub fn pre_dispatch<F>(mut self, f: F) -> Self
    where
        F: Fn(&ParsedInput, &mut CommandContext) -> Result<(), HookError> + 'static,
    {
        self.pre_dispatch.push(Rc::new(f));
        self
    }

    pub fn post_dispatch<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandContext, i32) -> Result<i32, HookError> + 'static,
    {
        self.post_dispatch.push(Rc::new(f));
        self
    }

    /// Appends every hook of `other` after the ones already present.
    pub fn extend(&mut self, other: Hooks) {
        self.pre_dispatch.extend(other.pre_dispatch);
        self.post_dispatch.extend(other.post_dispatch);
    }

    /// Runs pre-dispatch hooks, stopping at the first error.
    pub fn run_pre_dispatch(
        &self,
        input: &ParsedInput,
        ctx: &mut CommandContext,
    ) -> Result<(), HookError> {
        for hook in &self.pre_dispatch {
            hook(input, ctx)?;
        }
        Ok(())
    }

    /// Runs post-dispatch hooks, each one seeing the previous one's code.
    pub fn run_post_dispatch(&self, ctx: &CommandContext, code: i32) -> Result<i32, HookError> {
        let mut current = code;
        for hook in &self.post_dispatch {
            current = hook(ctx, current)?;
        }
        Ok(current)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("pre_dispatch_count", &self.pre_dispatch.len())
            .field("post_dispatch_count", &self.post_dispatch.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Extensions;
    use crate::route::Route;
    use std::cell::Cell;

    fn test_context() -> CommandContext {
        CommandContext::new(Route::Command("test".into()), "app", Rc::new(Extensions::new()))
    }

    #[test]
    fn hook_error_creation() {
        let err = HookError::pre_dispatch("test error");
        assert_eq!(err.phase, HookPhase::PreDispatch);
        assert_eq!(err.to_string(), "hook error (pre-dispatch): test error");
    }

    #[test]
    fn hooks_empty() {
        assert!(Hooks::new().is_empty());
    }

    #[test]
    fn pre_dispatch_runs() {
        let called = Rc::new(Cell::new(false));
        let called_clone = called.clone();
        let hooks = Hooks::new().pre_dispatch(move |_, _| {
            called_clone.set(true);
            Ok(())
        });

        let mut ctx = test_context();
        hooks
            .run_pre_dispatch(&ParsedInput::default(), &mut ctx)
            .unwrap();
        assert!(called.get());
    }

    #[test]
    fn pre_dispatch_error_aborts() {
        let hooks = Hooks::new()
            .pre_dispatch(|_, _| Err(HookError::pre_dispatch("first fails")))
            .pre_dispatch(|_, _| panic!("should not be called"));

        let mut ctx = test_context();
        let result = hooks.run_pre_dispatch(&ParsedInput::default(), &mut ctx);
        assert!(result.is_err());
    }

    #[test]
    fn pre_dispatch_injects_extensions() {
        struct Scope(&'static str);

        let hooks = Hooks::new().pre_dispatch(|_, ctx| {
            ctx.extensions.insert(Scope("admin"));
            Ok(())
        });

        let mut ctx = test_context();
        assert!(!ctx.extensions.contains::<Scope>());
        hooks
            .run_pre_dispatch(&ParsedInput::default(), &mut ctx)
            .unwrap();
        assert_eq!(ctx.extensions.get::<Scope>().unwrap().0, "admin");
    }

    #[test]
    fn post_dispatch_chains_codes() {
        let hooks = Hooks::new()
            .post_dispatch(|_, code| Ok(code + 1))
            .post_dispatch(|_, code| Ok(code * 10));

        let ctx = test_context();
        assert_eq!(hooks.run_post_dispatch(&ctx, 0).unwrap(), 10);
    }

    #[test]
    fn extend_keeps_order() {
        let mut hooks = Hooks::new().post_dispatch(|_, code| Ok(code + 1));
        hooks.extend(Hooks::new().post_dispatch(|_, code| Ok(code * 3)));

        let ctx = test_context();
        assert_eq!(hooks.run_post_dispatch(&ctx, 1).unwrap(), 6);
    }
}
