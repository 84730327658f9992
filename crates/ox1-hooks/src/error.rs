use std::fmt;

use thiserror::Error;

use crate::store::ComponentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    State,
    Effect,
    Memo,
    Ref,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::State => "use_state",
            HookKind::Effect => "use_effect",
            HookKind::Memo => "use_memo",
            HookKind::Ref => "use_ref",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("component {0} is not mounted")]
    UnknownComponent(ComponentId),

    /// A different hook was called at this position than on the first render
    #[error("hook {index} of component {component} changed from {expected} to {found}")]
    OrderMismatch {
        component: ComponentId,
        index: usize,
        expected: HookKind,
        found: HookKind,
    },

    /// Same hook kind, different value type
    #[error("{kind} at index {index} of component {component} changed its value type")]
    TypeMismatch {
        component: ComponentId,
        index: usize,
        kind: HookKind,
    },

    #[error("component {component} called {found} hooks, expected {expected}")]
    CountMismatch {
        component: ComponentId,
        expected: usize,
        found: usize,
    },
}
