use tokio_util::sync::CancellationToken;

/// Owner side of an [`AbortSignal`].
#[derive(Debug, Default)]
pub struct AbortController {
    token: CancellationToken,
}

/// Cancellation signal exposed to resolvers. Aborting is one-way and sticky.
#[derive(Clone)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortController {
    pub fn new() -> Self {
        AbortController {
            token: CancellationToken::new(),
        }
    }

    /// Controller whose signal is also aborted when `parent` is. Aborting it leaves
    /// `parent` untouched.
    pub fn child_of(parent: &AbortSignal) -> Self {
        AbortController {
            token: parent.token.child_token(),
        }
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            token: self.token.clone(),
        }
    }

    pub fn abort(&self) {
        self.token.cancel();
    }
}

impl AbortSignal {
    /// A signal nobody can abort.
    pub fn never() -> Self {
        AbortSignal {
            token: CancellationToken::new(),
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal is aborted.
    pub async fn aborted(&self) {
        self.token.cancelled().await;
    }
}

impl std::fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortSignal").field("aborted", &self.is_aborted()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn abort_wakes_waiters() {
        let controller = AbortController::new();
        let signal = controller.signal();
        assert!(!signal.is_aborted());

        let waiter = tokio::spawn({
            let signal = signal.clone();
            async move { signal.aborted().await }
        });

        controller.abort();
        controller.abort();

        waiter.await.unwrap();
        assert!(signal.is_aborted());
    }

    #[tokio::test]
    async fn children_follow_their_parent_only() {
        let parent = AbortController::new();
        let child = AbortController::child_of(&parent.signal());

        child.abort();
        assert!(child.signal().is_aborted());
        assert!(!parent.signal().is_aborted());

        let parent = AbortController::new();
        let child = AbortController::child_of(&parent.signal());

        parent.abort();
        child.signal().aborted().await;
        assert!(child.signal().is_aborted());
    }
}
