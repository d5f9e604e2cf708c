use std::sync::Arc;

use super::{decide, AccessDecision, GuardRoutes, PermissionTable, RequiredAccess};
use crate::history::NavigationHistory;
use crate::session::Session;
use crate::types::PageId;

/// Route control the guard drives when it redirects
pub trait Navigator {
    fn current_path(&self) -> &str;

    fn push(&mut self, path: &str);

    fn replace(&mut self, path: &str);
}

/// Anything that renders from props; closures qualify
pub trait Page<Props> {
    type Output;

    fn render(&self, props: Props) -> Self::Output;
}

impl<F, Props, O> Page<Props> for F
where
    F: Fn(Props) -> O,
{
    type Output = O;

    fn render(&self, props: Props) -> O {
        self(props)
    }
}

/// Remembers the last redirect issued so re-evaluation with the same inputs stays quiet
#[derive(Debug, Clone, Default)]
pub struct RedirectLatch {
    issued: Option<(String, AccessDecision)>,
}

impl RedirectLatch {
    /// True when this redirect has not been issued yet for this path
    fn arm(&mut self, current_path: &str, decision: &AccessDecision) -> bool {
        if let Some((path, issued)) = &self.issued {
            if path == current_path && issued == decision {
                return false;
            }
        }
        self.issued = Some((current_path.to_string(), decision.clone()));
        true
    }

    fn release(&mut self) {
        self.issued = None;
    }

    pub fn is_armed(&self) -> bool {
        self.issued.is_some()
    }
}

/// State a guarded page reads on each render
pub struct RenderContext<'a, N: Navigator> {
    pub session: &'a Session,
    pub history: &'a NavigationHistory,
    pub navigator: &'a mut N,
}

/// Decides page access and issues redirects
#[derive(Debug, Clone)]
pub struct AccessGuard {
    table: Arc<PermissionTable>,
    routes: GuardRoutes,
}

impl AccessGuard {
    pub fn new(table: Arc<PermissionTable>, routes: GuardRoutes) -> Self {
        Self { table, routes }
    }

    pub fn table(&self) -> &PermissionTable {
        &self.table
    }

    pub fn routes(&self) -> &GuardRoutes {
        &self.routes
    }

    /// Decision only, no side effects
    pub fn decide(
        &self,
        access: &RequiredAccess,
        session: &Session,
        current_path: &str,
        previous_path: Option<&str>,
    ) -> AccessDecision {
        let rule = access.resolve(&self.table);
        match decide(&rule, session, current_path, previous_path, &self.routes) {
            // Never bounce back onto a page the role cannot open either; two denied
            // pages pointing at each other would loop
            AccessDecision::RedirectToPrevious(previous) if !self.may_open(&previous, session) => {
                AccessDecision::RedirectToDefault(self.routes.default_path.clone())
            }
            decision => decision,
        }
    }

    /// Whether the session's role may open a known page path; unknown paths count as open
    fn may_open(&self, path: &str, session: &Session) -> bool {
        match (PageId::from_path(path), session.role()) {
            (Some(page), Some(role)) => self.table.rule_for(page).permits(role),
            _ => true,
        }
    }

    /// Decide for the navigator's current path and issue at most one redirect per distinct outcome
    pub fn evaluate<N: Navigator>(
        &self,
        access: &RequiredAccess,
        session: &Session,
        history: &NavigationHistory,
        navigator: &mut N,
        latch: &mut RedirectLatch,
    ) -> AccessDecision {
        let current_path = navigator.current_path().to_string();
        let decision = self.decide(access, session, &current_path, history.previous());

        match decision.redirect_target(&self.routes) {
            Some(target) => {
                if latch.arm(&current_path, &decision) {
                    tracing::debug!("Access to {} -> {:?}", current_path, decision);
                    navigator.replace(target);
                }
            }
            None => latch.release(),
        }

        decision
    }

    pub fn wrap<C>(&self, page: C, access: impl Into<RequiredAccess>) -> Guarded<C> {
        Guarded {
            page,
            access: access.into(),
            guard: self.clone(),
            latch: RedirectLatch::default(),
        }
    }
}

/// A page that only renders when the guard allows it
pub struct Guarded<C> {
    page: C,
    access: RequiredAccess,
    guard: AccessGuard,
    latch: RedirectLatch,
}

impl<C> Guarded<C> {
    pub fn access(&self) -> &RequiredAccess {
        &self.access
    }

    /// Renders the page on Allow; anything else yields nothing
    pub fn render<Props, N>(&mut self, ctx: RenderContext<'_, N>, props: Props) -> Option<C::Output>
    where
        C: Page<Props>,
        N: Navigator,
    {
        let decision = self.guard.evaluate(
            &self.access,
            ctx.session,
            ctx.history,
            ctx.navigator,
            &mut self.latch,
        );

        match decision {
            AccessDecision::Allow => Some(self.page.render(props)),
            _ => None,
        }
    }
}
