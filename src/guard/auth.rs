use crate::session::SessionSnapshot;

use super::email::GatedView;

/// Authentication-only gate for routes that do not need a confirmed email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGuard {
    pub auth_entry_path: String,
}

impl AuthGuard {
    pub fn new(auth_entry_path: impl Into<String>) -> Self {
        Self {
            auth_entry_path: auth_entry_path.into(),
        }
    }

    pub fn render<N>(&self, session: &SessionSnapshot, location: &str, children: N) -> GatedView<N> {
        if session.loading {
            return GatedView::Loading;
        }
        match session.user {
            Some(_) => GatedView::Children(children),
            None => GatedView::Redirect {
                to: self.auth_entry_path.clone(),
                from: location.to_string(),
            },
        }
    }
}
